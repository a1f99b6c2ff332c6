//! Open constructs awaiting their closing macro.
//!
//! Two stacks: block scopes (display blocks, lists, items, `#if`) and
//! inline scopes (markup spans). `#if` scopes are transparent to the
//! others: closing a list never closes a conditional opened inside it, and
//! `.#;` never closes anything but its conditional.

use std::fmt;
use std::rc::Rc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListType {
    Item,
    Enum,
    Desc,
    Verse,
    Table,
}

impl ListType {
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "item" => Some(ListType::Item),
            "enum" => Some(ListType::Enum),
            "desc" => Some(ListType::Desc),
            "verse" => Some(ListType::Verse),
            "table" => Some(ListType::Table),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            ListType::Item => "item",
            ListType::Enum => "enum",
            ListType::Desc => "desc",
            ListType::Verse => "verse",
            ListType::Table => "table",
        }
    }

    /// Item, enum and desc lists nest in each other; verses and tables
    /// nest in nothing.
    fn is_plain(self) -> bool {
        matches!(self, ListType::Item | ListType::Enum | ListType::Desc)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScopeKind {
    Display,
    List(ListType),
    Item(ListType),
    Markup,
    Conditional,
}

impl ScopeKind {
    pub fn opener(&self) -> &'static str {
        match self {
            ScopeKind::Display => "Bd",
            ScopeKind::List(_) => "Bl",
            ScopeKind::Item(_) => "It",
            ScopeKind::Markup => "Bm",
            ScopeKind::Conditional => "#if",
        }
    }

    pub fn is_inline(&self) -> bool {
        matches!(self, ScopeKind::Markup)
    }
}

#[derive(Debug, Clone)]
pub struct Scope {
    pub kind: ScopeKind,
    pub tag: Option<String>,
    pub id: Option<String>,
    /// Opened with `-r`: the closing macro must repeat the tag.
    pub tag_required: bool,
    pub file: Rc<str>,
    pub line: usize,
    /// Name of the user macro whose expansion opened the scope.
    pub in_user_macro: Option<String>,
    /// Slot in the document table registry (tables, their rows).
    pub table: Option<usize>,
    /// Cells of a table row, lines of the current stanza.
    pub count: usize,
}

impl Scope {
    pub fn new(kind: ScopeKind, file: Rc<str>, line: usize) -> Self {
        Self {
            kind,
            tag: None,
            id: None,
            tag_required: false,
            file,
            line,
            in_user_macro: None,
            table: None,
            count: 0,
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind.opener())?;
        if let Some(tag) = &self.tag {
            write!(f, " -t {tag}")?;
        }
        write!(f, " opened at {}:{}", self.file, self.line)?;
        if let Some(name) = &self.in_user_macro {
            write!(f, " in user macro `{name}`")?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default)]
pub struct ScopeStacks {
    pub block: Vec<Scope>,
    pub inline: Vec<Scope>,
}

impl ScopeStacks {
    pub fn push(&mut self, scope: Scope) {
        if scope.kind.is_inline() {
            self.inline.push(scope);
        } else {
            self.block.push(scope);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.block.is_empty() && self.inline.is_empty()
    }

    /// Index of the innermost block scope other than `#if`.
    pub fn top_structural(&self) -> Option<usize> {
        self.block
            .iter()
            .rposition(|s| s.kind != ScopeKind::Conditional)
    }

    pub fn top_structural_kind(&self) -> Option<&ScopeKind> {
        self.top_structural().map(|i| &self.block[i].kind)
    }

    /// Innermost block scope matching `pred`.
    pub fn find_block(&self, pred: impl Fn(&Scope) -> bool) -> Option<usize> {
        self.block.iter().rposition(pred)
    }

    /// Innermost list together with the current item, if any.
    pub fn current_list(&self) -> Option<(usize, Option<usize>)> {
        let top = self.top_structural()?;
        match self.block[top].kind {
            ScopeKind::List(_) => Some((top, None)),
            ScopeKind::Item(_) => {
                let list = self.block[..top]
                    .iter()
                    .rposition(|s| matches!(s.kind, ScopeKind::List(_)))?;
                Some((list, Some(top)))
            }
            _ => None,
        }
    }

    /// Whether a `Bd` or `Bl` of the given kind may open here.
    pub fn check_nesting(&self, opening: &ScopeKind) -> Result<(), String> {
        let Some(top) = self.top_structural_kind() else {
            return Ok(());
        };
        match (top, opening) {
            (ScopeKind::List(t), _) => Err(format!(
                "found {} directly inside Bl -t {}: missing It",
                opening.opener(),
                t.name()
            )),
            (ScopeKind::Item(ListType::Table), _) => {
                Err(format!("{} not allowed inside a table", opening.opener()))
            }
            (ScopeKind::Item(outer), ScopeKind::List(inner)) if !inner.is_plain() => Err(format!(
                "Bl -t {} not allowed inside Bl -t {}",
                inner.name(),
                outer.name()
            )),
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn scope(kind: ScopeKind) -> Scope {
        Scope::new(kind, Rc::from("doc"), 1)
    }

    fn stacks(kinds: Vec<ScopeKind>) -> ScopeStacks {
        let mut s = ScopeStacks::default();
        for kind in kinds {
            s.push(scope(kind));
        }
        s
    }

    #[test]
    fn test_markup_goes_to_inline_stack() {
        let s = stacks(vec![ScopeKind::Display, ScopeKind::Markup]);
        assert_eq!(s.block.len(), 1);
        assert_eq!(s.inline.len(), 1);
    }

    #[test]
    fn test_conditionals_are_transparent() {
        let s = stacks(vec![
            ScopeKind::List(ListType::Item),
            ScopeKind::Item(ListType::Item),
            ScopeKind::Conditional,
        ]);
        assert_eq!(s.top_structural(), Some(1));
        assert_eq!(s.current_list(), Some((0, Some(1))));
    }

    #[test]
    fn test_nesting_rules() {
        let in_list = stacks(vec![ScopeKind::List(ListType::Enum)]);
        assert!(in_list.check_nesting(&ScopeKind::Display).is_err());

        let in_item = stacks(vec![
            ScopeKind::List(ListType::Enum),
            ScopeKind::Item(ListType::Enum),
        ]);
        assert!(in_item.check_nesting(&ScopeKind::List(ListType::Desc)).is_ok());
        assert!(in_item.check_nesting(&ScopeKind::Display).is_ok());
        assert_eq!(
            in_item.check_nesting(&ScopeKind::List(ListType::Table)),
            Err("Bl -t table not allowed inside Bl -t enum".to_string())
        );

        let in_row = stacks(vec![
            ScopeKind::List(ListType::Table),
            ScopeKind::Item(ListType::Table),
        ]);
        assert!(in_row.check_nesting(&ScopeKind::Display).is_err());

        let in_display = stacks(vec![ScopeKind::Display]);
        assert!(in_display.check_nesting(&ScopeKind::List(ListType::Verse)).is_ok());
    }

    #[test]
    fn test_display() {
        let mut s = scope(ScopeKind::Display);
        s.tag = Some("quote".into());
        s.in_user_macro = Some("q".into());
        assert_eq!(s.to_string(), "Bd -t quote opened at doc:1 in user macro `q`");
    }
}

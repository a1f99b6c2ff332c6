//! Header numbering, lists of X, and cross-reference ids.

use std::collections::HashMap;

/// The four lists a document can print with `.Tc`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LoxKind {
    /// Headers.
    Toc,
    /// Figures (`.Fig`).
    Figures,
    /// Titled tables (`.Bl -t table`).
    Tables,
    /// Titled poems (`.Bl -t verse`).
    Poems,
}

impl LoxKind {
    pub const ALL: [LoxKind; 4] = [LoxKind::Toc, LoxKind::Figures, LoxKind::Tables, LoxKind::Poems];

    fn index(self) -> usize {
        match self {
            LoxKind::Toc => 0,
            LoxKind::Figures => 1,
            LoxKind::Tables => 2,
            LoxKind::Poems => 3,
        }
    }

    /// Reference prefix used when an entry has no explicit id.
    pub fn prefix(self) -> &'static str {
        match self {
            LoxKind::Toc => "s",
            LoxKind::Figures => "fig",
            LoxKind::Tables => "tbl",
            LoxKind::Poems => "poem",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoxEntry {
    /// Position of the entry in its list, starting at 1.
    pub count: usize,
    pub macro_name: String,
    /// Displayed number, empty for `-nonum` headers.
    pub num: String,
    pub reference: String,
    pub title: String,
    pub nonum: bool,
    pub id: Option<String>,
}

/// Entries of the four lists, filled during the info pass.
#[derive(Debug, Clone, Default)]
pub struct LoxRegistry {
    lists: [Vec<LoxEntry>; 4],
}

impl LoxRegistry {
    pub fn get(&self, kind: LoxKind) -> &[LoxEntry] {
        &self.lists[kind.index()]
    }

    pub fn push(&mut self, kind: LoxKind, entry: LoxEntry) {
        self.lists[kind.index()].push(entry);
    }
}

/// Which header macros the document uses, known after the info pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HeaderLevels {
    pub has_part: bool,
    pub has_chapter: bool,
}

impl HeaderLevels {
    /// Nesting level of a header macro, 1 for the outermost one in use.
    pub fn level(&self, macro_name: &str) -> usize {
        let base = match macro_name {
            "Pt" => 0,
            "Ch" => 1,
            "Sh" => 2,
            _ => 3,
        };
        let unused_above = match base {
            0 => 0,
            1 => usize::from(!self.has_part),
            _ => usize::from(!self.has_part) + usize::from(!self.has_chapter),
        };
        base + 1 - unused_above
    }
}

/// Sequence counters, advanced identically in both passes.
#[derive(Debug, Clone, Default)]
pub struct TocCounters {
    part: usize,
    chapter: usize,
    section: usize,
    subsection: usize,
    seen_part: bool,
    seen_chapter: bool,
    headers: usize,
    figures: usize,
    tables: usize,
    poems: usize,
    /// Document-wide, so it survives [`TocCounters::reset_counts`].
    pub levels: HeaderLevels,
}

impl TocCounters {
    /// Note a header macro seen during the info pass.
    pub fn note_header(&mut self, macro_name: &str) {
        match macro_name {
            "Pt" => self.levels.has_part = true,
            "Ch" => self.levels.has_chapter = true,
            _ => {}
        }
    }

    /// Advance the counters for a header and return its displayed number.
    ///
    /// Sections are numbered within the current chapter if a chapter was
    /// seen, else within the current part; chapters run across parts.
    /// Unnumbered headers leave every counter untouched.
    pub fn advance_header(&mut self, macro_name: &str, nonum: bool) -> String {
        self.headers += 1;
        if nonum {
            return String::new();
        }
        match macro_name {
            "Pt" => {
                self.part += 1;
                self.section = 0;
                self.subsection = 0;
                self.seen_part = true;
                self.part.to_string()
            }
            "Ch" => {
                self.chapter += 1;
                self.section = 0;
                self.subsection = 0;
                self.seen_chapter = true;
                self.chapter.to_string()
            }
            "Sh" => {
                self.section += 1;
                self.subsection = 0;
                self.section_number()
            }
            _ => {
                self.subsection += 1;
                format!("{}.{}", self.section_number(), self.subsection)
            }
        }
    }

    fn section_number(&self) -> String {
        if self.seen_chapter {
            format!("{}.{}", self.chapter, self.section)
        } else if self.seen_part {
            format!("{}.{}", self.part, self.section)
        } else {
            self.section.to_string()
        }
    }

    /// Headers seen so far in this pass.
    pub fn header_count(&self) -> usize {
        self.headers
    }

    /// Next sequence number of a figure, table or poem.
    pub fn next_count(&mut self, kind: LoxKind) -> usize {
        let counter = match kind {
            LoxKind::Toc => &mut self.headers,
            LoxKind::Figures => &mut self.figures,
            LoxKind::Tables => &mut self.tables,
            LoxKind::Poems => &mut self.poems,
        };
        *counter += 1;
        *counter
    }

    /// Zero every counter, keeping the document-wide header levels.
    pub fn reset_counts(&mut self) {
        *self = TocCounters {
            levels: self.levels,
            ..TocCounters::default()
        };
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdKind {
    /// Header, with its macro name.
    Header(String),
    Figure,
    Table,
    Poem,
    Display,
    Markup,
    Image,
}

/// What `.Sx` needs to know about an id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdInfo {
    pub reference: String,
    /// Default link text.
    pub name: String,
    pub kind: IdKind,
}

/// Id table: the first registration of an id wins.
#[derive(Debug, Clone, Default)]
pub struct IdTable {
    ids: HashMap<String, IdInfo>,
}

impl IdTable {
    /// Register `id`, returning `false` if it was already taken.
    pub fn register(&mut self, id: &str, info: IdInfo) -> bool {
        if self.ids.contains_key(id) {
            return false;
        }
        self.ids.insert(id.to_string(), info);
        true
    }

    pub fn get(&self, id: &str) -> Option<&IdInfo> {
        self.ids.get(id)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

/// One counter-advancing operation, recorded in each pass so that the two
/// sequences can be compared.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CounterEvent {
    pub macro_name: String,
    pub id: Option<String>,
    pub count: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    // =========================================================================
    // Numbering
    // =========================================================================

    #[test]
    fn test_sections_within_chapters() {
        let mut c = TocCounters::default();
        let nums: Vec<String> = ["Ch", "Sh", "Ss", "Sh", "Ch", "Sh"]
            .iter()
            .map(|m| c.advance_header(m, false))
            .collect();
        assert_eq!(nums, vec!["1", "1.1", "1.1.1", "1.2", "2", "2.1"]);
    }

    #[test]
    fn test_sections_within_part_without_chapters() {
        let mut c = TocCounters::default();
        assert_eq!(c.advance_header("Pt", false), "1");
        assert_eq!(c.advance_header("Sh", false), "1.1");
        assert_eq!(c.advance_header("Sh", false), "1.2");
        assert_eq!(c.advance_header("Pt", false), "2");
        assert_eq!(c.advance_header("Sh", false), "2.1");
    }

    #[test]
    fn test_chapters_run_across_parts() {
        let mut c = TocCounters::default();
        c.advance_header("Pt", false);
        c.advance_header("Ch", false);
        c.advance_header("Pt", false);
        assert_eq!(c.advance_header("Ch", false), "2");
        assert_eq!(c.advance_header("Sh", false), "2.1");
    }

    #[test]
    fn test_nonum_does_not_advance() {
        let mut c = TocCounters::default();
        assert_eq!(c.advance_header("Sh", false), "1");
        assert_eq!(c.advance_header("Sh", true), "");
        assert_eq!(c.advance_header("Sh", false), "2");
        assert_eq!(c.header_count(), 3);
    }

    #[test]
    fn test_reset_keeps_levels() {
        let mut c = TocCounters::default();
        c.note_header("Ch");
        c.advance_header("Ch", false);
        c.next_count(LoxKind::Figures);
        c.reset_counts();
        assert!(c.levels.has_chapter);
        assert_eq!(c.header_count(), 0);
        assert_eq!(c.next_count(LoxKind::Figures), 1);
        assert_eq!(c.advance_header("Sh", false), "1");
    }

    #[test]
    fn test_header_levels() {
        let all = HeaderLevels { has_part: true, has_chapter: true };
        assert_eq!(all.level("Pt"), 1);
        assert_eq!(all.level("Sh"), 3);

        let sections_only = HeaderLevels::default();
        assert_eq!(sections_only.level("Sh"), 1);
        assert_eq!(sections_only.level("Ss"), 2);

        let chapters = HeaderLevels { has_part: false, has_chapter: true };
        assert_eq!(chapters.level("Ch"), 1);
        assert_eq!(chapters.level("Ss"), 3);
    }

    // =========================================================================
    // Ids
    // =========================================================================

    #[test]
    fn test_first_id_registration_wins() {
        let mut ids = IdTable::default();
        let info = |name: &str| IdInfo {
            reference: format!("#{name}"),
            name: name.into(),
            kind: IdKind::Figure,
        };
        assert!(ids.register("x", info("first")));
        assert!(!ids.register("x", info("second")));
        assert_eq!(ids.get("x").unwrap().name, "first");
        assert_eq!(ids.len(), 1);
    }
}

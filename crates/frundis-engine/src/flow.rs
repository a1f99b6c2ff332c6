//! Paragraphs, text lines, and the closing of scopes.
//!
//! Paragraph state changes identically in both passes; only the renderer
//! calls are limited to the process pass.

use crate::context::Context;
use crate::renderer::{ParagraphBreak, Renderer};
use crate::scope::{ListType, Scope, ScopeKind};
use frundis_parser::Inline;

/// Where text would land.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TextContext {
    /// Regular paragraphs.
    Flow,
    Verse,
    TableCell,
    /// Directly inside a non-verse list, before any `It`.
    ListHead,
}

impl Context {
    pub(crate) fn text_context(&self) -> TextContext {
        match self.state.scopes.top_structural_kind() {
            Some(ScopeKind::List(ListType::Verse)) => TextContext::Verse,
            Some(ScopeKind::List(_)) => TextContext::ListHead,
            Some(ScopeKind::Item(ListType::Table)) => TextContext::TableCell,
            _ => TextContext::Flow,
        }
    }

    // =========================================================================
    // Text
    // =========================================================================

    pub(crate) fn process_text(&mut self, r: &mut dyn Renderer, inlines: &[Inline]) {
        let text = self.text_of(inlines);
        if let Some(raw) = self.state.raw.as_mut() {
            raw.text.push_str(&text);
            if !text.ends_with('\n') {
                raw.text.push('\n');
            }
            return;
        }
        for line in text.split_inclusive('\n') {
            let content = line.strip_suffix('\n').unwrap_or(line);
            if content.trim().is_empty() {
                self.blank_line(r);
            } else {
                self.text_line(r, content);
            }
        }
    }

    fn text_line(&mut self, r: &mut dyn Renderer, content: &str) {
        match self.text_context() {
            TextContext::Verse => {
                if let Some(top) = self.state.scopes.top_structural() {
                    self.state.scopes.block[top].count += 1;
                }
                if self.processing() {
                    let text = r.render_text(content);
                    self.state.out.push_str(&text);
                    r.end_verse_line(&mut self.state.out);
                }
            }
            TextContext::ListHead => self.error("text outside of an It in a list; ignored"),
            TextContext::TableCell => self.write_line(r, content),
            TextContext::Flow => {
                self.begin_paragraph_if_needed(r);
                self.write_line(r, content);
            }
        }
    }

    fn blank_line(&mut self, r: &mut dyn Renderer) {
        match self.text_context() {
            TextContext::Verse => {
                let processing = self.processing();
                let Some(top) = self.state.scopes.top_structural() else {
                    return;
                };
                let scope = &mut self.state.scopes.block[top];
                if scope.count > 0 {
                    scope.count = 0;
                    if processing {
                        r.end_stanza(&mut self.state.out);
                    }
                }
            }
            TextContext::Flow => self.end_paragraph(r, ParagraphBreak::Normal),
            TextContext::TableCell | TextContext::ListHead => {}
        }
    }

    fn write_line(&mut self, r: &mut dyn Renderer, content: &str) {
        if self.processing() {
            let text = r.render_text(content);
            self.state.out.push_str(&text);
            self.state.out.push('\n');
        }
    }

    // =========================================================================
    // Paragraphs and phrasing
    // =========================================================================

    pub(crate) fn begin_paragraph_if_needed(&mut self, r: &mut dyn Renderer) {
        if self.state.in_paragraph {
            return;
        }
        self.state.in_paragraph = true;
        if self.processing() {
            r.begin_paragraph(&mut self.state.out);
        }
    }

    /// End the current paragraph, closing markup spans still open in it.
    pub(crate) fn end_paragraph(&mut self, r: &mut dyn Renderer, kind: ParagraphBreak) {
        self.close_inline_scopes(r);
        if !self.state.in_paragraph {
            return;
        }
        self.state.in_paragraph = false;
        if self.processing() {
            r.end_paragraph(&mut self.state.out, kind);
        }
    }

    /// A display block, list, figure or similar begins.
    pub(crate) fn begin_block_construct(&mut self, r: &mut dyn Renderer) {
        self.end_paragraph(r, ParagraphBreak::Soft);
    }

    /// Prepare for inline output of a macro. With `nospace`, the output
    /// sticks to what precedes it.
    pub(crate) fn begin_phrasing(&mut self, r: &mut dyn Renderer, nospace: bool) {
        match self.text_context() {
            TextContext::Flow if !self.state.in_paragraph => self.begin_paragraph_if_needed(r),
            TextContext::Flow | TextContext::TableCell => {
                if nospace {
                    self.trim_separator();
                }
            }
            TextContext::Verse => {}
            TextContext::ListHead => self.error("found inline macro outside of an It in a list"),
        }
    }

    /// Write rendered inline text followed by the line separator.
    pub(crate) fn phrase(&mut self, r: &mut dyn Renderer, text: &str) {
        self.begin_phrasing(r, false);
        if self.processing() {
            let text = r.render_text(text);
            self.state.out.push_str(&text);
            self.state.out.push('\n');
        }
    }

    /// Terminate the output of a phrasing macro.
    pub(crate) fn end_phrasing(&mut self) {
        if self.processing() {
            self.state.out.push('\n');
        }
    }

    pub(crate) fn trim_separator(&mut self) {
        if self.processing() && self.state.out.ends_with('\n') {
            self.state.out.pop();
        }
    }

    // =========================================================================
    // Closing scopes
    // =========================================================================

    /// Innermost scope of `kind` a closing macro refers to, reporting when
    /// there is none.
    pub(crate) fn find_closable(&mut self, kind: &ScopeKind, tag: Option<&str>) -> Option<usize> {
        let stack = if kind.is_inline() {
            &self.state.scopes.inline
        } else {
            &self.state.scopes.block
        };
        let found = stack
            .iter()
            .rposition(|s| &s.kind == kind && (tag.is_none() || s.tag.as_deref() == tag));
        let opener = kind.opener();
        match (found, tag) {
            (Some(index), Some(_)) => Some(index),
            (Some(index), None) => {
                let required = stack[index].tag.clone().filter(|_| stack[index].tag_required);
                if let Some(required) = required {
                    self.error(format!("missing -t {required}: {opener} was opened with -r"));
                }
                Some(index)
            }
            (None, Some(tag)) => {
                self.error(format!("no open {opener} with tag `{tag}`"));
                None
            }
            (None, None) => {
                self.error(format!("no open {opener} to close"));
                None
            }
        }
    }

    /// Force-close a scope the author left open.
    fn force_close(&mut self, r: &mut dyn Renderer, scope: Scope, trigger: &str) {
        let item_of_list = matches!(scope.kind, ScopeKind::Item(_))
            && matches!(
                self.state.scopes.block.last().map(|s| &s.kind),
                Some(ScopeKind::List(_))
            );
        if !item_of_list {
            self.error(format!("found {trigger} while {scope} isn't closed yet"));
        }
        self.quietly(|ctx| ctx.close_scope(r, scope));
    }

    /// Remove the block scope at `index`, force-closing the scopes opened
    /// after it. `#if` scopes above it stay open.
    pub(crate) fn take_block_scope(&mut self, r: &mut dyn Renderer, index: usize) -> Option<Scope> {
        let trigger = self.trigger();
        let mut conditionals = Vec::new();
        while self.state.scopes.block.len() > index + 1 {
            let Some(scope) = self.state.scopes.block.pop() else {
                break;
            };
            if scope.kind == ScopeKind::Conditional {
                conditionals.push(scope);
            } else {
                self.force_close(r, scope, &trigger);
            }
        }
        let target = self.state.scopes.block.pop();
        self.state.scopes.block.extend(conditionals.into_iter().rev());
        target
    }

    pub(crate) fn take_inline_scope(
        &mut self,
        r: &mut dyn Renderer,
        index: usize,
    ) -> Option<Scope> {
        let trigger = self.trigger();
        while self.state.scopes.inline.len() > index + 1 {
            let Some(scope) = self.state.scopes.inline.pop() else {
                break;
            };
            self.error(format!("found {trigger} while {scope} isn't closed yet"));
            self.quietly(|ctx| ctx.close_markup(r, &scope, ""));
        }
        self.state.scopes.inline.pop()
    }

    /// Force-close every markup span.
    pub(crate) fn close_inline_scopes(&mut self, r: &mut dyn Renderer) {
        if self.state.scopes.inline.is_empty() {
            return;
        }
        let trigger = self.trigger();
        while let Some(scope) = self.state.scopes.inline.pop() {
            self.error(format!("found {trigger} while {scope} isn't closed yet"));
            self.quietly(|ctx| ctx.close_markup(r, &scope, ""));
        }
    }

    /// Before a header: end the paragraph and force-close block scopes down
    /// to the innermost `#if`.
    pub(crate) fn close_for_header(&mut self, r: &mut dyn Renderer) {
        self.end_paragraph(r, ParagraphBreak::Normal);
        let trigger = self.trigger();
        while self
            .state
            .scopes
            .block
            .last()
            .is_some_and(|s| s.kind != ScopeKind::Conditional)
        {
            if let Some(scope) = self.state.scopes.block.pop() {
                self.force_close(r, scope, &trigger);
            }
        }
    }

    /// Emit the closing calls of a scope already removed from its stack.
    pub(crate) fn close_scope(&mut self, r: &mut dyn Renderer, scope: Scope) {
        match scope.kind {
            ScopeKind::Display => self.close_display(r, &scope),
            ScopeKind::List(ty) => self.close_list(r, ty),
            ScopeKind::Item(ty) => self.close_item(r, &scope, ty),
            ScopeKind::Markup => self.close_markup(r, &scope, ""),
            ScopeKind::Conditional => {}
        }
    }

    pub(crate) fn close_display(&mut self, r: &mut dyn Renderer, scope: &Scope) {
        self.end_paragraph(r, ParagraphBreak::Normal);
        if self.processing() {
            let tag = scope
                .tag
                .as_deref()
                .and_then(|name| self.dtags.get(name))
                .cloned()
                .unwrap_or_default();
            r.end_display_block(&mut self.state.out, &tag);
        }
    }

    pub(crate) fn close_item(&mut self, r: &mut dyn Renderer, scope: &Scope, ty: ListType) {
        let processing = self.processing();
        match ty {
            ListType::Table => {
                let cells = scope.count + 1;
                if !processing {
                    let slot = scope.table.and_then(|slot| self.table_columns.get_mut(slot));
                    if let Some(columns) = slot {
                        *columns = (*columns).max(cells);
                    }
                }
                if processing {
                    r.end_table_cell(&mut self.state.out);
                    r.end_table_row(&mut self.state.out);
                }
            }
            ListType::Verse => {}
            ListType::Item | ListType::Enum | ListType::Desc => {
                self.end_paragraph(r, ParagraphBreak::Item);
                if processing {
                    let out = &mut self.state.out;
                    match ty {
                        ListType::Item => r.end_item(out),
                        ListType::Enum => r.end_enum_item(out),
                        _ => r.end_desc_value(out),
                    }
                }
            }
        }
    }

    pub(crate) fn close_list(&mut self, r: &mut dyn Renderer, ty: ListType) {
        if !self.processing() {
            return;
        }
        let out = &mut self.state.out;
        match ty {
            ListType::Item => r.end_item_list(out),
            ListType::Enum => r.end_enum_list(out),
            ListType::Desc => r.end_desc_list(out),
            ListType::Verse => r.end_verse(out),
            ListType::Table => r.end_table(out),
        }
    }

    /// `punct` is already rendered.
    pub(crate) fn close_markup(&mut self, r: &mut dyn Renderer, scope: &Scope, punct: &str) {
        if !self.processing() {
            return;
        }
        let tag = scope
            .tag
            .as_deref()
            .and_then(|name| self.mtags.get(name))
            .cloned()
            .unwrap_or_default();
        self.trim_separator();
        r.end_markup_block(&mut self.state.out, &tag, punct);
        self.state.out.push('\n');
    }
}

//! Display blocks and lists: `Bd`, `Ed`, `Bl`, `El`, `It`, `Ta`.

use crate::context::Context;
use crate::options::{OptKind, OptionSpec};
use crate::renderer::{Renderer, TableInfo, VerseInfo};
use crate::scope::{ListType, ScopeKind};
use crate::toc::{IdInfo, IdKind, LoxKind};
use crate::EngineError;
use frundis_parser::Macro;

const BD_OPTIONS: &OptionSpec = &[
    ("r", OptKind::Flag),
    ("t", OptKind::Value),
    ("id", OptKind::Value),
];
const ED_OPTIONS: &OptionSpec = &[("t", OptKind::Value)];
const BL_OPTIONS: &OptionSpec = &[("t", OptKind::Value), ("id", OptKind::Value)];

pub(super) fn begin_display(
    ctx: &mut Context,
    r: &mut dyn Renderer,
    m: &Macro,
) -> Result<(), EngineError> {
    let (opts, rest) = ctx.options(&m.args, BD_OPTIONS);
    if !rest.is_empty() {
        ctx.error("too many arguments");
    }
    if let Err(message) = ctx.state.scopes.check_nesting(&ScopeKind::Display) {
        ctx.error(message);
        return Ok(());
    }
    let tag = ctx.opt_text(&opts, "t");
    let id = ctx.opt_text(&opts, "id");
    let tag_required = opts.flag("r");
    if tag_required && tag.is_none() {
        ctx.error("-r requires -t");
    }

    ctx.begin_block_construct(r);
    if let Some(id) = &id {
        let info = IdInfo {
            reference: r.gen_ref("", id, true),
            name: String::new(),
            kind: IdKind::Display,
        };
        ctx.register_id(id, info);
    }
    if ctx.processing() {
        let dtag = ctx.dtag(tag.as_deref());
        r.begin_display_block(ctx.out(), &dtag, id.as_deref());
    }

    let mut scope = ctx.new_scope(ScopeKind::Display);
    scope.tag = tag;
    scope.id = id;
    scope.tag_required = tag_required;
    ctx.state.scopes.push(scope);
    Ok(())
}

pub(super) fn end_display(
    ctx: &mut Context,
    r: &mut dyn Renderer,
    m: &Macro,
) -> Result<(), EngineError> {
    let (opts, rest) = ctx.options(&m.args, ED_OPTIONS);
    if !rest.is_empty() {
        ctx.error("too many arguments");
    }
    let tag = ctx.opt_text(&opts, "t");
    let Some(index) = ctx.find_closable(&ScopeKind::Display, tag.as_deref()) else {
        return Ok(());
    };
    ctx.close_inline_scopes(r);
    if let Some(scope) = ctx.take_block_scope(r, index) {
        ctx.close_display(r, &scope);
    }
    Ok(())
}

pub(super) fn begin_list(
    ctx: &mut Context,
    r: &mut dyn Renderer,
    m: &Macro,
) -> Result<(), EngineError> {
    let (opts, rest) = ctx.options(&m.args, BL_OPTIONS);
    let ty = match ctx.opt_text(&opts, "t") {
        None => ListType::Item,
        Some(name) => ListType::parse(&name).unwrap_or_else(|| {
            ctx.error(format!("invalid list type `{name}`"));
            ListType::Item
        }),
    };
    let kind = ScopeKind::List(ty);
    if let Err(message) = ctx.state.scopes.check_nesting(&kind) {
        ctx.error(message);
        return Ok(());
    }
    let title = ctx.args_text(rest);
    let id = ctx.opt_text(&opts, "id");
    let titled = matches!(ty, ListType::Table | ListType::Verse);
    if !title.is_empty() && !titled {
        ctx.error(format!("title ignored for Bl -t {}", ty.name()));
    }

    ctx.begin_block_construct(r);
    let mut scope = ctx.new_scope(kind);
    scope.id = id.clone();

    let entry = if titled && !title.is_empty() {
        let lox = if ty == ListType::Table { LoxKind::Tables } else { LoxKind::Poems };
        ctx.numbered_entry(r, lox, "Bl", &title, id.as_deref())
    } else {
        if let Some(id) = &id {
            let info = IdInfo {
                reference: r.gen_ref("", id, true),
                name: String::new(),
                kind: IdKind::Display,
            };
            ctx.register_id(id, info);
        }
        None
    };

    if ty == ListType::Table {
        let slot = ctx.state.tables_opened;
        ctx.state.tables_opened += 1;
        if !ctx.processing() {
            ctx.table_columns.push(0);
        }
        scope.table = Some(slot);
    }

    if ctx.processing() {
        let title = r.render_text(&title);
        match ty {
            ListType::Item => r.begin_item_list(ctx.out()),
            ListType::Enum => r.begin_enum_list(ctx.out()),
            ListType::Desc => r.begin_desc_list(ctx.out()),
            ListType::Verse => {
                let verse = VerseInfo {
                    title: &title,
                    entry: entry.as_ref(),
                };
                r.begin_verse(ctx.out(), &verse);
            }
            ListType::Table => {
                let columns = scope
                    .table
                    .and_then(|slot| ctx.table_columns.get(slot))
                    .copied()
                    .unwrap_or(0);
                let table = TableInfo {
                    title: &title,
                    columns,
                    entry: entry.as_ref(),
                };
                r.begin_table(ctx.out(), &table);
            }
        }
    }

    ctx.state.scopes.push(scope);
    Ok(())
}

pub(super) fn end_list(
    ctx: &mut Context,
    r: &mut dyn Renderer,
    m: &Macro,
) -> Result<(), EngineError> {
    if !m.args.is_empty() {
        ctx.error("too many arguments");
    }
    let Some(index) = ctx
        .state
        .scopes
        .find_block(|s| matches!(s.kind, ScopeKind::List(_)))
    else {
        ctx.error("no open Bl to close");
        return Ok(());
    };
    ctx.close_inline_scopes(r);
    if let Some(scope) = ctx.take_block_scope(r, index) {
        if let ScopeKind::List(ty) = scope.kind {
            ctx.close_list(r, ty);
        }
    }
    Ok(())
}

/// `.It`: close the current item, if any, and open the next one.
pub(super) fn item(ctx: &mut Context, r: &mut dyn Renderer, m: &Macro) -> Result<(), EngineError> {
    let Some((list, current)) = ctx.state.scopes.current_list() else {
        ctx.error("It outside of a list");
        return Ok(());
    };
    let ScopeKind::List(ty) = ctx.state.scopes.block[list].kind else {
        return Ok(());
    };
    if ty == ListType::Verse {
        ctx.error("It not allowed in Bl -t verse");
        return Ok(());
    }

    ctx.close_inline_scopes(r);
    if let Some(index) = current {
        if let Some(scope) = ctx.take_block_scope(r, index) {
            ctx.close_item(r, &scope, ty);
        }
    }

    let mut scope = ctx.new_scope(ScopeKind::Item(ty));
    scope.table = ctx.state.scopes.block[list].table;
    if ty == ListType::Desc {
        let name = ctx.args_text(&m.args);
        if ctx.processing() {
            let name = r.render_text(&name);
            r.desc_name(ctx.out(), &name);
            r.begin_desc_value(ctx.out());
        }
        ctx.state.scopes.push(scope);
        return Ok(());
    }

    if ctx.processing() {
        match ty {
            ListType::Item => r.begin_item(ctx.out()),
            ListType::Enum => r.begin_enum_item(ctx.out()),
            _ => {
                r.begin_table_row(ctx.out());
                r.begin_table_cell(ctx.out());
            }
        }
    }
    ctx.state.scopes.push(scope);
    if !m.args.is_empty() {
        let text = ctx.args_text(&m.args);
        ctx.phrase(r, &text);
    }
    Ok(())
}

/// `.Ta`: next table cell.
pub(super) fn table_cell(
    ctx: &mut Context,
    r: &mut dyn Renderer,
    m: &Macro,
) -> Result<(), EngineError> {
    let row = ctx
        .state
        .scopes
        .top_structural()
        .filter(|&i| ctx.state.scopes.block[i].kind == ScopeKind::Item(ListType::Table));
    let Some(row) = row else {
        ctx.error("Ta outside of a table row");
        return Ok(());
    };

    ctx.close_inline_scopes(r);
    ctx.state.scopes.block[row].count += 1;
    if ctx.processing() {
        r.end_table_cell(ctx.out());
        r.begin_table_cell(ctx.out());
    }
    if !m.args.is_empty() {
        let text = ctx.args_text(&m.args);
        ctx.phrase(r, &text);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use crate::test_support::{compile, messages};
    use pretty_assertions::assert_eq;

    // =========================================================================
    // Display blocks
    // =========================================================================

    #[test]
    fn test_display_block() {
        let (out, ctx) = compile("before\n.Bd -id q\nquoted\n.Ed\n");
        assert_eq!(out, "[P]before\n[/P soft]\n[Bd id=q]\n[P]quoted\n[/P]\n[/Bd]\n");
        assert!(ctx.diagnostics().is_empty(), "{:?}", messages(&ctx));
        assert!(ctx.id("q").is_some());
    }

    #[test]
    fn test_display_tags() {
        let source = ".X dtag -t quote -c blockquote\n.Bd -t quote\ntext\n.Ed -t quote\n";
        let (out, ctx) = compile(source);
        assert!(out.starts_with("[Bd blockquote]\n"), "{out}");
        assert!(ctx.diagnostics().is_empty(), "{:?}", messages(&ctx));
    }

    #[test]
    fn test_unknown_display_tag() {
        let (_, ctx) = compile(".Bd -t nope\n.Ed\n");
        assert_eq!(messages(&ctx), vec!["unknown tag `nope`"]);
    }

    #[test]
    fn test_required_tag() {
        let source = ".X dtag -t t\n.Bd -r -t t\n.Ed\n";
        let (_, ctx) = compile(source);
        assert_eq!(messages(&ctx), vec!["missing -t t: Bd was opened with -r"]);
    }

    #[test]
    fn test_tagged_close_skips_inner_block() {
        let source = ".X dtag -t a\n.X dtag -t b\n.Bd -t a\n.Bd -t b\n.Ed -t a\n";
        let (out, ctx) = compile(source);
        assert_eq!(out, "[Bd]\n[Bd]\n[/Bd]\n[/Bd]\n");
        let found = messages(&ctx);
        assert_eq!(found.len(), 1);
        assert!(
            found[0].starts_with("found Ed while Bd -t b opened at test.frundis:4"),
            "{found:?}"
        );
    }

    #[test]
    fn test_ed_without_bd() {
        let (_, ctx) = compile(".Ed\n");
        assert_eq!(messages(&ctx), vec!["no open Bd to close"]);
    }

    // =========================================================================
    // Lists
    // =========================================================================

    #[test]
    fn test_item_list() {
        let (out, ctx) = compile(".Bl\n.It one\n.It\ntwo\n.El\n");
        assert_eq!(
            out,
            "[Bl item]\n[It][P]one\n[/P item]\n[/It]\n[It][P]two\n[/P item]\n[/It]\n[/Bl]\n"
        );
        assert!(ctx.diagnostics().is_empty(), "{:?}", messages(&ctx));
    }

    #[test]
    fn test_desc_list() {
        let (out, _) = compile(".Bl -t desc\n.It term\nvalue\n.El\n");
        assert_eq!(out, "[Bl desc]\n[Dt]term[/Dt][Dd][P]value\n[/P item]\n[/Dd]\n[/Bl]\n");
    }

    #[test]
    fn test_nested_lists() {
        let (_, ctx) = compile(".Bl -t enum\n.It\n.Bl\n.It x\n.El\n.El\n");
        assert!(ctx.diagnostics().is_empty(), "{:?}", messages(&ctx));
    }

    #[test]
    fn test_list_nesting_errors() {
        let (_, ctx) = compile(".Bl\n.Bd\n.Ed\n.El\n");
        assert_eq!(
            messages(&ctx)[0],
            "found Bd directly inside Bl -t item: missing It"
        );

        let (_, ctx) = compile(".Bl\n.It\n.Bl -t table\n.El\n.El\n");
        assert_eq!(messages(&ctx)[0], "Bl -t table not allowed inside Bl -t item");
    }

    #[test]
    fn test_text_outside_item() {
        let (out, ctx) = compile(".Bl\nlost\n.El\n");
        assert_eq!(out, "[Bl item]\n[/Bl]\n");
        assert_eq!(messages(&ctx), vec!["text outside of an It in a list; ignored"]);
    }

    #[test]
    fn test_it_outside_list() {
        let (_, ctx) = compile(".It x\n");
        assert_eq!(messages(&ctx), vec!["It outside of a list"]);
    }

    #[test]
    fn test_verse() {
        let (out, ctx) = compile(".Bl -t verse Song\nline one\nline two\n\nsecond stanza\n.El\n");
        assert_eq!(
            out,
            "[Bl verse n=1]Song\nline one\nline two\n[stanza]\nsecond stanza\n[/Bl]\n"
        );
        assert_eq!(ctx.lox(crate::LoxKind::Poems).len(), 1);
    }

    // =========================================================================
    // Tables
    // =========================================================================

    #[test]
    fn test_table_columns_known_in_advance() {
        let source = ".Bl -t table -id t1 Scores\n.It a\n.Ta b\n.It c\n.Ta d\n.Ta e\n.El\n";
        let (out, ctx) = compile(source);
        assert!(out.starts_with("[Bl table cols=3 n=1]Scores\n"), "{out}");
        assert!(out.contains("[Tr][Td]a\n[/Td][Td]b\n[/Td][/Tr]\n"), "{out}");
        assert_eq!(ctx.table_columns(), &[3]);
        assert_eq!(ctx.id("t1").unwrap().reference, "tbl-t1");
        assert!(ctx.diagnostics().is_empty(), "{:?}", messages(&ctx));
    }

    #[test]
    fn test_untitled_table_is_not_numbered() {
        let (_, ctx) = compile(".Bl -t table\n.It a\n.El\n.Bl -t table T\n.It b\n.El\n");
        let tables = ctx.lox(crate::LoxKind::Tables);
        assert_eq!(tables.len(), 1);
        assert_eq!(tables[0].num, "1");
        assert_eq!(ctx.table_columns(), &[1, 1]);
    }

    #[test]
    fn test_ta_outside_table() {
        let (_, ctx) = compile(".Bl\n.It\n.Ta x\n.El\n");
        assert_eq!(messages(&ctx), vec!["Ta outside of a table row"]);
    }
}

//! Headers, tables of contents and figures.

use crate::context::Context;
use crate::options::{OptKind, OptionSpec};
use crate::renderer::{FigureInfo, HeaderInfo, HeaderRef, Renderer, TocRequest};
use crate::toc::{IdInfo, IdKind, LoxEntry, LoxKind};
use crate::EngineError;
use frundis_parser::Macro;

const HEADER_OPTIONS: &OptionSpec = &[("nonum", OptKind::Flag), ("id", OptKind::Value)];
const TC_OPTIONS: &OptionSpec = &[
    ("toc", OptKind::Flag),
    ("lof", OptKind::Flag),
    ("lot", OptKind::Flag),
    ("lop", OptKind::Flag),
    ("nonum", OptKind::Flag),
    ("summary", OptKind::Flag),
    ("mini", OptKind::Flag),
    ("title", OptKind::Value),
];
const FIG_OPTIONS: &OptionSpec = &[("link", OptKind::Value), ("id", OptKind::Value)];

/// `.Pt`, `.Ch`, `.Sh` and `.Ss`.
pub(super) fn header(
    ctx: &mut Context,
    r: &mut dyn Renderer,
    m: &Macro,
) -> Result<(), EngineError> {
    let (opts, rest) = ctx.options(&m.args, HEADER_OPTIONS);
    let title = ctx.args_text(rest);
    if title.is_empty() {
        ctx.error("requires a title");
        return Ok(());
    }
    let nonum = opts.flag("nonum");
    let id = ctx.opt_text(&opts, "id");
    let name = m.name.as_str();

    ctx.close_for_header(r);
    if !ctx.processing() {
        ctx.toc.note_header(name);
    }
    let num = ctx.toc.advance_header(name, nonum);
    let count = ctx.toc.header_count();
    let reference = r.header_reference(&HeaderRef {
        macro_name: name,
        num: &num,
        count,
        id: id.as_deref(),
    });
    let entry = ctx.lox_entry(LoxKind::Toc, || LoxEntry {
        count,
        macro_name: name.to_string(),
        num: num.clone(),
        reference: reference.clone(),
        title: title.clone(),
        nonum,
        id: id.clone(),
    });
    if let Some(id) = &id {
        let info = IdInfo {
            reference: reference.clone(),
            name: title.clone(),
            kind: IdKind::Header(name.to_string()),
        };
        ctx.register_id(id, info);
    }
    ctx.record_event(name, id.as_deref(), &count.to_string());

    if ctx.processing() {
        let reference = entry.map_or(reference, |e| e.reference);
        let info = HeaderInfo {
            macro_name: name,
            level: ctx.toc.levels.level(name),
            num: &num,
            nonum,
            id: id.as_deref(),
            reference: &reference,
        };
        let title = r.render_text(&title);
        r.begin_header(ctx.out(), &info);
        ctx.out().push_str(&title);
        r.end_header(ctx.out(), &info);
    }
    Ok(())
}

/// Entries of a mini table of contents: those nested below the header
/// preceding the `.Tc`.
fn mini_entries(ctx: &Context, entries: &[LoxEntry]) -> std::ops::Range<usize> {
    let position = ctx.lox_position(LoxKind::Toc).min(entries.len());
    let Some(current) = position.checked_sub(1).and_then(|i| entries.get(i)) else {
        return 0..entries.len();
    };
    let levels = ctx.toc.levels;
    let level = levels.level(&current.macro_name);
    let len = entries[position..]
        .iter()
        .take_while(|e| levels.level(&e.macro_name) > level)
        .count();
    position..position + len
}

/// `.Tc`: table of contents or list of figures, tables or poems.
pub(super) fn table_of_contents(
    ctx: &mut Context,
    r: &mut dyn Renderer,
    m: &Macro,
) -> Result<(), EngineError> {
    let (opts, rest) = ctx.options(&m.args, TC_OPTIONS);
    if !rest.is_empty() {
        ctx.error("too many arguments");
    }
    let kind = if opts.flag("lof") {
        LoxKind::Figures
    } else if opts.flag("lot") {
        LoxKind::Tables
    } else if opts.flag("lop") {
        LoxKind::Poems
    } else {
        LoxKind::Toc
    };
    let mut mini = opts.flag("mini");
    if mini && kind != LoxKind::Toc {
        ctx.error("-mini only applies to -toc");
        mini = false;
    }
    let title = ctx.opt_text(&opts, "title");

    ctx.begin_block_construct(r);
    let all = ctx.lox(kind);
    let range = if mini { mini_entries(ctx, all) } else { 0..all.len() };
    let title = title.map(|t| r.render_text(&t));
    let request = TocRequest {
        kind,
        entries: &all[range],
        title: title.as_deref(),
        nonum: opts.flag("nonum"),
        summary: opts.flag("summary"),
        mini,
        levels: ctx.toc.levels,
    };
    if ctx.processing() {
        let mut out = String::new();
        r.table_of_contents(&mut out, &request);
        ctx.out().push_str(&out);
    } else {
        r.table_of_contents_info(&request);
    }
    Ok(())
}

/// `.Fig image [caption...]`
pub(super) fn figure(
    ctx: &mut Context,
    r: &mut dyn Renderer,
    m: &Macro,
) -> Result<(), EngineError> {
    let (opts, rest) = ctx.options(&m.args, FIG_OPTIONS);
    let Some((image, caption)) = rest.split_first() else {
        ctx.error("requires an image");
        return Ok(());
    };
    let image = ctx.text_of(image);
    let caption = ctx.args_text(caption);
    let link = ctx.opt_text(&opts, "link");
    let id = ctx.opt_text(&opts, "id");

    ctx.begin_block_construct(r);
    let entry = ctx.numbered_entry(r, LoxKind::Figures, "Fig", &caption, id.as_deref());
    if let (true, Some(entry)) = (ctx.processing(), entry) {
        let caption = r.render_text(&caption);
        let info = FigureInfo {
            image: &image,
            caption: &caption,
            link: link.as_deref(),
            entry: &entry,
        };
        r.figure(ctx.out(), &info);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use crate::test_support::{compile, messages};
    use crate::LoxKind;
    use pretty_assertions::assert_eq;

    fn numbers(ctx: &crate::Context) -> Vec<String> {
        ctx.lox(LoxKind::Toc).iter().map(|e| e.num.clone()).collect()
    }

    // =========================================================================
    // Headers
    // =========================================================================

    #[test]
    fn test_section_numbering() {
        let (out, ctx) = compile(".Sh A\n.Ss B\n.Sh C\n.Ss D\n");
        assert_eq!(numbers(&ctx), vec!["1", "1.1", "2", "2.1"]);
        assert!(out.starts_with("[Sh 1 ref=s1]A[/Sh]\n[Ss 1.1 ref=s2]B[/Ss]\n"), "{out}");
        assert!(ctx.diagnostics().is_empty(), "{:?}", messages(&ctx));
    }

    #[test]
    fn test_sections_within_chapters() {
        let (_, ctx) = compile(".Ch One\n.Sh A\n.Sh B\n.Ch Two\n.Sh C\n");
        assert_eq!(numbers(&ctx), vec!["1", "1.1", "1.2", "2", "2.1"]);
    }

    #[test]
    fn test_sections_within_part() {
        let (_, ctx) = compile(".Pt Part\n.Sh A\n.Sh B\n");
        assert_eq!(numbers(&ctx), vec!["1", "1.1", "1.2"]);
    }

    #[test]
    fn test_nonum_header() {
        let (out, ctx) = compile(".Sh -nonum Preface\n.Sh One\n");
        assert_eq!(out, "[Sh ref=s1]Preface[/Sh]\n[Sh 1 ref=s2]One[/Sh]\n");
        assert!(ctx.lox(LoxKind::Toc)[0].nonum);
    }

    #[test]
    fn test_header_requires_title() {
        let (out, ctx) = compile(".Sh\n");
        assert_eq!(out, "");
        assert_eq!(messages(&ctx), vec!["requires a title"]);
    }

    #[test]
    fn test_header_closes_open_blocks() {
        let (out, ctx) = compile(".Bd\ntext\n.Sh Next\n");
        assert_eq!(out, "[Bd]\n[P]text\n[/P]\n[/Bd]\n[Sh 1 ref=s1]Next[/Sh]\n");
        assert_eq!(
            messages(&ctx),
            vec!["found Sh while Bd opened at test.frundis:1 isn't closed yet"]
        );
    }

    #[test]
    fn test_duplicate_id() {
        let (_, ctx) = compile(".Sh -id x First\n.Sh -id x Second\n");
        assert_eq!(messages(&ctx), vec!["id `x` already used"]);
        assert_eq!(ctx.id("x").unwrap().name, "First");
    }

    // =========================================================================
    // Tables of contents
    // =========================================================================

    #[test]
    fn test_table_of_contents_lists_later_headers() {
        let (out, _) = compile(".Tc\n.Sh A\n.Ss B\n");
        assert_eq!(
            out,
            "[Tc toc]\n1 A #s1\n1.1 B #s2\n[/Tc]\n[Sh 1 ref=s1]A[/Sh]\n[Ss 1.1 ref=s2]B[/Ss]\n"
        );
    }

    #[test]
    fn test_mini_table_of_contents() {
        let (out, ctx) = compile(".Ch One\n.Tc -mini\n.Sh A\n.Ch Two\n.Sh B\n");
        assert!(out.contains("[Tc toc mini]\n1.1 A #s2\n[/Tc]\n"), "{out}");
        assert!(ctx.diagnostics().is_empty(), "{:?}", messages(&ctx));
    }

    #[test]
    fn test_mini_requires_toc() {
        let (_, ctx) = compile(".Tc -lof -mini\n");
        assert_eq!(messages(&ctx), vec!["-mini only applies to -toc"]);
    }

    // =========================================================================
    // Figures
    // =========================================================================

    #[test]
    fn test_figures_and_list_of_figures() {
        let (out, ctx) =
            compile(".Fig -id f1 a.png The first\n.Fig b.png\n.Tc -lof -title Figures\n");
        assert_eq!(
            out,
            "[Fig 1 ref=fig-f1]a.png|The first[/Fig]\n\
             [Fig 2 ref=fig-2]b.png|[/Fig]\n\
             [Tc lof title=Figures]\n1 The first #fig-f1\n2  #fig-2\n[/Tc]\n"
        );
        assert_eq!(ctx.id("f1").unwrap().reference, "fig-f1");
    }

    #[test]
    fn test_figure_ends_paragraph() {
        let (out, _) = compile("text\n.Fig a.png\n");
        assert_eq!(out, "[P]text\n[/P soft]\n[Fig 1 ref=fig-1]a.png|[/Fig]\n");
    }
}

//! Inline macros: markup, links, cross references, images, `D` and `P`.

use crate::context::Context;
use crate::inline::split_punct;
use crate::options::{OptKind, OptionSpec};
use crate::renderer::{ImageInfo, ParagraphBreak, Renderer};
use crate::scope::ScopeKind;
use crate::toc::{IdInfo, IdKind};
use crate::EngineError;
use frundis_parser::Macro;

const BM_OPTIONS: &OptionSpec = &[
    ("ns", OptKind::Flag),
    ("r", OptKind::Flag),
    ("t", OptKind::Value),
    ("id", OptKind::Value),
];
const EM_OPTIONS: &OptionSpec = &[("t", OptKind::Value)];
const SM_OPTIONS: &OptionSpec = &[
    ("ns", OptKind::Flag),
    ("t", OptKind::Value),
    ("id", OptKind::Value),
];
const SX_OPTIONS: &OptionSpec = &[("ns", OptKind::Flag), ("name", OptKind::Value)];
const LK_OPTIONS: &OptionSpec = &[("ns", OptKind::Flag)];
const IM_OPTIONS: &OptionSpec = &[
    ("ns", OptKind::Flag),
    ("link", OptKind::Value),
    ("id", OptKind::Value),
];

fn register_markup_id(ctx: &mut Context, r: &dyn Renderer, id: Option<&str>, name: &str) {
    if let Some(id) = id {
        let info = IdInfo {
            reference: r.gen_ref("", id, true),
            name: name.to_string(),
            kind: IdKind::Markup,
        };
        ctx.register_id(id, info);
    }
}

pub(super) fn begin_markup(
    ctx: &mut Context,
    r: &mut dyn Renderer,
    m: &Macro,
) -> Result<(), EngineError> {
    let (opts, rest) = ctx.options(&m.args, BM_OPTIONS);
    let tag = ctx.opt_text(&opts, "t");
    let id = ctx.opt_text(&opts, "id");
    let words = ctx.args_text(rest);
    let tag_required = opts.flag("r");
    if tag_required && tag.is_none() {
        ctx.error("-r requires -t");
    }

    ctx.begin_phrasing(r, opts.flag("ns"));
    register_markup_id(ctx, r, id.as_deref(), &words);
    if ctx.processing() {
        let mtag = ctx.mtag(tag.as_deref());
        r.begin_markup_block(ctx.out(), &mtag, id.as_deref());
        if !words.is_empty() {
            let words = r.render_text(&words);
            ctx.out().push_str(&words);
            ctx.end_phrasing();
        }
    }

    let mut scope = ctx.new_scope(ScopeKind::Markup);
    scope.tag = tag;
    scope.id = id;
    scope.tag_required = tag_required;
    ctx.state.scopes.push(scope);
    Ok(())
}

pub(super) fn end_markup(
    ctx: &mut Context,
    r: &mut dyn Renderer,
    m: &Macro,
) -> Result<(), EngineError> {
    let (opts, rest) = ctx.options(&m.args, EM_OPTIONS);
    let tag = ctx.opt_text(&opts, "t");
    let Some(index) = ctx.find_closable(&ScopeKind::Markup, tag.as_deref()) else {
        return Ok(());
    };
    let punct = ctx.args_text(rest);
    if let Some(scope) = ctx.take_inline_scope(r, index) {
        let punct = r.render_text(&punct);
        ctx.close_markup(r, &scope, &punct);
    }
    Ok(())
}

/// `.Sm`: markup around its arguments.
pub(super) fn single_markup(
    ctx: &mut Context,
    r: &mut dyn Renderer,
    m: &Macro,
) -> Result<(), EngineError> {
    let (opts, rest) = ctx.options(&m.args, SM_OPTIONS);
    if rest.is_empty() {
        ctx.error("requires at least one argument");
        return Ok(());
    }
    let (words, punct) = split_punct(rest, 1);
    let text = ctx.args_text(words);
    let punct = punct.map(|p| ctx.text_of(p)).unwrap_or_default();
    let tag = ctx.opt_text(&opts, "t");
    let id = ctx.opt_text(&opts, "id");

    ctx.begin_phrasing(r, opts.flag("ns"));
    register_markup_id(ctx, r, id.as_deref(), &text);
    if ctx.processing() {
        let mtag = ctx.mtag(tag.as_deref());
        let text = r.render_text(&text);
        let punct = r.render_text(&punct);
        r.begin_markup_block(ctx.out(), &mtag, id.as_deref());
        ctx.out().push_str(&text);
        r.end_markup_block(ctx.out(), &mtag, &punct);
        ctx.end_phrasing();
    }
    Ok(())
}

/// `.Sx`: reference to an id, possibly defined further down.
pub(super) fn cross_reference(
    ctx: &mut Context,
    r: &mut dyn Renderer,
    m: &Macro,
) -> Result<(), EngineError> {
    let (opts, rest) = ctx.options(&m.args, SX_OPTIONS);
    let (words, punct) = split_punct(rest, 1);
    let Some((first, extra)) = words.split_first() else {
        ctx.error("requires an id");
        return Ok(());
    };
    if !extra.is_empty() {
        ctx.error("too many arguments");
    }
    let id = ctx.text_of(first);
    let punct = punct.map(|p| ctx.text_of(p)).unwrap_or_default();
    let name = ctx.opt_text(&opts, "name");

    ctx.begin_phrasing(r, opts.flag("ns"));
    if !ctx.processing() {
        return Ok(());
    }
    let punct = r.render_text(&punct);
    match ctx.id(&id).cloned() {
        Some(target) => {
            let name = r.render_text(name.as_deref().unwrap_or(&target.name));
            r.cross_reference(ctx.out(), &target, &name, &punct);
        }
        None => {
            ctx.error(format!("unknown id `{id}`"));
            let name = r.render_text(name.as_deref().unwrap_or(&id));
            ctx.out().push_str(&name);
            ctx.out().push_str(&punct);
        }
    }
    ctx.end_phrasing();
    Ok(())
}

/// `.Lk url [label...] [punct]`
pub(super) fn link(ctx: &mut Context, r: &mut dyn Renderer, m: &Macro) -> Result<(), EngineError> {
    let (opts, rest) = ctx.options(&m.args, LK_OPTIONS);
    let (words, punct) = split_punct(rest, 1);
    let Some((url, label)) = words.split_first() else {
        ctx.error("requires a URL");
        return Ok(());
    };
    let url = ctx.text_of(url);
    let label = (!label.is_empty()).then(|| ctx.args_text(label));
    let punct = punct.map(|p| ctx.text_of(p)).unwrap_or_default();

    ctx.begin_phrasing(r, opts.flag("ns"));
    if ctx.processing() {
        let label = label.map(|l| r.render_text(&l));
        let punct = r.render_text(&punct);
        r.link(ctx.out(), &url, label.as_deref(), &punct);
        ctx.end_phrasing();
    }
    Ok(())
}

/// `.Im image [punct]`
pub(super) fn inline_image(
    ctx: &mut Context,
    r: &mut dyn Renderer,
    m: &Macro,
) -> Result<(), EngineError> {
    let (opts, rest) = ctx.options(&m.args, IM_OPTIONS);
    let (words, punct) = split_punct(rest, 1);
    let Some((image, extra)) = words.split_first() else {
        ctx.error("requires an image");
        return Ok(());
    };
    if !extra.is_empty() {
        ctx.error("too many arguments");
    }
    let image = ctx.text_of(image);
    let punct = punct.map(|p| ctx.text_of(p)).unwrap_or_default();
    let link = ctx.opt_text(&opts, "link");
    let id = ctx.opt_text(&opts, "id");

    ctx.begin_phrasing(r, opts.flag("ns"));
    if let Some(id) = &id {
        let info = IdInfo {
            reference: r.gen_ref("img", id, true),
            name: image.clone(),
            kind: IdKind::Image,
        };
        ctx.register_id(id, info);
    }
    if ctx.processing() {
        let punct = r.render_text(&punct);
        let info = ImageInfo {
            image: &image,
            link: link.as_deref(),
            id: id.as_deref(),
            punct: &punct,
        };
        r.inline_image(ctx.out(), &info);
        ctx.end_phrasing();
    }
    Ok(())
}

/// `.D`: a new paragraph opening with a dialogue mark.
pub(super) fn dialogue(
    ctx: &mut Context,
    r: &mut dyn Renderer,
    m: &Macro,
) -> Result<(), EngineError> {
    if !m.args.is_empty() {
        ctx.error("too many arguments");
    }
    ctx.end_paragraph(r, ParagraphBreak::Normal);
    ctx.begin_paragraph_if_needed(r);
    if ctx.processing() {
        r.begin_dialogue(ctx.out());
    }
    Ok(())
}

/// `.P [title...]`: forced paragraph break.
pub(super) fn paragraph(
    ctx: &mut Context,
    r: &mut dyn Renderer,
    m: &Macro,
) -> Result<(), EngineError> {
    ctx.end_paragraph(r, ParagraphBreak::Forced);
    if m.args.is_empty() {
        return Ok(());
    }
    let title = ctx.args_text(&m.args);
    ctx.begin_paragraph_if_needed(r);
    if ctx.processing() {
        let title = r.render_text(&title);
        r.paragraph_title(ctx.out(), &title);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use crate::test_support::{compile, messages};
    use pretty_assertions::assert_eq;

    // =========================================================================
    // Markup
    // =========================================================================

    #[test]
    fn test_single_markup_with_punctuation() {
        let (out, ctx) = compile("A\n.Sm word .\n");
        assert_eq!(out, "[P]A\n[Bm]word[/Bm].\n[/P]\n");
        assert!(ctx.diagnostics().is_empty());
    }

    #[test]
    fn test_nospace() {
        let (out, _) = compile("(\n.Sm -ns word )\n");
        assert_eq!(out, "[P]([Bm]word[/Bm])\n[/P]\n");
    }

    #[test]
    fn test_markup_tag() {
        let (out, ctx) = compile(".X mtag -t em -c emph -b < -e >\n.Sm -t em x\n");
        assert_eq!(out, "[P][Bm emph]<x>[/Bm]\n[/P]\n");
        assert!(ctx.diagnostics().is_empty(), "{:?}", messages(&ctx));
    }

    #[test]
    fn test_markup_block() {
        let (out, ctx) = compile(".Bm\nsome words\n.Em ,\nafter\n");
        assert_eq!(out, "[P][Bm]some words[/Bm],\nafter\n[/P]\n");
        assert!(ctx.diagnostics().is_empty(), "{:?}", messages(&ctx));
    }

    #[test]
    fn test_markup_closed_by_blank_line() {
        let (out, ctx) = compile(".Bm\nwords\n\nnext\n");
        assert_eq!(out, "[P][Bm]words[/Bm]\n[/P]\n[P]next\n[/P]\n");
        let found = messages(&ctx);
        assert_eq!(found.len(), 1);
        assert!(found[0].starts_with("found paragraph break while Bm opened at"), "{found:?}");
    }

    #[test]
    fn test_em_without_bm() {
        let (_, ctx) = compile("x\n.Em\n");
        assert_eq!(messages(&ctx), vec!["no open Bm to close"]);
    }

    // =========================================================================
    // References and links
    // =========================================================================

    #[test]
    fn test_cross_reference_with_name() {
        let (out, ctx) = compile(".Sh -id intro Introduction\n.Sx -name here intro .\n");
        assert!(out.contains("[P][Sx #intro]here[/Sx].\n"), "{out}");
        assert!(ctx.diagnostics().is_empty(), "{:?}", messages(&ctx));
    }

    #[test]
    fn test_unknown_cross_reference() {
        let (out, ctx) = compile(".Sx nowhere\n");
        assert_eq!(out, "[P]nowhere\n[/P]\n");
        assert_eq!(messages(&ctx), vec!["unknown id `nowhere`"]);
    }

    #[test]
    fn test_link() {
        let (out, _) = compile(".Lk http://example.org the site ;\n.Lk http://x.org\n");
        assert_eq!(
            out,
            "[P][Lk http://example.org]the site[/Lk];\n[Lk http://x.org]http://x.org[/Lk]\n[/P]\n"
        );
    }

    #[test]
    fn test_inline_image() {
        let (out, ctx) = compile(".Im -id pic -link big.png small.png\n");
        assert_eq!(out, "[P][Im small.png link=big.png id=pic]\n[/P]\n");
        assert_eq!(ctx.id("pic").unwrap().reference, "img-pic");
    }

    // =========================================================================
    // Paragraphs
    // =========================================================================

    #[test]
    fn test_forced_paragraph_with_title() {
        let (out, _) = compile("one\n.P Title\ntwo\n");
        assert_eq!(out, "[P]one\n[/P forced]\n[P][title]Title[/title]\ntwo\n[/P]\n");
    }

    #[test]
    fn test_dialogue() {
        let (out, _) = compile("Said:\n.D\nHello.\n");
        assert_eq!(out, "[P]Said:\n[/P]\n[P][D]Hello.\n[/P]\n");
    }
}

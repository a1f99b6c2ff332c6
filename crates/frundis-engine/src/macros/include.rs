//! Raw blocks and file inclusion: `Bf`, `Ef`, `If`.

use crate::context::{Context, Frame, RawBlock};
use crate::diagnostics::{CallSite, Via};
use crate::options::{OptKind, OptionSpec};
use crate::renderer::Renderer;
use crate::EngineError;
use frundis_parser::Macro;
use std::rc::Rc;

const BF_OPTIONS: &OptionSpec = &[("f", OptKind::Value), ("t", OptKind::Value)];
const IF_OPTIONS: &OptionSpec = &[
    ("as-is", OptKind::Flag),
    ("f", OptKind::Value),
    ("t", OptKind::Value),
];

pub(super) fn begin_filter(
    ctx: &mut Context,
    r: &mut dyn Renderer,
    m: &Macro,
) -> Result<(), EngineError> {
    let (opts, rest) = ctx.options(&m.args, BF_OPTIONS);
    if !rest.is_empty() {
        ctx.error("too many arguments");
    }
    let keep = ctx.format_allowed(&opts);
    let tag = ctx.opt_text(&opts, "t");
    let ftag = ctx.ftag(tag.as_deref());
    if keep {
        ctx.begin_block_construct(r);
    }
    ctx.state.raw = Some(RawBlock {
        ftag,
        keep,
        text: String::new(),
        file: ctx.current_file(),
        line: m.line,
    });
    Ok(())
}

pub(super) fn end_filter(
    ctx: &mut Context,
    r: &mut dyn Renderer,
    m: &Macro,
) -> Result<(), EngineError> {
    if !m.args.is_empty() {
        ctx.error("too many arguments");
    }
    let Some(raw) = ctx.state.raw.take() else {
        ctx.error("no open Bf to close");
        return Ok(());
    };
    if raw.keep && ctx.processing() {
        let text = ctx.run_filter(raw.ftag.as_ref(), raw.text);
        r.raw(ctx.out(), &text);
    }
    Ok(())
}

/// `.If [-as-is] file`: process another frundis file in place, or copy a
/// file to the output.
pub(super) fn include_file(
    ctx: &mut Context,
    r: &mut dyn Renderer,
    m: &Macro,
) -> Result<(), EngineError> {
    let (opts, rest) = ctx.options(&m.args, IF_OPTIONS);
    let name = match rest {
        [name] => ctx.text_of(name),
        [] => {
            ctx.error("requires a file name");
            return Ok(());
        }
        _ => {
            ctx.error("too many arguments");
            return Ok(());
        }
    };
    if !ctx.format_allowed(&opts) {
        return Ok(());
    }
    let Some(key) = ctx.resolve(&name) else {
        ctx.error(format!("{name}: file not found"));
        return Ok(());
    };

    if opts.flag("as-is") {
        ctx.begin_block_construct(r);
        if ctx.processing() {
            let text = ctx.read(&key)?;
            let tag = ctx.opt_text(&opts, "t");
            let ftag = ctx.ftag(tag.as_deref());
            let text = ctx.run_filter(ftag.as_ref(), text);
            r.raw(ctx.out(), &text);
        }
        return Ok(());
    }

    if ctx.state.frames.len() > ctx.config().max_depth {
        ctx.error(format!("too much depth including `{name}`"));
        return Ok(());
    }
    let blocks = ctx.load(&key)?;
    log::debug!("including {key}");
    let call_site = CallSite {
        via: Via::Include,
        file: ctx.current_file().to_string(),
        line: m.line,
    };
    ctx.run_frame(r, Frame::new(Rc::from(key.as_str()), blocks, Some(call_site)))
}

#[cfg(test)]
mod tests {
    use crate::test_support::{compile, compile_with, messages};
    use crate::{Config, MemoryLoader};
    use pretty_assertions::assert_eq;

    // =========================================================================
    // Raw blocks
    // =========================================================================

    #[test]
    fn test_raw_block() {
        let (out, ctx) = compile("text\n.Bf\n<b>raw</b>\n.Ef\n");
        assert_eq!(out, "[P]text\n[/P soft]\n<b>raw</b>\n");
        assert!(ctx.diagnostics().is_empty(), "{:?}", messages(&ctx));
    }

    #[test]
    fn test_raw_block_for_other_format() {
        let (out, _) = compile(".Bf -f latex\nlatex only\n.Ef\nafter\n");
        assert_eq!(out, "[P]after\n[/P]\n");
    }

    #[test]
    fn test_macro_inside_raw_block() {
        let (out, ctx) = compile(".Bf\n.Sh x\n.Ef\n");
        assert_eq!(out, "");
        assert_eq!(messages(&ctx), vec!["macro not allowed inside Bf block; ignored"]);
    }

    #[test]
    fn test_unbalanced_raw_blocks() {
        let (_, ctx) = compile(".Ef\n");
        assert_eq!(messages(&ctx), vec!["no open Bf to close"]);

        let (_, ctx) = compile(".Bf\nx\n");
        assert_eq!(messages(&ctx), vec!["Bf not closed by Ef"]);
    }

    #[test]
    fn test_filter_needs_unrestricted_mode() {
        let source = ".X ftag -t up -shell \"tr a-z A-Z\"\n.Bf -t up\nabc\n.Ef\n";
        let (out, ctx) = compile(source);
        assert_eq!(out, "abc\n");
        assert_eq!(messages(&ctx), vec!["filter `tr a-z A-Z` not run in restricted mode"]);

        let config = Config::default().unrestricted(true);
        let (out, ctx) = compile_with(MemoryLoader::new(), config, source);
        assert_eq!(out, "ABC\n");
        assert!(ctx.diagnostics().is_empty(), "{:?}", messages(&ctx));
    }

    // =========================================================================
    // Inclusion
    // =========================================================================

    #[test]
    fn test_include_as_is() {
        let loader = MemoryLoader::new().with_file("raw.html", "<hr>\n");
        let (out, _) = compile_with(loader, Config::default(), ".If -as-is raw.html\n");
        assert_eq!(out, "<hr>\n");
    }

    #[test]
    fn test_include_missing_file() {
        let (_, ctx) = compile(".If nope.frundis\n");
        assert_eq!(messages(&ctx), vec!["nope.frundis: file not found"]);
    }

    #[test]
    fn test_include_for_other_format() {
        let loader = MemoryLoader::new().with_file("part.frundis", "included\n");
        let (out, ctx) = compile_with(loader, Config::default(), ".If -f latex part.frundis\n");
        assert_eq!(out, "");
        assert!(ctx.diagnostics().is_empty());
    }

    #[test]
    fn test_diagnostic_in_included_file() {
        let loader = MemoryLoader::new().with_file("part.frundis", "\n.Zz\n");
        let (_, ctx) = compile_with(loader, Config::default(), "text\n.If part.frundis\n");
        let d = ctx.diagnostics().iter().next().unwrap();
        assert_eq!(
            d.to_string(),
            "part.frundis:2: Zz: unknown macro (in file included at test.frundis:2)"
        );
    }
}

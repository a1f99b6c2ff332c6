//! `.X`: document parameters and tag definitions.
//!
//! Settings take effect during the info pass, so they apply to the whole
//! document whatever their position.

use crate::context::Context;
use crate::options::{OptKind, OptionSpec};
use crate::renderer::Renderer;
use crate::EngineError;
use frundis_parser::Macro;

/// Parameter names `.X set` accepts. Values are checked by the renderer.
pub const PARAMETERS: &[&str] = &[
    "dmark",
    "document-author",
    "document-date",
    "document-title",
    "epub-cover",
    "epub-css",
    "epub-metadata",
    "epub-subject",
    "epub-uuid",
    "epub-version",
    "lang",
    "latex-preamble",
    "latex-variant",
    "markdown-dialect",
    "mom-preamble",
    "nbsp",
    "title-page",
    "xhtml-bottom",
    "xhtml-chap-prefix",
    "xhtml-chap-template",
    "xhtml-css",
    "xhtml-custom-ids",
    "xhtml-favicon",
    "xhtml-go-up",
    "xhtml-index",
    "xhtml-privatedata",
    "xhtml-top",
    "xhtml5",
];

const X_OPTIONS: &OptionSpec = &[
    ("f", OptKind::Value),
    ("t", OptKind::Value),
    ("c", OptKind::Value),
    ("b", OptKind::Value),
    ("e", OptKind::Value),
    ("shell", OptKind::Value),
];

pub(super) fn exec(ctx: &mut Context, r: &mut dyn Renderer, m: &Macro) -> Result<(), EngineError> {
    if ctx.processing() {
        return Ok(());
    }
    let Some((command, args)) = m.args.split_first() else {
        ctx.error("requires a subcommand");
        return Ok(());
    };
    let command = ctx.text_of(command);
    let (opts, rest) = ctx.options(args, X_OPTIONS);
    if !ctx.format_allowed(&opts) {
        return Ok(());
    }

    if command == "set" {
        let Some((name, value)) = rest.split_first().filter(|(_, value)| !value.is_empty()) else {
            ctx.error("requires a parameter name and a value");
            return Ok(());
        };
        let name = ctx.text_of(name);
        let value = ctx.args_text(value);
        if !PARAMETERS.contains(&name.as_str()) {
            ctx.error(format!("unknown parameter `{name}`"));
        } else if !r.check_param_assignment(&name, &value) {
            ctx.error(format!("invalid value `{value}` for parameter `{name}`"));
        } else {
            log::debug!("parameter {name} = {value}");
            ctx.params.insert(name, value);
        }
        return Ok(());
    }

    if !matches!(command.as_str(), "dtag" | "mtag" | "ftag") {
        ctx.error(format!("unknown subcommand `{command}`"));
        return Ok(());
    }
    if !rest.is_empty() {
        ctx.error("too many arguments");
    }
    let Some(name) = ctx.opt_text(&opts, "t") else {
        ctx.error("requires -t");
        return Ok(());
    };
    let cmd = ctx.opt_text(&opts, "c").unwrap_or_default();
    match command.as_str() {
        "dtag" => {
            ctx.dtags.insert(name, r.xdtag(&cmd));
        }
        "mtag" => {
            let begin = ctx.opt_text(&opts, "b").unwrap_or_default();
            let end = ctx.opt_text(&opts, "e").unwrap_or_default();
            ctx.mtags.insert(name, r.xmtag(&cmd, &begin, &end));
        }
        _ => {
            let shell = ctx.opt_text(&opts, "shell");
            ctx.ftags.insert(name, r.xftag(shell.as_deref()));
        }
    }
    Ok(())
}

//! Built-in macros: definitions, variables, conditionals and `#run`.

use crate::context::{Context, SkipRegion};
use crate::filter;
use crate::inline::lookup_var;
use crate::options::{OptKind, OptionSpec};
use crate::renderer::Renderer;
use crate::scope::ScopeKind;
use crate::usermacro::PendingDefinition;
use crate::EngineError;
use frundis_parser::Macro;

const FORMAT_OPTION: &OptionSpec = &[("f", OptKind::Value)];

/// `.#de name`: start capturing a user macro body.
pub(super) fn define(
    ctx: &mut Context,
    _r: &mut dyn Renderer,
    m: &Macro,
) -> Result<(), EngineError> {
    let (opts, rest) = ctx.options(&m.args, FORMAT_OPTION);
    let Some((name, extra)) = rest.split_first() else {
        ctx.error("requires a name");
        return Ok(());
    };
    if !extra.is_empty() {
        ctx.error("too many arguments");
    }
    let name = ctx.text_of(name);
    if name.starts_with('#') {
        ctx.error(format!("cannot redefine built-in `{name}`"));
    }
    let ignore = !ctx.format_allowed(&opts);
    ctx.state.defining = Some(PendingDefinition {
        name,
        body: Vec::new(),
        file: ctx.current_file(),
        line: m.line,
        ignore,
    });
    Ok(())
}

/// `.#.` outside a definition. Inside one it ends the capture before
/// reaching any handler.
pub(super) fn end_define(
    ctx: &mut Context,
    _r: &mut dyn Renderer,
    _m: &Macro,
) -> Result<(), EngineError> {
    ctx.error("#. without #de");
    Ok(())
}

/// `.#dv name value...`
pub(super) fn define_variable(
    ctx: &mut Context,
    _r: &mut dyn Renderer,
    m: &Macro,
) -> Result<(), EngineError> {
    let (opts, rest) = ctx.options(&m.args, FORMAT_OPTION);
    let Some((name, value)) = rest.split_first() else {
        ctx.error("requires a name");
        return Ok(());
    };
    if !ctx.format_allowed(&opts) {
        return Ok(());
    }
    let name = ctx.text_of(name);
    let value = ctx.args_text(value);
    ctx.state.vars.insert(name, value);
    Ok(())
}

/// `.#if [-f formats] [!] [name]`: the region up to the matching `.#;` is
/// processed when the format matches and the variable is non-empty.
pub(super) fn begin_conditional(
    ctx: &mut Context,
    _r: &mut dyn Renderer,
    m: &Macro,
) -> Result<(), EngineError> {
    let (opts, rest) = ctx.options(&m.args, FORMAT_OPTION);
    let words: Vec<String> = rest.iter().map(|arg| ctx.text_of(arg)).collect();
    let (negate, words) = match words.split_first() {
        Some((first, tail)) if first == "!" => (true, tail),
        _ => (false, words.as_slice()),
    };
    if words.len() > 1 {
        ctx.error("too many arguments");
    }

    let by_format = opts.value("f").is_some().then(|| ctx.format_allowed(&opts));
    let by_var = words
        .first()
        .map(|name| lookup_var(name, &ctx.state.vars).is_some_and(|v| !v.is_empty()));
    let holds = match (by_format, by_var) {
        (None, None) => {
            ctx.error("requires -f or a variable name");
            true
        }
        (f, v) => f.unwrap_or(true) && v.unwrap_or(true),
    };

    if holds != negate {
        let scope = ctx.new_scope(ScopeKind::Conditional);
        ctx.state.scopes.push(scope);
    } else {
        ctx.state.skip = Some(SkipRegion {
            depth: 1,
            file: ctx.current_file(),
            line: m.line,
        });
    }
    Ok(())
}

/// `.#;` closing a region that was processed. Skipped regions end before
/// reaching any handler.
pub(super) fn end_conditional(
    ctx: &mut Context,
    _r: &mut dyn Renderer,
    m: &Macro,
) -> Result<(), EngineError> {
    if !m.args.is_empty() {
        ctx.error("too many arguments");
    }
    let block = &mut ctx.state.scopes.block;
    match block.iter().rposition(|s| s.kind == ScopeKind::Conditional) {
        Some(index) => {
            block.remove(index);
        }
        None => ctx.error("#; without #if"),
    }
    Ok(())
}

/// `.#run cmd args...`: insert the output of an external command.
pub(super) fn run(ctx: &mut Context, r: &mut dyn Renderer, m: &Macro) -> Result<(), EngineError> {
    let (opts, rest) = ctx.options(&m.args, FORMAT_OPTION);
    if rest.is_empty() {
        ctx.error("requires a command");
        return Ok(());
    }
    if !ctx.format_allowed(&opts) {
        return Ok(());
    }
    if !ctx.config().unrestricted {
        ctx.error("#run not allowed in restricted mode");
        return Ok(());
    }
    if !ctx.processing() {
        return Ok(());
    }
    let words: Vec<String> = rest.iter().map(|arg| ctx.text_of(arg)).collect();
    let Some((program, args)) = words.split_first() else {
        return Ok(());
    };
    match filter::run_command(program, args) {
        Ok(output) => r.raw(ctx.out(), &output),
        Err(err) => ctx.error(err.to_string()),
    }
    Ok(())
}

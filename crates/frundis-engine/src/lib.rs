//! frundis Engine
//!
//! Executes a parsed frundis document against a [`Renderer`] in two passes
//! over the same block sequences:
//!
//! ```text
//! source → Parser → blocks (cached per file)
//!        → info pass    (ids, TOC, list-of-X entries, table columns; no output)
//!        → reset_for_process_pass()
//!        → process pass (renderer calls, output)
//! ```
//!
//! The info pass exists because output needs facts only known once the
//! whole document has been seen: cross-reference targets defined later,
//! table of contents entries, column counts. Both passes must perform the
//! same counter-advancing operations in the same order.
//!
//! The core never decides how anything looks: it drives the renderer
//! through the semantic calls of the [`Renderer`] trait. [`TraceRenderer`]
//! is a renderer that writes those calls as compact markers.

pub mod config;
pub mod context;
pub mod diagnostics;
mod filter;
mod flow;
pub mod inline;
pub mod loader;
pub mod macros;
pub mod options;
pub mod renderer;
pub mod scope;
pub mod toc;
pub mod trace;
pub mod usermacro;

pub use config::Config;
pub use context::{Context, Pass};
pub use diagnostics::{Diagnostic, Diagnostics};
pub use loader::{FsLoader, MemoryLoader, SourceLoader};
pub use macros::{Handler, MacroTable};
pub use renderer::{Dtag, Ftag, Mtag, ParagraphBreak, Renderer};
pub use toc::{CounterEvent, IdInfo, IdKind, LoxEntry, LoxKind};
pub use trace::TraceRenderer;

use frundis_parser::ParseError;

/// Fatal conditions: the compilation stops at the first one.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("{path}: file not found")]
    NotFound { path: String },

    #[error("{path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: ParseError,
    },
}

/// Compile the document at `path` with a fresh context.
///
/// Returns the renderer output together with the context, which holds the
/// diagnostics and the bookkeeping gathered along the way.
pub fn compile(
    path: &str,
    config: Config,
    renderer: &mut dyn Renderer,
) -> Result<(String, Context), EngineError> {
    let loader = FsLoader::from_config(&config);
    let mut ctx = Context::new(config, Box::new(loader));
    let output = ctx.compile(renderer, path)?;
    Ok((output, ctx))
}

#[cfg(test)]
pub(crate) mod test_support {
    use crate::{Config, Context, MemoryLoader, TraceRenderer};

    pub fn compile(source: &str) -> (String, Context) {
        compile_with(MemoryLoader::new(), Config::default(), source)
    }

    pub fn compile_with(loader: MemoryLoader, config: Config, source: &str) -> (String, Context) {
        let _ = env_logger::builder().is_test(true).try_init();
        let mut ctx = Context::new(config, Box::new(loader));
        let out = ctx
            .compile_source(&mut TraceRenderer::new(), "test.frundis", source)
            .unwrap();
        (out, ctx)
    }

    /// Diagnostic messages, without locations.
    pub fn messages(ctx: &Context) -> Vec<String> {
        ctx.diagnostics().messages().into_iter().map(str::to_string).collect()
    }
}

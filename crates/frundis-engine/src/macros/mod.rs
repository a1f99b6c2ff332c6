//! Macro handlers.
//!
//! The standard table maps the document macros (`Sh`, `Bl`, `Sm`, ...) to
//! handlers that drive the [`Renderer`]. Built-ins (`#de`, `#if`, ...) are
//! dispatched before the table and cannot be overridden by a format.

mod block;
mod control;
mod include;
mod params;
mod phrasing;
mod structure;

pub use params::PARAMETERS;

use crate::context::Context;
use crate::renderer::Renderer;
use crate::EngineError;
use frundis_parser::Macro;
use std::collections::HashMap;

pub type Handler = fn(&mut Context, &mut dyn Renderer, &Macro) -> Result<(), EngineError>;

pub type MacroTable = HashMap<&'static str, Handler>;

/// Handlers for the standard macro set.
pub fn standard() -> MacroTable {
    let mut table = MacroTable::new();
    table.insert("Bd", block::begin_display);
    table.insert("Ed", block::end_display);
    table.insert("Bl", block::begin_list);
    table.insert("El", block::end_list);
    table.insert("It", block::item);
    table.insert("Ta", block::table_cell);
    table.insert("Bm", phrasing::begin_markup);
    table.insert("Em", phrasing::end_markup);
    table.insert("Sm", phrasing::single_markup);
    table.insert("Sx", phrasing::cross_reference);
    table.insert("Lk", phrasing::link);
    table.insert("Im", phrasing::inline_image);
    table.insert("D", phrasing::dialogue);
    table.insert("P", phrasing::paragraph);
    table.insert("Pt", structure::header);
    table.insert("Ch", structure::header);
    table.insert("Sh", structure::header);
    table.insert("Ss", structure::header);
    table.insert("Tc", structure::table_of_contents);
    table.insert("Fig", structure::figure);
    table.insert("Bf", include::begin_filter);
    table.insert("Ef", include::end_filter);
    table.insert("If", include::include_file);
    table.insert("X", params::exec);
    table
}

/// Built-in macros, dispatched before the format's table.
pub(crate) fn builtin(name: &str) -> Option<Handler> {
    let handler: Handler = match name {
        "#de" => control::define,
        "#." => control::end_define,
        "#dv" => control::define_variable,
        "#if" => control::begin_conditional,
        "#;" => control::end_conditional,
        "#run" => control::run,
        _ => return None,
    };
    Some(handler)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_table() {
        let table = standard();
        for name in ["Sh", "Bl", "It", "Sm", "X", "If", "Bf", "Tc"] {
            assert!(table.contains_key(name), "missing {name}");
        }
        assert!(!table.contains_key("#de"));
        assert!(!table.contains_key("#."));
    }

    #[test]
    fn test_builtins() {
        assert!(builtin("#if").is_some());
        assert!(builtin("Sh").is_none());
    }
}

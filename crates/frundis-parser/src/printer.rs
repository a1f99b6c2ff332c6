//! Canonical printer: blocks back to frundis source.
//!
//! Every macro argument is printed quoted, with literal quotes doubled, so
//! that argument boundaries survive whatever the argument contains. A text
//! line that would read as a macro line is preceded by a bare `\` line
//! continuation, which keeps it text.

use crate::ast::{ArgRef, Block, Inline};

/// Print a block sequence as frundis source.
pub fn print_blocks(blocks: &[Block]) -> String {
    let mut out = String::new();
    for block in blocks {
        if !out.is_empty() && !out.ends_with('\n') {
            out.push('\n');
        }
        match block {
            Block::Macro(m) => {
                out.push('.');
                out.push_str(&m.name);
                for arg in &m.args {
                    out.push_str(" \"");
                    for inline in arg {
                        print_inline(inline, true, &mut out);
                    }
                    out.push('"');
                }
                out.push('\n');
            }
            Block::Text(t) => {
                let mut text = String::new();
                for inline in &t.text {
                    print_inline(inline, false, &mut text);
                }
                print_text_lines(&text, &mut out);
            }
        }
    }
    out
}

fn print_text_lines(text: &str, out: &mut String) {
    for line in text.split_inclusive('\n') {
        if line.trim_start_matches([' ', '\t']).starts_with('.') {
            out.push_str("\\\n");
        }
        out.push_str(line);
    }
}

fn print_inline(inline: &Inline, quoted: bool, out: &mut String) {
    match inline {
        Inline::Text(s) if quoted => out.push_str(&s.replace('"', "\"\"")),
        Inline::Text(s) => out.push_str(s),
        Inline::Escape(code) => {
            out.push('\\');
            out.push(code.as_char());
        }
        Inline::ArgEscape(ArgRef::Index(n)) => out.push_str(&format!("\\${n}")),
        Inline::ArgEscape(ArgRef::Rest) => out.push_str("\\$@"),
        Inline::NamedArgEscape(name) => out.push_str(&format!("\\$[{name}]")),
        Inline::NamedFlagEscape(name) => out.push_str(&format!("\\$?[{name}]")),
        Inline::VarEscape(name) => out.push_str(&format!("\\*[{name}]")),
    }
}

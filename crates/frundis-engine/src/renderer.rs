//! The interface between the engine and an output format.
//!
//! Output methods append to the buffer they are given and are only called
//! during the process pass. Query methods (`header_reference`, `gen_ref`,
//! the tag factories, `check_param_assignment`) may be called during the
//! info pass as well and must be pure.

use crate::macros::{self, MacroTable};
use crate::toc::{HeaderLevels, IdInfo, LoxEntry, LoxKind};

/// Display block tag, defined with `.X dtag`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Dtag {
    /// Format-specific name, e.g. a LaTeX environment or an HTML class.
    pub cmd: String,
}

/// Markup tag, defined with `.X mtag`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Mtag {
    pub cmd: String,
    /// Literal text written before the marked-up content.
    pub begin: String,
    /// Literal text written after it.
    pub end: String,
}

/// Filter tag, defined with `.X ftag`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Ftag {
    /// Shell command the raw text is piped through.
    pub shell: Option<String>,
}

/// Why a paragraph ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParagraphBreak {
    /// Blank line, header, end of display block.
    Normal,
    /// A block construct starts inside the flow.
    Soft,
    /// End of a list item.
    Item,
    /// Explicit `.P`.
    Forced,
}

/// Facts available when computing a header reference.
#[derive(Debug, Clone, Copy)]
pub struct HeaderRef<'a> {
    pub macro_name: &'a str,
    pub num: &'a str,
    /// Position of the header among all headers, starting at 1.
    pub count: usize,
    pub id: Option<&'a str>,
}

#[derive(Debug, Clone, Copy)]
pub struct HeaderInfo<'a> {
    pub macro_name: &'a str,
    pub level: usize,
    pub num: &'a str,
    pub nonum: bool,
    pub id: Option<&'a str>,
    pub reference: &'a str,
}

#[derive(Debug, Clone, Copy)]
pub struct TableInfo<'a> {
    /// Rendered title, empty for an untitled table.
    pub title: &'a str,
    pub columns: usize,
    pub entry: Option<&'a LoxEntry>,
}

#[derive(Debug, Clone, Copy)]
pub struct VerseInfo<'a> {
    pub title: &'a str,
    pub entry: Option<&'a LoxEntry>,
}

#[derive(Debug, Clone, Copy)]
pub struct FigureInfo<'a> {
    pub image: &'a str,
    /// Rendered caption.
    pub caption: &'a str,
    pub link: Option<&'a str>,
    pub entry: &'a LoxEntry,
}

#[derive(Debug, Clone, Copy)]
pub struct ImageInfo<'a> {
    pub image: &'a str,
    pub link: Option<&'a str>,
    pub id: Option<&'a str>,
    pub punct: &'a str,
}

/// A `.Tc` request.
#[derive(Debug, Clone, Copy)]
pub struct TocRequest<'a> {
    pub kind: LoxKind,
    pub entries: &'a [LoxEntry],
    pub title: Option<&'a str>,
    pub nonum: bool,
    pub summary: bool,
    pub mini: bool,
    pub levels: HeaderLevels,
}

pub trait Renderer {
    /// Format name matched against `-f` options.
    fn format(&self) -> &str;

    /// Format-specific macros. The standard set drives the semantic calls
    /// below and fits every format built on this trait.
    fn macros(&self) -> MacroTable {
        macros::standard()
    }

    /// Escape literal text for the output format.
    fn render_text(&self, text: &str) -> String;

    // ---- Queries ----

    fn header_reference(&self, header: &HeaderRef<'_>) -> String;

    /// Reference for an id-bearing element. `has_file` is set when the
    /// reference should also name the output file holding it.
    fn gen_ref(&self, prefix: &str, id: &str, has_file: bool) -> String;

    /// Validate the value of a `.X set` assignment.
    fn check_param_assignment(&self, _name: &str, _value: &str) -> bool {
        true
    }

    fn xdtag(&self, cmd: &str) -> Dtag {
        Dtag { cmd: cmd.to_string() }
    }

    fn xmtag(&self, cmd: &str, begin: &str, end: &str) -> Mtag {
        Mtag {
            cmd: cmd.to_string(),
            begin: begin.to_string(),
            end: end.to_string(),
        }
    }

    fn xftag(&self, shell: Option<&str>) -> Ftag {
        Ftag {
            shell: shell.map(str::to_string),
        }
    }

    /// Info-pass notification of a `.Tc` request.
    fn table_of_contents_info(&mut self, _request: &TocRequest<'_>) {}

    // ---- Paragraphs and phrasing ----

    fn begin_paragraph(&mut self, out: &mut String);
    fn end_paragraph(&mut self, out: &mut String, kind: ParagraphBreak);
    fn paragraph_title(&mut self, out: &mut String, title: &str);
    fn begin_dialogue(&mut self, out: &mut String);

    fn begin_markup_block(&mut self, out: &mut String, tag: &Mtag, id: Option<&str>);
    fn end_markup_block(&mut self, out: &mut String, tag: &Mtag, punct: &str);

    fn link(&mut self, out: &mut String, url: &str, label: Option<&str>, punct: &str);
    fn cross_reference(&mut self, out: &mut String, target: &IdInfo, name: &str, punct: &str);
    fn inline_image(&mut self, out: &mut String, image: &ImageInfo<'_>);

    // ---- Block constructs ----

    fn begin_display_block(&mut self, out: &mut String, tag: &Dtag, id: Option<&str>);
    fn end_display_block(&mut self, out: &mut String, tag: &Dtag);

    fn begin_item_list(&mut self, out: &mut String);
    fn end_item_list(&mut self, out: &mut String);
    fn begin_item(&mut self, out: &mut String);
    fn end_item(&mut self, out: &mut String);

    fn begin_enum_list(&mut self, out: &mut String);
    fn end_enum_list(&mut self, out: &mut String);
    fn begin_enum_item(&mut self, out: &mut String);
    fn end_enum_item(&mut self, out: &mut String);

    fn begin_desc_list(&mut self, out: &mut String);
    fn end_desc_list(&mut self, out: &mut String);
    fn desc_name(&mut self, out: &mut String, name: &str);
    fn begin_desc_value(&mut self, out: &mut String);
    fn end_desc_value(&mut self, out: &mut String);

    fn begin_verse(&mut self, out: &mut String, verse: &VerseInfo<'_>);
    fn end_verse(&mut self, out: &mut String);
    fn end_verse_line(&mut self, out: &mut String);
    fn end_stanza(&mut self, out: &mut String);

    fn begin_table(&mut self, out: &mut String, table: &TableInfo<'_>);
    fn end_table(&mut self, out: &mut String);
    fn begin_table_row(&mut self, out: &mut String);
    fn end_table_row(&mut self, out: &mut String);
    fn begin_table_cell(&mut self, out: &mut String);
    fn end_table_cell(&mut self, out: &mut String);

    fn begin_header(&mut self, out: &mut String, header: &HeaderInfo<'_>);
    fn end_header(&mut self, out: &mut String, header: &HeaderInfo<'_>);

    fn figure(&mut self, out: &mut String, figure: &FigureInfo<'_>);
    fn table_of_contents(&mut self, out: &mut String, request: &TocRequest<'_>);

    /// Verbatim output from `.Bf`, `.If -as-is` or `.#run`.
    fn raw(&mut self, out: &mut String, text: &str);
}

//! A renderer writing each semantic call as a bracketed marker.
//!
//! Paragraphs read `[P]...[/P]`, headers `[Sh 1.1 ref=s3]Title[/Sh]`, and
//! so on. Non-breaking spaces are shown as `~`. Useful to look at what a
//! document does without a real output format.

use crate::renderer::{
    Dtag, FigureInfo, HeaderInfo, HeaderRef, ImageInfo, Mtag, ParagraphBreak, Renderer, TableInfo,
    TocRequest, VerseInfo,
};
use crate::toc::{IdInfo, LoxKind};

#[derive(Debug, Clone)]
pub struct TraceRenderer {
    format: String,
}

impl Default for TraceRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl TraceRenderer {
    pub fn new() -> Self {
        Self::with_format("trace")
    }

    /// A trace renderer answering to another format name, to exercise
    /// `-f` conditionals.
    pub fn with_format(format: &str) -> Self {
        Self {
            format: format.to_string(),
        }
    }
}

fn attr(out: &mut String, name: &str, value: Option<&str>) {
    if let Some(value) = value.filter(|v| !v.is_empty()) {
        out.push(' ');
        if !name.is_empty() {
            out.push_str(name);
            out.push('=');
        }
        out.push_str(value);
    }
}

impl Renderer for TraceRenderer {
    fn format(&self) -> &str {
        &self.format
    }

    fn render_text(&self, text: &str) -> String {
        text.replace('\u{a0}', "~")
    }

    fn header_reference(&self, header: &HeaderRef<'_>) -> String {
        match header.id {
            Some(id) => id.to_string(),
            None => format!("s{}", header.count),
        }
    }

    fn gen_ref(&self, prefix: &str, id: &str, _has_file: bool) -> String {
        if prefix.is_empty() {
            id.to_string()
        } else {
            format!("{prefix}-{id}")
        }
    }

    fn check_param_assignment(&self, _name: &str, value: &str) -> bool {
        !value.trim().is_empty()
    }

    // ---- Paragraphs and phrasing ----

    fn begin_paragraph(&mut self, out: &mut String) {
        out.push_str("[P]");
    }

    fn end_paragraph(&mut self, out: &mut String, kind: ParagraphBreak) {
        out.push_str(match kind {
            ParagraphBreak::Normal => "[/P]\n",
            ParagraphBreak::Soft => "[/P soft]\n",
            ParagraphBreak::Item => "[/P item]\n",
            ParagraphBreak::Forced => "[/P forced]\n",
        });
    }

    fn paragraph_title(&mut self, out: &mut String, title: &str) {
        out.push_str(&format!("[title]{title}[/title]\n"));
    }

    fn begin_dialogue(&mut self, out: &mut String) {
        out.push_str("[D]");
    }

    fn begin_markup_block(&mut self, out: &mut String, tag: &Mtag, id: Option<&str>) {
        out.push_str("[Bm");
        attr(out, "", Some(&tag.cmd));
        attr(out, "id", id);
        out.push(']');
        out.push_str(&tag.begin);
    }

    fn end_markup_block(&mut self, out: &mut String, tag: &Mtag, punct: &str) {
        out.push_str(&tag.end);
        out.push_str("[/Bm]");
        out.push_str(punct);
    }

    fn link(&mut self, out: &mut String, url: &str, label: Option<&str>, punct: &str) {
        out.push_str(&format!("[Lk {url}]{}[/Lk]{punct}", label.unwrap_or(url)));
    }

    fn cross_reference(&mut self, out: &mut String, target: &IdInfo, name: &str, punct: &str) {
        out.push_str(&format!("[Sx #{}]{name}[/Sx]{punct}", target.reference));
    }

    fn inline_image(&mut self, out: &mut String, image: &ImageInfo<'_>) {
        out.push_str("[Im ");
        out.push_str(image.image);
        attr(out, "link", image.link);
        attr(out, "id", image.id);
        out.push(']');
        out.push_str(image.punct);
    }

    // ---- Block constructs ----

    fn begin_display_block(&mut self, out: &mut String, tag: &Dtag, id: Option<&str>) {
        out.push_str("[Bd");
        attr(out, "", Some(&tag.cmd));
        attr(out, "id", id);
        out.push_str("]\n");
    }

    fn end_display_block(&mut self, out: &mut String, _tag: &Dtag) {
        out.push_str("[/Bd]\n");
    }

    fn begin_item_list(&mut self, out: &mut String) {
        out.push_str("[Bl item]\n");
    }

    fn end_item_list(&mut self, out: &mut String) {
        out.push_str("[/Bl]\n");
    }

    fn begin_item(&mut self, out: &mut String) {
        out.push_str("[It]");
    }

    fn end_item(&mut self, out: &mut String) {
        out.push_str("[/It]\n");
    }

    fn begin_enum_list(&mut self, out: &mut String) {
        out.push_str("[Bl enum]\n");
    }

    fn end_enum_list(&mut self, out: &mut String) {
        out.push_str("[/Bl]\n");
    }

    fn begin_enum_item(&mut self, out: &mut String) {
        out.push_str("[It]");
    }

    fn end_enum_item(&mut self, out: &mut String) {
        out.push_str("[/It]\n");
    }

    fn begin_desc_list(&mut self, out: &mut String) {
        out.push_str("[Bl desc]\n");
    }

    fn end_desc_list(&mut self, out: &mut String) {
        out.push_str("[/Bl]\n");
    }

    fn desc_name(&mut self, out: &mut String, name: &str) {
        out.push_str(&format!("[Dt]{name}[/Dt]"));
    }

    fn begin_desc_value(&mut self, out: &mut String) {
        out.push_str("[Dd]");
    }

    fn end_desc_value(&mut self, out: &mut String) {
        out.push_str("[/Dd]\n");
    }

    fn begin_verse(&mut self, out: &mut String, verse: &VerseInfo<'_>) {
        out.push_str("[Bl verse");
        attr(out, "n", verse.entry.map(|e| e.num.as_str()));
        out.push(']');
        out.push_str(verse.title);
        out.push('\n');
    }

    fn end_verse(&mut self, out: &mut String) {
        out.push_str("[/Bl]\n");
    }

    fn end_verse_line(&mut self, out: &mut String) {
        out.push('\n');
    }

    fn end_stanza(&mut self, out: &mut String) {
        out.push_str("[stanza]\n");
    }

    fn begin_table(&mut self, out: &mut String, table: &TableInfo<'_>) {
        out.push_str(&format!("[Bl table cols={}", table.columns));
        attr(out, "n", table.entry.map(|e| e.num.as_str()));
        out.push(']');
        out.push_str(table.title);
        out.push('\n');
    }

    fn end_table(&mut self, out: &mut String) {
        out.push_str("[/Bl]\n");
    }

    fn begin_table_row(&mut self, out: &mut String) {
        out.push_str("[Tr]");
    }

    fn end_table_row(&mut self, out: &mut String) {
        out.push_str("[/Tr]\n");
    }

    fn begin_table_cell(&mut self, out: &mut String) {
        out.push_str("[Td]");
    }

    fn end_table_cell(&mut self, out: &mut String) {
        out.push_str("[/Td]");
    }

    fn begin_header(&mut self, out: &mut String, header: &HeaderInfo<'_>) {
        out.push('[');
        out.push_str(header.macro_name);
        attr(out, "", Some(header.num));
        attr(out, "ref", Some(header.reference));
        out.push(']');
    }

    fn end_header(&mut self, out: &mut String, header: &HeaderInfo<'_>) {
        out.push_str(&format!("[/{}]\n", header.macro_name));
    }

    fn figure(&mut self, out: &mut String, figure: &FigureInfo<'_>) {
        out.push_str(&format!("[Fig {} ref={}", figure.entry.num, figure.entry.reference));
        attr(out, "link", figure.link);
        out.push_str(&format!("]{}|{}[/Fig]\n", figure.image, figure.caption));
    }

    fn table_of_contents(&mut self, out: &mut String, request: &TocRequest<'_>) {
        let kind = match request.kind {
            LoxKind::Toc => "toc",
            LoxKind::Figures => "lof",
            LoxKind::Tables => "lot",
            LoxKind::Poems => "lop",
        };
        out.push_str("[Tc ");
        out.push_str(kind);
        if request.mini {
            out.push_str(" mini");
        }
        attr(out, "title", request.title);
        out.push_str("]\n");
        for entry in request.entries {
            if !request.nonum && !entry.num.is_empty() {
                out.push_str(&entry.num);
                out.push(' ');
            }
            out.push_str(&format!("{} #{}\n", self.render_text(&entry.title), entry.reference));
        }
        out.push_str("[/Tc]\n");
    }

    fn raw(&mut self, out: &mut String, text: &str) {
        out.push_str(text);
    }
}

//! Compilation state and the block processing loop.

use crate::config::Config;
use crate::diagnostics::{CallSite, Diagnostic, Diagnostics};
use crate::filter;
use crate::inline::interpolate;
use crate::loader::SourceLoader;
use crate::macros::{self, MacroTable};
use crate::options::{format_matches, from_spec, parse_options, OptionSpec, Options};
use crate::renderer::{Dtag, Ftag, Mtag, ParagraphBreak, Renderer};
use crate::scope::{Scope, ScopeKind, ScopeStacks};
use crate::toc::{
    CounterEvent, IdInfo, IdKind, IdTable, LoxEntry, LoxKind, LoxRegistry, TocCounters,
};
use crate::usermacro::{PendingDefinition, UserMacroDef};
use crate::EngineError;
use frundis_parser::{Block, Inline, Macro, Parser};
use std::collections::{BTreeMap, HashMap};
use std::rc::Rc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pass {
    /// Gathers ids, TOC entries and table shapes. Produces no output.
    Info,
    /// Drives the renderer.
    Process,
}

/// A block sequence being processed: a file or a user macro expansion.
#[derive(Debug, Clone)]
pub(crate) struct Frame {
    pub file: Rc<str>,
    pub blocks: Rc<[Block]>,
    pub index: usize,
    pub call_site: Option<CallSite>,
    pub user_macro: Option<String>,
}

impl Frame {
    pub fn new(file: Rc<str>, blocks: Rc<[Block]>, call_site: Option<CallSite>) -> Self {
        Self {
            file,
            blocks,
            index: 0,
            call_site,
            user_macro: None,
        }
    }
}

/// Text captured between `.Bf` and `.Ef`.
#[derive(Debug, Clone)]
pub(crate) struct RawBlock {
    pub ftag: Option<Ftag>,
    /// False when `-f` excludes the current format.
    pub keep: bool,
    pub text: String,
    pub file: Rc<str>,
    pub line: usize,
}

/// A false `#if` region being skipped.
#[derive(Debug, Clone)]
pub(crate) struct SkipRegion {
    pub depth: usize,
    pub file: Rc<str>,
    pub line: usize,
}

/// State that starts over with each pass.
#[derive(Debug, Default)]
pub(crate) struct PassState {
    pub scopes: ScopeStacks,
    pub in_paragraph: bool,
    pub raw: Option<RawBlock>,
    pub defining: Option<PendingDefinition>,
    pub skip: Option<SkipRegion>,
    pub macro_depth: usize,
    /// Set when the depth limit is hit: enclosing frames stop early.
    pub overflow: bool,
    pub frames: Vec<Frame>,
    pub vars: HashMap<String, String>,
    pub user_macros: HashMap<String, Rc<UserMacroDef>>,
    pub lox_cursor: HashMap<LoxKind, usize>,
    pub tables_opened: usize,
    pub events: Vec<CounterEvent>,
    pub out: String,
}

/// Everything a compilation knows. One context compiles one document.
pub struct Context {
    config: Config,
    loader: Box<dyn SourceLoader>,
    pub(crate) format: String,
    macros: MacroTable,

    pub(crate) params: BTreeMap<String, String>,
    pub(crate) dtags: HashMap<String, Dtag>,
    pub(crate) mtags: HashMap<String, Mtag>,
    pub(crate) ftags: HashMap<String, Ftag>,

    files: HashMap<String, Rc<[Block]>>,
    pub(crate) ids: IdTable,
    pub(crate) lox: LoxRegistry,
    pub(crate) table_columns: Vec<usize>,
    pub(crate) toc: TocCounters,
    info_events: Vec<CounterEvent>,
    diagnostics: Diagnostics,

    pass: Pass,
    pub(crate) state: PassState,
}

impl Context {
    pub fn new(config: Config, loader: Box<dyn SourceLoader>) -> Self {
        Self {
            config,
            loader,
            format: String::new(),
            macros: MacroTable::new(),
            params: BTreeMap::new(),
            dtags: HashMap::new(),
            mtags: HashMap::new(),
            ftags: HashMap::new(),
            files: HashMap::new(),
            ids: IdTable::default(),
            lox: LoxRegistry::default(),
            table_columns: Vec::new(),
            toc: TocCounters::default(),
            info_events: Vec::new(),
            diagnostics: Diagnostics::new(),
            pass: Pass::Info,
            state: PassState::default(),
        }
    }

    // =========================================================================
    // Entry points
    // =========================================================================

    /// Compile the document `path` names, as resolved by the loader.
    pub fn compile(&mut self, r: &mut dyn Renderer, path: &str) -> Result<String, EngineError> {
        let key = self.loader.resolve(path).ok_or_else(|| EngineError::NotFound {
            path: path.to_string(),
        })?;
        let blocks = self.load(&key)?;
        self.run_passes(r, Rc::from(key.as_str()), blocks)
    }

    /// Compile an in-memory main document. Inclusions still go through the
    /// loader.
    pub fn compile_source(
        &mut self,
        r: &mut dyn Renderer,
        name: &str,
        source: &str,
    ) -> Result<String, EngineError> {
        let blocks = self.parse_into_cache(name, source)?;
        self.run_passes(r, Rc::from(name), blocks)
    }

    fn run_passes(
        &mut self,
        r: &mut dyn Renderer,
        file: Rc<str>,
        blocks: Rc<[Block]>,
    ) -> Result<String, EngineError> {
        self.format = r.format().to_string();
        self.macros = r.macros();
        self.pass = Pass::Info;
        self.state = PassState::default();

        log::debug!("{file}: info pass");
        self.run_frame(r, Frame::new(Rc::clone(&file), Rc::clone(&blocks), None))?;
        self.end_of_input(r);

        self.reset_for_process_pass();

        log::debug!("{file}: process pass");
        self.run_frame(r, Frame::new(Rc::clone(&file), blocks, None))?;
        self.end_of_input(r);

        if self.info_events != self.state.events {
            log::error!(
                "{file}: {} counter events in the info pass, {} in the process pass",
                self.info_events.len(),
                self.state.events.len()
            );
            self.error_at(&file, 0, None, "internal error: the two passes disagree on numbering");
        }
        Ok(self.state.out.clone())
    }

    /// Switch to the process pass.
    ///
    /// Kept: ids, lists of X, header levels, table columns, parameters,
    /// tags, the file cache and diagnostics. Everything in [`PassState`]
    /// starts over, including `.#dv` variables and user macros, which are
    /// redefined as the process pass meets their definitions again. The
    /// sequence counters restart at zero.
    fn reset_for_process_pass(&mut self) {
        self.info_events = std::mem::take(&mut self.state.events);
        self.state = PassState::default();
        self.toc.reset_counts();
        self.pass = Pass::Process;
    }

    /// Report and close whatever is still open.
    fn end_of_input(&mut self, r: &mut dyn Renderer) {
        if let Some(pending) = self.state.defining.take() {
            let message = format!("definition of `{}` not closed by #.", pending.name);
            self.error_at(&pending.file, pending.line, Some("#de"), message);
        }
        if let Some(skip) = self.state.skip.take() {
            self.error_at(&skip.file, skip.line, Some("#if"), "#if not closed at end of input");
        }
        if let Some(raw) = self.state.raw.take() {
            self.error_at(&raw.file, raw.line, Some("Bf"), "Bf not closed by Ef");
        }

        while let Some(scope) = self.state.scopes.inline.pop() {
            self.report_unclosed(&scope);
            self.quietly(|ctx| ctx.close_markup(r, &scope, ""));
        }
        while let Some(scope) = self.state.scopes.block.pop() {
            let item_of_list = matches!(scope.kind, ScopeKind::Item(_))
                && matches!(
                    self.state.scopes.block.last().map(|s| &s.kind),
                    Some(ScopeKind::List(_))
                );
            if !item_of_list {
                self.report_unclosed(&scope);
            }
            self.quietly(|ctx| ctx.close_scope(r, scope));
        }
        self.end_paragraph(r, ParagraphBreak::Normal);
    }

    fn report_unclosed(&mut self, scope: &Scope) {
        let opener = scope.kind.opener();
        let message = match &scope.tag {
            Some(tag) => format!("{opener} -t {tag} not closed at end of input"),
            None => format!("{opener} not closed at end of input"),
        };
        self.error_at(&scope.file, scope.line, Some(opener), message);
    }

    // =========================================================================
    // Queries
    // =========================================================================

    pub fn pass(&self) -> Pass {
        self.pass
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn format(&self) -> &str {
        &self.format
    }

    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    pub fn id(&self, id: &str) -> Option<&IdInfo> {
        self.ids.get(id)
    }

    pub fn lox(&self, kind: LoxKind) -> &[LoxEntry] {
        self.lox.get(kind)
    }

    pub fn params(&self) -> &BTreeMap<String, String> {
        &self.params
    }

    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(String::as_str)
    }

    /// Column count of each table, in document order.
    pub fn table_columns(&self) -> &[usize] {
        &self.table_columns
    }

    pub fn info_events(&self) -> &[CounterEvent] {
        &self.info_events
    }

    pub fn process_events(&self) -> &[CounterEvent] {
        match self.pass {
            Pass::Process => &self.state.events,
            Pass::Info => &[],
        }
    }

    /// Output of the last process pass.
    pub fn output(&self) -> &str {
        &self.state.out
    }

    /// Whether every scope was closed at the end of the last pass.
    pub fn scopes_balanced(&self) -> bool {
        self.state.scopes.is_empty()
    }

    pub fn is_user_macro(&self, name: &str) -> bool {
        self.state.user_macros.contains_key(name)
    }

    // =========================================================================
    // Files
    // =========================================================================

    pub(crate) fn resolve(&self, name: &str) -> Option<String> {
        self.loader.resolve(name)
    }

    pub(crate) fn read(&self, key: &str) -> Result<String, EngineError> {
        self.loader.read(key).map_err(|source| EngineError::Read {
            path: key.to_string(),
            source,
        })
    }

    /// Parsed blocks of a file, parsing it on first use.
    pub(crate) fn load(&mut self, key: &str) -> Result<Rc<[Block]>, EngineError> {
        if let Some(blocks) = self.files.get(key) {
            return Ok(Rc::clone(blocks));
        }
        let source = self.read(key)?;
        self.parse_into_cache(key, &source)
    }

    fn parse_into_cache(&mut self, key: &str, source: &str) -> Result<Rc<[Block]>, EngineError> {
        log::debug!("parsing {key}");
        let document = Parser::parse(source).map_err(|source| EngineError::Parse {
            path: key.to_string(),
            source,
        })?;
        for warning in &document.warnings {
            let message = format!("{} (column {})", warning.message, warning.column);
            self.error_at(key, warning.line, None, message);
        }
        let blocks: Rc<[Block]> = Rc::from(document.blocks);
        self.files.insert(key.to_string(), Rc::clone(&blocks));
        Ok(blocks)
    }

    // =========================================================================
    // Processing
    // =========================================================================

    /// Process every block of a frame. Stops early after a depth overflow.
    pub(crate) fn run_frame(
        &mut self,
        r: &mut dyn Renderer,
        frame: Frame,
    ) -> Result<(), EngineError> {
        let blocks = Rc::clone(&frame.blocks);
        self.state.frames.push(frame);
        let mut result = Ok(());
        for (index, block) in blocks.iter().enumerate() {
            if self.state.overflow {
                break;
            }
            if let Some(frame) = self.state.frames.last_mut() {
                frame.index = index;
            }
            if let Err(err) = self.process_block(r, block) {
                result = Err(err);
                break;
            }
        }
        self.state.frames.pop();
        result
    }

    fn process_block(&mut self, r: &mut dyn Renderer, block: &Block) -> Result<(), EngineError> {
        if let Some(skip) = self.state.skip.as_mut() {
            match block.macro_name() {
                Some("#if") => skip.depth += 1,
                Some("#;") => {
                    skip.depth -= 1;
                    if skip.depth == 0 {
                        self.state.skip = None;
                    }
                }
                _ => {}
            }
            return Ok(());
        }

        if let Some(pending) = self.state.defining.as_mut() {
            if block.macro_name() == Some("#.") {
                self.finish_definition();
            } else {
                pending.body.push(block.clone());
            }
            return Ok(());
        }

        match block {
            Block::Text(t) => {
                self.process_text(r, &t.text);
                Ok(())
            }
            Block::Macro(m) => self.process_macro(r, m),
        }
    }

    fn process_macro(&mut self, r: &mut dyn Renderer, m: &Macro) -> Result<(), EngineError> {
        if self.state.raw.is_some() && m.name != "Ef" {
            self.error("macro not allowed inside Bf block; ignored");
            return Ok(());
        }
        if let Some(def) = self.state.user_macros.get(&m.name).map(Rc::clone) {
            return self.expand_user_macro(r, def, m);
        }
        if let Some(handler) = macros::builtin(&m.name) {
            return handler(self, r, m);
        }
        if let Some(handler) = self.macros.get(m.name.as_str()).copied() {
            return handler(self, r, m);
        }
        if self.processing() {
            self.error("unknown macro");
        }
        Ok(())
    }

    // =========================================================================
    // Diagnostics
    // =========================================================================

    /// File, line and macro of the block being processed.
    fn location(&self) -> (Rc<str>, usize, Option<String>) {
        match self.state.frames.last() {
            Some(frame) => {
                let block = frame.blocks.get(frame.index);
                (
                    Rc::clone(&frame.file),
                    block.map_or(0, Block::line),
                    block.and_then(Block::macro_name).map(str::to_string),
                )
            }
            None => (Rc::from(""), 0, None),
        }
    }

    pub(crate) fn current_file(&self) -> Rc<str> {
        self.location().0
    }

    /// Name of the macro being processed, used as the trigger of forced
    /// scope closings.
    pub(crate) fn trigger(&self) -> String {
        self.location().2.unwrap_or_else(|| "paragraph break".to_string())
    }

    fn current_user_macro(&self) -> Option<String> {
        self.state.frames.iter().rev().find_map(|f| f.user_macro.clone())
    }

    /// Report a diagnostic at the current location.
    pub(crate) fn error(&mut self, message: impl Into<String>) {
        let (file, line, macro_name) = self.location();
        let call_sites = self
            .state
            .frames
            .iter()
            .rev()
            .filter_map(|f| f.call_site.clone())
            .collect();
        self.diagnostics.report(Diagnostic {
            file: file.to_string(),
            line,
            macro_name,
            message: message.into(),
            call_sites,
        });
    }

    pub(crate) fn error_at(
        &mut self,
        file: &str,
        line: usize,
        macro_name: Option<&str>,
        message: impl Into<String>,
    ) {
        self.diagnostics.report(Diagnostic {
            file: file.to_string(),
            line,
            macro_name: macro_name.map(str::to_string),
            message: message.into(),
            call_sites: Vec::new(),
        });
    }

    /// Run `f` with diagnostics muted.
    pub(crate) fn quietly<T>(&mut self, f: impl FnOnce(&mut Self) -> T) -> T {
        self.diagnostics.mute();
        let result = f(self);
        self.diagnostics.unmute();
        result
    }

    // =========================================================================
    // Handler helpers
    // =========================================================================

    pub(crate) fn processing(&self) -> bool {
        self.pass == Pass::Process
    }

    pub(crate) fn out(&mut self) -> &mut String {
        &mut self.state.out
    }

    pub(crate) fn new_scope(&self, kind: ScopeKind) -> Scope {
        let (file, line, _) = self.location();
        let mut scope = Scope::new(kind, file, line);
        scope.in_user_macro = self.current_user_macro();
        scope
    }

    /// Interpolate inline atoms, reporting undefined variables.
    pub(crate) fn text_of(&mut self, inlines: &[Inline]) -> String {
        let (text, issues) = interpolate(inlines, &self.state.vars);
        for issue in issues {
            self.error(issue.message());
        }
        text
    }

    /// Interpolated arguments joined with spaces.
    pub(crate) fn args_text(&mut self, args: &[Vec<Inline>]) -> String {
        let words: Vec<String> = args.iter().map(|arg| self.text_of(arg)).collect();
        words.join(" ")
    }

    pub(crate) fn options<'a>(
        &mut self,
        args: &'a [Vec<Inline>],
        spec: &'static OptionSpec,
    ) -> (Options, &'a [Vec<Inline>]) {
        let (options, rest, issues) = parse_options(args, from_spec(spec));
        for issue in issues {
            self.error(issue.message());
        }
        (options, rest)
    }

    pub(crate) fn opt_text(&mut self, options: &Options, name: &str) -> Option<String> {
        options.value(name).map(|value| self.text_of(value))
    }

    /// Whether `-f formats`, if given, includes the current format.
    pub(crate) fn format_allowed(&mut self, options: &Options) -> bool {
        match self.opt_text(options, "f") {
            Some(formats) => format_matches(&formats, &self.format),
            None => true,
        }
    }

    pub(crate) fn dtag(&mut self, name: Option<&str>) -> Dtag {
        let Some(name) = name else {
            return Dtag::default();
        };
        match self.dtags.get(name) {
            Some(tag) => tag.clone(),
            None => {
                self.unknown_tag(name);
                Dtag::default()
            }
        }
    }

    pub(crate) fn mtag(&mut self, name: Option<&str>) -> Mtag {
        let Some(name) = name else {
            return Mtag::default();
        };
        match self.mtags.get(name) {
            Some(tag) => tag.clone(),
            None => {
                self.unknown_tag(name);
                Mtag::default()
            }
        }
    }

    pub(crate) fn ftag(&mut self, name: Option<&str>) -> Option<Ftag> {
        let name = name?;
        let tag = self.ftags.get(name).cloned();
        if tag.is_none() {
            self.unknown_tag(name);
        }
        tag
    }

    /// Tags are all known once the info pass is over.
    fn unknown_tag(&mut self, name: &str) {
        if self.processing() {
            self.error(format!("unknown tag `{name}`"));
        }
    }

    /// Register an id during the info pass.
    pub(crate) fn register_id(&mut self, id: &str, info: IdInfo) {
        if self.processing() {
            return;
        }
        if id.is_empty() {
            self.error("empty id");
        } else if !self.ids.register(id, info) {
            self.error(format!("id `{id}` already used"));
        }
    }

    pub(crate) fn record_event(&mut self, macro_name: &str, id: Option<&str>, count: &str) {
        self.state.events.push(CounterEvent {
            macro_name: macro_name.to_string(),
            id: id.map(str::to_string),
            count: count.to_string(),
        });
    }

    /// The info pass creates a list entry; the process pass fetches the
    /// entry created by the same call.
    pub(crate) fn lox_entry(
        &mut self,
        kind: LoxKind,
        make: impl FnOnce() -> LoxEntry,
    ) -> Option<LoxEntry> {
        match self.pass {
            Pass::Info => {
                let entry = make();
                self.lox.push(kind, entry.clone());
                Some(entry)
            }
            Pass::Process => {
                let cursor = self.state.lox_cursor.entry(kind).or_insert(0);
                let entry = self.lox.get(kind).get(*cursor).cloned();
                *cursor += 1;
                entry
            }
        }
    }

    /// Entries of `kind` reached so far in this pass.
    pub(crate) fn lox_position(&self, kind: LoxKind) -> usize {
        match self.pass {
            Pass::Info => self.lox.get(kind).len(),
            Pass::Process => self.state.lox_cursor.get(&kind).copied().unwrap_or(0),
        }
    }

    /// Count a figure, titled table or titled poem, creating its list entry
    /// and registering its id.
    pub(crate) fn numbered_entry(
        &mut self,
        r: &dyn Renderer,
        kind: LoxKind,
        macro_name: &str,
        title: &str,
        id: Option<&str>,
    ) -> Option<LoxEntry> {
        let count = self.toc.next_count(kind);
        let key = id.map_or_else(|| count.to_string(), str::to_string);
        let entry = self.lox_entry(kind, || LoxEntry {
            count,
            macro_name: macro_name.to_string(),
            num: count.to_string(),
            reference: r.gen_ref(kind.prefix(), &key, true),
            title: title.to_string(),
            nonum: false,
            id: id.map(str::to_string),
        });
        if let (Some(id), Some(entry)) = (id, &entry) {
            let id_kind = match kind {
                LoxKind::Figures => IdKind::Figure,
                LoxKind::Tables => IdKind::Table,
                LoxKind::Poems => IdKind::Poem,
                LoxKind::Toc => IdKind::Header(macro_name.to_string()),
            };
            let info = IdInfo {
                reference: entry.reference.clone(),
                name: title.to_string(),
                kind: id_kind,
            };
            self.register_id(id, info);
        }
        self.record_event(macro_name, id, &count.to_string());
        entry
    }

    /// Pipe raw text through an ftag's shell command, when it has one and
    /// the configuration allows it.
    pub(crate) fn run_filter(&mut self, ftag: Option<&Ftag>, text: String) -> String {
        let Some(command) = ftag.and_then(|t| t.shell.clone()) else {
            return text;
        };
        if !self.config.unrestricted {
            self.error(format!("filter `{command}` not run in restricted mode"));
            return text;
        }
        match filter::pipe_through_shell(&command, &text) {
            Ok(filtered) => filtered,
            Err(err) => {
                self.error(err.to_string());
                text
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{compile, compile_with, messages};
    use crate::loader::MemoryLoader;
    use crate::trace::TraceRenderer;
    use pretty_assertions::assert_eq;

    // =========================================================================
    // Passes
    // =========================================================================

    #[test]
    fn test_plain_paragraphs() {
        let (out, ctx) = compile("one\ntwo\n\nthree\n");
        assert_eq!(out, "[P]one\ntwo\n[/P]\n[P]three\n[/P]\n");
        assert!(ctx.diagnostics().is_empty());
        assert!(ctx.scopes_balanced());
    }

    #[test]
    fn test_info_pass_produces_no_output() {
        // Forward reference: resolved thanks to the info pass.
        let (out, ctx) = compile(".Sx later\n.Sh -id later Later\n");
        assert!(out.contains("[Sx #later]Later[/Sx]"), "{out}");
        assert!(ctx.diagnostics().is_empty(), "{:?}", messages(&ctx));
    }

    #[test]
    fn test_passes_agree() {
        let source = "\
.#de sec
.Sh \\$1
.#.
.Ch One
.sec A
.Fig -id f img.png Caption
.Bl -t table Numbers
.It 1
.Ta 2
.El
.Ch Two
.sec B
";
        let (_, ctx) = compile(source);
        assert!(!ctx.info_events().is_empty());
        assert_eq!(ctx.info_events(), ctx.process_events());
        assert!(ctx.diagnostics().is_empty(), "{:?}", messages(&ctx));
    }

    #[test]
    fn test_unknown_macro_reported_once() {
        let (_, ctx) = compile(".Zz\n");
        assert_eq!(messages(&ctx), vec!["unknown macro"]);
        let d = ctx.diagnostics().iter().next().unwrap();
        assert_eq!(d.macro_name.as_deref(), Some("Zz"));
        assert_eq!(d.line, 1);
    }

    // =========================================================================
    // Files
    // =========================================================================

    #[test]
    fn test_compile_missing_file() {
        let mut ctx = Context::new(Config::default(), Box::new(MemoryLoader::new()));
        let err = ctx.compile(&mut TraceRenderer::new(), "nope.frundis").unwrap_err();
        assert!(matches!(err, EngineError::NotFound { .. }));
    }

    #[test]
    fn test_include_is_parsed_once() {
        let loader = MemoryLoader::new().with_file("part.frundis", "included\n");
        let source = ".If part.frundis\n.If part.frundis\n";
        let (out, ctx) = compile_with(loader, Config::default(), source);
        assert_eq!(out, "[P]included\nincluded\n[/P]\n");
        assert_eq!(ctx.files.len(), 2);
    }

    #[test]
    fn test_scanner_warnings_become_diagnostics() {
        let (_, ctx) = compile("bad \\q escape\n");
        assert_eq!(ctx.diagnostics().len(), 1);
        assert_eq!(ctx.diagnostics().iter().next().unwrap().line, 1);
    }

    // =========================================================================
    // Depth
    // =========================================================================

    #[test]
    fn test_recursive_macro_stops() {
        let (_, ctx) = compile(".#de loop\n.loop\n.#.\n.loop\ntext after\n");
        let depth_errors = messages(&ctx)
            .into_iter()
            .filter(|m| m.starts_with("too much depth"))
            .count();
        assert_eq!(depth_errors, 1);
        assert!(ctx.output().contains("text after"));
    }

    #[test]
    fn test_recursive_include_stops() {
        let loader = MemoryLoader::new().with_file("self.frundis", ".If self.frundis\n");
        let (_, ctx) = compile_with(loader, Config::default(), ".If self.frundis\n");
        assert!(messages(&ctx).iter().any(|m| m.starts_with("too much depth")));
    }

    #[test]
    fn test_depth_limit_is_configurable() {
        let mut config = Config::default();
        config.max_depth = 2;
        let source = ".#de a\n.b\n.#.\n.#de b\n.c\n.#.\n.#de c\ndeep\n.#.\n.a\n";
        let (out, ctx) = compile_with(MemoryLoader::new(), config, source);
        assert!(!out.contains("deep"));
        assert_eq!(ctx.diagnostics().len(), 1);
    }
}

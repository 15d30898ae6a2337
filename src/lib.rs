use std::fmt::{Display, Formatter};
use std::io::Write;
use std::sync::Arc;
use swc::config::IsModule;
use swc_core::common::{FileName, GLOBALS, Globals, SourceMap};
use swc_core::common::comments::SingleThreadedComments;
use swc_core::common::errors::{EmitterWriter, Handler};
use swc_core::ecma::ast::{EsVersion, Program};
use swc_core::ecma::codegen::{Config, Emitter};
use swc_core::ecma::codegen::text_writer::JsWriter;
use swc_core::ecma::visit::VisitMutWith;
use swc_ecma_parser::{EsConfig, Syntax};
use tracing::debug;
use obfuscate::Context;
use obfuscate::guard::Guard;

pub mod obfuscate;
pub mod options;
mod shared_cursor;
#[cfg(test)]
mod testing;

pub use options::{ConfigurationError, IdentifierNamesGenerator, Options, SourceType, StringArrayEncoding};

/// An obfuscation error.
#[derive(Debug)]
pub enum ObfuscateError {
    /// The options are invalid, or a finite option ran out.
    Configuration(ConfigurationError),

    /// The input is not valid JavaScript.
    Parse(ParseError),

    /// A transformation could not be applied consistently.
    Structural(StructuralError),

    /// Failed to print the program.
    Emit(std::io::Error),

    /// The printed program or the parser diagnostics are not valid UTF-8.
    Utf8(std::string::FromUtf8Error),

    /// The thread that runs the obfuscation could not be started.
    Spawn(std::io::Error)
}

impl Display for ObfuscateError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Configuration(e) => write!(f, "ConfigurationError: {}", e),
            Self::Parse(e) => write!(f, "ParseError: {}", e),
            Self::Structural(e) => write!(f, "StructuralError: {}", e),
            Self::Emit(e) => write!(f, "EmitError: {}", e),
            Self::Utf8(e) => write!(f, "Utf8Error: {}", e),
            Self::Spawn(e) => write!(f, "SpawnError: {}", e)
        }
    }
}

impl std::error::Error for ObfuscateError {}

impl From<ConfigurationError> for ObfuscateError {
    fn from(err: ConfigurationError) -> Self {
        Self::Configuration(err)
    }
}

impl From<ParseError> for ObfuscateError {
    fn from(err: ParseError) -> Self {
        Self::Parse(err)
    }
}

impl From<StructuralError> for ObfuscateError {
    fn from(err: StructuralError) -> Self {
        Self::Structural(err)
    }
}

impl From<std::io::Error> for ObfuscateError {
    fn from(err: std::io::Error) -> Self {
        Self::Emit(err)
    }
}

impl From<std::string::FromUtf8Error> for ObfuscateError {
    fn from(err: std::string::FromUtf8Error) -> Self {
        Self::Utf8(err)
    }
}

/// SWC failed to parse the input.
#[derive(Debug)]
pub struct ParseError {
    /// The fatal error, if parsing stopped.
    pub error: Option<anyhow::Error>,

    /// Every diagnostic emitted by the parser, one per line.
    pub diagnostics: Vec<String>
}

impl Display for ParseError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match &self.error {
            Some(e) if self.diagnostics.is_empty() => write!(f, "{}", e),
            Some(e) => write!(f, "{}: {}", e, self.diagnostics.join(", ")),
            None => write!(f, "{}", self.diagnostics.join(", "))
        }
    }
}

impl std::error::Error for ParseError {}

/// An internal invariant was violated while transforming.
#[derive(Debug, Clone, PartialEq)]
pub enum StructuralError {
    /// A synthesized code template did not parse or lacks an expected node.
    Template(String),

    /// A pooled string could not be encoded or decoded.
    Encoding(String),

    /// No rotation count could be verified against the comparator.
    RotationUnverifiable,

    /// A binding was assigned a second replacement name.
    ReplacementAlreadySet(String)
}

impl Display for StructuralError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Template(e) => write!(f, "invalid template: {}", e),
            Self::Encoding(e) => write!(f, "encoding failed: {}", e),
            Self::RotationUnverifiable => write!(f, "no verifiable string array rotation"),
            Self::ReplacementAlreadySet(name) => write!(f, "binding {} was renamed twice", name)
        }
    }
}

impl std::error::Error for StructuralError {}

/// The output of one run.
#[derive(Debug, Clone)]
pub struct ObfuscationResult {
    /// The obfuscated program.
    pub code: String,

    /// The seed the run used. Passing it back as [Options::seed] reproduces `code`.
    pub seed: u64
}

/// Stack size of the thread each run happens on.
/// Split strings build concatenation chains that every later pass walks recursively.
const STACK_SIZE: usize = 64 * 1024 * 1024;

/// Obfuscates JavaScript source code.
///
/// The work happens on a dedicated thread with a [STACK_SIZE] stack, so
/// callers may run it from threads with small stacks.
pub fn obfuscate(code: &str, options: &Options) -> Result<ObfuscationResult, ObfuscateError> {
    std::thread::scope(|scope| {
        let worker = std::thread::Builder::new()
            .name(String::from("obfuscate"))
            .stack_size(STACK_SIZE)
            .spawn_scoped(scope, || run(code, options))
            .map_err(ObfuscateError::Spawn)?;

        worker.join().unwrap_or_else(|e| std::panic::resume_unwind(e))
    })
}

/// Parses, transforms and prints on the current thread.
fn run(code: &str, options: &Options) -> Result<ObfuscationResult, ObfuscateError> {
    options.validate()?;

    let cm = Arc::<SourceMap>::default();
    let err_dst = shared_cursor::SharedCursor::new();
    let handler = Handler::with_emitter(
        false,
        false,
        Box::new(EmitterWriter::new(
            Box::new(err_dst.clone()) as Box<dyn Write + Send>,
            None,
            true,
            false
        ))
    );
    let compiler = swc::Compiler::new(cm.clone());
    let fm = cm.new_source_file(FileName::Custom("input.js".into()), code.to_string());
    let comments = SingleThreadedComments::default();

    let globals = Globals::new();
    let parsed = GLOBALS.set(&globals, || compiler.parse_js(
        fm,
        &handler,
        EsVersion::latest(),
        Syntax::Es(EsConfig::default()),
        IsModule::Bool(options.source_type == SourceType::Module),
        Some(&comments)
    ));

    // Recoverable errors are only reported to the handler
    let diagnostics: Vec<String> = String::from_utf8(err_dst.get_ref()?)?
        .split('\n')
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect();
    let mut program = match parsed {
        Ok(v) if diagnostics.is_empty() => v,
        Ok(_) => return Err(ParseError { error: None, diagnostics }.into()),
        Err(e) => return Err(ParseError { error: Some(e), diagnostics }.into())
    };

    let mut ctx = Context::new(options, Guard::from_comments(&comments));
    debug!(seed = ctx.seed, regions = ctx.guard.regions().len(), "parsed input");

    GLOBALS.set(&globals, || transform(&mut program, &mut ctx))?;

    Ok(ObfuscationResult {
        code: print(cm, &program)?,
        seed: ctx.seed
    })
}

/// Runs every enabled pass in order.
fn transform(program: &mut Program, ctx: &mut Context) -> Result<(), ObfuscateError> {
    let mut member_exprs = obfuscate::member_expr::Visitor::new(&ctx.guard);
    program.visit_mut_with(&mut member_exprs);
    debug!(converted = member_exprs.converted, "converted member expressions");

    obfuscate::rename::rename_identifiers(program, ctx)?;

    if ctx.options.dead_code_injection {
        obfuscate::dead_code::inject(program, ctx);
    }

    if ctx.options.split_strings {
        let chunk_length = usize::try_from(ctx.options.split_strings_chunk_length)
            .map_err(|_| ConfigurationError::NonPositiveChunkLength(ctx.options.split_strings_chunk_length))?;
        let mut splitter = obfuscate::split_strings::Visitor::new(
            &ctx.guard,
            &ctx.options.reserved_strings,
            chunk_length
        );
        program.visit_mut_with(&mut splitter);
        debug!(split = splitter.split, "split strings");
    }

    let string_array = obfuscate::string_array::collect(program, ctx)?;

    if ctx.options.control_flow_flattening {
        obfuscate::control_flow::flatten_program(program, ctx)?;
    }

    if let Some(array) = string_array {
        obfuscate::string_array::materialize(program, array, ctx)?;
    }

    if ctx.options.unicode_escape_sequence {
        let mut escape = obfuscate::escape::Visitor::new(&ctx.guard);
        program.visit_mut_with(&mut escape);
        debug!(escaped = escape.escaped, "escaped string literals");
    }

    // Synthesized nodes carry no parentheses
    program.visit_mut_with(&mut swc_ecma_transforms::fixer::fixer(None));

    Ok(())
}

/// Prints the program with SWC.
fn print(cm: Arc<SourceMap>, program: &Program) -> Result<String, ObfuscateError> {
    let mut cfg = Config::default();
    cfg.target = EsVersion::latest();

    let mut buf = Vec::new();
    {
        let mut emitter = Emitter {
            cfg,
            cm: cm.clone(),
            comments: None,
            wr: JsWriter::new(cm, "\n", &mut buf, None)
        };
        emitter.emit_program(program)?;
    }

    Ok(String::from_utf8(buf)?)
}

#[cfg(test)]
mod tests {
    use crate::testing::{compact, obfuscate_compact};
    use super::*;

    fn options() -> Options {
        Options {
            seed: 1,
            identifier_names_generator: IdentifierNamesGenerator::Mangled,
            ..Options::no_additional_nodes()
        }
    }

    #[test]
    fn test_parse_error() {
        match obfuscate("var = ;", &Options::default()) {
            Err(ObfuscateError::Parse(e)) => assert!(!e.diagnostics.is_empty() || e.error.is_some()),
            other => panic!("expected a parse error, got {:?}", other)
        }
    }

    #[test]
    fn test_invalid_options_rejected_before_parsing() {
        let options = Options {
            string_array_threshold: 1.5,
            ..Options::default()
        };

        match obfuscate("var = ;", &options) {
            Err(ObfuscateError::Configuration(ConfigurationError::InvalidThreshold { option, .. })) =>
                assert_eq!(option, "stringArrayThreshold"),
            other => panic!("expected a configuration error, got {:?}", other)
        }
    }

    #[test]
    fn test_guard_scopes_renaming() {
        let output = obfuscate_compact(
            "function foo() { var a = 1; return a; }\n// javascript-obfuscator:disable\nfunction bar() { var a = 2; return a; }",
            &options()
        );

        assert_eq!(output, compact("function foo() { var b = 1; return b; } function bar() { var a = 2; return a; }"));
    }

    #[test]
    fn test_guard_reenabled() {
        let output = obfuscate_compact(
            "// javascript-obfuscator:disable\nfunction foo(a) { return a.x; }\n// javascript-obfuscator:enable\nfunction bar(a) { return a.x; }",
            &options()
        );

        assert_eq!(output, compact("function foo(a) { return a.x; } function bar(b) { return b['x']; }"));
    }

    #[test]
    fn test_split_strings_scenario() {
        let split = |chunk_length| obfuscate_compact("var test = 'abcdefg';", &Options {
            split_strings: true,
            split_strings_chunk_length: chunk_length,
            ..options()
        });

        assert_eq!(split(2), compact("var test = 'ab' + 'cd' + 'ef' + 'g';"));
        assert_eq!(split(10), compact("var test = 'abcdefg';"));
    }

    #[test]
    fn test_reserved_string_never_split_or_pooled() {
        let output = obfuscate_compact("var a = 'bar'; var b = 'bazqux';", &Options {
            seed: 3,
            split_strings: true,
            split_strings_chunk_length: 2,
            string_array_threshold: 1.0,
            reserved_strings: vec![String::from("bar")],
            ..Options::default()
        });

        assert!(output.contains("vara='bar';"), "{}", output);
        assert!(!output.contains("bazqux"), "{}", output);
    }

    #[test]
    fn test_result_seed_reproduces_output() {
        let code = "function foo(x) { var y = 'hello' + x; return y; } foo('world');";
        let first = obfuscate(code, &Options::default()).expect("obfuscation failed");
        let second = obfuscate(code, &Options {
            seed: first.seed,
            ..Options::default()
        })
            .expect("obfuscation failed");

        assert_eq!(first.code, second.code);
    }

    #[test]
    fn test_module_source() {
        let output = obfuscate_compact("import a from 'b'; export default function () { return a; }", &Options {
            source_type: SourceType::Module,
            ..options()
        });

        assert_eq!(output, compact("import b from 'b'; export default function () { return b; }"));
    }
}

use std::sync::Arc;
use swc_core::common::{DUMMY_SP, FileName, SourceMap};
use swc_core::ecma::ast::{EsVersion, Program, Script, Stmt};
use swc_ecma_parser::{EsConfig, Syntax};
use crate::options::Options;

/// Removes all whitespace and normalizes double quotes to single quotes,
/// so that printed code can be compared regardless of formatting.
pub fn compact(code: &str) -> String {
    code.chars()
        .filter(|c| !c.is_whitespace())
        .map(|c| if c == '"' { '\'' } else { c })
        .collect()
}

/// Obfuscates `code` and compacts the output.
pub fn obfuscate_compact(code: &str, options: &Options) -> String {
    let result = crate::obfuscate(code, options)
        .expect("obfuscation failed");

    compact(&result.code)
}

/// Parses a script, keeping its spans.
pub fn parse_script(code: &str) -> Script {
    let cm = SourceMap::default();
    let fm = cm.new_source_file(FileName::Custom("test.js".into()), code.to_string());

    let mut errors = Vec::new();
    let script = swc_ecma_parser::parse_file_as_script(
        &fm,
        Syntax::Es(EsConfig::default()),
        EsVersion::latest(),
        None,
        &mut errors
    )
        .expect("script should parse");
    assert!(errors.is_empty(), "script has recoverable errors");

    script
}

/// Prints statements as a script.
pub fn print_stmts(stmts: &[Stmt]) -> String {
    let program = Program::Script(Script {
        span: DUMMY_SP,
        body: stmts.to_vec(),
        shebang: None
    });

    crate::print(Arc::<SourceMap>::default(), &program)
        .expect("statements should print")
}

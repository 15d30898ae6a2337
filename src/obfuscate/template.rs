use swc_core::common::{DUMMY_SP, FileName, SourceMap, Span};
use swc_core::ecma::ast::{EsVersion, Stmt};
use swc_core::ecma::visit::{VisitMut, VisitMutWith};
use swc_ecma_parser::{EsConfig, Syntax};
use crate::StructuralError;

/// Parses synthesized JavaScript into statements.
///
/// Every span is reset to [DUMMY_SP], so the guard never applies
/// to synthesized nodes and no position leaks from the template.
pub fn parse_stmts(code: String) -> Result<Vec<Stmt>, StructuralError> {
    let cm = SourceMap::default();
    let fm = cm.new_source_file(FileName::Custom("template.js".into()), code);

    let mut errors = Vec::new();
    let mut script = swc_ecma_parser::parse_file_as_script(
        &fm,
        Syntax::Es(EsConfig::default()),
        EsVersion::latest(),
        None,
        &mut errors
    )
        .map_err(|e| StructuralError::Template(format!("{:?}", e.kind())))?;

    if let Some(e) = errors.first() {
        return Err(StructuralError::Template(format!("{:?}", e.kind())));
    }

    script.visit_mut_with(&mut SpanRemover);
    Ok(script.body)
}

/// Replaces every span with [DUMMY_SP].
struct SpanRemover;

impl VisitMut for SpanRemover {
    fn visit_mut_span(&mut self, span: &mut Span) {
        *span = DUMMY_SP;
    }
}

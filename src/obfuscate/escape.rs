use swc_core::ecma::ast::{ModuleItem, Stmt, Str};
use swc_core::ecma::visit::{VisitMut, VisitMutWith};
use crate::obfuscate::guard::Guard;
use crate::obfuscate::{module_prologue_len, prologue_len};

/// Writes every UTF-16 code unit of `value` as an escape sequence, quoted.
pub fn escape(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len() * 4 + 2);
    escaped.push('\'');
    for unit in value.encode_utf16() {
        match unit {
            0..=0xff => escaped.push_str(&format!("\\x{:02x}", unit)),
            _ => escaped.push_str(&format!("\\u{:04x}", unit))
        }
    }
    escaped.push('\'');

    escaped
}

/// Rewrites the raw text of string literals with escape sequences.
/// Directive prologues are left alone since escapes would change their meaning.
pub struct Visitor<'a> {
    guard: &'a Guard,

    /// The number of escaped literals.
    pub escaped: usize
}

impl<'a> Visitor<'a> {
    pub fn new(guard: &'a Guard) -> Self {
        Self {
            guard,
            escaped: 0
        }
    }
}

impl<'a> VisitMut for Visitor<'a> {
    fn visit_mut_stmts(&mut self, stmts: &mut Vec<Stmt>) {
        let prologue = prologue_len(stmts);
        for stmt in stmts.iter_mut().skip(prologue) {
            stmt.visit_mut_with(self);
        }
    }

    fn visit_mut_module_items(&mut self, items: &mut Vec<ModuleItem>) {
        let prologue = module_prologue_len(items);
        for item in items.iter_mut().skip(prologue) {
            item.visit_mut_with(self);
        }
    }

    fn visit_mut_str(&mut self, s: &mut Str) {
        if self.guard.is_guarded(s.span) {
            return;
        }

        s.raw = Some(escape(&s.value).into());
        self.escaped += 1;
    }
}

#[cfg(test)]
mod tests {
    use crate::options::Options;
    use crate::testing::{compact, obfuscate_compact};
    use super::*;

    fn options() -> Options {
        Options {
            unicode_escape_sequence: true,
            ..Options::no_additional_nodes()
        }
    }

    #[test]
    fn test_escape() {
        assert_eq!(escape("ab"), r"'\x61\x62'");
        assert_eq!(escape("é€"), r"'\xe9\u20ac'");
        assert_eq!(escape("😀"), r"'\ud83d\ude00'");
        assert_eq!(escape("'"), r"'\x27'");
        assert_eq!(escape(""), "''");
    }

    #[test]
    fn test_literals_escaped() {
        let output = obfuscate_compact("var a = 'ab'; var b = { 'c': 1 };", &options());

        assert_eq!(output, compact(r"var a = '\x61\x62'; var b = { '\x63': 1 };"));
    }

    #[test]
    fn test_directives_untouched() {
        let output = obfuscate_compact("'use strict'; function f() { 'use strict'; return 'x'; }", &options());

        assert_eq!(output, compact(r"'use strict'; function f() { 'use strict'; return '\x78'; }"));
    }

    #[test]
    fn test_guarded_untouched() {
        let output = obfuscate_compact(
            "var a = 'x';\n// javascript-obfuscator:disable\nvar b = 'y';",
            &options()
        );

        assert_eq!(output, compact(r"var a = '\x78'; var b = 'y';"));
    }
}

use std::collections::HashSet;
use swc_core::common::Span;
use swc_core::ecma::ast::{BinaryOp, BinExpr, Expr, Lit, ModuleItem, Stmt, Str};
use swc_core::ecma::visit::{VisitMut, VisitMutWith};
use unicode_segmentation::UnicodeSegmentation;
use crate::obfuscate::guard::Guard;
use crate::obfuscate::{module_prologue_len, prologue_len, string_value};

/// Splits `value` into chunks of at most `chunk_length` user-perceived characters.
/// A combining sequence or surrogate pair is never cut.
pub fn split_chunks(value: &str, chunk_length: usize) -> Vec<String> {
    let graphemes: Vec<&str> = value.graphemes(true).collect();
    graphemes
        .chunks(chunk_length.max(1))
        .map(|chunk| chunk.concat())
        .collect()
}

/// Builds `'ab' + 'cd' + 'e'`, associating to the left.
fn concat_chain(chunks: Vec<String>, span: Span) -> Option<Box<Expr>> {
    let mut chunks = chunks.into_iter().map(|chunk| Box::new(Expr::Lit(Lit::Str(Str {
        span,
        value: chunk.into(),
        raw: None
    }))));
    let first = chunks.next()?;

    Some(chunks.fold(first, |left, right| Box::new(Expr::Bin(BinExpr {
        span,
        op: BinaryOp::Add,
        left,
        right
    }))))
}

/// Replaces long string literals with a concatenation of shorter ones.
///
/// Example, with a chunk length of 3:
/// ```js
/// var a = "abcdefg";
/// ```
///
/// is replaced with:
///
/// ```js
/// var a = "abc" + "def" + "g";
/// ```
pub struct Visitor<'a> {
    guard: &'a Guard,
    reserved: HashSet<&'a str>,
    chunk_length: usize,

    /// The number of split literals.
    pub split: usize
}

impl<'a> Visitor<'a> {
    pub fn new(guard: &'a Guard, reserved_strings: &'a [String], chunk_length: usize) -> Self {
        Self {
            guard,
            reserved: reserved_strings.iter().map(String::as_str).collect(),
            chunk_length,
            split: 0
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

    fn visit_mut_expr(&mut self, expr: &mut Expr) {
        let (span, value) = match string_value(expr) {
            Some(v) => v,
            None => {
                expr.visit_mut_children_with(self);
                return;
            }
        };

        if self.guard.is_guarded(span) || self.reserved.contains(&*value) {
            return;
        }

        let chunks = split_chunks(&value, self.chunk_length);
        if chunks.len() < 2 {
            return;
        }

        if let Some(chain) = concat_chain(chunks, span) {
            *expr = *chain;
            self.split += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::options::Options;
    use crate::testing::{compact, obfuscate_compact};
    use super::*;

    fn options(chunk_length: i64) -> Options {
        Options {
            split_strings: true,
            split_strings_chunk_length: chunk_length,
            ..Options::no_additional_nodes()
        }
    }

    #[test]
    fn test_split_chunks() {
        assert_eq!(split_chunks("abcdefg", 3), vec!["abc", "def", "g"]);
        assert_eq!(split_chunks("abc", 3), vec!["abc"]);
        assert!(split_chunks("", 3).is_empty());
    }

    #[test]
    fn test_large_string_on_small_stack() {
        let code = format!("var foo = '{}';", "a".repeat(10000));

        // Callers may run obfuscations on spawned threads with the default 2 MB stack
        let output = std::thread::Builder::new()
            .stack_size(2 * 1024 * 1024)
            .spawn(move || obfuscate_compact(&code, &options(2)))
            .expect("thread should spawn")
            .join()
            .expect("obfuscation should not overflow the stack");

        assert!(output.starts_with("varfoo='aa'+'aa'+"), "{}", &output[..40]);
        assert_eq!(output.matches("'aa'").count(), 5000);
    }

    #[test]
    fn test_split_chunks_keeps_graphemes() {
        // Astral symbols and combining marks stay whole
        assert_eq!(split_chunks("a😀b😀", 1), vec!["a", "😀", "b", "😀"]);
        assert_eq!(split_chunks("e\u{301}x", 1), vec!["e\u{301}", "x"]);
    }

    #[test]
    fn test_split_literal() {
        let output = obfuscate_compact("var s = 'abcdefg';", &options(3));

        assert_eq!(output, compact("var s = 'abc' + 'def' + 'g';"));
    }

    #[test]
    fn test_short_literal_untouched() {
        let output = obfuscate_compact("var s = 'abc';", &options(3));

        assert_eq!(output, compact("var s = 'abc';"));
    }

    #[test]
    fn test_template_literal_without_substitutions() {
        let output = obfuscate_compact("var s = `abcd`;", &options(2));

        assert_eq!(output, compact("var s = 'ab' + 'cd';"));
    }

    #[test]
    fn test_object_keys_and_directives_untouched() {
        let output = obfuscate_compact("'use strict'; var o = { 'abcd': 1 };", &options(2));

        assert_eq!(output, compact("'use strict'; var o = { 'abcd': 1 };"));
    }

    #[test]
    fn test_reserved_string_untouched() {
        let output = obfuscate_compact("var s = 'abcd'; var t = 'efgh';", &Options {
            reserved_strings: vec![String::from("abcd")],
            ..options(2)
        });

        assert_eq!(output, compact("var s = 'abcd'; var t = 'ef' + 'gh';"));
    }

    #[test]
    fn test_right_operand_parenthesized() {
        let output = obfuscate_compact("var s = 1 + 'abcd';", &options(2));

        assert_eq!(output, compact("var s = 1 + ('ab' + 'cd');"));
    }
}

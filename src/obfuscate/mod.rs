use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use swc_core::common::Span;
use swc_core::ecma::ast::{Expr, Lit, ModuleItem, Stmt};
use swc_core::ecma::atoms::JsWord;
use crate::obfuscate::guard::Guard;
use crate::obfuscate::rename::names::NameRegistry;
use crate::options::Options;

pub mod control_flow;
pub mod dead_code;
pub mod escape;
pub mod guard;
pub mod member_expr;
pub mod rename;
pub mod split_strings;
pub mod string_array;
pub mod template;

/// State shared by every pass of one run.
pub struct Context<'a> {
    pub options: &'a Options,

    /// The seed [Context::rng] was created from.
    pub seed: u64,

    /// Source of every randomized decision.
    pub rng: StdRng,

    pub guard: Guard,

    /// Knows every name in use, hands out names for synthesized declarations.
    pub names: NameRegistry
}

impl<'a> Context<'a> {
    pub fn new(options: &'a Options, guard: Guard) -> Self {
        let seed = match options.seed {
            0 => rand::random(),
            seed => seed
        };
        let mut rng = StdRng::seed_from_u64(seed);
        let mut names = NameRegistry::new(options, rng.gen());
        for name in string_array::runtime::GLOBALS_USED {
            names.reserve((*name).into());
        }

        Self {
            options,
            seed,
            rng,
            guard,
            names
        }
    }
}

/// Whether the statement is a string expression statement, the form of a directive.
pub fn is_directive(stmt: &Stmt) -> bool {
    match stmt {
        Stmt::Expr(expr) => matches!(&*expr.expr, Expr::Lit(Lit::Str(_))),
        _ => false
    }
}

/// Number of leading statements that form a directive prologue.
pub fn prologue_len(stmts: &[Stmt]) -> usize {
    stmts.iter().take_while(|stmt| is_directive(stmt)).count()
}

/// Whether the directive prologue of `stmts` contains `'use strict'`.
pub fn has_use_strict(stmts: &[Stmt]) -> bool {
    stmts[..prologue_len(stmts)].iter().any(|stmt| match stmt {
        Stmt::Expr(expr) => match &*expr.expr {
            // Escapes or line continuations make it an ordinary directive
            Expr::Lit(Lit::Str(s)) => match &s.raw {
                Some(raw) => &**raw == "'use strict'" || &**raw == "\"use strict\"",
                None => &*s.value == "use strict"
            },
            _ => false
        },
        _ => false
    })
}

/// [prologue_len] for module items.
pub fn module_prologue_len(items: &[ModuleItem]) -> usize {
    items.iter()
        .take_while(|item| matches!(item, ModuleItem::Stmt(stmt) if is_directive(stmt)))
        .count()
}

/// The value of a string literal, or of a template literal without substitutions.
pub fn string_value(expr: &Expr) -> Option<(Span, JsWord)> {
    match expr {
        Expr::Lit(Lit::Str(s)) => Some((s.span, s.value.clone())),
        Expr::Tpl(tpl) if tpl.exprs.is_empty() && tpl.quasis.len() == 1 => {
            let cooked = tpl.quasis[0].cooked.as_ref()?;
            Some((tpl.span, JsWord::from(&**cooked)))
        },
        _ => None
    }
}

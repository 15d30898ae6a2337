use rand::Rng;
use rand::distributions::Alphanumeric;
use rand::rngs::StdRng;
use swc_core::common::{DUMMY_SP, Spanned};
use swc_core::ecma::ast::{ArrowExpr, AwaitExpr, BinaryOp, BinExpr, BlockStmt, BlockStmtOrExpr, BreakStmt, Class, Constructor, ContinueStmt, Decl, Expr, FnDecl, Function, GetterProp, Ident, IfStmt, Lit, MetaPropExpr, Program, SetterProp, StaticBlock, Stmt, Str, Super, VarDecl, VarDeclKind, YieldExpr};
use swc_core::ecma::visit::{VisitMut, VisitMutWith};
use tracing::debug;
use crate::obfuscate::guard::Guard;
use crate::obfuscate::{Context, has_use_strict, prologue_len};

/// Finds what keeps a block from being copied into another function:
/// jumps, `await`, `yield`, `super`, `arguments`, meta properties, and
/// declarations that hoist out of the block. Doesn't descend into functions and classes.
#[derive(Default)]
struct HazardFinder {
    found: bool
}

impl VisitMut for HazardFinder {
    fn visit_mut_break_stmt(&mut self, _: &mut BreakStmt) {
        self.found = true;
    }

    fn visit_mut_continue_stmt(&mut self, _: &mut ContinueStmt) {
        self.found = true;
    }

    fn visit_mut_await_expr(&mut self, _: &mut AwaitExpr) {
        self.found = true;
    }

    fn visit_mut_yield_expr(&mut self, _: &mut YieldExpr) {
        self.found = true;
    }

    fn visit_mut_super(&mut self, _: &mut Super) {
        self.found = true;
    }

    fn visit_mut_meta_prop_expr(&mut self, _: &mut MetaPropExpr) {
        self.found = true;
    }

    fn visit_mut_ident(&mut self, n: &mut Ident) {
        self.found |= &*n.sym == "arguments";
    }

    fn visit_mut_var_decl(&mut self, n: &mut VarDecl) {
        if n.kind == VarDeclKind::Var {
            self.found = true;
            return;
        }
        n.visit_mut_children_with(self);
    }

    fn visit_mut_fn_decl(&mut self, _: &mut FnDecl) {
        self.found = true;
    }

    fn visit_mut_function(&mut self, _: &mut Function) {}

    fn visit_mut_class(&mut self, _: &mut Class) {}
}

/// Whether a function body can serve as dead code elsewhere.
pub fn is_candidate(block: &mut BlockStmt) -> bool {
    if block.stmts.is_empty() {
        return false;
    }

    let mut finder = HazardFinder::default();
    block.visit_mut_with(&mut finder);
    !finder.found
}

/// Whether the statements of a block can move into an `if` branch.
fn is_host(block: &BlockStmt) -> bool {
    !block.stmts.is_empty()
        && prologue_len(&block.stmts) == 0
        && !block.stmts.iter().any(|stmt| matches!(stmt, Stmt::Decl(Decl::Fn(_))))
}

/// Whether code inside `body` is strict, given the strictness around it.
fn is_strict_body(strict: bool, body: Option<&BlockStmt>) -> bool {
    strict || body.map_or(false, |body| has_use_strict(&body.stmts))
}

/// Whether a program starts in strict mode.
fn is_strict_program(program: &Program) -> bool {
    match program {
        Program::Module(_) => true,
        Program::Script(script) => has_use_strict(&script.body)
    }
}

/// A function body that can be copied, with the strictness it was written in.
/// Sloppy-mode code like `with` must not land in a strict function.
#[derive(Debug, Clone)]
struct Candidate {
    body: BlockStmt,
    strict: bool
}

/// Collects copies of the function bodies that can be injected.
struct CandidateCollector<'a> {
    guard: &'a Guard,
    strict: bool,
    candidates: Vec<Candidate>
}

impl<'a> CandidateCollector<'a> {
    fn with_strictness<N: VisitMutWith<Self>>(&mut self, strict: bool, node: &mut N) {
        let old_strict = std::mem::replace(&mut self.strict, strict);
        node.visit_mut_children_with(self);
        self.strict = old_strict;
    }
}

impl<'a> VisitMut for CandidateCollector<'a> {
    fn visit_mut_function(&mut self, n: &mut Function) {
        let strict = is_strict_body(self.strict, n.body.as_ref());
        if let Some(body) = &n.body {
            if !self.guard.is_guarded(body.span) {
                let mut candidate = body.clone();
                if is_candidate(&mut candidate) {
                    self.candidates.push(Candidate { body: candidate, strict });
                }
            }
        }

        self.with_strictness(strict, n);
    }

    fn visit_mut_arrow_expr(&mut self, n: &mut ArrowExpr) {
        let strict = match &*n.body {
            BlockStmtOrExpr::BlockStmt(body) => is_strict_body(self.strict, Some(body)),
            BlockStmtOrExpr::Expr(_) => self.strict
        };
        self.with_strictness(strict, n);
    }

    fn visit_mut_getter_prop(&mut self, n: &mut GetterProp) {
        let strict = is_strict_body(self.strict, n.body.as_ref());
        self.with_strictness(strict, n);
    }

    fn visit_mut_setter_prop(&mut self, n: &mut SetterProp) {
        let strict = is_strict_body(self.strict, n.body.as_ref());
        self.with_strictness(strict, n);
    }

    fn visit_mut_class(&mut self, n: &mut Class) {
        self.with_strictness(true, n);
    }
}

fn random_word(rng: &mut StdRng) -> String {
    (0..5).map(|_| char::from(rng.sample(Alphanumeric))).collect()
}

fn str_lit(value: String) -> Box<Expr> {
    Box::new(Expr::Lit(Lit::Str(Str {
        span: DUMMY_SP,
        value: value.into(),
        raw: None
    })))
}

/// Wraps blocks inside functions with an opaque condition:
///
/// ```js
/// function foo() {
///     return bar();
/// }
/// ```
///
/// becomes
///
/// ```js
/// function foo() {
///     if ('xKzqv' !== 'Pd3fa') {
///         return bar();
///     } else {
///         console.log(baz);
///     }
/// }
/// ```
///
/// where the dead branch is a copy of another function body.
pub struct Visitor<'a, 'b> {
    ctx: &'a mut Context<'b>,
    candidates: Vec<Candidate>,

    /// Indices of the candidates written in strict mode.
    strict_candidates: Vec<usize>,

    /// Depth of enclosing functions, reset inside static blocks.
    functions: usize,

    /// Whether the code being visited is strict.
    strict: bool,

    /// The number of wrapped blocks.
    pub injected: usize
}

impl<'a, 'b> Visitor<'a, 'b> {
    fn new(ctx: &'a mut Context<'b>, candidates: Vec<Candidate>, strict: bool) -> Self {
        let strict_candidates = candidates.iter()
            .enumerate()
            .filter(|(_, candidate)| candidate.strict)
            .map(|(i, _)| i)
            .collect();

        Self {
            ctx,
            candidates,
            strict_candidates,
            functions: 0,
            strict,
            injected: 0
        }
    }

    fn in_function<N: VisitMutWith<Self>>(&mut self, strict: bool, node: &mut N) {
        let old_strict = std::mem::replace(&mut self.strict, strict);
        self.functions += 1;
        node.visit_mut_children_with(self);
        self.functions -= 1;
        self.strict = old_strict;
    }

    /// Picks a dead branch that is valid in the current strictness.
    fn pick(&mut self) -> Option<BlockStmt> {
        let index = match self.strict {
            true => {
                if self.strict_candidates.is_empty() {
                    return None;
                }
                self.strict_candidates[self.ctx.rng.gen_range(0..self.strict_candidates.len())]
            },
            false => self.ctx.rng.gen_range(0..self.candidates.len())
        };

        Some(self.candidates[index].body.clone())
    }

    /// `'a' === 'a'`, `'a' !== 'b'`, ... along with its value.
    fn condition(&mut self) -> (Box<Expr>, bool) {
        let left = random_word(&mut self.ctx.rng);
        let equal = self.ctx.rng.gen_bool(0.5);
        let right = match equal {
            true => left.clone(),
            false => {
                let mut right = random_word(&mut self.ctx.rng);
                while right == left {
                    right = random_word(&mut self.ctx.rng);
                }
                right
            }
        };
        let (op, value) = match self.ctx.rng.gen_bool(0.5) {
            true => (BinaryOp::EqEqEq, equal),
            false => (BinaryOp::NotEqEq, !equal)
        };

        let test = Box::new(Expr::Bin(BinExpr {
            span: DUMMY_SP,
            op,
            left: str_lit(left),
            right: str_lit(right)
        }));
        (test, value)
    }
}

impl<'a, 'b> VisitMut for Visitor<'a, 'b> {
    fn visit_mut_function(&mut self, n: &mut Function) {
        let strict = is_strict_body(self.strict, n.body.as_ref());
        self.in_function(strict, n);
    }

    fn visit_mut_arrow_expr(&mut self, n: &mut ArrowExpr) {
        let strict = match &*n.body {
            BlockStmtOrExpr::BlockStmt(body) => is_strict_body(self.strict, Some(body)),
            BlockStmtOrExpr::Expr(_) => self.strict
        };
        self.in_function(strict, n);
    }

    fn visit_mut_getter_prop(&mut self, n: &mut GetterProp) {
        let strict = is_strict_body(self.strict, n.body.as_ref());
        self.in_function(strict, n);
    }

    fn visit_mut_setter_prop(&mut self, n: &mut SetterProp) {
        let strict = is_strict_body(self.strict, n.body.as_ref());
        self.in_function(strict, n);
    }

    fn visit_mut_constructor(&mut self, n: &mut Constructor) {
        self.in_function(true, n);
    }

    fn visit_mut_class(&mut self, n: &mut Class) {
        let old_strict = std::mem::replace(&mut self.strict, true);
        n.visit_mut_children_with(self);
        self.strict = old_strict;
    }

    fn visit_mut_static_block(&mut self, n: &mut StaticBlock) {
        // `return` is not allowed here
        let functions = std::mem::take(&mut self.functions);
        n.visit_mut_children_with(self);
        self.functions = functions;
    }

    fn visit_mut_block_stmt(&mut self, block: &mut BlockStmt) {
        block.visit_mut_children_with(self);

        if self.functions == 0
            || self.candidates.is_empty()
            || !is_host(block)
            || self.ctx.guard.is_guarded(block.span)
            || block.stmts.iter().any(|stmt| self.ctx.guard.is_guarded(stmt.span())) {
            return;
        }
        if !self.ctx.rng.gen_bool(self.ctx.options.dead_code_injection_threshold) {
            return;
        }

        let dead = match self.pick() {
            Some(v) => v,
            None => return
        };
        let live = BlockStmt {
            span: DUMMY_SP,
            stmts: std::mem::take(&mut block.stmts)
        };
        let (test, value) = self.condition();
        let (cons, alt) = match value {
            true => (live, dead),
            false => (dead, live)
        };

        block.stmts.push(Stmt::If(IfStmt {
            span: DUMMY_SP,
            test,
            cons: Box::new(Stmt::Block(cons)),
            alt: Some(Box::new(Stmt::Block(alt)))
        }));
        self.injected += 1;
    }
}

/// Injects dead branches into the program.
pub fn inject(program: &mut Program, ctx: &mut Context) {
    let strict = is_strict_program(program);
    let mut collector = CandidateCollector {
        guard: &ctx.guard,
        strict,
        candidates: Vec::new()
    };
    program.visit_mut_with(&mut collector);
    let candidates = collector.candidates;
    let collected = candidates.len();

    let mut visitor = Visitor::new(ctx, candidates, strict);
    program.visit_mut_with(&mut visitor);

    debug!(candidates = collected, injected = visitor.injected, "injected dead code");
}

use std::collections::HashSet;
use rand::Rng;
use rand::seq::SliceRandom;
use swc_core::common::{DUMMY_SP, Spanned};
use swc_core::ecma::ast::{ArrowExpr, BlockStmt, BreakStmt, Class, ContinueStmt, Decl, DoWhileStmt, Expr, ForInStmt, ForOfStmt, ForStmt, Function, LabeledStmt, Lit, Program, Stmt, Str, SwitchCase, SwitchStmt, VarDeclKind, WhileStmt};
use swc_core::ecma::atoms::JsWord;
use swc_core::ecma::visit::{VisitMut, VisitMutWith};
use tracing::{debug, warn};
use crate::{ObfuscateError, StructuralError};
use crate::obfuscate::{Context, prologue_len, template};

/// Blocks with this many statements or fewer are left alone.
pub const MINIMUM_STATEMENTS: usize = 4;

/// Whether `stmts` can be flattened without changing behavior.
///
/// `in_function_body` allows function declarations, which are hoisted
/// ahead of the dispatcher.
pub fn can_flatten(stmts: &mut [Stmt], in_function_body: bool) -> bool {
    if prologue_len(stmts) > 0 {
        return false;
    }

    let declarations_allowed = stmts.iter().all(|stmt| match stmt {
        Stmt::Decl(Decl::Var(var)) => var.kind == VarDeclKind::Var,
        Stmt::Decl(Decl::Fn(_)) => in_function_body,
        Stmt::Decl(_) => false,
        _ => true
    });
    if !declarations_allowed {
        return false;
    }

    let mut finder = EscapingJumpFinder::default();
    for stmt in stmts {
        stmt.visit_mut_with(&mut finder);
        if finder.found {
            return false;
        }
    }

    true
}

/// Rewrites `stmts` into a `while`/`switch` dispatcher:
///
/// ```js
/// var _0x1 = '2|0|1'['split']('|'), _0x2 = 0;
/// while (!![]) {
///     switch (_0x1[_0x2++]) {
///         case '0': b(); continue;
///         case '1': c(); continue;
///         case '2': a(); continue;
///     }
///     break;
/// }
/// ```
///
/// Cases are emitted in a shuffled order, the state string lists their keys
/// in the original statement order.
pub fn flatten(stmts: Vec<Stmt>, ctx: &mut Context) -> Result<Vec<Stmt>, ObfuscateError> {
    let (functions, body): (Vec<Stmt>, Vec<Stmt>) = stmts
        .into_iter()
        .partition(|stmt| matches!(stmt, Stmt::Decl(Decl::Fn(_))));

    let mut order: Vec<usize> = (0..body.len()).collect();
    order.shuffle(&mut ctx.rng);

    // keys[i] is the case key of the i-th original statement
    let mut keys = vec![0; body.len()];
    for (position, index) in order.iter().enumerate() {
        keys[*index] = position;
    }
    let state: Vec<String> = keys.iter().map(|key| key.to_string()).collect();

    let states = ctx.names.fresh()?;
    let counter = ctx.names.fresh()?;
    let mut dispatcher = template::parse_stmts(format!(
        "var {states} = '{state}'['split']('|'), {counter} = 0; while (!![]) {{ switch ({states}[{counter}++]) {{}} break; }}",
        states = states,
        counter = counter,
        state = state.join("|")
    ))?;

    let mut body: Vec<Option<Stmt>> = body.into_iter().map(Some).collect();
    let mut cases = Vec::with_capacity(body.len());
    for (position, index) in order.iter().enumerate() {
        let stmt = body[*index].take()
            .ok_or_else(|| StructuralError::Template(String::from("statement dispatched twice")))?;
        cases.push(SwitchCase {
            span: DUMMY_SP,
            test: Some(Box::new(Expr::Lit(Lit::Str(Str {
                span: DUMMY_SP,
                value: position.to_string().into(),
                raw: None
            })))),
            cons: vec![stmt, Stmt::Continue(ContinueStmt { span: DUMMY_SP, label: None })]
        });
    }

    let mut filler = CaseFiller { cases: Some(cases) };
    dispatcher.visit_mut_with(&mut filler);
    if filler.cases.is_some() {
        return Err(StructuralError::Template(String::from("dispatcher has no switch statement")).into());
    }

    let mut flattened = functions;
    flattened.append(&mut dispatcher);
    Ok(flattened)
}

/// Puts the cases into the first `switch` statement.
struct CaseFiller {
    cases: Option<Vec<SwitchCase>>
}

impl VisitMut for CaseFiller {
    fn visit_mut_switch_stmt(&mut self, switch: &mut SwitchStmt) {
        if let Some(cases) = self.cases.take() {
            switch.cases = cases;
        }
    }
}

/// Finds `break` and `continue` statements that jump out of the visited statement.
/// Doesn't descend into functions and classes.
#[derive(Default)]
struct EscapingJumpFinder {
    /// Depth of enclosing loops.
    loops: usize,

    /// Depth of enclosing loops and switches.
    breakables: usize,

    /// Labels declared inside the visited statement.
    labels: HashSet<JsWord>,

    found: bool
}

impl EscapingJumpFinder {
    fn visit_loop<N: VisitMutWith<Self>>(&mut self, node: &mut N) {
        self.loops += 1;
        self.breakables += 1;
        node.visit_mut_children_with(self);
        self.loops -= 1;
        self.breakables -= 1;
    }
}

impl VisitMut for EscapingJumpFinder {
    fn visit_mut_break_stmt(&mut self, n: &mut BreakStmt) {
        self.found |= match &n.label {
            Some(label) => !self.labels.contains(&label.sym),
            None => self.breakables == 0
        };
    }

    fn visit_mut_continue_stmt(&mut self, n: &mut ContinueStmt) {
        self.found |= match &n.label {
            Some(label) => !self.labels.contains(&label.sym),
            None => self.loops == 0
        };
    }

    fn visit_mut_labeled_stmt(&mut self, n: &mut LabeledStmt) {
        let added = self.labels.insert(n.label.sym.clone());
        n.body.visit_mut_with(self);
        if added {
            self.labels.remove(&n.label.sym);
        }
    }

    fn visit_mut_switch_stmt(&mut self, n: &mut SwitchStmt) {
        self.breakables += 1;
        n.visit_mut_children_with(self);
        self.breakables -= 1;
    }

    fn visit_mut_for_stmt(&mut self, n: &mut ForStmt) {
        self.visit_loop(n);
    }

    fn visit_mut_for_in_stmt(&mut self, n: &mut ForInStmt) {
        self.visit_loop(n);
    }

    fn visit_mut_for_of_stmt(&mut self, n: &mut ForOfStmt) {
        self.visit_loop(n);
    }

    fn visit_mut_while_stmt(&mut self, n: &mut WhileStmt) {
        self.visit_loop(n);
    }

    fn visit_mut_do_while_stmt(&mut self, n: &mut DoWhileStmt) {
        self.visit_loop(n);
    }

    fn visit_mut_function(&mut self, _: &mut Function) {}

    fn visit_mut_arrow_expr(&mut self, _: &mut ArrowExpr) {}

    fn visit_mut_class(&mut self, _: &mut Class) {}
}

/// Flattens eligible blocks, innermost first.
pub struct Visitor<'a, 'b> {
    ctx: &'a mut Context<'b>,

    /// Set when the next block is a function body.
    function_body_next: bool,

    /// The number of flattened blocks.
    pub flattened: usize,

    /// The first error that is not local to a block, which stops the pass.
    pub error: Option<ObfuscateError>
}

impl<'a, 'b> Visitor<'a, 'b> {
    pub fn new(ctx: &'a mut Context<'b>) -> Self {
        Self {
            ctx,
            function_body_next: false,
            flattened: 0,
            error: None
        }
    }
}

impl<'a, 'b> VisitMut for Visitor<'a, 'b> {
    fn visit_mut_function(&mut self, n: &mut Function) {
        n.params.visit_mut_with(self);

        self.function_body_next = true;
        n.body.visit_mut_with(self);
        self.function_body_next = false;
    }

    fn visit_mut_arrow_expr(&mut self, n: &mut ArrowExpr) {
        n.params.visit_mut_with(self);

        self.function_body_next = n.body.is_block_stmt();
        n.body.visit_mut_with(self);
        self.function_body_next = false;
    }

    fn visit_mut_block_stmt(&mut self, block: &mut BlockStmt) {
        let in_function_body = std::mem::take(&mut self.function_body_next);
        block.visit_mut_children_with(self);

        if self.error.is_some()
            || block.stmts.len() <= MINIMUM_STATEMENTS
            || self.ctx.guard.is_guarded(block.span)
            || block.stmts.iter().any(|stmt| self.ctx.guard.is_guarded(stmt.span()))
            || !can_flatten(&mut block.stmts, in_function_body) {
            return;
        }
        if !self.ctx.rng.gen_bool(self.ctx.options.control_flow_flattening_threshold) {
            return;
        }

        let stmts = std::mem::take(&mut block.stmts);
        match flatten(stmts.clone(), self.ctx) {
            Ok(flattened) => {
                block.stmts = flattened;
                self.flattened += 1;
            },
            Err(ObfuscateError::Structural(e)) => {
                warn!(error = %e, "failed to flatten block, skipping it");
                block.stmts = stmts;
            },
            Err(e) => {
                block.stmts = stmts;
                self.error = Some(e);
            }
        }
    }
}

/// Runs control-flow flattening over the program.
pub fn flatten_program(program: &mut Program, ctx: &mut Context) -> Result<(), ObfuscateError> {
    let mut visitor = Visitor::new(ctx);
    program.visit_mut_with(&mut visitor);
    debug!(flattened = visitor.flattened, "flattened control flow");

    match visitor.error {
        Some(e) => Err(e),
        None => Ok(())
    }
}

use std::collections::{HashMap, HashSet};
use rand::Rng;
use rand::rngs::StdRng;
use swc_core::common::DUMMY_SP;
use swc_core::ecma::ast::{CallExpr, Callee, Expr, ExprOrSpread, Ident, Lit, ModuleItem, Number, Program, Stmt};
use swc_core::ecma::atoms::JsWord;
use swc_core::ecma::visit::{VisitMut, VisitMutWith};
use tracing::debug;
use crate::ObfuscateError;
use crate::obfuscate::guard::Guard;
use crate::obfuscate::{Context, module_prologue_len, prologue_len, string_value, template};
use encoding::Encoding;
use rotation::Rotation;
use runtime::Runtime;

pub mod encoding;
pub mod rotation;
pub mod runtime;

/// Append-only pool of string values.
/// An index never changes once assigned, and equal values share one index.
#[derive(Debug, Default)]
pub struct StringArrayPool {
    values: Vec<String>,
    indices: HashMap<String, usize>
}

impl StringArrayPool {
    /// Adds `value` if it's not pooled yet and returns its index.
    pub fn insert(&mut self, value: &str) -> usize {
        if let Some(index) = self.indices.get(value) {
            return *index;
        }

        let index = self.values.len();
        self.values.push(value.to_string());
        self.indices.insert(value.to_string(), index);

        index
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Values in index order.
    pub fn values(&self) -> &[String] {
        &self.values
    }
}

/// The pooled strings of one run along with the names of the runtime helpers.
#[derive(Debug)]
pub struct StringArray {
    pub pool: StringArrayPool,

    /// The function that returns the array.
    pub array_fn: JsWord,

    /// The function call sites use in place of a literal.
    pub accessor: JsWord,

    /// Added to every index at call sites, subtracted by the accessor.
    pub shift: usize
}

/// Replaces string literals with calls to the accessor.
///
/// Example:
/// ```js
/// console.log("hello");
/// ```
///
/// is replaced with:
///
/// ```js
/// console.log(_0x2d8f(0x1f4));
/// ```
pub struct Visitor<'a> {
    array: &'a mut StringArray,
    rng: &'a mut StdRng,
    guard: &'a Guard,
    reserved: HashSet<&'a str>,
    threshold: f64,

    /// The number of replaced literals.
    pub replaced: usize
}

impl<'a> Visitor<'a> {
    pub fn new(
        array: &'a mut StringArray,
        rng: &'a mut StdRng,
        guard: &'a Guard,
        reserved_strings: &'a [String],
        threshold: f64
    ) -> Self {
        Self {
            array,
            rng,
            guard,
            reserved: reserved_strings.iter().map(String::as_str).collect(),
            threshold,
            replaced: 0
        }
    }

    /// `accessor(index + shift)`
    fn accessor_call(&self, index: usize) -> Expr {
        Expr::Call(CallExpr {
            span: DUMMY_SP,
            callee: Callee::Expr(Box::new(Expr::Ident(Ident::new(self.array.accessor.clone(), DUMMY_SP)))),
            args: vec![ExprOrSpread {
                spread: None,
                expr: Box::new(Expr::Lit(Lit::Num(Number {
                    span: DUMMY_SP,
                    value: (index + self.array.shift) as f64,
                    raw: None
                })))
            }],
            type_args: None
        })
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
        if !self.rng.gen_bool(self.threshold) {
            return;
        }

        let index = self.array.pool.insert(&value);
        *expr = self.accessor_call(index);
        self.replaced += 1;
    }
}

/// Moves eligible string literals into the pool and rewrites their call sites.
/// Returns `None` when the pass is off or nothing was pooled.
pub fn collect(program: &mut Program, ctx: &mut Context) -> Result<Option<StringArray>, ObfuscateError> {
    if !ctx.options.string_array {
        return Ok(None);
    }

    let array_fn = ctx.names.fresh()?;
    let accessor = ctx.names.fresh()?;
    let shift = match ctx.options.string_array_index_shift {
        true => ctx.rng.gen_range(0x100..0x1000),
        false => 0
    };
    let mut array = StringArray {
        pool: StringArrayPool::default(),
        array_fn,
        accessor,
        shift
    };

    let mut visitor = Visitor::new(
        &mut array,
        &mut ctx.rng,
        &ctx.guard,
        &ctx.options.reserved_strings,
        ctx.options.string_array_threshold
    );
    program.visit_mut_with(&mut visitor);
    let replaced = visitor.replaced;

    debug!(replaced, pooled = array.pool.len(), "collected string array");
    if array.pool.is_empty() {
        return Ok(None);
    }

    Ok(Some(array))
}

/// Encodes and rotates the pool, then inserts the runtime block
/// after the directive prologue.
pub fn materialize(program: &mut Program, mut array: StringArray, ctx: &mut Context) -> Result<(), ObfuscateError> {
    let encoding = Encoding::from_options(ctx.options, &mut ctx.rng);
    let rotation = match ctx.options.rotate_string_array {
        true => Some(Rotation::plan(&mut array.pool, &mut ctx.rng)?),
        false => None
    };

    let emitted = match &rotation {
        Some(rotation) => rotation.apply(array.pool.values()),
        None => array.pool.values().to_vec()
    };
    let entries = emitted.iter()
        .map(|value| encoding.encode(value))
        .collect::<Result<Vec<String>, _>>()?;

    let code = runtime::render(&Runtime {
        array_fn: &array.array_fn,
        accessor: &array.accessor,
        shift: array.shift,
        encoding: &encoding,
        rotation: rotation.as_ref()
    }, &entries, &mut ctx.names)?;
    let stmts = template::parse_stmts(code)?;

    debug!(
        entries = entries.len(),
        rotation = rotation.as_ref().map(|r| r.count),
        "materialized string array"
    );

    match program {
        Program::Script(script) => {
            let at = prologue_len(&script.body);
            for (offset, stmt) in stmts.into_iter().enumerate() {
                script.body.insert(at + offset, stmt);
            }
        },
        Program::Module(module) => {
            let at = module_prologue_len(&module.body);
            for (offset, stmt) in stmts.into_iter().enumerate() {
                module.body.insert(at + offset, ModuleItem::Stmt(stmt));
            }
        }
    }

    Ok(())
}

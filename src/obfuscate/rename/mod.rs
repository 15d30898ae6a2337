use swc_core::ecma::ast::{ArrowExpr, BindingIdent, BlockStmt, CallExpr, Callee, CatchClause, ClassDecl, ClassExpr, Constructor, DefaultDecl, ExportDecl, ExportDefaultDecl, ExportSpecifier, Expr, FnDecl, FnExpr, ForInStmt, ForOfStmt, ForStmt, Function, GetterProp, Ident, ImportDecl, ImportSpecifier, KeyValuePatProp, KeyValueProp, ModuleExportName, NamedExport, ObjectPatProp, ParamOrTsParamProp, Pat, Program, Prop, PropName, SetterProp, StaticBlock, SwitchStmt, VarDecl, VarDeclKind, WithStmt};
use swc_core::ecma::atoms::JsWord;
use swc_core::ecma::visit::{VisitMut, VisitMutWith};
use tracing::debug;
use crate::ObfuscateError;
use crate::obfuscate::Context;
use crate::obfuscate::guard::Guard;
use crate::options::ConfigurationError;
use names::NameRegistry;

pub mod names;
pub mod scope;

pub use scope::{Binding, BindingId, BindingKind, Scope, ScopeId, ScopeKind, ScopeTree};

/// Renames every renamable binding of the program.
///
/// Runs three walks over the same tree: one that builds the [ScopeTree],
/// one that resolves every use to its [Binding], and one that rewrites
/// every occurrence of a renamed binding. Names are assigned in between.
pub fn rename_identifiers(program: &mut Program, ctx: &mut Context) -> Result<ScopeTree, ObfuscateError> {
    let root = match program {
        Program::Module(_) => ScopeKind::Module,
        Program::Script(_) => ScopeKind::Global
    };
    let mut tree = ScopeTree::new(root);

    // Generated names must never equal a name written in the source
    program.visit_mut_with(&mut NameCollector { names: &mut ctx.names });

    program.visit_mut_with(&mut Visitor::new(Phase::Declare, &mut tree, &ctx.guard));
    program.visit_mut_with(&mut Visitor::new(Phase::Resolve, &mut tree, &ctx.guard));

    let renamed = assign_names(&mut tree, ctx)?;

    program.visit_mut_with(&mut Visitor::new(Phase::Rewrite, &mut tree, &ctx.guard));

    debug!(scopes = tree.len(), bindings = tree.bindings().count(), renamed, "renamed identifiers");
    Ok(tree)
}

/// Whether a binding may receive a generated name.
fn is_renamable(tree: &ScopeTree, id: BindingId, ctx: &Context) -> bool {
    let binding = tree.binding(id);
    if binding.pinned || &*binding.name == "arguments" || ctx.names.is_reserved(&binding.name) {
        return false;
    }

    match tree.scope(binding.scope).kind {
        ScopeKind::Global => ctx.options.rename_globals,
        ScopeKind::Module => binding.kind == BindingKind::Import || ctx.options.rename_globals,
        _ => true
    }
}

/// Gives each renamable binding the first candidate that is neither taken
/// nor already assigned in its own or an enclosing scope.
/// Scopes are visited parents first, so enclosed scopes see every name above them.
fn assign_names(tree: &mut ScopeTree, ctx: &mut Context) -> Result<usize, ObfuscateError> {
    let order: Vec<(ScopeId, BindingId)> = tree.scopes()
        .flat_map(|(scope_id, scope)| scope.bindings.values().map(move |id| (scope_id, *id)))
        .collect();

    let mut renamed = 0;
    for (scope_id, id) in order {
        if !is_renamable(tree, id, ctx) {
            continue;
        }

        let candidate = ctx.names.generator()
            .sequence()
            .find(|name| !ctx.names.is_taken(name) && !tree.is_assigned_above(scope_id, name))
            .ok_or(ConfigurationError::NameSupplierExhausted)?;
        tree.set_replacement(id, candidate)?;
        renamed += 1;
    }

    // Names synthesized later must not shadow any replacement
    let assigned: Vec<JsWord> = tree.bindings()
        .filter_map(|(_, binding)| binding.replacement().cloned())
        .collect();
    for name in assigned {
        ctx.names.reserve(name);
    }

    Ok(renamed)
}

/// Reserves every identifier name found in the source.
struct NameCollector<'a> {
    names: &'a mut NameRegistry
}

impl<'a> VisitMut for NameCollector<'a> {
    fn visit_mut_ident(&mut self, ident: &mut Ident) {
        self.names.reserve(ident.sym.clone());
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
enum Phase {
    /// Build scopes and declare bindings.
    Declare,

    /// Resolve uses and pin bindings that dynamic code can observe.
    Resolve,

    /// Write replacement names.
    Rewrite
}

/// Walks the program in one of the three [Phase]s.
///
/// Scopes are entered at exactly the same nodes in every phase, so the
/// pre-order counter reproduces the [ScopeId]s created while declaring.
struct Visitor<'a> {
    phase: Phase,
    tree: &'a mut ScopeTree,
    guard: &'a Guard,
    current: ScopeId,
    entered: usize,

    /// Set when the next block is the body of the construct that opened the current scope.
    inline_next_block: bool,

    /// The kind of binding that identifiers in the pattern being visited declare.
    declaring: Option<BindingKind>,

    /// Set while visiting the names declared by an `export` declaration.
    exporting: bool,

    /// Depth of `with` statement bodies.
    with_depth: usize
}

impl<'a> Visitor<'a> {
    fn new(phase: Phase, tree: &'a mut ScopeTree, guard: &'a Guard) -> Self {
        let root = tree.root();
        Self {
            phase,
            tree,
            guard,
            current: root,
            entered: 0,
            inline_next_block: false,
            declaring: None,
            exporting: false,
            with_depth: 0
        }
    }

    /// Enters a new scope and returns the scope to restore with [Visitor::exit].
    fn enter(&mut self, kind: ScopeKind) -> ScopeId {
        let parent = self.current;
        self.entered += 1;
        self.current = match self.phase {
            Phase::Declare => self.tree.push_scope(kind, parent),
            Phase::Resolve | Phase::Rewrite => ScopeId(self.entered)
        };

        parent
    }

    fn exit(&mut self, parent: ScopeId) {
        self.current = parent;
    }

    /// Visits a binding pattern whose identifiers declare bindings of `kind`.
    fn declare_pat(&mut self, pat: &mut Pat, kind: BindingKind) {
        let old_declaring = self.declaring.replace(kind);
        pat.visit_mut_with(self);
        self.declaring = old_declaring;
    }

    /// Handles an identifier that declares a binding.
    fn declaration(&mut self, ident: &mut Ident, kind: BindingKind, pinned: bool) {
        if self.phase != Phase::Declare {
            self.occurrence(ident);
            return;
        }

        let scope = match kind {
            BindingKind::Var => self.tree.var_scope(self.current),
            _ => self.current
        };
        let mut pinned = pinned
            || self.exporting
            || self.with_depth > 0
            || self.guard.is_guarded(ident.span);

        // `catch (e) { var e; }` declares one name the two bindings must share
        if kind == BindingKind::Var {
            if let Some(param) = self.tree.enclosing_catch_param(self.current, &ident.sym) {
                self.tree.binding_mut(param).pinned = true;
                pinned = true;
            }
        }

        self.tree.declare(scope, ident.sym.clone(), kind, pinned);
    }

    /// Handles an identifier that refers to a binding, declarations included.
    /// Returns the binding it resolves to.
    fn occurrence(&mut self, ident: &mut Ident) -> Option<BindingId> {
        let id = self.tree.lookup(self.current, &ident.sym)?;

        match self.phase {
            Phase::Declare => {},
            Phase::Resolve => {
                let in_with = self.with_depth > 0;
                let binding = self.tree.binding_mut(id);
                binding.references.push(ident.span);
                binding.pinned |= in_with;
            },
            Phase::Rewrite => {
                if let Some(replacement) = self.tree.binding(id).replacement() {
                    ident.sym = replacement.clone();
                }
            }
        }

        Some(id)
    }

    /// The replacement of the binding `ident` resolves to, if it was renamed.
    fn replacement_of(&self, ident: &Ident) -> Option<JsWord> {
        let id = self.tree.lookup(self.current, &ident.sym)?;
        self.tree.binding(id).replacement().cloned()
    }

    /// Pins every binding visible from the current scope.
    fn pin_visible(&mut self) {
        let scopes: Vec<ScopeId> = self.tree.ancestors(self.current).collect();
        for scope in scopes {
            self.tree.pin_scope(scope);
        }
    }

    /// Visits the body of a function-like construct inside the current scope.
    fn visit_body(&mut self, body: &mut Option<BlockStmt>) {
        self.inline_next_block = true;
        body.visit_mut_with(self);
        self.inline_next_block = false;
    }
}

impl<'a> VisitMut for Visitor<'a> {
    fn visit_mut_expr(&mut self, expr: &mut Expr) {
        if let Expr::Ident(ident) = expr {
            self.occurrence(ident);
            return;
        }

        // Expressions inside patterns (default values, computed keys) declare nothing
        let old_declaring = self.declaring.take();
        expr.visit_mut_children_with(self);
        self.declaring = old_declaring;
    }

    fn visit_mut_pat(&mut self, pat: &mut Pat) {
        if let Pat::Ident(binding) = pat {
            match self.declaring {
                Some(kind) => self.declaration(&mut binding.id, kind, false),
                None => {
                    self.occurrence(&mut binding.id);
                }
            }
            return;
        }

        pat.visit_mut_children_with(self);
    }

    fn visit_mut_object_pat_prop(&mut self, prop: &mut ObjectPatProp) {
        let assign = match prop {
            ObjectPatProp::Assign(v) => v,
            _ => {
                prop.visit_mut_children_with(self);
                return;
            }
        };

        // `{ a = 1 }` keeps its name, expanding it would need a nested default pattern
        let has_default = assign.value.is_some();
        match (self.phase, self.declaring) {
            (Phase::Declare, Some(kind)) => self.declaration(&mut assign.key, kind, has_default),
            (Phase::Resolve, _) => {
                let id = self.occurrence(&mut assign.key);
                if let (Some(id), true) = (id, has_default) {
                    self.tree.binding_mut(id).pinned = true;
                }
            },
            _ => {}
        }
        assign.value.visit_mut_with(self);

        if self.phase == Phase::Rewrite && !has_default {
            if let Some(replacement) = self.replacement_of(&assign.key) {
                let span = assign.key.span;
                *prop = ObjectPatProp::KeyValue(KeyValuePatProp {
                    key: PropName::Ident(assign.key.clone()),
                    value: Box::new(Pat::Ident(BindingIdent::from(Ident::new(replacement, span))))
                });
            }
        }
    }

    fn visit_mut_prop(&mut self, prop: &mut Prop) {
        let ident = match prop {
            Prop::Shorthand(v) => v,
            _ => {
                prop.visit_mut_children_with(self);
                return;
            }
        };

        if self.phase != Phase::Rewrite {
            self.occurrence(ident);
            return;
        }

        if let Some(replacement) = self.replacement_of(ident) {
            let span = ident.span;
            *prop = Prop::KeyValue(KeyValueProp {
                key: PropName::Ident(ident.clone()),
                value: Box::new(Expr::Ident(Ident::new(replacement, span)))
            });
        }
    }

    fn visit_mut_var_decl(&mut self, var: &mut VarDecl) {
        let kind = match var.kind {
            VarDeclKind::Var => BindingKind::Var,
            VarDeclKind::Let => BindingKind::Let,
            VarDeclKind::Const => BindingKind::Const
        };

        let exporting = std::mem::take(&mut self.exporting);
        for declarator in &mut var.decls {
            self.exporting = exporting;
            self.declare_pat(&mut declarator.name, kind);
            self.exporting = false;

            declarator.init.visit_mut_with(self);
        }
    }

    fn visit_mut_fn_decl(&mut self, n: &mut FnDecl) {
        // Block-level functions also create a `var` binding in sloppy mode,
        // so they keep their names
        let in_block = !self.tree.scope(self.current).kind.is_var_scope();
        self.declaration(&mut n.ident, BindingKind::Function, in_block);
        self.exporting = false;

        n.function.visit_mut_with(self);
    }

    fn visit_mut_fn_expr(&mut self, n: &mut FnExpr) {
        match &mut n.ident {
            Some(ident) => {
                let parent = self.enter(ScopeKind::Block);
                self.declaration(ident, BindingKind::FunctionName, false);
                n.function.visit_mut_with(self);
                self.exit(parent);
            },
            None => n.function.visit_mut_with(self)
        }
    }

    fn visit_mut_class_decl(&mut self, n: &mut ClassDecl) {
        self.declaration(&mut n.ident, BindingKind::Class, false);
        self.exporting = false;

        n.class.visit_mut_with(self);
    }

    fn visit_mut_class_expr(&mut self, n: &mut ClassExpr) {
        match &mut n.ident {
            Some(ident) => {
                let parent = self.enter(ScopeKind::Block);
                self.declaration(ident, BindingKind::ClassName, false);
                n.class.visit_mut_with(self);
                self.exit(parent);
            },
            None => n.class.visit_mut_with(self)
        }
    }

    fn visit_mut_function(&mut self, n: &mut Function) {
        let parent = self.enter(ScopeKind::Function);
        for param in &mut n.params {
            param.decorators.visit_mut_with(self);
            self.declare_pat(&mut param.pat, BindingKind::Param);
        }
        self.visit_body(&mut n.body);
        self.exit(parent);
    }

    fn visit_mut_arrow_expr(&mut self, n: &mut ArrowExpr) {
        let parent = self.enter(ScopeKind::Function);
        for param in &mut n.params {
            self.declare_pat(param, BindingKind::Param);
        }

        self.inline_next_block = n.body.is_block_stmt();
        n.body.visit_mut_with(self);
        self.inline_next_block = false;
        self.exit(parent);
    }

    fn visit_mut_getter_prop(&mut self, n: &mut GetterProp) {
        n.key.visit_mut_with(self);

        let parent = self.enter(ScopeKind::Function);
        self.visit_body(&mut n.body);
        self.exit(parent);
    }

    fn visit_mut_setter_prop(&mut self, n: &mut SetterProp) {
        n.key.visit_mut_with(self);

        let parent = self.enter(ScopeKind::Function);
        self.declare_pat(&mut n.param, BindingKind::Param);
        self.visit_body(&mut n.body);
        self.exit(parent);
    }

    fn visit_mut_constructor(&mut self, n: &mut Constructor) {
        n.key.visit_mut_with(self);

        let parent = self.enter(ScopeKind::Function);
        for param in &mut n.params {
            if let ParamOrTsParamProp::Param(param) = param {
                self.declare_pat(&mut param.pat, BindingKind::Param);
            }
        }
        self.visit_body(&mut n.body);
        self.exit(parent);
    }

    fn visit_mut_static_block(&mut self, n: &mut StaticBlock) {
        let parent = self.enter(ScopeKind::Function);
        self.inline_next_block = true;
        n.body.visit_mut_with(self);
        self.inline_next_block = false;
        self.exit(parent);
    }

    fn visit_mut_block_stmt(&mut self, n: &mut BlockStmt) {
        if std::mem::take(&mut self.inline_next_block) {
            n.visit_mut_children_with(self);
            return;
        }

        let parent = self.enter(ScopeKind::Block);
        n.visit_mut_children_with(self);
        self.exit(parent);
    }

    fn visit_mut_catch_clause(&mut self, n: &mut CatchClause) {
        let parent = self.enter(ScopeKind::Catch);
        if let Some(param) = &mut n.param {
            self.declare_pat(param, BindingKind::CatchParam);
        }

        self.inline_next_block = true;
        n.body.visit_mut_with(self);
        self.inline_next_block = false;
        self.exit(parent);
    }

    fn visit_mut_for_stmt(&mut self, n: &mut ForStmt) {
        let parent = self.enter(ScopeKind::Block);
        n.visit_mut_children_with(self);
        self.exit(parent);
    }

    fn visit_mut_for_in_stmt(&mut self, n: &mut ForInStmt) {
        let parent = self.enter(ScopeKind::Block);
        n.visit_mut_children_with(self);
        self.exit(parent);
    }

    fn visit_mut_for_of_stmt(&mut self, n: &mut ForOfStmt) {
        let parent = self.enter(ScopeKind::Block);
        n.visit_mut_children_with(self);
        self.exit(parent);
    }

    fn visit_mut_switch_stmt(&mut self, n: &mut SwitchStmt) {
        n.discriminant.visit_mut_with(self);

        let parent = self.enter(ScopeKind::Block);
        n.cases.visit_mut_with(self);
        self.exit(parent);
    }

    fn visit_mut_with_stmt(&mut self, n: &mut WithStmt) {
        n.obj.visit_mut_with(self);

        self.with_depth += 1;
        n.body.visit_mut_with(self);
        self.with_depth -= 1;
    }

    fn visit_mut_call_expr(&mut self, n: &mut CallExpr) {
        // A direct call to the global `eval` can observe every visible name
        if self.phase == Phase::Resolve {
            if let Callee::Expr(callee) = &n.callee {
                if let Expr::Ident(ident) = &**callee {
                    if &*ident.sym == "eval" && self.tree.lookup(self.current, &ident.sym).is_none() {
                        self.pin_visible();
                    }
                }
            }
        }

        n.visit_mut_children_with(self);
    }

    fn visit_mut_import_decl(&mut self, n: &mut ImportDecl) {
        for specifier in &mut n.specifiers {
            match specifier {
                ImportSpecifier::Named(named) => {
                    // `import { a }` names the export and the binding at once
                    let pinned = named.imported.is_none();
                    self.declaration(&mut named.local, BindingKind::Import, pinned);
                },
                ImportSpecifier::Default(default) =>
                    self.declaration(&mut default.local, BindingKind::Import, false),
                ImportSpecifier::Namespace(namespace) =>
                    self.declaration(&mut namespace.local, BindingKind::Import, false)
            }
        }
    }

    fn visit_mut_export_decl(&mut self, n: &mut ExportDecl) {
        self.exporting = true;
        n.decl.visit_mut_with(self);
        self.exporting = false;
    }

    fn visit_mut_export_default_decl(&mut self, n: &mut ExportDefaultDecl) {
        // The name of a default exported declaration is a module binding
        match &mut n.decl {
            DefaultDecl::Fn(f) => {
                if let Some(ident) = &mut f.ident {
                    self.declaration(ident, BindingKind::Function, true);
                }
                f.function.visit_mut_with(self);
            },
            DefaultDecl::Class(c) => {
                if let Some(ident) = &mut c.ident {
                    self.declaration(ident, BindingKind::Class, true);
                }
                c.class.visit_mut_with(self);
            },
            _ => {}
        }
    }

    fn visit_mut_named_export(&mut self, n: &mut NamedExport) {
        // Re-exports name bindings of another module
        if n.src.is_some() {
            return;
        }

        for specifier in &mut n.specifiers {
            let named = match specifier {
                ExportSpecifier::Named(v) => v,
                _ => continue
            };
            let orig = match &mut named.orig {
                ModuleExportName::Ident(v) => v,
                _ => continue
            };

            if self.phase != Phase::Rewrite {
                self.occurrence(orig);
                continue;
            }

            if let Some(replacement) = self.replacement_of(orig) {
                if named.exported.is_none() {
                    named.exported = Some(ModuleExportName::Ident(orig.clone()));
                }
                orig.sym = replacement;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::options::{IdentifierNamesGenerator, Options, SourceType};
    use crate::testing::{compact, obfuscate_compact};

    fn options() -> Options {
        Options {
            identifier_names_generator: IdentifierNamesGenerator::Mangled,
            seed: 1,
            ..Options::no_additional_nodes()
        }
    }

    #[test]
    fn test_rename_params_and_locals() {
        let output = obfuscate_compact("function foo(bar) { var baz = bar + 1; return baz; }", &options());

        assert_eq!(output, compact("function foo(a) { var b = a + 1; return b; }"));
    }

    #[test]
    fn test_rename_globals() {
        let output = obfuscate_compact("var foo = 1; function bar() { return foo; }", &Options {
            rename_globals: true,
            ..options()
        });

        assert_eq!(output, compact("var a = 1; function b() { return a; }"));
    }

    #[test]
    fn test_free_globals_untouched() {
        let output = obfuscate_compact("function foo(bar) { console.log(bar); }", &options());

        assert_eq!(output, compact("function foo(a) { console['log'](a); }"));
    }

    #[test]
    fn test_sibling_scopes_reuse_names() {
        let output = obfuscate_compact(
            "function foo(x) { return x; } function bar(y) { return y; }",
            &options()
        );

        assert_eq!(output, compact("function foo(a) { return a; } function bar(a) { return a; }"));
    }

    #[test]
    fn test_shadowing_stays_distinct() {
        let output = obfuscate_compact(
            "function foo(x) { function inner(y) { return x + y; } return inner; }",
            &options()
        );

        assert_eq!(output, compact("function foo(a) { function b(c) { return a + c; } return b; }"));
    }

    #[test]
    fn test_block_scope_let() {
        let output = obfuscate_compact(
            "function foo() { let x = 1; { let x = 2; bar(x); } return x; }",
            &options()
        );

        assert_eq!(output, compact("function foo() { let a = 1; { let b = 2; bar(b); } return a; }"));
    }

    #[test]
    fn test_shorthand_property_expanded() {
        let output = obfuscate_compact("function foo(bar) { return { bar }; }", &options());

        assert_eq!(output, compact("function foo(a) { return { bar: a }; }"));
    }

    #[test]
    fn test_shorthand_pattern_expanded() {
        let output = obfuscate_compact("function foo(obj) { var { bar } = obj; return bar; }", &options());

        assert_eq!(output, compact("function foo(a) { var { bar: b } = a; return b; }"));
    }

    #[test]
    fn test_shorthand_pattern_with_default_pinned() {
        let output = obfuscate_compact("function foo(obj) { var { bar = 1 } = obj; return bar; }", &options());

        assert_eq!(output, compact("function foo(a) { var { bar = 1 } = a; return bar; }"));
    }

    #[test]
    fn test_direct_eval_pins_visible_bindings() {
        let output = obfuscate_compact(
            "function foo(bar) { var baz = 1; return eval('bar + baz'); }",
            &options()
        );

        assert!(output.contains("functionfoo(bar){varbaz=1;"), "{}", output);
    }

    #[test]
    fn test_with_pins_references() {
        let output = obfuscate_compact(
            "function foo(obj, bar) { with (obj) { return bar; } }",
            &options()
        );

        assert_eq!(output, compact("function foo(a, bar) { with (a) { return bar; } }"));
    }

    #[test]
    fn test_named_function_expression() {
        let output = obfuscate_compact(
            "var foo = function bar(n) { return n ? bar(n - 1) : 0; };",
            &options()
        );

        assert_eq!(output, compact("var foo = function a(b) { return b ? a(b - 1) : 0; };"));
    }

    #[test]
    fn test_catch_param() {
        let output = obfuscate_compact(
            "function foo() { try { bar(); } catch (err) { return err; } }",
            &options()
        );

        assert_eq!(output, compact("function foo() { try { bar(); } catch (a) { return a; } }"));
    }

    #[test]
    fn test_var_redeclaring_catch_param() {
        let output = obfuscate_compact(
            "function foo() { try { throw 1; } catch (e) { var e = 2; } return e; }",
            &options()
        );

        assert_eq!(output, compact("function foo() { try { throw 1; } catch (e) { var e = 2; } return e; }"));
    }

    #[test]
    fn test_var_in_nested_block_of_catch() {
        let output = obfuscate_compact(
            "function foo(x) { try { bar(); } catch (e) { if (x) { var e = x; } } return e; }",
            &options()
        );

        assert_eq!(output, compact("function foo(a) { try { bar(); } catch (e) { if (a) { var e = a; } } return e; }"));
    }

    #[test]
    fn test_labels_and_properties_untouched() {
        let output = obfuscate_compact(
            "function foo(x) { outer: for (var i = 0; i < 1; i++) { break outer; } return { x: x }; }",
            &options()
        );

        assert_eq!(output, compact("function foo(a) { outer: for (var b = 0; b < 1; b++) { break outer; } return { x: a }; }"));
    }

    #[test]
    fn test_module_imports_and_exports() {
        let output = obfuscate_compact(
            "import foo from 'foo'; import { bar } from 'bar'; import { baz as qux } from 'baz'; export { foo, qux }; export const keep = 1;",
            &Options {
                source_type: SourceType::Module,
                ..options()
            }
        );

        assert_eq!(output, compact(
            "import a from 'foo'; import { bar } from 'bar'; import { baz as b } from 'baz'; export { a as foo, b as qux }; export const keep = 1;"
        ));
    }

    #[test]
    fn test_prefix() {
        let output = obfuscate_compact("function foo(bar) { return bar; }", &Options {
            identifiers_prefix: String::from("p_"),
            ..options()
        });

        assert_eq!(output, compact("function foo(p_a) { return p_a; }"));
    }

    #[test]
    fn test_reserved_names() {
        let output = obfuscate_compact("function foo(bar, baz) { return bar + baz; }", &Options {
            reserved_names: vec![String::from("bar")],
            ..options()
        });

        assert_eq!(output, compact("function foo(bar, a) { return bar + a; }"));
    }

    #[test]
    fn test_generated_names_avoid_source_names() {
        let output = obfuscate_compact("function foo(bar) { return a + bar; }", &options());

        assert_eq!(output, compact("function foo(b) { return a + b; }"));
    }

    #[test]
    fn test_dictionary_exhaustion() {
        let result = crate::obfuscate("function foo(a, b, c) { return a + b + c; }", &Options {
            identifier_names_generator: IdentifierNamesGenerator::Dictionary,
            identifiers_dictionary: vec![String::from("x"), String::from("y")],
            ..options()
        });

        assert!(matches!(
            result,
            Err(crate::ObfuscateError::Configuration(crate::options::ConfigurationError::NameSupplierExhausted))
        ));
    }
}

use indexmap::IndexMap;
use swc_core::common::Span;
use swc_core::ecma::atoms::JsWord;
use crate::StructuralError;

/// Index of a [Scope] in its [ScopeTree].
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct ScopeId(pub usize);

/// Index of a [Binding] in its [ScopeTree].
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct BindingId(pub usize);

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ScopeKind {
    Global,
    Module,
    Function,
    Block,
    Catch
}

impl ScopeKind {
    /// Whether `var` declarations hoist to this scope.
    pub fn is_var_scope(self) -> bool {
        matches!(self, Self::Global | Self::Module | Self::Function)
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum BindingKind {
    Var,
    Let,
    Const,
    Function,
    Class,
    Param,
    CatchParam,
    Import,
    /// The name of a named function expression, visible only inside it.
    FunctionName,
    /// The name of a named class expression, visible only inside it.
    ClassName
}

/// A lexical region.
#[derive(Debug)]
pub struct Scope {
    pub kind: ScopeKind,
    pub parent: Option<ScopeId>,
    pub children: Vec<ScopeId>,
    pub bindings: IndexMap<JsWord, BindingId>
}

/// One declared identifier.
#[derive(Debug)]
pub struct Binding {
    pub name: JsWord,
    pub kind: BindingKind,
    pub scope: ScopeId,

    /// Assigned at most once.
    replacement: Option<JsWord>,

    /// Every position that names this binding, declarations included.
    pub references: Vec<Span>,

    /// The binding must keep its original name.
    pub pinned: bool
}

impl Binding {
    pub fn replacement(&self) -> Option<&JsWord> {
        self.replacement.as_ref()
    }
}

/// Arena of scopes and bindings for one program.
/// Scopes are stored in pre-order, so a parent always precedes its children.
#[derive(Debug)]
pub struct ScopeTree {
    scopes: Vec<Scope>,
    bindings: Vec<Binding>
}

impl ScopeTree {
    /// Creates a tree holding only the root scope.
    pub fn new(root: ScopeKind) -> Self {
        Self {
            scopes: vec![Scope {
                kind: root,
                parent: None,
                children: Vec::new(),
                bindings: IndexMap::new()
            }],
            bindings: Vec::new()
        }
    }

    pub fn root(&self) -> ScopeId {
        ScopeId(0)
    }

    pub fn scope(&self, id: ScopeId) -> &Scope {
        &self.scopes[id.0]
    }

    pub fn scopes(&self) -> impl Iterator<Item = (ScopeId, &Scope)> {
        self.scopes.iter().enumerate().map(|(i, scope)| (ScopeId(i), scope))
    }

    pub fn binding(&self, id: BindingId) -> &Binding {
        &self.bindings[id.0]
    }

    pub fn binding_mut(&mut self, id: BindingId) -> &mut Binding {
        &mut self.bindings[id.0]
    }

    pub fn bindings(&self) -> impl Iterator<Item = (BindingId, &Binding)> {
        self.bindings.iter().enumerate().map(|(i, binding)| (BindingId(i), binding))
    }

    pub fn len(&self) -> usize {
        self.scopes.len()
    }

    /// Adds a child scope to `parent`.
    pub fn push_scope(&mut self, kind: ScopeKind, parent: ScopeId) -> ScopeId {
        let id = ScopeId(self.scopes.len());
        self.scopes.push(Scope {
            kind,
            parent: Some(parent),
            children: Vec::new(),
            bindings: IndexMap::new()
        });
        self.scopes[parent.0].children.push(id);

        id
    }

    /// Declares `name` in `scope`. Redeclarations in the same scope share one binding,
    /// and a pinned redeclaration pins the binding.
    pub fn declare(&mut self, scope: ScopeId, name: JsWord, kind: BindingKind, pinned: bool) -> BindingId {
        if let Some(id) = self.scopes[scope.0].bindings.get(&name) {
            let id = *id;
            self.bindings[id.0].pinned |= pinned;
            return id;
        }

        let id = BindingId(self.bindings.len());
        self.bindings.push(Binding {
            name: name.clone(),
            kind,
            scope,
            replacement: None,
            references: Vec::new(),
            pinned
        });
        self.scopes[scope.0].bindings.insert(name, id);

        id
    }

    /// Iterates from `scope` up to the root.
    pub fn ancestors(&self, scope: ScopeId) -> impl Iterator<Item = ScopeId> + '_ {
        std::iter::successors(Some(scope), |id| self.scopes[id.0].parent)
    }

    /// The nearest scope that receives `var` declarations made in `scope`.
    pub fn var_scope(&self, scope: ScopeId) -> ScopeId {
        self.ancestors(scope)
            .find(|id| self.scopes[id.0].kind.is_var_scope())
            .unwrap_or(self.root())
    }

    /// A catch parameter named `name` between `scope` and its `var` scope.
    /// A `var` of the same name inside the catch body assigns to that parameter.
    pub fn enclosing_catch_param(&self, scope: ScopeId, name: &JsWord) -> Option<BindingId> {
        self.ancestors(scope)
            .take_while(|id| !self.scopes[id.0].kind.is_var_scope())
            .filter(|id| self.scopes[id.0].kind == ScopeKind::Catch)
            .find_map(|id| self.scopes[id.0].bindings.get(name).copied())
            .filter(|id| self.bindings[id.0].kind == BindingKind::CatchParam)
    }

    /// Resolves `name` used in `scope` to the nearest binding.
    /// `None` means the name refers to an undeclared global.
    pub fn lookup(&self, scope: ScopeId, name: &JsWord) -> Option<BindingId> {
        self.ancestors(scope)
            .find_map(|id| self.scopes[id.0].bindings.get(name).copied())
    }

    /// Pins every binding declared in `scope`.
    pub fn pin_scope(&mut self, scope: ScopeId) {
        let ids: Vec<BindingId> = self.scopes[scope.0].bindings.values().copied().collect();
        for id in ids {
            self.bindings[id.0].pinned = true;
        }
    }

    /// Records the replacement name of a binding. A binding is renamed at most once.
    pub fn set_replacement(&mut self, id: BindingId, name: JsWord) -> Result<(), StructuralError> {
        let binding = &mut self.bindings[id.0];
        if binding.replacement.is_some() {
            return Err(StructuralError::ReplacementAlreadySet(binding.name.to_string()));
        }
        binding.replacement = Some(name);

        Ok(())
    }

    /// Whether `name` is already the replacement of a binding in `scope` or above it.
    pub fn is_assigned_above(&self, scope: ScopeId, name: &JsWord) -> bool {
        self.ancestors(scope).any(|id| {
            self.scopes[id.0].bindings
                .values()
                .any(|binding| self.bindings[binding.0].replacement.as_ref() == Some(name))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_shadowing() {
        let mut tree = ScopeTree::new(ScopeKind::Global);
        let function = tree.push_scope(ScopeKind::Function, tree.root());
        let block = tree.push_scope(ScopeKind::Block, function);

        let outer = tree.declare(tree.root(), JsWord::from("a"), BindingKind::Var, false);
        let inner = tree.declare(function, JsWord::from("a"), BindingKind::Param, false);

        assert_eq!(tree.lookup(block, &JsWord::from("a")), Some(inner));
        assert_eq!(tree.lookup(tree.root(), &JsWord::from("a")), Some(outer));
        assert_eq!(tree.lookup(block, &JsWord::from("b")), None);
    }

    #[test]
    fn test_var_scope() {
        let mut tree = ScopeTree::new(ScopeKind::Module);
        let function = tree.push_scope(ScopeKind::Function, tree.root());
        let block = tree.push_scope(ScopeKind::Block, function);
        let catch = tree.push_scope(ScopeKind::Catch, block);

        assert_eq!(tree.var_scope(catch), function);
        assert_eq!(tree.var_scope(tree.root()), tree.root());
        assert_eq!(tree.scope(function).children, vec![block]);
    }

    #[test]
    fn test_enclosing_catch_param() {
        let mut tree = ScopeTree::new(ScopeKind::Global);
        let function = tree.push_scope(ScopeKind::Function, tree.root());
        let catch = tree.push_scope(ScopeKind::Catch, function);
        let block = tree.push_scope(ScopeKind::Block, catch);
        let param = tree.declare(catch, JsWord::from("e"), BindingKind::CatchParam, false);

        assert_eq!(tree.enclosing_catch_param(block, &JsWord::from("e")), Some(param));
        assert_eq!(tree.enclosing_catch_param(block, &JsWord::from("f")), None);
        assert_eq!(tree.enclosing_catch_param(function, &JsWord::from("e")), None);

        // A nested function starts a new `var` scope
        let inner = tree.push_scope(ScopeKind::Function, block);
        assert_eq!(tree.enclosing_catch_param(inner, &JsWord::from("e")), None);
    }

    #[test]
    fn test_redeclaration_shares_binding() {
        let mut tree = ScopeTree::new(ScopeKind::Global);
        let first = tree.declare(tree.root(), JsWord::from("a"), BindingKind::Var, false);
        let second = tree.declare(tree.root(), JsWord::from("a"), BindingKind::Var, true);

        assert_eq!(first, second);
        assert!(tree.binding(first).pinned);
    }

    #[test]
    fn test_replacement_set_once() {
        let mut tree = ScopeTree::new(ScopeKind::Global);
        let id = tree.declare(tree.root(), JsWord::from("a"), BindingKind::Let, false);

        assert!(tree.set_replacement(id, JsWord::from("b")).is_ok());
        assert!(tree.set_replacement(id, JsWord::from("c")).is_err());
        assert_eq!(tree.binding(id).replacement(), Some(&JsWord::from("b")));
    }

    #[test]
    fn test_is_assigned_above() {
        let mut tree = ScopeTree::new(ScopeKind::Global);
        let left = tree.push_scope(ScopeKind::Function, tree.root());
        let right = tree.push_scope(ScopeKind::Function, tree.root());
        let id = tree.declare(left, JsWord::from("a"), BindingKind::Param, false);
        tree.set_replacement(id, JsWord::from("x")).unwrap();

        let nested = tree.push_scope(ScopeKind::Block, left);
        assert!(tree.is_assigned_above(nested, &JsWord::from("x")));
        assert!(!tree.is_assigned_above(right, &JsWord::from("x")));
    }
}

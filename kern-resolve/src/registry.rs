use std::{collections::BTreeMap, rc::Rc};

use kern_node::{AnalysisError, FunctionNode, Ty};
use kern_utils::{idx_map_key, IndexMap, SymbolId, SymbolInterner};
use miette::Diagnostic;
use thiserror::Error;

idx_map_key!(
    /// The ID of a function node in the registry's arena.
    NodeId
);

/// Conventional name of the entry point when a trace doesn't name one.
pub const KERNEL_ENTRY: &str = "kernel";

#[derive(Debug, Error, Diagnostic)]
pub enum RegistryError {
    #[error("`{0}` is not supported on the base registry; register through a backend")]
    UnsupportedOperation(&'static str),
    #[error(transparent)]
    Analysis(#[from] AnalysisError),
}

/// A function declaration handed to a [`DeclareFunction`] backend for
/// conversion into a node.
#[derive(Clone, Copy, Debug)]
pub struct FunctionDecl<'a> {
    pub name:        &'a str,
    pub body:        &'a str,
    pub param_types: &'a [Ty],
    pub return_type: Ty,
}

/// Conversion from a raw declaration into a registered node.
///
/// The base [`NodeRegistry`] has no notion of how a callable body becomes a
/// node; invoking [`DeclareFunction::declare`] on it reports
/// [`RegistryError::UnsupportedOperation`]. Backend specializations own the
/// conversion and delegate to [`NodeRegistry::register`].
pub trait DeclareFunction {
    fn declare(
        &mut self,
        decl: FunctionDecl<'_>,
    ) -> Result<NodeId, RegistryError>;
}

struct NodeEntry {
    node:   Box<dyn FunctionNode>,
    /// The node that most recently triggered this node's trace. Diagnostic
    /// metadata only; inclusion in the closure never depends on it.
    parent: Option<NodeId>,
}

/// Owned collection of function nodes, keyed by name, plus the designated
/// root kernel.
///
/// Names are unique: registering a second node under an existing name
/// silently repoints the name to the newer node. Nodes are never removed
/// individually; the whole registry is dropped after code generation.
#[derive(Default)]
pub struct NodeRegistry {
    nodes:       IndexMap<NodeId, NodeEntry>,
    by_name:     BTreeMap<SymbolId, NodeId>,
    root_kernel: Option<NodeId>,
    interner:    SymbolInterner,
}

impl NodeRegistry {
    pub fn new() -> Self {
        Default::default()
    }

    /// Insert `node` under its own declared name, replacing any previous
    /// node registered under that name. If the node claims to be the root
    /// kernel, the registry's root reference moves to it unconditionally.
    pub fn register(
        &mut self,
        node: impl FunctionNode + 'static,
    ) -> NodeId {
        let name = self.interner.insert(Rc::from(node.function_name()));
        let is_root = node.is_root_kernel();
        let id = self.nodes.insert(NodeEntry {
            node:   Box::new(node),
            parent: None,
        });
        self.by_name.insert(name, id);
        if is_root {
            self.root_kernel = Some(id);
        }
        id
    }

    /// Pure lookup by name. `None` means "unknown function" -- a legitimate
    /// terminal case (e.g. a built-in the registry doesn't model), never an
    /// error.
    pub fn lookup(
        &self,
        name: &str,
    ) -> Option<NodeId> {
        let sym = self.interner.get_id(name)?;
        self.by_name.get(&sym).copied()
    }

    pub fn get(
        &self,
        id: NodeId,
    ) -> &dyn FunctionNode {
        &*self.nodes.get(id).node
    }

    /// The caller recorded for `id` by the most recent trace, if any.
    /// A function called from several sites keeps only the last caller
    /// observed; the entry point keeps `None`.
    pub fn parent(
        &self,
        id: NodeId,
    ) -> Option<NodeId> {
        self.nodes.get(id).parent
    }

    /// The node that most recently registered with the root-kernel flag.
    pub fn root_kernel(&self) -> Option<NodeId> {
        self.root_kernel
    }

    /// Number of distinct names currently registered.
    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }

    /// Trace from the conventional entry point, [`KERNEL_ENTRY`].
    pub fn trace_kernel(&mut self) -> Result<Vec<Rc<str>>, AnalysisError> {
        self.trace(KERNEL_ENTRY)
    }

    /// Depth-first walk of the call graph from `entry`, returning the
    /// deduplicated closure of reachable function names in preorder: the
    /// entry first, then each callee's whole closure before the next
    /// sibling call. A name already in the closure is never re-expanded,
    /// which terminates direct and mutual recursion of any cycle length.
    /// An entry or callee the registry doesn't know is skipped, not an
    /// error.
    ///
    /// Analysis is forced lazily, mid-walk, so functions never reached from
    /// `entry` are never analyzed. An analyzer failure aborts the whole
    /// trace; no partial closure is returned.
    pub fn trace(
        &mut self,
        entry: &str,
    ) -> Result<Vec<Rc<str>>, AnalysisError> {
        let entry = self.interner.insert(Rc::from(entry));
        let mut visited = Vec::new();
        self.trace_calls(entry, &mut visited, None)?;
        Ok(visited.into_iter().map(|sym| self.interner.get(sym)).collect())
    }

    fn trace_calls(
        &mut self,
        name: SymbolId,
        visited: &mut Vec<SymbolId>,
        caller: Option<NodeId>,
    ) -> Result<(), AnalysisError> {
        let Some(&id) = self.by_name.get(&name) else {
            return Ok(());
        };
        if visited.contains(&name) {
            return Ok(());
        }
        visited.push(name);

        let entry = self.nodes.get_mut(id);
        entry.parent = caller;
        entry.node.ensure_analyzed()?;
        let callees = entry.node.called_functions().to_vec();
        for callee in callees {
            let callee = self.interner.insert(Rc::from(callee));
            self.trace_calls(callee, visited, Some(id))?;
        }
        Ok(())
    }
}

impl DeclareFunction for NodeRegistry {
    fn declare(
        &mut self,
        _decl: FunctionDecl<'_>,
    ) -> Result<NodeId, RegistryError> {
        Err(RegistryError::UnsupportedOperation("declare"))
    }
}

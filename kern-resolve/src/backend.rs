use kern_node::SourceNode;

use crate::{DeclareFunction, FunctionDecl, NodeId, NodeRegistry, RegistryError};

/// The reference declare backend: converts a declaration into a
/// [`SourceNode`] over the raw body text and registers it. Emitter-specific
/// backends follow the same shape with their own node types.
#[derive(Default)]
pub struct SourceBackend {
    registry: NodeRegistry,
}

impl SourceBackend {
    pub fn new() -> Self {
        Default::default()
    }

    /// Declare `decl` and mark it as the program's root kernel.
    pub fn add_kernel(
        &mut self,
        decl: FunctionDecl<'_>,
    ) -> NodeId {
        let node = SourceNode::new(decl.name, decl.body)
            .with_types(decl.param_types.to_vec(), decl.return_type)
            .root_kernel();
        self.registry.register(node)
    }

    pub fn registry(&self) -> &NodeRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut NodeRegistry {
        &mut self.registry
    }

    pub fn into_registry(self) -> NodeRegistry {
        self.registry
    }
}

impl DeclareFunction for SourceBackend {
    fn declare(
        &mut self,
        decl: FunctionDecl<'_>,
    ) -> Result<NodeId, RegistryError> {
        let node = SourceNode::new(decl.name, decl.body).with_types(decl.param_types.to_vec(), decl.return_type);
        Ok(self.registry.register(node))
    }
}

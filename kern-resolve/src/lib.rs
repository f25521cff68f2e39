//! Function dependency resolution for kern.
//!
//! Given a registry of named function nodes and an entry point, this crate
//! computes the deduplicated preorder closure of every function the entry
//! transitively calls, so that the emitter declares exactly the functions a
//! program uses. The walk is robust to direct and mutual recursion, treats
//! unknown names as built-ins rather than errors, and forces each node's
//! analysis lazily so unreached functions are never analyzed.

mod backend;
mod polyfill;
mod registry;
#[cfg(test)]
mod tests;

pub use backend::SourceBackend;
pub use kern_node::{AnalysisError, FunctionNode, SourceNode, Ty};
pub use polyfill::{install_polyfills, Polyfill, POLYFILLS};
pub use registry::{DeclareFunction, FunctionDecl, NodeId, NodeRegistry, RegistryError, KERNEL_ENTRY};

//! The function-node abstraction consumed by the dependency resolver.
//!
//! A function node carries a name, a root-kernel flag, and a lazily
//! discovered list of the function names its body calls. The registry owns
//! nodes as trait objects; concrete analyzers live behind [`FunctionNode`],
//! with [`SourceNode`] as the reference implementation over raw source text.

pub use source::SourceNode;

use miette::Diagnostic;
use thiserror::Error;

pub mod scan;
mod source;

/// Raised by a node's analyzer during [`FunctionNode::ensure_analyzed`].
/// The resolver does not catch these; they abort the whole trace.
#[derive(Debug, Error, Diagnostic, Clone, PartialEq, Eq)]
pub enum AnalysisError {
    #[error("function `{0}` has an empty body")]
    EmptyBody(String),
}

/// Scalar types carried on function declarations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Ty {
    /// Assumed for parameters and returns when a declaration doesn't say.
    #[default]
    Float,
    Int,
    Bool,
    Unit,
}

impl std::fmt::Display for Ty {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        match self {
            Ty::Float => write!(f, "float"),
            Ty::Int => write!(f, "int"),
            Ty::Bool => write!(f, "bool"),
            Ty::Unit => write!(f, "unit"),
        }
    }
}

pub trait FunctionNode {
    /// The name this node is filed under in the registry.
    fn function_name(&self) -> &str;

    /// Whether this node is the program's designated entry point.
    fn is_root_kernel(&self) -> bool {
        false
    }

    /// Force analysis of the function body so that
    /// [`Self::called_functions`] is populated. Idempotent: the first call
    /// does the work, later calls must be free.
    fn ensure_analyzed(&mut self) -> Result<(), AnalysisError>;

    /// The names this function calls, in source order. Duplicates,
    /// self-references, and names no registry tracks are all legitimate
    /// entries. Empty until [`Self::ensure_analyzed`] has succeeded.
    fn called_functions(&self) -> &[String];
}

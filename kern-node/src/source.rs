use crate::{scan, AnalysisError, FunctionNode, Ty};

/// Reference [`FunctionNode`] backed by raw kernel source text.
///
/// Analysis is a call-site scan of the body, memoized on first demand:
/// `calls` stays `None` until [`FunctionNode::ensure_analyzed`] succeeds,
/// and later demands are free.
#[derive(Debug, Clone)]
pub struct SourceNode {
    name:           String,
    body:           String,
    param_types:    Vec<Ty>,
    return_type:    Ty,
    is_root_kernel: bool,
    calls:          Option<Vec<String>>,
}

impl SourceNode {
    pub fn new(
        name: impl Into<String>,
        body: impl Into<String>,
    ) -> Self {
        Self {
            name:           name.into(),
            body:           body.into(),
            param_types:    Vec::new(),
            return_type:    Ty::default(),
            is_root_kernel: false,
            calls:          None,
        }
    }

    /// Parameter and return types for this declaration. Everything is float
    /// unless declared otherwise.
    pub fn with_types(
        mut self,
        param_types: Vec<Ty>,
        return_type: Ty,
    ) -> Self {
        self.param_types = param_types;
        self.return_type = return_type;
        self
    }

    /// Mark this node as the program's designated entry point.
    pub fn root_kernel(mut self) -> Self {
        self.is_root_kernel = true;
        self
    }

    pub fn body(&self) -> &str {
        &self.body
    }

    pub fn param_types(&self) -> &[Ty] {
        &self.param_types
    }

    pub fn return_type(&self) -> Ty {
        self.return_type
    }
}

impl FunctionNode for SourceNode {
    fn function_name(&self) -> &str {
        &self.name
    }

    fn is_root_kernel(&self) -> bool {
        self.is_root_kernel
    }

    fn ensure_analyzed(&mut self) -> Result<(), AnalysisError> {
        if self.calls.is_some() {
            return Ok(());
        }
        if self.body.trim().is_empty() {
            return Err(AnalysisError::EmptyBody(self.name.clone()));
        }
        self.calls = Some(scan::call_sites(&self.body));
        Ok(())
    }

    fn called_functions(&self) -> &[String] {
        self.calls.as_deref().unwrap_or(&[])
    }
}

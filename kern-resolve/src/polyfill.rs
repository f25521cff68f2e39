//! Standard-library replacements for target environments that lack certain
//! built-ins.

use kern_node::Ty;

use crate::{DeclareFunction, FunctionDecl, RegistryError};

/// A synthetic standard-library function: its conventional name and a pure
/// restatement of its body in primitives every target guarantees.
#[derive(Clone, Copy, Debug)]
pub struct Polyfill {
    pub name:        &'static str,
    pub body:        &'static str,
    pub param_types: &'static [Ty],
    pub return_type: Ty,
}

/// The full polyfill catalogue. Extending it is adding one more entry.
pub const POLYFILLS: &[Polyfill] = &[
    Polyfill {
        name:        "round",
        body:        "return floor(a + 0.5);",
        param_types: &[Ty::Float],
        return_type: Ty::Float,
    },
    Polyfill {
        name:        "fract",
        body:        "return a - floor(a);",
        param_types: &[Ty::Float],
        return_type: Ty::Float,
    },
    Polyfill {
        name:        "clamp",
        body:        "return min(max(x, lo), hi);",
        param_types: &[Ty::Float, Ty::Float, Ty::Float],
        return_type: Ty::Float,
    },
];

/// Declare every catalogue entry through `backend`, so user code that calls
/// a missing built-in finds a real body in the registry when traced. Safe
/// to run more than once: re-declaring overwrites a polyfill with an
/// identical definition.
pub fn install_polyfills<B: DeclareFunction>(backend: &mut B) -> Result<(), RegistryError> {
    for polyfill in POLYFILLS {
        backend.declare(FunctionDecl {
            name:        polyfill.name,
            body:        polyfill.body,
            param_types: polyfill.param_types,
            return_type: polyfill.return_type,
        })?;
    }
    Ok(())
}

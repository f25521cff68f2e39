//! Turning on the "debug" feature for this crate will use an inefficient
//! global lock to store interned function names and render their IDs as
//! readable strings. For production uses, these IDs are turned into usizes.

pub use common_types::*;
pub use index_map::IndexMap;

mod common_types;
mod index_map;

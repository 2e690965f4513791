//! Per-layer panel stacks for panelnav.
//!
//! This crate provides the structural half of navigation:
//! - `LayerStack` - ordered members of one layer, tail is the top
//! - `LayerSet` - all layer stacks plus the panel → layer membership index

pub mod layer_set;
pub mod layer_stack;

pub use layer_set::LayerSet;
pub use layer_stack::{LayerStack, StackEntry};

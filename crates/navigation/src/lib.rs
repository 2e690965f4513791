//! Layered panel navigation for panelnav.
//!
//! `NavigationController` turns open/close requests into registry loads,
//! controller bindings and layer stack updates:
//!
//! ```text
//! open(id, kind) → load (may suspend) → bind controller → reconcile stack
//!                → attach + draw order → show → controller
//! ```
//!
//! Stacking modes:
//! - Overlay: placed on top, hides nothing
//! - Push: hides the topmost Push/Replace member, which returns on close
//! - Replace: pops a Replace member below it, otherwise acts like Push
//!
//! Hook and controller callbacks run after the step's bookkeeping, with no
//! registry or stack borrow held.

mod effect;
mod navigator;
mod pass;

pub use navigator::NavigationController;

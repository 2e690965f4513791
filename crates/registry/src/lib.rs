//! Panel registry and control bindings for panelnav.
//!
//! This crate provides:
//! - `PanelInstance` - loaded panel with its visual object and lifecycle
//! - `ControlBinding` - the single controller attached to an instance
//! - `PanelRegistry` - identity → instance map, owns load/unload
//! - `SharedRegistry` - single-threaded shared handle with the suspending load path
//!
//! # Load protocol
//!
//! ```text
//! begin_load(id) → LoadTicket ──(loader awaits)──→ complete_load(ticket, visual)
//!                                                      ↓
//!                                    re-check map: insert, or discard duplicate
//! ```

pub mod binding;
pub mod instance;
pub mod registry;
pub mod shared;

pub use binding::{BindAction, BindOutcome, ControlBinding};
pub use instance::PanelInstance;
pub use registry::{LoadCompletion, LoadOutcome, LoadTicket, PanelRegistry, UnloadedPanel};
pub use shared::SharedRegistry;

//! Core types and traits for panelnav panels.
//!
//! This crate provides the foundational abstractions shared by the registry,
//! the layer stacks and the navigation controller:
//! - `PanelId`, `StackMode`, `LifecycleState` and the static `DeclarationTable`
//! - `VisualObject`, `AssetLoader` and `TransitionHook` collaborator traits
//! - `Controller` and the `ControllerCatalog` of controller factories
//! - `NavError`, the error taxonomy of the navigation core

pub mod controller;
pub mod error;
pub mod panel;
pub mod visual;

pub use controller::{
    with_controller, Controller, ControllerCatalog, ControllerFactory, ControllerKind,
    ControllerRef,
};
pub use error::{NavError, Result};
pub use panel::{DeclarationTable, LayerId, LifecycleState, PanelDeclaration, PanelId, StackMode};
pub use visual::{AssetLoader, TransitionHook, UiRoot, VisualObject};

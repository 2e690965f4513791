//! Collaborator traits consumed by the navigation core.
//!
//! The core never renders. It drives visual objects through three
//! operations (attach, draw order, active flag), obtains them from an
//! `AssetLoader`, and notifies an optional `TransitionHook` after its own
//! bookkeeping is complete.

use async_trait::async_trait;

use crate::panel::{PanelDeclaration, PanelId};

/// Owning root that panels are attached under (one per UI root).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct UiRoot {
    name: String,
}

impl UiRoot {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

/// Visual object produced by the asset loader for a panel.
pub trait VisualObject {
    /// Parent the object under the owning root.
    fn attach_under(&mut self, root: &UiRoot);

    /// Set draw order within the panel's layer (higher draws above).
    fn set_draw_order(&mut self, order: u32);

    /// Activate or deactivate the object.
    fn set_active(&mut self, active: bool);

    /// Release the object. Called on unload and when a duplicate
    /// in-flight load result is discarded.
    fn destroy(&mut self) {}
}

/// External asset loader.
///
/// The loader does not need to deduplicate concurrent requests for the same
/// identity; the registry does that.
#[async_trait(?Send)]
pub trait AssetLoader {
    /// Load synchronously. `None` means the asset is unavailable.
    fn load(&self, declaration: &PanelDeclaration) -> Option<Box<dyn VisualObject>>;

    /// Load without blocking. Defaults to the synchronous path.
    async fn load_async(&self, declaration: &PanelDeclaration) -> Option<Box<dyn VisualObject>> {
        self.load(declaration)
    }
}

/// Enter/exit notification, fire-and-forget relative to stack bookkeeping.
pub trait TransitionHook {
    /// Panel became visible.
    fn on_enter(&self, id: &PanelId) {
        let _ = id;
    }

    /// Panel was hidden.
    fn on_exit(&self, id: &PanelId) {
        let _ = id;
    }
}

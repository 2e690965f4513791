//! Controller binding of a panel instance.

use panelnav_core::{ControllerCatalog, ControllerKind, ControllerRef, PanelId, Result};
use panelnav_logger as logger;

/// What `ControlBinding::ensure` did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindAction {
    /// No controller was attached; a new one was created.
    Attached,
    /// A controller of another kind was detached and a new one created.
    Replaced,
    /// The attached controller already had the requested kind.
    Reused,
}

/// Result of `ControlBinding::ensure`.
///
/// Lifecycle callbacks (`on_bind`, `on_destroy`) are left to the caller so
/// they run outside any registry borrow.
pub struct BindOutcome {
    pub controller: ControllerRef,
    pub action: BindAction,
    /// Controller detached by a kind swap.
    pub released: Option<ControllerRef>,
}

/// At most one controller attached to a panel, plus its refresh flag.
#[derive(Default)]
pub struct ControlBinding {
    attached: Option<(ControllerKind, ControllerRef)>,
    dirty: bool,
}

impl ControlBinding {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ensure a controller of `kind` is attached and mark it for refresh.
    ///
    /// A failed factory lookup leaves the current controller in place.
    pub fn ensure(
        &mut self,
        kind: &ControllerKind,
        catalog: &ControllerCatalog,
        panel: &PanelId,
    ) -> Result<BindOutcome> {
        if let Some((current, controller)) = &self.attached {
            if current == kind {
                let controller = controller.clone();
                self.mark_dirty();
                return Ok(BindOutcome {
                    controller,
                    action: BindAction::Reused,
                    released: None,
                });
            }
        }

        let controller = catalog.create(kind, panel)?;
        let released = self
            .attached
            .replace((kind.clone(), controller.clone()))
            .map(|(old_kind, old)| {
                logger::debug(format!(
                    "Panel '{}': controller '{}' replaced by '{}'",
                    panel, old_kind, kind
                ));
                old
            });
        self.mark_dirty();

        let action = if released.is_some() {
            BindAction::Replaced
        } else {
            BindAction::Attached
        };
        Ok(BindOutcome {
            controller,
            action,
            released,
        })
    }

    pub fn controller(&self) -> Option<&ControllerRef> {
        self.attached.as_ref().map(|(_, c)| c)
    }

    pub fn kind(&self) -> Option<&ControllerKind> {
        self.attached.as_ref().map(|(k, _)| k)
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Request an `on_refresh` on the next tick. No-op when unbound.
    pub fn mark_dirty(&mut self) {
        if self.attached.is_some() {
            self.dirty = true;
        }
    }

    /// Consume the refresh flag, returning the controller to refresh.
    pub fn take_dirty(&mut self) -> Option<ControllerRef> {
        if !self.dirty {
            return None;
        }
        self.dirty = false;
        self.controller().cloned()
    }

    /// Detach the controller.
    pub fn release(&mut self) -> Option<ControllerRef> {
        self.dirty = false;
        self.attached.take().map(|(_, c)| c)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use panelnav_core::{Controller, NavError};
    use std::any::Any;
    use std::rc::Rc;

    const LIST: ControllerKind = ControllerKind::new("list");
    const GRID: ControllerKind = ControllerKind::new("grid");

    struct Plain(ControllerKind);

    impl Controller for Plain {
        fn kind(&self) -> ControllerKind {
            self.0.clone()
        }
        fn as_any(&self) -> &dyn Any {
            self
        }
        fn as_any_mut(&mut self) -> &mut dyn Any {
            self
        }
    }

    fn catalog() -> ControllerCatalog {
        let mut catalog = ControllerCatalog::new();
        catalog.register_fn(LIST, |_| Rc::new(std::cell::RefCell::new(Plain(LIST))));
        catalog.register_fn(GRID, |_| Rc::new(std::cell::RefCell::new(Plain(GRID))));
        catalog
    }

    #[test]
    fn test_first_ensure_attaches() {
        let mut binding = ControlBinding::new();
        let outcome = binding
            .ensure(&LIST, &catalog(), &PanelId::new("Inventory"))
            .unwrap();
        assert_eq!(outcome.action, BindAction::Attached);
        assert!(outcome.released.is_none());
        assert_eq!(binding.kind(), Some(&LIST));
        assert!(binding.is_dirty());
    }

    #[test]
    fn test_same_kind_is_reused_and_marked_dirty() {
        let catalog = catalog();
        let panel = PanelId::new("Inventory");
        let mut binding = ControlBinding::new();
        let first = binding.ensure(&LIST, &catalog, &panel).unwrap().controller;
        assert!(binding.take_dirty().is_some());
        assert!(!binding.is_dirty());

        let second = binding.ensure(&LIST, &catalog, &panel).unwrap();
        assert_eq!(second.action, BindAction::Reused);
        assert!(Rc::ptr_eq(&first, &second.controller));
        assert!(binding.is_dirty());
    }

    #[test]
    fn test_other_kind_replaces() {
        let catalog = catalog();
        let panel = PanelId::new("Inventory");
        let mut binding = ControlBinding::new();
        let first = binding.ensure(&LIST, &catalog, &panel).unwrap().controller;

        let outcome = binding.ensure(&GRID, &catalog, &panel).unwrap();
        assert_eq!(outcome.action, BindAction::Replaced);
        assert!(Rc::ptr_eq(&first, outcome.released.as_ref().unwrap()));
        assert_eq!(binding.kind(), Some(&GRID));
    }

    #[test]
    fn test_unknown_kind_keeps_current() {
        let catalog = catalog();
        let panel = PanelId::new("Inventory");
        let mut binding = ControlBinding::new();
        binding.ensure(&LIST, &catalog, &panel).unwrap();

        let err = binding
            .ensure(&ControllerKind::new("missing"), &catalog, &panel)
            .err()
            .unwrap();
        assert!(matches!(err, NavError::UnknownControllerKind { .. }));
        assert_eq!(binding.kind(), Some(&LIST));
    }

    #[test]
    fn test_release_clears_everything() {
        let mut binding = ControlBinding::new();
        binding
            .ensure(&LIST, &catalog(), &PanelId::new("Inventory"))
            .unwrap();
        assert!(binding.release().is_some());
        assert!(binding.controller().is_none());
        assert!(binding.take_dirty().is_none());
        binding.mark_dirty();
        assert!(!binding.is_dirty());
    }
}

//! Controllers bound to panel instances and the catalog that creates them.
//!
//! Controller kinds are explicit keys resolved through `ControllerCatalog`
//! rather than runtime type comparisons. Typed access to a bound controller
//! goes through `with_controller`, which downcasts via `Controller::as_any_mut`.

use std::any::Any;
use std::borrow::Cow;
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use crate::panel::PanelId;
use crate::{NavError, Result};

/// Key naming a controller type (the presentation contract of a panel).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ControllerKind(Cow<'static, str>);

impl ControllerKind {
    /// Kind from a static name, usable in `const` items.
    pub const fn new(name: &'static str) -> Self {
        Self(Cow::Borrowed(name))
    }

    /// Kind from a runtime name (e.g. read from configuration).
    pub fn owned(name: impl Into<String>) -> Self {
        Self(Cow::Owned(name.into()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ControllerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Typed controller attached to a panel instance.
pub trait Controller: Any {
    /// Kind this controller was created for.
    fn kind(&self) -> ControllerKind;

    /// Called once after the controller is attached to a panel.
    fn on_bind(&mut self, panel: &PanelId) {
        let _ = panel;
    }

    /// Refresh pass, run on the tick after the controller was marked dirty.
    fn on_refresh(&mut self) {}

    /// Called when the controller is detached (kind swap or unload).
    fn on_destroy(&mut self) {}

    /// Downcast to concrete type (immutable).
    fn as_any(&self) -> &dyn Any;

    /// Downcast to concrete type (mutable).
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

/// Shared handle to a bound controller.
pub type ControllerRef = Rc<RefCell<dyn Controller>>;

/// Run `f` against the controller if it is a `T`.
pub fn with_controller<T: Controller, R>(
    controller: &ControllerRef,
    f: impl FnOnce(&mut T) -> R,
) -> Option<R> {
    let mut guard = controller.borrow_mut();
    guard.as_any_mut().downcast_mut::<T>().map(f)
}

/// Produces controllers of one kind.
pub trait ControllerFactory {
    fn create(&self, panel: &PanelId) -> ControllerRef;
}

impl<F> ControllerFactory for F
where
    F: Fn(&PanelId) -> ControllerRef,
{
    fn create(&self, panel: &PanelId) -> ControllerRef {
        self(panel)
    }
}

/// Explicit map from controller kind to factory.
#[derive(Default)]
pub struct ControllerCatalog {
    factories: HashMap<ControllerKind, Box<dyn ControllerFactory>>,
}

impl ControllerCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a factory, replacing any previous one for `kind`.
    pub fn register(&mut self, kind: ControllerKind, factory: impl ControllerFactory + 'static) {
        self.factories.insert(kind, Box::new(factory));
    }

    /// Register a closure factory.
    pub fn register_fn(
        &mut self,
        kind: ControllerKind,
        factory: impl Fn(&PanelId) -> ControllerRef + 'static,
    ) {
        self.register(kind, factory);
    }

    /// Register `T::default()` as the factory for `kind`.
    pub fn register_default<T: Controller + Default>(&mut self, kind: ControllerKind) {
        self.register_fn(kind, |_| Rc::new(RefCell::new(T::default())));
    }

    /// Builder-style `register_default`.
    pub fn with_default<T: Controller + Default>(mut self, kind: ControllerKind) -> Self {
        self.register_default::<T>(kind);
        self
    }

    /// Create a controller of `kind` for `panel`.
    pub fn create(&self, kind: &ControllerKind, panel: &PanelId) -> Result<ControllerRef> {
        let factory = self
            .factories
            .get(kind)
            .ok_or_else(|| NavError::UnknownControllerKind {
                kind: kind.to_string(),
            })?;
        let controller = factory.create(panel);
        debug_assert_eq!(
            &controller.borrow().kind(),
            kind,
            "factory produced a controller of another kind"
        );
        Ok(controller)
    }

    pub fn contains(&self, kind: &ControllerKind) -> bool {
        self.factories.contains_key(kind)
    }

    pub fn kinds(&self) -> impl Iterator<Item = &ControllerKind> {
        self.factories.keys()
    }

    pub fn len(&self) -> usize {
        self.factories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const COUNTER: ControllerKind = ControllerKind::new("counter");

    #[derive(Default)]
    struct Counter {
        bound_to: Option<PanelId>,
        refreshes: usize,
    }

    impl Controller for Counter {
        fn kind(&self) -> ControllerKind {
            COUNTER
        }

        fn on_bind(&mut self, panel: &PanelId) {
            self.bound_to = Some(panel.clone());
        }

        fn on_refresh(&mut self) {
            self.refreshes += 1;
        }

        fn as_any(&self) -> &dyn Any {
            self
        }

        fn as_any_mut(&mut self) -> &mut dyn Any {
            self
        }
    }

    #[test]
    fn test_kind_static_and_owned_compare_equal() {
        assert_eq!(ControllerKind::new("counter"), ControllerKind::owned("counter"));
        assert_eq!(COUNTER.to_string(), "counter");
    }

    #[test]
    fn test_catalog_creates_registered_kind() {
        let catalog = ControllerCatalog::new().with_default::<Counter>(COUNTER);
        let panel = PanelId::new("Inventory");
        let controller = catalog.create(&COUNTER, &panel).unwrap();
        controller.borrow_mut().on_bind(&panel);

        let bound = with_controller::<Counter, _>(&controller, |c| c.bound_to.clone());
        assert_eq!(bound, Some(Some(panel)));
    }

    #[test]
    fn test_catalog_unknown_kind_is_error() {
        let catalog = ControllerCatalog::new();
        let err = catalog
            .create(&ControllerKind::new("nope"), &PanelId::new("X"))
            .err()
            .unwrap();
        assert_eq!(
            err,
            NavError::UnknownControllerKind {
                kind: "nope".to_string()
            }
        );
    }

    #[test]
    fn test_with_controller_wrong_type_is_none() {
        struct Other;
        impl Controller for Other {
            fn kind(&self) -> ControllerKind {
                ControllerKind::new("other")
            }
            fn as_any(&self) -> &dyn Any {
                self
            }
            fn as_any_mut(&mut self) -> &mut dyn Any {
                self
            }
        }

        let controller: ControllerRef = Rc::new(RefCell::new(Other));
        assert!(with_controller::<Counter, _>(&controller, |c| c.refreshes).is_none());
    }

    #[test]
    fn test_register_fn_closure() {
        let mut catalog = ControllerCatalog::new();
        catalog.register_fn(COUNTER, |_| Rc::new(RefCell::new(Counter::default())));
        assert!(catalog.contains(&COUNTER));
        assert_eq!(catalog.len(), 1);
    }
}

//! Tracing backend: visuals, loader, hook and controllers that only log.

use std::any::Any;
use std::cell::RefCell;
use std::collections::HashSet;
use std::rc::Rc;

use async_trait::async_trait;
use futures::channel::oneshot;
use panelnav_core::{
    AssetLoader, Controller, ControllerCatalog, ControllerKind, ControllerRef, PanelDeclaration,
    PanelId, TransitionHook, UiRoot, VisualObject,
};
use panelnav_logger as logger;

/// Visual object that logs the calls it receives.
pub struct TraceVisual {
    panel: PanelId,
}

impl VisualObject for TraceVisual {
    fn attach_under(&mut self, root: &UiRoot) {
        logger::debug(format!("[{}] attach under '{}'", self.panel, root.name()));
    }

    fn set_draw_order(&mut self, order: u32) {
        logger::debug(format!("[{}] draw order {}", self.panel, order));
    }

    fn set_active(&mut self, active: bool) {
        logger::debug(format!("[{}] active = {}", self.panel, active));
    }

    fn destroy(&mut self) {
        logger::debug(format!("[{}] destroyed", self.panel));
    }
}

/// Loader producing `TraceVisual`s.
///
/// Suspended loads stay pending until `settle` resumes them, so scenarios can
/// interleave other steps with an in-flight load.
#[derive(Default)]
pub struct TraceLoader {
    missing: HashSet<String>,
    pending: RefCell<Vec<oneshot::Sender<()>>>,
}

impl TraceLoader {
    /// Asset paths listed in `missing` are reported unavailable.
    pub fn new(missing: impl IntoIterator<Item = String>) -> Self {
        Self {
            missing: missing.into_iter().collect(),
            pending: RefCell::new(Vec::new()),
        }
    }

    /// Resume every suspended load. Returns how many were resumed.
    pub fn settle(&self) -> usize {
        let pending: Vec<_> = self.pending.borrow_mut().drain(..).collect();
        pending.into_iter().filter_map(|tx| tx.send(()).ok()).count()
    }

    pub fn in_flight(&self) -> usize {
        self.pending.borrow().len()
    }
}

#[async_trait(?Send)]
impl AssetLoader for TraceLoader {
    fn load(&self, declaration: &PanelDeclaration) -> Option<Box<dyn VisualObject>> {
        if self.missing.contains(&declaration.path) {
            return None;
        }
        Some(Box::new(TraceVisual {
            panel: declaration.id.clone(),
        }))
    }

    async fn load_async(&self, declaration: &PanelDeclaration) -> Option<Box<dyn VisualObject>> {
        let (tx, rx) = oneshot::channel();
        self.pending.borrow_mut().push(tx);
        rx.await.ok()?;
        self.load(declaration)
    }
}

/// Hook collecting `enter`/`exit` lines for the step report.
#[derive(Default)]
pub struct TraceHook {
    events: RefCell<Vec<String>>,
}

impl TraceHook {
    pub fn take(&self) -> Vec<String> {
        std::mem::take(&mut *self.events.borrow_mut())
    }
}

impl TransitionHook for TraceHook {
    fn on_enter(&self, id: &PanelId) {
        self.events.borrow_mut().push(format!("+{}", id));
    }

    fn on_exit(&self, id: &PanelId) {
        self.events.borrow_mut().push(format!("-{}", id));
    }
}

/// Controller that logs its lifecycle.
pub struct TraceController {
    kind: ControllerKind,
    panel: Option<PanelId>,
    refreshes: usize,
}

impl TraceController {
    pub fn new(kind: ControllerKind) -> Self {
        Self {
            kind,
            panel: None,
            refreshes: 0,
        }
    }

    pub fn refreshes(&self) -> usize {
        self.refreshes
    }
}

impl Controller for TraceController {
    fn kind(&self) -> ControllerKind {
        self.kind.clone()
    }

    fn on_bind(&mut self, panel: &PanelId) {
        logger::debug(format!("[{}] controller '{}' bound", panel, self.kind));
        self.panel = Some(panel.clone());
    }

    fn on_refresh(&mut self) {
        self.refreshes += 1;
        if let Some(panel) = &self.panel {
            logger::debug(format!(
                "[{}] controller '{}' refresh #{}",
                panel, self.kind, self.refreshes
            ));
        }
    }

    fn on_destroy(&mut self) {
        if let Some(panel) = self.panel.take() {
            logger::debug(format!("[{}] controller '{}' destroyed", panel, self.kind));
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Catalog with a `TraceController` factory for every kind.
pub fn catalog(kinds: impl IntoIterator<Item = ControllerKind>) -> ControllerCatalog {
    let mut catalog = ControllerCatalog::new();
    for kind in kinds {
        let made = kind.clone();
        catalog.register_fn(kind, move |_| -> ControllerRef {
            Rc::new(RefCell::new(TraceController::new(made.clone())))
        });
    }
    catalog
}

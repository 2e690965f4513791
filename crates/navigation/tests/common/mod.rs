//! Recording test doubles shared by the navigation integration tests.

#![allow(dead_code)]

use std::any::Any;
use std::cell::{Cell, RefCell};
use std::rc::Rc;

use async_trait::async_trait;
use futures::channel::oneshot;
use panelnav_core::{
    with_controller, AssetLoader, Controller, ControllerCatalog, ControllerKind, ControllerRef,
    DeclarationTable, LifecycleState, PanelDeclaration, PanelId, StackMode, TransitionHook,
    UiRoot, VisualObject,
};
use panelnav_navigation::NavigationController;
use panelnav_registry::PanelRegistry;

pub const LIST: ControllerKind = ControllerKind::new("list");
pub const GRID: ControllerKind = ControllerKind::new("grid");

pub const ROOT: &str = "ui-root";

/// Shared call log.
pub type Trace = Rc<RefCell<Vec<String>>>;

pub fn id(name: &str) -> PanelId {
    PanelId::new(name)
}

pub fn ids(names: &[&str]) -> Vec<PanelId> {
    names.iter().map(|n| PanelId::new(n)).collect()
}

/// Declared panels. Layer 0 is the main layer, layer 1 the HUD.
pub fn declarations() -> DeclarationTable {
    vec![
        PanelDeclaration::new("Inventory", "ui/inventory", 0, StackMode::Push),
        PanelDeclaration::new("Settings", "ui/settings", 0, StackMode::Push),
        PanelDeclaration::new("Shop", "ui/shop", 0, StackMode::Push),
        PanelDeclaration::new("Dialog", "ui/dialog", 0, StackMode::Replace),
        PanelDeclaration::new("Confirm", "ui/confirm", 0, StackMode::Replace),
        PanelDeclaration::new("Toast", "ui/toast", 0, StackMode::Overlay),
        PanelDeclaration::new("Hud", "ui/hud", 1, StackMode::Overlay),
        PanelDeclaration::new("Map", "ui/map", 1, StackMode::Push),
        PanelDeclaration::new("Broken", "ui/broken", 0, StackMode::Push),
    ]
    .into_iter()
    .collect()
}

/// Visual object that records every call as `<panel>:<call>`.
pub struct RecordingVisual {
    panel: PanelId,
    trace: Trace,
    destroyed: Rc<Cell<usize>>,
}

impl VisualObject for RecordingVisual {
    fn attach_under(&mut self, root: &UiRoot) {
        self.trace
            .borrow_mut()
            .push(format!("{}:attach:{}", self.panel, root.name()));
    }

    fn set_draw_order(&mut self, order: u32) {
        self.trace
            .borrow_mut()
            .push(format!("{}:order:{}", self.panel, order));
    }

    fn set_active(&mut self, active: bool) {
        self.trace
            .borrow_mut()
            .push(format!("{}:active:{}", self.panel, active));
    }

    fn destroy(&mut self) {
        self.destroyed.set(self.destroyed.get() + 1);
        self.trace.borrow_mut().push(format!("{}:destroy", self.panel));
    }
}

/// Loader producing `RecordingVisual`s. `ui/broken` is never available.
///
/// When gated, every `load_async` waits until the test releases it.
pub struct TestLoader {
    pub trace: Trace,
    pub created: Cell<usize>,
    pub destroyed: Rc<Cell<usize>>,
    gated: bool,
    gates: RefCell<Vec<(PanelId, oneshot::Sender<()>)>>,
}

impl TestLoader {
    pub fn new(gated: bool) -> Self {
        Self {
            trace: Rc::new(RefCell::new(Vec::new())),
            created: Cell::new(0),
            destroyed: Rc::new(Cell::new(0)),
            gated,
            gates: RefCell::new(Vec::new()),
        }
    }

    /// Suspended loads, oldest first.
    pub fn waiting(&self) -> Vec<PanelId> {
        self.gates.borrow().iter().map(|(id, _)| id.clone()).collect()
    }

    /// Resume the suspended load at `index`.
    pub fn release_at(&self, index: usize) -> bool {
        let gate = {
            let mut gates = self.gates.borrow_mut();
            if index >= gates.len() {
                return false;
            }
            gates.remove(index)
        };
        gate.1.send(()).is_ok()
    }

    /// Resume the oldest suspended load of `panel`.
    pub fn release(&self, panel: &PanelId) -> bool {
        let index = self.gates.borrow().iter().position(|(id, _)| id == panel);
        index.is_some_and(|i| self.release_at(i))
    }

    pub fn release_all(&self) {
        let gates: Vec<_> = self.gates.borrow_mut().drain(..).collect();
        for (_, gate) in gates {
            let _ = gate.send(());
        }
    }

    /// Visuals alive right now.
    pub fn live_visuals(&self) -> usize {
        self.created.get() - self.destroyed.get()
    }

    pub fn calls_for(&self, panel: &str) -> Vec<String> {
        let prefix = format!("{}:", panel);
        self.trace
            .borrow()
            .iter()
            .filter(|c| c.starts_with(&prefix))
            .cloned()
            .collect()
    }
}

#[async_trait(?Send)]
impl AssetLoader for TestLoader {
    fn load(&self, declaration: &PanelDeclaration) -> Option<Box<dyn VisualObject>> {
        if declaration.path == "ui/broken" {
            return None;
        }
        self.created.set(self.created.get() + 1);
        Some(Box::new(RecordingVisual {
            panel: declaration.id.clone(),
            trace: self.trace.clone(),
            destroyed: self.destroyed.clone(),
        }))
    }

    async fn load_async(&self, declaration: &PanelDeclaration) -> Option<Box<dyn VisualObject>> {
        if self.gated {
            let (tx, rx) = oneshot::channel();
            self.gates.borrow_mut().push((declaration.id.clone(), tx));
            rx.await.ok()?;
        }
        self.load(declaration)
    }
}

/// Hook recording `enter:<panel>` / `exit:<panel>`.
#[derive(Default)]
pub struct RecordingHook {
    pub events: RefCell<Vec<String>>,
}

impl RecordingHook {
    pub fn take(&self) -> Vec<String> {
        std::mem::take(&mut *self.events.borrow_mut())
    }
}

impl TransitionHook for RecordingHook {
    fn on_enter(&self, id: &PanelId) {
        self.events.borrow_mut().push(format!("enter:{}", id));
    }

    fn on_exit(&self, id: &PanelId) {
        self.events.borrow_mut().push(format!("exit:{}", id));
    }
}

/// Controller recording its lifecycle callbacks.
pub struct Spy {
    kind: ControllerKind,
    pub bound_to: Option<PanelId>,
    pub refreshes: usize,
    pub destroyed: bool,
}

impl Controller for Spy {
    fn kind(&self) -> ControllerKind {
        self.kind.clone()
    }

    fn on_bind(&mut self, panel: &PanelId) {
        self.bound_to = Some(panel.clone());
    }

    fn on_refresh(&mut self) {
        self.refreshes += 1;
    }

    fn on_destroy(&mut self) {
        self.destroyed = true;
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

pub fn catalog() -> ControllerCatalog {
    let mut catalog = ControllerCatalog::new();
    for kind in [LIST, GRID] {
        let made = kind.clone();
        catalog.register_fn(kind, move |_| -> ControllerRef {
            Rc::new(RefCell::new(Spy {
                kind: made.clone(),
                bound_to: None,
                refreshes: 0,
                destroyed: false,
            }))
        });
    }
    catalog
}

/// Run `f` against a `Spy` controller.
pub fn spy<R>(controller: &ControllerRef, f: impl FnOnce(&mut Spy) -> R) -> R {
    with_controller::<Spy, _>(controller, f).expect("controller is a Spy")
}

pub struct Fixture {
    pub nav: Rc<NavigationController>,
    pub loader: Rc<TestLoader>,
    pub hook: Rc<RecordingHook>,
}

impl Fixture {
    pub fn state(&self, name: &str) -> LifecycleState {
        self.nav.state(&id(name))
    }

    pub fn is_visible(&self, name: &str) -> bool {
        self.state(name) == LifecycleState::Visible
    }

    /// Open with the `LIST` controller, expecting the asset to exist.
    pub fn open(&self, name: &str) -> ControllerRef {
        self.nav
            .open(&id(name), LIST)
            .expect("declared panel")
            .expect("asset available")
    }

    pub fn close(&self, name: &str) -> bool {
        self.nav.close(&id(name)).expect("declared panel")
    }

    pub fn stack(&self, layer: i32) -> Vec<PanelId> {
        self.nav.stack(layer)
    }
}

fn build(gated: bool) -> Fixture {
    let loader = Rc::new(TestLoader::new(gated));
    let hook = Rc::new(RecordingHook::default());
    let registry = PanelRegistry::new(declarations(), loader.clone());
    let nav = NavigationController::new(UiRoot::new(ROOT), registry, catalog())
        .with_hook(hook.clone());
    Fixture {
        nav: Rc::new(nav),
        loader,
        hook,
    }
}

/// Fixture whose async loads complete immediately.
pub fn fixture() -> Fixture {
    build(false)
}

/// Fixture whose async loads wait for `TestLoader::release*`.
pub fn gated_fixture() -> Fixture {
    build(true)
}

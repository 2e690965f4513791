//! Open/close state machine over one UI root.

use std::cell::RefCell;
use std::rc::Rc;

use panelnav_core::{
    ControllerCatalog, ControllerKind, ControllerRef, LayerId, LifecycleState, NavError, PanelId,
    Result, TransitionHook, UiRoot,
};
use panelnav_layout::LayerSet;
use panelnav_logger as logger;
use panelnav_registry::{BindAction, LoadOutcome, PanelRegistry, SharedRegistry};

use crate::effect::{dispatch, Effect};
use crate::pass::{violation, Pass};

/// Navigation controller of one UI root.
///
/// Owns the layer stacks and shares the registry. All operations take
/// `&self`, so several suspended `open_async` calls can run against one
/// controller on a local executor.
pub struct NavigationController {
    root: UiRoot,
    registry: SharedRegistry,
    catalog: ControllerCatalog,
    layers: RefCell<LayerSet>,
    hook: Option<Rc<dyn TransitionHook>>,
}

impl NavigationController {
    pub fn new(root: UiRoot, registry: PanelRegistry, catalog: ControllerCatalog) -> Self {
        Self {
            root,
            registry: SharedRegistry::new(registry),
            catalog,
            layers: RefCell::new(LayerSet::new()),
            hook: None,
        }
    }

    /// Notify `hook` of every enter/exit.
    pub fn with_hook(mut self, hook: Rc<dyn TransitionHook>) -> Self {
        self.hook = Some(hook);
        self
    }

    pub fn root(&self) -> &UiRoot {
        &self.root
    }

    pub fn registry(&self) -> &SharedRegistry {
        &self.registry
    }

    pub fn catalog(&self) -> &ControllerCatalog {
        &self.catalog
    }

    /// Open a panel, loading it synchronously if needed.
    ///
    /// Returns the bound controller, or `None` when the asset is unavailable.
    pub fn open(&self, id: &PanelId, kind: ControllerKind) -> Result<Option<ControllerRef>> {
        let outcome = self.registry.load(id)?;
        if !outcome.is_available() {
            return Ok(None);
        }
        self.present(id, &kind, outcome == LoadOutcome::Loaded).map(Some)
    }

    /// Open a panel, suspending while the asset loads.
    ///
    /// If the panel is closed or unloaded while the load is in flight, this
    /// request is superseded: the loaded instance stays registered and the
    /// stacks are left alone. The result is then the controller bound by
    /// whichever open stacked the panel since, or `None` when it is not
    /// stacked.
    pub async fn open_async(
        &self,
        id: &PanelId,
        kind: ControllerKind,
    ) -> Result<Option<ControllerRef>> {
        let completion = self.registry.load_async(id).await?;
        if completion.outcome == LoadOutcome::Unavailable {
            return Ok(None);
        }
        if completion.superseded {
            if self.layers.borrow().layer_of(id).is_none() {
                return Ok(None);
            }
            return Ok(self.controller(id));
        }
        self.present(id, &kind, completion.outcome == LoadOutcome::Loaded).map(Some)
    }

    /// Hide a panel and remove it from its stack. The instance stays loaded.
    ///
    /// Returns whether the panel was stacked.
    pub fn close(&self, id: &PanelId) -> Result<bool> {
        let mut pass = self.pass();
        pass.registry.resolve(id)?;
        if pass.registry.cancel_pending(id) {
            logger::debug(format!("Panel '{}': closed while loading", id));
        }
        if !pass.registry.contains(id) {
            return Ok(false);
        }
        let closed = pass.withdraw(id, true)?.is_some();
        self.finish(pass);
        Ok(closed)
    }

    /// Hide a loaded panel without touching its stack.
    pub fn hide(&self, id: &PanelId) -> Result<bool> {
        let mut pass = self.pass();
        pass.registry.resolve(id)?;
        let hidden = pass.hide(id);
        self.finish(pass);
        Ok(hidden)
    }

    /// Close the panel if stacked, then destroy it.
    ///
    /// Returns whether an instance was unloaded.
    pub fn unload(&self, id: &PanelId) -> Result<bool> {
        let mut pass = self.pass();
        pass.registry.resolve(id)?;
        pass.withdraw(id, true)?;
        let unloaded = pass.registry.unload(id);
        let found = unloaded.is_some();
        if let Some(controller) = unloaded.and_then(|u| u.controller) {
            pass.record(Effect::Release(controller));
        }
        self.finish(pass);
        Ok(found)
    }

    /// Clear every stack and destroy every instance.
    pub fn unload_all(&self) -> usize {
        let mut pass = self.pass();
        let layers: Vec<LayerId> = pass.layers.layers().collect();
        for layer in layers {
            pass.drain_layer(layer);
        }
        let unloaded = pass.registry.unload_all();
        let count = unloaded.len();
        for controller in unloaded.into_iter().filter_map(|u| u.controller) {
            pass.record(Effect::Release(controller));
        }
        self.finish(pass);
        logger::info(format!("Unloaded {} panel(s) from '{}'", count, self.root.name()));
        count
    }

    /// Pop everything above the bottom member of `layer` and show the bottom.
    ///
    /// Returns the popped panels, top first.
    pub fn pop_to_root(&self, layer: LayerId) -> Vec<PanelId> {
        let mut pass = self.pass();
        let popped = pass.pop_to_root(layer);
        self.finish(pass);
        popped
    }

    /// Pop and hide every member of `layer`. Instances stay loaded.
    pub fn clear_layer(&self, layer: LayerId) -> Vec<PanelId> {
        let mut pass = self.pass();
        let cleared = pass.drain_layer(layer);
        self.finish(pass);
        cleared
    }

    /// Pop and hide every member of every layer.
    pub fn clear_all(&self) -> Vec<PanelId> {
        let mut pass = self.pass();
        let layers: Vec<LayerId> = pass.layers.layers().collect();
        let cleared: Vec<PanelId> = layers
            .into_iter()
            .flat_map(|layer| pass.drain_layer(layer))
            .collect();
        self.finish(pass);
        cleared
    }

    /// Move a loaded panel to another layer.
    ///
    /// A stacked panel leaves its old layer as on close and is opened on top
    /// of the new one. Returns whether the layer changed.
    pub fn set_layer(&self, id: &PanelId, layer: LayerId) -> Result<bool> {
        let mut pass = self.pass();
        pass.registry.resolve(id)?;
        let current = match pass.registry.get(id) {
            Some(instance) => instance.layer(),
            None => return Ok(false),
        };
        if current == layer {
            return Ok(false);
        }

        let stacked = pass.withdraw(id, false)?.is_some();
        if let Some(instance) = pass.registry.get_mut(id) {
            instance.set_layer(layer);
        }
        logger::debug(format!(
            "Panel '{}': moved from layer {} to {}",
            id, current, layer
        ));
        if stacked {
            pass.place(id)?;
        }
        self.finish(pass);
        Ok(true)
    }

    /// Per-frame refresh: run `on_refresh` for visible panels marked dirty.
    ///
    /// Hidden panels keep their flag until they are shown. Returns the number
    /// of controllers refreshed.
    pub fn tick(&self) -> usize {
        let due: Vec<ControllerRef> = {
            let mut registry = self.registry.borrow_mut();
            let mut due = Vec::new();
            for id in registry.ids() {
                if let Some(instance) = registry.get_mut(&id).filter(|i| i.is_visible()) {
                    due.extend(instance.binding_mut().take_dirty());
                }
            }
            due
        };
        for controller in &due {
            controller.borrow_mut().on_refresh();
        }
        due.len()
    }

    /// Bound controller of a loaded panel.
    pub fn controller(&self, id: &PanelId) -> Option<ControllerRef> {
        self.registry.borrow().get(id)?.controller().cloned()
    }

    pub fn state(&self, id: &PanelId) -> LifecycleState {
        self.registry.borrow().state(id)
    }

    /// Members of `layer`, bottom to top.
    pub fn stack(&self, layer: LayerId) -> Vec<PanelId> {
        self.layers.borrow().ids(layer)
    }

    pub fn top(&self, layer: LayerId) -> Option<PanelId> {
        self.layers.borrow().top(layer).map(|e| e.id.clone())
    }

    pub fn is_layer_empty(&self, layer: LayerId) -> bool {
        self.layers.borrow().is_layer_empty(layer)
    }

    /// Layers that have held panels, ascending.
    pub fn layers(&self) -> Vec<LayerId> {
        self.layers.borrow().layers().collect()
    }

    /// Draw order assigned to a stacked panel.
    pub fn draw_order(&self, id: &PanelId) -> Option<u32> {
        let layers = self.layers.borrow();
        let (layer, index) = layers.position(id)?;
        layers.stack(layer)?.get(index).map(|e| e.draw_order)
    }

    /// Verify stacks, membership and registry agree.
    pub fn check_invariants(&self) -> Result<()> {
        let layers = self.layers.borrow();
        layers.check_invariants()?;
        let registry = self.registry.borrow();
        for layer in layers.layers() {
            for id in layers.ids(layer) {
                match registry.get(&id) {
                    Some(instance) if instance.layer() == layer => {}
                    Some(instance) => {
                        return Err(NavError::violation(
                            &id,
                            layer,
                            format!("instance belongs to layer {}", instance.layer()),
                        ))
                    }
                    None => return Err(NavError::violation(&id, layer, "stacked but not loaded")),
                }
            }
        }
        Ok(())
    }

    /// Bind the controller and place the loaded panel on top of its layer.
    ///
    /// A panel loaded by this very open is unloaded again when binding fails.
    fn present(&self, id: &PanelId, kind: &ControllerKind, fresh: bool) -> Result<ControllerRef> {
        let mut pass = self.pass();
        let bound = pass
            .registry
            .get_mut(id)
            .map(|instance| instance.binding_mut().ensure(kind, &self.catalog, id));
        let bound = match bound {
            Some(Ok(bound)) => bound,
            Some(Err(err)) => {
                if fresh && pass.registry.discard(id).is_some() {
                    logger::debug(format!("Panel '{}': dropped after failed bind", id));
                }
                self.finish(pass);
                return Err(err);
            }
            None => {
                let layer = pass.registry.resolve(id)?.layer;
                return Err(violation(id, layer, "opened while not loaded"));
            }
        };

        if let Some(released) = bound.released {
            pass.record(Effect::Release(released));
        }
        if bound.action != BindAction::Reused {
            pass.record(Effect::Bind {
                controller: bound.controller.clone(),
                panel: id.clone(),
            });
        }

        pass.place(id)?;
        self.finish(pass);
        Ok(bound.controller)
    }

    fn pass(&self) -> Pass<'_> {
        Pass::new(
            &self.root,
            self.registry.borrow_mut(),
            self.layers.borrow_mut(),
        )
    }

    fn finish(&self, pass: Pass<'_>) {
        let effects = pass.finish();
        dispatch(effects, self.hook.as_deref());
    }
}

//! Identity → instance map. Owns loading and unloading.

use std::collections::HashMap;
use std::rc::Rc;

use panelnav_core::{
    AssetLoader, ControllerRef, DeclarationTable, LifecycleState, PanelDeclaration, PanelId,
    Result, VisualObject,
};
use panelnav_logger as logger;

use crate::PanelInstance;

/// Result of a load request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// Entry already existed; nothing was loaded.
    Cached,
    /// Entry was created by this request.
    Loaded,
    /// Loader returned nothing; no entry exists.
    Unavailable,
}

impl LoadOutcome {
    pub fn is_available(self) -> bool {
        !matches!(self, LoadOutcome::Unavailable)
    }
}

/// Result of completing a suspended load.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadCompletion {
    pub outcome: LoadOutcome,
    /// A close or unload for the identity happened while the load was in
    /// flight; the caller must not show the panel.
    pub superseded: bool,
}

impl LoadCompletion {
    pub fn cached() -> Self {
        Self {
            outcome: LoadOutcome::Cached,
            superseded: false,
        }
    }
}

/// Proof that a load was started; redeemed by `complete_load`.
#[must_use = "a started load must be completed with PanelRegistry::complete_load"]
#[derive(Debug)]
pub struct LoadTicket {
    declaration: PanelDeclaration,
    epoch: u64,
}

impl LoadTicket {
    pub fn id(&self) -> &PanelId {
        &self.declaration.id
    }

    pub fn declaration(&self) -> &PanelDeclaration {
        &self.declaration
    }
}

/// What remains after an instance is unloaded.
pub struct UnloadedPanel {
    pub id: PanelId,
    /// Detached controller; the caller runs `on_destroy`.
    pub controller: Option<ControllerRef>,
}

/// At most one `PanelInstance` per identity.
pub struct PanelRegistry {
    declarations: DeclarationTable,
    loader: Rc<dyn AssetLoader>,
    instances: HashMap<PanelId, PanelInstance>,
    /// In-flight suspended loads per identity.
    pending: HashMap<PanelId, usize>,
    /// Bumped by `cancel_pending`; tickets from an older epoch are superseded.
    epochs: HashMap<PanelId, u64>,
}

impl PanelRegistry {
    pub fn new(declarations: DeclarationTable, loader: Rc<dyn AssetLoader>) -> Self {
        Self {
            declarations,
            loader,
            instances: HashMap::new(),
            pending: HashMap::new(),
            epochs: HashMap::new(),
        }
    }

    pub fn declarations(&self) -> &DeclarationTable {
        &self.declarations
    }

    /// Declaration of `id`, or `MissingIdentityDeclaration`.
    pub fn resolve(&self, id: &PanelId) -> Result<&PanelDeclaration> {
        self.declarations.resolve(id)
    }

    pub fn loader(&self) -> Rc<dyn AssetLoader> {
        self.loader.clone()
    }

    pub fn contains(&self, id: &PanelId) -> bool {
        self.instances.contains_key(id)
    }

    pub fn get(&self, id: &PanelId) -> Option<&PanelInstance> {
        self.instances.get(id)
    }

    pub fn get_mut(&mut self, id: &PanelId) -> Option<&mut PanelInstance> {
        self.instances.get_mut(id)
    }

    /// Lifecycle state, including `Loading` for in-flight loads.
    pub fn state(&self, id: &PanelId) -> LifecycleState {
        match self.instances.get(id) {
            Some(instance) => instance.state(),
            None if self.is_loading(id) => LifecycleState::Loading,
            None => LifecycleState::Unloaded,
        }
    }

    pub fn is_loading(&self, id: &PanelId) -> bool {
        self.pending.get(id).is_some_and(|waiters| *waiters > 0)
    }

    /// Load synchronously. Idempotent: an existing entry is returned as is.
    pub fn load(&mut self, id: &PanelId) -> Result<LoadOutcome> {
        let declaration = self.declarations.resolve(id)?.clone();
        if self.contains(id) {
            return Ok(LoadOutcome::Cached);
        }

        match self.loader.load(&declaration) {
            Some(visual) => {
                self.insert(declaration, visual);
                Ok(LoadOutcome::Loaded)
            }
            None => {
                logger::warn(format!(
                    "Panel '{}' unavailable: nothing at '{}'",
                    id, declaration.path
                ));
                Ok(LoadOutcome::Unavailable)
            }
        }
    }

    /// Start a suspended load.
    pub fn begin_load(&mut self, id: &PanelId) -> Result<LoadTicket> {
        let declaration = self.declarations.resolve(id)?.clone();
        *self.pending.entry(id.clone()).or_insert(0) += 1;
        let epoch = self.epochs.get(id).copied().unwrap_or(0);
        logger::debug(format!("Panel '{}': load started", id));
        Ok(LoadTicket { declaration, epoch })
    }

    /// Finish a suspended load.
    ///
    /// The map is consulted again here: if another load created the entry
    /// while this one was suspended, this result is destroyed and the
    /// existing entry wins.
    pub fn complete_load(
        &mut self,
        ticket: LoadTicket,
        visual: Option<Box<dyn VisualObject>>,
    ) -> LoadCompletion {
        let id = ticket.declaration.id.clone();
        if let Some(waiters) = self.pending.get_mut(&id) {
            *waiters = waiters.saturating_sub(1);
            if *waiters == 0 {
                self.pending.remove(&id);
            }
        }
        let superseded = self.epochs.get(&id).copied().unwrap_or(0) != ticket.epoch;

        let outcome = match visual {
            Some(mut visual) if self.contains(&id) => {
                logger::debug(format!(
                    "Panel '{}': discarded duplicate in-flight load",
                    id
                ));
                visual.destroy();
                LoadOutcome::Cached
            }
            Some(visual) => {
                self.insert(ticket.declaration, visual);
                LoadOutcome::Loaded
            }
            None if self.contains(&id) => LoadOutcome::Cached,
            None => {
                logger::warn(format!(
                    "Panel '{}' unavailable: nothing at '{}'",
                    id, ticket.declaration.path
                ));
                LoadOutcome::Unavailable
            }
        };

        if superseded {
            logger::debug(format!(
                "Panel '{}': load finished after close/unload, left hidden",
                id
            ));
        }
        LoadCompletion {
            outcome,
            superseded,
        }
    }

    /// Mark in-flight loads of `id` as superseded. Returns whether one was in flight.
    pub fn cancel_pending(&mut self, id: &PanelId) -> bool {
        if !self.is_loading(id) {
            return false;
        }
        *self.epochs.entry(id.clone()).or_insert(0) += 1;
        true
    }

    /// Mark every in-flight load as superseded.
    pub fn cancel_all_pending(&mut self) -> usize {
        let ids: Vec<PanelId> = self.pending.keys().cloned().collect();
        ids.iter().filter(|id| self.cancel_pending(id)).count()
    }

    /// Destroy the instance and remove its entry.
    ///
    /// Stack membership is not touched here; the navigation controller closes
    /// the panel first.
    pub fn unload(&mut self, id: &PanelId) -> Option<UnloadedPanel> {
        self.cancel_pending(id);
        self.discard(id)
    }

    /// Destroy the instance and remove its entry, leaving in-flight loads of
    /// the same identity untouched.
    pub fn discard(&mut self, id: &PanelId) -> Option<UnloadedPanel> {
        let mut instance = self.instances.remove(id)?;
        let controller = instance.destroy();
        logger::debug(format!("Panel '{}': unloaded", id));
        Some(UnloadedPanel {
            id: id.clone(),
            controller,
        })
    }

    /// Unload every entry. In-flight loads are superseded as well.
    pub fn unload_all(&mut self) -> Vec<UnloadedPanel> {
        self.cancel_all_pending();
        let ids = self.ids();
        ids.iter().filter_map(|id| self.unload(id)).collect()
    }

    /// Loaded identities, sorted.
    pub fn ids(&self) -> Vec<PanelId> {
        let mut ids: Vec<PanelId> = self.instances.keys().cloned().collect();
        ids.sort();
        ids
    }

    pub fn len(&self) -> usize {
        self.instances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }

    fn insert(&mut self, declaration: PanelDeclaration, visual: Box<dyn VisualObject>) {
        let id = declaration.id.clone();
        logger::debug(format!(
            "Panel '{}': loaded from '{}' (layer {}, {})",
            id, declaration.path, declaration.layer, declaration.mode
        ));
        let previous = self
            .instances
            .insert(id, PanelInstance::new(declaration, visual));
        debug_assert!(previous.is_none(), "registry entry overwritten");
    }
}

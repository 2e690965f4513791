//! One navigation step over the registry and the layer stacks.
//!
//! A `Pass` holds both borrows for the duration of a synchronous step and
//! records the outbound callbacks instead of running them. `finish` releases
//! the borrows and hands the callbacks back for dispatch.

use std::cell::RefMut;

use panelnav_core::{LayerId, NavError, PanelId, Result, StackMode, UiRoot};
use panelnav_layout::LayerSet;
use panelnav_logger as logger;
use panelnav_registry::PanelRegistry;

use crate::effect::Effect;

/// Build a consistency error, logging it and failing fast in debug builds.
pub(crate) fn violation(id: &PanelId, layer: LayerId, detail: impl Into<String>) -> NavError {
    let err = NavError::violation(id, layer, detail);
    logger::error(err.to_string());
    debug_assert!(false, "{}", err);
    err
}

pub(crate) struct Pass<'a> {
    root: &'a UiRoot,
    pub(crate) registry: RefMut<'a, PanelRegistry>,
    pub(crate) layers: RefMut<'a, LayerSet>,
    effects: Vec<Effect>,
}

impl<'a> Pass<'a> {
    pub(crate) fn new(
        root: &'a UiRoot,
        registry: RefMut<'a, PanelRegistry>,
        layers: RefMut<'a, LayerSet>,
    ) -> Self {
        Self {
            root,
            registry,
            layers,
            effects: Vec::new(),
        }
    }

    pub(crate) fn record(&mut self, effect: Effect) {
        self.effects.push(effect);
    }

    /// Activate a loaded panel.
    pub(crate) fn show(&mut self, id: &PanelId) -> bool {
        let changed = self.registry.get_mut(id).is_some_and(|i| i.show());
        if changed {
            logger::debug(format!("Panel '{}': shown", id));
            self.effects.push(Effect::Enter(id.clone()));
        }
        changed
    }

    /// Deactivate a loaded panel.
    pub(crate) fn hide(&mut self, id: &PanelId) -> bool {
        let changed = self.registry.get_mut(id).is_some_and(|i| i.hide());
        if changed {
            logger::debug(format!("Panel '{}': hidden", id));
            self.effects.push(Effect::Exit(id.clone()));
        }
        changed
    }

    /// Hide-then-show the current top without touching the stack.
    fn restart(&mut self, id: &PanelId) {
        let Some(instance) = self.registry.get_mut(id) else {
            return;
        };
        let was_visible = instance.is_visible();
        instance.restart();
        logger::debug(format!("Panel '{}': re-opened on top", id));
        if was_visible {
            self.effects.push(Effect::Exit(id.clone()));
        }
        self.effects.push(Effect::Enter(id.clone()));
    }

    /// Put a loaded panel on top of its layer, applying its stack mode.
    pub(crate) fn place(&mut self, id: &PanelId) -> Result<()> {
        let (layer, mode) = match self.registry.get(id) {
            Some(instance) => (instance.layer(), instance.mode()),
            None => {
                let layer = self.registry.resolve(id)?.layer;
                return Err(violation(id, layer, "placed while not loaded"));
            }
        };

        if let Some(current) = self.layers.layer_of(id) {
            if current != layer {
                self.withdraw(id, false)?;
            }
        }

        if self.layers.top(layer).is_some_and(|top| &top.id == id) {
            self.restart(id);
            return Ok(());
        }

        let buried = self.layers.position(id).map(|(_, index)| index);

        if mode.is_exclusive() {
            let below = self
                .layers
                .exclusive_top_except(layer, id)
                .map(|(index, entry)| (index, entry.id.clone(), entry.mode));
            if let Some((index, below_id, below_mode)) = below {
                if mode == StackMode::Replace && below_mode == StackMode::Replace {
                    self.layers.remove_at(layer, index);
                    logger::debug(format!(
                        "Panel '{}': replaced by '{}' in layer {}",
                        below_id, id, layer
                    ));
                }
                self.hide(&below_id);
            }
        }

        let order = match buried {
            Some(index) => {
                logger::debug(format!(
                    "Panel '{}': promoted from position {} of layer {}",
                    id, index, layer
                ));
                self.layers
                    .promote_to_top(id)
                    .ok_or_else(|| violation(id, layer, "indexed but not stacked"))?
            }
            None => self.layers.push(layer, id.clone(), mode)?,
        };
        if let Some(instance) = self.registry.get_mut(id) {
            instance.attach(self.root, order);
        }
        logger::debug(format!(
            "Panel '{}': stacked in layer {} ({}, draw order {})",
            id, layer, mode, order
        ));
        self.show(id);
        Ok(())
    }

    /// Remove a panel from its stack, restoring the chain below it.
    ///
    /// When the panel was the topmost Push/Replace member of its layer, the
    /// next Push/Replace member down is shown. Returns the layer it left.
    pub(crate) fn withdraw(&mut self, id: &PanelId, hide: bool) -> Result<Option<LayerId>> {
        let Some(layer) = self.layers.layer_of(id) else {
            return Ok(None);
        };
        let was_chain_top = self
            .layers
            .exclusive_top(layer)
            .is_some_and(|(_, entry)| &entry.id == id);

        if self.layers.remove(id).is_none() {
            return Err(violation(id, layer, "indexed but not stacked"));
        }
        if hide {
            self.hide(id);
        }
        logger::debug(format!("Panel '{}': removed from layer {}", id, layer));

        if was_chain_top {
            let restored = self.layers.exclusive_top(layer).map(|(_, e)| e.id.clone());
            if let Some(restored) = restored {
                self.show(&restored);
            }
        }
        Ok(Some(layer))
    }

    /// Pop every member above the bottom one, then show the bottom one.
    pub(crate) fn pop_to_root(&mut self, layer: LayerId) -> Vec<PanelId> {
        let mut popped = Vec::new();
        while self.layers.stack(layer).is_some_and(|s| s.len() > 1) {
            let Some(entry) = self.layers.pop(layer) else {
                break;
            };
            self.hide(&entry.id);
            popped.push(entry.id);
        }

        let root = self.layers.top(layer).map(|e| e.id.clone());
        if let Some(root) = root {
            self.show(&root);
        }
        popped
    }

    /// Pop and hide every member of `layer`, top first.
    pub(crate) fn drain_layer(&mut self, layer: LayerId) -> Vec<PanelId> {
        let drained = self.layers.clear_layer(layer);
        drained
            .into_iter()
            .map(|entry| {
                self.hide(&entry.id);
                entry.id
            })
            .collect()
    }

    /// Release both borrows and return the recorded callbacks.
    pub(crate) fn finish(self) -> Vec<Effect> {
        if cfg!(debug_assertions) {
            if let Err(err) = self.layers.check_invariants() {
                logger::error(err.to_string());
                debug_assert!(false, "{}", err);
            }
        }
        self.effects
    }
}

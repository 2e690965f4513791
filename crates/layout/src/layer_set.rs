//! All layer stacks of one UI root.

use std::collections::{BTreeMap, HashMap};

use panelnav_core::{LayerId, NavError, PanelId, Result, StackMode};

use crate::{LayerStack, StackEntry};

/// Layer stacks keyed by layer id, plus the panel → layer membership index.
///
/// Every mutation goes through this type so a panel is never a member of two
/// stacks, and never twice of one.
#[derive(Debug, Clone, Default)]
pub struct LayerSet {
    stacks: BTreeMap<LayerId, LayerStack>,
    membership: HashMap<PanelId, LayerId>,
}

impl LayerSet {
    /// Create empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Stack of `layer`, if it was ever used.
    pub fn stack(&self, layer: LayerId) -> Option<&LayerStack> {
        self.stacks.get(&layer)
    }

    /// Layer the panel is currently stacked in.
    pub fn layer_of(&self, id: &PanelId) -> Option<LayerId> {
        self.membership.get(id).copied()
    }

    /// Layer and position of the panel.
    pub fn position(&self, id: &PanelId) -> Option<(LayerId, usize)> {
        let layer = self.layer_of(id)?;
        let index = self.stacks.get(&layer)?.index_of(id)?;
        Some((layer, index))
    }

    /// Place panel at the tail of `layer`, returning its draw order.
    pub fn push(&mut self, layer: LayerId, id: PanelId, mode: StackMode) -> Result<u32> {
        if let Some(current) = self.layer_of(&id) {
            return Err(NavError::violation(
                &id,
                layer,
                format!("already a member of layer {}", current),
            ));
        }

        let order = self
            .stacks
            .entry(layer)
            .or_insert_with(|| LayerStack::new(layer))
            .push(id.clone(), mode)?;
        self.membership.insert(id, layer);
        Ok(order)
    }

    /// Remove panel wherever it is stacked.
    pub fn remove(&mut self, id: &PanelId) -> Option<(LayerId, usize, StackEntry)> {
        let layer = self.membership.remove(id)?;
        let (index, entry) = self.stacks.get_mut(&layer)?.remove(id)?;
        Some((layer, index, entry))
    }

    /// Remove member at `index` of `layer`.
    pub fn remove_at(&mut self, layer: LayerId, index: usize) -> Option<StackEntry> {
        let entry = self.stacks.get_mut(&layer)?.remove_at(index)?;
        self.membership.remove(&entry.id);
        Some(entry)
    }

    /// Remove and return the tail of `layer`.
    pub fn pop(&mut self, layer: LayerId) -> Option<StackEntry> {
        let entry = self.stacks.get_mut(&layer)?.pop()?;
        self.membership.remove(&entry.id);
        Some(entry)
    }

    /// Move a stacked panel to the tail of its layer, returning its new
    /// draw order. Membership is unchanged.
    pub fn promote_to_top(&mut self, id: &PanelId) -> Option<u32> {
        let layer = self.layer_of(id)?;
        self.stacks.get_mut(&layer)?.promote_to_top(id)
    }

    /// Tail of `layer`.
    pub fn top(&self, layer: LayerId) -> Option<&StackEntry> {
        self.stacks.get(&layer).and_then(|s| s.top())
    }

    /// Topmost Push/Replace member of `layer` with its position.
    pub fn exclusive_top(&self, layer: LayerId) -> Option<(usize, &StackEntry)> {
        let stack = self.stacks.get(&layer)?;
        let index = stack.exclusive_top_index()?;
        stack.get(index).map(|entry| (index, entry))
    }

    /// Topmost Push/Replace member of `layer` other than `id`.
    pub fn exclusive_top_except(
        &self,
        layer: LayerId,
        id: &PanelId,
    ) -> Option<(usize, &StackEntry)> {
        self.stacks
            .get(&layer)?
            .iter()
            .enumerate()
            .rev()
            .find(|(_, entry)| entry.mode.is_exclusive() && &entry.id != id)
    }

    /// Member identities of `layer`, bottom to top.
    pub fn ids(&self, layer: LayerId) -> Vec<PanelId> {
        self.stacks.get(&layer).map(|s| s.ids()).unwrap_or_default()
    }

    pub fn is_layer_empty(&self, layer: LayerId) -> bool {
        self.stacks.get(&layer).map_or(true, |s| s.is_empty())
    }

    /// Layers in ascending order.
    pub fn layers(&self) -> impl Iterator<Item = LayerId> + '_ {
        self.stacks.keys().copied()
    }

    /// Take all members of `layer`, top first.
    pub fn clear_layer(&mut self, layer: LayerId) -> Vec<StackEntry> {
        let drained = self
            .stacks
            .get_mut(&layer)
            .map(|s| s.drain_from_top())
            .unwrap_or_default();
        for entry in &drained {
            self.membership.remove(&entry.id);
        }
        drained
    }

    /// Take all members of every layer, each layer top first.
    pub fn clear(&mut self) -> Vec<StackEntry> {
        let layers: Vec<LayerId> = self.layers().collect();
        layers
            .into_iter()
            .flat_map(|layer| self.clear_layer(layer))
            .collect()
    }

    /// Verify every stack and the membership index agree.
    pub fn check_invariants(&self) -> Result<()> {
        let mut seen = 0;
        for (layer, stack) in &self.stacks {
            stack.check_invariants()?;
            for entry in stack.iter() {
                match self.membership.get(&entry.id) {
                    Some(indexed) if indexed == layer => seen += 1,
                    Some(indexed) => {
                        return Err(NavError::violation(
                            &entry.id,
                            *layer,
                            format!("membership index points at layer {}", indexed),
                        ))
                    }
                    None => {
                        return Err(NavError::violation(
                            &entry.id,
                            *layer,
                            "stacked but missing from membership index",
                        ))
                    }
                }
            }
        }

        if seen != self.membership.len() {
            let stray = self
                .membership
                .iter()
                .find(|(id, layer)| {
                    !self
                        .stacks
                        .get(*layer)
                        .is_some_and(|stack| stack.contains(id))
                })
                .map(|(id, layer)| (id.clone(), *layer));
            if let Some((id, layer)) = stray {
                return Err(NavError::violation(&id, layer, "indexed but not stacked"));
            }
        }
        Ok(())
    }
}

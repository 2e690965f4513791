//! Ordered stack of panels sharing one layer.

use panelnav_core::{LayerId, NavError, PanelId, Result, StackMode};

/// Member of a layer stack.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StackEntry {
    pub id: PanelId,
    /// Mode of the panel type, copied at insertion.
    pub mode: StackMode,
    /// Draw order assigned when the entry was placed at the tail.
    pub draw_order: u32,
}

/// Ordered members of one layer (insertion order = navigation order).
///
/// The tail is the top. Draw orders grow monotonically along the stack, so
/// panels placed later always draw above panels placed earlier.
#[derive(Debug, Clone)]
pub struct LayerStack {
    layer: LayerId,
    entries: Vec<StackEntry>,
    next_order: u32,
}

impl LayerStack {
    /// Create empty stack for `layer`.
    pub fn new(layer: LayerId) -> Self {
        Self {
            layer,
            entries: Vec::new(),
            next_order: 0,
        }
    }

    pub fn layer(&self) -> LayerId {
        self.layer
    }

    /// Check if panel is a member.
    pub fn contains(&self, id: &PanelId) -> bool {
        self.index_of(id).is_some()
    }

    /// Position of panel (0 = bottom).
    pub fn index_of(&self, id: &PanelId) -> Option<usize> {
        self.entries.iter().position(|e| &e.id == id)
    }

    /// Append panel at the tail and return its draw order.
    pub fn push(&mut self, id: PanelId, mode: StackMode) -> Result<u32> {
        if self.contains(&id) {
            return Err(NavError::violation(&id, self.layer, "pushed twice onto the same stack"));
        }

        self.next_order += 1;
        let draw_order = self.next_order;
        self.entries.push(StackEntry {
            id,
            mode,
            draw_order,
        });
        Ok(draw_order)
    }

    /// Remove and return the tail.
    pub fn pop(&mut self) -> Option<StackEntry> {
        self.entries.pop()
    }

    /// Remove member at `index` without disturbing the others.
    pub fn remove_at(&mut self, index: usize) -> Option<StackEntry> {
        if index >= self.entries.len() {
            return None;
        }
        Some(self.entries.remove(index))
    }

    /// Remove member by identity, returning its former position.
    pub fn remove(&mut self, id: &PanelId) -> Option<(usize, StackEntry)> {
        let index = self.index_of(id)?;
        self.remove_at(index).map(|entry| (index, entry))
    }

    /// Move member to the tail, returning its new draw order.
    pub fn promote_to_top(&mut self, id: &PanelId) -> Option<u32> {
        let (_, entry) = self.remove(id)?;
        self.push(entry.id, entry.mode).ok()
    }

    /// Tail of the stack.
    pub fn top(&self) -> Option<&StackEntry> {
        self.entries.last()
    }

    pub fn get(&self, index: usize) -> Option<&StackEntry> {
        self.entries.get(index)
    }

    /// Position of the topmost Push/Replace member.
    ///
    /// Overlay members above it do not take part in the navigation chain.
    pub fn exclusive_top_index(&self) -> Option<usize> {
        self.entries.iter().rposition(|e| e.mode.is_exclusive())
    }

    /// Topmost Push/Replace member.
    pub fn exclusive_top(&self) -> Option<&StackEntry> {
        self.exclusive_top_index().and_then(|i| self.entries.get(i))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Members from bottom to top.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &StackEntry> + ExactSizeIterator {
        self.entries.iter()
    }

    /// Member identities from bottom to top.
    pub fn ids(&self) -> Vec<PanelId> {
        self.entries.iter().map(|e| e.id.clone()).collect()
    }

    /// Take all members, top first (pop order).
    pub fn drain_from_top(&mut self) -> Vec<StackEntry> {
        let mut drained: Vec<StackEntry> = self.entries.drain(..).collect();
        drained.reverse();
        drained
    }

    /// Verify structural invariants: no duplicates, draw orders increasing.
    pub fn check_invariants(&self) -> Result<()> {
        for (i, entry) in self.entries.iter().enumerate() {
            if self.entries[i + 1..].iter().any(|e| e.id == entry.id) {
                return Err(NavError::violation(&entry.id, self.layer, "listed twice"));
            }
            if let Some(next) = self.entries.get(i + 1) {
                if next.draw_order <= entry.draw_order {
                    return Err(NavError::violation(
                        &next.id,
                        self.layer,
                        "draw order not above the member below",
                    ));
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(s: &str) -> PanelId {
        PanelId::new(s)
    }

    fn stack_of(members: &[(&str, StackMode)]) -> LayerStack {
        let mut stack = LayerStack::new(0);
        for (name, mode) in members {
            stack.push(id(name), *mode).unwrap();
        }
        stack
    }

    fn names(stack: &LayerStack) -> Vec<String> {
        stack.iter().map(|e| e.id.to_string()).collect()
    }

    #[test]
    fn test_push_assigns_increasing_orders() {
        let mut stack = LayerStack::new(4);
        let a = stack.push(id("A"), StackMode::Push).unwrap();
        let b = stack.push(id("B"), StackMode::Overlay).unwrap();
        assert!(b > a);
        assert_eq!(stack.top().unwrap().id, id("B"));
        assert_eq!(stack.layer(), 4);
    }

    #[test]
    fn test_push_duplicate_rejected() {
        let mut stack = stack_of(&[("A", StackMode::Push)]);
        let err = stack.push(id("A"), StackMode::Push).unwrap_err();
        assert!(matches!(err, NavError::StackConsistencyViolation { .. }));
        assert_eq!(stack.len(), 1);
    }

    #[test]
    fn test_remove_at_keeps_relative_order() {
        let mut stack = stack_of(&[
            ("A", StackMode::Push),
            ("B", StackMode::Push),
            ("C", StackMode::Push),
        ]);
        let removed = stack.remove_at(1).unwrap();
        assert_eq!(removed.id, id("B"));
        assert_eq!(names(&stack), vec!["A", "C"]);
        assert!(stack.remove_at(5).is_none());
    }

    #[test]
    fn test_promote_to_top() {
        let mut stack = stack_of(&[
            ("A", StackMode::Push),
            ("B", StackMode::Overlay),
            ("C", StackMode::Push),
        ]);
        let old_top_order = stack.top().unwrap().draw_order;
        let order = stack.promote_to_top(&id("A")).unwrap();
        assert!(order > old_top_order);
        assert_eq!(names(&stack), vec!["B", "C", "A"]);
        assert!(stack.promote_to_top(&id("Z")).is_none());
        stack.check_invariants().unwrap();
    }

    #[test]
    fn test_exclusive_top_skips_overlays() {
        let stack = stack_of(&[
            ("A", StackMode::Push),
            ("R", StackMode::Replace),
            ("O", StackMode::Overlay),
        ]);
        assert_eq!(stack.exclusive_top_index(), Some(1));
        assert_eq!(stack.exclusive_top().unwrap().id, id("R"));

        let overlays = stack_of(&[("O1", StackMode::Overlay), ("O2", StackMode::Overlay)]);
        assert!(overlays.exclusive_top().is_none());
    }

    #[test]
    fn test_pop_and_drain() {
        let mut stack = stack_of(&[("A", StackMode::Push), ("B", StackMode::Push)]);
        assert_eq!(stack.pop().unwrap().id, id("B"));
        stack.push(id("C"), StackMode::Push).unwrap();
        let drained: Vec<_> = stack.drain_from_top().into_iter().map(|e| e.id).collect();
        assert_eq!(drained, vec![id("C"), id("A")]);
        assert!(stack.is_empty());
    }

    #[test]
    fn test_index_of_and_contains() {
        let stack = stack_of(&[("A", StackMode::Push), ("B", StackMode::Push)]);
        assert_eq!(stack.index_of(&id("B")), Some(1));
        assert!(stack.contains(&id("A")));
        assert!(!stack.contains(&id("C")));
    }
}

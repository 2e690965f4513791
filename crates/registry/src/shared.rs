//! Shared registry handle for single-threaded cooperative use.

use std::cell::{Ref, RefCell, RefMut};
use std::rc::Rc;

use panelnav_core::{PanelId, Result};

use crate::{LoadCompletion, LoadOutcome, PanelRegistry};

/// Cloneable handle to one `PanelRegistry`.
///
/// No borrow is held across an await point: `load_async` takes a ticket,
/// releases the registry, awaits the loader and borrows again to complete.
#[derive(Clone)]
pub struct SharedRegistry {
    inner: Rc<RefCell<PanelRegistry>>,
}

impl SharedRegistry {
    pub fn new(registry: PanelRegistry) -> Self {
        Self {
            inner: Rc::new(RefCell::new(registry)),
        }
    }

    pub fn borrow(&self) -> Ref<'_, PanelRegistry> {
        self.inner.borrow()
    }

    pub fn borrow_mut(&self) -> RefMut<'_, PanelRegistry> {
        self.inner.borrow_mut()
    }

    /// Synchronous load.
    pub fn load(&self, id: &PanelId) -> Result<LoadOutcome> {
        self.inner.borrow_mut().load(id)
    }

    /// Suspending load.
    ///
    /// Any number of these may be in flight for one identity; at most one
    /// instance ends up in the registry.
    pub async fn load_async(&self, id: &PanelId) -> Result<LoadCompletion> {
        let (ticket, loader) = {
            let mut registry = self.inner.borrow_mut();
            if registry.contains(id) {
                // still resolve so undeclared ids stay loud
                registry.resolve(id)?;
                return Ok(LoadCompletion::cached());
            }
            (registry.begin_load(id)?, registry.loader())
        };

        let visual = loader.load_async(ticket.declaration()).await;
        Ok(self.inner.borrow_mut().complete_load(ticket, visual))
    }
}

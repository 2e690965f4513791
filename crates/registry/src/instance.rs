//! Loaded panel instance.

use panelnav_core::{
    ControllerRef, LayerId, LifecycleState, PanelDeclaration, PanelId, StackMode, UiRoot,
    VisualObject,
};

use crate::ControlBinding;

/// Runtime object produced by the loader for one identity.
///
/// Owned by the registry. Stacks and the navigation controller refer to it
/// by identity only.
pub struct PanelInstance {
    declaration: PanelDeclaration,
    layer: LayerId,
    state: LifecycleState,
    visual: Box<dyn VisualObject>,
    binding: ControlBinding,
    draw_order: Option<u32>,
}

impl PanelInstance {
    /// Wrap a freshly loaded visual. The visual starts inactive.
    pub(crate) fn new(declaration: PanelDeclaration, mut visual: Box<dyn VisualObject>) -> Self {
        visual.set_active(false);
        Self {
            layer: declaration.layer,
            declaration,
            state: LifecycleState::Ready,
            visual,
            binding: ControlBinding::new(),
            draw_order: None,
        }
    }

    pub fn id(&self) -> &PanelId {
        &self.declaration.id
    }

    pub fn declaration(&self) -> &PanelDeclaration {
        &self.declaration
    }

    /// Current layer (declared default unless reassigned).
    pub fn layer(&self) -> LayerId {
        self.layer
    }

    /// Reassign layer. Callers must re-sort the stacks.
    pub fn set_layer(&mut self, layer: LayerId) {
        self.layer = layer;
    }

    pub fn mode(&self) -> StackMode {
        self.declaration.mode
    }

    pub fn state(&self) -> LifecycleState {
        self.state
    }

    pub fn is_visible(&self) -> bool {
        self.state == LifecycleState::Visible
    }

    /// Last draw order assigned by `attach`.
    pub fn draw_order(&self) -> Option<u32> {
        self.draw_order
    }

    /// Parent under `root` and apply draw order.
    pub fn attach(&mut self, root: &UiRoot, order: u32) {
        if self.state == LifecycleState::Destroyed {
            return;
        }
        self.visual.attach_under(root);
        self.visual.set_draw_order(order);
        self.draw_order = Some(order);
    }

    /// Activate the visual. Returns whether visibility changed.
    pub fn show(&mut self) -> bool {
        match self.state {
            LifecycleState::Visible | LifecycleState::Destroyed => false,
            _ => {
                self.visual.set_active(true);
                self.state = LifecycleState::Visible;
                true
            }
        }
    }

    /// Deactivate the visual. Returns whether visibility changed.
    pub fn hide(&mut self) -> bool {
        match self.state {
            LifecycleState::Visible => {
                self.visual.set_active(false);
                self.state = LifecycleState::Hidden;
                true
            }
            LifecycleState::Ready => {
                self.state = LifecycleState::Hidden;
                false
            }
            _ => false,
        }
    }

    /// Hide-then-show cycle used when the top panel is opened again.
    pub fn restart(&mut self) {
        if self.state == LifecycleState::Destroyed {
            return;
        }
        self.visual.set_active(false);
        self.visual.set_active(true);
        self.state = LifecycleState::Visible;
    }

    pub fn binding(&self) -> &ControlBinding {
        &self.binding
    }

    pub fn binding_mut(&mut self) -> &mut ControlBinding {
        &mut self.binding
    }

    pub fn controller(&self) -> Option<&ControllerRef> {
        self.binding.controller()
    }

    /// Destroy the visual and detach the controller.
    pub(crate) fn destroy(&mut self) -> Option<ControllerRef> {
        if self.state == LifecycleState::Destroyed {
            return None;
        }
        self.visual.set_active(false);
        self.visual.destroy();
        self.state = LifecycleState::Destroyed;
        self.binding.release()
    }
}

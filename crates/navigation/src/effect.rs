//! Outbound notifications collected during a pass and run after it.

use panelnav_core::{ControllerRef, PanelId, TransitionHook};

/// Callback owed to a collaborator once bookkeeping is complete.
pub(crate) enum Effect {
    /// Panel became visible.
    Enter(PanelId),
    /// Panel was hidden.
    Exit(PanelId),
    /// Controller was attached to a panel.
    Bind {
        controller: ControllerRef,
        panel: PanelId,
    },
    /// Controller was detached (kind swap or unload).
    Release(ControllerRef),
}

/// Run effects in order. No registry or stack borrow may be held.
pub(crate) fn dispatch(effects: Vec<Effect>, hook: Option<&dyn TransitionHook>) {
    for effect in effects {
        match effect {
            Effect::Enter(id) => {
                if let Some(hook) = hook {
                    hook.on_enter(&id);
                }
            }
            Effect::Exit(id) => {
                if let Some(hook) = hook {
                    hook.on_exit(&id);
                }
            }
            Effect::Bind { controller, panel } => controller.borrow_mut().on_bind(&panel),
            Effect::Release(controller) => controller.borrow_mut().on_destroy(),
        }
    }
}

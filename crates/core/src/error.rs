//! Error taxonomy of the navigation core.
//!
//! Only wiring defects and invariant violations are errors. A loader that
//! returns nothing is an ordinary outcome and is reported through
//! `Option`/outcome enums instead.

use thiserror::Error;

use crate::panel::{LayerId, PanelId};

/// Errors raised by the navigation core.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NavError {
    /// A panel identity was requested without a static declaration.
    #[error("panel '{id}' has no declaration (path, layer and mode must be registered at startup)")]
    MissingIdentityDeclaration { id: PanelId },

    /// The same identity was declared twice in one table.
    #[error("panel '{id}' is declared more than once")]
    DuplicateDeclaration { id: PanelId },

    /// A controller kind was requested that has no registered factory.
    #[error("no controller factory registered for kind '{kind}'")]
    UnknownControllerKind { kind: String },

    /// A layer stack lost one of its structural invariants.
    #[error("stack consistency violation for panel '{id}' in layer {layer}: {detail}")]
    StackConsistencyViolation {
        id: PanelId,
        layer: LayerId,
        detail: String,
    },
}

impl NavError {
    /// Build a `StackConsistencyViolation`.
    pub fn violation(id: &PanelId, layer: LayerId, detail: impl Into<String>) -> Self {
        NavError::StackConsistencyViolation {
            id: id.clone(),
            layer,
            detail: detail.into(),
        }
    }
}

/// Result alias used across the navigation crates.
pub type Result<T> = std::result::Result<T, NavError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_declaration_message_names_panel() {
        let err = NavError::MissingIdentityDeclaration {
            id: PanelId::new("Inventory"),
        };
        assert!(err.to_string().contains("'Inventory'"));
    }

    #[test]
    fn test_violation_helper() {
        let err = NavError::violation(&PanelId::new("Hud"), 3, "listed twice");
        assert_eq!(
            err,
            NavError::StackConsistencyViolation {
                id: PanelId::new("Hud"),
                layer: 3,
                detail: "listed twice".to_string(),
            }
        );
        assert!(err.to_string().contains("layer 3"));
    }
}

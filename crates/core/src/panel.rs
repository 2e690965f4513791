//! Panel identity, stacking mode and the static declaration table.
//!
//! Every panel type is declared once at startup with its asset path, default
//! layer and stack mode. Lookups go through `DeclarationTable::resolve`, which
//! turns an undeclared identity into a loud `MissingIdentityDeclaration`.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::{NavError, Result};

/// Layer (sorting namespace) a panel is drawn in.
pub type LayerId = i32;

/// Stable symbolic key naming a panel type.
///
/// Cheap to clone; equality and hashing are by value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PanelId(Arc<str>);

impl PanelId {
    /// Create identity from any string-like value.
    pub fn new(id: impl AsRef<str>) -> Self {
        Self(Arc::from(id.as_ref()))
    }

    /// Identity as string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PanelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PanelId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for PanelId {
    fn from(id: String) -> Self {
        Self(Arc::from(id))
    }
}

/// Stacking discipline of a panel type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StackMode {
    /// Non-exclusive: shown on top without hiding anything.
    #[default]
    Overlay,
    /// Exclusive and restorable: hides the current top, which comes back on close.
    Push,
    /// Exclusive and temporary: superseded by the next Replace panel.
    Replace,
}

impl StackMode {
    /// Push and Replace panels take part in the navigation chain.
    pub fn is_exclusive(self) -> bool {
        !matches!(self, StackMode::Overlay)
    }

    pub fn to_str(self) -> &'static str {
        match self {
            StackMode::Overlay => "overlay",
            StackMode::Push => "push",
            StackMode::Replace => "replace",
        }
    }
}

impl fmt::Display for StackMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.to_str())
    }
}

impl std::str::FromStr for StackMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "overlay" | "show" | "standalone" => Ok(StackMode::Overlay),
            "push" => Ok(StackMode::Push),
            "replace" => Ok(StackMode::Replace),
            _ => Err(format!("Unknown stack mode: {}", s)),
        }
    }
}

/// Lifecycle of a panel instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LifecycleState {
    /// Never requested, or unloaded.
    Unloaded,
    /// Asynchronous load in flight.
    Loading,
    /// Loaded, never shown.
    Ready,
    Visible,
    Hidden,
    /// Visual object destroyed by an explicit unload.
    Destroyed,
}

impl LifecycleState {
    /// Whether the instance still has a live visual object.
    pub fn is_live(self) -> bool {
        matches!(
            self,
            LifecycleState::Ready | LifecycleState::Visible | LifecycleState::Hidden
        )
    }
}

/// Static declaration of a panel type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PanelDeclaration {
    pub id: PanelId,
    /// Asset path handed to the loader.
    pub path: String,
    /// Default layer assigned at load time.
    pub layer: LayerId,
    pub mode: StackMode,
}

impl PanelDeclaration {
    pub fn new(id: impl Into<PanelId>, path: impl Into<String>, layer: LayerId, mode: StackMode) -> Self {
        Self {
            id: id.into(),
            path: path.into(),
            layer,
            mode,
        }
    }
}

/// Registration table built at startup: identity → declaration.
#[derive(Debug, Clone, Default)]
pub struct DeclarationTable {
    entries: HashMap<PanelId, PanelDeclaration>,
}

impl DeclarationTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a declaration. Declaring an identity twice is a wiring defect.
    pub fn declare(&mut self, declaration: PanelDeclaration) -> Result<()> {
        if self.entries.contains_key(&declaration.id) {
            return Err(NavError::DuplicateDeclaration { id: declaration.id });
        }
        self.entries.insert(declaration.id.clone(), declaration);
        Ok(())
    }

    /// Builder-style `declare`.
    pub fn with(mut self, declaration: PanelDeclaration) -> Result<Self> {
        self.declare(declaration)?;
        Ok(self)
    }

    /// Look up a declaration, failing loudly when absent.
    pub fn resolve(&self, id: &PanelId) -> Result<&PanelDeclaration> {
        self.entries
            .get(id)
            .ok_or_else(|| NavError::MissingIdentityDeclaration { id: id.clone() })
    }

    pub fn contains(&self, id: &PanelId) -> bool {
        self.entries.contains_key(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &PanelDeclaration> {
        self.entries.values()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<PanelDeclaration> for DeclarationTable {
    /// Later duplicates are ignored; use `declare` to detect them.
    fn from_iter<I: IntoIterator<Item = PanelDeclaration>>(iter: I) -> Self {
        let mut table = Self::new();
        for declaration in iter {
            table
                .entries
                .entry(declaration.id.clone())
                .or_insert(declaration);
        }
        table
    }
}

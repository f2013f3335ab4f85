//! Error types for layout, registry and persistence operations.
//!
//! None of these are fatal: a rejected request leaves the tree exactly as it
//! was before the call.

use berth_core::{ItemId, PanelId};

/// A structural request that was rejected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LayoutError {
    #[error("anchor panel {0} is not docked in this layout")]
    AnchorNotFound(PanelId),

    #[error("panel {0} is not docked")]
    PanelNotFound(PanelId),

    #[error("item {0} is not in this layout")]
    ItemNotFound(ItemId),

    #[error("panel {0} is already docked")]
    AlreadyDocked(PanelId),

    /// Tabbing needs an existing item to stack onto.
    #[error("a tab needs an anchor panel to stack onto")]
    OnTopWithoutAnchor,

    #[error("panel {0} cannot be placed relative to itself")]
    SelfAnchor(PanelId),

    #[error("layout is empty")]
    EmptyLayout,

    #[error("no separator {index} in container {container:?}")]
    SeparatorNotFound { container: Vec<usize>, index: usize },

    #[error("window not found: {0}")]
    WindowNotFound(String),

    #[error("window already exists: {0}")]
    DuplicateWindow(String),

    #[error("panel {0} is not registered")]
    UnregisteredPanel(PanelId),

    /// Configuration changes are only accepted before anything is docked.
    #[error("layout configuration can only change while no panel is docked")]
    ConfigLocked,
}

/// Failure to save or restore a layout. Restoring never installs a partial
/// tree: on any of these the previous layout stays active.
#[derive(Debug, thiserror::Error)]
pub enum PersistError {
    #[error("malformed layout data: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("unsupported layout version {0}")]
    UnsupportedVersion(u32),

    #[error("unknown panel: {0}")]
    UnknownPanel(String),

    #[error("panel {0} has no registered name")]
    UnnamedPanel(PanelId),

    #[error("panel listed more than once: {0}")]
    DuplicatePanel(String),

    #[error("invalid orientation: {0:?}")]
    InvalidOrientation(String),

    #[error("invalid weight: {0} (must be positive)")]
    InvalidWeight(f64),

    #[error("container needs at least two children, found {0}")]
    TooFewChildren(usize),

    #[error("item has no panels")]
    EmptyItem,

    #[error("current tab {current} out of range for {count} panel(s)")]
    CurrentOutOfRange { current: usize, count: usize },

    #[error("invalid window kind: {0:?}")]
    InvalidWindowKind(String),

    #[error("window listed more than once: {0}")]
    DuplicateWindow(String),

    #[error("invalid geometry for window {0}")]
    InvalidGeometry(String),
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    #[error("panel name already registered: {0}")]
    DuplicateName(String),

    #[error("panel {0} is not registered")]
    UnknownPanel(PanelId),
}

// Multi-splitter layout engine: an n-ary tree of weighted containers whose
// leaves are items holding docked panels.

mod error;
mod node;
mod registry;
mod saver;
mod workspace;

use std::fmt;

use berth_core::{
    DropTarget, GeometrySink, ItemId, LayoutConfig, Location, Orientation, PanelHandle, PanelId,
    Point, Rect, Size,
};

pub use error::{LayoutError, PersistError, RegistryError};
pub use node::{Child, Container, Item, Node, Separator};
pub use registry::{DockRegistry, PanelEntry};
pub use saver::{SavedChild, SavedLayout, SavedNode, SavedRect, SavedWindow, LAYOUT_VERSION};
pub use workspace::{DockWindow, WindowKind, Workspace};

use node::LayoutPass;

// ──────────────────────────────────────────────
// Reporting types
// ──────────────────────────────────────────────

/// A container could not give its children their minimum extent along
/// `orientation`. The children were clamped to their minimums anyway.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConstraintViolation {
    pub orientation: Orientation,
    pub required: i32,
    pub available: i32,
}

impl ConstraintViolation {
    pub fn deficit(&self) -> i32 {
        self.required - self.available
    }
}

/// Address of a separator: child-index path from the root to its container,
/// plus its index inside that container.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SeparatorId {
    pub container: Vec<usize>,
    pub index: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeparatorInfo {
    pub id: SeparatorId,
    pub rect: Rect,
    /// Orientation of the owning container; a horizontal container has
    /// vertical separator bars that move along x.
    pub orientation: Orientation,
    pub dragging: bool,
}

// ──────────────────────────────────────────────
// MultiSplitter
// ──────────────────────────────────────────────

pub struct MultiSplitter {
    pub(crate) root: Option<Node>,
    config: LayoutConfig,
    /// Rect of the last layout pass; `None` until the host assigns one.
    rect: Option<Rect>,
    violations: Vec<ConstraintViolation>,
    sink: Option<Box<dyn GeometrySink>>,
}

impl MultiSplitter {
    pub fn new(config: LayoutConfig) -> Self {
        Self {
            root: None,
            config,
            rect: None,
            violations: Vec::new(),
            sink: None,
        }
    }

    pub fn set_geometry_sink(&mut self, sink: Box<dyn GeometrySink>) {
        self.sink = Some(sink);
    }

    pub fn take_geometry_sink(&mut self) -> Option<Box<dyn GeometrySink>> {
        self.sink.take()
    }

    pub fn config(&self) -> &LayoutConfig {
        &self.config
    }

    /// Change tunables. Only allowed while nothing is docked.
    pub fn set_config(&mut self, config: LayoutConfig) -> Result<(), LayoutError> {
        if !self.is_empty() {
            log::warn!("Layout configuration can only change before panels are docked");
            return Err(LayoutError::ConfigLocked);
        }
        self.config = config;
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    pub fn root(&self) -> Option<&Node> {
        self.root.as_ref()
    }

    pub fn rect(&self) -> Option<Rect> {
        self.rect
    }

    /// Violations found by the most recent full layout pass.
    pub fn constraint_violations(&self) -> &[ConstraintViolation] {
        &self.violations
    }

    /// Get all panel ids in the layout, tabs included.
    pub fn panel_ids(&self) -> Vec<PanelId> {
        let mut ids = Vec::new();
        if let Some(ref root) = self.root {
            root.panel_ids(&mut ids);
        }
        ids
    }

    pub fn items(&self) -> Vec<&Item> {
        let mut out = Vec::new();
        if let Some(ref root) = self.root {
            root.items(&mut out);
        }
        out
    }

    pub fn contains_panel(&self, panel: PanelId) -> bool {
        self.root.as_ref().is_some_and(|r| r.contains_panel(panel))
    }

    pub fn item_for_panel(&self, panel: PanelId) -> Option<&Item> {
        let path = self.find_panel(panel)?;
        self.root.as_ref()?.node_at(&path)?.as_item()
    }

    /// Smallest rect the whole layout fits in without violations.
    pub fn min_size(&self) -> Size {
        self.root
            .as_ref()
            .map(|r| r.min_size(self.config.separator_thickness))
            .unwrap_or(Size::ZERO)
    }

    /// Deepest item under `point`, or `None` outside the layout or on a
    /// separator.
    pub fn item_at(&self, point: Point) -> Option<&Item> {
        self.root.as_ref()?.item_at(point)
    }

    // ── Geometry ────────────────────────────────

    /// Assign the layout's rect and recompute every item's geometry top-down.
    pub fn set_geometry(&mut self, rect: Rect) -> &[ConstraintViolation] {
        self.rect = Some(rect);
        self.relayout();
        &self.violations
    }

    fn relayout(&mut self) {
        let (Some(rect), Some(root)) = (self.rect, self.root.as_mut()) else {
            self.violations.clear();
            return;
        };
        let mut pass = LayoutPass {
            thickness: self.config.separator_thickness,
            sink: self.sink.as_deref_mut(),
            violations: Vec::new(),
        };
        root.set_geometry(rect, &mut pass);
        log::debug!(
            "Laid out {}x{} at ({}, {}): {} violation(s)",
            rect.width,
            rect.height,
            rect.x,
            rect.y,
            pass.violations.len()
        );
        self.violations = pass.violations;
    }

    // ── Structural mutation ─────────────────────

    /// Dock a panel relative to `anchor`, or at the outer edge of the layout
    /// when `anchor` is `None`. Returns the id of the item holding it.
    pub fn insert(
        &mut self,
        panel: PanelHandle,
        anchor: Option<PanelId>,
        location: Location,
    ) -> Result<ItemId, LayoutError> {
        self.insert_item(Item::new(panel), anchor, location)
    }

    /// Dock an existing item (for example one returned by [`remove`]).
    /// With `Location::OnTop` its panels join the anchor's tab group.
    ///
    /// [`remove`]: MultiSplitter::remove
    pub fn insert_item(
        &mut self,
        item: Item,
        anchor: Option<PanelId>,
        location: Location,
    ) -> Result<ItemId, LayoutError> {
        let id = self.insert_structural(item, anchor, location)?;
        self.relayout();
        Ok(id)
    }

    /// Undock a panel. A tab leaves its group; a lone panel takes its item
    /// with it and single-child containers collapse. Returns the detached
    /// item, ready to be inserted elsewhere.
    pub fn remove(&mut self, panel: PanelId) -> Result<Item, LayoutError> {
        let item = self.remove_structural(panel)?;
        self.relayout();
        Ok(item)
    }

    /// Remove a whole item, every tab included.
    pub fn remove_item(&mut self, item: ItemId) -> Result<Item, LayoutError> {
        let panel = self
            .items()
            .into_iter()
            .find(|i| i.id() == item)
            .map(|i| i.current_panel())
            .ok_or(LayoutError::ItemNotFound(item))?;
        let path = self.find_panel(panel).ok_or(LayoutError::ItemNotFound(item))?;
        let node = self.detach(&path)?;
        self.relayout();
        match node {
            Node::Item(item) => Ok(item),
            Node::Container(_) => Err(LayoutError::ItemNotFound(item)),
        }
    }

    /// Move a docked panel to `target` as one step: either both the removal
    /// and the insertion happen, or the tree is left untouched.
    pub fn reposition(&mut self, panel: PanelId, target: DropTarget) -> Result<(), LayoutError> {
        let (anchor, location) = split_target(target);
        if anchor == Some(panel) {
            return Err(LayoutError::SelfAnchor(panel));
        }
        let mut staged = self.detached();
        let item = staged.remove_structural(panel)?;
        staged.insert_structural(item, anchor, location)?;
        self.adopt(staged);
        log::debug!("Repositioned panel {} to {:?}", panel, target);
        Ok(())
    }

    /// Make `panel` the current tab of its item.
    pub fn activate_panel(&mut self, panel: PanelId) -> Result<(), LayoutError> {
        let item = self.item_mut(panel)?;
        item.set_current(panel);
        let rect = item.geometry();
        if let Some(sink) = self.sink.as_mut() {
            sink.apply_geometry(panel, rect);
        }
        Ok(())
    }

    pub fn set_panel_visible(&mut self, panel: PanelId, visible: bool) -> Result<(), LayoutError> {
        self.item_mut(panel)?.set_visible(visible);
        Ok(())
    }

    /// Rect `panel` would get if dropped on `target`, computed on a detached
    /// copy of the tree.
    pub fn simulate_drop(&self, panel: PanelHandle, target: DropTarget) -> Option<Rect> {
        let rect = self.rect?;
        let mut sim = self.detached();
        if sim.contains_panel(panel.id) {
            sim.reposition(panel.id, target).ok()?;
        } else {
            let (anchor, location) = split_target(target);
            sim.insert_structural(Item::new(panel), anchor, location).ok()?;
        }
        sim.set_geometry(rect);
        sim.item_for_panel(panel.id).map(|i| i.geometry())
    }

    pub(crate) fn insert_structural(
        &mut self,
        item: Item,
        anchor: Option<PanelId>,
        location: Location,
    ) -> Result<ItemId, LayoutError> {
        if let Some(docked) = item.panel_ids().find(|p| self.contains_panel(*p)) {
            return Err(LayoutError::AlreadyDocked(docked));
        }
        let id = item.id();

        let Some(anchor) = anchor else {
            self.insert_at_root(item, location)?;
            self.clear_separator_drags();
            return Ok(id);
        };
        let path = self
            .find_panel(anchor)
            .ok_or(LayoutError::AnchorNotFound(anchor))?;

        let Some(orientation) = location.orientation() else {
            let Some(Node::Item(target)) = self.root.as_mut().and_then(|r| r.node_at_mut(&path))
            else {
                return Err(LayoutError::AnchorNotFound(anchor));
            };
            target.merge_tabs(item);
            let target_id = target.id();
            log::debug!("Tabbed item {} onto panel {}", id, anchor);
            return Ok(target_id);
        };
        let leading = location.is_leading();

        match path.split_last() {
            None => {
                let existing = self.root.take().ok_or(LayoutError::AnchorNotFound(anchor))?;
                self.root = Some(Node::Container(Container::pair(
                    orientation,
                    existing,
                    Node::Item(item),
                    leading,
                )));
            }
            Some((&index, parent_path)) => {
                let parent = self
                    .container_mut(parent_path)
                    .ok_or(LayoutError::AnchorNotFound(anchor))?;
                if parent.orientation() == orientation {
                    parent.insert_beside(index, Node::Item(item), leading);
                } else {
                    parent.split_child(index, orientation, Node::Item(item), leading);
                }
            }
        }
        self.clear_separator_drags();
        log::debug!("Inserted item {} {:?} of panel {}", id, location, anchor);
        Ok(id)
    }

    fn insert_at_root(&mut self, item: Item, location: Location) -> Result<(), LayoutError> {
        let Some(existing) = self.root.take() else {
            self.root = Some(Node::Item(item));
            return Ok(());
        };
        let Some(orientation) = location.orientation() else {
            self.root = Some(existing);
            return Err(LayoutError::OnTopWithoutAnchor);
        };
        let leading = location.is_leading();
        self.root = Some(match existing {
            Node::Container(mut c) if c.orientation() == orientation => {
                c.insert_at_edge(Node::Item(item), leading);
                Node::Container(c)
            }
            other => Node::Container(Container::pair(orientation, other, Node::Item(item), leading)),
        });
        Ok(())
    }

    pub(crate) fn remove_structural(&mut self, panel: PanelId) -> Result<Item, LayoutError> {
        let path = self.find_panel(panel).ok_or(LayoutError::PanelNotFound(panel))?;
        let item = self.item_mut(panel)?;
        if let Some(handle) = item.take_tab(panel) {
            log::debug!("Removed tab {} from item {}", panel, item.id());
            return Ok(Item::new(handle));
        }
        match self.detach(&path)? {
            Node::Item(item) => Ok(item),
            Node::Container(_) => Err(LayoutError::PanelNotFound(panel)),
        }
    }

    /// Unlink the node at `path`, collapsing a parent left with one child
    /// into its own slot.
    fn detach(&mut self, path: &[usize]) -> Result<Node, LayoutError> {
        let Some((&index, parent_path)) = path.split_last() else {
            return self.root.take().ok_or(LayoutError::EmptyLayout);
        };
        self.clear_separator_drags();
        let parent = self.container_mut(parent_path).ok_or(LayoutError::EmptyLayout)?;
        let detached = parent.remove_child(index);
        let Some(only) = parent.take_only_child() else {
            return Ok(detached);
        };

        match parent_path.split_last() {
            None => self.root = Some(only),
            Some((&parent_index, grand_path)) => {
                let grand = self.container_mut(grand_path).ok_or(LayoutError::EmptyLayout)?;
                grand.replace_child(parent_index, only);
            }
        }
        log::debug!("Collapsed single-child container at {:?}", parent_path);
        Ok(detached)
    }

    // ── Separators ──────────────────────────────

    pub fn separators(&self) -> Vec<SeparatorInfo> {
        let mut out = Vec::new();
        if let Some(ref root) = self.root {
            root.collect_separators(self.config.separator_thickness, &mut Vec::new(), &mut out);
        }
        out
    }

    pub fn separator(&self, id: &SeparatorId) -> Option<SeparatorInfo> {
        self.separators().into_iter().find(|s| &s.id == id)
    }

    /// Closest separator within the hit tolerance of `point`.
    pub fn separator_at(&self, point: Point) -> Option<SeparatorId> {
        let tolerance = self.config.separator_hit_tolerance;
        let mut best: Option<(i32, SeparatorId)> = None;
        for sep in self.separators() {
            let o = sep.orientation;
            let along = point.coord(o);
            let across = point.coord(o.other());
            let cross_start = sep.rect.start(o.other());
            if across < cross_start || across >= cross_start + sep.rect.cross_extent(o) {
                continue;
            }
            let start = sep.rect.start(o);
            let end = start + sep.rect.extent(o);
            let dist = if along < start {
                start - along
            } else if along >= end {
                along - end + 1
            } else {
                0
            };
            if dist <= tolerance && best.as_ref().map_or(true, |(d, _)| dist < *d) {
                best = Some((dist, sep.id));
            }
        }
        best.map(|(_, id)| id)
    }

    /// Move a separator by `delta` pixels, clamped so neither neighbour
    /// drops below its minimum. Only the owning container is re-laid out.
    pub fn move_separator(&mut self, id: &SeparatorId, delta: i32) -> Result<i32, LayoutError> {
        let thickness = self.config.separator_thickness;
        let container = Self::separator_container(&mut self.root, id)?;
        let mut pass = LayoutPass {
            thickness,
            sink: self.sink.as_deref_mut(),
            violations: Vec::new(),
        };
        Ok(container.move_separator(id.index, delta, &mut pass))
    }

    pub fn begin_separator_drag(&mut self, id: &SeparatorId) -> Result<(), LayoutError> {
        let container = Self::separator_container(&mut self.root, id)?;
        if let Some(sep) = container.separator_mut(id.index) {
            sep.begin_drag();
        }
        Ok(())
    }

    /// Drag step. Applies immediately, or with lazy resize only moves the
    /// separator's preview. Returns the delta actually taken.
    pub fn drag_separator(&mut self, id: &SeparatorId, delta: i32) -> Result<i32, LayoutError> {
        if !self.config.lazy_resize {
            return self.move_separator(id, delta);
        }
        let thickness = self.config.separator_thickness;
        let container = Self::separator_container(&mut self.root, id)?;
        let pending = container
            .separators()
            .get(id.index)
            .map(|s| s.pending())
            .unwrap_or(0);
        let clamped = container.clamp_separator_delta(id.index, pending + delta, thickness);
        if let Some(sep) = container.separator_mut(id.index) {
            sep.set_pending(clamped);
        }
        Ok(clamped - pending)
    }

    /// Finish a drag, committing any deferred delta. Returns the committed
    /// delta (always zero without lazy resize).
    pub fn end_separator_drag(&mut self, id: &SeparatorId) -> Result<i32, LayoutError> {
        let container = Self::separator_container(&mut self.root, id)?;
        let pending = container
            .separator_mut(id.index)
            .map(|s| s.finish_drag())
            .unwrap_or(0);
        if pending == 0 {
            return Ok(0);
        }
        self.move_separator(id, pending)
    }

    fn separator_container<'a>(
        root: &'a mut Option<Node>,
        id: &SeparatorId,
    ) -> Result<&'a mut Container, LayoutError> {
        let not_found = || LayoutError::SeparatorNotFound {
            container: id.container.clone(),
            index: id.index,
        };
        match root.as_mut().and_then(|r| r.node_at_mut(&id.container)) {
            Some(Node::Container(c)) if id.index + 1 < c.len() => Ok(c),
            _ => Err(not_found()),
        }
    }

    // ── Helpers ─────────────────────────────────

    fn find_panel(&self, panel: PanelId) -> Option<Vec<usize>> {
        let mut path = Vec::new();
        self.root
            .as_ref()?
            .find_panel(panel, &mut path)
            .then_some(path)
    }

    fn item_mut(&mut self, panel: PanelId) -> Result<&mut Item, LayoutError> {
        let path = self.find_panel(panel).ok_or(LayoutError::PanelNotFound(panel))?;
        match self.root.as_mut().and_then(|r| r.node_at_mut(&path)) {
            Some(Node::Item(item)) => Ok(item),
            _ => Err(LayoutError::PanelNotFound(panel)),
        }
    }

    /// Separator ids are positional, so a shape change ends any drag.
    fn clear_separator_drags(&mut self) {
        if let Some(Node::Container(c)) = self.root.as_mut() {
            c.clear_separator_drags();
        }
    }

    fn container_mut(&mut self, path: &[usize]) -> Option<&mut Container> {
        match self.root.as_mut()?.node_at_mut(path)? {
            Node::Container(c) => Some(c),
            Node::Item(_) => None,
        }
    }

    /// Copy of the tree without the host callback, for staging and previews.
    pub(crate) fn detached(&self) -> MultiSplitter {
        MultiSplitter {
            root: self.root.clone(),
            config: self.config,
            rect: self.rect,
            violations: Vec::new(),
            sink: None,
        }
    }

    /// Take over a staged tree and lay it out with our own callback.
    pub(crate) fn adopt(&mut self, staged: MultiSplitter) {
        self.root = staged.root;
        self.relayout();
    }
}

impl Default for MultiSplitter {
    fn default() -> Self {
        Self::new(LayoutConfig::default())
    }
}

impl fmt::Debug for MultiSplitter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MultiSplitter")
            .field("root", &self.root)
            .field("config", &self.config)
            .field("rect", &self.rect)
            .field("violations", &self.violations)
            .finish_non_exhaustive()
    }
}

pub(crate) fn split_target(target: DropTarget) -> (Option<PanelId>, Location) {
    match target {
        DropTarget::Panel(anchor, location) => (Some(anchor), location),
        DropTarget::Root(location) => (None, location),
    }
}

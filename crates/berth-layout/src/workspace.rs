// Workspace: the set of top-level windows, each owning one layout tree.
// Floating windows are created on demand and dropped once emptied.

use std::cell::RefCell;
use std::rc::Rc;

use berth_core::{
    DropTarget, GeometrySink, ItemId, LayoutConfig, Location, PanelHandle, PanelId, Point, Rect,
};

use crate::{split_target, ConstraintViolation, Item, LayoutError, MultiSplitter, SeparatorId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowKind {
    Main,
    Floating,
}

impl WindowKind {
    pub fn name(self) -> &'static str {
        match self {
            WindowKind::Main => "main",
            WindowKind::Floating => "floating",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "main" => Some(WindowKind::Main),
            "floating" => Some(WindowKind::Floating),
            _ => None,
        }
    }
}

#[derive(Debug)]
pub struct DockWindow {
    name: String,
    kind: WindowKind,
    geometry: Rect,
    layout: MultiSplitter,
}

impl DockWindow {
    pub(crate) fn new(name: String, kind: WindowKind, geometry: Rect, layout: MultiSplitter) -> Self {
        Self {
            name,
            kind,
            geometry,
            layout,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> WindowKind {
        self.kind
    }

    pub fn geometry(&self) -> Rect {
        self.geometry
    }

    pub fn layout(&self) -> &MultiSplitter {
        &self.layout
    }

    pub(crate) fn layout_mut(&mut self) -> &mut MultiSplitter {
        &mut self.layout
    }
}

pub struct Workspace {
    /// Main windows first, then floating windows in stacking order.
    windows: Vec<DockWindow>,
    config: LayoutConfig,
    sink: Option<Rc<RefCell<dyn GeometrySink>>>,
    next_floating: u32,
}

impl Workspace {
    pub fn new(config: LayoutConfig) -> Self {
        Self {
            windows: Vec::new(),
            config,
            sink: None,
            next_floating: 1,
        }
    }

    /// Route placements from every window, present and future, to `sink`.
    pub fn set_geometry_sink(&mut self, sink: Rc<RefCell<dyn GeometrySink>>) {
        for window in &mut self.windows {
            window.layout.set_geometry_sink(Box::new(sink.clone()));
        }
        self.sink = Some(sink);
    }

    pub fn config(&self) -> &LayoutConfig {
        &self.config
    }

    /// Change tunables for every window. Rejected once any panel is docked.
    pub fn set_config(&mut self, config: LayoutConfig) -> Result<(), LayoutError> {
        if self.windows.iter().any(|w| !w.layout.is_empty()) {
            log::warn!("Only change the layout configuration before docking panels");
            return Err(LayoutError::ConfigLocked);
        }
        for window in &mut self.windows {
            window.layout.set_config(config)?;
        }
        self.config = config;
        Ok(())
    }

    pub fn windows(&self) -> &[DockWindow] {
        &self.windows
    }

    pub fn window(&self, name: &str) -> Option<&DockWindow> {
        self.windows.iter().find(|w| w.name == name)
    }

    pub(crate) fn window_mut(&mut self, name: &str) -> Option<&mut DockWindow> {
        self.windows.iter_mut().find(|w| w.name == name)
    }

    /// Topmost window under `point`: floating windows first, newest on top.
    pub fn window_at(&self, point: Point) -> Option<&DockWindow> {
        self.windows.iter().rev().find(|w| w.geometry.contains(point))
    }

    /// Name of the window a panel is docked in.
    pub fn locate_panel(&self, panel: PanelId) -> Option<&str> {
        self.windows
            .iter()
            .find(|w| w.layout.contains_panel(panel))
            .map(|w| w.name.as_str())
    }

    pub fn add_main_window(&mut self, name: &str, geometry: Rect) -> Result<(), LayoutError> {
        if self.window(name).is_some() {
            return Err(LayoutError::DuplicateWindow(name.to_string()));
        }
        let window = self.make_window(name.to_string(), WindowKind::Main, geometry);
        let at = self
            .windows
            .iter()
            .position(|w| w.kind == WindowKind::Floating)
            .unwrap_or(self.windows.len());
        self.windows.insert(at, window);
        log::debug!("Added main window {}", name);
        Ok(())
    }

    /// Dock a panel into a window, relative to another panel or at the
    /// window's outer edge.
    pub fn add_panel(
        &mut self,
        window: &str,
        panel: PanelHandle,
        location: Location,
        relative_to: Option<PanelId>,
    ) -> Result<ItemId, LayoutError> {
        if self.locate_panel(panel.id).is_some() {
            return Err(LayoutError::AlreadyDocked(panel.id));
        }
        self.layout_mut(window)?.insert(panel, relative_to, location)
    }

    /// Stack a panel onto the first item of a window, or fill an empty one.
    pub fn add_panel_as_tab(&mut self, window: &str, panel: PanelHandle) -> Result<ItemId, LayoutError> {
        if self.locate_panel(panel.id).is_some() {
            return Err(LayoutError::AlreadyDocked(panel.id));
        }
        let layout = self.layout_mut(window)?;
        let anchor = layout.items().first().map(|i| i.current_panel());
        layout.insert(panel, anchor, Location::OnTop)
    }

    /// Undock a panel (if docked) and put it alone in a new floating window.
    /// Returns the new window's name.
    pub fn float_panel(&mut self, panel: PanelHandle, geometry: Rect) -> Result<String, LayoutError> {
        let item = match self.locate_panel(panel.id).map(str::to_string) {
            Some(source) => self.layout_mut(&source)?.remove(panel.id)?,
            None => Item::new(panel),
        };

        let name = self.next_floating_name();
        let mut window = self.make_window(name.clone(), WindowKind::Floating, geometry);
        window.layout.insert_item(item, None, Location::OnTop)?;
        self.windows.push(window);
        self.drop_empty_floating();
        log::debug!("Floated panel {} into {}", panel.id, name);
        Ok(name)
    }

    /// Undock a panel wherever it is.
    pub fn close_panel(&mut self, panel: PanelId) -> Result<Item, LayoutError> {
        let source = self
            .locate_panel(panel)
            .map(str::to_string)
            .ok_or(LayoutError::PanelNotFound(panel))?;
        let item = self.layout_mut(&source)?.remove(panel)?;
        self.drop_empty_floating();
        Ok(item)
    }

    /// Move a panel to `target` inside `window`, docking it if it was not
    /// docked anywhere. Across windows both trees are staged first, so a
    /// failure leaves every window unchanged.
    pub fn move_panel(
        &mut self,
        panel: PanelHandle,
        window: &str,
        target: DropTarget,
    ) -> Result<(), LayoutError> {
        let dest = self
            .index_of(window)
            .ok_or_else(|| LayoutError::WindowNotFound(window.to_string()))?;
        let source = self.windows.iter().position(|w| w.layout.contains_panel(panel.id));

        if source == Some(dest) {
            self.windows[dest].layout.reposition(panel.id, target)?;
            self.drop_empty_floating();
            return Ok(());
        }

        let (anchor, location) = split_target(target);
        let mut staged_dest = self.windows[dest].layout.detached();
        let staged_source = match source {
            Some(index) => {
                let mut staged = self.windows[index].layout.detached();
                let item = staged.remove_structural(panel.id)?;
                staged_dest.insert_structural(item, anchor, location)?;
                Some((index, staged))
            }
            None => {
                staged_dest.insert_structural(Item::new(panel), anchor, location)?;
                None
            }
        };

        if let Some((index, staged)) = staged_source {
            self.windows[index].layout.adopt(staged);
        }
        self.windows[dest].layout.adopt(staged_dest);
        self.drop_empty_floating();
        log::debug!("Moved panel {} into window {}", panel.id, window);
        Ok(())
    }

    /// Assign a window's rect and lay out its tree.
    pub fn resize_window(
        &mut self,
        name: &str,
        geometry: Rect,
    ) -> Result<Vec<ConstraintViolation>, LayoutError> {
        let window = self
            .window_mut(name)
            .ok_or_else(|| LayoutError::WindowNotFound(name.to_string()))?;
        window.geometry = geometry;
        Ok(window.layout.set_geometry(geometry).to_vec())
    }

    // ── Panels and separators in place ──────────

    /// Make `panel` the current tab of its item, in whichever window.
    pub fn activate_panel(&mut self, panel: PanelId) -> Result<(), LayoutError> {
        self.layout_of_panel(panel)?.activate_panel(panel)
    }

    pub fn set_panel_visible(&mut self, panel: PanelId, visible: bool) -> Result<(), LayoutError> {
        self.layout_of_panel(panel)?.set_panel_visible(panel, visible)
    }

    pub fn move_separator(
        &mut self,
        window: &str,
        id: &SeparatorId,
        delta: i32,
    ) -> Result<i32, LayoutError> {
        self.layout_mut(window)?.move_separator(id, delta)
    }

    pub fn begin_separator_drag(&mut self, window: &str, id: &SeparatorId) -> Result<(), LayoutError> {
        self.layout_mut(window)?.begin_separator_drag(id)
    }

    pub fn drag_separator(
        &mut self,
        window: &str,
        id: &SeparatorId,
        delta: i32,
    ) -> Result<i32, LayoutError> {
        self.layout_mut(window)?.drag_separator(id, delta)
    }

    pub fn end_separator_drag(&mut self, window: &str, id: &SeparatorId) -> Result<i32, LayoutError> {
        self.layout_mut(window)?.end_separator_drag(id)
    }

    /// Crate-only: all docking goes through the workspace so a panel is
    /// docked in at most one window.
    pub(crate) fn layout_mut(&mut self, window: &str) -> Result<&mut MultiSplitter, LayoutError> {
        self.window_mut(window)
            .map(|w| &mut w.layout)
            .ok_or_else(|| LayoutError::WindowNotFound(window.to_string()))
    }

    // ── Helpers ─────────────────────────────────

    fn layout_of_panel(&mut self, panel: PanelId) -> Result<&mut MultiSplitter, LayoutError> {
        self.windows
            .iter_mut()
            .map(|w| &mut w.layout)
            .find(|layout| layout.contains_panel(panel))
            .ok_or(LayoutError::PanelNotFound(panel))
    }

    fn index_of(&self, name: &str) -> Option<usize> {
        self.windows.iter().position(|w| w.name == name)
    }

    pub(crate) fn make_window(&self, name: String, kind: WindowKind, geometry: Rect) -> DockWindow {
        let mut layout = MultiSplitter::new(self.config);
        if let Some(ref sink) = self.sink {
            layout.set_geometry_sink(Box::new(sink.clone()));
        }
        layout.set_geometry(geometry);
        DockWindow::new(name, kind, geometry, layout)
    }

    fn next_floating_name(&mut self) -> String {
        loop {
            let name = format!("floating-{}", self.next_floating);
            self.next_floating += 1;
            if self.window(&name).is_none() {
                return name;
            }
        }
    }

    fn drop_empty_floating(&mut self) {
        self.windows.retain(|w| {
            let keep = w.kind == WindowKind::Main || !w.layout.is_empty();
            if !keep {
                log::debug!("Closing empty floating window {}", w.name);
            }
            keep
        });
    }

    pub(crate) fn replace_windows(&mut self, windows: Vec<DockWindow>) {
        self.windows = windows;
    }
}

impl Default for Workspace {
    fn default() -> Self {
        Self::new(LayoutConfig::default())
    }
}

// Input routing for docking.
// Turns pointer and key events into panel drag-and-drop gestures and
// separator drags against a Workspace.

use berth_core::{
    DropTarget, InputEvent, Key, Location, Orientation, PanelDirectory, PanelHandle, PanelId,
    Point, Rect,
};
use berth_layout::{LayoutError, MultiSplitter, SeparatorId, Workspace};

// ──────────────────────────────────────────────
// Drop hints
// ──────────────────────────────────────────────

/// Where a dragged panel would land if released now.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DropHint {
    pub window: String,
    pub target: DropTarget,
    /// Rect the panel would occupy after the drop.
    pub preview: Option<Rect>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DragOutcome {
    Dropped(DropHint),
    Cancelled,
}

/// Decides whether `panel` may be stacked as a tab onto an item holding
/// `onto`.
pub type TabPolicy = Box<dyn Fn(PanelId, &[PanelId]) -> bool>;

// ──────────────────────────────────────────────
// Panel drag state machine
// ──────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct DragSession {
    panel: PanelHandle,
    source_window: Option<String>,
    pointer: Point,
    hint: Option<DropHint>,
}

impl DragSession {
    pub fn panel(&self) -> PanelId {
        self.panel.id
    }

    /// Window the panel was docked in when the drag began.
    pub fn source_window(&self) -> Option<&str> {
        self.source_window.as_deref()
    }

    pub fn pointer(&self) -> Point {
        self.pointer
    }

    pub fn hint(&self) -> Option<&DropHint> {
        self.hint.as_ref()
    }
}

#[derive(Debug, Clone)]
pub enum DragState {
    Idle,
    Dragging(DragSession),
}

pub struct DragController {
    state: DragState,
    tab_policy: Option<TabPolicy>,
}

impl DragController {
    pub fn new() -> Self {
        Self {
            state: DragState::Idle,
            tab_policy: None,
        }
    }

    /// Veto centre (tab) drops with a predicate.
    pub fn with_tab_policy(policy: impl Fn(PanelId, &[PanelId]) -> bool + 'static) -> Self {
        Self {
            state: DragState::Idle,
            tab_policy: Some(Box::new(policy)),
        }
    }

    pub fn state(&self) -> &DragState {
        &self.state
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self.state, DragState::Dragging(_))
    }

    pub fn hint(&self) -> Option<&DropHint> {
        match &self.state {
            DragState::Dragging(session) => session.hint(),
            DragState::Idle => None,
        }
    }

    /// Start dragging `panel`. A gesture already in progress is abandoned.
    pub fn begin(
        &mut self,
        panel: PanelId,
        pointer: Point,
        directory: &dyn PanelDirectory,
        workspace: &Workspace,
    ) -> Result<Option<&DropHint>, LayoutError> {
        let handle = directory
            .panel_handle(panel)
            .ok_or(LayoutError::UnregisteredPanel(panel))?;
        if self.is_dragging() {
            log::debug!("Abandoning drag in progress for panel {}", panel);
        }
        let hint = self.compute_hint(handle, pointer, workspace);
        self.state = DragState::Dragging(DragSession {
            panel: handle,
            source_window: workspace.locate_panel(panel).map(str::to_string),
            pointer,
            hint,
        });
        log::debug!("Drag started for panel {}", panel);
        Ok(self.hint())
    }

    /// Recompute the hint for a new pointer position.
    pub fn pointer_moved(&mut self, pointer: Point, workspace: &Workspace) -> Option<&DropHint> {
        let panel = match &self.state {
            DragState::Dragging(session) => session.panel,
            DragState::Idle => return None,
        };
        let hint = self.compute_hint(panel, pointer, workspace);
        if let DragState::Dragging(session) = &mut self.state {
            session.pointer = pointer;
            session.hint = hint;
        }
        self.hint()
    }

    /// Finish the gesture. Drops onto the hint under `pointer` with one
    /// atomic move; with no valid hint the tree is left alone.
    pub fn release(
        &mut self,
        pointer: Point,
        workspace: &mut Workspace,
    ) -> Result<DragOutcome, LayoutError> {
        let DragState::Dragging(session) = std::mem::replace(&mut self.state, DragState::Idle)
        else {
            return Ok(DragOutcome::Cancelled);
        };
        let Some(hint) = self.compute_hint(session.panel, pointer, workspace) else {
            log::debug!("Drag of panel {} released outside any target", session.panel.id);
            return Ok(DragOutcome::Cancelled);
        };
        workspace.move_panel(session.panel, &hint.window, hint.target)?;
        log::debug!("Dropped panel {} on {:?}", session.panel.id, hint.target);
        Ok(DragOutcome::Dropped(hint))
    }

    /// Abandon the gesture. Returns false if nothing was being dragged.
    pub fn cancel(&mut self) -> bool {
        let was = self.is_dragging();
        self.state = DragState::Idle;
        if was {
            log::debug!("Drag cancelled");
        }
        was
    }

    // ── Hint computation ────────────────────────

    fn compute_hint(&self, panel: PanelHandle, pointer: Point, workspace: &Workspace) -> Option<DropHint> {
        let window = workspace.window_at(pointer)?;
        let layout = window.layout();
        let name = window.name().to_string();

        if layout.is_empty() {
            let target = DropTarget::Root(Location::OnTop);
            return Some(DropHint {
                preview: layout.simulate_drop(panel, target),
                window: name,
                target,
            });
        }

        let item = layout.item_at(pointer)?;
        let rect = item.geometry();
        if rect.width <= 0 || rect.height <= 0 {
            return None;
        }
        let (edge, distance) = nearest_edge(rect, pointer);
        let config = layout.config();
        let location = if distance < config.drop_band {
            edge
        } else {
            Location::OnTop
        };

        let own = item.contains_panel(panel.id);
        if own && (!item.is_tabbed() || location == Location::OnTop) {
            return None;
        }
        if location == Location::OnTop {
            let panels: Vec<PanelId> = item.panel_ids().collect();
            if let Some(ref allowed) = self.tab_policy {
                if !allowed(panel.id, &panels) {
                    return None;
                }
            }
        }

        let outer = distance < config.outer_band
            && location != Location::OnTop
            && touches_edge(rect, layout.rect()?, location)
            && !source_spans_edge(layout, panel.id, location);
        let target = if outer {
            DropTarget::Root(location)
        } else {
            let anchor = item.panel_ids().find(|p| *p != panel.id)?;
            DropTarget::Panel(anchor, location)
        };

        Some(DropHint {
            preview: layout.simulate_drop(panel, target),
            window: name,
            target,
        })
    }
}

impl Default for DragController {
    fn default() -> Self {
        Self::new()
    }
}

/// Closest edge of `rect` to `pointer` and the distance to it as a fraction
/// of the rect's extent. Ties go to left, right, top, bottom in that order.
fn nearest_edge(rect: Rect, pointer: Point) -> (Location, f32) {
    let rel_x = (pointer.x - rect.x) as f32 / rect.width as f32;
    let rel_y = (pointer.y - rect.y) as f32 / rect.height as f32;
    [
        (Location::Left, rel_x),
        (Location::Right, 1.0 - rel_x),
        (Location::Top, rel_y),
        (Location::Bottom, 1.0 - rel_y),
    ]
    .into_iter()
    .fold((Location::OnTop, f32::INFINITY), |best, (edge, d)| {
        if d < best.1 {
            (edge, d)
        } else {
            best
        }
    })
}

fn touches_edge(rect: Rect, area: Rect, location: Location) -> bool {
    match location {
        Location::Left => rect.x <= area.x,
        Location::Right => rect.right() >= area.right(),
        Location::Top => rect.y <= area.y,
        Location::Bottom => rect.bottom() >= area.bottom(),
        Location::OnTop => false,
    }
}

/// A window-level drop is pointless when the dragged panel already sits
/// alone along that entire edge.
fn source_spans_edge(layout: &MultiSplitter, panel: PanelId, location: Location) -> bool {
    let (Some(item), Some(area)) = (layout.item_for_panel(panel), layout.rect()) else {
        return false;
    };
    if item.is_tabbed() {
        return false;
    }
    let src = item.geometry();
    let spans_x = src.x <= area.x && src.right() >= area.right();
    let spans_y = src.y <= area.y && src.bottom() >= area.bottom();
    match location {
        Location::Top => src.y <= area.y && spans_x,
        Location::Bottom => src.bottom() >= area.bottom() && spans_x,
        Location::Left => src.x <= area.x && spans_y,
        Location::Right => src.right() >= area.right() && spans_y,
        Location::OnTop => false,
    }
}

// ──────────────────────────────────────────────
// Separator drag
// ──────────────────────────────────────────────

/// Pointer-driven separator drag. Tracks the pointer along the split axis
/// and feeds deltas to the layout; clamped moves don't advance the anchor,
/// so the separator only follows once the pointer comes back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeparatorDrag {
    window: String,
    id: SeparatorId,
    orientation: Orientation,
    anchor: i32,
}

impl SeparatorDrag {
    /// Start dragging the separator under `pointer` in `window`, if any.
    pub fn press(workspace: &mut Workspace, window: &str, pointer: Point) -> Option<Self> {
        let layout = workspace.window(window)?.layout();
        let id = layout.separator_at(pointer)?;
        let orientation = layout.separator(&id)?.orientation;
        workspace.begin_separator_drag(window, &id).ok()?;
        Some(Self {
            window: window.to_string(),
            id,
            orientation,
            anchor: pointer.coord(orientation),
        })
    }

    pub fn window(&self) -> &str {
        &self.window
    }

    pub fn id(&self) -> &SeparatorId {
        &self.id
    }

    /// Returns the delta the layout accepted.
    pub fn moved(&mut self, workspace: &mut Workspace, pointer: Point) -> Result<i32, LayoutError> {
        let delta = pointer.coord(self.orientation) - self.anchor;
        if delta == 0 {
            return Ok(0);
        }
        let applied = workspace.drag_separator(&self.window, &self.id, delta)?;
        self.anchor += applied;
        Ok(applied)
    }

    /// Returns the delta committed on release (non-zero only with lazy resize).
    pub fn release(self, workspace: &mut Workspace) -> Result<i32, LayoutError> {
        workspace.end_separator_drag(&self.window, &self.id)
    }
}

// ──────────────────────────────────────────────
// Router
// ──────────────────────────────────────────────

/// What the host should do in response to an event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Pointer pressed on a panel's content.
    Focus(PanelId),
    SeparatorMoved {
        window: String,
        id: SeparatorId,
        applied: i32,
    },
    /// Drag hint changed (redraw the drop indicator).
    HintChanged(Option<DropHint>),
    Dropped(DropHint),
    Cancelled,
    None,
}

/// Routes raw events to the panel drag controller or a separator drag.
/// A press within `title_height` pixels of an item's top edge grabs its
/// current panel.
pub struct Router {
    drag: DragController,
    separator: Option<SeparatorDrag>,
    title_height: i32,
}

impl Router {
    pub fn new() -> Self {
        Self::with_controller(DragController::new(), 24)
    }

    pub fn with_controller(drag: DragController, title_height: i32) -> Self {
        Self {
            drag,
            separator: None,
            title_height,
        }
    }

    pub fn drag(&self) -> &DragController {
        &self.drag
    }

    pub fn is_dragging_separator(&self) -> bool {
        self.separator.is_some()
    }

    pub fn process(
        &mut self,
        event: InputEvent,
        workspace: &mut Workspace,
        directory: &dyn PanelDirectory,
    ) -> Result<Action, LayoutError> {
        match event {
            InputEvent::PointerPress { position } => self.process_press(position, workspace, directory),
            InputEvent::PointerMove { position } => self.process_move(position, workspace),
            InputEvent::PointerRelease { position } => self.process_release(position, workspace),
            InputEvent::KeyPress {
                key: Key::Escape, ..
            } => Ok(if self.drag.cancel() {
                Action::Cancelled
            } else {
                Action::None
            }),
            InputEvent::KeyPress { .. } => Ok(Action::None),
        }
    }

    // ── Press ───────────────────────────────────

    fn process_press(
        &mut self,
        position: Point,
        workspace: &mut Workspace,
        directory: &dyn PanelDirectory,
    ) -> Result<Action, LayoutError> {
        if self.drag.is_dragging() || self.separator.is_some() {
            return Ok(Action::None);
        }
        let Some(window) = workspace.window_at(position).map(|w| w.name().to_string()) else {
            return Ok(Action::None);
        };

        if let Some(drag) = SeparatorDrag::press(workspace, &window, position) {
            self.separator = Some(drag);
            return Ok(Action::None);
        }

        let Some(item) = workspace.window(&window).and_then(|w| w.layout().item_at(position)) else {
            return Ok(Action::None);
        };
        let panel = item.current_panel();
        if position.y >= item.geometry().y + self.title_height {
            return Ok(Action::Focus(panel));
        }
        let hint = self.drag.begin(panel, position, directory, workspace)?.cloned();
        Ok(Action::HintChanged(hint))
    }

    // ── Move ────────────────────────────────────

    fn process_move(&mut self, position: Point, workspace: &mut Workspace) -> Result<Action, LayoutError> {
        if let Some(ref mut drag) = self.separator {
            let applied = drag.moved(workspace, position)?;
            return Ok(Action::SeparatorMoved {
                window: drag.window.clone(),
                id: drag.id.clone(),
                applied,
            });
        }
        if self.drag.is_dragging() {
            let hint = self.drag.pointer_moved(position, workspace).cloned();
            return Ok(Action::HintChanged(hint));
        }
        Ok(Action::None)
    }

    // ── Release ─────────────────────────────────

    fn process_release(&mut self, position: Point, workspace: &mut Workspace) -> Result<Action, LayoutError> {
        if let Some(drag) = self.separator.take() {
            let window = drag.window.clone();
            let id = drag.id.clone();
            let applied = drag.release(workspace)?;
            return Ok(Action::SeparatorMoved {
                window,
                id,
                applied,
            });
        }
        if !self.drag.is_dragging() {
            return Ok(Action::None);
        }
        Ok(match self.drag.release(position, workspace)? {
            DragOutcome::Dropped(hint) => Action::Dropped(hint),
            DragOutcome::Cancelled => Action::Cancelled,
        })
    }
}

impl Default for Router {
    fn default() -> Self {
        Self::new()
    }
}

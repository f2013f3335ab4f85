use std::sync::atomic::{AtomicU64, Ordering};

use berth_core::{
    clamp, distribute, GeometrySink, ItemId, Orientation, PanelHandle, PanelId, Point, Rect, Size,
};

use crate::{ConstraintViolation, SeparatorId, SeparatorInfo};

/// Item ids are unique across every layout in the process so items can move
/// between windows without clashing.
static NEXT_ITEM_ID: AtomicU64 = AtomicU64::new(1);

/// Floor for weights derived from a separator drag, so a child squeezed to
/// zero pixels keeps a valid (if negligible) share.
const MIN_WEIGHT: f64 = 1e-9;

fn alloc_item_id() -> ItemId {
    NEXT_ITEM_ID.fetch_add(1, Ordering::Relaxed)
}

// ──────────────────────────────────────────────
// Node: n-ary tree for layout
// ──────────────────────────────────────────────

#[derive(Debug, Clone)]
pub enum Node {
    Item(Item),
    Container(Container),
}

// ──────────────────────────────────────────────
// Item: a leaf holding one panel or a tab group
// ──────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct Item {
    id: ItemId,
    panels: Vec<PanelHandle>,
    current: usize,
    geometry: Rect,
    visible: bool,
}

impl Item {
    pub(crate) fn new(panel: PanelHandle) -> Self {
        Self {
            id: alloc_item_id(),
            panels: vec![panel],
            current: 0,
            geometry: Rect::default(),
            visible: true,
        }
    }

    /// Caller guarantees `panels` is non-empty and `current` in range.
    pub(crate) fn from_parts(panels: Vec<PanelHandle>, current: usize, visible: bool) -> Self {
        Self {
            id: alloc_item_id(),
            panels,
            current,
            geometry: Rect::default(),
            visible,
        }
    }

    pub fn id(&self) -> ItemId {
        self.id
    }

    pub fn panels(&self) -> &[PanelHandle] {
        &self.panels
    }

    pub fn panel_ids(&self) -> impl Iterator<Item = PanelId> + '_ {
        self.panels.iter().map(|p| p.id)
    }

    pub fn current_panel(&self) -> PanelId {
        self.panels[self.current].id
    }

    pub fn current_index(&self) -> usize {
        self.current
    }

    pub fn geometry(&self) -> Rect {
        self.geometry
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn is_tabbed(&self) -> bool {
        self.panels.len() > 1
    }

    pub fn contains_panel(&self, panel: PanelId) -> bool {
        self.panels.iter().any(|p| p.id == panel)
    }

    /// Largest minimum among the stacked panels.
    pub fn min_size(&self) -> Size {
        self.panels
            .iter()
            .fold(Size::ZERO, |acc, p| acc.expanded_to(p.constraints.min))
    }

    pub(crate) fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
    }

    /// Append the other item's panels as tabs; its current panel becomes ours.
    pub(crate) fn merge_tabs(&mut self, other: Item) {
        let offset = self.panels.len();
        self.current = offset + other.current;
        self.panels.extend(other.panels);
    }

    /// Pull one tab out. Returns `None` if absent or if it is the only tab.
    pub(crate) fn take_tab(&mut self, panel: PanelId) -> Option<PanelHandle> {
        if self.panels.len() < 2 {
            return None;
        }
        let index = self.panels.iter().position(|p| p.id == panel)?;
        let handle = self.panels.remove(index);
        if self.current > index || self.current >= self.panels.len() {
            self.current = self.current.saturating_sub(1);
        }
        Some(handle)
    }

    pub(crate) fn set_current(&mut self, panel: PanelId) -> bool {
        match self.panels.iter().position(|p| p.id == panel) {
            Some(index) => {
                self.current = index;
                true
            }
            None => false,
        }
    }
}

// ──────────────────────────────────────────────
// Container: children split along one axis
// ──────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct Child {
    pub(crate) weight: f64,
    pub(crate) node: Node,
}

impl Child {
    pub fn weight(&self) -> f64 {
        self.weight
    }

    pub fn node(&self) -> &Node {
        &self.node
    }
}

/// Draggable boundary between children `index` and `index + 1`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Separator {
    index: usize,
    offset: i32,
    dragging: bool,
    /// Uncommitted delta while a lazy drag is in progress.
    pending: i32,
}

impl Separator {
    pub fn index(&self) -> usize {
        self.index
    }

    /// Leading edge along the container's split axis, including any
    /// uncommitted drag delta.
    pub fn offset(&self) -> i32 {
        self.offset + self.pending
    }

    pub fn is_dragging(&self) -> bool {
        self.dragging
    }

    pub fn pending(&self) -> i32 {
        self.pending
    }
}

#[derive(Debug, Clone)]
pub struct Container {
    orientation: Orientation,
    children: Vec<Child>,
    separators: Vec<Separator>,
    geometry: Rect,
}

impl Container {
    /// Two-child container with equal weights. `leading` puts `new` first.
    pub(crate) fn pair(orientation: Orientation, anchor: Node, new: Node, leading: bool) -> Self {
        let geometry = anchor.geometry();
        let (first, second) = if leading { (new, anchor) } else { (anchor, new) };
        Self {
            orientation,
            children: vec![
                Child { weight: 0.5, node: first },
                Child { weight: 0.5, node: second },
            ],
            separators: Vec::new(),
            geometry,
        }
    }

    /// Caller guarantees at least two children. Same-orientation child
    /// containers are spliced in.
    pub(crate) fn from_parts(orientation: Orientation, children: Vec<Child>) -> Self {
        let mut container = Self {
            orientation,
            children,
            separators: Vec::new(),
            geometry: Rect::default(),
        };
        container.normalize_weights();
        for index in (0..container.children.len()).rev() {
            container.absorb_child(index);
        }
        container
    }

    pub fn orientation(&self) -> Orientation {
        self.orientation
    }

    pub fn children(&self) -> &[Child] {
        &self.children
    }

    pub fn len(&self) -> usize {
        self.children.len()
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    pub fn weights(&self) -> Vec<f64> {
        self.children.iter().map(|c| c.weight).collect()
    }

    pub fn separators(&self) -> &[Separator] {
        &self.separators
    }

    pub fn geometry(&self) -> Rect {
        self.geometry
    }

    pub fn min_size(&self, thickness: i32) -> Size {
        let o = self.orientation;
        let mut along = thickness * (self.children.len() as i32 - 1).max(0);
        let mut across = 0;
        for child in &self.children {
            let min = child.node.min_size(thickness);
            along += min.extent(o);
            across = across.max(min.cross_extent(o));
        }
        match o {
            Orientation::Horizontal => Size::new(along, across),
            Orientation::Vertical => Size::new(across, along),
        }
    }

    /// Assign this container's rect and lay out every descendant.
    pub(crate) fn set_geometry(&mut self, rect: Rect, pass: &mut LayoutPass<'_>) {
        self.geometry = rect;
        let o = self.orientation;
        let n = self.children.len();
        let gaps = pass.thickness * (n as i32 - 1).max(0);
        let available = rect.extent(o) - gaps;

        let minimums: Vec<Size> = self
            .children
            .iter()
            .map(|c| c.node.min_size(pass.thickness))
            .collect();
        let along: Vec<i32> = minimums.iter().map(|m| m.extent(o)).collect();
        let dist = distribute(available, &self.weights(), &along);

        if dist.is_violation() {
            let required = along.iter().sum::<i32>() + gaps;
            log::warn!(
                "{} container needs {}px but has {}px",
                o.name(),
                required,
                rect.extent(o)
            );
            pass.violations.push(ConstraintViolation {
                orientation: o,
                required,
                available: rect.extent(o),
            });
        }

        let cross_required = minimums.iter().map(|m| m.cross_extent(o)).max().unwrap_or(0);
        if cross_required > rect.cross_extent(o) {
            pass.violations.push(ConstraintViolation {
                orientation: o.other(),
                required: cross_required,
                available: rect.cross_extent(o),
            });
        }

        let old = std::mem::take(&mut self.separators);
        let mut cursor = rect.start(o);
        for (index, (child, extent)) in self.children.iter_mut().zip(dist.extents).enumerate() {
            child.node.set_geometry(rect.with_span(o, cursor, extent), pass);
            cursor += extent;
            if index + 1 < n {
                let (dragging, pending) = old
                    .get(index)
                    .map(|s| (s.dragging, s.pending))
                    .unwrap_or((false, 0));
                self.separators.push(Separator {
                    index,
                    offset: cursor,
                    dragging,
                    pending,
                });
                cursor += pass.thickness;
            }
        }
    }

    /// Clamped delta that moving separator `index` by `delta` would apply.
    pub(crate) fn clamp_separator_delta(&self, index: usize, delta: i32, thickness: i32) -> i32 {
        let o = self.orientation;
        let (a, b) = (&self.children[index].node, &self.children[index + 1].node);
        let slack_a = (a.geometry().extent(o) - a.min_size(thickness).extent(o)).max(0);
        let slack_b = (b.geometry().extent(o) - b.min_size(thickness).extent(o)).max(0);
        clamp(delta, -slack_a, slack_b)
    }

    /// Transfer extent between the two children beside separator `index`
    /// and re-lay out this container only. Returns the applied delta.
    pub(crate) fn move_separator(&mut self, index: usize, delta: i32, pass: &mut LayoutPass<'_>) -> i32 {
        let applied = self.clamp_separator_delta(index, delta, pass.thickness);
        if applied == 0 {
            return 0;
        }

        let o = self.orientation;
        let mut extents: Vec<i32> = self
            .children
            .iter()
            .map(|c| c.node.geometry().extent(o))
            .collect();
        extents[index] += applied;
        extents[index + 1] -= applied;

        let total: i32 = extents.iter().sum();
        if total <= 0 {
            return 0;
        }
        for (child, extent) in self.children.iter_mut().zip(&extents) {
            child.weight = (*extent as f64 / total as f64).max(MIN_WEIGHT);
        }
        self.normalize_weights();

        let rect = self.geometry;
        self.set_geometry(rect, pass);
        applied
    }

    pub(crate) fn separator_mut(&mut self, index: usize) -> Option<&mut Separator> {
        self.separators.get_mut(index)
    }

    /// Insert `node` next to child `index`, splitting that child's weight.
    pub(crate) fn insert_beside(&mut self, index: usize, node: Node, leading: bool) {
        let half = self.children[index].weight / 2.0;
        self.children[index].weight = half;
        let at = if leading { index } else { index + 1 };
        self.children.insert(at, Child { weight: half, node });
    }

    /// Insert `node` at the first or last position with a `1/(n+1)` share.
    pub(crate) fn insert_at_edge(&mut self, node: Node, leading: bool) {
        self.normalize_weights();
        let n = self.children.len() as f64;
        for child in &mut self.children {
            child.weight *= n / (n + 1.0);
        }
        let child = Child {
            weight: 1.0 / (n + 1.0),
            node,
        };
        if leading {
            self.children.insert(0, child);
        } else {
            self.children.push(child);
        }
    }

    /// Replace child `index` with a new container holding it and `node`.
    /// The new container keeps the child's weight.
    pub(crate) fn split_child(&mut self, index: usize, orientation: Orientation, node: Node, leading: bool) {
        let slot = &mut self.children[index];
        let anchor = std::mem::replace(&mut slot.node, Node::Container(Container::placeholder()));
        slot.node = Node::Container(Container::pair(orientation, anchor, node, leading));
    }

    pub(crate) fn remove_child(&mut self, index: usize) -> Node {
        let child = self.children.remove(index);
        self.normalize_weights();
        child.node
    }

    /// If a single child is left, hand it over.
    pub(crate) fn take_only_child(&mut self) -> Option<Node> {
        if self.children.len() == 1 {
            self.children.pop().map(|c| c.node)
        } else {
            None
        }
    }

    pub(crate) fn replace_child(&mut self, index: usize, node: Node) {
        self.children[index].node = node;
        self.absorb_child(index);
    }

    /// Splice a same-orientation child container's children into this one,
    /// scaling their weights by the slot they occupied.
    fn absorb_child(&mut self, index: usize) {
        let same = matches!(
            &self.children[index].node,
            Node::Container(c) if c.orientation == self.orientation
        );
        if !same {
            return;
        }
        let slot = self.children.remove(index);
        if let Node::Container(mut inner) = slot.node {
            inner.normalize_weights();
            let spliced = inner.children.into_iter().map(|c| Child {
                weight: c.weight * slot.weight,
                node: c.node,
            });
            self.children.splice(index..index, spliced);
        }
    }

    /// Scale weights to sum to one. Invalid weights take the mean of the
    /// valid ones first.
    pub(crate) fn normalize_weights(&mut self) {
        let valid = |w: f64| w.is_finite() && w > 0.0;
        // Divide by the largest weight before summing so huge weights
        // can't overflow the total.
        let max = self
            .children
            .iter()
            .map(|c| c.weight)
            .filter(|w| valid(*w))
            .fold(0.0, f64::max);
        let (sum, count) = self
            .children
            .iter_mut()
            .filter(|c| valid(c.weight))
            .fold((0.0, 0usize), |(s, n), c| {
                c.weight = (c.weight / max).max(MIN_WEIGHT);
                (s + c.weight, n + 1)
            });
        let fallback = if count == 0 { 1.0 } else { sum / count as f64 };
        for child in &mut self.children {
            if !valid(child.weight) {
                child.weight = fallback;
            }
        }
        let total: f64 = self.children.iter().map(|c| c.weight).sum();
        if total > 0.0 {
            for child in &mut self.children {
                child.weight /= total;
            }
        }
    }

    /// Drop any in-progress separator drag here and below. The tree shape
    /// changed, so separator indices no longer name the same boundaries.
    pub(crate) fn clear_separator_drags(&mut self) {
        for sep in &mut self.separators {
            sep.dragging = false;
            sep.pending = 0;
        }
        for child in &mut self.children {
            if let Node::Container(c) = &mut child.node {
                c.clear_separator_drags();
            }
        }
    }

    fn placeholder() -> Self {
        Self {
            orientation: Orientation::Horizontal,
            children: Vec::new(),
            separators: Vec::new(),
            geometry: Rect::default(),
        }
    }
}

// ──────────────────────────────────────────────
// Layout pass state
// ──────────────────────────────────────────────

pub(crate) struct LayoutPass<'a> {
    pub thickness: i32,
    pub sink: Option<&'a mut (dyn GeometrySink + 'static)>,
    pub violations: Vec<ConstraintViolation>,
}

// ──────────────────────────────────────────────
// Node traversal
// ──────────────────────────────────────────────

impl Node {
    pub fn geometry(&self) -> Rect {
        match self {
            Node::Item(item) => item.geometry,
            Node::Container(c) => c.geometry,
        }
    }

    pub fn min_size(&self, thickness: i32) -> Size {
        match self {
            Node::Item(item) => item.min_size(),
            Node::Container(c) => c.min_size(thickness),
        }
    }

    pub fn as_item(&self) -> Option<&Item> {
        match self {
            Node::Item(item) => Some(item),
            Node::Container(_) => None,
        }
    }

    pub fn as_container(&self) -> Option<&Container> {
        match self {
            Node::Container(c) => Some(c),
            Node::Item(_) => None,
        }
    }

    pub(crate) fn set_geometry(&mut self, rect: Rect, pass: &mut LayoutPass<'_>) {
        match self {
            Node::Item(item) => {
                item.geometry = rect;
                if let Some(sink) = pass.sink.as_mut() {
                    sink.apply_geometry(item.current_panel(), rect);
                }
            }
            Node::Container(c) => c.set_geometry(rect, pass),
        }
    }

    /// Returns true if this node (or any descendant) holds the given panel.
    pub fn contains_panel(&self, panel: PanelId) -> bool {
        match self {
            Node::Item(item) => item.contains_panel(panel),
            Node::Container(c) => c.children.iter().any(|ch| ch.node.contains_panel(panel)),
        }
    }

    /// Collect all panel ids in this subtree, tabs included, in tree order.
    pub(crate) fn panel_ids(&self, out: &mut Vec<PanelId>) {
        match self {
            Node::Item(item) => out.extend(item.panel_ids()),
            Node::Container(c) => {
                for child in &c.children {
                    child.node.panel_ids(out);
                }
            }
        }
    }

    pub(crate) fn items<'a>(&'a self, out: &mut Vec<&'a Item>) {
        match self {
            Node::Item(item) => out.push(item),
            Node::Container(c) => {
                for child in &c.children {
                    child.node.items(out);
                }
            }
        }
    }

    /// Record the child-index path to the item holding `panel`.
    pub(crate) fn find_panel(&self, panel: PanelId, path: &mut Vec<usize>) -> bool {
        match self {
            Node::Item(item) => item.contains_panel(panel),
            Node::Container(c) => {
                for (index, child) in c.children.iter().enumerate() {
                    path.push(index);
                    if child.node.find_panel(panel, path) {
                        return true;
                    }
                    path.pop();
                }
                false
            }
        }
    }

    /// Deepest item whose rect contains `point`. Separators hit nothing.
    pub(crate) fn item_at(&self, point: Point) -> Option<&Item> {
        if !self.geometry().contains(point) {
            return None;
        }
        match self {
            Node::Item(item) => Some(item),
            Node::Container(c) => c.children.iter().find_map(|ch| ch.node.item_at(point)),
        }
    }

    pub(crate) fn node_at(&self, path: &[usize]) -> Option<&Node> {
        match path.split_first() {
            None => Some(self),
            Some((&index, rest)) => match self {
                Node::Container(c) => c.children.get(index)?.node.node_at(rest),
                Node::Item(_) => None,
            },
        }
    }

    pub(crate) fn node_at_mut(&mut self, path: &[usize]) -> Option<&mut Node> {
        match path.split_first() {
            None => Some(self),
            Some((&index, rest)) => match self {
                Node::Container(c) => c.children.get_mut(index)?.node.node_at_mut(rest),
                Node::Item(_) => None,
            },
        }
    }

    pub(crate) fn collect_separators(
        &self,
        thickness: i32,
        path: &mut Vec<usize>,
        out: &mut Vec<SeparatorInfo>,
    ) {
        if let Node::Container(c) = self {
            for sep in &c.separators {
                out.push(SeparatorInfo {
                    id: SeparatorId {
                        container: path.clone(),
                        index: sep.index,
                    },
                    rect: c.geometry.with_span(c.orientation, sep.offset(), thickness),
                    orientation: c.orientation,
                    dragging: sep.dragging,
                });
            }
            for (index, child) in c.children.iter().enumerate() {
                path.push(index);
                child.node.collect_separators(thickness, path, out);
                path.pop();
            }
        }
    }
}

impl Separator {
    pub(crate) fn begin_drag(&mut self) {
        self.dragging = true;
        self.pending = 0;
    }

    pub(crate) fn set_pending(&mut self, pending: i32) {
        self.pending = pending;
    }

    /// Clear drag state, returning the uncommitted delta.
    pub(crate) fn finish_drag(&mut self) -> i32 {
        self.dragging = false;
        std::mem::take(&mut self.pending)
    }
}

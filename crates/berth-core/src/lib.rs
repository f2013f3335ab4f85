use std::cell::RefCell;
use std::rc::Rc;


// ──────────────────────────────────────────────
// Geometry
// ──────────────────────────────────────────────

/// Integer pixel rectangle. `contains` is half-open so that adjacent
/// rectangles never both claim the same pixel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Rect {
    pub fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self { x, y, width, height }
    }

    pub fn contains(&self, point: Point) -> bool {
        point.x >= self.x
            && point.x < self.x + self.width
            && point.y >= self.y
            && point.y < self.y + self.height
    }

    pub fn right(&self) -> i32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> i32 {
        self.y + self.height
    }

    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    /// Position of the leading edge along the split axis of `orientation`.
    pub fn start(&self, orientation: Orientation) -> i32 {
        match orientation {
            Orientation::Horizontal => self.x,
            Orientation::Vertical => self.y,
        }
    }

    /// Extent along the split axis of `orientation`.
    pub fn extent(&self, orientation: Orientation) -> i32 {
        self.size().extent(orientation)
    }

    /// Extent across the split axis of `orientation`.
    pub fn cross_extent(&self, orientation: Orientation) -> i32 {
        self.size().cross_extent(orientation)
    }

    /// Same cross-axis span, with the span along `orientation` replaced.
    pub fn with_span(&self, orientation: Orientation, start: i32, extent: i32) -> Rect {
        match orientation {
            Orientation::Horizontal => Rect::new(start, self.y, extent, self.height),
            Orientation::Vertical => Rect::new(self.x, start, self.width, extent),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Size {
    pub width: i32,
    pub height: i32,
}

impl Size {
    pub const ZERO: Size = Size { width: 0, height: 0 };
    pub const MAX: Size = Size {
        width: i32::MAX,
        height: i32::MAX,
    };

    pub fn new(width: i32, height: i32) -> Self {
        Self { width, height }
    }

    pub fn extent(&self, orientation: Orientation) -> i32 {
        match orientation {
            Orientation::Horizontal => self.width,
            Orientation::Vertical => self.height,
        }
    }

    pub fn cross_extent(&self, orientation: Orientation) -> i32 {
        self.extent(orientation.other())
    }

    /// Component-wise maximum.
    pub fn expanded_to(&self, other: Size) -> Size {
        Size::new(self.width.max(other.width), self.height.max(other.height))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub fn coord(&self, orientation: Orientation) -> i32 {
        match orientation {
            Orientation::Horizontal => self.x,
            Orientation::Vertical => self.y,
        }
    }
}

// ──────────────────────────────────────────────
// Constraints
// ──────────────────────────────────────────────

/// Minimum and maximum size of a panel. Minimums are enforced by the
/// layout; maximums are advisory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SizeConstraints {
    pub min: Size,
    pub max: Size,
}

impl SizeConstraints {
    pub fn new(min: Size, max: Size) -> Self {
        Self { min, max }
    }

    pub fn with_min(width: i32, height: i32) -> Self {
        Self {
            min: Size::new(width, height),
            max: Size::MAX,
        }
    }

    pub fn clamp(&self, size: Size) -> Size {
        Size::new(
            clamp(size.width, self.min.width, self.max.width),
            clamp(size.height, self.min.height, self.max.height),
        )
    }
}

impl Default for SizeConstraints {
    fn default() -> Self {
        Self {
            min: Size::ZERO,
            max: Size::MAX,
        }
    }
}

/// Clamp `value` into `[min, max]`. If the bounds cross, `min` wins.
pub fn clamp(value: i32, min: i32, max: i32) -> i32 {
    if value < min {
        min
    } else if value > max {
        max.max(min)
    } else {
        value
    }
}

/// Slack added before flooring so extents derived from exact pixel
/// weights don't lose a pixel to float error.
const ROUNDING_EPSILON: f64 = 1e-6;

/// Result of dividing an extent among slots.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Distribution {
    pub extents: Vec<i32>,
    /// Pixels by which the minimums exceed the available extent. Zero unless
    /// the slots could not all fit.
    pub overflow: i32,
}

impl Distribution {
    pub fn is_violation(&self) -> bool {
        self.overflow > 0
    }
}

/// Divide `total` among slots proportionally to `weights`, never giving a
/// slot less than its minimum.
///
/// Slots whose proportional share would fall below their minimum are pinned
/// to it and the rest is re-shared among the remaining slots. Shares are
/// floored and the leftover pixels go to the last slot, so the extents
/// always sum to exactly `total`. When the minimums alone exceed `total`,
/// every slot gets its minimum and the excess is reported as `overflow`.
///
/// Non-finite or non-positive weights are replaced by the mean of the valid
/// ones (or an equal share when none are valid).
pub fn distribute(total: i32, weights: &[f64], minimums: &[i32]) -> Distribution {
    debug_assert_eq!(weights.len(), minimums.len());
    let n = weights.len().min(minimums.len());
    if n == 0 {
        return Distribution {
            extents: Vec::new(),
            overflow: 0,
        };
    }

    let total = total.max(0);
    let minimums: Vec<i32> = minimums[..n].iter().map(|m| (*m).max(0)).collect();
    let min_sum: i64 = minimums.iter().map(|m| *m as i64).sum();
    if min_sum >= total as i64 {
        return Distribution {
            extents: minimums,
            overflow: (min_sum - total as i64).min(i32::MAX as i64) as i32,
        };
    }

    let weights = sanitize_weights(&weights[..n]);
    let mut pinned = vec![false; n];
    let mut extents = vec![0i32; n];

    loop {
        let pinned_total: i64 = (0..n)
            .filter(|&i| pinned[i])
            .map(|i| minimums[i] as i64)
            .sum();
        let remaining = (total as i64 - pinned_total) as f64;
        let weight_sum: f64 = (0..n).filter(|&i| !pinned[i]).map(|i| weights[i]).sum();

        let mut pinned_more = false;
        for i in 0..n {
            if !pinned[i] && remaining * weights[i] / weight_sum < minimums[i] as f64 {
                pinned[i] = true;
                pinned_more = true;
            }
        }

        if !pinned_more {
            for i in 0..n {
                extents[i] = if pinned[i] {
                    minimums[i]
                } else {
                    (remaining * weights[i] / weight_sum + ROUNDING_EPSILON).floor() as i32
                };
            }
            break;
        }
    }

    let assigned: i64 = extents.iter().map(|e| *e as i64).sum();
    extents[n - 1] += (total as i64 - assigned) as i32;

    Distribution {
        extents,
        overflow: 0,
    }
}

fn sanitize_weights(weights: &[f64]) -> Vec<f64> {
    let valid = |w: &f64| w.is_finite() && *w > 0.0;
    let (sum, count) = weights
        .iter()
        .filter(|w| valid(w))
        .fold((0.0, 0usize), |(s, c), w| (s + w, c + 1));
    let fallback = if count == 0 { 1.0 } else { sum / count as f64 };
    weights
        .iter()
        .map(|w| if valid(w) { *w } else { fallback })
        .collect()
}

// ──────────────────────────────────────────────
// Identity
// ──────────────────────────────────────────────

pub type PanelId = u64;
pub type ItemId = u64;

/// A resolved panel: its id plus the size constraints the layout honours.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PanelHandle {
    pub id: PanelId,
    pub constraints: SizeConstraints,
}

impl PanelHandle {
    pub fn new(id: PanelId) -> Self {
        Self {
            id,
            constraints: SizeConstraints::default(),
        }
    }

    pub fn with_constraints(id: PanelId, constraints: SizeConstraints) -> Self {
        Self { id, constraints }
    }
}

// ──────────────────────────────────────────────
// Layout types
// ──────────────────────────────────────────────

/// How a container lays out its children. `Horizontal` places them side by
/// side (split along x), `Vertical` stacks them (split along y).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Orientation {
    Horizontal,
    Vertical,
}

impl Orientation {
    pub fn other(self) -> Self {
        match self {
            Orientation::Horizontal => Orientation::Vertical,
            Orientation::Vertical => Orientation::Horizontal,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Orientation::Horizontal => "horizontal",
            Orientation::Vertical => "vertical",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "horizontal" => Some(Orientation::Horizontal),
            "vertical" => Some(Orientation::Vertical),
            _ => None,
        }
    }
}

/// Where a panel goes relative to an anchor (or the whole layout).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Location {
    Left,
    Right,
    Top,
    Bottom,
    /// Stack onto the anchor as another tab.
    OnTop,
}

impl Location {
    /// Orientation of the split this location introduces, `None` for tabs.
    pub fn orientation(self) -> Option<Orientation> {
        match self {
            Location::Left | Location::Right => Some(Orientation::Horizontal),
            Location::Top | Location::Bottom => Some(Orientation::Vertical),
            Location::OnTop => None,
        }
    }

    /// True when the new panel goes before the anchor (left or above).
    pub fn is_leading(self) -> bool {
        matches!(self, Location::Left | Location::Top)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropTarget {
    /// Relative to the item holding the given panel.
    Panel(PanelId, Location),
    /// At the outer edge of the whole layout.
    Root(Location),
}

/// Tunables shared by the layout engine and the drag controller.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayoutConfig {
    pub separator_thickness: i32,
    /// Extra pixels on each side of a separator that still hit it.
    pub separator_hit_tolerance: i32,
    /// Defer separator moves until the drag is released.
    pub lazy_resize: bool,
    /// Fraction of an item's extent forming each edge drop band.
    pub drop_band: f32,
    /// Fraction of an edge item's extent that targets the whole layout.
    pub outer_band: f32,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            separator_thickness: 5,
            separator_hit_tolerance: 4,
            lazy_resize: false,
            drop_band: 0.25,
            outer_band: 0.12,
        }
    }
}

// ──────────────────────────────────────────────
// Input
// ──────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    Char(char),
    Enter,
    Escape,
    Tab,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Modifiers {
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
    pub meta: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputEvent {
    PointerPress { position: Point },
    PointerMove { position: Point },
    PointerRelease { position: Point },
    KeyPress { key: Key, modifiers: Modifiers },
}

// ──────────────────────────────────────────────
// Trait: GeometrySink
// ──────────────────────────────────────────────

/// Host callback receiving the rectangle of every item the layout places.
/// Called with the item's current panel.
pub trait GeometrySink {
    fn apply_geometry(&mut self, panel: PanelId, rect: Rect);
}

/// Records every placement, latest last.
impl GeometrySink for Vec<(PanelId, Rect)> {
    fn apply_geometry(&mut self, panel: PanelId, rect: Rect) {
        self.push((panel, rect));
    }
}

impl<S: GeometrySink + ?Sized> GeometrySink for Rc<RefCell<S>> {
    fn apply_geometry(&mut self, panel: PanelId, rect: Rect) {
        self.borrow_mut().apply_geometry(panel, rect);
    }
}

// ──────────────────────────────────────────────
// Trait: PanelDirectory
// ──────────────────────────────────────────────

/// Read-only lookup of live panels, by persisted name or by id.
pub trait PanelDirectory {
    fn resolve_panel(&self, name: &str) -> Option<PanelHandle>;
    fn panel_handle(&self, id: PanelId) -> Option<PanelHandle>;
    fn panel_name(&self, id: PanelId) -> Option<&str>;
}

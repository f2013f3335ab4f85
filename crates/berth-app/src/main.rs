// Berth host: wires the registry, workspace and input router together and
// runs a scripted docking session against them.

mod session;
mod settings;

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use berth_core::{
    GeometrySink, InputEvent, Location, Orientation, PanelDirectory, PanelId, Point, Rect,
    SizeConstraints,
};
use berth_input::{Action, Router};
use berth_layout::{DockRegistry, LayoutError, RegistryError, Workspace};

const MAIN_WINDOW: &str = "main";

// ──────────────────────────────────────────────
// Placement log
// ──────────────────────────────────────────────

/// Latest rect handed to each panel.
#[derive(Debug, Default)]
struct Placements {
    rects: BTreeMap<PanelId, Rect>,
}

impl GeometrySink for Placements {
    fn apply_geometry(&mut self, panel: PanelId, rect: Rect) {
        log::trace!("panel {} -> {:?}", panel, rect);
        self.rects.insert(panel, rect);
    }
}

// ──────────────────────────────────────────────
// App state
// ──────────────────────────────────────────────

struct App {
    registry: DockRegistry,
    workspace: Workspace,
    router: Router,
    placements: Rc<RefCell<Placements>>,
}

impl App {
    fn new(settings: &settings::BerthSettings) -> Result<Self, LayoutError> {
        let mut workspace = Workspace::new(settings.layout.to_config());
        let placements = Rc::new(RefCell::new(Placements::default()));
        workspace.set_geometry_sink(placements.clone());
        workspace.add_main_window(MAIN_WINDOW, settings.window.rect())?;
        Ok(Self {
            registry: DockRegistry::new(),
            workspace,
            router: Router::new(),
            placements,
        })
    }

    fn register_panels(&mut self) -> Result<(), RegistryError> {
        self.registry.register("files", "Files", SizeConstraints::with_min(160, 0))?;
        self.registry.register("editor", "Editor", SizeConstraints::with_min(320, 200))?;
        self.registry.register("console", "Console", SizeConstraints::with_min(0, 120))?;
        self.registry.register("outline", "Outline", SizeConstraints::with_min(160, 0))?;
        Ok(())
    }

    /// files | editor over console, with outline tabbed behind files.
    fn default_arrangement(&mut self) -> Result<(), LayoutError> {
        let [Some(files), Some(editor), Some(console), Some(outline)] =
            ["files", "editor", "console", "outline"].map(|name| self.registry.resolve_panel(name))
        else {
            log::warn!("Demo panels are not registered");
            return Ok(());
        };

        let ws = &mut self.workspace;
        ws.add_panel(MAIN_WINDOW, files, Location::Left, None)?;
        ws.add_panel(MAIN_WINDOW, editor, Location::Right, Some(files.id))?;
        ws.add_panel(MAIN_WINDOW, console, Location::Bottom, Some(editor.id))?;
        ws.add_panel(MAIN_WINDOW, outline, Location::OnTop, Some(files.id))?;
        ws.activate_panel(files.id)?;
        Ok(())
    }

    fn send(&mut self, event: InputEvent) -> Result<Action, LayoutError> {
        let action = self.router.process(event, &mut self.workspace, &self.registry)?;
        log::debug!("{:?} -> {:?}", event, action);
        Ok(action)
    }

    // ── Scripted gestures ───────────────────────

    /// Grab a panel by its title strip and drop it at the main window's
    /// right edge.
    fn drag_to_right_edge(&mut self, name: &str) -> Result<(), LayoutError> {
        let Some(panel) = self.registry.resolve_panel(name) else {
            log::warn!("No panel named {}", name);
            return Ok(());
        };
        let Some(window) = self.workspace.window(MAIN_WINDOW) else {
            return Ok(());
        };
        let area = window.geometry();
        let Some((rect, current)) = window
            .layout()
            .item_for_panel(panel.id)
            .map(|item| (item.geometry(), item.current_panel()))
        else {
            log::info!("Panel {} is not docked in {}; skipping drag", name, MAIN_WINDOW);
            return Ok(());
        };
        if current != panel.id {
            self.workspace.activate_panel(panel.id)?;
        }
        let grab = Point::new(rect.x + 10, rect.y + 5);
        let drop = Point::new(area.right() - 4, area.y + area.height / 2);

        self.send(InputEvent::PointerPress { position: grab })?;
        self.send(InputEvent::PointerMove { position: drop })?;
        match self.send(InputEvent::PointerRelease { position: drop })? {
            Action::Dropped(hint) => log::info!("Dropped {} on {:?}", name, hint.target),
            other => log::info!("Drag of {} ended with {:?}", name, other),
        }
        Ok(())
    }

    /// Drag the first separator of the main window by `distance` pixels.
    fn nudge_first_separator(&mut self, distance: i32) -> Result<(), LayoutError> {
        let Some(info) = self
            .workspace
            .window(MAIN_WINDOW)
            .and_then(|w| w.layout().separators().into_iter().next())
        else {
            log::info!("No separator to drag");
            return Ok(());
        };
        let r = info.rect;
        let start = Point::new(r.x + r.width / 2, r.y + r.height / 2);
        let end = match info.orientation {
            Orientation::Horizontal => Point::new(start.x + distance, start.y),
            Orientation::Vertical => Point::new(start.x, start.y + distance),
        };

        self.send(InputEvent::PointerPress { position: start })?;
        let mut applied = 0;
        if let Action::SeparatorMoved { applied: moved, .. } =
            self.send(InputEvent::PointerMove { position: end })?
        {
            applied += moved;
        }
        if let Action::SeparatorMoved { applied: moved, .. } =
            self.send(InputEvent::PointerRelease { position: end })?
        {
            applied += moved;
        }
        log::info!("Separator {:?} moved by {} of {}", info.id, applied, distance);
        Ok(())
    }

    fn log_geometry(&self) {
        for window in self.workspace.windows() {
            log::info!("{} window {} at {:?}", window.kind().name(), window.name(), window.geometry());
            for item in window.layout().items() {
                let names: Vec<&str> = item
                    .panel_ids()
                    .filter_map(|id| self.registry.panel_name(id))
                    .collect();
                log::info!("  [{}] {:?}", names.join(", "), item.geometry());
            }
            for violation in window.layout().constraint_violations() {
                log::warn!("  {:?} short by {}px", violation.orientation, violation.deficit());
            }
        }
        log::debug!("{} panel(s) placed", self.placements.borrow().rects.len());
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let settings = settings::load_settings();
    let mut app = App::new(&settings)?;
    app.register_panels()?;

    if session::load_session(&mut app.workspace, &app.registry) {
        log::info!("Restored previous session");
    } else {
        app.default_arrangement()?;
    }
    app.log_geometry();

    app.drag_to_right_edge("console")?;
    app.nudge_first_separator(40)?;
    app.log_geometry();

    session::save_session(&app.workspace, &app.registry);
    Ok(())
}

// ──────────────────────────────────────────────
// Entry point
// ──────────────────────────────────────────────

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        log::error!("berth: {}", e);
        std::process::exit(1);
    }
}

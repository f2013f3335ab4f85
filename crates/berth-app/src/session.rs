// Session persistence: save/restore the docked layout across runs.

use std::path::PathBuf;

use berth_core::PanelDirectory;
use berth_layout::Workspace;

// ──────────────────────────────────────────────
// Session file I/O
// ──────────────────────────────────────────────

fn session_path() -> Option<PathBuf> {
    let config_dir = dirs::config_dir()?;
    Some(config_dir.join("berth").join("session.json"))
}

pub fn save_session(workspace: &Workspace, directory: &dyn PanelDirectory) {
    let path = match session_path() {
        Some(p) => p,
        None => {
            log::warn!("Could not determine config directory for session save");
            return;
        }
    };

    if let Some(parent) = path.parent() {
        if let Err(e) = std::fs::create_dir_all(parent) {
            log::error!("Failed to create session directory: {}", e);
            return;
        }
    }

    match workspace.save(directory).and_then(|saved| saved.to_json()) {
        Ok(json) => {
            if let Err(e) = std::fs::write(&path, json) {
                log::error!("Failed to write session file: {}", e);
            }
        }
        Err(e) => {
            log::error!("Failed to serialize session: {}", e);
        }
    }
}

/// Restore the last saved layout into `workspace`. Returns false (leaving the
/// workspace untouched) when there is no usable session.
pub fn load_session(workspace: &mut Workspace, directory: &dyn PanelDirectory) -> bool {
    let Some(path) = session_path() else {
        return false;
    };
    let Ok(data) = std::fs::read_to_string(&path) else {
        return false;
    };
    restore_session(workspace, directory, &data)
}

fn restore_session(workspace: &mut Workspace, directory: &dyn PanelDirectory, data: &str) -> bool {
    match workspace.restore_json(data, directory) {
        Ok(()) => true,
        Err(e) => {
            log::warn!("Discarding saved session: {}", e);
            false
        }
    }
}

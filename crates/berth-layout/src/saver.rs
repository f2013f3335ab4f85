// Layout persistence: save/restore every window's tree as JSON.
//
// Restore validates the whole document and resolves every panel before any
// window is touched, so a bad document leaves the current layout in place.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use berth_core::{Orientation, PanelDirectory, Rect};

use crate::node::{Child, Container, Item, Node};
use crate::workspace::{DockWindow, WindowKind, Workspace};
use crate::{MultiSplitter, PersistError};

pub const LAYOUT_VERSION: u32 = 1;

// ──────────────────────────────────────────────
// Serializable layout types
// ──────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedLayout {
    pub version: u32,
    pub windows: Vec<SavedWindow>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedWindow {
    pub name: String,
    pub kind: String, // "main" or "floating"
    pub geometry: SavedRect,
    pub root: Option<SavedNode>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavedRect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SavedNode {
    Item {
        panels: Vec<String>,
        #[serde(default)]
        current: usize,
        #[serde(default = "default_visible")]
        visible: bool,
    },
    Container {
        orientation: String, // "horizontal" or "vertical"
        children: Vec<SavedChild>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedChild {
    pub weight: f64,
    pub node: SavedNode,
}

fn default_visible() -> bool {
    true
}

impl From<Rect> for SavedRect {
    fn from(r: Rect) -> Self {
        Self {
            x: r.x,
            y: r.y,
            width: r.width,
            height: r.height,
        }
    }
}

impl From<SavedRect> for Rect {
    fn from(r: SavedRect) -> Self {
        Rect::new(r.x, r.y, r.width, r.height)
    }
}

impl SavedLayout {
    pub fn to_json(&self) -> Result<String, PersistError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(data: &str) -> Result<Self, PersistError> {
        Ok(serde_json::from_str(data)?)
    }
}

// ──────────────────────────────────────────────
// Tree <-> saved form
// ──────────────────────────────────────────────

fn save_node(node: &Node, directory: &dyn PanelDirectory) -> Result<SavedNode, PersistError> {
    match node {
        Node::Item(item) => {
            let panels = item
                .panel_ids()
                .map(|id| {
                    directory
                        .panel_name(id)
                        .map(str::to_string)
                        .ok_or(PersistError::UnnamedPanel(id))
                })
                .collect::<Result<Vec<_>, _>>()?;
            Ok(SavedNode::Item {
                panels,
                current: item.current_index(),
                visible: item.is_visible(),
            })
        }
        Node::Container(c) => {
            let children = c
                .children()
                .iter()
                .map(|child| {
                    Ok(SavedChild {
                        weight: child.weight(),
                        node: save_node(child.node(), directory)?,
                    })
                })
                .collect::<Result<Vec<_>, PersistError>>()?;
            Ok(SavedNode::Container {
                orientation: c.orientation().name().to_string(),
                children,
            })
        }
    }
}

fn restore_node(
    saved: &SavedNode,
    directory: &dyn PanelDirectory,
    seen: &mut HashSet<String>,
) -> Result<Node, PersistError> {
    match saved {
        SavedNode::Item {
            panels,
            current,
            visible,
        } => {
            if panels.is_empty() {
                return Err(PersistError::EmptyItem);
            }
            if *current >= panels.len() {
                return Err(PersistError::CurrentOutOfRange {
                    current: *current,
                    count: panels.len(),
                });
            }
            let handles = panels
                .iter()
                .map(|name| {
                    if !seen.insert(name.clone()) {
                        return Err(PersistError::DuplicatePanel(name.clone()));
                    }
                    directory
                        .resolve_panel(name)
                        .ok_or_else(|| PersistError::UnknownPanel(name.clone()))
                })
                .collect::<Result<Vec<_>, _>>()?;
            Ok(Node::Item(Item::from_parts(handles, *current, *visible)))
        }
        SavedNode::Container {
            orientation,
            children,
        } => {
            let orientation = Orientation::from_name(orientation)
                .ok_or_else(|| PersistError::InvalidOrientation(orientation.clone()))?;
            if children.len() < 2 {
                return Err(PersistError::TooFewChildren(children.len()));
            }
            let children = children
                .iter()
                .map(|child| {
                    if !(child.weight.is_finite() && child.weight > 0.0) {
                        return Err(PersistError::InvalidWeight(child.weight));
                    }
                    Ok(Child {
                        weight: child.weight,
                        node: restore_node(&child.node, directory, seen)?,
                    })
                })
                .collect::<Result<Vec<_>, _>>()?;
            Ok(Node::Container(Container::from_parts(orientation, children)))
        }
    }
}

// ──────────────────────────────────────────────
// Single tree
// ──────────────────────────────────────────────

impl MultiSplitter {
    /// Snapshot of the tree; `None` when empty.
    pub fn save(&self, directory: &dyn PanelDirectory) -> Result<Option<SavedNode>, PersistError> {
        self.root
            .as_ref()
            .map(|root| save_node(root, directory))
            .transpose()
    }

    /// Replace the tree with a saved one. The new tree is fully built before
    /// the old one is dropped; on error nothing changes.
    pub fn restore(
        &mut self,
        saved: Option<&SavedNode>,
        directory: &dyn PanelDirectory,
    ) -> Result<(), PersistError> {
        let root = saved
            .map(|node| restore_node(node, directory, &mut HashSet::new()))
            .transpose()?;
        let mut staged = self.detached();
        staged.root = root;
        self.adopt(staged);
        Ok(())
    }
}

// ──────────────────────────────────────────────
// Whole workspace
// ──────────────────────────────────────────────

impl Workspace {
    pub fn save(&self, directory: &dyn PanelDirectory) -> Result<SavedLayout, PersistError> {
        let windows = self
            .windows()
            .iter()
            .map(|w| {
                Ok(SavedWindow {
                    name: w.name().to_string(),
                    kind: w.kind().name().to_string(),
                    geometry: w.geometry().into(),
                    root: w.layout().save(directory)?,
                })
            })
            .collect::<Result<Vec<_>, PersistError>>()?;
        Ok(SavedLayout {
            version: LAYOUT_VERSION,
            windows,
        })
    }

    /// Swap in a saved set of windows. Windows absent from `saved` are
    /// dropped; nothing changes unless the whole document is valid.
    pub fn restore(
        &mut self,
        saved: &SavedLayout,
        directory: &dyn PanelDirectory,
    ) -> Result<(), PersistError> {
        if saved.version != LAYOUT_VERSION {
            return Err(PersistError::UnsupportedVersion(saved.version));
        }

        let mut seen_panels = HashSet::new();
        let mut seen_windows = HashSet::new();
        let mut staged = Vec::with_capacity(saved.windows.len());
        for window in &saved.windows {
            if !seen_windows.insert(window.name.as_str()) {
                return Err(PersistError::DuplicateWindow(window.name.clone()));
            }
            let kind = WindowKind::from_name(&window.kind)
                .ok_or_else(|| PersistError::InvalidWindowKind(window.kind.clone()))?;
            if window.geometry.width < 0 || window.geometry.height < 0 {
                return Err(PersistError::InvalidGeometry(window.name.clone()));
            }
            let root = window
                .root
                .as_ref()
                .map(|node| restore_node(node, directory, &mut seen_panels))
                .transpose()?;
            staged.push((window, kind, root));
        }

        // Main windows ahead of floating ones, as the workspace keeps them.
        staged.sort_by_key(|(_, kind, _)| *kind == WindowKind::Floating);

        let windows: Vec<DockWindow> = staged
            .into_iter()
            .map(|(saved, kind, root)| {
                let geometry: Rect = saved.geometry.into();
                let mut window = self.make_window(saved.name.clone(), kind, geometry);
                let mut tree = window.layout().detached();
                tree.root = root;
                window.layout_mut().adopt(tree);
                window
            })
            .collect();

        log::debug!("Restored {} window(s)", windows.len());
        self.replace_windows(windows);
        Ok(())
    }

    pub fn restore_json(&mut self, data: &str, directory: &dyn PanelDirectory) -> Result<(), PersistError> {
        let saved = SavedLayout::from_json(data)?;
        self.restore(&saved, directory)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn saved_node_json_shape() {
        let node = SavedNode::Container {
            orientation: "horizontal".into(),
            children: vec![
                SavedChild {
                    weight: 0.5,
                    node: SavedNode::Item {
                        panels: vec!["a".into()],
                        current: 0,
                        visible: true,
                    },
                },
                SavedChild {
                    weight: 0.5,
                    node: SavedNode::Item {
                        panels: vec!["b".into()],
                        current: 0,
                        visible: false,
                    },
                },
            ],
        };
        let value = serde_json::to_value(&node).unwrap();
        assert_eq!(value["type"], "container");
        assert_eq!(value["orientation"], "horizontal");
        assert_eq!(value["children"][0]["node"]["type"], "item");
        assert_eq!(value["children"][1]["node"]["visible"], false);
    }

    #[test]
    fn item_defaults_when_fields_missing() {
        let node: SavedNode = serde_json::from_str(r#"{"type":"item","panels":["a"]}"#).unwrap();
        assert_eq!(
            node,
            SavedNode::Item {
                panels: vec!["a".into()],
                current: 0,
                visible: true,
            }
        );
    }

    #[test]
    fn unknown_node_type_is_a_parse_error() {
        let err = SavedLayout::from_json(
            r#"{"version":1,"windows":[{"name":"main","kind":"main",
               "geometry":{"x":0,"y":0,"width":10,"height":10},
               "root":{"type":"grid"}}]}"#,
        )
        .unwrap_err();
        assert!(matches!(err, PersistError::Parse(_)));
    }
}

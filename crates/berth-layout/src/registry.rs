// Dock registry: the catalog of live panels, looked up by unique name when a
// layout is restored and by id when one is saved.

use std::collections::{BTreeMap, HashMap};

use berth_core::{PanelDirectory, PanelHandle, PanelId, SizeConstraints};

use crate::RegistryError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PanelEntry {
    pub id: PanelId,
    /// Stable name persisted in saved layouts.
    pub name: String,
    /// User-visible title.
    pub title: String,
    pub constraints: SizeConstraints,
}

impl PanelEntry {
    pub fn handle(&self) -> PanelHandle {
        PanelHandle::with_constraints(self.id, self.constraints)
    }
}

#[derive(Debug)]
pub struct DockRegistry {
    panels: BTreeMap<PanelId, PanelEntry>,
    by_name: HashMap<String, PanelId>,
    next_id: PanelId,
}

impl DockRegistry {
    pub fn new() -> Self {
        Self {
            panels: BTreeMap::new(),
            by_name: HashMap::new(),
            next_id: 1,
        }
    }

    pub fn register(
        &mut self,
        name: &str,
        title: &str,
        constraints: SizeConstraints,
    ) -> Result<PanelHandle, RegistryError> {
        if self.by_name.contains_key(name) {
            return Err(RegistryError::DuplicateName(name.to_string()));
        }
        let id = self.next_id;
        self.next_id += 1;

        let entry = PanelEntry {
            id,
            name: name.to_string(),
            title: title.to_string(),
            constraints,
        };
        let handle = entry.handle();
        self.by_name.insert(entry.name.clone(), id);
        self.panels.insert(id, entry);
        log::debug!("Registered panel {} as {}", name, id);
        Ok(handle)
    }

    /// Forget a panel. Undocking it from any layout is the caller's job.
    pub fn unregister(&mut self, id: PanelId) -> Result<PanelEntry, RegistryError> {
        let entry = self.panels.remove(&id).ok_or(RegistryError::UnknownPanel(id))?;
        self.by_name.remove(&entry.name);
        Ok(entry)
    }

    pub fn set_constraints(
        &mut self,
        id: PanelId,
        constraints: SizeConstraints,
    ) -> Result<PanelHandle, RegistryError> {
        let entry = self.panels.get_mut(&id).ok_or(RegistryError::UnknownPanel(id))?;
        entry.constraints = constraints;
        Ok(entry.handle())
    }

    pub fn entry(&self, id: PanelId) -> Option<&PanelEntry> {
        self.panels.get(&id)
    }

    pub fn entries(&self) -> impl Iterator<Item = &PanelEntry> {
        self.panels.values()
    }

    pub fn len(&self) -> usize {
        self.panels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.panels.is_empty()
    }
}

impl Default for DockRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl PanelDirectory for DockRegistry {
    fn resolve_panel(&self, name: &str) -> Option<PanelHandle> {
        let id = self.by_name.get(name)?;
        self.panels.get(id).map(PanelEntry::handle)
    }

    fn panel_handle(&self, id: PanelId) -> Option<PanelHandle> {
        self.panels.get(&id).map(PanelEntry::handle)
    }

    fn panel_name(&self, id: PanelId) -> Option<&str> {
        self.panels.get(&id).map(|e| e.name.as_str())
    }
}

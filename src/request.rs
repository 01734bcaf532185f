use crate::error::RequestError;
use crate::hierarchy::{EntityHierarchy, EntityId, SceneHierarchy};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::Path;

/// One slot of the entity list, with its grouping flag carried alongside.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ToggleEntry {
    pub entity: EntityId,
    pub include_in_combined: bool,
    pub initial_state: bool,
}

/// Everything a generation run needs, assembled once by the caller.
///
/// `initial_states` is keyed by toggle unit name and takes precedence over
/// the per-entry `initial_state` flags.
#[derive(Debug, Clone, Default)]
pub struct GenerationRequest {
    pub entries: Vec<Option<ToggleEntry>>,
    pub save_location: String,
    pub setup_integration: bool,
    pub initial_states: BTreeMap<String, bool>,
}

impl GenerationRequest {
    pub fn new(save_location: impl Into<String>) -> Self {
        Self { save_location: save_location.into(), ..Self::default() }
    }

    pub fn with_entry(mut self, entity: EntityId, include_in_combined: bool) -> Self {
        self.entries.push(Some(ToggleEntry { entity, include_in_combined, initial_state: false }));
        self
    }

    pub fn with_absent_slot(mut self) -> Self {
        self.entries.push(None);
        self
    }

    pub fn with_initial_state(mut self, unit_name: impl Into<String>, active: bool) -> Self {
        self.initial_states.insert(unit_name.into(), active);
        self
    }

    pub fn with_integration(mut self, enabled: bool) -> Self {
        self.setup_integration = enabled;
        self
    }

    pub fn present_entries(&self) -> impl Iterator<Item = &ToggleEntry> {
        self.entries.iter().flatten()
    }

    pub fn validate<H: EntityHierarchy + ?Sized>(&self, hierarchy: &H) -> Result<(), RequestError> {
        if self.save_location.trim().is_empty() {
            return Err(RequestError::EmptySaveLocation);
        }
        let mut seen = HashSet::new();
        for (slot, entry) in self.entries.iter().enumerate() {
            let Some(entry) = entry else {
                continue;
            };
            let name = hierarchy
                .name(entry.entity)
                .map_err(|source| RequestError::Entity { slot, source })?;
            hierarchy.root(entry.entity).map_err(|source| RequestError::Entity { slot, source })?;
            if !seen.insert(entry.entity) {
                return Err(RequestError::DuplicateEntity(name.to_string()));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestEntryFile {
    /// Entity name, or its address (`Left/Hat`) when the name is not unique.
    pub name: String,
    #[serde(default)]
    pub combined: bool,
    #[serde(default)]
    pub initial_state: bool,
}

/// JSON form of a request; entities are referenced by hierarchy name or
/// address and `null` marks an empty slot.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RequestFile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub save_location: Option<String>,
    #[serde(default)]
    pub setup_integration: bool,
    #[serde(default)]
    pub entities: Vec<Option<RequestEntryFile>>,
    #[serde(default)]
    pub initial_states: BTreeMap<String, bool>,
}

impl RequestFile {
    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes = fs::read(path).with_context(|| format!("Reading request file {}", path.display()))?;
        let request = serde_json::from_slice(&bytes)
            .with_context(|| format!("Parsing request file {}", path.display()))?;
        Ok(request)
    }

    pub fn resolve(
        &self,
        hierarchy: &SceneHierarchy,
        default_save_location: &str,
    ) -> Result<GenerationRequest, RequestError> {
        let mut entries = Vec::with_capacity(self.entities.len());
        for (slot, entry) in self.entities.iter().enumerate() {
            let Some(entry) = entry else {
                entries.push(None);
                continue;
            };
            let entity =
                hierarchy.lookup(&entry.name).map_err(|source| RequestError::Entity { slot, source })?;
            entries.push(Some(ToggleEntry {
                entity,
                include_in_combined: entry.combined,
                initial_state: entry.initial_state,
            }));
        }
        Ok(GenerationRequest {
            entries,
            save_location: self
                .save_location
                .clone()
                .unwrap_or_else(|| default_save_location.to_string()),
            setup_integration: self.setup_integration,
            initial_states: self.initial_states.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::HierarchyError;

    fn scene() -> (SceneHierarchy, EntityId, EntityId) {
        let mut scene = SceneHierarchy::new();
        let root = scene.add_root("Avatar");
        let hat = scene.add_child(root, "Hat");
        let bag = scene.add_child(root, "Bag");
        (scene, hat, bag)
    }

    #[test]
    fn validate_rejects_blank_save_location() {
        let (scene, hat, _) = scene();
        let request = GenerationRequest::new("  ").with_entry(hat, true);
        assert!(matches!(request.validate(&scene), Err(RequestError::EmptySaveLocation)));
    }

    #[test]
    fn validate_rejects_unknown_and_repeated_entities() {
        let (scene, hat, _) = scene();
        let unknown = GenerationRequest::new("Assets").with_entry(EntityId(42), false);
        assert!(matches!(
            unknown.validate(&scene),
            Err(RequestError::Entity { slot: 0, source: HierarchyError::UnknownEntity(_) })
        ));
        let repeated = GenerationRequest::new("Assets").with_entry(hat, false).with_entry(hat, true);
        assert!(matches!(repeated.validate(&scene), Err(RequestError::DuplicateEntity(name)) if name == "Hat"));
    }

    #[test]
    fn validate_skips_absent_slots() {
        let (scene, hat, bag) = scene();
        let request =
            GenerationRequest::new("Assets").with_entry(hat, true).with_absent_slot().with_entry(bag, false);
        request.validate(&scene).expect("absent slots are not errors");
        assert_eq!(request.present_entries().count(), 2);
    }

    #[test]
    fn request_file_resolves_names_and_keeps_null_slots() {
        let (scene, hat, bag) = scene();
        let file: RequestFile = serde_json::from_str(
            r#"{
                "setup_integration": true,
                "entities": [
                    { "name": "Hat", "combined": true },
                    null,
                    { "name": "Bag", "initial_state": true }
                ],
                "initial_states": { "Hat": true }
            }"#,
        )
        .expect("parse request file");
        let request = file.resolve(&scene, "Assets/Default").expect("resolve request");
        assert_eq!(request.save_location, "Assets/Default");
        assert!(request.setup_integration);
        assert_eq!(request.entries.len(), 3);
        assert_eq!(request.entries[0].map(|entry| entry.entity), Some(hat));
        assert!(request.entries[1].is_none());
        let bag_entry = request.entries[2].expect("bag entry");
        assert_eq!(bag_entry.entity, bag);
        assert!(!bag_entry.include_in_combined);
        assert!(bag_entry.initial_state);
        assert_eq!(request.initial_states.get("Hat"), Some(&true));
    }

    #[test]
    fn request_file_reports_missing_names_with_slot() {
        let (scene, _, _) = scene();
        let file = RequestFile {
            entities: vec![None, Some(RequestEntryFile { name: "Ghost".into(), combined: false, initial_state: false })],
            ..RequestFile::default()
        };
        let err = file.resolve(&scene, "Assets").unwrap_err();
        assert!(matches!(err, RequestError::Entity { slot: 1, .. }));
        assert!(err.to_string().contains("Ghost"));
    }

    #[test]
    fn request_file_targets_repeated_names_by_address() {
        let mut scene = SceneHierarchy::new();
        let root = scene.add_root("Avatar");
        let left = scene.add_child(root, "Left");
        let left_hat = scene.add_child(left, "Hat");
        let right = scene.add_child(root, "Right");
        let right_hat = scene.add_child(right, "Hat");
        let file: RequestFile = serde_json::from_str(
            r#"{ "entities": [ { "name": "Left/Hat" }, { "name": "Right/Hat", "combined": true } ] }"#,
        )
        .expect("parse request file");
        let request = file.resolve(&scene, "Assets").expect("resolve request");
        let entities: Vec<_> = request.present_entries().map(|entry| entry.entity).collect();
        assert_eq!(entities, [left_hat, right_hat]);

        let bare = RequestFile {
            entities: vec![Some(RequestEntryFile { name: "Hat".into(), combined: false, initial_state: false })],
            ..RequestFile::default()
        };
        assert!(matches!(
            bare.resolve(&scene, "Assets"),
            Err(RequestError::Entity { slot: 0, source: HierarchyError::DuplicateName(_) })
        ));
    }
}

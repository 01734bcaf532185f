use crate::error::HierarchyError;
use crate::naming;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(pub usize);

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Read-only view of a strict tree of named entities.
pub trait EntityHierarchy {
    fn node_count(&self) -> usize;

    fn name(&self, id: EntityId) -> Result<&str, HierarchyError>;

    fn parent(&self, id: EntityId) -> Result<Option<EntityId>, HierarchyError>;

    fn root(&self, id: EntityId) -> Result<EntityId, HierarchyError> {
        let mut current = id;
        let mut steps = 0usize;
        while let Some(parent) = self.parent(current)? {
            steps += 1;
            if steps > self.node_count() {
                return Err(HierarchyError::Cycle(id));
            }
            current = parent;
        }
        Ok(current)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SceneNode {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<usize>,
}

/// Flat node list where each node stores the index of its parent.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SceneHierarchy {
    #[serde(default)]
    pub nodes: Vec<SceneNode>,
}

impl SceneHierarchy {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_root(&mut self, name: impl Into<String>) -> EntityId {
        self.nodes.push(SceneNode { name: name.into(), parent: None });
        EntityId(self.nodes.len() - 1)
    }

    pub fn add_child(&mut self, parent: EntityId, name: impl Into<String>) -> EntityId {
        self.nodes.push(SceneNode { name: name.into(), parent: Some(parent.0) });
        EntityId(self.nodes.len() - 1)
    }

    pub fn find(&self, name: &str) -> Result<EntityId, HierarchyError> {
        let mut matches = self.nodes.iter().enumerate().filter(|(_, node)| node.name == name);
        let Some((index, _)) = matches.next() else {
            return Err(HierarchyError::NameNotFound(name.to_string()));
        };
        if matches.next().is_some() {
            return Err(HierarchyError::DuplicateName(name.to_string()));
        }
        Ok(EntityId(index))
    }

    /// Finds the entity whose address (see [`crate::naming::address_of`])
    /// equals `address`, e.g. `Left/Hat`.
    pub fn find_by_address(&self, address: &str) -> Result<EntityId, HierarchyError> {
        let mut found = None;
        for index in 0..self.nodes.len() {
            let id = EntityId(index);
            if naming::address_of(self, id)? != address {
                continue;
            }
            if found.is_some() {
                return Err(HierarchyError::DuplicateName(address.to_string()));
            }
            found = Some(id);
        }
        found.ok_or_else(|| HierarchyError::NameNotFound(address.to_string()))
    }

    /// Resolves a request key: slash-delimited keys are addresses, anything
    /// else is a plain name that must be unique in the hierarchy.
    pub fn lookup(&self, key: &str) -> Result<EntityId, HierarchyError> {
        if key.contains('/') {
            self.find_by_address(key)
        } else {
            self.find(key)
        }
    }

    /// Checks parent indices and rejects cycles.
    pub fn validate(&self) -> Result<(), HierarchyError> {
        for (index, node) in self.nodes.iter().enumerate() {
            if let Some(parent) = node.parent {
                if parent >= self.nodes.len() {
                    return Err(HierarchyError::ParentOutOfRange { entity: EntityId(index), parent });
                }
            }
        }
        for index in 0..self.nodes.len() {
            self.root(EntityId(index))?;
        }
        Ok(())
    }

    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes = fs::read(path).with_context(|| format!("Reading hierarchy file {}", path.display()))?;
        let hierarchy = serde_json::from_slice::<SceneHierarchy>(&bytes)
            .with_context(|| format!("Parsing hierarchy file {}", path.display()))?;
        hierarchy.validate().with_context(|| format!("Validating hierarchy file {}", path.display()))?;
        Ok(hierarchy)
    }

    pub fn save_to_path(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Creating hierarchy directory {}", parent.display()))?;
        }
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json.as_bytes())
            .with_context(|| format!("Writing hierarchy file {}", path.display()))?;
        Ok(())
    }

    fn node(&self, id: EntityId) -> Result<&SceneNode, HierarchyError> {
        self.nodes.get(id.0).ok_or(HierarchyError::UnknownEntity(id))
    }
}

impl EntityHierarchy for SceneHierarchy {
    fn node_count(&self) -> usize {
        self.nodes.len()
    }

    fn name(&self, id: EntityId) -> Result<&str, HierarchyError> {
        self.node(id).map(|node| node.name.as_str())
    }

    fn parent(&self, id: EntityId) -> Result<Option<EntityId>, HierarchyError> {
        let node = self.node(id)?;
        match node.parent {
            Some(parent) if parent >= self.nodes.len() => {
                Err(HierarchyError::ParentOutOfRange { entity: id, parent })
            }
            Some(parent) => Ok(Some(EntityId(parent))),
            None => Ok(None),
        }
    }
}

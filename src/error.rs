use crate::hierarchy::EntityId;
use std::io;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum HierarchyError {
    #[error("entity {0} is not part of the hierarchy")]
    UnknownEntity(EntityId),
    #[error("entity {entity} references parent index {parent} outside the node list")]
    ParentOutOfRange { entity: EntityId, parent: usize },
    #[error("entity {0} is its own ancestor; hierarchy contains a cycle")]
    Cycle(EntityId),
    #[error("no entity named '{0}' in hierarchy")]
    NameNotFound(String),
    #[error("entity name '{0}' appears more than once in hierarchy")]
    DuplicateName(String),
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error at '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: io::Error,
    },
    #[error("asset '{path}' is not valid JSON: {source}")]
    Json {
        path: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("asset '{path}' holds a {found} where a {expected} was expected")]
    WrongKind { path: String, expected: &'static str, found: &'static str },
    #[error("folder '{0}' does not exist")]
    FolderMissing(String),
    #[error("asset path '{0}' escapes the store root")]
    InvalidPath(String),
}

#[derive(Debug, Error)]
pub enum RequestError {
    #[error("save location must not be empty")]
    EmptySaveLocation,
    #[error("entry {slot}: {source}")]
    Entity {
        slot: usize,
        #[source]
        source: HierarchyError,
    },
    #[error("entity '{0}' is listed more than once")]
    DuplicateEntity(String),
}

/// Failures that stop a generation run. Soft failures (a clip that cannot be
/// loaded back for binding) are reported as events instead.
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("save location '{0}' does not exist")]
    SaveLocationMissing(String),
    #[error(transparent)]
    Request(#[from] RequestError),
    #[error(transparent)]
    Hierarchy(#[from] HierarchyError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("toggle unit name '{name}' is derived by more than one unit")]
    NameCollision { name: String },
    #[error("template document '{path}' is missing")]
    TemplateDocumentMissing { path: String },
}

pub type GenerationResult<T> = std::result::Result<T, GenerationError>;

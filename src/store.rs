//! Asset persistence. Paths are `/`-separated and relative to the store
//! root; saving to an existing path overwrites it in place.

use crate::clip::ToggleClip;
use crate::descriptor::{ExpressionMenu, ExpressionParameters, IntegrationDescriptor};
use crate::error::StoreError;
use crate::machine::ToggleController;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Component, Path, PathBuf};
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "data", rename_all = "snake_case")]
pub enum Artifact {
    Clip(ToggleClip),
    Controller(ToggleController),
    Parameters(ExpressionParameters),
    Menu(ExpressionMenu),
    Integration(IntegrationDescriptor),
}

impl Artifact {
    pub fn kind_label(&self) -> &'static str {
        match self {
            Artifact::Clip(_) => "clip",
            Artifact::Controller(_) => "controller",
            Artifact::Parameters(_) => "parameter list",
            Artifact::Menu(_) => "menu",
            Artifact::Integration(_) => "integration descriptor",
        }
    }
}

/// Typed access to one [`Artifact`] variant.
pub trait StoredAsset: Clone + Sized {
    const KIND: &'static str;

    fn into_artifact(self) -> Artifact;

    fn from_artifact(artifact: Artifact) -> Result<Self, Artifact>;
}

macro_rules! stored_asset {
    ($ty:ty, $variant:ident, $label:literal) => {
        impl StoredAsset for $ty {
            const KIND: &'static str = $label;

            fn into_artifact(self) -> Artifact {
                Artifact::$variant(self)
            }

            fn from_artifact(artifact: Artifact) -> Result<Self, Artifact> {
                match artifact {
                    Artifact::$variant(inner) => Ok(inner),
                    other => Err(other),
                }
            }
        }
    };
}

stored_asset!(ToggleClip, Clip, "clip");
stored_asset!(ToggleController, Controller, "controller");
stored_asset!(ExpressionParameters, Parameters, "parameter list");
stored_asset!(ExpressionMenu, Menu, "menu");
stored_asset!(IntegrationDescriptor, Integration, "integration descriptor");

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetHandle {
    pub path: String,
    /// blake3 hex digest of the serialized asset.
    pub content_hash: String,
    pub bytes: usize,
}

pub trait AssetStore {
    fn folder_exists(&self, path: &str) -> bool;

    fn save(&mut self, path: &str, artifact: &Artifact) -> Result<AssetHandle, StoreError>;

    fn load(&self, path: &str) -> Result<Option<Artifact>, StoreError>;

    /// Duplicates the folder `from` as `to`. Returns `false` without copying
    /// anything when `to` already exists.
    fn copy_folder(&mut self, from: &str, to: &str) -> Result<bool, StoreError>;
}

pub fn save_asset<S, T>(store: &mut S, path: &str, asset: &T) -> Result<AssetHandle, StoreError>
where
    S: AssetStore + ?Sized,
    T: StoredAsset,
{
    store.save(path, &asset.clone().into_artifact())
}

pub fn load_asset<S, T>(store: &S, path: &str) -> Result<Option<T>, StoreError>
where
    S: AssetStore + ?Sized,
    T: StoredAsset,
{
    match store.load(path)? {
        None => Ok(None),
        Some(artifact) => T::from_artifact(artifact).map(Some).map_err(|other| StoreError::WrongKind {
            path: path.to_string(),
            expected: T::KIND,
            found: other.kind_label(),
        }),
    }
}

/// Stores each asset as a pretty-printed JSON file below `root`.
#[derive(Debug, Clone)]
pub struct FsAssetStore {
    root: PathBuf,
}

impl FsAssetStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn resolve(&self, path: &str) -> Result<PathBuf, StoreError> {
        let relative = Path::new(path);
        let escapes = relative
            .components()
            .any(|component| !matches!(component, Component::Normal(_) | Component::CurDir));
        if path.trim().is_empty() || escapes {
            return Err(StoreError::InvalidPath(path.to_string()));
        }
        Ok(self.root.join(relative))
    }

    /// Creates a folder (and its parents) below the root.
    pub fn create_folder(&self, path: &str) -> Result<(), StoreError> {
        let full = self.resolve(path)?;
        fs::create_dir_all(&full).map_err(|source| StoreError::Io { path: path.to_string(), source })
    }
}

fn copy_dir_recursive(from: &Path, to: &Path, label: &str) -> Result<usize, StoreError> {
    let io_err = |source| StoreError::Io { path: label.to_string(), source };
    fs::create_dir_all(to).map_err(io_err)?;
    let mut copied = 0;
    for entry in fs::read_dir(from).map_err(io_err)? {
        let entry = entry.map_err(io_err)?;
        let target = to.join(entry.file_name());
        if entry.file_type().map_err(io_err)?.is_dir() {
            copied += copy_dir_recursive(&entry.path(), &target, label)?;
        } else {
            fs::copy(entry.path(), &target).map_err(io_err)?;
            copied += 1;
        }
    }
    Ok(copied)
}

impl AssetStore for FsAssetStore {
    fn folder_exists(&self, path: &str) -> bool {
        self.resolve(path).map(|full| full.is_dir()).unwrap_or(false)
    }

    fn save(&mut self, path: &str, artifact: &Artifact) -> Result<AssetHandle, StoreError> {
        let full = self.resolve(path)?;
        if let Some(parent) = full.parent() {
            fs::create_dir_all(parent).map_err(|source| StoreError::Io { path: path.to_string(), source })?;
        }
        let json = serde_json::to_vec_pretty(artifact)
            .map_err(|source| StoreError::Json { path: path.to_string(), source })?;
        fs::write(&full, &json).map_err(|source| StoreError::Io { path: path.to_string(), source })?;
        let content_hash = blake3::hash(&json).to_hex().to_string();
        debug!(path, kind = artifact.kind_label(), bytes = json.len(), "asset written");
        Ok(AssetHandle { path: path.to_string(), content_hash, bytes: json.len() })
    }

    fn load(&self, path: &str) -> Result<Option<Artifact>, StoreError> {
        let full = self.resolve(path)?;
        if !full.is_file() {
            return Ok(None);
        }
        let bytes = fs::read(&full).map_err(|source| StoreError::Io { path: path.to_string(), source })?;
        let artifact = serde_json::from_slice(&bytes)
            .map_err(|source| StoreError::Json { path: path.to_string(), source })?;
        Ok(Some(artifact))
    }

    fn copy_folder(&mut self, from: &str, to: &str) -> Result<bool, StoreError> {
        let source = self.resolve(from)?;
        let target = self.resolve(to)?;
        if !source.is_dir() {
            return Err(StoreError::FolderMissing(from.to_string()));
        }
        if target.exists() {
            return Ok(false);
        }
        let copied = copy_dir_recursive(&source, &target, to)?;
        debug!(from, to, copied, "folder duplicated");
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::ExpressionParameter;

    #[test]
    fn save_then_load_typed_asset() {
        let dir = tempfile::tempdir().expect("temp dir");
        let mut store = FsAssetStore::new(dir.path());
        let params = ExpressionParameters::new(vec![ExpressionParameter::persisted_bool("Hat_Toggle", true)]);
        let handle = save_asset(&mut store, "Assets/Out/TAG_Param.asset", &params).expect("save");
        assert_eq!(handle.path, "Assets/Out/TAG_Param.asset");
        assert_eq!(handle.content_hash.len(), 64);
        let on_disk = store.root().join("Assets/Out/TAG_Param.asset");
        assert_eq!(fs::metadata(on_disk).expect("asset on disk").len() as usize, handle.bytes);
        let loaded: Option<ExpressionParameters> = load_asset(&store, "Assets/Out/TAG_Param.asset").expect("load");
        assert_eq!(loaded, Some(params));
    }

    #[test]
    fn missing_asset_loads_as_none() {
        let dir = tempfile::tempdir().expect("temp dir");
        let store = FsAssetStore::new(dir.path());
        let loaded: Option<ExpressionMenu> = load_asset(&store, "Assets/missing.asset").expect("load");
        assert!(loaded.is_none());
    }

    #[test]
    fn wrong_kind_is_reported() {
        let dir = tempfile::tempdir().expect("temp dir");
        let mut store = FsAssetStore::new(dir.path());
        save_asset(&mut store, "Assets/menu.asset", &ExpressionMenu::default()).expect("save");
        let err = load_asset::<_, ExpressionParameters>(&store, "Assets/menu.asset").unwrap_err();
        assert!(matches!(err, StoreError::WrongKind { expected: "parameter list", found: "menu", .. }));
    }

    #[test]
    fn overwrite_keeps_single_file_and_stable_hash() {
        let dir = tempfile::tempdir().expect("temp dir");
        let mut store = FsAssetStore::new(dir.path());
        let menu = ExpressionMenu::default();
        let first = save_asset(&mut store, "Assets/m.asset", &menu).unwrap();
        let second = save_asset(&mut store, "Assets/m.asset", &menu).unwrap();
        assert_eq!(first, second);
        assert_eq!(fs::read_dir(dir.path().join("Assets")).unwrap().count(), 1);
    }

    #[test]
    fn paths_cannot_escape_root() {
        let dir = tempfile::tempdir().expect("temp dir");
        let store = FsAssetStore::new(dir.path());
        assert!(matches!(store.resolve("../outside.asset"), Err(StoreError::InvalidPath(_))));
        assert!(matches!(store.resolve(""), Err(StoreError::InvalidPath(_))));
        assert!(!store.folder_exists("../"));
    }

    #[test]
    fn copy_folder_never_overwrites_existing_destination() {
        let dir = tempfile::tempdir().expect("temp dir");
        let mut store = FsAssetStore::new(dir.path());
        save_asset(&mut store, "Template/TAG_Menu.asset", &ExpressionMenu::default()).unwrap();
        assert!(store.copy_folder("Template", "Out/Copy").unwrap());
        assert!(store.folder_exists("Out/Copy"));
        assert!(load_asset::<_, ExpressionMenu>(&store, "Out/Copy/TAG_Menu.asset").unwrap().is_some());
        assert!(!store.copy_folder("Template", "Out/Copy").unwrap());
        assert!(matches!(store.copy_folder("Nope", "Out/Other"), Err(StoreError::FolderMissing(_))));
    }
}

pub mod clip;
pub mod config;
pub mod descriptor;
pub mod error;
pub mod events;
pub mod generator;
pub mod grouping;
pub mod hierarchy;
pub mod machine;
pub mod naming;
pub mod pipeline;
pub mod reconcile;
pub mod request;
pub mod store;
pub mod validation;

pub use config::{CollisionPolicy, ConfigOverrides, GeneratorConfig};
pub use error::{GenerationError, GenerationResult};
pub use hierarchy::{EntityHierarchy, EntityId, SceneHierarchy};
pub use pipeline::{GenerationReport, Pipeline};
pub use request::{GenerationRequest, RequestFile};
pub use store::{AssetStore, FsAssetStore};

use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::Path;
use tracing::warn;

/// What to do when two toggle units derive the same name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum CollisionPolicy {
    /// Log and record an event, then continue; later assets overwrite earlier ones.
    #[default]
    Warn,
    /// Abort the run before anything is written.
    Error,
    /// Continue without any diagnostic.
    Overwrite,
}

impl CollisionPolicy {
    pub fn label(self) -> &'static str {
        match self {
            CollisionPolicy::Warn => "warn",
            CollisionPolicy::Error => "error",
            CollisionPolicy::Overwrite => "overwrite",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.to_ascii_lowercase().as_str() {
            "warn" => Some(CollisionPolicy::Warn),
            "error" => Some(CollisionPolicy::Error),
            "overwrite" => Some(CollisionPolicy::Overwrite),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct GeneratorConfig {
    #[serde(default = "GeneratorConfig::default_save_location")]
    pub save_location: String,
    #[serde(default = "GeneratorConfig::default_template_folder")]
    pub template_folder: String,
    #[serde(default = "GeneratorConfig::default_menu_label")]
    pub menu_label: String,
    #[serde(default = "GeneratorConfig::default_installer_object_name")]
    pub installer_object_name: String,
    #[serde(default)]
    pub collision_policy: CollisionPolicy,
}

#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub save_location: Option<String>,
    pub template_folder: Option<String>,
    pub collision_policy: Option<CollisionPolicy>,
}

impl GeneratorConfig {
    fn default_save_location() -> String {
        "Assets/ToggleGenerator/Animations".to_string()
    }

    fn default_template_folder() -> String {
        "Assets/ToggleGenerator/TAG_Base".to_string()
    }

    fn default_menu_label() -> String {
        "ToggleAnimGenerator".to_string()
    }

    fn default_installer_object_name() -> String {
        "MA_ToggleAnim".to_string()
    }
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            save_location: Self::default_save_location(),
            template_folder: Self::default_template_folder(),
            menu_label: Self::default_menu_label(),
            installer_object_name: Self::default_installer_object_name(),
            collision_policy: CollisionPolicy::default(),
        }
    }
}

impl GeneratorConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes =
            fs::read(path).with_context(|| format!("Failed to read config file {}", path.display()))?;
        let cfg = serde_json::from_slice(&bytes)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;
        Ok(cfg)
    }

    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        match Self::load(path) {
            Ok(cfg) => cfg,
            Err(err) => {
                warn!(error = ?err, "config load failed; falling back to defaults");
                Self::default()
            }
        }
    }

    pub fn apply_overrides(&mut self, overrides: &ConfigOverrides) {
        if let Some(save_location) = &overrides.save_location {
            self.save_location = save_location.clone();
        }
        if let Some(template_folder) = &overrides.template_folder {
            self.template_folder = template_folder.clone();
        }
        if let Some(policy) = overrides.collision_policy {
            self.collision_policy = policy;
        }
    }
}

impl ConfigOverrides {
    pub fn is_empty(&self) -> bool {
        self.save_location.is_none() && self.template_folder.is_none() && self.collision_policy.is_none()
    }

    pub fn applied_fields(&self) -> Vec<&'static str> {
        let mut fields = Vec::new();
        if self.save_location.is_some() {
            fields.push("save_location");
        }
        if self.template_folder.is_some() {
            fields.push("template_folder");
        }
        if self.collision_policy.is_some() {
            fields.push("collision_policy");
        }
        fields
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_take_defaults() {
        let cfg: GeneratorConfig =
            serde_json::from_str(r#"{ "menu_label": "Outfit", "collision_policy": "error" }"#).expect("parse");
        assert_eq!(cfg.menu_label, "Outfit");
        assert_eq!(cfg.collision_policy, CollisionPolicy::Error);
        assert_eq!(cfg.save_location, "Assets/ToggleGenerator/Animations");
        assert_eq!(cfg.installer_object_name, "MA_ToggleAnim");
    }

    #[test]
    fn load_or_default_falls_back_on_missing_file() {
        let cfg = GeneratorConfig::load_or_default("does/not/exist.json");
        assert_eq!(cfg.template_folder, "Assets/ToggleGenerator/TAG_Base");
    }

    #[test]
    fn overrides_apply_only_set_fields() {
        let mut cfg = GeneratorConfig::default();
        let overrides = ConfigOverrides {
            save_location: Some("Assets/Custom".into()),
            collision_policy: Some(CollisionPolicy::Overwrite),
            ..ConfigOverrides::default()
        };
        assert!(!overrides.is_empty());
        assert_eq!(overrides.applied_fields(), vec!["save_location", "collision_policy"]);
        cfg.apply_overrides(&overrides);
        assert_eq!(cfg.save_location, "Assets/Custom");
        assert_eq!(cfg.template_folder, "Assets/ToggleGenerator/TAG_Base");
        assert_eq!(cfg.collision_policy, CollisionPolicy::Overwrite);
    }

    #[test]
    fn policy_parses_case_insensitively() {
        assert_eq!(CollisionPolicy::parse("ERROR"), Some(CollisionPolicy::Error));
        assert_eq!(CollisionPolicy::parse("later"), None);
        assert_eq!(CollisionPolicy::Warn.label(), "warn");
    }
}

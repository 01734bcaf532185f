//! Menu and parameter documents plus the descriptor handed to the installer.
//!
//! Fields a record does not model are kept in its `extra` map and written
//! back unchanged.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueType {
    Int,
    Float,
    Bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpressionParameter {
    pub name: String,
    pub value_type: ValueType,
    #[serde(default)]
    pub default_value: f32,
    #[serde(default)]
    pub saved: bool,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ExpressionParameter {
    pub fn new(name: impl Into<String>, value_type: ValueType, default_value: f32, saved: bool) -> Self {
        Self { name: name.into(), value_type, default_value, saved, extra: Map::new() }
    }

    pub fn persisted_bool(name: impl Into<String>, default: bool) -> Self {
        Self::new(name, ValueType::Bool, bool_value(default), true)
    }
}

/// Ordered parameter list exposed for external synchronisation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExpressionParameters {
    #[serde(default)]
    pub parameters: Vec<ExpressionParameter>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ExpressionParameters {
    pub fn new(parameters: Vec<ExpressionParameter>) -> Self {
        Self { parameters, extra: Map::new() }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ControlKind {
    Button,
    Toggle,
    SubMenu,
    TwoAxisPuppet,
    FourAxisPuppet,
    RadialPuppet,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MenuControl {
    pub name: String,
    pub kind: ControlKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parameter: Option<String>,
    #[serde(default)]
    pub value: f32,
    /// Asset path of the referenced menu for `SubMenu` controls.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub_menu: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl MenuControl {
    pub fn toggle(parameter: impl Into<String>, default: bool) -> Self {
        let parameter = parameter.into();
        Self {
            name: parameter.clone(),
            kind: ControlKind::Toggle,
            parameter: Some(parameter),
            value: bool_value(default),
            sub_menu: None,
            extra: Map::new(),
        }
    }

    pub fn sub_menu(label: impl Into<String>, menu_path: impl Into<String>) -> Self {
        Self {
            name: label.into(),
            kind: ControlKind::SubMenu,
            parameter: None,
            value: 0.0,
            sub_menu: Some(menu_path.into()),
            extra: Map::new(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExpressionMenu {
    #[serde(default)]
    pub controls: Vec<MenuControl>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ExpressionMenu {
    pub fn new(controls: Vec<MenuControl>) -> Self {
        Self { controls, extra: Map::new() }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PathMode {
    Relative,
    Absolute,
}

/// How the generated controller is merged onto the target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergeFlags {
    pub delete_attached_animator: bool,
    pub match_write_defaults: bool,
    pub path_mode: PathMode,
}

impl Default for MergeFlags {
    fn default() -> Self {
        Self { delete_attached_animator: false, match_write_defaults: true, path_mode: PathMode::Absolute }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterConfig {
    pub name_or_prefix: String,
    pub sync: ValueType,
    pub default_value: f32,
    pub saved: bool,
    #[serde(default)]
    pub remap_to: String,
}

impl From<&ExpressionParameter> for ParameterConfig {
    fn from(param: &ExpressionParameter) -> Self {
        Self {
            name_or_prefix: param.name.clone(),
            sync: param.value_type,
            default_value: param.default_value,
            saved: param.saved,
            remap_to: String::new(),
        }
    }
}

/// Bundle handed to the installer: where to attach and what to attach.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntegrationDescriptor {
    pub install_target: String,
    pub object_name: String,
    pub controller: String,
    pub parameters_asset: String,
    pub menu: String,
    #[serde(default)]
    pub parameters: Vec<ParameterConfig>,
    #[serde(default)]
    pub merge: MergeFlags,
}

pub trait IntegrationInstaller {
    fn merge_controller(&mut self, target: &str, object_name: &str, controller: &str, flags: MergeFlags) -> Result<()>;

    fn declare_parameters(&mut self, target: &str, object_name: &str, parameters: &[ParameterConfig]) -> Result<()>;

    fn install_menu(&mut self, target: &str, object_name: &str, menu: &str) -> Result<()>;
}

pub fn install<I: IntegrationInstaller + ?Sized>(descriptor: &IntegrationDescriptor, installer: &mut I) -> Result<()> {
    let target = descriptor.install_target.as_str();
    let object = descriptor.object_name.as_str();
    installer
        .merge_controller(target, object, &descriptor.controller, descriptor.merge)
        .with_context(|| format!("Merging controller {} onto '{target}'", descriptor.controller))?;
    installer
        .declare_parameters(target, object, &descriptor.parameters)
        .with_context(|| format!("Declaring {} parameters on '{target}'", descriptor.parameters.len()))?;
    installer
        .install_menu(target, object, &descriptor.menu)
        .with_context(|| format!("Installing menu {} on '{target}'", descriptor.menu))?;
    Ok(())
}

fn bool_value(value: bool) -> f32 {
    if value {
        1.0
    } else {
        0.0
    }
}

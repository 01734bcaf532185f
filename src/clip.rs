use crate::error::HierarchyError;
use crate::grouping::ToggleUnit;
use crate::hierarchy::EntityHierarchy;
use crate::naming;
use serde::{Deserialize, Serialize};

pub const CLIP_VERSION: u32 = 1;
pub const ACTIVATION_ATTRIBUTE: &str = "m_IsActive";
/// Time of the second key; both keys carry the same value.
pub const HOLD_KEY_TIME: f32 = 0.01;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClipKeyframe {
    pub time: f32,
    pub value: f32,
}

/// Drives one entity's activation flag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivationCurve {
    pub path: String,
    #[serde(default = "default_attribute")]
    pub attribute: String,
    pub keyframes: Vec<ClipKeyframe>,
}

fn default_attribute() -> String {
    ACTIVATION_ATTRIBUTE.to_string()
}

impl ActivationCurve {
    pub fn constant(path: impl Into<String>, active: bool) -> Self {
        let value = if active { 1.0 } else { 0.0 };
        Self {
            path: path.into(),
            attribute: default_attribute(),
            keyframes: vec![ClipKeyframe { time: 0.0, value }, ClipKeyframe { time: HOLD_KEY_TIME, value }],
        }
    }

    /// The held value, if every key agrees on it.
    pub fn constant_value(&self) -> Option<f32> {
        let first = self.keyframes.first()?.value;
        self.keyframes.iter().all(|key| (key.value - first).abs() <= f32::EPSILON).then_some(first)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToggleClip {
    pub version: u32,
    pub name: String,
    #[serde(default)]
    pub curves: Vec<ActivationCurve>,
}

impl ToggleClip {
    pub fn duration(&self) -> f32 {
        self.curves
            .iter()
            .filter_map(|curve| curve.keyframes.last().map(|key| key.time))
            .fold(0.0, f32::max)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClipPair {
    pub on: ToggleClip,
    pub off: ToggleClip,
}

impl ClipPair {
    pub fn clip(&self, active: bool) -> &ToggleClip {
        if active {
            &self.on
        } else {
            &self.off
        }
    }
}

pub fn build_clip<H: EntityHierarchy + ?Sized>(
    unit: &ToggleUnit,
    hierarchy: &H,
    active: bool,
) -> Result<ToggleClip, HierarchyError> {
    let curves = unit
        .members
        .iter()
        .map(|member| naming::address_of(hierarchy, *member).map(|path| ActivationCurve::constant(path, active)))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(ToggleClip { version: CLIP_VERSION, name: naming::clip_name(&unit.name, active), curves })
}

pub fn build_clip_pair<H: EntityHierarchy + ?Sized>(
    unit: &ToggleUnit,
    hierarchy: &H,
) -> Result<ClipPair, HierarchyError> {
    Ok(ClipPair { on: build_clip(unit, hierarchy, true)?, off: build_clip(unit, hierarchy, false)? })
}

use crate::clip::{ToggleClip, ACTIVATION_ATTRIBUTE, HOLD_KEY_TIME};
use crate::machine::{ConditionMode, SwitchMachine, ToggleController};
use crate::store::Artifact;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum ValidationSeverity {
    Info,
    Warning,
    Error,
}

impl fmt::Display for ValidationSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationSeverity::Info => write!(f, "info"),
            ValidationSeverity::Warning => write!(f, "warning"),
            ValidationSeverity::Error => write!(f, "error"),
        }
    }
}

#[derive(Clone, Debug)]
pub struct ValidationEvent {
    pub severity: ValidationSeverity,
    pub path: PathBuf,
    pub message: String,
}

pub struct AssetValidator;

impl AssetValidator {
    /// Validate the generated asset at `path`. When `store_root` is given,
    /// controller motions are also checked for existence below it.
    pub fn validate_path(path: &Path, store_root: Option<&Path>) -> Vec<ValidationEvent> {
        if !path.exists() {
            return vec![Self::event(
                path,
                ValidationSeverity::Warning,
                "File not found (it may have been removed).",
            )];
        }
        let bytes = match fs::read(path) {
            Ok(bytes) => bytes,
            Err(err) => {
                return vec![Self::event(path, ValidationSeverity::Error, format!("Failed to read asset: {err}"))];
            }
        };
        match serde_json::from_slice::<Artifact>(&bytes) {
            Ok(artifact) => Self::validate_artifact(path, &artifact, store_root),
            Err(err) => vec![Self::event(path, ValidationSeverity::Error, format!("Not a generated asset: {err}"))],
        }
    }

    pub fn validate_artifact(path: &Path, artifact: &Artifact, store_root: Option<&Path>) -> Vec<ValidationEvent> {
        match artifact {
            Artifact::Clip(clip) => Self::validate_clip(path, clip),
            Artifact::Controller(controller) => Self::validate_controller(path, controller, store_root),
            other => vec![Self::event(
                path,
                ValidationSeverity::Info,
                format!("No validators available for {} assets.", other.kind_label()),
            )],
        }
    }

    fn validate_clip(path: &Path, clip: &ToggleClip) -> Vec<ValidationEvent> {
        let mut events = Vec::new();
        if clip.curves.is_empty() {
            events.push(Self::event(
                path,
                ValidationSeverity::Warning,
                format!("Clip '{}' does not define any curves.", clip.name),
            ));
        }
        for curve in &clip.curves {
            if curve.attribute != ACTIVATION_ATTRIBUTE {
                events.push(Self::event(
                    path,
                    ValidationSeverity::Error,
                    format!("Curve '{}' targets '{}' instead of {ACTIVATION_ATTRIBUTE}.", curve.path, curve.attribute),
                ));
            }
            if curve.keyframes.len() != 2 {
                events.push(Self::event(
                    path,
                    ValidationSeverity::Error,
                    format!("Curve '{}' has {} keys; expected 2.", curve.path, curve.keyframes.len()),
                ));
                continue;
            }
            let times = (curve.keyframes[0].time, curve.keyframes[1].time);
            if times.0.abs() > f32::EPSILON || (times.1 - HOLD_KEY_TIME).abs() > f32::EPSILON {
                events.push(Self::event(
                    path,
                    ValidationSeverity::Warning,
                    format!("Curve '{}' keys sit at {:.3}/{:.3}; expected 0.000/{HOLD_KEY_TIME:.3}.", curve.path, times.0, times.1),
                ));
            }
            match curve.constant_value() {
                Some(value) if value == 0.0 || value == 1.0 => {}
                Some(value) => events.push(Self::event(
                    path,
                    ValidationSeverity::Error,
                    format!("Curve '{}' holds {value}; activation values must be 0 or 1.", curve.path),
                )),
                None => events.push(Self::event(
                    path,
                    ValidationSeverity::Error,
                    format!("Curve '{}' keys disagree; toggle curves must hold one value.", curve.path),
                )),
            }
        }
        events.push(Self::event(
            path,
            ValidationSeverity::Info,
            format!("Clip '{}' checked: {} curve(s), duration {:.3}s", clip.name, clip.curves.len(), clip.duration()),
        ));
        events
    }

    fn validate_controller(path: &Path, controller: &ToggleController, store_root: Option<&Path>) -> Vec<ValidationEvent> {
        let mut events = Vec::new();
        for layer in &controller.layers {
            Self::validate_layer(path, layer, store_root, &mut events);
        }
        events.push(Self::event(
            path,
            ValidationSeverity::Info,
            format!("Controller '{}' checked: {} layer(s)", controller.name, controller.layers.len()),
        ));
        events
    }

    fn validate_layer(path: &Path, layer: &SwitchMachine, store_root: Option<&Path>, events: &mut Vec<ValidationEvent>) {
        let name = &layer.layer;
        if layer.states.len() != 2 {
            events.push(Self::event(
                path,
                ValidationSeverity::Error,
                format!("Layer '{name}' has {} states; expected ON and OFF.", layer.states.len()),
            ));
        }
        if layer.transitions.len() != 2 {
            events.push(Self::event(
                path,
                ValidationSeverity::Error,
                format!("Layer '{name}' has {} transitions; expected 2.", layer.transitions.len()),
            ));
        }
        if !layer.states.iter().any(|state| state.name == layer.default_state) {
            events.push(Self::event(
                path,
                ValidationSeverity::Error,
                format!("Layer '{name}' enters unknown state '{}'.", layer.default_state),
            ));
        }
        for (active, mode) in [(true, ConditionMode::If), (false, ConditionMode::IfNot)] {
            let guarded = layer.transition_into(active).is_some_and(|transition| {
                transition.conditions.len() == 1
                    && transition.conditions[0].mode == mode
                    && transition.conditions[0].parameter == layer.parameter.name
            });
            if !guarded {
                events.push(Self::event(
                    path,
                    ValidationSeverity::Error,
                    format!("Layer '{name}' lacks a {mode:?} transition on '{}'.", layer.parameter.name),
                ));
            }
        }
        for transition in &layer.transitions {
            if transition.has_exit_time {
                events.push(Self::event(
                    path,
                    ValidationSeverity::Error,
                    format!("Transition {} -> {} waits for exit time.", transition.from, transition.to),
                ));
            }
            if transition.duration != 0.0 {
                events.push(Self::event(
                    path,
                    ValidationSeverity::Warning,
                    format!("Transition {} -> {} blends over {:.3}s.", transition.from, transition.to, transition.duration),
                ));
            }
        }
        for state in &layer.states {
            match (&state.motion, store_root) {
                (None, _) => events.push(Self::event(
                    path,
                    ValidationSeverity::Warning,
                    format!("State '{}' has no motion bound.", state.name),
                )),
                (Some(motion), Some(root)) if !root.join(motion).is_file() => events.push(Self::event(
                    path,
                    ValidationSeverity::Warning,
                    format!("State '{}' references missing clip '{motion}'.", state.name),
                )),
                _ => {}
            }
        }
    }

    fn event(path: &Path, severity: ValidationSeverity, message: impl Into<String>) -> ValidationEvent {
        ValidationEvent { severity, path: path.to_path_buf(), message: message.into() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clip::{ActivationCurve, ClipKeyframe, CLIP_VERSION};

    fn worst(events: &[ValidationEvent]) -> ValidationSeverity {
        events.iter().map(|event| event.severity).max().unwrap_or(ValidationSeverity::Info)
    }

    #[test]
    fn severity_display_formats() {
        assert_eq!(ValidationSeverity::Info.to_string(), "info");
        assert_eq!(ValidationSeverity::Warning.to_string(), "warning");
        assert_eq!(ValidationSeverity::Error.to_string(), "error");
    }

    #[test]
    fn validator_reports_missing_file() {
        let events = AssetValidator::validate_path(Path::new("foo/bar.anim"), None);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].severity, ValidationSeverity::Warning);
        assert!(events[0].message.contains("not found"));
    }

    #[test]
    fn generated_clip_passes() {
        let clip = ToggleClip {
            version: CLIP_VERSION,
            name: "Hat_ON".into(),
            curves: vec![ActivationCurve::constant("Body/Hat", true)],
        };
        let events = AssetValidator::validate_artifact(Path::new("Hat_ON.anim"), &Artifact::Clip(clip), None);
        assert_eq!(worst(&events), ValidationSeverity::Info);
    }

    #[test]
    fn single_key_curve_is_an_error() {
        let mut curve = ActivationCurve::constant("Hat", false);
        curve.keyframes = vec![ClipKeyframe { time: 0.0, value: 0.0 }];
        let clip = ToggleClip { version: CLIP_VERSION, name: "Hat_OFF".into(), curves: vec![curve] };
        let events = AssetValidator::validate_artifact(Path::new("Hat_OFF.anim"), &Artifact::Clip(clip), None);
        assert_eq!(worst(&events), ValidationSeverity::Error);
    }

    #[test]
    fn unbound_and_missing_motions_warn() {
        let mut controller = ToggleController::new("Hat_ToggleLayer");
        let mut machine = SwitchMachine::new("Hat", false);
        machine.bind_motion(true, Some("Assets/Hat_ON.anim".into()));
        controller.layers.push(machine);
        let dir = tempfile::tempdir().expect("temp dir");
        let events = AssetValidator::validate_artifact(
            Path::new("Hat.controller"),
            &Artifact::Controller(controller),
            Some(dir.path()),
        );
        assert_eq!(worst(&events), ValidationSeverity::Warning);
        assert_eq!(events.iter().filter(|event| event.severity == ValidationSeverity::Warning).count(), 2);
    }

    #[test]
    fn exit_time_transition_is_an_error() {
        let mut machine = SwitchMachine::new("Hat", false);
        machine.bind_motion(true, Some("a".into()));
        machine.bind_motion(false, Some("b".into()));
        machine.transitions[0].has_exit_time = true;
        let mut controller = ToggleController::new("Hat_ToggleLayer");
        controller.layers.push(machine);
        let events =
            AssetValidator::validate_artifact(Path::new("Hat.controller"), &Artifact::Controller(controller), None);
        assert!(events.iter().any(|event| event.severity == ValidationSeverity::Error
            && event.message.contains("exit time")));
    }

    #[test]
    fn unknown_default_state_is_an_error() {
        let mut machine = SwitchMachine::new("Hat", true);
        machine.bind_motion(true, Some("a".into()));
        machine.bind_motion(false, Some("b".into()));
        machine.default_state = "Hat_IDLE".into();
        let mut controller = ToggleController::new("Hat_ToggleLayer");
        controller.layers.push(machine);
        let events =
            AssetValidator::validate_artifact(Path::new("Hat.controller"), &Artifact::Controller(controller), None);
        assert!(events.iter().any(|event| event.severity == ValidationSeverity::Error
            && event.message.contains("Hat_IDLE")));
    }
}

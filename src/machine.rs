use crate::naming;
use serde::{Deserialize, Serialize};

pub const CONTROLLER_VERSION: u32 = 1;
pub const DEFAULT_LAYER_WEIGHT: f32 = 1.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParameterKind {
    Bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SwitchParameter {
    pub name: String,
    pub kind: ParameterKind,
    pub default_bool: bool,
}

/// `If` passes while the parameter is true, `IfNot` while it is false.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConditionMode {
    If,
    IfNot,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransitionCondition {
    pub mode: ConditionMode,
    pub parameter: String,
    #[serde(default)]
    pub threshold: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SwitchTransition {
    pub from: String,
    pub to: String,
    pub has_exit_time: bool,
    pub duration: f32,
    pub conditions: Vec<TransitionCondition>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SwitchState {
    pub name: String,
    /// Asset path of the bound clip. `None` when the clip could not be
    /// loaded at bind time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub motion: Option<String>,
}

/// Two-state ON/OFF layer driven by one boolean parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SwitchMachine {
    pub layer: String,
    pub default_weight: f32,
    pub parameter: SwitchParameter,
    /// State the layer enters on load; always the ON state.
    pub default_state: String,
    pub states: Vec<SwitchState>,
    pub transitions: Vec<SwitchTransition>,
}

impl SwitchMachine {
    /// Builds the layer with unbound states; motions are attached afterwards
    /// with [`SwitchMachine::bind_motion`].
    pub fn new(unit_name: &str, initial_state: bool) -> Self {
        let toggle = naming::toggle_name(unit_name);
        let on = naming::clip_name(unit_name, true);
        let off = naming::clip_name(unit_name, false);
        let transition = |from: &str, to: &str, mode: ConditionMode| SwitchTransition {
            from: from.to_string(),
            to: to.to_string(),
            has_exit_time: false,
            duration: 0.0,
            conditions: vec![TransitionCondition { mode, parameter: toggle.clone(), threshold: 0.0 }],
        };
        let transitions = vec![transition(&off, &on, ConditionMode::If), transition(&on, &off, ConditionMode::IfNot)];
        Self {
            layer: toggle.clone(),
            default_weight: DEFAULT_LAYER_WEIGHT,
            parameter: SwitchParameter { name: toggle, kind: ParameterKind::Bool, default_bool: initial_state },
            default_state: on.clone(),
            states: vec![SwitchState { name: on, motion: None }, SwitchState { name: off, motion: None }],
            transitions,
        }
    }

    fn state_index(&self, active: bool) -> Option<usize> {
        let suffix = format!("_{}", naming::state_label(active));
        self.states.iter().position(|state| state.name.ends_with(&suffix))
    }

    pub fn state(&self, active: bool) -> Option<&SwitchState> {
        self.state_index(active).and_then(|index| self.states.get(index))
    }

    pub fn bind_motion(&mut self, active: bool, motion: Option<String>) {
        if let Some(index) = self.state_index(active) {
            if let Some(state) = self.states.get_mut(index) {
                state.motion = motion;
            }
        }
    }

    /// Transition entering the ON (`true`) or OFF (`false`) state.
    pub fn transition_into(&self, active: bool) -> Option<&SwitchTransition> {
        let target = self.state(active)?;
        self.transitions.iter().find(|transition| transition.to == target.name)
    }

    pub fn unbound_states(&self) -> impl Iterator<Item = &SwitchState> {
        self.states.iter().filter(|state| state.motion.is_none())
    }
}

/// Controller asset holding every switch layer of one run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToggleController {
    pub version: u32,
    pub name: String,
    #[serde(default)]
    pub layers: Vec<SwitchMachine>,
}

impl ToggleController {
    pub fn new(name: impl Into<String>) -> Self {
        Self { version: CONTROLLER_VERSION, name: name.into(), layers: Vec::new() }
    }

    pub fn parameters(&self) -> impl Iterator<Item = &SwitchParameter> {
        self.layers.iter().map(|layer| &layer.parameter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn machine_has_two_guarded_immediate_transitions() {
        let machine = SwitchMachine::new("Hat", true);
        assert_eq!(machine.layer, "Hat_Toggle");
        assert_eq!(machine.parameter.name, "Hat_Toggle");
        assert!(machine.parameter.default_bool);
        assert_eq!(machine.states.len(), 2);
        assert_eq!(machine.transitions.len(), 2);

        let to_on = machine.transition_into(true).expect("OFF -> ON");
        assert_eq!((to_on.from.as_str(), to_on.to.as_str()), ("Hat_OFF", "Hat_ON"));
        assert_eq!(to_on.conditions[0].mode, ConditionMode::If);

        let to_off = machine.transition_into(false).expect("ON -> OFF");
        assert_eq!((to_off.from.as_str(), to_off.to.as_str()), ("Hat_ON", "Hat_OFF"));
        assert_eq!(to_off.conditions[0].mode, ConditionMode::IfNot);

        for transition in &machine.transitions {
            assert!(!transition.has_exit_time);
            assert_eq!(transition.duration, 0.0);
            assert_eq!(transition.conditions.len(), 1);
            assert_eq!(transition.conditions[0].parameter, "Hat_Toggle");
        }
    }

    #[test]
    fn layer_enters_on_state_whatever_the_parameter_default() {
        for initial_state in [true, false] {
            let machine = SwitchMachine::new("Hat", initial_state);
            assert_eq!(machine.default_state, "Hat_ON");
            assert_eq!(machine.state(true).map(|state| state.name.as_str()), Some("Hat_ON"));
        }
    }

    #[test]
    fn bind_motion_targets_matching_state() {
        let mut machine = SwitchMachine::new("Hat", false);
        assert_eq!(machine.unbound_states().count(), 2);
        machine.bind_motion(true, Some("Assets/Hat_ON.anim".into()));
        assert_eq!(machine.state(true).and_then(|state| state.motion.as_deref()), Some("Assets/Hat_ON.anim"));
        assert!(machine.state(false).unwrap().motion.is_none());
        assert_eq!(machine.unbound_states().count(), 1);
    }

    #[test]
    fn unit_names_ending_in_state_labels_still_resolve() {
        let machine = SwitchMachine::new("LIGHT_ON", false);
        assert_eq!(machine.state(true).unwrap().name, "LIGHT_ON_ON");
        assert_eq!(machine.state(false).unwrap().name, "LIGHT_ON_OFF");
    }

    #[test]
    fn controller_lists_parameters_in_layer_order() {
        let mut controller = ToggleController::new("A_B_C_ToggleLayer");
        controller.layers.push(SwitchMachine::new("A_B", true));
        controller.layers.push(SwitchMachine::new("C", false));
        let params: Vec<_> = controller.parameters().map(|param| (param.name.as_str(), param.default_bool)).collect();
        assert_eq!(params, [("A_B_Toggle", true), ("C_Toggle", false)]);
    }
}

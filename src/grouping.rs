use crate::error::HierarchyError;
use crate::hierarchy::{EntityHierarchy, EntityId};
use crate::naming;
use crate::request::{GenerationRequest, ToggleEntry};
use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UnitKind {
    Combined,
    Individual,
}

impl fmt::Display for UnitKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnitKind::Combined => write!(f, "combined"),
            UnitKind::Individual => write!(f, "individual"),
        }
    }
}

/// A set of entities switched together by one boolean parameter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ToggleUnit {
    pub name: String,
    pub members: Vec<EntityId>,
    pub kind: UnitKind,
    pub initial_state: bool,
}

/// Partitions the request's entries into toggle units.
///
/// Entries flagged for combination form a single combined unit, emitted
/// first; every other entry becomes an individual unit. Input order is kept
/// within each kind and absent slots are skipped.
pub fn resolve<H: EntityHierarchy + ?Sized>(
    request: &GenerationRequest,
    hierarchy: &H,
) -> Result<Vec<ToggleUnit>, HierarchyError> {
    let (combined, individual): (Vec<&ToggleEntry>, Vec<&ToggleEntry>) =
        request.present_entries().partition(|entry| entry.include_in_combined);

    let mut units = Vec::with_capacity(individual.len() + 1);
    if let Some(first) = combined.first() {
        let names = combined.iter().map(|entry| hierarchy.name(entry.entity)).collect::<Result<Vec<_>, _>>()?;
        let name = naming::joined_name(names);
        let initial_state = request.initial_states.get(&name).copied().unwrap_or(first.initial_state);
        units.push(ToggleUnit {
            members: combined.iter().map(|entry| entry.entity).collect(),
            kind: UnitKind::Combined,
            initial_state,
            name,
        });
    }
    for entry in individual {
        let name = hierarchy.name(entry.entity)?.to_string();
        let initial_state = request.initial_states.get(&name).copied().unwrap_or(entry.initial_state);
        units.push(ToggleUnit { members: vec![entry.entity], kind: UnitKind::Individual, initial_state, name });
    }
    Ok(units)
}

/// `_`-join of every present entity name in input order, independent of
/// grouping. Names the run's controller and template copy.
pub fn run_name<H: EntityHierarchy + ?Sized>(
    request: &GenerationRequest,
    hierarchy: &H,
) -> Result<String, HierarchyError> {
    let names =
        request.present_entries().map(|entry| hierarchy.name(entry.entity)).collect::<Result<Vec<_>, _>>()?;
    Ok(naming::joined_name(names))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hierarchy::SceneHierarchy;

    fn scene(names: &[&str]) -> (SceneHierarchy, Vec<EntityId>) {
        let mut scene = SceneHierarchy::new();
        let root = scene.add_root("Avatar");
        let ids = names.iter().map(|name| scene.add_child(root, *name)).collect();
        (scene, ids)
    }

    #[test]
    fn combined_unit_comes_first_then_individuals() {
        let (scene, ids) = scene(&["A", "B", "C"]);
        let request = GenerationRequest::new("Assets")
            .with_entry(ids[0], true)
            .with_entry(ids[1], true)
            .with_entry(ids[2], false)
            .with_initial_state("A_B", true)
            .with_initial_state("C", false);
        let units = resolve(&request, &scene).expect("resolve units");
        assert_eq!(
            units,
            vec![
                ToggleUnit {
                    name: "A_B".into(),
                    members: vec![ids[0], ids[1]],
                    kind: UnitKind::Combined,
                    initial_state: true
                },
                ToggleUnit { name: "C".into(), members: vec![ids[2]], kind: UnitKind::Individual, initial_state: false },
            ]
        );
    }

    #[test]
    fn combined_members_keep_input_order_when_interleaved() {
        let (scene, ids) = scene(&["A", "B", "C", "D"]);
        let request = GenerationRequest::new("Assets")
            .with_entry(ids[0], false)
            .with_entry(ids[1], true)
            .with_entry(ids[2], false)
            .with_entry(ids[3], true);
        let units = resolve(&request, &scene).unwrap();
        let names: Vec<_> = units.iter().map(|unit| unit.name.as_str()).collect();
        assert_eq!(names, ["B_D", "A", "C"]);
        assert_eq!(units[0].members, vec![ids[1], ids[3]]);
    }

    #[test]
    fn every_entity_lands_in_exactly_one_unit() {
        let (scene, ids) = scene(&["A", "B", "C", "D", "E"]);
        let request = ids.iter().enumerate().fold(GenerationRequest::new("Assets"), |request, (index, id)| {
            request.with_entry(*id, index % 2 == 0)
        });
        let units = resolve(&request, &scene).unwrap();
        let mut members: Vec<_> = units.iter().flat_map(|unit| unit.members.iter().copied()).collect();
        members.sort();
        assert_eq!(members, ids);
    }

    #[test]
    fn empty_and_all_combined_inputs() {
        let (scene, ids) = scene(&["A", "B"]);
        assert!(resolve(&GenerationRequest::new("Assets"), &scene).unwrap().is_empty());
        let request = GenerationRequest::new("Assets").with_entry(ids[0], true).with_entry(ids[1], true);
        let units = resolve(&request, &scene).unwrap();
        assert_eq!(units.len(), 1);
        assert_eq!(units[0].kind, UnitKind::Combined);
    }

    #[test]
    fn absent_slot_is_skipped() {
        let (scene, ids) = scene(&["A", "B"]);
        let request =
            GenerationRequest::new("Assets").with_entry(ids[0], false).with_absent_slot().with_entry(ids[1], false);
        let units = resolve(&request, &scene).unwrap();
        assert_eq!(units.len(), 2);
        assert_eq!(run_name(&request, &scene).unwrap(), "A_B");
    }

    #[test]
    fn initial_state_falls_back_to_entry_flag() {
        let (scene, ids) = scene(&["A", "B"]);
        let mut request = GenerationRequest::new("Assets").with_entry(ids[0], true).with_entry(ids[1], false);
        for entry in request.entries.iter_mut().flatten() {
            entry.initial_state = true;
        }
        let units = resolve(&request, &scene).unwrap();
        assert!(units.iter().all(|unit| unit.initial_state));
        let overridden = request.with_initial_state("B", false);
        let units = resolve(&overridden, &scene).unwrap();
        assert!(units[0].initial_state);
        assert!(!units[1].initial_state);
    }

    #[test]
    fn run_name_spans_all_entities_not_only_combined() {
        let (scene, ids) = scene(&["A", "B", "C"]);
        let request = GenerationRequest::new("Assets")
            .with_entry(ids[2], false)
            .with_entry(ids[0], true)
            .with_entry(ids[1], false);
        assert_eq!(run_name(&request, &scene).unwrap(), "C_A_B");
    }
}

//! Deterministic names and addresses for everything a run produces.
//!
//! Asset paths are `/`-separated strings relative to the asset store root,
//! e.g. `Assets/Toggles/Hat_ON.anim`.

use crate::error::HierarchyError;
use crate::hierarchy::{EntityHierarchy, EntityId};
use std::collections::BTreeMap;

pub const CLIP_EXTENSION: &str = "anim";
pub const CONTROLLER_SUFFIX: &str = "_ToggleLayer.controller";
pub const TEMPLATE_FOLDER_PREFIX: &str = "TAG_Base_";
pub const TEMPLATE_MENU: &str = "TAG_Menu.asset";
pub const TEMPLATE_MAIN_MENU: &str = "TAG_Menu_Main.asset";
pub const TEMPLATE_PARAMETERS: &str = "TAG_Param.asset";
pub const INTEGRATION_DESCRIPTOR: &str = "TAG_Integration.json";

/// Slash-delimited path from the entity's root (exclusive) down to the
/// entity. A direct child of the root, or the root itself, is addressed by
/// its own name.
pub fn address_of<H: EntityHierarchy + ?Sized>(hierarchy: &H, entity: EntityId) -> Result<String, HierarchyError> {
    let root = hierarchy.root(entity)?;
    let mut segments = vec![hierarchy.name(entity)?];
    let mut current = entity;
    while let Some(parent) = hierarchy.parent(current)? {
        if parent == root {
            break;
        }
        segments.push(hierarchy.name(parent)?);
        current = parent;
    }
    segments.reverse();
    Ok(segments.join("/"))
}

pub fn joined_name<'a>(names: impl IntoIterator<Item = &'a str>) -> String {
    names.into_iter().collect::<Vec<_>>().join("_")
}

pub fn state_label(active: bool) -> &'static str {
    if active {
        "ON"
    } else {
        "OFF"
    }
}

/// Name shared by a unit's clip and its matching layer state.
pub fn clip_name(unit_name: &str, active: bool) -> String {
    format!("{unit_name}_{}", state_label(active))
}

/// Name shared by a unit's layer and its driving parameter.
pub fn toggle_name(unit_name: &str) -> String {
    format!("{unit_name}_Toggle")
}

pub fn asset_path(folder: &str, file_name: &str) -> String {
    let folder = folder.trim_end_matches('/');
    if folder.is_empty() {
        file_name.to_string()
    } else {
        format!("{folder}/{file_name}")
    }
}

pub fn clip_path(save_location: &str, unit_name: &str, active: bool) -> String {
    asset_path(save_location, &format!("{}.{CLIP_EXTENSION}", clip_name(unit_name, active)))
}

pub fn controller_path(save_location: &str, run_name: &str) -> String {
    asset_path(save_location, &format!("{run_name}{CONTROLLER_SUFFIX}"))
}

pub fn template_copy_folder(save_location: &str, run_name: &str) -> String {
    asset_path(save_location, &format!("{TEMPLATE_FOLDER_PREFIX}{run_name}"))
}

/// Names that more than one unit derived, in first-seen order.
pub fn find_collisions<'a>(names: impl IntoIterator<Item = &'a str>) -> Vec<String> {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    let mut order = Vec::new();
    for name in names {
        let count = counts.entry(name).or_insert(0);
        *count += 1;
        if *count == 2 {
            order.push(name.to_string());
        }
    }
    order
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hierarchy::SceneHierarchy;

    #[test]
    fn direct_child_is_addressed_by_name() {
        let mut scene = SceneHierarchy::new();
        let root = scene.add_root("Avatar");
        let hat = scene.add_child(root, "Hat");
        assert_eq!(address_of(&scene, hat).unwrap(), "Hat");
    }

    #[test]
    fn nested_entity_includes_ancestors_below_root() {
        let mut scene = SceneHierarchy::new();
        let root = scene.add_root("Avatar");
        let armature = scene.add_child(root, "Armature");
        let hips = scene.add_child(armature, "Hips");
        let charm = scene.add_child(hips, "Charm");
        assert_eq!(address_of(&scene, hips).unwrap(), "Armature/Hips");
        assert_eq!(address_of(&scene, charm).unwrap(), "Armature/Hips/Charm");
    }

    #[test]
    fn root_is_addressed_by_its_own_name() {
        let mut scene = SceneHierarchy::new();
        let root = scene.add_root("Prop");
        assert_eq!(address_of(&scene, root).unwrap(), "Prop");
    }

    #[test]
    fn derived_names_follow_conventions() {
        assert_eq!(joined_name(["A", "B", "C"]), "A_B_C");
        assert_eq!(clip_name("A_B", true), "A_B_ON");
        assert_eq!(clip_name("A_B", false), "A_B_OFF");
        assert_eq!(toggle_name("C"), "C_Toggle");
        assert_eq!(clip_path("Assets/Out/", "C", true), "Assets/Out/C_ON.anim");
        assert_eq!(controller_path("Assets/Out", "A_B_C"), "Assets/Out/A_B_C_ToggleLayer.controller");
        assert_eq!(template_copy_folder("Assets/Out", "A_B_C"), "Assets/Out/TAG_Base_A_B_C");
    }

    #[test]
    fn collisions_are_reported_once_each() {
        let names = ["A_B", "C", "A_B", "A_B", "C", "D"];
        assert_eq!(find_collisions(names), vec!["A_B".to_string(), "C".to_string()]);
        assert!(find_collisions(["X", "Y"]).is_empty());
    }
}

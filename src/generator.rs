use crate::clip::{build_clip_pair, ClipPair, ToggleClip};
use crate::error::GenerationResult;
use crate::events::{EventLog, GenerationEvent};
use crate::grouping::ToggleUnit;
use crate::hierarchy::EntityHierarchy;
use crate::machine::SwitchMachine;
use crate::naming;
use crate::store::{load_asset, save_asset, AssetHandle, AssetStore};
use tracing::{info, warn};

#[derive(Debug, Clone)]
pub struct GeneratedUnit {
    pub clips: ClipPair,
    pub machine: SwitchMachine,
    pub clip_handles: Vec<AssetHandle>,
}

/// Builds and persists a unit's ON/OFF clips, then builds its switch layer
/// bound to the clips read back from the store.
///
/// A clip that cannot be read back leaves its state without a motion; the
/// layer is still returned.
pub fn generate<H, S>(
    unit: &ToggleUnit,
    hierarchy: &H,
    store: &mut S,
    save_location: &str,
    log: &mut EventLog,
) -> GenerationResult<GeneratedUnit>
where
    H: EntityHierarchy + ?Sized,
    S: AssetStore + ?Sized,
{
    let clips = build_clip_pair(unit, hierarchy)?;
    let mut clip_handles = Vec::with_capacity(2);
    for active in [true, false] {
        let path = naming::clip_path(save_location, &unit.name, active);
        let handle = save_asset(store, &path, clips.clip(active))?;
        info!(unit = %unit.name, path = %handle.path, curves = clips.clip(active).curves.len(), "clip saved");
        log.push(GenerationEvent::ClipSaved { unit: unit.name.clone(), path: handle.path.clone() });
        clip_handles.push(handle);
    }

    let mut machine = SwitchMachine::new(&unit.name, unit.initial_state);
    for active in [true, false] {
        let path = naming::clip_path(save_location, &unit.name, active);
        let state = naming::clip_name(&unit.name, active);
        match load_asset::<_, ToggleClip>(store, &path) {
            Ok(Some(_)) => machine.bind_motion(active, Some(path)),
            Ok(None) => {
                warn!(unit = %unit.name, state = %state, path = %path, "clip not found; state left without motion");
                log.push(GenerationEvent::MotionMissing { unit: unit.name.clone(), state, path });
            }
            Err(err) => {
                warn!(unit = %unit.name, state = %state, path = %path, error = %err, "clip unreadable; state left without motion");
                log.push(GenerationEvent::MotionMissing { unit: unit.name.clone(), state, path });
            }
        }
    }
    Ok(GeneratedUnit { clips, machine, clip_handles })
}

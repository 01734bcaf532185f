use crate::config::{CollisionPolicy, GeneratorConfig};
use crate::descriptor::IntegrationDescriptor;
use crate::error::{GenerationError, GenerationResult};
use crate::events::{EventLog, GenerationEvent};
use crate::generator::{generate, GeneratedUnit};
use crate::grouping::{self, ToggleUnit, UnitKind};
use crate::hierarchy::EntityHierarchy;
use crate::machine::{SwitchParameter, ToggleController};
use crate::naming;
use crate::reconcile::{reconcile, ReconcilePlan, Reconciliation};
use crate::request::GenerationRequest;
use crate::store::{save_asset, AssetHandle, AssetStore};
use tracing::{debug, field, info, info_span, warn};
use uuid::Uuid;

#[derive(Debug)]
pub struct GenerationReport {
    pub run_id: Uuid,
    pub run_name: String,
    pub units: Vec<ToggleUnit>,
    pub generated: Vec<GeneratedUnit>,
    pub controller: Option<(ToggleController, AssetHandle)>,
    pub reconciliation: Option<Reconciliation>,
    pub events: Vec<GenerationEvent>,
}

impl GenerationReport {
    pub fn descriptor(&self) -> Option<&IntegrationDescriptor> {
        self.reconciliation.as_ref().map(|reconciliation| &reconciliation.descriptor)
    }

    pub fn clip_paths(&self) -> Vec<&str> {
        self.generated
            .iter()
            .flat_map(|unit| unit.clip_handles.iter().map(|handle| handle.path.as_str()))
            .collect()
    }

    pub fn warnings(&self) -> impl Iterator<Item = &GenerationEvent> {
        self.events.iter().filter(|event| event.is_warning())
    }
}

/// Runs grouping, generation and (optionally) reconciliation for a request.
///
/// Runs are not atomic: anything persisted before a failure stays in the
/// store.
pub struct Pipeline<'a, H: ?Sized, S: ?Sized> {
    hierarchy: &'a H,
    store: &'a mut S,
    config: &'a GeneratorConfig,
}

impl<'a, H, S> Pipeline<'a, H, S>
where
    H: EntityHierarchy + ?Sized,
    S: AssetStore + ?Sized,
{
    pub fn new(hierarchy: &'a H, store: &'a mut S, config: &'a GeneratorConfig) -> Self {
        Self { hierarchy, store, config }
    }

    pub fn run(&mut self, request: &GenerationRequest) -> GenerationResult<GenerationReport> {
        let run_id = Uuid::new_v4();
        let span = info_span!("generation", %run_id, run_name = field::Empty);
        let _guard = span.enter();

        request.validate(self.hierarchy)?;
        if !self.store.folder_exists(&request.save_location) {
            return Err(GenerationError::SaveLocationMissing(request.save_location.clone()));
        }

        let units = grouping::resolve(request, self.hierarchy)?;
        let run_name = grouping::run_name(request, self.hierarchy)?;
        span.record("run_name", run_name.as_str());
        let mut log = EventLog::default();
        self.check_collisions(&units, &mut log)?;

        if units.is_empty() {
            info!("no entities selected; nothing to generate");
            return Ok(GenerationReport {
                run_id,
                run_name,
                units,
                generated: Vec::new(),
                controller: None,
                reconciliation: None,
                events: log.drain(),
            });
        }
        info!(units = units.len(), "generation started");

        let mut generated = Vec::with_capacity(units.len());
        for unit in &units {
            debug!(unit = %unit.name, kind = %unit.kind, members = unit.members.len(), "unit resolved");
            log.push(GenerationEvent::UnitResolved {
                unit: unit.name.clone(),
                members: unit.members.len(),
                combined: unit.kind == UnitKind::Combined,
            });
            generated.push(generate(unit, self.hierarchy, &mut *self.store, &request.save_location, &mut log)?);
        }

        let controller_path = naming::controller_path(&request.save_location, &run_name);
        let mut controller = ToggleController::new(format!("{run_name}_ToggleLayer"));
        controller.layers = generated.iter().map(|unit| unit.machine.clone()).collect();
        let handle = save_asset(&mut *self.store, &controller_path, &controller)?;
        info!(path = %handle.path, layers = controller.layers.len(), "controller saved");
        log.push(GenerationEvent::ControllerSaved { path: handle.path.clone(), layers: controller.layers.len() });

        let reconciliation = if request.setup_integration {
            let switches: Vec<SwitchParameter> = controller.parameters().cloned().collect();
            let install_target = self.install_target(request)?;
            let plan = ReconcilePlan {
                save_location: &request.save_location,
                run_name: &run_name,
                template_folder: &self.config.template_folder,
                menu_label: &self.config.menu_label,
                controller_path: &controller_path,
                install_target: &install_target,
                object_name: &self.config.installer_object_name,
            };
            Some(reconcile(&mut *self.store, &plan, &switches, &mut log)?)
        } else {
            None
        };

        let report = GenerationReport {
            run_id,
            run_name,
            units,
            generated,
            controller: Some((controller, handle)),
            reconciliation,
            events: log.drain(),
        };
        info!(clips = report.clip_paths().len(), warnings = report.warnings().count(), "generation finished");
        Ok(report)
    }

    fn check_collisions(&self, units: &[ToggleUnit], log: &mut EventLog) -> GenerationResult<()> {
        let collisions = naming::find_collisions(units.iter().map(|unit| unit.name.as_str()));
        for name in collisions {
            match self.config.collision_policy {
                CollisionPolicy::Error => return Err(GenerationError::NameCollision { name }),
                CollisionPolicy::Warn => {
                    warn!(
                        name = %name,
                        policy = self.config.collision_policy.label(),
                        "several toggle units share a name; later assets overwrite earlier ones"
                    );
                    log.push(GenerationEvent::NameCollision { name });
                }
                CollisionPolicy::Overwrite => {}
            }
        }
        Ok(())
    }

    /// Name of the hierarchy root that owns the first selected entity.
    fn install_target(&self, request: &GenerationRequest) -> GenerationResult<String> {
        match request.present_entries().next() {
            Some(entry) => {
                let root = self.hierarchy.root(entry.entity)?;
                Ok(self.hierarchy.name(root)?.to_string())
            }
            None => Ok(String::new()),
        }
    }
}

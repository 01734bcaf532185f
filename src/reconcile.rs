use crate::descriptor::{
    ExpressionMenu, ExpressionParameter, ExpressionParameters, IntegrationDescriptor, MenuControl, MergeFlags,
    ParameterConfig,
};
use crate::error::{GenerationError, GenerationResult, StoreError};
use crate::events::{EventLog, GenerationEvent};
use crate::machine::SwitchParameter;
use crate::naming;
use crate::store::{load_asset, save_asset, AssetStore, StoredAsset};
use tracing::{info, warn};

/// Where the reconciler reads from and what it attaches.
#[derive(Debug, Clone)]
pub struct ReconcilePlan<'a> {
    pub save_location: &'a str,
    pub run_name: &'a str,
    pub template_folder: &'a str,
    pub menu_label: &'a str,
    pub controller_path: &'a str,
    pub install_target: &'a str,
    pub object_name: &'a str,
}

#[derive(Debug, Clone)]
pub struct Reconciliation {
    pub folder: String,
    pub template_copied: bool,
    pub parameters: ExpressionParameters,
    pub main_menu: ExpressionMenu,
    pub menu: ExpressionMenu,
    pub descriptor: IntegrationDescriptor,
    pub descriptor_path: String,
}

/// Appends one submenu control to `menu` and, per switch parameter, one
/// toggle to `main_menu` and one persisted bool entry to `parameters`.
/// Existing entries are left untouched and in place.
pub fn merge_documents(
    menu: &mut ExpressionMenu,
    main_menu: &mut ExpressionMenu,
    parameters: &mut ExpressionParameters,
    switches: &[SwitchParameter],
    menu_label: &str,
    main_menu_path: &str,
) {
    menu.controls.push(MenuControl::sub_menu(menu_label, main_menu_path));
    main_menu
        .controls
        .extend(switches.iter().map(|switch| MenuControl::toggle(switch.name.as_str(), switch.default_bool)));
    parameters
        .parameters
        .extend(switches.iter().map(|switch| ExpressionParameter::persisted_bool(switch.name.as_str(), switch.default_bool)));
}

fn load_required<S, T>(store: &S, path: &str) -> GenerationResult<T>
where
    S: AssetStore + ?Sized,
    T: StoredAsset,
{
    load_asset(store, path)?.ok_or_else(|| GenerationError::TemplateDocumentMissing { path: path.to_string() })
}

/// Duplicates the template folder for this run, merges the switches into its
/// documents and writes the integration descriptor next to them.
///
/// All three documents are loaded before any of them is changed, and every
/// change is applied in memory before the first save.
pub fn reconcile<S>(
    store: &mut S,
    plan: &ReconcilePlan<'_>,
    switches: &[SwitchParameter],
    log: &mut EventLog,
) -> GenerationResult<Reconciliation>
where
    S: AssetStore + ?Sized,
{
    let folder = naming::template_copy_folder(plan.save_location, plan.run_name);
    let template_copied = match store.copy_folder(plan.template_folder, &folder) {
        Ok(copied) => copied,
        Err(StoreError::FolderMissing(path)) => return Err(GenerationError::TemplateDocumentMissing { path }),
        Err(err) => return Err(err.into()),
    };
    if template_copied {
        info!(folder = %folder, template = plan.template_folder, "template folder duplicated");
        log.push(GenerationEvent::TemplateCopied { folder: folder.clone() });
    } else {
        warn!(folder = %folder, "template copy already exists; appending to its documents");
        log.push(GenerationEvent::TemplateReused { folder: folder.clone() });
    }

    let menu_path = naming::asset_path(&folder, naming::TEMPLATE_MENU);
    let main_menu_path = naming::asset_path(&folder, naming::TEMPLATE_MAIN_MENU);
    let parameters_path = naming::asset_path(&folder, naming::TEMPLATE_PARAMETERS);

    let mut menu: ExpressionMenu = load_required(store, &menu_path)?;
    let mut main_menu: ExpressionMenu = load_required(store, &main_menu_path)?;
    let mut parameters: ExpressionParameters = load_required(store, &parameters_path)?;

    merge_documents(&mut menu, &mut main_menu, &mut parameters, switches, plan.menu_label, &main_menu_path);

    save_asset(store, &parameters_path, &parameters)?;
    save_asset(store, &main_menu_path, &main_menu)?;
    save_asset(store, &menu_path, &menu)?;
    info!(
        controls = main_menu.controls.len(),
        parameters = parameters.parameters.len(),
        "menu and parameter documents saved"
    );
    log.push(GenerationEvent::DocumentsReconciled {
        controls: main_menu.controls.len(),
        parameters: parameters.parameters.len(),
    });

    let descriptor = IntegrationDescriptor {
        install_target: plan.install_target.to_string(),
        object_name: plan.object_name.to_string(),
        controller: plan.controller_path.to_string(),
        parameters_asset: parameters_path,
        menu: menu_path,
        parameters: parameters.parameters.iter().map(ParameterConfig::from).collect(),
        merge: MergeFlags::default(),
    };
    let descriptor_path = naming::asset_path(&folder, naming::INTEGRATION_DESCRIPTOR);
    save_asset(store, &descriptor_path, &descriptor)?;
    info!(path = %descriptor_path, target = plan.install_target, "integration descriptor saved");
    log.push(GenerationEvent::DescriptorSaved { path: descriptor_path.clone() });

    Ok(Reconciliation { folder, template_copied, parameters, main_menu, menu, descriptor, descriptor_path })
}

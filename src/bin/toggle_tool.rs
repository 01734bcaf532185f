use anyhow::{anyhow, Context, Result};
use clap::{Args, Parser, Subcommand};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::process;
use toggle_forge::config::{CollisionPolicy, ConfigOverrides, GeneratorConfig};
use toggle_forge::grouping;
use toggle_forge::hierarchy::SceneHierarchy;
use toggle_forge::naming;
use toggle_forge::pipeline::{GenerationReport, Pipeline};
use toggle_forge::request::RequestFile;
use toggle_forge::store::FsAssetStore;
use toggle_forge::validation::{AssetValidator, ValidationEvent, ValidationSeverity};
use tracing_subscriber::EnvFilter;

const DEFAULT_LOG_FILTER: &str = "toggle_forge=info";
const DEFAULT_CONFIG_FILE: &str = "toggle_forge.json";

#[derive(Parser, Debug)]
#[command(name = "toggle_tool", about = "Generate and check entity toggle animations", version)]
struct Cli {
    /// Emit logs as JSON lines on stderr.
    #[arg(long, global = true, env = "TOGGLE_TOOL_LOG_JSON")]
    log_json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Write clips and the controller for a request, then reconcile the menu documents.
    Generate(GenerateArgs),
    /// Check generated clips and controllers.
    Validate(ValidateArgs),
    /// Print the units and asset names a request would produce.
    Inspect(InspectArgs),
}

#[derive(Args, Debug)]
struct GenerateArgs {
    #[arg(long, value_name = "FILE")]
    hierarchy: PathBuf,
    #[arg(long, value_name = "FILE")]
    request: PathBuf,
    /// Directory that store paths are resolved against.
    #[arg(long, value_name = "DIR", default_value = ".")]
    store_root: PathBuf,
    /// Defaults to ./toggle_forge.json when present.
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,
    #[arg(long)]
    save_location: Option<String>,
    #[arg(long)]
    template_folder: Option<String>,
    /// One of warn, error, overwrite.
    #[arg(long, value_parser = parse_collision_policy)]
    collision_policy: Option<CollisionPolicy>,
}

#[derive(Args, Debug)]
struct ValidateArgs {
    /// Treat warnings as errors (exit code 2).
    #[arg(long)]
    fail_on_warn: bool,
    /// Store root used to check that controller motions exist.
    #[arg(long, value_name = "DIR")]
    store_root: Option<PathBuf>,
    #[arg(required = true, value_name = "PATH")]
    paths: Vec<PathBuf>,
}

#[derive(Args, Debug)]
struct InspectArgs {
    #[arg(long, value_name = "FILE")]
    hierarchy: PathBuf,
    #[arg(long, value_name = "FILE")]
    request: PathBuf,
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.log_json);
    match run(cli.command) {
        Ok(true) => {}
        Ok(false) => process::exit(2),
        Err(err) => {
            eprintln!("toggle_tool error: {err:?}");
            process::exit(1);
        }
    }
}

fn init_logging(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.with_target(false).init();
    }
}

/// Returns `Ok(false)` when validation found problems.
fn run(command: Command) -> Result<bool> {
    match command {
        Command::Generate(args) => generate(args).map(|()| true),
        Command::Validate(args) => validate(args),
        Command::Inspect(args) => inspect(args).map(|()| true),
    }
}

fn parse_collision_policy(value: &str) -> Result<CollisionPolicy, String> {
    CollisionPolicy::parse(value).ok_or_else(|| format!("unknown collision policy '{value}' (expected warn, error or overwrite)"))
}

/// An explicit `--config` must load; the implicit default file only warns.
fn load_config(path: Option<&Path>) -> Result<GeneratorConfig> {
    match path {
        Some(path) => GeneratorConfig::load(path),
        None if Path::new(DEFAULT_CONFIG_FILE).is_file() => Ok(GeneratorConfig::load_or_default(DEFAULT_CONFIG_FILE)),
        None => Ok(GeneratorConfig::default()),
    }
}

fn generate(args: GenerateArgs) -> Result<()> {
    let mut config = load_config(args.config.as_deref())?;
    let overrides = ConfigOverrides {
        save_location: args.save_location,
        template_folder: args.template_folder,
        collision_policy: args.collision_policy,
    };
    if !overrides.is_empty() {
        tracing::debug!(fields = ?overrides.applied_fields(), "config overrides applied");
        config.apply_overrides(&overrides);
    }

    let scene = SceneHierarchy::load_from_path(&args.hierarchy)?;
    let request_file = RequestFile::load_from_path(&args.request)?;
    let request = request_file
        .resolve(&scene, &config.save_location)
        .with_context(|| format!("Resolving request {}", args.request.display()))?;

    let mut store = FsAssetStore::new(&args.store_root);
    let report = Pipeline::new(&scene, &mut store, &config)
        .run(&request)
        .with_context(|| format!("Generating toggles into '{}'", request.save_location))?;
    print_report(&report, store.root());
    Ok(())
}

fn print_report(report: &GenerationReport, root: &Path) {
    if report.units.is_empty() {
        println!("Nothing to generate (run {})", report.run_id);
        return;
    }
    println!(
        "Run '{}' ({}): {} unit(s) below {}",
        report.run_name,
        report.run_id,
        report.units.len(),
        root.display()
    );
    for handle in report.generated.iter().flat_map(|unit| &unit.clip_handles) {
        println!("  clip        {} ({} bytes)", handle.path, handle.bytes);
    }
    if let Some((controller, handle)) = &report.controller {
        println!(
            "  controller  {} ({} layers, {} bytes, {})",
            handle.path,
            controller.layers.len(),
            handle.bytes,
            handle.content_hash
        );
    }
    if let Some(reconciliation) = &report.reconciliation {
        println!("  descriptor  {}", reconciliation.descriptor_path);
        println!(
            "  documents   {} parameter(s), {} main menu control(s)",
            reconciliation.parameters.parameters.len(),
            reconciliation.main_menu.controls.len()
        );
    }
    for event in report.warnings() {
        println!("[warning] {event}");
    }
}

fn inspect(args: InspectArgs) -> Result<()> {
    let config = load_config(args.config.as_deref())?;
    let scene = SceneHierarchy::load_from_path(&args.hierarchy)?;
    let request = RequestFile::load_from_path(&args.request)?
        .resolve(&scene, &config.save_location)
        .with_context(|| format!("Resolving request {}", args.request.display()))?;
    request.validate(&scene)?;

    let units = grouping::resolve(&request, &scene)?;
    let run_name = grouping::run_name(&request, &scene)?;
    println!("run: {run_name}");
    println!("collision policy: {}", config.collision_policy.label());
    println!("controller: {}", naming::controller_path(&request.save_location, &run_name));
    if request.setup_integration {
        println!("template copy: {}", naming::template_copy_folder(&request.save_location, &run_name));
    }
    for unit in &units {
        println!(
            "{} {} (parameter {}, default {})",
            unit.kind,
            unit.name,
            naming::toggle_name(&unit.name),
            unit.initial_state
        );
        for member in &unit.members {
            println!("    {}", naming::address_of(&scene, *member)?);
        }
        for active in [true, false] {
            println!("    -> {}", naming::clip_path(&request.save_location, &unit.name, active));
        }
    }
    for name in naming::find_collisions(units.iter().map(|unit| unit.name.as_str())) {
        println!("[warning] several units are named '{name}'");
    }
    Ok(())
}

#[derive(Default)]
struct ValidationSummary {
    checked: usize,
    warnings: usize,
    errors: usize,
}

fn validate(args: ValidateArgs) -> Result<bool> {
    let targets = collect_targets(&args.paths)?;
    if targets.is_empty() {
        return Err(anyhow!("no generated assets found in provided paths"));
    }
    let mut summary = ValidationSummary::default();
    for path in targets {
        summary.checked += 1;
        for event in AssetValidator::validate_path(&path, args.store_root.as_deref()) {
            report_event(&event);
            match event.severity {
                ValidationSeverity::Warning => summary.warnings += 1,
                ValidationSeverity::Error => summary.errors += 1,
                ValidationSeverity::Info => {}
            }
        }
    }
    println!("Checked {} assets ({} warnings, {} errors)", summary.checked, summary.warnings, summary.errors);
    Ok(summary.errors == 0 && !(args.fail_on_warn && summary.warnings > 0))
}

fn report_event(event: &ValidationEvent) {
    println!("[{}] {} - {}", event.severity, event.path.display(), event.message);
}

fn collect_targets(inputs: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    let mut seen = HashSet::new();
    for path in inputs {
        if path.is_file() {
            if seen.insert(path.clone()) {
                files.push(path.clone());
            }
        } else if path.is_dir() {
            walk_dir(path, &mut seen, &mut files)
                .with_context(|| format!("failed to enumerate directory '{}'", path.display()))?;
        } else {
            return Err(anyhow!("path '{}' does not exist", path.display()));
        }
    }
    Ok(files)
}

fn walk_dir(dir: &Path, seen: &mut HashSet<PathBuf>, files: &mut Vec<PathBuf>) -> Result<()> {
    let mut entries = fs::read_dir(dir)?.collect::<Result<Vec<_>, _>>()?;
    entries.sort_by_key(|entry| entry.path());
    for entry in entries {
        let path = entry.path();
        if path.is_dir() {
            walk_dir(&path, seen, files)?;
        } else if is_generated_asset(&path) && seen.insert(path.clone()) {
            files.push(path);
        }
    }
    Ok(())
}

fn is_generated_asset(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|ext| ext.to_str()),
        Some(naming::CLIP_EXTENSION) | Some("controller")
    )
}

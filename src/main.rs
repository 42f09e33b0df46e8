//! usdlook CLI - Run look export jobs and inspect renderer plugins.

use std::env;
use std::process;

use anyhow::{bail, Context};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use usdlook::export::{exportable_inputs, ExportJob, Hook, Registry};
use usdlook::host::memory::MemoryHost;
use usdlook::host::ShadingGraph;
use usdlook::renderers::register_builtin;
use usdlook::settings::Preferences;
use usdlook::ExportError;

/// Verbosity level
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Verbosity {
    Quiet,
    Info,
    Debug,
    Trace,
}

impl Verbosity {
    fn directive(self) -> &'static str {
        match self {
            Self::Quiet => "error",
            Self::Info => "info",
            Self::Debug => "debug",
            Self::Trace => "trace",
        }
    }
}

fn init_logging(verbosity: Verbosity) {
    // RUST_LOG wins over the command line flags
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("usdlook={}", verbosity.directive())));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    let args: Vec<String> = env::args().collect();
    let prog = args.first().map(String::as_str).unwrap_or("usdlook");

    // Parse global flags
    let mut verbosity = Verbosity::Info;
    let mut json = false;
    let mut filtered_args: Vec<&str> = Vec::new();
    for arg in args.iter().skip(1) {
        match arg.as_str() {
            "-v" | "--verbose" => verbosity = Verbosity::Debug,
            "-vv" | "--trace" => verbosity = Verbosity::Trace,
            "-q" | "--quiet" => verbosity = Verbosity::Quiet,
            "-j" | "--json" => json = true,
            _ => filtered_args.push(arg),
        }
    }
    init_logging(verbosity);

    if filtered_args.is_empty() {
        print_usage(prog);
        return;
    }

    let result = match filtered_args[0] {
        "export" | "e" => match filtered_args.get(1) {
            Some(job) => cmd_export(job, json),
            None => {
                eprintln!("Usage: {} export <job.json>", prog);
                process::exit(1);
            }
        },
        "inputs" | "i" => match filtered_args.get(1) {
            Some(job) => cmd_inputs(job),
            None => {
                eprintln!("Usage: {} inputs <job.json>", prog);
                process::exit(1);
            }
        },
        "plugins" | "p" => cmd_plugins(),
        "help" | "h" | "-h" | "--help" => {
            print_usage(prog);
            Ok(())
        }
        other => {
            eprintln!("Unknown command: {}", other);
            print_usage(prog);
            process::exit(1);
        }
    };

    if let Err(err) = result {
        match err.downcast_ref::<ExportError>() {
            Some(export_err) => eprintln!("{}: {:#}", export_err.title(), err),
            None => eprintln!("Error: {:#}", err),
        }
        process::exit(1);
    }
}

fn print_usage(prog: &str) {
    println!("usdlook - Export shader networks as USD look files");
    println!();
    println!("Usage: {} [options] <command> [job.json]", prog);
    println!();
    println!("Commands:");
    println!("  e, export   Run an export job");
    println!("  i, inputs   List the textured shader inputs of a job");
    println!("  p, plugins  List registered renderer plugins");
    println!("  h, help     Show this help");
    println!();
    println!("Options:");
    println!("  -v, --verbose  Debug output");
    println!("  -vv, --trace   Trace output (very verbose)");
    println!("  -q, --quiet    Errors only");
    println!("  -j, --json     Print the export report as JSON");
    println!();
    println!("Built {}", env!("USDLOOK_BUILD_DATE"));
}

fn builtin_registry() -> anyhow::Result<Registry> {
    let mut registry = Registry::new();
    register_builtin(&mut registry).context("registering built-in renderers")?;
    Ok(registry)
}

fn cmd_export(path: &str, json: bool) -> anyhow::Result<()> {
    let registry = builtin_registry()?;
    let prefs = Preferences::load();
    let job = ExportJob::load(path).with_context(|| format!("loading job {}", path))?;
    debug!("Running job {} with {} renderers", path, registry.len());

    let (_host, report) = job.run(&registry, &prefs)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }
    println!("Look file: {}", report.look_file.display());
    if let Some(assembly) = &report.assembly_file {
        println!("Assembly:  {}", assembly.display());
    }
    println!("Materials: {}", report.materials);
    println!("Shaders:   {}", report.shaders);
    println!("Bindings:  {}", report.bindings);
    println!("Baked:     {}", report.baked_items);
    Ok(())
}

fn cmd_inputs(path: &str) -> anyhow::Result<()> {
    let registry = builtin_registry()?;
    let job = ExportJob::load(path).with_context(|| format!("loading job {}", path))?;
    let host = MemoryHost::from_scene(&job.scene)?;

    for def in &job.materials {
        println!("{}{}", def.name, if def.enabled { "" } else { " (disabled)" });
        for name in &def.shaders {
            let Some(shader) = host.shader_by_name(name) else {
                bail!("shader '{}' of material '{}' not found", name, def.name);
            };
            let model = &shader.model.id;
            let marker = if registry.contains(model) { "" } else { " [no exporter]" };
            println!("  {} ({}){}", shader.name, model, marker);
            for (input, node) in exportable_inputs(&host, &shader) {
                let node_name = host.node_name(node.node_id()).unwrap_or_default();
                let kind = if node.is_bake_point() { "bake point" } else { "channel" };
                println!("    {:<24} <- {} ({})", input, node_name, kind);
            }
        }
    }
    Ok(())
}

fn cmd_plugins() -> anyhow::Result<()> {
    let registry = builtin_registry()?;
    let prefs = Preferences::load();
    for id in registry.shader_model_ids() {
        let Some(plugin) = registry.plugin(id) else {
            continue;
        };
        let context = plugin.terminal.render_context.as_deref().unwrap_or("-");
        println!(
            "{:<26} {:<20} terminal={} context={}",
            id, plugin.usd_shader_id, plugin.terminal.name, context
        );
        if let Some(panel) = registry.settings_panel(id) {
            for field in panel() {
                println!("    {}: {}", field.label, field.value(&prefs));
            }
        }
    }
    let hooked = registry.callbacks_with_hook(Hook::ExportItemCreated);
    if !hooked.is_empty() {
        println!();
        println!("Export item hooks: {}", hooked.join(", "));
    }
    Ok(())
}

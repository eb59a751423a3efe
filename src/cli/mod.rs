//! CLI module for modelgen

mod args;

pub use args::{Args, Command};

use crate::config::Config;
use crate::error::Result;
use crate::pipeline::{Collection, Output, Pipeline};
use crate::registry::NameRegistry;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

const DEFAULT_CONFIG: &str = "modelgen.toml";

/// Run the CLI application
pub fn run() -> ExitCode {
    let args = Args::parse_args();

    match execute(args) {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn execute(args: Args) -> Result<()> {
    match args.command {
        Command::Generate {
            schema,
            output,
            seed,
            include,
            exclude,
            package,
            config,
            format,
            verbose,
        } => {
            init_logging(verbose);

            let mut cfg = load_config(config.as_deref())?;
            cfg.merge_cli(schema, seed, include, exclude, output, package, format);
            cfg.validate()?;

            if verbose {
                println!("Schema: {:?}", cfg.source.paths);
                println!("Output: {}", cfg.output.directory.display());
                println!("Package: {}", cfg.output.package_name());
                println!("Format: {:?}", cfg.output.format);
                if !cfg.source.seeds.is_empty() {
                    println!("Seeds: {:?}", cfg.source.seeds);
                }
                if !cfg.source.include.is_empty() {
                    println!("Include: {:?}", cfg.source.include);
                }
                if !cfg.source.exclude.is_empty() {
                    println!("Exclude: {:?}", cfg.source.exclude);
                }
            }

            let pipeline = Pipeline::new(cfg).with_verbose(verbose);

            println!("Loading schema...");
            let schema = pipeline.load_schema()?;

            println!("Collecting entities...");
            let collection = pipeline.collect(&schema)?;
            println!(
                "Collected {} entities in {} modules",
                collection.entity_count(),
                collection.modules.len()
            );

            let mut registry = NameRegistry::new();
            match pipeline.write(&collection, &mut registry)? {
                Output::Python(report) => {
                    println!("{}", report.summary());
                    println!(
                        "Schemas written to: {}",
                        pipeline.config().output.directory.display()
                    );
                }
                Output::Json(path) => {
                    println!("JSON written to: {}", path.display());
                }
            }

            Ok(())
        }

        Command::Check {
            schema,
            seed,
            config,
            verbose,
        } => {
            init_logging(verbose);

            let mut cfg = load_config(config.as_deref())?;
            cfg.merge_cli(schema, seed, vec![], vec![], None, None, None);
            cfg.validate()?;

            let pipeline = Pipeline::new(cfg);
            let schema = pipeline.load_schema()?;
            let collection = pipeline.collect(&schema)?;

            print!("{}", check_report(&collection));
            Ok(())
        }

        Command::Version => {
            println!("modelgen {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

/// Explicit config must load; the default file is optional
fn load_config(path: Option<&Path>) -> Result<Config> {
    match path {
        Some(path) => Config::load(path),
        None => Ok(Config::load_or_default(&PathBuf::from(DEFAULT_CONFIG))),
    }
}

fn init_logging(verbose: bool) {
    let default = if verbose { "modelgen=debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Human readable summary of a collection
fn check_report(collection: &Collection) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "{} entities in {} modules ({} extractions)\n",
        collection.entity_count(),
        collection.modules.len(),
        collection.extractions
    ));

    for (path, module) in &collection.modules {
        let names: Vec<&str> = module.entities.iter().map(|e| e.entity.name.as_str()).collect();
        out.push_str(&format!("\n{}: {}\n", path, names.join(", ")));
        for imported in &module.cross_imports {
            out.push_str(&format!("  imports {} (deferred)\n", imported));
        }
    }

    let cycles = collection.import_graph().cycles();
    if !cycles.is_empty() {
        out.push_str(&format!("\nImport cycles ({}):\n", cycles.len()));
        for cycle in cycles {
            let names: Vec<String> = cycle.iter().map(|p| p.dotted()).collect();
            out.push_str(&format!("  {}\n", names.join(" <-> ")));
        }
    }

    out
}

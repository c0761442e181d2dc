//! routedoc CLI
//!
//! Command-line interface for scanning route inventories, generating
//! documents, and syncing the override store.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use routedoc::{
    diff, open_store, BuildError, Diagnostic, DocumentBuilder, DocumentConfig, FileStore,
    RouteInventory, Severity, StoreHandle,
};

#[derive(Parser)]
#[command(name = "routedoc")]
#[command(about = "Generate OpenAPI documents from route inventories")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scan a route inventory and list what was found
    Scan {
        /// Route inventory file (JSON)
        inventory: PathBuf,

        /// Output the inventory summary as JSON
        #[arg(long)]
        json: bool,
    },

    /// Generate a document from a route inventory
    Generate {
        /// Route inventory file (JSON)
        inventory: PathBuf,

        /// Override store file (optional; absent store is fine)
        #[arg(long)]
        store: Option<PathBuf>,

        /// Document configuration file (title, servers, security schemes)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Output file (stdout if not specified)
        #[arg(long)]
        output: Option<PathBuf>,

        /// Pretty-print JSON output
        #[arg(long)]
        pretty: bool,
    },

    /// Diff a route inventory against the override store
    Sync {
        /// Route inventory file (JSON)
        inventory: PathBuf,

        /// Override store file
        #[arg(long)]
        store: PathBuf,

        /// Write new/updated identity records and flag orphans
        #[arg(long)]
        apply: bool,

        /// With --apply, delete orphaned records instead of flagging them
        #[arg(long, requires = "apply")]
        prune: bool,

        /// Exit non-zero when the inventories disagree
        #[arg(long)]
        check: bool,

        /// Output the diff report as JSON
        #[arg(long)]
        json: bool,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Scan { inventory, json } => run_scan(&inventory, json),
        Commands::Generate {
            inventory,
            store,
            config,
            output,
            pretty,
        } => run_generate(&inventory, store.as_deref(), config.as_deref(), output, pretty),
        Commands::Sync {
            inventory,
            store,
            apply,
            prune,
            check,
            json,
        } => run_sync(&inventory, &store, apply, prune, check, json),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(code) => ExitCode::from(code),
    }
}

fn load_inventory(path: &Path) -> Result<RouteInventory, BuildError> {
    if !path.exists() {
        return Err(BuildError::FileNotFound {
            path: path.to_path_buf(),
        });
    }
    let content = std::fs::read_to_string(path).map_err(|source| BuildError::ReadError {
        path: path.to_path_buf(),
        source,
    })?;
    // Syntax errors and structural errors map to distinct variants.
    let value: serde_json::Value =
        serde_json::from_str(&content).map_err(|source| BuildError::InvalidJson { source })?;
    serde_json::from_value(value).map_err(|e| BuildError::InvalidInventory {
        message: e.to_string(),
    })
}

fn load_config(path: &Path) -> Result<DocumentConfig, BuildError> {
    if !path.exists() {
        return Err(BuildError::FileNotFound {
            path: path.to_path_buf(),
        });
    }
    let content = std::fs::read_to_string(path).map_err(|source| BuildError::ReadError {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&content).map_err(|e| BuildError::InvalidConfig {
        message: e.to_string(),
    })
}

fn run_scan(inventory_path: &Path, json: bool) -> Result<(), u8> {
    let inventory = load_inventory(inventory_path).map_err(|e| {
        eprintln!("Error: {}", e);
        e.exit_code() as u8
    })?;

    if json {
        println!("{}", serde_json::to_string_pretty(&inventory).unwrap());
        return Ok(());
    }

    println!("Scanned {} routes\n", inventory.routes.len());
    for route in &inventory.routes {
        let handler = match (&route.handler, &route.action) {
            (Some(h), Some(a)) => format!("{}::{}", h, a),
            (Some(h), None) => h.clone(),
            _ => "-".to_string(),
        };
        println!(
            "  {:7} {:40} {}",
            route.method.as_str().to_uppercase(),
            routedoc::normalize_path(&route.path),
            handler
        );
    }

    Ok(())
}

fn run_generate(
    inventory_path: &Path,
    store_path: Option<&Path>,
    config_path: Option<&Path>,
    output: Option<PathBuf>,
    pretty: bool,
) -> Result<(), u8> {
    let inventory = load_inventory(inventory_path).map_err(|e| {
        eprintln!("Error: {}", e);
        e.exit_code() as u8
    })?;

    let config = match config_path {
        Some(path) => load_config(path).map_err(|e| {
            eprintln!("Error: {}", e);
            e.exit_code() as u8
        })?,
        None => DocumentConfig::default(),
    };

    let store = open_store(store_path);
    if let StoreHandle::Unavailable { reason } = &store {
        // A configured but unreadable store degrades the build; the
        // document still generates from auto-detected data alone.
        if store_path.is_some() {
            print_diagnostic(&Diagnostic {
                severity: Severity::Error,
                route: None,
                message: format!("override store unavailable ({}); continuing without it", reason),
            });
        }
    }

    let result = DocumentBuilder::new(config).build(
        &inventory,
        store.operations(),
        &store.schemas(),
    );

    for diagnostic in &result.diagnostics {
        print_diagnostic(diagnostic);
    }

    let json_output = if pretty {
        serde_json::to_string_pretty(&result.document)
    } else {
        serde_json::to_string(&result.document)
    }
    .map_err(|e| {
        eprintln!("Error serializing output: {}", e);
        2u8
    })?;

    match output {
        Some(path) => {
            std::fs::write(&path, &json_output)
                .map_err(|source| BuildError::WriteError {
                    path: path.clone(),
                    source,
                })
                .map_err(|e| {
                    eprintln!("Error: {}", e);
                    e.exit_code() as u8
                })?;
            eprintln!(
                "Generated {}: {} paths, {} operations, {} schemas, {} security schemes, {} tags",
                path.display(),
                result.stats.paths,
                result.stats.operations,
                result.stats.schemas,
                result.stats.security_schemes,
                result.stats.tags
            );
        }
        None => {
            println!("{}", json_output);
        }
    }

    Ok(())
}

fn run_sync(
    inventory_path: &Path,
    store_path: &Path,
    apply: bool,
    prune: bool,
    check: bool,
    json: bool,
) -> Result<(), u8> {
    let inventory = load_inventory(inventory_path).map_err(|e| {
        eprintln!("Error: {}", e);
        e.exit_code() as u8
    })?;

    let mut store = FileStore::load(store_path).map_err(|e| {
        eprintln!("Error: {}", e);
        e.exit_code() as u8
    })?;

    let report = diff(&inventory.routes, store.operations());

    if json {
        println!("{}", serde_json::to_string_pretty(&report).unwrap());
    } else {
        print_report_section("New", &report.new, "\x1b[32m+\x1b[0m");
        print_report_section("Updated", &report.updated, "\x1b[33m~\x1b[0m");
        print_report_section("Removed", &report.removed, "\x1b[31m-\x1b[0m");
        println!(
            "{} new, {} updated, {} removed, {} unchanged",
            report.new.len(),
            report.updated.len(),
            report.removed.len(),
            report.unchanged.len()
        );
    }

    if apply {
        for route in &inventory.routes {
            store.upsert_from_route(route);
        }
        for removed in &report.removed {
            if prune {
                store.remove_operation(&removed.method, &removed.path);
            } else {
                store.mark_orphaned(&removed.method, &removed.path);
            }
        }
        store.save().map_err(|e| {
            eprintln!("Error: {}", e);
            e.exit_code() as u8
        })?;
        eprintln!("Store updated: {}", store_path.display());
    }

    if check && !report.is_clean() {
        return Err(1);
    }

    Ok(())
}

fn print_diagnostic(diagnostic: &Diagnostic) {
    let label = match diagnostic.severity {
        Severity::Warning => "warning",
        Severity::Error => "error",
    };
    match &diagnostic.route {
        Some(route) => eprintln!("{}: {} ({})", label, diagnostic.message, route),
        None => eprintln!("{}: {}", label, diagnostic.message),
    }
}

fn print_report_section(title: &str, entries: &[routedoc::DiffEntry], marker: &str) {
    if entries.is_empty() {
        return;
    }
    println!("{}:", title);
    for entry in entries {
        println!("  {} {} {}", marker, entry.method.to_uppercase(), entry.path);
    }
    println!();
}

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

use pathwright::export::ExportFormat;
use pathwright::ops::{self, Direction, OperationResult, RepairOptions, VisualizeOptions, Workspace};
use pathwright::syntax::DeclarationKind;

#[derive(Parser)]
#[command(name = "pathwright")]
#[command(author = "Zachary Woods <143150513+zach-fau@users.noreply.github.com>")]
#[command(version)]
#[command(about = "Move, rename and repair TypeScript/JavaScript modules without breaking imports", long_about = None)]
struct Cli {
    /// Project root (defaults to current directory)
    #[arg(short, long, global = true, default_value = ".")]
    root: PathBuf,

    /// Log debug output to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Move a file or folder and update every import that points at it
    Move {
        source: PathBuf,
        destination: PathBuf,
        /// Leave imports untouched
        #[arg(long)]
        no_update: bool,
    },
    /// Rename a file or folder; a bare name stays in the same directory
    Rename {
        source: PathBuf,
        destination: PathBuf,
        #[arg(long)]
        no_update: bool,
    },
    /// Rename an exported symbol and its uses in importing files
    RenameSymbol {
        file: PathBuf,
        old_name: String,
        new_name: String,
        /// Declaration kind (function, class, type, interface, variable, enum, namespace)
        #[arg(short, long, value_parser = parse_kind)]
        kind: Option<DeclarationKind>,
    },
    /// Fix relative imports in a file that no longer resolve
    Repair {
        file: PathBuf,
        /// Report fixes without writing them
        #[arg(long)]
        dry_run: bool,
        /// Skip type-only imports
        #[arg(long)]
        skip_types: bool,
        /// Rank candidates by name similarity before path distance
        #[arg(long)]
        ignore_distance: bool,
    },
    /// Show what a file imports and who imports it
    Analyze {
        file: PathBuf,
        /// imports, importers or both
        #[arg(short, long, default_value = "both", value_parser = parse_direction)]
        direction: Direction,
        #[arg(long)]
        skip_types: bool,
    },
    /// Report whether anything references a file
    CheckDeletable {
        file: PathBuf,
        #[arg(long)]
        skip_types: bool,
    },
    /// Render the import graph
    Visualize {
        /// Directory to visualize (defaults to the project root)
        path: Option<PathBuf>,
        /// dot, mermaid or json
        #[arg(short, long, default_value = "dot", value_parser = parse_format)]
        format: ExportFormat,
        #[arg(long)]
        include_node_modules: bool,
        /// Leave out type-only imports
        #[arg(long)]
        skip_types: bool,
        #[arg(long)]
        max_depth: Option<usize>,
        #[arg(long)]
        no_cycles: bool,
        /// Write the rendered graph to a file instead of the JSON result
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn parse_kind(s: &str) -> Result<DeclarationKind, String> {
    s.parse()
}

fn parse_direction(s: &str) -> Result<Direction, String> {
    s.parse()
}

fn parse_format(s: &str) -> Result<ExportFormat, String> {
    s.parse()
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();
}

fn print_result<T: Serialize>(result: &OperationResult<T>) -> Result<ExitCode> {
    let json = serde_json::to_string_pretty(result).context("Failed to serialize result")?;
    println!("{}", json);
    Ok(if result.success {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn run(cli: Cli) -> Result<ExitCode> {
    let workspace = Workspace::open(&cli.root)
        .with_context(|| format!("Failed to open project at {}", cli.root.display()))?;

    match cli.command {
        Commands::Move {
            source,
            destination,
            no_update,
        } => print_result(&ops::move_path(&workspace, &source, &destination, !no_update)),
        Commands::Rename {
            source,
            destination,
            no_update,
        } => print_result(&ops::rename_path(&workspace, &source, &destination, !no_update)),
        Commands::RenameSymbol {
            file,
            old_name,
            new_name,
            kind,
        } => print_result(&ops::rename_symbol(&workspace, &file, &old_name, &new_name, kind)),
        Commands::Repair {
            file,
            dry_run,
            skip_types,
            ignore_distance,
        } => {
            let options = RepairOptions {
                dry_run,
                include_types: !skip_types,
                prioritize_closer_paths: !ignore_distance,
            };
            print_result(&ops::repair_imports(&workspace, &file, options))
        }
        Commands::Analyze {
            file,
            direction,
            skip_types,
        } => print_result(&ops::analyze_dependencies(&workspace, &file, direction, !skip_types)),
        Commands::CheckDeletable { file, skip_types } => {
            print_result(&ops::check_deletable(&workspace, &file, !skip_types))
        }
        Commands::Visualize {
            path,
            format,
            include_node_modules,
            skip_types,
            max_depth,
            no_cycles,
            output,
        } => {
            let options = VisualizeOptions {
                format,
                include_node_modules,
                include_types: !skip_types,
                max_depth,
                detect_circular: !no_cycles,
            };
            let result = ops::visualize_dependencies(&workspace, path.as_deref(), options);
            if let (Some(output), Some(report)) = (&output, &result.report) {
                std::fs::write(output, &report.output)
                    .with_context(|| format!("Failed to write {}", output.display()))?;
                eprintln!("Wrote {} graph to {}", report.format, output.display());
            }
            print_result(&result)
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

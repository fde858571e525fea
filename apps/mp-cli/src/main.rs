use clap::{Parser, Subcommand};
use mp_app::{AppError, AppResult, RunOptions, RunRequest, project_service, run_service};
use mp_results::RunOutcome;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "matpath")]
#[command(about = "matpath - material point simulation along a loading path", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate project file syntax and structure
    Validate {
        /// Path to the project YAML file
        project_path: PathBuf,
    },
    /// Print the blocks and steps of the loading path
    ShowPath {
        /// Path to the project YAML file
        project_path: PathBuf,
    },
    /// Run the loading path
    Run {
        /// Path to the project YAML file
        project_path: PathBuf,
        /// Skip cache and force re-run
        #[arg(long)]
        no_cache: bool,
    },
    /// List stored runs for a project
    Runs {
        /// Path to the project YAML file
        project_path: PathBuf,
    },
    /// Show details of a stored run
    ShowRun {
        /// Path to the project YAML file
        project_path: PathBuf,
        /// Run ID to display
        run_id: String,
    },
}

fn main() -> AppResult<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Validate { project_path } => cmd_validate(&project_path),
        Commands::ShowPath { project_path } => cmd_show_path(&project_path),
        Commands::Run {
            project_path,
            no_cache,
        } => cmd_run(&project_path, !no_cache),
        Commands::Runs { project_path } => cmd_runs(&project_path),
        Commands::ShowRun {
            project_path,
            run_id,
        } => cmd_show_run(&project_path, &run_id),
    }
}

fn cmd_validate(project_path: &Path) -> AppResult<()> {
    println!("Validating project: {}", project_path.display());
    let prepared = project_service::prepare_project(project_path)?;
    println!(
        "✓ Project '{}' is valid ({} block(s), {} step(s))",
        prepared.project.name,
        prepared.path.blocks.len(),
        prepared.path.total_steps()
    );
    Ok(())
}

fn cmd_show_path(project_path: &Path) -> AppResult<()> {
    let prepared = project_service::prepare_project(project_path)?;
    print!("{}", project_service::show_path(&prepared));
    Ok(())
}

fn cmd_run(project_path: &Path, use_cache: bool) -> AppResult<()> {
    println!("Running project: {}", project_path.display());

    let request = RunRequest {
        project_path,
        options: RunOptions {
            use_cache,
            ..RunOptions::default()
        },
    };

    let response = match run_service::ensure_run(&request) {
        Ok(response) => response,
        Err(AppError::RunFailed { run_id, failure }) => {
            println!("✗ Run {} failed", run_id);
            println!("  {}", failure);
            println!("  Results up to the failure are kept in the run directory");
            return Err(AppError::RunFailed { run_id, failure });
        }
        Err(e) => return Err(e),
    };

    if response.loaded_from_cache {
        println!("✓ Loaded from cache: {}", response.run_id);
    } else {
        println!("✓ Simulation completed: {}", response.run_id);
    }
    print_outcome(&response.manifest.outcome);
    println!("  Results: {}", response.run_dir.display());
    for file in &response.manifest.files {
        println!("    {}", file);
    }
    Ok(())
}

fn cmd_runs(project_path: &Path) -> AppResult<()> {
    let runs = run_service::list_runs(project_path)?;

    if runs.is_empty() {
        println!("No stored runs found for: {}", project_path.display());
    } else {
        println!("Stored runs:");
        for manifest in runs {
            let status = if manifest.outcome.is_completed() {
                "completed"
            } else {
                "failed"
            };
            println!("  {} ({}, {})", manifest.run_id, manifest.timestamp, status);
        }
    }
    Ok(())
}

fn cmd_show_run(project_path: &Path, run_id: &str) -> AppResult<()> {
    let manifest = run_service::load_run(project_path, run_id)?;

    println!("Run {}", manifest.run_id);
    println!("  Project: {}", manifest.name);
    println!("  Started: {}", manifest.timestamp);
    println!("  Solver version: {}", manifest.solver_version);
    print_outcome(&manifest.outcome);
    println!("  Tables:");
    for file in &manifest.files {
        println!("    {}", file);
    }
    Ok(())
}

fn print_outcome(outcome: &RunOutcome) {
    match outcome {
        RunOutcome::Completed { summary } => {
            println!("  Increments: {}", summary.increments);
            println!(
                "  Sub-steps: {} ({} retracted, {} forced)",
                summary.substeps, summary.retractions, summary.forced_continuations
            );
            println!("  Newton iterations: {}", summary.iterations);
            println!("  Output events: {}", summary.outputs);
            println!("  Final time: {:.6}", summary.final_time);
        }
        RunOutcome::Failed {
            block,
            cycle,
            step,
            increment,
            message,
        } => {
            println!(
                "  Failed at block {}, cycle {}, step {}, increment {}",
                block, cycle, step, increment
            );
            println!("  {}", message);
        }
        RunOutcome::Aborted { message } => println!("  Aborted: {}", message),
    }
}

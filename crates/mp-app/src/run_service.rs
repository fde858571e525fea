//! Run execution and caching service.

use std::path::{Path, PathBuf};

use mp_laws::PhaseEvaluator;
use mp_path::LoadingMode;
use mp_phase::{KindTag, RveBuilder};
use mp_results::{FileSink, RunManifest, RunOutcome, RunStore, compute_run_id};
use mp_solver::{EquilibriumSolver, SolverError, kind_tag};
use tracing::info;

use crate::error::{AppError, AppResult};
use crate::project_service::{self, PreparedProject};

/// Stem of the result table names.
const TABLE_STEM: &str = "results";

/// Options for running simulations.
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub use_cache: bool,
    pub solver_version: String,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            use_cache: true,
            solver_version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

/// Request to execute a run.
pub struct RunRequest<'a> {
    pub project_path: &'a Path,
    pub options: RunOptions,
}

/// Response from a completed run.
#[derive(Debug, Clone)]
pub struct RunResponse {
    pub run_id: String,
    pub manifest: RunManifest,
    pub loaded_from_cache: bool,
    /// Directory holding the manifest and the result tables.
    pub run_dir: PathBuf,
}

/// Execute a project run, or load it from the store when an identical
/// completed run exists.
///
/// A failed run still saves its manifest and the tables written up to the
/// failure, then returns [`AppError::RunFailed`].
pub fn ensure_run(request: &RunRequest) -> AppResult<RunResponse> {
    let prepared = project_service::prepare_project(request.project_path)?;
    let run_id = run_id(&prepared, &request.options.solver_version)?;
    let store = RunStore::for_project(request.project_path)?;
    let run_dir = store.run_dir(&run_id);

    if request.options.use_cache && store.has_run(&run_id) {
        let manifest = store.load_manifest(&run_id)?;
        if manifest.outcome.is_completed() {
            info!(run_id = %run_id, "loaded cached run");
            return Ok(RunResponse {
                run_id,
                manifest,
                loaded_from_cache: true,
                run_dir,
            });
        }
    }
    store.delete_run(&run_id)?;

    let PreparedProject {
        project, mut path, ..
    } = prepared;
    let tag = path
        .blocks
        .first()
        .map(|b| kind_tag(b.kind))
        .unwrap_or(KindTag::Mechanical);
    let mut rve = RveBuilder::new(project.material.clone()).build(tag, path.initial_temperature)?;
    let mut evaluator = PhaseEvaluator::from_rve(&rve)?;
    let solver = EquilibriumSolver::new(project.solver.clone())?;
    let mut sink = FileSink::new(&run_dir, TABLE_STEM);

    info!(
        project = %project.name,
        run_id = %run_id,
        steps = path.total_steps(),
        "starting run"
    );
    let result = solver.run(&mut path, &mut rve, &mut evaluator, &project.output, &mut sink);

    let outcome = match &result {
        Ok(summary) => RunOutcome::Completed {
            summary: summary.clone(),
        },
        Err(SolverError::Failed(failure)) => RunOutcome::failed(failure),
        Err(e) => RunOutcome::Aborted {
            message: e.to_string(),
        },
    };
    let manifest = RunManifest {
        run_id: run_id.clone(),
        name: project.name.clone(),
        timestamp: chrono::Utc::now().to_rfc3339(),
        solver_version: request.options.solver_version.clone(),
        files: sink.files().to_vec(),
        outcome,
    };
    store.save_manifest(&manifest)?;

    match result {
        Ok(summary) => {
            info!(
                run_id = %run_id,
                increments = summary.increments,
                retractions = summary.retractions,
                final_time = summary.final_time,
                "run completed"
            );
            Ok(RunResponse {
                run_id,
                manifest,
                loaded_from_cache: false,
                run_dir,
            })
        }
        Err(SolverError::Failed(failure)) => Err(AppError::RunFailed { run_id, failure }),
        Err(e) => Err(e.into()),
    }
}

/// Runs of the project stored next to it, oldest first.
pub fn list_runs(project_path: &Path) -> AppResult<Vec<RunManifest>> {
    let project = project_service::load_project(project_path)?;
    let store = RunStore::for_project(project_path)?;
    Ok(store.list_runs(&project.name)?)
}

pub fn load_run(project_path: &Path, run_id: &str) -> AppResult<RunManifest> {
    let store = RunStore::for_project(project_path)?;
    Ok(store.load_manifest(run_id)?)
}

/// Hash of the project plus the content of every increment file it reads.
fn run_id(prepared: &PreparedProject, solver_version: &str) -> AppResult<String> {
    let mut increment_files = Vec::new();
    for block in &prepared.path.blocks {
        for step in &block.steps {
            if let LoadingMode::Incremental { file } = &step.mode {
                increment_files.push(std::fs::read_to_string(file)?);
            }
        }
    }
    Ok(compute_run_id(
        &(&prepared.project, &increment_files),
        solver_version,
    )?)
}

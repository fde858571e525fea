//! Project loading, saving, validation, and introspection.

use std::path::{Path, PathBuf};

use mp_laws::law_from_props;
use mp_path::{LoadingMode, LoadingPath};
use tracing::debug;

use crate::error::{AppError, AppResult};
use crate::project::Project;

/// A validated project together with its built loading path.
#[derive(Debug, Clone)]
pub struct PreparedProject {
    pub project: Project,
    pub path: LoadingPath,
    /// Directory relative increment files are resolved against.
    pub base_dir: PathBuf,
}

/// Load project from a YAML file.
pub fn load_project(path: &Path) -> AppResult<Project> {
    let content = std::fs::read_to_string(path).map_err(|e| AppError::ProjectFileRead {
        path: path.to_path_buf(),
        source: e,
    })?;

    let project: Project = serde_yaml::from_str(&content)
        .map_err(|e| AppError::Project(format!("Failed to parse project YAML: {}", e)))?;

    Ok(project)
}

/// Save project to a YAML file.
pub fn save_project(path: &Path, project: &Project) -> AppResult<()> {
    let content = serde_yaml::to_string(project)
        .map_err(|e| AppError::Project(format!("Failed to serialize project: {}", e)))?;

    std::fs::write(path, content).map_err(|e| AppError::ProjectFileWrite {
        path: path.to_path_buf(),
        source: e,
    })?;

    Ok(())
}

/// Validate every section of the project and build its loading path.
pub fn validate_project(project: &Project, base_dir: &Path) -> AppResult<LoadingPath> {
    if project.name.trim().is_empty() {
        return Err(AppError::Validation("Project name must not be empty".to_string()));
    }

    project.solver.validate()?;
    law_from_props(&project.material)?;

    let path = project.path.build(base_dir)?;
    project.output.validate(path.blocks.len())?;

    for block in &path.blocks {
        for step in &block.steps {
            if let LoadingMode::Incremental { file } = &step.mode
                && !file.is_file()
            {
                return Err(AppError::Validation(format!(
                    "{}: increment file {} not found",
                    step.id,
                    file.display()
                )));
            }
        }
    }

    debug!(
        project = %project.name,
        blocks = path.blocks.len(),
        steps = path.total_steps(),
        "project validated"
    );
    Ok(path)
}

/// Load and validate a project file.
pub fn prepare_project(project_path: &Path) -> AppResult<PreparedProject> {
    let project = load_project(project_path)?;
    let base_dir = project_path
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."));
    let path = validate_project(&project, &base_dir)?;
    Ok(PreparedProject {
        project,
        path,
        base_dir,
    })
}

/// Human-readable listing of the material and loading path.
pub fn show_path(prepared: &PreparedProject) -> String {
    let material = &prepared.project.material;
    format!(
        "Project: {}\nMaterial: {} ({} props, {} internal variables)\nSteps: {}\n{}",
        prepared.project.name,
        material.law,
        material.props.len(),
        material.nstatev,
        prepared.path.total_steps(),
        prepared.path
    )
}

use std::path::{Path, PathBuf};

use mp_app::{AppError, RunOptions, RunRequest, ensure_run, list_runs, load_run};
use mp_results::{RunOutcome, RunStore};

const BAR: &str = r#"
name: bar
material:
  number: 1
  law: ELISO
  props: [1000.0, 0.3, 0.0]
solver:
  strategy: consistent_tangent
path:
  initial_temperature: 293.0
  blocks:
    - kind: mechanical
      cycles: 2
      steps:
        - mode: monotonic
          duration: 2.0
          increments: 2
          mechanical:
            - { control: strain, target: 0.002 }
            - { control: stress }
            - { control: stress }
            - { control: stress }
            - { control: stress }
            - { control: stress }
        - mode: cyclic_cosine
          duration: 4.0
          increments: 4
          mechanical:
            - { control: stress, target: 0.0 }
            - { control: stress }
            - { control: stress }
            - { control: stress }
            - { control: stress }
            - { control: stress }
output:
  stress: [0]
  strain: [0]
"#;

fn project_in(dir_name: &str, yaml: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(dir_name);
    let _ = std::fs::remove_dir_all(&dir);
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join("project.yaml");
    std::fs::write(&path, yaml).unwrap();
    path
}

fn request(path: &Path, use_cache: bool) -> RunRequest<'_> {
    RunRequest {
        project_path: path,
        options: RunOptions {
            use_cache,
            solver_version: "test".to_string(),
        },
    }
}

#[test]
fn run_persists_manifest_and_tables_next_to_project() {
    let project_path = project_in("mp_app_test_persist", BAR);

    let response = ensure_run(&request(&project_path, false)).expect("run failed");
    assert!(!response.loaded_from_cache);
    let RunOutcome::Completed { summary } = &response.manifest.outcome else {
        panic!("unexpected outcome {:?}", response.manifest.outcome);
    };
    // Two cycles of 2 + 4 increments.
    assert_eq!(summary.increments, 12);
    assert_eq!(summary.final_time, 12.0);
    assert_eq!(
        response.manifest.files,
        vec!["results_global-1.txt", "results_local-1.txt"]
    );

    let store = RunStore::for_project(&project_path).unwrap();
    assert!(store.run_dir(&response.run_id).starts_with(store.root()));
    let rows = store
        .load_table(&response.run_id, "results_global-1.txt")
        .unwrap();
    assert_eq!(rows.len(), 12);
    // Loaded again to zero stress at the end of every cycle.
    let last = rows.last().unwrap();
    assert_eq!(&last[..4], &[1.0, 2.0, 2.0, 4.0]);
    assert!(last[8].abs() < 1e-6);

    let runs = list_runs(&project_path).unwrap();
    assert_eq!(runs.len(), 1);
    assert_eq!(load_run(&project_path, &response.run_id).unwrap().name, "bar");
}

#[test]
fn identical_project_is_loaded_from_cache() {
    let project_path = project_in("mp_app_test_cache", BAR);

    let first = ensure_run(&request(&project_path, true)).unwrap();
    let second = ensure_run(&request(&project_path, true)).unwrap();
    assert!(second.loaded_from_cache);
    assert_eq!(first.run_id, second.run_id);

    let changed = BAR.replace("target: 0.002", "target: 0.003");
    std::fs::write(&project_path, changed).unwrap();
    let third = ensure_run(&request(&project_path, true)).unwrap();
    assert!(!third.loaded_from_cache);
    assert_ne!(first.run_id, third.run_id);
}

#[test]
fn increment_file_is_resolved_next_to_the_project() {
    let yaml = r#"
name: file-driven
material: { law: ELISO, props: [1000.0, 0.3, 0.0] }
path:
  initial_temperature: 293.0
  blocks:
    - kind: mechanical
      steps:
        - mode: incremental
          file: path.txt
          mechanical:
            - { control: strain }
            - { control: free }
            - { control: free }
            - { control: free }
            - { control: free }
            - { control: free }
"#;
    let project_path = project_in("mp_app_test_file", yaml);
    let dir = project_path.parent().unwrap();
    std::fs::write(
        dir.join("path.txt"),
        "1 1.0 293.0 0.001\n2 2.0 293.0 0.002\n\n",
    )
    .unwrap();

    let response = ensure_run(&request(&project_path, false)).unwrap();
    let store = RunStore::for_project(&project_path).unwrap();
    let rows = store
        .load_table(&response.run_id, "results_global-0.txt")
        .unwrap();
    assert_eq!(rows.len(), 2);
    // E11 then S11 after the seven leading columns.
    assert!((rows[1][7] - 0.002).abs() < 1e-12);
    assert!((rows[1][13] - 2.0).abs() < 1e-6);

    // Editing the increment file changes the run identity.
    std::fs::write(dir.join("path.txt"), "1 1.0 293.0 0.001\n").unwrap();
    let again = ensure_run(&request(&project_path, true)).unwrap();
    assert_ne!(again.run_id, response.run_id);
}

#[test]
fn missing_project_file_is_reported_with_its_path() {
    let path = std::env::temp_dir().join("mp_app_test_missing/nope.yaml");
    match ensure_run(&request(&path, false)) {
        Err(AppError::ProjectFileRead { path: p, .. }) => assert_eq!(p, path),
        other => panic!("unexpected result {other:?}"),
    }
}

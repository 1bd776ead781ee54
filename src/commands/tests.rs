use std::fs;
use std::path::Path;

use tempfile::TempDir;

use super::*;
use crate::cli::GlobalOpts;
use crate::gc::CleanerState;
use crate::metadata::StateStore;
use crate::tool::BUILD_TOOL_KEY;

const MODULE: &str = "caches/modules-2/files-2.1/org.apache.commons/commons-math3/3.1";

fn setup_home() -> TempDir {
    let temp_dir = TempDir::new().unwrap();
    let jar = temp_dir
        .path()
        .join("home")
        .join(MODULE)
        .join("abc/commons-math3-3.1.jar");
    fs::create_dir_all(jar.parent().unwrap()).unwrap();
    fs::write(&jar, "jar").unwrap();
    temp_dir
}

fn opts(temp_dir: &TempDir) -> GlobalOpts {
    GlobalOpts::builder()
        .cache_home(Some(temp_dir.path().join("home")))
        .staging_dir(Some(temp_dir.path().join("staging")))
        .quiet(true)
        .build()
}

fn cli(temp_dir: &TempDir, command: Commands) -> Cli {
    Cli::builder()
        .cache_home(temp_dir.path().join("home"))
        .staging_dir(temp_dir.path().join("staging"))
        .quiet(true)
        .command(command)
        .build()
        .unwrap()
}

#[test]
fn test_prepare_command() {
    let temp_dir = setup_home();
    let stats = prepare(&opts(&temp_dir)).unwrap();
    assert_eq!(stats.recorded.modules, 1);
    assert!(stats.snapshot_path.exists());
    assert!(stats.snapshot_path.starts_with(temp_dir.path().join("staging")));
}

#[test]
fn test_status_follows_the_cycle() {
    let temp_dir = setup_home();
    let opts = opts(&temp_dir);

    assert_eq!(status(&opts).unwrap(), CleanerState::NotPrepared);
    prepare(&opts).unwrap();
    assert!(matches!(
        status(&opts).unwrap(),
        CleanerState::Prepared { roots: 1, .. }
    ));
    cleanup(&opts, false, false).unwrap();
    assert_eq!(status(&opts).unwrap(), CleanerState::NotPrepared);
}

#[test]
fn test_cleanup_dry_run_keeps_everything() {
    let temp_dir = setup_home();
    let opts = opts(&temp_dir);
    prepare(&opts).unwrap();

    let stats = cleanup(&opts, true, false).unwrap();
    assert!(stats.dry_run);
    assert!(temp_dir.path().join("home").join(MODULE).exists());
    assert!(matches!(status(&opts).unwrap(), CleanerState::Prepared { .. }));
}

#[test]
fn test_cleanup_without_prepare() {
    let temp_dir = setup_home();
    let stats = cleanup(&opts(&temp_dir), false, false).unwrap();
    assert!(stats.skipped);
    assert!(temp_dir.path().join("home").join(MODULE).exists());
}

#[test]
fn test_reset_command() {
    let temp_dir = setup_home();
    let opts = opts(&temp_dir);
    prepare(&opts).unwrap();

    let mut store = StateStore::in_staging_dir(&temp_dir.path().join("staging")).unwrap();
    store
        .set(BUILD_TOOL_KEY, "executable:/opt/gradle/bin/gradle")
        .unwrap();

    reset(&opts).unwrap();

    assert_eq!(status(&opts).unwrap(), CleanerState::NotPrepared);
    let store = StateStore::in_staging_dir(&temp_dir.path().join("staging")).unwrap();
    assert!(store.get(BUILD_TOOL_KEY).is_none());
}

#[test]
fn test_execute_dispatch() {
    let temp_dir = setup_home();

    execute(&cli(&temp_dir, Commands::Prepare)).unwrap();
    execute(&cli(&temp_dir, Commands::Status)).unwrap();
    execute(&cli(
        &temp_dir,
        Commands::Cleanup {
            dry_run: false,
            no_prune: false,
        },
    ))
    .unwrap();
    execute(&cli(&temp_dir, Commands::Reset)).unwrap();
}

#[test]
fn test_execute_missing_cache_home() {
    let temp_dir = TempDir::new().unwrap();
    let result = execute(&cli(&temp_dir, Commands::Prepare));
    assert!(matches!(
        result,
        Err(HoldError::CacheHomeNotFound(ref path)) if path.ends_with("home")
    ));
}

#[test]
fn test_build_without_wrapper() {
    let temp_dir = setup_home();
    let command = Commands::Build {
        executable: None,
        build_root: Path::new("project").to_path_buf(),
        args: vec!["build".to_string()],
    };
    let result = execute_with_dir(&cli(&temp_dir, command), Some(temp_dir.path()));
    assert!(matches!(result, Err(HoldError::BuildToolNotFound(_))));
}

#[cfg(unix)]
fn write_gradlew(temp_dir: &TempDir) -> std::path::PathBuf {
    use std::os::unix::fs::PermissionsExt;

    let project = temp_dir.path().join("project");
    fs::create_dir_all(&project).unwrap();
    let gradlew = project.join("gradlew");
    fs::write(&gradlew, "#!/bin/sh\ntouch \"$GRADLE_USER_HOME/built\"\n").unwrap();
    fs::set_permissions(&gradlew, fs::Permissions::from_mode(0o755)).unwrap();
    gradlew
}

#[test]
#[cfg(unix)]
fn test_build_records_tool() {
    let temp_dir = setup_home();
    let gradlew = write_gradlew(&temp_dir);

    let command = Commands::Build {
        executable: None,
        build_root: Path::new("project").to_path_buf(),
        args: vec!["build".to_string()],
    };
    execute_with_dir(&cli(&temp_dir, command), Some(temp_dir.path())).unwrap();

    assert!(temp_dir.path().join("home").join("built").exists());
    let store = StateStore::in_staging_dir(&temp_dir.path().join("staging")).unwrap();
    assert_eq!(
        store.get(BUILD_TOOL_KEY),
        Some(format!("wrapper:{}", gradlew.display()).as_str())
    );
}

#[test]
#[cfg(unix)]
fn test_build_without_args_only_records_tool() {
    let temp_dir = setup_home();
    let gradlew = write_gradlew(&temp_dir);

    let command = Commands::Build {
        executable: None,
        build_root: Path::new("project").to_path_buf(),
        args: Vec::new(),
    };
    execute_with_dir(&cli(&temp_dir, command), Some(temp_dir.path())).unwrap();

    assert!(!temp_dir.path().join("home").join("built").exists());
    let store = StateStore::in_staging_dir(&temp_dir.path().join("staging")).unwrap();
    assert_eq!(
        store.get(BUILD_TOOL_KEY),
        Some(format!("wrapper:{}", gradlew.display()).as_str())
    );
}

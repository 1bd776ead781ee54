//! Shared fixtures: a sandboxed Gradle user home and fake build tools that
//! touch it the way a real build does.

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use assert_fs::TempDir;
use assert_fs::fixture::ChildPath;
use assert_fs::prelude::*;
use filetime::FileTime;
use gradle_hold::cli::{Cli, Commands};
use gradle_hold::commands::execute_with_dir;
use gradle_hold::error::Result;
use walkdir::WalkDir;

pub const MODULE_GROUP: &str = "caches/modules-2/files-2.1/org.apache.commons/commons-math3";
pub const BUILD_CACHE: &str = "caches/build-cache-1";
pub const MARKER: &str = "gc.properties";

/// Blob every build writes, whatever the dependency version.
pub const SHARED_BLOB: &str = "cccccccccccccccccccccccccccccccc";

/// Fixed point in the past that [`Sandbox::rewind`] moves timestamps to.
pub fn long_ago() -> SystemTime {
    UNIX_EPOCH + Duration::from_secs(1_600_000_000)
}

/// How a fake build is launched.
#[derive(Debug, Clone)]
pub enum Invocation {
    /// An explicit executable outside the project.
    Executable(PathBuf),
    /// The project's wrapper script.
    Wrapper,
}

/// A temporary directory holding a Gradle user home, a staging directory,
/// and a project to build.
pub struct Sandbox {
    temp_dir: TempDir,
}

impl Sandbox {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().unwrap();
        temp_dir.child("gradle-home").create_dir_all().unwrap();
        temp_dir.child("project").create_dir_all().unwrap();
        Self { temp_dir }
    }

    pub fn root(&self) -> &Path {
        self.temp_dir.path()
    }

    pub fn home(&self) -> ChildPath {
        self.temp_dir.child("gradle-home")
    }

    pub fn staging(&self) -> PathBuf {
        self.temp_dir.path().join("staging")
    }

    pub fn module(&self, version: &str) -> ChildPath {
        self.home().child(format!("{MODULE_GROUP}/{version}"))
    }

    pub fn version_cache(&self, version: &str) -> ChildPath {
        self.home().child(format!("caches/{version}"))
    }

    pub fn wrapper_dist(&self, version: &str) -> ChildPath {
        self.home()
            .child(format!("wrapper/dists/gradle-{version}-bin"))
    }

    pub fn blob(&self, hash: &str) -> ChildPath {
        self.home().child(format!("{BUILD_CACHE}/{hash}"))
    }

    /// Number of entries directly inside the build cache, marker included.
    pub fn build_cache_len(&self) -> usize {
        fs::read_dir(self.home().child(BUILD_CACHE).path())
            .map(|entries| entries.count())
            .unwrap_or(0)
    }

    pub fn cli(&self, command: Commands) -> Result<Cli> {
        Cli::builder()
            .cache_home(self.home().path())
            .staging_dir(self.staging())
            .quiet(true)
            .command(command)
            .build()
    }

    /// Runs a command with the sandbox root as working directory.
    pub fn run(&self, command: Commands) -> Result<()> {
        execute_with_dir(&self.cli(command)?, Some(self.root()))
    }

    pub fn prepare(&self) -> Result<()> {
        self.run(Commands::Prepare)
    }

    pub fn cleanup(&self) -> Result<()> {
        self.run(Commands::Cleanup {
            dry_run: false,
            no_prune: false,
        })
    }

    /// Builds the project against `commons-math3:<dependency_version>`.
    pub fn build(&self, invocation: &Invocation, dependency_version: &str) -> Result<()> {
        let executable = match invocation {
            Invocation::Executable(path) => Some(path.clone()),
            Invocation::Wrapper => None,
        };
        self.run(Commands::Build {
            executable,
            build_root: PathBuf::from("project"),
            args: vec![
                format!("-Dcommons_math3_version={dependency_version}"),
                "build".to_string(),
            ],
        })
    }

    /// Installs a fake `gradle` executable for `tool_version` outside the
    /// project and returns its path.
    #[cfg(unix)]
    pub fn install_executable(&self, tool_version: &str) -> PathBuf {
        let path = self
            .root()
            .join(format!("tools/gradle-{tool_version}/bin/gradle"));
        write_script(&path, &build_script(tool_version, false));
        path
    }

    /// Installs a fake wrapper script for `tool_version` into the project.
    #[cfg(unix)]
    pub fn install_wrapper(&self, tool_version: &str) {
        let path = self.root().join("project/gradlew");
        write_script(&path, &build_script(tool_version, true));
    }

    /// Moves every timestamp in the home to [`long_ago`].
    ///
    /// Stands in for the time that passes between CI runs, so that a build
    /// in the same second as `prepare` still advances every signal it
    /// touches.
    pub fn rewind(&self) {
        let then = FileTime::from_system_time(long_ago());
        for entry in WalkDir::new(self.home().path()).contents_first(true) {
            let entry = entry.unwrap();
            filetime::set_file_mtime(entry.path(), then).unwrap();
        }
    }
}

/// Writes `path` with its parents.
pub fn write_file(path: &Path, content: &str) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

pub fn touch_now(path: &Path) {
    filetime::set_file_mtime(path, FileTime::now()).unwrap();
}

/// Writes an executable script.
#[cfg(unix)]
pub fn write_script(path: &Path, body: &str) {
    use std::io::Write;
    use std::os::unix::fs::PermissionsExt;

    fs::create_dir_all(path.parent().unwrap()).unwrap();
    let mut file = fs::File::create(path).unwrap();
    file.write_all(body.as_bytes()).unwrap();
    file.sync_all().unwrap();
    drop(file);
    fs::set_permissions(path, fs::Permissions::from_mode(0o755)).unwrap();
}

/// POSIX shell stand-in for a Gradle build.
///
/// It resolves `commons-math3` into the module cache, touches the empty
/// version cache marker the way Gradle does, stores one shared and one dependency-specific build cache
/// blob, and (as a wrapper) unpacks its own distribution.
const BUILD_SCRIPT: &str = r#"#!/bin/sh
set -e
tool="@TOOL@"
home="$GRADLE_USER_HOME"
dep=""
for arg in "$@"; do
  case "$arg" in
    -Dcommons_math3_version=*) dep="${arg#-Dcommons_math3_version=}" ;;
  esac
done

if [ "@WRAPPER@" = "yes" ]; then
  dist="$home/wrapper/dists/gradle-$tool-bin/3x8kq2"
  mkdir -p "$dist"
  [ -f "$dist/gradle-$tool-bin.zip" ] || : > "$dist/gradle-$tool-bin.zip"
fi

mkdir -p "$home/caches/$tool"
touch "$home/caches/$tool/gc.properties"

module="$home/caches/modules-2/files-2.1/org.apache.commons/commons-math3/$dep"
if [ -d "$module" ]; then
  find "$module" -type f -exec touch {} +
else
  mkdir -p "$module/5c8f1a"
  : > "$module/5c8f1a/commons-math3-$dep.jar"
fi

cache="$home/caches/build-cache-1"
mkdir -p "$cache"
[ -f "$cache/gc.properties" ] || : > "$cache/gc.properties"
touch "$cache/cccccccccccccccccccccccccccccccc"
case "$dep" in
  3.1) touch "$cache/aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa" ;;
  3.1.1) touch "$cache/bbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbb" ;;
esac
"#;

fn build_script(tool_version: &str, wrapper: bool) -> String {
    BUILD_SCRIPT
        .replace("@TOOL@", tool_version)
        .replace("@WRAPPER@", if wrapper { "yes" } else { "no" })
}

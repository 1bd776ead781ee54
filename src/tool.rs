//! The build tool gradle-hold runs between `prepare` and `cleanup`.
//!
//! A build is invoked either through an explicit executable or through the
//! project's wrapper script. The choice is made once, by [`BuildTool::resolve`],
//! and recorded in the state store so later invocations can report it.

use std::ffi::OsString;
use std::fmt;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::str::FromStr;

use crate::cli::normalize_path;
use crate::error::{HoldError, Result};
use crate::logging::Logger;

/// State store key under which the resolved tool is recorded.
pub const BUILD_TOOL_KEY: &str = "build-tool";

/// Environment variable pointing the build tool at its cache home.
pub const CACHE_HOME_ENV: &str = "GRADLE_USER_HOME";

/// Wrapper script looked up in the build root.
#[cfg(windows)]
pub const WRAPPER_SCRIPT: &str = "gradlew.bat";
/// Wrapper script looked up in the build root.
#[cfg(not(windows))]
pub const WRAPPER_SCRIPT: &str = "gradlew";

const EXECUTABLE_PREFIX: &str = "executable:";
const WRAPPER_PREFIX: &str = "wrapper:";

/// An explicitly requested executable, classified once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecutableRequest {
    /// A path to the executable.
    Path(PathBuf),
    /// A bare name to look up on `PATH`.
    Name(OsString),
}

impl ExecutableRequest {
    /// Classifies `executable` as given by the user.
    ///
    /// A single-component name that does not exist in `working_dir` is a
    /// [`Name`](Self::Name); anything else is a path taken relative to
    /// `working_dir`.
    pub fn classify(executable: &Path, working_dir: &Path) -> Self {
        let local = working_dir.join(executable);
        if executable.components().count() == 1 && !local.exists() {
            ExecutableRequest::Name(executable.as_os_str().to_os_string())
        } else {
            ExecutableRequest::Path(normalize_path(local))
        }
    }
}

/// How the build is launched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildTool {
    /// An explicitly configured executable, e.g. an installed `gradle`.
    Executable(PathBuf),
    /// The wrapper script found in the build root.
    Wrapper(PathBuf),
}

impl BuildTool {
    /// Resolves the tool to run.
    ///
    /// An explicit `executable` wins; a bare name is looked up on `PATH`.
    /// Otherwise the wrapper script in `build_root` is used.
    ///
    /// # Errors
    ///
    /// Returns [`HoldError::BuildToolNotFound`] if the candidate does not
    /// exist or is not executable.
    pub fn resolve(executable: Option<&ExecutableRequest>, build_root: &Path) -> Result<Self> {
        let tool = match executable {
            Some(ExecutableRequest::Name(name)) => BuildTool::Executable(
                which::which(name).map_err(|_| HoldError::BuildToolNotFound(PathBuf::from(name)))?,
            ),
            Some(ExecutableRequest::Path(path)) => BuildTool::Executable(absolute(path)?),
            None => BuildTool::Wrapper(absolute(&build_root.join(WRAPPER_SCRIPT))?),
        };

        ensure_runnable(tool.path())?;
        Ok(tool)
    }

    /// Path of the program to launch.
    pub fn path(&self) -> &Path {
        match self {
            BuildTool::Executable(path) | BuildTool::Wrapper(path) => path,
        }
    }

    pub fn is_wrapper(&self) -> bool {
        matches!(self, BuildTool::Wrapper(_))
    }

    /// Runs the tool in `build_root` with `GRADLE_USER_HOME` set to
    /// `cache_home`, inheriting stdio.
    ///
    /// # Errors
    ///
    /// Returns [`HoldError::IoError`] if the process cannot be spawned and
    /// [`HoldError::BuildFailed`] if it exits unsuccessfully.
    pub fn run(
        &self,
        build_root: &Path,
        cache_home: &Path,
        args: &[String],
        log: Logger,
    ) -> Result<()> {
        log.verbose(
            1,
            format!(
                "Running {} {} in {}",
                self.path().display(),
                args.join(" "),
                build_root.display()
            ),
        );

        let status = Command::new(self.path())
            .args(args)
            .current_dir(build_root)
            .env(CACHE_HOME_ENV, cache_home)
            .status()
            .map_err(|source| HoldError::IoError {
                path: self.path().to_path_buf(),
                source,
            })?;

        if !status.success() {
            return Err(HoldError::BuildFailed {
                tool: self.path().to_path_buf(),
                status: status.to_string(),
            });
        }

        Ok(())
    }
}

impl fmt::Display for BuildTool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let prefix = match self {
            BuildTool::Executable(_) => EXECUTABLE_PREFIX,
            BuildTool::Wrapper(_) => WRAPPER_PREFIX,
        };
        write!(f, "{prefix}{}", self.path().display())
    }
}

impl FromStr for BuildTool {
    type Err = HoldError;

    fn from_str(s: &str) -> Result<Self> {
        if let Some(path) = s.strip_prefix(EXECUTABLE_PREFIX) {
            Ok(BuildTool::Executable(PathBuf::from(path)))
        } else if let Some(path) = s.strip_prefix(WRAPPER_PREFIX) {
            Ok(BuildTool::Wrapper(PathBuf::from(path)))
        } else {
            Err(HoldError::ConfigError(format!(
                "unrecognized build tool record '{s}'"
            )))
        }
    }
}

fn absolute(path: &Path) -> Result<PathBuf> {
    std::path::absolute(path).map_err(|source| HoldError::IoError {
        path: path.to_path_buf(),
        source,
    })
}

fn ensure_runnable(path: &Path) -> Result<()> {
    let not_found = || HoldError::BuildToolNotFound(path.to_path_buf());
    let metadata = std::fs::metadata(path).map_err(|_| not_found())?;
    if !metadata.is_file() {
        return Err(not_found());
    }

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        if metadata.permissions().mode() & 0o111 == 0 {
            return Err(not_found());
        }
    }

    Ok(())
}

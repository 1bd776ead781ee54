//! Build command: runs the build tool against the cache home.

use std::path::{Path, PathBuf};

use crate::cli::normalize_path;
use crate::error::{HoldError, Result};
use crate::logging::Logger;
use crate::metadata::StateStore;
use crate::tool::{BUILD_TOOL_KEY, BuildTool, ExecutableRequest};

pub struct Build<'a> {
    cache_home: &'a Path,
    staging_dir: &'a Path,
    executable: Option<ExecutableRequest>,
    build_root: PathBuf,
    args: &'a [String],
    verbose: u8,
    quiet: bool,
}

#[derive(Default)]
pub struct BuildBuilder<'a> {
    cache_home: Option<&'a Path>,
    staging_dir: Option<&'a Path>,
    executable: Option<&'a Path>,
    build_root: Option<&'a Path>,
    working_dir: Option<&'a Path>,
    args: &'a [String],
    verbose: u8,
    quiet: bool,
}

impl<'a> BuildBuilder<'a> {
    pub fn cache_home(mut self, path: &'a Path) -> Self {
        self.cache_home = Some(path);
        self
    }

    pub fn staging_dir(mut self, path: &'a Path) -> Self {
        self.staging_dir = Some(path);
        self
    }

    pub fn executable(mut self, path: Option<&'a Path>) -> Self {
        self.executable = path;
        self
    }

    /// Build root; relative paths are taken from the working directory.
    pub fn build_root(mut self, path: &'a Path) -> Self {
        self.build_root = Some(path);
        self
    }

    pub fn working_dir(mut self, path: &'a Path) -> Self {
        self.working_dir = Some(path);
        self
    }

    pub fn args(mut self, args: &'a [String]) -> Self {
        self.args = args;
        self
    }

    pub fn verbose(mut self, verbose: u8) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn quiet(mut self, quiet: bool) -> Self {
        self.quiet = quiet;
        self
    }

    pub fn build(self) -> Result<Build<'a>> {
        let missing = |field: &str| HoldError::ConfigError(format!("{field} is required"));
        let cache_home = self.cache_home.ok_or_else(|| missing("cache_home"))?;
        let staging_dir = self.staging_dir.ok_or_else(|| missing("staging_dir"))?;

        let working_dir = self.working_dir.unwrap_or(Path::new("."));
        let build_root = normalize_path(working_dir.join(self.build_root.unwrap_or(Path::new("."))));

        let executable = self
            .executable
            .map(|exe| ExecutableRequest::classify(exe, working_dir));

        Ok(Build {
            cache_home,
            staging_dir,
            executable,
            build_root,
            args: self.args,
            verbose: self.verbose,
            quiet: self.quiet,
        })
    }
}

impl<'a> Build<'a> {
    pub fn builder<'b>() -> BuildBuilder<'b> {
        BuildBuilder::default()
    }

    /// Resolves the build tool once, records it, and runs the build.
    ///
    /// With no build arguments the tool is only resolved and recorded.
    pub fn run(self) -> Result<BuildTool> {
        let log = Logger::new(self.verbose, self.quiet);

        let tool = BuildTool::resolve(self.executable.as_ref(), &self.build_root)?;

        let mut store = StateStore::in_staging_dir(self.staging_dir)?;
        store.set(BUILD_TOOL_KEY, tool.to_string())?;

        let kind = if tool.is_wrapper() { "wrapper" } else { "executable" };
        if self.args.is_empty() {
            log.verbose(
                1,
                format!(
                    "No build arguments given; recorded {} ({kind}) without running it",
                    tool.path().display()
                ),
            );
            return Ok(tool);
        }

        log.info(format!("Building with {} ({kind})", tool.path().display()));
        tool.run(&self.build_root, self.cache_home, self.args, log)?;

        Ok(tool)
    }
}

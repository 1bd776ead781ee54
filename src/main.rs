//! # gradle-hold CLI
//!
//! The command-line interface for gradle-hold, a CI tool that deletes the
//! parts of a Gradle user home the last build did not use.
//!
//! ## Commands
//!
//! - **prepare**: Record cache usage before the build
//! - **build**: Run gradlew (or --executable) with the cache home wired in
//! - **cleanup**: Delete cache entries the build did not use
//! - **status**: Show whether a snapshot is waiting to be swept
//! - **reset**: Discard the snapshot and recorded state
//!
//! ## Quick Start
//!
//! ```bash
//! gradle-hold prepare
//! gradle-hold build -- build --no-daemon
//! gradle-hold cleanup
//! ```
//!
//! ## Environment Variables
//!
//! - `GRADLE_USER_HOME`: Cache home to clean (default: ~/.gradle)
//! - `GRADLE_HOLD_STAGING_DIR`: Where the snapshot lives between phases
//! - `GRADLE_HOLD_VERBOSE`: Enable verbose output
//! - `GRADLE_HOLD_QUIET`: Silence all output except errors
//!
//! See individual commands for more environment variables.

use std::io::IsTerminal;

use gradle_hold::cli::Cli;
use gradle_hold::commands;

fn main() -> miette::Result<()> {
    miette::set_panic_hook();
    install_report_handler()?;

    let cli = Cli::parse_args();
    commands::execute(&cli).map_err(Into::into)
}

/// Plain reports in CI logs, unicode ones on a terminal.
fn install_report_handler() -> miette::Result<()> {
    let (theme, context_lines) = if std::io::stderr().is_terminal() {
        (miette::GraphicalTheme::unicode_nocolor(), 3)
    } else {
        (miette::GraphicalTheme::none(), 0)
    };

    miette::set_hook(Box::new(move |_| {
        Box::new(
            miette::GraphicalReportHandler::new()
                .with_theme(theme.clone())
                .with_context_lines(context_lines),
        )
    }))?;

    Ok(())
}

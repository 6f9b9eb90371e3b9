//! Simulator build gate
//!
//! One build attempt before any test is dispatched. A non-zero return code
//! is fatal for the whole run.

use log::{info, warn};

use crate::config::BuildSpec;
use crate::error::{HarnessError, Result};
use crate::exec::{self, CommandOutput, ExecOptions};
use crate::models::CommandSpec;

/// Build the simulator. `release` runs the configure step first; `echo`
/// streams build output to stdout while it runs.
pub fn build_simulator(spec: &BuildSpec, release: bool, echo: bool) -> Result<CommandOutput> {
    let options = ExecOptions {
        echo,
        timeout: None,
    };

    if release {
        match &spec.release_configure {
            Some(configure) => match exec::execute(configure, &options) {
                Ok(output) if !output.success() => warn!(
                    "'{}' returned {}, building anyway",
                    configure.display(),
                    output.return_code
                ),
                Ok(_) => {}
                Err(err) => warn!("could not run '{}': {}", configure.display(), err),
            },
            None => warn!("release build requested but no release_configure command is set"),
        }
    }

    run_gate(&spec.command, &options)
        .map_err(|(code, output)| HarnessError::BuildFailed { code, output })
}

/// Run a pass/fail gate command. Spawn failures count as a failed gate with
/// the spawn error as the captured output.
pub(crate) fn run_gate(
    command: &CommandSpec,
    options: &ExecOptions,
) -> std::result::Result<CommandOutput, (i32, String)> {
    info!("running gate: {}", command.display());
    match exec::execute(command, options) {
        Ok(output) if output.success() => Ok(output),
        Ok(output) => Err((output.return_code, output.combined_output)),
        Err(err) => Err((
            crate::constants::DISPATCH_FAILURE_EXIT_CODE,
            format!("failed to run '{}': {}\n", command.display(), err),
        )),
    }
}

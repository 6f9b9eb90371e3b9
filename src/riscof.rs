//! RISCOF compliance flow
//!
//! Build the simulator, copy the executable into a RISCOF checkout and run
//! the checkout's test script. Both the build and the script are fatal gates.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use log::info;

use crate::build;
use crate::config::{HarnessConfig, RiscofSpec};
use crate::error::{HarnessError, Result};
use crate::exec::{CommandOutput, ExecOptions};
use crate::harness::RunRequest;
use crate::models::CommandSpec;

const GATE_NAME: &str = "Riscof";

/// Run the RISCOF flow described by `config.riscof`
pub fn run(
    config: &HarnessConfig,
    request: &RunRequest,
    status: &mut dyn Write,
) -> Result<CommandOutput> {
    let spec = config.riscof.as_ref().ok_or_else(|| {
        HarnessError::Config(
            "no [riscof] section configured and no --dir/--artifact given".to_string(),
        )
    })?;

    if !request.skip_build {
        if let Some(build_spec) = &config.build {
            build::build_simulator(build_spec, request.release, request.echo_build)?;
            let _ = writeln!(status, "Build Success!");
        }
    }

    let installed = install_artifact(spec)?;
    info!("installed {} as {}", spec.artifact.display(), installed.display());

    let options = ExecOptions {
        echo: request.echo_build,
        timeout: None,
    };
    let output = build::run_gate(&script_command(spec), &options).map_err(|(code, output)| {
        HarnessError::GateFailed {
            name: GATE_NAME.to_string(),
            code,
            output,
        }
    })?;
    let _ = writeln!(status, "Riscof Success!");
    Ok(output)
}

/// Copy the simulator executable into the RISCOF directory
fn install_artifact(spec: &RiscofSpec) -> Result<PathBuf> {
    if !spec.dir.is_dir() {
        return Err(HarnessError::Config(format!(
            "riscof directory does not exist: {}",
            spec.dir.display()
        )));
    }

    let file_name = spec.artifact.file_name().ok_or_else(|| {
        HarnessError::Config(format!("artifact has no file name: {}", spec.artifact.display()))
    })?;
    let target = spec.dir.join(file_name);
    fs::copy(&spec.artifact, &target).map_err(|source| {
        let context = format!(
            "failed to copy {} to {}",
            spec.artifact.display(),
            target.display()
        );
        HarnessError::io(context, source)
    })?;
    Ok(target)
}

/// The script runs inside the RISCOF directory. A relative path with a
/// separator is anchored there so it does not depend on our own cwd.
fn script_command(spec: &RiscofSpec) -> CommandSpec {
    let script = Path::new(&spec.script);
    let program = if script.is_relative() && spec.script.contains('/') {
        spec.dir.join(script).to_string_lossy().into_owned()
    } else {
        spec.script.clone()
    };
    CommandSpec::new(program).workdir(&spec.dir)
}

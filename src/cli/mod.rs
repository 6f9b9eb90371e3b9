//! CLI argument parsing and validation module
//!
//! Handles command-line interface using clap, including:
//! - Config file and preset selection
//! - Corpus overrides (root, patterns, skip-list)
//! - Simulator flag overrides, jobs and timeout
//! - Build gate switches (release, no-build)
//! - Output format selection (human/JSON) and verbosity

use anyhow::{anyhow, Result};
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use std::path::PathBuf;

use simharness::config::{default_riscof_script, ConfigLayer, HarnessConfig, RiscofSpec, Toggle};
use simharness::models::PathStyle;

/// Which flow to run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Run,
    Riscof,
}

/// Parsed command line
#[derive(Debug, Clone)]
pub struct CliOptions {
    pub mode: Mode,
    pub config_path: Option<PathBuf>,
    pub preset: Option<String>,
    /// Overrides that replace config values outright
    pub layer: ConfigLayer,
    pub overrides: CliOverrides,
    pub release: bool,
    pub no_build: bool,
    pub json_output: bool,
    pub quiet_mode: bool,
    pub verbose: bool,
}

/// Overrides that touch part of a config value, applied after loading
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    /// Appended to the configured skip-list
    pub extra_skip: Vec<String>,
    /// Replaces the simulator mode flags
    pub flags: Option<Vec<String>>,
    pub riscof_dir: Option<PathBuf>,
    pub riscof_artifact: Option<PathBuf>,
    pub riscof_script: Option<String>,
}

impl CliOverrides {
    pub fn apply(self, config: &mut HarnessConfig) -> Result<()> {
        config.skip.extend(self.extra_skip);
        if let Some(flags) = self.flags {
            config.simulator.flags = flags;
        }

        let touches_riscof = self.riscof_dir.is_some()
            || self.riscof_artifact.is_some()
            || self.riscof_script.is_some();
        if touches_riscof {
            let current = config.riscof.take();
            let dir = self
                .riscof_dir
                .or_else(|| current.as_ref().map(|spec| spec.dir.clone()))
                .ok_or_else(|| missing_riscof_setting("--dir"))?;
            let artifact = self
                .riscof_artifact
                .or_else(|| current.as_ref().map(|spec| spec.artifact.clone()))
                .ok_or_else(|| missing_riscof_setting("--artifact"))?;
            let script = self
                .riscof_script
                .or_else(|| current.map(|spec| spec.script))
                .unwrap_or_else(default_riscof_script);
            config.riscof = Some(RiscofSpec { dir, artifact, script });
        }

        config.validate()?;
        Ok(())
    }
}

fn missing_riscof_setting(flag: &str) -> anyhow::Error {
    anyhow!("{} is required when no [riscof] section is configured", flag)
}

fn version() -> &'static str {
    concat!(env!("SIMHARNESS_VERSION"), " (", env!("GIT_HASH"), ")")
}

fn common_args() -> Vec<Arg> {
    vec![
        Arg::new("config")
            .short('c')
            .long("config")
            .value_name("FILE")
            .help("TOML config file (default: ./simharness.toml, then the user config dir)")
            .value_parser(value_parser!(PathBuf)),
        Arg::new("preset")
            .short('p')
            .long("preset")
            .value_name("NAME")
            .help("Preset to start from: isa, isa-p or am"),
        Arg::new("release")
            .long("release")
            .help("Run the release configure step before building")
            .action(ArgAction::SetTrue),
        Arg::new("no-build")
            .long("no-build")
            .help("Skip the simulator build gate")
            .action(ArgAction::SetTrue),
        Arg::new("quiet")
            .short('q')
            .long("quiet")
            .help("No live build output and no progress line")
            .action(ArgAction::SetTrue)
            .conflicts_with("verbose"),
        Arg::new("verbose")
            .short('v')
            .long("verbose")
            .help("Debug logging on stderr")
            .action(ArgAction::SetTrue),
    ]
}

fn run_args() -> Vec<Arg> {
    vec![
        Arg::new("root")
            .short('r')
            .long("root")
            .value_name("DIR")
            .help("Directory the test patterns are resolved against")
            .value_parser(value_parser!(PathBuf)),
        Arg::new("pattern")
            .long("pattern")
            .value_name("GLOB")
            .help("Test pattern, supports {a,b} groups (replaces configured patterns)")
            .action(ArgAction::Append),
        Arg::new("skip")
            .long("skip")
            .value_name("SUBSTR")
            .help("Skip tests whose path contains this text (adds to the skip-list)")
            .action(ArgAction::Append),
        Arg::new("flag")
            .long("flag")
            .value_name("FLAG")
            .help("Simulator mode flag, e.g. --flag=--am (replaces configured flags)")
            .allow_hyphen_values(true)
            .action(ArgAction::Append),
        Arg::new("smoke")
            .long("smoke")
            .value_name("PATH")
            .help("Run this test first and print its full output")
            .value_parser(value_parser!(PathBuf)),
        Arg::new("no-smoke")
            .long("no-smoke")
            .help("Skip the configured smoke test")
            .action(ArgAction::SetTrue)
            .conflicts_with("smoke"),
        Arg::new("jobs")
            .short('j')
            .long("jobs")
            .value_name("N")
            .help("Concurrent simulator runs (0 = available parallelism)")
            .value_parser(value_parser!(usize)),
        Arg::new("timeout")
            .long("timeout")
            .value_name("SECS")
            .help("Kill a test after this many seconds")
            .value_parser(value_parser!(u64).range(1..)),
        Arg::new("basename")
            .long("basename")
            .help("Print test file names instead of full paths")
            .action(ArgAction::SetTrue),
        Arg::new("json")
            .long("json")
            .help("Output the report in JSON format")
            .action(ArgAction::SetTrue),
    ]
}

fn riscof_args() -> Vec<Arg> {
    vec![
        Arg::new("dir")
            .long("dir")
            .value_name("DIR")
            .help("RISCOF checkout to install the simulator into")
            .value_parser(value_parser!(PathBuf)),
        Arg::new("artifact")
            .long("artifact")
            .value_name("FILE")
            .help("Built simulator executable to copy")
            .value_parser(value_parser!(PathBuf)),
        Arg::new("script")
            .long("script")
            .value_name("CMD")
            .help("Script to run inside the checkout (default ./run-test.sh)"),
    ]
}

/// Full command definition
pub fn build_command() -> Command {
    Command::new("simharness")
        .version(version())
        .about("Build a hardware simulator and run a test corpus against it")
        .long_about(
            "Resolves test programs from glob patterns, builds the simulator, runs every test \
             concurrently and prints the results sorted by return code.",
        )
        .args_conflicts_with_subcommands(true)
        .args(common_args())
        .args(run_args())
        .subcommand(
            Command::new("run")
                .about("Run the test corpus (default)")
                .args(common_args())
                .args(run_args()),
        )
        .subcommand(
            Command::new("riscof")
                .about("Build, install the simulator into a RISCOF checkout and run it")
                .args(common_args())
                .args(riscof_args()),
        )
}

/// Parse command line arguments and return configuration
pub fn parse_args() -> Result<CliOptions> {
    from_matches(&build_command().get_matches())
}

pub fn from_matches(matches: &ArgMatches) -> Result<CliOptions> {
    let (mode, sub) = match matches.subcommand() {
        Some(("riscof", sub)) => (Mode::Riscof, sub),
        Some(("run", sub)) => (Mode::Run, sub),
        _ => (Mode::Run, matches),
    };

    let strings = |id: &str| -> Option<Vec<String>> {
        sub.get_many::<String>(id).map(|values| values.cloned().collect())
    };

    let mut layer = ConfigLayer::default();
    let mut overrides = CliOverrides::default();
    let mut json_output = false;

    match mode {
        Mode::Run => {
            layer.root = sub.get_one::<PathBuf>("root").cloned();
            layer.patterns = strings("pattern");
            layer.smoke = if sub.get_flag("no-smoke") {
                Some(Toggle::Enabled(false))
            } else {
                sub.get_one::<PathBuf>("smoke").cloned().map(Toggle::Set)
            };
            layer.jobs = sub.get_one::<usize>("jobs").copied();
            layer.timeout_secs = sub.get_one::<u64>("timeout").copied();
            if sub.get_flag("basename") {
                layer.report_paths = Some(PathStyle::Basename);
            }
            overrides.extra_skip = strings("skip").unwrap_or_default();
            overrides.flags = strings("flag");
            json_output = sub.get_flag("json");
        }
        Mode::Riscof => {
            overrides.riscof_dir = sub.get_one::<PathBuf>("dir").cloned();
            overrides.riscof_artifact = sub.get_one::<PathBuf>("artifact").cloned();
            overrides.riscof_script = sub.get_one::<String>("script").cloned();
        }
    }

    Ok(CliOptions {
        mode,
        config_path: sub.get_one::<PathBuf>("config").cloned(),
        preset: sub.get_one::<String>("preset").cloned(),
        layer,
        overrides,
        release: sub.get_flag("release"),
        no_build: sub.get_flag("no-build"),
        json_output,
        quiet_mode: sub.get_flag("quiet"),
        verbose: sub.get_flag("verbose"),
    })
}

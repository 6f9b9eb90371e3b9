//! Configuration management
//!
//! A run is described by one [`HarnessConfig`]. It is assembled in layers:
//! a named preset, then an optional TOML file, then command-line overrides.
//! Every layer after the preset is a [`ConfigLayer`] whose unset fields leave
//! the layer below untouched.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use crate::constants::{
    CONFIG_DIR_NAME, CONFIG_FILE_NAME, DEFAULT_EXCLUDED_SUFFIXES, DEFAULT_RISCOF_SCRIPT,
    LOCAL_CONFIG_FILE,
};
use crate::error::{HarnessError, Result};
use crate::models::{CommandSpec, ExecutionSpec, PathStyle};

mod presets;

pub use presets::Preset;

/// Complete description of a harness run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HarnessConfig {
    /// Directory that relative patterns and the smoke test are resolved against
    pub root: PathBuf,
    pub patterns: Vec<String>,
    /// Substrings that exclude a test program when its path contains them
    pub skip: Vec<String>,
    pub excluded_suffixes: Vec<String>,
    pub simulator: ExecutionSpec,
    /// Build gate; `None` runs against whatever simulator already exists
    pub build: Option<BuildSpec>,
    /// Test run alone before the bulk run; its full output is shown as soon
    /// as it finishes
    pub smoke: Option<PathBuf>,
    /// Worker threads; 0 means one per available CPU
    pub jobs: usize,
    pub timeout_secs: Option<u64>,
    pub report_paths: PathStyle,
    pub riscof: Option<RiscofSpec>,
}

/// How to (re)build the simulator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildSpec {
    #[serde(flatten)]
    pub command: CommandSpec,
    /// Run before `command` when a release build is requested; its result is not gated
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub release_configure: Option<CommandSpec>,
}

/// RISCOF compliance run: copy the built simulator into a checkout and run its script
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiscofSpec {
    pub dir: PathBuf,
    /// Built simulator executable to copy into `dir`
    pub artifact: PathBuf,
    #[serde(default = "default_riscof_script")]
    pub script: String,
}

pub fn default_riscof_script() -> String {
    DEFAULT_RISCOF_SCRIPT.to_string()
}

/// Layer value for an optional step. `false` turns the step off, `true`
/// keeps what the layer below chose, anything else replaces it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Toggle<T> {
    Enabled(bool),
    Set(T),
}

impl<T> Toggle<T> {
    fn apply_to(self, slot: &mut Option<T>) {
        match self {
            Toggle::Enabled(true) => {}
            Toggle::Enabled(false) => *slot = None,
            Toggle::Set(value) => *slot = Some(value),
        }
    }
}

/// Partial configuration, as read from a TOML file or built from CLI flags
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigLayer {
    /// Preset to start from; only meaningful in a file layer
    pub preset: Option<String>,
    pub root: Option<PathBuf>,
    pub patterns: Option<Vec<String>>,
    pub skip: Option<Vec<String>>,
    pub excluded_suffixes: Option<Vec<String>>,
    pub simulator: Option<ExecutionSpec>,
    pub build: Option<Toggle<BuildSpec>>,
    pub smoke: Option<Toggle<PathBuf>>,
    pub jobs: Option<usize>,
    pub timeout_secs: Option<u64>,
    pub report_paths: Option<PathStyle>,
    pub riscof: Option<RiscofSpec>,
}

impl ConfigLayer {
    /// Parse a layer from TOML text
    pub fn from_toml(text: &str, path: &Path) -> Result<Self> {
        toml::from_str(text).map_err(|source| HarnessError::ConfigParse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Read and parse a TOML config file
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|source| HarnessError::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&text, path)
    }

    /// Overwrite every field of `config` that this layer sets
    pub fn apply_to(self, config: &mut HarnessConfig) {
        if let Some(root) = self.root {
            config.root = root;
        }
        if let Some(patterns) = self.patterns {
            config.patterns = patterns;
        }
        if let Some(skip) = self.skip {
            config.skip = skip;
        }
        if let Some(suffixes) = self.excluded_suffixes {
            config.excluded_suffixes = suffixes;
        }
        if let Some(simulator) = self.simulator {
            config.simulator = simulator;
        }
        if let Some(build) = self.build {
            build.apply_to(&mut config.build);
        }
        if let Some(smoke) = self.smoke {
            smoke.apply_to(&mut config.smoke);
        }
        if let Some(jobs) = self.jobs {
            config.jobs = jobs;
        }
        if let Some(timeout) = self.timeout_secs {
            config.timeout_secs = Some(timeout);
        }
        if let Some(style) = self.report_paths {
            config.report_paths = style;
        }
        if let Some(riscof) = self.riscof {
            config.riscof = Some(riscof);
        }
    }
}

impl HarnessConfig {
    /// Start from a preset, then apply `layers` in order
    pub fn assemble(
        preset: Preset,
        layers: impl IntoIterator<Item = ConfigLayer>,
    ) -> Result<Self> {
        let mut config = preset.config();
        for layer in layers {
            layer.apply_to(&mut config);
        }
        config.validate()?;
        Ok(config)
    }

    /// Build from an optional file layer and CLI layer. The file may choose the
    /// preset; an explicit CLI preset wins over it.
    pub fn load(
        file: Option<&Path>,
        cli_preset: Option<&str>,
        cli: ConfigLayer,
    ) -> Result<Self> {
        let file_layer = file.map(ConfigLayer::load_from_file).transpose()?;

        let preset_name = cli_preset
            .map(str::to_string)
            .or_else(|| file_layer.as_ref().and_then(|layer| layer.preset.clone()));
        let preset = match preset_name {
            Some(name) => name.parse()?,
            None => Preset::default(),
        };

        Self::assemble(preset, file_layer.into_iter().chain(std::iter::once(cli)))
    }

    pub fn validate(&self) -> Result<()> {
        if self.simulator.base.program.trim().is_empty() {
            return Err(HarnessError::Config("simulator program must not be empty".to_string()));
        }
        if let Some(build) = &self.build {
            if build.command.program.trim().is_empty() {
                return Err(HarnessError::Config("build program must not be empty".to_string()));
            }
        }
        if self.timeout_secs == Some(0) {
            return Err(HarnessError::Config("timeout_secs must be greater than 0".to_string()));
        }
        Ok(())
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }

    /// Smoke test path, relative entries taken from `root`
    pub fn smoke_path(&self) -> Option<PathBuf> {
        self.smoke.as_ref().map(|path| {
            if path.is_absolute() {
                path.clone()
            } else {
                self.root.join(path)
            }
        })
    }
}

impl FromStr for Preset {
    type Err = HarnessError;

    fn from_str(name: &str) -> Result<Self> {
        Preset::ALL
            .iter()
            .copied()
            .find(|preset| preset.name() == name)
            .ok_or_else(|| HarnessError::UnknownPreset(name.to_string()))
    }
}

/// Config file to use when none is given: `./simharness.toml`, then the
/// per-user config directory.
pub fn locate_config(explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(path.to_path_buf());
    }

    let local = PathBuf::from(LOCAL_CONFIG_FILE);
    if local.is_file() {
        return Some(local);
    }

    dirs::config_dir()
        .map(|dir| dir.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
        .filter(|path| path.is_file())
}

pub(crate) fn default_excluded_suffixes() -> Vec<String> {
    DEFAULT_EXCLUDED_SUFFIXES.iter().map(|s| s.to_string()).collect()
}

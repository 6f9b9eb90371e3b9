//! Named run presets
//!
//! The riscv-tests runner and the AM cpu-tests runner differ in corpus,
//! simulator flags and report style. Each variant is a preset rather than
//! one canonical configuration.

use std::path::PathBuf;

use super::{default_excluded_suffixes, BuildSpec, HarnessConfig};
use crate::models::{CommandSpec, ExecutionSpec, PathStyle};

const RISCV_TESTS_ROOT: &str = "/opt/riscv-tests/share/riscv-tests/isa";
const AM_TESTS_ROOT: &str = "am-kernels/tests/cpu-tests/build";
const AM_SMOKE_TEST: &str = "recursion-riscv64-nemu.bin";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Preset {
    /// Physical and virtual-memory ISA suites with difftest enabled
    #[default]
    Isa,
    /// Physical-memory ISA suites only, smaller cycle budget, no difftest
    IsaPhysical,
    /// AM cpu-tests `.bin` images in application mode
    Am,
}

impl Preset {
    pub const ALL: [Preset; 3] = [Preset::Isa, Preset::IsaPhysical, Preset::Am];

    pub fn name(self) -> &'static str {
        match self {
            Preset::Isa => "isa",
            Preset::IsaPhysical => "isa-p",
            Preset::Am => "am",
        }
    }

    pub fn config(self) -> HarnessConfig {
        match self {
            Preset::Isa => HarnessConfig {
                root: PathBuf::from(RISCV_TESTS_ROOT),
                patterns: strings(&["rv64u{i,m,a,c}-p*", "rv64u{i,m,a,c}-v*", "rv64mi-p*"]),
                skip: strings(&["rv64ui-p-ma_data", "rv64ui-v-ma_data", "rv64mi-p-illegal"]),
                excluded_suffixes: default_excluded_suffixes(),
                simulator: xmake_simulator(&["-d", "--clk=3000000", "--tohost-check"]),
                build: Some(xmake_build()),
                smoke: None,
                jobs: 0,
                timeout_secs: None,
                report_paths: PathStyle::Full,
                riscof: None,
            },
            Preset::IsaPhysical => HarnessConfig {
                patterns: strings(&["rv64u{i,m,a,c}-p*", "rv64mi-p*"]),
                skip: strings(&["rv64ui-p-ma_data", "rv64mi-p-illegal"]),
                simulator: xmake_simulator(&["--clk=1000000", "--tohost-check"]),
                ..Preset::Isa.config()
            },
            Preset::Am => HarnessConfig {
                root: PathBuf::from(AM_TESTS_ROOT),
                patterns: strings(&["*.bin"]),
                skip: Vec::new(),
                simulator: xmake_simulator(&["--am"]),
                smoke: Some(PathBuf::from(AM_SMOKE_TEST)),
                report_paths: PathStyle::Basename,
                ..Preset::Isa.config()
            },
        }
    }
}

fn xmake_simulator(flags: &[&str]) -> ExecutionSpec {
    ExecutionSpec::new(CommandSpec::new("xmake").args(["r", "Vtop"]), strings(flags))
}

fn xmake_build() -> BuildSpec {
    BuildSpec {
        command: CommandSpec::new("xmake"),
        release_configure: Some(CommandSpec::new("xmake").args(["f", "-m", "release"])),
    }
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

//! Global constants for simharness
//!
//! Defaults shared by the presets, the CLI and the executor.

/// Config file looked up in the current directory when `--config` is absent
pub const LOCAL_CONFIG_FILE: &str = "simharness.toml";

/// Directory name under the user config dir (`~/.config/simharness/config.toml`)
pub const CONFIG_DIR_NAME: &str = "simharness";

/// File name inside [`CONFIG_DIR_NAME`]
pub const CONFIG_FILE_NAME: &str = "config.toml";

/// Disassembly dumps that sit next to the riscv-tests ELFs
pub const DEFAULT_EXCLUDED_SUFFIXES: &[&str] = &[".dump"];

/// Script run inside a RISCOF checkout when none is configured
pub const DEFAULT_RISCOF_SCRIPT: &str = "./run-test.sh";

/// Flag that precedes the test program path in a simulator invocation
pub const TEST_FILE_FLAG: &str = "-f";

/// Exit code recorded when a run hits its wall-clock limit (`timeout(1)` convention)
pub const TIMEOUT_EXIT_CODE: i32 = 124;

/// Exit code recorded when a test could not be dispatched at all (shell convention)
pub const DISPATCH_FAILURE_EXIT_CODE: i32 = 127;

/// Poll interval while waiting on a child that has a deadline
pub const TIMEOUT_POLL_INTERVAL_MS: u64 = 10;

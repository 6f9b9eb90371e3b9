#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Fake simulator: reads the `-f` file, logs the invocation, and exits with
/// the number stored in the file. A file containing `hang` sleeps instead.
const FAKE_SIMULATOR: &str = r#"
file=""
while [ $# -gt 0 ]; do
    if [ "$1" = "-f" ]; then
        shift
        file="$1"
    fi
    shift
done
echo "$file" >> "$SIMHARNESS_TEST_LOG"
content="$(cat "$file")"
if [ "$content" = "hang" ]; then
    sleep 30
fi
echo "simulated $file"
exit "$content"
"#;

/// Controlled corpus + simulator + config file for driving the CLI
pub struct HarnessFixture {
    pub temp_dir: TempDir,
    pub root: PathBuf,
    pub config_path: PathBuf,
    /// One line per simulator invocation
    pub invocation_log: PathBuf,
    simulator: PathBuf,
}

impl HarnessFixture {
    /// Create a corpus where each `(name, content)` is a test program file.
    /// Content is the exit code the fake simulator returns for it.
    pub fn new(tests: &[(&str, &str)]) -> anyhow::Result<Self> {
        let temp_dir = tempfile::tempdir()?;
        let root = temp_dir.path().join("isa");
        fs::create_dir(&root)?;
        for (name, content) in tests {
            fs::write(root.join(name), content)?;
        }

        let simulator = temp_dir.path().join("fake-sim.sh");
        let invocation_log = temp_dir.path().join("invocations.log");
        let script = FAKE_SIMULATOR.replace(
            "$SIMHARNESS_TEST_LOG",
            &invocation_log.display().to_string(),
        );
        fs::write(&simulator, script)?;

        let fixture = HarnessFixture {
            config_path: temp_dir.path().join("simharness.toml"),
            temp_dir,
            root,
            invocation_log,
            simulator,
        };
        fixture.write_config("exit 0")?;
        Ok(fixture)
    }

    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    pub fn config_arg(&self) -> String {
        self.config_path.display().to_string()
    }

    /// Rewrite the config with a different build script body (run via `sh -c`)
    pub fn write_config(&self, build_script: &str) -> anyhow::Result<()> {
        let config = format!(
            r#"root = "{root}"
patterns = ["rv64u{{i,m}}-p*"]
skip = []
jobs = 2

[simulator]
program = "sh"
args = ["{simulator}"]
flags = ["--clk=1000", "--tohost-check"]

[build]
program = "sh"
args = ["-c", "{build}"]
"#,
            root = self.root.display(),
            simulator = self.simulator.display(),
            build = build_script,
        );
        fs::write(&self.config_path, config)?;
        Ok(())
    }

    /// How many times the simulator was started
    pub fn invocations(&self) -> usize {
        fs::read_to_string(&self.invocation_log)
            .map(|log| log.lines().count())
            .unwrap_or(0)
    }
}

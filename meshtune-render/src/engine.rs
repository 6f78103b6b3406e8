//! External-command geometry engine

use crate::worker::Engine;
use meshtune_io::MeshFormat;
use std::process::Command;
use tracing::{debug, warn};

/// Runs an external geometry kernel once per render.
///
/// The source is written to a temporary file and the kernel is invoked with
/// `args`, where `{input}` and `{output}` are replaced by the source and mesh
/// paths. The mesh file is read back once the process exits successfully.
#[derive(Debug, Clone)]
pub struct CommandEngine {
    pub program: String,
    pub args: Vec<String>,
    pub input_name: String,
}

impl CommandEngine {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
            input_name: "model.scad".to_string(),
        }
    }

    /// `openscad -o {output} {input}`
    pub fn openscad() -> Self {
        Self::new(
            "openscad",
            vec!["-o".into(), "{output}".into(), "{input}".into()],
        )
    }

    /// Parse a command line such as `"openscad -o {output} {input}"`
    pub fn from_command_line(line: &str) -> Option<Self> {
        let mut words = line.split_whitespace().map(str::to_string);
        let program = words.next()?;
        Some(Self::new(program, words.collect()))
    }

    fn expand(&self, input: &str, output: &str) -> Vec<String> {
        self.args
            .iter()
            .map(|arg| arg.replace("{input}", input).replace("{output}", output))
            .collect()
    }
}

impl Engine for CommandEngine {
    fn render(
        &mut self,
        source: &str,
        format: MeshFormat,
        progress: &mut dyn FnMut(f32),
    ) -> std::result::Result<Vec<u8>, String> {
        let dir = tempfile::tempdir().map_err(|e| format!("Failed to create work dir: {e}"))?;
        let input = dir.path().join(&self.input_name);
        let output = dir.path().join(format.file_name());
        std::fs::write(&input, source).map_err(|e| format!("Failed to write source: {e}"))?;

        progress(0.0);
        let args = self.expand(&input.to_string_lossy(), &output.to_string_lossy());
        debug!(program = %self.program, ?args, "running geometry engine");

        let result = Command::new(&self.program)
            .args(&args)
            .output()
            .map_err(|e| format!("Failed to run {}: {e}", self.program))?;

        if !result.status.success() {
            let stderr = String::from_utf8_lossy(&result.stderr).trim().to_string();
            warn!(status = %result.status, "geometry engine failed");
            return Err(if stderr.is_empty() {
                format!("{} exited with {}", self.program, result.status)
            } else {
                stderr
            });
        }

        let data = std::fs::read(&output)
            .map_err(|e| format!("{} produced no {} output: {e}", self.program, format))?;
        progress(1.0);
        Ok(data)
    }
}

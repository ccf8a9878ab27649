use super::{Classification, Classifier};
use crate::error::{ErrorKind, Result};
use exn::ResultExt;
use std::path::{Path, PathBuf};
use std::process::Command;

/// Classifies files by asking `file -b`.
#[derive(Debug, Clone)]
pub struct MagicClassifier {
    program: PathBuf,
}
impl MagicClassifier {
    /// Locates `file` on the `PATH`.
    pub fn discover() -> Option<Self> {
        match which::which("file") {
            Ok(program) => {
                tracing::trace!(program = %program.display(), "Discovered file(1)");
                Some(Self::with_program(program))
            },
            Err(_) => None,
        }
    }

    /// Uses a specific `file`-compatible executable.
    pub fn with_program(program: impl Into<PathBuf>) -> Self {
        Self { program: program.into() }
    }

    /// `file` doesn't fail on a bad path, it describes the failure instead.
    /// Make sure the path is there before asking.
    fn check_exists(path: &Path) -> Result<()> {
        std::fs::symlink_metadata(path).or_raise(|| ErrorKind::Classify(path.to_path_buf()))?;
        Ok(())
    }

    fn describe(&self, path: &Path) -> String {
        let output = Command::new(&self.program).arg("-b").arg(path).output();
        let description = match output {
            Ok(output) if output.status.success() => String::from_utf8_lossy(&output.stdout).into_owned(),
            Ok(output) => {
                tracing::warn!(path = %path.display(), status = %output.status, "file(1) exited unsuccessfully");
                return "unknown".to_string();
            },
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Could not run file(1)");
                return "unknown".to_string();
            },
        };
        let description = description.strip_suffix('\n').unwrap_or(&description);
        if description.is_empty() {
            tracing::warn!(path = %path.display(), "file(1) returned an empty description");
            return "none".to_string();
        }
        description.to_string()
    }
}

impl Classifier for MagicClassifier {
    fn name(&self) -> &'static str {
        "file"
    }

    fn classify(&self, path: &Path) -> Result<Classification> {
        Self::check_exists(path)?;
        Ok(Classification::from_description(self.describe(path)))
    }
}

//! External tools: the report renderer and the PDF toolkit.
//!
//! Both are opaque executables driven through [`CommandRunner`], which tests
//! replace with a runner that fabricates the output files.

pub mod pdftk;
pub mod renderer;

pub use pdftk::PdfTool;
pub use renderer::ReportRenderer;

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::process::Command;

#[derive(Debug, Error)]
pub enum ToolError {
    #[error("failed to start {program}: {source}")]
    Spawn {
        program: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{program} exited with status {code}: {stderr}")]
    Exit {
        program: PathBuf,
        code: i32,
        stderr: String,
    },
}

#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Run `program` to completion; a non-zero exit is an error.
    async fn run(&self, program: &Path, args: &[String]) -> Result<(), ToolError>;
}

/// Runs tools as child processes.
#[derive(Debug, Default, Clone)]
pub struct SystemRunner;

#[async_trait]
impl CommandRunner for SystemRunner {
    async fn run(&self, program: &Path, args: &[String]) -> Result<(), ToolError> {
        log::debug!("exec: \"{}\" {}", program.display(), args.join(" "));

        let output = Command::new(program)
            .args(args)
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|source| ToolError::Spawn {
                program: program.to_path_buf(),
                source,
            })?;

        if !output.status.success() {
            return Err(ToolError::Exit {
                program: program.to_path_buf(),
                code: output.status.code().unwrap_or(-1),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(())
    }
}

/// Render a path as an argument; tools receive it verbatim.
pub(crate) fn path_arg(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_program_is_spawn_error() {
        let runner = SystemRunner;
        let err = runner
            .run(Path::new("/nonexistent/secure-letters-tool"), &[])
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::Spawn { .. }));
    }
}

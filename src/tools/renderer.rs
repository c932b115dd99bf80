//! Report renderer invocation.
//!
//! `<exe> -F <report> -O <output> -E pdf -a PrintBatch:<n> <db-access...>`

use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::{path_arg, CommandRunner, ToolError};

pub struct ReportRenderer {
    exec: PathBuf,
    db_access: Vec<String>,
    runner: Arc<dyn CommandRunner>,
}

impl ReportRenderer {
    pub fn new(exec: PathBuf, db_access: Vec<String>, runner: Arc<dyn CommandRunner>) -> Self {
        Self {
            exec,
            db_access,
            runner,
        }
    }

    /// Arguments rendering the single queue row tagged `batch` to `output`.
    pub fn args(&self, report: &Path, output: &Path, batch: i64) -> Vec<String> {
        let mut args = vec![
            "-F".to_string(),
            path_arg(report),
            "-O".to_string(),
            path_arg(output),
            "-E".to_string(),
            "pdf".to_string(),
            "-a".to_string(),
            format!("PrintBatch:{batch}"),
        ];
        args.extend(self.db_access.iter().cloned());
        args
    }

    pub async fn render(&self, report: &Path, output: &Path, batch: i64) -> Result<(), ToolError> {
        let args = self.args(report, output, batch);
        self.runner.run(&self.exec, &args).await
    }
}

//! PDF toolkit invocations: letterhead overlay, permission policy, and the
//! metadata/password stage.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::{path_arg, CommandRunner, ToolError};

pub struct PdfTool {
    exec: PathBuf,
    extra_args: Vec<String>,
    runner: Arc<dyn CommandRunner>,
}

impl PdfTool {
    pub fn new(exec: PathBuf, extra_args: Vec<String>, runner: Arc<dyn CommandRunner>) -> Self {
        Self {
            exec,
            extra_args,
            runner,
        }
    }

    /// `<input> [background <letterhead>] output <output>`
    pub fn overlay_args(&self, input: &Path, letterhead: Option<&Path>, output: &Path) -> Vec<String> {
        let mut args = vec![path_arg(input)];
        if let Some(letterhead) = letterhead {
            args.push("background".to_string());
            args.push(path_arg(letterhead));
        }
        args.push("output".to_string());
        args.push(path_arg(output));
        self.with_extra(args)
    }

    /// `<input> <policy...> output <output>`; the policy is whitespace separated.
    pub fn restrict_args(&self, input: &Path, policy: &str, output: &Path) -> Vec<String> {
        let mut args = vec![path_arg(input)];
        args.extend(policy.split_whitespace().map(str::to_string));
        args.push("output".to_string());
        args.push(path_arg(output));
        self.with_extra(args)
    }

    /// `<input> update_info <info> output <output> owner_pw <pw> [user_pw <pw>]`
    ///
    /// An empty user password leaves the document openable without one.
    pub fn finalize_args(
        &self,
        input: &Path,
        info_file: &Path,
        output: &Path,
        owner_password: &str,
        user_password: &str,
    ) -> Vec<String> {
        let mut args = vec![
            path_arg(input),
            "update_info".to_string(),
            path_arg(info_file),
            "output".to_string(),
            path_arg(output),
            "owner_pw".to_string(),
            owner_password.to_string(),
        ];
        if !user_password.is_empty() {
            args.push("user_pw".to_string());
            args.push(user_password.to_string());
        }
        self.with_extra(args)
    }

    pub async fn overlay(
        &self,
        input: &Path,
        letterhead: Option<&Path>,
        output: &Path,
    ) -> Result<(), ToolError> {
        self.run(self.overlay_args(input, letterhead, output)).await
    }

    pub async fn restrict(&self, input: &Path, policy: &str, output: &Path) -> Result<(), ToolError> {
        self.run(self.restrict_args(input, policy, output)).await
    }

    pub async fn finalize(
        &self,
        input: &Path,
        info_file: &Path,
        output: &Path,
        owner_password: &str,
        user_password: &str,
    ) -> Result<(), ToolError> {
        self.run(self.finalize_args(input, info_file, output, owner_password, user_password))
            .await
    }

    fn with_extra(&self, mut args: Vec<String>) -> Vec<String> {
        args.extend(self.extra_args.iter().cloned());
        args
    }

    async fn run(&self, args: Vec<String>) -> Result<(), ToolError> {
        self.runner.run(&self.exec, &args).await
    }
}

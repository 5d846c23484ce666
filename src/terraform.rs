//! Produce plan JSON by running terraform.
//!
//! Runs `terraform plan -out=<tmp>/tfplan` followed by
//! `terraform show -json <tmp>/tfplan` in the working directory. Terraform's
//! own progress output goes to stderr so stdout stays reserved for the
//! report. The temporary plan file is removed when the run finishes.

use crate::error::Result;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;

/// Default terraform executable.
pub const DEFAULT_BINARY: &str = "terraform";

/// Runs terraform in a working directory.
#[derive(Debug, Clone)]
pub struct TerraformRunner {
    binary: PathBuf,
    workdir: PathBuf,
}

impl TerraformRunner {
    /// Create a runner for `workdir` using `terraform` from `PATH`.
    #[must_use]
    pub fn new(workdir: impl Into<PathBuf>) -> Self {
        Self {
            binary: PathBuf::from(DEFAULT_BINARY),
            workdir: workdir.into(),
        }
    }

    /// Use a different terraform executable.
    #[must_use]
    pub fn with_binary(mut self, binary: impl Into<PathBuf>) -> Self {
        self.binary = binary.into();
        self
    }

    /// Plan and return the plan JSON bytes.
    ///
    /// # Errors
    ///
    /// Returns `Terraform` if the binary cannot be started or exits non-zero,
    /// and `Io` if the temporary directory cannot be created.
    pub async fn plan_json(&self) -> Result<Vec<u8>> {
        let tmp = tempfile::Builder::new()
            .prefix("tf-why-")
            .tempdir()
            .map_err(|e| crate::err!(Io { path: std::env::temp_dir(), source: e }))?;
        let plan_file = tmp.path().join("tfplan");

        tracing::info!(workdir = %self.workdir.display(), "Running terraform plan");
        let out_arg = format!("-out={}", plan_file.display());
        self.run(&["plan", "-input=false", &out_arg], false).await?;

        tracing::info!("Running terraform show -json");
        let plan_arg = plan_file.to_string_lossy();
        let json = self.run(&["show", "-json", &plan_arg], true).await?;

        tracing::debug!(bytes = json.len(), "Captured plan JSON");
        Ok(json)
    }

    /// Run one terraform command. Stdout is returned when `capture` is set
    /// and otherwise forwarded to our stderr.
    async fn run(&self, args: &[&str], capture: bool) -> Result<Vec<u8>> {
        let command_line = format!("{} {}", self.binary.display(), args.join(" "));
        tracing::debug!(command = %command_line, capture, "Spawning terraform");

        let stdout = if capture { Stdio::piped() } else { stderr_sink()? };

        let output = Command::new(&self.binary)
            .args(args)
            .current_dir(&self.workdir)
            .stdin(Stdio::null())
            .stdout(stdout)
            .stderr(Stdio::inherit())
            .output()
            .await
            .map_err(|e| {
                crate::err!(Terraform {
                    message: format!("failed to start `{command_line}`: {e}"),
                })
            })?;

        if !output.status.success() {
            return Err(crate::err!(Terraform {
                message: format!("`{command_line}` failed with {}", output.status),
            }));
        }
        Ok(output.stdout)
    }

    /// Working directory terraform runs in.
    #[must_use]
    pub fn workdir(&self) -> &Path {
        &self.workdir
    }
}

/// A handle that writes into this process's stderr.
fn stderr_sink() -> Result<Stdio> {
    #[cfg(unix)]
    {
        use std::os::fd::AsFd;
        let fd = std::io::stderr().as_fd().try_clone_to_owned()?;
        Ok(Stdio::from(fd))
    }
    #[cfg(not(unix))]
    {
        Ok(Stdio::inherit())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TfWhyError;

    #[tokio::test]
    async fn test_missing_binary_is_terraform_error() {
        let dir = tempfile::tempdir().unwrap();
        let runner = TerraformRunner::new(dir.path()).with_binary("tf-why-no-such-terraform");

        let err = runner.plan_json().await.unwrap_err();
        assert!(matches!(err, TfWhyError::Terraform { .. }));
        assert!(err.to_string().contains("failed to start"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_failing_command_reports_status() {
        let dir = tempfile::tempdir().unwrap();
        let runner = TerraformRunner::new(dir.path()).with_binary("false");

        let err = runner.plan_json().await.unwrap_err();
        assert!(matches!(err, TfWhyError::Terraform { .. }));
        assert!(err.to_string().contains("failed with"));
    }

    #[test]
    fn test_defaults() {
        let runner = TerraformRunner::new(".");
        assert_eq!(runner.workdir(), Path::new("."));
        assert_eq!(runner.binary, PathBuf::from(DEFAULT_BINARY));
    }
}

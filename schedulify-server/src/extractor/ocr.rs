//! Tesseract OCR via its command-line binary.

use std::path::PathBuf;
use std::process::Stdio;

use anyhow::{Context, Result};
use async_trait::async_trait;
use schedulify_core::error::{ScheduleError, ScheduleResult};
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

use super::{TextRecognizer, Upload, upstream};
use crate::server_config::ServerSettings;

pub struct Tesseract {
    binary: PathBuf,
}

impl Tesseract {
    /// Locate the binary: configured path first, then PATH.
    pub fn from_settings(settings: &ServerSettings) -> Result<Self> {
        let binary = match settings.tesseract_path {
            Some(ref path) => which::which(path),
            None => which::which("tesseract"),
        }
        .context("tesseract not found; install it or set tesseract_path")?;

        Ok(Tesseract { binary })
    }
}

#[async_trait]
impl TextRecognizer for Tesseract {
    async fn recognize(&self, upload: &Upload) -> ScheduleResult<String> {
        if upload.is_pdf() {
            return Err(ScheduleError::format("file", "OCR needs an image upload, not a PDF"));
        }

        let mut child = Command::new(&self.binary)
            .args(["stdin", "stdout"])
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| upstream("Failed to start tesseract", e.to_string()))?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin
                .write_all(&upload.bytes)
                .await
                .map_err(|e| upstream("Failed to send image to tesseract", e.to_string()))?;
        }

        let output = child
            .wait_with_output()
            .await
            .map_err(|e| upstream("tesseract did not finish", e.to_string()))?;

        if !output.status.success() {
            return Err(upstream(
                format!("tesseract exited with {}", output.status),
                String::from_utf8_lossy(&output.stderr),
            ));
        }

        let text = String::from_utf8_lossy(&output.stdout).into_owned();
        tracing::debug!(chars = text.len(), "tesseract finished");
        Ok(text)
    }
}

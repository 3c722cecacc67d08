//! Screen capture for the screen-check pipeline
//!
//! Grabs the full screen with the macOS `screencapture` command, which
//! correctly captures the currently visible Space, and hands the image back
//! base64-encoded for the gateway. The intermediate PNG lives in the temp
//! directory only for the duration of the call.

use crate::error::CaptureError;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::Local;
use std::fs;
use std::path::PathBuf;
use std::process::Command;
use tracing::{info, warn};

fn capture_path() -> PathBuf {
    let timestamp = Local::now().format("%Y-%m-%d-%H-%M-%S%.3f");
    std::env::temp_dir().join(format!("showdesk-capture-{}.png", timestamp))
}

/// Capture the full screen and return it as base64 PNG.
pub fn capture_screen_base64() -> Result<String, CaptureError> {
    let filepath = capture_path();
    let filepath_str = filepath.to_string_lossy().to_string();

    // -x: no sound
    // -t png: format
    let output = Command::new("screencapture")
        .args(["-x", "-t", "png", &filepath_str])
        .output()
        .map_err(|e| CaptureError::Capture(format!("Failed to run screencapture: {}", e)))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(CaptureError::Capture(format!(
            "screencapture exited with status {}: {}",
            output.status, stderr
        )));
    }

    if !filepath.exists() {
        return Err(CaptureError::Capture("Capture file was not created".into()));
    }

    let bytes = fs::read(&filepath)?;
    if let Err(e) = fs::remove_file(&filepath) {
        warn!("Failed to remove capture file {:?}: {}", filepath, e);
    }

    info!(bytes = bytes.len(), "Screen captured");
    Ok(STANDARD.encode(bytes))
}

use anyhow::Context;
use domain::analysis::AnalysisResult;
use domain::memory::Message;
use domain::transcript::{render_transcript, ExportFormat};
use shared::types::Result;
use std::fs;
use std::path::Path;
use tracing::info;

fn write(path: &Path, contents: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    fs::write(path, contents).with_context(|| format!("Failed to write export at {:?}", path))
}

pub fn write_transcript(path: &Path, messages: &[Message]) -> Result<ExportFormat> {
    let format = ExportFormat::from_path(path);
    write(path, &render_transcript(messages, format)?)?;
    info!(path = %path.display(), messages = messages.len(), ?format, "transcript exported");
    Ok(format)
}

pub fn write_analysis(path: &Path, result: &AnalysisResult) -> Result<ExportFormat> {
    let format = ExportFormat::from_path(path);
    write(path, &result.render(format)?)?;
    info!(path = %path.display(), ?format, "analysis exported");
    Ok(format)
}

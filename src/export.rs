use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

use crate::campaign::Campaign;
use crate::imagery::{CompositeImage, ImageryOps, TaskState, TaskStatus, VizRange};
use crate::sentinel1::grd::PolarizationBundle;

/// Fixed poll cadence for export tasks.
pub const POLL_INTERVAL: Duration = Duration::from_secs(1);
/// Spatial resolution of exported rasters, meters per pixel.
pub const EXPORT_SCALE_M: u32 = 10;

/// Submit one rendered image for export and block until the task settles.
/// Failure and cancellation are reported, not retried.
pub async fn export_image(
    platform: &impl ImageryOps,
    image: &CompositeImage,
    viz: VizRange,
    folder: &str,
    file_name: &str,
) -> Result<TaskStatus> {
    let task = platform
        .start_export(image, viz, folder, file_name, EXPORT_SCALE_M)
        .await?;

    loop {
        let status = platform.task_status(&task).await?;
        if matches!(status.state, TaskState::Failed | TaskState::Cancelled) {
            println!(
                "Task failed: {}",
                status.error_message.as_deref().unwrap_or("no error message")
            );
            return Ok(status);
        }
        if !status.is_active() {
            return Ok(status);
        }
        tokio::time::sleep(POLL_INTERVAL).await;
    }
}

#[derive(Deserialize, Serialize, Debug)]
pub struct ExportRecord {
    pub artifact: String,
    pub folder: String,
    pub file_name: String,
    pub state: TaskState,
    pub error_message: Option<String>,
}

/// Outcome of the per-acceptance export pass, persisted as JSON alongside
/// the run.
#[derive(Deserialize, Serialize, Debug)]
pub struct ExportBatch {
    records: Vec<ExportRecord>,
}

impl ExportBatch {
    pub fn new(records: Vec<ExportRecord>) -> Self {
        Self { records }
    }

    pub fn read<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let batch: Self = serde_json::from_str(&content)?;
        Ok(batch)
    }

    pub fn write<P: AsRef<Path>>(self: &Self, path: P) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    pub fn records(&self) -> &[ExportRecord] {
        &self.records
    }

    pub fn completed(&self) -> usize {
        self.records
            .iter()
            .filter(|r| r.state == TaskState::Completed)
            .count()
    }
}

/// Export every selected artifact of an accepted bundle pair, one after
/// another. A failed task does not stop the remaining artifacts.
pub async fn run_batch(
    platform: &impl ImageryOps,
    vv: &PolarizationBundle,
    vh: &PolarizationBundle,
    campaign: &Campaign,
    file_name: &str,
) -> Result<ExportBatch> {
    let artifacts = campaign
        .artifacts_to_export()
        .ok_or(anyhow!("No artifacts selected for export"))?;
    let viz = campaign.viz();

    let mut records: Vec<ExportRecord> = vec![];
    for artifact in artifacts {
        let Some(image) = select_artifact(&artifact.id, vv, vh) else {
            println!("Unknown artifact id: {}", artifact.id);
            continue;
        };
        let status = export_image(platform, image, viz, &artifact.folder, file_name).await?;
        records.push(ExportRecord {
            artifact: artifact.id.clone(),
            folder: artifact.folder.clone(),
            file_name: file_name.to_string(),
            state: status.state,
            error_message: status.error_message,
        });
    }
    Ok(ExportBatch::new(records))
}

fn select_artifact<'a>(
    id: &str,
    vv: &'a PolarizationBundle,
    vh: &'a PolarizationBundle,
) -> Option<&'a CompositeImage> {
    match id {
        "first_vv" => Some(&vv.first),
        "mean_vv" => Some(&vv.mean),
        "median_vv" => Some(&vv.median),
        "first_vh" => Some(&vh.first),
        "mean_vh" => Some(&vh.mean),
        "median_vh" => Some(&vh.median),
        _ => None,
    }
}

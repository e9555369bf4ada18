use anyhow::{anyhow, Result};
use serde::Deserialize;
use url::Url;

use crate::campaign::Campaign;
use crate::imagery::{
    CompositeImage, ImageryOps, SarCollection, SceneFilter, TaskHandle, TaskState, TaskStatus,
    VizRange,
};
use crate::stac_operations;

/// HTTP client for the imagery platform: STAC catalog search plus the JSON
/// compositing and export service.
pub struct Provider {
    http: reqwest::Client,
    search_api: String,
    processing_api: Url,
}

impl Provider {
    pub fn new(search_api: &str, processing_api: &str) -> Result<Self> {
        // A trailing slash keeps Url::join from eating the last path segment.
        let mut base = processing_api.to_string();
        if !base.ends_with('/') {
            base.push('/');
        }
        Ok(Self {
            http: reqwest::Client::new(),
            search_api: search_api.to_string(),
            processing_api: Url::parse(&base)?,
        })
    }

    pub fn from_campaign(campaign: &Campaign) -> Result<Self> {
        Self::new(campaign.search_api(), campaign.processing_api())
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        Ok(self.processing_api.join(path)?)
    }
}

#[derive(Deserialize)]
struct DimensionsResponse {
    dimensions: [u64; 2],
}

#[derive(Deserialize)]
struct RegionMeanResponse {
    mean: f64,
}

#[derive(Deserialize)]
struct JobResponse {
    id: String,
}

#[derive(Deserialize)]
struct JobStatusResponse {
    state: String,
    error_message: Option<String>,
}

impl ImageryOps for Provider {
    async fn search_scenes(&self, filter: &SceneFilter) -> Result<SarCollection> {
        stac_operations::search_scenes(&self.search_api, filter).await
    }

    async fn clipped_dimensions(&self, image: &CompositeImage) -> Result<(u64, u64)> {
        let response: DimensionsResponse = self
            .http
            .post(self.endpoint("composites/dimensions")?)
            .json(image)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok((response.dimensions[0], response.dimensions[1]))
    }

    async fn region_mean(
        &self,
        image: &CompositeImage,
        footprint_scene: &str,
        scale_m: u32,
    ) -> Result<f64> {
        let body = serde_json::json!({
            "image": image,
            "footprint_scene": footprint_scene,
            "scale_m": scale_m,
        });
        let response: RegionMeanResponse = self
            .http
            .post(self.endpoint("composites/region-mean")?)
            .json(&body)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(response.mean)
    }

    async fn start_export(
        &self,
        image: &CompositeImage,
        viz: VizRange,
        folder: &str,
        file_name: &str,
        scale_m: u32,
    ) -> Result<TaskHandle> {
        let body = serde_json::json!({
            "image": image,
            "visualize": viz,
            "folder": folder,
            "file_name": file_name,
            "scale_m": scale_m,
        });
        let job: JobResponse = self
            .http
            .post(self.endpoint("jobs")?)
            .json(&body)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(TaskHandle { id: job.id })
    }

    async fn task_status(&self, task: &TaskHandle) -> Result<TaskStatus> {
        let status: JobStatusResponse = self
            .http
            .get(self.endpoint(&format!("jobs/{}", task.id))?)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(TaskStatus {
            state: parse_state(&status.state)?,
            error_message: status.error_message,
        })
    }
}

fn parse_state(raw: &str) -> Result<TaskState> {
    match raw {
        "PENDING" => Ok(TaskState::Pending),
        "RUNNING" => Ok(TaskState::Running),
        "COMPLETED" => Ok(TaskState::Completed),
        "FAILED" => Ok(TaskState::Failed),
        "CANCELLED" => Ok(TaskState::Cancelled),
        other => Err(anyhow!("Unknown task state: {}", other)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_state() {
        assert_eq!(parse_state("PENDING").unwrap(), TaskState::Pending);
        assert_eq!(parse_state("RUNNING").unwrap(), TaskState::Running);
        assert_eq!(parse_state("COMPLETED").unwrap(), TaskState::Completed);
        assert_eq!(parse_state("FAILED").unwrap(), TaskState::Failed);
        assert_eq!(parse_state("CANCELLED").unwrap(), TaskState::Cancelled);
        assert_eq!(parse_state("UNKNOWN").is_err(), true);
    }

    #[test]
    fn test_endpoint_join_keeps_base_path() {
        let provider = Provider::new(
            "https://earth-search.aws.element84.com/v1/search",
            "https://sar-compositor.example.com/v1",
        )
        .unwrap();
        let url = provider.endpoint("jobs/abc-123").unwrap();
        assert_eq!(
            url.as_str(),
            "https://sar-compositor.example.com/v1/jobs/abc-123"
        );
    }
}

//! Trait seam for the external imagery-analysis platform, plus the domain
//! types that cross it.

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Polarization {
    Vv,
    Vh,
}

impl Polarization {
    pub fn band(self) -> &'static str {
        match self {
            Self::Vv => "VV",
            Self::Vh => "VH",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrbitPass {
    Ascending,
    Descending,
}

impl OrbitPass {
    pub fn orbit_state(self) -> &'static str {
        match self {
            Self::Ascending => "ascending",
            Self::Descending => "descending",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompositeMethod {
    First,
    Mean,
    Median,
}

/// Square region of interest: a point buffered by `radius_m` meters, taken
/// to its bounds on the platform side.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Roi {
    pub lon: f64,
    pub lat: f64,
    pub radius_m: f64,
}

impl Roi {
    pub fn buffered(lon: f64, lat: f64, radius_m: f64) -> Self {
        Self { lon, lat, radius_m }
    }
}

#[derive(Debug, Clone)]
pub struct SceneMeta {
    pub id: String,
    pub acquired: Option<DateTime<Utc>>,
}

/// A filtered scene set, ordered earliest acquisition first.
#[derive(Debug, Clone, Default)]
pub struct SarCollection {
    pub scenes: Vec<SceneMeta>,
}

impl SarCollection {
    pub fn len(&self) -> usize {
        self.scenes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scenes.is_empty()
    }

    pub fn first(&self) -> Option<&SceneMeta> {
        self.scenes.first()
    }

    pub fn ids(&self) -> Vec<String> {
        self.scenes.iter().map(|s| s.id.clone()).collect()
    }
}

/// Archive filter for one polarization, window, and coordinate. The corner
/// points must all fall inside a matching scene's footprint.
#[derive(Debug, Clone)]
pub struct SceneFilter {
    pub polarization: Polarization,
    /// (lon, lat) corner points of the query box.
    pub corners: [(f64, f64); 4],
    /// West, south, east, north.
    pub bbox: [f64; 4],
    /// 'YYYY-MM-DD'.
    pub start: String,
    /// 'YYYY-MM-DD'.
    pub end: String,
    pub instrument_mode: &'static str,
    pub orbit_pass: OrbitPass,
}

/// A server-side composite: the platform renders it from the listed scenes,
/// clipped to the region.
#[derive(Debug, Clone, Serialize)]
pub struct CompositeImage {
    pub method: CompositeMethod,
    pub band: Polarization,
    pub scene_ids: Vec<String>,
    pub roi: Roi,
}

/// Fixed value range applied when rendering an image for export.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct VizRange {
    pub min: f64,
    pub max: f64,
}

#[derive(Debug, Clone)]
pub struct TaskHandle {
    pub id: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TaskState {
    Pending,
    Running,
    Completed,
    Failed,
    Cancelled,
}

#[derive(Debug, Clone)]
pub struct TaskStatus {
    pub state: TaskState,
    pub error_message: Option<String>,
}

impl TaskStatus {
    pub fn is_active(&self) -> bool {
        matches!(self.state, TaskState::Pending | TaskState::Running)
    }
}

/// Operations the imagery-analysis platform provides. Query execution,
/// retries, and authentication live behind this seam.
pub trait ImageryOps {
    /// Run the archive filter and return the matching scenes.
    async fn search_scenes(&self, filter: &SceneFilter) -> Result<SarCollection>;

    /// Pixel dimensions of the composite's first band once clipped to its
    /// region.
    async fn clipped_dimensions(&self, image: &CompositeImage) -> Result<(u64, u64)>;

    /// Spatial mean of the composite over the footprint of the named scene,
    /// reduced at `scale_m` meters per pixel.
    async fn region_mean(
        &self,
        image: &CompositeImage,
        footprint_scene: &str,
        scale_m: u32,
    ) -> Result<f64>;

    /// Submit a rendered image for export to the named folder and file.
    async fn start_export(
        &self,
        image: &CompositeImage,
        viz: VizRange,
        folder: &str,
        file_name: &str,
        scale_m: u32,
    ) -> Result<TaskHandle>;

    async fn task_status(&self, task: &TaskHandle) -> Result<TaskStatus>;
}

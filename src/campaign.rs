use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use toml;

use crate::imagery::{OrbitPass, VizRange};

#[derive(Deserialize, Serialize, Clone, Debug)]
pub struct Campaign {
    id: String,
    provider: String,
    name: String,
    description: String,
    docs: String,
    target_image_count: u64,
    min_dimension_px: u64,
    orbit_pass: String,
    viz_min: f64,
    viz_max: f64,
    search_api: String,
    processing_api: String,
    output_dir: Option<String>,
    storage_profile: Option<String>,
    destination: Option<String>,
    artifacts: Vec<Artifact>,
}

#[derive(Deserialize, Serialize, Clone, Debug)]
pub struct Artifact {
    pub id: String,
    pub folder: String,
    export: bool,
}

impl Campaign {
    pub fn read<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let campaign: Self = toml::from_str(&content)?;
        Ok(campaign)
    }

    pub fn write<P: AsRef<Path>>(self: &Self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    pub fn from_template(table: &toml::Table) -> Self {
        let campaign: Self =
            toml::from_str(&table.to_string()).expect("Error serializing template");
        campaign
    }

    pub fn artifacts_to_export(self: &Self) -> Option<Vec<Artifact>> {
        let artifacts = self.artifacts.clone();
        let to_export = artifacts
            .into_iter()
            .filter(|a| a.export == true)
            .collect::<Vec<_>>();
        if to_export.is_empty() {
            return None;
        }
        Some(to_export)
    }

    pub fn target_image_count(&self) -> u64 {
        self.target_image_count
    }

    pub fn set_target(&mut self, target: u64) {
        self.target_image_count = target;
    }

    pub fn min_dimension_px(&self) -> u64 {
        self.min_dimension_px
    }

    pub fn orbit_pass(&self) -> OrbitPass {
        match self.orbit_pass.to_ascii_lowercase().as_str() {
            "ascending" => OrbitPass::Ascending,
            _ => OrbitPass::Descending,
        }
    }

    pub fn viz(&self) -> VizRange {
        VizRange {
            min: self.viz_min,
            max: self.viz_max,
        }
    }

    pub fn search_api(&self) -> &str {
        &self.search_api
    }

    pub fn processing_api(&self) -> &str {
        &self.processing_api
    }

    pub fn output_dir(&self) -> Option<&str> {
        self.output_dir.as_deref()
    }

    pub fn set_output_dir(&mut self, output_dir: Option<String>) {
        self.output_dir = output_dir;
    }

    pub fn storage_profile(&self) -> Option<&str> {
        self.storage_profile.as_deref()
    }

    pub fn destination(&self) -> Option<&str> {
        self.destination.as_deref()
    }
}

pub fn campaign_toml() -> toml::Table {
    toml::toml! {
        id = "sentinel1grd.random-sampler"

        provider = "EarthSearch"

        name = "Sentinel-1 GRD random sampling campaign"

        description = "Ground Range Detected (GRD) products consist of focused SAR data that has been\n\
        detected, multi-looked and projected to ground range using an Earth ellipsoid\n\
        model. Scenes are sampled at random coordinates and six-month windows, screened\n\
        for revisit coverage and open water, and exported as first, temporal mean and\n\
        temporal median composites for the VV and VH polarization channels."

        docs = "https://documentation.dataspace.copernicus.eu/Data/SentinelMissions/Sentinel1.html"

        target_image_count = 2100
        min_dimension_px = 512
        orbit_pass = "descending"
        viz_min = -25.0
        viz_max = 5.0

        search_api = "https://earth-search.aws.element84.com/v1/search"
        processing_api = "https://sar-compositor.example.com/v1"
        output_dir = "./outputs"

        [[artifacts]]
        id = "first_vv"
        folder = "SAR VV"
        export = true

        [[artifacts]]
        id = "first_vh"
        folder = "SAR VH"
        export = true

        [[artifacts]]
        id = "mean_vv"
        folder = "GT MEAN VV"
        export = true

        [[artifacts]]
        id = "mean_vh"
        folder = "GT MEAN VH"
        export = true

        [[artifacts]]
        id = "median_vv"
        folder = "GT MEDIAN VV"
        export = true

        [[artifacts]]
        id = "median_vh"
        folder = "GT MEDIAN VH"
        export = true
    }
}

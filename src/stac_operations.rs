use anyhow::Result;
use chrono::{DateTime, Utc};
use geo::Contains;
use stac::{Item, ItemCollection};

use crate::imagery::{SarCollection, SceneFilter, SceneMeta};

pub const SENTINEL_1_GRD: &str = "sentinel-1-grd";

/// Run the archive filter against a STAC search endpoint. Instrument mode
/// and orbit state go into the query; polarization membership and corner
/// containment are checked against the returned items, since not every
/// search implementation supports them server-side.
pub async fn search_scenes(search_api: &str, filter: &SceneFilter) -> Result<SarCollection> {
    let body = serde_json::json!({
        "collections": vec![SENTINEL_1_GRD],
        "bbox": filter.bbox,
        "datetime": format!("{}T00:00:00Z/{}T23:59:59Z", filter.start, filter.end),
        "query": {
            "sar:instrument_mode": {"eq": filter.instrument_mode},
            "sat:orbit_state": {"eq": filter.orbit_pass.orbit_state()},
        },
        "limit": 200,
    });

    let item_collection: ItemCollection = reqwest::Client::new()
        .post(search_api)
        .json(&body)
        .send()
        .await?
        .json()
        .await?;

    Ok(collect_scenes(item_collection.items, filter))
}

/// Reduce raw search items to an ordered scene set for one polarization.
pub fn collect_scenes(items: Vec<Item>, filter: &SceneFilter) -> SarCollection {
    let mut scenes: Vec<SceneMeta> = items
        .iter()
        .filter(|item| has_polarization(item, filter.polarization.band()))
        .filter(|item| footprint_contains_corners(item, &filter.corners))
        .map(scene_meta)
        .collect();

    scenes.sort_by(|a, b| match (&a.acquired, &b.acquired) {
        (Some(x), Some(y)) => x.cmp(y),
        _ => a.id.cmp(&b.id),
    });

    SarCollection { scenes }
}

fn scene_meta(item: &Item) -> SceneMeta {
    SceneMeta {
        id: item.id.clone(),
        acquired: acquisition_time(item),
    }
}

fn acquisition_time(item: &Item) -> Option<DateTime<Utc>> {
    item.properties.datetime
}

fn has_polarization(item: &Item, band: &str) -> bool {
    item.properties
        .additional_fields
        .get("sar:polarisations")
        .and_then(|value| value.as_array())
        .map(|bands| bands.iter().any(|b| b.as_str() == Some(band)))
        .unwrap_or(false)
}

fn footprint_contains_corners(item: &Item, corners: &[(f64, f64); 4]) -> bool {
    let Some(geometry) = &item.geometry else {
        return false;
    };
    let Ok(footprint) = geo::Geometry::<f64>::try_from(geometry.clone()) else {
        return false;
    };
    corners
        .iter()
        .all(|&(lon, lat)| footprint.contains(&geo::Point::new(lon, lat)))
}

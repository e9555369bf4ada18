use anyhow::Result;

use crate::imagery::ImageryOps;
use crate::sentinel1::grd::PolarizationBundle;

/// Acceptance band for the VV collection size over a six-month window,
/// inclusive on both ends.
pub const MIN_COLLECTION_SIZE: usize = 9;
pub const MAX_COLLECTION_SIZE: usize = 12;
/// Mean VH backscatter below this is treated as open water.
pub const OPEN_WATER_THRESHOLD_DB: f64 = -20.0;
/// Reduction scale for the footprint mean, meters per pixel.
pub const MEAN_SCALE_M: u32 = 10;

/// Decide whether a fetched bundle pair is acceptable for export. The
/// region-mean call goes back to the platform, so its errors propagate.
pub async fn validate_bundles(
    platform: &impl ImageryOps,
    vv: Option<&PolarizationBundle>,
    vh: Option<&PolarizationBundle>,
) -> Result<bool> {
    let (Some(vv), Some(vh)) = (vv, vh) else {
        println!("There are no collections");
        return Ok(false);
    };

    let size = vv.collection.len();
    if size < MIN_COLLECTION_SIZE || size > MAX_COLLECTION_SIZE {
        println!("There are not enough images in the collection");
        return Ok(false);
    }

    let mean_db = platform
        .region_mean(&vh.mean, vh.first_scene_id(), MEAN_SCALE_M)
        .await?;
    if mean_db < OPEN_WATER_THRESHOLD_DB {
        println!("The collection is in the water");
        return Ok(false);
    }

    Ok(true)
}

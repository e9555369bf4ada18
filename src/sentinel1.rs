mod provider;
pub use provider::Provider;

pub mod grd {
    use crate::error::FetchError;
    use crate::imagery::{
        CompositeImage, CompositeMethod, ImageryOps, OrbitPass, Polarization, Roi, SarCollection,
        SceneFilter,
    };

    pub const INSTRUMENT_MODE: &str = "IW";
    /// Side length of the corner-containment query box, degrees.
    pub const BOX_DEGREES: f64 = 0.5;
    pub const DEFAULT_MIN_DIMENSION: u64 = 512;
    /// Cap on the adaptive region-growth loop.
    pub const MAX_ROI_GROWTH_STEPS: u32 = 512;

    /// First/mean/median composites plus the backing scene set for one
    /// polarization. The collection is never empty once a bundle exists.
    #[derive(Debug, Clone)]
    pub struct PolarizationBundle {
        pub polarization: Polarization,
        pub first: CompositeImage,
        pub mean: CompositeImage,
        pub median: CompositeImage,
        pub collection: SarCollection,
        pub roi: Roi,
    }

    impl PolarizationBundle {
        pub fn first_scene_id(&self) -> &str {
            &self.collection.scenes[0].id
        }
    }

    pub fn scene_filter(
        start: &str,
        end: &str,
        latitude: f64,
        longitude: f64,
        polarization: Polarization,
        orbit_pass: OrbitPass,
    ) -> SceneFilter {
        let half = BOX_DEGREES / 2.0;
        SceneFilter {
            polarization,
            corners: [
                (longitude - half, latitude - half),
                (longitude - half, latitude + half),
                (longitude + half, latitude - half),
                (longitude + half, latitude + half),
            ],
            bbox: [
                longitude - half,
                latitude - half,
                longitude + half,
                latitude + half,
            ],
            start: start.to_string(),
            end: end.to_string(),
            instrument_mode: INSTRUMENT_MODE,
            orbit_pass,
        }
    }

    /// Retrieve the first, mean, and median composites for one polarization,
    /// window, and coordinate. The region of interest starts at a buffer
    /// radius proportional to `min_dimension` and grows until the first
    /// scene's clipped width reaches the requirement; each step re-filters
    /// the archive before measuring.
    pub async fn fetch_first_mean_median(
        platform: &impl ImageryOps,
        start: &str,
        end: &str,
        latitude: f64,
        longitude: f64,
        polarization: Polarization,
        orbit_pass: OrbitPass,
        min_dimension: u64,
    ) -> Result<PolarizationBundle, FetchError> {
        let filter = scene_filter(start, end, latitude, longitude, polarization, orbit_pass);

        let mut last_dimension = 0;
        for step in 0..MAX_ROI_GROWTH_STEPS {
            let radius_m = (min_dimension + step as u64) as f64 * 10.0 / 2.0;
            let roi = Roi::buffered(longitude, latitude, radius_m);

            let collection = platform
                .search_scenes(&filter)
                .await
                .map_err(|e| FetchError::Platform(e.to_string()))?;
            if collection.is_empty() {
                return Err(FetchError::NoImagery);
            }

            let first = composite(CompositeMethod::First, polarization, &collection, roi);
            let (width, _) = platform
                .clipped_dimensions(&first)
                .await
                .map_err(|e| FetchError::Platform(e.to_string()))?;
            last_dimension = width;

            if width >= min_dimension {
                return Ok(PolarizationBundle {
                    polarization,
                    mean: composite(CompositeMethod::Mean, polarization, &collection, roi),
                    median: composite(CompositeMethod::Median, polarization, &collection, roi),
                    first,
                    collection,
                    roi,
                });
            }
        }

        Err(FetchError::RegionGrowth {
            steps: MAX_ROI_GROWTH_STEPS,
            last_dimension,
        })
    }

    fn composite(
        method: CompositeMethod,
        band: Polarization,
        collection: &SarCollection,
        roi: Roi,
    ) -> CompositeImage {
        CompositeImage {
            method,
            band,
            scene_ids: collection.ids(),
            roi,
        }
    }

}

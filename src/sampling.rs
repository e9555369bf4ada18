use std::collections::HashSet;
use std::fs;
use std::path::Path;

use anyhow::Result;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::campaign::Campaign;
use crate::export::{self, ExportBatch};
use crate::imagery::{ImageryOps, Polarization, TaskState};
use crate::sentinel1::grd::{self, PolarizationBundle};
use crate::storage::{self, StorageLocation, StorageOps};
use crate::validate;

/// Sampled latitude band, degrees.
const LATITUDE_RANGE: (f64, f64) = (-89.0, 89.0);
/// Sampled longitude band, degrees.
const LONGITUDE_RANGE: (f64, f64) = (-179.0, 179.0);
/// Years the archive is sampled from.
const YEAR_RANGE: (i32, i32) = (2017, 2023);
/// Start months stay in 1..=6 so the six-month window never leaves the year.
const START_MONTH_RANGE: (u32, u32) = (1, 6);
/// Days stay in 1..=28 so every month accepts the drawn day.
const DAY_RANGE: (u32, u32) = (1, 28);
const WINDOW_MONTHS: u32 = 6;

#[derive(Debug, Default)]
pub struct RunSummary {
    pub exported: u64,
    pub attempts: u64,
}

fn random_coordinate(rng: &mut impl Rng) -> (f64, f64) {
    (
        rng.gen_range(LATITUDE_RANGE.0..=LATITUDE_RANGE.1),
        rng.gen_range(LONGITUDE_RANGE.0..=LONGITUDE_RANGE.1),
    )
}

/// A random six-month window as 'YYYY-MM-DD' bounds.
fn random_window(rng: &mut impl Rng) -> (String, String) {
    let year = rng.gen_range(YEAR_RANGE.0..=YEAR_RANGE.1);
    let month = rng.gen_range(START_MONTH_RANGE.0..=START_MONTH_RANGE.1);
    let day = rng.gen_range(DAY_RANGE.0..=DAY_RANGE.1);
    (
        format!("{year:04}-{month:02}-{day:02}"),
        format!("{year:04}-{:02}-{day:02}", month + WINDOW_MONTHS),
    )
}

async fn fetch_bundle(
    platform: &impl ImageryOps,
    start: &str,
    end: &str,
    latitude: f64,
    longitude: f64,
    polarization: Polarization,
    campaign: &Campaign,
) -> Option<PolarizationBundle> {
    match grd::fetch_first_mean_median(
        platform,
        start,
        end,
        latitude,
        longitude,
        polarization,
        campaign.orbit_pass(),
        campaign.min_dimension_px(),
    )
    .await
    {
        Ok(bundle) => Some(bundle),
        Err(err) => {
            println!("{} fetch: {err}", polarization.band());
            None
        }
    }
}

/// Sample, validate, deduplicate, and export until the campaign target is
/// reached. The id set and counter live here and nowhere else; a new run
/// always starts from zero.
pub async fn run(
    platform: &impl ImageryOps,
    storage_client: Option<&impl StorageOps>,
    campaign: &Campaign,
) -> Result<RunSummary> {
    let destination = match campaign.destination() {
        Some(uri) => Some(StorageLocation::from_uri(uri)?),
        None => None,
    };

    let mut rng = StdRng::from_entropy();
    let mut ids: HashSet<String> = HashSet::new();
    let mut current_image: u64 = 0;
    let mut attempts: u64 = 0;
    let target = campaign.target_image_count();

    while current_image < target {
        attempts += 1;

        let (latitude, longitude) = random_coordinate(&mut rng);
        let (start, end) = random_window(&mut rng);

        let vv = fetch_bundle(
            platform,
            &start,
            &end,
            latitude,
            longitude,
            Polarization::Vv,
            campaign,
        )
        .await;
        let vh = fetch_bundle(
            platform,
            &start,
            &end,
            latitude,
            longitude,
            Polarization::Vh,
            campaign,
        )
        .await;

        if !validate::validate_bundles(platform, vv.as_ref(), vh.as_ref()).await? {
            continue;
        }
        let (Some(vv), Some(vh)) = (vv, vh) else {
            continue;
        };

        let image_id = vv.first_scene_id().to_string();
        if ids.contains(&image_id) {
            continue;
        }

        let file_name = (current_image + 1).to_string();
        let batch = export::run_batch(platform, &vv, &vh, campaign, &file_name).await?;

        if let Some(output_dir) = campaign.output_dir() {
            write_batch_record(&batch, output_dir, &file_name)?;
        }
        if let (Some(storage_client), Some(destination)) = (storage_client, destination.as_ref()) {
            confirm_completed(storage_client, destination, &batch).await;
        }

        ids.insert(image_id);
        current_image += 1;
        println!("Image #{current_image} saved successfully!");
    }

    Ok(RunSummary {
        exported: current_image,
        attempts,
    })
}

fn write_batch_record(batch: &ExportBatch, output_dir: &str, file_name: &str) -> Result<()> {
    let dir = Path::new(output_dir);
    if !dir.exists() {
        fs::create_dir_all(dir)?;
    }
    batch.write(dir.join(format!("export_batch_{file_name}.json")))
}

async fn confirm_completed(
    storage_client: &impl StorageOps,
    destination: &StorageLocation,
    batch: &ExportBatch,
) {
    for record in batch.records() {
        if record.state != TaskState::Completed {
            continue;
        }
        match storage::confirm_artifact(storage_client, destination, &record.folder, &record.file_name)
            .await
        {
            Ok(size) => println!("Confirmed {}/{} ({size} bytes)", record.folder, record.file_name),
            Err(err) => println!(
                "Could not confirm {}/{}: {err}",
                record.folder, record.file_name
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::campaign::campaign_toml;
    use crate::imagery::{
        CompositeImage, SarCollection, SceneFilter, SceneMeta, TaskHandle, TaskStatus, VizRange,
    };
    use crate::storage::Storage;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Scripted platform: one collection entry per search call (two calls
    /// per sampling iteration, VV then VH) and one mean entry per iteration
    /// that reaches the open-water check.
    struct ScriptedPlatform {
        collections: Mutex<VecDeque<SarCollection>>,
        means: Mutex<VecDeque<f64>>,
        exports: AtomicUsize,
    }

    impl ScriptedPlatform {
        fn new(collections: Vec<SarCollection>, means: Vec<f64>) -> Self {
            Self {
                collections: Mutex::new(collections.into()),
                means: Mutex::new(means.into()),
                exports: AtomicUsize::new(0),
            }
        }
    }

    impl ImageryOps for ScriptedPlatform {
        async fn search_scenes(&self, _filter: &SceneFilter) -> Result<SarCollection> {
            let mut collections = self.collections.lock().unwrap();
            Ok(collections.pop_front().expect("search script exhausted"))
        }

        async fn clipped_dimensions(&self, _image: &CompositeImage) -> Result<(u64, u64)> {
            Ok((512, 512))
        }

        async fn region_mean(
            &self,
            _image: &CompositeImage,
            _footprint_scene: &str,
            _scale_m: u32,
        ) -> Result<f64> {
            let mut means = self.means.lock().unwrap();
            Ok(means.pop_front().expect("mean script exhausted"))
        }

        async fn start_export(
            &self,
            _image: &CompositeImage,
            _viz: VizRange,
            _folder: &str,
            _file_name: &str,
            _scale_m: u32,
        ) -> Result<TaskHandle> {
            let n = self.exports.fetch_add(1, Ordering::SeqCst);
            Ok(TaskHandle {
                id: format!("job-{n}"),
            })
        }

        async fn task_status(&self, _task: &TaskHandle) -> Result<TaskStatus> {
            Ok(TaskStatus {
                state: TaskState::Completed,
                error_message: None,
            })
        }
    }

    fn collection(scene_count: usize, first_id: &str) -> SarCollection {
        let scenes = (0..scene_count)
            .map(|i| SceneMeta {
                id: if i == 0 {
                    first_id.to_string()
                } else {
                    format!("{first_id}-{i}")
                },
                acquired: None,
            })
            .collect();
        SarCollection { scenes }
    }

    fn test_campaign(target: u64) -> Campaign {
        let mut campaign = Campaign::from_template(&campaign_toml());
        campaign.set_target(target);
        campaign.set_output_dir(None);
        campaign
    }

    #[test]
    fn test_random_window_shape() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..100 {
            let (start, end) = random_window(&mut rng);
            assert_eq!(start.len(), 10);
            assert_eq!(end.len(), 10);
            assert_eq!(&start[0..4], &end[0..4]);

            let start_month: u32 = start[5..7].parse().unwrap();
            let end_month: u32 = end[5..7].parse().unwrap();
            assert!((1..=6).contains(&start_month));
            assert_eq!(end_month, start_month + 6);
            assert_eq!(&start[8..10], &end[8..10]);

            let day: u32 = start[8..10].parse().unwrap();
            assert!((1..=28).contains(&day));
        }
    }

    #[test]
    fn test_random_coordinate_bounds() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..100 {
            let (latitude, longitude) = random_coordinate(&mut rng);
            assert!((-89.0..=89.0).contains(&latitude));
            assert!((-179.0..=179.0).contains(&longitude));
        }
    }

    #[tokio::test]
    async fn test_single_acceptance_terminates_loop() {
        let platform = ScriptedPlatform::new(
            vec![collection(10, "S1A_AAA"), collection(10, "S1A_AAA")],
            vec![-15.0],
        );
        let campaign = test_campaign(1);

        let summary = run(&platform, None::<&Storage>, &campaign).await.unwrap();
        assert_eq!(summary.exported, 1);
        assert_eq!(summary.attempts, 1);
        assert_eq!(platform.exports.load(Ordering::SeqCst), 6);
    }

    #[tokio::test]
    async fn test_rejection_resamples_without_increment() {
        // First candidate fails the size band (6 scenes); the next two pass.
        let platform = ScriptedPlatform::new(
            vec![
                collection(6, "S1A_AAA"),
                collection(6, "S1A_AAA"),
                collection(10, "S1A_BBB"),
                collection(10, "S1A_BBB"),
                collection(11, "S1A_CCC"),
                collection(11, "S1A_CCC"),
            ],
            vec![-15.0, -15.0],
        );
        let campaign = test_campaign(2);

        let summary = run(&platform, None::<&Storage>, &campaign).await.unwrap();
        assert_eq!(summary.exported, 2);
        assert_eq!(summary.attempts, 3);
        assert_eq!(platform.exports.load(Ordering::SeqCst), 12);
    }

    #[tokio::test]
    async fn test_duplicate_identifier_is_not_reexported() {
        // The second candidate validates but repeats the first identifier.
        let platform = ScriptedPlatform::new(
            vec![
                collection(10, "S1A_AAA"),
                collection(10, "S1A_AAA"),
                collection(10, "S1A_AAA"),
                collection(10, "S1A_AAA"),
                collection(10, "S1A_BBB"),
                collection(10, "S1A_BBB"),
            ],
            vec![-15.0, -15.0, -15.0],
        );
        let campaign = test_campaign(2);

        let summary = run(&platform, None::<&Storage>, &campaign).await.unwrap();
        assert_eq!(summary.exported, 2);
        assert_eq!(summary.attempts, 3);
        assert_eq!(platform.exports.load(Ordering::SeqCst), 12);
    }

    #[tokio::test]
    async fn test_open_water_candidate_is_rejected() {
        let platform = ScriptedPlatform::new(
            vec![
                collection(10, "S1A_WET"),
                collection(10, "S1A_WET"),
                collection(10, "S1A_DRY"),
                collection(10, "S1A_DRY"),
            ],
            vec![-23.5, -15.0],
        );
        let campaign = test_campaign(1);

        let summary = run(&platform, None::<&Storage>, &campaign).await.unwrap();
        assert_eq!(summary.exported, 1);
        assert_eq!(summary.attempts, 2);
        assert_eq!(platform.exports.load(Ordering::SeqCst), 6);
    }
}

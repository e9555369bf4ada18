use thiserror::Error;

/// Failure classes for collection retrieval. The sampling loop handles every
/// class the same way (log and resample), so none of these abort a run.
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("no scenes match the requested window")]
    NoImagery,
    #[error("region growth stopped after {steps} steps at {last_dimension} px")]
    RegionGrowth { steps: u32, last_dimension: u64 },
    #[error("platform request failed: {0}")]
    Platform(String),
}

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;

use sar_sampler::campaign::{campaign_toml, Campaign};
use sar_sampler::sampling;
use sar_sampler::sentinel1::Provider;
use sar_sampler::storage::Storage;

#[derive(Parser)]
#[command(
    name = "sar-sampler",
    about = "Random-sampling exporter for Sentinel-1 SAR composites"
)]
struct Args {
    /// Campaign TOML; the built-in defaults apply when the file is absent.
    #[arg(long, default_value = "./inputs/campaign.toml")]
    config: PathBuf,

    /// Override the campaign's target image count.
    #[arg(long)]
    target: Option<u64>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut campaign = if args.config.exists() {
        Campaign::read(&args.config)?
    } else {
        Campaign::from_template(&campaign_toml())
    };
    if let Some(target) = args.target {
        campaign.set_target(target);
    }

    let provider = Provider::from_campaign(&campaign)?;
    let storage = match campaign.storage_profile() {
        Some(profile) => Some(Storage::from_profile(profile).await),
        None => None,
    };

    let summary = sampling::run(&provider, storage.as_ref(), &campaign).await?;
    println!(
        "Exported {} image sets in {} sampling attempts",
        summary.exported, summary.attempts
    );

    Ok(())
}

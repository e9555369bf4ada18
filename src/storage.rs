//! Cloud-storage helpers for confirming that exported artifacts landed.
use anyhow::{anyhow, Result};
use aws_sdk_s3::config::Region;
use aws_sdk_s3::operation::head_object::HeadObjectOutput;
use aws_sdk_s3::Client;
use regex::Regex;

const DEFAULT_REGION: &str = "us-east-1";

pub async fn client_from_profile(profile_name: &str) -> Client {
    let base_config = aws_config::from_env()
        .profile_name(profile_name)
        .load()
        .await;

    let s3_config = aws_sdk_s3::config::Builder::from(&base_config)
        .region(Region::new(DEFAULT_REGION))
        .force_path_style(true)
        .build();

    Client::from_conf(s3_config)
}

pub async fn anon_client() -> Client {
    let region = Region::new(DEFAULT_REGION);
    let config = aws_config::defaults(aws_config::BehaviorVersion::latest())
        .no_credentials()
        .region(region)
        .load()
        .await;
    Client::new(&config)
}

pub trait StorageOps {
    async fn head_object(self: &Self, bucket: &str, key: &str) -> Result<HeadObjectOutput>;
}

pub struct Storage {
    client: Client,
}

impl Storage {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    pub async fn from_profile(profile_name: &str) -> Self {
        let client = client_from_profile(profile_name).await;
        Self { client }
    }
}

impl StorageOps for Storage {
    async fn head_object(self: &Self, bucket: &str, key: &str) -> Result<HeadObjectOutput> {
        let head = self
            .client
            .head_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await?;
        Ok(head)
    }
}

/// Destination prefix for exported artifacts, in `s3://bucket/prefix` form.
#[derive(Debug, PartialEq)]
pub struct StorageLocation {
    pub bucket: String,
    pub prefix: String,
}

impl StorageLocation {
    pub fn from_uri(uri: &str) -> Result<Self> {
        let re = Regex::new(r"^s3://(?<bucket>[\w\-.]+)/(?<prefix>.+?)/?$")
            .expect("Regex pattern should always compile");

        let captures = re
            .captures(uri)
            .ok_or(anyhow!("No regex matches found for: {}", uri))?;

        let (_, [bucket, prefix]) = captures.extract();

        Ok(Self {
            bucket: bucket.to_string(),
            prefix: prefix.to_string(),
        })
    }

    pub fn artifact_key(&self, folder: &str, file_name: &str) -> String {
        format!("{}/{}/{}.tif", self.prefix, folder, file_name)
    }
}

/// Best-effort check that a completed export actually landed; returns the
/// object size in bytes.
pub async fn confirm_artifact(
    storage: &impl StorageOps,
    location: &StorageLocation,
    folder: &str,
    file_name: &str,
) -> Result<i64> {
    let key = location.artifact_key(folder, file_name);
    let head = storage.head_object(&location.bucket, &key).await?;
    let size = head
        .content_length()
        .ok_or(anyhow!("Error reading size of remote object"))?;
    Ok(size)
}

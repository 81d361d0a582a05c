//! Published package version lookup

use crate::config::VersionSource;
use crate::Result;
use reqwest::Client;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct PackageManifest {
    version: Option<String>,
}

/// Fetch the `version` field of the remote `package.json`
///
/// Failures are logged and reported as `None`; callers treat an unknown
/// version as "nothing to compare against".
pub async fn fetch_package_version(source: &VersionSource) -> Option<String> {
    let url = match source.url() {
        Ok(url) => url,
        Err(e) => {
            tracing::error!(error = %e, "Error fetching package.json");
            return None;
        }
    };
    fetch_package_version_with(&Client::new(), url.as_str()).await
}

pub async fn fetch_package_version_with(client: &Client, url: &str) -> Option<String> {
    match request_manifest(client, url).await {
        Ok(manifest) => {
            if manifest.version.is_none() {
                tracing::warn!(url = %url, "package.json has no version field");
            }
            manifest.version
        }
        Err(e) => {
            tracing::error!(url = %url, error = %e, "Error fetching package.json");
            None
        }
    }
}

async fn request_manifest(client: &Client, url: &str) -> Result<PackageManifest> {
    let response = client.get(url).send().await?.error_for_status()?;
    let body = response.text().await?;
    Ok(serde_json::from_str(&body)?)
}

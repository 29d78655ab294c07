use reqwest::{Client, StatusCode};
use serde::Deserialize;

use crate::acquire::platform::Platform;
use crate::constants::MANIFEST_DIGEST_PREFIX;
use crate::error::{Error, Result};

/// Where the expected content digest comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExpectedDigest {
    /// Hex SHA-256 known ahead of the download (manifest strategy).
    /// Compared case-insensitively.
    Sha256(String),
    /// Base64 MD5 carried by the blob header on the download response itself
    /// (URL-template strategy).
    BlobMd5Header,
}

/// A downloadable release file matched to the host platform.
#[derive(Debug, Clone)]
pub struct ReleaseAsset {
    pub name: String,
    pub download_url: String,
    pub digest: ExpectedDigest,
}

/// How release assets are discovered. Selected at construction so either
/// integrity convention can be exercised independently.
#[derive(Debug, Clone)]
pub enum ReleaseSource {
    /// Query a release-index endpoint for a manifest and pick the asset whose
    /// name equals the platform-qualified executable name.
    Manifest { index_url: String },
    /// Skip the manifest and template the qualified name onto a fixed
    /// latest-release download URL.
    LatestDownload { base_url: String },
}

#[derive(Debug, Deserialize)]
struct ReleaseManifest {
    assets: Vec<ManifestAsset>,
}

#[derive(Debug, Deserialize)]
struct ManifestAsset {
    name: String,
    #[serde(default)]
    digest: Option<String>,
    browser_download_url: String,
}

impl ReleaseSource {
    /// Resolves the release asset for `platform`.
    ///
    /// Manifest strategy failures are distinct: a missing asset for this
    /// platform is [`Error::IncompatiblePlatform`]; a manifest that names the
    /// asset but carries no usable digest is treated as an integrity failure.
    pub async fn asset_for(
        &self,
        client: &Client,
        platform: &Platform,
        base_name: &str,
    ) -> Result<ReleaseAsset> {
        let wanted = platform.executable_name(base_name, true);
        match self {
            Self::LatestDownload { base_url } => Ok(ReleaseAsset {
                download_url: format!("{}/{}", base_url.trim_end_matches('/'), wanted),
                name: wanted,
                digest: ExpectedDigest::BlobMd5Header,
            }),
            Self::Manifest { index_url } => {
                let res = client.get(index_url).send().await?;
                if res.status() != StatusCode::OK {
                    return Err(Error::Transport {
                        url: index_url.clone(),
                        status: res.status(),
                    });
                }
                let manifest: ReleaseManifest = res.json().await?;
                let asset = manifest
                    .assets
                    .into_iter()
                    .find(|asset| asset.name == wanted)
                    .ok_or_else(|| Error::IncompatiblePlatform(platform.variant()))?;

                let digest = parse_manifest_digest(asset.digest.as_deref())?;
                Ok(ReleaseAsset {
                    name: asset.name,
                    download_url: asset.browser_download_url,
                    digest: ExpectedDigest::Sha256(digest),
                })
            }
        }
    }
}

/// Strips the fixed algorithm prefix from a manifest digest field. An absent
/// or malformed field means the manifest cannot vouch for the asset's
/// content, which we treat the same as corruption rather than a crash.
fn parse_manifest_digest(field: Option<&str>) -> Result<String> {
    let hex = field
        .and_then(|d| d.strip_prefix(MANIFEST_DIGEST_PREFIX))
        .filter(|d| d.len() == 64 && d.chars().all(|c| c.is_ascii_hexdigit()))
        .ok_or(Error::Corrupted)?;
    Ok(hex.to_string())
}

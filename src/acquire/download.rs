use std::path::Path;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use futures_util::StreamExt;
use md5::Md5;
use reqwest::{Client, StatusCode};
use sha2::{Digest, Sha256};
use tokio::io::AsyncWriteExt;

use crate::acquire::release::{ExpectedDigest, ReleaseAsset};
use crate::constants::BLOB_MD5_HEADER;
use crate::error::{Error, Result};

const HASH_BUF_SIZE: usize = 64 * 1024;

/// Streams a release asset to disk through an ordered list of mirror
/// prefixes, verifying the bytes before marking the file executable.
pub struct Downloader {
    client: Client,
    mirrors: Vec<String>,
}

impl Downloader {
    pub fn new(client: Client, mut mirrors: Vec<String>) -> Self {
        if mirrors.is_empty() {
            // No mirrors configured means the direct URL only.
            mirrors.push(String::new());
        }
        Self { client, mirrors }
    }

    /// Tries each mirror in order until one yields a fully verified file.
    /// A failed attempt never leaves a partial file behind, and the same
    /// mirror is never retried; when all mirrors are exhausted the last
    /// transport or verification error is returned.
    pub async fn fetch(&self, asset: &ReleaseAsset, dest: &Path) -> Result<()> {
        let mut last_err = None;
        for mirror in &self.mirrors {
            let url = format!("{mirror}{}", asset.download_url);
            match self.attempt(&url, &asset.digest, dest).await {
                Ok(()) => {
                    set_executable(dest)?;
                    return Ok(());
                }
                Err(err) => {
                    tracing::warn!(url = %url, error = %err, "mirror attempt failed");
                    last_err = Some(err);
                }
            }
        }
        // The constructor guarantees at least one mirror entry.
        Err(last_err.expect("at least one mirror was attempted"))
    }

    async fn attempt(&self, url: &str, digest: &ExpectedDigest, dest: &Path) -> Result<()> {
        let result = self.transfer_and_verify(url, digest, dest).await;
        if result.is_err() {
            let _ = std::fs::remove_file(dest);
        }
        result
    }

    async fn transfer_and_verify(
        &self,
        url: &str,
        digest: &ExpectedDigest,
        dest: &Path,
    ) -> Result<()> {
        let res = self.client.get(url).send().await?;
        if res.status() != StatusCode::OK {
            return Err(Error::Transport {
                url: url.to_string(),
                status: res.status(),
            });
        }

        // The blob-header convention carries the expected MD5 on the download
        // response itself; a response without it cannot be verified at all.
        let expected_md5 = match digest {
            ExpectedDigest::BlobMd5Header => {
                let header = res
                    .headers()
                    .get(BLOB_MD5_HEADER)
                    .and_then(|v| v.to_str().ok())
                    .ok_or(Error::Corrupted)?;
                Some(BASE64.decode(header).map_err(|_| Error::Corrupted)?)
            }
            ExpectedDigest::Sha256(_) => None,
        };

        let mut file = tokio::fs::File::create(dest).await?;
        let mut stream = res.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            file.write_all(&chunk).await?;
        }
        file.flush().await?;
        drop(file);

        match digest {
            ExpectedDigest::Sha256(expected) => {
                let actual = hash_file::<Sha256>(dest)?;
                if !hex::encode(actual).eq_ignore_ascii_case(expected) {
                    return Err(Error::Corrupted);
                }
            }
            ExpectedDigest::BlobMd5Header => {
                let actual = hash_file::<Md5>(dest)?;
                if Some(actual) != expected_md5 {
                    return Err(Error::Corrupted);
                }
            }
        }
        Ok(())
    }
}

/// Digest of a file's full contents, read in chunks to keep memory bounded.
fn hash_file<D: Digest>(path: &Path) -> Result<Vec<u8>> {
    use std::io::Read;

    let mut file = std::fs::File::open(path)?;
    let mut hasher = D::new();
    let mut buf = [0u8; HASH_BUF_SIZE];
    loop {
        let n = file.read(&mut buf)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(hasher.finalize().to_vec())
}

/// Adds execute permission for owner, group, and other without altering the
/// remaining mode bits.
#[cfg(unix)]
fn set_executable(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;

    let mut perms = std::fs::metadata(path)?.permissions();
    perms.set_mode(perms.mode() | 0o111);
    std::fs::set_permissions(path, perms)?;
    Ok(())
}

#[cfg(not(unix))]
fn set_executable(_path: &Path) -> Result<()> {
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const BODY: &[u8] = b"#!/bin/sh\nexit 0\n";

    fn sha256_hex(bytes: &[u8]) -> String {
        hex::encode(Sha256::digest(bytes))
    }

    fn md5_base64(bytes: &[u8]) -> String {
        BASE64.encode(Md5::digest(bytes))
    }

    fn asset(url: String, digest: ExpectedDigest) -> ReleaseAsset {
        ReleaseAsset {
            name: "tool".to_string(),
            download_url: url,
            digest,
        }
    }

    fn downloader(mirrors: Vec<String>) -> Downloader {
        Downloader::new(Client::new(), mirrors)
    }

    #[tokio::test]
    async fn verified_download_lands_on_disk_with_execute_bits() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/bin/tool"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(BODY))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("tool");
        let asset = asset(
            format!("{}/bin/tool", server.uri()),
            ExpectedDigest::Sha256(sha256_hex(BODY)),
        );

        downloader(vec![String::new()])
            .fetch(&asset, &dest)
            .await
            .unwrap();

        assert_eq!(std::fs::read(&dest).unwrap(), BODY);
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = std::fs::metadata(&dest).unwrap().permissions().mode();
            assert_eq!(mode & 0o111, 0o111);
        }
    }

    #[tokio::test]
    async fn digest_is_compared_case_insensitively() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/bin/tool"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(BODY))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("tool");
        let asset = asset(
            format!("{}/bin/tool", server.uri()),
            ExpectedDigest::Sha256(sha256_hex(BODY).to_uppercase()),
        );

        downloader(vec![String::new()])
            .fetch(&asset, &dest)
            .await
            .unwrap();
        assert!(dest.exists());
    }

    #[tokio::test]
    async fn digest_mismatch_removes_file_and_reports_corruption() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/bin/tool"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(BODY))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("tool");
        let asset = asset(
            format!("{}/bin/tool", server.uri()),
            ExpectedDigest::Sha256(sha256_hex(b"something else")),
        );

        let err = downloader(vec![String::new()])
            .fetch(&asset, &dest)
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Corrupted));
        assert!(!dest.exists());
    }

    #[tokio::test]
    async fn blob_header_digest_verifies_raw_md5_bytes() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/bin/tool"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_bytes(BODY)
                    .insert_header(BLOB_MD5_HEADER, md5_base64(BODY).as_str()),
            )
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("tool");
        let asset = asset(
            format!("{}/bin/tool", server.uri()),
            ExpectedDigest::BlobMd5Header,
        );

        downloader(vec![String::new()])
            .fetch(&asset, &dest)
            .await
            .unwrap();
        assert_eq!(std::fs::read(&dest).unwrap(), BODY);
    }

    #[tokio::test]
    async fn missing_blob_header_is_corruption() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/bin/tool"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(BODY))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("tool");
        let asset = asset(
            format!("{}/bin/tool", server.uri()),
            ExpectedDigest::BlobMd5Header,
        );

        let err = downloader(vec![String::new()])
            .fetch(&asset, &dest)
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Corrupted));
        assert!(!dest.exists());
    }

    #[tokio::test]
    async fn fallback_uses_second_mirror_after_non_200() {
        let bad = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/assets/tool"))
            .respond_with(ResponseTemplate::new(502))
            .mount(&bad)
            .await;

        let good = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/assets/tool"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(BODY))
            .mount(&good)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("tool");
        // Mirror prefixes concatenate onto the URL suffix.
        let asset = asset(
            "assets/tool".to_string(),
            ExpectedDigest::Sha256(sha256_hex(BODY)),
        );

        downloader(vec![format!("{}/", bad.uri()), format!("{}/", good.uri())])
            .fetch(&asset, &dest)
            .await
            .unwrap();

        assert_eq!(std::fs::read(&dest).unwrap(), BODY);
    }

    #[tokio::test]
    async fn exhausted_mirrors_report_last_error_and_leave_nothing() {
        let first = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/assets/tool"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&first)
            .await;

        let second = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/assets/tool"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&second)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("tool");
        let asset = asset(
            "assets/tool".to_string(),
            ExpectedDigest::Sha256(sha256_hex(BODY)),
        );

        let err = downloader(vec![format!("{}/", first.uri()), format!("{}/", second.uri())])
            .fetch(&asset, &dest)
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            Error::Transport { status, .. } if status == StatusCode::INTERNAL_SERVER_ERROR
        ));
        assert!(!dest.exists());
    }
}

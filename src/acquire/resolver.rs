use std::path::PathBuf;
use std::sync::Mutex;
use std::time::Duration;

use reqwest::Client;
use tokio::sync::Mutex as AsyncMutex;

use crate::acquire::download::Downloader;
use crate::acquire::locate::Locator;
use crate::acquire::platform::Platform;
use crate::acquire::release::ReleaseSource;
use crate::constants::{
    DEFAULT_BINARY_NAME, DEFAULT_MIRRORS, DEFAULT_RELEASE_DOWNLOAD_BASE, HTTP_TIMEOUT, USER_AGENT,
};
use crate::error::{Error, Result};
use crate::utils::{print_failure, print_message, TagColor};

/// Construction-time knobs for [`Resolver`]. The defaults match the public
/// FFmpeg release channel; embedders and tests override as needed.
#[derive(Debug, Clone)]
pub struct ResolverConfig {
    /// Base name of the binary to provision.
    pub base_name: String,
    /// Release discovery strategy, including its integrity convention.
    pub source: ReleaseSource,
    /// Mirror prefixes tried in order; an empty string means the direct URL.
    pub mirrors: Vec<String>,
    /// Overrides the OS-conventional per-user binary directory.
    pub bin_dir: Option<PathBuf>,
    /// Absolute cap on any single HTTP request.
    pub timeout: Duration,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            base_name: DEFAULT_BINARY_NAME.to_string(),
            source: ReleaseSource::LatestDownload {
                base_url: DEFAULT_RELEASE_DOWNLOAD_BASE.to_string(),
            },
            mirrors: DEFAULT_MIRRORS.iter().map(|m| m.to_string()).collect(),
            bin_dir: None,
            timeout: HTTP_TIMEOUT,
        }
    }
}

/// Resolves the path of a working binary, provisioning one on demand.
///
/// Construct once per process and share by reference; the resolved path is
/// cached for the process lifetime and the download critical section is
/// serialized so racing cold-cache callers produce exactly one download.
pub struct Resolver {
    platform: Platform,
    config: ResolverConfig,
    client: Client,
    cached: Mutex<Option<PathBuf>>,
    download_lock: AsyncMutex<()>,
}

impl Resolver {
    pub fn new(config: ResolverConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(config.timeout)
            .build()?;
        Ok(Self {
            platform: Platform::current(),
            config,
            client,
            cached: Mutex::new(None),
            download_lock: AsyncMutex::new(()),
        })
    }

    /// The shared HTTP client (User-Agent and timeout already applied).
    pub fn client(&self) -> &Client {
        &self.client
    }

    /// Returns the path of a verified-launchable binary.
    ///
    /// Fast path: the cached path, or the first locator hit. Slow path:
    /// fetch the matching release asset, download through the mirror list,
    /// then re-run the locator to confirm the installed file actually
    /// launches before trusting it.
    pub async fn resolve(&self) -> Result<PathBuf> {
        if let Some(path) = self.cached_path() {
            return Ok(path);
        }

        let locator = self.locator();
        if let Some(path) = locator.locate() {
            self.store(path.clone());
            return Ok(path);
        }

        print_message(
            "FETCHING",
            &format!("{} not found locally, downloading", self.config.base_name),
            TagColor::Blue,
        );
        if let Err(err) = self.fetch_and_install().await {
            print_failure(
                "FAILED",
                &format!("{} download failed: {err}", self.config.base_name),
            );
            return Err(err);
        }

        // A caller that raced us may have already cached the result.
        if let Some(path) = self.cached_path() {
            return Ok(path);
        }
        match locator.locate() {
            Some(path) => {
                print_message("READY", &path.display().to_string(), TagColor::Green);
                self.store(path.clone());
                Ok(path)
            }
            None => Err(Error::NotFoundAfterInstall(self.config.base_name.clone())),
        }
    }

    async fn fetch_and_install(&self) -> Result<()> {
        let _guard = self.download_lock.lock().await;

        // Another caller may have finished the install while we waited on
        // the lock; the locator is read-only and idempotent, so re-checking
        // here is what keeps concurrent cold starts at one download.
        if self.cached_path().is_some() || self.locator().locate().is_some() {
            return Ok(());
        }

        let bin_dir = self.locator().user_bin_dir();
        std::fs::create_dir_all(&bin_dir)?;

        let asset = self
            .config
            .source
            .asset_for(&self.client, &self.platform, &self.config.base_name)
            .await?;
        tracing::info!(asset = %asset.name, "fetching release asset");

        let dest = bin_dir.join(self.platform.executable_name(&self.config.base_name, false));
        Downloader::new(self.client.clone(), self.config.mirrors.clone())
            .fetch(&asset, &dest)
            .await
    }

    fn locator(&self) -> Locator {
        Locator::new(
            self.platform.clone(),
            &self.config.base_name,
            self.config.bin_dir.clone(),
        )
    }

    fn cached_path(&self) -> Option<PathBuf> {
        self.cached.lock().ok().and_then(|guard| guard.clone())
    }

    fn store(&self, path: PathBuf) {
        if let Ok(mut guard) = self.cached.lock() {
            *guard = Some(path);
        }
    }
}

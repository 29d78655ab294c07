use std::time::Duration;

/// Fixed browser User-Agent; some release mirrors reject default client UAs.
pub const USER_AGENT: &str = "Mozilla/5.0 (Linux; Android 10; K) AppleWebKit/537.36 \
     (KHTML, like Gecko) Chrome/129.0.0.0 Mobile Safari/537.36";

/// Base name of the binary we provision.
pub const DEFAULT_BINARY_NAME: &str = "ffmpeg";

/// Latest-release download endpoint used by the URL-template strategy.
pub const DEFAULT_RELEASE_DOWNLOAD_BASE: &str =
    "https://github.com/StellarForager/FFmpeg/releases/latest/download";

/// Release-index endpoint used by the manifest strategy.
pub const DEFAULT_RELEASE_INDEX_URL: &str =
    "https://api.github.com/repos/StellarForager/FFmpeg/releases/latest";

/// Mirror prefixes tried in order; the empty prefix is the direct URL.
pub const DEFAULT_MIRRORS: &[&str] = &["https://ghfast.top/", "https://gh-proxy.com/", ""];

/// Argument used to check that a candidate binary actually runs.
pub const VERSION_PROBE_ARG: &str = "-version";

/// Response header carrying a base64 MD5 of the blob on some release hosts.
pub const BLOB_MD5_HEADER: &str = "x-ms-blob-content-md5";

/// Algorithm prefix on manifest digest fields, stripped before comparison.
pub const MANIFEST_DIGEST_PREFIX: &str = "sha256:";

/// Absolute cap on any single HTTP request. Generous on purpose: the
/// binaries are large and some callers sit behind slow links.
pub const HTTP_TIMEOUT: Duration = Duration::from_secs(15 * 60);

use reqwest::StatusCode;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Failure kinds a caller can match on. Each layer returns these verbatim;
/// only the top-level resolver adds a progress line before propagating.
#[derive(Debug, Error)]
pub enum Error {
    /// No release asset exists for the host's platform variant.
    #[error("no release asset matches platform variant `{0}`")]
    IncompatiblePlatform(String),

    /// The remote answered with a non-200 status.
    #[error("download of {url} failed with status {status}")]
    Transport { url: String, status: StatusCode },

    /// Connection-level HTTP failure.
    #[error(transparent)]
    Http(#[from] reqwest::Error),

    /// Downloaded bytes did not match the expected digest. The partial file
    /// has already been removed.
    #[error("downloaded binary failed integrity verification")]
    Corrupted,

    /// The download completed and verified, but the installed file still
    /// fails the version probe.
    #[error("cannot find a working `{0}` after install")]
    NotFoundAfterInstall(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// The playlist body held no resolvable segment reference.
    #[error("failed to parse a segment url from the playlist")]
    Playlist,

    /// The external binary exited unsuccessfully during frame capture.
    #[error("frame capture failed: {0}")]
    FrameCapture(String),

    #[error(transparent)]
    Image(#[from] image::ImageError),

    /// No decodable QR code in the frame.
    #[error("no QR code found in image")]
    NoQrCode,
}

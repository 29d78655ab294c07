//! Self-provisioning FFmpeg frame grabber for segmented live streams.
//!
//! The crate locates a working FFmpeg binary on the host (own directory,
//! per-user bin directory, `PATH`), or provisions one: it matches a release
//! asset to the platform variant, downloads it through a mirror list with
//! integrity verification, installs it with execute permissions, and caches
//! the verified path for the process lifetime. On top of that sit two small
//! glue layers: single-frame capture from an HLS playlist and QR scanning of
//! the captured frame.
//!
//! ```no_run
//! use framefetch::{Resolver, ResolverConfig};
//!
//! # async fn demo() -> framefetch::Result<()> {
//! let resolver = Resolver::new(ResolverConfig::default())?;
//! let frame = framefetch::stream::grab_frame(&resolver, "http://host/live/index.m3u8").await?;
//! let codes = framefetch::qr::scan_qr_codes(&frame)?;
//! println!("{codes:?}");
//! # Ok(())
//! # }
//! ```

pub mod acquire;
pub mod constants;
mod error;
pub mod qr;
pub mod stream;
mod utils;

pub use acquire::{ExpectedDigest, Platform, ReleaseAsset, ReleaseSource, Resolver, ResolverConfig};
pub use error::{Error, Result};

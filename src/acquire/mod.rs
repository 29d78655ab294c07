//! Binary acquisition engine: platform detection, multi-location discovery,
//! integrity-checked download with mirror fallback, and the process-wide
//! resolver cache tying them together.

pub mod download;
pub mod locate;
pub mod platform;
pub mod release;
pub mod resolver;

pub use platform::Platform;
pub use release::{ExpectedDigest, ReleaseAsset, ReleaseSource};
pub use resolver::{Resolver, ResolverConfig};

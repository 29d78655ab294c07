//! Thin glue between the resolved binary and a live segmented stream: fetch
//! the playlist, pick the newest segment, and shell out for a single frame.

use std::path::Path;
use std::process::Stdio;

use image::{DynamicImage, ImageFormat};
use reqwest::{Client, StatusCode};
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use url::Url;

use crate::acquire::Resolver;
use crate::error::{Error, Result};

/// Resolves the last segment reference in a playlist body against the
/// playlist's own URL.
pub fn resolve_segment(playlist_url: &str, body: &str) -> Result<String> {
    let segment = body
        .lines()
        .rev()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .ok_or(Error::Playlist)?;
    let base = Url::parse(playlist_url).map_err(|_| Error::Playlist)?;
    let resolved = base.join(segment).map_err(|_| Error::Playlist)?;
    Ok(resolved.into())
}

/// Fetches the playlist and returns the URL of its newest segment.
pub async fn segment_url(client: &Client, playlist_url: &str) -> Result<String> {
    let res = client.get(playlist_url).send().await?;
    if res.status() != StatusCode::OK {
        return Err(Error::Transport {
            url: playlist_url.to_string(),
            status: res.status(),
        });
    }
    let body = res.text().await?;
    resolve_segment(playlist_url, &body)
}

/// Argument list tuned for minimal latency: quiet logs, low-delay demuxing,
/// a small probe window, one forced key frame, JPEG on stdout.
fn frame_args(input: &str) -> Vec<String> {
    [
        "-v",
        "quiet",
        "-flags",
        "low_delay",
        "-fflags",
        "discardcorrupt+flush_packets",
        "-probesize",
        "2048",
        "-i",
        input,
        "-an",
        "-pix_fmt",
        "yuvj420p",
        "-vframes",
        "1",
        "-f",
        "image2",
        "-g",
        "1",
        "-",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

/// Extracts one decoded frame from `input` (a local file path or URL the
/// binary can read itself).
pub async fn capture_frame(binary: &Path, input: &str) -> Result<DynamicImage> {
    let output = Command::new(binary)
        .args(frame_args(input))
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .output()
        .await?;

    if !output.status.success() {
        return Err(Error::FrameCapture(format!(
            "{} exited with {}",
            binary.display(),
            output.status
        )));
    }
    Ok(image::load_from_memory_with_format(
        &output.stdout,
        ImageFormat::Jpeg,
    )?)
}

/// Like [`capture_frame`] but feeds the segment bytes over stdin for callers
/// that already hold the data.
pub async fn capture_frame_from_bytes(binary: &Path, data: &[u8]) -> Result<DynamicImage> {
    let mut child = Command::new(binary)
        .args(frame_args("-"))
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()?;

    // Feed stdin from a task so stdout is drained concurrently; writing it
    // all first deadlocks once the child fills its stdout pipe. A write
    // error is expected when the child closes stdin after its single frame.
    if let Some(mut stdin) = child.stdin.take() {
        let data = data.to_vec();
        tokio::spawn(async move {
            let _ = stdin.write_all(&data).await;
            // Dropping stdin closes the pipe so the child sees end of stream.
        });
    }

    let output = child.wait_with_output().await?;
    if !output.status.success() {
        return Err(Error::FrameCapture(format!(
            "{} exited with {}",
            binary.display(),
            output.status
        )));
    }
    Ok(image::load_from_memory_with_format(
        &output.stdout,
        ImageFormat::Jpeg,
    )?)
}

/// End-to-end convenience: resolve the binary, find the newest segment of
/// the playlist at `playlist_url`, and capture a single frame from it.
pub async fn grab_frame(resolver: &Resolver, playlist_url: &str) -> Result<DynamicImage> {
    let binary = resolver.resolve().await?;
    let segment = segment_url(resolver.client(), playlist_url).await?;
    capture_frame(&binary, &segment).await
}

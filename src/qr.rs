//! QR scanning over captured frames.

use image::DynamicImage;

use crate::error::{Error, Result};

/// Decodes every QR code found in `img`, in detection order.
pub fn scan_qr_codes(img: &DynamicImage) -> Result<Vec<String>> {
    let gray = img.to_luma8();
    let mut prepared = rqrr::PreparedImage::prepare_from_greyscale(
        gray.width() as usize,
        gray.height() as usize,
        |x, y| gray.get_pixel(x as u32, y as u32)[0],
    );

    let mut contents = Vec::new();
    for grid in prepared.detect_grids() {
        match grid.decode() {
            Ok((_meta, content)) => contents.push(content),
            Err(err) => tracing::debug!(error = %err, "undecodable QR grid"),
        }
    }

    if contents.is_empty() {
        return Err(Error::NoQrCode);
    }
    Ok(contents)
}

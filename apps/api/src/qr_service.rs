//! QR image rendering for ticket payloads.

use qrcode::render::svg;
use qrcode::{EcLevel, QrCode};

use crate::error::{ApiError, ApiResult};

/// Smallest rendered edge in pixels.
const MIN_DIMENSION: u32 = 240;

/// Renders signed ticket payloads as QR images.
#[derive(Debug, Clone, Copy, Default)]
pub struct QrCodeService;

impl QrCodeService {
    pub fn new() -> Self {
        QrCodeService
    }

    /// Renders `payload` as a standalone SVG document.
    ///
    /// Uses error correction level M, which keeps a ~100 byte payload at a
    /// size door scanners read reliably from a phone screen.
    pub fn render_svg(&self, payload: &str) -> ApiResult<String> {
        let code = QrCode::with_error_correction_level(payload.as_bytes(), EcLevel::M)
            .map_err(|e| ApiError::internal(format!("Failed to encode QR code: {}", e)))?;

        Ok(code
            .render::<svg::Color<'_>>()
            .min_dimensions(MIN_DIMENSION, MIN_DIMENSION)
            .dark_color(svg::Color("#000000"))
            .light_color(svg::Color("#ffffff"))
            .build())
    }
}

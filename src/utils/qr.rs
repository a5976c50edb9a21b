use base64::{Engine, engine::general_purpose::STANDARD};
use qrcode::{QrCode, render::svg};

use crate::errors::AppError;

const MIN_SIZE: u32 = 256;

/// Encode une URL en QR code SVG, renvoyé sous forme de data URL
/// Seule erreur possible : donnée trop longue pour un QR code
pub fn encode_as_data_url(url: &str) -> Result<String, AppError> {
    let svg_string = QrCode::new(url.as_bytes())
        .map_err(|e| AppError::Internal(format!("QR generation failed: {}", e)))?
        .render::<svg::Color>()
        .min_dimensions(MIN_SIZE, MIN_SIZE)
        .dark_color(svg::Color("#000000"))
        .light_color(svg::Color("#FFFFFF"))
        .build();

    Ok(format!("data:image/svg+xml;base64,{}", STANDARD.encode(svg_string)))
}

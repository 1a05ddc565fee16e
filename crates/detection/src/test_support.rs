//! QR fixtures for tests
//!
//! Enabled for this crate's own tests and, via the `test-support` feature,
//! for the workspace integration tests.

use contracts::{Frame, PixelFormat};
use qrcode::types::QrError;
use qrcode::{Color, QrCode};

/// Blank modules around the code
const QUIET_ZONE: usize = 4;
/// Pixels per module
const SCALE: usize = 4;

/// Render `payload` as a Luma8 frame, dark modules on white
pub fn qr_frame(payload: impl AsRef<[u8]>) -> Result<Frame, QrError> {
    let code = QrCode::new(payload)?;
    let modules = code.width();
    let colors = code.to_colors();
    let side = (modules + 2 * QUIET_ZONE) * SCALE;

    let mut data = vec![255u8; side * side];
    for y in 0..side {
        for x in 0..side {
            let mx = (x / SCALE).checked_sub(QUIET_ZONE);
            let my = (y / SCALE).checked_sub(QUIET_ZONE);
            if let (Some(mx), Some(my)) = (mx, my) {
                if mx < modules && my < modules && colors[my * modules + mx] == Color::Dark {
                    data[y * side + x] = 0;
                }
            }
        }
    }
    Ok(Frame::new(side as u32, side as u32, PixelFormat::Luma8, data))
}

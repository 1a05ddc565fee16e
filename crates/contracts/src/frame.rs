//! Frame - Stream source output
//!
//! A single decoded video frame, immutable once handed to the relay.

use std::time::SystemTime;

use bytes::Bytes;
use serde::{Deserialize, Serialize};

/// Pixel layout of `Frame::data`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PixelFormat {
    /// 8-bit grayscale, one byte per pixel
    Luma8,
    /// Packed RGB, three bytes per pixel
    Rgb8,
}

impl PixelFormat {
    /// Bytes per pixel
    pub fn bytes_per_pixel(self) -> usize {
        match self {
            Self::Luma8 => 1,
            Self::Rgb8 => 3,
        }
    }
}

/// Decoded video frame
///
/// The pixel buffer is reference counted (`Bytes`), so cloning a frame is cheap.
#[derive(Debug, Clone)]
pub struct Frame {
    /// Monotonic sequence number assigned by the producer
    pub sequence: u64,

    /// Wall-clock capture time
    pub captured_at: SystemTime,

    /// Width in pixels
    pub width: u32,

    /// Height in pixels
    pub height: u32,

    /// Pixel layout
    pub format: PixelFormat,

    /// Raw pixel data (row-major, no padding)
    pub data: Bytes,
}

impl Frame {
    /// Create a frame captured now
    pub fn new(width: u32, height: u32, format: PixelFormat, data: impl Into<Bytes>) -> Self {
        Self {
            sequence: 0,
            captured_at: SystemTime::now(),
            width,
            height,
            format,
            data: data.into(),
        }
    }

    /// Expected buffer length for the declared geometry
    pub fn expected_len(&self) -> usize {
        self.width as usize * self.height as usize * self.format.bytes_per_pixel()
    }

    /// Buffer length matches geometry
    pub fn is_well_formed(&self) -> bool {
        self.data.len() == self.expected_len()
    }

    /// Gray level of pixel (x, y)
    ///
    /// RGB is converted with integer BT.601 weights.
    /// Callers must check `is_well_formed` first.
    pub fn luma(&self, x: usize, y: usize) -> u8 {
        let idx = y * self.width as usize + x;
        match self.format {
            PixelFormat::Luma8 => self.data[idx],
            PixelFormat::Rgb8 => {
                let p = idx * 3;
                let r = self.data[p] as u32;
                let g = self.data[p + 1] as u32;
                let b = self.data[p + 2] as u32;
                ((r * 299 + g * 587 + b * 114) / 1000) as u8
            }
        }
    }
}

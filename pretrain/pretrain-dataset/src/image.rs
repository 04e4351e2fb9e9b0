//! Canonical image values.
//!
//! Samples leave the storage layer as row-major H×W×C byte records and enter
//! the training stack as channel-first float tensors. The conversion here is
//! a pure re-layout: the channel axis moves to the front and values are cast
//! `u8 → f32` without rescaling. Normalization, resizing and every other
//! value-changing step belongs to the augmentation stage, not this crate.

use serde::{Deserialize, Serialize};

use pretrain_store::RawRecord;

use crate::error::{DatasetError, Result};

/// A canonical sample: one image in flat CHW (channel-first) f32 layout.
///
/// # Example
///
/// ```
/// use pretrain_dataset::ChwImage;
/// use pretrain_store::RawRecord;
///
/// // One 1x2 pixel row, RGB: pixel 0 = (1, 2, 3), pixel 1 = (4, 5, 6).
/// let record = RawRecord {
///     height: 1,
///     width: 2,
///     channels: 3,
///     data: vec![1, 2, 3, 4, 5, 6],
/// };
///
/// let image = ChwImage::from_hwc(&record).unwrap();
/// assert_eq!(image.shape(), [3, 1, 2]);
/// // Channel planes are contiguous after the transpose.
/// assert_eq!(image.data, vec![1.0, 4.0, 2.0, 5.0, 3.0, 6.0]);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChwImage {
    /// Number of channels.
    pub channels: u32,

    /// Image height in pixels.
    pub height: u32,

    /// Image width in pixels.
    pub width: u32,

    /// Flat CHW sample values.
    pub data: Vec<f32>,
}

impl ChwImage {
    /// Creates an image from already channel-first data.
    ///
    /// # Errors
    ///
    /// Returns an error if `data` does not hold exactly
    /// `channels * height * width` values.
    pub fn new(channels: u32, height: u32, width: u32, data: Vec<f32>) -> Result<Self> {
        let expected =
            (channels as usize) * (height as usize) * (width as usize);
        if data.len() != expected {
            return Err(DatasetError::record_shape(format!(
                "expected {expected} values for {channels}x{height}x{width}, got {}",
                data.len()
            )));
        }
        Ok(Self {
            channels,
            height,
            width,
            data,
        })
    }

    /// Converts a raw H×W×C record into the canonical channel-first layout.
    ///
    /// A pure, deterministic, shape-preserving transpose with a `u8 → f32`
    /// cast; values are not rescaled.
    ///
    /// # Errors
    ///
    /// Returns an error if the record's payload length disagrees with its
    /// declared dimensions.
    pub fn from_hwc(record: &RawRecord) -> Result<Self> {
        if !record.has_valid_len() {
            return Err(DatasetError::record_shape(format!(
                "payload of {} bytes does not match declared shape {}x{}x{}",
                record.data.len(),
                record.height,
                record.width,
                record.channels
            )));
        }

        let (h, w, c) = (
            record.height as usize,
            record.width as usize,
            record.channels as usize,
        );
        let mut data = vec![0.0f32; c * h * w];
        for row in 0..h {
            for col in 0..w {
                for ch in 0..c {
                    let src = row * w * c + col * c + ch;
                    let dst = ch * h * w + row * w + col;
                    data[dst] = f32::from(record.data[src]);
                }
            }
        }

        Ok(Self {
            channels: record.channels,
            height: record.height,
            width: record.width,
            data,
        })
    }

    /// Returns the shape as `[channels, height, width]`.
    #[must_use]
    pub const fn shape(&self) -> [usize; 3] {
        [
            self.channels as usize,
            self.height as usize,
            self.width as usize,
        ]
    }

    /// Value at channel `ch`, row `row`, column `col`.
    #[must_use]
    pub fn at(&self, ch: usize, row: usize, col: usize) -> f32 {
        let (h, w) = (self.height as usize, self.width as usize);
        self.data[ch * h * w + row * w + col]
    }

    /// Returns `true` if both images have identical dimensions.
    #[must_use]
    pub const fn same_shape(&self, other: &Self) -> bool {
        self.channels == other.channels
            && self.height == other.height
            && self.width == other.width
    }
}

/// Two views of one sample stacked along a new leading axis.
///
/// The logical shape is `[2, channels, height, width]`; view 0 occupies the
/// first half of `data`, view 1 the second. Stacking order follows the
/// transform's own output order and carries no randomness of its own.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PairedImage {
    /// Number of channels per view.
    pub channels: u32,

    /// View height in pixels.
    pub height: u32,

    /// View width in pixels.
    pub width: u32,

    /// Both views back to back, each in flat CHW layout.
    pub data: Vec<f32>,
}

impl PairedImage {
    /// Stacks two views, first view first.
    ///
    /// # Errors
    ///
    /// Returns a transform error if the views disagree in shape — a
    /// transform that produces mismatched views has broken its contract.
    pub fn stack(first: ChwImage, second: ChwImage) -> Result<Self> {
        if !first.same_shape(&second) {
            return Err(DatasetError::transform(format!(
                "views disagree in shape: {:?} vs {:?}",
                first.shape(),
                second.shape()
            )));
        }

        let mut data = first.data;
        data.extend(second.data);
        Ok(Self {
            channels: first.channels,
            height: first.height,
            width: first.width,
            data,
        })
    }

    /// Returns the shape as `[2, channels, height, width]`.
    #[must_use]
    pub const fn shape(&self) -> [usize; 4] {
        [
            2,
            self.channels as usize,
            self.height as usize,
            self.width as usize,
        ]
    }

    /// The flat CHW values of view `view` (0 or 1).
    ///
    /// # Panics
    ///
    /// Panics if `view > 1`.
    #[must_use]
    pub fn view(&self, view: usize) -> &[f32] {
        assert!(view < 2, "paired image has exactly two views");
        let view_len = self.data.len() / 2;
        &self.data[view * view_len..(view + 1) * view_len]
    }
}

#[cfg(test)]
#[allow(clippy::float_cmp)]
mod tests {
    use super::*;

    fn checker_record() -> RawRecord {
        // 2x2, 2 channels; pixel (row, col) holds (10*row + col, 100 + 10*row + col).
        RawRecord {
            height: 2,
            width: 2,
            channels: 2,
            data: vec![0, 100, 1, 101, 10, 110, 11, 111],
        }
    }

    #[test]
    fn from_hwc_transposes_channels_to_front() {
        let image = ChwImage::from_hwc(&checker_record()).unwrap();
        assert_eq!(image.shape(), [2, 2, 2]);

        // Channel 0 plane.
        assert_eq!(image.at(0, 0, 0), 0.0);
        assert_eq!(image.at(0, 0, 1), 1.0);
        assert_eq!(image.at(0, 1, 0), 10.0);
        assert_eq!(image.at(0, 1, 1), 11.0);

        // Channel 1 plane.
        assert_eq!(image.at(1, 0, 0), 100.0);
        assert_eq!(image.at(1, 1, 1), 111.0);
    }

    #[test]
    fn from_hwc_is_deterministic() {
        let record = checker_record();
        let a = ChwImage::from_hwc(&record).unwrap();
        let b = ChwImage::from_hwc(&record).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn from_hwc_rejects_short_payload() {
        let record = RawRecord {
            height: 2,
            width: 2,
            channels: 3,
            data: vec![0; 11],
        };
        let err = ChwImage::from_hwc(&record).unwrap_err();
        assert!(matches!(err, DatasetError::RecordShape { .. }));
    }

    #[test]
    fn new_rejects_wrong_length() {
        let err = ChwImage::new(3, 2, 2, vec![0.0; 11]).unwrap_err();
        assert!(matches!(err, DatasetError::RecordShape { .. }));
    }

    #[test]
    fn stack_orders_views() {
        let v1 = ChwImage::new(1, 1, 2, vec![1.0, 2.0]).unwrap();
        let v2 = ChwImage::new(1, 1, 2, vec![3.0, 4.0]).unwrap();

        let paired = PairedImage::stack(v1, v2).unwrap();
        assert_eq!(paired.shape(), [2, 1, 1, 2]);
        assert_eq!(paired.view(0), &[1.0, 2.0]);
        assert_eq!(paired.view(1), &[3.0, 4.0]);
    }

    #[test]
    fn stack_rejects_mismatched_views() {
        let v1 = ChwImage::new(1, 1, 2, vec![1.0, 2.0]).unwrap();
        let v2 = ChwImage::new(1, 2, 1, vec![3.0, 4.0]).unwrap();

        let err = PairedImage::stack(v1, v2).unwrap_err();
        assert!(matches!(err, DatasetError::Transform { .. }));
    }

    #[test]
    fn image_serialization() {
        let image = ChwImage::new(1, 1, 2, vec![1.0, 2.0]).unwrap();
        let json = serde_json::to_string(&image).unwrap();
        let parsed: ChwImage = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, image);
    }
}

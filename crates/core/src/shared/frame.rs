use image::{GrayImage, RgbImage};
use ndarray::{ArrayView3, ArrayViewMut3};

/// Fixed-point (Q14) luma weights for R, G and B: 0.299, 0.587, 0.114.
///
/// Same integer coefficients OpenCV uses for its RGB→gray conversion, so
/// cascades trained on OpenCV grayscale see identical input.
pub const GRAY_WEIGHTS_Q14: [u32; 3] = [4899, 9617, 1868];
const GRAY_SHIFT: u32 = 14;

/// A single image: contiguous RGB bytes in row-major order.
///
/// RGB is the canonical channel order everywhere in the crate. The `image`
/// crate decodes to and encodes from RGB, so no channel swaps happen at
/// the I/O boundaries.
#[derive(Clone, Debug, PartialEq)]
pub struct Frame {
    data: Vec<u8>,
    width: u32,
    height: u32,
    channels: u8,
}

impl Frame {
    pub fn new(data: Vec<u8>, width: u32, height: u32, channels: u8) -> Self {
        debug_assert_eq!(
            data.len(),
            (width as usize) * (height as usize) * (channels as usize),
            "data length must equal width * height * channels"
        );
        Self {
            data,
            width,
            height,
            channels,
        }
    }

    pub fn from_rgb_image(img: RgbImage) -> Self {
        let (width, height) = img.dimensions();
        Self::new(img.into_raw(), width, height, 3)
    }

    /// Copies the pixels into an [`RgbImage`], e.g. for display.
    ///
    /// Returns `None` for frames that are not 3-channel.
    pub fn to_rgb_image(&self) -> Option<RgbImage> {
        if self.channels != 3 {
            return None;
        }
        RgbImage::from_raw(self.width, self.height, self.data.clone())
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn channels(&self) -> u8 {
        self.channels
    }

    /// Single-channel luma image with the same dimensions as the frame.
    pub fn to_gray(&self) -> GrayImage {
        let channels = self.channels as usize;
        let luma: Vec<u8> = if channels >= 3 {
            self.data
                .chunks_exact(channels)
                .map(|px| rgb_to_gray(px[0], px[1], px[2]))
                .collect()
        } else {
            self.data.iter().step_by(channels.max(1)).copied().collect()
        };
        GrayImage::from_raw(self.width, self.height, luma)
            .expect("gray buffer length matches frame dimensions")
    }

    pub fn as_ndarray(&self) -> ArrayView3<'_, u8> {
        ArrayView3::from_shape(self.shape(), &self.data)
            .expect("Frame data length must match dimensions")
    }

    pub fn as_ndarray_mut(&mut self) -> ArrayViewMut3<'_, u8> {
        ArrayViewMut3::from_shape(self.shape(), &mut self.data)
            .expect("Frame data length must match dimensions")
    }

    fn shape(&self) -> (usize, usize, usize) {
        (
            self.height as usize,
            self.width as usize,
            self.channels as usize,
        )
    }
}

/// Rounded fixed-point luma of one pixel.
pub fn rgb_to_gray(r: u8, g: u8, b: u8) -> u8 {
    let [wr, wg, wb] = GRAY_WEIGHTS_Q14;
    let y = (r as u32 * wr + g as u32 * wg + b as u32 * wb + (1 << (GRAY_SHIFT - 1))) >> GRAY_SHIFT;
    y.min(255) as u8
}

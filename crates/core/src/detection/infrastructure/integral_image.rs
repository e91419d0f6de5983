//! Summed-area tables for constant-time rectangle sums.

use image::GrayImage;

/// Upright and (optionally) 45°-rotated summed-area tables of one image.
///
/// The upright tables are `(width + 1) × (height + 1)`: entry `(X, Y)` holds
/// the sum of all pixels with `x < X` and `y < Y`.
///
/// The rotated table entry `(X, Y)` holds the sum of pixels with `y < Y`
/// and `|x - X + 1| <= Y - y - 1`, i.e. the upward-opening triangle whose
/// bottom apex is pixel `(X - 1, Y - 1)`. It is stored with `height + 1`
/// columns of padding on each side so corners of rotated rectangles that
/// fall left or right of the image still index valid (zero) entries.
pub struct IntegralImage {
    width: usize,
    height: usize,
    sum: Vec<i64>,
    sq_sum: Vec<i64>,
    tilted: Option<TiltedTable>,
}

struct TiltedTable {
    offset: i64,
    stride: usize,
    data: Vec<i64>,
}

impl IntegralImage {
    pub fn new(gray: &GrayImage, with_tilted: bool) -> Self {
        let (w, h) = gray.dimensions();
        let (width, height) = (w as usize, h as usize);
        let stride = width + 1;
        let pixels = gray.as_raw();

        let mut sum = vec![0i64; stride * (height + 1)];
        let mut sq_sum = vec![0i64; stride * (height + 1)];
        for y in 0..height {
            let mut row_sum = 0i64;
            let mut row_sq = 0i64;
            for x in 0..width {
                let v = pixels[y * width + x] as i64;
                row_sum += v;
                row_sq += v * v;
                let idx = (y + 1) * stride + x + 1;
                sum[idx] = sum[idx - stride] + row_sum;
                sq_sum[idx] = sq_sum[idx - stride] + row_sq;
            }
        }

        let tilted = with_tilted.then(|| TiltedTable::new(pixels, width, height));

        Self {
            width,
            height,
            sum,
            sq_sum,
            tilted,
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn has_tilted(&self) -> bool {
        self.tilted.is_some()
    }

    /// Sum of pixels in `[x, x + w) × [y, y + h)`.
    pub fn rect_sum(&self, x: usize, y: usize, w: usize, h: usize) -> i64 {
        corner_sum(&self.sum, self.width + 1, x, y, w, h)
    }

    /// Sum of squared pixels in `[x, x + w) × [y, y + h)`.
    pub fn rect_sq_sum(&self, x: usize, y: usize, w: usize, h: usize) -> i64 {
        corner_sum(&self.sq_sum, self.width + 1, x, y, w, h)
    }

    /// Sum over a 45°-rotated rectangle whose top corner is `(x, y)`, with
    /// side `w` running down-right and side `h` running down-left.
    ///
    /// # Panics
    ///
    /// If the table was built without rotated sums.
    pub fn tilted_sum(&self, x: i64, y: i64, w: i64, h: i64) -> i64 {
        let t = self
            .tilted
            .as_ref()
            .expect("tilted_sum requires an integral image built with rotated sums");
        t.at(x, y) - t.at(x - h, y + h) - t.at(x + w, y + w) + t.at(x + w - h, y + w + h)
    }
}

fn corner_sum(table: &[i64], stride: usize, x: usize, y: usize, w: usize, h: usize) -> i64 {
    let (x1, y1) = (x + w, y + h);
    table[y1 * stride + x1] + table[y * stride + x]
        - table[y1 * stride + x]
        - table[y * stride + x1]
}

impl TiltedTable {
    fn new(pixels: &[u8], width: usize, height: usize) -> Self {
        let offset = height as i64 + 1;
        let stride = width + 2 * (height + 1) + 1;
        let mut data = vec![0i64; stride * (height + 1)];

        let pixel = |x: i64, y: i64| -> i64 {
            if x < 0 || y < 0 || x >= width as i64 || y >= height as i64 {
                0
            } else {
                pixels[y as usize * width + x as usize] as i64
            }
        };

        for yy in 1..=height {
            let big_y = yy as i64;
            for col in 0..stride {
                let big_x = col as i64 - offset;
                let left = if col > 0 { data[(yy - 1) * stride + col - 1] } else { 0 };
                let right = if col + 1 < stride {
                    data[(yy - 1) * stride + col + 1]
                } else {
                    0
                };
                let above = if yy >= 2 { data[(yy - 2) * stride + col] } else { 0 };
                data[yy * stride + col] = left + right - above
                    + pixel(big_x - 1, big_y - 1)
                    + pixel(big_x - 1, big_y - 2);
            }
        }

        Self {
            offset,
            stride,
            data,
        }
    }

    fn at(&self, x: i64, y: i64) -> i64 {
        let col = x + self.offset;
        debug_assert!(col >= 0 && (col as usize) < self.stride, "tilted column out of range");
        self.data[y as usize * self.stride + col as usize]
    }
}

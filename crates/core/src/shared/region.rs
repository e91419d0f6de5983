/// Axis-aligned detection rectangle in pixel coordinates.
///
/// Coordinates are relative to the image the region was found in. Regions
/// found inside a region of interest must be moved into the parent frame
/// with [`Region::translate`] before they are drawn or reported.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Region {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Region {
    pub fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Region covering a whole `width` × `height` image.
    pub fn full(width: u32, height: u32) -> Self {
        Self::new(0, 0, width as i32, height as i32)
    }

    pub fn right(&self) -> i32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> i32 {
        self.y + self.height
    }

    pub fn area(&self) -> i64 {
        if self.is_empty() {
            0
        } else {
            self.width as i64 * self.height as i64
        }
    }

    /// A region with no pixels (zero or negative extent on either axis).
    pub fn is_empty(&self) -> bool {
        self.width <= 0 || self.height <= 0
    }

    /// Shifts the region by the origin of its parent region.
    pub fn translate(&self, dx: i32, dy: i32) -> Region {
        Region {
            x: self.x + dx,
            y: self.y + dy,
            ..*self
        }
    }

    /// True if `other` lies entirely inside `self`.
    pub fn contains(&self, other: &Region) -> bool {
        other.x >= self.x
            && other.y >= self.y
            && other.right() <= self.right()
            && other.bottom() <= self.bottom()
    }

    /// Intersection with `bounds`. Disjoint regions collapse to an empty
    /// region anchored at the clamped origin.
    pub fn clip_to(&self, bounds: &Region) -> Region {
        let x1 = self.x.clamp(bounds.x, bounds.right());
        let y1 = self.y.clamp(bounds.y, bounds.bottom());
        let x2 = self.right().clamp(bounds.x, bounds.right());
        let y2 = self.bottom().clamp(bounds.y, bounds.bottom());
        Region {
            x: x1,
            y: y1,
            width: (x2 - x1).max(0),
            height: (y2 - y1).max(0),
        }
    }
}

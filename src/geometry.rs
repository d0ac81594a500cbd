/// Integer size measured in terminal character cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Size {
    pub width: u16,
    pub height: u16,
}

impl Size {
    pub const fn new(width: u16, height: u16) -> Self {
        Self { width, height }
    }
}

/// Rectangle with inclusive bounds in terminal cell coordinates.
///
/// Coordinates are signed because frame compensation can push an outer edge
/// one cell past the logical rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Rect {
    pub x0: i32,
    pub y0: i32,
    pub x1: i32,
    pub y1: i32,
}

impl Rect {
    pub const fn new(x0: i32, y0: i32, x1: i32, y1: i32) -> Self {
        Self { x0, y0, x1, y1 }
    }

    /// Build a rect from an origin and a cell count along each axis.
    ///
    /// A zero-sized axis yields `x1 == x0 - 1`, which [`Rect::is_empty`]
    /// reports as empty.
    pub fn from_origin_size(x: u16, y: u16, width: u16, height: u16) -> Self {
        let x0 = i32::from(x);
        let y0 = i32::from(y);
        Self {
            x0,
            y0,
            x1: x0 + i32::from(width) - 1,
            y1: y0 + i32::from(height) - 1,
        }
    }

    /// The full terminal canvas, as handed to views staged in the background.
    pub fn canvas(size: Size) -> Self {
        Self::new(0, 0, i32::from(size.width), i32::from(size.height))
    }

    pub fn width(&self) -> i32 {
        (self.x1 - self.x0 + 1).max(0)
    }

    pub fn height(&self) -> i32 {
        (self.y1 - self.y0 + 1).max(0)
    }

    pub fn is_empty(&self) -> bool {
        self.width() == 0 || self.height() == 0
    }

    /// Grow (or shrink, for negative `by`) every edge by `by` cells.
    pub fn expand(&self, by: i32) -> Self {
        Self {
            x0: self.x0 - by,
            y0: self.y0 - by,
            x1: self.x1 + by,
            y1: self.y1 + by,
        }
    }

    /// Clamp every edge into `[0, width] x [0, height]`.
    pub fn clamp_to(&self, size: Size) -> Self {
        let max_x = i32::from(size.width);
        let max_y = i32::from(size.height);
        Self {
            x0: self.x0.clamp(0, max_x),
            y0: self.y0.clamp(0, max_y),
            x1: self.x1.clamp(0, max_x),
            y1: self.y1.clamp(0, max_y),
        }
    }

    pub fn within(&self, size: Size) -> bool {
        *self == self.clamp_to(size)
    }
}

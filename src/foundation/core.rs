/// Sub-pixel image coordinate, as reported by a landmark detector.
#[derive(Clone, Copy, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Point {
    /// Horizontal position in pixels, growing to the right.
    pub x: f32,
    /// Vertical position in pixels, growing downwards.
    pub y: f32,
}

impl Point {
    /// Construct a point.
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Midpoint between `self` and `other`.
    pub fn midpoint(self, other: Point) -> Point {
        Point::new((self.x + other.x) * 0.5, (self.y + other.y) * 0.5)
    }

    /// Euclidean distance to `other`.
    pub fn distance(self, other: Point) -> f32 {
        let dx = other.x - self.x;
        let dy = other.y - self.y;
        (dx * dx + dy * dy).sqrt()
    }

    /// Linear interpolation from `self` (t = 0) to `other` (t = 1).
    pub fn lerp(self, other: Point, t: f32) -> Point {
        Point::new(
            self.x + (other.x - self.x) * t,
            self.y + (other.y - self.y) * t,
        )
    }

    /// Translate by `(dx, dy)`.
    pub fn offset(self, dx: f32, dy: f32) -> Point {
        Point::new(self.x + dx, self.y + dy)
    }

    pub(crate) fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

/// Integer pixel anchor at which a decoration is placed.
///
/// May be negative or past the far edge before clamping; see
/// [`clamp_anchor`](crate::clamp_anchor).
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize,
)]
pub struct Anchor {
    /// Column.
    pub x: i64,
    /// Row.
    pub y: i64,
}

impl Anchor {
    /// Construct an anchor.
    pub const fn new(x: i64, y: i64) -> Self {
        Self { x, y }
    }

    /// Round a sub-pixel point to the nearest pixel.
    pub fn from_point(p: Point) -> Self {
        Self::new(p.x.round() as i64, p.y.round() as i64)
    }

    /// Clamp into `[0, width) x [0, height)`. Empty extents clamp to zero.
    pub fn clamp_within(self, width: u32, height: u32) -> Self {
        let max_x = i64::from(width).saturating_sub(1).max(0);
        let max_y = i64::from(height).saturating_sub(1).max(0);
        Self::new(self.x.clamp(0, max_x), self.y.clamp(0, max_y))
    }
}

/// Which point of the decoration an anchor refers to.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnchorOrigin {
    /// Anchor is the decoration's top-left pixel.
    #[default]
    TopLeft,
    /// Anchor is the decoration's center.
    Center,
}

impl AnchorOrigin {
    /// Convert an anchor into the top-left corner for a decoration of the given size.
    pub fn to_top_left(self, anchor: Anchor, width: u32, height: u32) -> Anchor {
        match self {
            AnchorOrigin::TopLeft => anchor,
            AnchorOrigin::Center => Anchor::new(
                anchor.x - i64::from(width / 2),
                anchor.y - i64::from(height / 2),
            ),
        }
    }
}

/// Axis-aligned pixel rectangle `[x, x + width) x [y, y + height)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PixelRect {
    /// Left column.
    pub x: u32,
    /// Top row.
    pub y: u32,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl PixelRect {
    /// Return `true` when the rectangle covers no pixels.
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

/// A direction of travel along one of the two axes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Axis {
    PositiveX,
    NegativeX,
    PositiveY,
    NegativeY,
}

impl Axis {
    #[must_use]
    pub fn opposite(self) -> Self {
        match self {
            Self::PositiveX => Self::NegativeX,
            Self::NegativeX => Self::PositiveX,
            Self::PositiveY => Self::NegativeY,
            Self::NegativeY => Self::PositiveY,
        }
    }

    #[must_use]
    pub fn is_horizontal(self) -> bool {
        matches!(self, Self::PositiveX | Self::NegativeX)
    }
}

/// An axis-aligned rectangle, plus the height of one line of the text inside it.
///
/// `right` and `bottom` are always `left + width` and `top + height`; all operations keep them in
/// sync.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct LayoutBox {
    pub left: f64,
    pub right: f64,
    pub top: f64,
    pub bottom: f64,
    pub width: f64,
    pub height: f64,
    pub line_height: f64,
}

impl LayoutBox {
    #[must_use]
    pub fn new(left: f64, top: f64, width: f64, height: f64, line_height: f64) -> Self {
        Self {
            left,
            right: left + width,
            top,
            bottom: top + height,
            width,
            height,
            line_height,
        }
    }

    /// Translate the box along `axis`, by one line height unless `amount` is given.
    #[must_use]
    pub fn moved(self, axis: Axis, amount: Option<f64>) -> Self {
        let amount = amount.unwrap_or(self.line_height);
        match axis {
            Axis::PositiveX => self.translated(amount, 0.0),
            Axis::NegativeX => self.translated(-amount, 0.0),
            Axis::PositiveY => self.translated(0.0, amount),
            Axis::NegativeY => self.translated(0.0, -amount),
        }
    }

    #[must_use]
    pub fn translated(self, x: f64, y: f64) -> Self {
        Self::new(
            self.left + x,
            self.top + y,
            self.width,
            self.height,
            self.line_height,
        )
    }

    #[must_use]
    pub fn with_left(self, left: f64) -> Self {
        self.translated(left - self.left, 0.0)
    }

    #[must_use]
    pub fn with_right(self, right: f64) -> Self {
        self.translated(right - self.right, 0.0)
    }

    #[must_use]
    pub fn with_top(self, top: f64) -> Self {
        self.translated(0.0, top - self.top)
    }

    #[must_use]
    pub fn with_bottom(self, bottom: f64) -> Self {
        self.translated(0.0, bottom - self.bottom)
    }

    /// Strict intersection: boxes that only share an edge do not overlap.
    #[must_use]
    pub fn overlaps(&self, other: &Self) -> bool {
        self.left < other.right
            && self.right > other.left
            && self.top < other.bottom
            && self.bottom > other.top
    }

    #[must_use]
    pub fn overlaps_any(&self, others: &[Self]) -> bool {
        others.iter().any(|other| self.overlaps(other))
    }

    /// Whether all four edges are inside `container`, edges included.
    #[must_use]
    pub fn within(&self, container: &Self) -> bool {
        self.top >= container.top
            && self.bottom <= container.bottom
            && self.left >= container.left
            && self.right <= container.right
    }

    /// Whether the box sticks out of `container` on the edge a box moving along `axis` is moving
    /// away from.
    #[must_use]
    pub fn overlaps_opposite_axis(&self, container: &Self, axis: Axis) -> bool {
        match axis {
            Axis::PositiveX => self.left < container.left,
            Axis::NegativeX => self.right > container.right,
            Axis::PositiveY => self.top < container.top,
            Axis::NegativeY => self.bottom > container.bottom,
        }
    }

    /// Share of this box's area that lies inside `other`, between 0 and 1.
    #[must_use]
    pub fn intersect_percentage(&self, other: &Self) -> f64 {
        let x = (self.right.min(other.right) - self.left.max(other.left)).max(0.0);
        let y = (self.bottom.min(other.bottom) - self.top.max(other.top)).max(0.0);
        let area = self.width * self.height;
        if area > 0.0 { x * y / area } else { 0.0 }
    }

    /// This box in the coordinate system whose origin is the top left corner of `reference`.
    #[must_use]
    pub fn relative_to(&self, reference: &Self) -> Self {
        self.translated(-reference.left, -reference.top)
    }

    /// Inverse of [`LayoutBox::relative_to`].
    #[must_use]
    pub fn absolute_from(&self, reference: &Self) -> Self {
        self.translated(reference.left, reference.top)
    }
}

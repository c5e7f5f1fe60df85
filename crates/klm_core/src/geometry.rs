//! Minimal 2D geometry for viewport math

/// A 2D offset (translation) in logical pixels
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Offset {
    pub x: f64,
    pub y: f64,
}

impl Offset {
    pub const ZERO: Offset = Offset { x: 0.0, y: 0.0 };

    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Linearly interpolate toward `other` by `t` (0.0 to 1.0)
    pub fn lerp(self, other: Offset, t: f64) -> Offset {
        Offset {
            x: self.x + (other.x - self.x) * t,
            y: self.y + (other.y - self.y) * t,
        }
    }

    pub fn length(self) -> f64 {
        self.x.hypot(self.y)
    }
}

/// An axis-aligned rectangle in page coordinates
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    /// Area of the rectangle, zero for degenerate or inverted rects
    pub fn area(&self) -> f64 {
        self.width.max(0.0) * self.height.max(0.0)
    }

    /// Intersection with another rect, `None` when they don't overlap
    ///
    /// Rects that only touch along an edge produce a zero-area intersection,
    /// which still counts as overlapping.
    pub fn intersection(&self, other: &Rect) -> Option<Rect> {
        let left = self.x.max(other.x);
        let top = self.y.max(other.y);
        let right = self.right().min(other.right());
        let bottom = self.bottom().min(other.bottom());

        if right < left || bottom < top {
            return None;
        }

        Some(Rect::new(left, top, right - left, bottom - top))
    }

    /// Grow the rect by `margin` on every side (negative shrinks)
    pub fn inflate(&self, margin: f64) -> Rect {
        Rect::new(
            self.x - margin,
            self.y - margin,
            self.width + margin * 2.0,
            self.height + margin * 2.0,
        )
    }

    /// Fraction of `self` covered by `other`, in [0, 1]
    ///
    /// A zero-area rect counts as fully visible when any part of it lies
    /// within `other`, matching how browsers report degenerate targets.
    pub fn visible_fraction_in(&self, other: &Rect) -> f64 {
        let Some(overlap) = self.intersection(other) else {
            return 0.0;
        };

        let area = self.area();
        if area <= 0.0 {
            return 1.0;
        }

        (overlap.area() / area).clamp(0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_intersection_overlap() {
        let a = Rect::new(0.0, 0.0, 100.0, 100.0);
        let b = Rect::new(50.0, 50.0, 100.0, 100.0);

        assert_eq!(a.intersection(&b), Some(Rect::new(50.0, 50.0, 50.0, 50.0)));
        assert!(a.intersection(&Rect::new(200.0, 0.0, 10.0, 10.0)).is_none());
    }

    #[test]
    fn test_visible_fraction() {
        let viewport = Rect::new(0.0, 0.0, 800.0, 600.0);

        let half = Rect::new(0.0, 500.0, 100.0, 200.0);
        assert!((half.visible_fraction_in(&viewport) - 0.5).abs() < 1e-9);

        let below = Rect::new(0.0, 700.0, 100.0, 100.0);
        assert_eq!(below.visible_fraction_in(&viewport), 0.0);

        let inside = Rect::new(10.0, 10.0, 10.0, 10.0);
        assert_eq!(inside.visible_fraction_in(&viewport), 1.0);
    }

    #[test]
    fn test_zero_area_fraction() {
        let viewport = Rect::new(0.0, 0.0, 800.0, 600.0);

        assert_eq!(Rect::new(10.0, 10.0, 0.0, 0.0).visible_fraction_in(&viewport), 1.0);
        assert_eq!(Rect::new(10.0, 900.0, 0.0, 0.0).visible_fraction_in(&viewport), 0.0);
    }

    #[test]
    fn test_inflate() {
        let r = Rect::new(10.0, 10.0, 20.0, 20.0).inflate(5.0);
        assert_eq!(r, Rect::new(5.0, 5.0, 30.0, 30.0));
    }

    #[test]
    fn test_offset_lerp() {
        let from = Offset::new(0.0, 30.0);
        let mid = from.lerp(Offset::ZERO, 0.5);
        assert_eq!(mid, Offset::new(0.0, 15.0));
    }
}

use serde::{Deserialize, Serialize};

/// A 2D point in layout coordinates (database units).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: i64,
    pub y: i64,
}

impl Point {
    pub fn new(x: i64, y: i64) -> Self {
        Self { x, y }
    }

    pub fn translate(&self, dx: i64, dy: i64) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
        }
    }

    pub fn distance_to(&self, other: &Point) -> f64 {
        ((self.x - other.x) as f64).hypot((self.y - other.y) as f64)
    }
}

/// An axis-aligned rectangle defined by its lower-left and upper-right corners.
///
/// A rectangle is *valid* iff `ll <= ur` on both axes. The relationship
/// predicates below are total over valid rectangles and never mutate their
/// operands; behavior on degenerate rectangles is unspecified and must be
/// guarded with [`Rect::valid`] at construction time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Rect {
    ll: Point,
    ur: Point,
}

impl Rect {
    pub fn new(x_lo: i64, y_lo: i64, x_hi: i64, y_hi: i64) -> Self {
        Self {
            ll: Point::new(x_lo, y_lo),
            ur: Point::new(x_hi, y_hi),
        }
    }

    pub fn from_points(ll: Point, ur: Point) -> Self {
        Self { ll, ur }
    }

    /// Zero-area rectangle sitting at a single point.
    pub fn from_point(p: Point) -> Self {
        Self { ll: p, ur: p }
    }

    // ── Accessors ────────────────────────────────────────────────────

    pub fn x_lo(&self) -> i64 {
        self.ll.x
    }

    pub fn y_lo(&self) -> i64 {
        self.ll.y
    }

    pub fn x_hi(&self) -> i64 {
        self.ur.x
    }

    pub fn y_hi(&self) -> i64 {
        self.ur.y
    }

    pub fn ll(&self) -> Point {
        self.ll
    }

    pub fn ur(&self) -> Point {
        self.ur
    }

    pub fn x_len(&self) -> i64 {
        self.ur.x - self.ll.x
    }

    pub fn y_len(&self) -> i64 {
        self.ur.y - self.ll.y
    }

    pub fn center(&self) -> Point {
        Point::new((self.ll.x + self.ur.x) / 2, (self.ll.y + self.ur.y) / 2)
    }

    pub fn area(&self) -> i64 {
        self.x_len() * self.y_len()
    }

    /// Half-perimeter wire length of the rectangle.
    pub fn hpwl(&self) -> i64 {
        self.x_len() + self.y_len()
    }

    pub fn valid(&self) -> bool {
        self.ll.x <= self.ur.x && self.ll.y <= self.ur.y
    }

    // ── Mutators ─────────────────────────────────────────────────────

    pub fn set(&mut self, x_lo: i64, y_lo: i64, x_hi: i64, y_hi: i64) {
        self.ll = Point::new(x_lo, y_lo);
        self.ur = Point::new(x_hi, y_hi);
    }

    /// Extend the rectangle to cover the given point.
    pub fn expand_to(&mut self, p: Point) {
        self.ll.x = self.ll.x.min(p.x);
        self.ll.y = self.ll.y.min(p.y);
        self.ur.x = self.ur.x.max(p.x);
        self.ur.y = self.ur.y.max(p.y);
    }

    /// Make this rectangle the bounding box of itself and `other`.
    pub fn union_with(&mut self, other: &Rect) {
        self.ll.x = self.ll.x.min(other.ll.x);
        self.ll.y = self.ll.y.min(other.ll.y);
        self.ur.x = self.ur.x.max(other.ur.x);
        self.ur.y = self.ur.y.max(other.ur.y);
    }

    /// Translate the rectangle by the given origin offset.
    pub fn offset_by(&mut self, origin: Point) {
        self.ll = self.ll.translate(origin.x, origin.y);
        self.ur = self.ur.translate(origin.x, origin.y);
    }

    /// The rectangle translated by the given origin offset.
    pub fn offset_rect(&self, origin: Point) -> Rect {
        let mut r = *self;
        r.offset_by(origin);
        r
    }

    /// Grow each side outward by `dis` (negative values shrink).
    pub fn enlarge_by(&mut self, dis: i64) {
        self.ll.x -= dis;
        self.ll.y -= dis;
        self.ur.x += dis;
        self.ur.y += dis;
    }

    // ── Relationship predicates ──────────────────────────────────────

    pub fn contains(&self, x: i64, y: i64) -> bool {
        x >= self.ll.x && x <= self.ur.x && y >= self.ll.y && y <= self.ur.y
    }

    pub fn contains_point(&self, p: &Point) -> bool {
        self.contains(p.x, p.y)
    }

    pub fn contains_rect(&self, other: &Rect) -> bool {
        self.ll.x <= other.ll.x
            && self.ll.y <= other.ll.y
            && self.ur.x >= other.ur.x
            && self.ur.y >= other.ur.y
    }

    /// Whether this rectangle contains both corners of `other`.
    pub fn covers(&self, other: &Rect) -> bool {
        self.contains_point(&other.ll) && self.contains_point(&other.ur)
    }

    /// Whether the interiors of the two rectangles share positive area.
    /// Touching edges do not count.
    pub fn overlap(&self, other: &Rect) -> bool {
        if self.ll.x >= other.ur.x || other.ll.x >= self.ur.x {
            return false;
        }
        if self.ll.y >= other.ur.y || other.ll.y >= self.ur.y {
            return false;
        }
        true
    }

    /// Whether the two rectangles share at least a boundary. Touching
    /// edges count.
    pub fn intersect(&self, other: &Rect) -> bool {
        if self.ll.x > other.ur.x || other.ll.x > self.ur.x {
            return false;
        }
        if self.ll.y > other.ur.y || other.ll.y > self.ur.y {
            return false;
        }
        true
    }

    /// Whether the two rectangles face each other along exactly one axis
    /// with a positive-length run along the other axis.
    pub fn parallel_overlap(&self, other: &Rect) -> bool {
        if self.x_lo() >= other.x_hi() || other.x_lo() >= self.x_hi() {
            if self.y_lo() < other.y_hi() && other.y_lo() < self.y_hi() {
                return true;
            }
        }
        if self.y_lo() >= other.y_hi() || other.y_lo() >= self.y_hi() {
            if self.x_lo() < other.x_hi() && other.x_lo() < self.x_hi() {
                return true;
            }
        }
        false
    }

    /// Length of the shared facing run between the two rectangles, 0 if
    /// they are not facing.
    pub fn parallel_run(&self, other: &Rect) -> i64 {
        if self.x_lo() >= other.x_hi() || other.x_lo() >= self.x_hi() {
            if self.y_lo() < other.y_hi() && other.y_lo() < self.y_hi() {
                return self.y_hi().min(other.y_hi()) - self.y_lo().max(other.y_lo());
            }
        }
        if self.y_lo() >= other.y_hi() || other.y_lo() >= self.y_hi() {
            if self.x_lo() < other.x_hi() && other.x_lo() < self.x_hi() {
                return self.x_hi().min(other.x_hi()) - self.x_lo().max(other.x_lo());
            }
        }
        0
    }

    /// Spacing between the two rectangles: the perpendicular gap between
    /// the nearer edges when facing in a parallel run, the Euclidean
    /// corner distance (truncated to database units) when diagonally
    /// disjoint, and 0 when they overlap or touch.
    pub fn spacing(&self, other: &Rect) -> i64 {
        if self.x_lo() >= other.x_hi() || other.x_lo() >= self.x_hi() {
            if self.y_lo() < other.y_hi() && other.y_lo() < self.y_hi() {
                return self.x_lo().max(other.x_lo()) - self.x_hi().min(other.x_hi());
            }
            // No parallel run and the shapes are disjoint: count the
            // spacing as the distance between the nearest corners.
            let x_dif = (self.x_hi().min(other.x_hi()) - self.x_lo().max(other.x_lo())) as f64;
            let y_dif = (self.y_hi().min(other.y_hi()) - self.y_lo().max(other.y_lo())) as f64;
            return x_dif.hypot(y_dif) as i64;
        }
        if self.y_lo() >= other.y_hi() || other.y_lo() >= self.y_hi() {
            if self.x_lo() < other.x_hi() && other.x_lo() < self.x_hi() {
                return self.y_lo().max(other.y_lo()) - self.y_hi().min(other.y_hi());
            }
        }
        // Overlap
        0
    }

    /// The extents of both rectangles along the facing axis when they face
    /// in a parallel run, `(0, 0)` otherwise.
    pub fn facing_widths(&self, other: &Rect) -> (i64, i64) {
        if self.x_lo() >= other.x_hi() || other.x_lo() >= self.x_hi() {
            if self.y_lo() < other.y_hi() && other.y_lo() < self.y_hi() {
                return (self.x_len(), other.x_len());
            }
        }
        if self.y_lo() >= other.y_hi() || other.y_lo() >= self.y_hi() {
            if self.x_lo() < other.x_hi() && other.x_lo() < self.x_hi() {
                return (self.y_len(), other.y_len());
            }
        }
        (0, 0)
    }

    /// Whether the geometric union of the two rectangles is itself exactly
    /// one rectangle: one covers the other, or they span the same interval
    /// on one axis and abut or overlap on the other.
    pub fn union_is_rect(&self, other: &Rect) -> bool {
        if self.covers(other) || other.covers(self) {
            return true;
        }
        if self.x_lo() == other.x_lo() && self.x_hi() == other.x_hi() {
            if self.y_lo() <= other.y_hi() && other.y_lo() <= self.y_hi() {
                return true;
            }
        }
        if self.y_lo() == other.y_lo() && self.y_hi() == other.y_hi() {
            if self.x_lo() <= other.x_hi() && other.x_lo() <= self.x_hi() {
                return true;
            }
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_point_distance() {
        let a = Point::new(0, 0);
        let b = Point::new(3, 4);
        assert!((a.distance_to(&b) - 5.0).abs() < 1e-10);
    }

    #[test]
    fn test_rect_contains_own_corners() {
        let r = Rect::new(-5, 2, 17, 9);
        assert!(r.contains_point(&r.ll()));
        assert!(r.contains_point(&r.ur()));
        assert!(r.overlap(&r));
        assert!(r.valid());
    }

    #[test]
    fn test_degenerate_rect_invalid() {
        let r = Rect::new(4, 0, 2, 1);
        assert!(!r.valid());
    }

    #[test]
    fn test_overlap_implies_intersect() {
        let a = Rect::new(0, 0, 10, 10);
        let b = Rect::new(5, 5, 15, 15);
        assert!(a.overlap(&b));
        assert!(a.intersect(&b));
    }

    #[test]
    fn test_edge_touch_intersects_without_overlap() {
        let a = Rect::new(0, 0, 2, 2);
        let b = Rect::new(2, 0, 4, 2);
        assert!(a.intersect(&b));
        assert!(!a.overlap(&b));
        assert_eq!(a.spacing(&b), 0);
    }

    #[test]
    fn test_spacing_zero_when_overlapping() {
        let a = Rect::new(0, 0, 10, 10);
        let b = Rect::new(5, 5, 15, 15);
        assert_eq!(a.spacing(&b), 0);
    }

    #[test]
    fn test_spacing_parallel_gap() {
        let a = Rect::new(0, 0, 2, 10);
        let b = Rect::new(5, 3, 8, 7);
        assert!(a.parallel_overlap(&b));
        assert_eq!(a.spacing(&b), 3);
        assert_eq!(b.spacing(&a), 3);
        assert_eq!(a.parallel_run(&b), 4);
    }

    #[test]
    fn test_spacing_diagonal_corner_distance() {
        let a = Rect::new(0, 0, 1, 1);
        let b = Rect::new(4, 5, 6, 7);
        assert!(!a.parallel_overlap(&b));
        // Nearest corners are (1, 1) and (4, 5).
        assert_eq!(a.spacing(&b), 5);
    }

    #[test]
    fn test_union_with_commutative_idempotent() {
        let a = Rect::new(0, 0, 4, 4);
        let b = Rect::new(2, -3, 9, 1);

        let mut ab = a;
        ab.union_with(&b);
        let mut ba = b;
        ba.union_with(&a);
        assert_eq!(ab, ba);

        let before = ab;
        ab.union_with(&b);
        assert_eq!(ab, before);

        assert!(ab.covers(&a));
        assert!(ab.covers(&b));
    }

    #[test]
    fn test_expand_to_point() {
        let mut r = Rect::new(0, 0, 2, 2);
        r.expand_to(Point::new(5, -1));
        assert_eq!(r, Rect::new(0, -1, 5, 2));
    }

    #[test]
    fn test_facing_widths() {
        // Horizontally facing: widths are the x extents.
        let a = Rect::new(0, 0, 2, 10);
        let b = Rect::new(5, 3, 8, 7);
        assert_eq!(a.facing_widths(&b), (2, 3));

        // Vertically facing: widths are the y extents.
        let c = Rect::new(0, 0, 10, 2);
        let d = Rect::new(3, 5, 7, 9);
        assert_eq!(c.facing_widths(&d), (2, 4));

        // Diagonally disjoint: no facing run.
        let e = Rect::new(0, 0, 1, 1);
        let f = Rect::new(4, 5, 6, 7);
        assert_eq!(e.facing_widths(&f), (0, 0));
    }

    #[test]
    fn test_union_is_rect() {
        let a = Rect::new(0, 0, 2, 2);
        // Covered.
        assert!(a.union_is_rect(&Rect::new(0, 0, 1, 1)));
        // Same x span, abutting in y.
        assert!(a.union_is_rect(&Rect::new(0, 2, 2, 5)));
        // Same x span, overlapping in y.
        assert!(a.union_is_rect(&Rect::new(0, 1, 2, 3)));
        // Same y span, abutting in x.
        assert!(a.union_is_rect(&Rect::new(2, 0, 7, 2)));
        // Same x span but separated by a gap.
        assert!(!a.union_is_rect(&Rect::new(0, 3, 2, 5)));
        // Mismatched spans.
        assert!(!a.union_is_rect(&Rect::new(0, 2, 3, 5)));
        // Diagonally disjoint.
        assert!(!a.union_is_rect(&Rect::new(5, 5, 6, 6)));
    }

    #[test]
    fn test_offset_and_enlarge() {
        let mut r = Rect::new(0, 0, 2, 3);
        r.offset_by(Point::new(10, 20));
        assert_eq!(r, Rect::new(10, 20, 12, 23));
        r.enlarge_by(1);
        assert_eq!(r, Rect::new(9, 19, 13, 24));
        assert!(r.valid());
    }

    #[test]
    fn test_cover_and_contain() {
        let outer = Rect::new(0, 0, 10, 10);
        let inner = Rect::new(2, 2, 8, 8);
        assert!(outer.covers(&inner));
        assert!(outer.contains_rect(&inner));
        assert!(!inner.covers(&outer));
        // Inclusive at the boundary.
        assert!(outer.contains(10, 10));
        assert!(!outer.contains(11, 10));
    }
}

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self { x, y, width, height }
    }

    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    pub fn center(&self) -> (f64, f64) {
        (self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    /// Half-open on the far edges, so adjacent rects do not contain the
    /// same point.
    pub fn contains(&self, px: f64, py: f64) -> bool {
        px >= self.x && px < self.right() && py >= self.y && py < self.bottom()
    }

    pub fn intersects(&self, other: &Rect) -> bool {
        self.x < other.right() && other.x < self.right() && self.y < other.bottom() && other.y < self.bottom()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Shape {
    #[default]
    Rectangle,
    Oval,
}

/// A shape placed at concrete bounds; what collision tests operate on.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CollideBox {
    pub shape: Shape,
    pub bounds: Rect,
}

impl CollideBox {
    pub fn new(shape: Shape, bounds: Rect) -> Self {
        Self { shape, bounds }
    }

    pub fn collides(&self, other: &CollideBox) -> bool {
        match (self.shape, other.shape) {
            (Shape::Rectangle, Shape::Rectangle) => self.bounds.intersects(&other.bounds),
            (Shape::Rectangle, Shape::Oval) => rect_oval(&self.bounds, &other.bounds),
            (Shape::Oval, Shape::Rectangle) => rect_oval(&other.bounds, &self.bounds),
            (Shape::Oval, Shape::Oval) => oval_oval(&self.bounds, &other.bounds),
        }
    }
}

fn oval_contains(oval: &Rect, px: f64, py: f64) -> bool {
    let (cx, cy) = oval.center();
    let rx = oval.width / 2.0;
    let ry = oval.height / 2.0;
    if rx <= 0.0 || ry <= 0.0 {
        return false;
    }
    let dx = (px - cx) / rx;
    let dy = (py - cy) / ry;
    dx * dx + dy * dy <= 1.0
}

// Nearest point of the rect to the oval center, tested against the oval.
fn rect_oval(rect: &Rect, oval: &Rect) -> bool {
    if !rect.intersects(oval) {
        return false;
    }
    let (cx, cy) = oval.center();
    let nx = cx.clamp(rect.x, rect.right());
    let ny = cy.clamp(rect.y, rect.bottom());
    oval_contains(oval, nx, ny)
}

// Exact for circles, a bounding approximation for other ellipses.
fn oval_oval(a: &Rect, b: &Rect) -> bool {
    if !a.intersects(b) {
        return false;
    }
    let (ax, ay) = a.center();
    let (bx, by) = b.center();
    let rx = (a.width + b.width) / 2.0;
    let ry = (a.height + b.height) / 2.0;
    let dx = (ax - bx) / rx;
    let dy = (ay - by) / ry;
    dx * dx + dy * dy < 1.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rect(x: f64, y: f64, w: f64, h: f64) -> CollideBox {
        CollideBox::new(Shape::Rectangle, Rect::new(x, y, w, h))
    }

    fn oval(x: f64, y: f64, w: f64, h: f64) -> CollideBox {
        CollideBox::new(Shape::Oval, Rect::new(x, y, w, h))
    }

    #[test]
    fn rectangles_overlap_on_both_axes() {
        assert!(rect(0.0, 0.0, 10.0, 10.0).collides(&rect(5.0, 5.0, 10.0, 10.0)));
        assert!(!rect(0.0, 0.0, 10.0, 10.0).collides(&rect(10.0, 0.0, 10.0, 10.0)));
        assert!(!rect(0.0, 0.0, 10.0, 10.0).collides(&rect(5.0, 20.0, 10.0, 10.0)));
    }

    #[test]
    fn oval_misses_rect_corner() {
        // bounding boxes overlap only in the oval's empty corner
        let circle = oval(0.0, 0.0, 10.0, 10.0);
        let corner = rect(9.0, 9.0, 5.0, 5.0);
        assert!(!circle.collides(&corner));
        assert!(!corner.collides(&circle));
        assert!(circle.collides(&rect(4.0, 8.0, 2.0, 5.0)));
    }

    #[test]
    fn circles_touching_centers_closer_than_radii() {
        assert!(oval(0.0, 0.0, 10.0, 10.0).collides(&oval(8.0, 0.0, 10.0, 10.0)));
        assert!(!oval(0.0, 0.0, 10.0, 10.0).collides(&oval(8.0, 8.0, 10.0, 10.0)));
    }

    #[test]
    fn contains_is_half_open() {
        let r = Rect::new(0.0, 0.0, 10.0, 10.0);
        assert!(r.contains(0.0, 0.0));
        assert!(r.contains(9.9, 9.9));
        assert!(!r.contains(10.0, 5.0));
    }
}

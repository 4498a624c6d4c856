//! Small 2D helpers for the physics games.

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

impl Rect {
    pub fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self { x, y, w, h }
    }

    /// Rect of side `2r` centred on a point
    pub fn around(cx: f32, cy: f32, r: f32) -> Self {
        Self::new(cx - r, cy - r, r * 2.0, r * 2.0)
    }

    pub fn intersects(&self, o: &Rect) -> bool {
        self.x < o.x + o.w && self.x + self.w > o.x && self.y < o.y + o.h && self.y + self.h > o.y
    }

    pub fn contains(&self, px: f32, py: f32) -> bool {
        px >= self.x && px <= self.x + self.w && py >= self.y && py <= self.y + self.h
    }

    pub fn center(&self) -> (f32, f32) {
        (self.x + self.w / 2.0, self.y + self.h / 2.0)
    }
}

/// Axis along which a collision should be resolved.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Side {
    /// Hit a left or right face: flip horizontal velocity
    Horizontal,
    /// Hit a top or bottom face: flip vertical velocity
    Vertical,
}

/// The axis with the smaller penetration depth wins.
pub fn min_overlap_side(ball: &Rect, brick: &Rect) -> Side {
    let overlap_left = ball.x + ball.w - brick.x;
    let overlap_right = brick.x + brick.w - ball.x;
    let overlap_top = ball.y + ball.h - brick.y;
    let overlap_bottom = brick.y + brick.h - ball.y;
    let min_x = overlap_left.min(overlap_right);
    let min_y = overlap_top.min(overlap_bottom);
    if min_x < min_y {
        Side::Horizontal
    } else {
        Side::Vertical
    }
}

pub fn circle_rect_hit(cx: f32, cy: f32, r: f32, rect: &Rect) -> bool {
    let nx = cx.clamp(rect.x, rect.x + rect.w);
    let ny = cy.clamp(rect.y, rect.y + rect.h);
    let (dx, dy) = (cx - nx, cy - ny);
    dx * dx + dy * dy <= r * r
}

pub fn dist(ax: f32, ay: f32, bx: f32, by: f32) -> f32 {
    ((ax - bx).powi(2) + (ay - by).powi(2)).sqrt()
}

/// Wrap `v` into `[0, max)`
pub fn wrap(v: f32, max: f32) -> f32 {
    if v < 0.0 {
        v + max
    } else if v >= max {
        v - max
    } else {
        v
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_side_hit_from_left() {
        let brick = Rect::new(100.0, 100.0, 60.0, 20.0);
        // Ball just entering the left face, vertically centred
        let ball = Rect::new(86.0, 102.0, 16.0, 16.0);
        assert_eq!(min_overlap_side(&ball, &brick), Side::Horizontal);
    }

    #[test]
    fn test_side_hit_from_below() {
        let brick = Rect::new(100.0, 100.0, 60.0, 20.0);
        let ball = Rect::new(120.0, 117.0, 16.0, 16.0);
        assert_eq!(min_overlap_side(&ball, &brick), Side::Vertical);
    }

    #[test]
    fn test_circle_rect() {
        let r = Rect::new(0.0, 0.0, 10.0, 10.0);
        assert!(circle_rect_hit(12.0, 5.0, 3.0, &r));
        assert!(!circle_rect_hit(14.0, 14.0, 3.0, &r));
    }

    #[test]
    fn test_wrap() {
        assert_eq!(wrap(-5.0, 800.0), 795.0);
        assert_eq!(wrap(805.0, 800.0), 5.0);
        assert_eq!(wrap(400.0, 800.0), 400.0);
    }
}

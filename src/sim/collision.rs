//! Collision predicates for axis-aligned geometry
//!
//! Everything here is pure: rectangles, circles and the road/obstacle
//! aggregates built from them. Negative sizes are a caller bug and are not
//! checked.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::consts::{ROAD_BUFFER, TREE_PLACEMENT_FACTOR};

/// An axis-aligned rectangle (top-left origin, y grows downward)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub pos: Vec2,
    pub size: Vec2,
}

impl Rect {
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            pos: Vec2::new(x, y),
            size: Vec2::new(width, height),
        }
    }

    pub fn from_pos_size(pos: Vec2, size: Vec2) -> Self {
        Self { pos, size }
    }

    #[inline]
    pub fn min(&self) -> Vec2 {
        self.pos
    }

    #[inline]
    pub fn max(&self) -> Vec2 {
        self.pos + self.size
    }

    #[inline]
    pub fn center(&self) -> Vec2 {
        self.pos + self.size * 0.5
    }

    /// Grow (or shrink, with a negative margin) on every side
    pub fn expand(&self, margin: f32) -> Self {
        Self {
            pos: self.pos - Vec2::splat(margin),
            size: self.size + Vec2::splat(margin * 2.0),
        }
    }

    /// Shrink by independent margins per axis
    pub fn shrink(&self, margin_x: f32, margin_y: f32) -> Self {
        let margin = Vec2::new(margin_x, margin_y);
        Self {
            pos: self.pos + margin,
            size: self.size - margin * 2.0,
        }
    }

    /// A square of `size` centered on `center`
    pub fn centered(center: Vec2, size: f32) -> Self {
        Self {
            pos: center - Vec2::splat(size * 0.5),
            size: Vec2::splat(size),
        }
    }
}

/// A circle used for tree collision
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Circle {
    pub center: Vec2,
    pub radius: f32,
}

/// True iff the open intervals overlap on both axes (touching edges miss)
#[inline]
pub fn rect_overlap(a: &Rect, b: &Rect) -> bool {
    a.pos.x < b.pos.x + b.size.x
        && a.pos.x + a.size.x > b.pos.x
        && a.pos.y < b.pos.y + b.size.y
        && a.pos.y + a.size.y > b.pos.y
}

/// Clamp the circle center into the rectangle and compare squared distances
pub fn circle_rect_overlap(circle: &Circle, rect: &Rect) -> bool {
    let closest = circle.center.clamp(rect.min(), rect.max());
    circle.center.distance_squared(closest) < circle.radius * circle.radius
}

/// True iff the rectangle touches any road grown by the road buffer
pub fn is_on_road(rect: &Rect, roads: &[Rect]) -> bool {
    roads
        .iter()
        .any(|road| rect_overlap(rect, &road.expand(ROAD_BUFFER)))
}

/// Circle a tree occupies for placement purposes
///
/// `origin` is the tree's top-left corner; its sprite spans `2 * size`.
#[inline]
pub fn tree_circle(origin: Vec2, size: f32, factor: f32) -> Circle {
    Circle {
        center: origin + Vec2::splat(size),
        radius: size * factor,
    }
}

/// True iff the rectangle overlaps any building or any tree's placement circle
pub fn collides_with_obstacles<'a>(
    rect: &Rect,
    buildings: impl IntoIterator<Item = &'a Rect>,
    trees: impl IntoIterator<Item = (Vec2, f32)>,
) -> bool {
    if buildings.into_iter().any(|b| rect_overlap(rect, b)) {
        return true;
    }
    trees.into_iter().any(|(origin, size)| {
        circle_rect_overlap(&tree_circle(origin, size, TREE_PLACEMENT_FACTOR), rect)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_rect_overlap_basic() {
        let a = Rect::new(0.0, 0.0, 10.0, 10.0);
        let b = Rect::new(5.0, 5.0, 10.0, 10.0);
        assert!(rect_overlap(&a, &b));
        assert!(rect_overlap(&b, &a));

        let far = Rect::new(50.0, 50.0, 10.0, 10.0);
        assert!(!rect_overlap(&a, &far));
    }

    #[test]
    fn test_touching_edges_do_not_overlap() {
        let a = Rect::new(0.0, 0.0, 10.0, 10.0);
        let right = Rect::new(10.0, 0.0, 10.0, 10.0);
        let below = Rect::new(0.0, 10.0, 10.0, 10.0);
        assert!(!rect_overlap(&a, &right));
        assert!(!rect_overlap(&a, &below));
    }

    #[test]
    fn test_circle_rect_overlap() {
        let rect = Rect::new(0.0, 0.0, 10.0, 10.0);

        // Center inside
        let inside = Circle { center: Vec2::new(5.0, 5.0), radius: 1.0 };
        assert!(circle_rect_overlap(&inside, &rect));

        // Nearest point is the corner (10, 10), distance sqrt(2) ~ 1.41
        let corner_hit = Circle { center: Vec2::new(11.0, 11.0), radius: 1.5 };
        assert!(circle_rect_overlap(&corner_hit, &rect));
        let corner_miss = Circle { center: Vec2::new(11.0, 11.0), radius: 1.4 };
        assert!(!circle_rect_overlap(&corner_miss, &rect));

        // Exactly tangent is not an overlap
        let tangent = Circle { center: Vec2::new(15.0, 5.0), radius: 5.0 };
        assert!(!circle_rect_overlap(&tangent, &rect));
    }

    #[test]
    fn test_is_on_road_uses_buffer() {
        let roads = [Rect::new(100.0, 0.0, 100.0, 1000.0)];

        // Ends 5px left of the road: inside the 10px buffer
        let near = Rect::new(50.0, 50.0, 45.0, 10.0);
        assert!(is_on_road(&near, &roads));

        // Ends exactly at the buffer edge
        let at_edge = Rect::new(50.0, 50.0, 40.0, 10.0);
        assert!(!is_on_road(&at_edge, &roads));

        assert!(!is_on_road(&near, &[]));
    }

    #[test]
    fn test_collides_with_obstacles() {
        let buildings = [Rect::new(100.0, 100.0, 50.0, 50.0)];
        // Tree at origin (300, 300), size 20 -> circle center (320, 320), radius 16
        let trees = [(Vec2::new(300.0, 300.0), 20.0)];

        let on_building = Rect::new(120.0, 120.0, 5.0, 5.0);
        assert!(collides_with_obstacles(&on_building, &buildings, trees));

        let near_tree = Rect::new(330.0, 318.0, 4.0, 4.0);
        assert!(collides_with_obstacles(&near_tree, &buildings, trees));

        // Inside the tree sprite box but outside its circle
        let sprite_corner = Rect::new(301.0, 301.0, 3.0, 3.0);
        assert!(!collides_with_obstacles(&sprite_corner, &buildings, trees));
    }

    proptest! {
        #[test]
        fn prop_rect_overlap_symmetric(
            ax in -500.0f32..500.0, ay in -500.0f32..500.0,
            aw in 0.0f32..200.0, ah in 0.0f32..200.0,
            bx in -500.0f32..500.0, by in -500.0f32..500.0,
            bw in 0.0f32..200.0, bh in 0.0f32..200.0,
        ) {
            let a = Rect::new(ax, ay, aw, ah);
            let b = Rect::new(bx, by, bw, bh);
            prop_assert_eq!(rect_overlap(&a, &b), rect_overlap(&b, &a));
        }

        #[test]
        fn prop_circle_containing_rect_center_overlaps(
            x in -500.0f32..500.0, y in -500.0f32..500.0,
            w in 1.0f32..200.0, h in 1.0f32..200.0,
            r in 0.5f32..50.0,
        ) {
            let rect = Rect::new(x, y, w, h);
            let circle = Circle { center: rect.center(), radius: r };
            prop_assert!(circle_rect_overlap(&circle, &rect));
        }
    }
}

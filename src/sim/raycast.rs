//! Grid raycasting
//!
//! Supercover DDA that steps a ray across tile boundaries in crossing order
//! and reports the first solid cell. Solidity is supplied as a predicate so
//! the same walk serves the tile grid, the land solidity map, and the
//! amphibian solidity map.

use glam::{IVec2, Vec2};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RaycastResult {
    pub did_impact: bool,
    pub impact_distance: f32,
    pub impact_position: Vec2,
    pub impact_normal: Vec2,
}

impl RaycastResult {
    fn miss(start: Vec2, direction: Vec2, max_distance: f32) -> Self {
        Self {
            did_impact: false,
            impact_distance: max_distance,
            impact_position: start + direction * max_distance,
            impact_normal: -direction,
        }
    }
}

/// Cast a ray from `start` along normalized `direction` for up to
/// `max_distance` world units against a `dims.x` by `dims.y` grid of unit
/// tiles. `is_solid` is only queried for in-bounds cells; the ray passes
/// freely through everything outside the grid.
///
/// A zero or negative `max_distance` never impacts. A `start` inside a solid
/// cell impacts immediately at distance zero with the normal opposing the ray.
pub fn raycast_vs_grid(
    start: Vec2,
    direction: Vec2,
    max_distance: f32,
    dims: IVec2,
    is_solid: impl Fn(IVec2) -> bool,
) -> RaycastResult {
    if max_distance <= 0.0 {
        return RaycastResult::miss(start, direction, max_distance.max(0.0));
    }

    let in_bounds =
        |coords: IVec2| coords.x >= 0 && coords.y >= 0 && coords.x < dims.x && coords.y < dims.y;
    let solid = |coords: IVec2| in_bounds(coords) && is_solid(coords);

    let mut tile = IVec2::new(start.x.floor() as i32, start.y.floor() as i32);
    if solid(tile) {
        return RaycastResult {
            did_impact: true,
            impact_distance: 0.0,
            impact_position: start,
            impact_normal: -direction,
        };
    }

    let tile_step_x: i32 = if direction.x > 0.0 { 1 } else { -1 };
    let tile_step_y: i32 = if direction.y > 0.0 { 1 } else { -1 };

    // An axis with zero direction never crosses a gridline; pin its next
    // crossing past any reachable distance so the live axis always wins the
    // comparison. Computing it as 0 * (1/0) would poison the walk with NaN
    // when the start sits exactly on a gridline of the dead axis.
    let (dist_per_x_crossing, mut dist_at_next_x_crossing) = if direction.x == 0.0 {
        (f32::MAX, f32::MAX)
    } else {
        let per_crossing = 1.0 / direction.x.abs();
        let leading_edge = tile.x + (tile_step_x + 1) / 2;
        (
            per_crossing,
            (leading_edge as f32 - start.x).abs() * per_crossing,
        )
    };
    let (dist_per_y_crossing, mut dist_at_next_y_crossing) = if direction.y == 0.0 {
        (f32::MAX, f32::MAX)
    } else {
        let per_crossing = 1.0 / direction.y.abs();
        let leading_edge = tile.y + (tile_step_y + 1) / 2;
        (
            per_crossing,
            (leading_edge as f32 - start.y).abs() * per_crossing,
        )
    };

    loop {
        if dist_at_next_x_crossing <= dist_at_next_y_crossing {
            if dist_at_next_x_crossing > max_distance {
                return RaycastResult::miss(start, direction, max_distance);
            }
            tile.x += tile_step_x;
            if solid(tile) {
                return RaycastResult {
                    did_impact: true,
                    impact_distance: dist_at_next_x_crossing,
                    impact_position: start + direction * dist_at_next_x_crossing,
                    impact_normal: Vec2::new(-tile_step_x as f32, 0.0),
                };
            }
            dist_at_next_x_crossing += dist_per_x_crossing;
        } else {
            if dist_at_next_y_crossing > max_distance {
                return RaycastResult::miss(start, direction, max_distance);
            }
            tile.y += tile_step_y;
            if solid(tile) {
                return RaycastResult {
                    did_impact: true,
                    impact_distance: dist_at_next_y_crossing,
                    impact_position: start + direction * dist_at_next_y_crossing,
                    impact_normal: Vec2::new(0.0, -tile_step_y as f32),
                };
            }
            dist_at_next_y_crossing += dist_per_y_crossing;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DIMS: IVec2 = IVec2::new(8, 8);

    /// Single solid column at x == 4.
    fn wall_at_x4(coords: IVec2) -> bool {
        coords.x == 4
    }

    #[test]
    fn test_hits_wall_with_facing_normal() {
        let result = raycast_vs_grid(
            Vec2::new(1.5, 2.5),
            Vec2::new(1.0, 0.0),
            10.0,
            DIMS,
            wall_at_x4,
        );
        assert!(result.did_impact);
        assert!((result.impact_distance - 2.5).abs() < 1e-5);
        assert_eq!(result.impact_normal, Vec2::new(-1.0, 0.0));
        assert!((result.impact_position.x - 4.0).abs() < 1e-5);
    }

    #[test]
    fn test_miss_when_wall_beyond_max_distance() {
        let result = raycast_vs_grid(
            Vec2::new(1.5, 2.5),
            Vec2::new(1.0, 0.0),
            2.0,
            DIMS,
            wall_at_x4,
        );
        assert!(!result.did_impact);
        assert_eq!(result.impact_distance, 2.0);
    }

    #[test]
    fn test_zero_distance_never_impacts() {
        let result = raycast_vs_grid(
            Vec2::new(4.5, 2.5),
            Vec2::new(1.0, 0.0),
            0.0,
            DIMS,
            wall_at_x4,
        );
        assert!(!result.did_impact);
    }

    #[test]
    fn test_start_inside_solid_impacts_at_zero() {
        let start = Vec2::new(4.5, 2.5);
        let direction = Vec2::new(0.0, 1.0);
        let result = raycast_vs_grid(start, direction, 5.0, DIMS, wall_at_x4);
        assert!(result.did_impact);
        assert_eq!(result.impact_distance, 0.0);
        assert_eq!(result.impact_position, start);
        assert_eq!(result.impact_normal, -direction);
    }

    #[test]
    fn test_horizontal_ray_starting_on_gridline_terminates() {
        // Start exactly on a horizontal gridline; the dead y axis must never
        // win a crossing.
        let result = raycast_vs_grid(
            Vec2::new(0.5, 3.0),
            Vec2::new(1.0, 0.0),
            6.0,
            DIMS,
            |_| false,
        );
        assert!(!result.did_impact);

        let hit = raycast_vs_grid(
            Vec2::new(0.5, 3.0),
            Vec2::new(1.0, 0.0),
            6.0,
            DIMS,
            wall_at_x4,
        );
        assert!(hit.did_impact);
        assert!((hit.impact_distance - 3.5).abs() < 1e-5);
    }

    #[test]
    fn test_vertical_ray_starting_on_gridline_terminates() {
        let result = raycast_vs_grid(
            Vec2::new(3.0, 0.5),
            Vec2::new(0.0, 1.0),
            6.0,
            DIMS,
            |_| false,
        );
        assert!(!result.did_impact);
    }

    #[test]
    fn test_passes_outside_grid() {
        // Ray entirely below the grid never consults the predicate.
        let result = raycast_vs_grid(
            Vec2::new(0.5, -3.0),
            Vec2::new(1.0, 0.0),
            6.0,
            DIMS,
            |_| true,
        );
        assert!(!result.did_impact);
    }

    #[test]
    fn test_diagonal_ray_reports_axis_normal() {
        let direction = Vec2::new(1.0, 1.0).normalize();
        let result = raycast_vs_grid(Vec2::new(1.5, 1.5), direction, 10.0, DIMS, wall_at_x4);
        assert!(result.did_impact);
        // First solid crossing is the vertical face of the x == 4 column.
        assert_eq!(result.impact_normal, Vec2::new(-1.0, 0.0));
    }

    #[test]
    fn test_visibility_is_symmetric() {
        let a = Vec2::new(1.5, 6.5);
        let b = Vec2::new(6.5, 1.5);
        let forward = (b - a).normalize();
        let there = raycast_vs_grid(a, forward, a.distance(b), DIMS, wall_at_x4);
        let back = raycast_vs_grid(b, -forward, a.distance(b), DIMS, wall_at_x4);
        assert_eq!(there.did_impact, back.did_impact);
    }
}

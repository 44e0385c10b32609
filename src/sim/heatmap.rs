//! Dense per-tile cost grids ("heat maps")
//!
//! A `TileHeatMap` stores one f32 per grid cell. Distance fields are written
//! by the map's BFS flood fill with a sentinel value marking unreachable
//! cells; solidity maps store 1.0 for passable cells and the sentinel for
//! solid ones, so the same raycast can run against either representation.

use glam::{IVec2, Vec2};

use crate::sim::raycast::{raycast_vs_grid, RaycastResult};

#[derive(Debug, Clone)]
pub struct TileHeatMap {
    dims: IVec2,
    values: Vec<f32>,
}

impl TileHeatMap {
    pub fn new(dims: IVec2, initial_value: f32) -> Self {
        let count = (dims.x.max(0) * dims.y.max(0)) as usize;
        Self {
            dims,
            values: vec![initial_value; count],
        }
    }

    pub fn dims(&self) -> IVec2 {
        self.dims
    }

    pub fn in_bounds(&self, coords: IVec2) -> bool {
        coords.x >= 0 && coords.y >= 0 && coords.x < self.dims.x && coords.y < self.dims.y
    }

    fn index(&self, coords: IVec2) -> usize {
        (coords.x + coords.y * self.dims.x) as usize
    }

    /// Value at `coords`; out-of-bounds reads return infinity so they never
    /// look like a reachable cell.
    pub fn value_at(&self, coords: IVec2) -> f32 {
        if !self.in_bounds(coords) {
            return f32::INFINITY;
        }
        self.values[self.index(coords)]
    }

    pub fn set_value_at(&mut self, coords: IVec2, value: f32) {
        if self.in_bounds(coords) {
            let index = self.index(coords);
            self.values[index] = value;
        }
    }

    pub fn set_all_values(&mut self, values: Vec<f32>) {
        debug_assert_eq!(values.len(), self.values.len());
        self.values = values;
    }

    pub fn values(&self) -> &[f32] {
        &self.values
    }

    /// Largest stored value that is not `excluded`; used to scale debug
    /// visualization gradients.
    pub fn max_value_excluding(&self, excluded: f32) -> f32 {
        let mut max_value = 0.0_f32;
        for &value in &self.values {
            if value != excluded && value > max_value {
                max_value = value;
            }
        }
        max_value
    }

    /// Raycast against cells carrying `solid_value`, treating everything else
    /// as open. Used by AI shortcut tests against the land/amphibian solidity
    /// maps.
    pub fn raycast(
        &self,
        start: Vec2,
        direction: Vec2,
        max_distance: f32,
        solid_value: f32,
    ) -> RaycastResult {
        raycast_vs_grid(start, direction, max_distance, self.dims, |coords| {
            self.value_at(coords) == solid_value
        })
    }

    /// Walk the populated field from the cell under `start_pos` down the cost
    /// gradient to the zero cell, returning waypoint tile-centers ordered
    /// goal-first (callers treat `last()` as the next waypoint and pop from
    /// the back as waypoints are consumed).
    ///
    /// Returns an empty path when the start cell carries `unreachable` - the
    /// field was not populated for a goal reachable from here, and callers
    /// must check reachability before pathing.
    pub fn generate_path(&self, start_pos: Vec2, unreachable: f32) -> Vec<Vec2> {
        let start = IVec2::new(start_pos.x.floor() as i32, start_pos.y.floor() as i32);
        if !self.in_bounds(start) || self.value_at(start) == unreachable {
            return Vec::new();
        }

        let mut waypoints = Vec::new();
        let mut current = start;
        let mut current_value = self.value_at(current);

        while current_value > 0.0 {
            let neighbors = [
                current + IVec2::NEG_Y,
                current + IVec2::NEG_X,
                current + IVec2::Y,
                current + IVec2::X,
            ];

            let mut stepped = false;
            for neighbor in neighbors {
                let value = self.value_at(neighbor);
                if value < current_value && value != unreachable {
                    current = neighbor;
                    current_value = value;
                    waypoints.push(tile_center(neighbor));
                    stepped = true;
                    break;
                }
            }

            // A populated field always has a strictly-descending neighbor for
            // every reachable nonzero cell; bail rather than loop if the field
            // is stale.
            if !stepped {
                return Vec::new();
            }
        }

        waypoints.reverse();
        waypoints
    }
}

fn tile_center(coords: IVec2) -> Vec2 {
    Vec2::new(coords.x as f32 + 0.5, coords.y as f32 + 0.5)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 4x1 strip with costs 3,2,1,0 left to right.
    fn strip_field() -> TileHeatMap {
        let mut field = TileHeatMap::new(IVec2::new(4, 1), 999.0);
        for x in 0..4 {
            field.set_value_at(IVec2::new(x, 0), (3 - x) as f32);
        }
        field
    }

    #[test]
    fn test_path_descends_to_goal() {
        let field = strip_field();
        let path = field.generate_path(Vec2::new(0.5, 0.5), 999.0);
        assert_eq!(path.len(), 3);
        // Goal-first ordering: front is the zero cell, back is the next step.
        assert_eq!(path[0], Vec2::new(3.5, 0.5));
        assert_eq!(*path.last().unwrap(), Vec2::new(1.5, 0.5));
    }

    #[test]
    fn test_path_from_goal_cell_is_empty() {
        let field = strip_field();
        let path = field.generate_path(Vec2::new(3.5, 0.5), 999.0);
        assert!(path.is_empty());
    }

    #[test]
    fn test_path_from_unreachable_cell_is_empty() {
        let mut field = strip_field();
        field.set_value_at(IVec2::new(0, 0), 999.0);
        let path = field.generate_path(Vec2::new(0.5, 0.5), 999.0);
        assert!(path.is_empty());
    }

    #[test]
    fn test_out_of_bounds_reads_are_infinite() {
        let field = strip_field();
        assert_eq!(field.value_at(IVec2::new(-1, 0)), f32::INFINITY);
        assert_eq!(field.value_at(IVec2::new(0, 5)), f32::INFINITY);
    }

    #[test]
    fn test_max_value_excluding_sentinel() {
        let mut field = TileHeatMap::new(IVec2::new(2, 2), 999.0);
        field.set_value_at(IVec2::new(0, 0), 0.0);
        field.set_value_at(IVec2::new(1, 0), 7.0);
        assert_eq!(field.max_value_excluding(999.0), 7.0);
    }
}

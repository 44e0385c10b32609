//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Seeded RNG only
//! - Stable slot-indexed entity iteration order
//! - No rendering, audio or platform dependencies

pub mod agent;
pub mod collision;
pub mod entity;
pub mod heatmap;
pub mod map;
pub mod mapgen;
pub mod raycast;
pub mod tile;

pub use collision::{
    do_discs_overlap, push_disc_out_of_fixed_aabb, push_disc_out_of_fixed_disc,
    push_discs_out_of_each_other, reflect,
};
pub use entity::{Entity, EntityId, EntityKind, Faction, PlayerIntent, Weapon};
pub use heatmap::TileHeatMap;
pub use map::{DistanceFieldOptions, HeatMapKind, Map, MapError, SimContext};
pub use mapgen::{MapCatalog, MapDefinition, MapImage, WormConfig};
pub use raycast::{raycast_vs_grid, RaycastResult};
pub use tile::{Rgba8, Tile, TileCatalog, TileTypeDef, TileTypeId};

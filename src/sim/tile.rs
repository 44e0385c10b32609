//! Tile types and the tile-type catalog
//!
//! Tile behavior is data-driven: every grid cell holds a `TileTypeId` into an
//! immutable `TileCatalog` built once by the host, plus the cell's mutable
//! health. Destructible tiles swap to their alternate type when health runs
//! out.

use std::collections::HashMap;

use glam::{IVec2, Vec2};
use serde::{Deserialize, Serialize};

use crate::sim::map::MapError;

/// Byte RGBA color used for tile tints and map-image marker colors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rgba8 {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba8 {
    pub const WHITE: Self = Self::new(255, 255, 255, 255);

    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// RGB equality, ignoring alpha. Map-image texels use alpha as an
    /// inclusion weight, not as part of the marker color.
    pub fn rgb_matches(&self, other: &Rgba8) -> bool {
        self.r == other.r && self.g == other.g && self.b == other.b
    }
}

/// Index of a tile type within its catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TileTypeId(pub u16);

/// Static per-type tile properties, loaded once at startup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TileTypeDef {
    pub name: String,
    pub is_solid: bool,
    pub is_water: bool,
    pub is_destructible: bool,
    pub max_health: i32,
    /// Type this tile becomes when destroyed (destructible tiles only).
    pub alternate_type: Option<String>,
    /// Texture UV rectangle for the renderer.
    pub uv_min: Vec2,
    pub uv_max: Vec2,
    pub tint: Rgba8,
    /// Marker color used to decode image-authored map layouts.
    pub map_color: Option<Rgba8>,
}

impl TileTypeDef {
    /// A plain floor definition with sensible defaults; builder-style setters
    /// below adjust the interesting fields.
    pub fn floor(name: &str) -> Self {
        Self {
            name: name.to_owned(),
            is_solid: false,
            is_water: false,
            is_destructible: false,
            max_health: 1,
            alternate_type: None,
            uv_min: Vec2::ZERO,
            uv_max: Vec2::ONE,
            tint: Rgba8::WHITE,
            map_color: None,
        }
    }

    pub fn solid(mut self) -> Self {
        self.is_solid = true;
        self
    }

    pub fn water(mut self) -> Self {
        self.is_water = true;
        self
    }

    pub fn destructible(mut self, max_health: i32, alternate_type: &str) -> Self {
        self.is_destructible = true;
        self.max_health = max_health;
        self.alternate_type = Some(alternate_type.to_owned());
        self
    }

    pub fn with_map_color(mut self, color: Rgba8) -> Self {
        self.map_color = Some(color);
        self
    }

    pub fn with_tint(mut self, tint: Rgba8) -> Self {
        self.tint = tint;
        self
    }

    pub fn with_uvs(mut self, uv_min: Vec2, uv_max: Vec2) -> Self {
        self.uv_min = uv_min;
        self.uv_max = uv_max;
        self
    }
}

/// Immutable catalog of tile type definitions, keyed by name and by id.
///
/// Built once before any map is constructed; alternate-type references are
/// resolved to ids at build time so tile damage never consults names.
#[derive(Debug, Clone)]
pub struct TileCatalog {
    defs: Vec<TileTypeDef>,
    ids_by_name: HashMap<String, TileTypeId>,
    alternate_ids: Vec<Option<TileTypeId>>,
}

impl TileCatalog {
    pub fn from_defs(defs: Vec<TileTypeDef>) -> Result<Self, MapError> {
        let mut ids_by_name = HashMap::with_capacity(defs.len());
        for (index, def) in defs.iter().enumerate() {
            let _ = ids_by_name.insert(def.name.clone(), TileTypeId(index as u16));
        }

        let mut alternate_ids = Vec::with_capacity(defs.len());
        for def in &defs {
            let alternate = match &def.alternate_type {
                Some(name) => Some(
                    ids_by_name
                        .get(name)
                        .copied()
                        .ok_or_else(|| MapError::UnknownTileType(name.clone()))?,
                ),
                None => None,
            };
            alternate_ids.push(alternate);
        }

        Ok(Self {
            defs,
            ids_by_name,
            alternate_ids,
        })
    }

    pub fn id_by_name(&self, name: &str) -> Result<TileTypeId, MapError> {
        self.ids_by_name
            .get(name)
            .copied()
            .ok_or_else(|| MapError::UnknownTileType(name.to_owned()))
    }

    pub fn def(&self, id: TileTypeId) -> &TileTypeDef {
        &self.defs[id.0 as usize]
    }

    pub fn alternate_id(&self, id: TileTypeId) -> Option<TileTypeId> {
        self.alternate_ids[id.0 as usize]
    }

    /// Tile type whose marker color matches the texel's RGB, if any.
    pub fn id_by_map_color(&self, color: Rgba8) -> Option<TileTypeId> {
        self.defs.iter().position(|def| {
            def.map_color
                .is_some_and(|marker| marker.rgb_matches(&color))
        }).map(|index| TileTypeId(index as u16))
    }
}

/// One grid cell: a type reference plus mutable health.
#[derive(Debug, Clone)]
pub struct Tile {
    pub type_id: TileTypeId,
    pub coords: IVec2,
    pub health: i32,
}

impl Tile {
    pub fn new(type_id: TileTypeId, coords: IVec2, catalog: &TileCatalog) -> Self {
        Self {
            type_id,
            coords,
            health: catalog.def(type_id).max_health,
        }
    }

    /// World-space bounds of this cell (tiles are unit squares).
    pub fn bounds(&self) -> (Vec2, Vec2) {
        let mins = Vec2::new(self.coords.x as f32, self.coords.y as f32);
        (mins, mins + Vec2::ONE)
    }

    /// Apply damage; no-op unless the tile is destructible. Crossing zero
    /// health swaps to the alternate type and resets health to its maximum.
    pub fn take_damage(&mut self, amount: i32, catalog: &TileCatalog) {
        if !catalog.def(self.type_id).is_destructible {
            return;
        }

        self.health -= amount;
        if self.health <= 0 {
            if let Some(alternate) = catalog.alternate_id(self.type_id) {
                self.type_id = alternate;
            }
            self.health = catalog.def(self.type_id).max_health;
        }
    }
}

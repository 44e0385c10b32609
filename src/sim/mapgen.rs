//! Procedural map layout
//!
//! Builds the tile grid for one generation attempt: flood the map with the
//! fill type, carve randomized worms, stamp the protected start and end
//! regions with their bunker walls, wall the border, and mark the entry and
//! exit tiles. An optional color-keyed image overlay can then override tiles
//! probabilistically. Validation and the retry loop live on `Map`.

use std::collections::HashMap;

use glam::IVec2;
use serde::Deserialize;

use crate::config::GameConfig;
use crate::rng::GameRng;
use crate::sim::map::MapError;
use crate::sim::tile::{Rgba8, Tile, TileCatalog};

/// One family of randomized cave-carving walks.
#[derive(Debug, Clone, Deserialize)]
pub struct WormConfig {
    pub tile_type: String,
    pub count: i32,
    pub max_length: i32,
}

/// Declarative recipe for one map flavor. Tile types are referenced by name
/// and resolved against the [`TileCatalog`] when the map is generated.
#[derive(Debug, Clone, Deserialize)]
pub struct MapDefinition {
    pub name: String,
    pub dimensions: IVec2,
    pub fill_tile_type: String,
    pub edge_tile_type: String,
    #[serde(default)]
    pub worms: Vec<WormConfig>,
    pub start_floor_tile_type: String,
    pub start_bunker_tile_type: String,
    pub end_floor_tile_type: String,
    pub end_bunker_tile_type: String,
    pub entry_tile_type: String,
    pub exit_tile_type: String,
    #[serde(default = "default_entry_coords")]
    pub entry_coords: IVec2,
    /// `(1, 1)` means "unset"; generation relocates it to the far corner.
    #[serde(default = "default_entry_coords")]
    pub exit_coords: IVec2,
    #[serde(skip)]
    pub map_image: Option<MapImage>,
    #[serde(default)]
    pub map_image_offset: IVec2,
    #[serde(default)]
    pub scorpio_count: i32,
    #[serde(default)]
    pub leo_count: i32,
    #[serde(default)]
    pub aries_count: i32,
    #[serde(default)]
    pub capricorn_count: i32,
}

fn default_entry_coords() -> IVec2 {
    IVec2::new(1, 1)
}

/// Named map definitions loaded from JSON.
#[derive(Debug, Clone, Default)]
pub struct MapCatalog {
    defs: HashMap<String, MapDefinition>,
}

impl MapCatalog {
    pub fn from_defs(defs: impl IntoIterator<Item = MapDefinition>) -> Self {
        Self {
            defs: defs
                .into_iter()
                .map(|def| (def.name.clone(), def))
                .collect(),
        }
    }

    pub fn from_json(json: &str) -> Result<Self, MapError> {
        let defs: Vec<MapDefinition> =
            serde_json::from_str(json).map_err(MapError::InvalidDefinition)?;
        Ok(Self::from_defs(defs))
    }

    pub fn get(&self, name: &str) -> Result<&MapDefinition, MapError> {
        self.defs
            .get(name)
            .ok_or_else(|| MapError::UnknownMapDefinition(name.to_owned()))
    }
}

/// In-memory texel grid keyed by map color. Each texel's alpha is the
/// per-attempt probability (0..=255) that its tile type is stamped.
#[derive(Debug, Clone)]
pub struct MapImage {
    dims: IVec2,
    texels: Vec<Rgba8>,
}

impl MapImage {
    pub fn new(dims: IVec2, texels: Vec<Rgba8>) -> Self {
        debug_assert_eq!(texels.len(), (dims.x * dims.y) as usize);
        Self { dims, texels }
    }

    pub fn dims(&self) -> IVec2 {
        self.dims
    }

    pub fn texel(&self, coords: IVec2) -> Rgba8 {
        self.texels[(coords.x + coords.y * self.dims.x) as usize]
    }
}

const CARDINAL_STEPS: [IVec2; 4] = [IVec2::Y, IVec2::NEG_Y, IVec2::X, IVec2::NEG_X];

/// Lay out the tile grid for one attempt. Fails only on unresolvable tile
/// type names; layout randomness never fails here.
pub fn populate_tiles(
    def: &MapDefinition,
    catalog: &TileCatalog,
    config: &GameConfig,
    rng: &mut GameRng,
) -> Result<Vec<Tile>, MapError> {
    let dims = def.dimensions;
    let start_area_size = config.get_i32("startAreaSize", 5);
    let end_area_size = config.get_i32("endAreaSize", 6);

    let fill = catalog.id_by_name(&def.fill_tile_type)?;
    let edge = catalog.id_by_name(&def.edge_tile_type)?;
    let start_floor = catalog.id_by_name(&def.start_floor_tile_type)?;
    let start_bunker = catalog.id_by_name(&def.start_bunker_tile_type)?;
    let end_floor = catalog.id_by_name(&def.end_floor_tile_type)?;
    let end_bunker = catalog.id_by_name(&def.end_bunker_tile_type)?;
    let entry = catalog.id_by_name(&def.entry_tile_type)?;
    let exit = catalog.id_by_name(&def.exit_tile_type)?;

    let mut tiles = Vec::with_capacity((dims.x * dims.y) as usize);
    for tile_y in 0..dims.y {
        for tile_x in 0..dims.x {
            tiles.push(Tile::new(fill, IVec2::new(tile_x, tile_y), catalog));
        }
    }

    let mut set_tile = |tiles: &mut Vec<Tile>, coords: IVec2, type_id| {
        let index = (coords.x + coords.y * dims.x) as usize;
        tiles[index] = Tile::new(type_id, coords, catalog);
    };

    for worm_config in &def.worms {
        let worm_type = catalog.id_by_name(&worm_config.tile_type)?;
        for _ in 0..worm_config.count {
            let mut worm_length = worm_config.max_length;
            let mut worm_coords = IVec2::new(
                rng.roll_int_in_range(0, dims.x - 1),
                rng.roll_int_in_range(0, dims.y - 1),
            );
            set_tile(&mut tiles, worm_coords, worm_type);
            worm_length -= 1;
            while worm_length > 0 {
                worm_length -= 1;
                let step = CARDINAL_STEPS[rng.roll_int_in_range(0, 3) as usize];
                worm_coords += step;
                // Steps that wander off the map still consume length.
                if worm_coords.x < 0
                    || worm_coords.x > dims.x - 1
                    || worm_coords.y < 0
                    || worm_coords.y > dims.y - 1
                {
                    continue;
                }
                set_tile(&mut tiles, worm_coords, worm_type);
            }
        }
    }

    for tile_y in 0..start_area_size + 1 {
        for tile_x in 0..start_area_size + 1 {
            set_tile(&mut tiles, IVec2::new(tile_x, tile_y), start_floor);
        }
    }

    for tile_y in (dims.y - end_area_size - 1)..dims.y {
        for tile_x in (dims.x - end_area_size - 1)..dims.x {
            set_tile(&mut tiles, IVec2::new(tile_x, tile_y), end_floor);
        }
    }

    // Start bunker: an L of wall along the region's far row and column, with
    // a gap near the origin corner.
    for tile_y in 0..start_area_size {
        for tile_x in 0..start_area_size {
            let on_far_row = tile_y == start_area_size - 1 && tile_x > 1 && tile_x < start_area_size;
            let on_far_col = tile_x == start_area_size - 1 && tile_y > 1 && tile_y < start_area_size;
            if on_far_row || on_far_col {
                set_tile(&mut tiles, IVec2::new(tile_x, tile_y), start_bunker);
            }
        }
    }

    // End bunker: mirrored L around the exit corner, leaving a gap aligned
    // with the exit tile.
    for tile_y in (dims.y - end_area_size - 1)..dims.y {
        for tile_x in (dims.x - end_area_size - 1)..dims.x {
            let on_near_row = tile_y == dims.y - end_area_size
                && dims.x - tile_x < end_area_size + 1
                && tile_x != dims.x - 2;
            let on_near_col = tile_x == dims.x - end_area_size
                && dims.y - tile_y < end_area_size
                && tile_y != dims.y - 2;
            if on_near_row || on_near_col {
                set_tile(&mut tiles, IVec2::new(tile_x, tile_y), end_bunker);
            }
        }
    }

    for tile_y in 0..dims.y {
        for tile_x in 0..dims.x {
            if tile_x == 0 || tile_x == dims.x - 1 || tile_y == 0 || tile_y == dims.y - 1 {
                set_tile(&mut tiles, IVec2::new(tile_x, tile_y), edge);
            }
        }
    }

    set_tile(&mut tiles, def.entry_coords, entry);
    set_tile(&mut tiles, def.exit_coords, exit);

    if let Some(image) = &def.map_image {
        apply_map_image(&mut tiles, def, image, catalog, rng)?;
    }

    Ok(tiles)
}

/// Overlay the color-keyed image onto already-populated tiles. Every opaque
/// texel must match some tile type's map color; the alpha channel rolls
/// independently per texel per attempt.
fn apply_map_image(
    tiles: &mut [Tile],
    def: &MapDefinition,
    image: &MapImage,
    catalog: &TileCatalog,
    rng: &mut GameRng,
) -> Result<(), MapError> {
    let dims = def.dimensions;
    let offset = def.map_image_offset;

    for tile_y in offset.y..dims.y {
        for tile_x in offset.x..dims.x {
            let texel_coords = IVec2::new(tile_x, tile_y) - offset;
            if texel_coords.x >= image.dims().x || texel_coords.y >= image.dims().y {
                continue;
            }
            let texel = image.texel(texel_coords);
            if texel.a == 0 {
                continue;
            }
            let Some(type_id) = catalog.id_by_map_color(texel) else {
                return Err(MapError::NoTileTypeForColor {
                    map_name: def.name.clone(),
                    coords: IVec2::new(tile_x, tile_y),
                });
            };
            if rng.roll_int_in_range(0, 254) < texel.a as i32 {
                let coords = IVec2::new(tile_x, tile_y);
                let index = (coords.x + coords.y * dims.x) as usize;
                tiles[index] = Tile::new(type_id, coords, catalog);
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::tile::TileTypeDef;

    fn catalog() -> TileCatalog {
        TileCatalog::from_defs(vec![
            TileTypeDef::floor("Grass"),
            TileTypeDef::floor("ConcreteFloor"),
            TileTypeDef::floor("Entry"),
            TileTypeDef::floor("Exit"),
            TileTypeDef::floor("DirtFloor"),
            TileTypeDef::floor("StoneWall")
                .solid()
                .with_map_color(Rgba8::new(80, 80, 80, 255)),
            TileTypeDef::floor("ConcreteWall").solid(),
        ])
        .unwrap()
    }

    fn definition() -> MapDefinition {
        MapDefinition {
            name: "TestArena".to_owned(),
            dimensions: IVec2::new(16, 16),
            fill_tile_type: "Grass".to_owned(),
            edge_tile_type: "StoneWall".to_owned(),
            worms: vec![WormConfig {
                tile_type: "DirtFloor".to_owned(),
                count: 4,
                max_length: 8,
            }],
            start_floor_tile_type: "ConcreteFloor".to_owned(),
            start_bunker_tile_type: "ConcreteWall".to_owned(),
            end_floor_tile_type: "ConcreteFloor".to_owned(),
            end_bunker_tile_type: "ConcreteWall".to_owned(),
            entry_tile_type: "Entry".to_owned(),
            exit_tile_type: "Exit".to_owned(),
            entry_coords: IVec2::new(1, 1),
            exit_coords: IVec2::new(14, 14),
            map_image: None,
            map_image_offset: IVec2::ZERO,
            scorpio_count: 0,
            leo_count: 0,
            aries_count: 0,
            capricorn_count: 0,
        }
    }

    fn tile_name<'a>(tiles: &[Tile], catalog: &'a TileCatalog, coords: IVec2) -> &'a str {
        let tile = &tiles[(coords.x + coords.y * 16) as usize];
        &catalog.def(tile.type_id).name
    }

    #[test]
    fn test_border_entry_and_exit_are_stamped() {
        let catalog = catalog();
        let config = GameConfig::from_pairs([]);
        let mut rng = GameRng::from_seed(7);
        let tiles = populate_tiles(&definition(), &catalog, &config, &mut rng).unwrap();

        for x in 0..16 {
            assert_eq!(tile_name(&tiles, &catalog, IVec2::new(x, 0)), "StoneWall");
            assert_eq!(tile_name(&tiles, &catalog, IVec2::new(x, 15)), "StoneWall");
        }
        assert_eq!(tile_name(&tiles, &catalog, IVec2::new(1, 1)), "Entry");
        assert_eq!(tile_name(&tiles, &catalog, IVec2::new(14, 14)), "Exit");
    }

    #[test]
    fn test_start_region_floor_is_protected_from_worms() {
        let catalog = catalog();
        let config = GameConfig::from_pairs([]);
        // Heavy worm coverage; the start floor is stamped afterwards so it
        // must survive regardless of the walk.
        let mut def = definition();
        def.worms[0].count = 64;
        def.worms[0].max_length = 64;
        let mut rng = GameRng::from_seed(99);
        let tiles = populate_tiles(&def, &catalog, &config, &mut rng).unwrap();

        for y in 1..5 {
            for x in 1..5 {
                let name = tile_name(&tiles, &catalog, IVec2::new(x, y));
                assert_ne!(name, "DirtFloor", "worm leaked into start region at ({x},{y})");
            }
        }
    }

    #[test]
    fn test_generation_is_deterministic_per_seed() {
        let catalog = catalog();
        let config = GameConfig::from_pairs([]);
        let def = definition();
        let tiles_a =
            populate_tiles(&def, &catalog, &config, &mut GameRng::from_seed(42)).unwrap();
        let tiles_b =
            populate_tiles(&def, &catalog, &config, &mut GameRng::from_seed(42)).unwrap();
        for (a, b) in tiles_a.iter().zip(&tiles_b) {
            assert_eq!(a.type_id, b.type_id);
        }
    }

    #[test]
    fn test_unknown_tile_type_is_an_error() {
        let catalog = catalog();
        let config = GameConfig::from_pairs([]);
        let mut def = definition();
        def.fill_tile_type = "Lava".to_owned();
        let result = populate_tiles(&def, &catalog, &config, &mut GameRng::from_seed(1));
        assert!(matches!(result, Err(MapError::UnknownTileType(name)) if name == "Lava"));
    }

    #[test]
    fn test_opaque_image_texel_overrides_tile() {
        let catalog = catalog();
        let config = GameConfig::from_pairs([]);
        let mut def = definition();
        def.map_image_offset = IVec2::new(7, 7);
        def.map_image = Some(MapImage::new(
            IVec2::new(1, 1),
            vec![Rgba8::new(80, 80, 80, 255)],
        ));
        let tiles = populate_tiles(&def, &catalog, &config, &mut GameRng::from_seed(3)).unwrap();
        assert_eq!(tile_name(&tiles, &catalog, IVec2::new(7, 7)), "StoneWall");
    }

    #[test]
    fn test_unmatched_image_color_is_an_error() {
        let catalog = catalog();
        let config = GameConfig::from_pairs([]);
        let mut def = definition();
        def.map_image = Some(MapImage::new(
            IVec2::new(1, 1),
            vec![Rgba8::new(1, 2, 3, 255)],
        ));
        let result = populate_tiles(&def, &catalog, &config, &mut GameRng::from_seed(3));
        assert!(matches!(result, Err(MapError::NoTileTypeForColor { .. })));
    }
}

//! Tile Tanks headless demo
//!
//! Generates an arena from a built-in definition, drops the player at the
//! entry, and runs a fixed-step simulation with a scripted drive toward the
//! exit corner. Useful for profiling and for eyeballing the debug heat maps
//! in the log without a renderer attached.

use std::sync::Arc;

use glam::{IVec2, Vec2};
use serde_json::json;

use tile_tanks::sim::{
    EntityKind, Map, MapDefinition, PlayerIntent, Rgba8, SimContext, TileCatalog, TileTypeDef,
    Weapon, WormConfig,
};
use tile_tanks::GameConfig;

const SIM_DT: f32 = 1.0 / 60.0;
const MAX_SIM_SECONDS: f32 = 120.0;

fn demo_catalog() -> Arc<TileCatalog> {
    Arc::new(
        TileCatalog::from_defs(vec![
            TileTypeDef::floor("Grass"),
            TileTypeDef::floor("DirtFloor"),
            TileTypeDef::floor("ConcreteFloor"),
            TileTypeDef::floor("Entry"),
            TileTypeDef::floor("Exit"),
            TileTypeDef::floor("Water").water(),
            TileTypeDef::floor("Rubble"),
            TileTypeDef::floor("StoneWall")
                .solid()
                .with_map_color(Rgba8::new(80, 80, 80, 255)),
            TileTypeDef::floor("ConcreteWall").solid(),
            TileTypeDef::floor("BrickWall")
                .solid()
                .destructible(3, "Rubble"),
        ])
        .expect("demo tile catalog is well formed"),
    )
}

fn demo_definition() -> MapDefinition {
    MapDefinition {
        name: "Approach".to_owned(),
        dimensions: IVec2::new(32, 32),
        fill_tile_type: "Grass".to_owned(),
        edge_tile_type: "StoneWall".to_owned(),
        worms: vec![
            WormConfig {
                tile_type: "StoneWall".to_owned(),
                count: 30,
                max_length: 8,
            },
            WormConfig {
                tile_type: "DirtFloor".to_owned(),
                count: 20,
                max_length: 10,
            },
            WormConfig {
                tile_type: "Water".to_owned(),
                count: 8,
                max_length: 6,
            },
        ],
        start_floor_tile_type: "ConcreteFloor".to_owned(),
        start_bunker_tile_type: "ConcreteWall".to_owned(),
        end_floor_tile_type: "ConcreteFloor".to_owned(),
        end_bunker_tile_type: "ConcreteWall".to_owned(),
        entry_tile_type: "Entry".to_owned(),
        exit_tile_type: "Exit".to_owned(),
        entry_coords: IVec2::new(1, 1),
        exit_coords: IVec2::new(1, 1),
        map_image: None,
        map_image_offset: IVec2::ZERO,
        scorpio_count: 2,
        leo_count: 3,
        aries_count: 2,
        capricorn_count: 1,
    }
}

fn demo_config() -> GameConfig {
    GameConfig::from_json(json!({
        "playerDriveSpeed": 1.0,
        "playerTurnRate": 180.0,
        "playerGunTurnRate": 360.0,
        "playerShootCooldownSeconds": 0.1,
        "playerMaxHealth": 10,
        "enemyVisibleRange": 10.0,
        "scorpioTurnRate": 30.0,
        "scorpioTurnAperture": 10.0,
        "scorpioShootCooldownSeconds": 0.3,
        "leoTurnRate": 90.0,
        "leoDriveAperture": 90.0,
        "leoShootAperture": 10.0,
        "leoShootCooldownSeconds": 1.0,
        "capricornShootAperture": 10.0,
        "capricornShootCooldownSeconds": 1.5,
        "guidedBulletTurnRate": 180.0,
        "bulletBounceVarianceDegrees": 5.0,
        "startAreaSize": 5,
        "endAreaSize": 6,
    }))
}

fn main() {
    env_logger::init();

    let seed = std::env::args()
        .nth(1)
        .and_then(|arg| arg.parse().ok())
        .unwrap_or(20260829);
    log::info!("generating demo arena with seed {seed}");

    let ctx = SimContext {
        catalog: demo_catalog(),
        config: demo_config(),
        seed,
    };
    let definition = demo_definition();
    let mut map = match Map::generate(&definition, ctx) {
        Ok(map) => map,
        Err(error) => {
            log::error!("{error}");
            std::process::exit(1);
        }
    };

    let player = map.spawn_entity(EntityKind::Player, Vec2::new(1.5, 1.5), 45.0);
    log::info!(
        "spawned player {player:?}; {} scorpios, {} leos, {} aries, {} capricorns",
        map.count_of_kind(EntityKind::Scorpio),
        map.count_of_kind(EntityKind::Leo),
        map.count_of_kind(EntityKind::Aries),
        map.count_of_kind(EntityKind::Capricorn),
    );

    let exit_center = Vec2::new(
        map.dimensions().x as f32 - 1.5,
        map.dimensions().y as f32 - 1.5,
    );

    let mut elapsed = 0.0_f32;
    while elapsed < MAX_SIM_SECONDS {
        // Drive blindly toward the exit corner, guns blazing.
        let (drive, aim) = match map.entity(player) {
            Some(tank) if !tank.is_dead => {
                let to_exit = (exit_center - tank.position).normalize_or_zero();
                (to_exit, Some(tile_tanks::orientation_degrees(to_exit)))
            }
            _ => (Vec2::ZERO, None),
        };
        map.set_player_intent(PlayerIntent {
            drive,
            aim_degrees: aim,
            weapon: Weapon::Gun,
            firing: drive != Vec2::ZERO,
        });

        map.update(SIM_DT);
        elapsed += SIM_DT;

        if map.level_complete() {
            log::info!("level complete after {elapsed:.1}s");
            return;
        }
        if !map.is_alive(player) {
            log::info!("player destroyed after {elapsed:.1}s");
            return;
        }
    }
    log::info!("time limit reached after {MAX_SIM_SECONDS}s");
}

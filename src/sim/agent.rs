//! Per-kind entity behavior
//!
//! One update entry point dispatching on [`EntityKind`]. The map lifts the
//! entity out of its slot before calling in, so behaviors get `&mut Map` for
//! queries, RNG, and spawn requests without aliasing the entity itself.

use glam::{IVec2, Vec2};
use log::debug;

use crate::consts::{AI_TANK_DRIVE_SPEED, FLAMETHROWER_BULLET_LIFETIME, MAX_BULLET_WALL_HITS,
    SECONDS_BETWEEN_FLAMETHROWER_BULLETS};
use crate::sim::collision::reflect;
use crate::sim::entity::{Entity, EntityKind, Faction, Weapon};
use crate::sim::heatmap::TileHeatMap;
use crate::sim::map::{DistanceFieldOptions, Map};
use crate::{
    angle_degrees_between, is_point_inside_oriented_sector, orientation_degrees,
    shortest_angular_disp_degrees, turn_toward_degrees, vec2_from_polar_degrees,
};

/// Goal re-selection is bounded so a tank stranded next to an unreachable
/// target settles for wandering instead of spinning forever.
const MAX_GOAL_SELECTION_ATTEMPTS: u32 = 16;
const MAX_RANDOM_GOAL_ROLLS: u32 = 1024;

pub fn update_entity(entity: &mut Entity, map: &mut Map, dt: f32) {
    match entity.kind {
        EntityKind::Player => update_player(entity, map, dt),
        EntityKind::Scorpio => update_scorpio(entity, map, dt),
        EntityKind::Leo | EntityKind::Aries | EntityKind::Capricorn => {
            update_chassis(entity, map, dt)
        }
        EntityKind::GoodBolt
        | EntityKind::GoodBullet
        | EntityKind::EvilBolt
        | EntityKind::EvilBullet
        | EntityKind::FlamethrowerBullet => update_bullet(entity, map, dt),
        EntityKind::Explosion => update_explosion(entity, map, dt),
    }
}

/// Mark an entity dead, spawning its explosion. Everything except the player
/// is also flagged for the garbage sweep; the player's wreck stays on the map.
pub fn kill(entity: &mut Entity, map: &mut Map) {
    if entity.is_dead {
        return;
    }
    match entity.kind {
        EntityKind::Player => {
            map.queue_spawn_scaled(
                EntityKind::Explosion,
                entity.position,
                entity.orientation_degrees,
                1.5,
                1.0,
            );
            entity.is_dead = true;
            return;
        }
        EntityKind::Scorpio | EntityKind::Leo | EntityKind::Aries | EntityKind::Capricorn => {
            map.queue_spawn_scaled(
                EntityKind::Explosion,
                entity.position,
                entity.orientation_degrees,
                0.8,
                0.4,
            );
        }
        EntityKind::GoodBolt
        | EntityKind::GoodBullet
        | EntityKind::EvilBolt
        | EntityKind::EvilBullet => {
            map.queue_spawn_scaled(
                EntityKind::Explosion,
                entity.position,
                entity.orientation_degrees,
                0.4,
                0.4,
            );
        }
        EntityKind::FlamethrowerBullet | EntityKind::Explosion => {}
    }
    entity.is_dead = true;
    entity.is_garbage = true;
}

/// Overlap response when a bullet touches an opposing actor. Aries deflects
/// shots arriving inside its 45 degree front arc; everyone else takes the hit.
pub fn react_to_bullet_hit(actor: &mut Entity, bullet: &mut Entity, map: &mut Map) {
    if actor.kind == EntityKind::Aries {
        let to_bullet = bullet.position - actor.position;
        if angle_degrees_between(to_bullet, actor.forward()) < 45.0 {
            let normal = to_bullet.normalize_or_zero();
            if normal != Vec2::ZERO {
                bounce_off(bullet, normal, map);
            }
            return;
        }
    }

    if actor.kind == EntityKind::Player && map.is_player_invincible() {
        kill(bullet, map);
        return;
    }

    actor.health -= bullet.damage;
    kill(bullet, map);
    if actor.health <= 0 {
        debug!("{:?} destroyed by {:?}", actor.kind, bullet.kind);
        kill(actor, map);
    }
}

// --- player ---------------------------------------------------------------

fn update_player(entity: &mut Entity, map: &mut Map, dt: f32) {
    if entity.is_dead {
        return;
    }

    let intent = map.player_intent();
    let config = map.config().clone();

    let mut chassis_delta = 0.0;
    let drive = intent.drive.clamp_length_max(1.0);
    if drive != Vec2::ZERO {
        let goal_degrees = orientation_degrees(drive);
        let turn_rate = config.get_f32("playerTurnRate", 360.0);
        let turned = turn_toward_degrees(entity.orientation_degrees, goal_degrees, turn_rate * dt);
        chassis_delta = turned - entity.orientation_degrees;
        entity.orientation_degrees = turned;
        let drive_speed = config.get_f32("playerDriveSpeed", 1.0);
        entity.velocity = entity.forward() * drive.length() * drive_speed;
        entity.position += entity.velocity * dt;
    } else {
        entity.velocity = Vec2::ZERO;
    }

    match intent.aim_degrees {
        Some(goal_degrees) => {
            let gun_turn_rate = config.get_f32("playerGunTurnRate", 720.0);
            entity.gun_orientation_degrees = turn_toward_degrees(
                entity.gun_orientation_degrees,
                goal_degrees,
                gun_turn_rate * dt,
            );
        }
        // Unaimed turret rides along with the hull.
        None => entity.gun_orientation_degrees += chassis_delta,
    }

    if intent.firing {
        match intent.weapon {
            Weapon::Gun => fire_player_gun(entity, map, dt),
            Weapon::Flamethrower => fire_player_flamethrower(entity, map, dt),
        }
    } else {
        entity.shoot_cooldown = 0.0;
        entity.flamethrower_cooldown = 0.0;
    }

    let tile = IVec2::new(
        entity.position.x.floor() as i32,
        entity.position.y.floor() as i32,
    );
    if tile == map.dimensions() - IVec2::new(2, 2) {
        map.note_level_complete();
    }
}

fn fire_player_gun(entity: &mut Entity, map: &mut Map, dt: f32) {
    entity.shoot_cooldown -= dt;
    if entity.shoot_cooldown > 0.0 {
        return;
    }
    let muzzle = entity.position + vec2_from_polar_degrees(entity.gun_orientation_degrees, 0.35);
    map.queue_spawn_scaled(
        EntityKind::Explosion,
        muzzle,
        entity.orientation_degrees,
        0.3,
        0.4,
    );
    map.queue_spawn(
        EntityKind::GoodBolt,
        entity.position,
        entity.gun_orientation_degrees,
    );
    entity.shoot_cooldown = map.config().get_f32("playerShootCooldownSeconds", 0.1);
}

fn fire_player_flamethrower(entity: &mut Entity, map: &mut Map, dt: f32) {
    entity.flamethrower_cooldown -= dt;
    if entity.flamethrower_cooldown > 0.0 {
        return;
    }
    let per_second = map.config().get_i32("flamethrowerBulletsPerSeconds", 40);
    let burst = (per_second as f32 * SECONDS_BETWEEN_FLAMETHROWER_BULLETS).floor() as i32;
    for _ in 0..burst {
        let variance = map.rng_mut().roll_float_in_range(-30.0, 30.0);
        let muzzle = entity.position + vec2_from_polar_degrees(entity.gun_orientation_degrees, 0.4);
        map.queue_spawn(
            EntityKind::FlamethrowerBullet,
            muzzle,
            entity.gun_orientation_degrees + variance,
        );
    }
    entity.flamethrower_cooldown = SECONDS_BETWEEN_FLAMETHROWER_BULLETS;
}

// --- scorpio --------------------------------------------------------------

fn update_scorpio(entity: &mut Entity, map: &mut Map, dt: f32) {
    if entity.is_dead {
        return;
    }
    let turn_rate = map.config().get_f32("scorpioTurnRate", 30.0);
    let range = map.config().get_f32("enemyVisibleRange", 10.0);

    if let Some(player_pos) = map.player_position() {
        if entity.position.distance(player_pos) <= range
            && map.has_line_of_sight(entity.position, player_pos)
        {
            entity.is_in_pursuit = true;
            let goal_degrees = orientation_degrees(player_pos - entity.position);
            entity.gun_orientation_degrees = turn_toward_degrees(
                entity.gun_orientation_degrees,
                goal_degrees,
                turn_rate * dt,
            );

            let aperture = map.config().get_f32("scorpioTurnAperture", 10.0);
            let off_axis =
                shortest_angular_disp_degrees(entity.gun_orientation_degrees, goal_degrees).abs();
            if off_axis <= 0.5 * aperture {
                entity.shoot_cooldown -= dt;
                if entity.shoot_cooldown <= 0.0 {
                    let muzzle = entity.position + entity.cosmetic_radius * entity.gun_forward();
                    map.queue_spawn(EntityKind::EvilBolt, muzzle, entity.gun_orientation_degrees);
                    entity.shoot_cooldown =
                        map.config().get_f32("scorpioShootCooldownSeconds", 0.1);
                }
            }
            return;
        }
    }

    // No target: idle sweep.
    entity.is_in_pursuit = false;
    entity.gun_orientation_degrees += turn_rate * dt;
}

// --- wandering chassis (leo / aries / capricorn) --------------------------

fn update_chassis(entity: &mut Entity, map: &mut Map, dt: f32) {
    if entity.is_dead {
        return;
    }

    chase_player_if_visible(entity, map);

    if entity.path_points.is_empty() {
        replan_goal(entity, map);
    }

    set_next_waypoint(entity, map);
    turn_and_move_toward_waypoint(entity, map, dt);

    match entity.kind {
        EntityKind::Leo => check_player_and_fire(entity, map, dt, EntityKind::EvilBolt),
        EntityKind::Capricorn => check_player_and_fire(entity, map, dt, EntityKind::EvilBullet),
        _ => {}
    }
}

fn visible_player_position(entity: &Entity, map: &Map) -> Option<Vec2> {
    let range = map.config().get_f32("enemyVisibleRange", 10.0);
    let player_pos = map.player_position()?;
    if entity.position.distance(player_pos) < range
        && map.has_line_of_sight(entity.position, player_pos)
    {
        Some(player_pos)
    } else {
        None
    }
}

fn chase_player_if_visible(entity: &mut Entity, map: &mut Map) {
    let Some(player_pos) = visible_player_position(entity, map) else {
        return;
    };
    entity.is_in_pursuit = true;
    entity.goal_position = tile_center_of(player_pos);
    regenerate_goal_field(entity, map);
    generate_path_to_goal(entity, map);
    set_next_waypoint(entity, map);
}

/// Goal tile centers snap to the tile the target stands in.
fn tile_center_of(position: Vec2) -> Vec2 {
    Vec2::new(position.x.floor() + 0.5, position.y.floor() + 0.5)
}

fn regenerate_goal_field(entity: &mut Entity, map: &mut Map) {
    let goal_coords = IVec2::new(
        entity.goal_position.x.floor() as i32,
        entity.goal_position.y.floor() as i32,
    );
    let dims = map.dimensions();
    let field = entity
        .goal_field
        .get_or_insert_with(|| TileHeatMap::new(dims, 0.0));
    map.populate_distance_field(
        field,
        goal_coords,
        DistanceFieldOptions {
            treat_water_as_solid: !entity.can_swim,
            treat_scorpio_as_solid: true,
            treat_destructible_as_solid: true,
        },
    );
}

fn generate_path_to_goal(entity: &mut Entity, map: &Map) {
    let sentinel = map.heat_sentinel();
    entity.path_points = match &entity.goal_field {
        Some(field) => field.generate_path(entity.position, sentinel),
        None => Vec::new(),
    };
}

fn is_goal_reachable(entity: &Entity, map: &Map) -> bool {
    let goal_coords = IVec2::new(
        entity.goal_position.x.floor() as i32,
        entity.goal_position.y.floor() as i32,
    );
    match &entity.goal_field {
        Some(field) => field.value_at(goal_coords) != map.heat_sentinel(),
        None => false,
    }
}

fn replan_goal(entity: &mut Entity, map: &mut Map) {
    for attempt in 0..MAX_GOAL_SELECTION_ATTEMPTS {
        // Prefer the player's tile while visible; late attempts fall back to
        // wandering in case the player is visible but unreachable.
        match visible_player_position(entity, map) {
            Some(player_pos) if attempt < MAX_GOAL_SELECTION_ATTEMPTS / 2 => {
                entity.goal_position = tile_center_of(player_pos);
            }
            _ => pick_random_goal(entity, map),
        }
        regenerate_goal_field(entity, map);
        generate_path_to_goal(entity, map);
        if is_goal_reachable(entity, map) {
            return;
        }
    }
    entity.goal_position = tile_center_of(entity.position);
    entity.path_points.clear();
}

fn pick_random_goal(entity: &mut Entity, map: &mut Map) {
    entity.is_in_pursuit = false;
    regenerate_goal_field(entity, map);

    let dims = map.dimensions();
    let sentinel = map.heat_sentinel();
    for _ in 0..MAX_RANDOM_GOAL_ROLLS {
        let goal_x = map.rng_mut().roll_int_in_range(1, dims.x - 2);
        let goal_y = map.rng_mut().roll_int_in_range(1, dims.y - 2);
        let reachable = entity
            .goal_field
            .as_ref()
            .is_some_and(|field| field.value_at(IVec2::new(goal_x, goal_y)) != sentinel);
        if reachable {
            entity.goal_position = Vec2::new(goal_x as f32 + 0.5, goal_y as f32 + 0.5);
            return;
        }
    }
    entity.goal_position = tile_center_of(entity.position);
}

fn set_next_waypoint(entity: &mut Entity, map: &Map) {
    let Some(&last) = entity.path_points.last() else {
        return;
    };
    entity.next_waypoint = last;
    if can_take_shortcut(entity, map) {
        entity.path_points.pop();
        if let Some(&next) = entity.path_points.last() {
            entity.next_waypoint = next;
        }
    }
}

/// A waypoint can be skipped when the straight line to the one after it is
/// clear on this entity's solidity map.
fn can_take_shortcut(entity: &Entity, map: &Map) -> bool {
    if entity.path_points.len() < 2 {
        return false;
    }
    let target = entity.path_points[entity.path_points.len() - 2];
    let max_length = entity.position.distance(target);
    let direction = (target - entity.position).normalize_or_zero();
    if direction == Vec2::ZERO {
        return true;
    }
    let solid_map = map.solidity_map(entity.can_swim);
    let result = solid_map.raycast(entity.position, direction, max_length, map.heat_sentinel());
    !result.did_impact
}

fn turn_and_move_toward_waypoint(entity: &mut Entity, map: &Map, dt: f32) {
    let to_waypoint = (entity.next_waypoint - entity.position).normalize_or_zero();
    if to_waypoint == Vec2::ZERO {
        return;
    }
    let turn_rate = map.config().get_f32("leoTurnRate", 90.0);
    entity.orientation_degrees = turn_toward_degrees(
        entity.orientation_degrees,
        orientation_degrees(to_waypoint),
        turn_rate * dt,
    );

    let drive_aperture = map.config().get_f32("leoDriveAperture", 90.0);
    if angle_degrees_between(entity.forward(), to_waypoint) > 0.5 * drive_aperture {
        return;
    }
    entity.velocity = entity.forward() * AI_TANK_DRIVE_SPEED;
    entity.position += entity.velocity * dt;
}

fn check_player_and_fire(entity: &mut Entity, map: &mut Map, dt: f32, bullet_kind: EntityKind) {
    let Some(player_pos) = map.player_position() else {
        return;
    };
    let range = map.config().get_f32("enemyVisibleRange", 10.0);
    let aperture_key = match entity.kind {
        EntityKind::Capricorn => "capricornShootAperture",
        _ => "leoShootAperture",
    };
    let aperture = map.config().get_f32(aperture_key, 10.0);
    let in_sector = is_point_inside_oriented_sector(
        player_pos,
        entity.position,
        entity.orientation_degrees,
        aperture,
        range,
    );
    if !in_sector || !map.has_line_of_sight(entity.position, player_pos) {
        return;
    }

    entity.shoot_cooldown -= dt;
    if entity.shoot_cooldown <= 0.0 {
        let muzzle = entity.position + entity.cosmetic_radius * entity.forward();
        map.queue_spawn(bullet_kind, muzzle, entity.orientation_degrees);
        let cooldown_key = match entity.kind {
            EntityKind::Capricorn => "capricornShootCooldownSeconds",
            _ => "leoShootCooldownSeconds",
        };
        entity.shoot_cooldown = map.config().get_f32(cooldown_key, 1.0);
    }
}

// --- bullets --------------------------------------------------------------

fn update_bullet(entity: &mut Entity, map: &mut Map, dt: f32) {
    if entity.is_dead {
        return;
    }

    let dims = map.dimensions();
    if entity.position.x < 0.0
        || entity.position.x > dims.x as f32
        || entity.position.y < 0.0
        || entity.position.y > dims.y as f32
    {
        kill(entity, map);
    }

    match entity.kind {
        EntityKind::EvilBullet => update_guided_bullet(entity, map, dt),
        EntityKind::FlamethrowerBullet => update_flamethrower_bullet(entity, map, dt),
        _ => update_straight_bullet(entity, map, dt),
    }
}

fn update_straight_bullet(entity: &mut Entity, map: &mut Map, dt: f32) {
    let prev_position = entity.position;
    entity.position += entity.velocity * dt;

    if !map.is_point_in_solid(entity.position) {
        return;
    }
    if map.is_point_in_destructible(entity.position) {
        map.damage_tile_at(entity.position, entity.damage);
    }

    if entity.faction == Faction::Good {
        let tile_delta = IVec2::new(
            entity.position.x.floor() as i32 - prev_position.x.floor() as i32,
            entity.position.y.floor() as i32 - prev_position.y.floor() as i32,
        );
        let normal = Vec2::new(tile_delta.x as f32, tile_delta.y as f32).normalize_or_zero();
        if normal != Vec2::ZERO {
            bounce_off(entity, normal, map);
        }
    } else {
        kill(entity, map);
    }
}

fn update_guided_bullet(entity: &mut Entity, map: &mut Map, dt: f32) {
    if map.is_point_in_solid(entity.position) {
        kill(entity, map);
    }

    let Some(player_pos) = map.player_position() else {
        entity.position += entity.velocity * dt;
        return;
    };

    let turn_rate = map.config().get_f32("guidedBulletTurnRate", 360.0);
    let goal_degrees = orientation_degrees(player_pos - entity.position);
    entity.orientation_degrees =
        turn_toward_degrees(entity.orientation_degrees, goal_degrees, turn_rate * dt);
    entity.position += entity.forward() * entity.velocity.length() * dt;
}

fn update_flamethrower_bullet(entity: &mut Entity, map: &mut Map, dt: f32) {
    entity.position += entity.velocity * dt;
    // Cosmetic tumble.
    entity.orientation_degrees += entity.angular_velocity;

    if map.is_point_in_solid(entity.position) {
        kill(entity, map);
    }
    entity.age += dt;
    if entity.age >= FLAMETHROWER_BULLET_LIFETIME {
        kill(entity, map);
    }
}

/// Ricochet: mirror the velocity, jitter the heading, and count the wall.
pub fn bounce_off(entity: &mut Entity, impact_normal: Vec2, map: &mut Map) {
    entity.velocity = reflect(entity.velocity, impact_normal);
    entity.orientation_degrees = orientation_degrees(entity.velocity);
    let variance = map.config().get_f32("bulletBounceVarianceDegrees", 5.0);
    entity.orientation_degrees += map.rng_mut().roll_float_in_range(-variance, variance);
    entity.velocity =
        vec2_from_polar_degrees(entity.orientation_degrees, entity.velocity.length());

    entity.wall_hit_count += 1;
    if entity.wall_hit_count >= MAX_BULLET_WALL_HITS {
        kill(entity, map);
    }
}

// --- explosions -----------------------------------------------------------

fn update_explosion(entity: &mut Entity, map: &mut Map, dt: f32) {
    entity.age += dt;
    if entity.age >= entity.lifetime {
        kill(entity, map);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use glam::IVec2;

    use crate::config::GameConfig;
    use crate::sim::entity::EntityId;
    use crate::sim::mapgen::MapDefinition;
    use crate::sim::map::SimContext;
    use crate::sim::tile::{TileCatalog, TileTypeDef};

    /// 10x10 bordered grass arena with no AI spawns.
    fn arena() -> Map {
        let catalog = Arc::new(
            TileCatalog::from_defs(vec![
                TileTypeDef::floor("Grass"),
                TileTypeDef::floor("Entry"),
                TileTypeDef::floor("Exit"),
                TileTypeDef::floor("StoneWall").solid(),
            ])
            .unwrap(),
        );
        let definition = MapDefinition {
            name: "AgentArena".to_owned(),
            dimensions: IVec2::new(10, 10),
            fill_tile_type: "Grass".to_owned(),
            edge_tile_type: "StoneWall".to_owned(),
            worms: Vec::new(),
            start_floor_tile_type: "Grass".to_owned(),
            start_bunker_tile_type: "StoneWall".to_owned(),
            end_floor_tile_type: "Grass".to_owned(),
            end_bunker_tile_type: "StoneWall".to_owned(),
            entry_tile_type: "Entry".to_owned(),
            exit_tile_type: "Exit".to_owned(),
            entry_coords: IVec2::new(1, 1),
            exit_coords: IVec2::new(1, 1),
            map_image: None,
            map_image_offset: IVec2::ZERO,
            scorpio_count: 0,
            leo_count: 0,
            aries_count: 0,
            capricorn_count: 0,
        };
        let ctx = SimContext {
            catalog,
            config: GameConfig::from_pairs([
                ("startAreaSize", serde_json::json!(3)),
                ("endAreaSize", serde_json::json!(3)),
            ]),
            seed: 777,
        };
        Map::generate(&definition, ctx).unwrap()
    }

    fn make(map: &Map, kind: EntityKind, position: Vec2, orientation: f32) -> Entity {
        Entity::new(EntityId(0), kind, position, orientation, map.config())
    }

    #[test]
    fn test_scorpio_sweeps_gun_without_a_target() {
        let mut map = arena();
        let mut scorpio = make(&map, EntityKind::Scorpio, Vec2::new(5.5, 5.5), 0.0);
        update_entity(&mut scorpio, &mut map, 1.0);
        // Default scorpioTurnRate is 30 degrees per second.
        assert!((scorpio.gun_orientation_degrees - 30.0).abs() < 1e-4);
        assert!(!scorpio.is_in_pursuit);
    }

    #[test]
    fn test_player_on_far_corner_tile_completes_level() {
        let mut map = arena();
        let mut player = make(&map, EntityKind::Player, Vec2::new(8.5, 8.5), 0.0);
        update_entity(&mut player, &mut map, 1.0 / 60.0);
        assert!(map.level_complete());
    }

    #[test]
    fn test_good_bullet_bounces_where_evil_dies() {
        let mut map = arena();
        // Both head west into the border wall.
        let mut good = make(&map, EntityKind::GoodBolt, Vec2::new(1.5, 5.5), 180.0);
        update_entity(&mut good, &mut map, 0.1);
        assert!(!good.is_dead);
        assert_eq!(good.wall_hit_count, 1);
        assert!(good.velocity.x > 0.0, "bounce should reverse the x velocity");

        let mut evil = make(&map, EntityKind::EvilBolt, Vec2::new(1.5, 5.5), 180.0);
        update_entity(&mut evil, &mut map, 0.1);
        assert!(evil.is_dead);
        assert!(evil.is_garbage);
    }

    #[test]
    fn test_third_bounce_kills_the_bullet() {
        let mut map = arena();
        let mut bullet = make(&map, EntityKind::GoodBullet, Vec2::new(5.5, 5.5), 0.0);
        bounce_off(&mut bullet, Vec2::new(-1.0, 0.0), &mut map);
        bounce_off(&mut bullet, Vec2::new(1.0, 0.0), &mut map);
        assert!(!bullet.is_dead);
        bounce_off(&mut bullet, Vec2::new(-1.0, 0.0), &mut map);
        assert!(bullet.is_dead);
    }

    #[test]
    fn test_flamethrower_bullet_expires() {
        let mut map = arena();
        let mut flame = make(&map, EntityKind::FlamethrowerBullet, Vec2::new(5.5, 5.5), 0.0);
        update_entity(&mut flame, &mut map, 0.5);
        assert!(!flame.is_dead);
        update_entity(&mut flame, &mut map, 0.5);
        assert!(flame.is_dead);
    }

    #[test]
    fn test_aries_deflects_front_arc_hits_only() {
        let mut map = arena();
        let mut aries = make(&map, EntityKind::Aries, Vec2::new(5.5, 5.5), 0.0);
        let health = aries.health;

        // Bullet arriving from dead ahead is deflected, not absorbed.
        let mut front = make(&map, EntityKind::GoodBolt, Vec2::new(5.8, 5.5), 180.0);
        react_to_bullet_hit(&mut aries, &mut front, &mut map);
        assert_eq!(aries.health, health);
        assert!(!front.is_dead);
        assert!(front.velocity.x > 0.0);

        // Bullet from behind lands.
        let mut rear = make(&map, EntityKind::GoodBolt, Vec2::new(5.2, 5.5), 0.0);
        react_to_bullet_hit(&mut aries, &mut rear, &mut map);
        assert_eq!(aries.health, health - 1);
        assert!(rear.is_dead);
    }

    #[test]
    fn test_guided_bullet_turns_toward_player() {
        let mut map = arena();
        let player = map.spawn_entity(EntityKind::Player, Vec2::new(5.5, 8.5), 0.0);
        assert!(map.is_alive(player));

        // Guided bullet heading east, player due north of it.
        let mut bullet = make(&map, EntityKind::EvilBullet, Vec2::new(5.5, 2.5), 0.0);
        update_entity(&mut bullet, &mut map, 1.0 / 60.0);
        assert!(bullet.orientation_degrees > 0.0);
        assert!(bullet.position.y > 2.5);
    }
}

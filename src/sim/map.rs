//! The map: tile grid, entities, and the per-frame simulation pass
//!
//! A `Map` owns the generated tile grid, the shared distance/solidity heat
//! maps, the entity registry, and the seeded RNG every random decision draws
//! from. Construction retries layout until the exit is reachable from the
//! entry; each frame runs update, push-apart, wall push, bullet hits, and the
//! garbage sweep in that order.

use std::collections::VecDeque;
use std::sync::Arc;

use glam::{IVec2, Vec2};
use log::{debug, info};
use thiserror::Error;

use crate::config::GameConfig;
use crate::consts::MAX_MAP_GENERATION_ATTEMPTS;
use crate::rng::GameRng;
use crate::sim::agent;
use crate::sim::collision::{do_discs_overlap, push_disc_out_of_fixed_aabb,
    push_disc_out_of_fixed_disc, push_discs_out_of_each_other};
use crate::sim::entity::{Entity, EntityId, EntityKind, EntityRegistry, Faction, PlayerIntent};
use crate::sim::heatmap::TileHeatMap;
use crate::sim::mapgen::{self, MapDefinition};
use crate::sim::raycast::{raycast_vs_grid, RaycastResult};
use crate::sim::tile::{Tile, TileCatalog, TileTypeId};

#[derive(Debug, Error)]
pub enum MapError {
    #[error("unknown tile type {0:?}")]
    UnknownTileType(String),
    #[error("unknown map definition {0:?}")]
    UnknownMapDefinition(String),
    #[error("malformed map definition: {0}")]
    InvalidDefinition(#[from] serde_json::Error),
    #[error("map {map_name:?}: no tile type matches image color at {coords:?}")]
    NoTileTypeForColor { map_name: String, coords: IVec2 },
    #[error("could not generate valid map {map_name:?} in {attempts} attempts")]
    GenerationRetriesExhausted { map_name: String, attempts: u32 },
}

/// Which tiles count as blocked for one distance-field fill.
#[derive(Debug, Clone, Copy)]
pub struct DistanceFieldOptions {
    pub treat_water_as_solid: bool,
    pub treat_scorpio_as_solid: bool,
    pub treat_destructible_as_solid: bool,
}

impl Default for DistanceFieldOptions {
    fn default() -> Self {
        Self {
            treat_water_as_solid: true,
            treat_scorpio_as_solid: false,
            treat_destructible_as_solid: false,
        }
    }
}

/// Everything the map needs from its host to exist.
#[derive(Clone)]
pub struct SimContext {
    pub catalog: Arc<TileCatalog>,
    pub config: GameConfig,
    pub seed: u64,
}

/// Debug heat-map cycling state. `AgentGoal` carries the raw slot index into
/// the evil actor view, which stays stable across removals of other entities.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeatMapKind {
    StartDistance,
    LandSolidity,
    AmphibianSolidity,
    AgentGoal(usize),
}

struct SpawnRequest {
    kind: EntityKind,
    position: Vec2,
    orientation_degrees: f32,
    scale_and_lifetime: Option<(f32, f32)>,
}

pub struct Map {
    definition: MapDefinition,
    catalog: Arc<TileCatalog>,
    config: GameConfig,
    rng: GameRng,

    tiles: Vec<Tile>,
    start_distance_field: TileHeatMap,
    land_solidity: TileHeatMap,
    amphibian_solidity: TileHeatMap,

    registry: EntityRegistry,
    pending_spawns: Vec<SpawnRequest>,
    player_intent: PlayerIntent,
    no_clip: bool,
    player_invincible: bool,
    level_complete: bool,

    selected_heat_map: Option<HeatMapKind>,
    selected_agent_slot: usize,
}

impl Map {
    /// Generate a playable map: lay tiles, wall off unreachable pockets,
    /// validate that the exit is reachable from the entry, and retry the
    /// whole layout up to the attempt cap before giving up.
    pub fn generate(definition: &MapDefinition, ctx: SimContext) -> Result<Self, MapError> {
        let mut definition = definition.clone();
        if definition.exit_coords == IVec2::new(1, 1) {
            definition.exit_coords = definition.dimensions - IVec2::new(2, 2);
        }

        let dims = definition.dimensions;
        let mut map = Self {
            definition,
            catalog: ctx.catalog,
            config: ctx.config,
            rng: GameRng::from_seed(ctx.seed),
            tiles: Vec::new(),
            start_distance_field: TileHeatMap::new(dims, 0.0),
            land_solidity: TileHeatMap::new(dims, 0.0),
            amphibian_solidity: TileHeatMap::new(dims, 0.0),
            registry: EntityRegistry::new(),
            pending_spawns: Vec::new(),
            player_intent: PlayerIntent::default(),
            no_clip: false,
            player_invincible: false,
            level_complete: false,
            selected_heat_map: None,
            selected_agent_slot: 0,
        };

        let mut attempts = 0;
        loop {
            attempts += 1;
            map.tiles =
                mapgen::populate_tiles(&map.definition, &map.catalog, &map.config, &mut map.rng)?;
            map.generate_heat_maps();
            map.wall_off_unreachable_cells();
            map.generate_heat_maps();

            if map.is_map_valid() {
                break;
            }
            if attempts >= MAX_MAP_GENERATION_ATTEMPTS {
                return Err(MapError::GenerationRetriesExhausted {
                    map_name: map.definition.name.clone(),
                    attempts,
                });
            }
        }
        info!(
            "map {:?} generated in {} attempt(s)",
            map.definition.name, attempts
        );

        map.spawn_initial_entities();
        Ok(map)
    }

    // --- grid queries -----------------------------------------------------

    pub fn dimensions(&self) -> IVec2 {
        self.definition.dimensions
    }

    pub fn definition(&self) -> &MapDefinition {
        &self.definition
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn rng_mut(&mut self) -> &mut GameRng {
        &mut self.rng
    }

    /// Sentinel cost marking unreachable/solid heat-map cells; strictly
    /// larger than any possible path length on this map.
    pub fn heat_sentinel(&self) -> f32 {
        let dims = self.dimensions();
        (dims.x * dims.y + 1) as f32
    }

    fn in_bounds(&self, coords: IVec2) -> bool {
        let dims = self.dimensions();
        coords.x >= 0 && coords.y >= 0 && coords.x < dims.x && coords.y < dims.y
    }

    fn tile_index(&self, coords: IVec2) -> usize {
        (coords.x + coords.y * self.dimensions().x) as usize
    }

    pub fn tile_at(&self, coords: IVec2) -> Option<&Tile> {
        if !self.in_bounds(coords) {
            return None;
        }
        Some(&self.tiles[self.tile_index(coords)])
    }

    /// Rebuild the cell from the definition, resetting its health.
    pub fn set_tile_type(&mut self, coords: IVec2, type_id: TileTypeId) {
        if self.in_bounds(coords) {
            let index = self.tile_index(coords);
            self.tiles[index] = Tile::new(type_id, coords, &self.catalog);
        }
    }

    pub fn set_tile_type_by_name(&mut self, coords: IVec2, name: &str) -> Result<(), MapError> {
        let type_id = self.catalog.id_by_name(name)?;
        self.set_tile_type(coords, type_id);
        Ok(())
    }

    /// Out-of-bounds tiles are not solid, so rays and bullets pass freely off
    /// the map edge.
    pub fn is_tile_solid(&self, coords: IVec2) -> bool {
        self.tile_at(coords)
            .is_some_and(|tile| self.catalog.def(tile.type_id).is_solid)
    }

    pub fn is_tile_water(&self, coords: IVec2) -> bool {
        self.tile_at(coords)
            .is_some_and(|tile| self.catalog.def(tile.type_id).is_water)
    }

    pub fn is_tile_destructible(&self, coords: IVec2) -> bool {
        self.tile_at(coords)
            .is_some_and(|tile| self.catalog.def(tile.type_id).is_destructible)
    }

    pub fn is_point_in_solid(&self, point: Vec2) -> bool {
        self.is_tile_solid(floor_coords(point))
    }

    pub fn is_point_in_water(&self, point: Vec2) -> bool {
        self.is_tile_water(floor_coords(point))
    }

    pub fn is_point_in_destructible(&self, point: Vec2) -> bool {
        self.is_tile_destructible(floor_coords(point))
    }

    /// The protected spawn regions near the entry and exit corners.
    pub fn is_point_in_bunker(&self, point: Vec2) -> bool {
        let start_area_size = self.config.get_i32("startAreaSize", 5) as f32;
        let end_area_size = self.config.get_i32("endAreaSize", 6) as f32;
        (point.x < start_area_size && point.y < start_area_size)
            || (point.x > end_area_size && point.y > end_area_size)
    }

    pub fn damage_tile_at(&mut self, point: Vec2, amount: i32) {
        let coords = floor_coords(point);
        if self.in_bounds(coords) {
            let index = self.tile_index(coords);
            self.tiles[index].take_damage(amount, &self.catalog);
        }
    }

    pub fn raycast_vs_tiles(&self, start: Vec2, direction: Vec2, max_distance: f32) -> RaycastResult {
        raycast_vs_grid(start, direction, max_distance, self.dimensions(), |coords| {
            self.is_tile_solid(coords)
        })
    }

    pub fn has_line_of_sight(&self, from: Vec2, to: Vec2) -> bool {
        let direction = (to - from).normalize_or_zero();
        if direction == Vec2::ZERO {
            return true;
        }
        !self
            .raycast_vs_tiles(from, direction, from.distance(to))
            .did_impact
    }

    // --- heat maps --------------------------------------------------------

    /// BFS flood fill from `start`: every cell records its step distance, and
    /// cells the fill never reaches keep the sentinel.
    pub fn populate_distance_field(
        &self,
        field: &mut TileHeatMap,
        start: IVec2,
        options: DistanceFieldOptions,
    ) {
        let dims = self.dimensions();
        let sentinel = self.heat_sentinel();
        let mut values = vec![sentinel; (dims.x * dims.y) as usize];
        let mut frontier = VecDeque::new();

        let index_of = |coords: IVec2| (coords.x + coords.y * dims.x) as usize;
        values[index_of(start)] = 0.0;
        frontier.push_back(start);

        while let Some(current) = frontier.pop_front() {
            let current_value = values[index_of(current)];
            for step in [IVec2::NEG_Y, IVec2::NEG_X, IVec2::Y, IVec2::X] {
                let neighbor = current + step;
                if neighbor.x < 0
                    || neighbor.y < 0
                    || neighbor.x >= dims.x
                    || neighbor.y >= dims.y
                {
                    continue;
                }
                if values[index_of(neighbor)] > current_value + 1.0
                    && self.is_tile_traversable(neighbor, options)
                {
                    values[index_of(neighbor)] = current_value + 1.0;
                    frontier.push_back(neighbor);
                }
            }
        }

        field.set_all_values(values);
    }

    fn is_tile_traversable(&self, coords: IVec2, options: DistanceFieldOptions) -> bool {
        if self.is_tile_solid(coords) {
            if !self.is_tile_destructible(coords) {
                return false;
            }
            return !options.treat_destructible_as_solid;
        }
        if self.is_tile_water(coords) {
            return !options.treat_water_as_solid;
        }

        let occupied_by_scorpio = self
            .registry
            .ids_of_kind(EntityKind::Scorpio)
            .filter_map(|id| self.registry.get(id))
            .any(|scorpio| floor_coords(scorpio.position) == coords);
        if occupied_by_scorpio {
            return !options.treat_scorpio_as_solid;
        }
        true
    }

    fn generate_heat_maps(&mut self) {
        let dims = self.dimensions();
        let sentinel = self.heat_sentinel();

        let mut land = TileHeatMap::new(dims, sentinel);
        let mut amphibian = TileHeatMap::new(dims, sentinel);
        for tile_y in 0..dims.y {
            for tile_x in 0..dims.x {
                let coords = IVec2::new(tile_x, tile_y);
                if !self.is_tile_solid(coords) && !self.is_tile_water(coords) {
                    land.set_value_at(coords, 1.0);
                }
                if !self.is_tile_solid(coords) {
                    amphibian.set_value_at(coords, 1.0);
                }
            }
        }
        self.land_solidity = land;
        self.amphibian_solidity = amphibian;

        let mut start_field = TileHeatMap::new(dims, sentinel);
        self.populate_distance_field(
            &mut start_field,
            self.definition.entry_coords,
            DistanceFieldOptions::default(),
        );
        self.start_distance_field = start_field;
    }

    /// Non-solid, non-water cells the entry cannot reach become edge wall so
    /// nothing can spawn in a sealed pocket.
    fn wall_off_unreachable_cells(&mut self) {
        let dims = self.dimensions();
        let sentinel = self.heat_sentinel();
        let Ok(edge) = self.catalog.id_by_name(&self.definition.edge_tile_type) else {
            return;
        };
        for tile_y in 0..dims.y {
            for tile_x in 0..dims.x {
                let coords = IVec2::new(tile_x, tile_y);
                if self.start_distance_field.value_at(coords) == sentinel
                    && !self.is_tile_solid(coords)
                    && !self.is_tile_water(coords)
                {
                    self.set_tile_type(coords, edge);
                }
            }
        }
    }

    fn is_map_valid(&self) -> bool {
        self.start_distance_field
            .value_at(self.definition.exit_coords)
            != self.heat_sentinel()
    }

    /// Solidity map matching an entity's movement class, for shortcut rays.
    pub fn solidity_map(&self, can_swim: bool) -> &TileHeatMap {
        if can_swim {
            &self.amphibian_solidity
        } else {
            &self.land_solidity
        }
    }

    pub fn start_distance_field(&self) -> &TileHeatMap {
        &self.start_distance_field
    }

    // --- entities ---------------------------------------------------------

    pub fn spawn_entity(&mut self, kind: EntityKind, position: Vec2, orientation_degrees: f32) -> EntityId {
        self.spawn_entity_scaled(kind, position, orientation_degrees, None)
    }

    pub fn spawn_entity_scaled(
        &mut self,
        kind: EntityKind,
        position: Vec2,
        orientation_degrees: f32,
        scale_and_lifetime: Option<(f32, f32)>,
    ) -> EntityId {
        let id = self.registry.next_id();
        let mut entity = Entity::new(id, kind, position, orientation_degrees, &self.config);
        if kind.is_bullet() {
            entity.angular_velocity = self.rng.roll_float_in_range(-5.0, 5.0);
        }
        if let Some((scale, lifetime)) = scale_and_lifetime {
            entity.scale = scale;
            entity.lifetime = lifetime;
        }
        debug!("spawned {kind:?} at {position:?} as {id:?}");
        self.registry.insert(entity)
    }

    /// Deferred spawn for use inside an entity update; materialized after the
    /// update loop, before the push phase.
    pub fn queue_spawn(&mut self, kind: EntityKind, position: Vec2, orientation_degrees: f32) {
        self.pending_spawns.push(SpawnRequest {
            kind,
            position,
            orientation_degrees,
            scale_and_lifetime: None,
        });
    }

    pub fn queue_spawn_scaled(
        &mut self,
        kind: EntityKind,
        position: Vec2,
        orientation_degrees: f32,
        scale: f32,
        lifetime: f32,
    ) {
        self.pending_spawns.push(SpawnRequest {
            kind,
            position,
            orientation_degrees,
            scale_and_lifetime: Some((scale, lifetime)),
        });
    }

    fn flush_pending_spawns(&mut self) {
        let requests = std::mem::take(&mut self.pending_spawns);
        for request in requests {
            self.spawn_entity_scaled(
                request.kind,
                request.position,
                request.orientation_degrees,
                request.scale_and_lifetime,
            );
        }
    }

    fn spawn_initial_entities(&mut self) {
        let counts = [
            (EntityKind::Scorpio, self.definition.scorpio_count),
            (EntityKind::Leo, self.definition.leo_count),
            (EntityKind::Aries, self.definition.aries_count),
            (EntityKind::Capricorn, self.definition.capricorn_count),
        ];
        for (kind, count) in counts {
            for _ in 0..count {
                let position = self.roll_spawn_position();
                let orientation = self.rng.roll_float_in_range(0.0, 360.0);
                self.spawn_entity(kind, position, orientation);
            }
        }
    }

    /// Random open tile center outside the protected regions.
    fn roll_spawn_position(&mut self) -> Vec2 {
        let dims = self.dimensions();
        loop {
            let tile_x = self.rng.roll_int_in_range(0, dims.x - 1);
            let tile_y = self.rng.roll_int_in_range(0, dims.y - 1);
            let position = Vec2::new(tile_x as f32 + 0.5, tile_y as f32 + 0.5);
            if !self.is_point_in_solid(position)
                && !self.is_point_in_water(position)
                && !self.is_point_in_bunker(position)
            {
                return position;
            }
        }
    }

    pub fn entity(&self, id: EntityId) -> Option<&Entity> {
        self.registry.get(id)
    }

    pub fn entity_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.registry.get_mut(id)
    }

    pub fn is_alive(&self, id: EntityId) -> bool {
        self.registry.get(id).is_some_and(|entity| !entity.is_dead)
    }

    pub fn entities(&self) -> impl Iterator<Item = &Entity> {
        self.registry.iter()
    }

    pub fn count_of_kind(&self, kind: EntityKind) -> usize {
        self.registry.count_of_kind(kind)
    }

    pub fn player_id(&self) -> Option<EntityId> {
        self.registry.ids_of_kind(EntityKind::Player).next()
    }

    /// Position of the live player, if any.
    pub fn player_position(&self) -> Option<Vec2> {
        let player = self.registry.get(self.player_id()?)?;
        if player.is_dead {
            return None;
        }
        Some(player.position)
    }

    // --- host controls ----------------------------------------------------

    pub fn set_player_intent(&mut self, intent: PlayerIntent) {
        self.player_intent = intent;
    }

    pub fn player_intent(&self) -> PlayerIntent {
        self.player_intent
    }

    pub fn set_no_clip(&mut self, no_clip: bool) {
        self.no_clip = no_clip;
    }

    pub fn set_player_invincible(&mut self, invincible: bool) {
        self.player_invincible = invincible;
    }

    pub fn is_player_invincible(&self) -> bool {
        self.player_invincible
    }

    pub(crate) fn note_level_complete(&mut self) {
        self.level_complete = true;
    }

    pub fn level_complete(&self) -> bool {
        self.level_complete
    }

    // --- frame update -----------------------------------------------------

    pub fn update(&mut self, dt: f32) {
        self.update_entities(dt);
        self.flush_pending_spawns();
        self.push_entities_out_of_each_other();
        self.push_entities_out_of_walls();
        self.check_for_bullet_hits();
        self.delete_garbage_entities();
        self.flush_pending_spawns();
    }

    fn update_entities(&mut self, dt: f32) {
        for id in self.registry.ids() {
            let Some(mut entity) = self.registry.take_for_update(id) else {
                continue;
            };
            agent::update_entity(&mut entity, self, dt);
            self.registry.put_back(entity);
        }
    }

    fn push_entities_out_of_each_other(&mut self) {
        let ids = self.registry.ids();
        for (first_index, &first_id) in ids.iter().enumerate() {
            let Some(mut first) = self.registry.take_for_update(first_id) else {
                continue;
            };
            if !first.is_dead {
                for &second_id in &ids[first_index + 1..] {
                    let Some(second) = self.registry.get_mut(second_id) else {
                        continue;
                    };
                    if second.is_dead {
                        continue;
                    }
                    push_pair_apart(&mut first, second);
                }
            }
            self.registry.put_back(first);
        }
    }

    fn push_entities_out_of_walls(&mut self) {
        for id in self.registry.ids() {
            let Some(mut entity) = self.registry.take_for_update(id) else {
                continue;
            };
            let exempt = entity.is_dead
                || !entity.is_pushed_by_walls
                || (entity.kind == EntityKind::Player && self.no_clip);
            if !exempt {
                self.push_entity_out_of_walls(&mut entity);
            }
            self.registry.put_back(entity);
        }
    }

    fn push_entity_out_of_walls(&mut self, entity: &mut Entity) {
        let home = floor_coords(entity.position);
        // Cardinal neighbors first so corner pushes resolve against faces.
        let neighbors = [
            home + IVec2::X,
            home + IVec2::NEG_X,
            home + IVec2::Y,
            home + IVec2::NEG_Y,
            home + IVec2::new(1, 1),
            home + IVec2::new(1, -1),
            home + IVec2::new(-1, 1),
            home + IVec2::new(-1, -1),
        ];
        for coords in neighbors {
            self.push_entity_out_of_tile_if_blocked(entity, coords);
        }
    }

    fn push_entity_out_of_tile_if_blocked(&mut self, entity: &mut Entity, coords: IVec2) {
        let (box_min, box_max) = {
            let Some(tile) = self.tile_at(coords) else {
                return;
            };
            let def = self.catalog.def(tile.type_id);
            if !def.is_solid && !def.is_water {
                return;
            }
            if def.is_water && !def.is_solid && entity.can_swim {
                return;
            }
            tile.bounds()
        };
        let pushed = push_disc_out_of_fixed_aabb(
            &mut entity.position,
            entity.physics_radius,
            box_min,
            box_max,
        );

        // A projectile shoved out of a wall ricochets off it, with the normal
        // taken from the tile offset after the push.
        let reacts = matches!(
            entity.kind,
            EntityKind::GoodBolt
                | EntityKind::GoodBullet
                | EntityKind::EvilBolt
                | EntityKind::EvilBullet
        );
        if pushed && reacts {
            let home = floor_coords(entity.position);
            let offset = coords - home;
            let normal = Vec2::new(offset.x as f32, offset.y as f32).normalize_or_zero();
            if normal != Vec2::ZERO {
                agent::bounce_off(entity, normal, self);
            }
        }
    }

    fn check_for_bullet_hits(&mut self) {
        for bullet_faction in [Faction::Good, Faction::Evil] {
            let actor_faction = bullet_faction.opposing();
            let bullet_ids: Vec<EntityId> = self.registry.bullet_ids(bullet_faction).collect();
            let actor_ids: Vec<EntityId> = self.registry.actor_ids(actor_faction).collect();

            for bullet_id in bullet_ids {
                let Some(mut bullet) = self.registry.take_for_update(bullet_id) else {
                    continue;
                };
                if !bullet.is_dead {
                    for &actor_id in &actor_ids {
                        if bullet.is_dead {
                            break;
                        }
                        let Some(mut actor) = self.registry.take_for_update(actor_id) else {
                            continue;
                        };
                        if !actor.is_dead
                            && actor.is_hit_by_bullets
                            && do_discs_overlap(
                                bullet.position,
                                bullet.physics_radius,
                                actor.position,
                                actor.physics_radius,
                            )
                        {
                            agent::react_to_bullet_hit(&mut actor, &mut bullet, self);
                        }
                        self.registry.put_back(actor);
                    }
                }
                self.registry.put_back(bullet);
            }
        }
    }

    fn delete_garbage_entities(&mut self) {
        for id in self.registry.ids() {
            let is_garbage = self
                .registry
                .get(id)
                .is_some_and(|entity| entity.is_garbage);
            if !is_garbage {
                continue;
            }
            self.reset_heat_map_selection_if_removed(id);
            if let Some(entity) = self.registry.remove(id) {
                debug!("removed {:?} {:?}", entity.kind, id);
            }
        }
    }

    // --- debug heat-map cycling -------------------------------------------

    fn reset_heat_map_selection_if_removed(&mut self, id: EntityId) {
        if let Some(HeatMapKind::AgentGoal(slot)) = self.selected_heat_map {
            let selected = self
                .registry
                .actor_slots(Faction::Evil)
                .get(slot)
                .copied()
                .flatten();
            if selected == Some(id) {
                self.selected_heat_map = None;
                self.selected_agent_slot = 0;
            }
        }
    }

    /// Step the debug overlay: off, entry distance field, land solidity,
    /// amphibian solidity, a wandering evil tank's goal field, then off.
    pub fn cycle_heat_map(&mut self) {
        match self.selected_heat_map {
            None => self.selected_heat_map = Some(HeatMapKind::StartDistance),
            Some(HeatMapKind::StartDistance) => {
                self.selected_heat_map = Some(HeatMapKind::LandSolidity)
            }
            Some(HeatMapKind::LandSolidity) => {
                self.selected_heat_map = Some(HeatMapKind::AmphibianSolidity)
            }
            Some(HeatMapKind::AmphibianSolidity) => self.select_next_agent_goal(),
            Some(HeatMapKind::AgentGoal(_)) => {
                self.selected_heat_map = None;
                self.selected_agent_slot = 0;
            }
        }
    }

    /// Switch the overlay to the next live wandering evil tank's goal field,
    /// continuing from the last selection and wrapping. With no candidate
    /// alive the overlay turns off and the selection index resets.
    pub fn select_next_agent_goal(&mut self) {
        let slots_len = self.registry.actor_slots(Faction::Evil).len();
        let next = if slots_len == 0 {
            None
        } else {
            self.next_agent_goal_selection((self.selected_agent_slot + 1) % slots_len)
        };
        match next {
            Some(slot) => {
                self.selected_agent_slot = slot;
                self.selected_heat_map = Some(HeatMapKind::AgentGoal(slot));
            }
            None => {
                self.selected_agent_slot = 0;
                self.selected_heat_map = None;
            }
        }
    }

    /// First live non-Scorpio evil actor at or after `start_slot`, searching
    /// the raw view so the selection index survives unrelated removals.
    fn next_agent_goal_selection(&self, start_slot: usize) -> Option<usize> {
        let slots = self.registry.actor_slots(Faction::Evil);
        for offset in 0..slots.len() {
            let slot = (start_slot + offset) % slots.len();
            let Some(id) = slots[slot] else {
                continue;
            };
            let Some(entity) = self.registry.get(id) else {
                continue;
            };
            if !entity.is_dead && entity.kind != EntityKind::Scorpio {
                return Some(slot);
            }
        }
        None
    }

    pub fn current_heat_map(&self) -> Option<(&'static str, &TileHeatMap)> {
        match self.selected_heat_map? {
            HeatMapKind::StartDistance => {
                Some(("Distance Field from Map Entry", &self.start_distance_field))
            }
            HeatMapKind::LandSolidity => Some(("Solid Map for Land", &self.land_solidity)),
            HeatMapKind::AmphibianSolidity => {
                Some(("Solid Map for Amphibian", &self.amphibian_solidity))
            }
            HeatMapKind::AgentGoal(slot) => {
                let id = self
                    .registry
                    .actor_slots(Faction::Evil)
                    .get(slot)
                    .copied()
                    .flatten()?;
                let field = self.registry.get(id)?.goal_field.as_ref()?;
                Some(("Distance Field from Entity Goal Position", field))
            }
        }
    }
}

fn floor_coords(point: Vec2) -> IVec2 {
    IVec2::new(point.x.floor() as i32, point.y.floor() as i32)
}

/// Flag-gated separation: mutual pushers split the overlap, one-sided pushers
/// shove the other out entirely.
fn push_pair_apart(a: &mut Entity, b: &mut Entity) {
    let a_pushes_b = a.does_push_entities && b.is_pushed_by_entities;
    let b_pushes_a = b.does_push_entities && a.is_pushed_by_entities;

    if a_pushes_b && b_pushes_a {
        push_discs_out_of_each_other(
            &mut a.position,
            a.physics_radius,
            &mut b.position,
            b.physics_radius,
        );
    } else if a_pushes_b {
        push_disc_out_of_fixed_disc(
            &mut b.position,
            b.physics_radius,
            a.position,
            a.physics_radius,
        );
    } else if b_pushes_a {
        push_disc_out_of_fixed_disc(
            &mut a.position,
            a.physics_radius,
            b.position,
            b.physics_radius,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::tile::{Rgba8, TileTypeDef};

    fn catalog() -> Arc<TileCatalog> {
        Arc::new(
            TileCatalog::from_defs(vec![
                TileTypeDef::floor("Grass"),
                TileTypeDef::floor("Entry"),
                TileTypeDef::floor("Exit"),
                TileTypeDef::floor("StoneWall").solid(),
                TileTypeDef::floor("Water").water(),
                TileTypeDef::floor("Rubble"),
                TileTypeDef::floor("Brick")
                    .solid()
                    .destructible(3, "Rubble")
                    .with_map_color(Rgba8::new(150, 40, 40, 255)),
            ])
            .unwrap(),
        )
    }

    fn definition(dims: IVec2) -> MapDefinition {
        MapDefinition {
            name: "TestArena".to_owned(),
            dimensions: dims,
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
        }
    }

    fn context(seed: u64) -> SimContext {
        SimContext {
            catalog: catalog(),
            config: GameConfig::from_pairs([
                ("startAreaSize", serde_json::json!(3)),
                ("endAreaSize", serde_json::json!(3)),
            ]),
            seed,
        }
    }

    fn ten_by_ten() -> Map {
        Map::generate(&definition(IVec2::new(10, 10)), context(12345)).unwrap()
    }

    #[test]
    fn test_generated_map_relocates_default_exit() {
        let map = ten_by_ten();
        assert_eq!(map.definition().exit_coords, IVec2::new(8, 8));
        let exit_tile = map.tile_at(IVec2::new(8, 8)).unwrap();
        assert_eq!(map.catalog.def(exit_tile.type_id).name, "Exit");
    }

    #[test]
    fn test_generated_map_is_bordered_and_valid() {
        let map = ten_by_ten();
        for x in 0..10 {
            assert!(map.is_tile_solid(IVec2::new(x, 0)));
            assert!(map.is_tile_solid(IVec2::new(x, 9)));
        }
        for y in 0..10 {
            assert!(map.is_tile_solid(IVec2::new(0, y)));
            assert!(map.is_tile_solid(IVec2::new(9, y)));
        }
        // Exit reachable from entry.
        assert!(map.start_distance_field().value_at(IVec2::new(8, 8)) != map.heat_sentinel());
    }

    #[test]
    fn test_distance_field_counts_steps_and_marks_walls() {
        let map = ten_by_ten();
        let field = map.start_distance_field();
        assert_eq!(field.value_at(IVec2::new(1, 1)), 0.0);
        // Neighbors of the entry on open ground cost one step.
        let east = field.value_at(IVec2::new(2, 1));
        assert!(east == 1.0 || east == map.heat_sentinel());
        // Border walls keep the sentinel.
        assert_eq!(field.value_at(IVec2::new(0, 0)), map.heat_sentinel());
    }

    #[test]
    fn test_distance_field_is_monotonic() {
        let map = ten_by_ten();
        let field = map.start_distance_field();
        let sentinel = map.heat_sentinel();
        for y in 0..10 {
            for x in 0..10 {
                let coords = IVec2::new(x, y);
                let value = field.value_at(coords);
                if value == sentinel || value == 0.0 {
                    continue;
                }
                // Every reachable nonzero cell has a neighbor one step closer.
                let has_descent = [IVec2::NEG_Y, IVec2::NEG_X, IVec2::Y, IVec2::X]
                    .iter()
                    .any(|step| field.value_at(coords + *step) == value - 1.0);
                assert!(has_descent, "no descending neighbor at {coords:?}");
            }
        }
    }

    #[test]
    fn test_path_from_entry_area_reaches_exit() {
        let map = ten_by_ten();
        let mut field = TileHeatMap::new(map.dimensions(), 0.0);
        map.populate_distance_field(
            &mut field,
            IVec2::new(8, 8),
            DistanceFieldOptions::default(),
        );
        let path = field.generate_path(Vec2::new(1.5, 1.5), map.heat_sentinel());
        assert!(!path.is_empty());
        assert_eq!(path[0], Vec2::new(8.5, 8.5));
    }

    #[test]
    fn test_generation_gives_up_after_max_attempts() {
        // All-water interior: the flood fill never leaves the entry tile, so
        // the exit stays unreachable on every attempt.
        let mut def = definition(IVec2::new(6, 6));
        def.fill_tile_type = "Water".to_owned();
        def.start_floor_tile_type = "Water".to_owned();
        def.end_floor_tile_type = "Water".to_owned();
        def.entry_tile_type = "Water".to_owned();
        def.exit_tile_type = "Water".to_owned();
        let result = Map::generate(&def, context(5));
        assert!(matches!(
            result,
            Err(MapError::GenerationRetriesExhausted { attempts: 100, .. })
        ));
    }

    #[test]
    fn test_wall_push_ejects_tank_from_border() {
        let mut map = ten_by_ten();
        let id = map.spawn_entity(EntityKind::Leo, Vec2::new(1.1, 3.5), 0.0);
        map.push_entities_out_of_walls();
        let entity = map.entity(id).unwrap();
        // Physics radius 0.3 puts the resolved center at x >= 1.3.
        assert!(entity.position.x >= 1.3 - 1e-4);
    }

    #[test]
    fn test_wall_pushed_bullet_ricochets() {
        let mut map = ten_by_ten();
        // Westbound bolt overlapping the border wall.
        let id = map.spawn_entity(EntityKind::GoodBolt, Vec2::new(1.05, 5.5), 180.0);
        map.entity_mut(id).unwrap().is_pushed_by_walls = true;

        map.push_entities_out_of_walls();

        let bullet = map.entity(id).unwrap();
        assert!(bullet.position.x >= 1.1 - 1e-4);
        assert_eq!(bullet.wall_hit_count, 1);
        assert!(
            bullet.velocity.x > 0.0,
            "ricochet should reverse the x velocity"
        );
    }

    #[test]
    fn test_mutual_and_one_sided_pushes() {
        let mut map = ten_by_ten();
        let leo = map.spawn_entity(EntityKind::Leo, Vec2::new(4.5, 4.5), 0.0);
        let player = map.spawn_entity(EntityKind::Player, Vec2::new(4.8, 4.5), 0.0);
        map.push_entities_out_of_each_other();
        let leo_pos = map.entity(leo).unwrap().position;
        let player_pos = map.entity(player).unwrap().position;
        assert!(leo_pos.distance(player_pos) >= 0.6 - 1e-4);
        // Both moved: mutual push.
        assert!(leo_pos.x < 4.5);
        assert!(player_pos.x > 4.8);

        let scorpio = map.spawn_entity(EntityKind::Scorpio, Vec2::new(6.5, 6.5), 0.0);
        map.entity_mut(player).unwrap().position = Vec2::new(6.7, 6.5);
        map.push_entities_out_of_each_other();
        // Scorpio never moves; the player is shoved out alone.
        assert_eq!(map.entity(scorpio).unwrap().position, Vec2::new(6.5, 6.5));
        assert!(map.entity(player).unwrap().position.x >= 7.1 - 1e-4);
    }

    #[test]
    fn test_bullet_hit_damages_actor_and_removes_bullet() {
        let mut map = ten_by_ten();
        let leo = map.spawn_entity(EntityKind::Leo, Vec2::new(5.5, 5.5), 0.0);
        let bolt = map.spawn_entity(EntityKind::GoodBolt, Vec2::new(5.6, 5.5), 0.0);
        let health_before = map.entity(leo).unwrap().health;

        map.check_for_bullet_hits();
        map.delete_garbage_entities();

        assert_eq!(map.entity(leo).unwrap().health, health_before - 1);
        assert!(map.entity(bolt).is_none());
        // The bullet's death queued an explosion.
        map.flush_pending_spawns();
        assert_eq!(map.count_of_kind(EntityKind::Explosion), 1);
    }

    #[test]
    fn test_same_faction_bullet_does_not_hit() {
        let mut map = ten_by_ten();
        let leo = map.spawn_entity(EntityKind::Leo, Vec2::new(5.5, 5.5), 0.0);
        let bolt = map.spawn_entity(EntityKind::EvilBolt, Vec2::new(5.6, 5.5), 0.0);
        let health_before = map.entity(leo).unwrap().health;

        map.check_for_bullet_hits();

        assert_eq!(map.entity(leo).unwrap().health, health_before);
        assert!(map.entity(bolt).is_some());
    }

    #[test]
    fn test_garbage_sweep_frees_slot_for_reuse() {
        let mut map = ten_by_ten();
        let first = map.spawn_entity(EntityKind::Leo, Vec2::new(5.5, 5.5), 0.0);
        let second = map.spawn_entity(EntityKind::Aries, Vec2::new(6.5, 5.5), 0.0);
        map.entity_mut(first).unwrap().is_garbage = true;
        map.delete_garbage_entities();
        assert!(map.entity(first).is_none());
        assert!(map.entity(second).is_some());

        let reused = map.spawn_entity(EntityKind::Capricorn, Vec2::new(7.5, 5.5), 0.0);
        assert_eq!(reused, first);
    }

    #[test]
    fn test_heat_map_cycle_order() {
        let mut map = ten_by_ten();
        assert!(map.current_heat_map().is_none());
        map.cycle_heat_map();
        assert_eq!(
            map.current_heat_map().unwrap().0,
            "Distance Field from Map Entry"
        );
        map.cycle_heat_map();
        assert_eq!(map.current_heat_map().unwrap().0, "Solid Map for Land");
        map.cycle_heat_map();
        assert_eq!(
            map.current_heat_map().unwrap().0,
            "Solid Map for Amphibian"
        );
        // No wandering evil tanks on the map: selection falls back to off.
        map.cycle_heat_map();
        assert!(map.current_heat_map().is_none());
    }

    #[test]
    fn test_agent_goal_overlay_steps_through_evil_tanks() {
        let mut map = ten_by_ten();
        let leos: Vec<_> = (0..3)
            .map(|i| map.spawn_entity(EntityKind::Leo, Vec2::new(3.5 + i as f32, 5.5), 0.0))
            .collect();
        // One update lets each tank pick a goal and build its field.
        map.update(1.0 / 60.0);

        for _ in 0..4 {
            map.cycle_heat_map();
        }
        let (name, shown) = map.current_heat_map().unwrap();
        assert_eq!(name, "Distance Field from Entity Goal Position");
        // Selection advances from the persisted slot, so slot 1 comes first.
        assert!(std::ptr::eq(
            shown,
            map.entity(leos[1]).unwrap().goal_field.as_ref().unwrap()
        ));

        map.select_next_agent_goal();
        let (_, shown) = map.current_heat_map().unwrap();
        assert!(std::ptr::eq(
            shown,
            map.entity(leos[2]).unwrap().goal_field.as_ref().unwrap()
        ));

        // Leaving the agent overlay turns it off and resets the index.
        map.cycle_heat_map();
        assert!(map.current_heat_map().is_none());
    }

    #[test]
    fn test_bunker_points_are_protected() {
        let map = ten_by_ten();
        assert!(map.is_point_in_bunker(Vec2::new(1.5, 1.5)));
        assert!(map.is_point_in_bunker(Vec2::new(8.5, 8.5)));
        assert!(!map.is_point_in_bunker(Vec2::new(5.5, 2.5)));
    }

    #[test]
    fn test_line_of_sight_blocked_by_border() {
        let map = ten_by_ten();
        // Points on opposite sides of the border wall.
        assert!(!map.has_line_of_sight(Vec2::new(1.5, 1.5), Vec2::new(-1.0, 1.5)));
    }
}

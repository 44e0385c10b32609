//! Entities and the slot registry
//!
//! Every simulated object is one flat [`Entity`] tagged with an
//! [`EntityKind`]; per-kind behavior lives in `agent`. The registry keeps
//! entities in slot vectors where removal leaves a `None` hole and spawning
//! reuses the first hole, so an `EntityId` stays stable for the entity's
//! whole lifetime.

use glam::Vec2;

use crate::config::GameConfig;
use crate::consts::{
    BULLET_COSMETIC_RADIUS, BULLET_PHYSICS_RADIUS, TANK_COSMETIC_RADIUS, TANK_PHYSICS_RADIUS,
};
use crate::sim::heatmap::TileHeatMap;

/// Stable handle to a registry slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EntityId(pub usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Player,
    Scorpio,
    Leo,
    Aries,
    Capricorn,
    GoodBolt,
    GoodBullet,
    EvilBolt,
    EvilBullet,
    FlamethrowerBullet,
    Explosion,
}

pub const ENTITY_KIND_COUNT: usize = 11;

impl EntityKind {
    fn index(self) -> usize {
        match self {
            EntityKind::Player => 0,
            EntityKind::Scorpio => 1,
            EntityKind::Leo => 2,
            EntityKind::Aries => 3,
            EntityKind::Capricorn => 4,
            EntityKind::GoodBolt => 5,
            EntityKind::GoodBullet => 6,
            EntityKind::EvilBolt => 7,
            EntityKind::EvilBullet => 8,
            EntityKind::FlamethrowerBullet => 9,
            EntityKind::Explosion => 10,
        }
    }

    pub fn faction(self) -> Faction {
        match self {
            EntityKind::Player
            | EntityKind::GoodBolt
            | EntityKind::GoodBullet
            | EntityKind::FlamethrowerBullet => Faction::Good,
            EntityKind::Scorpio
            | EntityKind::Leo
            | EntityKind::Aries
            | EntityKind::Capricorn
            | EntityKind::EvilBolt
            | EntityKind::EvilBullet => Faction::Evil,
            EntityKind::Explosion => Faction::Neutral,
        }
    }

    pub fn is_bullet(self) -> bool {
        matches!(
            self,
            EntityKind::GoodBolt
                | EntityKind::GoodBullet
                | EntityKind::EvilBolt
                | EntityKind::EvilBullet
                | EntityKind::FlamethrowerBullet
        )
    }

    pub fn is_actor(self) -> bool {
        matches!(
            self,
            EntityKind::Player
                | EntityKind::Scorpio
                | EntityKind::Leo
                | EntityKind::Aries
                | EntityKind::Capricorn
        )
    }

    /// Good projectiles ricochet off walls; evil ones detonate on contact.
    pub fn bounces_off_walls(self) -> bool {
        matches!(self, EntityKind::GoodBolt | EntityKind::GoodBullet)
    }

    /// Evil bullets steer toward the player mid-flight.
    pub fn is_guided(self) -> bool {
        matches!(self, EntityKind::EvilBullet)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Faction {
    Good,
    Evil,
    Neutral,
}

pub const FACTION_COUNT: usize = 2;

impl Faction {
    /// Index into the faction-keyed registry lists; `Neutral` entities are
    /// not tracked per faction.
    pub fn list_index(self) -> Option<usize> {
        match self {
            Faction::Good => Some(0),
            Faction::Evil => Some(1),
            Faction::Neutral => None,
        }
    }

    pub fn opposing(self) -> Faction {
        match self {
            Faction::Good => Faction::Evil,
            Faction::Evil => Faction::Good,
            Faction::Neutral => Faction::Neutral,
        }
    }
}

/// Player weapon selection applied by [`PlayerIntent`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Weapon {
    #[default]
    Gun,
    Flamethrower,
}

/// Control inputs for the player tank, set once per frame by the host.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlayerIntent {
    /// Drive direction and throttle; length is clamped to 1.
    pub drive: Vec2,
    /// Desired turret heading in degrees, if aiming.
    pub aim_degrees: Option<f32>,
    pub weapon: Weapon,
    pub firing: bool,
}

/// One simulated object. All per-kind state is carried flat; fields unused by
/// a kind stay at their defaults.
#[derive(Debug, Clone)]
pub struct Entity {
    pub id: EntityId,
    pub kind: EntityKind,
    pub faction: Faction,

    pub position: Vec2,
    pub orientation_degrees: f32,
    pub angular_velocity: f32,
    pub velocity: Vec2,
    pub physics_radius: f32,
    pub cosmetic_radius: f32,
    pub scale: f32,

    pub health: i32,
    pub max_health: i32,
    pub is_dead: bool,
    pub is_garbage: bool,

    pub is_pushed_by_walls: bool,
    pub is_pushed_by_entities: bool,
    pub does_push_entities: bool,
    pub is_hit_by_bullets: bool,
    pub can_swim: bool,

    /// Turret heading for tanks with an independent gun.
    pub gun_orientation_degrees: f32,
    pub shoot_cooldown: f32,
    pub flamethrower_cooldown: f32,

    /// Chassis AI navigation state. The goal field is allocated lazily on
    /// first goal selection.
    pub goal_position: Vec2,
    pub path_points: Vec<Vec2>,
    pub next_waypoint: Vec2,
    pub goal_field: Option<TileHeatMap>,
    pub is_in_pursuit: bool,

    /// Projectile state.
    pub damage: i32,
    pub wall_hit_count: u32,
    pub age: f32,
    pub lifetime: f32,
}

impl Entity {
    pub fn new(
        id: EntityId,
        kind: EntityKind,
        position: Vec2,
        orientation_degrees: f32,
        config: &GameConfig,
    ) -> Self {
        let mut entity = Self {
            id,
            kind,
            faction: kind.faction(),
            position,
            orientation_degrees,
            angular_velocity: 0.0,
            velocity: Vec2::ZERO,
            physics_radius: 0.0,
            cosmetic_radius: 0.0,
            scale: 1.0,
            health: 1,
            max_health: 1,
            is_dead: false,
            is_garbage: false,
            is_pushed_by_walls: false,
            is_pushed_by_entities: false,
            does_push_entities: false,
            is_hit_by_bullets: false,
            can_swim: false,
            gun_orientation_degrees: orientation_degrees,
            shoot_cooldown: 0.0,
            flamethrower_cooldown: 0.0,
            goal_position: position,
            path_points: Vec::new(),
            next_waypoint: position,
            goal_field: None,
            is_in_pursuit: false,
            damage: 0,
            wall_hit_count: 0,
            age: 0.0,
            lifetime: 0.0,
        };

        match kind {
            EntityKind::Player => {
                entity.physics_radius = TANK_PHYSICS_RADIUS;
                entity.cosmetic_radius = TANK_COSMETIC_RADIUS;
                entity.max_health = config.get_i32("playerMaxHealth", 10);
                entity.is_pushed_by_walls = true;
                entity.is_pushed_by_entities = true;
                entity.does_push_entities = true;
                entity.is_hit_by_bullets = true;
            }
            EntityKind::Scorpio => {
                entity.physics_radius = TANK_PHYSICS_RADIUS;
                entity.cosmetic_radius = TANK_COSMETIC_RADIUS;
                entity.max_health = config.get_i32("scorpioMaxHealth", 5);
                // Stationary turret: other tanks never displace it.
                entity.is_pushed_by_walls = true;
                entity.does_push_entities = true;
                entity.is_hit_by_bullets = true;
            }
            EntityKind::Leo | EntityKind::Aries | EntityKind::Capricorn => {
                entity.physics_radius = TANK_PHYSICS_RADIUS;
                entity.cosmetic_radius = TANK_COSMETIC_RADIUS;
                entity.max_health = match kind {
                    EntityKind::Leo => config.get_i32("leoMaxHealth", 5),
                    EntityKind::Aries => config.get_i32("ariesMaxHealth", 5),
                    _ => config.get_i32("capricornMaxHealth", 5),
                };
                entity.is_pushed_by_walls = true;
                entity.is_pushed_by_entities = true;
                entity.does_push_entities = true;
                entity.is_hit_by_bullets = true;
                entity.can_swim = kind == EntityKind::Capricorn;
            }
            EntityKind::GoodBolt
            | EntityKind::GoodBullet
            | EntityKind::EvilBolt
            | EntityKind::EvilBullet
            | EntityKind::FlamethrowerBullet => {
                entity.physics_radius = BULLET_PHYSICS_RADIUS;
                entity.cosmetic_radius = BULLET_COSMETIC_RADIUS;
                entity.damage = 1;
                let speed = match kind {
                    EntityKind::GoodBullet | EntityKind::EvilBullet => {
                        config.get_f32("defaultBulletSpeed", 5.0)
                    }
                    EntityKind::GoodBolt | EntityKind::EvilBolt => {
                        config.get_f32("defaultBoltSpeed", 6.0)
                    }
                    _ => config.get_f32("defaultFlamethrowerBulletSpeed", 3.0),
                };
                entity.velocity = crate::vec2_from_polar_degrees(orientation_degrees, speed);
            }
            EntityKind::Explosion => {
                entity.lifetime = 0.4;
            }
        }

        entity.health = entity.max_health;
        entity
    }

    pub fn forward(&self) -> Vec2 {
        crate::vec2_from_polar_degrees(self.orientation_degrees, 1.0)
    }

    pub fn gun_forward(&self) -> Vec2 {
        crate::vec2_from_polar_degrees(self.gun_orientation_degrees, 1.0)
    }

}

/// Slot storage with per-kind and per-faction index views. Removal leaves a
/// `None` hole in every list the entity was registered in; insertion reuses
/// the first hole.
#[derive(Debug, Default)]
pub struct EntityRegistry {
    slots: Vec<Option<Entity>>,
    by_kind: [Vec<Option<EntityId>>; ENTITY_KIND_COUNT],
    bullets_by_faction: [Vec<Option<EntityId>>; FACTION_COUNT],
    actors_by_faction: [Vec<Option<EntityId>>; FACTION_COUNT],
}

fn add_to_list(list: &mut Vec<Option<EntityId>>, id: EntityId) {
    for slot in list.iter_mut() {
        if slot.is_none() {
            *slot = Some(id);
            return;
        }
    }
    list.push(Some(id));
}

fn remove_from_list(list: &mut [Option<EntityId>], id: EntityId) {
    for slot in list.iter_mut() {
        if *slot == Some(id) {
            *slot = None;
            return;
        }
    }
}

impl EntityRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Next id a spawn would receive, without inserting. Used to construct an
    /// entity before handing it over.
    pub fn next_id(&self) -> EntityId {
        for (index, slot) in self.slots.iter().enumerate() {
            if slot.is_none() {
                return EntityId(index);
            }
        }
        EntityId(self.slots.len())
    }

    /// Insert into the first free slot and every applicable index list. The
    /// entity's `id` must be the one `next_id` reported.
    pub fn insert(&mut self, entity: Entity) -> EntityId {
        let id = entity.id;
        debug_assert_eq!(id, self.next_id());
        let kind = entity.kind;
        let faction = entity.faction;

        if id.0 < self.slots.len() {
            self.slots[id.0] = Some(entity);
        } else {
            self.slots.push(Some(entity));
        }

        add_to_list(&mut self.by_kind[kind.index()], id);
        if let Some(faction_index) = faction.list_index() {
            if kind.is_bullet() {
                add_to_list(&mut self.bullets_by_faction[faction_index], id);
            }
            if kind.is_actor() {
                add_to_list(&mut self.actors_by_faction[faction_index], id);
            }
        }
        id
    }

    /// Null the entity's slot and every index entry pointing at it.
    pub fn remove(&mut self, id: EntityId) -> Option<Entity> {
        let entity = self.slots.get_mut(id.0)?.take()?;
        remove_from_list(&mut self.by_kind[entity.kind.index()], id);
        if let Some(faction_index) = entity.faction.list_index() {
            if entity.kind.is_bullet() {
                remove_from_list(&mut self.bullets_by_faction[faction_index], id);
            }
            if entity.kind.is_actor() {
                remove_from_list(&mut self.actors_by_faction[faction_index], id);
            }
        }
        Some(entity)
    }

    pub fn get(&self, id: EntityId) -> Option<&Entity> {
        self.slots.get(id.0)?.as_ref()
    }

    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.slots.get_mut(id.0)?.as_mut()
    }

    /// Lift an entity out of its slot for an update that also needs the map;
    /// pair with [`EntityRegistry::put_back`]. Index lists are untouched, so
    /// the slot must be refilled before the next registry mutation.
    pub fn take_for_update(&mut self, id: EntityId) -> Option<Entity> {
        self.slots.get_mut(id.0)?.take()
    }

    pub fn put_back(&mut self, entity: Entity) {
        let index = entity.id.0;
        debug_assert!(self.slots[index].is_none());
        self.slots[index] = Some(entity);
    }

    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Entity> {
        self.slots.iter().filter_map(|slot| slot.as_ref())
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Entity> {
        self.slots.iter_mut().filter_map(|slot| slot.as_mut())
    }

    pub fn ids(&self) -> Vec<EntityId> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(index, slot)| slot.as_ref().map(|_| EntityId(index)))
            .collect()
    }

    pub fn ids_of_kind(&self, kind: EntityKind) -> impl Iterator<Item = EntityId> + '_ {
        self.by_kind[kind.index()].iter().filter_map(|slot| *slot)
    }

    pub fn bullet_ids(&self, faction: Faction) -> impl Iterator<Item = EntityId> + '_ {
        faction
            .list_index()
            .into_iter()
            .flat_map(move |index| self.bullets_by_faction[index].iter().filter_map(|slot| *slot))
    }

    /// Raw actor view including holes, for callers that hold an index into it.
    pub fn actor_slots(&self, faction: Faction) -> &[Option<EntityId>] {
        match faction.list_index() {
            Some(index) => &self.actors_by_faction[index],
            None => &[],
        }
    }

    pub fn actor_ids(&self, faction: Faction) -> impl Iterator<Item = EntityId> + '_ {
        faction
            .list_index()
            .into_iter()
            .flat_map(move |index| self.actors_by_faction[index].iter().filter_map(|slot| *slot))
    }

    pub fn count_of_kind(&self, kind: EntityKind) -> usize {
        self.ids_of_kind(kind).count()
    }
}

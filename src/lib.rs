//! Tile Tanks - a top-down tank arena simulation core
//!
//! Core modules:
//! - `sim`: Deterministic simulation (tile grid, pathfinding, entities, combat)
//! - `config`: Data-driven tuning values with per-key defaults
//! - `rng`: Seeded RNG for reproducible map generation and AI
//!
//! Rendering, audio and input live outside this crate; the simulation is
//! driven by `Map::update` with an externally clamped delta time.

pub mod config;
pub mod rng;
pub mod sim;

pub use config::GameConfig;
pub use rng::GameRng;

use glam::Vec2;

/// Game configuration constants
pub mod consts {
    /// Cap on generate-validate attempts before map construction fails
    pub const MAX_MAP_GENERATION_ATTEMPTS: u32 = 100;

    /// Bullet bounces allowed before the bullet dies
    pub const MAX_BULLET_WALL_HITS: u32 = 3;

    /// Flamethrower bullet lifetime in seconds
    pub const FLAMETHROWER_BULLET_LIFETIME: f32 = 1.0;

    /// Firing interval for the flamethrower burst spawner
    pub const SECONDS_BETWEEN_FLAMETHROWER_BULLETS: f32 = 0.05;

    /// Default physics/cosmetic radii for tank chassis
    pub const TANK_PHYSICS_RADIUS: f32 = 0.3;
    pub const TANK_COSMETIC_RADIUS: f32 = 0.4;

    /// Bullet radii
    pub const BULLET_PHYSICS_RADIUS: f32 = 0.1;
    pub const BULLET_COSMETIC_RADIUS: f32 = 0.1;

    /// Drive speed for AI tank chassis (units per second)
    pub const AI_TANK_DRIVE_SPEED: f32 = 0.5;
}

/// Normalize an angle in degrees to [-180, 180)
#[inline]
pub fn normalize_degrees(mut degrees: f32) -> f32 {
    while degrees >= 180.0 {
        degrees -= 360.0;
    }
    while degrees < -180.0 {
        degrees += 360.0;
    }
    degrees
}

/// Shortest signed angular displacement from `from` to `to`, in degrees
#[inline]
pub fn shortest_angular_disp_degrees(from: f32, to: f32) -> f32 {
    normalize_degrees(to - from)
}

/// Turn `current` toward `goal` by at most `max_delta` degrees
pub fn turn_toward_degrees(current: f32, goal: f32, max_delta: f32) -> f32 {
    let disp = shortest_angular_disp_degrees(current, goal);
    if disp.abs() <= max_delta {
        goal
    } else {
        current + disp.signum() * max_delta
    }
}

/// Vector from a polar angle in degrees with the given length
#[inline]
pub fn vec2_from_polar_degrees(degrees: f32, length: f32) -> Vec2 {
    let radians = degrees.to_radians();
    Vec2::new(radians.cos(), radians.sin()) * length
}

/// Orientation of a vector in degrees
#[inline]
pub fn orientation_degrees(v: Vec2) -> f32 {
    v.y.atan2(v.x).to_degrees()
}

/// Unsigned angle between two vectors in degrees
pub fn angle_degrees_between(a: Vec2, b: Vec2) -> f32 {
    let denom = a.length() * b.length();
    if denom <= f32::EPSILON {
        return 0.0;
    }
    let cos = (a.dot(b) / denom).clamp(-1.0, 1.0);
    cos.acos().to_degrees()
}

/// Whether `point` lies inside the oriented sector centered on
/// `sector_forward_degrees` with the given aperture and radius
pub fn is_point_inside_oriented_sector(
    point: Vec2,
    sector_tip: Vec2,
    sector_forward_degrees: f32,
    sector_aperture_degrees: f32,
    sector_radius: f32,
) -> bool {
    let offset = point - sector_tip;
    if offset.length() > sector_radius {
        return false;
    }
    let forward = vec2_from_polar_degrees(sector_forward_degrees, 1.0);
    angle_degrees_between(forward, offset) <= 0.5 * sector_aperture_degrees
}

//! Disc collision detection and response
//!
//! Overlap tests and positional push-out between moving discs, fixed discs,
//! and fixed axis-aligned tile bounds, plus the reflection used for bullet
//! bounces.

use glam::Vec2;

/// True when two discs overlap; touching exactly does not count.
pub fn do_discs_overlap(center_a: Vec2, radius_a: f32, center_b: Vec2, radius_b: f32) -> bool {
    let radii = radius_a + radius_b;
    center_a.distance_squared(center_b) < radii * radii
}

/// Push a mobile disc out of a fixed disc along the line between centers.
/// Coincident centers are left untouched since there is no push direction.
pub fn push_disc_out_of_fixed_disc(
    mobile_center: &mut Vec2,
    mobile_radius: f32,
    fixed_center: Vec2,
    fixed_radius: f32,
) -> bool {
    if !do_discs_overlap(*mobile_center, mobile_radius, fixed_center, fixed_radius) {
        return false;
    }
    let offset = *mobile_center - fixed_center;
    let distance = offset.length();
    if distance == 0.0 {
        return false;
    }
    let overlap = mobile_radius + fixed_radius - distance;
    *mobile_center += (offset / distance) * overlap;
    true
}

/// Push two mobile discs apart symmetrically, each moving half the overlap.
pub fn push_discs_out_of_each_other(
    center_a: &mut Vec2,
    radius_a: f32,
    center_b: &mut Vec2,
    radius_b: f32,
) -> bool {
    if !do_discs_overlap(*center_a, radius_a, *center_b, radius_b) {
        return false;
    }
    let offset = *center_b - *center_a;
    let distance = offset.length();
    if distance == 0.0 {
        return false;
    }
    let half_overlap = 0.5 * (radius_a + radius_b - distance);
    let push = (offset / distance) * half_overlap;
    *center_a -= push;
    *center_b += push;
    true
}

/// Push a disc out of a fixed axis-aligned box via the nearest point on the
/// box. A center exactly on the box surface has no defined normal and is left
/// alone. Returns whether a push happened.
pub fn push_disc_out_of_fixed_aabb(
    center: &mut Vec2,
    radius: f32,
    box_min: Vec2,
    box_max: Vec2,
) -> bool {
    let nearest = center.clamp(box_min, box_max);
    let offset = *center - nearest;
    let distance_squared = offset.length_squared();
    if distance_squared >= radius * radius || distance_squared == 0.0 {
        return false;
    }
    let distance = distance_squared.sqrt();
    *center = nearest + (offset / distance) * radius;
    true
}

/// Reflect a velocity across a unit-length surface normal.
pub fn reflect(velocity: Vec2, normal: Vec2) -> Vec2 {
    velocity - 2.0 * velocity.dot(normal) * normal
}

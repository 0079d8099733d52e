//! Ray and box queries
//!
//! Every collider is an axis-aligned box centered on its entity. Rays test
//! those boxes with the slab method and march the terrain in fixed steps,
//! reporting whichever surface comes first.

use glam::Vec3;

use super::state::EntityId;
use super::terrain::HeightField;

/// Terrain march step along a ray (world units)
const TERRAIN_STEP: f32 = 0.25;

/// Axis-aligned bounding box
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    /// Box of the given full extents centered on `center`
    pub fn from_center(center: Vec3, size: Vec3) -> Self {
        let half = size.abs() * 0.5;
        Self {
            min: center - half,
            max: center + half,
        }
    }

    #[inline]
    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    #[inline]
    pub fn contains(&self, p: Vec3) -> bool {
        p.cmpge(self.min).all() && p.cmple(self.max).all()
    }

    /// Boxes overlap (touching counts)
    #[inline]
    pub fn intersects(&self, other: &Aabb) -> bool {
        self.min.cmple(other.max).all() && other.min.cmple(self.max).all()
    }

    /// Distance along a unit ray to the first point inside the box.
    ///
    /// A ray starting inside reports 0.
    pub fn ray_distance(&self, origin: Vec3, dir: Vec3, max_distance: f32) -> Option<f32> {
        let mut t_min = 0.0_f32;
        let mut t_max = max_distance;

        for axis in 0..3 {
            let o = origin[axis];
            let d = dir[axis];
            let lo = self.min[axis];
            let hi = self.max[axis];

            if d.abs() < 1e-8 {
                if o < lo || o > hi {
                    return None;
                }
                continue;
            }

            let inv = 1.0 / d;
            let mut t0 = (lo - o) * inv;
            let mut t1 = (hi - o) * inv;
            if t0 > t1 {
                std::mem::swap(&mut t0, &mut t1);
            }
            t_min = t_min.max(t0);
            t_max = t_max.min(t1);
            if t_min > t_max {
                return None;
            }
        }

        Some(t_min)
    }
}

/// What a ray can strike
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HitTarget {
    Terrain,
    Player,
    Enemy(EntityId),
    Pickup(EntityId),
}

/// A box that rays can hit
#[derive(Debug, Clone, Copy)]
pub struct Collider {
    pub target: HitTarget,
    pub bounds: Aabb,
}

/// First surface along a ray
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayHit {
    pub target: HitTarget,
    pub point: Vec3,
    pub distance: f32,
}

/// Cast a ray and return the nearest hit within `max_distance`.
///
/// `dir` need not be normalized; a zero direction never hits. Targets in
/// `ignore` are skipped. Terrain is only considered when `field` is given.
pub fn raycast(
    origin: Vec3,
    dir: Vec3,
    max_distance: f32,
    colliders: &[Collider],
    ignore: &[HitTarget],
    field: Option<&HeightField>,
) -> Option<RayHit> {
    let dir = dir.normalize_or_zero();
    if dir == Vec3::ZERO || !(max_distance > 0.0) || !origin.is_finite() {
        return None;
    }

    let mut best: Option<(HitTarget, f32)> = None;
    for collider in colliders {
        if ignore.contains(&collider.target) {
            continue;
        }
        if let Some(t) = collider.bounds.ray_distance(origin, dir, max_distance) {
            if best.is_none_or(|(_, b)| t < b) {
                best = Some((collider.target, t));
            }
        }
    }

    if let Some(field) = field {
        if !ignore.contains(&HitTarget::Terrain) {
            let limit = best.map_or(max_distance, |(_, b)| b);
            if let Some(t) = terrain_distance(field, origin, dir, limit) {
                best = Some((HitTarget::Terrain, t));
            }
        }
    }

    best.map(|(target, distance)| RayHit {
        target,
        point: origin + dir * distance,
        distance,
    })
}

/// March a unit ray until it dips below the stored terrain height
fn terrain_distance(field: &HeightField, origin: Vec3, dir: Vec3, max_distance: f32) -> Option<f32> {
    let mut t = TERRAIN_STEP;
    while t < max_distance {
        let p = origin + dir * t;
        if p.y < field.height(p.x, p.z) {
            return Some(t);
        }
        t += TERRAIN_STEP;
    }
    None
}

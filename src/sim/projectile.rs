//! Projectiles and impact markers

use glam::Vec3;

use super::collision::{Collider, HitTarget, RayHit, raycast};
use super::terrain::HeightField;

/// A projectile entity
#[derive(Debug, Clone)]
pub struct Projectile {
    pub position: Vec3,
    /// Unit travel direction
    pub direction: Vec3,
    pub speed: f32,
    /// Seconds left before it fizzles
    pub lifetime: f32,
    pub damage: f32,
}

/// What a projectile did this tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ProjectileStep {
    /// Still flying
    Moved,
    /// Lifetime ran out, no effect
    Expired,
    /// Struck something and must be destroyed
    Hit(RayHit),
}

impl Projectile {
    pub fn new(position: Vec3, direction: Vec3, speed: f32, lifetime: f32, damage: f32) -> Self {
        Self {
            position,
            direction: direction.normalize_or_zero(),
            speed,
            lifetime,
            damage,
        }
    }

    /// Count down, then sweep the path for this tick.
    ///
    /// The player is never a candidate; everything in `colliders` and the
    /// terrain are.
    pub fn step(&mut self, dt: f32, colliders: &[Collider], field: &HeightField) -> ProjectileStep {
        self.lifetime -= dt;
        if self.lifetime <= 0.0 {
            return ProjectileStep::Expired;
        }

        let travel = self.speed * dt;
        if let Some(hit) = raycast(
            self.position,
            self.direction,
            travel,
            colliders,
            &[HitTarget::Player],
            Some(field),
        ) {
            return ProjectileStep::Hit(hit);
        }

        self.position += self.direction * travel;
        ProjectileStep::Moved
    }
}

/// Visual-only flash where a projectile struck something
#[derive(Debug, Clone, Copy)]
pub struct ImpactMarker {
    pub position: Vec3,
    /// Seconds remaining
    pub ttl: f32,
    /// Initial lifetime, for the shrink animation
    pub duration: f32,
}

impl ImpactMarker {
    /// Initial visual scale
    pub const SCALE: f32 = 0.5;

    pub fn new(position: Vec3, duration: f32) -> Self {
        Self {
            position,
            ttl: duration,
            duration,
        }
    }

    /// Advance; returns false once expired
    pub fn update(&mut self, dt: f32) -> bool {
        self.ttl -= dt;
        self.ttl > 0.0
    }

    /// Current scale, shrinking linearly to zero
    pub fn scale(&self) -> f32 {
        if self.duration <= 0.0 {
            return 0.0;
        }
        Self::SCALE * (self.ttl / self.duration).clamp(0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::collision::Aabb;
    use crate::sim::state::EntityId;

    #[test]
    fn test_flies_straight_then_expires() {
        let field = HeightField::flat(16, 16, 0.0);
        let start = Vec3::new(0.0, 50.0, 0.0);
        let dir = Vec3::new(1.0, 0.0, 1.0).normalize();
        let mut p = Projectile::new(start, dir, 50.0, 2.0, 25.0);

        let dt = 0.1;
        for _ in 0..19 {
            assert_eq!(p.step(dt, &[], &field), ProjectileStep::Moved);
        }
        let expected = start + dir * 50.0 * 1.9;
        assert!((p.position - expected).length() < 1e-2);

        let mut expired = false;
        for _ in 0..2 {
            if p.step(dt, &[], &field) == ProjectileStep::Expired {
                expired = true;
                break;
            }
        }
        assert!(expired, "projectile outlived its 2s lifetime");
    }

    #[test]
    fn test_stops_at_first_enemy() {
        let field = HeightField::flat(16, 16, 0.0);
        let enemy = Collider {
            target: HitTarget::Enemy(EntityId(3)),
            bounds: Aabb::from_center(Vec3::new(2.0, 5.0, 0.0), Vec3::splat(1.0)),
        };
        let mut p = Projectile::new(Vec3::new(0.0, 5.0, 0.0), Vec3::X, 50.0, 2.0, 25.0);
        match p.step(0.1, &[enemy], &field) {
            ProjectileStep::Hit(hit) => {
                assert_eq!(hit.target, HitTarget::Enemy(EntityId(3)));
                assert!((hit.point.x - 1.5).abs() < 1e-4);
            }
            other => panic!("expected hit, got {:?}", other),
        }
        // Position is not advanced on the hit tick
        assert_eq!(p.position, Vec3::new(0.0, 5.0, 0.0));
    }

    #[test]
    fn test_passes_through_player() {
        let field = HeightField::flat(16, 16, 0.0);
        let player = Collider {
            target: HitTarget::Player,
            bounds: Aabb::from_center(Vec3::new(1.0, 5.0, 0.0), Vec3::ONE),
        };
        let mut p = Projectile::new(Vec3::new(0.0, 5.0, 0.0), Vec3::X, 50.0, 2.0, 25.0);
        assert_eq!(p.step(0.1, &[player], &field), ProjectileStep::Moved);
    }

    #[test]
    fn test_terrain_hit() {
        let field = HeightField::flat(16, 16, 3.0);
        let mut p = Projectile::new(Vec3::new(0.0, 4.0, 0.0), -Vec3::Y, 50.0, 2.0, 25.0);
        match p.step(0.1, &[], &field) {
            ProjectileStep::Hit(hit) => assert_eq!(hit.target, HitTarget::Terrain),
            other => panic!("expected terrain hit, got {:?}", other),
        }
    }

    #[test]
    fn test_impact_marker_shrinks() {
        let mut m = ImpactMarker::new(Vec3::ZERO, 0.2);
        assert_eq!(m.scale(), ImpactMarker::SCALE);
        assert!(m.update(0.1));
        assert!((m.scale() - 0.25).abs() < 1e-4);
        assert!(!m.update(0.15));
    }
}

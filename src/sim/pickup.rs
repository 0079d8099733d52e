//! Health and armor pickups
//!
//! Pickups hover where they spawn and spin in place. The player collects one
//! by touching it or by shooting it.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use super::collision::Aabb;
use super::state::{DamageOutcome, Damageable};
use crate::renderer::colors;

/// Spin rate in degrees per second
const SPIN_RATE: f32 = 100.0;

/// Pickup types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PickupKind {
    HealthPill,
    ArmorPickup,
}

impl PickupKind {
    /// Collider extents
    pub fn size(&self) -> Vec3 {
        match self {
            PickupKind::HealthPill => Vec3::new(0.5, 0.2, 0.2),
            PickupKind::ArmorPickup => Vec3::splat(0.3),
        }
    }

    pub fn color(&self) -> [f32; 3] {
        match self {
            PickupKind::HealthPill => colors::HEALTH_PILL,
            PickupKind::ArmorPickup => colors::ARMOR_PICKUP,
        }
    }
}

/// A pickup entity
#[derive(Debug, Clone)]
pub struct Pickup {
    pub kind: PickupKind,
    pub position: Vec3,
    /// Health or armor granted
    pub amount: f32,
    /// Cosmetic yaw in degrees
    pub spin: f32,
}

impl Pickup {
    pub fn new(kind: PickupKind, position: Vec3, amount: f32) -> Self {
        Self {
            kind,
            position,
            amount,
            spin: 0.0,
        }
    }

    pub fn bounds(&self) -> Aabb {
        Aabb::from_center(self.position, self.kind.size())
    }

    pub fn update(&mut self, dt: f32) {
        self.spin = (self.spin + SPIN_RATE * dt).rem_euclid(360.0);
    }

    /// Player box overlaps this pickup
    pub fn touches(&self, player: &Aabb) -> bool {
        self.bounds().intersects(player)
    }
}

impl Damageable for Pickup {
    fn take_damage(&mut self, amount: f32) -> DamageOutcome {
        if amount >= 1.0 {
            DamageOutcome::Collected {
                kind: self.kind,
                amount: self.amount,
            }
        } else {
            DamageOutcome::Ignored
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shot_collects() {
        let mut p = Pickup::new(PickupKind::ArmorPickup, Vec3::ZERO, 50.0);
        assert_eq!(
            p.take_damage(25.0),
            DamageOutcome::Collected {
                kind: PickupKind::ArmorPickup,
                amount: 50.0
            }
        );
        assert_eq!(p.take_damage(0.5), DamageOutcome::Ignored);
    }

    #[test]
    fn test_touch() {
        let p = Pickup::new(PickupKind::HealthPill, Vec3::new(0.0, 1.0, 0.0), 50.0);
        let near = Aabb::from_center(Vec3::new(0.5, 1.0, 0.0), Vec3::new(1.0, 2.0, 1.0));
        let far = Aabb::from_center(Vec3::new(0.0, 21.0, 0.0), Vec3::new(1.0, 2.0, 1.0));
        assert!(p.touches(&near));
        assert!(!p.touches(&far));
    }

    #[test]
    fn test_spin_wraps() {
        let mut p = Pickup::new(PickupKind::HealthPill, Vec3::ZERO, 50.0);
        p.update(4.0);
        assert!(p.spin >= 0.0 && p.spin < 360.0);
        assert!((p.spin - 40.0).abs() < 1e-3);
    }
}

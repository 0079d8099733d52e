//! The player and their weapon

use glam::Vec3;
use rand::Rng;

use super::collision::Aabb;
use super::projectile::Projectile;
use super::state::{Body, DamageOutcome, Damageable};
use super::terrain::HeightField;
use crate::tuning::{PlayerTuning, WeaponTuning};

/// Player collider extents
pub const PLAYER_SIZE: Vec3 = Vec3::new(1.0, 2.0, 1.0);

/// Pitch limit in degrees
const MAX_PITCH: f32 = 90.0;

/// The player character
#[derive(Debug, Clone)]
pub struct Player {
    pub body: Body,
    pub health: f32,
    pub max_health: f32,
    pub armor: f32,
    pub max_armor: f32,
    pub score: u64,
    /// Heading in degrees; 0 faces +Z
    pub yaw: f32,
    /// Look elevation in degrees, positive is up
    pub pitch: f32,
    /// Moved this tick (drives footstep audio)
    pub moving: bool,
    dead: bool,
    mitigation: f32,
    absorption: f32,
}

impl Player {
    pub fn new(tuning: &PlayerTuning) -> Self {
        Self {
            body: Body::new(Vec3::from_array(tuning.spawn)),
            health: tuning.max_health,
            max_health: tuning.max_health,
            armor: tuning.max_armor,
            max_armor: tuning.max_armor,
            score: 0,
            yaw: 0.0,
            pitch: 0.0,
            moving: false,
            dead: false,
            mitigation: tuning.damage_mitigation,
            absorption: tuning.armor_absorption,
        }
    }

    /// Restore stats and position for a new run
    pub fn reset(&mut self, tuning: &PlayerTuning) {
        *self = Self::new(tuning);
    }

    #[inline]
    pub fn position(&self) -> Vec3 {
        self.body.position
    }

    #[inline]
    pub fn is_alive(&self) -> bool {
        !self.dead
    }

    pub fn bounds(&self) -> Aabb {
        Aabb::from_center(self.body.position, PLAYER_SIZE)
    }

    /// Horizontal facing
    pub fn forward(&self) -> Vec3 {
        let yaw = self.yaw.to_radians();
        Vec3::new(yaw.sin(), 0.0, yaw.cos())
    }

    /// Horizontal right-hand direction
    pub fn right(&self) -> Vec3 {
        let yaw = self.yaw.to_radians();
        Vec3::new(yaw.cos(), 0.0, -yaw.sin())
    }

    /// Full look direction including pitch
    pub fn aim(&self) -> Vec3 {
        let yaw = self.yaw.to_radians();
        let pitch = self.pitch.to_radians();
        Vec3::new(
            yaw.sin() * pitch.cos(),
            pitch.sin(),
            yaw.cos() * pitch.cos(),
        )
    }

    pub fn eye(&self, eye_height: f32) -> Vec3 {
        self.body.position + Vec3::Y * eye_height
    }

    /// Rotate the view by a pointer delta
    pub fn look(&mut self, delta: glam::Vec2, speed: f32) {
        if !delta.is_finite() {
            return;
        }
        self.yaw = (self.yaw + delta.x * speed).rem_euclid(360.0);
        self.pitch = (self.pitch - delta.y * speed).clamp(-MAX_PITCH, MAX_PITCH);
    }

    /// Move directly along the view basis; no inertia.
    ///
    /// `forward_axis` and `right_axis` are in [-1, 1].
    pub fn walk(&mut self, forward_axis: f32, right_axis: f32, run: bool, dt: f32, tuning: &PlayerTuning) {
        let intent = self.forward() * forward_axis + self.right() * right_axis;
        let dir = intent.normalize_or_zero();
        self.moving = dir != Vec3::ZERO;
        if !self.moving {
            return;
        }
        let speed = tuning.walk_speed * if run { tuning.run_multiplier } else { 1.0 };
        self.body.position += dir * speed * dt;
    }

    /// Jump if standing on the ground; returns whether it happened
    pub fn jump(&mut self, impulse: f32) -> bool {
        if !self.body.grounded || self.dead {
            return false;
        }
        self.body.velocity.y = impulse;
        self.body.grounded = false;
        true
    }

    /// Gravity and grounding
    pub fn update_physics(&mut self, dt: f32, gravity: f32, field: &HeightField) {
        if self.dead {
            return;
        }
        self.body.fall(dt, gravity);
        self.body.settle(field);
    }

    /// Heal up to max; does nothing once dead
    pub fn heal(&mut self, amount: f32) {
        if self.health > 0.0 && !self.dead {
            self.health = (self.health + amount).clamp(0.0, self.max_health);
        }
    }

    pub fn add_armor(&mut self, amount: f32) {
        self.armor = (self.armor + amount).clamp(0.0, self.max_armor);
    }
}

impl Damageable for Player {
    /// Mitigate, let armor soak its share, then hit health
    fn take_damage(&mut self, amount: f32) -> DamageOutcome {
        if self.dead {
            return DamageOutcome::Ignored;
        }
        let mut amount = amount.max(0.0) * self.mitigation;
        if self.armor > 0.0 {
            let soaked = self.armor.min(amount * self.absorption);
            self.armor = (self.armor - soaked).max(0.0);
            amount = (amount - soaked).max(0.0);
        }
        self.health = (self.health - amount).max(0.0);

        if self.health <= 0.0 {
            self.dead = true;
            DamageOutcome::Died
        } else {
            DamageOutcome::Hurt
        }
    }
}

/// Three-barrel spread gun
#[derive(Debug, Clone)]
pub struct Weapon {
    pub enabled: bool,
    cooldown: f32,
}

impl Default for Weapon {
    fn default() -> Self {
        Self::new()
    }
}

impl Weapon {
    pub fn new() -> Self {
        Self {
            enabled: false,
            cooldown: 0.0,
        }
    }

    pub fn update(&mut self, dt: f32) {
        if self.cooldown > 0.0 {
            self.cooldown -= dt;
        }
    }

    pub fn ready(&self) -> bool {
        self.enabled && self.cooldown <= 0.0
    }

    /// Fire from `eye` along `aim`: one centered shot and two jittered ones.
    ///
    /// Returns no projectiles while disabled or cooling down.
    pub fn fire<R: Rng + ?Sized>(
        &mut self,
        eye: Vec3,
        aim: Vec3,
        tuning: &WeaponTuning,
        rng: &mut R,
    ) -> Vec<Projectile> {
        if !self.ready() {
            return Vec::new();
        }
        self.cooldown = tuning.fire_cooldown;

        let aim = aim.normalize_or_zero();
        let spread = tuning.spread.abs();
        let mut jitter = || {
            if spread > 0.0 {
                Vec3::new(
                    rng.random_range(-spread..=spread),
                    rng.random_range(-spread..=spread),
                    rng.random_range(-spread..=spread),
                )
            } else {
                Vec3::ZERO
            }
        };

        let dirs = [aim, (aim + jitter()).normalize_or_zero(), (aim + jitter()).normalize_or_zero()];
        dirs.iter()
            .filter(|d| **d != Vec3::ZERO)
            .map(|d| {
                Projectile::new(
                    eye + *d * tuning.muzzle_offset,
                    *d,
                    tuning.projectile_speed,
                    tuning.projectile_lifetime,
                    tuning.projectile_damage,
                )
            })
            .collect()
    }
}

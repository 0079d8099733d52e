//! Enemy cubes
//!
//! An enemy falls until grounded, then hunts the player when it can see
//! them within its search radius. Horizontal velocity blends toward the
//! desired chase velocity, and nearby enemies push each other apart so they
//! don't stack. Anything standing on snow is stuck for good.

use glam::Vec3;
use rand::Rng;
use rand::seq::IndexedRandom;

use super::collision::{Aabb, Collider, HitTarget, raycast};
use super::state::{Body, DamageOutcome, Damageable, EntityId};
use super::terrain::HeightField;
use crate::lerp_color;
use crate::renderer::colors;
use crate::tuning::EnemyTuning;

/// What the enemy did on its last update
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnemyState {
    /// Player out of range or out of sight
    Idle,
    /// Closing in on the player
    Pursuing,
    /// Standing on snow; no further behavior
    Stranded,
}

/// Inputs shared by every enemy update in a tick
pub struct EnemyContext<'a> {
    pub tuning: &'a EnemyTuning,
    pub gravity: f32,
    pub field: &'a HeightField,
    pub player: Vec3,
    /// Player, enemies and pickups, as of the start of the tick
    pub colliders: &'a [Collider],
}

/// A hostile cube
#[derive(Debug, Clone)]
pub struct Enemy {
    pub body: Body,
    pub health: f32,
    pub max_health: f32,
    /// Base edge length; the box is `size × 2·size × size`
    pub size: f32,
    /// Palette color chosen at spawn
    pub base_color: [f32; 3],
    /// Displayed color, fading toward white as health drops
    pub color: [f32; 3],
    pub state: EnemyState,
    /// Hit points dealt per attack
    pub damage: f32,
    attack_timer: f32,
    dead: bool,
}

impl Enemy {
    pub fn new(position: Vec3, size: f32, base_color: [f32; 3], tuning: &EnemyTuning) -> Self {
        let size = size.max(0.01);
        let reference = tuning.min_size.max(0.01);
        Self {
            body: Body::new(position),
            health: tuning.health,
            max_health: tuning.health,
            size,
            base_color,
            color: base_color,
            state: EnemyState::Idle,
            damage: tuning.base_damage * (size / reference),
            attack_timer: 0.0,
            dead: false,
        }
    }

    /// Random size and palette color
    pub fn random<R: Rng + ?Sized>(position: Vec3, tuning: &EnemyTuning, rng: &mut R) -> Self {
        let (lo, hi) = if tuning.min_size < tuning.max_size {
            (tuning.min_size, tuning.max_size)
        } else {
            (tuning.max_size, tuning.min_size)
        };
        let size = if lo < hi { rng.random_range(lo..hi) } else { lo };
        let color = colors::ENEMY_PALETTE
            .choose(rng)
            .copied()
            .unwrap_or(colors::WHITE);
        Self::new(position, size, color, tuning)
    }

    #[inline]
    pub fn position(&self) -> Vec3 {
        self.body.position
    }

    pub fn extents(&self) -> Vec3 {
        Vec3::new(self.size, self.size * 2.0, self.size)
    }

    pub fn bounds(&self) -> Aabb {
        Aabb::from_center(self.body.position, self.extents())
    }

    #[inline]
    pub fn is_dead(&self) -> bool {
        self.dead
    }

    /// Run physics and AI for one tick.
    ///
    /// Returns the damage to deal to the player if an attack landed.
    pub fn update(&mut self, id: EntityId, dt: f32, ctx: &EnemyContext) -> Option<f32> {
        if self.dead {
            return None;
        }
        let tuning = ctx.tuning;

        self.body.fall(dt, ctx.gravity);
        self.body.settle(ctx.field);

        let pos = self.body.position;
        if ctx.field.biome_at(pos.x, pos.z).is_unreachable() {
            self.state = EnemyState::Stranded;
            return None;
        }

        let mut attack = None;
        let to_player = ctx.player - pos;
        let dist = to_player.length();
        self.state = EnemyState::Idle;

        if dist < tuning.search_radius && self.sees_player(id, to_player, dist, ctx) {
            self.state = EnemyState::Pursuing;

            let desired = to_player.normalize_or_zero() * tuning.speed;
            let blend = (tuning.steering_gain * dt).clamp(0.0, 1.0);
            self.body.velocity.x += (desired.x - self.body.velocity.x) * blend;
            self.body.velocity.z += (desired.z - self.body.velocity.z) * blend;
            self.body.position.x += self.body.velocity.x * dt;
            self.body.position.z += self.body.velocity.z * dt;

            if dist < tuning.attack_range {
                self.attack_timer -= dt;
                if self.attack_timer <= 0.0 {
                    self.attack_timer = tuning.attack_cooldown;
                    attack = Some(self.damage);
                }
            }
        }

        self.separate(id, dt, ctx);
        attack
    }

    /// Unobstructed ray from this enemy to the player
    fn sees_player(&self, id: EntityId, to_player: Vec3, dist: f32, ctx: &EnemyContext) -> bool {
        raycast(
            self.body.position,
            to_player,
            dist,
            ctx.colliders,
            &[HitTarget::Enemy(id)],
            Some(ctx.field),
        )
        .is_some_and(|hit| hit.target == HitTarget::Player)
    }

    /// Push away from any other enemy that is too close
    fn separate(&mut self, id: EntityId, dt: f32, ctx: &EnemyContext) {
        let radius = ctx.tuning.separation_radius;
        let strength = ctx.tuning.separation_strength;
        for other in ctx.colliders {
            let HitTarget::Enemy(other_id) = other.target else {
                continue;
            };
            if other_id == id {
                continue;
            }
            let away = self.body.position - other.bounds.center();
            if away.length() < radius {
                self.body.position += away.normalize_or_zero() * dt * strength;
            }
        }
    }
}

impl Damageable for Enemy {
    fn take_damage(&mut self, amount: f32) -> DamageOutcome {
        if self.dead {
            return DamageOutcome::Ignored;
        }
        self.health -= amount.max(0.0);
        if self.health <= 0.0 {
            self.dead = true;
            return DamageOutcome::Died;
        }
        let ratio = if self.max_health > 0.0 {
            self.health / self.max_health
        } else {
            0.0
        };
        self.color = lerp_color(colors::WHITE, self.base_color, ratio);
        DamageOutcome::Hurt
    }
}

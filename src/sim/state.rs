//! Shared simulation types and the live-entity registry
//!
//! The registry owns every transient entity (enemies, projectiles, pickups)
//! as a closed set of tagged variants, kept in id order so iteration is
//! stable. Entities never own each other; cross references are ids.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use super::enemy::Enemy;
use super::pickup::{Pickup, PickupKind};
use super::projectile::Projectile;
use super::terrain::HeightField;

/// Unique identifier for a registry entity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityId(pub u32);

/// Current phase of the session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    /// Main menu, nothing simulates
    Menu,
    /// Active gameplay
    Playing,
    /// Gameplay frozen, music keeps going
    Paused,
    /// Player died; end-of-run summary is up
    GameOver,
}

/// Things that happened during a tick, for UI and tests
#[derive(Debug, Clone, PartialEq)]
pub enum GameEvent {
    PhaseChanged { from: GamePhase, to: GamePhase },
    EnemySpawned { id: EntityId, position: Vec3 },
    EnemyKilled { id: EntityId, position: Vec3 },
    EnemyDespawned { id: EntityId },
    PlayerDamaged { amount: f32, health: f32, armor: f32 },
    PlayerDied,
    PickupSpawned { id: EntityId, kind: PickupKind },
    PickupCollected { id: EntityId, kind: PickupKind },
    ShotFired,
    ProjectileImpact { point: Vec3 },
    Narration(String),
}

/// Result of handing damage to something that accepts it
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DamageOutcome {
    /// Took the hit and is still alive
    Hurt,
    /// This hit was lethal (reported once)
    Died,
    /// Already dead, or the hit was too small to matter
    Ignored,
    /// A pickup was struck and should be handed to the player
    Collected { kind: PickupKind, amount: f32 },
}

/// Capability of taking damage
pub trait Damageable {
    fn take_damage(&mut self, amount: f32) -> DamageOutcome;
}

/// Position, velocity and ground contact shared by walking entities
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Body {
    pub position: Vec3,
    pub velocity: Vec3,
    pub grounded: bool,
}

impl Body {
    pub fn new(position: Vec3) -> Self {
        Self {
            position,
            velocity: Vec3::ZERO,
            grounded: false,
        }
    }

    /// Integrate gravity while airborne
    #[inline]
    pub fn fall(&mut self, dt: f32, gravity: f32) {
        if !self.grounded {
            self.velocity.y += gravity * dt;
            self.position.y += self.velocity.y * dt;
        }
    }

    /// Resolve against the terrain: at or below `height + 1` snaps to ground
    pub fn settle(&mut self, field: &HeightField) {
        let ground = field.height(self.position.x, self.position.z) + 1.0;
        if self.position.y <= ground {
            self.position.y = ground;
            self.velocity.y = 0.0;
            self.grounded = true;
        } else {
            self.grounded = false;
        }
    }

    #[inline]
    pub fn is_finite(&self) -> bool {
        self.position.is_finite() && self.velocity.is_finite()
    }
}

/// Variant payload of a registry entity
#[derive(Debug, Clone)]
pub enum EntityKind {
    Enemy(Enemy),
    Projectile(Projectile),
    Pickup(Pickup),
}

/// A live registry entity
#[derive(Debug, Clone)]
pub struct Entity {
    pub id: EntityId,
    pub kind: EntityKind,
}

impl Entity {
    pub fn position(&self) -> Vec3 {
        match &self.kind {
            EntityKind::Enemy(e) => e.body.position,
            EntityKind::Projectile(p) => p.position,
            EntityKind::Pickup(p) => p.position,
        }
    }

    pub fn as_enemy(&self) -> Option<&Enemy> {
        match &self.kind {
            EntityKind::Enemy(e) => Some(e),
            _ => None,
        }
    }

    pub fn as_projectile(&self) -> Option<&Projectile> {
        match &self.kind {
            EntityKind::Projectile(p) => Some(p),
            _ => None,
        }
    }

    pub fn as_pickup(&self) -> Option<&Pickup> {
        match &self.kind {
            EntityKind::Pickup(p) => Some(p),
            _ => None,
        }
    }

    /// The damage capability of this variant, if it has one
    pub fn damageable(&mut self) -> Option<&mut dyn Damageable> {
        match &mut self.kind {
            EntityKind::Enemy(e) => Some(e),
            EntityKind::Pickup(p) => Some(p),
            EntityKind::Projectile(_) => None,
        }
    }
}

/// Registry of live entities
#[derive(Debug, Clone)]
pub struct World {
    /// Sorted by id
    entities: Vec<Entity>,
    next_id: u32,
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

impl World {
    pub fn new() -> Self {
        Self {
            entities: Vec::new(),
            next_id: 1,
        }
    }

    /// Add an entity and return its id
    pub fn spawn(&mut self, kind: EntityKind) -> EntityId {
        let id = EntityId(self.next_id);
        self.next_id += 1;
        // Ids only grow, so pushing keeps the vector sorted
        self.entities.push(Entity { id, kind });
        id
    }

    /// Remove an entity, returning it if it was live
    pub fn remove(&mut self, id: EntityId) -> Option<Entity> {
        let idx = self.index_of(id)?;
        Some(self.entities.remove(idx))
    }

    pub fn get(&self, id: EntityId) -> Option<&Entity> {
        self.index_of(id).map(|i| &self.entities[i])
    }

    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.index_of(id).map(move |i| &mut self.entities[i])
    }

    pub fn contains(&self, id: EntityId) -> bool {
        self.index_of(id).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Entity> {
        self.entities.iter()
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Drop every entity (ids keep counting up)
    pub fn clear(&mut self) {
        self.entities.clear();
    }

    pub fn enemy_ids(&self) -> Vec<EntityId> {
        self.ids_where(|e| matches!(e.kind, EntityKind::Enemy(_)))
    }

    pub fn projectile_ids(&self) -> Vec<EntityId> {
        self.ids_where(|e| matches!(e.kind, EntityKind::Projectile(_)))
    }

    pub fn pickup_ids(&self) -> Vec<EntityId> {
        self.ids_where(|e| matches!(e.kind, EntityKind::Pickup(_)))
    }

    pub fn enemies(&self) -> impl Iterator<Item = (EntityId, &Enemy)> {
        self.entities
            .iter()
            .filter_map(|e| e.as_enemy().map(|enemy| (e.id, enemy)))
    }

    pub fn projectiles(&self) -> impl Iterator<Item = (EntityId, &Projectile)> {
        self.entities
            .iter()
            .filter_map(|e| e.as_projectile().map(|p| (e.id, p)))
    }

    pub fn pickups(&self) -> impl Iterator<Item = (EntityId, &Pickup)> {
        self.entities
            .iter()
            .filter_map(|e| e.as_pickup().map(|p| (e.id, p)))
    }

    pub fn enemy_count(&self) -> usize {
        self.enemies().count()
    }

    pub fn projectile_count(&self) -> usize {
        self.projectiles().count()
    }

    pub fn pickup_count(&self) -> usize {
        self.pickups().count()
    }

    fn ids_where(&self, pred: impl Fn(&Entity) -> bool) -> Vec<EntityId> {
        self.entities.iter().filter(|e| pred(e)).map(|e| e.id).collect()
    }

    fn index_of(&self, id: EntityId) -> Option<usize> {
        self.entities.binary_search_by_key(&id, |e| e.id).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pickup(x: f32) -> EntityKind {
        EntityKind::Pickup(Pickup::new(PickupKind::HealthPill, Vec3::new(x, 0.0, 0.0), 50.0))
    }

    #[test]
    fn test_registry_ids_and_lookup() {
        let mut world = World::new();
        let a = world.spawn(pickup(1.0));
        let b = world.spawn(pickup(2.0));
        let c = world.spawn(pickup(3.0));
        assert!(a < b && b < c);
        assert_eq!(world.len(), 3);

        let removed = world.remove(b).unwrap();
        assert_eq!(removed.id, b);
        assert!(world.remove(b).is_none());
        assert!(!world.contains(b));
        assert_eq!(world.get(c).unwrap().position().x, 3.0);
        assert_eq!(world.pickup_ids(), vec![a, c]);

        world.clear();
        let d = world.spawn(pickup(4.0));
        assert!(d > c);
    }

    #[test]
    fn test_body_falls_and_lands() {
        let field = HeightField::flat(8, 8, 2.0);
        let mut body = Body::new(Vec3::new(1.0, 10.0, 1.0));
        let mut ticks = 0;
        while !body.grounded && ticks < 1000 {
            body.fall(0.05, -20.0);
            body.settle(&field);
            ticks += 1;
        }
        assert!(body.grounded);
        assert_eq!(body.position.y, 3.0);
        assert_eq!(body.velocity.y, 0.0);
    }

    #[test]
    fn test_body_leaves_ground_over_a_drop() {
        let mut samples = vec![0.0; 4 * 4];
        samples[0] = 5.0;
        let field = HeightField::from_samples(4, 4, samples).unwrap();
        let mut body = Body::new(Vec3::new(0.5, 6.0, 0.5));
        body.settle(&field);
        assert!(body.grounded);

        body.position.x = 2.5;
        body.settle(&field);
        assert!(!body.grounded);
        body.fall(0.1, -20.0);
        assert!(body.velocity.y < 0.0);
    }
}

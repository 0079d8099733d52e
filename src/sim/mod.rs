//! Simulation module
//!
//! All gameplay logic lives here:
//! - Seeded RNG only (one `Pcg32` per session)
//! - Stable iteration order (registry sorted by entity id)
//! - No rendering, audio or speech dependencies beyond the collaborator traits

pub mod chunk;
pub mod collision;
pub mod enemy;
pub mod pickup;
pub mod player;
pub mod projectile;
pub mod session;
pub mod state;
pub mod terrain;
pub mod tick;

pub use chunk::{ChunkKey, ChunkMesh, ChunkStreamer};
pub use collision::{Aabb, Collider, HitTarget, RayHit, raycast};
pub use enemy::{Enemy, EnemyState};
pub use pickup::{Pickup, PickupKind};
pub use player::{Player, Weapon};
pub use projectile::{ImpactMarker, Projectile, ProjectileStep};
pub use session::{RunSummary, Services, Session, Timers};
pub use state::{
    Body, DamageOutcome, Damageable, Entity, EntityId, EntityKind, GameEvent, GamePhase, World,
};
pub use terrain::{Biome, HeightField};
pub use tick::{TickInput, tick};

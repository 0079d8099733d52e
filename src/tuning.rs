//! Data-driven game balance
//!
//! Every gameplay constant lives here so a JSON file can override it.
//! Missing sections and fields fall back to the defaults below.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Terrain generation and streaming
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TerrainTuning {
    /// Height-field grid width (samples along X)
    pub width: usize,
    /// Height-field grid depth (samples along Z)
    pub depth: usize,
    /// Gaussian smoothing sigma, in samples
    pub correlation_length: f32,
    /// Target standard deviation of the final field
    pub amplitude: f32,
    /// Superimpose the low-frequency ridge oscillation
    pub ridges: bool,
    /// Chunk edge length in world units
    pub chunk_size: u32,
    /// Chebyshev radius of live chunks around the player chunk
    pub render_distance: i32,
}

impl Default for TerrainTuning {
    fn default() -> Self {
        Self {
            width: 64,
            depth: 64,
            correlation_length: 4.0,
            amplitude: 8.0,
            ridges: true,
            chunk_size: 16,
            render_distance: 3,
        }
    }
}

/// Player movement and survivability
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerTuning {
    pub spawn: [f32; 3],
    pub max_health: f32,
    pub max_armor: f32,
    /// Walk speed (units/s)
    pub walk_speed: f32,
    /// Speed multiplier while run is held
    pub run_multiplier: f32,
    pub jump_impulse: f32,
    /// Fraction of incoming damage that is applied at all
    pub damage_mitigation: f32,
    /// Fraction of mitigated damage that armor soaks up
    pub armor_absorption: f32,
    /// Degrees of rotation per unit of pointer delta
    pub look_speed: f32,
    /// Camera height above the body center
    pub eye_height: f32,
}

impl Default for PlayerTuning {
    fn default() -> Self {
        Self {
            spawn: [32.0, 5.0, 32.0],
            max_health: 100.0,
            max_armor: 100.0,
            walk_speed: 5.0,
            run_multiplier: 2.0,
            jump_impulse: 15.0,
            damage_mitigation: 0.4,
            armor_absorption: 0.7,
            look_speed: 40.0,
            eye_height: 1.5,
        }
    }
}

/// Enemy AI
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnemyTuning {
    pub health: f32,
    pub speed: f32,
    pub search_radius: f32,
    pub attack_range: f32,
    pub attack_cooldown: f32,
    /// Damage of a size-1.5 enemy; scales linearly with size
    pub base_damage: f32,
    /// Gain of the velocity-matching steering
    pub steering_gain: f32,
    pub separation_radius: f32,
    pub separation_strength: f32,
    pub min_size: f32,
    pub max_size: f32,
    pub despawn_distance: f32,
    pub kill_score: u64,
    pub drop_chance: f32,
    /// Share of drops that are health rather than armor
    pub health_drop_share: f32,
}

impl Default for EnemyTuning {
    fn default() -> Self {
        Self {
            health: 100.0,
            speed: 6.0,
            search_radius: 25.0,
            attack_range: 5.0,
            attack_cooldown: 1.5,
            base_damage: 15.0,
            steering_gain: 5.0,
            separation_radius: 1.5,
            separation_strength: 2.0,
            min_size: 1.5,
            max_size: 4.0,
            despawn_distance: 50.0,
            kill_score: 50,
            drop_chance: 0.3,
            health_drop_share: 0.7,
        }
    }
}

/// Weapon and projectiles
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WeaponTuning {
    pub fire_cooldown: f32,
    pub projectile_speed: f32,
    pub projectile_lifetime: f32,
    pub projectile_damage: f32,
    /// Per-axis jitter of the two flanking shots
    pub spread: f32,
    /// Distance in front of the eye where shots appear
    pub muzzle_offset: f32,
    pub impact_lifetime: f32,
}

impl Default for WeaponTuning {
    fn default() -> Self {
        Self {
            fire_cooldown: 0.2,
            projectile_speed: 50.0,
            projectile_lifetime: 2.0,
            projectile_damage: 25.0,
            spread: 0.02,
            muzzle_offset: 2.0,
            impact_lifetime: 0.2,
        }
    }
}

/// Timed spawns and narration cadence
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpawnTuning {
    pub initial_enemies: usize,
    pub enemy_interval: f32,
    pub min_distance: f32,
    pub max_distance: f32,
    /// Height above terrain where new enemies appear
    pub drop_height: f32,
    pub pickup_interval: f32,
    /// Half-extent of the square around the player where pickups appear
    pub pickup_spread: f32,
    pub pickup_height: f32,
    pub health_pickup_share: f32,
    pub heal_amount: f32,
    pub armor_amount: f32,
    pub quote_interval: f32,
}

impl Default for SpawnTuning {
    fn default() -> Self {
        Self {
            initial_enemies: 8,
            enemy_interval: 3.0,
            min_distance: 15.0,
            max_distance: 30.0,
            drop_height: 20.0,
            pickup_interval: 15.0,
            pickup_spread: 20.0,
            pickup_height: 20.0,
            health_pickup_share: 0.7,
            heal_amount: 50.0,
            armor_amount: 50.0,
            quote_interval: 20.0,
        }
    }
}

/// Complete balance sheet
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    pub terrain: TerrainTuning,
    pub player: PlayerTuning,
    pub enemy: EnemyTuning,
    pub weapon: WeaponTuning,
    pub spawn: SpawnTuning,
    /// Vertical acceleration (negative is down)
    pub gravity: f32,
    /// Time dilation applied while the game-over screen is up
    pub game_over_time_scale: f32,
    /// Longest frame step the simulation will integrate
    pub max_frame_dt: f32,
    /// Narration queue bound
    pub narration_queue: usize,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            terrain: TerrainTuning::default(),
            player: PlayerTuning::default(),
            enemy: EnemyTuning::default(),
            weapon: WeaponTuning::default(),
            spawn: SpawnTuning::default(),
            gravity: -20.0,
            game_over_time_scale: 0.2,
            max_frame_dt: 0.1,
            narration_queue: 32,
        }
    }
}

impl Tuning {
    /// Load tuning from a JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let json = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&json)?)
    }

    /// Load tuning, falling back to defaults on any error
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        match Self::load(path) {
            Ok(tuning) => {
                log::info!("Loaded tuning from {}", path.display());
                tuning
            }
            Err(e) => {
                log::warn!("Using default tuning ({}): {}", path.display(), e);
                Self::default()
            }
        }
    }
}

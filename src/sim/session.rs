//! Session controller
//!
//! Owns the terrain, the player, the entity registry and the timers, and
//! sequences Menu → Playing ⇄ Paused → GameOver. UI code drives it through
//! the entry points here; the per-frame work lives in [`super::tick`].

use glam::Vec3;
use rand::seq::IndexedRandom;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::chunk::ChunkStreamer;
use super::enemy::Enemy;
use super::pickup::{Pickup, PickupKind};
use super::player::{Player, Weapon};
use super::projectile::ImpactMarker;
use super::state::{Damageable, DamageOutcome, EntityId, EntityKind, GameEvent, GamePhase, World};
use super::terrain::HeightField;
use crate::audio::{AudioManager, SoundEffect};
use crate::narration::{
    DEATH_PHRASES, ENEMY_DEATH_PHRASES, INTRO_LINE, NarrationSink,
    SilentNarrator, WELCOME_BACK_LINE,
};
use crate::renderer::{HeadlessRenderer, RenderSink};
use crate::settings::Settings;
use crate::tuning::Tuning;
use crate::{bearing_to_dir, dir_to_bearing};

/// External collaborators the session talks to
pub struct Services {
    pub audio: AudioManager,
    pub narrator: Box<dyn NarrationSink>,
    pub renderer: Box<dyn RenderSink>,
}

impl Services {
    /// Silent audio, silent narration, mesh bookkeeping only
    pub fn headless() -> Self {
        Self {
            audio: AudioManager::disabled(),
            narrator: Box::new(SilentNarrator),
            renderer: Box::new(HeadlessRenderer::new()),
        }
    }
}

/// Recurring-event countdowns (seconds accumulated since the last firing)
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Timers {
    pub pickup: f32,
    pub enemy: f32,
    pub quote: f32,
}

/// End-of-run numbers for the game-over screen
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub score: u64,
    pub kills: u32,
    /// Seconds spent in the Playing phase
    pub survived: f32,
}

/// One play session
pub struct Session {
    pub(crate) tuning: Tuning,
    pub(crate) settings: Settings,
    pub(crate) rng: Pcg32,
    pub(crate) field: HeightField,
    pub(crate) chunks: ChunkStreamer,
    pub(crate) player: Player,
    pub(crate) weapon: Weapon,
    pub(crate) world: World,
    pub(crate) impacts: Vec<ImpactMarker>,
    pub(crate) phase: GamePhase,
    pub(crate) timers: Timers,
    pub(crate) quote_index: usize,
    pub(crate) time_scale: f32,
    pub(crate) pointer_captured: bool,
    pub(crate) running: bool,
    pub(crate) kills: u32,
    pub(crate) survived: f32,
    pub(crate) events: Vec<GameEvent>,
    pub(crate) services: Services,
}

impl Session {
    /// Generate terrain from `seed` and wait in the menu
    pub fn new(seed: u64, tuning: Tuning, settings: Settings, services: Services) -> Self {
        let mut rng = Pcg32::seed_from_u64(seed);
        let t = &tuning.terrain;
        let field = HeightField::generate(
            t.width,
            t.depth,
            t.correlation_length,
            t.amplitude,
            t.ridges,
            &mut rng,
        );
        Self::with_field_and_rng(field, rng, tuning, settings, services)
    }

    /// Use a prepared landscape instead of generating one
    pub fn with_field(
        seed: u64,
        field: HeightField,
        tuning: Tuning,
        settings: Settings,
        services: Services,
    ) -> Self {
        Self::with_field_and_rng(field, Pcg32::seed_from_u64(seed), tuning, settings, services)
    }

    fn with_field_and_rng(
        field: HeightField,
        rng: Pcg32,
        tuning: Tuning,
        settings: Settings,
        mut services: Services,
    ) -> Self {
        let settings = settings.sanitized();
        services.audio.apply_settings(&settings);
        let chunks = ChunkStreamer::new(tuning.terrain.chunk_size, tuning.terrain.render_distance);
        let player = Player::new(&tuning.player);
        Self {
            tuning,
            settings,
            rng,
            field,
            chunks,
            player,
            weapon: Weapon::new(),
            world: World::new(),
            impacts: Vec::new(),
            phase: GamePhase::Menu,
            timers: Timers::default(),
            quote_index: 0,
            time_scale: 1.0,
            pointer_captured: false,
            running: true,
            kills: 0,
            survived: 0.0,
            events: Vec::new(),
            services,
        }
    }

    // === Entry points ===

    /// Menu → Playing
    pub fn start_game(&mut self) {
        if !self.running || self.phase != GamePhase::Menu {
            log::warn!("start_game ignored in {:?}", self.phase);
            return;
        }
        self.clear_run();
        self.services.audio.play(SoundEffect::Start);
        self.enter_play();
        self.narrate(INTRO_LINE);
    }

    /// Playing → Paused
    pub fn pause_game(&mut self) {
        if !self.running || self.phase != GamePhase::Playing {
            log::warn!("pause_game ignored in {:?}", self.phase);
            return;
        }
        self.weapon.enabled = false;
        self.pointer_captured = false;
        // Music keeps playing through the pause
        self.services.audio.stop(SoundEffect::Footstep);
        self.set_phase(GamePhase::Paused);
    }

    /// Paused → Playing
    pub fn resume_game(&mut self) {
        if !self.running || self.phase != GamePhase::Paused {
            log::warn!("resume_game ignored in {:?}", self.phase);
            return;
        }
        self.weapon.enabled = true;
        self.pointer_captured = true;
        self.services.audio.ensure_playing(SoundEffect::Music);
        self.set_phase(GamePhase::Playing);
    }

    /// GameOver → Playing with a fresh world
    pub fn reset_game(&mut self) {
        if !self.running || self.phase != GamePhase::GameOver {
            log::warn!("reset_game ignored in {:?}", self.phase);
            return;
        }
        self.clear_run();
        self.enter_play();
        self.narrate(WELCOME_BACK_LINE);
    }

    /// GameOver → Menu
    pub fn return_to_menu(&mut self) {
        if !self.running || self.phase != GamePhase::GameOver {
            log::warn!("return_to_menu ignored in {:?}", self.phase);
            return;
        }
        self.weapon.enabled = false;
        self.pointer_captured = false;
        self.time_scale = 1.0;
        self.set_phase(GamePhase::Menu);
    }

    /// Shut the session down; later ticks do nothing
    pub fn quit(&mut self) {
        if !self.running {
            return;
        }
        log::info!("Session closing");
        self.running = false;
        self.timers = Timers::default();
        self.weapon.enabled = false;
        self.pointer_captured = false;
        self.services.audio.stop(SoundEffect::Music);
        self.services.audio.stop(SoundEffect::Footstep);
        self.services.narrator.close();
    }

    pub fn set_sound_enabled(&mut self, enabled: bool) {
        self.settings.sound_enabled = enabled;
        self.services.audio.set_muted(!enabled);
        if enabled && matches!(self.phase, GamePhase::Playing | GamePhase::Paused) {
            self.services.audio.ensure_playing(SoundEffect::Music);
        }
    }

    pub fn set_speech_enabled(&mut self, enabled: bool) {
        self.settings.speech_enabled = enabled;
    }

    /// Hurt the player; a lethal hit ends the run
    pub fn damage_player(&mut self, amount: f32) {
        if self.phase != GamePhase::Playing {
            return;
        }
        let outcome = self.player.take_damage(amount);
        if outcome == DamageOutcome::Ignored {
            return;
        }
        self.events.push(GameEvent::PlayerDamaged {
            amount,
            health: self.player.health,
            armor: self.player.armor,
        });
        if outcome == DamageOutcome::Died {
            self.enter_game_over();
        }
    }

    /// Spawn one enemy around the player at a random bearing
    pub fn spawn_enemy(&mut self) -> EntityId {
        self.spawn_enemy_around(false)
    }

    /// Spawn a random enemy at an exact position
    pub fn spawn_enemy_at(&mut self, position: Vec3) -> EntityId {
        let enemy = Enemy::random(position, &self.tuning.enemy, &mut self.rng);
        let id = self.world.spawn(EntityKind::Enemy(enemy));
        log::debug!("Spawned enemy {:?} at {:?}", id, position);
        self.events.push(GameEvent::EnemySpawned { id, position });
        id
    }

    /// Timer pickup: random offset above the player
    pub fn spawn_pickup(&mut self) -> EntityId {
        let spawn = &self.tuning.spawn;
        let spread = spawn.pickup_spread.abs();
        let (dx, dz) = if spread > 0.0 {
            (
                self.rng.random_range(-spread..=spread),
                self.rng.random_range(-spread..=spread),
            )
        } else {
            (0.0, 0.0)
        };
        let position = self.player.position() + Vec3::new(dx, spawn.pickup_height, dz);
        let kind = if self.rng.random::<f32>() < spawn.health_pickup_share {
            PickupKind::HealthPill
        } else {
            PickupKind::ArmorPickup
        };
        self.spawn_pickup_at(kind, position)
    }

    pub fn spawn_pickup_at(&mut self, kind: PickupKind, position: Vec3) -> EntityId {
        let amount = match kind {
            PickupKind::HealthPill => self.tuning.spawn.heal_amount,
            PickupKind::ArmorPickup => self.tuning.spawn.armor_amount,
        };
        let id = self
            .world
            .spawn(EntityKind::Pickup(Pickup::new(kind, position, amount)));
        log::debug!("Spawned {:?} {:?} at {:?}", kind, id, position);
        self.events.push(GameEvent::PickupSpawned { id, kind });
        id
    }

    // === Accessors ===

    pub fn phase(&self) -> GamePhase {
        self.phase
    }

    pub fn health(&self) -> f32 {
        self.player.health
    }

    pub fn armor(&self) -> f32 {
        self.player.armor
    }

    pub fn score(&self) -> u64 {
        self.player.score
    }

    pub fn time_scale(&self) -> f32 {
        self.time_scale
    }

    pub fn pointer_captured(&self) -> bool {
        self.pointer_captured
    }

    pub fn weapon_enabled(&self) -> bool {
        self.weapon.enabled
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn player(&self) -> &Player {
        &self.player
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn field(&self) -> &HeightField {
        &self.field
    }

    pub fn chunks(&self) -> &ChunkStreamer {
        &self.chunks
    }

    pub fn impacts(&self) -> &[ImpactMarker] {
        &self.impacts
    }

    pub fn tuning(&self) -> &Tuning {
        &self.tuning
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn timers(&self) -> Timers {
        self.timers
    }

    /// Index of the last quote spoken
    pub fn quote_index(&self) -> usize {
        self.quote_index
    }

    pub fn summary(&self) -> RunSummary {
        RunSummary {
            score: self.player.score,
            kills: self.kills,
            survived: self.survived,
        }
    }

    /// Take the events recorded since the last drain
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    // === Internals shared with the tick ===

    pub(super) fn set_phase(&mut self, to: GamePhase) {
        let from = self.phase;
        if from == to {
            return;
        }
        log::info!("Phase {:?} -> {:?}", from, to);
        self.phase = to;
        self.events.push(GameEvent::PhaseChanged { from, to });
    }

    /// Speak a line if speech is on; subtitles always get it
    pub(super) fn narrate(&mut self, text: &str) {
        if self.settings.speech_enabled {
            self.services.narrator.say(text);
        }
        self.events.push(GameEvent::Narration(text.to_string()));
    }

    pub(super) fn enter_game_over(&mut self) {
        if self.phase == GamePhase::GameOver {
            return;
        }
        self.time_scale = self.tuning.game_over_time_scale;
        self.weapon.enabled = false;
        self.pointer_captured = false;
        self.services.audio.stop(SoundEffect::Music);
        self.services.audio.stop(SoundEffect::Footstep);
        self.services.audio.play(SoundEffect::Death);
        self.events.push(GameEvent::PlayerDied);
        self.set_phase(GamePhase::GameOver);
        if let Some(line) = DEATH_PHRASES.choose(&mut self.rng) {
            self.narrate(line);
        }
        let summary = self.summary();
        log::info!(
            "Run over: score {}, kills {}, survived {:.1}s",
            summary.score,
            summary.kills,
            summary.survived
        );
    }

    /// Remove a dead enemy, roll its drop and award the kill
    pub(super) fn kill_enemy(&mut self, id: EntityId) {
        let Some(entity) = self.world.remove(id) else {
            debug_assert!(false, "killed enemy {:?} not in registry", id);
            return;
        };
        let position = entity.position();
        self.player.score += self.tuning.enemy.kill_score;
        self.kills += 1;
        self.services.audio.play(SoundEffect::CubeDeath);
        self.events.push(GameEvent::EnemyKilled { id, position });
        if let Some(line) = ENEMY_DEATH_PHRASES.choose(&mut self.rng) {
            self.narrate(line);
        }

        let enemy = &self.tuning.enemy;
        if self.rng.random::<f32>() < enemy.drop_chance {
            let kind = if self.rng.random::<f32>() < enemy.health_drop_share {
                PickupKind::HealthPill
            } else {
                PickupKind::ArmorPickup
            };
            self.spawn_pickup_at(kind, position);
        }
    }

    /// Hand a pickup's contents to the player and remove it
    pub(super) fn collect_pickup(&mut self, id: EntityId, kind: PickupKind, amount: f32) {
        if self.world.remove(id).is_none() {
            return;
        }
        match kind {
            PickupKind::HealthPill => {
                self.player.heal(amount);
                self.services.audio.play(SoundEffect::HealthPickup);
            }
            PickupKind::ArmorPickup => {
                self.player.add_armor(amount);
                self.services.audio.play(SoundEffect::ArmorPickup);
            }
        }
        self.events.push(GameEvent::PickupCollected { id, kind });
    }

    /// Place an enemy 15-30 units out, facing the player's heading when running
    pub(super) fn spawn_enemy_around(&mut self, running: bool) -> EntityId {
        let spawn = &self.tuning.spawn;
        let (lo, hi) = (spawn.min_distance.min(spawn.max_distance), spawn.max_distance.max(spawn.min_distance));
        let distance = if lo < hi { self.rng.random_range(lo..hi) } else { lo };
        let bearing = if running {
            dir_to_bearing(self.player.forward())
        } else {
            self.rng.random_range(0.0..360.0)
        };

        let origin = self.player.position();
        let dir = bearing_to_dir(bearing);
        let (mut x, mut z) = (origin.x + dir.x * distance, origin.z + dir.z * distance);

        // Too close on the ground plane: push out along the same bearing
        let d = ((x - origin.x).powi(2) + (z - origin.z).powi(2)).sqrt();
        if d < spawn.min_distance {
            let push = spawn.min_distance - d + 1.0;
            x += dir.x * push;
            z += dir.z * push;
        }

        let y = self.field.height(x, z) + spawn.drop_height;
        self.spawn_enemy_at(Vec3::new(x, y, z))
    }

    /// Wipe every run-scoped thing back to a fresh start
    fn clear_run(&mut self) {
        self.world.clear();
        self.impacts.clear();
        self.player.reset(&self.tuning.player);
        self.weapon = Weapon::new();
        self.timers = Timers::default();
        self.quote_index = 0;
        self.kills = 0;
        self.survived = 0.0;
    }

    /// Common tail of start and restart
    fn enter_play(&mut self) {
        self.time_scale = 1.0;
        self.services.audio.ensure_playing(SoundEffect::Music);
        for _ in 0..self.tuning.spawn.initial_enemies {
            self.spawn_enemy();
        }
        self.chunks.maintain(
            &self.field,
            self.player.position(),
            self.services.renderer.as_mut(),
        );
        self.pointer_captured = true;
        self.weapon.enabled = true;
        self.set_phase(GamePhase::Playing);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session() -> Session {
        Session::with_field(
            7,
            HeightField::flat(64, 64, 0.0),
            Tuning::default(),
            Settings::default(),
            Services::headless(),
        )
    }

    #[test]
    fn test_starts_in_menu() {
        let s = session();
        assert_eq!(s.phase(), GamePhase::Menu);
        assert!(!s.weapon_enabled());
        assert!(!s.pointer_captured());
        assert!(s.world().is_empty());
    }

    #[test]
    fn test_start_pause_resume() {
        let mut s = session();
        s.start_game();
        assert_eq!(s.phase(), GamePhase::Playing);
        assert!(s.weapon_enabled());
        assert!(s.pointer_captured());
        assert_eq!(s.world().enemy_count(), 8);
        assert!(!s.chunks().is_empty());
        let events = s.drain_events();
        assert!(events.contains(&GameEvent::Narration(INTRO_LINE.to_string())));

        s.pause_game();
        assert_eq!(s.phase(), GamePhase::Paused);
        assert!(!s.weapon_enabled());
        assert!(!s.pointer_captured());

        s.resume_game();
        assert_eq!(s.phase(), GamePhase::Playing);
        assert!(s.weapon_enabled());
        assert!(s.pointer_captured());
    }

    #[test]
    fn test_invalid_transitions_are_noops() {
        let mut s = session();
        s.pause_game();
        s.resume_game();
        s.reset_game();
        s.return_to_menu();
        assert_eq!(s.phase(), GamePhase::Menu);
        s.start_game();
        s.start_game();
        assert_eq!(s.world().enemy_count(), 8);
    }

    #[test]
    fn test_lethal_damage_transitions_once() {
        let mut s = session();
        s.start_game();
        s.drain_events();
        s.damage_player(10_000.0);
        s.damage_player(10_000.0);
        assert_eq!(s.phase(), GamePhase::GameOver);
        assert_eq!(s.health(), 0.0);
        let transitions = s
            .drain_events()
            .into_iter()
            .filter(|e| {
                matches!(
                    e,
                    GameEvent::PhaseChanged {
                        to: GamePhase::GameOver,
                        ..
                    }
                )
            })
            .count();
        assert_eq!(transitions, 1);
        assert!((s.time_scale() - 0.2).abs() < 1e-6);
        assert!(!s.weapon_enabled());
        assert!(!s.pointer_captured());
    }

    #[test]
    fn test_reset_restores_fresh_run() {
        let mut s = session();
        s.start_game();
        s.player.score = 500;
        s.spawn_pickup();
        s.damage_player(10_000.0);
        assert_eq!(s.phase(), GamePhase::GameOver);

        s.reset_game();
        assert_eq!(s.phase(), GamePhase::Playing);
        assert_eq!(s.health(), 100.0);
        assert_eq!(s.armor(), 100.0);
        assert_eq!(s.score(), 0);
        assert_eq!(s.world().enemy_count(), 8);
        assert_eq!(s.world().projectile_count(), 0);
        assert_eq!(s.world().pickup_count(), 0);
        assert_eq!(s.player().position(), Vec3::new(32.0, 5.0, 32.0));
        assert_eq!(s.time_scale(), 1.0);
        assert!(s.pointer_captured());
        assert!(
            s.drain_events()
                .contains(&GameEvent::Narration(WELCOME_BACK_LINE.to_string()))
        );
    }

    #[test]
    fn test_return_to_menu_after_game_over() {
        let mut s = session();
        s.start_game();
        s.damage_player(10_000.0);
        s.return_to_menu();
        assert_eq!(s.phase(), GamePhase::Menu);
        s.start_game();
        assert_eq!(s.phase(), GamePhase::Playing);
        assert_eq!(s.health(), 100.0);
        assert_eq!(s.world().enemy_count(), 8);
    }

    #[test]
    fn test_enemy_spawn_ring() {
        let mut s = session();
        s.start_game();
        let origin = s.player().position();
        for (_, enemy) in s.world().enemies() {
            let d = enemy.position() - origin;
            let horizontal = Vec3::new(d.x, 0.0, d.z).length();
            assert!((15.0..30.0 + 1e-3).contains(&horizontal), "{horizontal}");
            assert!((enemy.position().y - 20.0).abs() < 1e-4);
        }
    }

    #[test]
    fn test_running_spawn_lands_ahead() {
        let mut s = session();
        s.start_game();
        s.player.yaw = 90.0;
        let id = s.spawn_enemy_around(true);
        let enemy = s.world().get(id).and_then(|e| e.as_enemy()).unwrap();
        let d = enemy.position() - s.player().position();
        let dir = Vec3::new(d.x, 0.0, d.z).normalize();
        assert!(dir.dot(s.player().forward()) > 0.999);
    }

    #[test]
    fn test_short_spawn_pushed_out_on_same_bearing() {
        let mut s = session();
        s.start_game();
        s.tuning.spawn.min_distance = 15.0;
        s.tuning.spawn.max_distance = 5.0;
        s.player.yaw = 30.0;
        let origin = s.player().position();
        for _ in 0..20 {
            let id = s.spawn_enemy_around(true);
            let enemy = s.world().get(id).and_then(|e| e.as_enemy()).unwrap();
            let d = enemy.position() - origin;
            let flat = Vec3::new(d.x, 0.0, d.z);
            assert!((flat.length() - 16.0).abs() < 1e-3, "{}", flat.length());
            assert!(flat.normalize().dot(s.player().forward()) > 0.999);
        }
    }

    #[test]
    fn test_kill_awards_score_and_speaks() {
        let mut s = session();
        s.start_game();
        s.drain_events();
        let id = s.spawn_enemy_at(Vec3::new(40.0, 1.0, 40.0));
        s.kill_enemy(id);
        assert_eq!(s.score(), 50);
        assert_eq!(s.summary().kills, 1);
        assert!(!s.world().contains(id));
        let events = s.drain_events();
        assert!(events.iter().any(|e| matches!(
            e,
            GameEvent::Narration(line) if ENEMY_DEATH_PHRASES.contains(&line.as_str())
        )));
    }

    #[test]
    fn test_collect_pickup_heals() {
        let mut s = session();
        s.start_game();
        s.player.health = 40.0;
        s.player.armor = 10.0;
        let pill = s.spawn_pickup_at(PickupKind::HealthPill, Vec3::ZERO);
        let plate = s.spawn_pickup_at(PickupKind::ArmorPickup, Vec3::ZERO);
        s.collect_pickup(pill, PickupKind::HealthPill, 50.0);
        s.collect_pickup(plate, PickupKind::ArmorPickup, 50.0);
        assert_eq!(s.health(), 90.0);
        assert_eq!(s.armor(), 60.0);
        assert_eq!(s.world().pickup_count(), 0);
    }

    #[test]
    fn test_speech_toggle_still_emits_subtitles() {
        let mut s = session();
        s.set_speech_enabled(false);
        s.start_game();
        assert!(!s.settings().speech_enabled);
        assert!(
            s.drain_events()
                .contains(&GameEvent::Narration(INTRO_LINE.to_string()))
        );
    }

    #[test]
    fn test_quit_stops_everything() {
        let mut s = session();
        s.start_game();
        s.timers.enemy = 2.0;
        s.quit();
        assert!(!s.is_running());
        assert_eq!(s.timers(), Timers::default());
        assert!(!s.weapon_enabled());
        s.pause_game();
        assert_eq!(s.phase(), GamePhase::Playing);
    }
}

//! Sound cue playback
//!
//! The game names its cues; a backend owns the actual mixer. Every clip is
//! loaded once up front. A clip that fails to load is logged and stays
//! silent for the rest of the session.

use std::collections::HashMap;

use crate::error::AudioError;
use crate::settings::Settings;

/// Sound effect types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SoundEffect {
    /// Run begins
    Start,
    /// Background loop, kept through pause
    Music,
    /// Weapon fired
    Shoot,
    /// Looping steps while the player moves
    Footstep,
    /// Player died
    Death,
    /// Enemy destroyed
    CubeDeath,
    Jump,
    /// Enemy struck the player
    Attack,
    HealthPickup,
    ArmorPickup,
}

impl SoundEffect {
    pub const ALL: [SoundEffect; 10] = [
        SoundEffect::Start,
        SoundEffect::Music,
        SoundEffect::Shoot,
        SoundEffect::Footstep,
        SoundEffect::Death,
        SoundEffect::CubeDeath,
        SoundEffect::Jump,
        SoundEffect::Attack,
        SoundEffect::HealthPickup,
        SoundEffect::ArmorPickup,
    ];

    /// Asset path relative to the game directory
    pub fn asset(&self) -> &'static str {
        match self {
            SoundEffect::Start => "assets/start.ogg",
            SoundEffect::Music => "assets/game.ogg",
            SoundEffect::Shoot => "assets/shoot.ogg",
            SoundEffect::Footstep => "assets/step.ogg",
            SoundEffect::Death => "assets/death.ogg",
            SoundEffect::CubeDeath => "assets/cubedeath.ogg",
            SoundEffect::Jump => "assets/jump.ogg",
            SoundEffect::Attack => "assets/attack.ogg",
            SoundEffect::HealthPickup => "assets/nom.ogg",
            SoundEffect::ArmorPickup => "assets/armor.ogg",
        }
    }

    /// Per-clip mix level
    pub fn base_volume(&self) -> f32 {
        match self {
            SoundEffect::Music | SoundEffect::Footstep => 0.5,
            SoundEffect::Shoot => 0.8,
            _ => 1.0,
        }
    }

    pub fn looping(&self) -> bool {
        matches!(self, SoundEffect::Music | SoundEffect::Footstep)
    }

    pub fn is_music(&self) -> bool {
        matches!(self, SoundEffect::Music)
    }
}

/// Opaque handle to a clip the backend has loaded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ClipHandle(pub u32);

/// Something that can actually make noise
pub trait AudioBackend {
    fn load(&mut self, path: &str) -> Result<ClipHandle, AudioError>;
    fn play(&mut self, clip: ClipHandle, volume: f32, looping: bool);
    fn stop(&mut self, clip: ClipHandle);
    fn is_playing(&self, clip: ClipHandle) -> bool;
}

/// Audio manager for the game
pub struct AudioManager {
    backend: Option<Box<dyn AudioBackend>>,
    clips: HashMap<SoundEffect, ClipHandle>,
    master_volume: f32,
    sfx_volume: f32,
    music_volume: f32,
    muted: bool,
}

impl Default for AudioManager {
    fn default() -> Self {
        Self::disabled()
    }
}

impl AudioManager {
    /// Load every cue through `backend`
    pub fn new(mut backend: Box<dyn AudioBackend>, settings: &Settings) -> Self {
        let mut clips = HashMap::new();
        for effect in SoundEffect::ALL {
            match backend.load(effect.asset()) {
                Ok(handle) => {
                    clips.insert(effect, handle);
                }
                Err(e) => log::warn!("Sound {:?} disabled: {}", effect, e),
            }
        }
        let mut manager = Self {
            backend: Some(backend),
            clips,
            master_volume: 0.8,
            sfx_volume: 1.0,
            music_volume: 0.7,
            muted: false,
        };
        manager.apply_settings(settings);
        manager
    }

    /// No backend at all; every call is a no-op
    pub fn disabled() -> Self {
        Self {
            backend: None,
            clips: HashMap::new(),
            master_volume: 0.8,
            sfx_volume: 1.0,
            music_volume: 0.7,
            muted: true,
        }
    }

    pub fn apply_settings(&mut self, settings: &Settings) {
        self.set_master_volume(settings.master_volume);
        self.set_sfx_volume(settings.sfx_volume);
        self.set_music_volume(settings.music_volume);
        self.set_muted(!settings.sound_enabled);
    }

    /// Set master volume (0.0 - 1.0)
    pub fn set_master_volume(&mut self, vol: f32) {
        self.master_volume = vol.clamp(0.0, 1.0);
    }

    /// Set SFX volume (0.0 - 1.0)
    pub fn set_sfx_volume(&mut self, vol: f32) {
        self.sfx_volume = vol.clamp(0.0, 1.0);
    }

    /// Set music volume (0.0 - 1.0)
    pub fn set_music_volume(&mut self, vol: f32) {
        self.music_volume = vol.clamp(0.0, 1.0);
    }

    /// Mute/unmute all audio; muting cuts any loops that are running
    pub fn set_muted(&mut self, muted: bool) {
        self.muted = muted;
        if muted {
            self.stop(SoundEffect::Music);
            self.stop(SoundEffect::Footstep);
        }
    }

    pub fn is_muted(&self) -> bool {
        self.muted
    }

    /// Whether a clip for this cue was loaded
    pub fn has_clip(&self, effect: SoundEffect) -> bool {
        self.clips.contains_key(&effect)
    }

    /// Get effective volume
    pub fn effective_volume(&self, effect: SoundEffect) -> f32 {
        if self.muted {
            return 0.0;
        }
        let channel = if effect.is_music() {
            self.music_volume
        } else {
            self.sfx_volume
        };
        self.master_volume * channel * effect.base_volume()
    }

    /// Play a sound effect
    pub fn play(&mut self, effect: SoundEffect) {
        let vol = self.effective_volume(effect);
        if vol <= 0.0 {
            return;
        }
        let Some(&clip) = self.clips.get(&effect) else {
            return;
        };
        if let Some(backend) = self.backend.as_mut() {
            backend.play(clip, vol, effect.looping());
        }
    }

    /// Start a looping cue unless it is already running
    pub fn ensure_playing(&mut self, effect: SoundEffect) {
        if !self.is_playing(effect) {
            self.play(effect);
        }
    }

    pub fn stop(&mut self, effect: SoundEffect) {
        let Some(&clip) = self.clips.get(&effect) else {
            return;
        };
        if let Some(backend) = self.backend.as_mut() {
            backend.stop(clip);
        }
    }

    pub fn is_playing(&self, effect: SoundEffect) -> bool {
        match (self.backend.as_ref(), self.clips.get(&effect)) {
            (Some(backend), Some(&clip)) => backend.is_playing(clip),
            _ => false,
        }
    }
}

/// Backend that only tracks which loops are running; used by headless hosts
#[derive(Debug, Default)]
pub struct NullBackend {
    paths: Vec<String>,
    playing: Vec<ClipHandle>,
}

impl NullBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

impl AudioBackend for NullBackend {
    fn load(&mut self, path: &str) -> Result<ClipHandle, AudioError> {
        self.paths.push(path.to_string());
        Ok(ClipHandle(self.paths.len() as u32 - 1))
    }

    fn play(&mut self, clip: ClipHandle, _volume: f32, looping: bool) {
        if looping && !self.playing.contains(&clip) {
            self.playing.push(clip);
        }
    }

    fn stop(&mut self, clip: ClipHandle) {
        self.playing.retain(|c| *c != clip);
    }

    fn is_playing(&self, clip: ClipHandle) -> bool {
        self.playing.contains(&clip)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    /// Records every play call
    #[derive(Default)]
    pub(crate) struct Recorder {
        pub plays: Vec<(String, f32)>,
    }

    pub(crate) struct MockBackend {
        pub log: Rc<RefCell<Recorder>>,
        inner: NullBackend,
        missing: Vec<&'static str>,
    }

    impl MockBackend {
        pub(crate) fn new(missing: Vec<&'static str>) -> (Self, Rc<RefCell<Recorder>>) {
            let log = Rc::new(RefCell::new(Recorder::default()));
            (
                Self {
                    log: log.clone(),
                    inner: NullBackend::new(),
                    missing,
                },
                log,
            )
        }
    }

    impl AudioBackend for MockBackend {
        fn load(&mut self, path: &str) -> Result<ClipHandle, AudioError> {
            if self.missing.contains(&path) {
                return Err(AudioError::MissingClip(path.to_string()));
            }
            self.inner.load(path)
        }

        fn play(&mut self, clip: ClipHandle, volume: f32, looping: bool) {
            let path = self.inner.paths[clip.0 as usize].clone();
            self.log.borrow_mut().plays.push((path, volume));
            self.inner.play(clip, volume, looping);
        }

        fn stop(&mut self, clip: ClipHandle) {
            self.inner.stop(clip);
        }

        fn is_playing(&self, clip: ClipHandle) -> bool {
            self.inner.is_playing(clip)
        }
    }

    #[test]
    fn test_missing_clip_is_silent() {
        let (backend, log) = MockBackend::new(vec!["assets/jump.ogg"]);
        let mut audio = AudioManager::new(Box::new(backend), &Settings::default());
        assert!(!audio.has_clip(SoundEffect::Jump));
        audio.play(SoundEffect::Jump);
        audio.play(SoundEffect::Shoot);
        let plays = &log.borrow().plays;
        assert_eq!(plays.len(), 1);
        assert_eq!(plays[0].0, "assets/shoot.ogg");
    }

    #[test]
    fn test_volume_mix() {
        let settings = Settings {
            master_volume: 0.5,
            sfx_volume: 0.5,
            music_volume: 1.0,
            ..Settings::default()
        };
        let (backend, _log) = MockBackend::new(vec![]);
        let audio = AudioManager::new(Box::new(backend), &settings);
        assert!((audio.effective_volume(SoundEffect::Shoot) - 0.2).abs() < 1e-6);
        assert!((audio.effective_volume(SoundEffect::Music) - 0.25).abs() < 1e-6);
    }

    #[test]
    fn test_mute_stops_loops() {
        let (backend, log) = MockBackend::new(vec![]);
        let mut audio = AudioManager::new(Box::new(backend), &Settings::default());
        audio.ensure_playing(SoundEffect::Music);
        audio.ensure_playing(SoundEffect::Music);
        assert!(audio.is_playing(SoundEffect::Music));
        assert_eq!(log.borrow().plays.len(), 1);

        audio.set_muted(true);
        assert!(!audio.is_playing(SoundEffect::Music));
        audio.play(SoundEffect::Shoot);
        assert_eq!(log.borrow().plays.len(), 1);
    }

    #[test]
    fn test_disabled_manager_is_inert() {
        let mut audio = AudioManager::disabled();
        audio.play(SoundEffect::Start);
        audio.ensure_playing(SoundEffect::Music);
        assert!(!audio.is_playing(SoundEffect::Music));
    }
}

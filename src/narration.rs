//! Fire-and-forget voice lines
//!
//! The simulation hands text to a [`NarrationSink`] and moves on. The real
//! implementation queues lines on a bounded channel that a worker thread
//! drains in order, speaking one line at a time.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;

use crossbeam_channel::{Sender, TrySendError, bounded};

use crate::error::NarrationError;

/// Line spoken when a run starts from the menu
pub const INTRO_LINE: &str = "You put your finger in a USB socket and found yourself in CubeTrix.";

/// Line spoken when a run restarts after game over
pub const WELCOME_BACK_LINE: &str = "Welcome back to CubeTrix!";

/// Periodic flavor lines, cycled in order
pub const NARRATIVE_QUOTES: [&str; 23] = [
    "You stuck your finger to a USB port and woke up in the Matrix.",
    "The cubes. They're getting closer.",
    "The cubes reminded you of Bob from accounting.",
    "What can a man do to get out of here?",
    "Yippie kai yay, Matrix cube!",
    "Is this real? Are we real? Are cubes real?",
    "The cubetrix never ends.",
    "You remember that time you deleted System32. Good times.",
    "The cubepocalypse is upon us!",
    "The cubes remind me of cubicle.",
    "These cubes are taking their geometry very seriously.",
    "I think I was a cube in my previous life.",
    "Surely the cubetrix has an ending.",
    "What if I am a cube myself.",
    "There are only so many cubes a man can take.",
    "This place reminds me of, never mind, it reminds me of nothing.",
    "The cubetrix smells kind of odd.",
    "At least Neo was living in a more realistic world.",
    "This simulation is lacking definition.",
    "Perhaps I should try to find a backdoor, there must be one.",
    "Is this a cube or am I dreaming.",
    "Look at those mountain tops, let's go chill there for a while, the cubes don't like them.",
    "In the digital world, everyone can hear you scream... in 8-bit.",
];

/// One of these is spoken per kill
pub const ENEMY_DEATH_PHRASES: [&str; 10] = [
    "Enemy has fallen!",
    "Down goes the cube!",
    "Cube smashed!",
    "Boxes belong to recycling!",
    "I am sorry cube, but there is only infinite amount of space here!",
    "I did what I had to do!",
    "I hope you won't be back!",
    "Just give up already!",
    "Target neutralized!",
    "Cube destroyed!",
];

/// One of these is spoken when the player dies
pub const DEATH_PHRASES: [&str; 11] = [
    "Game over, man!",
    "Oh Johnny boy!",
    "Back to real world!",
    "Is reality any better?",
    "I have seen c beams glittering in the dark!",
    "It is time!",
    "Finally, a way out of cubetrix!",
    "Here comes the light!",
    "You met your end!",
    "System failure!",
    "Critical damage detected!",
];

/// Where the simulation sends text to be spoken
pub trait NarrationSink {
    /// Queue a line; never blocks and never fails the caller
    fn say(&mut self, text: &str);

    /// Stop accepting lines
    fn close(&mut self);
}

/// Text-to-speech engine driven by the narration worker
pub trait VoiceEngine: Send {
    /// Speak one line, blocking until playback finishes
    fn speak(&mut self, text: &str) -> Result<(), NarrationError>;
}

/// Engine that writes lines to the log instead of speaking them
#[derive(Debug, Default)]
pub struct LogVoice;

impl VoiceEngine for LogVoice {
    fn speak(&mut self, text: &str) -> Result<(), NarrationError> {
        log::info!("Narrator: {}", text);
        Ok(())
    }
}

/// Bounded queue feeding a background speaker thread
pub struct Narrator {
    tx: Option<Sender<String>>,
    stop: Arc<AtomicBool>,
    dropped: u64,
}

impl Narrator {
    /// Start the worker. Without an engine the narrator is a silent no-op.
    pub fn spawn(engine: Option<Box<dyn VoiceEngine>>, capacity: usize) -> Self {
        let stop = Arc::new(AtomicBool::new(false));
        let Some(mut engine) = engine else {
            log::warn!("Narration disabled: {}", NarrationError::Unavailable);
            return Self::inert(stop);
        };

        let (tx, rx) = bounded::<String>(capacity.max(1));
        let worker_stop = stop.clone();
        let spawned = thread::Builder::new()
            .name("narrator".into())
            .spawn(move || {
                for line in rx.iter() {
                    if worker_stop.load(Ordering::Acquire) {
                        break;
                    }
                    if let Err(e) = engine.speak(&line) {
                        log::warn!("Narration failed: {}", e);
                    }
                }
                log::debug!("Narrator worker exiting");
            });

        match spawned {
            // Detached; close() never joins in-flight speech
            Ok(_) => Self {
                tx: Some(tx),
                stop,
                dropped: 0,
            },
            Err(e) => {
                log::warn!("Narration disabled: could not start worker: {}", e);
                Self::inert(stop)
            }
        }
    }

    fn inert(stop: Arc<AtomicBool>) -> Self {
        Self {
            tx: None,
            stop,
            dropped: 0,
        }
    }

    /// Still accepting lines
    pub fn is_active(&self) -> bool {
        self.tx.is_some()
    }

    /// Lines discarded because the queue was full
    pub fn dropped(&self) -> u64 {
        self.dropped
    }
}

impl NarrationSink for Narrator {
    fn say(&mut self, text: &str) {
        let Some(tx) = &self.tx else { return };
        match tx.try_send(text.to_string()) {
            Ok(()) => {}
            Err(TrySendError::Full(line)) => {
                self.dropped += 1;
                log::warn!("Narration queue full, dropping: {}", line);
            }
            Err(TrySendError::Disconnected(_)) => {
                log::warn!("Narration worker gone, disabling narration");
                self.tx = None;
            }
        }
    }

    fn close(&mut self) {
        self.stop.store(true, Ordering::Release);
        self.tx = None;
    }
}

impl Drop for Narrator {
    fn drop(&mut self) {
        self.close();
    }
}

/// Sink that discards everything
#[derive(Debug, Default)]
pub struct SilentNarrator;

impl NarrationSink for SilentNarrator {
    fn say(&mut self, text: &str) {
        log::debug!("(silent) {}", text);
    }

    fn close(&mut self) {}
}

//! Cubetrix - a procedural-terrain survival shooter
//!
//! Core modules:
//! - `sim`: Simulation (terrain, chunk streaming, entities, session state machine)
//! - `renderer`: Mesh data handed to an external render collaborator
//! - `audio`: Sound cue playback through a pluggable backend
//! - `narration`: Fire-and-forget voice lines on a worker thread
//! - `settings`: Player preferences
//! - `tuning`: Data-driven game balance

pub mod audio;
pub mod error;
pub mod narration;
pub mod renderer;
pub mod settings;
pub mod sim;
pub mod tuning;

pub use error::{AudioError, ConfigError, NarrationError};
pub use settings::Settings;
pub use tuning::Tuning;

use glam::Vec3;

/// Host loop constants
pub mod consts {
    /// Fixed host frame step (60 Hz)
    pub const SIM_DT: f32 = 1.0 / 60.0;
    /// Maximum substeps per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 8;
}

/// Horizontal unit vector for a bearing in degrees (0° = +X, 90° = +Z)
#[inline]
pub fn bearing_to_dir(degrees: f32) -> Vec3 {
    let rad = degrees.to_radians();
    Vec3::new(rad.cos(), 0.0, rad.sin())
}

/// Bearing in degrees of the horizontal part of a direction
#[inline]
pub fn dir_to_bearing(dir: Vec3) -> f32 {
    dir.z.atan2(dir.x).to_degrees()
}

/// Component-wise linear interpolation between two RGB colors
#[inline]
pub fn lerp_color(a: [f32; 3], b: [f32; 3], t: f32) -> [f32; 3] {
    let t = t.clamp(0.0, 1.0);
    [
        a[0] + (b[0] - a[0]) * t,
        a[1] + (b[1] - a[1]) * t,
        a[2] + (b[2] - a[2]) * t,
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bearing_round_trip() {
        for deg in [0.0_f32, 45.0, 90.0, 135.0, -90.0] {
            let back = dir_to_bearing(bearing_to_dir(deg));
            assert!((back - deg).abs() < 0.001, "{deg} -> {back}");
        }
    }

    #[test]
    fn test_lerp_color_endpoints() {
        let white = [1.0, 1.0, 1.0];
        let red = [1.0, 0.0, 0.0];
        assert_eq!(lerp_color(white, red, 0.0), white);
        assert_eq!(lerp_color(white, red, 1.0), red);
        assert_eq!(lerp_color(white, red, 2.0), red);
    }
}

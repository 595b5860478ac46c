//! Polysnake - a snake chased by roaming polygons
//!
//! Core modules:
//! - `sim`: Simulation core (geometry, bodies, collision physics, per-frame tick)
//! - `game`: Fixed-cadence game loop thread with pause/resume and drift correction
//! - `renderer`: Render target boundary and polygon tessellation
//! - `settings`: Data-driven configuration of the world and body groups

pub mod fps;
pub mod game;
pub mod renderer;
pub mod settings;
pub mod sim;

pub use game::{Command, Game, GameOverReport, SchedulerState};
pub use settings::{ConfigError, Settings};

use glam::Vec2;
use std::f32::consts::{PI, TAU};

/// Game configuration constants
pub mod consts {
    /// Default render surface size
    pub const WORLD_WIDTH: f32 = 640.0;
    pub const WORLD_HEIGHT: f32 = 550.0;

    /// Target frames per second of the game loop
    pub const FRAME_RATE: f32 = 60.0;

    /// Snake defaults
    pub const SNAKE_RADIUS: f32 = 10.0;
    pub const SNAKE_SIDES: u32 = 7;
    pub const SNAKE_SPEED: f32 = 200.0;
    /// Revolutions per second while spinning
    pub const SNAKE_ANGULAR_SPEED: f32 = std::f32::consts::FRAC_PI_2;
    pub const TAIL_SIDES: u32 = 4;
    pub const TAIL_INITIAL_ANGLE: f32 = 45.0;

    /// Food defaults
    pub const FOOD_RADIUS: f32 = 12.0;
    /// Food is drawn as a near-circle
    pub const FOOD_SIDES: u32 = 16;
    pub const FOOD_MAXIMUM: usize = 8;
    /// Seconds between food spawns
    pub const FOOD_SPAWN_INTERVAL: f32 = 3.0;

    /// Separating-axis tolerance (pixels) below which polygons are only touching
    pub const OVERLAP_EPSILON: f32 = 1e-3;

    /// Attempt budget weights for free-position search
    pub const PLACEMENT_BASE_WEIGHT: f32 = 0.2;
    pub const PLACEMENT_DECAY_WEIGHT: f32 = 0.8;
}

/// Wrap an angle into [0, 2π)
#[inline]
pub fn wrap_angle(angle: f32) -> f32 {
    let wrapped = angle.rem_euclid(TAU);
    // rem_euclid can round up to exactly TAU for tiny negative inputs
    if wrapped >= TAU { 0.0 } else { wrapped }
}

/// Heading pointing the opposite way
#[inline]
pub fn opposite_angle(angle: f32) -> f32 {
    wrap_angle(angle - PI)
}

/// Reflect a heading off a horizontal wall (top/bottom): the vertical component flips
#[inline]
pub fn reflect_angle_x(angle: f32) -> f32 {
    wrap_angle(-angle)
}

/// Reflect a heading off a vertical wall (left/right): the horizontal component flips
#[inline]
pub fn reflect_angle_y(angle: f32) -> f32 {
    wrap_angle(PI - angle)
}

/// Unit vector for a heading
#[inline]
pub fn heading_vector(angle: f32) -> Vec2 {
    Vec2::new(angle.cos(), angle.sin())
}

/// Shortest signed angular difference `to - from`, in [-π, π)
#[inline]
pub fn angle_delta(from: f32, to: f32) -> f32 {
    let mut delta = wrap_angle(to) - wrap_angle(from);
    if delta >= PI {
        delta -= TAU;
    } else if delta < -PI {
        delta += TAU;
    }
    delta
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wrap_angle() {
        assert!((wrap_angle(-PI / 2.0) - 3.0 * PI / 2.0).abs() < 1e-5);
        assert!((wrap_angle(5.0 * PI) - PI).abs() < 1e-4);
        assert!(wrap_angle(-1e-9) < TAU);
    }

    #[test]
    fn test_reflections() {
        // Heading left off the left wall turns right
        assert!(reflect_angle_y(PI).abs() < 1e-6);
        // Heading down-right off the bottom wall turns up-right
        let down_right = PI / 4.0;
        assert!((reflect_angle_x(down_right) - 7.0 * PI / 4.0).abs() < 1e-5);
        // Reflecting twice returns the original heading
        let h = 1.1;
        assert!((reflect_angle_y(reflect_angle_y(h)) - h).abs() < 1e-5);
    }

    #[test]
    fn test_angle_delta_wraps() {
        assert!((angle_delta(0.1, TAU - 0.1) + 0.2).abs() < 1e-5);
        assert!((angle_delta(TAU - 0.1, 0.1) - 0.2).abs() < 1e-5);
    }

    #[test]
    fn test_opposite_angle() {
        assert!((opposite_angle(0.0) - PI).abs() < 1e-6);
        assert!((opposite_angle(PI / 2.0) - 3.0 * PI / 2.0).abs() < 1e-5);
    }
}

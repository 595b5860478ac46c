//! Game settings and body group configuration
//!
//! Loaded from JSON by the host. Everything is validated once at this
//! boundary; the simulation assumes well-formed values afterwards.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::consts::*;

/// RGBA color, components in 0-1
pub type Color = [f32; 4];

/// Configuration rejected at load time
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{group}: a polygon needs at least 3 sides, got {sides}")]
    TooFewSides { group: String, sides: u32 },
    #[error("{group}: radius must be positive, got {radius}")]
    InvalidRadius { group: String, radius: f32 },
    #[error("{group}: speed must be finite and non-negative, got {speed}")]
    InvalidSpeed { group: String, speed: f32 },
    #[error("frame rate must be positive, got {0}")]
    InvalidFrameRate(f32),
    #[error("world size must be positive, got {width}x{height}")]
    InvalidWorldSize { width: f32, height: f32 },
    #[error("food spawn interval must be positive, got {0}")]
    InvalidSpawnInterval(f32),
    #[error("failed to parse settings: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("failed to read or write settings: {0}")]
    Io(#[from] std::io::Error),
}

/// Render surface size in pixels
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WorldSize {
    pub width: f32,
    pub height: f32,
}

impl Default for WorldSize {
    fn default() -> Self {
        Self {
            width: WORLD_WIDTH,
            height: WORLD_HEIGHT,
        }
    }
}

impl WorldSize {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.width > 0.0 && self.height > 0.0 && self.width.is_finite() && self.height.is_finite() {
            Ok(())
        } else {
            Err(ConfigError::InvalidWorldSize {
                width: self.width,
                height: self.height,
            })
        }
    }
}

/// How a group's bodies are drawn
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShapeStyle {
    /// Fill color, `None` draws only the border
    pub fill: Option<Color>,
    /// Border color, `None` draws no border
    pub border: Option<Color>,
    pub border_width: f32,
}

impl Default for ShapeStyle {
    fn default() -> Self {
        Self {
            fill: Some([0.0, 0.6, 0.4, 1.0]),
            border: Some([0.0, 0.4, 0.2, 1.0]),
            border_width: 2.0,
        }
    }
}

/// Polygon outline shared by every body of a group
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShapeConfig {
    pub sides: u32,
    pub radius: f32,
    /// Degrees, clockwise-positive
    pub initial_angle: f32,
    pub style: ShapeStyle,
}

impl Default for ShapeConfig {
    fn default() -> Self {
        Self {
            sides: SNAKE_SIDES,
            radius: SNAKE_RADIUS,
            initial_angle: 0.0,
            style: ShapeStyle::default(),
        }
    }
}

impl ShapeConfig {
    fn validate(&self, group: &str) -> Result<(), ConfigError> {
        if self.sides < 3 {
            return Err(ConfigError::TooFewSides {
                group: group.to_string(),
                sides: self.sides,
            });
        }
        if !(self.radius > 0.0) {
            return Err(ConfigError::InvalidRadius {
                group: group.to_string(),
                radius: self.radius,
            });
        }
        Ok(())
    }
}

/// Movement parameters shared by every body of a group
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MotionConfig {
    /// Pixels per second
    pub speed: f32,
    /// Revolutions per second while spinning
    pub angular_speed: f32,
    /// Whether bodies spin at all
    pub rotation: bool,
    pub clockwise: bool,
}

impl Default for MotionConfig {
    fn default() -> Self {
        Self {
            speed: SNAKE_SPEED,
            angular_speed: SNAKE_ANGULAR_SPEED,
            rotation: true,
            clockwise: true,
        }
    }
}

impl MotionConfig {
    fn validate(&self, group: &str) -> Result<(), ConfigError> {
        if !self.speed.is_finite() || self.speed < 0.0 {
            return Err(ConfigError::InvalidSpeed {
                group: group.to_string(),
                speed: self.speed,
            });
        }
        Ok(())
    }
}

/// The player's snake
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SnakeConfig {
    pub shape: ShapeConfig,
    pub motion: MotionConfig,
    pub tail_sides: u32,
    /// Degrees
    pub tail_initial_angle: f32,
}

impl Default for SnakeConfig {
    fn default() -> Self {
        Self {
            shape: ShapeConfig::default(),
            motion: MotionConfig::default(),
            tail_sides: TAIL_SIDES,
            tail_initial_angle: TAIL_INITIAL_ANGLE,
        }
    }
}

/// Food spawning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FoodConfig {
    pub shape: ShapeConfig,
    /// Maximum live food at once
    pub maximum: usize,
    /// Seconds between spawns
    pub spawn_interval: f32,
}

impl Default for FoodConfig {
    fn default() -> Self {
        Self {
            shape: ShapeConfig {
                sides: FOOD_SIDES,
                radius: FOOD_RADIUS,
                initial_angle: 0.0,
                style: ShapeStyle {
                    fill: Some([1.0, 0.84, 0.0, 1.0]),
                    border: Some([0.2, 0.2, 0.0, 1.0]),
                    border_width: 2.0,
                },
            },
            maximum: FOOD_MAXIMUM,
            spawn_interval: FOOD_SPAWN_INTERVAL,
        }
    }
}

/// One type of roaming enemy polygon
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnemyConfig {
    pub shape: ShapeConfig,
    pub motion: MotionConfig,
    /// Revolutions per second the heading may turn toward the snake, 0 disables steering
    pub turning_speed: f32,
    /// Bodies of this type spawned on reset
    pub copies: u32,
}

impl Default for EnemyConfig {
    fn default() -> Self {
        Self {
            shape: ShapeConfig {
                sides: 5,
                radius: 14.0,
                initial_angle: 0.0,
                style: ShapeStyle {
                    fill: Some([0.85, 0.3, 0.3, 1.0]),
                    border: Some([0.5, 0.1, 0.1, 1.0]),
                    border_width: 2.0,
                },
            },
            motion: MotionConfig {
                speed: 60.0,
                angular_speed: 0.3,
                rotation: false,
                clockwise: true,
            },
            turning_speed: 0.05,
            copies: 1,
        }
    }
}

impl EnemyConfig {
    pub fn validate(&self, group: &str) -> Result<(), ConfigError> {
        self.shape.validate(group)?;
        self.motion.validate(group)
    }
}

/// Default roster: a few slow, mostly harmless shapes of different sizes
fn default_enemies() -> Vec<EnemyConfig> {
    let base = EnemyConfig::default();
    vec![
        base.clone(),
        EnemyConfig {
            shape: ShapeConfig {
                sides: 3,
                radius: 10.0,
                ..base.shape
            },
            motion: MotionConfig {
                speed: 90.0,
                rotation: true,
                ..base.motion
            },
            copies: 2,
            ..base.clone()
        },
        EnemyConfig {
            shape: ShapeConfig {
                sides: 8,
                radius: 24.0,
                ..base.shape
            },
            motion: MotionConfig {
                speed: 35.0,
                ..base.motion
            },
            turning_speed: 0.02,
            ..base
        },
    ]
}

/// Game settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub world: WorldSize,
    /// Target frames per second
    pub frame_rate: f32,
    /// Show FPS counter
    pub show_fps: bool,
    /// Fixed RNG seed for reproducible runs
    pub seed: Option<u64>,
    pub background: Color,
    pub snake: SnakeConfig,
    pub food: FoodConfig,
    pub enemies: Vec<EnemyConfig>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            world: WorldSize::default(),
            frame_rate: FRAME_RATE,
            show_fps: false,
            seed: None,
            background: [0.84, 0.85, 0.87, 1.0],
            snake: SnakeConfig::default(),
            food: FoodConfig::default(),
            enemies: default_enemies(),
        }
    }
}

impl Settings {
    /// Target frame period in milliseconds
    pub fn frame_period_ms(&self) -> f32 {
        1000.0 / self.frame_rate
    }

    /// Reject values the simulation cannot run with
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.world.validate()?;
        if !(self.frame_rate > 0.0) || !self.frame_rate.is_finite() {
            return Err(ConfigError::InvalidFrameRate(self.frame_rate));
        }

        self.snake.shape.validate("snake")?;
        self.snake.motion.validate("snake")?;
        if self.snake.tail_sides < 3 {
            return Err(ConfigError::TooFewSides {
                group: "snake tail".to_string(),
                sides: self.snake.tail_sides,
            });
        }

        self.food.shape.validate("food")?;
        if !(self.food.spawn_interval > 0.0) {
            return Err(ConfigError::InvalidSpawnInterval(self.food.spawn_interval));
        }

        for (i, enemy) in self.enemies.iter().enumerate() {
            enemy.validate(&format!("enemy {i}"))?;
        }
        Ok(())
    }

    /// Parse and validate settings from JSON
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let settings: Settings = serde_json::from_str(json)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Load settings from a JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let settings = Self::from_json(&fs::read_to_string(path)?)?;
        log::info!("Loaded settings from {}", path.display());
        Ok(settings)
    }

    /// Save settings to a JSON file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        fs::write(path, self.to_json()?)?;
        log::info!("Settings saved to {}", path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let settings = Settings::default();
        assert!(settings.validate().is_ok());
        assert!((settings.frame_period_ms() - 1000.0 / 60.0).abs() < 1e-4);
        assert_eq!(settings.snake.tail_sides, 4);
        assert_eq!(settings.food.maximum, 8);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let settings = Settings::from_json(r#"{ "frame_rate": 30, "snake": { "tail_sides": 6 } }"#)
            .expect("valid settings");
        assert_eq!(settings.frame_rate, 30.0);
        assert_eq!(settings.snake.tail_sides, 6);
        assert_eq!(settings.snake.shape.sides, SNAKE_SIDES);
        assert_eq!(settings.world, WorldSize::default());
    }

    #[test]
    fn test_json_roundtrip_preserves_roster() {
        let settings = Settings::default();
        let json = settings.to_json().expect("serializable");
        let back = Settings::from_json(&json).expect("valid settings");
        assert_eq!(back, settings);
    }

    #[test]
    fn test_rejects_degenerate_shapes() {
        let mut settings = Settings::default();
        settings.enemies[1].shape.sides = 2;
        assert!(matches!(
            settings.validate(),
            Err(ConfigError::TooFewSides { sides: 2, .. })
        ));

        let mut settings = Settings::default();
        settings.food.shape.radius = 0.0;
        assert!(matches!(settings.validate(), Err(ConfigError::InvalidRadius { .. })));

        let mut settings = Settings::default();
        settings.frame_rate = 0.0;
        assert!(matches!(settings.validate(), Err(ConfigError::InvalidFrameRate(_))));
    }

    #[test]
    fn test_save_then_load() {
        let path = std::env::temp_dir().join(format!("polysnake-settings-{}.json", std::process::id()));
        let settings = Settings {
            seed: Some(9),
            show_fps: true,
            ..Default::default()
        };
        settings.save(&path).expect("writable temp dir");
        let loaded = Settings::load(&path).expect("readable settings");
        let _ = fs::remove_file(&path);
        assert_eq!(loaded.seed, Some(9));
        assert!(loaded.show_fps);

        assert!(matches!(
            Settings::load(path.with_extension("missing")),
            Err(ConfigError::Io(_))
        ));
    }

    #[test]
    fn test_bad_json_is_a_parse_error() {
        assert!(matches!(Settings::from_json("{ nope"), Err(ConfigError::Parse(_))));
    }
}

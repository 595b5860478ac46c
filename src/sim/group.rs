//! Body groups: every body of one archetype plus its shared parameters
//!
//! Bodies read speed, spin and outline from their group. Per-archetype
//! bookkeeping (snake step timer, food spawn timer, enemy steering) lives in
//! [`GroupKind`]; the per-frame behavior that needs the whole world is in
//! `tick`.

use std::f32::consts::{FRAC_PI_2, PI};
use std::sync::Arc;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::body::{Body, Motion, Role};
use super::geometry::{build_outline, polygon_name};
use crate::renderer::Surface;
use crate::settings::{EnemyConfig, FoodConfig, MotionConfig, ShapeConfig, ShapeStyle, SnakeConfig};

/// Cardinal direction the player asks the snake to move in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Heading {
    Up,
    Down,
    Left,
    Right,
}

impl Heading {
    /// Screen-space angle (y grows down)
    pub fn angle(self) -> f32 {
        match self {
            Heading::Up => 3.0 * FRAC_PI_2,
            Heading::Down => FRAC_PI_2,
            Heading::Left => PI,
            Heading::Right => 0.0,
        }
    }
}

/// Snake bookkeeping
#[derive(Debug, Clone)]
pub struct SnakeState {
    pub tail_outline: Arc<[Vec2]>,
    /// Seconds accumulated toward the next step
    pub step_timer: f32,
    /// Segments still to be grown
    pub pending_growth: u32,
    /// Set by the first steering input, the snake waits until then
    pub moving: bool,
    /// Latest requested heading, applied to the head at the next step
    pub heading: f32,
    /// Spin toggle held by the player
    pub spin: bool,
}

/// Food bookkeeping
#[derive(Debug, Clone)]
pub struct FoodState {
    pub maximum: usize,
    pub spawn_interval: f32,
    /// Seconds accumulated toward the next spawn
    pub spawn_timer: f32,
}

/// Roaming enemy bookkeeping
#[derive(Debug, Clone)]
pub struct EnemyState {
    /// Revolutions per second the heading may turn toward the snake
    pub turning_speed: f32,
    /// Bodies spawned on reset
    pub copies: u32,
}

#[derive(Debug, Clone)]
pub enum GroupKind {
    Snake(SnakeState),
    Food(FoodState),
    Enemy(EnemyState),
}

/// Owner of all bodies of one archetype
#[derive(Debug, Clone)]
pub struct BodyGroup {
    pub name: String,
    pub role: Role,
    pub shape: ShapeConfig,
    pub motion: Motion,
    pub kind: GroupKind,
    outline: Arc<[Vec2]>,
    bodies: Vec<Body>,
}

fn motion_from(config: &MotionConfig) -> Motion {
    Motion {
        speed: config.speed,
        angular_speed: config.angular_speed,
        spin: config.rotation,
        clockwise: config.clockwise,
    }
}

impl BodyGroup {
    fn new(name: String, role: Role, shape: ShapeConfig, motion: Motion, kind: GroupKind) -> Self {
        Self {
            name,
            role,
            outline: build_outline(shape.sides, shape.initial_angle, shape.radius).into(),
            shape,
            motion,
            kind,
            bodies: Vec::new(),
        }
    }

    pub fn snake(config: &SnakeConfig) -> Self {
        let tail_outline = build_outline(
            config.tail_sides,
            config.tail_initial_angle,
            config.shape.radius,
        );
        Self::new(
            "Snake".to_string(),
            Role::Head,
            config.shape,
            motion_from(&config.motion),
            GroupKind::Snake(SnakeState {
                tail_outline: tail_outline.into(),
                step_timer: 0.0,
                pending_growth: 0,
                moving: false,
                heading: 0.0,
                spin: false,
            }),
        )
    }

    pub fn food(config: &FoodConfig) -> Self {
        Self::new(
            "Food".to_string(),
            Role::Consumable,
            config.shape,
            Motion {
                speed: 0.0,
                angular_speed: 0.0,
                spin: false,
                clockwise: true,
            },
            GroupKind::Food(FoodState {
                maximum: config.maximum,
                spawn_interval: config.spawn_interval,
                spawn_timer: config.spawn_interval,
            }),
        )
    }

    pub fn enemy(config: &EnemyConfig) -> Self {
        Self::new(
            polygon_name(config.shape.sides),
            Role::Roaming,
            config.shape,
            motion_from(&config.motion),
            GroupKind::Enemy(EnemyState {
                turning_speed: config.turning_speed,
                copies: config.copies,
            }),
        )
    }

    /// Clear all bodies and reset counters to their starting state
    pub fn init(&mut self) {
        self.bodies.clear();
        match &mut self.kind {
            GroupKind::Snake(snake) => {
                snake.step_timer = 0.0;
                snake.pending_growth = 0;
                snake.moving = false;
                snake.heading = 0.0;
                snake.spin = false;
            }
            // Full timer so the first food appears on the first update
            GroupKind::Food(food) => food.spawn_timer = food.spawn_interval,
            GroupKind::Enemy(_) => {}
        }
    }

    /// Live bodies, in spawn order
    pub fn bodies(&self) -> &[Body] {
        &self.bodies
    }

    pub fn bodies_mut(&mut self) -> &mut [Body] {
        &mut self.bodies
    }

    pub fn len(&self) -> usize {
        self.bodies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bodies.is_empty()
    }

    pub fn outline(&self) -> &Arc<[Vec2]> {
        &self.outline
    }

    pub fn style(&self) -> &ShapeStyle {
        &self.shape.style
    }

    pub fn push(&mut self, body: Body) {
        self.bodies.push(body);
    }

    /// Drop bodies flagged as consumed
    pub fn remove_consumed(&mut self) -> usize {
        let before = self.bodies.len();
        self.bodies.retain(|b| !b.consumed);
        before - self.bodies.len()
    }

    /// Seconds per snake step: one body diameter at the group speed
    pub fn step_duration(&self) -> f32 {
        self.shape.radius * 2.0 / self.motion.speed
    }

    pub fn as_snake(&self) -> Option<&SnakeState> {
        match &self.kind {
            GroupKind::Snake(snake) => Some(snake),
            _ => None,
        }
    }

    pub fn as_snake_mut(&mut self) -> Option<&mut SnakeState> {
        match &mut self.kind {
            GroupKind::Snake(snake) => Some(snake),
            _ => None,
        }
    }

    /// Draw every live body
    pub fn paint(&self, surface: &mut dyn Surface) {
        let style = self.style();
        for body in &self.bodies {
            if let Some(fill) = style.fill {
                surface.fill_polygon(body.points(), fill);
            }
            if let Some(border) = style.border {
                surface.stroke_polygon(body.points(), border, style.border_width);
            }
        }
    }
}

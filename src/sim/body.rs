//! Polygon bodies and their kinematics
//!
//! A body keeps two vertex pages. A trial move is transformed into the
//! inactive page and the page index flips, so the collision engine always
//! sees a complete polygon. Rolling back is a single flip to the page that
//! still holds the last committed points.

use std::f32::consts::TAU;
use std::sync::Arc;

use glam::Vec2;

use super::geometry::{self, Aabb};
use crate::{heading_vector, wrap_angle};

/// What part a body plays in collisions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    /// Free-moving, wall-bouncing enemy polygon
    Roaming,
    /// Stationary food, removed on contact
    Consumable,
    /// The player's snake head
    Head,
    /// A trailing snake segment
    Tail,
}

impl Role {
    /// Head and tail segments both belong to the player
    pub fn is_player(self) -> bool {
        matches!(self, Role::Head | Role::Tail)
    }
}

/// Shared motion parameters read from the owning group
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Motion {
    /// Pixels per second
    pub speed: f32,
    /// Revolutions per second while spinning
    pub angular_speed: f32,
    /// Spin is enabled for this group
    pub spin: bool,
    pub clockwise: bool,
}

/// A move computed into the inactive page, waiting for validation
#[derive(Debug, Clone, Copy, PartialEq)]
#[must_use = "a trial must be committed or rolled back"]
pub struct Trial {
    center: Vec2,
    prev_angle: f32,
}

impl Trial {
    /// Center the body would have after committing
    pub fn center(&self) -> Vec2 {
        self.center
    }
}

/// A single simulated polygon
#[derive(Debug, Clone)]
pub struct Body {
    pub id: u32,
    pub role: Role,
    center: Vec2,
    angle: f32,
    outline: Arc<[Vec2]>,
    pages: [Vec<Vec2>; 2],
    page: usize,
    /// Advances position each step
    pub moving: bool,
    /// Spins while the group allows it
    pub rotating: bool,
    /// Heading and speed were imposed by a collision
    pub bouncing: bool,
    /// Heading in radians
    pub direction: f32,
    /// Speed imposed by the last bounce, overriding the group speed
    pub bounce_speed: Option<f32>,
    /// Pending removal (food that has been eaten this frame)
    pub consumed: bool,
}

impl Body {
    /// Create a body at `center`, its committed polygon computed immediately
    pub fn new(id: u32, role: Role, outline: Arc<[Vec2]>, center: Vec2, angle: f32) -> Self {
        let n = outline.len();
        let mut body = Self {
            id,
            role,
            center,
            angle,
            outline,
            pages: [vec![Vec2::ZERO; n], vec![Vec2::ZERO; n]],
            page: 0,
            moving: false,
            rotating: false,
            bouncing: false,
            direction: 0.0,
            bounce_speed: None,
            consumed: false,
        };
        let (outline, page) = (&body.outline, &mut body.pages[0]);
        geometry::transform_into(outline, angle, center, page);
        body
    }

    pub fn center(&self) -> Vec2 {
        self.center
    }

    pub fn angle(&self) -> f32 {
        self.angle
    }

    /// Override the rotation angle, recomputing the committed polygon
    pub fn set_angle(&mut self, angle: f32) {
        self.angle = angle;
        let (outline, page) = (&self.outline, &mut self.pages[self.page]);
        geometry::transform_into(outline, angle, self.center, page);
    }

    /// Absolute points of the active page
    pub fn points(&self) -> &[Vec2] {
        &self.pages[self.page]
    }

    pub fn outline(&self) -> &Arc<[Vec2]> {
        &self.outline
    }

    pub fn area(&self) -> f32 {
        geometry::area(self.points())
    }

    pub fn bounds(&self) -> Aabb {
        geometry::bounding_box(self.points())
    }

    /// Speed this body currently travels at
    pub fn speed(&self, motion: &Motion) -> f32 {
        self.bounce_speed.unwrap_or(motion.speed)
    }

    fn flip(&mut self) {
        self.page ^= 1;
    }

    /// Compute a trial move into the inactive page and make it active.
    ///
    /// Returns `None` when neither position nor angle would change; the body
    /// is then already in its committed state and nothing needs validating.
    pub fn begin_move(&mut self, dt: f32, motion: &Motion) -> Option<Trial> {
        let prev_angle = self.angle;

        if motion.spin && self.rotating {
            let delta = motion.angular_speed * TAU * dt;
            let delta = if motion.clockwise { delta } else { -delta };
            self.angle = wrap_angle(self.angle + delta);
        } else if !self.bouncing {
            self.angle = self.direction;
        }

        if !self.moving && self.angle == prev_angle {
            return None;
        }

        let mut center = self.center;
        if self.moving {
            center += heading_vector(self.direction) * self.speed(motion) * dt;
        }

        let inactive = self.page ^ 1;
        let (outline, page) = (&self.outline, &mut self.pages[inactive]);
        geometry::transform_into(outline, self.angle, center, page);
        self.flip();

        Some(Trial { center, prev_angle })
    }

    /// Keep the trial as the new committed state
    pub fn commit(&mut self, trial: Trial) {
        self.center = trial.center;
    }

    /// Discard the trial, restoring the previously committed polygon and angle
    pub fn rollback(&mut self, trial: Trial) {
        self.flip();
        self.angle = trial.prev_angle;
    }

    /// Impose a post-collision speed and heading.
    ///
    /// Only roaming bodies react; the player and food ignore bounces.
    pub fn bounce(&mut self, speed: f32, angle: f32) {
        if self.role != Role::Roaming {
            return;
        }
        self.bouncing = true;
        self.bounce_speed = Some(speed);
        self.direction = wrap_angle(angle);
    }

    /// Leave bouncing mode, falling back to the group's speed
    pub fn settle(&mut self) {
        self.bouncing = false;
        self.bounce_speed = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::PI;

    fn square_body(role: Role) -> Body {
        let outline: Arc<[Vec2]> = geometry::build_outline(4, 45.0, 10.0).into();
        Body::new(1, role, outline, Vec2::new(100.0, 100.0), 0.0)
    }

    fn motion(speed: f32) -> Motion {
        Motion {
            speed,
            angular_speed: 0.25,
            spin: false,
            clockwise: true,
        }
    }

    #[test]
    fn test_commit_moves_center() {
        let mut body = square_body(Role::Roaming);
        body.moving = true;
        body.direction = 0.0;

        let trial = body.begin_move(0.5, &motion(40.0)).expect("body is moving");
        assert!((trial.center() - Vec2::new(120.0, 100.0)).length() < 1e-4);
        body.commit(trial);
        assert!((body.center() - Vec2::new(120.0, 100.0)).length() < 1e-4);
        assert!((body.bounds().min.x - (120.0 - 10.0 / 2f32.sqrt())).abs() < 1e-3);
    }

    #[test]
    fn test_rollback_restores_exact_points() {
        let mut body = square_body(Role::Roaming);
        body.moving = true;
        body.direction = PI / 3.0;
        let before: Vec<Vec2> = body.points().to_vec();
        let angle_before = body.angle();

        let trial = body.begin_move(0.1, &motion(50.0)).expect("body is moving");
        assert_ne!(body.points(), before.as_slice());
        body.rollback(trial);

        assert_eq!(body.points(), before.as_slice());
        assert_eq!(body.center(), Vec2::new(100.0, 100.0));
        assert_eq!(body.angle(), angle_before);
    }

    #[test]
    fn test_idle_body_short_circuits() {
        let mut body = square_body(Role::Head);
        assert!(body.begin_move(0.016, &motion(100.0)).is_none());
    }

    #[test]
    fn test_spin_direction() {
        let mut body = square_body(Role::Head);
        body.rotating = true;
        let mut m = motion(0.0);
        m.spin = true;

        let trial = body.begin_move(1.0, &m).expect("angle changes");
        body.commit(trial);
        assert!((body.angle() - PI / 2.0).abs() < 1e-5);

        m.clockwise = false;
        let trial = body.begin_move(1.0, &m).expect("angle changes");
        body.commit(trial);
        assert!(body.angle().abs() < 1e-5 || (body.angle() - TAU).abs() < 1e-5);
    }

    #[test]
    fn test_angle_snaps_to_direction_unless_bouncing() {
        let mut body = square_body(Role::Roaming);
        body.direction = 1.0;
        let trial = body.begin_move(0.016, &motion(0.0)).expect("angle changes");
        body.commit(trial);
        assert_eq!(body.angle(), 1.0);

        body.bounce(10.0, 2.0);
        assert!(body.begin_move(0.016, &motion(0.0)).is_none());
        assert_eq!(body.angle(), 1.0);
    }

    #[test]
    fn test_bounce_only_affects_roaming() {
        let mut enemy = square_body(Role::Roaming);
        enemy.bounce(42.0, -PI / 2.0);
        assert!(enemy.bouncing);
        assert_eq!(enemy.speed(&motion(10.0)), 42.0);
        assert!((enemy.direction - 3.0 * PI / 2.0).abs() < 1e-5);

        enemy.settle();
        assert_eq!(enemy.speed(&motion(10.0)), 10.0);

        let mut head = square_body(Role::Head);
        head.bounce(42.0, 1.0);
        assert!(!head.bouncing);
        assert_eq!(head.direction, 0.0);
    }
}

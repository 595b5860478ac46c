//! Collision detection, collision response and spawn placement
//!
//! `validate` is called with a body whose active page holds a trial move.
//! Its side effects (bounces, eaten food, the end of the game) happen right
//! away, before the mover commits or rolls back.

use std::fmt;

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use super::body::Role;
use super::geometry::{Aabb, polygons_overlap, segment_intersects_polygon};
use super::group::BodyGroup;
use crate::consts::{PLACEMENT_BASE_WEIGHT, PLACEMENT_DECAY_WEIGHT};
use crate::settings::WorldSize;
use crate::{reflect_angle_x, reflect_angle_y};

/// Location of a body: group index and index within the group
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BodyRef {
    pub group: usize,
    pub index: usize,
}

impl BodyRef {
    pub fn new(group: usize, index: usize) -> Self {
        Self { group, index }
    }
}

/// Why the run ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LossReason {
    /// The snake left the playfield
    Wall,
    /// An enemy touched the snake, named after its polygon
    BeatenBy(String),
    /// The head or a segment ran into the snake's own body
    OwnTail,
}

impl fmt::Display for LossReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LossReason::Wall => write!(f, "You crashed into the wall!"),
            LossReason::BeatenBy(name) => write!(f, "You were beaten by the {name}!"),
            LossReason::OwnTail => write!(f, "You crashed into your own tail!"),
        }
    }
}

/// Something that happened during validation
#[derive(Debug, Clone, PartialEq)]
pub enum GameEvent {
    /// A consumable was eaten by a body with the given role
    Consumed { food: u32, by: Role },
    /// Two roaming bodies bounced off each other
    Collided { a: u32, b: u32 },
    /// The run is over
    Defeated(LossReason),
}

/// Outcome of two overlapping bodies, `mover` being the one that moved
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interaction {
    /// No effect and the move stands
    Ignore,
    /// Mass-weighted bounce of both bodies, move rejected
    ElasticBounce,
    /// The other body (food) is removed, move stands
    Consume,
    /// The other body (food) is removed and the snake grows, move stands
    Eat,
    /// The moving enemy ends the game
    DefeatedByMover,
    /// The enemy that was run into ends the game
    DefeatedByOther,
    /// The snake ran into itself
    OwnTail,
}

impl Interaction {
    /// Total dispatch table over every role pair
    pub fn between(mover: Role, other: Role) -> Self {
        use Role::*;
        match (mover, other) {
            (Roaming, Roaming) => Interaction::ElasticBounce,
            (Roaming, Consumable) => Interaction::Consume,
            (Roaming, Head | Tail) => Interaction::DefeatedByMover,
            (Head | Tail, Consumable) => Interaction::Eat,
            (Head | Tail, Roaming) => Interaction::DefeatedByOther,
            (Head | Tail, Head | Tail) => Interaction::OwnTail,
            (Consumable, _) => Interaction::Ignore,
        }
    }

    /// Whether the mover's trial move is rejected
    pub fn rejects_move(self) -> bool {
        !matches!(
            self,
            Interaction::Ignore | Interaction::Consume | Interaction::Eat
        )
    }
}

/// The game's physical rules: playfield bounds, collisions and placement
#[derive(Debug, Clone)]
pub struct Physics {
    bounds: Aabb,
    /// Bodies placed so far, seeded at 1
    generated: u32,
    rng: Pcg32,
    outcome: Option<LossReason>,
    events: Vec<GameEvent>,
}

impl Physics {
    pub fn new(world: WorldSize, seed: u64) -> Self {
        Self {
            bounds: bounds_of(world),
            generated: 1,
            rng: Pcg32::seed_from_u64(seed),
            outcome: None,
            events: Vec::new(),
        }
    }

    /// Reset counters and the outcome for a new run
    pub fn init(&mut self) {
        self.generated = 1;
        self.outcome = None;
        self.events.clear();
    }

    pub fn bounds(&self) -> Aabb {
        self.bounds
    }

    pub fn set_world_size(&mut self, world: WorldSize) {
        self.bounds = bounds_of(world);
    }

    pub fn outcome(&self) -> Option<&LossReason> {
        self.outcome.as_ref()
    }

    pub fn rng(&mut self) -> &mut Pcg32 {
        &mut self.rng
    }

    /// Drain events raised since the last call
    pub fn take_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    fn finish(&mut self, reason: LossReason) {
        if self.outcome.is_none() {
            log::info!("Game over: {reason}");
            self.events.push(GameEvent::Defeated(reason.clone()));
            self.outcome = Some(reason);
        }
    }

    /// Check a body's trial polygon against the bounds and every other body.
    ///
    /// Returns true if the move may be committed. Once the game has ended,
    /// no move is valid.
    pub fn validate(&mut self, groups: &mut [BodyGroup], at: BodyRef) -> bool {
        if self.outcome.is_some() {
            return false;
        }

        let mut valid = true;
        let role = groups[at.group].bodies()[at.index].role;

        if !self.bounds.contains(&groups[at.group].bodies()[at.index].bounds()) {
            if role == Role::Roaming {
                self.bounce_off_walls(&mut groups[at.group], at.index);
            } else if role.is_player() {
                self.finish(LossReason::Wall);
            }
            valid = false;
        }

        // Collect overlaps first, then apply their effects
        let hits: Vec<BodyRef> = {
            let mover = &groups[at.group].bodies()[at.index];
            groups
                .iter()
                .enumerate()
                .flat_map(|(g, group)| {
                    group
                        .bodies()
                        .iter()
                        .enumerate()
                        .map(move |(i, body)| (BodyRef::new(g, i), body))
                })
                .filter(|(r, body)| {
                    *r != at && polygons_overlap(mover.points(), body.points())
                })
                .map(|(r, _)| r)
                .collect()
        };

        for other in hits {
            let other_role = groups[other.group].bodies()[other.index].role;
            let interaction = Interaction::between(role, other_role);
            match interaction {
                Interaction::Ignore => {}
                Interaction::ElasticBounce => self.collision(groups, at, other),
                Interaction::Consume | Interaction::Eat => {
                    let food = &mut groups[other.group].bodies_mut()[other.index];
                    // Food may already have been eaten this frame and not yet removed
                    if !food.consumed {
                        food.consumed = true;
                        self.events.push(GameEvent::Consumed {
                            food: food.id,
                            by: role,
                        });
                    }
                }
                Interaction::DefeatedByMover => {
                    let name = groups[at.group].name.clone();
                    self.finish(LossReason::BeatenBy(name));
                }
                Interaction::DefeatedByOther => {
                    let name = groups[other.group].name.clone();
                    self.finish(LossReason::BeatenBy(name));
                }
                Interaction::OwnTail => self.finish(LossReason::OwnTail),
            }
            if interaction.rejects_move() {
                valid = false;
            }
        }

        valid
    }

    /// Reflect a roaming body off whichever playfield edges its polygon crosses.
    ///
    /// Top/bottom are checked before left/right and both may apply in the
    /// same frame, so a corner hit reverses the heading.
    fn bounce_off_walls(&self, group: &mut BodyGroup, index: usize) {
        let [top, bottom, left, right] = self.bounds.edges();
        let motion = group.motion;
        let body = &mut group.bodies_mut()[index];

        if segment_intersects_polygon(top, body.points())
            || segment_intersects_polygon(bottom, body.points())
        {
            let speed = body.speed(&motion);
            body.bounce(speed, reflect_angle_x(body.direction));
        }
        if segment_intersects_polygon(left, body.points())
            || segment_intersects_polygon(right, body.points())
        {
            let speed = body.speed(&motion);
            body.bounce(speed, reflect_angle_y(body.direction));
        }
    }

    /// Mass-weighted elastic bounce between two roaming bodies.
    ///
    /// Polygon areas stand in for mass: the larger body pushes the smaller one
    /// harder and is itself pushed less. Each leaves along the line joining
    /// the centers, away from the other.
    pub fn collision(&mut self, groups: &mut [BodyGroup], a: BodyRef, b: BodyRef) {
        let (mass_a, center_a, id_a) = {
            let body = &groups[a.group].bodies()[a.index];
            (body.area(), body.center(), body.id)
        };
        let (mass_b, center_b, id_b) = {
            let body = &groups[b.group].bodies()[b.index];
            (body.area(), body.center(), body.id)
        };

        let (weight_a, weight_b) = collision_weights(mass_a, mass_b);
        let speed_a = groups[a.group].motion.speed * weight_a;
        let speed_b = groups[b.group].motion.speed * weight_b;

        let away_a = center_a - center_b;
        let away_b = center_b - center_a;
        groups[a.group].bodies_mut()[a.index].bounce(speed_a, away_a.y.atan2(away_a.x));
        groups[b.group].bodies_mut()[b.index].bounce(speed_b, away_b.y.atan2(away_b.x));

        self.events.push(GameEvent::Collided { a: id_a, b: id_b });
    }

    /// Attempt budget for a placement search of the given radius.
    ///
    /// Many attempts while the world is empty and success is likely, fewer
    /// as more bodies have been placed.
    pub fn placement_attempts(&self, radius: f32) -> u32 {
        let side = radius * 2.0;
        let naive = (self.bounds.area() / (side * side)).floor();
        (naive * PLACEMENT_BASE_WEIGHT + naive / self.generated as f32 * PLACEMENT_DECAY_WEIGHT)
            .ceil() as u32
    }

    /// Random center whose `2r` square is inside the bounds and clear of every body.
    ///
    /// Gives up with `None` once the attempt budget is spent.
    pub fn find_free_position(&mut self, groups: &[BodyGroup], radius: f32) -> Option<Vec2> {
        let attempts = self.placement_attempts(radius);
        let (min, max) = (self.bounds.min, self.bounds.max);

        for _ in 0..attempts {
            let p = Vec2::new(
                self.rng.random_range(min.x..max.x),
                self.rng.random_range(min.y..max.y),
            );
            let probe = Aabb::around(p, radius);
            if !self.bounds.contains(&probe) {
                continue;
            }
            let corners = probe.corners();
            let blocked = groups
                .iter()
                .flat_map(|g| g.bodies())
                .any(|body| polygons_overlap(body.points(), &corners));
            if blocked {
                continue;
            }
            self.generated += 1;
            return Some(p);
        }
        None
    }
}

fn bounds_of(world: WorldSize) -> Aabb {
    Aabb::new(Vec2::ZERO, Vec2::new(world.width, world.height))
}

/// Velocity weights of an elastic collision between masses `a` and `b`
pub fn collision_weights(mass_a: f32, mass_b: f32) -> (f32, f32) {
    let combined = mass_a + mass_b;
    (2.0 * mass_b / combined, 2.0 * mass_a / combined)
}

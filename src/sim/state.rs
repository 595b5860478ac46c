//! World state: every body group, the physics rules and the run outcome
//!
//! Group order is fixed at construction: the snake first, then food, then
//! each enemy type in roster order. Enemy types can be added and removed at
//! runtime.

use std::f32::consts::TAU;

use glam::Vec2;
use rand::Rng;

use super::body::{Body, Role};
use super::group::{BodyGroup, GroupKind, Heading};
use super::physics::{BodyRef, GameEvent, LossReason, Physics};
use crate::renderer::Surface;
use crate::settings::{EnemyConfig, Settings, WorldSize};

/// Complete simulation state
#[derive(Debug, Clone)]
pub struct GameState {
    /// Run seed for reproducibility
    pub seed: u64,
    /// Simulation frame counter
    pub frames: u64,
    world: WorldSize,
    physics: Physics,
    groups: Vec<BodyGroup>,
    /// Next entity ID
    next_id: u32,
}

impl GameState {
    /// Build the world from validated settings and populate it
    pub fn new(settings: &Settings) -> Self {
        let seed = settings.seed.unwrap_or_else(rand::random);

        let mut groups = vec![
            BodyGroup::snake(&settings.snake),
            BodyGroup::food(&settings.food),
        ];
        groups.extend(settings.enemies.iter().map(BodyGroup::enemy));

        let mut state = Self {
            seed,
            frames: 0,
            world: settings.world,
            physics: Physics::new(settings.world, seed),
            groups,
            next_id: 1,
        };
        state.init();
        state
    }

    /// Reset every group to its starting population
    pub fn init(&mut self) {
        self.physics.init();
        self.frames = 0;
        self.next_id = 1;
        for index in 0..self.groups.len() {
            self.init_group(index);
        }
    }

    /// Clear one group and spawn its starting bodies
    pub fn init_group(&mut self, index: usize) {
        self.groups[index].init();

        let copies = match &self.groups[index].kind {
            GroupKind::Snake(_) => None,
            GroupKind::Food(_) => return,
            GroupKind::Enemy(enemy) => Some(enemy.copies),
        };
        let Some(copies) = copies else {
            // The head starts at the center of the playfield
            let center = Vec2::new(self.world.width, self.world.height) / 2.0;
            self.spawn_at(index, center);
            return;
        };

        for _ in 0..copies {
            let Some(at) = self.spawn_at_free_position(index) else {
                break;
            };
            let direction = self.physics.rng().random_range(0.0..TAU);
            let spin = self.groups[index].motion.spin;
            let body = &mut self.groups[index].bodies_mut()[at.index];
            body.direction = direction;
            body.moving = true;
            body.rotating = spin;
        }
    }

    /// Allocate a new entity ID
    pub fn next_entity_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    pub fn groups(&self) -> &[BodyGroup] {
        &self.groups
    }

    pub fn group(&self, index: usize) -> Option<&BodyGroup> {
        self.groups.get(index)
    }

    pub(crate) fn group_mut(&mut self, index: usize) -> &mut BodyGroup {
        &mut self.groups[index]
    }

    /// Index of the snake group
    pub fn snake_index(&self) -> Option<usize> {
        self.groups
            .iter()
            .position(|g| matches!(g.kind, GroupKind::Snake(_)))
    }

    pub fn snake(&self) -> Option<&BodyGroup> {
        self.snake_index().map(|i| &self.groups[i])
    }

    /// The snake's head, first body of the snake group
    pub fn head(&self) -> Option<&Body> {
        self.snake().and_then(|g| g.bodies().first())
    }

    /// Tail segments collected so far
    pub fn score(&self) -> u32 {
        self.snake()
            .map_or(0, |g| g.len().saturating_sub(1) as u32)
    }

    pub fn world_size(&self) -> WorldSize {
        self.world
    }

    /// Resize the playfield. Bodies left outside are dealt with by the
    /// usual bounds check on their next move.
    pub fn set_world_size(&mut self, world: WorldSize) {
        self.world = world;
        self.physics.set_world_size(world);
    }

    pub fn physics(&self) -> &Physics {
        &self.physics
    }

    pub fn outcome(&self) -> Option<&LossReason> {
        self.physics.outcome()
    }

    pub fn is_over(&self) -> bool {
        self.physics.outcome().is_some()
    }

    /// Create a body of the given group at `center`
    pub fn spawn_at(&mut self, group: usize, center: Vec2) -> BodyRef {
        let id = self.next_entity_id();
        let g = &mut self.groups[group];
        let body = Body::new(id, g.role, g.outline().clone(), center, 0.0);
        g.push(body);
        BodyRef::new(group, g.len() - 1)
    }

    /// Create a body of the given group at a random free position.
    ///
    /// Returns `None` without spawning when no free spot was found.
    pub fn spawn_at_free_position(&mut self, group: usize) -> Option<BodyRef> {
        let radius = self.groups[group].shape.radius;
        match self.physics.find_free_position(&self.groups, radius) {
            Some(center) => Some(self.spawn_at(group, center)),
            None => {
                log::debug!("No free position for {} (r={radius})", self.groups[group].name);
                None
            }
        }
    }

    /// Move one body by `dt`, committing the move only if physics accepts it.
    ///
    /// Side effects of validation (bounces, eaten food, the end of the run)
    /// are applied before this returns.
    pub fn advance_body(&mut self, at: BodyRef, dt: f32) -> bool {
        let motion = self.groups[at.group].motion;
        let Some(trial) = self.groups[at.group].bodies_mut()[at.index].begin_move(dt, &motion)
        else {
            return true;
        };

        let valid = self.physics.validate(&mut self.groups, at);

        let body = &mut self.groups[at.group].bodies_mut()[at.index];
        if valid {
            body.commit(trial);
        } else {
            body.rollback(trial);
        }

        for event in self.physics.take_events() {
            self.apply_event(event);
        }
        valid
    }

    fn apply_event(&mut self, event: GameEvent) {
        match event {
            GameEvent::Consumed { by, .. } if by.is_player() => {
                if let Some(index) = self.snake_index() {
                    if let Some(snake) = self.groups[index].as_snake_mut() {
                        snake.pending_growth += 1;
                    }
                }
            }
            GameEvent::Consumed { food, by } => {
                log::debug!("Food {food} consumed by {by:?}");
            }
            GameEvent::Collided { .. } | GameEvent::Defeated(_) => {}
        }
    }

    /// Point the snake in a new direction, starting it if it was waiting
    pub fn steer(&mut self, heading: Heading) {
        let Some(index) = self.snake_index() else {
            return;
        };
        let group = &mut self.groups[index];
        if let Some(snake) = group.as_snake_mut() {
            snake.heading = heading.angle();
            snake.moving = true;
        }
        for body in group.bodies_mut() {
            body.moving = true;
        }
    }

    /// Toggle spinning of every snake segment
    pub fn set_spin(&mut self, spin: bool) {
        let Some(index) = self.snake_index() else {
            return;
        };
        let group = &mut self.groups[index];
        if let Some(snake) = group.as_snake_mut() {
            snake.spin = spin;
        }
        for body in group.bodies_mut() {
            body.rotating = spin;
        }
    }

    /// Add an enemy type and spawn its bodies, returning its group index
    pub fn add_enemy(&mut self, config: &EnemyConfig) -> usize {
        self.groups.push(BodyGroup::enemy(config));
        let index = self.groups.len() - 1;
        self.init_group(index);
        log::info!("Added enemy type {}", self.groups[index].name);
        index
    }

    /// Remove the `n`th enemy type together with its bodies
    pub fn remove_enemy(&mut self, n: usize) -> Option<BodyGroup> {
        let index = self
            .groups
            .iter()
            .enumerate()
            .filter(|(_, g)| g.role == Role::Roaming)
            .nth(n)
            .map(|(i, _)| i)?;
        let group = self.groups.remove(index);
        log::info!("Removed enemy type {}", group.name);
        Some(group)
    }

    /// Enemy types currently in play
    pub fn enemy_count(&self) -> usize {
        self.groups
            .iter()
            .filter(|g| matches!(g.kind, GroupKind::Enemy(_)))
            .count()
    }

    /// Draw every group in order
    pub fn paint(&self, surface: &mut dyn Surface) {
        for group in &self.groups {
            group.paint(surface);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quiet_settings() -> Settings {
        Settings {
            seed: Some(42),
            enemies: Vec::new(),
            ..Default::default()
        }
    }

    #[test]
    fn test_new_populates_world() {
        let settings = Settings {
            seed: Some(1),
            ..Default::default()
        };
        let state = GameState::new(&settings);

        assert_eq!(state.groups().len(), 2 + settings.enemies.len());
        assert_eq!(state.head().map(|h| h.center()), Some(Vec2::new(320.0, 275.0)));
        assert_eq!(state.score(), 0);
        // Pentagon x1, Trigon x2, Octagon x1
        let enemies: usize = state.groups()[2..].iter().map(|g| g.len()).sum();
        assert_eq!(enemies, 4);
        assert!(state.groups()[2..]
            .iter()
            .flat_map(|g| g.bodies())
            .all(|b| b.moving));
    }

    #[test]
    fn test_same_seed_same_world() {
        let settings = Settings {
            seed: Some(77),
            ..Default::default()
        };
        let a = GameState::new(&settings);
        let b = GameState::new(&settings);
        let centers = |s: &GameState| -> Vec<Vec2> {
            s.groups().iter().flat_map(|g| g.bodies()).map(|b| b.center()).collect()
        };
        assert_eq!(centers(&a), centers(&b));
    }

    #[test]
    fn test_idle_snake_does_not_move() {
        let mut state = GameState::new(&quiet_settings());
        let head = BodyRef::new(0, 0);
        assert!(state.advance_body(head, 0.1));
        assert_eq!(state.head().map(|h| h.center()), Some(Vec2::new(320.0, 275.0)));
    }

    #[test]
    fn test_eating_queues_growth() {
        let mut state = GameState::new(&quiet_settings());
        state.spawn_at(1, Vec2::new(345.0, 275.0));
        state.steer(Heading::Right);

        assert!(state.advance_body(BodyRef::new(0, 0), 0.1));
        assert!(state.groups()[1].bodies()[0].consumed);
        assert_eq!(state.snake().and_then(|g| g.as_snake()).map(|s| s.pending_growth), Some(1));
    }

    #[test]
    fn test_remove_enemy_only_touches_enemy_groups() {
        let mut state = GameState::new(&quiet_settings());
        assert!(state.remove_enemy(0).is_none());

        let index = state.add_enemy(&EnemyConfig::default());
        assert_eq!(index, 2);
        assert_eq!(state.enemy_count(), 1);
        let removed = state.remove_enemy(0).expect("enemy group");
        assert_eq!(removed.name, "Pentagon");
        assert_eq!(state.groups().len(), 2);
    }

    #[test]
    fn test_init_restores_start() {
        let mut state = GameState::new(&quiet_settings());
        state.steer(Heading::Down);
        state.advance_body(BodyRef::new(0, 0), 0.1);
        assert_ne!(state.head().map(|h| h.center()), Some(Vec2::new(320.0, 275.0)));

        state.init();
        assert_eq!(state.head().map(|h| h.center()), Some(Vec2::new(320.0, 275.0)));
        assert_eq!(state.snake().and_then(|g| g.as_snake()).map(|s| s.moving), Some(false));
    }
}

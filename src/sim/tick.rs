//! Per-frame world update
//!
//! Groups are updated in order: snake, food, enemies. Each body's move goes
//! through `GameState::advance_body`, so a rejected move leaves the body
//! exactly where it was.

use super::body::{Body, Role};
use super::group::{GroupKind, Heading};
use super::physics::BodyRef;
use super::state::GameState;
use crate::{angle_delta, heading_vector, opposite_angle, wrap_angle};

/// Player input applied at the start of a frame
#[derive(Debug, Clone, Default)]
pub struct TickInput {
    /// New heading for the snake
    pub heading: Option<Heading>,
    /// Turn snake spinning on or off
    pub spin: Option<bool>,
}

/// Advance the world by `dt` seconds
pub fn tick(state: &mut GameState, input: &TickInput, dt: f32) {
    // Frozen until the world is reset
    if state.is_over() {
        return;
    }

    if let Some(heading) = input.heading {
        state.steer(heading);
    }
    if let Some(spin) = input.spin {
        state.set_spin(spin);
    }

    for index in 0..state.groups().len() {
        update_group(state, index, dt);
        if state.is_over() {
            break;
        }
    }
    state.frames += 1;
}

/// Update a single group by `dt` seconds
pub fn update_group(state: &mut GameState, index: usize, dt: f32) {
    let Some(group) = state.group(index) else {
        return;
    };
    match group.kind {
        GroupKind::Snake(_) => update_snake(state, index, dt),
        GroupKind::Food(_) => update_food(state, index, dt),
        GroupKind::Enemy(_) => update_enemies(state, index, dt),
    }
}

/// Move the snake in whole steps of one body diameter
fn update_snake(state: &mut GameState, index: usize, dt: f32) {
    let step = state.group_mut(index).step_duration();
    let steps = {
        let Some(snake) = state.group_mut(index).as_snake_mut() else {
            return;
        };
        if !snake.moving {
            snake.step_timer = 0.0;
            return;
        }
        snake.step_timer += dt;
        let mut steps = 0;
        while snake.step_timer >= step {
            snake.step_timer -= step;
            steps += 1;
        }
        steps
    };

    for _ in 0..steps {
        step_snake(state, index, step);
        if state.is_over() {
            return;
        }
    }
}

/// One snake step: grow, pass headings down the tail, then move every segment
fn step_snake(state: &mut GameState, index: usize, step: f32) {
    let diameter = state.group_mut(index).shape.radius * 2.0;

    let grow = state
        .group_mut(index)
        .as_snake()
        .is_some_and(|s| s.moving && s.pending_growth > 0);
    if grow {
        grow_tail(state, index, diameter);
    }

    let group = state.group_mut(index);
    let heading = group.as_snake().map_or(0.0, |s| s.heading);
    let bodies = group.bodies_mut();
    for i in (1..bodies.len()).rev() {
        bodies[i].direction = bodies[i - 1].direction;
    }
    if let Some(head) = bodies.first_mut() {
        head.direction = heading;
    }

    let len = state.group_mut(index).len();
    for i in 0..len {
        state.advance_body(BodyRef::new(index, i), step);
        if state.is_over() {
            return;
        }
    }
}

/// Append a segment one diameter behind the last one
fn grow_tail(state: &mut GameState, index: usize, diameter: f32) {
    let id = state.next_entity_id();
    let group = state.group_mut(index);
    let Some(snake) = group.as_snake_mut() else {
        return;
    };
    snake.pending_growth -= 1;
    let outline = snake.tail_outline.clone();

    let (Some(head), Some(last)) = (group.bodies().first(), group.bodies().last()) else {
        return;
    };
    let center = last.center() + heading_vector(opposite_angle(last.direction)) * diameter;
    let mut tail = Body::new(id, Role::Tail, outline, center, head.angle());
    tail.direction = last.direction;
    tail.moving = last.moving;
    tail.rotating = head.rotating;
    group.push(tail);
}

/// Drop eaten food, then spawn new food while below the maximum
fn update_food(state: &mut GameState, index: usize, dt: f32) {
    let group = state.group_mut(index);
    let removed = group.remove_consumed();
    if removed > 0 {
        log::debug!("Removed {removed} eaten food");
    }

    let live = group.len();
    let GroupKind::Food(food) = &mut group.kind else {
        return;
    };
    if live >= food.maximum {
        return;
    }
    food.spawn_timer += dt;

    let (maximum, interval) = (food.maximum, food.spawn_interval);
    loop {
        let group = state.group_mut(index);
        let live = group.len();
        let GroupKind::Food(food) = &mut group.kind else {
            return;
        };
        if food.spawn_timer < interval || live >= maximum {
            return;
        }
        food.spawn_timer -= interval;
        if state.spawn_at_free_position(index).is_none() {
            return;
        }
    }
}

/// Steer every enemy of a type toward the snake's head, then move it
fn update_enemies(state: &mut GameState, index: usize, dt: f32) {
    let target = state.head().map(|h| h.center());
    let group = state.group_mut(index);
    let turning_speed = match &group.kind {
        GroupKind::Enemy(enemy) => enemy.turning_speed,
        _ => return,
    };

    if let Some(target) = target {
        if turning_speed > 0.0 {
            let max_turn = turning_speed * std::f32::consts::TAU * dt;
            for body in group.bodies_mut() {
                steer_toward(body, target, max_turn);
            }
        }
    }

    let len = state.group_mut(index).len();
    for i in 0..len {
        state.advance_body(BodyRef::new(index, i), dt);
        if state.is_over() {
            return;
        }
    }
}

/// Turn a body's heading toward `target` by at most `max_turn` radians.
///
/// A bouncing body settles back to its normal speed once its heading is
/// on target again.
fn steer_toward(body: &mut Body, target: glam::Vec2, max_turn: f32) {
    let to_target = target - body.center();
    if to_target.length_squared() <= f32::EPSILON {
        return;
    }
    let desired = to_target.y.atan2(to_target.x);
    let delta = angle_delta(body.direction, desired);

    if delta.abs() <= max_turn {
        body.direction = wrap_angle(desired);
        if body.bouncing {
            body.settle();
        }
    } else {
        body.direction = wrap_angle(body.direction + max_turn.copysign(delta));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::{EnemyConfig, Settings};
    use crate::sim::physics::LossReason;
    use glam::Vec2;
    use std::f32::consts::PI;

    const STEP: f32 = 0.1;

    /// Seeded world without enemies or spawning food
    fn quiet_state() -> GameState {
        let mut settings = Settings {
            seed: Some(12345),
            enemies: Vec::new(),
            ..Default::default()
        };
        settings.food.maximum = 0;
        GameState::new(&settings)
    }

    fn steer(heading: Heading) -> TickInput {
        TickInput {
            heading: Some(heading),
            ..Default::default()
        }
    }

    fn head_center(state: &GameState) -> Vec2 {
        state.head().map(|h| h.center()).unwrap_or(Vec2::NAN)
    }

    #[test]
    fn test_snake_waits_for_first_heading() {
        let mut state = quiet_state();
        for _ in 0..5 {
            tick(&mut state, &TickInput::default(), STEP);
        }
        assert_eq!(head_center(&state), Vec2::new(320.0, 275.0));
        assert_eq!(state.frames, 5);
    }

    #[test]
    fn test_snake_moves_speed_times_time() {
        let mut state = quiet_state();
        tick(&mut state, &steer(Heading::Right), STEP);
        for _ in 0..4 {
            tick(&mut state, &TickInput::default(), STEP);
        }
        // 200 px/s for 0.5 s
        assert!((head_center(&state) - Vec2::new(420.0, 275.0)).length() < 1e-3);
        assert!(!state.is_over());
    }

    #[test]
    fn test_partial_steps_accumulate() {
        let mut state = quiet_state();
        tick(&mut state, &steer(Heading::Down), 0.05);
        assert_eq!(head_center(&state), Vec2::new(320.0, 275.0));
        tick(&mut state, &TickInput::default(), 0.05);
        assert!((head_center(&state) - Vec2::new(320.0, 295.0)).length() < 1e-3);
    }

    #[test]
    fn test_eats_food_ahead_and_grows_once() {
        let mut state = quiet_state();
        state.spawn_at(1, Vec2::new(370.0, 275.0));

        tick(&mut state, &steer(Heading::Right), STEP);
        assert_eq!(state.groups()[1].len(), 1);
        tick(&mut state, &TickInput::default(), STEP);
        // Eaten this frame, removed in the same frame's food update
        assert!(state.groups()[1].is_empty());
        assert_eq!(state.score(), 0);

        for _ in 0..4 {
            tick(&mut state, &TickInput::default(), STEP);
        }
        let snake = state.snake().expect("snake group");
        assert_eq!(snake.len(), 2);
        assert_eq!(state.score(), 1);
        assert_eq!(snake.bodies()[1].role, Role::Tail);
        // The new segment trails one diameter behind the head
        let gap = snake.bodies()[0].center() - snake.bodies()[1].center();
        assert!((gap - Vec2::new(20.0, 0.0)).length() < 1e-3);
        assert!(!state.is_over());
    }

    #[test]
    fn test_wall_ends_the_run() {
        let mut state = quiet_state();
        tick(&mut state, &steer(Heading::Right), STEP);
        for _ in 0..40 {
            tick(&mut state, &TickInput::default(), STEP);
        }
        assert_eq!(state.outcome(), Some(&LossReason::Wall));
        assert_eq!(
            state.outcome().map(|r| r.to_string()),
            Some("You crashed into the wall!".to_string())
        );
        // Rejected move: the head stays at its last valid spot
        assert!((head_center(&state) - Vec2::new(620.0, 275.0)).length() < 1e-3);
    }

    #[test]
    fn test_own_tail_crash() {
        let mut state = quiet_state();
        if let Some(snake) = state.group_mut(0).as_snake_mut() {
            snake.pending_growth = 4;
        }

        tick(&mut state, &steer(Heading::Right), STEP);
        for _ in 0..3 {
            tick(&mut state, &TickInput::default(), STEP);
        }
        assert_eq!(state.snake().map(|g| g.len()), Some(5));
        assert!(!state.is_over());

        tick(&mut state, &steer(Heading::Down), STEP);
        tick(&mut state, &steer(Heading::Left), STEP);
        assert!(!state.is_over());
        tick(&mut state, &steer(Heading::Up), STEP);
        assert_eq!(state.outcome(), Some(&LossReason::OwnTail));
    }

    #[test]
    fn test_roaming_body_reflects_off_left_edge() {
        let mut state = quiet_state();
        let config = EnemyConfig {
            turning_speed: 0.0,
            copies: 0,
            ..Default::default()
        };
        let index = state.add_enemy(&config);
        let at = state.spawn_at(index, Vec2::new(15.0, 100.0));
        {
            let body = &mut state.group_mut(index).bodies_mut()[at.index];
            body.direction = PI;
            body.moving = true;
        }

        tick(&mut state, &TickInput::default(), STEP);
        let body = &state.groups()[index].bodies()[at.index];
        assert!(body.direction.abs() < 1e-5);
        assert_eq!(body.center(), Vec2::new(15.0, 100.0));
        // Vertical component of the heading is untouched
        assert!(heading_vector(body.direction).y.abs() < 1e-5);

        tick(&mut state, &TickInput::default(), STEP);
        let body = &state.groups()[index].bodies()[at.index];
        assert!((body.center() - Vec2::new(21.0, 100.0)).length() < 1e-3);
    }

    #[test]
    fn test_enemy_turns_toward_head_at_limited_rate() {
        let mut state = quiet_state();
        let config = EnemyConfig {
            turning_speed: 0.25,
            copies: 0,
            ..Default::default()
        };
        let index = state.add_enemy(&config);
        let at = state.spawn_at(index, Vec2::new(100.0, 275.0));
        state.group_mut(index).bodies_mut()[at.index].direction = PI / 2.0;

        tick(&mut state, &TickInput::default(), STEP);
        let direction = state.groups()[index].bodies()[at.index].direction;
        // 0.25 rev/s over 0.1 s is π/20
        assert!((direction - (PI / 2.0 - PI / 20.0)).abs() < 1e-4);

        for _ in 0..12 {
            tick(&mut state, &TickInput::default(), STEP);
        }
        // Locked on: heading along the line to the head
        let body = &state.groups()[index].bodies()[at.index];
        let to_head = head_center(&state) - body.center();
        let desired = to_head.y.atan2(to_head.x);
        assert!(angle_delta(body.direction, desired).abs() < 1e-3);
    }

    #[test]
    fn test_bouncing_enemy_settles_on_target() {
        let mut body = Body::new(
            1,
            Role::Roaming,
            crate::sim::geometry::build_outline(5, 0.0, 10.0).into(),
            Vec2::new(100.0, 100.0),
            0.0,
        );
        body.bounce(150.0, PI);
        let target = Vec2::new(200.0, 100.0);

        steer_toward(&mut body, target, 0.5);
        assert!(body.bouncing);
        for _ in 0..10 {
            steer_toward(&mut body, target, 0.5);
        }
        assert!(!body.bouncing);
        assert_eq!(body.bounce_speed, None);
        assert!(body.direction.abs() < 1e-5);
    }

    #[test]
    fn test_food_spawns_up_to_maximum() {
        let mut settings = Settings {
            seed: Some(5),
            enemies: Vec::new(),
            ..Default::default()
        };
        settings.food.maximum = 3;
        settings.food.spawn_interval = 1.0;
        let mut state = GameState::new(&settings);

        // Timer starts full: first food on the first update
        tick(&mut state, &TickInput::default(), 0.01);
        assert_eq!(state.groups()[1].len(), 1);

        tick(&mut state, &TickInput::default(), 5.0);
        assert_eq!(state.groups()[1].len(), 3);
        tick(&mut state, &TickInput::default(), 5.0);
        assert_eq!(state.groups()[1].len(), 3);
    }

    #[test]
    fn test_determinism() {
        let settings = Settings {
            seed: Some(99999),
            ..Default::default()
        };
        let mut state1 = GameState::new(&settings);
        let mut state2 = GameState::new(&settings);

        let inputs = [
            steer(Heading::Up),
            TickInput::default(),
            TickInput {
                spin: Some(true),
                ..Default::default()
            },
            steer(Heading::Left),
        ];
        for input in &inputs {
            tick(&mut state1, input, 1.0 / 60.0);
            tick(&mut state2, input, 1.0 / 60.0);
        }

        let centers = |s: &GameState| -> Vec<Vec2> {
            s.groups().iter().flat_map(|g| g.bodies()).map(|b| b.center()).collect()
        };
        assert_eq!(centers(&state1), centers(&state2));
        assert_eq!(state1.outcome(), state2.outcome());
    }
}

//! Simulation module
//!
//! All gameplay logic lives here. Nothing in this module knows about
//! threads or wall-clock time:
//! - Time only enters as the `dt` passed to `tick`
//! - Randomness comes from the seeded RNG owned by `Physics`
//! - Groups and bodies are iterated in a stable order

pub mod body;
pub mod geometry;
pub mod group;
pub mod physics;
pub mod state;
pub mod tick;

pub use body::{Body, Motion, Role, Trial};
pub use geometry::{Aabb, Segment, polygon_name, polygons_overlap};
pub use group::{BodyGroup, GroupKind, Heading};
pub use physics::{BodyRef, GameEvent, Interaction, LossReason, Physics};
pub use state::GameState;
pub use tick::{TickInput, tick, update_group};

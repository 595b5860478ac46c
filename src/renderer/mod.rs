//! Rendering boundary
//!
//! The simulation draws through [`Surface`]; the game loop hands each
//! finished frame to a [`FrameSink`]. [`MeshSurface`] tessellates polygons
//! into triangle lists ready for GPU upload.

pub mod mesh;
pub mod vertex;

pub use mesh::MeshSurface;
pub use vertex::Vertex;

use glam::Vec2;

use crate::settings::Color;
use crate::sim::GameState;

/// Something polygons can be drawn on
pub trait Surface {
    /// Fill a convex polygon
    fn fill_polygon(&mut self, points: &[Vec2], color: Color);

    /// Outline a polygon with a line of the given width
    fn stroke_polygon(&mut self, points: &[Vec2], color: Color, width: f32);
}

/// Per-frame information shown alongside the world
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrameStats {
    /// Frames presented since the loop started
    pub frame: u64,
    /// Seconds simulated by this frame
    pub dt: f32,
    /// Frames per second, when the counter is enabled
    pub fps: Option<u32>,
    /// Snake length minus the head
    pub score: u32,
    /// End-of-run message once the game is over
    pub message: Option<String>,
}

/// Receiver of finished frames, called from the loop thread
pub trait FrameSink: Send {
    fn present(&mut self, state: &GameState, stats: &FrameStats);
}

//! Polygon tessellation into triangle lists

use glam::Vec2;

use super::vertex::Vertex;
use super::{FrameSink, FrameStats, Surface};
use crate::settings::Color;
use crate::sim::GameState;

/// Surface that records everything drawn as triangles
#[derive(Debug, Clone, Default)]
pub struct MeshSurface {
    clear_color: Color,
    vertices: Vec<Vertex>,
    stats: FrameStats,
}

impl MeshSurface {
    pub fn new(clear_color: Color) -> Self {
        Self {
            clear_color,
            ..Default::default()
        }
    }

    /// Triangle list of the current frame, three vertices per triangle
    pub fn vertices(&self) -> &[Vertex] {
        &self.vertices
    }

    /// Raw bytes of the triangle list for a vertex buffer
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.vertices)
    }

    pub fn clear_color(&self) -> Color {
        self.clear_color
    }

    /// Stats of the last presented frame
    pub fn stats(&self) -> &FrameStats {
        &self.stats
    }

    pub fn clear(&mut self) {
        self.vertices.clear();
    }
}

impl Surface for MeshSurface {
    fn fill_polygon(&mut self, points: &[Vec2], color: Color) {
        if points.len() < 3 {
            return;
        }
        // Convex polygons fan out from the first vertex
        let first = points[0];
        for pair in points[1..].windows(2) {
            self.vertices.push(Vertex::at(first, color));
            self.vertices.push(Vertex::at(pair[0], color));
            self.vertices.push(Vertex::at(pair[1], color));
        }
    }

    fn stroke_polygon(&mut self, points: &[Vec2], color: Color, width: f32) {
        if points.len() < 2 || width <= 0.0 {
            return;
        }
        let half = width / 2.0;

        for i in 0..points.len() {
            let p1 = points[i];
            let p2 = points[(i + 1) % points.len()];

            let dir = (p2 - p1).normalize_or_zero();
            // Perpendicular for width
            let perp = Vec2::new(-dir.y, dir.x) * half;

            // Quad corners
            let a1 = p1 + perp;
            let b1 = p1 - perp;
            let a2 = p2 + perp;
            let b2 = p2 - perp;

            // Two triangles
            self.vertices.push(Vertex::at(a1, color));
            self.vertices.push(Vertex::at(b1, color));
            self.vertices.push(Vertex::at(a2, color));

            self.vertices.push(Vertex::at(a2, color));
            self.vertices.push(Vertex::at(b1, color));
            self.vertices.push(Vertex::at(b2, color));
        }
    }
}

impl FrameSink for MeshSurface {
    fn present(&mut self, state: &GameState, stats: &FrameStats) {
        self.clear();
        state.paint(self);
        self.stats = stats.clone();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::Settings;

    const RED: Color = [1.0, 0.0, 0.0, 1.0];

    fn square() -> Vec<Vec2> {
        vec![
            Vec2::new(0.0, 0.0),
            Vec2::new(10.0, 0.0),
            Vec2::new(10.0, 10.0),
            Vec2::new(0.0, 10.0),
        ]
    }

    #[test]
    fn test_fill_is_a_fan() {
        let mut surface = MeshSurface::default();
        surface.fill_polygon(&square(), RED);
        let v = surface.vertices();
        assert_eq!(v.len(), 6);
        assert_eq!(v[0].position, [0.0, 0.0]);
        assert_eq!(v[3].position, [0.0, 0.0]);
        assert_eq!(v[5].position, [0.0, 10.0]);
    }

    #[test]
    fn test_stroke_straddles_edges() {
        let mut surface = MeshSurface::default();
        surface.stroke_polygon(&square(), RED, 2.0);
        let v = surface.vertices();
        assert_eq!(v.len(), 4 * 6);
        // Top edge runs along +x, so its band spans y in [-1, 1]
        assert_eq!(v[0].position, [0.0, 1.0]);
        assert_eq!(v[1].position, [0.0, -1.0]);

        surface.clear();
        surface.stroke_polygon(&square(), RED, 0.0);
        assert!(surface.vertices().is_empty());
    }

    #[test]
    fn test_present_repaints_whole_world() {
        let settings = Settings {
            seed: Some(3),
            enemies: Vec::new(),
            ..Default::default()
        };
        let state = GameState::new(&settings);
        let mut surface = MeshSurface::new(settings.background);
        let stats = FrameStats {
            frame: 1,
            ..Default::default()
        };

        surface.present(&state, &stats);
        let first = surface.vertices().len();
        // Heptagon head: 5 fill triangles + 7 border quads
        assert_eq!(first, 5 * 3 + 7 * 6);
        surface.present(&state, &stats);
        assert_eq!(surface.vertices().len(), first);
        assert_eq!(surface.stats().frame, 1);
        assert_eq!(surface.as_bytes().len(), first * 24);
    }
}

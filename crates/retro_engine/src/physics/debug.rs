//! Physics debug drawing
//!
//! Collider wireframes come from rapier's debug pipeline as line segments.
//! Triangle-mesh colliders are additionally sent as filled triangles so level
//! geometry can be checked against the visible mesh.

use rapier3d::prelude::{DebugRenderBackend, DebugRenderObject, Point, Real};

use super::conversions::from_rapier_point;
use crate::foundation::math::Vec3;

/// Color used for mesh collider triangles
pub const MESH_COLLIDER_COLOR: [f32; 4] = [0.1, 0.8, 0.3, 0.35];

/// Receiver of physics debug geometry
pub trait DebugDraw {
    /// Draw a world-space line segment
    fn draw_line(&mut self, start: Vec3, end: Vec3, color: [f32; 4]);

    /// Draw a batch of world-space triangles
    fn draw_triangles(&mut self, triangles: &[[Vec3; 3]], color: [f32; 4]);
}

/// Debug geometry collected into plain buffers
#[derive(Debug, Default, Clone)]
pub struct DebugLines {
    /// Line segments
    pub lines: Vec<(Vec3, Vec3, [f32; 4])>,
    /// Triangles
    pub triangles: Vec<[Vec3; 3]>,
}

impl DebugLines {
    /// Drop everything collected so far
    pub fn clear(&mut self) {
        self.lines.clear();
        self.triangles.clear();
    }
}

impl DebugDraw for DebugLines {
    fn draw_line(&mut self, start: Vec3, end: Vec3, color: [f32; 4]) {
        self.lines.push((start, end, color));
    }

    fn draw_triangles(&mut self, triangles: &[[Vec3; 3]], _color: [f32; 4]) {
        self.triangles.extend_from_slice(triangles);
    }
}

/// Forwards rapier's debug lines to a [`DebugDraw`]
pub(crate) struct DebugBackend<'a, D: DebugDraw + ?Sized> {
    pub target: &'a mut D,
}

impl<D: DebugDraw + ?Sized> DebugRenderBackend for DebugBackend<'_, D> {
    fn draw_line(
        &mut self,
        _: DebugRenderObject,
        a: Point<Real>,
        b: Point<Real>,
        color: [f32; 4],
    ) {
        self.target
            .draw_line(from_rapier_point(&a), from_rapier_point(&b), color);
    }
}

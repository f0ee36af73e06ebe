//! View frustum culling

use crate::foundation::math::{Mat4, Vec3, Vec4};

/// Plane defined by normal and distance from origin
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Plane {
    /// Unit normal, pointing into the frustum
    pub normal: Vec3,
    /// Signed distance term of the plane equation
    pub distance: f32,
}

impl Plane {
    /// Plane from raw `ax + by + cz + d` coefficients, normalized.
    /// Degenerate coefficients give a plane that accepts everything.
    #[must_use]
    pub fn from_coefficients(coefficients: Vec4) -> Self {
        let normal = coefficients.xyz();
        let length = normal.norm();
        if length <= f32::EPSILON {
            return Self {
                normal: Vec3::zeros(),
                distance: 0.0,
            };
        }
        Self {
            normal: normal / length,
            distance: coefficients.w / length,
        }
    }

    /// Signed distance from the plane to a point (positive = inside)
    #[must_use]
    pub fn distance_to_point(&self, point: &Vec3) -> f32 {
        self.normal.dot(point) + self.distance
    }
}

/// Six clip planes of a camera
#[derive(Debug, Clone, PartialEq)]
pub struct Frustum {
    /// Left, right, bottom, top, near, far
    pub planes: [Plane; 6],
}

impl Frustum {
    /// Extract the planes from a view-projection matrix (Gribb-Hartmann,
    /// clip depth 0..1)
    #[must_use]
    pub fn from_matrix(view_projection: &Mat4) -> Self {
        let row = |i: usize| -> Vec4 { view_projection.row(i).transpose() };
        let (r0, r1, r2, r3) = (row(0), row(1), row(2), row(3));

        Self {
            planes: [
                Plane::from_coefficients(r3 + r0),
                Plane::from_coefficients(r3 - r0),
                Plane::from_coefficients(r3 + r1),
                Plane::from_coefficients(r3 - r1),
                Plane::from_coefficients(r2),
                Plane::from_coefficients(r3 - r2),
            ],
        }
    }

    /// Whether a sphere is at least partly inside
    #[must_use]
    pub fn intersects_sphere(&self, center: &Vec3, radius: f32) -> bool {
        self.planes
            .iter()
            .all(|plane| plane.distance_to_point(center) >= -radius)
    }
}

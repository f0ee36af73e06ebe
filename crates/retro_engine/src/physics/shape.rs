//! Collision shape descriptions
//!
//! A [`ShapeDescriptor`] is plain data on the component. It becomes a rapier
//! shape only when the body is bound, scaled by the entity's world scale at
//! that moment.

use rapier3d::prelude::SharedShape;

use super::conversions::to_rapier_point;
use crate::foundation::math::{utils, Vec3};

/// Smallest number of points a convex hull can be built from
pub const MIN_HULL_POINTS: usize = 4;

/// Hulls enclosing less volume than this (after scaling) are flat
pub const MIN_HULL_VOLUME: f32 = 1e-6;

/// Shape of a physics body, in the entity's local (unscaled) units
#[derive(Debug, Clone, PartialEq)]
pub enum ShapeDescriptor {
    /// Axis-aligned box given by its half extents
    Box {
        /// Half size along each axis
        half_extents: Vec3,
    },
    /// Sphere
    Sphere {
        /// Radius
        radius: f32,
    },
    /// Capsule along the Y axis
    Capsule {
        /// Half the length of the straight segment
        half_height: f32,
        /// Radius of the end caps
        radius: f32,
    },
    /// Cylinder along the Y axis
    Cylinder {
        /// Half the height
        half_height: f32,
        /// Radius
        radius: f32,
    },
    /// Convex hull of a point cloud
    ConvexHull {
        /// Points the hull wraps
        points: Vec<Vec3>,
    },
    /// Arbitrary triangle soup, for static and kinematic geometry
    TriangleMesh {
        /// Vertex positions
        vertices: Vec<Vec3>,
        /// Triangles as vertex index triples
        indices: Vec<[u32; 3]>,
    },
}

/// Reasons a shape cannot be built (yet)
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum ShapeError {
    /// A size parameter is zero, negative or not finite
    #[error("{shape} {parameter} must be positive and finite, got {value}")]
    InvalidDimension {
        /// Shape kind
        shape: &'static str,
        /// Offending parameter
        parameter: &'static str,
        /// Offending value after scaling
        value: f32,
    },

    /// Too few points to wrap a hull around
    #[error("convex hull needs at least {MIN_HULL_POINTS} points, got {0}")]
    NotEnoughPoints(usize),

    /// The points are coplanar, collinear or otherwise enclose no volume
    #[error("convex hull of {0} points is degenerate")]
    DegenerateHull(usize),

    /// Vertex or index data is missing
    #[error("triangle mesh has no vertex or index data")]
    EmptyMesh,

    /// A triangle references a vertex that does not exist
    #[error("triangle index {index} out of range for {vertex_count} vertices")]
    IndexOutOfRange {
        /// Bad index
        index: u32,
        /// Number of vertices supplied
        vertex_count: usize,
    },

    /// The mesh builder rejected the data
    #[error("triangle mesh rejected: {0}")]
    InvalidMesh(String),
}

impl ShapeDescriptor {
    /// Box from half extents
    #[must_use]
    pub const fn cuboid(half_extents: Vec3) -> Self {
        Self::Box { half_extents }
    }

    /// Sphere from a radius
    #[must_use]
    pub const fn sphere(radius: f32) -> Self {
        Self::Sphere { radius }
    }

    /// Y-axis capsule
    #[must_use]
    pub const fn capsule(half_height: f32, radius: f32) -> Self {
        Self::Capsule {
            half_height,
            radius,
        }
    }

    /// Short name for logs
    #[must_use]
    pub const fn kind_name(&self) -> &'static str {
        match self {
            Self::Box { .. } => "box",
            Self::Sphere { .. } => "sphere",
            Self::Capsule { .. } => "capsule",
            Self::Cylinder { .. } => "cylinder",
            Self::ConvexHull { .. } => "convex hull",
            Self::TriangleMesh { .. } => "triangle mesh",
        }
    }

    /// Hull over the same points, used where triangle meshes are unsupported
    #[must_use]
    pub fn convex_fallback(&self) -> Option<Self> {
        match self {
            Self::TriangleMesh { vertices, .. } => Some(Self::ConvexHull {
                points: vertices.clone(),
            }),
            _ => None,
        }
    }

    /// Build the simulation shape, scaled by `scale`
    pub fn build(&self, scale: &Vec3) -> Result<SharedShape, ShapeError> {
        let scale = scale.abs();
        let radial = scale.x.max(scale.z);

        match self {
            Self::Box { half_extents } => {
                let he = half_extents.component_mul(&scale);
                Ok(SharedShape::cuboid(
                    positive("box", "half_extent.x", he.x)?,
                    positive("box", "half_extent.y", he.y)?,
                    positive("box", "half_extent.z", he.z)?,
                ))
            }
            Self::Sphere { radius } => {
                let radius = positive("sphere", "radius", radius * utils::max_abs_component(&scale))?;
                Ok(SharedShape::ball(radius))
            }
            Self::Capsule {
                half_height,
                radius,
            } => {
                let half_height = half_height * scale.y;
                if !(half_height.is_finite() && half_height >= 0.0) {
                    return Err(ShapeError::InvalidDimension {
                        shape: "capsule",
                        parameter: "half_height",
                        value: half_height,
                    });
                }
                let radius = positive("capsule", "radius", radius * radial)?;
                Ok(SharedShape::capsule_y(half_height, radius))
            }
            Self::Cylinder {
                half_height,
                radius,
            } => {
                let half_height = positive("cylinder", "half_height", half_height * scale.y)?;
                let radius = positive("cylinder", "radius", radius * radial)?;
                Ok(SharedShape::cylinder(half_height, radius))
            }
            Self::ConvexHull { points } => {
                if points.len() < MIN_HULL_POINTS {
                    return Err(ShapeError::NotEnoughPoints(points.len()));
                }
                let scaled: Vec<_> = points
                    .iter()
                    .map(|p| to_rapier_point(&p.component_mul(&scale)))
                    .collect();
                let hull = SharedShape::convex_hull(&scaled)
                    .ok_or(ShapeError::DegenerateHull(points.len()))?;
                // Unit density, so mass is the enclosed volume
                let volume = hull.mass_properties(1.0).mass();
                if volume > MIN_HULL_VOLUME {
                    Ok(hull)
                } else {
                    Err(ShapeError::DegenerateHull(points.len()))
                }
            }
            Self::TriangleMesh { vertices, indices } => {
                if vertices.is_empty() || indices.is_empty() {
                    return Err(ShapeError::EmptyMesh);
                }
                if let Some(&index) = indices
                    .iter()
                    .flatten()
                    .find(|&&index| index as usize >= vertices.len())
                {
                    return Err(ShapeError::IndexOutOfRange {
                        index,
                        vertex_count: vertices.len(),
                    });
                }
                let scaled = vertices
                    .iter()
                    .map(|v| to_rapier_point(&v.component_mul(&scale)))
                    .collect();
                SharedShape::trimesh(scaled, indices.clone())
                    .map_err(|e| ShapeError::InvalidMesh(format!("{e:?}")))
            }
        }
    }
}

fn positive(shape: &'static str, parameter: &'static str, value: f32) -> Result<f32, ShapeError> {
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(ShapeError::InvalidDimension {
            shape,
            parameter,
            value,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn unit_cube_points() -> Vec<Vec3> {
        let mut points = Vec::new();
        for x in [-0.5, 0.5] {
            for y in [-0.5, 0.5] {
                for z in [-0.5, 0.5] {
                    points.push(Vec3::new(x, y, z));
                }
            }
        }
        points
    }

    #[test]
    fn test_box_scaled_by_world_scale() {
        let shape = ShapeDescriptor::cuboid(Vec3::new(1.0, 2.0, 3.0))
            .build(&Vec3::new(2.0, -1.0, 0.5))
            .unwrap();
        let cuboid = shape.as_cuboid().unwrap();
        assert_relative_eq!(cuboid.half_extents.x, 2.0);
        assert_relative_eq!(cuboid.half_extents.y, 2.0);
        assert_relative_eq!(cuboid.half_extents.z, 1.5);
    }

    #[test]
    fn test_sphere_uses_largest_scale() {
        let shape = ShapeDescriptor::sphere(1.0)
            .build(&Vec3::new(1.0, 3.0, 2.0))
            .unwrap();
        assert_relative_eq!(shape.as_ball().unwrap().radius, 3.0);
    }

    #[test]
    fn test_zero_radius_rejected() {
        let result = ShapeDescriptor::sphere(0.0).build(&Vec3::repeat(1.0));
        assert!(matches!(result, Err(ShapeError::InvalidDimension { shape: "sphere", .. })));
    }

    #[test]
    fn test_empty_hull_rejected() {
        let hull = ShapeDescriptor::ConvexHull { points: Vec::new() };
        assert_eq!(hull.build(&Vec3::repeat(1.0)).err(), Some(ShapeError::NotEnoughPoints(0)));
    }

    #[test]
    fn test_coplanar_hull_rejected() {
        let points = (0..6)
            .map(|i| Vec3::new(i as f32, (i * i) as f32, 0.0))
            .collect();
        let hull = ShapeDescriptor::ConvexHull { points };
        assert_eq!(hull.build(&Vec3::repeat(1.0)).err(), Some(ShapeError::DegenerateHull(6)));
    }

    #[test]
    fn test_hull_from_cube() {
        let hull = ShapeDescriptor::ConvexHull {
            points: unit_cube_points(),
        };
        assert!(hull.build(&Vec3::repeat(2.0)).is_ok());
    }

    #[test]
    fn test_mesh_validation() {
        let empty = ShapeDescriptor::TriangleMesh {
            vertices: Vec::new(),
            indices: Vec::new(),
        };
        assert_eq!(empty.build(&Vec3::repeat(1.0)).err(), Some(ShapeError::EmptyMesh));

        let out_of_range = ShapeDescriptor::TriangleMesh {
            vertices: vec![Vec3::zeros(), Vec3::x(), Vec3::z()],
            indices: vec![[0, 1, 3]],
        };
        assert_eq!(
            out_of_range.build(&Vec3::repeat(1.0)).err(),
            Some(ShapeError::IndexOutOfRange {
                index: 3,
                vertex_count: 3
            })
        );

        let quad = ShapeDescriptor::TriangleMesh {
            vertices: vec![
                Vec3::new(-1.0, 0.0, -1.0),
                Vec3::new(1.0, 0.0, -1.0),
                Vec3::new(1.0, 0.0, 1.0),
                Vec3::new(-1.0, 0.0, 1.0),
            ],
            indices: vec![[0, 2, 1], [0, 3, 2]],
        };
        assert!(quad.build(&Vec3::repeat(1.0)).is_ok());
    }

    #[test]
    fn test_convex_fallback_only_for_meshes() {
        let mesh = ShapeDescriptor::TriangleMesh {
            vertices: unit_cube_points(),
            indices: vec![[0, 1, 2]],
        };
        assert_eq!(
            mesh.convex_fallback(),
            Some(ShapeDescriptor::ConvexHull {
                points: unit_cube_points()
            })
        );
        assert_eq!(ShapeDescriptor::sphere(1.0).convex_fallback(), None);
    }
}

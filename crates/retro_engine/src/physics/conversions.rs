//! Conversions between engine math types and rapier's nalgebra types.
//!
//! Written component-wise so the engine's nalgebra version does not have to
//! match the one rapier was built against.

use rapier3d::na::{Isometry3, Point3, Quaternion, Translation3, UnitQuaternion, Vector3};
use rapier3d::prelude::Real;

use crate::foundation::math::{Quat, Quaternion as EngineQuaternion, Vec3};

pub fn to_rapier_vec(v: &Vec3) -> Vector3<Real> {
    Vector3::new(v.x, v.y, v.z)
}

pub fn to_rapier_point(v: &Vec3) -> Point3<Real> {
    Point3::new(v.x, v.y, v.z)
}

pub fn to_rapier_quat(q: &Quat) -> UnitQuaternion<Real> {
    UnitQuaternion::from_quaternion(Quaternion::new(q.w, q.i, q.j, q.k))
}

pub fn to_isometry(position: &Vec3, rotation: &Quat) -> Isometry3<Real> {
    Isometry3::from_parts(
        Translation3::new(position.x, position.y, position.z),
        to_rapier_quat(rotation),
    )
}

pub fn from_rapier_vec(v: &Vector3<Real>) -> Vec3 {
    Vec3::new(v.x, v.y, v.z)
}

pub fn from_rapier_point(p: &Point3<Real>) -> Vec3 {
    Vec3::new(p.x, p.y, p.z)
}

pub fn from_rapier_quat(q: &UnitQuaternion<Real>) -> Quat {
    Quat::from_quaternion(EngineQuaternion::new(q.w, q.i, q.j, q.k))
}

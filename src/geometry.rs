//! Vector math and the small set of saturation/rotation primitives the rest
//! of the engine is built on.
//!
//! All internal angles are radians; degrees only appear at the scenario and
//! CLI-report boundaries (see [`to_degrees`]/[`from_degrees`]).

use cgmath::{InnerSpace, Vector3, Zero};

pub type Vec3 = Vector3<f64>;

/// Clamp the magnitude of `v` to `limit`, preserving direction.
///
/// Returns the zero vector if `v` is already zero, matching spec.md 4.1:
/// `sat(v, L) = v * min(1, L / |v|)`, defined as `0` when `v = 0`.
#[must_use]
pub fn sat(v: Vec3, limit: f64) -> Vec3 {
  let mag = v.magnitude();
  if mag == 0.0 {
    Vec3::zero()
  } else {
    v * (1.0_f64).min(limit / mag)
  }
}

/// Rotate `current` (treated as a heading, magnitude preserved) toward
/// `desired` by at most `max_rate * dt` radians.
///
/// Rotation is about the axis `current x desired`. If either vector is
/// zero-length, or they are parallel (cross product is zero), `current`
/// is returned unchanged — there is no well-defined turn axis.
#[must_use]
pub fn turn_toward(current: Vec3, desired: Vec3, max_rate: f64, dt: f64) -> Vec3 {
  let speed = current.magnitude();
  if speed == 0.0 || desired.magnitude() == 0.0 {
    return current;
  }

  let current_dir = current / speed;
  let desired_dir = desired.normalize();

  // Clamp for acos safety: floating point error can push this slightly
  // outside [-1, 1].
  let cos_angle = current_dir.dot(desired_dir).clamp(-1.0, 1.0);
  let angle = cos_angle.acos();

  if angle <= 0.0 {
    return current;
  }

  let axis = current_dir.cross(desired_dir);
  let axis_mag = axis.magnitude();
  if axis_mag == 0.0 {
    // Parallel or anti-parallel: no defined turn axis. Anti-parallel
    // (angle == pi) can't be resolved without an arbitrary reference, so
    // we hold heading rather than guess.
    return current;
  }
  let axis = axis / axis_mag;

  let max_delta = max_rate * dt;
  let delta = angle.min(max_delta);

  let new_dir = rotate_about_axis(current_dir, axis, delta);
  new_dir * speed
}

/// Rotate unit vector `v` about unit `axis` by `angle` radians (Rodrigues'
/// rotation formula).
fn rotate_about_axis(v: Vec3, axis: Vec3, angle: f64) -> Vec3 {
  let (sin_a, cos_a) = angle.sin_cos();
  v * cos_a + axis.cross(v) * sin_a + axis * axis.dot(v) * (1.0 - cos_a)
}

#[must_use]
pub fn to_degrees(radians: f64) -> f64 {
  radians.to_degrees()
}

#[must_use]
pub fn from_degrees(degrees: f64) -> f64 {
  degrees.to_radians()
}

/// XY-only (ignores Z) Euclidean distance, used throughout for
/// arrival-radius and Tgo computations.
#[must_use]
pub fn xy_distance(a: Vec3, b: Vec3) -> f64 {
  let dx = a.x - b.x;
  let dy = a.y - b.y;
  (dx * dx + dy * dy).sqrt()
}

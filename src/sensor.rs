//! Sensors: stateless spherical-range target detection.
//!
//! Grounded on `callisto::planet::Planet`'s shape — a plain
//! configuration struct plus a pure function evaluated against other
//! entities each tick, with no internal state of its own.

use std::collections::BTreeSet;

use crate::geometry::Vec3;
use crate::target::{Target, TargetId};

pub type SensorId = u64;

#[derive(Debug, Clone)]
pub struct Sensor {
  pub id: SensorId,
  pub pos: Vec3,
  pub range_m: f64,
}

impl Sensor {
  /// Target ids within 3-D range of this sensor, alive targets only.
  #[must_use]
  pub fn detect(&self, targets: &[Target]) -> BTreeSet<TargetId> {
    targets
      .iter()
      .filter(|t| t.is_alive())
      .filter(|t| distance3(self.pos, t.pos) <= self.range_m)
      .map(|t| t.id)
      .collect()
  }
}

fn distance3(a: Vec3, b: Vec3) -> f64 {
  let dx = a.x - b.x;
  let dy = a.y - b.y;
  let dz = a.z - b.z;
  (dx * dx + dy * dy + dz * dz).sqrt()
}

/// Union of detections across all sensors (duplicates collapse).
#[must_use]
pub fn detect_union(sensors: &[Sensor], targets: &[Target]) -> BTreeSet<TargetId> {
  let mut union = BTreeSet::new();
  for sensor in sensors {
    union.extend(sensor.detect(targets));
  }
  union
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::target::TargetState;

  fn alive_target(id: TargetId, pos: Vec3) -> Target {
    Target { id, pos, vel: Vec3::new(0.0, 0.0, 0.0), endurance: 1, arrival_radius_m: 100.0, state: TargetState::Alive }
  }

  #[test]
  fn detects_targets_within_range_only() {
    let sensor = Sensor { id: 1, pos: Vec3::new(0.0, 0.0, 0.0), range_m: 1000.0 };
    let near = alive_target(1, Vec3::new(500.0, 0.0, 0.0));
    let far = alive_target(2, Vec3::new(5000.0, 0.0, 0.0));
    let detected = sensor.detect(&[near, far]);
    assert_eq!(detected, BTreeSet::from([1]));
  }

  #[test]
  fn ignores_non_alive_targets() {
    let sensor = Sensor { id: 1, pos: Vec3::new(0.0, 0.0, 0.0), range_m: 1000.0 };
    let mut dead = alive_target(1, Vec3::new(10.0, 0.0, 0.0));
    dead.state = TargetState::Killed;
    assert!(sensor.detect(&[dead]).is_empty());
  }

  #[test]
  fn union_collapses_duplicates_across_sensors() {
    let s1 = Sensor { id: 1, pos: Vec3::new(0.0, 0.0, 0.0), range_m: 1000.0 };
    let s2 = Sensor { id: 2, pos: Vec3::new(100.0, 0.0, 0.0), range_m: 1000.0 };
    let t = alive_target(1, Vec3::new(50.0, 0.0, 0.0));
    let union = detect_union(&[s1, s2], &[t]);
    assert_eq!(union, BTreeSet::from([1]));
  }
}

//! The immutable in-memory scenario: sim/world/command-post parameters,
//! the friendly order of battle, and enemy group definitions, plus the
//! ring-fill spawn algorithm that turns a group into live targets.
//!
//! Grounded on `callisto::entity::Entities`'s validated-constructor
//! idiom (`add_ship`/`add_planet`/`launch_missile` each build then
//! validate before the entity becomes live) and
//! `callisto::planet::Planet::new`'s ordering bookkeeping, repurposed
//! here for ring-index bookkeeping instead of orbital dependency order.

use std::f64::consts::PI;

use crate::config::ScenarioFile;
use crate::error::ConfigError;
use crate::geometry::{from_degrees, Vec3};
use crate::launcher::Launcher;
use crate::missile::MissilePerformance;
use crate::sensor::Sensor;
use crate::target::{Target, TargetId};

#[derive(Debug, Clone)]
pub struct EnemyGroup {
  pub id: u64,
  pub spawn_tick: u64,
  pub center_xy: (f64, f64),
  pub z_m: f64,
  pub count: u32,
  pub ring_spacing_m: f64,
  pub start_angle_rad: f64,
  pub ring_half_offset: bool,
  pub endurance_pt: i64,
}

#[derive(Debug, Clone)]
pub struct Scenario {
  pub dt_s: f64,
  pub t_max_ticks: u64,
  pub seed: u64,
  pub region: (f64, f64, f64, f64),
  pub z_limits: (f64, f64),
  pub command_post_xy: (f64, f64),
  pub arrival_radius_m: f64,
  pub sensors: Vec<Sensor>,
  pub launchers: Vec<Launcher>,
  pub target_speed_mps: f64,
  pub missile_performance: MissilePerformance,
  pub groups: Vec<EnemyGroup>,
}

impl Scenario {
  /// Validate `file` and lower it into an immutable [`Scenario`].
  ///
  /// # Errors
  /// Propagates [`ConfigError`] from [`ScenarioFile::validate`].
  pub fn from_file(file: &ScenarioFile) -> Result<Self, ConfigError> {
    file.validate()?;

    let omega_max_rad_s = file.omega_max_rad_s();
    let k = &file.missile_defaults.kinematics;
    let g = &file.policy.missile_guidance;
    let missile_performance = MissilePerformance {
      initial_speed_mps: k.initial_speed_mps,
      v_max_mps: k.v_max_mps,
      a_max_mps2: k.a_max_mps2,
      omega_max_rad_s,
      intercept_radius_m: k.intercept_radius_m,
      pn_gain: g.pn_gain,
      endgame_factor: g.endgame_factor,
      endgame_miss_increase_ticks: g.endgame_miss_increase_ticks,
    };

    let launchers = file
      .friendly_forces
      .launchers
      .iter()
      .map(|l| Launcher::new(l.id, l.pos, l.missiles_loaded, l.cooldown_s, file.policy.launcher_initially_cooled))
      .collect();

    let sensors = file
      .friendly_forces
      .sensors
      .iter()
      .map(|s| Sensor { id: s.id, pos: s.pos, range_m: s.range_m })
      .collect();

    let dt_s = file.sim.dt_s;
    let groups = file
      .enemy_forces
      .groups
      .iter()
      .map(|g| EnemyGroup {
        id: g.id,
        spawn_tick: (g.spawn_time_s / dt_s).round() as u64,
        center_xy: g.center_xy,
        z_m: g.z_m,
        count: g.count,
        ring_spacing_m: g.ring_spacing_m,
        start_angle_rad: from_degrees(g.start_angle_deg),
        ring_half_offset: g.ring_half_offset,
        endurance_pt: i64::from(g.endurance_pt),
      })
      .collect();

    Ok(Scenario {
      dt_s,
      t_max_ticks: (file.sim.t_max_s / dt_s).round() as u64,
      seed: file.sim.seed,
      region: file.world.region_rect,
      z_limits: file.world.z_limits_m,
      command_post_xy: file.command_post.position_xy,
      arrival_radius_m: file.command_post.arrival_radius_m,
      sensors,
      launchers,
      target_speed_mps: file.enemy_forces.speed_mps,
      missile_performance,
      groups,
    })
  }
}

/// Number of members ring `k` (1-indexed) can hold: the ring's
/// circumference divided by the scenario's `ring_spacing_m`, which ties
/// angular packing density to the same spacing constant used for radii
/// rather than inventing a new one. Never less than 1.
fn ring_capacity(k: u32, ring_spacing_m: f64) -> u32 {
  let radius = f64::from(k) * ring_spacing_m;
  let circumference = 2.0 * PI * radius;
  ((circumference / ring_spacing_m).floor() as u32).max(1)
}

/// Materialize a group's members into live [`Target`]s per the ring-
/// filling rule (spec.md §6): innermost ring first, equal angular
/// spacing within a ring, optional half-slot rotation on rings ≥ 2.
#[must_use]
pub fn spawn_group(
  group: &EnemyGroup,
  target_speed_mps: f64,
  command_post_xy: (f64, f64),
  arrival_radius_m: f64,
  next_target_id: &mut TargetId,
) -> Vec<Target> {
  let mut targets = Vec::with_capacity(group.count as usize);
  let mut remaining = group.count;
  let mut ring = 1_u32;

  while remaining > 0 {
    let n_k = ring_capacity(ring, group.ring_spacing_m).min(remaining);
    let radius = f64::from(ring) * group.ring_spacing_m;
    let ring_offset = if group.ring_half_offset && ring >= 2 { PI / f64::from(n_k) } else { 0.0 };

    for slot in 0..n_k {
      let theta = group.start_angle_rad + ring_offset + (2.0 * PI * f64::from(slot)) / f64::from(n_k);
      let pos = Vec3::new(
        group.center_xy.0 + radius * theta.cos(),
        group.center_xy.1 + radius * theta.sin(),
        group.z_m,
      );
      let id = *next_target_id;
      *next_target_id += 1;
      targets.push(Target::spawn(id, pos, target_speed_mps, command_post_xy, group.endurance_pt, arrival_radius_m));
    }

    remaining -= n_k;
    ring += 1;
  }

  targets
}

#[cfg(test)]
mod tests {
  use super::*;

  fn group(count: u32, ring_spacing_m: f64) -> EnemyGroup {
    EnemyGroup {
      id: 1,
      spawn_tick: 0,
      center_xy: (0.0, 0.0),
      z_m: 1000.0,
      count,
      ring_spacing_m,
      start_angle_rad: 0.0,
      ring_half_offset: false,
      endurance_pt: 1,
    }
  }

  #[test]
  fn spawns_exactly_the_requested_count() {
    let g = group(25, 500.0);
    let mut next_id = 1;
    let targets = spawn_group(&g, 100.0, (0.0, 0.0), 50.0, &mut next_id);
    assert_eq!(targets.len(), 25);
  }

  #[test]
  fn innermost_ring_is_filled_before_the_next() {
    let g = group(3, 500.0);
    let mut next_id = 1;
    let targets = spawn_group(&g, 100.0, (0.0, 0.0), 50.0, &mut next_id);
    // ring_capacity(1, 500) == 6, so all 3 members fit in the first ring.
    for t in &targets {
      let r = (t.pos.x * t.pos.x + t.pos.y * t.pos.y).sqrt();
        assert!((r - 500.0).abs() < 1e-6);
    }
  }

  #[test]
  fn assigns_strictly_increasing_ids() {
    let g = group(10, 500.0);
    let mut next_id = 5;
    let targets = spawn_group(&g, 100.0, (0.0, 0.0), 50.0, &mut next_id);
    let ids: Vec<_> = targets.iter().map(|t| t.id).collect();
    let mut sorted = ids.clone();
    sorted.sort_unstable();
    assert_eq!(ids, sorted);
    assert_eq!(next_id, 15);
  }

  #[test]
  fn ring_half_offset_rotates_second_ring() {
    let mut g = group(20, 500.0);
    g.ring_half_offset = true;
    let mut next_id = 1;
    let targets = spawn_group(&g, 100.0, (0.0, 0.0), 50.0, &mut next_id);
    // First ring (6 members) starts at angle 0; second ring should not.
    let first_ring_member = &targets[0];
    assert!((first_ring_member.pos.y).abs() < 1e-6);
  }
}

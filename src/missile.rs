//! Guided interceptors: true 3-D proportional-navigation guidance,
//! saturated kinematic integration, and the collision/self-destruct
//! state machine.
//!
//! Grounded on `callisto::missile::Missile` for the struct shape (an
//! `#[derivative(PartialEq = "ignore")]`-style target reference that
//! can't be meaningfully compared, an impact-distance constant) and the
//! per-tick update skeleton of `callisto::missile::Missile::update`
//! (compute commanded accel → integrate velocity → integrate position →
//! evaluate outcome). The guidance law itself replaces the teacher's
//! nonlinear-solver burn (`computer::compute_target_path`), which picks
//! a burn schedule as a free variable; here acceleration is a closed
//! form evaluated fresh every tick.

use cgmath::InnerSpace;
use derivative::Derivative;

use crate::geometry::{sat, turn_toward, Vec3};
use crate::target::{Target, TargetId};

pub type MissileId = u64;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MissilePerformance {
  pub initial_speed_mps: f64,
  pub v_max_mps: f64,
  pub a_max_mps2: f64,
  pub omega_max_rad_s: f64,
  pub intercept_radius_m: f64,
  pub pn_gain: f64,
  pub endgame_factor: f64,
  pub endgame_miss_increase_ticks: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MissilePhase {
  Cruise,
  Endgame,
  Terminated,
}

/// Outcome of one missile's six-step update, consumed by the engine's
/// "apply hits" phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MissileOutcome {
  Flying,
  Hit { target_id: TargetId },
  SelfDestructed,
}

#[derive(Derivative, Debug, Clone)]
#[derivative(PartialEq)]
pub struct Missile {
  pub id: MissileId,
  pub target_id: TargetId,
  pub launcher_id: u64,
  pub pos: Vec3,
  pub vel: Vec3,
  #[derivative(PartialEq = "ignore")]
  pub performance: MissilePerformance,
  pub prev_miss_dist: f64,
  pub miss_increase_streak: u32,
  pub phase: MissilePhase,
}

impl Missile {
  #[must_use]
  pub fn spawn(id: MissileId, target_id: TargetId, launcher_id: u64, pos: Vec3, vel: Vec3, performance: MissilePerformance) -> Self {
    Missile {
      id,
      target_id,
      launcher_id,
      pos,
      vel,
      performance,
      prev_miss_dist: f64::INFINITY,
      miss_increase_streak: 0,
      phase: MissilePhase::Cruise,
    }
  }

  pub fn is_alive(&self) -> bool {
    self.phase != MissilePhase::Terminated
  }

  /// Run the mandatory six-step per-tick update (spec.md §4.5) against a
  /// snapshot of the target taken at the end of the target phase, plus
  /// world bounds for the region-exit self-destruct rule.
  ///
  /// `target` is `None` only when the target was already consumed in an
  /// *earlier* tick — rule 1 then applies and the missile self-destructs
  /// without a hit. A target that transitioned to `BrokenThrough`/
  /// `Disappeared` during this tick's own target phase is still passed
  /// as `Some` by the caller: spec.md §9 Open Question (ii) resolves
  /// that race in the hit's favor, so this tick's distance test must
  /// still run against it.
  pub fn tick(
    &mut self,
    dt: f64,
    target: Option<&Target>,
    z_limits: (f64, f64),
    region: (f64, f64, f64, f64),
  ) -> MissileOutcome {
    if !self.is_alive() {
      return MissileOutcome::Flying;
    }

    // (a) guidance
    let a_cmd = match target {
      Some(t) => proportional_navigation(self.pos, self.vel, t.pos, t.vel, self.performance.pn_gain),
      None => Vec3::new(0.0, 0.0, 0.0),
    };

    // (b) acceleration saturation
    let a = sat(a_cmd, self.performance.a_max_mps2);

    // (c) velocity integration, then speed clip
    let mut v = self.vel + a * dt;
    v = sat(v, self.performance.v_max_mps);

    // (d) attitude update: direction clipped to the turn-rate budget,
    // magnitude held at the post-clip speed.
    let turned_dir = turn_toward(self.vel, v, self.performance.omega_max_rad_s, dt);
    let speed = v.magnitude();
    self.vel = if turned_dir.magnitude() == 0.0 { v } else { turned_dir.normalize() * speed };

    // (e) position integration, then Z clamp
    self.pos += self.vel * dt;
    self.pos.z = self.pos.z.clamp(z_limits.0, z_limits.1);

    // (f) collision & self-destruct
    self.evaluate_outcome(target, region)
  }

  fn evaluate_outcome(&mut self, target: Option<&Target>, region: (f64, f64, f64, f64)) -> MissileOutcome {
    // Rule 1: target unavailable — consumed in an earlier tick, so the
    // caller passed `None`. A target merely consumed during *this*
    // tick's own target phase is still passed as `Some` and falls
    // through to the distance test below (see the hit-wins note on
    // `Missile::tick`).
    let Some(target) = target else {
      self.phase = MissilePhase::Terminated;
      return MissileOutcome::SelfDestructed;
    };

    let d = distance3(self.pos, target.pos);
    let r = self.performance.intercept_radius_m;
    let r_end = self.performance.endgame_factor * r;

    // Rule 2: direct hit.
    if d <= r {
      self.phase = MissilePhase::Terminated;
      self.prev_miss_dist = d;
      return MissileOutcome::Hit { target_id: target.id };
    }

    // Rule 3: endgame miss-increase tracking.
    if d <= r_end {
      self.phase = MissilePhase::Endgame;
      if d > self.prev_miss_dist {
        self.miss_increase_streak += 1;
      } else {
        self.miss_increase_streak = 0;
      }
      self.prev_miss_dist = d;
      if self.miss_increase_streak >= self.performance.endgame_miss_increase_ticks {
        self.phase = MissilePhase::Terminated;
        return MissileOutcome::SelfDestructed;
      }
      return MissileOutcome::Flying;
    }

    self.prev_miss_dist = d;

    // Rule 4: left the region cube.
    let (x_min, x_max, y_min, y_max) = region;
    if self.pos.x < x_min || self.pos.x > x_max || self.pos.y < y_min || self.pos.y > y_max {
      self.phase = MissilePhase::Terminated;
      return MissileOutcome::SelfDestructed;
    }

    MissileOutcome::Flying
  }
}

fn distance3(a: Vec3, b: Vec3) -> f64 {
  (a - b).magnitude()
}

/// True 3-D proportional navigation. `a_cmd = N * (Omega x v_closing)`
/// where `Omega = (r x v_rel) / (r.r)` is the line-of-sight rotation
/// rate and `v_closing` is taken along the LOS, equivalent to the
/// `N * |v_rel| * (Omega x r_hat)` form spec.md allows.
///
/// Returns zero when `|r| = 0` — guidance is skipped rather than
/// dividing by zero (spec.md §4.5).
#[must_use]
fn proportional_navigation(missile_pos: Vec3, missile_vel: Vec3, target_pos: Vec3, target_vel: Vec3, n_gain: f64) -> Vec3 {
  let r = target_pos - missile_pos;
  let r_mag_sq = r.dot(r);
  if r_mag_sq == 0.0 {
    return Vec3::new(0.0, 0.0, 0.0);
  }

  let v_rel = target_vel - missile_vel;
  let omega = r.cross(v_rel) / r_mag_sq;
  let v_closing = -v_rel;
  n_gain * omega.cross(v_closing)
}

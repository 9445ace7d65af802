//! Targets: constant-velocity threats that fly a straight course toward
//! the command post until killed, broken through, or out of region.
//!
//! Grounded on `callisto::ship::Ship`'s `Entity` trait impl (position and
//! velocity advanced each tick by a plain integration step) and
//! `callisto::entity::EntityKind::Ship`'s constant-velocity branch —
//! there is no flight-plan burn schedule here, just a fixed heading set
//! once at spawn.

use strum_macros::IntoStaticStr;

use crate::geometry::{xy_distance, Vec3};

pub type TargetId = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, IntoStaticStr)]
pub enum TargetState {
  Alive,
  Killed,
  BrokenThrough,
  Disappeared,
}

#[derive(Debug, Clone)]
pub struct Target {
  pub id: TargetId,
  pub pos: Vec3,
  pub vel: Vec3,
  pub endurance: i64,
  pub arrival_radius_m: f64,
  pub state: TargetState,
}

impl Target {
  /// Spawn a target at `pos` heading toward `command_post_xy` (at the
  /// group's altitude, held fixed) at constant speed `speed`.
  #[must_use]
  pub fn spawn(
    id: TargetId,
    pos: Vec3,
    speed: f64,
    command_post_xy: (f64, f64),
    endurance: i64,
    arrival_radius_m: f64,
  ) -> Self {
    let to_cp = Vec3::new(command_post_xy.0 - pos.x, command_post_xy.1 - pos.y, 0.0);
    let xy_mag = (to_cp.x * to_cp.x + to_cp.y * to_cp.y).sqrt();
    let vel = if xy_mag == 0.0 {
      Vec3::new(0.0, 0.0, 0.0)
    } else {
      Vec3::new(to_cp.x / xy_mag * speed, to_cp.y / xy_mag * speed, 0.0)
    };
    Target { id, pos, vel, endurance, arrival_radius_m, state: TargetState::Alive }
  }

  pub fn is_alive(&self) -> bool {
    self.state == TargetState::Alive
  }

  /// Advance position by `vel * dt`, clamp Z, and evaluate disposition
  /// per spec.md §4.2. Does not decrement endurance — hit application is
  /// the engine's job, performed after the missile phase.
  pub fn tick(
    &mut self,
    dt: f64,
    command_post_xy: (f64, f64),
    z_limits: (f64, f64),
    region: (f64, f64, f64, f64),
  ) {
    if !self.is_alive() {
      return;
    }

    self.pos.x += self.vel.x * dt;
    self.pos.y += self.vel.y * dt;
    self.pos.z += self.vel.z * dt;
    self.pos.z = self.pos.z.clamp(z_limits.0, z_limits.1);

    if self.endurance <= 0 {
      self.state = TargetState::Killed;
      return;
    }

    let cp = Vec3::new(command_post_xy.0, command_post_xy.1, self.pos.z);
    if xy_distance(self.pos, cp) <= self.arrival_radius_m {
      self.state = TargetState::BrokenThrough;
      return;
    }

    let (x_min, x_max, y_min, y_max) = region;
    if self.pos.x < x_min || self.pos.x > x_max || self.pos.y < y_min || self.pos.y > y_max {
      self.state = TargetState::Disappeared;
    }
  }

  /// Apply `hits` missile hits accumulated this tick. A no-op once the
  /// target is already `Killed` (L1 idempotence).
  ///
  /// Deliberately does *not* guard on `is_alive()`: a target that this
  /// same tick transitioned to `BrokenThrough`/`Disappeared` in phase 2
  /// can still be killed here in phase 4 — spec.md §9 Open Question (ii)
  /// resolves the same-tick race in the hit's favor, so a fatal hit must
  /// override the transient breakthrough/disappearance the position test
  /// set earlier in the same tick. The engine only ever calls this for
  /// targets that were still eligible (in play) entering the tick.
  pub fn apply_hits(&mut self, hits: i64) {
    if self.state == TargetState::Killed || hits <= 0 {
      return;
    }
    self.endurance -= hits;
    if self.endurance <= 0 {
      self.state = TargetState::Killed;
    }
  }

  pub fn speed(&self) -> f64 {
    (self.vel.x * self.vel.x + self.vel.y * self.vel.y + self.vel.z * self.vel.z).sqrt()
  }
}

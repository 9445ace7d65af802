//! Launchers: magazine + cooldown state machine.
//!
//! Grounded on `callisto::ship::FlightPlan`'s duration bookkeeping
//! (compare a remaining-duration field against the current time, then
//! decrement/advance) repurposed for cooldown-until-time bookkeeping,
//! and on `callisto::combat`'s tight state+rule struct style.

use cgmath::InnerSpace;

use crate::geometry::Vec3;
use crate::missile::{Missile, MissileId, MissilePerformance};
use crate::target::Target;

pub type LauncherId = u64;

#[derive(Debug, Clone)]
pub struct Launcher {
  pub id: LauncherId,
  pub pos: Vec3,
  pub magazine: u32,
  pub cooldown_s: f64,
  pub cooldown_until_t: f64,
}

impl Launcher {
  #[must_use]
  pub fn new(id: LauncherId, pos: Vec3, magazine: u32, cooldown_s: f64, initially_cooled: bool) -> Self {
    let cooldown_until_t = if initially_cooled { f64::NEG_INFINITY } else { 0.0 };
    Launcher { id, pos, magazine, cooldown_s, cooldown_until_t }
  }

  #[must_use]
  pub fn can_fire(&self, now: f64) -> bool {
    self.magazine > 0 && now >= self.cooldown_until_t
  }

  /// Fire at `target`, producing a new missile with id `missile_id`.
  /// Decrements magazine and sets the next `cooldown_until_t`.
  ///
  /// Caller must have already checked [`Launcher::can_fire`].
  pub fn launch(
    &mut self,
    missile_id: MissileId,
    target: &Target,
    performance: MissilePerformance,
    now: f64,
  ) -> Missile {
    let to_target = Vec3::new(target.pos.x - self.pos.x, target.pos.y - self.pos.y, target.pos.z - self.pos.z);
    let direction = unit_vector_or_default(to_target);
    let vel = direction * performance.initial_speed_mps;

    self.magazine -= 1;
    self.cooldown_until_t = now + self.cooldown_s;

    Missile::spawn(missile_id, target.id, self.id, self.pos, vel, performance)
  }
}

/// `unit_vector(v)`, falling back to +X when `v` has no well-defined
/// direction (launcher collocated with its target).
fn unit_vector_or_default(v: Vec3) -> Vec3 {
  if v.magnitude() == 0.0 {
    Vec3::new(1.0, 0.0, 0.0)
  } else {
    v.normalize()
  }
}

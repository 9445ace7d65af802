//! The command post / allocator: ledger maintenance, target
//! prioritization, demand computation, and launcher selection.
//!
//! Grounded on `callisto::action::merge`'s ledger-mutation idiom (walk a
//! `HashMap`-backed ledger, retain/drop entries under explicit rules)
//! and `callisto::entity::Entities`'s arena+index shape — design note §9
//! of spec.md calls the assignment ledger out explicitly as the only
//! shared mutable core state, so it lives here as a plain `HashMap`
//! rather than behind any entity's ownership.

use std::collections::{BTreeSet, HashMap, HashSet};

use crate::geometry::Vec3;
use crate::launcher::{Launcher, LauncherId};
use crate::missile::{Missile, MissileId, MissilePerformance};
use crate::target::{Target, TargetId};

#[derive(Debug, Clone, Default)]
pub struct CommandPost {
  pub position_xy: (f64, f64),
  pub arrival_radius_m: f64,
  ledger: HashMap<TargetId, HashSet<MissileId>>,
}

/// One launch decision for this tick: fire `launcher_id` at `target_id`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LaunchOrder {
  pub launcher_id: LauncherId,
  pub target_id: TargetId,
}

impl CommandPost {
  #[must_use]
  pub fn new(position_xy: (f64, f64), arrival_radius_m: f64) -> Self {
    CommandPost { position_xy, arrival_radius_m, ledger: HashMap::new() }
  }

  pub fn ledger_count(&self, target_id: TargetId) -> usize {
    self.ledger.get(&target_id).map_or(0, HashSet::len)
  }

  /// Step A: drop ledger entries for missiles that terminated this tick
  /// and for targets that were consumed this tick.
  pub fn maintain_ledger(&mut self, terminated_missiles: &HashSet<MissileId>, consumed_targets: &HashSet<TargetId>) {
    self.ledger.retain(|target_id, _| !consumed_targets.contains(target_id));
    for missiles in self.ledger.values_mut() {
      missiles.retain(|m| !terminated_missiles.contains(m));
    }
  }

  /// Record a newly launched missile against its target.
  pub fn record_launch(&mut self, target_id: TargetId, missile_id: MissileId) {
    self.ledger.entry(target_id).or_default().insert(missile_id);
  }

  /// Step B: detected, still-alive targets ordered ascending by Tgo,
  /// then XY distance, then target_id.
  #[must_use]
  pub fn prioritize<'a>(&self, detections: &BTreeSet<TargetId>, targets: &'a [Target], target_speed: f64) -> Vec<&'a Target> {
    let mut candidates: Vec<&Target> = targets
      .iter()
      .filter(|t| t.is_alive() && detections.contains(&t.id))
      .collect();

    candidates.sort_by(|a, b| {
      let tgo_a = self.tgo(a, target_speed);
      let tgo_b = self.tgo(b, target_speed);
      tgo_a
        .partial_cmp(&tgo_b)
        .unwrap()
        .then_with(|| self.xy_distance(a).partial_cmp(&self.xy_distance(b)).unwrap())
        .then_with(|| a.id.cmp(&b.id))
    });

    candidates
  }

  fn xy_distance(&self, target: &Target) -> f64 {
    let dx = target.pos.x - self.position_xy.0;
    let dy = target.pos.y - self.position_xy.1;
    (dx * dx + dy * dy).sqrt()
  }

  fn tgo(&self, target: &Target, target_speed: f64) -> f64 {
    let r = self.xy_distance(target);
    ((r - self.arrival_radius_m) / target_speed).max(0.0)
  }

  /// Step C: remaining missiles target `t` may still receive this tick,
  /// given the tighter of endurance and an externally supplied
  /// `max_assignable` cap (see DESIGN.md's Open Question resolution).
  #[must_use]
  pub fn deficit_for(&self, target: &Target, max_assignable: i64) -> i64 {
    let cap = target.endurance.min(max_assignable);
    (cap - self.ledger_count(target.id) as i64).max(0)
  }

  /// Steps D+E: for each prioritized target with outstanding deficit,
  /// greedily assign eligible launchers (shortest 3-D distance, then
  /// launcher_id ascending), each launcher firing at most once this
  /// tick. Returns the chosen (launcher, target) pairs in emission
  /// order; does not mutate the ledger or any launcher — the caller
  /// performs the actual firing and then calls [`Self::record_launch`].
  #[must_use]
  pub fn select_launches(
    &self,
    prioritized_targets: &[&Target],
    launchers: &[Launcher],
    now: f64,
  ) -> Vec<LaunchOrder> {
    let mut remaining_deficit: HashMap<TargetId, i64> = HashMap::new();
    let mut available: Vec<&Launcher> = launchers.iter().filter(|l| l.can_fire(now)).collect();
    let mut orders = Vec::new();

    for target in prioritized_targets {
      let deficit = *remaining_deficit.entry(target.id).or_insert_with(|| self.deficit_for(target, target.endurance));
      if deficit <= 0 || available.is_empty() {
        continue;
      }

      available.sort_by(|a, b| {
        distance3(a.pos, target.pos)
          .partial_cmp(&distance3(b.pos, target.pos))
          .unwrap()
          .then_with(|| a.id.cmp(&b.id))
      });

      let take = deficit.min(available.len() as i64) as usize;
      for launcher in available.drain(0..take) {
        orders.push(LaunchOrder { launcher_id: launcher.id, target_id: target.id });
      }
      remaining_deficit.insert(target.id, deficit - take as i64);
    }

    orders
  }
}

fn distance3(a: Vec3, b: Vec3) -> f64 {
  let dx = a.x - b.x;
  let dy = a.y - b.y;
  let dz = a.z - b.z;
  (dx * dx + dy * dy + dz * dz).sqrt()
}

/// Fire every selected order, producing the new missiles and updating
/// launcher state. Does not touch the ledger; callers must
/// [`CommandPost::record_launch`] each resulting missile.
#[must_use]
pub fn execute_launches(
  orders: &[LaunchOrder],
  launchers: &mut [Launcher],
  targets: &[Target],
  performance: MissilePerformance,
  next_missile_id: &mut MissileId,
  now: f64,
) -> Vec<Missile> {
  let mut spawned = Vec::new();
  for order in orders {
    let Some(launcher) = launchers.iter_mut().find(|l| l.id == order.launcher_id) else { continue };
    let Some(target) = targets.iter().find(|t| t.id == order.target_id) else { continue };
    let missile_id = *next_missile_id;
    *next_missile_id += 1;
    spawned.push(launcher.launch(missile_id, target, performance, now));
  }
  spawned
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::target::TargetState;

  fn target(id: TargetId, pos: Vec3, endurance: i64) -> Target {
    Target { id, pos, vel: Vec3::new(0.0, 0.0, 0.0), endurance, arrival_radius_m: 100.0, state: TargetState::Alive }
  }

  fn perf() -> MissilePerformance {
    MissilePerformance {
      initial_speed_mps: 300.0,
      v_max_mps: 1200.0,
      a_max_mps2: 80.0,
      omega_max_rad_s: 0.7,
      intercept_radius_m: 50.0,
      pn_gain: 3.5,
      endgame_factor: 2.0,
      endgame_miss_increase_ticks: 3,
    }
  }

  #[test]
  fn prioritize_orders_by_tgo_then_distance_then_id() {
    let cp = CommandPost::new((0.0, 0.0), 100.0);
    let near = target(2, Vec3::new(500.0, 0.0, 0.0), 1);
    let far = target(1, Vec3::new(2000.0, 0.0, 0.0), 1);
    let detections = BTreeSet::from([1, 2]);
    let both = [far.clone(), near.clone()];
    let ordered = cp.prioritize(&detections, &both, 100.0);
    assert_eq!(ordered[0].id, 2);
    assert_eq!(ordered[1].id, 1);
  }

  #[test]
  fn deficit_is_zero_when_ledger_already_at_endurance() {
    let mut cp = CommandPost::new((0.0, 0.0), 100.0);
    cp.record_launch(1, 101);
    cp.record_launch(1, 102);
    let t = target(1, Vec3::new(500.0, 0.0, 0.0), 2);
    assert_eq!(cp.deficit_for(&t, 2), 0);
  }

  #[test]
  fn select_launches_never_exceeds_deficit_across_two_launchers() {
    let cp = CommandPost::new((0.0, 0.0), 100.0);
    let t = target(1, Vec3::new(1000.0, 0.0, 0.0), 2);
    let launchers = vec![
      Launcher::new(1, Vec3::new(0.0, 0.0, 0.0), 4, 5.0, true),
      Launcher::new(2, Vec3::new(10.0, 0.0, 0.0), 4, 5.0, true),
    ];
    let orders = cp.select_launches(&[&t], &launchers, 0.0);
    assert_eq!(orders.len(), 2);
    assert!(orders.iter().all(|o| o.target_id == 1));
  }

  #[test]
  fn select_launches_respects_single_launcher_cap() {
    let cp = CommandPost::new((0.0, 0.0), 100.0);
    let t1 = target(1, Vec3::new(1000.0, 0.0, 0.0), 5);
    let t2 = target(2, Vec3::new(-1000.0, 0.0, 0.0), 5);
    let launchers = vec![Launcher::new(1, Vec3::new(0.0, 0.0, 0.0), 4, 5.0, true)];
    let orders = cp.select_launches(&[&t1, &t2], &launchers, 0.0);
    assert_eq!(orders.len(), 1);
    assert_eq!(orders[0].target_id, 1);
  }

  #[test]
  fn execute_launches_skips_missing_launcher_or_target() {
    let orders = vec![LaunchOrder { launcher_id: 99, target_id: 1 }];
    let mut launchers = vec![];
    let targets = vec![target(1, Vec3::new(10.0, 0.0, 0.0), 1)];
    let mut next_id = 1;
    let spawned = execute_launches(&orders, &mut launchers, &targets, perf(), &mut next_id, 0.0);
    assert!(spawned.is_empty());
  }
}

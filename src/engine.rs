//! The phase-ordered tick loop (spec.md §4.7): spawn, target advance,
//! missile guidance/integration/collision, hit application, sensor
//! detection, command-post assignment, termination check.
//!
//! Grounded on `callisto::entity::Entities::update_all` — partition
//! entities, update in a fixed dependency order, collect per-entity
//! effects, then apply them in a second pass — generalized here from
//! "planets then everyone else" to the full seven-phase order spec.md
//! mandates.

use std::collections::{BTreeSet, HashMap, HashSet};

use log::{debug, info};

use crate::command_post::{execute_launches, CommandPost};
use crate::missile::{Missile, MissileId, MissileOutcome};
use crate::scenario::{spawn_group, Scenario};
use crate::sensor::detect_union;
use crate::target::{Target, TargetId, TargetState};

/// Per-tick summary, grounded on `callisto::payloads::EffectMsg` — a
/// flat report of what changed, suitable for a CLI to print or a test
/// to assert against.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickReport {
  pub tick: u64,
  pub spawned_targets: Vec<TargetId>,
  pub hits: Vec<(TargetId, MissileId)>,
  pub killed_targets: Vec<TargetId>,
  pub broken_through_targets: Vec<TargetId>,
  pub disappeared_targets: Vec<TargetId>,
  pub self_destructed_missiles: Vec<MissileId>,
  pub launches: Vec<(u64, TargetId, MissileId)>,
}

pub struct Engine {
  scenario: Scenario,
  targets: Vec<Target>,
  missiles: Vec<Missile>,
  command_post: CommandPost,
  pending_groups: HashMap<u64, Vec<usize>>,
  next_target_id: TargetId,
  next_missile_id: MissileId,
  current_tick: u64,
  terminated: bool,
}

impl Engine {
  #[must_use]
  pub fn new(scenario: Scenario) -> Self {
    let mut pending_groups: HashMap<u64, Vec<usize>> = HashMap::new();
    for (idx, group) in scenario.groups.iter().enumerate() {
      pending_groups.entry(group.spawn_tick).or_default().push(idx);
    }

    let command_post = CommandPost::new(scenario.command_post_xy, scenario.arrival_radius_m);

    Engine {
      scenario,
      targets: Vec::new(),
      missiles: Vec::new(),
      command_post,
      pending_groups,
      next_target_id: 1,
      next_missile_id: 1,
      current_tick: 0,
      terminated: false,
    }
  }

  pub fn is_terminated(&self) -> bool {
    self.terminated
  }

  pub fn targets(&self) -> &[Target] {
    &self.targets
  }

  pub fn missiles(&self) -> &[Missile] {
    &self.missiles
  }

  /// Run until termination or `t_max_ticks`, returning one [`TickReport`]
  /// per tick executed.
  pub fn run(&mut self) -> Vec<TickReport> {
    let mut reports = Vec::new();
    while !self.terminated {
      reports.push(self.tick());
    }
    reports
  }

  /// Execute exactly one tick (spec.md §4.7's seven phases).
  pub fn tick(&mut self) -> TickReport {
    let mut report = TickReport { tick: self.current_tick, ..Default::default() };

    // Phase 1: spawn.
    if let Some(group_indices) = self.pending_groups.remove(&self.current_tick) {
      for idx in group_indices {
        let group = self.scenario.groups[idx].clone();
        let spawned = spawn_group(
          &group,
          self.scenario.target_speed_mps,
          self.scenario.command_post_xy,
          self.scenario.arrival_radius_m,
          &mut self.next_target_id,
        );
        report.spawned_targets.extend(spawned.iter().map(|t| t.id));
        self.targets.extend(spawned);
      }
    }

    // Targets still in play entering this tick's own phase 2. A target
    // that transitions to BrokenThrough/Disappeared during *this* tick's
    // phase 2 remains eligible for a phase-3 hit (spec.md §9 Open
    // Question (ii): the hit wins); only a target already consumed in
    // an *earlier* tick is excluded here, which is what makes phase 3's
    // rule 1 self-destruct fire for it instead of evaluating distance.
    let pre_tick_alive: HashSet<TargetId> = self.targets.iter().filter(|t| t.is_alive()).map(|t| t.id).collect();

    // Phase 2: target advance.
    self.targets.sort_by_key(|t| t.id);
    for target in &mut self.targets {
      target.tick(self.scenario.dt_s, self.scenario.command_post_xy, self.scenario.z_limits, self.scenario.region);
      if pre_tick_alive.contains(&target.id) && !matches!(target.state, TargetState::Alive) {
        let label: &'static str = (&target.state).into();
        debug!("target {} -> {}", target.id, label);
      }
    }

    // Phase 3: missile guidance/integration/collision, against the
    // end-of-phase-2 target snapshot. Only targets still in play
    // entering this tick are included, so a missile whose target was
    // consumed in an earlier tick sees `None` and self-destructs via
    // rule 1, while one whose target just broke through/disappeared
    // this very tick still gets its distance test.
    self.missiles.sort_by_key(|m| m.id);
    let target_snapshot: HashMap<TargetId, Target> =
      self.targets.iter().filter(|t| pre_tick_alive.contains(&t.id)).map(|t| (t.id, t.clone())).collect();
    let mut hits_by_target: HashMap<TargetId, i64> = HashMap::new();
    let mut hit_missiles: Vec<(TargetId, MissileId)> = Vec::new();
    let mut terminated_missiles: HashSet<MissileId> = HashSet::new();

    for missile in &mut self.missiles {
      if !missile.is_alive() {
        continue;
      }
      let target_ref = target_snapshot.get(&missile.target_id);
      let outcome = missile.tick(self.scenario.dt_s, target_ref, self.scenario.z_limits, self.scenario.region);
      match outcome {
        MissileOutcome::Hit { target_id } => {
          *hits_by_target.entry(target_id).or_insert(0) += 1;
          hit_missiles.push((target_id, missile.id));
          terminated_missiles.insert(missile.id);
        }
        MissileOutcome::SelfDestructed => {
          terminated_missiles.insert(missile.id);
          report.self_destructed_missiles.push(missile.id);
        }
        MissileOutcome::Flying => {}
      }
    }
    report.hits = hit_missiles;

    // Phase 4: apply hits, resolve each target's final disposition for
    // this tick, then terminate missiles whose target was consumed.
    // Only targets still in play entering the tick are resolved here —
    // a target already consumed in an earlier tick keeps the
    // disposition it was reported under back then and is never
    // re-reported. A hit that drops endurance to zero overrides a
    // same-tick BrokenThrough/Disappeared set by phase 2 (the hit wins,
    // per spec.md §9 Open Question (ii)).
    let mut consumed_this_tick: HashSet<TargetId> = HashSet::new();
    for target in &mut self.targets {
      if !pre_tick_alive.contains(&target.id) {
        continue;
      }
      if let Some(&hits) = hits_by_target.get(&target.id) {
        target.apply_hits(hits);
      }
      match target.state {
        TargetState::Killed => {
          report.killed_targets.push(target.id);
          consumed_this_tick.insert(target.id);
        }
        TargetState::BrokenThrough => {
          report.broken_through_targets.push(target.id);
          consumed_this_tick.insert(target.id);
        }
        TargetState::Disappeared => {
          report.disappeared_targets.push(target.id);
          consumed_this_tick.insert(target.id);
        }
        TargetState::Alive => {}
      }
    }
    for missile in &mut self.missiles {
      if missile.is_alive() && consumed_this_tick.contains(&missile.target_id) {
        missile.phase = crate::missile::MissilePhase::Terminated;
        terminated_missiles.insert(missile.id);
      }
    }

    // Phase 5: sensor detections.
    let detections: BTreeSet<TargetId> = detect_union(&self.scenario.sensors, &self.targets);

    // Phase 6: command post.
    self.command_post.maintain_ledger(&terminated_missiles, &consumed_this_tick);
    let prioritized = self.command_post.prioritize(&detections, &self.targets, self.scenario.target_speed_mps);
    let now = self.current_tick as f64 * self.scenario.dt_s;
    let orders = self.command_post.select_launches(&prioritized, &self.scenario.launchers, now);
    let spawned_missiles = execute_launches(
      &orders,
      &mut self.scenario.launchers,
      &self.targets,
      self.scenario.missile_performance,
      &mut self.next_missile_id,
      now,
    );
    for (order, missile) in orders.iter().zip(spawned_missiles.iter()) {
      self.command_post.record_launch(order.target_id, missile.id);
      report.launches.push((order.launcher_id, order.target_id, missile.id));
    }
    self.missiles.retain(|m| m.is_alive());
    self.missiles.extend(spawned_missiles);

    debug!(
      "tick {}: {} targets alive, {} missiles alive, {} launches",
      self.current_tick,
      self.targets.iter().filter(|t| t.is_alive()).count(),
      self.missiles.iter().filter(|m| m.is_alive()).count(),
      report.launches.len()
    );

    // Phase 7: advance, check termination.
    self.current_tick += 1;
    let no_targets_left = !self.targets.iter().any(Target::is_alive) && self.pending_groups.is_empty();
    if self.current_tick >= self.scenario.t_max_ticks || no_targets_left {
      self.terminated = true;
      info!("simulation terminated at tick {}", self.current_tick);
    }

    report
  }
}

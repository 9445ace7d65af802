//! The JSON scenario document (spec.md §6) and its lowering into the
//! immutable in-memory [`crate::scenario::Scenario`].
//!
//! Grounded on `callisto::entity::Entities::load_from_file` (read a JSON
//! file, deserialize, then validate before the engine is allowed to start)
//! and `callisto::payloads`' `serde_conv!`-based `Vec3asVec`, which lets 3-
//! vectors serialize as plain `[x, y, z]` arrays instead of named fields.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_with::{serde_as, skip_serializing_none};

use crate::error::ConfigError;
use crate::geometry::{from_degrees, Vec3};

/*
 * Vec3asVec exists so scenario files read/write 3-vectors as [x, y, z]
 * rather than {"x":.., "y":.., "z":..}.
 */
serde_with::serde_conv!(
  pub Vec3asVec,
  Vec3,
  |v: &Vec3| [v.x, v.y, v.z],
  |value: [f64; 3]| -> Result<_, std::convert::Infallible> {
    Ok(Vec3 { x: value[0], y: value[1], z: value[2] })
  }
);

serde_with::serde_conv!(
  pub Vec2asVec,
  (f64, f64),
  |v: &(f64, f64)| [v.0, v.1],
  |value: [f64; 2]| -> Result<_, std::convert::Infallible> { Ok((value[0], value[1])) }
);

fn default_dt_s() -> f64 {
  0.1
}

fn default_seed() -> u64 {
  0
}

fn default_z_limits() -> (f64, f64) {
  (0.0, 5000.0)
}

fn default_region() -> (f64, f64, f64, f64) {
  (-1.0e6, 1.0e6, -1.0e6, 1.0e6)
}

fn default_endgame_factor() -> f64 {
  2.0
}

fn default_endgame_miss_increase_ticks() -> u32 {
  3
}

fn default_missiles_loaded() -> u32 {
  4
}

fn default_cooldown_s() -> f64 {
  5.0
}

fn default_launcher_initially_cooled() -> bool {
  true
}

fn default_ring_half_offset() -> bool {
  false
}

#[skip_serializing_none]
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct SimConfig {
  #[serde(default = "default_dt_s")]
  pub dt_s: f64,
  pub t_max_s: f64,
  #[serde(default = "default_seed")]
  pub seed: u64,
}

#[serde_as]
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct WorldConfig {
  /// (x_min, x_max, y_min, y_max)
  #[serde(default = "default_region")]
  #[serde_as(as = "Vec4asTuple")]
  pub region_rect: (f64, f64, f64, f64),
  /// (z_min, z_max)
  #[serde(default = "default_z_limits")]
  #[serde_as(as = "Vec2asVec")]
  pub z_limits_m: (f64, f64),
}

impl Default for WorldConfig {
  fn default() -> Self {
    WorldConfig { region_rect: default_region(), z_limits_m: default_z_limits() }
  }
}

serde_with::serde_conv!(
  Vec4asTuple,
  (f64, f64, f64, f64),
  |v: &(f64, f64, f64, f64)| [v.0, v.1, v.2, v.3],
  |value: [f64; 4]| -> Result<_, std::convert::Infallible> {
    Ok((value[0], value[1], value[2], value[3]))
  }
);

#[serde_as]
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct CommandPostConfig {
  #[serde_as(as = "Vec2asVec")]
  pub position_xy: (f64, f64),
  pub arrival_radius_m: f64,
}

fn default_guidance_type() -> String {
  "true_3d_pn".to_string()
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct MissileGuidanceConfig {
  /// Declarative only — this engine implements exactly one guidance
  /// law (true 3-D PN) and does not branch on this field, but the
  /// scenario schema carries it for self-documentation and forward
  /// compatibility.
  #[serde(rename = "type", default = "default_guidance_type")]
  pub guidance_type: String,
  #[serde(default)]
  pub pn_gain: f64,
  #[serde(default = "default_endgame_factor")]
  pub endgame_factor: f64,
  #[serde(default = "default_endgame_miss_increase_ticks")]
  pub endgame_miss_increase_ticks: u32,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct PolicyConfig {
  pub missile_guidance: MissileGuidanceConfig,
  /// Declarative only, as with `MissileGuidanceConfig::guidance_type`:
  /// this engine hardcodes the Tgo/tie-break/launcher-selection rules
  /// of spec.md §4.6, so these fields exist only so a scenario author
  /// can record which policy a document was written against.
  #[serde(default)]
  pub tgo_definition: Option<String>,
  #[serde(default)]
  pub tie_breakers: Option<Vec<String>>,
  #[serde(default)]
  pub launcher_selection_order: Option<Vec<String>>,
  #[serde(default = "default_launcher_initially_cooled")]
  pub launcher_initially_cooled: bool,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct KinematicsConfig {
  pub initial_speed_mps: f64,
  pub v_max_mps: f64,
  pub a_max_mps2: f64,
  pub omega_max_deg_s: f64,
  pub intercept_radius_m: f64,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct MissileDefaultsConfig {
  pub kinematics: KinematicsConfig,
}

#[serde_as]
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct SensorConfig {
  pub id: u64,
  #[serde_as(as = "Vec3asVec")]
  pub pos: Vec3,
  pub range_m: f64,
}

#[serde_as]
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct LauncherConfig {
  pub id: u64,
  #[serde_as(as = "Vec3asVec")]
  pub pos: Vec3,
  #[serde(default = "default_missiles_loaded")]
  pub missiles_loaded: u32,
  #[serde(default = "default_cooldown_s")]
  pub cooldown_s: f64,
}

#[serde_as]
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct GroupConfig {
  pub id: u64,
  pub spawn_time_s: f64,
  #[serde_as(as = "Vec2asVec")]
  pub center_xy: (f64, f64),
  pub z_m: f64,
  pub count: u32,
  pub ring_spacing_m: f64,
  #[serde(default)]
  pub start_angle_deg: f64,
  #[serde(default = "default_ring_half_offset")]
  pub ring_half_offset: bool,
  pub endurance_pt: u32,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct EnemyForcesConfig {
  /// Straight-line speed every spawned target holds for its whole life
  /// (spec.md's glossary `v_target`). Not broken out per-group in
  /// spec.md's table; applied uniformly to every group the way the
  /// table implies a single scenario-wide enemy craft speed.
  pub speed_mps: f64,
  pub groups: Vec<GroupConfig>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct FriendlyForcesConfig {
  #[serde(default)]
  pub sensors: Vec<SensorConfig>,
  #[serde(default)]
  pub launchers: Vec<LauncherConfig>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ScenarioFile {
  pub sim: SimConfig,
  #[serde(default)]
  pub world: WorldConfig,
  pub command_post: CommandPostConfig,
  pub policy: PolicyConfig,
  pub friendly_forces: FriendlyForcesConfig,
  pub enemy_forces: EnemyForcesConfig,
  pub missile_defaults: MissileDefaultsConfig,
}

impl ScenarioFile {
  /// Load and parse (but do not yet validate) a scenario file.
  ///
  /// # Errors
  /// Returns an error if the file cannot be opened or does not parse as
  /// the expected JSON document shape.
  pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self, Box<dyn std::error::Error>> {
    let file = File::open(path)?;
    let reader = BufReader::new(file);
    let scenario_file: ScenarioFile = serde_json::from_reader(reader)?;
    Ok(scenario_file)
  }

  pub fn omega_max_rad_s(&self) -> f64 {
    from_degrees(self.missile_defaults.kinematics.omega_max_deg_s)
  }
}

fn require_positive(group: &'static str, field: &'static str, value: f64) -> Result<(), ConfigError> {
  if value > 0.0 {
    Ok(())
  } else {
    Err(ConfigError::OutOfDomain { group, field, reason: format!("must be > 0, got {value}") })
  }
}

impl ScenarioFile {
  /// Validate the raw document against spec.md §7's domain rules.
  ///
  /// # Errors
  /// Returns the first [`ConfigError`] encountered. Does not attempt to
  /// collect every violation in one pass.
  pub fn validate(&self) -> Result<(), ConfigError> {
    require_positive("sim", "dt_s", self.sim.dt_s)?;
    require_positive("sim", "t_max_s", self.sim.t_max_s)?;
    require_positive("command_post", "arrival_radius_m", self.command_post.arrival_radius_m)?;

    let k = &self.missile_defaults.kinematics;
    require_positive("missile_defaults.kinematics", "v_max_mps", k.v_max_mps)?;
    require_positive("missile_defaults.kinematics", "a_max_mps2", k.a_max_mps2)?;
    require_positive("missile_defaults.kinematics", "omega_max_deg_s", k.omega_max_deg_s)?;
    require_positive("missile_defaults.kinematics", "intercept_radius_m", k.intercept_radius_m)?;
    if k.initial_speed_mps <= 0.0 {
      return Err(ConfigError::OutOfDomain {
        group: "missile_defaults.kinematics",
        field: "initial_speed_mps",
        reason: format!("must be > 0, got {}", k.initial_speed_mps),
      });
    }

    if !(3.0..=4.0).contains(&self.policy.missile_guidance.pn_gain) {
      return Err(ConfigError::OutOfDomain {
        group: "policy.missile_guidance",
        field: "pn_gain",
        reason: format!("N must be in [3, 4], got {}", self.policy.missile_guidance.pn_gain),
      });
    }

    require_positive("enemy_forces", "speed_mps", self.enemy_forces.speed_mps)?;

    for launcher in &self.friendly_forces.launchers {
      if launcher.cooldown_s < 0.0 {
        return Err(ConfigError::OutOfDomain {
          group: "launchers",
          field: "cooldown_s",
          reason: format!("must be >= 0, got {}", launcher.cooldown_s),
        });
      }
    }

    for group in &self.enemy_forces.groups {
      if group.count < 1 {
        return Err(ConfigError::OutOfDomain {
          group: "groups",
          field: "count",
          reason: format!("must be >= 1, got {}", group.count),
        });
      }
      if group.endurance_pt < 1 {
        return Err(ConfigError::OutOfDomain {
          group: "groups",
          field: "endurance_pt",
          reason: format!("must be >= 1, got {}", group.endurance_pt),
        });
      }
      require_positive("groups", "ring_spacing_m", group.ring_spacing_m)?;
    }

    Ok(())
  }
}

use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::Path;

use crate::arch::rocc::RoccParams;

const DEFAULT_CONFIG: &str = include_str!("default.toml");

/// Command interface geometry plus its dispatch clock.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct RoccSection {
  #[serde(flatten)]
  pub params: RoccParams,
  pub tick_period: f64,
}

impl Default for RoccSection {
  fn default() -> Self {
    Self {
      params: RoccParams::default(),
      tick_period: 1.0,
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct MemorySection {
  /// 0 lets the interface pick its default line
  pub line_size: u64,
  pub latency: f64,
}

impl Default for MemorySection {
  fn default() -> Self {
    Self {
      line_size: 64,
      latency: 4.0,
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ArraySection {
  pub latency: f64,
}

impl Default for ArraySection {
  fn default() -> Self {
    Self { latency: 8.0 }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct HostSection {
  pub retry_delay: f64,
}

impl Default for HostSection {
  fn default() -> Self {
    Self { retry_delay: 2.0 }
  }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct SimulationSection {
  #[serde(default)]
  pub quiet: bool,
  #[serde(default)]
  pub step_mode: bool,
  #[serde(default)]
  pub trace_file: String,
  #[serde(default = "default_max_time")]
  pub max_time: f64,
}

fn default_max_time() -> f64 {
  1_000_000.0
}

impl Default for SimulationSection {
  fn default() -> Self {
    Self {
      quiet: false,
      step_mode: false,
      trace_file: String::new(),
      max_time: default_max_time(),
    }
  }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct AppConfig {
  #[serde(default)]
  pub rocc: RoccSection,
  #[serde(default)]
  pub memory: MemorySection,
  #[serde(default)]
  pub array: ArraySection,
  #[serde(default)]
  pub host: HostSection,
  #[serde(default)]
  pub simulation: SimulationSection,
}

fn invalid(msg: impl Into<String>) -> io::Error {
  io::Error::new(io::ErrorKind::InvalidData, msg.into())
}

fn parse_table(content: &str, origin: &str) -> io::Result<toml::Table> {
  content
    .parse::<toml::Table>()
    .map_err(|e| invalid(format!("failed to parse {}: {}", origin, e)))
}

fn from_table(table: toml::Table) -> io::Result<AppConfig> {
  toml::Value::Table(table)
    .try_into()
    .map_err(|e| invalid(format!("bad configuration: {}", e)))
}

/// Built-in configuration shipped with the crate.
pub fn load_default_config() -> io::Result<AppConfig> {
  from_table(parse_table(DEFAULT_CONFIG, "default.toml")?)
}

/// Load one file on its own; missing keys take their defaults.
pub fn load_config_file(path: &Path) -> io::Result<AppConfig> {
  let content = fs::read_to_string(path)
    .map_err(|e| io::Error::new(io::ErrorKind::NotFound, format!("cannot read config {:?}: {}", path, e)))?;
  from_table(parse_table(&content, &path.display().to_string())?)
}

/// Overlay `over` onto `base`, table by table. Non-table values in `over` win.
pub fn merge_config(mut base: toml::Table, over: toml::Table) -> toml::Table {
  for (key, value) in over {
    match (base.get_mut(&key), value) {
      (Some(toml::Value::Table(dst)), toml::Value::Table(src)) => {
        let merged = merge_config(std::mem::take(dst), src);
        *dst = merged;
      },
      (_, value) => {
        base.insert(key, value);
      },
    }
  }
  base
}

pub fn apply_cli_overrides(
  config: &mut AppConfig,
  quiet: bool,
  step: bool,
  trace_file: Option<&str>,
  max_time: Option<f64>,
) {
  if quiet {
    config.simulation.quiet = true;
  }
  if step {
    config.simulation.step_mode = true;
  }
  if let Some(file) = trace_file {
    config.simulation.trace_file = file.to_string();
  }
  if let Some(t) = max_time {
    config.simulation.max_time = t;
  }
}

fn check_cycles(name: &str, value: f64, allow_zero: bool) -> io::Result<()> {
  if !value.is_finite() || value < 0.0 || (!allow_zero && value == 0.0) {
    let expect = if allow_zero { "non-negative" } else { "positive" };
    return Err(invalid(format!("{} must be a finite {} number, got {}", name, expect, value)));
  }
  if value.fract() != 0.0 {
    return Err(invalid(format!("{} must be a whole number of cycles, got {}", name, value)));
  }
  Ok(())
}

pub fn validate_config(config: &AppConfig) -> io::Result<()> {
  config.rocc.params.validate().map_err(|e| invalid(format!("[rocc] {}", e)))?;

  check_cycles("rocc.tick_period", config.rocc.tick_period, false)?;
  check_cycles("memory.latency", config.memory.latency, true)?;
  check_cycles("array.latency", config.array.latency, true)?;
  check_cycles("host.retry_delay", config.host.retry_delay, false)?;

  let max_time = config.simulation.max_time;
  if !(max_time > 0.0) {
    return Err(invalid(format!("simulation.max_time must be positive, got {}", max_time)));
  }

  Ok(())
}

/// Load and merge configuration
///
/// 1. built-in defaults
/// 2. custom file on top, if any
/// 3. CLI overrides
/// 4. validation
pub fn load_and_merge_configs(
  custom_config_path: Option<&Path>,
  quiet: bool,
  step: bool,
  trace_file: Option<&str>,
  max_time: Option<f64>,
) -> io::Result<AppConfig> {
  let mut table = parse_table(DEFAULT_CONFIG, "default.toml")?;

  if let Some(path) = custom_config_path {
    let content = fs::read_to_string(path)
      .map_err(|e| io::Error::new(io::ErrorKind::NotFound, format!("cannot read config {:?}: {}", path, e)))?;
    table = merge_config(table, parse_table(&content, &path.display().to_string())?);
  }

  let mut config = from_table(table)?;
  apply_cli_overrides(&mut config, quiet, step, trace_file, max_time);
  validate_config(&config)?;

  Ok(config)
}

//! Workload files: what memory holds before the run, which commands the host
//! issues, and which regions to read back afterwards.
//!
//! ```toml
//! [[preload]]
//! addr = 0x1000
//! values = [1.0, 2.0, 3.0, 4.0]
//!
//! [[fault]]
//! start = 0x8000
//! end = 0x8040
//!
//! [[command]]
//! opcode = "set_matrix"
//! operand_a = 0x1000
//! operand_b = 0
//! slot = 1
//!
//! [[dump]]
//! name = "y"
//! addr = 0x3000
//! count = 2
//! ```

use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::Path;

use crate::arch::engine::backing::FaultRange;
use crate::arch::engine::Backing;
use crate::arch::rocc::{Command, OperandCodec};

/// Bytes placed in memory before the run. `values` go through the input
/// codec; `bytes` are written as-is after them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Preload {
  pub addr: u64,
  #[serde(default)]
  pub values: Vec<f64>,
  #[serde(default)]
  pub bytes: Vec<u8>,
}

/// Region decoded with the output codec once the run is over.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Dump {
  #[serde(default)]
  pub name: String,
  pub addr: u64,
  pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DumpRegion {
  pub name: String,
  pub addr: u64,
  pub values: Vec<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Workload {
  #[serde(default)]
  pub preload: Vec<Preload>,
  #[serde(default)]
  pub fault: Vec<FaultRange>,
  #[serde(default)]
  pub command: Vec<Command>,
  #[serde(default)]
  pub dump: Vec<Dump>,
}

impl Workload {
  pub fn from_toml(content: &str) -> io::Result<Self> {
    toml::from_str(content)
      .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, format!("failed to parse workload: {}", e)))
  }

  pub fn load(path: &Path) -> io::Result<Self> {
    let content = fs::read_to_string(path)
      .map_err(|e| io::Error::new(io::ErrorKind::NotFound, format!("cannot read workload {:?}: {}", path, e)))?;
    Self::from_toml(&content)
  }

  /// Fill `backing` with the preloads and install the fault ranges.
  pub fn apply(&self, backing: &mut Backing, input: &OperandCodec) {
    for p in &self.preload {
      let mut data = input.encode_all(&p.values);
      data.extend_from_slice(&p.bytes);
      backing.write(p.addr, &data);
    }
    for range in &self.fault {
      backing.add_fault(*range);
    }
  }

  pub fn read_dumps(&self, backing: &Backing, output: &OperandCodec) -> Vec<DumpRegion> {
    self
      .dump
      .iter()
      .map(|d| {
        let bytes = backing.read(d.addr, (d.count * output.size) as u64);
        DumpRegion {
          name: d.name.clone(),
          addr: d.addr,
          values: output.decode_all(&bytes),
        }
      })
      .collect()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::arch::rocc::{DataType, Opcode};

  const SAMPLE: &str = r#"
    [[preload]]
    addr = 0x100
    values = [1.5, -2.0]

    [[preload]]
    addr = 0x200
    bytes = [1, 2, 3]

    [[fault]]
    start = 0x800
    end = 0x840

    [[command]]
    opcode = "load_vector"
    operand_a = 0x100
    operand_b = 0
    slot = 3

    [[command]]
    opcode = { unknown = 9 }
    operand_a = 0
    operand_b = 0
    slot = 4

    [[dump]]
    name = "x"
    addr = 0x100
    count = 2
  "#;

  #[test]
  fn test_parse_and_apply() {
    let workload = Workload::from_toml(SAMPLE).unwrap();
    assert_eq!(workload.command.len(), 2);
    assert_eq!(workload.command[0], Command::load_vector(0x100, 0, 3));
    assert_eq!(workload.command[1].opcode, Opcode::Unknown(9));

    let codec = OperandCodec::new(DataType::Float32, 4);
    let mut backing = Backing::new();
    workload.apply(&mut backing, &codec);

    assert_eq!(backing.read(0x200, 4), vec![1, 2, 3, 0]);
    assert!(backing.is_faulty(0x83f, 1));
    assert!(!backing.is_faulty(0x840, 8));

    let dumps = workload.read_dumps(&backing, &codec);
    assert_eq!(
      dumps,
      vec![DumpRegion {
        name: "x".to_string(),
        addr: 0x100,
        values: vec![1.5, -2.0],
      }]
    );
  }

  #[test]
  fn test_empty_workload() {
    let workload = Workload::from_toml("").unwrap();
    assert!(workload.command.is_empty());
  }

  #[test]
  fn test_rejects_bad_opcode_name() {
    let err = Workload::from_toml("[[command]]\nopcode = \"jump\"\noperand_a = 0\noperand_b = 0\nslot = 0\n").unwrap_err();
    assert_eq!(err.kind(), io::ErrorKind::InvalidData);
  }
}

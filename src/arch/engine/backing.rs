use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};

/// Address range `[start, end)` on which every access fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FaultRange {
  pub start: u64,
  pub end: u64,
}

impl FaultRange {
  pub fn overlaps(&self, addr: u64, len: u64) -> bool {
    addr < self.end && addr.saturating_add(len) > self.start
  }
}

/// Sparse byte store; unwritten bytes read as zero.
#[derive(Debug, Clone, Default)]
pub struct Backing {
  bytes: BTreeMap<u64, u8>,
  faults: Vec<FaultRange>,
}

impl Backing {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn add_fault(&mut self, range: FaultRange) {
    self.faults.push(range);
  }

  pub fn is_faulty(&self, addr: u64, len: u64) -> bool {
    self.faults.iter().any(|f| f.overlaps(addr, len))
  }

  pub fn read(&self, addr: u64, len: u64) -> Vec<u8> {
    (addr..addr.saturating_add(len))
      .map(|a| self.bytes.get(&a).copied().unwrap_or(0))
      .collect()
  }

  pub fn write(&mut self, addr: u64, data: &[u8]) {
    for (i, &b) in data.iter().enumerate() {
      let Some(a) = addr.checked_add(i as u64) else {
        break;
      };
      self.bytes.insert(a, b);
    }
  }
}

/// Backing store shared between the memory model and whoever set it up.
#[derive(Debug, Clone, Default)]
pub struct SharedBacking(Arc<Mutex<Backing>>);

impl SharedBacking {
  pub fn new(backing: Backing) -> Self {
    Self(Arc::new(Mutex::new(backing)))
  }

  /// A panic while holding the lock leaves plain bytes behind, so a
  /// poisoned lock is still usable.
  pub fn lock(&self) -> MutexGuard<'_, Backing> {
    self.0.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
  }
}

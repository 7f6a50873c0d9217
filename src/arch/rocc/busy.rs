/// Per-array compute in-flight flags.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArrayBusyTable {
  busy: Vec<bool>,
}

impl ArrayBusyTable {
  pub fn new(num_arrays: usize) -> Self {
    Self {
      busy: vec![false; num_arrays],
    }
  }

  pub fn contains(&self, array_id: u32) -> bool {
    (array_id as usize) < self.busy.len()
  }

  pub fn mark_busy(&mut self, array_id: u32) {
    if let Some(flag) = self.busy.get_mut(array_id as usize) {
      *flag = true;
    }
  }

  /// Returns whether the array had been busy.
  pub fn clear(&mut self, array_id: u32) -> bool {
    match self.busy.get_mut(array_id as usize) {
      Some(flag) => std::mem::replace(flag, false),
      None => false,
    }
  }

  pub fn is_busy(&self, array_id: u32) -> bool {
    self.busy.get(array_id as usize).copied().unwrap_or(false)
  }

  pub fn busy_count(&self) -> usize {
    self.busy.iter().filter(|&&b| b).count()
  }

  pub fn len(&self) -> usize {
    self.busy.len()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_busy_flags() {
    let mut table = ArrayBusyTable::new(4);
    table.mark_busy(1);
    table.mark_busy(3);
    assert!(table.is_busy(1));
    assert_eq!(table.busy_count(), 2);

    assert!(table.clear(1));
    assert!(!table.clear(1));
    assert!(!table.is_busy(1));
    assert!(table.is_busy(3));
  }

  #[test]
  fn test_out_of_range_ids_are_ignored() {
    let mut table = ArrayBusyTable::new(2);
    assert!(!table.contains(2));
    table.mark_busy(7);
    assert!(!table.is_busy(7));
    assert!(!table.clear(7));
    assert_eq!(table.busy_count(), 0);
    assert_eq!(table.len(), 2);
  }
}

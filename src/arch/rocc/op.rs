/// Where the single in-flight command currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OpState {
  #[default]
  Idle,
  AwaitReadSetMatrix,
  AwaitReadLoadVector,
  AwaitCompute,
  AwaitWriteStore,
  MoveImmediate,
  Error,
}

impl OpState {
  pub fn awaits_read(self) -> bool {
    matches!(self, OpState::AwaitReadSetMatrix | OpState::AwaitReadLoadVector)
  }
}

/// Progress of one chunked memory transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Transfer {
  pub base: u64,
  pub offset: u64,
  pub total: u64,
}

impl Transfer {
  pub fn new(base: u64, total: u64) -> Self {
    Self { base, offset: 0, total }
  }

  pub fn remaining(&self) -> u64 {
    self.total - self.offset
  }

  pub fn is_done(&self) -> bool {
    self.offset >= self.total
  }

  pub fn advance(&mut self, bytes: u64) {
    self.offset += bytes;
    debug_assert!(self.offset <= self.total, "transfer overran: {:?}", self);
  }
}

/// The operation decoded from the queue head.
///
/// Exactly one exists per interface; `reset` brings it back to the neutral
/// value between commands.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PendingOp {
  pub state: OpState,
  pub array_id: u32,
  pub read: Transfer,
  pub write: Transfer,
  /// packed output vector of a StoreVector, sized to `write.total`
  pub payload: Vec<u8>,
  /// tail bytes of an element split across two read chunks
  pub carry: Vec<u8>,
}

impl PendingOp {
  pub fn reset(&mut self) {
    *self = PendingOp::default();
  }

  pub fn is_neutral(&self) -> bool {
    *self == PendingOp::default()
  }

  pub fn check_invariants(&self) {
    debug_assert!(self.read.offset <= self.read.total);
    debug_assert!(self.write.offset <= self.write.total);
    debug_assert!(self.read.total == 0 || self.state.awaits_read());
    debug_assert!(self.write.total == 0 || self.state == OpState::AwaitWriteStore);
    debug_assert!(self.payload.is_empty() || self.payload.len() as u64 == self.write.total);
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_reset_is_neutral() {
    let mut op = PendingOp {
      state: OpState::AwaitWriteStore,
      array_id: 3,
      write: Transfer::new(0x2008, 32),
      payload: vec![0; 32],
      ..Default::default()
    };
    op.write.advance(8);
    op.check_invariants();
    assert!(!op.is_neutral());

    op.reset();
    assert!(op.is_neutral());
    assert_eq!(op.state, OpState::Idle);
  }

  #[test]
  fn test_transfer_progress() {
    let mut t = Transfer::new(0x1000, 16);
    assert_eq!(t.remaining(), 16);
    t.advance(10);
    assert!(!t.is_done());
    t.advance(6);
    assert!(t.is_done());
    assert_eq!(t.remaining(), 0);
  }
}

use super::command::Command;

/// Bounded FIFO of host commands.
///
/// The head stays in place while its command is being executed and is only
/// retired by the response path.
#[derive(Debug, Clone)]
pub struct CommandQueue {
  buffer: Vec<Option<Command>>,
  head: usize,
  tail: usize,
  size: usize,
  capacity: usize,
  issued: u64,
}

impl CommandQueue {
  pub fn new(capacity: usize) -> Self {
    Self {
      buffer: vec![None; capacity],
      head: 0,
      tail: 0,
      size: 0,
      capacity,
      issued: 0,
    }
  }

  /// Admit a command. A full queue rejects without touching any state.
  pub fn push(&mut self, cmd: Command) -> bool {
    if self.is_full() {
      return false;
    }

    self.buffer[self.tail] = Some(cmd);
    self.tail = (self.tail + 1) % self.capacity;
    self.size += 1;
    self.issued += 1;
    true
  }

  pub(crate) fn pop_front(&mut self) -> Option<Command> {
    if self.is_empty() {
      return None;
    }

    let cmd = self.buffer[self.head].take();
    self.head = (self.head + 1) % self.capacity;
    self.size -= 1;
    cmd
  }

  pub fn front(&self) -> Option<&Command> {
    if self.is_empty() {
      None
    } else {
      self.buffer[self.head].as_ref()
    }
  }

  pub fn is_empty(&self) -> bool {
    self.size == 0
  }

  pub fn is_full(&self) -> bool {
    self.size >= self.capacity
  }

  pub fn len(&self) -> usize {
    self.size
  }

  pub fn capacity(&self) -> usize {
    self.capacity
  }

  /// Number of commands ever admitted.
  pub fn issued(&self) -> u64 {
    self.issued
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_push_until_full() {
    let mut q = CommandQueue::new(2);
    assert!(q.is_empty());

    assert!(q.push(Command::compute(0, 1)));
    assert!(q.push(Command::compute(1, 2)));
    assert!(q.is_full());
    assert_eq!(q.issued(), 2);

    // rejected push leaves everything as it was
    assert!(!q.push(Command::compute(2, 3)));
    assert_eq!(q.len(), 2);
    assert_eq!(q.issued(), 2);
    assert_eq!(q.front().map(|c| c.slot), Some(1));
  }

  #[test]
  fn test_fifo_wraparound() {
    let mut q = CommandQueue::new(3);
    for round in 0..4u8 {
      assert!(q.push(Command::compute(0, round * 2)));
      assert!(q.push(Command::compute(0, round * 2 + 1)));
      assert_eq!(q.pop_front().unwrap().slot, round * 2);
      assert_eq!(q.pop_front().unwrap().slot, round * 2 + 1);
    }
    assert!(q.pop_front().is_none());
    assert_eq!(q.issued(), 8);
    assert_eq!(q.capacity(), 3);
  }
}

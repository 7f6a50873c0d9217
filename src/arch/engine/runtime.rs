use log::info;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Shared numeric runtime behind one or more engines.
///
/// Engines hold a [`RuntimeLease`] for as long as they live; the runtime
/// counts them so it knows when it has gone idle. Nothing here depends on
/// which engine was created first.
#[derive(Debug)]
pub struct EngineRuntime {
  name: String,
  live_instances: AtomicUsize,
}

impl EngineRuntime {
  pub fn new(name: impl Into<String>) -> Arc<Self> {
    Arc::new(Self {
      name: name.into(),
      live_instances: AtomicUsize::new(0),
    })
  }

  pub fn acquire(self: &Arc<Self>) -> RuntimeLease {
    if self.live_instances.fetch_add(1, Ordering::AcqRel) == 0 {
      info!("runtime '{}' started", self.name);
    }
    RuntimeLease {
      runtime: Arc::clone(self),
    }
  }

  pub fn live_instances(&self) -> usize {
    self.live_instances.load(Ordering::Acquire)
  }

  pub fn name(&self) -> &str {
    &self.name
  }

  fn release(&self) {
    if self.live_instances.fetch_sub(1, Ordering::AcqRel) == 1 {
      info!("runtime '{}' idle, no live engines", self.name);
    }
  }
}

/// One engine's claim on an [`EngineRuntime`]. Released on drop.
#[derive(Debug)]
pub struct RuntimeLease {
  runtime: Arc<EngineRuntime>,
}

impl RuntimeLease {
  pub fn runtime(&self) -> &Arc<EngineRuntime> {
    &self.runtime
  }
}

impl Clone for RuntimeLease {
  fn clone(&self) -> Self {
    self.runtime.acquire()
  }
}

impl Drop for RuntimeLease {
  fn drop(&mut self) {
    self.runtime.release();
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_lease_counting() {
    let rt = EngineRuntime::new("test");
    assert_eq!(rt.live_instances(), 0);

    let a = rt.acquire();
    let b = a.clone();
    assert_eq!(rt.live_instances(), 2);
    assert!(Arc::ptr_eq(a.runtime(), &rt));

    drop(a);
    assert_eq!(rt.live_instances(), 1);
    drop(b);
    assert_eq!(rt.live_instances(), 0);

    // the runtime can be re-acquired after going idle
    let _c = rt.acquire();
    assert_eq!(rt.live_instances(), 1);
  }
}

//! Admission gate: fixed-capacity limiter on in-flight work.

use std::sync::Arc;
use tokio::sync::{AcquireError, OwnedSemaphorePermit, Semaphore};

/// Shared gate with `capacity` slots. A worker holds one [`GateSlot`] for
/// its whole lifetime; dropping the slot returns it.
#[derive(Debug, Clone)]
pub struct AdmissionGate {
    capacity: usize,
    slots: Arc<Semaphore>,
}

/// One reserved gate slot; released on drop.
#[derive(Debug)]
pub struct GateSlot {
    _permit: OwnedSemaphorePermit,
}

impl AdmissionGate {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            slots: Arc::new(Semaphore::new(capacity)),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Slots currently held.
    #[cfg(test)]
    pub fn in_use(&self) -> usize {
        self.capacity.saturating_sub(self.slots.available_permits())
    }

    /// Waits until a slot is free. Errors only if the gate was closed.
    pub async fn acquire(&self) -> Result<GateSlot, AcquireError> {
        let permit = Arc::clone(&self.slots).acquire_owned().await?;
        Ok(GateSlot { _permit: permit })
    }

    /// Takes a slot only if one is free right now.
    #[cfg(test)]
    pub fn try_acquire(&self) -> Option<GateSlot> {
        Arc::clone(&self.slots)
            .try_acquire_owned()
            .ok()
            .map(|permit| GateSlot { _permit: permit })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn gate_acquire_and_release() {
        let gate = AdmissionGate::new(2);
        assert_eq!(gate.in_use(), 0);
        let a = gate.acquire().await.unwrap();
        let b = gate.acquire().await.unwrap();
        assert_eq!(gate.in_use(), 2);
        assert!(gate.try_acquire().is_none());
        drop(a);
        assert_eq!(gate.in_use(), 1);
        let c = gate.try_acquire();
        assert!(c.is_some());
        drop(b);
        drop(c);
        assert_eq!(gate.in_use(), 0);
    }

    #[test]
    fn zero_capacity_clamps_to_one() {
        let gate = AdmissionGate::new(0);
        assert_eq!(gate.capacity(), 1);
        assert!(gate.try_acquire().is_some());
    }
}

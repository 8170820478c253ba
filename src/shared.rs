use core::cell::RefCell;

use critical_section::Mutex;

use crate::{FieldUpdate, OvenRecord};

/// The single record both loops work on.
///
/// Ingest writes into it, transmit periodically takes it and puts a fresh
/// default record back. Each of those happens inside one critical section, so
/// a transmitted record never mixes values from either side of a reset.
pub struct SharedRecord {
    current: Mutex<RefCell<OvenRecord>>,
    defaults: OvenRecord,
}

impl SharedRecord {
    pub const fn new(node_id: u16) -> Self {
        Self {
            current: Mutex::new(RefCell::new(OvenRecord::new(node_id))),
            defaults: OvenRecord::new(node_id),
        }
    }

    pub fn apply_update(&self, update: FieldUpdate) {
        critical_section::with(|cs| self.current.borrow_ref_mut(cs).apply(update));
    }

    /// Applies every update from one frame as a unit
    pub fn apply_updates(&self, updates: &[FieldUpdate]) {
        if updates.is_empty() {
            return;
        }

        critical_section::with(|cs| {
            let mut current = self.current.borrow_ref_mut(cs);

            for update in updates {
                current.apply(*update);
            }
        });
    }

    /// Hands out the record accumulated so far and starts a new period from
    /// the defaults
    pub fn take_and_reset(&self) -> OvenRecord {
        critical_section::with(|cs| self.current.borrow(cs).replace(self.defaults))
    }

    /// A copy of the current record, leaving it in place
    pub fn snapshot(&self) -> OvenRecord {
        critical_section::with(|cs| *self.current.borrow_ref(cs))
    }

    pub fn defaults(&self) -> OvenRecord {
        self.defaults
    }
}

impl Default for SharedRecord {
    fn default() -> Self {
        Self::new(crate::DEFAULT_NODE_ID)
    }
}

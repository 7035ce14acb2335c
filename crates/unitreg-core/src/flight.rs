//! Per-identifier load gates.
//!
//! Concurrent first loads of the same identifier serialize on one gate so
//! the loader runs at most once per successful load. Gates exist only while
//! someone holds a [`Ticket`] for them.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

#[derive(Debug, Default)]
pub(crate) struct InFlight {
    gates: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl InFlight {
    /// Join (or open) the gate for `id`.
    pub(crate) fn ticket(&self, id: &str) -> Ticket<'_> {
        let gate = {
            let mut gates = self.gates.lock().unwrap_or_else(PoisonError::into_inner);
            Arc::clone(gates.entry(id.to_owned()).or_default())
        };
        Ticket {
            flights: self,
            id: id.to_owned(),
            gate,
        }
    }

    /// Number of identifiers with an open gate.
    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.gates
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

/// A claim on the gate for one identifier.
///
/// The guard returned by [`Ticket::wait`] must be dropped before the ticket.
pub(crate) struct Ticket<'a> {
    flights: &'a InFlight,
    id: String,
    gate: Arc<Mutex<()>>,
}

impl Ticket<'_> {
    /// Block until no other caller is loading this identifier.
    pub(crate) fn wait(&self) -> MutexGuard<'_, ()> {
        self.gate.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Drop for Ticket<'_> {
    fn drop(&mut self) {
        let mut gates = self
            .flights
            .gates
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        // One reference in the map, one here: nobody else is waiting.
        if Arc::strong_count(&self.gate) <= 2 {
            gates.remove(&self.id);
        }
    }
}

//! Which riders may submit pings.

use rustc_hash::FxHashSet;

use tt_core::RiderId;

/// Resolves rider ids against the account system.
///
/// Consulted before any state is touched; a rider it rejects gets
/// `ValidationError::UnknownRider`.
pub trait RiderDirectory: Send + Sync {
    fn contains(&self, rider: RiderId) -> bool;
}

/// Accepts every well-formed rider id.
#[derive(Debug, Clone, Copy, Default)]
pub struct AnyRider;

impl RiderDirectory for AnyRider {
    fn contains(&self, _rider: RiderId) -> bool {
        true
    }
}

/// A fixed set of registered riders.
#[derive(Debug, Clone, Default)]
pub struct KnownRiders {
    riders: FxHashSet<RiderId>,
}

impl KnownRiders {
    pub fn new(riders: impl IntoIterator<Item = RiderId>) -> Self {
        Self { riders: riders.into_iter().collect() }
    }

    pub fn insert(&mut self, rider: RiderId) -> bool {
        self.riders.insert(rider)
    }

    pub fn len(&self) -> usize {
        self.riders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.riders.is_empty()
    }
}

impl RiderDirectory for KnownRiders {
    fn contains(&self, rider: RiderId) -> bool {
        self.riders.contains(&rider)
    }
}

use ordered_float::OrderedFloat;
use std::collections::BTreeSet;
use std::ops::Bound;

/// Why a candidate was turned away.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Rejection {
    /// Within `spread` of the receiver's own center frequency
    NearCenter,
    /// Within `spread` of a signal accepted earlier in the session
    Duplicate { existing: f64 },
}

/// Center frequencies of every signal accepted during this session.
///
/// Entries are never removed, so an emitter is reported once no matter how
/// many overlapping windows it shows up in.
#[derive(Debug, Default, Clone)]
pub struct SignalRegistry {
    accepted: BTreeSet<OrderedFloat<f64>>,
}

impl SignalRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Checks a candidate spanning `low..high` and registers it if new.
    pub fn try_accept(&mut self, low: f64, high: f64, current_center: f64, spread: f64) -> bool {
        self.check(low, high, current_center, spread).is_ok()
    }

    /// Like [`SignalRegistry::try_accept`] but reports the rejection reason.
    ///
    /// Returns the registered midpoint on success. A rejection leaves the
    /// registry untouched.
    pub fn check(
        &mut self,
        low: f64,
        high: f64,
        current_center: f64,
        spread: f64,
    ) -> Result<f64, Rejection> {
        let mid = (low + high) / 2.0;

        if (mid - current_center).abs() < spread {
            return Err(Rejection::NearCenter);
        }

        if let Some(existing) = self.nearest_within(mid, spread) {
            return Err(Rejection::Duplicate { existing });
        }

        self.accepted.insert(OrderedFloat(mid));
        Ok(mid)
    }

    fn nearest_within(&self, mid: f64, spread: f64) -> Option<f64> {
        let lower = OrderedFloat(mid - spread);
        let upper = OrderedFloat(mid + spread);

        self.accepted
            .range((Bound::Included(lower), Bound::Included(upper)))
            .map(|s| s.into_inner())
            .find(|s| (mid - s).abs() < spread)
    }

    pub fn len(&self) -> usize {
        self.accepted.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accepted.is_empty()
    }

    pub fn contains_near(&self, frequency: f64, spread: f64) -> bool {
        self.nearest_within(frequency, spread).is_some()
    }

    /// Accepted center frequencies in ascending order.
    pub fn frequencies(&self) -> impl Iterator<Item = f64> + '_ {
        self.accepted.iter().map(|s| s.into_inner())
    }
}

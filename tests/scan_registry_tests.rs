use bandsweep::scan::{Rejection, SignalRegistry};

const SPREAD: f64 = 50_000.0;

#[test]
fn test_second_candidate_within_spread_is_rejected() {
    let mut registry = SignalRegistry::new();

    assert!(registry.try_accept(95.990e6, 96.010e6, 94e6, SPREAD));
    // midpoint 96.03 MHz, 30 kHz from the first
    assert!(!registry.try_accept(96.020e6, 96.040e6, 94.5e6, SPREAD));
    assert_eq!(registry.len(), 1);
}

#[test]
fn test_candidate_at_center_rejected_on_empty_registry() {
    let mut registry = SignalRegistry::new();

    let result = registry.check(99.99e6, 100.03e6, 100e6, SPREAD);
    assert_eq!(result, Err(Rejection::NearCenter));
    assert!(registry.is_empty());
}

#[test]
fn test_duplicate_reports_existing_frequency() {
    let mut registry = SignalRegistry::new();
    assert_eq!(registry.check(100.4e6, 100.6e6, 99e6, SPREAD), Ok(100.5e6));

    let result = registry.check(100.52e6, 100.56e6, 101e6, SPREAD);
    assert_eq!(result, Err(Rejection::Duplicate { existing: 100.5e6 }));
}

#[test]
fn test_separation_of_exactly_spread_is_accepted() {
    let mut registry = SignalRegistry::new();
    assert!(registry.try_accept(100.0e6, 100.0e6, 90e6, SPREAD));
    assert!(registry.try_accept(100.05e6, 100.05e6, 90e6, SPREAD));

    let accepted: Vec<f64> = registry.frequencies().collect();
    assert_eq!(accepted, vec![100.0e6, 100.05e6]);
}

#[test]
fn test_entries_persist_across_windows() {
    let mut registry = SignalRegistry::new();
    for center in [88e6, 88.5e6, 89e6, 89.5e6] {
        registry.try_accept(90.2e6, 90.2e6, center, SPREAD);
    }
    assert_eq!(registry.len(), 1);
    assert!(registry.contains_near(90.21e6, SPREAD));
    assert!(!registry.contains_near(90.3e6, SPREAD));
}

use exambank_types::Timestamp;

#[test]
fn now_is_after_epoch() {
    let ts = Timestamp::now();
    assert!(ts.as_millis() > 0);
}

#[test]
fn from_millis_roundtrip() {
    let ts = Timestamp::from_millis(1_700_000_000_000).unwrap();
    assert_eq!(ts.as_millis(), 1_700_000_000_000);
}

#[test]
fn negative_millis_rejected() {
    assert!(Timestamp::from_millis(-1).is_err());
}

#[test]
fn ordering_follows_millis() {
    let a = Timestamp::from_millis(100).unwrap();
    let b = Timestamp::from_millis(200).unwrap();
    assert!(a < b);
    assert_eq!(a.max(b), b);
    assert_eq!(a.as_millis(), 100);
}

#[test]
fn now_is_monotonic_enough() {
    let a = Timestamp::now();
    let b = Timestamp::now();
    assert!(a <= b);
}

#[test]
fn serde_is_transparent() {
    let ts = Timestamp::from_millis(42).unwrap();
    assert_eq!(serde_json::to_string(&ts).unwrap(), "42");
    let parsed: Timestamp = serde_json::from_str("42").unwrap();
    assert_eq!(parsed, ts);
}

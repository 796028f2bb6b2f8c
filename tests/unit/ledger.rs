use super::*;
use crate::storage::MemStorage;

fn entry(path: &str, ts: &str) -> LedgerEntry {
    LedgerEntry::new(path, Timestamp::parse(ts).unwrap())
}

#[test]
fn writes_four_space_nested_arrays() {
    let ledger = Ledger::new(vec![entry("v/preview_001.png", "2025-01-08T09:12:00.000Z")]);
    let json = String::from_utf8(ledger.to_json().unwrap()).unwrap();
    assert_eq!(
        json,
        "[\n    [\n        \"v/preview_001.png\",\n        \"2025-01-08T09:12:00.000Z\"\n    ]\n]"
    );
}

#[test]
fn empty_ledger_is_an_empty_array() {
    assert_eq!(Ledger::default().to_json().unwrap(), b"[]");
    assert!(Ledger::from_json(b"[]").unwrap().is_empty());
}

#[test]
fn round_trip_keeps_order_and_timestamp_text() {
    let ledger = Ledger::new(vec![
        entry("b.png", "2025-01-09T10:00:00.123456+02:00"),
        entry("a.png", "2025-01-08T23:59:59"),
    ]);
    let mut storage = MemStorage::new();
    let path = Path::new("meta.json");
    ledger.save(&mut storage, path).unwrap();

    let back = Ledger::load(&storage, path).unwrap();
    assert_eq!(back, ledger);
    assert_eq!(
        back.entries()[0].timestamp.as_str(),
        "2025-01-09T10:00:00.123456+02:00"
    );
}

#[test]
fn sorted_is_chronological_and_stable() {
    let ledger = Ledger::new(vec![
        entry("late.png", "2025-03-01T00:00:00Z"),
        entry("tie_first.png", "2025-02-01T00:00:00Z"),
        entry("early.png", "2025-01-01T00:00:00Z"),
        entry("tie_second.png", "2025-02-01T01:00:00+01:00"),
    ]);
    let names: Vec<_> = ledger
        .sorted()
        .into_iter()
        .map(|e| e.path.to_string_lossy().into_owned())
        .collect();
    assert_eq!(
        names,
        ["early.png", "tie_first.png", "tie_second.png", "late.png"]
    );
}

#[test]
fn malformed_timestamp_fails_to_load() {
    let err = Ledger::from_json(br#"[["a.png", "last tuesday"]]"#).unwrap_err();
    assert!(matches!(err, RevlapseError::Serde(_)));
}

#[test]
fn rejects_wrong_arity() {
    assert!(Ledger::from_json(br#"[["a.png"]]"#).is_err());
}

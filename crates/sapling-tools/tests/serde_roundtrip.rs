#![cfg(feature = "serde")]

use sapling_tools::{tags, TraceEvent, TraceLog};

#[test]
fn trace_log_serializes_as_plain_data() {
    let mut log = TraceLog::default();
    log.push(TraceEvent::new(3, tags::INVALIDATED).with_a(1).with_b(0));

    let json = serde_json::to_string(&log).expect("serialize");
    assert!(json.contains("bt.invalidated"));

    let back: TraceLog = serde_json::from_str(&json).expect("deserialize");
    assert_eq!(back, log);
}

use atr_core::JsonlChannelWriter;
use chrono::Utc;
use serde_json::{json, Value};

/// Appends one line to the audit log. Every mutating facade method calls
/// this before returning, win or lose — a failed mutation that raised
/// partway through is still worth a trail.
pub fn record(writer: &JsonlChannelWriter, asf_uid: &str, action: &str, detail: Value) {
    writer.send(json!({
        "datetime": Utc::now().to_rfc3339(),
        "asf_uid": asf_uid,
        "action": action,
        "detail": detail,
    }));
}

use crate::store::StudentRecord;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Payload carried inside a QR code, as a JSON document discriminated
/// by its `type` field. These shapes are the wire contract shared with
/// the recognition backends.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum QrPayload {
    StudentId {
        student_id: Uuid,
        student_name: String,
        timestamp: DateTime<Utc>,
    },
    AttendanceSession {
        session_id: String,
        session_name: String,
        class_id: String,
        timestamp: DateTime<Utc>,
        expires_at: DateTime<Utc>,
    },
}

impl QrPayload {
    /// Identity payload for an enrolled student, stamped now.
    pub fn for_student(record: &StudentRecord) -> Self {
        QrPayload::StudentId {
            student_id: record.id,
            student_name: record.display_name.clone(),
            timestamp: Utc::now(),
        }
    }

    /// New attendance session expiring after `duration_hours`. The
    /// session id is derived from the creation timestamp.
    pub fn new_session(session_name: &str, class_id: &str, duration_hours: i64) -> Self {
        let created_at = Utc::now();
        QrPayload::AttendanceSession {
            session_id: format!("session_{}", created_at.timestamp()),
            session_name: session_name.to_string(),
            class_id: class_id.to_string(),
            timestamp: created_at,
            expires_at: created_at + Duration::hours(duration_hours),
        }
    }

    /// Session payloads expire; student identity payloads never do.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        match self {
            QrPayload::StudentId { .. } => false,
            QrPayload::AttendanceSession { expires_at, .. } => now > *expires_at,
        }
    }
}

pub fn encode(payload: &QrPayload) -> String {
    // Both variants serialize infallibly: string keys, no non-string maps.
    serde_json::to_string(payload).unwrap_or_default()
}

/// Decode a scanned payload. Anything that is not valid JSON, or whose
/// `type` is not a known kind, is unparseable rather than an error.
pub fn decode(raw: &str) -> Option<QrPayload> {
    serde_json::from_str(raw).ok()
}

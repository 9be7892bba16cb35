use crate::error::StoreError;
use crate::matcher;
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use log::debug;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StudentRecord {
    pub id: Uuid,
    pub display_name: String,
    /// External unique business key, distinct from `id`.
    pub roll_number: String,
    pub email: Option<String>,
    pub class_label: Option<String>,
    pub section_label: Option<String>,
    /// Present only after enrollment. A record without one is never
    /// returned by descriptor lookup.
    pub face_descriptor: Option<Vec<f32>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input fields for [`IdentityStore::add_student`].
#[derive(Debug, Clone, Default)]
pub struct NewStudent {
    pub display_name: String,
    pub roll_number: String,
    pub email: Option<String>,
    pub class_label: Option<String>,
    pub section_label: Option<String>,
}

/// Partial update; only supplied fields are overwritten.
#[derive(Debug, Clone, Default)]
pub struct StudentUpdate {
    pub display_name: Option<String>,
    pub email: Option<String>,
    pub class_label: Option<String>,
    pub section_label: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttendanceMethod {
    Face,
    Qr,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttendanceStatus {
    Present,
    /// Reserved for future policy; the store only produces `Present`.
    Absent,
    Late,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttendanceEvent {
    pub id: Uuid,
    /// Back-reference only; deleting the student leaves this dangling.
    pub student_id: Uuid,
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub method: AttendanceMethod,
    /// Present only for face-method events.
    pub confidence: Option<f32>,
    pub status: AttendanceStatus,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AttendanceStats {
    pub total: usize,
    pub present: usize,
    pub absent: usize,
    pub percentage: f32,
}

/// Result of a descriptor match.
#[derive(Debug, Clone)]
pub struct FaceMatch {
    pub record: StudentRecord,
    pub distance: f32,
    pub confidence: f32,
}

/// Authoritative in-memory set of students plus the append-only log of
/// attendance events. Single-threaded synchronous semantics: every
/// mutation takes `&mut self`, so a shared store must be wrapped in a
/// `Mutex` by multithreaded hosts.
#[derive(Debug, Default)]
pub struct IdentityStore {
    students: Vec<StudentRecord>,
    attendance: Vec<AttendanceEvent>,
    dedup_same_day: bool,
}

impl IdentityStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// When enabled, a second same-day check-in for a student returns
    /// the existing event instead of appending a duplicate.
    pub fn with_dedup(dedup_same_day: bool) -> Self {
        Self {
            dedup_same_day,
            ..Self::default()
        }
    }

    pub fn add_student(&mut self, fields: NewStudent) -> Result<StudentRecord, StoreError> {
        if fields.display_name.trim().is_empty() {
            return Err(StoreError::EmptyField("display_name"));
        }
        if fields.roll_number.trim().is_empty() {
            return Err(StoreError::EmptyField("roll_number"));
        }
        if self.students.iter().any(|s| s.roll_number == fields.roll_number) {
            return Err(StoreError::DuplicateKey(fields.roll_number));
        }

        let now = Utc::now();
        let record = StudentRecord {
            id: Uuid::new_v4(),
            display_name: fields.display_name,
            roll_number: fields.roll_number,
            email: fields.email,
            class_label: fields.class_label,
            section_label: fields.section_label,
            face_descriptor: None,
            created_at: now,
            updated_at: now,
        };
        self.students.push(record.clone());
        Ok(record)
    }

    pub fn update_student(
        &mut self,
        id: Uuid,
        fields: StudentUpdate,
    ) -> Result<StudentRecord, StoreError> {
        let record = self
            .students
            .iter_mut()
            .find(|s| s.id == id)
            .ok_or(StoreError::NotFound(id))?;

        if let Some(name) = fields.display_name {
            record.display_name = name;
        }
        if let Some(email) = fields.email {
            record.email = Some(email);
        }
        if let Some(class) = fields.class_label {
            record.class_label = Some(class);
        }
        if let Some(section) = fields.section_label {
            record.section_label = Some(section);
        }
        record.updated_at = Utc::now();
        Ok(record.clone())
    }

    /// Returns false (not an error) when the id is unknown. Attendance
    /// events referencing the student are left untouched.
    pub fn delete_student(&mut self, id: Uuid) -> bool {
        let before = self.students.len();
        self.students.retain(|s| s.id != id);
        self.students.len() != before
    }

    pub fn student(&self, id: Uuid) -> Option<&StudentRecord> {
        self.students.iter().find(|s| s.id == id)
    }

    pub fn student_by_roll(&self, roll_number: &str) -> Option<&StudentRecord> {
        self.students.iter().find(|s| s.roll_number == roll_number)
    }

    /// Snapshot of all records in insertion order; later mutation of
    /// the store does not affect it.
    pub fn list_students(&self) -> Vec<StudentRecord> {
        self.students.clone()
    }

    /// Case-insensitive substring match over name, roll number and
    /// email, in insertion order.
    pub fn search_students(&self, query: &str) -> Vec<StudentRecord> {
        let needle = query.to_lowercase();
        self.students
            .iter()
            .filter(|s| {
                s.display_name.to_lowercase().contains(&needle)
                    || s.roll_number.to_lowercase().contains(&needle)
                    || s.email
                        .as_deref()
                        .is_some_and(|e| e.to_lowercase().contains(&needle))
            })
            .cloned()
            .collect()
    }

    /// Attaches or replaces the face descriptor. Length is not
    /// validated here; mismatched descriptors simply never match.
    pub fn set_face_descriptor(
        &mut self,
        id: Uuid,
        descriptor: Vec<f32>,
    ) -> Result<StudentRecord, StoreError> {
        let record = self
            .students
            .iter_mut()
            .find(|s| s.id == id)
            .ok_or(StoreError::NotFound(id))?;
        record.face_descriptor = Some(descriptor);
        record.updated_at = Utc::now();
        Ok(record.clone())
    }

    /// Linear scan over every enrolled descriptor; acceptable at
    /// classroom scale, no indexing.
    pub fn match_by_descriptor(&self, probe: &[f32], threshold: Option<f32>) -> Option<FaceMatch> {
        let threshold = threshold.unwrap_or(matcher::DEFAULT_THRESHOLD);
        let (idx, distance) = matcher::best_match(&self.students, probe, threshold)?;
        Some(FaceMatch {
            record: self.students[idx].clone(),
            distance,
            confidence: matcher::confidence(distance),
        })
    }

    pub fn record_attendance(
        &mut self,
        student_id: Uuid,
        method: AttendanceMethod,
        confidence: Option<f32>,
    ) -> Result<AttendanceEvent, StoreError> {
        if self.student(student_id).is_none() {
            return Err(StoreError::NotFound(student_id));
        }

        let now = Utc::now();
        let date = now.date_naive();

        if self.dedup_same_day {
            if let Some(existing) = self
                .attendance
                .iter()
                .find(|e| e.student_id == student_id && e.date == date)
            {
                debug!("attendance already recorded for {} on {}", student_id, date);
                return Ok(existing.clone());
            }
        }

        let event = AttendanceEvent {
            id: Uuid::new_v4(),
            student_id,
            date,
            time: now.time(),
            method,
            confidence,
            status: AttendanceStatus::Present,
        };
        self.attendance.push(event.clone());
        Ok(event)
    }

    pub fn attendance_for_date(&self, date: NaiveDate) -> Vec<AttendanceEvent> {
        self.attendance
            .iter()
            .filter(|e| e.date == date)
            .cloned()
            .collect()
    }

    pub fn attendance_for_student(&self, student_id: Uuid) -> Vec<AttendanceEvent> {
        self.attendance
            .iter()
            .filter(|e| e.student_id == student_id)
            .cloned()
            .collect()
    }

    /// Serializable image of the current state.
    pub fn snapshot(&self) -> crate::snapshot::Snapshot {
        crate::snapshot::Snapshot {
            students: self.students.clone(),
            attendance: self.attendance.clone(),
        }
    }

    /// Rebuild a store from a previously saved snapshot. Snapshots were
    /// written by a store that already enforced the invariants, so no
    /// re-validation happens here.
    pub fn restore(snapshot: crate::snapshot::Snapshot, dedup_same_day: bool) -> Self {
        Self {
            students: snapshot.students,
            attendance: snapshot.attendance,
            dedup_same_day,
        }
    }

    /// `total` is the current student count, not a historical one.
    pub fn attendance_stats(&self, date: Option<NaiveDate>) -> AttendanceStats {
        let date = date.unwrap_or_else(|| Utc::now().date_naive());
        let total = self.students.len();
        let present = self.attendance.iter().filter(|e| e.date == date).count();
        let percentage = if total == 0 {
            0.0
        } else {
            present as f32 / total as f32 * 100.0
        };
        AttendanceStats {
            total,
            present,
            absent: total.saturating_sub(present),
            percentage,
        }
    }
}

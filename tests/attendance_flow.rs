use anyhow::Result;
use rollcall::{qr, snapshot, AttendanceMethod, IdentityStore, NewStudent};

fn register(store: &mut IdentityStore, name: &str, roll: &str) -> Result<uuid::Uuid> {
    let record = store.add_student(NewStudent {
        display_name: name.to_string(),
        roll_number: roll.to_string(),
        email: Some(format!("{roll}@example.edu")),
        class_label: Some("CS101".to_string()),
        section_label: None,
    })?;
    Ok(record.id)
}

#[test]
fn test_enroll_match_checkin_flow() -> Result<()> {
    let mut store = IdentityStore::new();

    let asha = register(&mut store, "Asha Rao", "R-01")?;
    let bela = register(&mut store, "Bela Iyer", "R-02")?;
    register(&mut store, "Chen Wu", "R-03")?;

    store.set_face_descriptor(asha, vec![0.1, 0.2, 0.3, 0.4])?;
    store.set_face_descriptor(bela, vec![0.9, 0.8, 0.7, 0.6])?;

    // Probe near Asha's descriptor.
    let m = store
        .match_by_descriptor(&[0.12, 0.21, 0.29, 0.41], None)
        .expect("probe should match the nearest enrolled face");
    assert_eq!(m.record.id, asha);
    assert!(m.distance < 0.6);

    let event = store.record_attendance(m.record.id, AttendanceMethod::Face, Some(m.confidence))?;
    assert_eq!(event.student_id, asha);
    assert!(event.confidence.is_some());

    // Bela checks in by QR payload.
    let payload = qr::encode(&qr::QrPayload::for_student(
        store.student(bela).expect("bela exists"),
    ));
    let decoded = qr::decode(&payload).expect("our own payload decodes");
    let qr::QrPayload::StudentId { student_id, .. } = decoded else {
        panic!("expected a student payload");
    };
    let event = store.record_attendance(student_id, AttendanceMethod::Qr, None)?;
    assert!(event.confidence.is_none());

    let stats = store.attendance_stats(None);
    assert_eq!(stats.total, 3);
    assert_eq!(stats.present, 2);
    assert_eq!(stats.absent, 1);
    assert!((stats.percentage - 66.666_67).abs() < 0.01);

    Ok(())
}

#[test]
fn test_snapshot_round_trip() -> Result<()> {
    let dir = std::env::temp_dir().join(format!("rollcall-test-{}", uuid::Uuid::new_v4()));
    let path = dir.join("store.bin");

    let mut store = IdentityStore::new();
    let asha = register(&mut store, "Asha Rao", "R-01")?;
    store.set_face_descriptor(asha, vec![0.5; 128])?;
    store.record_attendance(asha, AttendanceMethod::Face, Some(0.91))?;

    snapshot::save(&store, &path)?;
    let restored = snapshot::load(&path, false)?;

    let record = restored
        .student_by_roll("R-01")
        .expect("record survives the round trip");
    assert_eq!(record.id, asha);
    assert_eq!(record.face_descriptor.as_deref().map(<[f32]>::len), Some(128));
    assert_eq!(restored.attendance_for_student(asha).len(), 1);

    // Matching still works against the restored descriptors.
    assert!(restored.match_by_descriptor(&[0.5; 128], None).is_some());

    std::fs::remove_dir_all(&dir).ok();
    Ok(())
}

#[test]
fn test_missing_snapshot_loads_empty() -> Result<()> {
    let path = std::env::temp_dir().join(format!("rollcall-none-{}/store.bin", uuid::Uuid::new_v4()));
    let store = snapshot::load(&path, false)?;
    assert!(store.list_students().is_empty());
    Ok(())
}

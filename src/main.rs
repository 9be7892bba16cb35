use std::env;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use log::{info, warn};
use rollcall::{config, qr, snapshot, AttendanceMethod, IdentityStore, NewStudent, StudentUpdate};
use uuid::Uuid;

#[derive(Parser)]
#[command(name = "rollcall")]
#[command(
    version,
    about = "Classroom attendance with face-descriptor matching and QR check-in"
)]
struct Cli {
    /// Path to the store snapshot (defaults to the user data dir)
    #[arg(long, global = true)]
    store: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Register a new student
    Add {
        /// Display name
        #[arg(short, long)]
        name: String,
        /// Roll number (unique)
        #[arg(short, long)]
        roll: String,
        #[arg(short, long)]
        email: Option<String>,
        #[arg(short, long)]
        class: Option<String>,
        #[arg(short, long)]
        section: Option<String>,
    },
    /// List all registered students
    List,
    /// Search students by name, roll number or email
    Search { query: String },
    /// Update a student's details
    Update {
        /// Student id
        id: Uuid,
        #[arg(short, long)]
        name: Option<String>,
        #[arg(short, long)]
        email: Option<String>,
        #[arg(short, long)]
        class: Option<String>,
        #[arg(short, long)]
        section: Option<String>,
    },
    /// Remove a student (attendance history is kept)
    Remove {
        /// Student id
        id: Uuid,
    },
    /// Attach a face descriptor to a student
    Enroll {
        /// Student roll number
        #[arg(short, long)]
        roll: String,
        /// JSON file holding the descriptor vector
        #[arg(short, long)]
        descriptor: PathBuf,
    },
    /// Identify the student nearest to a probe descriptor
    Identify {
        /// JSON file holding the probe vector
        #[arg(short, long)]
        descriptor: PathBuf,
        /// Override the configured match threshold
        #[arg(short, long)]
        threshold: Option<f32>,
    },
    /// Identify a student and record their attendance
    Checkin {
        /// JSON file holding the probe vector
        #[arg(short, long)]
        descriptor: PathBuf,
        #[arg(short, long)]
        threshold: Option<f32>,
    },
    /// Attendance report for a date (defaults to today)
    Report {
        /// Date as YYYY-MM-DD
        #[arg(short, long)]
        date: Option<NaiveDate>,
    },
    /// Generate or decode QR payloads
    #[command(subcommand)]
    Qr(QrCommands),
    /// Delete the store snapshot
    Purge,
    /// Open config file in editor
    Config,
}

#[derive(Subcommand)]
enum QrCommands {
    /// Print the identity payload for a student
    Student {
        /// Student roll number
        #[arg(short, long)]
        roll: String,
    },
    /// Print a new attendance-session payload
    Session {
        /// Session name
        #[arg(short, long)]
        name: String,
        /// Class identifier
        #[arg(short, long)]
        class: String,
        /// Hours until the session expires
        #[arg(long, default_value_t = 24)]
        hours: i64,
    },
    /// Decode a scanned payload and record attendance when it names a student
    Scan {
        /// Raw payload text
        payload: String,
    },
}

fn main() -> Result<()> {
    env_logger::builder()
        .filter_level(log::LevelFilter::Info)
        .format_target(false)
        .format_timestamp(None)
        .init();

    let cli = Cli::parse();
    let cfg = config::load_config(None)?;

    let store_path = match cli.store {
        Some(p) => p,
        None => snapshot::default_path()?,
    };
    let mut store = snapshot::load(&store_path, cfg.dedup_same_day)
        .context("Failed to load store snapshot")?;

    match cli.command {
        Commands::Add {
            name,
            roll,
            email,
            class,
            section,
        } => {
            let record = store.add_student(NewStudent {
                display_name: name,
                roll_number: roll,
                email,
                class_label: class,
                section_label: section,
            })?;
            snapshot::save(&store, &store_path)?;
            info!("✓ Registered {} ({})", record.display_name, record.roll_number);
            info!("  id: {}", record.id);
            Ok(())
        }
        Commands::List => {
            print_students(&store.list_students());
            Ok(())
        }
        Commands::Search { query } => {
            let hits = store.search_students(&query);
            if hits.is_empty() {
                info!("No students match '{}'", query);
            } else {
                print_students(&hits);
            }
            Ok(())
        }
        Commands::Update {
            id,
            name,
            email,
            class,
            section,
        } => {
            let record = store.update_student(
                id,
                StudentUpdate {
                    display_name: name,
                    email,
                    class_label: class,
                    section_label: section,
                },
            )?;
            snapshot::save(&store, &store_path)?;
            info!("✓ Updated {} ({})", record.display_name, record.roll_number);
            Ok(())
        }
        Commands::Remove { id } => {
            if store.delete_student(id) {
                snapshot::save(&store, &store_path)?;
                info!("✓ Removed student {}", id);
            } else {
                warn!("No student with id {}", id);
            }
            Ok(())
        }
        Commands::Enroll { roll, descriptor } => {
            let vector = read_descriptor(&descriptor)?;
            let id = store
                .student_by_roll(&roll)
                .with_context(|| format!("no student with roll number {roll}"))?
                .id;
            let record = store.set_face_descriptor(id, vector)?;
            snapshot::save(&store, &store_path)?;
            info!("✓ Face enrolled for {} ({})", record.display_name, record.roll_number);
            Ok(())
        }
        Commands::Identify { descriptor, threshold } => {
            let probe = read_descriptor(&descriptor)?;
            match store.match_by_descriptor(&probe, threshold.or(Some(cfg.threshold))) {
                Some(m) => {
                    info!(
                        "✓ Matched {} ({}) distance {:.3} confidence {:.3}",
                        m.record.display_name, m.record.roll_number, m.distance, m.confidence
                    );
                }
                None => warn!("No matching student"),
            }
            Ok(())
        }
        Commands::Checkin { descriptor, threshold } => {
            let probe = read_descriptor(&descriptor)?;
            let Some(m) = store.match_by_descriptor(&probe, threshold.or(Some(cfg.threshold)))
            else {
                anyhow::bail!("No matching student; attendance not recorded");
            };
            let event = store.record_attendance(
                m.record.id,
                AttendanceMethod::Face,
                Some(m.confidence),
            )?;
            snapshot::save(&store, &store_path)?;
            info!(
                "✓ {} ({}) marked present at {} (confidence {:.3})",
                m.record.display_name, m.record.roll_number, event.time.format("%H:%M:%S"), m.confidence
            );
            Ok(())
        }
        Commands::Report { date } => {
            let stats = store.attendance_stats(date);
            info!(
                "Attendance: {}/{} present ({:.1}%), {} absent",
                stats.present, stats.total, stats.percentage, stats.absent
            );
            for event in store.attendance_for_date(date.unwrap_or_else(today)) {
                let name = store
                    .student(event.student_id)
                    .map(|s| s.display_name.clone())
                    .unwrap_or_else(|| event.student_id.to_string());
                info!(
                    "  {} {} via {:?}{}",
                    event.time.format("%H:%M:%S"),
                    name,
                    event.method,
                    event
                        .confidence
                        .map(|c| format!(" ({c:.3})"))
                        .unwrap_or_default()
                );
            }
            Ok(())
        }
        Commands::Qr(cmd) => run_qr(cmd, &mut store, &store_path),
        Commands::Purge => {
            snapshot::purge(&store_path).context("Failed to purge store snapshot")?;
            info!("✓ Store snapshot removed");
            Ok(())
        }
        Commands::Config => open_config(),
    }
}

fn run_qr(cmd: QrCommands, store: &mut IdentityStore, store_path: &Path) -> Result<()> {
    match cmd {
        QrCommands::Student { roll } => {
            let record = store
                .student_by_roll(&roll)
                .with_context(|| format!("no student with roll number {roll}"))?;
            println!("{}", qr::encode(&qr::QrPayload::for_student(record)));
            Ok(())
        }
        QrCommands::Session { name, class, hours } => {
            println!("{}", qr::encode(&qr::QrPayload::new_session(&name, &class, hours)));
            Ok(())
        }
        QrCommands::Scan { payload } => {
            let Some(decoded) = qr::decode(&payload) else {
                anyhow::bail!("Unparseable QR payload");
            };
            if decoded.is_expired(chrono::Utc::now()) {
                anyhow::bail!("This QR code has expired");
            }
            match decoded {
                qr::QrPayload::StudentId { student_id, .. } => {
                    let event = store.record_attendance(student_id, AttendanceMethod::Qr, None)?;
                    snapshot::save(store, store_path)?;
                    let name = store
                        .student(student_id)
                        .map(|s| s.display_name.clone())
                        .unwrap_or_default();
                    info!(
                        "✓ {} marked present at {}",
                        name,
                        event.time.format("%H:%M:%S")
                    );
                }
                qr::QrPayload::AttendanceSession {
                    session_name,
                    class_id,
                    expires_at,
                    ..
                } => {
                    info!(
                        "Session '{}' for {} is active until {}",
                        session_name, class_id, expires_at
                    );
                }
            }
            Ok(())
        }
    }
}

fn print_students(records: &[rollcall::StudentRecord]) {
    info!("{} student(s)", records.len());
    for s in records {
        info!(
            "  {}  {}  {}{}",
            s.roll_number,
            s.display_name,
            if s.face_descriptor.is_some() {
                "[enrolled]"
            } else {
                "[not enrolled]"
            },
            s.email.as_deref().map(|e| format!("  {e}")).unwrap_or_default()
        );
    }
}

/// Descriptor files are JSON arrays of numbers, the shape the
/// recognition backend emits.
fn read_descriptor(path: &Path) -> Result<Vec<f32>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("reading descriptor {}", path.display()))?;
    let vector: Vec<f32> = serde_json::from_str(&raw)
        .with_context(|| format!("parsing descriptor {}", path.display()))?;
    if vector.is_empty() {
        warn!(
            "Descriptor {} is empty; it will only match other empty descriptors",
            path.display()
        );
    }
    Ok(vector)
}

fn today() -> NaiveDate {
    chrono::Utc::now().date_naive()
}

fn open_config() -> Result<()> {
    let config_path = config::CONFIG_PATH.as_os_str();
    let editor = env::var("EDITOR").unwrap_or_else(|_| "vi".to_string());

    info!("Opening config file: {:?}", config_path);

    let status = std::process::Command::new(editor)
        .arg(config_path)
        .status()
        .context("Failed to open editor")?;

    if !status.success() {
        anyhow::bail!("Editor exited with non-zero status");
    }

    Ok(())
}

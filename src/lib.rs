pub mod config;
pub mod error;
pub mod matcher;
pub mod qr;
pub mod snapshot;
pub mod store;

pub use error::StoreError;
pub use store::{
    AttendanceEvent, AttendanceMethod, AttendanceStats, AttendanceStatus, FaceMatch,
    IdentityStore, NewStudent, StudentRecord, StudentUpdate,
};

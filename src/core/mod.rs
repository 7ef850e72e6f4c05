pub mod detect;
pub mod error;
pub mod identity;
pub mod status;

pub use error::{Result, SyncError};
pub use identity::RecordId;
pub use status::{EditorPhase, SaveErrorKind, SaveStatus, StatusTracker};

//! Image uploads: the imgbb host client and the upload-then-attach
//! orchestration used by the UI.

pub mod attach;
pub mod host;

pub use attach::{progress_channel, AttachReport, Uploader};
pub use host::{ImageFile, ImageHostClient, UploadOutcome};

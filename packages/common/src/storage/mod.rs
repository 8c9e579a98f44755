mod error;
mod filename;
mod traits;

pub mod local;

pub use error::StorageError;
pub use filename::{FilenameError, MAX_FILENAME_LEN, validate_upload_filename};
pub use local::LocalFileStore;
pub use traits::FileStore;

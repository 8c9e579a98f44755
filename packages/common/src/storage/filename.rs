use thiserror::Error;

/// Longest filename accepted by the upload store, in bytes.
pub const MAX_FILENAME_LEN: usize = 255;

/// Reasons a client-supplied filename is rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum FilenameError {
    #[error("filename cannot be empty")]
    Empty,
    #[error("filename exceeds {MAX_FILENAME_LEN} bytes")]
    TooLong,
    #[error("path separators are not allowed")]
    ContainsPathSeparator,
    #[error("'..' is not allowed")]
    PathTraversal,
    #[error("null bytes are not allowed")]
    NullByte,
    #[error("hidden files (starting with '.') are not allowed")]
    Hidden,
    #[error("control characters are not allowed")]
    ControlCharacter,
}

/// Validates a flat upload filename and returns it trimmed.
///
/// Uploads are stored under their original name directly inside the upload
/// directory, so anything that could escape it or collide with dotfiles is
/// refused.
pub fn validate_upload_filename(filename: &str) -> Result<&str, FilenameError> {
    let trimmed = filename.trim();

    if trimmed.is_empty() {
        return Err(FilenameError::Empty);
    }

    if trimmed.len() > MAX_FILENAME_LEN {
        return Err(FilenameError::TooLong);
    }

    if trimmed.contains('\0') {
        return Err(FilenameError::NullByte);
    }

    // CRLF would otherwise leak into Content-Disposition when serving.
    if trimmed.chars().any(|c| c.is_ascii_control()) {
        return Err(FilenameError::ControlCharacter);
    }

    if trimmed.contains('/') || trimmed.contains('\\') {
        return Err(FilenameError::ContainsPathSeparator);
    }

    if trimmed == ".." {
        return Err(FilenameError::PathTraversal);
    }

    if trimmed.starts_with('.') {
        return Err(FilenameError::Hidden);
    }

    Ok(trimmed)
}

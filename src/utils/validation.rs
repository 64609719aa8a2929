use crate::models::FileUpload;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub code: &'static str,
    pub message: String,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

impl std::error::Error for ValidationError {}

/// Validates file size against maximum limit
pub fn validate_file_size(size: usize, max_size: usize) -> Result<(), ValidationError> {
    if size > max_size {
        return Err(ValidationError {
            code: "FILE_TOO_LARGE",
            message: format!(
                "File size {} bytes exceeds maximum allowed {} bytes ({} MB)",
                size,
                max_size,
                max_size / 1024 / 1024
            ),
        });
    }
    Ok(())
}

fn normalized_mime(content_type: &str) -> String {
    content_type
        .split(';')
        .next()
        .unwrap_or("")
        .trim()
        .to_lowercase()
}

fn has_extension(file_name: &str, wanted: &str) -> bool {
    Path::new(file_name)
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case(wanted))
}

/// Song picker accepts `.mp3` files. A declared `audio/mpeg` (or `audio/mp3`)
/// type is taken as equivalent for clients that strip the extension.
pub fn validate_song_file(file: &FileUpload, max_size: usize) -> Result<(), ValidationError> {
    validate_file_size(file.size(), max_size)?;

    let declared = file
        .content_type
        .as_deref()
        .map(normalized_mime)
        .unwrap_or_default();

    if has_extension(&file.file_name, "mp3") || declared == "audio/mpeg" || declared == "audio/mp3"
    {
        return Ok(());
    }

    Err(ValidationError {
        code: "INVALID_SONG_FILE",
        message: format!("'{}' is not an .mp3 file", file.file_name),
    })
}

/// Image picker accepts any `image/*` type.
pub fn validate_image_file(file: &FileUpload, max_size: usize) -> Result<(), ValidationError> {
    validate_file_size(file.size(), max_size)?;

    let content_type = normalized_mime(&file.resolved_content_type());
    let is_image = content_type
        .parse::<mime::Mime>()
        .is_ok_and(|m| m.type_() == mime::IMAGE);

    if is_image {
        return Ok(());
    }

    Err(ValidationError {
        code: "INVALID_IMAGE_FILE",
        message: format!(
            "'{}' has type '{}', only images are accepted",
            file.file_name, content_type
        ),
    })
}

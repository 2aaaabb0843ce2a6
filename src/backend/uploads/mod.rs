//! Uploads Module
//!
//! `POST /api/uploads` (bearer): one multipart field named `file`, stored
//! as `<upload_dir>/<user_id>/<uuid>.<ext>` and served back under
//! `/uploads/`.
//!
//! - Allowed extensions: jpg, jpeg, png, webp, pdf
//! - Larger than `UPLOAD_MAX_BYTES`: `413 Payload Too Large`

pub mod handlers;

pub use handlers::{upload_file, UploadedFile};

/// Lower-case extensions accepted by the upload endpoint
pub const ALLOWED_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "webp", "pdf"];

/// Lower-cased extension of `file_name` when it is on the allow-list
pub fn allowed_extension(file_name: &str) -> Option<String> {
    let (stem, extension) = file_name.rsplit_once('.')?;
    if stem.is_empty() {
        return None;
    }
    let extension = extension.to_ascii_lowercase();
    ALLOWED_EXTENSIONS
        .contains(&extension.as_str())
        .then_some(extension)
}

/// Final path component of a client-supplied file name
pub fn base_name(file_name: &str) -> &str {
    file_name
        .rsplit(|c| c == '/' || c == '\\')
        .next()
        .unwrap_or(file_name)
        .trim()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allowed_extension() {
        assert_eq!(allowed_extension("photo.JPG").as_deref(), Some("jpg"));
        assert_eq!(allowed_extension("scan.final.pdf").as_deref(), Some("pdf"));
        assert_eq!(allowed_extension("script.sh"), None);
        assert_eq!(allowed_extension("noextension"), None);
        assert_eq!(allowed_extension(".png"), None);
    }

    #[test]
    fn test_base_name_strips_directories() {
        assert_eq!(base_name("../../etc/passwd.png"), "passwd.png");
        assert_eq!(base_name("C:\\Users\\a\\car.webp"), "car.webp");
        assert_eq!(base_name("car.webp"), "car.webp");
    }
}

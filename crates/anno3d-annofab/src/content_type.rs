use std::path::Path;

/// Content type used when nothing better is known.
pub const OCTET_STREAM: &str = "application/octet-stream";

/// Generated metadata files, unknown to the MIME database.
const TEXT_EXTENSIONS: [&str; 2] = ["meta", "calib"];

/// Guess the content type of a file from its extension.
///
/// Example:
///
/// ```
/// use anno3d_annofab::content_type::guess_content_type;
///
/// assert_eq!(guess_content_type("image_2/000000.png"), "image/png");
/// assert_eq!(guess_content_type("velodyne/000000.bin"), "application/octet-stream");
/// ```
pub fn guess_content_type(path: impl AsRef<Path>) -> &'static str {
    let path = path.as_ref();

    let extension = path
        .extension()
        .map(|ext| ext.to_string_lossy().to_ascii_lowercase());
    if extension
        .as_deref()
        .is_some_and(|ext| TEXT_EXTENSIONS.contains(&ext))
    {
        return "text/plain";
    }

    mime_guess2::from_path(path).first_raw().unwrap_or(OCTET_STREAM)
}

//! # Upload Storage
//!
//! Multipart file bytes land on disk under the configured upload directory;
//! only the relative path is recorded on the database row. Files are keyed
//! by a fresh UUID so client-supplied names never touch the filesystem,
//! except for the extension, which is kept (sanitized) so the files stay
//! openable.

use std::path::Path;

use tokio::fs;
use uuid::Uuid;

/// Longest extension we keep; anything stranger is dropped.
const MAX_EXTENSION_LEN: usize = 8;

/// Extracts a safe, lowercase extension from a client filename.
fn safe_extension(original_name: Option<&str>) -> Option<String> {
    let name = original_name?;
    let ext = Path::new(name).extension()?.to_str()?;
    if ext.is_empty() || ext.len() > MAX_EXTENSION_LEN {
        return None;
    }
    if !ext.chars().all(|c| c.is_ascii_alphanumeric()) {
        return None;
    }
    Some(ext.to_ascii_lowercase())
}

/// Writes uploaded bytes under `<upload_dir>/<subdir>/` and returns the
/// relative path to record on the row, e.g. `prescriptions/3f2a….jpg`.
pub async fn save_upload(
    upload_dir: &Path,
    subdir: &str,
    original_name: Option<&str>,
    bytes: &[u8],
) -> std::io::Result<String> {
    let target_dir = upload_dir.join(subdir);
    fs::create_dir_all(&target_dir).await?;

    let file_name = match safe_extension(original_name) {
        Some(ext) => format!("{}.{}", Uuid::new_v4(), ext),
        None => Uuid::new_v4().to_string(),
    };

    fs::write(target_dir.join(&file_name), bytes).await?;
    Ok(format!("{subdir}/{file_name}"))
}

// =============================================================================
// Unit Tests
// =============================================================================

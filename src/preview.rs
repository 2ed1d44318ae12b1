//! Live preview: the generated HTML written to disk so a browser can open it.

use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};

/// `{dir}/preview-YYYYMMDD-HHMMSS.html`
pub fn timestamped_path(dir: &Path, now: DateTime<Utc>) -> PathBuf {
    dir.join(format!("preview-{}.html", now.format("%Y%m%d-%H%M%S")))
}

/// Write `html` to `path`, creating parent directories. Returns the path written.
pub fn write_preview(path: &Path, html: &str) -> Result<PathBuf, String> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .map_err(|e| format!("Failed to create preview directory {}: {e}", parent.display()))?;
    }
    std::fs::write(path, html)
        .map_err(|e| format!("Failed to write preview {}: {e}", path.display()))?;
    tracing::info!("preview written to {}", path.display());
    Ok(path.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tempfile::TempDir;

    #[test]
    fn timestamped_name() {
        let now = Utc.with_ymd_and_hms(2026, 3, 7, 9, 5, 1).unwrap();
        let path = timestamped_path(Path::new("/tmp/previews"), now);
        assert_eq!(path, PathBuf::from("/tmp/previews/preview-20260307-090501.html"));
    }

    #[test]
    fn writes_into_new_directory() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("page.html");
        let written = write_preview(&path, "<h1>Hi</h1>").unwrap();
        assert_eq!(written, path);
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "<h1>Hi</h1>");
    }
}

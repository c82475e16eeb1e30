//! The download side of an export.
//!
//! A front-end shows a download action only when the latest conversion
//! succeeded; otherwise it shows why it failed. [`ExportState`] encodes that
//! rule so every front-end (the bundled CLI included) gets it right the same
//! way: a [`Download`] can only be obtained from a successful result.

use crate::convert::PdfBytes;
use crate::error::Md2PdfError;
use crate::filename::{default_file_name_today, normalize_file_name};
use std::path::{Path, PathBuf};
use tracing::debug;

/// MIME type attached to every download.
pub const PDF_MIME: &str = "application/pdf";

/// Everything a download action needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Download {
    pub data: PdfBytes,
    /// Normalized; always ends in `.pdf`.
    pub file_name: String,
    pub mime: &'static str,
}

/// What the export panel should show after a conversion.
#[derive(Debug, Clone)]
pub enum ExportState {
    /// Conversion succeeded; the download action is enabled.
    Ready(Download),
    /// Conversion failed; no download, show `message` instead.
    Failed { message: String },
}

impl ExportState {
    /// Build the state from a conversion result and the requested file name.
    ///
    /// `default_name` replaces a blank `requested_name`. An empty PDF counts
    /// as a failure.
    pub fn from_result(
        result: Result<PdfBytes, Md2PdfError>,
        requested_name: &str,
        default_name: &str,
    ) -> Self {
        match result {
            Ok(data) if data.is_empty() => ExportState::Failed {
                message: "Could not generate PDF: the renderer produced no output".to_string(),
            },
            Ok(data) => ExportState::Ready(Download {
                data,
                file_name: normalize_file_name(requested_name, default_name),
                mime: PDF_MIME,
            }),
            Err(e) => ExportState::Failed {
                message: format!("Could not generate PDF: {}", e.reason()),
            },
        }
    }

    /// The download, if the action should be enabled.
    pub fn download(&self) -> Option<&Download> {
        match self {
            ExportState::Ready(d) => Some(d),
            ExportState::Failed { .. } => None,
        }
    }

    /// The error text to display, if any.
    pub fn error_message(&self) -> Option<&str> {
        match self {
            ExportState::Ready(_) => None,
            ExportState::Failed { message } => Some(message),
        }
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, ExportState::Ready(_))
    }
}

/// Apply the export file-name rules to a filesystem path.
///
/// An existing directory (or an empty path) gets today's default name; any
/// other path keeps its parent and has its last component normalized.
pub fn resolve_output_path(path: &Path) -> PathBuf {
    let default_name = default_file_name_today();
    if path.as_os_str().is_empty() || path.is_dir() {
        return path.join(default_name);
    }
    let requested = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let name = normalize_file_name(&requested, &default_name);
    match path.parent() {
        Some(parent) => parent.join(name),
        None => PathBuf::from(name),
    }
}

/// Write `download` into `dir` under its normalized file name.
///
/// Returns the path written.
pub async fn save_download(download: &Download, dir: &Path) -> Result<PathBuf, Md2PdfError> {
    let path = dir.join(&download.file_name);
    write_atomic(&path, download.data.as_bytes()).await?;
    Ok(path)
}

/// Write to a sibling temp file, then rename over `path`.
///
/// Readers never observe a half-written PDF.
pub(crate) async fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), Md2PdfError> {
    let write_err = |e: std::io::Error| Md2PdfError::OutputWriteFailed {
        path: path.to_path_buf(),
        source: e,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await.map_err(write_err)?;
    }

    let tmp_path = path.with_extension("pdf.tmp");
    tokio::fs::write(&tmp_path, bytes).await.map_err(write_err)?;
    if let Err(e) = tokio::fs::rename(&tmp_path, path).await {
        if let Err(cleanup) = tokio::fs::remove_file(&tmp_path).await {
            debug!("Could not remove {}: {}", tmp_path.display(), cleanup);
        }
        return Err(write_err(e));
    }
    debug!("Wrote {} bytes to {}", bytes.len(), path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const DEFAULT: &str = "document-20240101.pdf";

    #[test]
    fn success_enables_download() {
        let pdf = PdfBytes::from(b"%PDF-1.7".to_vec());
        let state = ExportState::from_result(Ok(pdf.clone()), "  my report  ", DEFAULT);
        let dl = state.download().expect("download enabled");
        assert_eq!(dl.file_name, "my report.pdf");
        assert_eq!(dl.mime, "application/pdf");
        assert_eq!(dl.data, pdf);
        assert!(state.error_message().is_none());
        assert!(state.is_ready());
    }

    #[test]
    fn blank_name_uses_default() {
        let state = ExportState::from_result(Ok(PdfBytes::from(vec![1])), "", DEFAULT);
        assert_eq!(state.download().unwrap().file_name, DEFAULT);
    }

    #[test]
    fn failure_suppresses_download() {
        let err = Md2PdfError::ConversionFailed {
            reason: "renderer status err".into(),
        };
        let state = ExportState::from_result(Err(err), "report", DEFAULT);
        assert!(state.download().is_none());
        assert!(!state.is_ready());
        assert_eq!(
            state.error_message(),
            Some("Could not generate PDF: renderer status err")
        );
    }

    #[test]
    fn empty_pdf_suppresses_download() {
        let state = ExportState::from_result(Ok(PdfBytes::from(Vec::new())), "report", DEFAULT);
        assert!(state.download().is_none());
        assert_eq!(
            state.error_message(),
            Some("Could not generate PDF: the renderer produced no output")
        );
    }

    #[tokio::test]
    async fn failed_rename_leaves_no_temp_file() {
        let dir = tempfile::tempdir().unwrap();
        // A non-empty directory in the way makes the rename fail.
        let target = dir.path().join("report.pdf");
        std::fs::create_dir(&target).unwrap();
        std::fs::write(target.join("keep"), b"x").unwrap();

        let err = write_atomic(&target, b"%PDF-1.7").await.unwrap_err();
        assert!(matches!(err, Md2PdfError::OutputWriteFailed { .. }), "got {err:?}");
        assert!(!dir.path().join("report.pdf.tmp").exists());
    }

    #[test]
    fn output_path_normalizes_last_component() {
        assert_eq!(
            resolve_output_path(Path::new("out/  weekly notes ")),
            PathBuf::from("out/weekly notes.pdf")
        );
        assert_eq!(resolve_output_path(Path::new("report.PDF")), PathBuf::from("report.PDF"));
    }

    #[tokio::test]
    async fn save_download_creates_missing_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("nested/out");
        let dl = Download {
            data: PdfBytes::from(b"%PDF-1.7 test".to_vec()),
            file_name: "report.pdf".into(),
            mime: PDF_MIME,
        };
        let path = save_download(&dl, &target).await.unwrap();
        assert_eq!(path, target.join("report.pdf"));
        assert_eq!(std::fs::read(&path).unwrap(), b"%PDF-1.7 test");
    }

    #[test]
    fn directory_gets_default_name() {
        let dir = tempfile::tempdir().unwrap();
        let path = resolve_output_path(dir.path());
        assert_eq!(path.parent(), Some(dir.path()));
        let name = path.file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.starts_with("document-") && name.ends_with(".pdf"), "got {name}");
    }
}

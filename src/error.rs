//! Error types for AkuPDF

use serde::Serialize;
use thiserror::Error;

/// Result type alias for AkuPDF
pub type Result<T> = std::result::Result<T, Error>;

/// Coarse classification used by the interaction layer to pick a message style
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// The caller supplied something unusable (page text, parameters, a non-PDF file)
    InvalidInput,
    /// Reading or writing the filesystem failed
    Io,
    /// The PDF pipeline itself failed
    Operation,
    /// The view already has a job in flight
    Busy,
}

/// Error types for AkuPDF
#[derive(Error, Debug)]
pub enum Error {
    /// PDF file not found
    #[error("PDF not found: {path}")]
    PdfNotFound { path: String },

    /// Invalid PDF file
    #[error("Invalid PDF file: {reason}")]
    InvalidPdf { reason: String },

    /// PDF is password protected and no usable password was provided
    #[error("PDF is password protected")]
    PasswordRequired,

    /// Incorrect password provided
    #[error("Incorrect password")]
    IncorrectPassword,

    /// Page range text could not be parsed
    #[error("Invalid page range: {range}")]
    InvalidPageRange { range: String },

    /// A page number in the expression is above the supported maximum
    #[error("Page number above {limit} in range: {range}")]
    PageLimitExceeded { range: String, limit: u32 },

    /// Page out of bounds
    #[error("Page {page} out of bounds (total: {total})")]
    PageOutOfBounds { page: u32, total: u32 },

    /// Parameter rejected before any document work started
    #[error("Invalid input: {reason}")]
    InvalidInput { reason: String },

    /// Output target already exists
    #[error("Output already exists: {path}")]
    OutputExists { path: String },

    /// IO error tied to a specific file
    #[error("Failed to access {path}: {source}")]
    FileIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// PDFium error
    #[error("PDFium error: {reason}")]
    Pdfium { reason: String },

    /// qpdf error
    #[error("qpdf error: {reason}")]
    QpdfError { reason: String },

    /// Low-level object model error (lopdf)
    #[error("PDF object error: {0}")]
    Document(#[from] lopdf::Error),

    /// Image codec error
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    /// DOCX packaging error
    #[error("DOCX error: {reason}")]
    Docx { reason: String },

    /// XLSX writer error
    #[error("XLSX error: {0}")]
    Xlsx(#[from] rust_xlsxwriter::XlsxError),

    /// Path access denied (outside allowed resource directories)
    #[error("Path access denied: {path}")]
    PathAccessDenied { path: String },

    /// Rendered image would be too large
    #[error("Image dimension exceeded: {detail}")]
    ImageDimensionExceeded { detail: String },

    /// Another job for the same operation is still running
    #[error("{operation} is already running")]
    Busy { operation: String },

    /// The background worker died before reporting a result
    #[error("Worker failed: {reason}")]
    WorkerFailed { reason: String },
}

impl Error {
    pub(crate) fn invalid_input(reason: impl Into<String>) -> Self {
        Error::InvalidInput {
            reason: reason.into(),
        }
    }

    pub(crate) fn file_io(path: &std::path::Path, source: std::io::Error) -> Self {
        Error::FileIo {
            path: path.display().to_string(),
            source,
        }
    }

    /// Classify the error for presentation
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::InvalidPageRange { .. }
            | Error::PageLimitExceeded { .. }
            | Error::InvalidInput { .. }
            | Error::InvalidPdf { .. }
            | Error::PageOutOfBounds { .. }
            | Error::ImageDimensionExceeded { .. } => ErrorKind::InvalidInput,
            Error::PdfNotFound { .. }
            | Error::OutputExists { .. }
            | Error::FileIo { .. }
            | Error::PathAccessDenied { .. } => ErrorKind::Io,
            Error::Busy { .. } => ErrorKind::Busy,
            Error::PasswordRequired
            | Error::IncorrectPassword
            | Error::Pdfium { .. }
            | Error::QpdfError { .. }
            | Error::Document(_)
            | Error::Image(_)
            | Error::Docx { .. }
            | Error::Xlsx(_)
            | Error::WorkerFailed { .. } => ErrorKind::Operation,
        }
    }

    /// The caller-supplied path an I/O failure refers to
    pub fn path(&self) -> Option<&str> {
        match self {
            Error::PdfNotFound { path }
            | Error::OutputExists { path }
            | Error::FileIo { path, .. }
            | Error::PathAccessDenied { path } => Some(path.as_str()),
            _ => None,
        }
    }

    /// Return a sanitized error message safe to send to clients.
    /// Library details are omitted; the offending path travels separately
    /// through [`Error::path`].
    /// Full details should be logged via tracing before calling this.
    pub fn client_message(&self) -> String {
        match self {
            Error::PdfNotFound { .. } => "PDF not found".to_string(),
            Error::InvalidPdf { .. } => "Invalid PDF file".to_string(),
            Error::PasswordRequired => {
                "PDF is protected with a user password; supply the password".to_string()
            }
            Error::IncorrectPassword => "Incorrect password".to_string(),
            Error::InvalidPageRange { range } => format!("Invalid page range: {}", range),
            Error::PageLimitExceeded { range, limit } => format!(
                "Page numbers above {} are not supported: {}",
                limit, range
            ),
            Error::PageOutOfBounds { page, total } => {
                format!("Page {} out of bounds (total: {})", page, total)
            }
            Error::InvalidInput { reason } => reason.clone(),
            Error::OutputExists { .. } => "Output file already exists".to_string(),
            Error::FileIo { .. } => "I/O error".to_string(),
            Error::Pdfium { .. } | Error::QpdfError { .. } | Error::Document(_) => {
                "PDF processing error".to_string()
            }
            Error::Image(_) => "Image processing error".to_string(),
            Error::Docx { .. } => "Failed to write DOCX document".to_string(),
            Error::Xlsx(_) => "Failed to write XLSX workbook".to_string(),
            Error::PathAccessDenied { .. } => "Access denied".to_string(),
            Error::ImageDimensionExceeded { detail } => {
                format!("Image dimension exceeded: {}", detail)
            }
            Error::Busy { operation } => format!("{} is already running", operation),
            Error::WorkerFailed { .. } => "Operation failed unexpectedly".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_classification() {
        assert_eq!(
            Error::InvalidPageRange {
                range: "0".to_string()
            }
            .kind(),
            ErrorKind::InvalidInput
        );
        assert_eq!(
            Error::OutputExists {
                path: "/tmp/x.pdf".to_string()
            }
            .kind(),
            ErrorKind::Io
        );
        assert_eq!(Error::IncorrectPassword.kind(), ErrorKind::Operation);
        assert_eq!(
            Error::Busy {
                operation: "compress".to_string()
            }
            .kind(),
            ErrorKind::Busy
        );
    }

    #[test]
    fn test_client_message_keeps_path_separate() {
        let err = Error::PdfNotFound {
            path: "/data/in/report.pdf".to_string(),
        };
        assert_eq!(err.client_message(), "PDF not found");
        assert_eq!(err.path(), Some("/data/in/report.pdf"));

        let err = Error::file_io(
            std::path::Path::new("/data/out.pdf"),
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        );
        assert_eq!(err.client_message(), "I/O error");
        assert_eq!(err.path(), Some("/data/out.pdf"));
        assert!(err.to_string().contains("denied"));

        assert_eq!(Error::IncorrectPassword.path(), None);
    }

    #[test]
    fn test_invalid_input_message_passthrough() {
        let err = Error::invalid_input("pages_per_file must be at least 1");
        assert_eq!(err.client_message(), "pages_per_file must be at least 1");
    }
}

//! Path resolution for PDF inputs and outputs

use crate::error::{Error, Result};
use std::path::{Path, PathBuf};

/// Sandbox restricting which paths tools may read and write.
///
/// With no directories configured every path is allowed.
#[derive(Debug, Clone, Default)]
pub struct PathPolicy {
    resource_dirs: Vec<String>,
}

impl PathPolicy {
    pub fn new(resource_dirs: Vec<String>) -> Self {
        Self { resource_dirs }
    }

    pub fn is_restricted(&self) -> bool {
        !self.resource_dirs.is_empty()
    }

    pub fn resource_dirs(&self) -> &[String] {
        &self.resource_dirs
    }

    fn allows(&self, canonical: &Path) -> bool {
        self.resource_dirs.iter().any(|dir| {
            std::fs::canonicalize(dir)
                .map(|cd| canonical.starts_with(&cd))
                .unwrap_or(false)
        })
    }

    /// Validate that an existing path is within allowed resource directories.
    pub fn check_input(&self, path: &str) -> Result<PathBuf> {
        if !self.is_restricted() {
            return Ok(PathBuf::from(path));
        }

        let canonical = std::fs::canonicalize(path).map_err(|_| Error::PathAccessDenied {
            path: path.to_string(),
        })?;

        if self.allows(&canonical) {
            Ok(canonical)
        } else {
            Err(Error::PathAccessDenied {
                path: path.to_string(),
            })
        }
    }

    /// Validate a path that may not exist yet (output file or directory).
    /// Canonicalizes the closest existing ancestor and re-attaches the rest.
    pub fn check_output(&self, path: &str) -> Result<PathBuf> {
        if !self.is_restricted() {
            return Ok(PathBuf::from(path));
        }

        let denied = || Error::PathAccessDenied {
            path: path.to_string(),
        };

        let target = Path::new(path);
        let mut existing = target;
        let mut missing = Vec::new();
        while !existing.exists() {
            let name = existing.file_name().ok_or_else(denied)?;
            missing.push(name.to_os_string());
            existing = match existing.parent() {
                Some(p) if !p.as_os_str().is_empty() => p,
                _ => Path::new("."),
            };
        }

        let mut canonical = std::fs::canonicalize(existing).map_err(|_| denied())?;
        for name in missing.iter().rev() {
            if name == ".." {
                return Err(denied());
            }
            canonical.push(name);
        }

        if self.allows(&canonical) {
            Ok(canonical)
        } else {
            Err(denied())
        }
    }
}

/// How far into the file the `%PDF-` header may sit
const HEADER_WINDOW: usize = 1024;

fn has_pdf_header(data: &[u8]) -> bool {
    let head = &data[..data.len().min(HEADER_WINDOW)];
    head.windows(5).any(|w| w == b"%PDF-")
}

/// Read a PDF from disk, checking it exists and carries a PDF header.
///
/// Junk before the header (a BOM, stray newlines) is tolerated.
pub fn read_pdf(path: &Path) -> Result<Vec<u8>> {
    if !path.exists() {
        return Err(Error::PdfNotFound {
            path: path.display().to_string(),
        });
    }

    let data = std::fs::read(path).map_err(|e| Error::file_io(path, e))?;

    if !has_pdf_header(&data) {
        return Err(Error::InvalidPdf {
            reason: format!("{} is not a PDF file", path.display()),
        });
    }

    Ok(data)
}

fn same_file(a: &Path, b: &Path) -> bool {
    match (std::fs::canonicalize(a), std::fs::canonicalize(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

/// Reject an output path that would overwrite one of the inputs
pub fn ensure_distinct(output: &Path, inputs: &[&Path]) -> Result<()> {
    if output.exists() && inputs.iter().any(|input| same_file(output, input)) {
        return Err(Error::OutputExists {
            path: output.display().to_string(),
        });
    }
    Ok(())
}

/// Reject any existing file at the output path
pub fn ensure_absent(output: &Path) -> Result<()> {
    if output.exists() {
        return Err(Error::OutputExists {
            path: output.display().to_string(),
        });
    }
    Ok(())
}

/// Create an output directory (and parents) if it does not exist
pub fn prepare_dir(dir: &Path) -> Result<()> {
    if dir.is_file() {
        return Err(Error::OutputExists {
            path: dir.display().to_string(),
        });
    }
    std::fs::create_dir_all(dir).map_err(|e| Error::file_io(dir, e))
}

/// Write output bytes, creating parent directories as needed.
///
/// Returns the number of bytes written. A failed write removes the partial file.
pub fn write_output(path: &Path, data: &[u8]) -> Result<u64> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            std::fs::create_dir_all(parent).map_err(|e| Error::file_io(parent, e))?;
        }
    }

    if let Err(e) = std::fs::write(path, data) {
        let _ = std::fs::remove_file(path);
        return Err(Error::file_io(path, e));
    }
    Ok(data.len() as u64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_read_pdf_missing() {
        let result = read_pdf(Path::new("/nonexistent/file.pdf"));
        assert!(matches!(result, Err(Error::PdfNotFound { .. })));
    }

    #[test]
    fn test_read_pdf_rejects_non_pdf() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("notes.pdf");
        std::fs::write(&path, b"hello").unwrap();
        assert!(matches!(read_pdf(&path), Err(Error::InvalidPdf { .. })));
    }

    #[test]
    fn test_read_pdf_tolerates_leading_bytes() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bom.pdf");
        std::fs::write(&path, b"\xEF\xBB\xBF\r\n%PDF-1.7\n").unwrap();
        assert!(read_pdf(&path).is_ok());

        let mut late = vec![b' '; HEADER_WINDOW];
        late.extend_from_slice(b"%PDF-1.7\n");
        std::fs::write(&path, late).unwrap();
        assert!(matches!(read_pdf(&path), Err(Error::InvalidPdf { .. })));
    }

    #[test]
    fn test_unrestricted_policy_allows_everything() {
        let policy = PathPolicy::default();
        assert!(policy.check_input("/etc/passwd").is_ok());
        assert!(policy.check_output("/tmp/new/out.pdf").is_ok());
    }

    #[test]
    fn test_restricted_policy() {
        let allowed = TempDir::new().unwrap();
        let other = TempDir::new().unwrap();
        let inside = allowed.path().join("a.pdf");
        std::fs::write(&inside, b"%PDF-1.4").unwrap();
        let outside = other.path().join("b.pdf");
        std::fs::write(&outside, b"%PDF-1.4").unwrap();

        let policy = PathPolicy::new(vec![allowed.path().to_string_lossy().to_string()]);
        assert!(policy.check_input(inside.to_str().unwrap()).is_ok());
        assert!(matches!(
            policy.check_input(outside.to_str().unwrap()),
            Err(Error::PathAccessDenied { .. })
        ));

        let nested = allowed.path().join("new/deeper/out.pdf");
        assert!(policy.check_output(nested.to_str().unwrap()).is_ok());

        let escape = allowed.path().join("missing/../../escape.pdf");
        assert!(policy.check_output(escape.to_str().unwrap()).is_err());
    }

    #[test]
    fn test_ensure_distinct_and_absent() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("in.pdf");
        std::fs::write(&input, b"%PDF-1.4").unwrap();
        let output = dir.path().join("out.pdf");

        assert!(ensure_distinct(&output, &[&input]).is_ok());
        assert!(matches!(
            ensure_distinct(&input, &[&input]),
            Err(Error::OutputExists { .. })
        ));
        assert!(ensure_absent(&output).is_ok());
        assert!(ensure_absent(&input).is_err());
    }

    #[test]
    fn test_write_output_creates_parents() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested/dir/out.bin");
        assert_eq!(write_output(&path, b"abc").unwrap(), 3);
        assert_eq!(std::fs::read(&path).unwrap(), b"abc");
    }
}

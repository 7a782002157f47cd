//! Add or remove password protection

use crate::error::{Error, Result};
use crate::ops::display;
use crate::pdf::QpdfWrapper;
use crate::source::{ensure_distinct, read_pdf, write_output};
use schemars::JsonSchema;
use serde::Serialize;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Serialize, JsonSchema)]
pub struct PasswordResult {
    pub output_path: String,
    pub output_size: u64,
    pub page_count: u32,
}

/// Encrypt with AES-256.
///
/// An empty or missing owner password falls back to the user password.
pub fn add_password(
    input: &Path,
    output: &Path,
    user_password: &str,
    owner_password: Option<&str>,
) -> Result<PasswordResult> {
    let owner_empty = owner_password.map_or(true, str::is_empty);
    if user_password.is_empty() && owner_empty {
        return Err(Error::invalid_input("A password is required"));
    }
    ensure_distinct(output, &[input])?;

    let data = read_pdf(input)?;
    let page_count = QpdfWrapper::get_page_count(&data, None)?;
    let encrypted = QpdfWrapper::encrypt(&data, user_password, owner_password)?;
    let output_size = write_output(output, &encrypted)?;

    tracing::info!(pages = page_count, output = %output.display(), "encrypted");

    Ok(PasswordResult {
        output_path: display(output),
        output_size,
        page_count,
    })
}

/// Write an unencrypted copy.
///
/// Without a password only owner-restricted documents can be unlocked.
pub fn remove_password(
    input: &Path,
    output: &Path,
    password: Option<&str>,
) -> Result<PasswordResult> {
    ensure_distinct(output, &[input])?;

    let data = read_pdf(input)?;
    let password = password.filter(|p| !p.is_empty());
    let decrypted = QpdfWrapper::decrypt(&data, password)?;
    let page_count = QpdfWrapper::get_page_count(&decrypted, None)?;
    let output_size = write_output(output, &decrypted)?;

    tracing::info!(pages = page_count, output = %output.display(), "decrypted");

    Ok(PasswordResult {
        output_path: display(output),
        output_size,
        page_count,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pdf::testing::sample_pdf;
    use tempfile::TempDir;

    fn fixture(dir: &TempDir) -> std::path::PathBuf {
        let path = dir.path().join("plain.pdf");
        std::fs::write(&path, sample_pdf(3)).unwrap();
        path
    }

    #[test]
    fn test_password_roundtrip() {
        let dir = TempDir::new().unwrap();
        let input = fixture(&dir);
        let locked = dir.path().join("locked.pdf");
        let unlocked = dir.path().join("unlocked.pdf");

        let added = add_password(&input, &locked, "s3cret", None).unwrap();
        assert_eq!(added.page_count, 3);
        let locked_bytes = std::fs::read(&locked).unwrap();
        assert!(matches!(
            QpdfWrapper::open(&locked_bytes, None),
            Err(Error::PasswordRequired)
        ));

        let removed = remove_password(&locked, &unlocked, Some("s3cret")).unwrap();
        assert_eq!(removed.page_count, 3);
        let unlocked_bytes = std::fs::read(&unlocked).unwrap();
        assert!(!QpdfWrapper::open(&unlocked_bytes, None).unwrap().is_encrypted());
    }

    #[test]
    fn test_remove_password_errors() {
        let dir = TempDir::new().unwrap();
        let input = fixture(&dir);
        let locked = dir.path().join("locked.pdf");
        add_password(&input, &locked, "right", None).unwrap();

        let out = dir.path().join("out.pdf");
        assert!(matches!(
            remove_password(&locked, &out, Some("wrong")),
            Err(Error::IncorrectPassword)
        ));
        assert!(matches!(
            remove_password(&locked, &out, None),
            Err(Error::PasswordRequired)
        ));
        assert!(!out.exists());
    }

    #[test]
    fn test_empty_passwords_rejected() {
        let dir = TempDir::new().unwrap();
        let input = fixture(&dir);
        let result = add_password(&input, &dir.path().join("o.pdf"), "", Some(""));
        assert!(matches!(result, Err(Error::InvalidInput { .. })));
    }

    #[test]
    fn test_unencrypted_input_passes_through() {
        let dir = TempDir::new().unwrap();
        let input = fixture(&dir);
        let result = remove_password(&input, &dir.path().join("copy.pdf"), None).unwrap();
        assert_eq!(result.page_count, 3);
    }
}

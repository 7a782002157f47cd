//! qpdf FFI wrapper for page assembly, encryption and structural compression
//!
//! qpdf is the lenient reader here: it reconstructs damaged cross-reference
//! tables and tolerates minor syntax errors that a strict parser rejects.

use crate::error::{Error, Result};
use qpdf::{EncryptionParams, EncryptionParamsR6, ObjectStreamMode, PrintPermission, QPdf};

/// Wrapper for qpdf operations via FFI
pub struct QpdfWrapper;

/// A document opened through qpdf together with its page count
pub struct OpenedPdf {
    qpdf: QPdf,
    page_count: u32,
}

impl OpenedPdf {
    pub fn page_count(&self) -> u32 {
        self.page_count
    }

    pub fn is_encrypted(&self) -> bool {
        self.qpdf.is_encrypted()
    }
}

/// Helper: open a QPdf from memory, optionally with password.
///
/// Without a password qpdf still tries the empty user password, so
/// owner-only protected files open either way.
fn open_qpdf(data: &[u8], password: Option<&str>) -> Result<QPdf> {
    match password {
        Some(pwd) => QPdf::read_from_memory_encrypted(data, pwd).map_err(map_qpdf_error),
        None => QPdf::read_from_memory(data).map_err(|e| match map_qpdf_error(e) {
            Error::IncorrectPassword => Error::PasswordRequired,
            other => other,
        }),
    }
}

/// Map qpdf crate errors to our error types
fn map_qpdf_error(e: qpdf::QPdfError) -> Error {
    match e.error_code() {
        qpdf::QPdfErrorCode::InvalidPassword => Error::IncorrectPassword,
        _ => Error::QpdfError {
            reason: e.to_string(),
        },
    }
}

/// Copy the given 0-based pages of `source` into a fresh document
fn assemble(source: &QPdf, indices: &[u32], total: u32) -> Result<QPdf> {
    let dest = QPdf::empty();
    for &idx in indices {
        let page = source.get_page(idx).ok_or(Error::PageOutOfBounds {
            page: idx + 1,
            total,
        })?;
        let copied = dest.copy_from_foreign(&page);
        dest.add_page(&copied, false).map_err(map_qpdf_error)?;
    }
    Ok(dest)
}

fn write_plain(qpdf: &QPdf) -> Result<Vec<u8>> {
    let mut writer = qpdf.writer();
    writer.preserve_encryption(false);
    writer.write_to_memory().map_err(map_qpdf_error)
}

impl QpdfWrapper {
    /// Open a document leniently and read its page count
    pub fn open(data: &[u8], password: Option<&str>) -> Result<OpenedPdf> {
        let qpdf = open_qpdf(data, password)?;
        let page_count = qpdf.get_num_pages().map_err(map_qpdf_error)?;
        Ok(OpenedPdf { qpdf, page_count })
    }

    /// Get the page count of a PDF
    pub fn get_page_count(input_data: &[u8], password: Option<&str>) -> Result<u32> {
        Self::open(input_data, password).map(|pdf| pdf.page_count)
    }

    /// Merge documents in the given order.
    ///
    /// Returns the merged bytes and the total page count.
    pub fn merge(inputs: &[&[u8]]) -> Result<(Vec<u8>, u32)> {
        if inputs.is_empty() {
            return Err(Error::invalid_input("No input PDFs provided"));
        }

        let dest = QPdf::empty();
        let mut page_count = 0u32;

        for (i, input_data) in inputs.iter().enumerate() {
            let source = open_qpdf(input_data, None).map_err(|e| match e {
                Error::QpdfError { reason } => Error::QpdfError {
                    reason: format!("Failed to read input PDF {}: {}", i + 1, reason),
                },
                other => other,
            })?;

            let pages = source.get_pages().map_err(|e| Error::QpdfError {
                reason: format!("Failed to get pages from input PDF {}: {}", i + 1, e),
            })?;

            for page in &pages {
                let copied = dest.copy_from_foreign(page);
                dest.add_page(&copied, false).map_err(map_qpdf_error)?;
            }
            page_count += pages.len() as u32;
        }

        Ok((dest.writer().write_to_memory().map_err(map_qpdf_error)?, page_count))
    }

    /// Split a document into consecutive chunks of at most `pages_per_file` pages
    pub fn split_into_chunks(
        input_data: &[u8],
        pages_per_file: u32,
        password: Option<&str>,
    ) -> Result<Vec<(Vec<u8>, u32)>> {
        if pages_per_file == 0 {
            return Err(Error::invalid_input("pages_per_file must be at least 1"));
        }

        let source = Self::open(input_data, password)?;
        let indices: Vec<u32> = (0..source.page_count).collect();

        indices
            .chunks(pages_per_file as usize)
            .map(|chunk| {
                let dest = assemble(&source.qpdf, chunk, source.page_count)?;
                Ok((write_plain(&dest)?, chunk.len() as u32))
            })
            .collect()
    }

    /// Copy the given 0-based pages, in order, into a new document
    pub fn select_pages(
        input_data: &[u8],
        indices: &[u32],
        password: Option<&str>,
    ) -> Result<Vec<u8>> {
        let source = Self::open(input_data, password)?;
        let dest = assemble(&source.qpdf, indices, source.page_count)?;
        write_plain(&dest)
    }

    /// Encrypt with AES-256; the owner password falls back to the user password
    pub fn encrypt(
        input_data: &[u8],
        user_password: &str,
        owner_password: Option<&str>,
    ) -> Result<Vec<u8>> {
        let qpdf = open_qpdf(input_data, None)?;
        let owner_pwd = owner_password
            .filter(|p| !p.is_empty())
            .unwrap_or(user_password);

        let encryption = EncryptionParams::R6(EncryptionParamsR6 {
            user_password: user_password.to_string(),
            owner_password: owner_pwd.to_string(),
            allow_accessibility: true,
            allow_extract: true,
            allow_assemble: true,
            allow_annotate_and_form: true,
            allow_form_filling: true,
            allow_modify_other: true,
            allow_print: PrintPermission::Full,
            encrypt_metadata: true,
        });

        let mut writer = qpdf.writer();
        writer
            .preserve_encryption(false)
            .encryption_params(encryption);
        writer.write_to_memory().map_err(map_qpdf_error)
    }

    /// Remove password protection.
    ///
    /// With no password only owner-restricted documents can be opened; a
    /// document with a real user password yields `PasswordRequired`.
    pub fn decrypt(input_data: &[u8], password: Option<&str>) -> Result<Vec<u8>> {
        let qpdf = open_qpdf(input_data, password)?;
        write_plain(&qpdf)
    }

    /// Rewrite through the lenient reader as a plain, unencrypted file.
    ///
    /// The xref table is rebuilt, object streams are expanded and stream data
    /// is left uncompressed so a strict parser can take the result.
    pub fn normalize(input_data: &[u8]) -> Result<Vec<u8>> {
        let qpdf = open_qpdf(input_data, None)?;

        let mut writer = qpdf.writer();
        writer
            .object_stream_mode(ObjectStreamMode::Disable)
            .compress_streams(false)
            .preserve_encryption(false);
        writer.write_to_memory().map_err(map_qpdf_error)
    }

    /// Rewrite with object streams, compressed streams and no unreferenced objects
    pub fn compress(input_data: &[u8]) -> Result<Vec<u8>> {
        let qpdf = open_qpdf(input_data, None)?;

        let mut writer = qpdf.writer();
        writer
            .object_stream_mode(ObjectStreamMode::Generate)
            .compress_streams(true)
            .normalize_content(true)
            .preserve_unreferenced_objects(false)
            .preserve_encryption(false);
        writer.write_to_memory().map_err(map_qpdf_error)
    }
}

//! AkuPDF library
//!
//! PDF processors served as MCP tools:
//! - `merge_pdfs`, `split_pdf`, `extract_pages`: page assembly
//! - `extract_text`, `extract_images`: content extraction
//! - `compress_pdf`, `add_watermark`, `add_password`, `remove_password`
//! - `convert_to_docx`, `convert_to_xlsx`, `convert_to_images`
//!
//! Page selections use the `"1,3-5,7"` syntax parsed by [`parse_page_numbers`].

pub mod error;
pub mod ops;
pub mod pdf;
pub mod server;
pub mod source;
pub mod worker;

pub use error::{Error, ErrorKind, Result};
pub use pdf::{parse_page_numbers, PageSelection};
pub use server::{
    run_server, run_server_with_config, run_server_with_dirs, ListPdfsParams, ListPdfsResult,
    PdfFileInfo, PdfServer, ServerConfig,
};
pub use worker::{Operation, ViewState, Workbench};

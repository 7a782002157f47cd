//! Input and output path handling

pub mod resolver;

pub use resolver::{
    ensure_absent, ensure_distinct, prepare_dir, read_pdf, write_output, PathPolicy,
};

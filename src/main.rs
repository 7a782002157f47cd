//! AkuPDF - entry point
//!
//! Usage: `akupdf [RESOURCE_DIR...]`. Each directory is added to the sandbox;
//! with none, every path is allowed.

use akupdf::{pdf::pdfium_available, run_server_with_dirs};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // stdout carries the MCP transport, so logs go to stderr
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "akupdf=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let resource_dirs: Vec<String> = std::env::args().skip(1).collect();

    tracing::info!(?resource_dirs, "Starting AkuPDF");
    if !pdfium_available() {
        tracing::warn!("PDFium library not found; text, watermark and conversion tools will fail");
    }

    run_server_with_dirs(resource_dirs).await
}

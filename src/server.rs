//! MCP server exposing the processors as tools

use crate::error::Error;
use crate::ops::{self, CompressionLevel, ImageFormatChoice};
use crate::pdf::PageSelection;
use crate::source::PathPolicy;
use crate::worker::{Operation, ViewState, Workbench};
use anyhow::Result;
use rmcp::{
    handler::server::tool::ToolRouter, handler::server::wrapper::Parameters, model::*,
    schemars::JsonSchema, service::RequestContext, tool, tool_handler, tool_router, RoleServer,
    ServerHandler, ServiceExt,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Sandbox and rendering limits for the server
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Directories inputs and outputs must stay inside; empty allows all paths
    pub resource_dirs: Vec<String>,
    /// DPI used by convert_to_images when none is given (default: 150)
    pub default_image_dpi: u32,
    /// Largest DPI convert_to_images accepts (default: 600)
    pub max_image_dpi: u32,
    /// Largest bitmap, in pixels, rendered for one page (default: 100_000_000)
    pub max_image_pixels: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            resource_dirs: Vec::new(),
            default_image_dpi: 150,
            max_image_dpi: 600,
            max_image_pixels: 100_000_000,
        }
    }
}

/// AkuPDF MCP server
#[derive(Clone)]
pub struct PdfServer {
    workbench: Workbench,
    policy: PathPolicy,
    tool_router: ToolRouter<Self>,
    config: Arc<ServerConfig>,
}

fn default_pages_per_file() -> u32 {
    1
}

fn default_level() -> String {
    CompressionLevel::default().to_string()
}

fn default_opacity() -> f32 {
    0.3
}

fn default_true() -> bool {
    true
}

fn default_format() -> String {
    "png".to_string()
}

// ============================================================================
// Request/Response types
// ============================================================================

#[derive(Debug, Deserialize, JsonSchema)]
pub struct GetPdfInfoParams {
    /// Path to the PDF file
    pub path: String,
    /// User password for encrypted PDFs
    #[serde(default)]
    pub password: Option<String>,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct ParsePagesParams {
    /// Page range text, e.g. "1,3-5,7"
    pub pages: String,
}

#[derive(Debug, Serialize, JsonSchema)]
pub struct ParsePagesResult {
    /// Canonical form of the range
    pub canonical: String,
    /// 0-based page indices, ascending
    pub indices: Vec<u32>,
    /// 1-based page numbers, ascending
    pub pages: Vec<u32>,
    pub count: u32,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct ListPdfsParams {
    /// Directory to search for PDF files
    pub directory: String,
    /// Search subdirectories recursively (default: false)
    #[serde(default)]
    pub recursive: bool,
    /// Filename pattern to filter (e.g., "report*.pdf"). Supports glob patterns.
    #[serde(default)]
    pub pattern: Option<String>,
}

#[derive(Debug, Serialize, JsonSchema)]
pub struct PdfFileInfo {
    /// Full path to the PDF file
    pub path: String,
    /// Filename only
    pub name: String,
    /// File size in bytes
    pub size: u64,
    /// Last modified time (RFC 3339)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub modified: Option<String>,
}

#[derive(Debug, Serialize, JsonSchema)]
pub struct ListPdfsResult {
    pub directory: String,
    pub files: Vec<PdfFileInfo>,
    pub total_count: u32,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct OperationStatusParams {
    /// A single operation to report; all operations when omitted
    #[serde(default)]
    pub operation: Option<Operation>,
}

#[derive(Debug, Serialize, JsonSchema)]
pub struct OperationStatusResult {
    pub operations: BTreeMap<String, ViewState>,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct MergePdfsParams {
    /// PDFs to merge, in order
    pub paths: Vec<String>,
    /// Path of the merged PDF; must not exist yet
    pub output_path: String,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct SplitPdfParams {
    /// PDF to split
    pub path: String,
    /// Directory receiving split_1.pdf, split_2.pdf, ...
    pub output_dir: String,
    /// Pages in each output file (default: 1)
    #[serde(default = "default_pages_per_file")]
    pub pages_per_file: u32,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct ExtractPagesParams {
    /// Source PDF
    pub path: String,
    /// Pages to keep, e.g. "1,3-5"
    pub pages: String,
    /// Path of the new PDF
    pub output_path: String,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct ExtractTextParams {
    /// Source PDF
    pub path: String,
    /// Pages to read, e.g. "1-3"; all pages when omitted
    #[serde(default)]
    pub pages: Option<String>,
    /// Rebuild reading order from character positions (default: false)
    #[serde(default)]
    pub preserve_layout: bool,
    /// Also save the text to this file
    #[serde(default)]
    pub output_path: Option<String>,
}

#[derive(Debug, Serialize, JsonSchema)]
pub struct ExtractTextResult {
    #[serde(flatten)]
    pub extraction: ops::TextExtraction,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_size: Option<u64>,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct ExtractImagesParams {
    /// Source PDF
    pub path: String,
    /// Directory receiving page_{p}_image_{i}.{ext}
    pub output_dir: String,
    /// Pages to read, e.g. "2,4"; all pages when omitted
    #[serde(default)]
    pub pages: Option<String>,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct CompressPdfParams {
    /// Source PDF
    pub path: String,
    /// Path of the compressed PDF
    pub output_path: String,
    /// "low" (quality 85), "medium" (60, 75% size) or "high" (40, 50% size)
    #[serde(default = "default_level")]
    pub level: String,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct AddPasswordParams {
    /// Source PDF
    pub path: String,
    /// Path of the encrypted PDF
    pub output_path: String,
    /// Password needed to open the document
    pub user_password: String,
    /// Password for full permissions; defaults to the user password
    #[serde(default)]
    pub owner_password: Option<String>,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct RemovePasswordParams {
    /// Encrypted PDF
    pub path: String,
    /// Path of the unencrypted copy
    pub output_path: String,
    /// Current password; omit for owner-only protection
    #[serde(default)]
    pub password: Option<String>,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct AddWatermarkParams {
    /// Source PDF
    pub path: String,
    /// Path of the watermarked PDF
    pub output_path: String,
    /// Watermark text
    pub text: String,
    /// Opacity between 0.0 and 1.0 (default: 0.3)
    #[serde(default = "default_opacity")]
    pub opacity: f32,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct ConvertToDocxParams {
    /// Source PDF
    pub path: String,
    /// Path of the .docx file
    pub output_path: String,
    /// First page, 0-based (default: 0)
    #[serde(default)]
    pub start_page: u32,
    /// Page after the last one converted, 0-based; through the end when omitted
    #[serde(default)]
    pub end_page: Option<u32>,
    /// Turn aligned columns into tables (default: true)
    #[serde(default = "default_true")]
    pub detect_tables: bool,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct ConvertToXlsxParams {
    /// Source PDF
    pub path: String,
    /// Path of the .xlsx file
    pub output_path: String,
    /// Scan every page; otherwise stop after the first page with tables (default: true)
    #[serde(default = "default_true")]
    pub extract_all_pages: bool,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct ConvertToImagesParams {
    /// Source PDF
    pub path: String,
    /// Directory receiving {name}_page_{n}.{format}
    pub output_dir: String,
    /// "png", "jpg" or "jpeg" (default: png)
    #[serde(default = "default_format")]
    pub format: String,
    /// Resolution; the server default applies when omitted
    #[serde(default)]
    pub dpi: Option<u32>,
}

/// Serialize a tool outcome as `{"result": ...}` or `{"error": {...}}`
fn respond<T: Serialize>(tool: &str, outcome: crate::error::Result<T>) -> String {
    let response = match outcome {
        Ok(record) => serde_json::json!({ "result": record }),
        Err(e) => {
            tracing::warn!(tool, error = %e, "tool failed");
            let mut error = serde_json::json!({
                "kind": e.kind(),
                "message": e.client_message(),
            });
            if let Some(path) = e.path() {
                error["path"] = serde_json::Value::from(path);
            }
            serde_json::json!({ "error": error })
        }
    };
    serde_json::to_string_pretty(&response).unwrap_or_default()
}

fn parse_optional_pages(pages: &Option<String>) -> crate::error::Result<Option<PageSelection>> {
    pages.as_deref().map(PageSelection::parse).transpose()
}

// ============================================================================
// Tool implementations
// ============================================================================

#[tool_router]
impl PdfServer {
    pub fn new() -> Self {
        Self::with_config(ServerConfig::default())
    }

    /// Create a new PdfServer with specified resource directories
    pub fn with_resource_dirs(dirs: Vec<String>) -> Self {
        Self::with_config(ServerConfig {
            resource_dirs: dirs,
            ..ServerConfig::default()
        })
    }

    /// Create a new PdfServer with full configuration
    pub fn with_config(config: ServerConfig) -> Self {
        Self {
            workbench: Workbench::new(),
            policy: PathPolicy::new(config.resource_dirs.clone()),
            tool_router: Self::tool_router(),
            config: Arc::new(config),
        }
    }

    #[tool(
        description = "Report page count, file size and encryption state of a PDF. Damaged files are repaired on load where possible."
    )]
    async fn get_pdf_info(&self, Parameters(params): Parameters<GetPdfInfoParams>) -> String {
        respond("get_pdf_info", self.process_get_pdf_info(params).await)
    }

    #[tool(
        description = "Validate page range text and show the pages it selects.

Syntax: comma-separated 1-based page numbers or inclusive ranges, e.g. \"1,3-5,7\". Duplicates are merged and the result is sorted."
    )]
    async fn parse_pages(&self, Parameters(params): Parameters<ParsePagesParams>) -> String {
        let outcome = PageSelection::parse(&params.pages).map(|selection| ParsePagesResult {
            canonical: selection.to_string(),
            indices: selection.indices().to_vec(),
            pages: selection.one_based(),
            count: selection.len() as u32,
        });
        respond("parse_pages", outcome)
    }

    #[tool(
        description = "List PDF files in a directory with size and modification time. Supports recursive search and glob filtering."
    )]
    async fn list_pdfs(&self, Parameters(params): Parameters<ListPdfsParams>) -> String {
        respond("list_pdfs", self.process_list_pdfs(&params))
    }

    #[tool(
        description = "Show whether each operation is running, its last progress report and its last error."
    )]
    async fn get_operation_status(
        &self,
        Parameters(params): Parameters<OperationStatusParams>,
    ) -> String {
        let operations = match params.operation {
            Some(op) => vec![op],
            None => Operation::ALL.to_vec(),
        };
        let result = OperationStatusResult {
            operations: operations
                .into_iter()
                .map(|op| (op.name().to_string(), self.workbench.state(op)))
                .collect(),
        };
        respond("get_operation_status", Ok(result))
    }

    #[tool(
        description = "Merge PDF files, in the order given, into a new PDF. The output path must not exist."
    )]
    async fn merge_pdfs(&self, Parameters(params): Parameters<MergePdfsParams>) -> String {
        respond("merge_pdfs", self.process_merge_pdfs(params).await)
    }

    #[tool(
        description = "Split a PDF into files of N consecutive pages each, named split_1.pdf, split_2.pdf, ... in the output directory."
    )]
    async fn split_pdf(&self, Parameters(params): Parameters<SplitPdfParams>) -> String {
        respond("split_pdf", self.process_split_pdf(params).await)
    }

    #[tool(
        description = "Copy selected pages (e.g. \"1,3-5\") into a new PDF, in ascending order. Pages past the end are skipped and reported."
    )]
    async fn extract_pages(&self, Parameters(params): Parameters<ExtractPagesParams>) -> String {
        respond("extract_pages", self.process_extract_pages(params).await)
    }

    #[tool(
        description = "Extract text page by page. Each page with text becomes a \"--- Page N ---\" block. Optionally rebuilds reading order from character positions and saves the text to a file."
    )]
    async fn extract_text(&self, Parameters(params): Parameters<ExtractTextParams>) -> String {
        respond("extract_text", self.process_extract_text(params).await)
    }

    #[tool(
        description = "Save embedded images as page_{p}_image_{i}.{ext}. JPEG data is written as stored; raw RGB and gray samples become PNG."
    )]
    async fn extract_images(&self, Parameters(params): Parameters<ExtractImagesParams>) -> String {
        respond("extract_images", self.process_extract_images(params).await)
    }

    #[tool(
        description = "Reduce PDF size. Embedded images are recompressed as JPEG (low: quality 85, medium: 60 at 75% size, high: 40 at 50% size), then the file is rewritten with object streams."
    )]
    async fn compress_pdf(&self, Parameters(params): Parameters<CompressPdfParams>) -> String {
        respond("compress_pdf", self.process_compress_pdf(params).await)
    }

    #[tool(
        description = "Encrypt a PDF with AES-256. The owner password defaults to the user password."
    )]
    async fn add_password(&self, Parameters(params): Parameters<AddPasswordParams>) -> String {
        respond("add_password", self.process_add_password(params).await)
    }

    #[tool(
        description = "Write an unencrypted copy of a PDF. Without a password only owner-restricted files can be unlocked."
    )]
    async fn remove_password(
        &self,
        Parameters(params): Parameters<RemovePasswordParams>,
    ) -> String {
        respond("remove_password", self.process_remove_password(params).await)
    }

    #[tool(
        description = "Stamp text diagonally across the centre of every page in grey Helvetica-Bold at the given opacity."
    )]
    async fn add_watermark(&self, Parameters(params): Parameters<AddWatermarkParams>) -> String {
        respond("add_watermark", self.process_add_watermark(params).await)
    }

    #[tool(
        description = "Convert a 0-based page slice [start_page, end_page) to DOCX. Text lines become 11pt paragraphs; aligned columns become tables."
    )]
    async fn convert_to_docx(&self, Parameters(params): Parameters<ConvertToDocxParams>) -> String {
        respond("convert_to_docx", self.process_convert_to_docx(params).await)
    }

    #[tool(
        description = "Write detected tables to XLSX, one sheet per table named Page{p}_Table{t}, with a bold header row."
    )]
    async fn convert_to_xlsx(&self, Parameters(params): Parameters<ConvertToXlsxParams>) -> String {
        respond("convert_to_xlsx", self.process_convert_to_xlsx(params).await)
    }

    #[tool(
        description = "Render every page to PNG or JPEG at the given DPI, named {name}_page_{n}.{format}."
    )]
    async fn convert_to_images(
        &self,
        Parameters(params): Parameters<ConvertToImagesParams>,
    ) -> String {
        respond("convert_to_images", self.process_convert_to_images(params).await)
    }
}

impl PdfServer {
    fn input(&self, path: &str) -> crate::error::Result<PathBuf> {
        self.policy.check_input(path)
    }

    fn output(&self, path: &str) -> crate::error::Result<PathBuf> {
        self.policy.check_output(path)
    }

    async fn process_get_pdf_info(
        &self,
        params: GetPdfInfoParams,
    ) -> crate::error::Result<ops::PdfInfo> {
        let input = self.input(&params.path)?;
        tokio::task::spawn_blocking(move || {
            ops::get_pdf_info_with_password(&input, params.password.as_deref())
        })
        .await
        .map_err(|e| Error::WorkerFailed {
            reason: format!("Task join error: {}", e),
        })?
    }

    async fn process_merge_pdfs(
        &self,
        params: MergePdfsParams,
    ) -> crate::error::Result<ops::MergeResult> {
        let inputs = params
            .paths
            .iter()
            .map(|p| self.input(p))
            .collect::<crate::error::Result<Vec<_>>>()?;
        let output = self.output(&params.output_path)?;

        self.workbench
            .run(Operation::Merge, move |_| ops::merge_pdfs(&inputs, &output))
            .await
    }

    async fn process_split_pdf(
        &self,
        params: SplitPdfParams,
    ) -> crate::error::Result<ops::SplitResult> {
        let input = self.input(&params.path)?;
        let output_dir = self.output(&params.output_dir)?;
        let pages_per_file = params.pages_per_file;

        self.workbench
            .run(Operation::Split, move |_| {
                ops::split_by_pages(&input, &output_dir, pages_per_file)
            })
            .await
    }

    async fn process_extract_pages(
        &self,
        params: ExtractPagesParams,
    ) -> crate::error::Result<ops::ExtractPagesResult> {
        let selection = PageSelection::parse(&params.pages)?;
        let input = self.input(&params.path)?;
        let output = self.output(&params.output_path)?;

        self.workbench
            .run(Operation::ExtractPages, move |_| {
                ops::extract_pages(&input, &output, &selection)
            })
            .await
    }

    async fn process_extract_text(
        &self,
        params: ExtractTextParams,
    ) -> crate::error::Result<ExtractTextResult> {
        let selection = parse_optional_pages(&params.pages)?;
        let input = self.input(&params.path)?;
        let output = params
            .output_path
            .as_deref()
            .map(|p| self.output(p))
            .transpose()?;
        let preserve_layout = params.preserve_layout;

        self.workbench
            .run(Operation::ExtractText, move |_| {
                let extraction = match &selection {
                    Some(selection) => ops::extract_page_text(&input, selection, preserve_layout)?,
                    None => ops::extract_all_text(&input, preserve_layout)?,
                };
                let (output_path, output_size) = match &output {
                    Some(path) => {
                        let (written, size) = ops::save_text(&extraction, path)?;
                        (Some(written), Some(size))
                    }
                    None => (None, None),
                };
                Ok(ExtractTextResult {
                    extraction,
                    output_path,
                    output_size,
                })
            })
            .await
    }

    async fn process_extract_images(
        &self,
        params: ExtractImagesParams,
    ) -> crate::error::Result<ops::ImageExtraction> {
        let selection = parse_optional_pages(&params.pages)?;
        let input = self.input(&params.path)?;
        let output_dir = self.output(&params.output_dir)?;

        self.workbench
            .run(Operation::ExtractImages, move |_| match &selection {
                Some(selection) => ops::extract_page_images(&input, &output_dir, selection),
                None => ops::extract_all_images(&input, &output_dir),
            })
            .await
    }

    async fn process_compress_pdf(
        &self,
        params: CompressPdfParams,
    ) -> crate::error::Result<ops::CompressionStats> {
        let level: CompressionLevel = params.level.parse()?;
        let input = self.input(&params.path)?;
        let output = self.output(&params.output_path)?;

        self.workbench
            .run(Operation::Compress, move |sink| {
                ops::compress_pdf(&input, &output, level, |current, total| {
                    sink.report(current, total)
                })
            })
            .await
    }

    async fn process_add_password(
        &self,
        params: AddPasswordParams,
    ) -> crate::error::Result<ops::PasswordResult> {
        let input = self.input(&params.path)?;
        let output = self.output(&params.output_path)?;

        self.workbench
            .run(Operation::AddPassword, move |_| {
                ops::add_password(
                    &input,
                    &output,
                    &params.user_password,
                    params.owner_password.as_deref(),
                )
            })
            .await
    }

    async fn process_remove_password(
        &self,
        params: RemovePasswordParams,
    ) -> crate::error::Result<ops::PasswordResult> {
        let input = self.input(&params.path)?;
        let output = self.output(&params.output_path)?;

        self.workbench
            .run(Operation::RemovePassword, move |_| {
                ops::remove_password(&input, &output, params.password.as_deref())
            })
            .await
    }

    async fn process_add_watermark(
        &self,
        params: AddWatermarkParams,
    ) -> crate::error::Result<ops::WatermarkResult> {
        let input = self.input(&params.path)?;
        let output = self.output(&params.output_path)?;

        self.workbench
            .run(Operation::Watermark, move |_| {
                ops::add_watermark(&input, &output, &params.text, params.opacity)
            })
            .await
    }

    async fn process_convert_to_docx(
        &self,
        params: ConvertToDocxParams,
    ) -> crate::error::Result<ops::DocxConversion> {
        let input = self.input(&params.path)?;
        let output = self.output(&params.output_path)?;

        self.workbench
            .run(Operation::ConvertToDocx, move |_| {
                ops::convert_to_docx(
                    &input,
                    &output,
                    params.start_page,
                    params.end_page,
                    params.detect_tables,
                )
            })
            .await
    }

    async fn process_convert_to_xlsx(
        &self,
        params: ConvertToXlsxParams,
    ) -> crate::error::Result<ops::XlsxConversion> {
        let input = self.input(&params.path)?;
        let output = self.output(&params.output_path)?;

        self.workbench
            .run(Operation::ConvertToXlsx, move |_| {
                ops::convert_to_xlsx(&input, &output, params.extract_all_pages)
            })
            .await
    }

    async fn process_convert_to_images(
        &self,
        params: ConvertToImagesParams,
    ) -> crate::error::Result<ops::ImageConversion> {
        let format: ImageFormatChoice = params.format.parse()?;
        let dpi = params.dpi.unwrap_or(self.config.default_image_dpi);
        if dpi > self.config.max_image_dpi {
            return Err(Error::ImageDimensionExceeded {
                detail: format!(
                    "dpi must be at most {}, got {}",
                    self.config.max_image_dpi, dpi
                ),
            });
        }
        let input = self.input(&params.path)?;
        let output_dir = self.output(&params.output_dir)?;
        let max_pixels = self.config.max_image_pixels;

        self.workbench
            .run(Operation::ConvertToImages, move |_| {
                ops::convert_to_images_with_limit(&input, &output_dir, format, dpi, max_pixels)
            })
            .await
    }

    fn process_list_pdfs(&self, params: &ListPdfsParams) -> crate::error::Result<ListPdfsResult> {
        self.policy.check_input(&params.directory)?;

        let dir_path = Path::new(&params.directory);
        if !dir_path.exists() {
            return Err(Error::PdfNotFound {
                path: params.directory.clone(),
            });
        }
        if !dir_path.is_dir() {
            return Err(Error::invalid_input(format!(
                "{} is not a directory",
                params.directory
            )));
        }

        let pattern = params
            .pattern
            .as_deref()
            .map(glob::Pattern::new)
            .transpose()
            .map_err(|e| Error::invalid_input(format!("Invalid pattern: {}", e)))?;

        let mut files = Vec::new();
        Self::collect_pdfs(dir_path, params.recursive, pattern.as_ref(), &mut files)?;
        files.sort_by(|a, b| a.path.cmp(&b.path));

        Ok(ListPdfsResult {
            directory: params.directory.clone(),
            total_count: files.len() as u32,
            files,
        })
    }

    fn collect_pdfs(
        dir: &Path,
        recursive: bool,
        pattern: Option<&glob::Pattern>,
        files: &mut Vec<PdfFileInfo>,
    ) -> crate::error::Result<()> {
        let entries = std::fs::read_dir(dir).map_err(|e| Error::file_io(dir, e))?;

        for entry in entries.flatten() {
            let path = entry.path();

            if path.is_dir() {
                if recursive {
                    // Unreadable subdirectories are skipped
                    let _ = Self::collect_pdfs(&path, recursive, pattern, files);
                }
                continue;
            }

            let is_pdf = path
                .extension()
                .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"));
            if !path.is_file() || !is_pdf {
                continue;
            }

            let name = path
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_default();
            if pattern.is_some_and(|pat| !pat.matches(&name)) {
                continue;
            }

            let metadata = std::fs::metadata(&path).ok();
            let modified = metadata
                .as_ref()
                .and_then(|m| m.modified().ok())
                .map(|t| chrono::DateTime::<chrono::Utc>::from(t).to_rfc3339());

            files.push(PdfFileInfo {
                path: path.to_string_lossy().to_string(),
                name,
                size: metadata.as_ref().map(|m| m.len()).unwrap_or(0),
                modified,
            });
        }

        Ok(())
    }
}

impl Default for PdfServer {
    fn default() -> Self {
        Self::new()
    }
}

#[tool_handler]
impl ServerHandler for PdfServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::V_2024_11_05,
            capabilities: ServerCapabilities::builder()
                .enable_tools()
                .enable_resources()
                .build(),
            server_info: Implementation::from_build_env(),
            instructions: Some(
                "AkuPDF merges, splits, compresses, encrypts, watermarks and converts PDF files. \
                 Every tool reads from and writes to file paths. Page ranges use 1-based \
                 numbers such as \"1,3-5\"."
                    .into(),
            ),
        }
    }

    /// PDFs under the configured directories
    async fn list_resources(
        &self,
        _request: Option<PaginatedRequestParams>,
        _context: RequestContext<RoleServer>,
    ) -> Result<ListResourcesResult, ErrorData> {
        let mut resources = Vec::new();

        for dir in self.policy.resource_dirs() {
            let params = ListPdfsParams {
                directory: dir.clone(),
                recursive: true,
                pattern: None,
            };
            let Ok(listing) = self.process_list_pdfs(&params) else {
                continue;
            };

            for file in listing.files {
                let mut resource =
                    RawResource::new(format!("file://{}", file.path), file.name.clone());
                resource.mime_type = Some("application/pdf".to_string());
                resource.description = Some(format!("PDF file ({} bytes)", file.size));
                resource.size = Some(file.size as u32);
                resources.push(Annotated {
                    raw: resource,
                    annotations: None,
                });
            }
        }

        Ok(ListResourcesResult {
            resources,
            next_cursor: None,
            meta: Default::default(),
        })
    }

    /// Text of a PDF resource
    async fn read_resource(
        &self,
        request: ReadResourceRequestParams,
        _context: RequestContext<RoleServer>,
    ) -> Result<ReadResourceResult, ErrorData> {
        let uri = &request.uri;
        let Some(path) = uri.strip_prefix("file://") else {
            return Err(ErrorData::invalid_params(
                "Only file:// URIs are supported",
                None,
            ));
        };

        let params = ExtractTextParams {
            path: path.to_string(),
            pages: None,
            preserve_layout: false,
            output_path: None,
        };

        match self.process_extract_text(params).await {
            Ok(result) => Ok(ReadResourceResult {
                contents: vec![ResourceContents::TextResourceContents {
                    uri: uri.clone(),
                    mime_type: Some("text/plain".to_string()),
                    text: result.extraction.text,
                    meta: Default::default(),
                }],
            }),
            Err(e) => {
                tracing::warn!(error = %e, "read_resource failed");
                Err(ErrorData::invalid_params(e.client_message(), None))
            }
        }
    }
}

/// Run the MCP server without resource directories
pub async fn run_server() -> Result<()> {
    run_server_with_config(ServerConfig::default()).await
}

/// Run the MCP server restricted to `resource_dirs`
pub async fn run_server_with_dirs(resource_dirs: Vec<String>) -> Result<()> {
    run_server_with_config(ServerConfig {
        resource_dirs,
        ..ServerConfig::default()
    })
    .await
}

/// Run the MCP server with full configuration
pub async fn run_server_with_config(config: ServerConfig) -> Result<()> {
    let server = PdfServer::with_config(config);

    tracing::info!("AkuPDF server ready, waiting for connections...");

    let service = server.serve(rmcp::transport::io::stdio()).await?;
    service.waiting().await?;

    Ok(())
}

use std::env;
use std::path::PathBuf;

/// Runtime configuration for the conversion service
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Port the HTTP server binds to (default: 8000)
    pub port: u16,

    /// Scratch directory holding staged inputs and produced outputs
    /// (default: `$TMPDIR/pdfmatrix`)
    pub workspace_dir: PathBuf,

    /// Maximum upload size in bytes (default: 64 MB)
    pub max_file_size: usize,

    /// Timeout for a docx -> pdf conversion step, in seconds (default: 30)
    pub docx_to_pdf_timeout_secs: u64,

    /// Timeout for a pdf -> docx conversion step, in seconds (default: 60)
    pub pdf_to_docx_timeout_secs: u64,

    /// Whether a timed-out step falls through to the next tool in the
    /// chain. Off by default: a timeout exhausts that attempt's budget.
    pub fallback_on_timeout: bool,

    /// Program name (or path) of the unoconv binary (default: "unoconv")
    pub unoconv_program: String,

    /// Program name (or path) of the LibreOffice binary (default: "soffice")
    pub soffice_program: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            port: 8000,
            workspace_dir: env::temp_dir().join("pdfmatrix"),
            max_file_size: 64 * 1024 * 1024, // 64 MB
            docx_to_pdf_timeout_secs: 30,
            pdf_to_docx_timeout_secs: 60,
            fallback_on_timeout: false,
            unoconv_program: "unoconv".to_string(),
            soffice_program: "soffice".to_string(),
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let default = Self::default();

        Self {
            port: env::var("PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(default.port),

            workspace_dir: env::var("WORKSPACE_DIR")
                .map(PathBuf::from)
                .unwrap_or(default.workspace_dir),

            max_file_size: env::var("MAX_FILE_SIZE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(default.max_file_size),

            docx_to_pdf_timeout_secs: env::var("DOCX_TO_PDF_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(default.docx_to_pdf_timeout_secs),

            pdf_to_docx_timeout_secs: env::var("PDF_TO_DOCX_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(default.pdf_to_docx_timeout_secs),

            fallback_on_timeout: env::var("CONVERT_FALLBACK_ON_TIMEOUT")
                .map(|v| v.to_lowercase() == "true" || v == "1")
                .unwrap_or(default.fallback_on_timeout),

            unoconv_program: env::var("UNOCONV_PROGRAM").unwrap_or(default.unoconv_program),

            soffice_program: env::var("SOFFICE_PROGRAM").unwrap_or(default.soffice_program),
        }
    }

    /// Create config for development (short timeouts, relaxed limits)
    pub fn development() -> Self {
        Self {
            docx_to_pdf_timeout_secs: 10,
            pdf_to_docx_timeout_secs: 20,
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.port, 8000);
        assert_eq!(config.max_file_size, 64 * 1024 * 1024);
        assert_eq!(config.docx_to_pdf_timeout_secs, 30);
        assert_eq!(config.pdf_to_docx_timeout_secs, 60);
        assert!(!config.fallback_on_timeout);
        assert_eq!(config.unoconv_program, "unoconv");
        assert_eq!(config.soffice_program, "soffice");
    }

    #[test]
    fn test_development_config() {
        let config = AppConfig::development();
        assert_eq!(config.docx_to_pdf_timeout_secs, 10);
        assert_eq!(config.pdf_to_docx_timeout_secs, 20);
    }

    #[test]
    fn test_workspace_dir_default_is_under_tmp() {
        let config = AppConfig::default();
        assert!(config.workspace_dir.ends_with("pdfmatrix"));
    }
}

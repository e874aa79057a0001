//! Alternate backend that delegates the whole job to `ocrmypdf`.
//!
//! The input images are first combined into an image-only PDF; `ocrmypdf`
//! then adds the text layer itself. Nothing is written to the destination
//! unless the tool succeeds.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use super::validate_language;
use crate::convert::{combine_images, ConvertOptions, ConvertReport};
use crate::error::{Error, Result};

/// Options for the `ocrmypdf` invocation.
#[derive(Debug, Clone)]
pub struct OcrmypdfOptions {
    /// Program to run
    pub program: PathBuf,

    /// Language list passed with `-l`
    pub language: String,

    /// OCR plugin passed with `--plugin`
    pub plugin: Option<String>,

    /// Extra flags for the plugin, passed through unchanged
    pub plugin_args: Vec<String>,

    /// PDF renderer (`sandwich` keeps the original image untouched)
    pub renderer: String,

    /// Parallel jobs
    pub jobs: usize,
}

impl OcrmypdfOptions {
    /// Create options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the language list.
    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }

    /// Set the OCR plugin.
    pub fn with_plugin(mut self, plugin: impl Into<String>) -> Self {
        self.plugin = Some(plugin.into());
        self
    }

    /// Use the EasyOCR plugin with a small batch size.
    pub fn with_easyocr(mut self) -> Self {
        self.plugin = Some("easyocr".to_string());
        self.plugin_args = vec!["--easyocr-batch-size".to_string(), "4".to_string()];
        self
    }

    /// Set the number of parallel jobs.
    pub fn with_jobs(mut self, jobs: usize) -> Self {
        self.jobs = jobs.max(1);
        self
    }

    fn validate(&self) -> Result<()> {
        validate_language(&self.language)?;
        if let Some(plugin) = &self.plugin {
            let ok = !plugin.is_empty()
                && plugin
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-' || c == '.');
            if !ok || plugin.starts_with('-') {
                return Err(Error::InvalidConfig(format!("invalid plugin name: {:?}", plugin)));
            }
        }
        Ok(())
    }
}

impl Default for OcrmypdfOptions {
    fn default() -> Self {
        Self {
            program: PathBuf::from("ocrmypdf"),
            language: "jpn+eng".to_string(),
            plugin: None,
            plugin_args: Vec::new(),
            renderer: "sandwich".to_string(),
            jobs: 1,
        }
    }
}

/// Runs `ocrmypdf` over an image-only PDF.
#[derive(Debug, Clone, Default)]
pub struct OcrmypdfBackend {
    options: OcrmypdfOptions,
}

impl OcrmypdfBackend {
    /// Create a backend.
    pub fn new(options: OcrmypdfOptions) -> Self {
        Self { options }
    }

    /// Whether the program can be started.
    pub fn is_available(&self) -> bool {
        Command::new(&self.options.program)
            .arg("--version")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map(|s| s.success())
            .unwrap_or(false)
    }

    /// Reported program version.
    pub fn version(&self) -> Result<String> {
        let output = Command::new(&self.options.program)
            .arg("--version")
            .output()
            .map_err(|e| Error::Ocr(format!("failed to run ocrmypdf: {}", e)))?;
        if !output.status.success() {
            return Err(Error::Ocr("ocrmypdf not available".to_string()));
        }
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }

    /// Arguments for one run, without the program name. Paths are passed
    /// through as OS strings.
    pub fn arguments(&self, input: &Path, output: &Path) -> Vec<OsString> {
        let mut args: Vec<OsString> = Vec::new();
        if let Some(plugin) = &self.options.plugin {
            args.push("--plugin".into());
            args.push(plugin.into());
        }
        args.push("--pdf-renderer".into());
        args.push((&self.options.renderer).into());
        args.extend(self.options.plugin_args.iter().map(OsString::from));
        args.push("--jobs".into());
        args.push(self.options.jobs.to_string().into());
        args.push("-l".into());
        args.push((&self.options.language).into());
        args.push(input.into());
        args.push(output.into());
        args
    }

    /// Add a text layer to an existing image-only PDF.
    ///
    /// The result is written to a temporary file beside `output` and moved
    /// into place only after the tool exits successfully.
    pub fn process_pdf(&self, input: &Path, output: &Path) -> Result<()> {
        self.options.validate()?;

        let parent = match output.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        let staged = tempfile::Builder::new()
            .prefix(".searchpdf-")
            .suffix(".pdf")
            .tempfile_in(&parent)?;

        log::info!(
            "Running {} on {}",
            self.options.program.display(),
            input.display()
        );
        let result = Command::new(&self.options.program)
            .args(self.arguments(input, staged.path()))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .map_err(|e| Error::Ocr(format!("failed to run ocrmypdf (is it installed?): {}", e)))?;

        if !result.status.success() {
            let stderr = String::from_utf8_lossy(&result.stderr).trim().to_string();
            log::error!("ocrmypdf stderr:\n{}", stderr);
            return Err(Error::ExternalTool {
                tool: "ocrmypdf".to_string(),
                status: result.status.code(),
                stderr,
            });
        }

        staged.as_file().sync_all()?;
        staged.persist(output).map_err(|e| Error::Io(e.error))?;
        log::info!("Wrote {}", output.display());
        Ok(())
    }

    /// Combine the images in `input_dir` and run the tool over them.
    pub fn run(
        &self,
        input_dir: &Path,
        output: &Path,
        options: &ConvertOptions,
    ) -> Result<ConvertReport> {
        self.options.validate()?;

        let scratch = tempfile::tempdir()?;
        let combined = scratch.path().join("combined.pdf");
        let mut report = combine_images(input_dir, &combined, options)?;

        self.process_pdf(&combined, output)?;
        report.output = output.to_path_buf();
        Ok(report)
    }
}

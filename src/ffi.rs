//! C-ABI FFI bindings for cross-language integration.
//!
//! This module exposes directory conversion to C, C#, Python and other
//! languages. Results carry the conversion report as JSON.

use std::ffi::{c_char, CStr, CString};
use std::path::Path;
use std::ptr;
use std::sync::Arc;

use crate::convert::{combine_images, ConvertOptions, Pipeline};
use crate::ocr::{OcrEngine, SidecarEngine, TesseractEngine};

/// Result structure returned by FFI functions.
#[repr(C)]
pub struct SearchpdfResult {
    /// Whether the operation succeeded.
    pub success: bool,
    /// Report JSON (null if failed). Must be freed with `searchpdf_free_result`.
    pub data: *mut c_char,
    /// Error message (null if succeeded). Must be freed with `searchpdf_free_result`.
    pub error: *mut c_char,
}

impl SearchpdfResult {
    fn success(data: String) -> Self {
        Self {
            success: true,
            data: CString::new(data).unwrap_or_default().into_raw(),
            error: ptr::null_mut(),
        }
    }

    fn error(message: String) -> Self {
        Self {
            success: false,
            data: ptr::null_mut(),
            error: CString::new(message).unwrap_or_default().into_raw(),
        }
    }
}

/// Which OCR engine a conversion uses.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchpdfEngine {
    /// JSON results stored next to each image
    Sidecar = 0,
    /// The `tesseract` command-line program
    Tesseract = 1,
}

/// Options for conversion via FFI.
#[repr(C)]
pub struct SearchpdfOptions {
    /// OCR engine.
    pub engine: SearchpdfEngine,
    /// Minimum region confidence, 0.0 to 1.0.
    pub threshold: f32,
    /// OCR language list such as `jpn+eng` (null = default).
    pub language: *const c_char,
    /// Text-layer font path (null = builtin Helvetica).
    pub font_path: *const c_char,
    /// Face index inside a font collection.
    pub font_index: u32,
    /// Worker count (0 = automatic).
    pub workers: u32,
    /// Probe for a GPU accelerator.
    pub use_accelerator: bool,
    /// Skip undecodable images instead of failing.
    pub lenient: bool,
}

impl Default for SearchpdfOptions {
    fn default() -> Self {
        let defaults = ConvertOptions::default();
        Self {
            engine: SearchpdfEngine::Sidecar,
            threshold: defaults.ocr.threshold,
            language: ptr::null(),
            font_path: ptr::null(),
            font_index: 0,
            workers: 0,
            use_accelerator: defaults.use_accelerator,
            lenient: false,
        }
    }
}

/// Default conversion options.
#[no_mangle]
pub extern "C" fn searchpdf_default_options() -> SearchpdfOptions {
    SearchpdfOptions::default()
}

unsafe fn optional_str<'a>(ptr: *const c_char, what: &str) -> Result<Option<&'a str>, String> {
    if ptr.is_null() {
        return Ok(None);
    }
    CStr::from_ptr(ptr)
        .to_str()
        .map(Some)
        .map_err(|_| format!("Invalid UTF-8 {}", what))
}

unsafe fn required_str<'a>(ptr: *const c_char, what: &str) -> Result<&'a str, String> {
    optional_str(ptr, what)?.ok_or_else(|| format!("{} cannot be null", what))
}

unsafe fn convert_options(options: &SearchpdfOptions) -> Result<ConvertOptions, String> {
    let mut converted = ConvertOptions::new()
        .with_threshold(options.threshold)
        .with_accelerator(options.use_accelerator)
        .with_font_index(options.font_index);
    if let Some(language) = optional_str(options.language, "language")? {
        converted = converted.with_language(language);
    }
    if let Some(font) = optional_str(options.font_path, "font_path")? {
        converted = converted.with_font(font);
    }
    if options.workers > 0 {
        converted = converted.with_workers(options.workers as usize);
    }
    if options.lenient {
        converted = converted.lenient();
    }
    Ok(converted)
}

fn convert_internal(
    input_dir: &Path,
    output: &Path,
    engine: SearchpdfEngine,
    options: ConvertOptions,
) -> crate::Result<String> {
    let engine: Arc<dyn OcrEngine> = match engine {
        SearchpdfEngine::Sidecar => Arc::new(SidecarEngine::new()),
        SearchpdfEngine::Tesseract => Arc::new(TesseractEngine::new(options.ocr.language.clone())?),
    };
    let report = Pipeline::new(engine, options).run(input_dir, output)?;
    Ok(serde_json::to_string(&report)?)
}

/// Convert a directory of images into a searchable PDF.
///
/// # Safety
///
/// `input_dir` and `output` must be valid null-terminated UTF-8 strings.
/// String fields of `options` must be null or valid null-terminated UTF-8.
/// The returned result must be freed with `searchpdf_free_result`.
#[no_mangle]
pub unsafe extern "C" fn searchpdf_convert_dir(
    input_dir: *const c_char,
    output: *const c_char,
    options: SearchpdfOptions,
) -> SearchpdfResult {
    let input_dir = match required_str(input_dir, "Input directory") {
        Ok(s) => s,
        Err(e) => return SearchpdfResult::error(e),
    };
    let output = match required_str(output, "Output path") {
        Ok(s) => s,
        Err(e) => return SearchpdfResult::error(e),
    };
    let converted = match convert_options(&options) {
        Ok(o) => o,
        Err(e) => return SearchpdfResult::error(e),
    };

    match convert_internal(Path::new(input_dir), Path::new(output), options.engine, converted) {
        Ok(json) => SearchpdfResult::success(json),
        Err(e) => SearchpdfResult::error(e.to_string()),
    }
}

/// Combine a directory of images into an image-only PDF.
///
/// # Safety
///
/// `input_dir` and `output` must be valid null-terminated UTF-8 strings.
/// The returned result must be freed with `searchpdf_free_result`.
#[no_mangle]
pub unsafe extern "C" fn searchpdf_combine_images(
    input_dir: *const c_char,
    output: *const c_char,
) -> SearchpdfResult {
    let input_dir = match required_str(input_dir, "Input directory") {
        Ok(s) => s,
        Err(e) => return SearchpdfResult::error(e),
    };
    let output = match required_str(output, "Output path") {
        Ok(s) => s,
        Err(e) => return SearchpdfResult::error(e),
    };

    let result = combine_images(input_dir, output, &ConvertOptions::default())
        .and_then(|report| serde_json::to_string(&report).map_err(Into::into));
    match result {
        Ok(json) => SearchpdfResult::success(json),
        Err(e) => SearchpdfResult::error(e.to_string()),
    }
}

/// Check if a file is a supported input image.
///
/// # Safety
///
/// The `path` must be a valid null-terminated UTF-8 string.
#[no_mangle]
pub unsafe extern "C" fn searchpdf_is_image(path: *const c_char) -> bool {
    match required_str(path, "Path") {
        Ok(s) => crate::detect::detect_format_from_path(Path::new(s)).is_ok(),
        Err(_) => false,
    }
}

/// Free a result returned by any searchpdf function.
///
/// # Safety
///
/// The `result` must have been returned by a searchpdf function.
/// This function should only be called once per result.
#[no_mangle]
pub unsafe extern "C" fn searchpdf_free_result(result: SearchpdfResult) {
    if !result.data.is_null() {
        drop(CString::from_raw(result.data));
    }
    if !result.error.is_null() {
        drop(CString::from_raw(result.error));
    }
}

/// Free a string allocated by searchpdf.
///
/// # Safety
///
/// The `ptr` must have been allocated by searchpdf.
/// This function should only be called once per pointer.
#[no_mangle]
pub unsafe extern "C" fn searchpdf_free_string(ptr: *mut c_char) {
    if !ptr.is_null() {
        drop(CString::from_raw(ptr));
    }
}

/// Get the version of the searchpdf library.
///
/// The returned string is statically allocated and must not be freed.
#[no_mangle]
pub extern "C" fn searchpdf_version() -> *const c_char {
    static VERSION: &[u8] = concat!(env!("CARGO_PKG_VERSION"), "\0").as_bytes();
    VERSION.as_ptr() as *const c_char
}

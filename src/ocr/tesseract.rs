//! Engine backed by the `tesseract` command-line program.

use std::collections::HashMap;
use std::path::PathBuf;
use std::process::{Command, Stdio};

use super::{validate_language, OcrEngine, RawDetection};
use crate::error::{Error, Result};
use crate::model::{PagePixels, SourceImage};

/// Runs `tesseract <image> stdout -l <lang> --psm <n> tsv` per image and
/// groups word rows into lines.
#[derive(Debug, Clone)]
pub struct TesseractEngine {
    program: PathBuf,
    language: String,
    psm: u32,
}

impl TesseractEngine {
    /// Create an engine for the given language list (`jpn+eng`).
    pub fn new(language: impl Into<String>) -> Result<Self> {
        let language = language.into();
        validate_language(&language)?;
        Ok(Self {
            program: PathBuf::from("tesseract"),
            language,
            psm: 3,
        })
    }

    /// Use a specific tesseract binary.
    pub fn with_program(mut self, program: impl Into<PathBuf>) -> Self {
        self.program = program.into();
        self
    }

    /// Set the page segmentation mode.
    pub fn with_psm(mut self, psm: u32) -> Self {
        self.psm = psm;
        self
    }

    /// Whether the binary can be started.
    pub fn is_available(&self) -> bool {
        Command::new(&self.program)
            .arg("--version")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map(|s| s.success())
            .unwrap_or(false)
    }

    fn run(&self, image_path: &std::path::Path) -> Result<String> {
        let output = Command::new(&self.program)
            .arg(image_path)
            .arg("stdout")
            .arg("-l")
            .arg(&self.language)
            .arg("--psm")
            .arg(self.psm.to_string())
            .arg("tsv")
            .stdin(Stdio::null())
            .output()
            .map_err(|e| Error::Ocr(format!("failed to run tesseract (is it installed?): {}", e)))?;

        if !output.status.success() {
            return Err(Error::ExternalTool {
                tool: "tesseract".to_string(),
                status: output.status.code(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

impl OcrEngine for TesseractEngine {
    fn name(&self) -> &str {
        "tesseract"
    }

    fn recognize(&self, image: &SourceImage) -> Result<Vec<RawDetection>> {
        // Tesseract reads from disk; synthesized images go through a temp PNG.
        let tsv = if image.path.is_file() {
            self.run(&image.path)?
        } else {
            let tmp = tempfile::Builder::new().suffix(".png").tempfile()?;
            match &image.pixels {
                PagePixels::Gray(img) => img.save_with_format(tmp.path(), image::ImageFormat::Png)?,
                PagePixels::Rgb(img) => img.save_with_format(tmp.path(), image::ImageFormat::Png)?,
            }
            self.run(tmp.path())?
        };
        Ok(parse_tsv(&tsv))
    }
}

struct Word {
    text: String,
    left: f32,
    top: f32,
    right: f32,
    bottom: f32,
    conf: f32,
}

/// Group level-5 (word) rows of Tesseract TSV output into lines.
///
/// Lines come out in the order their first word appears. Each line's
/// confidence is the mean word confidence scaled to [0, 1]; its quad is the
/// union of the word boxes.
pub fn parse_tsv(tsv: &str) -> Vec<RawDetection> {
    let mut order: Vec<(i32, i32, i32, i32)> = Vec::new();
    let mut lines: HashMap<(i32, i32, i32, i32), Vec<Word>> = HashMap::new();

    for row in tsv.lines().skip(1) {
        let cols: Vec<&str> = row.split('\t').collect();
        if cols.len() < 12 {
            continue;
        }
        let level: i32 = cols[0].parse().unwrap_or(0);
        if level != 5 {
            continue;
        }
        let conf: f32 = cols[10].trim().parse().unwrap_or(-1.0);
        let text = cols[11].trim();
        if text.is_empty() || conf < 0.0 {
            continue;
        }

        let num = |i: usize| cols[i].trim().parse::<i32>().unwrap_or(0);
        let key = (num(1), num(2), num(3), num(4));
        let (left, top, width, height) = (num(6) as f32, num(7) as f32, num(8) as f32, num(9) as f32);

        let words = lines.entry(key).or_insert_with(|| {
            order.push(key);
            Vec::new()
        });
        words.push(Word {
            text: text.to_string(),
            left,
            top,
            right: left + width,
            bottom: top + height,
            conf,
        });
    }

    order
        .into_iter()
        .filter_map(|key| lines.remove(&key))
        .map(|words| {
            let text = join_words(words.iter().map(|w| w.text.as_str()));
            let left = words.iter().map(|w| w.left).fold(f32::INFINITY, f32::min);
            let top = words.iter().map(|w| w.top).fold(f32::INFINITY, f32::min);
            let right = words.iter().map(|w| w.right).fold(f32::NEG_INFINITY, f32::max);
            let bottom = words.iter().map(|w| w.bottom).fold(f32::NEG_INFINITY, f32::max);
            let conf = words.iter().map(|w| w.conf).sum::<f32>() / words.len() as f32 / 100.0;
            RawDetection::new(
                vec![(left, top), (right, top), (right, bottom), (left, bottom)],
                text,
                conf,
            )
        })
        .collect()
}

/// Han, kana, CJK punctuation and fullwidth forms. Hangul is excluded
/// because Korean separates words with spaces.
fn is_cjk(c: char) -> bool {
    matches!(c,
        '\u{3000}'..='\u{30FF}'
        | '\u{31F0}'..='\u{31FF}'
        | '\u{3400}'..='\u{4DBF}'
        | '\u{4E00}'..='\u{9FFF}'
        | '\u{F900}'..='\u{FAFF}'
        | '\u{FF00}'..='\u{FFEF}'
        | '\u{20000}'..='\u{2FA1F}')
}

/// Join word texts with spaces, except between two CJK characters where
/// Tesseract's word boundaries are not real spaces.
fn join_words<'a>(words: impl IntoIterator<Item = &'a str>) -> String {
    let mut out = String::new();
    for word in words {
        let joined = match (out.chars().last(), word.chars().next()) {
            (Some(prev), Some(next)) => is_cjk(prev) && is_cjk(next),
            _ => true,
        };
        if !joined {
            out.push(' ');
        }
        out.push_str(word);
    }
    out
}

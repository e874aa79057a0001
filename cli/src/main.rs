//! searchpdf CLI - searchable PDFs from scanned page images

use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Args, Parser, Subcommand, ValueEnum};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};

use searchpdf::{
    combine_images, Accelerator, ConvertOptions, ConvertReport, OcrEngine, OcrmypdfBackend,
    OcrmypdfOptions, Pipeline, ProgressEvent, SidecarEngine, TesseractEngine,
};

type CliResult<T = ()> = Result<T, Box<dyn std::error::Error>>;

#[derive(Parser)]
#[command(name = "searchpdf")]
#[command(author = "iyulab")]
#[command(version)]
#[command(about = "Build searchable PDFs from scanned page images", long_about = None)]
#[command(args_conflicts_with_subcommands = true)]
struct Cli {
    /// Directory of page images
    #[arg(value_name = "DIR")]
    input: Option<PathBuf>,

    /// Output PDF
    #[arg(value_name = "OUTPUT")]
    output: Option<PathBuf>,

    #[command(flatten)]
    ocr: OcrArgs,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert a directory of images into a searchable PDF
    Convert {
        /// Directory of page images
        #[arg(value_name = "DIR")]
        input: PathBuf,

        /// Output PDF (defaults to <DIR>.pdf)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        #[command(flatten)]
        ocr: OcrArgs,
    },

    /// Combine images into an image-only PDF (no text layer)
    Combine {
        /// Directory of page images
        #[arg(value_name = "DIR")]
        input: PathBuf,

        /// Output PDF (defaults to <DIR>.pdf)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },

    /// Combine images, then let ocrmypdf add the text layer
    Ocrmypdf {
        /// Directory of page images
        #[arg(value_name = "DIR")]
        input: PathBuf,

        /// Output PDF (defaults to <DIR>.pdf)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// OCR language list
        #[arg(long, env = "SEARCHPDF_LANG", default_value = "jpn+eng")]
        lang: String,

        /// Use the EasyOCR plugin
        #[arg(long)]
        easyocr: bool,

        /// ocrmypdf worker count
        #[arg(long, default_value = "1")]
        jobs: usize,
    },

    /// Report available accelerator and external tools
    Probe,

    /// Show version information
    Version,
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
enum EngineKind {
    /// JSON results stored next to each image
    Sidecar,
    /// The tesseract command-line program
    Tesseract,
}

#[derive(Args, Clone)]
struct OcrArgs {
    /// OCR engine
    #[arg(long, value_enum, env = "SEARCHPDF_ENGINE", default_value = "sidecar")]
    engine: EngineKind,

    /// Directory holding sidecar JSON files (defaults to the image directory)
    #[arg(long, value_name = "DIR")]
    sidecar_dir: Option<PathBuf>,

    /// Fail when an image has no sidecar file
    #[arg(long)]
    require_sidecar: bool,

    /// Tesseract page segmentation mode
    #[arg(long, default_value = "3")]
    psm: u32,

    /// Minimum region confidence (0.0 - 1.0)
    #[arg(long, env = "SEARCHPDF_THRESHOLD", default_value = "0.6")]
    threshold: f32,

    /// OCR language list
    #[arg(long, env = "SEARCHPDF_LANG", default_value = "jpn+eng")]
    lang: String,

    /// TrueType/OpenType font for the text layer
    #[arg(long, env = "SEARCHPDF_FONT", value_name = "FILE")]
    font: Option<PathBuf>,

    /// Face index inside a font collection (.ttc)
    #[arg(long, default_value = "0")]
    font_index: u32,

    /// Do not probe for a GPU accelerator
    #[arg(long)]
    no_accel: bool,

    /// Worker count (default: 1 with an accelerator, else CPU count)
    #[arg(long)]
    workers: Option<usize>,

    /// Extra OCR attempts per image
    #[arg(long, default_value = "1")]
    retries: u32,

    /// Also write a plain-text dump
    #[arg(long, value_name = "FILE")]
    text: Option<PathBuf>,

    /// Also write a JSON export
    #[arg(long, value_name = "FILE")]
    json: Option<PathBuf>,

    /// Also write a DOCX export
    #[arg(long, value_name = "FILE")]
    docx: Option<PathBuf>,

    /// Document title
    #[arg(long)]
    title: Option<String>,

    /// Use text render mode 3 instead of a transparent fill
    #[arg(long)]
    invisible: bool,

    /// Skip unreadable images instead of failing
    #[arg(long)]
    lenient: bool,

    /// Print the conversion report as JSON
    #[arg(long)]
    report: bool,
}

impl OcrArgs {
    fn convert_options(&self) -> ConvertOptions {
        let mut options = ConvertOptions::new()
            .with_threshold(self.threshold)
            .with_language(self.lang.clone())
            .with_retries(self.retries)
            .with_font_index(self.font_index)
            .with_accelerator(!self.no_accel);

        if let Some(font) = &self.font {
            options = options.with_font(font);
        }
        if let Some(workers) = self.workers {
            options = options.with_workers(workers);
        }
        if let Some(path) = &self.text {
            options = options.with_text_output(path);
        }
        if let Some(path) = &self.json {
            options = options.with_json_output(path);
        }
        if let Some(path) = &self.docx {
            options = options.with_docx_output(path);
        }
        if let Some(title) = &self.title {
            options = options.with_title(title.clone());
        }
        if self.invisible {
            options = options.with_invisible_text();
        }
        if self.lenient {
            options = options.lenient();
        }
        options
    }

    fn engine(&self) -> CliResult<Arc<dyn OcrEngine>> {
        match self.engine {
            EngineKind::Sidecar => {
                let mut engine = SidecarEngine::new().with_strict(self.require_sidecar);
                if let Some(dir) = &self.sidecar_dir {
                    engine = engine.with_dir(dir);
                }
                Ok(Arc::new(engine))
            }
            EngineKind::Tesseract => {
                let engine = TesseractEngine::new(self.lang.clone())?.with_psm(self.psm);
                if !engine.is_available() {
                    return Err("tesseract was not found on PATH".into());
                }
                Ok(Arc::new(engine))
            }
        }
    }
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let result = run(Cli::parse());
    if let Err(e) = &result {
        log::debug!("{:?}", e);
        eprintln!("{}: {}", "Error".red().bold(), e);
    }
    std::process::exit(exit_code(&result));
}

fn run(cli: Cli) -> CliResult {
    match cli.command {
        Some(Commands::Convert { input, output, ocr }) => {
            cmd_convert(&input, output.as_deref(), &ocr)
        }
        Some(Commands::Combine { input, output }) => cmd_combine(&input, output.as_deref()),
        Some(Commands::Ocrmypdf {
            input,
            output,
            lang,
            easyocr,
            jobs,
        }) => cmd_ocrmypdf(&input, output.as_deref(), lang, easyocr, jobs),
        Some(Commands::Probe) => cmd_probe(),
        Some(Commands::Version) => {
            cmd_version();
            Ok(())
        }
        None => {
            // Default behavior: convert if input is provided
            if let Some(input) = cli.input {
                cmd_convert(&input, cli.output.as_deref(), &cli.ocr)
            } else {
                println!("{}", "Usage: searchpdf <DIR> [OUTPUT]".yellow());
                println!("       searchpdf --help for more information");
                Ok(())
            }
        }
    }
}

/// Process exit status: 0 on success, 1 on any error.
fn exit_code(result: &CliResult) -> i32 {
    match result {
        Ok(()) => 0,
        Err(_) => 1,
    }
}

/// `<DIR>.pdf` next to the input directory.
fn default_output(input: &Path) -> PathBuf {
    match input.file_name() {
        Some(name) => {
            let mut file = name.to_os_string();
            file.push(".pdf");
            input.with_file_name(file)
        }
        None => PathBuf::from("output.pdf"),
    }
}

fn progress_bar() -> CliResult<ProgressBar> {
    let pb = ProgressBar::new(0);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")?
            .progress_chars("#>-"),
    );
    Ok(pb)
}

fn track(pb: ProgressBar) -> impl Fn(&ProgressEvent) + Send + Sync + 'static {
    move |event| match event {
        ProgressEvent::Started { total } => pb.set_length(*total as u64),
        ProgressEvent::Page {
            completed,
            filename,
            skipped,
            ..
        } => {
            pb.set_position(*completed as u64);
            if *skipped {
                pb.set_message(format!("skipped {}", filename));
            } else {
                pb.set_message(filename.clone());
            }
        }
        ProgressEvent::Saving { .. } => pb.set_message("Writing PDF..."),
        ProgressEvent::Done => pb.finish_with_message("Done!"),
    }
}

fn print_summary(report: &ConvertReport) {
    println!();
    println!("{} {}", "Saved to".green(), report.output.display());
    println!("{}: {}", "Pages".bold(), report.page_count());
    println!("{}: {}", "Text runs".bold(), report.regions_rendered());
    println!("{}: {}", "Dropped regions".bold(), report.regions_dropped());
    println!("{}: {}", "Font".bold(), report.font_mode);
    println!("{}: {}", "Accelerator".bold(), report.accelerator);

    if report.ocr_failures() > 0 {
        println!(
            "{} {} page(s) have no text layer (OCR failed)",
            "Warning:".yellow().bold(),
            report.ocr_failures()
        );
    }
    if !report.skipped.is_empty() {
        println!(
            "{} skipped {}",
            "Warning:".yellow().bold(),
            report.skipped.join(", ")
        );
    }
    if report.unencodable_chars > 0 {
        println!(
            "{} {} character(s) not encodable with the text-layer font; pass --font with a CJK font",
            "Warning:".yellow().bold(),
            report.unencodable_chars
        );
    }
}

fn cmd_convert(input: &Path, output: Option<&Path>, args: &OcrArgs) -> CliResult {
    let output = output.map(Path::to_path_buf).unwrap_or_else(|| default_output(input));
    let engine = args.engine()?;
    log::info!(
        "Converting {} -> {} with {}",
        input.display(),
        output.display(),
        engine.name()
    );

    let pb = progress_bar()?;
    let report = Pipeline::new(engine, args.convert_options())
        .with_progress(track(pb.clone()))
        .run(input, &output);
    if report.is_err() {
        pb.abandon();
    }
    let report = report?;

    if args.report {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_summary(&report);
    }
    Ok(())
}

fn cmd_combine(input: &Path, output: Option<&Path>) -> CliResult {
    let output = output.map(Path::to_path_buf).unwrap_or_else(|| default_output(input));
    log::info!("Combining {} -> {}", input.display(), output.display());
    let report = combine_images(input, &output, &ConvertOptions::new())?;
    println!(
        "{} {} ({} pages)",
        "Saved to".green(),
        output.display(),
        report.page_count()
    );
    Ok(())
}

fn cmd_ocrmypdf(
    input: &Path,
    output: Option<&Path>,
    lang: String,
    easyocr: bool,
    jobs: usize,
) -> CliResult {
    let output = output.map(Path::to_path_buf).unwrap_or_else(|| default_output(input));

    let mut options = OcrmypdfOptions::new().with_language(lang).with_jobs(jobs);
    if easyocr {
        options = options.with_easyocr();
    }
    log::debug!("ocrmypdf options: {:?}", options);
    let backend = OcrmypdfBackend::new(options);
    if !backend.is_available() {
        return Err("ocrmypdf was not found on PATH".into());
    }

    let pb = ProgressBar::new_spinner();
    pb.set_message("Running ocrmypdf...");
    pb.enable_steady_tick(std::time::Duration::from_millis(120));
    let report = backend.run(input, &output, &ConvertOptions::new());
    pb.finish_and_clear();
    let report = report?;

    println!(
        "{} {} ({} pages)",
        "Saved to".green(),
        output.display(),
        report.page_count()
    );
    Ok(())
}

fn cmd_probe() -> CliResult {
    println!("{}", "Environment".cyan().bold());
    println!("{}", "─".repeat(40).dimmed());

    let accelerator = Accelerator::probe(true);
    println!("{}: {}", "Accelerator".bold(), accelerator);
    println!("{}: {}", "Default workers".bold(), accelerator.default_workers());

    let tesseract = TesseractEngine::new("eng")?.is_available();
    println!("{}: {}", "tesseract".bold(), yes_no(tesseract));

    let ocrmypdf = OcrmypdfBackend::new(OcrmypdfOptions::new());
    match ocrmypdf.version() {
        Ok(version) => println!("{}: {}", "ocrmypdf".bold(), version),
        Err(_) => println!("{}: {}", "ocrmypdf".bold(), yes_no(false)),
    }
    Ok(())
}

fn yes_no(found: bool) -> colored::ColoredString {
    if found {
        "found".green()
    } else {
        "not found".dimmed()
    }
}

fn cmd_version() {
    println!("{} {}", "searchpdf".cyan().bold(), env!("CARGO_PKG_VERSION"));
    println!("Searchable PDF builder for scanned page images");
    println!();
    println!("Repository: {}", "https://github.com/iyulab/searchpdf".dimmed());
    println!("License: MIT");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_output() {
        assert_eq!(default_output(Path::new("scans")), PathBuf::from("scans.pdf"));
        assert_eq!(
            default_output(Path::new("/data/book-1")),
            PathBuf::from("/data/book-1.pdf")
        );
    }

    #[test]
    fn test_parse_convert_args() {
        let cli = Cli::try_parse_from([
            "searchpdf",
            "convert",
            "scans",
            "--threshold",
            "0.8",
            "--invisible",
            "--workers",
            "2",
        ])
        .unwrap();
        match cli.command {
            Some(Commands::Convert { input, ocr, .. }) => {
                assert_eq!(input, PathBuf::from("scans"));
                let options = ocr.convert_options();
                assert_eq!(options.ocr.threshold, 0.8);
                assert_eq!(options.workers, Some(2));
            }
            _ => panic!("expected convert"),
        }
    }

    #[test]
    fn test_missing_input_exits_nonzero() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing");
        let output = dir.path().join("out.pdf");
        let cli = Cli::try_parse_from([
            "searchpdf",
            "convert",
            missing.to_str().unwrap(),
            "-o",
            output.to_str().unwrap(),
            "--no-accel",
        ])
        .unwrap();

        let result = run(cli);
        assert!(matches!(
            result
                .as_ref()
                .unwrap_err()
                .downcast_ref::<searchpdf::Error>(),
            Some(searchpdf::Error::InputDirNotFound(_))
        ));
        assert_eq!(exit_code(&result), 1);
        assert!(!output.exists());
    }

    #[test]
    fn test_directory_without_images_exits_nonzero() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("notes.txt"), "no pages here").unwrap();
        let output = dir.path().join("out.pdf");
        let cli = Cli::try_parse_from([
            "searchpdf",
            dir.path().to_str().unwrap(),
            output.to_str().unwrap(),
            "--no-accel",
        ])
        .unwrap();

        let result = run(cli);
        assert!(matches!(
            result
                .as_ref()
                .unwrap_err()
                .downcast_ref::<searchpdf::Error>(),
            Some(searchpdf::Error::NoImagesFound(_))
        ));
        assert_eq!(exit_code(&result), 1);
        assert!(!output.exists());
    }

    #[test]
    fn test_exit_code_success() {
        assert_eq!(exit_code(&Ok(())), 0);
    }

    #[test]
    fn test_bare_directory_argument() {
        let cli = Cli::try_parse_from(["searchpdf", "scans", "out.pdf"]).unwrap();
        assert!(cli.command.is_none());
        assert_eq!(cli.output, Some(PathBuf::from("out.pdf")));
    }
}

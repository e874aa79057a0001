//! The directory-to-PDF pipeline.
//!
//! Workers on a bounded `rayon` pool load, recognize and encode images.
//! They claim images in index order, at most a fixed window ahead of the
//! page being composed, and may finish in any order. Results cross a
//! channel to the calling thread, which buffers them by index and composes
//! pages strictly in input order, so the document never depends on which
//! worker finished first. The window caps how many prepared pages are held
//! in memory when an early page is slow.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use crossbeam_channel::{Receiver, Sender};

use super::cancel::CancellationToken;
use super::options::{ConvertOptions, ErrorMode};
use super::report::{ConvertReport, PageReport, ProgressCallback, ProgressEvent};
use crate::error::{Error, Result};
use crate::input::{ImageEntry, ImageLoader};
use crate::model::PageText;
use crate::ocr::{Accelerator, NoTextEngine, OcrAdapter, OcrEngine};
use crate::pdf::{DocumentAssembler, PageCompositor, PreparedPage};
use crate::render;

type WorkResult = (usize, Result<Option<PreparedPage>>);

/// Converts a directory of page images into one searchable PDF.
pub struct Pipeline {
    engine: Arc<dyn OcrEngine>,
    options: ConvertOptions,
    accelerator: Accelerator,
    cancel: CancellationToken,
    progress: Option<ProgressCallback>,
}

impl Pipeline {
    /// Create a pipeline around `engine`. The accelerator is probed once
    /// here when the options allow it.
    pub fn new(engine: Arc<dyn OcrEngine>, options: ConvertOptions) -> Self {
        let accelerator = Accelerator::probe(options.use_accelerator);
        Self {
            engine,
            options,
            accelerator,
            cancel: CancellationToken::new(),
            progress: None,
        }
    }

    /// A pipeline that produces image-only pages.
    pub fn images_only(options: ConvertOptions) -> Self {
        Self {
            engine: Arc::new(NoTextEngine),
            options,
            accelerator: Accelerator::Unavailable,
            cancel: CancellationToken::new(),
            progress: None,
        }
    }

    /// Override the probed accelerator state.
    pub fn with_accelerator(mut self, accelerator: Accelerator) -> Self {
        self.accelerator = accelerator;
        self
    }

    /// Use an externally owned cancellation token.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// Receive progress events.
    pub fn with_progress<F>(mut self, callback: F) -> Self
    where
        F: Fn(&ProgressEvent) + Send + Sync + 'static,
    {
        self.progress = Some(Box::new(callback));
        self
    }

    pub fn options(&self) -> &ConvertOptions {
        &self.options
    }

    pub fn accelerator(&self) -> Accelerator {
        self.accelerator
    }

    /// A token that cancels this pipeline.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Convert every image in `input_dir` into `output`.
    ///
    /// Precondition failures (bad options, missing directory, no images)
    /// are reported before anything is written. The PDF only appears at
    /// `output` once every page has been composed.
    pub fn run(&self, input_dir: impl AsRef<Path>, output: impl AsRef<Path>) -> Result<ConvertReport> {
        let input_dir = input_dir.as_ref();
        let output = output.as_ref();

        self.options.validate()?;
        let loader = ImageLoader::new(self.options.load.clone());
        let entries = loader.scan(input_dir)?;
        let total = entries.len();
        self.emit(ProgressEvent::Started { total });

        let adapter = OcrAdapter::new(
            Arc::clone(&self.engine),
            self.options.ocr.clone(),
            self.accelerator,
        );
        let workers = self
            .options
            .workers
            .unwrap_or_else(|| self.accelerator.default_workers())
            .max(1);
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(workers)
            .thread_name(|i| format!("searchpdf-worker-{}", i))
            .build()
            .map_err(|e| Error::Other(format!("failed to start worker pool: {}", e)))?;

        log::info!(
            "Converting {} image(s) with {} worker(s), engine {}, accelerator {}",
            total,
            workers,
            adapter.engine_name(),
            self.accelerator
        );

        let mut assembly = Assembly {
            compositor: self.options.render.compositor(),
            assembler: DocumentAssembler::new(self.options.render.load_font(), self.options.metadata()),
            report: ConvertReport::new(output.to_path_buf(), total, self.accelerator),
            texts: Vec::with_capacity(total),
        };
        let window = workers * 2;
        let (queue, permits) = WorkQueue::new(&entries, window);
        let (tx, rx) = crossbeam_channel::bounded::<WorkResult>(window);

        std::thread::scope(|scope| -> Result<()> {
            let queue = &queue;
            let (loader, adapter) = (&loader, &adapter);
            let producer = scope.spawn(move || {
                pool.scope(|workers_scope| {
                    for _ in 0..workers {
                        let tx = tx.clone();
                        workers_scope.spawn(move |_| self.work(queue, loader, adapter, tx));
                    }
                });
            });

            let collected = self.collect(rx, &entries, &permits, &mut assembly);
            queue.halt();
            // Wakes workers still waiting for a permit.
            drop(permits);
            producer
                .join()
                .map_err(|_| Error::Other("worker thread panicked".into()))?;
            collected
        })?;

        if self.cancel.is_cancelled() {
            log::warn!("Conversion cancelled; nothing written");
            return Err(Error::Cancelled);
        }

        let Assembly {
            assembler,
            mut report,
            texts,
            ..
        } = assembly;

        report.font_mode = assembler.font().mode();
        report.unencodable_chars = assembler.font().lost_chars();
        if report.unencodable_chars > 0 {
            log::warn!(
                "{} character(s) could not be encoded with the {} font",
                report.unencodable_chars,
                report.font_mode
            );
        }

        self.emit(ProgressEvent::Saving {
            path: output.to_path_buf(),
        });
        assembler.save(output)?;
        self.write_exports(&texts)?;
        self.emit(ProgressEvent::Done);

        log::info!(
            "Done: {} page(s), {} text run(s), {} region(s) dropped, {} skipped",
            report.page_count(),
            report.regions_rendered(),
            report.regions_dropped(),
            report.skipped.len()
        );
        Ok(report)
    }

    /// Worker loop: claim images until the queue is exhausted or halted.
    fn work(
        &self,
        queue: &WorkQueue<'_>,
        loader: &ImageLoader,
        adapter: &OcrAdapter,
        tx: Sender<WorkResult>,
    ) {
        while let Some(entry) = queue.claim() {
            let result = if self.cancel.is_cancelled() {
                Err(Error::Cancelled)
            } else {
                self.prepare(loader, adapter, entry)
            };
            // The receiver is gone only when assembly already stopped.
            if tx.send((entry.index, result)).is_err() {
                break;
            }
        }
    }

    /// Worker side: load, recognize and encode one image.
    fn prepare(
        &self,
        loader: &ImageLoader,
        adapter: &OcrAdapter,
        entry: &ImageEntry,
    ) -> Result<Option<PreparedPage>> {
        let image = match loader.load(entry) {
            Ok(image) => image,
            Err(e) if self.options.error_mode == ErrorMode::Lenient => {
                log::warn!("Skipping {}: {}", entry.path.display(), e);
                return Ok(None);
            }
            Err(e) => return Err(e),
        };

        let prepared = match adapter.recognize_with_retry(&image) {
            Ok(recognition) => PreparedPage::new(&image, recognition)?,
            Err(e) => {
                log::warn!(
                    "OCR failed for {} ({}); page will have no text layer",
                    image.file_name(),
                    e
                );
                PreparedPage::without_text(&image, true)?
            }
        };
        Ok(Some(prepared))
    }

    /// Assembling side: reorder results and compose pages in index order.
    /// Each composed page hands one permit back to the workers.
    fn collect(
        &self,
        rx: Receiver<WorkResult>,
        entries: &[ImageEntry],
        permits: &Sender<()>,
        assembly: &mut Assembly,
    ) -> Result<()> {
        let total = entries.len();
        let mut pending = BTreeMap::new();
        let mut next = 0;

        for (index, result) in rx {
            if self.cancel.is_cancelled() {
                return Err(Error::Cancelled);
            }
            pending.insert(index, result);

            while let Some(result) = pending.remove(&next) {
                if self.cancel.is_cancelled() {
                    return Err(Error::Cancelled);
                }

                let filename = entries[next].file_name();
                next += 1;
                let _ = permits.try_send(());
                let skipped = match result? {
                    Some(prepared) => {
                        assembly.add(prepared)?;
                        false
                    }
                    None => {
                        assembly.report.skipped.push(filename.clone());
                        true
                    }
                };

                self.emit(ProgressEvent::Page {
                    completed: next,
                    total,
                    filename,
                    skipped,
                });
            }

            if next == total {
                break;
            }
        }

        if next < total {
            // Workers stop early only on cancellation.
            return Err(Error::Cancelled);
        }
        Ok(())
    }

    fn write_exports(&self, texts: &[PageText]) -> Result<()> {
        let title = self.options.title.as_deref();
        if let Some(path) = &self.options.text_output {
            render::write_text(texts, path)?;
        }
        if let Some(path) = &self.options.json_output {
            render::write_json(texts, title, path)?;
        }
        if let Some(path) = &self.options.docx_output {
            render::write_docx(texts, title, path)?;
        }
        Ok(())
    }

    fn emit(&self, event: ProgressEvent) {
        if let Some(callback) = &self.progress {
            callback(&event);
        }
    }
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("engine", &self.engine.name())
            .field("options", &self.options)
            .field("accelerator", &self.accelerator)
            .field("cancelled", &self.cancel.is_cancelled())
            .finish()
    }
}

/// Hands entries to workers in index order, never more than `window`
/// ahead of the page being composed. Every claim takes a permit; the
/// assembling thread returns one per composed page, so claimed but not yet
/// composed pages (in flight, queued or buffered for reordering) never
/// exceed the window.
struct WorkQueue<'a> {
    entries: &'a [ImageEntry],
    next: AtomicUsize,
    permits: Receiver<()>,
    halted: AtomicBool,
}

impl<'a> WorkQueue<'a> {
    /// The queue and the sender used to return permits.
    fn new(entries: &'a [ImageEntry], window: usize) -> (Self, Sender<()>) {
        let window = window.max(1);
        let (permits_tx, permits) = crossbeam_channel::bounded(window);
        for _ in 0..window {
            let _ = permits_tx.try_send(());
        }
        let queue = Self {
            entries,
            next: AtomicUsize::new(0),
            permits,
            halted: AtomicBool::new(false),
        };
        (queue, permits_tx)
    }

    /// Next entry, waiting until the window has room. `None` once every
    /// entry is claimed, the queue is halted, or the permit sender is gone.
    fn claim(&self) -> Option<&'a ImageEntry> {
        self.permits.recv().ok()?;
        if self.halted.load(Ordering::SeqCst) {
            return None;
        }
        self.entries.get(self.next.fetch_add(1, Ordering::SeqCst))
    }

    fn halt(&self) {
        self.halted.store(true, Ordering::SeqCst);
    }
}

/// State owned by the assembling thread.
struct Assembly {
    compositor: PageCompositor,
    assembler: DocumentAssembler,
    report: ConvertReport,
    texts: Vec<PageText>,
}

impl Assembly {
    fn add(&mut self, prepared: PreparedPage) -> Result<()> {
        let filename = prepared.filename.clone();
        let dimensions = (prepared.width, prepared.height);
        let stats = prepared.stats;
        let ocr_failed = prepared.ocr_failed;

        let page = self.compositor.compose(prepared, self.assembler.font_mut())?;
        self.texts.push(page.page_text(filename.clone()));
        self.report.pages.push(PageReport::new(
            self.report.pages.len(),
            filename,
            dimensions,
            stats,
            page.clamped(),
            ocr_failed,
        ));
        self.assembler.add_page(page)
    }
}

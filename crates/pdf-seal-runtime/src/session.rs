//! Stamping session: upload → decode → slice → compose → export
//!
//! All state lives in an explicit [`SessionState`] owned by
//! [`SealSession`]. Every operation runs to completion or failure; a
//! failed step is marked as errored while artifacts of earlier steps are
//! kept, so the user can retry only the step that failed.

use pdf_seal::{
    PageGeometry, Result, SealError, SealImage, SealOptions, SealSlice, Step, StepStatus,
    decode_seal_async, ensure_pdf_media_type, ensure_seal_media_type, load_pdf_bytes,
    page_geometries, slice_seal_async, stamp_pdf, stamped_file_name, write_pdf_atomic,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::mpsc;

/// Where the session is in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionStage {
    #[default]
    Idle,
    SealLoaded,
    PdfLoaded,
    Sliced,
    Generating,
    Generated,
    /// The given step failed; earlier artifacts are still available
    Error(Step),
}

/// Kind of a user-visible status message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    Loading,
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusMessage {
    pub kind: MessageKind,
    pub text: String,
}

impl StatusMessage {
    pub fn is_error(&self) -> bool {
        self.kind == MessageKind::Error
    }
}

/// A parsed input document
#[derive(Debug, Clone)]
pub struct LoadedPdf {
    pub file_name: Option<String>,
    pub bytes: Vec<u8>,
    pub pages: Vec<PageGeometry>,
}

impl LoadedPdf {
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }
}

/// The finished, fully serialized output document
#[derive(Debug, Clone)]
pub struct GeneratedPdf {
    pub file_name: String,
    pub bytes: Vec<u8>,
    pub page_count: usize,
}

/// Receives progress from a running session
pub trait SessionObserver: Send {
    fn on_status(&mut self, _message: &StatusMessage) {}
    fn on_step(&mut self, _step: Step, _status: StepStatus) {}
    fn on_stage(&mut self, _stage: SessionStage) {}
    /// Overall generation progress in percent, never decreasing within a run
    fn on_progress(&mut self, _percent: u8) {}
    fn on_page_stamped(&mut self, _current: usize, _total: usize) {}
}

/// Observer that ignores everything
impl SessionObserver for () {}

#[derive(Debug, Default)]
pub struct SessionState {
    pub options: SealOptions,
    pub seal: Option<Arc<SealImage>>,
    /// File name of the uploaded seal, if known
    pub seal_name: Option<String>,
    pub pdf: Option<LoadedPdf>,
    /// Slices for the current document; empty when stale or not yet cut
    pub slices: Vec<SealSlice>,
    pub generated: Option<GeneratedPdf>,
    pub stage: SessionStage,
    pub steps: [StepStatus; 4],
    pub status: Option<StatusMessage>,
}

impl SessionState {
    pub fn step_status(&self, step: Step) -> StepStatus {
        self.steps[step.index()]
    }

    /// Slices exist and match the current document's page count
    pub fn slices_fresh(&self) -> bool {
        match &self.pdf {
            Some(pdf) => !self.slices.is_empty() && self.slices.len() == pdf.page_count(),
            None => false,
        }
    }

    pub fn can_generate(&self) -> bool {
        self.seal.is_some()
            && self.pdf.is_some()
            && self.slices_fresh()
            && self.stage != SessionStage::Generating
    }

    /// Stage implied by the artifacts currently held
    fn settled_stage(&self) -> SessionStage {
        if self.generated.is_some() {
            SessionStage::Generated
        } else if self.slices_fresh() {
            SessionStage::Sliced
        } else if self.pdf.is_some() {
            SessionStage::PdfLoaded
        } else if self.seal.is_some() {
            SessionStage::SealLoaded
        } else {
            SessionStage::Idle
        }
    }
}

/// Generation progress in percent after `done` of `total` pages.
///
/// Pages span 10..=60; serialization reports 90 and completion 100.
pub fn generation_percent(done: usize, total: usize) -> u8 {
    if total == 0 {
        return 10;
    }
    let done = done.min(total);
    (10 + (done * 50 + total / 2) / total) as u8
}

pub struct SealSession {
    state: SessionState,
}

impl Default for SealSession {
    fn default() -> Self {
        Self::new(SealOptions::default())
    }
}

impl SealSession {
    pub fn new(options: SealOptions) -> Self {
        Self {
            state: SessionState {
                options,
                ..Default::default()
            },
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// Replace the stamping options. A previously generated document no
    /// longer matches and is dropped.
    pub fn set_options(
        &mut self,
        options: SealOptions,
        observer: &mut dyn SessionObserver,
    ) -> Result<()> {
        options.validate()?;
        if options != self.state.options {
            log::info!(
                "Options changed: anchor={}, diameter={}mm",
                options.anchor,
                options.seal_diameter_mm
            );
            self.state.options = options;
            if self.state.generated.take().is_some() {
                self.settle(observer);
            }
            self.refresh_generate_step(observer);
        }
        Ok(())
    }

    /// Accept a seal upload. Slices automatically if a PDF is loaded.
    pub async fn load_seal(
        &mut self,
        bytes: Vec<u8>,
        media_type: &str,
        file_name: Option<String>,
        observer: &mut dyn SessionObserver,
    ) -> Result<()> {
        if let Err(e) = ensure_seal_media_type(media_type) {
            return self.fail(Step::Seal, e, observer);
        }

        self.set_step(Step::Seal, StepStatus::InProgress, observer);
        self.report(MessageKind::Loading, "Loading seal image...", observer);

        let seal = match decode_seal_async(bytes).await {
            Ok(seal) => seal,
            Err(e) => return self.fail(Step::Seal, e, observer),
        };

        let message = format!(
            "Seal image loaded ({}x{} px)",
            seal.width_px(),
            seal.height_px()
        );
        self.state.seal = Some(Arc::new(seal));
        self.state.seal_name = file_name;
        self.discard_derived(observer);
        self.set_step(Step::Seal, StepStatus::Completed, observer);
        self.report(MessageKind::Success, message, observer);
        self.settle(observer);

        self.auto_slice(observer).await
    }

    /// Accept a PDF upload. Slices automatically if a seal is loaded.
    pub async fn load_pdf(
        &mut self,
        bytes: Vec<u8>,
        media_type: &str,
        file_name: Option<String>,
        observer: &mut dyn SessionObserver,
    ) -> Result<()> {
        if let Err(e) = ensure_pdf_media_type(media_type) {
            return self.fail(Step::Pdf, e, observer);
        }

        self.set_step(Step::Pdf, StepStatus::InProgress, observer);
        self.report(MessageKind::Loading, "Loading PDF...", observer);

        let pages = match load_pdf_bytes(bytes.clone()).await {
            Ok(doc) => page_geometries(&doc),
            Err(e) => Err(e),
        };
        let pages = match pages {
            Ok(pages) if pages.is_empty() => return self.fail(Step::Pdf, SealError::NoPages, observer),
            Ok(pages) => pages,
            Err(e) => return self.fail(Step::Pdf, e, observer),
        };

        let message = format!("PDF loaded, {} pages", pages.len());
        self.state.pdf = Some(LoadedPdf {
            file_name,
            bytes,
            pages,
        });
        self.discard_derived(observer);
        self.set_step(Step::Pdf, StepStatus::Completed, observer);
        self.report(MessageKind::Success, message, observer);
        self.settle(observer);

        self.auto_slice(observer).await
    }

    /// Cut the seal into one slice per page of the loaded PDF
    pub async fn slice(&mut self, observer: &mut dyn SessionObserver) -> Result<()> {
        let Some(seal) = self.state.seal.clone() else {
            return self.reject("Load a seal image first", observer);
        };
        let Some(page_count) = self.state.pdf.as_ref().map(LoadedPdf::page_count) else {
            return self.reject("Load a PDF first", observer);
        };

        self.set_step(Step::Slice, StepStatus::InProgress, observer);
        self.report(MessageKind::Loading, "Slicing seal...", observer);
        self.state.slices.clear();

        match slice_seal_async(seal, page_count).await {
            Ok(slices) => {
                self.state.slices = slices;
                self.set_step(Step::Slice, StepStatus::Completed, observer);
                self.report(
                    MessageKind::Success,
                    format!("Seal cut into {} slices", page_count),
                    observer,
                );
                self.settle(observer);
                self.refresh_generate_step(observer);
                Ok(())
            }
            Err(e) => {
                let result = self.fail(Step::Slice, e, observer);
                self.refresh_generate_step(observer);
                result
            }
        }
    }

    /// Stamp every page and keep the serialized result.
    ///
    /// Stale slices are regenerated first. The generated document is only
    /// published once serialization has succeeded.
    pub async fn generate(&mut self, observer: &mut dyn SessionObserver) -> Result<()> {
        if self.state.seal.is_none() {
            return self.reject("Load a seal image and slice it first", observer);
        }
        let Some(pdf) = self.state.pdf.as_ref() else {
            return self.reject("Load a PDF first", observer);
        };
        let (pdf_bytes, source_name) = (pdf.bytes.clone(), pdf.file_name.clone());

        if !self.state.slices_fresh() {
            log::info!("Slices do not match the document, slicing again");
            self.slice(observer).await?;
        }

        self.state.generated = None;
        self.transition(SessionStage::Generating, observer);
        self.set_step(Step::Generate, StepStatus::InProgress, observer);
        self.report(MessageKind::Loading, "Generating stamped PDF...", observer);
        observer.on_progress(0);

        let (page_tx, mut page_rx) = mpsc::unbounded_channel();
        let task = tokio::spawn(stamp_pdf(
            pdf_bytes,
            self.state.slices.clone(),
            self.state.options.clone(),
            move |done, total| {
                let _ = page_tx.send((done, total));
            },
        ));

        // The sender lives in the stamping closure, so this ends with the task
        while let Some((done, total)) = page_rx.recv().await {
            observer.on_page_stamped(done, total);
            observer.on_progress(generation_percent(done, total));
            if done == total {
                observer.on_progress(90);
            }
        }

        let stamped = match task.await {
            Ok(result) => result,
            Err(e) => Err(SealError::Composition(e.to_string())),
        };

        match stamped {
            Ok(bytes) => {
                let page_count = self.state.slices.len();
                let file_name = stamped_file_name(source_name.as_deref());
                log::info!(
                    "Generated {} ({} pages, {} bytes)",
                    file_name,
                    page_count,
                    bytes.len()
                );
                self.state.generated = Some(GeneratedPdf {
                    file_name,
                    bytes,
                    page_count,
                });
                observer.on_progress(100);
                self.set_step(Step::Generate, StepStatus::Completed, observer);
                self.report(MessageKind::Success, "Stamped PDF generated", observer);
                self.settle(observer);
                Ok(())
            }
            Err(e) => self.fail(Step::Generate, e, observer),
        }
    }

    /// Write the generated document. `destination` may be a directory, in
    /// which case the derived file name is used inside it.
    pub async fn export(
        &mut self,
        destination: &Path,
        observer: &mut dyn SessionObserver,
    ) -> Result<PathBuf> {
        let Some(generated) = self.state.generated.as_ref() else {
            return self.reject("Generate the stamped PDF first", observer);
        };

        let is_dir = tokio::fs::metadata(destination)
            .await
            .map(|meta| meta.is_dir())
            .unwrap_or(false);
        let path = if is_dir {
            destination.join(&generated.file_name)
        } else {
            destination.to_path_buf()
        };

        match write_pdf_atomic(&path, &generated.bytes).await {
            Ok(()) => {
                log::info!("Saved {}", path.display());
                self.report(
                    MessageKind::Success,
                    format!("Saved to {}", path.display()),
                    observer,
                );
                Ok(path)
            }
            Err(e) => {
                log::error!("Saving {} failed: {}", path.display(), e);
                self.report(MessageKind::Error, format!("Saving failed: {}", e), observer);
                Err(e)
            }
        }
    }

    async fn auto_slice(&mut self, observer: &mut dyn SessionObserver) -> Result<()> {
        if self.state.seal.is_some() && self.state.pdf.is_some() && !self.state.slices_fresh() {
            log::debug!("Seal and PDF present without slices, slicing automatically");
            self.slice(observer).await
        } else {
            self.refresh_generate_step(observer);
            Ok(())
        }
    }

    /// Drop slices and output derived from the previous inputs
    fn discard_derived(&mut self, observer: &mut dyn SessionObserver) {
        self.state.slices.clear();
        self.state.generated = None;
        self.set_step(Step::Slice, StepStatus::Pending, observer);
        self.refresh_generate_step(observer);
    }

    /// The generate step shows as in progress once everything it needs is ready
    fn refresh_generate_step(&mut self, observer: &mut dyn SessionObserver) {
        if self.state.generated.is_some() {
            return;
        }
        let status = if self.state.can_generate() {
            StepStatus::InProgress
        } else {
            StepStatus::Pending
        };
        self.set_step(Step::Generate, status, observer);
    }

    fn set_step(&mut self, step: Step, status: StepStatus, observer: &mut dyn SessionObserver) {
        if self.state.steps[step.index()] != status {
            self.state.steps[step.index()] = status;
            observer.on_step(step, status);
        }
    }

    fn transition(&mut self, stage: SessionStage, observer: &mut dyn SessionObserver) {
        if self.state.stage != stage {
            log::debug!("Session stage {:?} -> {:?}", self.state.stage, stage);
            self.state.stage = stage;
            observer.on_stage(stage);
        }
    }

    fn settle(&mut self, observer: &mut dyn SessionObserver) {
        let stage = self.state.settled_stage();
        self.transition(stage, observer);
    }

    fn report(
        &mut self,
        kind: MessageKind,
        text: impl Into<String>,
        observer: &mut dyn SessionObserver,
    ) {
        let message = StatusMessage {
            kind,
            text: text.into(),
        };
        observer.on_status(&message);
        self.state.status = Some(message);
    }

    /// Refuse an operation whose prerequisites are missing
    fn reject<T>(&mut self, text: &str, observer: &mut dyn SessionObserver) -> Result<T> {
        self.report(MessageKind::Error, text, observer);
        Err(SealError::InvalidState(text.to_string()))
    }

    fn fail<T>(
        &mut self,
        step: Step,
        err: SealError,
        observer: &mut dyn SessionObserver,
    ) -> Result<T> {
        log::error!("{:?} step failed: {}", step, err);
        self.set_step(step, StepStatus::Error, observer);
        self.report(MessageKind::Error, err.to_string(), observer);
        self.transition(SessionStage::Error(step), observer);
        Err(err)
    }
}

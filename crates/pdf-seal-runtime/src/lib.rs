mod session;
mod worker;

use std::path::PathBuf;

pub use session::{
    GeneratedPdf, LoadedPdf, MessageKind, SealSession, SessionObserver, SessionStage,
    SessionState, StatusMessage, generation_percent,
};
pub use worker::worker_task;

// Re-export types from the core crate
pub use pdf_seal::{Anchor, SealError, SealOptions, Step, StepStatus};

/// Commands sent from the front end to the worker
#[derive(Debug)]
pub enum SealCommand {
    LoadSeal {
        bytes: Vec<u8>,
        media_type: String,
        file_name: Option<String>,
    },
    LoadPdf {
        bytes: Vec<u8>,
        media_type: String,
        file_name: Option<String>,
    },
    SetOptions {
        options: SealOptions,
    },
    Slice,
    Generate,
    /// Write the generated PDF to a file, or into a directory under the
    /// derived name
    Export {
        destination: PathBuf,
    },
}

impl SealCommand {
    pub fn name(&self) -> &'static str {
        match self {
            SealCommand::LoadSeal { .. } => "load-seal",
            SealCommand::LoadPdf { .. } => "load-pdf",
            SealCommand::SetOptions { .. } => "set-options",
            SealCommand::Slice => "slice",
            SealCommand::Generate => "generate",
            SealCommand::Export { .. } => "export",
        }
    }
}

/// Updates sent from the worker to the front end
#[derive(Debug, Clone)]
pub enum SealUpdate {
    Status {
        kind: MessageKind,
        message: String,
    },
    StepChanged {
        step: Step,
        status: StepStatus,
    },
    StageChanged {
        stage: SessionStage,
    },
    /// Per-page progress while stamping
    Progress {
        operation: String,
        current: usize,
        total: usize,
    },
    /// Overall generation progress in percent
    Percent {
        percent: u8,
    },
    SealLoaded {
        file_name: Option<String>,
        width_px: u32,
        height_px: u32,
    },
    PdfLoaded {
        page_count: usize,
    },
    Sliced {
        slice_count: usize,
    },
    Generated {
        file_name: String,
        page_count: usize,
        byte_len: usize,
    },
    Exported {
        path: PathBuf,
    },
    Error {
        message: String,
    },
    /// The command has been fully processed
    Finished {
        command: &'static str,
        ok: bool,
    },
}

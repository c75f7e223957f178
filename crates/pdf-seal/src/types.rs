use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SealError {
    #[error("Unsupported media type for {input}: {found}")]
    UnsupportedMediaType { input: InputKind, found: String },
    #[error("Seal image could not be decoded: {0}")]
    Decode(String),
    #[error("PDF could not be loaded: {0}")]
    DocumentLoad(lopdf::Error),
    #[error("Invalid page count: {0} (must be at least 1)")]
    InvalidPageCount(usize),
    #[error("Slicing failed: {0}")]
    Slice(String),
    #[error("Composition failed: {0}")]
    Composition(String),
    #[error("Export failed: {0}")]
    Export(std::io::Error),
    #[error("PDF error: {0}")]
    Pdf(#[from] lopdf::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid configuration: {0}")]
    Config(String),
    #[error("Task join error: {0}")]
    TaskJoin(#[from] tokio::task::JoinError),
    #[error("Invalid state: {0}")]
    InvalidState(String),
    #[error("Document has no pages")]
    NoPages,
}

pub type Result<T> = std::result::Result<T, SealError>;

/// Which of the two user inputs a media type check applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputKind {
    Seal,
    Pdf,
}

impl fmt::Display for InputKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InputKind::Seal => f.write_str("seal image"),
            InputKind::Pdf => f.write_str("PDF document"),
        }
    }
}

/// Vertical position of the seal strip on each page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case"))]
pub enum Anchor {
    /// One third of the page height down from the top edge
    UpperThird,
    /// Vertically centered
    #[default]
    Center,
    /// One third of the page height up from the bottom edge
    LowerThird,
}

impl Anchor {
    pub const ALL: [Anchor; 3] = [Anchor::UpperThird, Anchor::Center, Anchor::LowerThird];

    pub fn as_str(self) -> &'static str {
        match self {
            Anchor::UpperThird => "upper-third",
            Anchor::Center => "center",
            Anchor::LowerThird => "lower-third",
        }
    }

    /// Parse an anchor, falling back to `Center` for anything unrecognized.
    /// Used for the CLI `--anchor` flag; config files go through the strict
    /// `FromStr`.
    pub fn parse_or_center(s: &str) -> Self {
        s.parse().unwrap_or_default()
    }
}

impl fmt::Display for Anchor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Anchor {
    type Err = SealError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "upper-third" | "upper" | "1/3" => Ok(Anchor::UpperThird),
            "center" | "centre" | "middle" | "1/2" => Ok(Anchor::Center),
            "lower-third" | "lower" | "2/3" => Ok(Anchor::LowerThird),
            other => Err(SealError::Config(format!("Unknown anchor: {}", other))),
        }
    }
}

/// Size of a PDF page in points
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageGeometry {
    pub width_pt: f32,
    pub height_pt: f32,
    /// Lower-left corner of the MediaBox. Placements are computed relative
    /// to this origin and translated when drawn.
    pub origin_x_pt: f32,
    pub origin_y_pt: f32,
}

impl PageGeometry {
    pub fn new(width_pt: f32, height_pt: f32) -> Self {
        Self {
            width_pt,
            height_pt,
            origin_x_pt: 0.0,
            origin_y_pt: 0.0,
        }
    }

    pub fn with_origin(mut self, x_pt: f32, y_pt: f32) -> Self {
        self.origin_x_pt = x_pt;
        self.origin_y_pt = y_pt;
        self
    }
}

/// The four user-visible steps of a stamping session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Step {
    /// Load the seal image
    Seal,
    /// Load the PDF document
    Pdf,
    /// Cut the seal into one slice per page
    Slice,
    /// Stamp the slices onto the pages
    Generate,
}

impl Step {
    pub fn index(self) -> usize {
        match self {
            Step::Seal => 0,
            Step::Pdf => 1,
            Step::Slice => 2,
            Step::Generate => 3,
        }
    }
}

/// Status indicator for a single step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StepStatus {
    #[default]
    Pending,
    InProgress,
    Completed,
    Error,
}

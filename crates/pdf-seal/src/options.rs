use crate::constants::{DEFAULT_SEAL_DIAMETER_MM, mm_to_pt};
use crate::types::*;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Stamping configuration
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct SealOptions {
    /// Vertical position of the seal on each page
    pub anchor: Anchor,
    /// Real-world diameter of the seal
    pub seal_diameter_mm: f32,
}

impl Default for SealOptions {
    fn default() -> Self {
        Self {
            anchor: Anchor::Center,
            seal_diameter_mm: DEFAULT_SEAL_DIAMETER_MM,
        }
    }
}

impl SealOptions {
    /// Seal diameter in PDF points
    pub fn seal_diameter_pt(&self) -> f32 {
        mm_to_pt(self.seal_diameter_mm)
    }

    /// Load options from JSON file
    #[cfg(feature = "serde")]
    pub async fn load(path: impl AsRef<std::path::Path>) -> Result<Self> {
        let bytes = tokio::fs::read(path).await?;
        let options: SealOptions = serde_json::from_slice(&bytes)
            .map_err(|e| SealError::Config(format!("Failed to parse config: {}", e)))?;
        options.validate()?;
        Ok(options)
    }

    /// Save options to JSON file
    #[cfg(feature = "serde")]
    pub async fn save(&self, path: impl AsRef<std::path::Path>) -> Result<()> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| SealError::Config(format!("Failed to serialize config: {}", e)))?;
        tokio::fs::write(path, json).await?;
        Ok(())
    }

    /// Validate the options
    pub fn validate(&self) -> Result<()> {
        if !self.seal_diameter_mm.is_finite() || self.seal_diameter_mm <= 0.0 {
            return Err(SealError::Config(format!(
                "Seal diameter must be a positive number of millimeters, got {}",
                self.seal_diameter_mm
            )));
        }
        Ok(())
    }
}

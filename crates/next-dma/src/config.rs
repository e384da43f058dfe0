//! Configuration for the DMA controller.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::csr::CsrEncoding;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MachineType {
    /// 68030 NeXT Computer. Byte-wide CSRs.
    Cube030,
    /// 68040 NeXTcube.
    #[default]
    Cube040,
    /// 68040 NeXTstation.
    Station,
}

impl MachineType {
    #[must_use]
    pub fn csr_encoding(self) -> CsrEncoding {
        match self {
            MachineType::Cube030 => CsrEncoding::Narrow,
            MachineType::Cube040 | MachineType::Station => CsrEncoding::Wide,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DmaConfig {
    pub machine: MachineType,
    /// Turbo board. Changes how Ethernet transmit sizes its reads.
    pub turbo: bool,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid DMA configuration: {0}")]
    Parse(#[from] toml::de::Error),
}

impl DmaConfig {
    /// Parse a TOML document such as
    ///
    /// ```toml
    /// machine = "cube030"
    /// turbo = false
    /// ```
    ///
    /// Missing keys take their defaults.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }
}

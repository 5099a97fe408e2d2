//! Target instruments accepted by the Analysis Service
//!
//! The set is closed: the service only knows how to voice harmony for
//! these five instruments, and the wire form is the display name.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Instrument the harmony is generated for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Instrument {
    #[serde(rename = "Acoustic Guitar")]
    AcousticGuitar,
    #[serde(rename = "Electric Guitar")]
    ElectricGuitar,
    #[serde(rename = "Bass")]
    Bass,
    #[serde(rename = "Ukulele")]
    Ukulele,
    #[serde(rename = "Piano")]
    Piano,
}

impl Instrument {
    /// All instruments, in picker order
    pub const ALL: [Instrument; 5] = [
        Instrument::AcousticGuitar,
        Instrument::ElectricGuitar,
        Instrument::Bass,
        Instrument::Ukulele,
        Instrument::Piano,
    ];

    /// Wire/display name (e.g. "Acoustic Guitar")
    pub fn as_str(&self) -> &'static str {
        match self {
            Instrument::AcousticGuitar => "Acoustic Guitar",
            Instrument::ElectricGuitar => "Electric Guitar",
            Instrument::Bass => "Bass",
            Instrument::Ukulele => "Ukulele",
            Instrument::Piano => "Piano",
        }
    }
}

impl fmt::Display for Instrument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Instrument {
    type Err = Error;

    /// Parse a display name, case-insensitively
    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim();
        Instrument::ALL
            .iter()
            .copied()
            .find(|i| i.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| Error::InvalidInput(format!("Unknown instrument: {:?}", s)))
    }
}

use std::fmt;

use serde::{Deserialize, Serialize};

/// One of the six supported competitive formats. A `format` query parameter
/// that doesn't parse to one of these is an `InputShape` error (400).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Format {
    Standard,
    Modern,
    Pioneer,
    Vintage,
    Legacy,
    Pauper,
}

impl Format {
    pub fn as_str(&self) -> &'static str {
        match self {
            Format::Standard => "standard",
            Format::Modern => "modern",
            Format::Pioneer => "pioneer",
            Format::Vintage => "vintage",
            Format::Legacy => "legacy",
            Format::Pauper => "pauper",
        }
    }

    pub const ALL: [Format; 6] = [
        Format::Standard,
        Format::Modern,
        Format::Pioneer,
        Format::Vintage,
        Format::Legacy,
        Format::Pauper,
    ];
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Format {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "standard" => Ok(Format::Standard),
            "modern" => Ok(Format::Modern),
            "pioneer" => Ok(Format::Pioneer),
            "vintage" => Ok(Format::Vintage),
            "legacy" => Ok(Format::Legacy),
            "pauper" => Ok(Format::Pauper),
            _ => Err(()),
        }
    }
}

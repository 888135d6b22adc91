//! Data layer identifiers.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::LayerError;

/// The six kinds of data layer the imagery service provides.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum LayerId {
    Mask,
    Dsm,
    Rgb,
    AnnualFlux,
    MonthlyFlux,
    HourlyShade,
}

impl LayerId {
    pub const ALL: [LayerId; 6] = [
        LayerId::Mask,
        LayerId::Dsm,
        LayerId::Rgb,
        LayerId::AnnualFlux,
        LayerId::MonthlyFlux,
        LayerId::HourlyShade,
    ];

    /// Identifier as used by the API and the UI.
    pub fn as_str(&self) -> &'static str {
        match self {
            LayerId::Mask => "mask",
            LayerId::Dsm => "dsm",
            LayerId::Rgb => "rgb",
            LayerId::AnnualFlux => "annualFlux",
            LayerId::MonthlyFlux => "monthlyFlux",
            LayerId::HourlyShade => "hourlyShade",
        }
    }

    /// Human-readable option label.
    pub fn title(&self) -> &'static str {
        match self {
            LayerId::Mask => "Roof mask",
            LayerId::Dsm => "Digital Surface Model",
            LayerId::Rgb => "Aerial image",
            LayerId::AnnualFlux => "Annual sunshine",
            LayerId::MonthlyFlux => "Monthly sunshine",
            LayerId::HourlyShade => "Hourly shade",
        }
    }

    /// Number of frames a render of this kind always produces.
    pub fn frame_count(&self) -> usize {
        match self {
            LayerId::MonthlyFlux => 12,
            LayerId::HourlyShade => 24,
            _ => 1,
        }
    }

    pub fn is_time_varying(&self) -> bool {
        self.frame_count() > 1
    }

    /// Parse a UI selection, where `"none"` means no layer.
    pub fn parse_selection(s: &str) -> Result<Option<LayerId>, LayerError> {
        if s.eq_ignore_ascii_case("none") {
            return Ok(None);
        }
        s.parse().map(Some)
    }

    /// Label for the "no layer" selection.
    pub fn none_title() -> &'static str {
        "No layer"
    }
}

impl fmt::Display for LayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LayerId {
    type Err = LayerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        LayerId::ALL
            .iter()
            .copied()
            .find(|id| id.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| LayerError::invalid_parameter("layer", format!("unknown layer '{}'", s)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_layer_ids() {
        assert_eq!("annualFlux".parse::<LayerId>().unwrap(), LayerId::AnnualFlux);
        assert_eq!("hourlyshade".parse::<LayerId>().unwrap(), LayerId::HourlyShade);
        assert!("flux".parse::<LayerId>().is_err());
    }

    #[test]
    fn test_parse_selection_none() {
        assert_eq!(LayerId::parse_selection("none").unwrap(), None);
        assert_eq!(LayerId::parse_selection("rgb").unwrap(), Some(LayerId::Rgb));
    }

    #[test]
    fn test_serde_camel_case() {
        let json = serde_json::to_string(&LayerId::MonthlyFlux).unwrap();
        assert_eq!(json, "\"monthlyFlux\"");
        let id: LayerId = serde_json::from_str("\"dsm\"").unwrap();
        assert_eq!(id, LayerId::Dsm);
    }

    #[test]
    fn test_frame_counts() {
        assert_eq!(LayerId::MonthlyFlux.frame_count(), 12);
        assert_eq!(LayerId::HourlyShade.frame_count(), 24);
        assert!(!LayerId::Rgb.is_time_varying());
    }
}

//! Display bands for the risk score

use serde::{Deserialize, Serialize};

/// Band a risk score falls into
///
/// Bands are a presentation helper; results store only the numeric score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    /// 0-30
    High,
    /// 31-70
    Medium,
    /// 71-100
    Low,
}

impl RiskLevel {
    /// Band for a score in [0, 100]
    pub fn from_score(score: u8) -> Self {
        match score {
            0..=30 => RiskLevel::High,
            31..=70 => RiskLevel::Medium,
            _ => RiskLevel::Low,
        }
    }

    /// Get the level name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::High => "high",
            RiskLevel::Medium => "medium",
            RiskLevel::Low => "low",
        }
    }

    /// Uzbek label used in summaries
    pub fn label_uz(&self) -> &'static str {
        match self {
            RiskLevel::High => "YUQORI XAVF",
            RiskLevel::Medium => "O'RTA XAVF",
            RiskLevel::Low => "PAST XAVF",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_band_boundaries() {
        assert_eq!(RiskLevel::from_score(0), RiskLevel::High);
        assert_eq!(RiskLevel::from_score(30), RiskLevel::High);
        assert_eq!(RiskLevel::from_score(31), RiskLevel::Medium);
        assert_eq!(RiskLevel::from_score(70), RiskLevel::Medium);
        assert_eq!(RiskLevel::from_score(71), RiskLevel::Low);
        assert_eq!(RiskLevel::from_score(100), RiskLevel::Low);
    }

    #[test]
    fn test_labels() {
        assert_eq!(RiskLevel::Medium.as_str(), "medium");
        assert_eq!(RiskLevel::High.label_uz(), "YUQORI XAVF");
    }
}

//! Risk scorer configuration

use serde::{Deserialize, Serialize};
use shartnoma_domain::{IssueType, Severity};

/// Points subtracted from 100 per issue, by severity
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SeverityPenalties {
    /// Critical issue
    pub critical: f64,
    /// High issue
    pub high: f64,
    /// Medium issue
    pub medium: f64,
    /// Low issue
    pub low: f64,
    /// Informational remark
    pub info: f64,
}

impl Default for SeverityPenalties {
    fn default() -> Self {
        Self {
            critical: 40.0,
            high: 30.0,
            medium: 15.0,
            low: 5.0,
            info: 0.0,
        }
    }
}

impl SeverityPenalties {
    /// Penalty for one issue of the given severity
    pub fn for_severity(&self, severity: Severity) -> f64 {
        match severity {
            Severity::Critical => self.critical,
            Severity::High => self.high,
            Severity::Medium => self.medium,
            Severity::Low => self.low,
            Severity::Info => self.info,
        }
    }

    fn in_order(&self) -> [f64; 5] {
        [self.info, self.low, self.medium, self.high, self.critical]
    }
}

/// Weights of the four sub-scores in the overall blend
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoreWeights {
    /// Statutory compliance
    pub compliance: f64,
    /// Presence of expected sections
    pub completeness: f64,
    /// Clarity of wording and identification
    pub clarity: f64,
    /// Balance between the parties
    pub balance: f64,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            compliance: 0.40,
            completeness: 0.25,
            clarity: 0.20,
            balance: 0.15,
        }
    }
}

impl ScoreWeights {
    fn sum(&self) -> f64 {
        self.compliance + self.completeness + self.clarity + self.balance
    }
}

/// Configuration for the risk scorer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskConfig {
    /// Dampening of repeated issues: the n-th issue of one type counts at
    /// `dampening^(n-1)` of its penalty, largest penalties first
    pub dampening: f64,

    /// Points subtracted per one-sided clause from the balance sub-score
    pub one_sided_penalty: f64,

    /// Sections shorter than this (in characters) lower the clarity sub-score
    pub short_section_chars: usize,

    /// Issue types counted by the compliance score
    pub statutory_types: Vec<IssueType>,

    /// Penalties by severity
    pub penalties: SeverityPenalties,

    /// Sub-score weights
    pub weights: ScoreWeights,
}

impl Default for RiskConfig {
    fn default() -> Self {
        Self {
            dampening: 0.5,
            one_sided_penalty: 15.0,
            short_section_chars: 50,
            statutory_types: vec![
                IssueType::MissingMandatorySection,
                IssueType::UnlawfulClause,
                IssueType::MissingInfo,
                IssueType::Structural,
            ],
            penalties: SeverityPenalties::default(),
            weights: ScoreWeights::default(),
        }
    }
}

impl RiskConfig {
    /// Whether an issue type counts toward the compliance score
    pub fn is_statutory(&self, issue_type: IssueType) -> bool {
        self.statutory_types.contains(&issue_type)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if !(self.dampening > 0.0 && self.dampening < 1.0) {
            return Err("dampening must be in (0.0, 1.0)".to_string());
        }
        if self.one_sided_penalty < 0.0 {
            return Err("one_sided_penalty must not be negative".to_string());
        }

        let penalties = self.penalties.in_order();
        if penalties.iter().any(|p| !p.is_finite() || *p < 0.0) {
            return Err("penalties must be finite and non-negative".to_string());
        }
        if penalties.windows(2).any(|w| w[0] >= w[1]) {
            return Err("penalties must strictly increase with severity".to_string());
        }

        let weights = [
            self.weights.compliance,
            self.weights.completeness,
            self.weights.clarity,
            self.weights.balance,
        ];
        if weights.iter().any(|w| *w < 0.0) {
            return Err("weights must not be negative".to_string());
        }
        if (self.weights.sum() - 1.0).abs() > 1e-6 {
            return Err(format!("weights must sum to 1.0, got {}", self.weights.sum()));
        }
        Ok(())
    }

    /// Load configuration from TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self, String> {
        toml::from_str(toml_str).map_err(|e| format!("Failed to parse TOML: {}", e))
    }

    /// Serialize configuration to TOML string
    pub fn to_toml(&self) -> Result<String, String> {
        toml::to_string_pretty(self).map_err(|e| format!("Failed to serialize to TOML: {}", e))
    }
}

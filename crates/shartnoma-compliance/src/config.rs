//! Compliance engine configuration

use serde::{Deserialize, Serialize};
use shartnoma_domain::{ContractType, SectionLabel};

/// Sections a contract type must contain
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequiredSections {
    /// Contract type the list applies to
    pub contract_type: ContractType,
    /// Labels that must appear at least once
    pub labels: Vec<SectionLabel>,
}

/// Configuration for the compliance engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ComplianceConfig {
    /// Statutory penalty cap, percent of the contract value
    pub penalty_cap_percent: f64,

    /// Rule ids that are not evaluated (e.g. `"FK-107"`)
    pub disabled_rules: Vec<String>,

    /// Look for clauses that favour one party
    pub check_one_sided: bool,

    /// Look for vague wording
    pub check_vague_terms: bool,

    /// Check number, date, INN and amount
    pub check_metadata: bool,

    /// Required sections per contract type; types not listed use the `service` list
    pub required_sections: Vec<RequiredSections>,
}

impl Default for ComplianceConfig {
    fn default() -> Self {
        use SectionLabel::*;

        let required = |contract_type, labels: &[SectionLabel]| RequiredSections {
            contract_type,
            labels: labels.to_vec(),
        };

        Self {
            penalty_cap_percent: 50.0,
            disabled_rules: Vec::new(),
            check_one_sided: true,
            check_vague_terms: true,
            check_metadata: true,
            required_sections: vec![
                required(
                    ContractType::Service,
                    &[Parties, Subject, Price, Term, Liability, Requisites],
                ),
                required(
                    ContractType::Supply,
                    &[Parties, Subject, Price, Delivery, Quality, Warranty, Liability, Requisites],
                ),
                required(
                    ContractType::Work,
                    &[Parties, Subject, Price, Term, Quality, Liability, Requisites],
                ),
                required(
                    ContractType::Labor,
                    &[Parties, Subject, Rights, Obligations, Price, Term, Liability],
                ),
                required(
                    ContractType::Lease,
                    &[Parties, Subject, Price, Term, Rights, Obligations, Liability, Requisites],
                ),
                required(
                    ContractType::Procurement,
                    &[
                        Parties,
                        Subject,
                        Price,
                        Delivery,
                        Quality,
                        Warranty,
                        Liability,
                        ForceMajeure,
                        Disputes,
                        Requisites,
                    ],
                ),
                required(ContractType::Loan, &[Parties, Subject, Price, Term, Liability, Requisites]),
            ],
        }
    }
}

impl ComplianceConfig {
    /// Lenient preset: statutory rules only, no style checks
    pub fn lenient() -> Self {
        Self {
            check_one_sided: false,
            check_vague_terms: false,
            check_metadata: false,
            ..Self::default()
        }
    }

    /// Required labels for a contract type
    pub fn required_for(&self, contract_type: ContractType) -> &[SectionLabel] {
        self.required_sections
            .iter()
            .find(|r| r.contract_type == contract_type)
            .or_else(|| {
                self.required_sections
                    .iter()
                    .find(|r| r.contract_type == ContractType::Service)
            })
            .map(|r| r.labels.as_slice())
            .unwrap_or(&[])
    }

    /// Whether a rule id is enabled
    pub fn is_enabled(&self, rule_id: &str) -> bool {
        !self.disabled_rules.iter().any(|id| id == rule_id)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if !(self.penalty_cap_percent > 0.0 && self.penalty_cap_percent <= 100.0) {
            return Err("penalty_cap_percent must be in (0, 100]".to_string());
        }
        for (idx, entry) in self.required_sections.iter().enumerate() {
            if self.required_sections[..idx]
                .iter()
                .any(|r| r.contract_type == entry.contract_type)
            {
                return Err(format!(
                    "required_sections lists {} more than once",
                    entry.contract_type.as_str()
                ));
            }
        }
        Ok(())
    }

    /// Load configuration from TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self, String> {
        toml::from_str(toml_str).map_err(|e| format!("Failed to parse TOML: {}", e))
    }

    /// Serialize configuration to TOML string
    pub fn to_toml(&self) -> Result<String, String> {
        toml::to_string_pretty(self).map_err(|e| format!("Failed to serialize TOML: {}", e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ComplianceConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.penalty_cap_percent, 50.0);
        assert!(config.required_for(ContractType::Supply).contains(&SectionLabel::Warranty));
    }

    #[test]
    fn test_unlisted_type_uses_service_list() {
        let config = ComplianceConfig::default();
        assert_eq!(
            config.required_for(ContractType::Other),
            config.required_for(ContractType::Service)
        );
    }

    #[test]
    fn test_invalid_cap() {
        let config = ComplianceConfig {
            penalty_cap_percent: 0.0,
            ..ComplianceConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_duplicate_type_rejected() {
        let mut config = ComplianceConfig::default();
        config.required_sections.push(RequiredSections {
            contract_type: ContractType::Service,
            labels: vec![],
        });
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_toml_round_trip() {
        let config = ComplianceConfig::lenient();
        let toml = config.to_toml().unwrap();
        assert_eq!(ComplianceConfig::from_toml(&toml).unwrap(), config);

        let partial = ComplianceConfig::from_toml("disabled_rules = [\"FK-107\"]").unwrap();
        assert!(!partial.is_enabled("FK-107"));
        assert!(partial.is_enabled("FK-354"));
        assert_eq!(partial.required_sections.len(), 7);
    }
}

//! Contract module - contract types and metadata found in the text

use crate::language::Language;
use serde::{Deserialize, Serialize};

/// Kind of contract
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContractType {
    /// Services (xizmat ko'rsatish)
    Service,
    /// Supply of goods (yetkazib berish)
    Supply,
    /// Work / construction (pudrat)
    Work,
    /// Employment (mehnat)
    Labor,
    /// Lease (ijara)
    Lease,
    /// Public procurement (davlat xaridi)
    Procurement,
    /// Loan (qarz)
    Loan,
    /// Unknown or unclassified
    Other,
}

impl ContractType {
    /// All contract types
    pub const ALL: [ContractType; 8] = [
        ContractType::Service,
        ContractType::Supply,
        ContractType::Work,
        ContractType::Labor,
        ContractType::Lease,
        ContractType::Procurement,
        ContractType::Loan,
        ContractType::Other,
    ];

    /// Get the type name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            ContractType::Service => "service",
            ContractType::Supply => "supply",
            ContractType::Work => "work",
            ContractType::Labor => "labor",
            ContractType::Lease => "lease",
            ContractType::Procurement => "procurement",
            ContractType::Loan => "loan",
            ContractType::Other => "other",
        }
    }

    /// Parse a type name
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim().to_lowercase();
        Self::ALL.iter().copied().find(|t| t.as_str() == s)
    }

    /// Uzbek display name
    pub fn display_name(&self) -> &'static str {
        match self {
            ContractType::Service => "Xizmat ko'rsatish shartnomasi",
            ContractType::Supply => "Yetkazib berish shartnomasi",
            ContractType::Work => "Pudrat shartnomasi",
            ContractType::Labor => "Mehnat shartnomasi",
            ContractType::Lease => "Ijara shartnomasi",
            ContractType::Procurement => "Davlat xaridi shartnomasi",
            ContractType::Loan => "Qarz shartnomasi",
            ContractType::Other => "Boshqa shartnoma",
        }
    }
}

impl Default for ContractType {
    fn default() -> Self {
        ContractType::Other
    }
}

impl std::str::FromStr for ContractType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| format!("Invalid contract type: {}", s))
    }
}

/// Role of a party
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PartyRole {
    /// Customer / buyer / lessee / employer side ("1-tomon")
    First,
    /// Contractor / seller / lessor / employee side ("2-tomon")
    Second,
}

/// A contracting party
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Party {
    /// Which side of the contract
    pub role: PartyRole,
    /// Organisation or person name
    pub name: Option<String>,
    /// 9-digit taxpayer identification number (INN / STIR)
    pub inn: Option<String>,
}

impl Party {
    /// Whether the party can be identified at all
    pub fn is_identified(&self) -> bool {
        self.name.as_deref().map(|n| !n.trim().is_empty()).unwrap_or(false) || self.inn.is_some()
    }
}

/// Currency of the contract amount
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    /// Uzbek so'm
    Uzs,
    /// US dollar
    Usd,
    /// Euro
    Eur,
}

impl Currency {
    /// ISO code
    pub fn as_str(&self) -> &'static str {
        match self {
            Currency::Uzs => "UZS",
            Currency::Usd => "USD",
            Currency::Eur => "EUR",
        }
    }
}

/// Metadata recovered from the contract text
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContractMetadata {
    /// Contract number ("№ 12/2024")
    pub number: Option<String>,
    /// Contract date as written
    pub date: Option<String>,
    /// Parties found in the text
    pub parties: Vec<Party>,
    /// Total amount
    pub total_amount: Option<f64>,
    /// Currency of the amount
    pub currency: Option<Currency>,
    /// Language of the text
    pub language: Option<Language>,
}

impl ContractMetadata {
    /// Party on the given side, if found
    pub fn party(&self, role: PartyRole) -> Option<&Party> {
        self.parties.iter().find(|p| p.role == role)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contract_type_round_trip() {
        for t in ContractType::ALL {
            assert_eq!(ContractType::parse(t.as_str()), Some(t));
        }
        assert_eq!(ContractType::parse("rental"), None);
    }

    #[test]
    fn test_party_identification() {
        let anonymous = Party { role: PartyRole::First, name: Some("  ".into()), inn: None };
        assert!(!anonymous.is_identified());

        let by_inn = Party { role: PartyRole::Second, name: None, inn: Some("123456789".into()) };
        assert!(by_inn.is_identified());
    }
}

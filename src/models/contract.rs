use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::error::{AppError, Result};

// ==================== ROLES & STATUSES ====================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SignerRole {
    Buyer,
    Seller,
    Contractor,
    Agent,
}

impl SignerRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            SignerRole::Buyer => "BUYER",
            SignerRole::Seller => "SELLER",
            SignerRole::Contractor => "CONTRACTOR",
            SignerRole::Agent => "AGENT",
        }
    }

    pub fn parse(raw: &str) -> Result<Self> {
        match raw.trim().to_ascii_uppercase().as_str() {
            "BUYER" => Ok(SignerRole::Buyer),
            "SELLER" => Ok(SignerRole::Seller),
            "CONTRACTOR" => Ok(SignerRole::Contractor),
            "AGENT" => Ok(SignerRole::Agent),
            other => Err(AppError::BadRequest(format!(
                "Unknown signer role: {}",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ContractStatus {
    Pending,
    InProgress,
    FullyExecuted,
}

impl ContractStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContractStatus::Pending => "PENDING",
            ContractStatus::InProgress => "IN_PROGRESS",
            ContractStatus::FullyExecuted => "FULLY_EXECUTED",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SectionStatus {
    Pending,
    Signed,
}

impl SectionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SectionStatus::Pending => "PENDING",
            SectionStatus::Signed => "SIGNED",
        }
    }
}

/// Aggregate contract status from its section counts. A contract moves
/// PENDING -> IN_PROGRESS on the first signature and FULLY_EXECUTED only once
/// every required section is signed.
pub fn aggregate_status(required: i64, signed: i64) -> ContractStatus {
    if required > 0 && signed >= required {
        ContractStatus::FullyExecuted
    } else if signed > 0 {
        ContractStatus::InProgress
    } else {
        ContractStatus::Pending
    }
}

// ==================== ROWS ====================

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Contract {
    pub id: i64,
    pub title: String,
    pub listing_key: Option<String>,
    pub renovation_allowance: Option<Decimal>,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ContractSection {
    pub id: i64,
    pub contract_id: i64,
    pub title: String,
    pub required_role: String,
    pub status: String,
    pub position: i32,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ContractSignature {
    pub id: i64,
    pub contract_id: i64,
    pub section_id: i64,
    pub role: String,
    pub signer_name: String,
    pub signer_email: String,
    pub signature_data: String,
    pub signed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ContractSigningToken {
    pub token: String,
    pub contract_id: i64,
    pub role: String,
    pub email: Option<String>,
    pub name: Option<String>,
    pub expires_at: DateTime<Utc>,
    pub is_used: bool,
    pub created_at: DateTime<Utc>,
}

impl ContractSigningToken {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }
}

/// Result of a committed signing transaction.
#[derive(Debug, Clone, Serialize)]
pub struct SignOutcome {
    pub signature_id: i64,
    pub section_id: i64,
    pub section_status: SectionStatus,
    pub contract_status: ContractStatus,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn two_section_contract_walks_the_status_ladder() {
        assert_eq!(aggregate_status(2, 0), ContractStatus::Pending);
        assert_eq!(aggregate_status(2, 1), ContractStatus::InProgress);
        assert_eq!(aggregate_status(2, 2), ContractStatus::FullyExecuted);
    }

    #[test]
    fn contract_without_sections_stays_pending() {
        assert_eq!(aggregate_status(0, 0), ContractStatus::Pending);
    }

    #[test]
    fn role_parse_round_trips_and_ignores_case() {
        assert_eq!(SignerRole::parse("buyer").unwrap(), SignerRole::Buyer);
        assert_eq!(
            SignerRole::parse(" CONTRACTOR ").unwrap(),
            SignerRole::Contractor
        );
        assert_eq!(SignerRole::Agent.as_str(), "AGENT");
        assert!(SignerRole::parse("notary").is_err());
    }

    #[test]
    fn token_expiry_is_exclusive_of_the_deadline() {
        let now = Utc::now();
        let token = ContractSigningToken {
            token: "t".to_string(),
            contract_id: 1,
            role: "BUYER".to_string(),
            email: None,
            name: None,
            expires_at: now,
            is_used: false,
            created_at: now - Duration::days(7),
        };
        assert!(!token.is_expired(now));
        assert!(token.is_expired(now + Duration::seconds(1)));
    }
}

use axum::{
    extract::{Path, State},
    Json,
};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};

use super::AppState;
use crate::{
    error::{AppError, Result},
    models::{
        contract::SignOutcome, ApiResponse, Contract, ContractSection, ContractSigningToken,
        SignerRole,
    },
};
use crate::constants::SIGNING_TOKEN_BYTES;

// ==================== REQUEST/RESPONSE TYPES ====================

#[derive(Debug, Deserialize)]
pub struct CreateContractRequest {
    pub title: String,
    pub listing_key: Option<String>,
    pub renovation_allowance: Option<rust_decimal::Decimal>,
    pub sections: Vec<CreateSectionRequest>,
}

#[derive(Debug, Deserialize)]
pub struct CreateSectionRequest {
    pub title: String,
    pub required_role: SignerRole,
}

#[derive(Debug, Serialize)]
pub struct ContractResponse {
    pub contract: Contract,
    pub sections: Vec<ContractSection>,
}

#[derive(Debug, Deserialize)]
pub struct ContractPath {
    pub contract_id: i64,
}

#[derive(Debug, Deserialize)]
pub struct SigningLinkRequest {
    pub role: SignerRole,
    pub email: Option<String>,
    pub name: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SigningLinkResponse {
    pub token: String,
    pub signing_url: String,
    pub expires_at: chrono::DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct SigningTokenPath {
    pub token: String,
}

#[derive(Debug, Serialize)]
pub struct SigningTokenResponse {
    pub contract: Contract,
    pub sections: Vec<ContractSection>,
    pub role: String,
    pub is_used: bool,
}

#[derive(Debug, Deserialize)]
pub struct SignSectionRequest {
    pub token: String,
    pub section_id: i64,
    pub signature_data: String,
    pub signer_name: String,
    pub signer_email: String,
}

// ==================== HANDLERS ====================

/// POST /api/v1/contracts
pub async fn create_contract(
    State(state): State<AppState>,
    Json(req): Json<CreateContractRequest>,
) -> Result<Json<ApiResponse<ContractResponse>>> {
    if req.title.trim().is_empty() {
        return Err(AppError::BadRequest("Contract title is required".to_string()));
    }
    if req.sections.is_empty() {
        return Err(AppError::BadRequest(
            "A contract needs at least one section".to_string(),
        ));
    }

    let sections: Vec<(String, SignerRole)> = req
        .sections
        .iter()
        .map(|section| {
            let title = section.title.trim();
            if title.is_empty() {
                return Err(AppError::BadRequest(
                    "Section titles must be non-empty".to_string(),
                ));
            }
            Ok((title.to_string(), section.required_role))
        })
        .collect::<Result<_>>()?;

    let (contract, sections) = state
        .db
        .create_contract(
            req.title.trim(),
            req.listing_key.as_deref(),
            req.renovation_allowance,
            &sections,
        )
        .await?;

    tracing::info!(contract_id = contract.id, "contract created");

    Ok(Json(ApiResponse::success(ContractResponse {
        contract,
        sections,
    })))
}

/// GET /api/v1/contracts/{contract_id}
pub async fn get_contract(
    State(state): State<AppState>,
    Path(path): Path<ContractPath>,
) -> Result<Json<ApiResponse<ContractResponse>>> {
    let contract = state
        .db
        .get_contract(path.contract_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Contract {} not found", path.contract_id)))?;
    let sections = state.db.get_contract_sections(contract.id).await?;

    Ok(Json(ApiResponse::success(ContractResponse {
        contract,
        sections,
    })))
}

/// POST /api/v1/contracts/{contract_id}/signing-links
///
/// Issues a single-use, time-boxed signing link for one role on the contract.
pub async fn create_signing_link(
    State(state): State<AppState>,
    Path(path): Path<ContractPath>,
    Json(req): Json<SigningLinkRequest>,
) -> Result<Json<ApiResponse<SigningLinkResponse>>> {
    state
        .db
        .get_contract(path.contract_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Contract {} not found", path.contract_id)))?;

    let token = mint_token();
    let expires_at = Utc::now() + Duration::days(state.config.signing_token_ttl_days);

    let row = state
        .db
        .create_signing_token(
            &token,
            path.contract_id,
            req.role,
            req.email.as_deref(),
            req.name.as_deref(),
            expires_at,
        )
        .await?;

    tracing::info!(
        contract_id = path.contract_id,
        role = req.role.as_str(),
        "signing link issued"
    );

    Ok(Json(ApiResponse::success(SigningLinkResponse {
        signing_url: signing_url(&state.config.public_base_url, &row.token),
        token: row.token,
        expires_at: row.expires_at,
    })))
}

/// GET /api/v1/contracts/token/{token}
///
/// Redeem-side lookup. Does not mark the token used; that happens inside the
/// signing transaction.
pub async fn get_contract_by_token(
    State(state): State<AppState>,
    Path(path): Path<SigningTokenPath>,
) -> Result<Json<ApiResponse<SigningTokenResponse>>> {
    let token = resolve_token(&state, &path.token).await?;

    let contract = state
        .db
        .get_contract(token.contract_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Contract {} not found", token.contract_id)))?;
    let sections = state.db.get_contract_sections(contract.id).await?;

    Ok(Json(ApiResponse::success(SigningTokenResponse {
        contract,
        sections,
        role: token.role,
        is_used: token.is_used,
    })))
}

/// POST /api/v1/contracts/sign
pub async fn sign_section(
    State(state): State<AppState>,
    Json(req): Json<SignSectionRequest>,
) -> Result<Json<ApiResponse<SignOutcome>>> {
    if req.signer_name.trim().is_empty() {
        return Err(AppError::BadRequest("Signer name is required".to_string()));
    }
    if req.signer_email.trim().is_empty() {
        return Err(AppError::BadRequest("Signer email is required".to_string()));
    }
    validate_signature_data(&req.signature_data)?;

    let token = resolve_token(&state, &req.token).await?;

    let outcome = state
        .db
        .sign_section(
            &token,
            req.section_id,
            &req.signature_data,
            req.signer_name.trim(),
            req.signer_email.trim(),
        )
        .await?;

    tracing::info!(
        contract_id = token.contract_id,
        section_id = req.section_id,
        status = outcome.contract_status.as_str(),
        "section signed"
    );

    Ok(Json(ApiResponse::success(outcome)))
}

// ==================== HELPER FUNCTIONS ====================

async fn resolve_token(state: &AppState, raw: &str) -> Result<ContractSigningToken> {
    let token = state
        .db
        .get_signing_token(raw.trim())
        .await?
        .ok_or(AppError::InvalidToken)?;

    if token.is_expired(Utc::now()) {
        return Err(AppError::TokenExpired);
    }

    Ok(token)
}

fn mint_token() -> String {
    hex::encode(rand::random::<[u8; SIGNING_TOKEN_BYTES]>())
}

fn signing_url(public_base_url: &str, token: &str) -> String {
    format!(
        "{}/contracts/sign/{}",
        public_base_url.trim_end_matches('/'),
        token
    )
}

// Accepts a base64 `data:` image URL or a bare base64 payload.
fn validate_signature_data(raw: &str) -> Result<()> {
    let payload = raw
        .strip_prefix("data:")
        .and_then(|rest| rest.split_once(";base64,"))
        .map(|(_, payload)| payload)
        .unwrap_or(raw);

    if payload.trim().is_empty() {
        return Err(AppError::BadRequest(
            "Signature data is empty".to_string(),
        ));
    }

    BASE64
        .decode(payload.trim())
        .map_err(|_| AppError::BadRequest("Signature data is not valid base64".to_string()))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minted_tokens_are_opaque_and_unique() {
        let a = mint_token();
        let b = mint_token();
        assert_eq!(a.len(), SIGNING_TOKEN_BYTES * 2);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(a, b);
    }

    #[test]
    fn signing_url_embeds_the_token() {
        assert_eq!(
            signing_url("https://app.renograte.test/", "abc123"),
            "https://app.renograte.test/contracts/sign/abc123"
        );
    }

    #[test]
    fn signature_data_accepts_data_urls_and_bare_base64() {
        assert!(validate_signature_data("data:image/png;base64,aGVsbG8=").is_ok());
        assert!(validate_signature_data("aGVsbG8=").is_ok());
    }

    #[test]
    fn signature_data_rejects_garbage() {
        assert!(validate_signature_data("").is_err());
        assert!(validate_signature_data("data:image/png;base64,").is_err());
        assert!(validate_signature_data("not base64 !!!").is_err());
    }
}

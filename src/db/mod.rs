use sqlx::{postgres::PgPoolOptions, PgPool, Row};

use crate::{
    config::Config,
    error::{AppError, Result},
    models::contract::{
        aggregate_status, Contract, ContractSection, ContractSignature, ContractSigningToken,
        SectionStatus, SignOutcome, SignerRole,
    },
};

#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    pub async fn new(config: &Config) -> anyhow::Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(config.database_max_connections)
            .connect(&config.database_url)
            .await?;

        Ok(Self { pool })
    }

    pub async fn run_migrations(&self) -> anyhow::Result<()> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

// ==================== CONTRACT QUERIES ====================
impl Database {
    pub async fn create_contract(
        &self,
        title: &str,
        listing_key: Option<&str>,
        renovation_allowance: Option<rust_decimal::Decimal>,
        sections: &[(String, SignerRole)],
    ) -> Result<(Contract, Vec<ContractSection>)> {
        let mut tx = self.pool.begin().await?;

        let contract = sqlx::query_as::<_, Contract>(
            "INSERT INTO contracts (title, listing_key, renovation_allowance)
             VALUES ($1, $2, $3)
             RETURNING *",
        )
        .bind(title)
        .bind(listing_key)
        .bind(renovation_allowance)
        .fetch_one(&mut *tx)
        .await?;

        let mut created = Vec::with_capacity(sections.len());
        for (position, (section_title, role)) in sections.iter().enumerate() {
            let section = sqlx::query_as::<_, ContractSection>(
                "INSERT INTO contract_sections (contract_id, title, required_role, position)
                 VALUES ($1, $2, $3, $4)
                 RETURNING *",
            )
            .bind(contract.id)
            .bind(section_title)
            .bind(role.as_str())
            .bind(position as i32)
            .fetch_one(&mut *tx)
            .await?;
            created.push(section);
        }

        tx.commit().await?;
        Ok((contract, created))
    }

    pub async fn get_contract(&self, contract_id: i64) -> Result<Option<Contract>> {
        let contract = sqlx::query_as::<_, Contract>("SELECT * FROM contracts WHERE id = $1")
            .bind(contract_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(contract)
    }

    pub async fn get_contract_sections(&self, contract_id: i64) -> Result<Vec<ContractSection>> {
        let sections = sqlx::query_as::<_, ContractSection>(
            "SELECT * FROM contract_sections
             WHERE contract_id = $1
             ORDER BY position ASC, id ASC",
        )
        .bind(contract_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(sections)
    }
}

// ==================== SIGNING TOKEN QUERIES ====================
impl Database {
    pub async fn create_signing_token(
        &self,
        token: &str,
        contract_id: i64,
        role: SignerRole,
        email: Option<&str>,
        name: Option<&str>,
        expires_at: chrono::DateTime<chrono::Utc>,
    ) -> Result<ContractSigningToken> {
        let row = sqlx::query_as::<_, ContractSigningToken>(
            "INSERT INTO contract_signing_tokens
                (token, contract_id, role, email, name, expires_at)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING *",
        )
        .bind(token)
        .bind(contract_id)
        .bind(role.as_str())
        .bind(email)
        .bind(name)
        .bind(expires_at)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    pub async fn get_signing_token(&self, token: &str) -> Result<Option<ContractSigningToken>> {
        let row = sqlx::query_as::<_, ContractSigningToken>(
            "SELECT * FROM contract_signing_tokens WHERE token = $1",
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }
}

// ==================== SIGNING TRANSACTION ====================
impl Database {
    /// Records one signature atomically: the signature row, the section flip
    /// to SIGNED, the single-use token burn, and the contract-status
    /// recompute all commit together, so concurrent signings of different
    /// sections cannot race the aggregate status.
    pub async fn sign_section(
        &self,
        token: &ContractSigningToken,
        section_id: i64,
        signature_data: &str,
        signer_name: &str,
        signer_email: &str,
    ) -> Result<SignOutcome> {
        let mut tx = self.pool.begin().await?;

        let section = sqlx::query_as::<_, ContractSection>(
            "SELECT * FROM contract_sections WHERE id = $1 AND contract_id = $2 FOR UPDATE",
        )
        .bind(section_id)
        .bind(token.contract_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| {
            AppError::NotFound(format!(
                "Section {} not found on contract {}",
                section_id, token.contract_id
            ))
        })?;

        if section.required_role != token.role {
            return Err(AppError::BadRequest(format!(
                "Token for role {} cannot sign a section requiring {}",
                token.role, section.required_role
            )));
        }

        let already_signed: bool = sqlx::query_scalar(
            "SELECT EXISTS(
                SELECT 1 FROM contract_signatures
                WHERE section_id = $1 AND role = $2
            )",
        )
        .bind(section_id)
        .bind(&token.role)
        .fetch_one(&mut *tx)
        .await?;

        if already_signed {
            return Err(AppError::AlreadySigned);
        }

        let signature = sqlx::query_as::<_, ContractSignature>(
            "INSERT INTO contract_signatures
                (contract_id, section_id, role, signer_name, signer_email, signature_data)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING *",
        )
        .bind(token.contract_id)
        .bind(section_id)
        .bind(&token.role)
        .bind(signer_name)
        .bind(signer_email)
        .bind(signature_data)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query("UPDATE contract_sections SET status = $1 WHERE id = $2")
            .bind(SectionStatus::Signed.as_str())
            .bind(section_id)
            .execute(&mut *tx)
            .await?;

        sqlx::query("UPDATE contract_signing_tokens SET is_used = true WHERE token = $1")
            .bind(&token.token)
            .execute(&mut *tx)
            .await?;

        let counts = sqlx::query(
            "SELECT COUNT(*) AS required,
                    COUNT(*) FILTER (WHERE status = 'SIGNED') AS signed
             FROM contract_sections
             WHERE contract_id = $1",
        )
        .bind(token.contract_id)
        .fetch_one(&mut *tx)
        .await?;
        let required: i64 = counts.try_get("required")?;
        let signed: i64 = counts.try_get("signed")?;
        let contract_status = aggregate_status(required, signed);

        sqlx::query("UPDATE contracts SET status = $1, updated_at = NOW() WHERE id = $2")
            .bind(contract_status.as_str())
            .bind(token.contract_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(SignOutcome {
            signature_id: signature.id,
            section_id,
            section_status: SectionStatus::Signed,
            contract_status,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config(database_url: &str) -> Config {
        Config {
            host: "0.0.0.0".to_string(),
            port: 3000,
            environment: "development".to_string(),
            database_url: database_url.to_string(),
            database_max_connections: 1,
            realtyfeed_api_url: "https://api.realtyfeed.test/reso/odata".to_string(),
            realtyfeed_token_url: "https://auth.realtyfeed.test/token".to_string(),
            realtyfeed_client_id: "test_client".to_string(),
            realtyfeed_client_secret: "test_secret".to_string(),
            realtyfeed_api_key: None,
            public_base_url: "http://localhost:3000".to_string(),
            signing_token_ttl_days: 7,
            cors_allowed_origins: "*".to_string(),
        }
    }

    #[tokio::test]
    async fn database_new_returns_error_on_invalid_url() {
        let config = test_config("not-a-url");
        let result = Database::new(&config).await;
        assert!(result.is_err());
    }
}

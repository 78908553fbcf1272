//! Sanction ledger service

use rust_decimal::Decimal;

use crate::{
    error::{AppError, AppResult},
    models::{
        sanction::{CreateSanction, SanctionQuery, SanctionStats, UpdateSanction},
        Actor, Sanction, SanctionDetails,
    },
    repository::Repository,
};

#[derive(Clone)]
pub struct SanctionsService {
    repository: Repository,
}

impl SanctionsService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// Staff listing with filters
    pub async fn list(&self, query: &SanctionQuery) -> AppResult<Vec<SanctionDetails>> {
        self.repository.sanctions.list(query).await
    }

    /// The caller's own sanctions
    pub async fn mine(&self, actor: &Actor, query: SanctionQuery) -> AppResult<Vec<SanctionDetails>> {
        let scoped = SanctionQuery {
            user_id: Some(actor.user_id),
            ..query
        };
        self.repository.sanctions.list(&scoped).await
    }

    pub async fn get(&self, actor: &Actor, id: i64) -> AppResult<SanctionDetails> {
        let details = self.repository.sanctions.get_details(id).await?;
        if !actor.sees_all() && !actor.owns(details.sanction.user_id) {
            return Err(AppError::Authorization(
                "You can only access your own sanctions".to_string(),
            ));
        }
        Ok(details)
    }

    pub async fn create(&self, actor: &Actor, request: &CreateSanction) -> AppResult<Sanction> {
        self.repository.sanctions.create(request, actor.user_id).await
    }

    pub async fn update(&self, id: i64, update: &UpdateSanction) -> AppResult<Sanction> {
        self.repository.sanctions.update(id, update).await
    }

    pub async fn lift(&self, actor: &Actor, id: i64) -> AppResult<Sanction> {
        self.repository.sanctions.lift(id, actor.user_id).await
    }

    /// Settle a fine. Borrowers pay their own fines, staff anyone's.
    pub async fn pay(&self, actor: &Actor, id: i64, amount: Option<Decimal>) -> AppResult<Sanction> {
        let sanction = self.repository.sanctions.get_by_id(id).await?;
        if !actor.sees_all() && !actor.owns(sanction.user_id) {
            return Err(AppError::Authorization(
                "You can only pay your own fines".to_string(),
            ));
        }
        self.repository.sanctions.pay(id, amount).await
    }

    pub async fn extend(
        &self,
        actor: &Actor,
        id: i64,
        days: i64,
        reason: Option<&str>,
    ) -> AppResult<Sanction> {
        self.repository
            .sanctions
            .extend(id, days, reason, actor.user_id)
            .await
    }

    pub async fn sweep_expired(&self) -> AppResult<u64> {
        self.repository.sanctions.sweep_expired().await
    }

    pub async fn stats(&self) -> AppResult<SanctionStats> {
        self.repository.sanctions.stats().await
    }
}

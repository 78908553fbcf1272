//! Loan management service
//!
//! Visibility scoping happens here: borrowers only ever see and act on
//! their own loans, staff act on anyone's.

use crate::{
    domain::{policy::Action, CirculationRules},
    error::{AppError, AppResult},
    models::{
        loan::{CreateLoan, LoanQuery, LoanStats},
        Actor, Loan, LoanDetails, Sanction,
    },
    repository::Repository,
};

#[derive(Clone)]
pub struct LoansService {
    repository: Repository,
    rules: CirculationRules,
}

impl LoansService {
    pub fn new(repository: Repository, rules: CirculationRules) -> Self {
        Self { repository, rules }
    }

    fn scope_query(actor: &Actor, mut query: LoanQuery) -> LoanQuery {
        if !actor.sees_all() {
            query.user_id = Some(actor.user_id);
        }
        query
    }

    fn check_visibility(actor: &Actor, loan: &Loan) -> AppResult<()> {
        if actor.sees_all() || actor.owns(loan.user_id) {
            Ok(())
        } else {
            Err(AppError::Authorization(
                "You can only access your own loans".to_string(),
            ))
        }
    }

    pub async fn list(&self, actor: &Actor, query: LoanQuery) -> AppResult<Vec<LoanDetails>> {
        self.repository
            .loans
            .list(&Self::scope_query(actor, query))
            .await
    }

    pub async fn history(&self, actor: &Actor, query: LoanQuery) -> AppResult<Vec<LoanDetails>> {
        self.repository
            .loans
            .history(&Self::scope_query(actor, query))
            .await
    }

    pub async fn get(&self, actor: &Actor, id: i64) -> AppResult<LoanDetails> {
        let details = self.repository.loans.get_details(id).await?;
        Self::check_visibility(actor, &details.loan)?;
        Ok(details)
    }

    /// Borrow a book. Staff may borrow on behalf of another user.
    pub async fn create(&self, actor: &Actor, request: &CreateLoan) -> AppResult<Loan> {
        let borrower_id = match request.user_id {
            Some(user_id) if user_id != actor.user_id => {
                if !actor.can(Action::ManageLoans) {
                    return Err(AppError::Authorization(
                        "You can only borrow for yourself".to_string(),
                    ));
                }
                user_id
            }
            _ => actor.user_id,
        };
        let borrower = self.repository.users.get_by_id(borrower_id).await?;
        self.repository.loans.create(&borrower, request.book_id).await
    }

    /// Extend a loan's due date
    pub async fn extend(&self, actor: &Actor, id: i64, days: Option<i64>) -> AppResult<Loan> {
        let loan = self.repository.loans.get_by_id(id).await?;
        Self::check_visibility(actor, &loan)?;
        let days = days.unwrap_or(self.rules.default_extension_days);
        self.repository.loans.extend(id, days).await
    }

    /// Process a return
    pub async fn return_loan(
        &self,
        actor: &Actor,
        id: i64,
    ) -> AppResult<(Loan, Option<Sanction>)> {
        let loan = self.repository.loans.get_by_id(id).await?;
        if !actor.can(Action::ForceReturn) {
            Self::check_visibility(actor, &loan)?;
        }
        self.repository.loans.return_loan(id, actor.user_id).await
    }

    /// Report a borrowed copy lost (staff only, enforced at the boundary)
    pub async fn mark_lost(
        &self,
        actor: &Actor,
        id: i64,
        notes: Option<&str>,
    ) -> AppResult<(Loan, Sanction)> {
        self.repository.loans.mark_lost(id, actor.user_id, notes).await
    }

    pub async fn stats(&self) -> AppResult<LoanStats> {
        self.repository.loans.stats().await
    }
}

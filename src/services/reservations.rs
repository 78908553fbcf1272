//! Reservation queue service

use crate::{
    domain::policy::Action,
    error::{AppError, AppResult},
    models::{
        reservation::{ExpirySweepReport, ReservationQuery, ReservationStats},
        Actor, Reservation, ReservationDetails,
    },
    repository::Repository,
};

#[derive(Clone)]
pub struct ReservationsService {
    repository: Repository,
}

impl ReservationsService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    fn check_visibility(actor: &Actor, reservation: &Reservation) -> AppResult<()> {
        if actor.sees_all() || actor.owns(reservation.user_id) {
            Ok(())
        } else {
            Err(AppError::Authorization(
                "You can only access your own reservations".to_string(),
            ))
        }
    }

    pub async fn list(
        &self,
        actor: &Actor,
        mut query: ReservationQuery,
    ) -> AppResult<Vec<ReservationDetails>> {
        if !actor.sees_all() {
            query.user_id = Some(actor.user_id);
        }
        self.repository.reservations.list(&query).await
    }

    pub async fn get(&self, actor: &Actor, id: i64) -> AppResult<ReservationDetails> {
        let details = self.repository.reservations.get_details(id).await?;
        Self::check_visibility(actor, &details.reservation)?;
        Ok(details)
    }

    /// Join the queue for a book
    pub async fn create(&self, actor: &Actor, book_id: i64) -> AppResult<Reservation> {
        self.repository
            .reservations
            .create(actor.user_id, book_id)
            .await
    }

    /// Cancel a reservation: owners cancel their own, staff anyone's
    pub async fn cancel(&self, actor: &Actor, id: i64) -> AppResult<Reservation> {
        let reservation = self.repository.reservations.get_by_id(id).await?;
        if !actor.can(Action::ManageReservations) {
            Self::check_visibility(actor, &reservation)?;
        }
        self.repository.reservations.cancel(id).await
    }

    /// Confirm a reservation for pickup (staff only, enforced at the boundary)
    pub async fn confirm(&self, id: i64) -> AppResult<Reservation> {
        self.repository.reservations.confirm(id).await
    }

    pub async fn sweep_expired(&self) -> AppResult<ExpirySweepReport> {
        self.repository.reservations.sweep_expired().await
    }

    pub async fn stats(&self) -> AppResult<ReservationStats> {
        self.repository.reservations.stats().await
    }
}

//! User administration service

use crate::{
    error::{AppError, AppResult},
    models::{
        enums::{Role, UserStatus},
        user::{CreateUser, UpdateUser, UserQuery, UserStats},
        Actor, User,
    },
    repository::{users::NewUser, Repository},
};

use super::auth::hash_password;

#[derive(Clone)]
pub struct UsersService {
    repository: Repository,
}

impl UsersService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    pub async fn list(&self, query: &UserQuery) -> AppResult<Vec<User>> {
        self.repository.users.list(query).await
    }

    pub async fn get(&self, id: i64) -> AppResult<User> {
        self.repository.users.get_by_id(id).await
    }

    /// Staff-created account; role defaults to borrower
    pub async fn create(&self, request: &CreateUser) -> AppResult<User> {
        if self.repository.users.email_exists(&request.email).await? {
            return Err(AppError::Conflict(format!(
                "Email {} is already registered",
                request.email
            )));
        }
        self.repository
            .users
            .create(&NewUser {
                first_name: request.first_name.clone(),
                last_name: request.last_name.clone(),
                email: request.email.clone(),
                password_hash: hash_password(&request.password)?,
                role: request.role.unwrap_or(Role::Borrower),
                student_number: request.student_number.clone(),
                phone: request.phone.clone(),
                address: request.address.clone(),
            })
            .await
    }

    pub async fn update(&self, id: i64, update: &UpdateUser) -> AppResult<User> {
        if let Some(email) = &update.email {
            let current = self.repository.users.get_by_id(id).await?;
            if *email != current.email && self.repository.users.email_exists(email).await? {
                return Err(AppError::Conflict(format!(
                    "Email {} is already registered",
                    email
                )));
            }
        }
        self.repository.users.update(id, update).await
    }

    /// Change a user's role; administrators cannot demote themselves
    pub async fn set_role(&self, actor: &Actor, id: i64, role: Role) -> AppResult<User> {
        if actor.owns(id) {
            return Err(AppError::BadRequest(
                "You cannot change your own role".to_string(),
            ));
        }
        self.repository.users.set_role(id, role).await
    }

    /// Toggle account status; administrators cannot deactivate themselves
    pub async fn set_status(&self, actor: &Actor, id: i64, status: UserStatus) -> AppResult<User> {
        if actor.owns(id) {
            return Err(AppError::BadRequest(
                "You cannot change your own account status".to_string(),
            ));
        }
        self.repository.users.set_status(id, status).await
    }

    pub async fn delete(&self, actor: &Actor, id: i64) -> AppResult<()> {
        if actor.owns(id) {
            return Err(AppError::BadRequest(
                "You cannot delete your own account".to_string(),
            ));
        }
        self.repository.users.delete(id).await
    }

    pub async fn stats(&self) -> AppResult<UserStats> {
        self.repository.users.stats().await
    }
}

//! Authentication service: registration, login, profile, passwords

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use chrono::{Duration, Utc};

use crate::{
    config::AuthConfig,
    error::{AppError, AppResult},
    models::{
        enums::{Role, UserStatus},
        user::{ChangePassword, RegisterUser, UpdateProfile, UserClaims},
        User,
    },
    repository::{users::NewUser, Repository},
};

/// Hash a password with Argon2id and a fresh random salt
pub(crate) fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AppError::Internal(format!("Failed to hash password: {}", e)))?;
    Ok(hash.to_string())
}

/// Constant-time verification against a stored hash
pub(crate) fn verify_password(password: &str, stored_hash: &str) -> AppResult<bool> {
    let parsed = PasswordHash::new(stored_hash)
        .map_err(|e| AppError::Internal(format!("Invalid password hash: {}", e)))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}

#[derive(Clone)]
pub struct AuthService {
    repository: Repository,
    auth_config: AuthConfig,
}

impl AuthService {
    pub fn new(repository: Repository, auth_config: AuthConfig) -> Self {
        Self {
            repository,
            auth_config,
        }
    }

    /// Issue a bearer token for the user
    pub fn issue_token(&self, user: &User) -> AppResult<String> {
        let now = Utc::now();
        let claims = UserClaims {
            sub: user.email.clone(),
            user_id: user.id,
            role: user.role,
            iat: now.timestamp(),
            exp: (now + Duration::hours(self.auth_config.jwt_expiration_hours as i64)).timestamp(),
        };
        claims
            .create_token(&self.auth_config.jwt_secret)
            .map_err(|e| AppError::Internal(format!("Failed to create token: {}", e)))
    }

    /// Self-service registration; every new account starts as a borrower
    pub async fn register(&self, request: &RegisterUser) -> AppResult<(User, String)> {
        if self.repository.users.email_exists(&request.email).await? {
            return Err(AppError::Conflict(format!(
                "Email {} is already registered",
                request.email
            )));
        }

        let user = self
            .repository
            .users
            .create(&NewUser {
                first_name: request.first_name.clone(),
                last_name: request.last_name.clone(),
                email: request.email.clone(),
                password_hash: hash_password(&request.password)?,
                role: Role::Borrower,
                student_number: request.student_number.clone(),
                phone: request.phone.clone(),
                address: request.address.clone(),
            })
            .await?;

        let token = self.issue_token(&user)?;
        Ok((user, token))
    }

    /// Verify credentials and issue a token. Deactivated accounts cannot
    /// log in; suspended ones can (they just cannot borrow).
    pub async fn login(&self, email: &str, password: &str) -> AppResult<(User, String)> {
        let user = self
            .repository
            .users
            .get_by_email(email)
            .await?
            .ok_or_else(|| AppError::Authentication("Invalid email or password".to_string()))?;

        if !verify_password(password, &user.password)? {
            return Err(AppError::Authentication(
                "Invalid email or password".to_string(),
            ));
        }
        if user.status == UserStatus::Inactive {
            return Err(AppError::Authentication(
                "Account is deactivated".to_string(),
            ));
        }

        let token = self.issue_token(&user)?;
        Ok((user, token))
    }

    pub async fn me(&self, user_id: i64) -> AppResult<User> {
        self.repository.users.get_by_id(user_id).await
    }

    /// Update the caller's own profile
    pub async fn update_profile(&self, user_id: i64, update: &UpdateProfile) -> AppResult<User> {
        if let Some(email) = &update.email {
            let current = self.repository.users.get_by_id(user_id).await?;
            if *email != current.email && self.repository.users.email_exists(email).await? {
                return Err(AppError::Conflict(format!(
                    "Email {} is already registered",
                    email
                )));
            }
        }
        self.repository.users.update_profile(user_id, update).await
    }

    /// Change the caller's password after re-verifying the current one
    pub async fn change_password(&self, user_id: i64, request: &ChangePassword) -> AppResult<()> {
        let user = self.repository.users.get_by_id(user_id).await?;
        if !verify_password(&request.current_password, &user.password)? {
            return Err(AppError::Authentication(
                "Current password is incorrect".to_string(),
            ));
        }
        let hash = hash_password(&request.new_password)?;
        self.repository.users.update_password(user_id, &hash).await
    }
}

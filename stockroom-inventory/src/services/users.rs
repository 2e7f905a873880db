use argon2::password_hash::SaltString;
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use rand::rngs::OsRng;
use stockroom::collection::RecordId;
use stockroom::doc;
use stockroom::errors::{ErrorKind, StockroomError, StockroomResult};
use stockroom::model::Repository;
use stockroom::stockroom::Stockroom;

use super::suppliers::is_valid_email;
use super::{paginate, require_text, validation_error, Page, PageRequest};
use crate::entities::{Role, User};
use crate::timestamp;

pub const MIN_PASSWORD_LENGTH: usize = 8;

const INVALID_CREDENTIALS: &str = "Username or password is invalid";

/// Account registration and password checks. Only argon2 hashes are stored.
#[derive(Clone)]
pub struct UserService {
    users: Repository<User>,
}

impl UserService {
    pub fn new(db: &Stockroom) -> StockroomResult<Self> {
        Ok(UserService {
            users: db.repository()?,
        })
    }

    pub fn register(
        &self,
        username: &str,
        email: &str,
        password: &str,
        role: Role,
    ) -> StockroomResult<User> {
        require_text("username", username)?;
        if !is_valid_email(email) {
            return Err(validation_error(&format!("Invalid email {}", email)));
        }
        validate_password(password)?;

        let now = timestamp::now();
        let user = User {
            id: None,
            username: username.to_string(),
            email: email.to_string(),
            password_hash: hash_password(password)?,
            role,
            is_active: true,
            last_login: None,
            created_at: Some(now),
            updated_at: Some(now),
        };
        let user = self.users.create_unique(&user, &["username", "email"])?;
        log::info!("Registered user {}", username);
        Ok(user)
    }

    /// Verifies the credentials of an active account and records the login.
    pub fn authenticate(&self, username: &str, password: &str) -> StockroomResult<User> {
        let user = match self.users.find_one(&doc! { username: username })? {
            Some(user) if user.is_active => user,
            _ => {
                log::error!("{}", INVALID_CREDENTIALS);
                return Err(StockroomError::new(INVALID_CREDENTIALS, ErrorKind::SecurityError));
            }
        };
        verify_password(password, &user.password_hash)?;

        let id = user.id.clone().ok_or_else(|| {
            StockroomError::new("Stored user carries no id", ErrorKind::NotIdentifiable)
        })?;
        let now = timestamp::now();
        self.users
            .find_by_id_and_modify(&id, |user| {
                user.last_login = Some(now);
                Ok(())
            })?
            .ok_or_else(|| StockroomError::new(INVALID_CREDENTIALS, ErrorKind::SecurityError))
    }

    /// Replaces the password after checking the current one. `false` when no
    /// such user exists.
    pub fn change_password(
        &self,
        id: &RecordId,
        old_password: &str,
        new_password: &str,
    ) -> StockroomResult<bool> {
        let user = match self.users.find_by_id(id)? {
            Some(user) => user,
            None => return Ok(false),
        };
        verify_password(old_password, &user.password_hash)?;
        validate_password(new_password)?;

        let hash = hash_password(new_password)?;
        let updated = self.users.find_by_id_and_modify(id, |user| {
            user.password_hash = hash;
            user.updated_at = Some(timestamp::now());
            Ok(())
        })?;
        Ok(updated.is_some())
    }

    pub fn get(&self, id: &RecordId) -> StockroomResult<Option<User>> {
        self.users.find_by_id(id)
    }

    /// Users by username.
    pub fn list(&self, page: PageRequest) -> StockroomResult<Page<User>> {
        let mut users = self.users.find(&doc! {})?;
        users.sort_by(|a, b| a.username.cmp(&b.username));
        Ok(paginate(users, page))
    }

    pub fn update_role(&self, id: &RecordId, role: Role) -> StockroomResult<Option<User>> {
        self.users.find_by_id_and_modify(id, |user| {
            user.role = role;
            user.updated_at = Some(timestamp::now());
            Ok(())
        })
    }

    /// Deactivated users can no longer authenticate.
    pub fn deactivate(&self, id: &RecordId) -> StockroomResult<Option<User>> {
        self.users.find_by_id_and_modify(id, |user| {
            user.is_active = false;
            user.updated_at = Some(timestamp::now());
            Ok(())
        })
    }

    pub fn delete(&self, id: &RecordId) -> StockroomResult<bool> {
        self.users.find_by_id_and_delete(id)
    }
}

fn validate_password(password: &str) -> StockroomResult<()> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(validation_error(&format!(
            "Password must be at least {} characters",
            MIN_PASSWORD_LENGTH
        )));
    }
    Ok(())
}

fn hash_password(password: &str) -> StockroomResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    match Argon2::default().hash_password(password.as_bytes(), &salt) {
        Ok(hash) => Ok(hash.to_string()),
        Err(e) => {
            log::error!("Failed to hash password: {:?}", e);
            Err(StockroomError::new(
                "Failed to hash password",
                ErrorKind::SecurityError,
            ))
        }
    }
}

fn verify_password(password: &str, expected_hash: &str) -> StockroomResult<()> {
    let verified = PasswordHash::new(expected_hash).and_then(|parsed| {
        Argon2::default().verify_password(password.as_bytes(), &parsed)
    });
    match verified {
        Ok(_) => Ok(()),
        Err(e) => {
            log::error!("{}: {:?}", INVALID_CREDENTIALS, e);
            Err(StockroomError::new(INVALID_CREDENTIALS, ErrorKind::SecurityError))
        }
    }
}

//! User model. Admin rights are a plain flag on the row, read fresh per request.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// Role reported to clients, derived from the `is_admin` column.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    User,
}

impl Role {
    pub fn from_admin_flag(is_admin: bool) -> Self {
        if is_admin {
            Role::Admin
        } else {
            Role::User
        }
    }
}

/// Full user row from database (includes password_hash, never serialized to the API).
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub url: String,
    /// Absent for accounts created through Google sign-in.
    pub password_hash: Option<String>,
    pub is_admin: bool,
    pub name: Option<String>,
    pub last_name: Option<String>,
    pub biography: Option<String>,
    pub verified: bool,
    pub verified_email: bool,
    pub google_account: bool,
    pub profile_picture_src: Option<String>,
    pub banner_picture_src: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn role(&self) -> Role {
        Role::from_admin_flag(self.is_admin)
    }
}

/// Profile DTO: excludes password_hash and upload paths.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub url: String,
    pub role: Role,
    pub name: Option<String>,
    pub last_name: Option<String>,
    pub biography: Option<String>,
    pub verified: bool,
    pub verified_email: bool,
    pub google_account: bool,
    pub register_date: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(u: User) -> Self {
        Self {
            id: u.id,
            role: u.role(),
            username: u.username,
            email: u.email,
            url: u.url,
            name: u.name,
            last_name: u.last_name,
            biography: u.biography,
            verified: u.verified,
            verified_email: u.verified_email,
            google_account: u.google_account,
            register_date: u.created_at,
        }
    }
}

/// Public profile by url, with follow counts from the document store.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicProfile {
    #[serde(flatten)]
    pub user: UserResponse,
    pub followers: u64,
    pub following: u64,
}

/// Row returned by user search and the admin panel.
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub url: String,
    pub verified: bool,
    pub verified_email: bool,
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RegisterUser {
    #[validate(length(min = 1, message = "Username is required"))]
    pub username: String,
    #[validate(email(message = "Invalid email!"))]
    pub email: String,
    #[validate(length(min = 8, message = "Password must be at least 8 characters long!"))]
    pub password: String,
    pub confirmation_password: String,
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfile {
    #[validate(length(min = 1, message = "Username is required"))]
    pub username: String,
    #[validate(email(message = "Invalid email!"))]
    pub email: String,
    pub name: Option<String>,
    pub last_name: Option<String>,
    pub biography: Option<String>,
    pub current_password: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ChangePassword {
    pub current_password: String,
    #[validate(length(min = 8, message = "Password must be at least 8 characters long!"))]
    pub new_password: String,
    pub confirm_password: String,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct DeleteAccount {
    pub password: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_user() -> User {
        User {
            id: 7,
            username: "ada".to_string(),
            email: "ada@fundflow.test".to_string(),
            url: "ada".to_string(),
            password_hash: Some("secret_hash".to_string()),
            is_admin: false,
            name: None,
            last_name: None,
            biography: None,
            verified: false,
            verified_email: true,
            google_account: false,
            profile_picture_src: Some("uploads/profiles/user_7.png".to_string()),
            banner_picture_src: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn role_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Role::Admin).unwrap(), "\"admin\"");
        assert_eq!(Role::from_admin_flag(false), Role::User);
    }

    #[test]
    fn user_response_excludes_password_and_paths() {
        let json = serde_json::to_string(&UserResponse::from(sample_user())).unwrap();
        assert!(!json.contains("password"));
        assert!(!json.contains("hash"));
        assert!(!json.contains("uploads/"));
        assert!(json.contains("\"verifiedEmail\":true"));
    }

    #[test]
    fn public_profile_flattens_user() {
        let profile = PublicProfile {
            user: sample_user().into(),
            followers: 3,
            following: 1,
        };
        let json = serde_json::to_value(&profile).unwrap();
        assert_eq!(json["url"], "ada");
        assert_eq!(json["followers"], 3);
    }

    #[test]
    fn register_rejects_short_password_and_bad_email() {
        let input = RegisterUser {
            username: "ada".into(),
            email: "not-an-email".into(),
            password: "short".into(),
            confirmation_password: "short".into(),
        };
        let errors = input.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("email"));
        assert!(fields.contains_key("password"));
    }
}

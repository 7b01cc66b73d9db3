//! Authenticated identities and the identity collaborator.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::response::UserId;
use crate::store::CollaboratorError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    Admin,
    User,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "ADMIN",
            Role::User => "USER",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "ADMIN" => Some(Role::Admin),
            "USER" => Some(Role::User),
            _ => None,
        }
    }
}

/// Who is signed in. `full_name` and `position` stay empty until the
/// profile details have been submitted once.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub id: UserId,
    pub username: String,
    pub role: Role,
    pub full_name: Option<String>,
    pub position: Option<String>,
}

impl Identity {
    pub fn new(id: impl Into<UserId>, username: impl Into<String>, role: Role) -> Self {
        Self {
            id: id.into(),
            username: username.into(),
            role,
            full_name: None,
            position: None,
        }
    }

    pub fn with_profile(mut self, details: &ProfileDetails) -> Self {
        self.full_name = Some(details.full_name.clone());
        self.position = Some(details.position.clone());
        self
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    /// Both display name and position are present and non-blank.
    pub fn is_registered(&self) -> bool {
        let filled = |v: &Option<String>| v.as_deref().is_some_and(|s| !s.trim().is_empty());
        filled(&self.full_name) && filled(&self.position)
    }
}

/// Profile details collected on first sign-in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileDetails {
    pub full_name: String,
    pub position: String,
}

impl ProfileDetails {
    pub fn new(full_name: impl Into<String>, position: impl Into<String>) -> Self {
        Self {
            full_name: full_name.into(),
            position: position.into(),
        }
    }

    /// Trimmed copy, rejecting blank fields.
    pub fn validated(&self) -> Result<ProfileDetails, ValidationError> {
        let full_name = self.full_name.trim();
        if full_name.is_empty() {
            return Err(ValidationError::MissingField("full_name"));
        }
        let position = self.position.trim();
        if position.is_empty() {
            return Err(ValidationError::MissingField("position"));
        }
        Ok(ProfileDetails::new(full_name, position))
    }
}

/// The identity backend as seen from the flow.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// The signed-in identity. Backend failures are reported as `None`.
    async fn current_identity(&self) -> Option<Identity>;

    async fn save_profile_details(
        &self,
        id: &UserId,
        details: &ProfileDetails,
    ) -> Result<Identity, CollaboratorError>;
}

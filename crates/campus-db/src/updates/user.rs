//! User create type.

use serde::{Deserialize, Serialize};

use campus_core::enums::{Role, UserStatus};
use campus_core::validation::UserForm;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewUser {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    /// Plain text; hashed before it reaches storage and never echoed back.
    #[serde(default, skip_serializing)]
    pub password: String,
    /// Kept as text so an unknown role surfaces as a validation message.
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub status: Option<UserStatus>,
    #[serde(default)]
    pub phone: Option<String>,
}

impl NewUser {
    /// The fields checked by `validate_user_data`. A missing role defaults to
    /// student.
    #[must_use]
    pub fn form(&self) -> UserForm {
        UserForm {
            name: Some(self.name.clone()),
            email: Some(self.email.clone()),
            password: Some(self.password.clone()),
            role: Some(
                self.role
                    .clone()
                    .unwrap_or_else(|| Role::default().as_str().to_string()),
            ),
        }
    }
}

use super::ids::{TempleId, UserId};
use crate::error::{LedgerError, Result};
use serde::{Deserialize, Serialize};

/// A registered visitor. Only the contact fields change after registration.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct User {
    pub id: UserId,
    pub name: String,
    /// Unique among users when present.
    pub email: Option<String>,
    pub phone: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct Temple {
    pub id: TempleId,
    pub name: String,
    pub location: String,
}

pub(crate) fn required(field: &str, value: &str) -> Result<String> {
    let value = value.trim();
    if value.is_empty() {
        return Err(LedgerError::InvalidArgument(format!(
            "{field} must not be blank"
        )));
    }
    Ok(value.to_string())
}

/// Trims an optional contact field; a present but blank email is an error,
/// a blank phone is treated as absent.
pub(crate) fn contact(email: Option<&str>, phone: Option<&str>) -> Result<(Option<String>, Option<String>)> {
    let email = email.map(|e| required("email", e)).transpose()?;
    let phone = phone
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(str::to_string);
    Ok((email, phone))
}

/// Emails compare case-insensitively for uniqueness.
pub(crate) fn email_key(email: &str) -> String {
    email.to_ascii_lowercase()
}

// hortifruti-core/src/domain/address.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::error::DomainError;

/// Brazilian CEP, kept as its 8 digits.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PostalCode(String);

impl PostalCode {
  /// Accepts `12500-001`, `12.500-001`, `12500 001` or `12500001`.
  pub fn parse(raw: &str) -> Result<Self, DomainError> {
    let digits: String = raw.chars().filter(|c| !matches!(c, '-' | '.' | ' ')).collect();
    if digits.len() != 8 || !digits.chars().all(|c| c.is_ascii_digit()) {
      return Err(DomainError::InvalidPostalCode(raw.to_string()));
    }
    Ok(Self(digits))
  }

  pub fn as_str(&self) -> &str {
    &self.0
  }

  pub fn numeric(&self) -> u32 {
    // Eight ASCII digits always fit in a u32.
    self.0.bytes().fold(0u32, |acc, b| acc * 10 + u32::from(b - b'0'))
  }

  /// `12500-001` style, for display.
  pub fn formatted(&self) -> String {
    format!("{}-{}", &self.0[..5], &self.0[5..])
  }
}

impl TryFrom<String> for PostalCode {
  type Error = DomainError;

  fn try_from(value: String) -> Result<Self, Self::Error> {
    Self::parse(&value)
  }
}

impl From<PostalCode> for String {
  fn from(value: PostalCode) -> Self {
    value.0
  }
}

impl std::fmt::Display for PostalCode {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.write_str(&self.formatted())
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Address {
  pub id: Uuid,
  pub owner_user_id: String,
  pub postal_code: PostalCode,
  pub street: String,
  pub number: String,
  pub neighborhood: String,
  pub city: String,
  pub state: String,
  pub created_at: DateTime<Utc>,
}

/// Address fields as typed by the user, before validation.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewAddress {
  pub postal_code: String,
  pub street: String,
  pub number: String,
  #[serde(default)]
  pub neighborhood: String,
  pub city: String,
  pub state: String,
}

impl NewAddress {
  /// Validates and turns the input into an address owned by `owner_user_id`.
  pub fn into_address(self, owner_user_id: &str, now: DateTime<Utc>) -> Result<Address, DomainError> {
    let postal_code = PostalCode::parse(&self.postal_code)?;
    let street = required("street", self.street)?;
    let number = required("number", self.number)?;
    let city = required("city", self.city)?;
    let state = required("state", self.state)?.to_uppercase();
    if state.len() != 2 || !state.chars().all(|c| c.is_ascii_alphabetic()) {
      return Err(DomainError::InvalidState(state));
    }

    Ok(Address {
      id: Uuid::new_v4(),
      owner_user_id: owner_user_id.to_string(),
      postal_code,
      street,
      number,
      neighborhood: self.neighborhood.trim().to_string(),
      city,
      state,
      created_at: now,
    })
  }
}

fn required(field: &'static str, value: String) -> Result<String, DomainError> {
  let trimmed = value.trim();
  if trimmed.is_empty() {
    return Err(DomainError::MissingField { field });
  }
  Ok(trimmed.to_string())
}

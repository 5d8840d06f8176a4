// hortifruti-core/src/domain/tax_id.rs

use super::error::DomainError;

/// Brazilian individual taxpayer id. Only the format (11 digits) is checked;
/// check digits are left to the payment provider.
#[derive(Clone, PartialEq, Eq)]
pub struct Cpf(String);

impl Cpf {
  pub fn parse(raw: &str) -> Result<Self, DomainError> {
    let trimmed = raw.trim();
    if trimmed.len() != 11 || !trimmed.bytes().all(|b| b.is_ascii_digit()) {
      return Err(DomainError::InvalidTaxId);
    }
    Ok(Self(trimmed.to_string()))
  }

  pub fn as_str(&self) -> &str {
    &self.0
  }
}

// Never print the full number.
impl std::fmt::Debug for Cpf {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(f, "Cpf(***.***.***-{})", &self.0[9..])
  }
}

// hortifruti-server/src/models/pix.rs

use hortifruti_core::domain::pricing::round_cents;
use hortifruti_core::domain::Cpf;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One cart line as sent by the app.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PixCartLine {
  #[serde(default)]
  pub nome: Option<String>,
  #[serde(default)]
  pub preco: Option<Decimal>,
  #[serde(default)]
  pub quantidade: Option<i64>,
  #[serde(default)]
  pub fornecedor: Option<String>,
}

/// Body of `POST /criarPixHortifruti`. Every field is optional at the parsing
/// stage so that all problems can be reported at once.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PixChargePayload {
  #[serde(default)]
  pub carrinho: Option<Vec<PixCartLine>>,
  #[serde(default)]
  pub frete: Option<Decimal>,
  #[serde(default, rename = "taxaServico")]
  pub taxa_servico: Option<Decimal>,
  #[serde(default)]
  pub total: Option<Decimal>,
  #[serde(default, rename = "nomeCliente")]
  pub nome_cliente: Option<String>,
  #[serde(default, rename = "cpfCliente")]
  pub cpf_cliente: Option<String>,
  #[serde(default)]
  pub external_reference: Option<String>,
}

/// A payload that passed [`PixChargePayload::validate`].
#[derive(Debug, Clone)]
pub struct ValidPixCharge {
  pub lines: Vec<ValidPixLine>,
  pub shipping_fee: Decimal,
  pub service_fee: Decimal,
  pub total: Decimal,
  pub customer_name: String,
  pub cpf: Cpf,
  pub external_reference: String,
}

#[derive(Debug, Clone)]
pub struct ValidPixLine {
  pub name: String,
  pub unit_price: Decimal,
  pub quantity: i64,
  pub supplier_name: Option<String>,
}

/// Largest quantity a single cart line may carry.
const MAX_LINE_QUANTITY: i64 = i32::MAX as i64;

fn non_blank(value: &Option<String>) -> Option<String> {
  value.as_deref().map(str::trim).filter(|v| !v.is_empty()).map(str::to_string)
}

impl PixChargePayload {
  /// Checks every field and returns either the clean charge or every problem found.
  pub fn validate(&self) -> Result<ValidPixCharge, Vec<String>> {
    let mut errors = Vec::new();
    let mut lines = Vec::new();

    match &self.carrinho {
      None => errors.push("carrinho is required".to_string()),
      Some(items) if items.is_empty() => errors.push("carrinho must contain at least one item".to_string()),
      Some(items) => {
        for (index, item) in items.iter().enumerate() {
          let name = non_blank(&item.nome);
          if name.is_none() {
            errors.push(format!("carrinho[{}].nome is required", index));
          }
          match item.preco {
            Some(price) if price > Decimal::ZERO => {}
            Some(_) => errors.push(format!("carrinho[{}].preco must be greater than 0", index)),
            None => errors.push(format!("carrinho[{}].preco is required", index)),
          }
          match item.quantidade {
            Some(quantity) if quantity > MAX_LINE_QUANTITY => errors.push(format!(
              "carrinho[{}].quantidade must be at most {}",
              index, MAX_LINE_QUANTITY
            )),
            Some(quantity) if quantity >= 1 => {}
            Some(_) => errors.push(format!("carrinho[{}].quantidade must be at least 1", index)),
            None => errors.push(format!("carrinho[{}].quantidade is required", index)),
          }
          if let (Some(name), Some(unit_price), Some(quantity)) = (name, item.preco, item.quantidade) {
            lines.push(ValidPixLine {
              name,
              unit_price,
              quantity,
              supplier_name: non_blank(&item.fornecedor),
            });
          }
        }
      }
    }

    let mut amount = |value: Option<Decimal>, field: &str, allow_zero: bool| -> Decimal {
      match value {
        None => {
          errors.push(format!("{} is required", field));
          Decimal::ZERO
        }
        Some(v) if v < Decimal::ZERO || (!allow_zero && v.is_zero()) => {
          let bound = if allow_zero { ">= 0" } else { "> 0" };
          errors.push(format!("{} must be {}", field, bound));
          v
        }
        Some(v) => v,
      }
    };
    let shipping_fee = amount(self.frete, "frete", true);
    let service_fee = amount(self.taxa_servico, "taxaServico", true);
    let total = amount(self.total, "total", false);

    let customer_name = non_blank(&self.nome_cliente);
    if customer_name.is_none() {
      errors.push("nomeCliente is required".to_string());
    }
    let external_reference = non_blank(&self.external_reference);
    if external_reference.is_none() {
      errors.push("external_reference is required".to_string());
    }
    let cpf = match self.cpf_cliente.as_deref().map(Cpf::parse) {
      Some(Ok(cpf)) => Some(cpf),
      _ => {
        errors.push("cpfCliente must be exactly 11 digits".to_string());
        None
      }
    };

    if errors.is_empty() {
      let mut goods = Some(Decimal::ZERO);
      for (index, line) in lines.iter().enumerate() {
        let line_total = line.unit_price.checked_mul(Decimal::from(line.quantity));
        if line_total.is_none() {
          errors.push(format!("carrinho[{}] amount is out of range", index));
        }
        goods = goods.zip(line_total).and_then(|(sum, amount)| sum.checked_add(amount));
      }
      let expected = goods
        .and_then(|g| g.checked_add(service_fee))
        .and_then(|g| g.checked_add(shipping_fee))
        .map(round_cents);
      match expected {
        None if errors.is_empty() => errors.push("items + taxaServico + frete is out of range".to_string()),
        None => {}
        Some(expected) if expected != round_cents(total) => errors.push(format!(
          "total {:.2} does not match items + taxaServico + frete ({:.2})",
          round_cents(total),
          expected
        )),
        Some(_) => {}
      }
    }

    match (errors.is_empty(), customer_name, cpf, external_reference) {
      (true, Some(customer_name), Some(cpf), Some(external_reference)) => Ok(ValidPixCharge {
        lines,
        shipping_fee,
        service_fee,
        total: round_cents(total),
        customer_name,
        cpf,
        external_reference,
      }),
      _ => Err(errors),
    }
  }
}

impl ValidPixCharge {
  /// Distinct supplier names named by the cart lines, sorted.
  pub fn supplier_names(&self) -> Vec<String> {
    let mut names: Vec<String> = self.lines.iter().filter_map(|l| l.supplier_name.clone()).collect();
    names.sort();
    names.dedup();
    names
  }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PixChargeResponse {
  #[serde(rename = "qrCode")]
  pub qr_code: String,
  #[serde(rename = "qrCodeBase64")]
  pub qr_code_base64: String,
  #[serde(rename = "paymentId")]
  pub payment_id: String,
  pub status: String,
  pub external_reference: String,
}

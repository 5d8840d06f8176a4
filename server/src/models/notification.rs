// hortifruti-server/src/models/notification.rs

//! Payment notifications. The provider sends either a JSON body
//! (`{"type": "payment", "data": {"id": "123"}}`) or, for the legacy IPN
//! format, query parameters (`?topic=payment&id=123` or `?data.id=123&type=payment`).

use serde::Deserialize;
use serde_json::Value as JsonValue;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NotificationBody {
  #[serde(default, rename = "type")]
  pub kind: Option<String>,
  #[serde(default)]
  pub topic: Option<String>,
  #[serde(default)]
  pub action: Option<String>,
  #[serde(default)]
  pub data: Option<NotificationData>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NotificationData {
  #[serde(default)]
  pub id: Option<JsonValue>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NotificationQuery {
  #[serde(default, rename = "data.id")]
  pub data_id: Option<String>,
  #[serde(default)]
  pub id: Option<String>,
  #[serde(default, rename = "type")]
  pub kind: Option<String>,
  #[serde(default)]
  pub topic: Option<String>,
}

/// What the webhook handler needs out of a notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationTarget {
  pub payment_id: Option<String>,
  /// `false` for merchant_order and other topics we do not track.
  pub is_payment: bool,
}

fn id_text(value: &JsonValue) -> Option<String> {
  match value {
    JsonValue::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
    JsonValue::Number(n) => Some(n.to_string()),
    _ => None,
  }
}

impl NotificationTarget {
  pub fn resolve(body: Option<&NotificationBody>, query: &NotificationQuery) -> Self {
    let body_id = body
      .and_then(|b| b.data.as_ref())
      .and_then(|d| d.id.as_ref())
      .and_then(id_text);
    let query_id = query
      .data_id
      .clone()
      .or_else(|| query.id.clone())
      .map(|id| id.trim().to_string())
      .filter(|id| !id.is_empty());

    let kind = body
      .and_then(|b| b.kind.clone().or_else(|| b.topic.clone()))
      .or_else(|| query.kind.clone())
      .or_else(|| query.topic.clone());
    let is_payment = match kind.as_deref().map(str::trim) {
      None => true,
      Some(kind) => kind.eq_ignore_ascii_case("payment"),
    };

    Self {
      payment_id: body_id.or(query_id),
      is_payment,
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  #[test]
  fn reads_id_from_body() {
    let body: NotificationBody =
      serde_json::from_value(json!({"type": "payment", "action": "payment.updated", "data": {"id": "123"}})).unwrap();
    let target = NotificationTarget::resolve(Some(&body), &NotificationQuery::default());
    assert_eq!(target.payment_id.as_deref(), Some("123"));
    assert!(target.is_payment);
  }

  #[test]
  fn numeric_body_id_is_accepted() {
    let body: NotificationBody = serde_json::from_value(json!({"data": {"id": 987654}})).unwrap();
    let target = NotificationTarget::resolve(Some(&body), &NotificationQuery::default());
    assert_eq!(target.payment_id.as_deref(), Some("987654"));
  }

  #[test]
  fn falls_back_to_legacy_query() {
    let query = NotificationQuery {
      id: Some("555".to_string()),
      topic: Some("payment".to_string()),
      ..Default::default()
    };
    let target = NotificationTarget::resolve(None, &query);
    assert_eq!(target.payment_id.as_deref(), Some("555"));
    assert!(target.is_payment);
  }

  #[test]
  fn other_topics_are_not_payments() {
    let query = NotificationQuery {
      id: Some("42".to_string()),
      topic: Some("merchant_order".to_string()),
      ..Default::default()
    };
    assert!(!NotificationTarget::resolve(None, &query).is_payment);
  }

  #[test]
  fn missing_id_is_none() {
    let body: NotificationBody = serde_json::from_value(json!({"type": "payment", "data": {}})).unwrap();
    assert_eq!(NotificationTarget::resolve(Some(&body), &NotificationQuery::default()).payment_id, None);
  }
}

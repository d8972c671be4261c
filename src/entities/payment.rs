//! Payment methods: cards attached to an account

use crate::entities::account::AccountView;
use chrono::{DateTime, FixedOffset, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// A stored card. `user_id` references `accounts.id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentMethod {
    pub id: Option<i64>,
    pub user_id: i64,
    pub card_number: String,
    pub holder_name: String,
    /// Wall-clock expiry, without timezone
    pub expires_at: NaiveDateTime,
    pub security_code: i32,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

crate::impl_record! {
    PaymentMethod => "PaymentMethod", table "payment_methods",
    fields [
        id, user_id, card_number, holder_name, expires_at, security_code,
        created_at, updated_at,
    ],
    created created_at,
    updated updated_at,
}

/// Payment method input
///
/// `user_id` is ignored for self-service creation, where the owner is
/// always the caller.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct NewPaymentMethod {
    #[serde(default)]
    pub user_id: i64,
    #[validate(length(min = 4, max = 32))]
    pub card_number: String,
    #[validate(length(min = 1, max = 255))]
    pub holder_name: String,
    pub expires_at: DateTime<FixedOffset>,
    #[validate(range(min = 0, max = 9999))]
    pub security_code: i32,
}

impl NewPaymentMethod {
    /// Build the record to persist
    ///
    /// The expiry keeps its wall-clock time and drops the offset, so
    /// `2027-01-31T23:59:00-03:00` is stored as `2027-01-31T23:59:00`.
    pub fn into_payment_method(self) -> PaymentMethod {
        PaymentMethod {
            id: None,
            user_id: self.user_id,
            card_number: self.card_number,
            holder_name: self.holder_name,
            expires_at: self.expires_at.naive_local(),
            security_code: self.security_code,
            created_at: None,
            updated_at: None,
        }
    }
}

/// Keep the last four characters, masking the rest with `*`
pub fn mask_card_number(number: &str) -> String {
    let chars: Vec<char> = number.chars().collect();
    let visible = chars.len().saturating_sub(4);
    chars
        .iter()
        .enumerate()
        .map(|(i, c)| if i < visible { '*' } else { *c })
        .collect()
}

/// A payment method as shown to callers: masked number, no security code
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentMethodView {
    pub id: Option<i64>,
    pub user_id: i64,
    pub card_number: String,
    pub holder_name: String,
    pub expires_at: NaiveDateTime,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl From<PaymentMethod> for PaymentMethodView {
    fn from(method: PaymentMethod) -> Self {
        Self {
            id: method.id,
            user_id: method.user_id,
            card_number: mask_card_number(&method.card_number),
            holder_name: method.holder_name,
            expires_at: method.expires_at,
            created_at: method.created_at,
            updated_at: method.updated_at,
        }
    }
}

/// A payment method together with the account that owns it
#[derive(Debug, Clone, Serialize)]
pub struct PaymentWithOwner {
    #[serde(flatten)]
    pub payment: PaymentMethodView,
    pub owner: Option<AccountView>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn input(expires_at: &str) -> NewPaymentMethod {
        NewPaymentMethod {
            user_id: 7,
            card_number: "4111111111111111".to_string(),
            holder_name: "ALICE".to_string(),
            expires_at: DateTime::parse_from_rfc3339(expires_at).unwrap(),
            security_code: 123,
        }
    }

    #[test]
    fn expiry_keeps_wall_clock_time() {
        let method = input("2027-01-31T23:59:00-03:00").into_payment_method();
        let expected = NaiveDate::from_ymd_opt(2027, 1, 31)
            .unwrap()
            .and_hms_opt(23, 59, 0)
            .unwrap();
        assert_eq!(method.expires_at, expected);
        assert_eq!(method.user_id, 7);
    }

    #[test]
    fn mask_keeps_last_four() {
        assert_eq!(mask_card_number("4111111111111111"), "************1111");
        assert_eq!(mask_card_number("123"), "123");
        assert_eq!(mask_card_number(""), "");
    }

    #[test]
    fn view_hides_card_details() {
        let view = PaymentMethodView::from(input("2027-01-31T23:59:00Z").into_payment_method());
        assert_eq!(view.card_number, "************1111");
        let json = serde_json::to_value(&view).unwrap();
        assert!(json.get("security_code").is_none());
    }

    #[test]
    fn validation_rejects_short_card() {
        let mut bad = input("2027-01-31T23:59:00Z");
        bad.card_number = "12".to_string();
        assert!(bad.validate().is_err());
    }
}

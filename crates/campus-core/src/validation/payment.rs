use serde::{Deserialize, Serialize};

use super::is_blank;

pub const SUPPORTED_CURRENCY: &str = "INR";
/// One rupee.
pub const MIN_AMOUNT_PAISE: u64 = 100;
/// One lakh rupees.
pub const MAX_AMOUNT_PAISE: u64 = 10_000_000;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderNotes {
    pub course_id: Option<String>,
    pub user_id: Option<String>,
}

/// Gateway order request.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OrderParams {
    pub amount: Option<f64>,
    pub currency: Option<String>,
    pub receipt: Option<String>,
    pub notes: Option<OrderNotes>,
}

/// Checkout callback fields, named as the gateway sends them.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PaymentParams {
    pub razorpay_order_id: Option<String>,
    pub razorpay_payment_id: Option<String>,
    pub razorpay_signature: Option<String>,
}

#[must_use]
pub fn validate_order_params(params: &OrderParams) -> Vec<String> {
    let mut errors = Vec::new();
    if params.amount.is_none_or(|a| a <= 0.0 || a.is_nan()) {
        errors.push("Invalid amount".to_string());
    }
    if params.currency.as_deref() != Some(SUPPORTED_CURRENCY) {
        errors.push("Invalid currency".to_string());
    }
    if is_blank(params.receipt.as_deref()) {
        errors.push("Receipt is required".to_string());
    }
    let notes = params.notes.as_ref();
    if is_blank(notes.and_then(|n| n.course_id.as_deref())) {
        errors.push("Course ID is required in notes".to_string());
    }
    if is_blank(notes.and_then(|n| n.user_id.as_deref())) {
        errors.push("User ID is required in notes".to_string());
    }
    errors
}

#[must_use]
pub fn validate_payment_params(params: &PaymentParams) -> Vec<String> {
    let mut errors = Vec::new();
    if is_blank(params.razorpay_order_id.as_deref()) {
        errors.push("Razorpay order ID is required".to_string());
    }
    if is_blank(params.razorpay_payment_id.as_deref()) {
        errors.push("Razorpay payment ID is required".to_string());
    }
    if is_blank(params.razorpay_signature.as_deref()) {
        errors.push("Razorpay signature is required".to_string());
    }
    errors
}

/// Whether an amount in paise is within the gateway's accepted range.
#[must_use]
pub const fn validate_amount(paise: u64) -> bool {
    paise >= MIN_AMOUNT_PAISE && paise <= MAX_AMOUNT_PAISE
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn valid_order() -> OrderParams {
        OrderParams {
            amount: Some(50_000.0),
            currency: Some("INR".into()),
            receipt: Some("receipt_001".into()),
            notes: Some(OrderNotes {
                course_id: Some("crs-1".into()),
                user_id: Some("usr-1".into()),
            }),
        }
    }

    #[test]
    fn valid_order_passes() {
        assert!(validate_order_params(&valid_order()).is_empty());
    }

    #[test]
    fn order_rules_are_independent() {
        let params = OrderParams {
            amount: Some(0.0),
            currency: Some("USD".into()),
            notes: None,
            ..valid_order()
        };
        assert_eq!(
            validate_order_params(&params),
            vec![
                "Invalid amount",
                "Invalid currency",
                "Course ID is required in notes",
                "User ID is required in notes",
            ]
        );
    }

    #[test]
    fn payment_params_require_all_three() {
        let errors = validate_payment_params(&PaymentParams {
            razorpay_order_id: Some("order_1".into()),
            ..PaymentParams::default()
        });
        assert_eq!(
            errors,
            vec!["Razorpay payment ID is required", "Razorpay signature is required"]
        );
    }

    #[test]
    fn gateway_field_names_deserialize() {
        let params: PaymentParams = serde_json::from_str(
            r#"{"razorpay_order_id":"o","razorpay_payment_id":"p","razorpay_signature":"s"}"#,
        )
        .unwrap();
        assert!(validate_payment_params(&params).is_empty());
    }

    #[test]
    fn amount_bounds() {
        assert!(validate_amount(100));
        assert!(validate_amount(10_000));
        assert!(validate_amount(10_000_000));
        assert!(!validate_amount(99));
        assert!(!validate_amount(0));
        assert!(!validate_amount(10_000_001));
    }
}

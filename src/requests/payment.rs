use rust_decimal::Decimal;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct DonorDetailsRequest {
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub city: String,
}

#[derive(Debug, Deserialize)]
pub struct InitPaymentRequest {
    pub amount: Decimal,
    pub items: Option<String>,
    pub donor: DonorDetailsRequest,
}

/// Gateway webhook body (form-encoded). Every field is optional: a
/// malformed delivery must still reach the handler so it can be
/// acknowledged, never bounce with a 4xx at deserialization.
#[derive(Debug, Deserialize)]
pub struct NotifyRequest {
    pub order_id: Option<String>,
    pub status_code: Option<String>,
    pub payhere_amount: Option<String>,
    pub payhere_currency: Option<String>,
    pub md5sig: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateDonationStatusRequest {
    pub status: String,
    pub failure_reason: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn notify_request_accepts_partial_form_bodies() {
        let parsed: NotifyRequest =
            serde_urlencoded::from_str("order_id=DON_1&status_code=2").unwrap();
        assert_eq!(parsed.order_id.as_deref(), Some("DON_1"));
        assert!(parsed.md5sig.is_none());

        let empty: NotifyRequest = serde_urlencoded::from_str("").unwrap();
        assert!(empty.order_id.is_none());
    }

    #[test]
    fn init_request_takes_amount_as_string() {
        let parsed: InitPaymentRequest = serde_json::from_str(
            r#"{"amount":"100.50","donor":{"first_name":"Amara","email":"amara@example.org"}}"#,
        )
        .unwrap();
        assert_eq!(parsed.amount.to_string(), "100.50");
        assert_eq!(parsed.donor.last_name, "");
    }
}

//! Razorpay checkout: order creation and payment signature verification.
//!
//! Razorpay signs a completed checkout as
//! `HMAC_SHA256(key_secret, "<order_id>|<payment_id>")`, hex encoded.

use hmac::{Hmac, Mac};
use sha2::Sha256;
use uuid::Uuid;

use crate::{
    config::RazorpayCredentials,
    db::DbPool,
    error::AppError,
    models::{
        payment::{CreateOrderRequest, VerifyPaymentRequest, to_minor_units},
        subscription::Subscription,
    },
    services::subscription_service,
};

type HmacSha256 = Hmac<Sha256>;

const ORDERS_URL: &str = "https://api.razorpay.com/v1/orders";

/// Checkout amounts are major units and must be a positive finite number.
fn ensure_positive_amount(amount: f64) -> Result<(), AppError> {
    if !amount.is_finite() || amount <= 0.0 {
        return Err(AppError::InvalidRequest(
            "Amount must be greater than zero".to_string(),
        ));
    }
    Ok(())
}

/// Create a Razorpay order and hand Razorpay's response back unchanged.
pub async fn create_order(
    http: &reqwest::Client,
    credentials: &RazorpayCredentials,
    request: &CreateOrderRequest,
) -> Result<serde_json::Value, AppError> {
    ensure_positive_amount(request.amount)?;

    let body = serde_json::json!({
        "amount": to_minor_units(request.amount),
        "currency": request.currency.as_deref().unwrap_or("INR"),
        "receipt": format!("receipt_{}", chrono::Utc::now().timestamp_millis()),
    });

    let response = http
        .post(ORDERS_URL)
        .basic_auth(&credentials.key_id, Some(&credentials.key_secret))
        .json(&body)
        .send()
        .await?;

    let status = response.status();
    if !status.is_success() {
        let detail = response.text().await.unwrap_or_default();
        return Err(AppError::Upstream(format!(
            "razorpay order failed ({status}): {detail}"
        )));
    }

    Ok(response.json().await?)
}

/// Hex HMAC Razorpay attaches to a successful checkout.
pub fn checkout_signature(key_secret: &str, order_id: &str, payment_id: &str) -> String {
    hex::encode(checkout_mac(key_secret, order_id, payment_id).finalize().into_bytes())
}

fn checkout_mac(key_secret: &str, order_id: &str, payment_id: &str) -> HmacSha256 {
    let mut mac =
        HmacSha256::new_from_slice(key_secret.as_bytes()).expect("HMAC key length is valid");
    mac.update(format!("{order_id}|{payment_id}").as_bytes());
    mac
}

/// Constant-time check of a checkout signature.
pub fn verify_signature(key_secret: &str, order_id: &str, payment_id: &str, signature: &str) -> bool {
    let Ok(expected) = hex::decode(signature.trim()) else {
        return false;
    };
    checkout_mac(key_secret, order_id, payment_id)
        .verify_slice(&expected)
        .is_ok()
}

/// Verify the checkout and activate the paid plan for `user_id`.
pub async fn verify_payment(
    pool: &DbPool,
    credentials: &RazorpayCredentials,
    user_id: Uuid,
    request: &VerifyPaymentRequest,
) -> Result<Subscription, AppError> {
    ensure_positive_amount(request.amount)?;

    if !verify_signature(
        &credentials.key_secret,
        &request.razorpay_order_id,
        &request.razorpay_payment_id,
        &request.razorpay_signature,
    ) {
        tracing::warn!(
            %user_id,
            order_id = %request.razorpay_order_id,
            "payment signature mismatch"
        );
        return Err(AppError::InvalidSignature);
    }

    let subscription = subscription_service::activate_paid_plan(
        pool,
        user_id,
        request.plan,
        to_minor_units(request.amount),
        &request.razorpay_payment_id,
    )
    .await?;

    tracing::info!(
        %user_id,
        plan = request.plan.as_str(),
        payment_id = %request.razorpay_payment_id,
        "subscription activated"
    );

    Ok(subscription)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn own_signature_verifies() {
        let signature = checkout_signature("secret", "order_1", "pay_1");
        assert_eq!(signature.len(), 64);
        assert!(verify_signature("secret", "order_1", "pay_1", &signature));
    }

    #[test]
    fn tampered_signatures_fail() {
        let signature = checkout_signature("secret", "order_1", "pay_1");
        assert!(!verify_signature("other", "order_1", "pay_1", &signature));
        assert!(!verify_signature("secret", "order_2", "pay_1", &signature));
        assert!(!verify_signature("secret", "order_1", "pay_1", "not-hex"));
        assert!(!verify_signature("secret", "order_1", "pay_1", ""));
    }

    #[test]
    fn amounts_must_be_positive_and_finite() {
        assert!(ensure_positive_amount(499.0).is_ok());
        assert!(ensure_positive_amount(0.5).is_ok());
        for amount in [0.0, -10.0, f64::NAN, f64::INFINITY] {
            assert!(matches!(
                ensure_positive_amount(amount),
                Err(AppError::InvalidRequest(_))
            ));
        }
    }
}

//! Razorpay checkout request and response types.

use serde::{Deserialize, Serialize};

use crate::models::subscription::{Subscription, SubscriptionPlan};

/// Request body for `POST /api/payment/create-order`.
///
/// `amount` is in major units (rupees); the order is created in paise.
#[derive(Debug, Deserialize)]
pub struct CreateOrderRequest {
    pub amount: f64,
    #[serde(default)]
    pub currency: Option<String>,
}

/// Request body for `POST /api/payment/verify`.
#[derive(Debug, Deserialize)]
pub struct VerifyPaymentRequest {
    pub razorpay_order_id: String,
    pub razorpay_payment_id: String,
    pub razorpay_signature: String,
    pub plan: SubscriptionPlan,
    /// Major units, as charged
    pub amount: f64,
}

/// Response body for a verified payment.
#[derive(Debug, Serialize)]
pub struct VerifyPaymentResponse {
    pub success: bool,
    pub message: &'static str,
    pub subscription: Subscription,
}

/// Major units to minor units, rounded to the nearest unit.
pub fn to_minor_units(amount: f64) -> i64 {
    (amount * 100.0).round() as i64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minor_units_round() {
        assert_eq!(to_minor_units(499.0), 49_900);
        assert_eq!(to_minor_units(19.99), 1_999);
        assert_eq!(to_minor_units(0.0), 0);
    }
}

//! Razorpay checkout endpoints.
//!
//! - POST /api/payment/create-order - Open a Razorpay order
//! - POST /api/payment/verify - Verify the checkout signature and activate the plan

use axum::{Extension, Json, extract::State};

use crate::{
    error::AppError,
    middleware::auth::AuthContext,
    models::payment::{CreateOrderRequest, VerifyPaymentRequest, VerifyPaymentResponse},
    services::payment_service,
    state::AppState,
};

/// Create a Razorpay order.
///
/// # Request Body
///
/// ```json
/// { "amount": 499, "currency": "INR" }
/// ```
///
/// `amount` is in rupees; Razorpay receives paise. The response is
/// Razorpay's order object, passed through unchanged.
///
/// # Errors
///
/// - **400**: amount missing or not positive
/// - **502**: Razorpay rejected the request
/// - **503**: Razorpay credentials are not configured
pub async fn create_order(
    State(state): State<AppState>,
    Json(request): Json<CreateOrderRequest>,
) -> Result<Json<serde_json::Value>, AppError> {
    let credentials = state
        .config
        .razorpay()
        .ok_or(AppError::NotConfigured("Razorpay"))?;

    let order = payment_service::create_order(&state.http, &credentials, &request).await?;
    Ok(Json(order))
}

/// Verify a completed checkout.
///
/// On a valid signature the caller's subscription becomes active on the
/// paid plan for one month. A bad signature is a 400 `invalid_signature`.
pub async fn verify(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(request): Json<VerifyPaymentRequest>,
) -> Result<Json<VerifyPaymentResponse>, AppError> {
    let credentials = state
        .config
        .razorpay()
        .ok_or(AppError::NotConfigured("Razorpay"))?;

    let subscription =
        payment_service::verify_payment(&state.pool, &credentials, auth.user_id, &request).await?;

    Ok(Json(VerifyPaymentResponse {
        success: true,
        message: "Payment verified successfully",
        subscription,
    }))
}

//! Subscription service - admin management, revenue analytics and the
//! paid-plan upsert used by checkout.
//!
//! # Plan Sync
//!
//! `users.subscription_plan` and `users.subscription_status` mirror the
//! user's subscription row. Every write here updates both in one database
//! transaction.

use chrono::{DateTime, Months, Utc};
use sqlx::{PgConnection, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::{
    db::DbPool,
    error::AppError,
    models::{
        query::{Page, PageParams, like_pattern},
        subscription::{
            PlanBreakdown, RecentTransaction, RevenueAnalytics, RevenueFilters, Subscription,
            SubscriptionFilters, SubscriptionPlan, SubscriptionWithUser,
            UpdateSubscriptionRequest,
        },
    },
};

const SELECT_WITH_USER: &str = r#"
    SELECT s.*, u.name AS user_name, u.email AS user_email
    FROM subscriptions s
    LEFT JOIN users u ON u.id = s.user_id
"#;

fn push_filters(builder: &mut QueryBuilder<'_, Postgres>, filters: &SubscriptionFilters) {
    builder.push(" WHERE TRUE");
    if let Some(plan) = filters.plan {
        builder.push(" AND s.plan = ").push_bind(plan);
    }
    if let Some(status) = filters.status {
        builder.push(" AND s.status = ").push_bind(status);
    }
    if let Some(search) = &filters.search {
        let pattern = like_pattern(search);
        builder
            .push(" AND (u.name ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR u.email ILIKE ")
            .push_bind(pattern)
            .push(")");
    }
}

/// Paginated listing with owner name and email, newest first.
pub async fn list(
    pool: &DbPool,
    filters: &SubscriptionFilters,
) -> Result<Page<SubscriptionWithUser>, AppError> {
    let params = PageParams::new(filters.page, filters.limit);

    let mut count = QueryBuilder::<Postgres>::new(
        "SELECT COUNT(*) FROM subscriptions s LEFT JOIN users u ON u.id = s.user_id",
    );
    push_filters(&mut count, filters);
    let total: i64 = count.build_query_scalar().fetch_one(pool).await?;

    let mut query = QueryBuilder::<Postgres>::new(SELECT_WITH_USER);
    push_filters(&mut query, filters);
    query
        .push(" ORDER BY s.created_at DESC LIMIT ")
        .push_bind(params.limit)
        .push(" OFFSET ")
        .push_bind(params.offset());
    let data = query
        .build_query_as::<SubscriptionWithUser>()
        .fetch_all(pool)
        .await?;

    Ok(Page::new(data, params, total))
}

/// Every subscription matching the filters, for export.
pub async fn list_all(
    pool: &DbPool,
    filters: &SubscriptionFilters,
) -> Result<Vec<SubscriptionWithUser>, AppError> {
    let mut query = QueryBuilder::<Postgres>::new(SELECT_WITH_USER);
    push_filters(&mut query, filters);
    query.push(" ORDER BY s.created_at DESC");
    Ok(query
        .build_query_as::<SubscriptionWithUser>()
        .fetch_all(pool)
        .await?)
}

async fn sync_user(conn: &mut PgConnection, subscription: &Subscription) -> Result<(), AppError> {
    sqlx::query(
        r#"
        UPDATE users
        SET subscription_plan = $2, subscription_status = $3, updated_at = NOW()
        WHERE id = $1
        "#,
    )
    .bind(subscription.user_id)
    .bind(subscription.plan)
    .bind(subscription.status)
    .execute(conn)
    .await?;
    Ok(())
}

/// Apply a partial update, then mirror plan and status onto the user.
pub async fn update(
    pool: &DbPool,
    id: Uuid,
    request: UpdateSubscriptionRequest,
) -> Result<Subscription, AppError> {
    if request.amount_cents.is_some_and(|amount| amount < 0) {
        return Err(AppError::InvalidRequest(
            "Amount cannot be negative".to_string(),
        ));
    }
    if let Some(currency) = &request.currency {
        if currency.len() != 3 {
            return Err(AppError::InvalidRequest(
                "Currency must be a 3-letter code".to_string(),
            ));
        }
    }

    let mut query = QueryBuilder::<Postgres>::new("UPDATE subscriptions SET updated_at = NOW()");
    if let Some(plan) = request.plan {
        query.push(", plan = ").push_bind(plan);
    }
    if let Some(status) = request.status {
        query.push(", status = ").push_bind(status);
    }
    if let Some(amount) = request.amount_cents {
        query.push(", amount_cents = ").push_bind(amount);
    }
    if let Some(currency) = request.currency {
        query.push(", currency = ").push_bind(currency.to_uppercase());
    }
    if let Some(method) = request.payment_method {
        query.push(", payment_method = ").push_bind(method);
    }
    if let Some(end_date) = request.end_date {
        query.push(", end_date = ").push_bind(end_date);
    }
    if let Some(renewal_date) = request.renewal_date {
        query.push(", renewal_date = ").push_bind(renewal_date);
    }
    query.push(" WHERE id = ").push_bind(id).push(" RETURNING *");

    let mut tx = pool.begin().await?;
    let subscription = query
        .build_query_as::<Subscription>()
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(AppError::NotFound("Subscription"))?;
    sync_user(&mut tx, &subscription).await?;
    tx.commit().await?;

    Ok(subscription)
}

/// Record a verified payment: upsert the user's subscription as active for
/// one month, append a successful billing entry and sync the user.
pub async fn activate_paid_plan(
    pool: &DbPool,
    user_id: Uuid,
    plan: SubscriptionPlan,
    amount_cents: i64,
    payment_id: &str,
) -> Result<Subscription, AppError> {
    let now = Utc::now();
    let end_date = one_month_after(now);

    let mut tx = pool.begin().await?;

    let subscription = sqlx::query_as::<_, Subscription>(
        r#"
        INSERT INTO subscriptions (
            user_id, plan, status, start_date, end_date, renewal_date,
            amount_cents, currency, payment_method, transaction_id
        )
        VALUES ($1, $2, 'active', $3, $4, $4, $5, 'INR', 'card', $6)
        ON CONFLICT (user_id) DO UPDATE SET
            plan = EXCLUDED.plan,
            status = 'active',
            start_date = EXCLUDED.start_date,
            end_date = EXCLUDED.end_date,
            renewal_date = EXCLUDED.renewal_date,
            amount_cents = EXCLUDED.amount_cents,
            currency = EXCLUDED.currency,
            payment_method = EXCLUDED.payment_method,
            transaction_id = EXCLUDED.transaction_id,
            updated_at = NOW()
        RETURNING *
        "#,
    )
    .bind(user_id)
    .bind(plan)
    .bind(now)
    .bind(end_date)
    .bind(amount_cents)
    .bind(payment_id)
    .fetch_one(&mut *tx)
    .await?;

    sqlx::query(
        r#"
        INSERT INTO billing_entries (subscription_id, amount_cents, status, transaction_id, description)
        VALUES ($1, $2, 'success', $3, $4)
        "#,
    )
    .bind(subscription.id)
    .bind(amount_cents)
    .bind(payment_id)
    .bind(format!("Subscription to {} plan", plan.display_name()))
    .execute(&mut *tx)
    .await?;

    sync_user(&mut tx, &subscription).await?;
    tx.commit().await?;

    Ok(subscription)
}

fn one_month_after(start: DateTime<Utc>) -> DateTime<Utc> {
    start
        .checked_add_months(Months::new(1))
        .unwrap_or(start + chrono::Duration::days(30))
}

/// Churn percentage rounded to two decimals; zero without a baseline.
pub fn churn_rate(cancelled_recently: i64, baseline: i64) -> f64 {
    if baseline <= 0 {
        return 0.0;
    }
    let rate = cancelled_recently as f64 / baseline as f64 * 100.0;
    (rate * 100.0).round() / 100.0
}

/// Sum of active subscription amounts, optionally limited by creation date.
pub async fn monthly_recurring_revenue(
    pool: &DbPool,
    filters: &RevenueFilters,
) -> Result<(i64, i64), AppError> {
    let mut query = QueryBuilder::<Postgres>::new(
        "SELECT COALESCE(SUM(amount_cents), 0)::BIGINT, COUNT(*) FROM subscriptions WHERE status = 'active'",
    );
    if let Some(start) = filters.start_date {
        query.push(" AND created_at >= ").push_bind(start);
    }
    if let Some(end) = filters.end_date {
        query.push(" AND created_at <= ").push_bind(end);
    }
    let (mrr, active): (i64, i64) = query.build_query_as().fetch_one(pool).await?;
    Ok((mrr, active))
}

pub async fn plan_breakdown(pool: &DbPool) -> Result<Vec<PlanBreakdown>, AppError> {
    let rows = sqlx::query_as::<_, PlanBreakdown>(
        r#"
        SELECT plan::TEXT AS plan, COUNT(*) AS count,
               COALESCE(SUM(amount_cents), 0)::BIGINT AS revenue_cents
        FROM subscriptions
        WHERE status = 'active'
        GROUP BY plan
        ORDER BY plan
        "#,
    )
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

pub async fn revenue_analytics(
    pool: &DbPool,
    filters: &RevenueFilters,
) -> Result<RevenueAnalytics, AppError> {
    let (mrr_cents, active_subscriptions) = monthly_recurring_revenue(pool, filters).await?;

    let (baseline, cancelled): (i64, i64) = sqlx::query_as(
        r#"
        SELECT
            COUNT(*) FILTER (WHERE created_at <= NOW() - INTERVAL '30 days'),
            COUNT(*) FILTER (WHERE status = 'cancelled' AND updated_at >= NOW() - INTERVAL '30 days')
        FROM subscriptions
        "#,
    )
    .fetch_one(pool)
    .await?;

    let mut recent_transactions = sqlx::query_as::<_, RecentTransaction>(
        r#"
        SELECT DISTINCT ON (b.subscription_id)
               u.name AS user_name, u.email AS user_email, s.plan,
               b.amount_cents, b.occurred_at AS date, b.status
        FROM billing_entries b
        JOIN subscriptions s ON s.id = b.subscription_id
        LEFT JOIN users u ON u.id = s.user_id
        ORDER BY b.subscription_id, b.occurred_at DESC
        "#,
    )
    .fetch_all(pool)
    .await?;
    recent_transactions.sort_by(|a, b| b.date.cmp(&a.date));
    recent_transactions.truncate(10);

    Ok(RevenueAnalytics {
        mrr_cents,
        arr_cents: mrr_cents * 12,
        churn_rate: churn_rate(cancelled, baseline),
        active_subscriptions,
        plan_breakdown: plan_breakdown(pool).await?,
        recent_transactions,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn churn_rate_rounds_to_two_decimals() {
        assert_eq!(churn_rate(1, 3), 33.33);
        assert_eq!(churn_rate(2, 8), 25.0);
        assert_eq!(churn_rate(5, 0), 0.0);
        assert_eq!(churn_rate(0, 10), 0.0);
    }

    #[test]
    fn month_end_is_clamped() {
        let start = Utc.with_ymd_and_hms(2025, 1, 31, 12, 0, 0).unwrap();
        let end = one_month_after(start);
        assert_eq!(end, Utc.with_ymd_and_hms(2025, 2, 28, 12, 0, 0).unwrap());
    }
}

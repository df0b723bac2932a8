//! Aggregates behind the founder dashboard, the admin dashboard and the
//! admin system-health page.

use std::time::Instant;

use uuid::Uuid;

use crate::{
    db::DbPool,
    error::AppError,
    models::{
        dashboard::{
            AdminDashboard, DailyCount, DatabaseHealth, FounderStats, Overview, Revenue,
            SystemHealth, TableEstimate, UserTypeCount,
        },
        subscription::RevenueFilters,
        user::RecentSignup,
    },
    services::{activity_service, investor_service::GRANT_TAG, subscription_service},
};

/// Founder dashboard counters.
///
/// Matches are active investors that are not grant programmes; "active
/// investors" are distinct investors the founder has emailed. Profile views
/// are not recorded anywhere and stay at zero.
pub async fn founder_stats(pool: &DbPool, user_id: Uuid) -> Result<FounderStats, AppError> {
    let (potential_matches, grants_available): (i64, i64) = sqlx::query_as(
        r#"
        SELECT
            COUNT(*) FILTER (WHERE NOT ($1 = ANY(tags))),
            COUNT(*) FILTER (WHERE $1 = ANY(tags))
        FROM investors
        WHERE is_active
        "#,
    )
    .bind(GRANT_TAG)
    .fetch_one(pool)
    .await?;

    let (active_investors, emails_sent): (i64, i64) = sqlx::query_as(
        r#"
        SELECT COUNT(DISTINCT investor_id), COUNT(*)
        FROM email_logs
        WHERE user_id = $1
        "#,
    )
    .bind(user_id)
    .fetch_one(pool)
    .await?;

    Ok(FounderStats {
        potential_matches,
        grants_available,
        active_investors,
        profile_views: 0,
        emails_sent,
    })
}

pub async fn admin_dashboard(pool: &DbPool) -> Result<AdminDashboard, AppError> {
    let overview = sqlx::query_as::<_, Overview>(
        r#"
        SELECT
            (SELECT COUNT(*) FROM users) AS total_users,
            (SELECT COUNT(*) FROM users WHERE account_status = 'active') AS active_users,
            (SELECT COUNT(*) FROM subscriptions) AS total_subscriptions,
            (SELECT COUNT(*) FROM subscriptions WHERE status = 'active') AS active_subscriptions,
            (SELECT COUNT(*) FROM investors) AS total_investors,
            (SELECT COUNT(*) FROM investors WHERE is_verified) AS verified_investors,
            (SELECT COUNT(*) FROM users WHERE signup_date >= NOW() - INTERVAL '30 days') AS recent_signups
        "#,
    )
    .fetch_one(pool)
    .await?;

    let (mrr_cents, _) =
        subscription_service::monthly_recurring_revenue(pool, &RevenueFilters::default()).await?;

    let user_type_breakdown = sqlx::query_as::<_, UserTypeCount>(
        r#"
        SELECT user_type::TEXT AS user_type, COUNT(*) AS count
        FROM users
        GROUP BY user_type
        ORDER BY user_type
        "#,
    )
    .fetch_all(pool)
    .await?;

    let signup_trend = sqlx::query_as::<_, DailyCount>(
        r#"
        SELECT to_char(date_trunc('day', signup_date), 'YYYY-MM-DD') AS date, COUNT(*) AS count
        FROM users
        WHERE signup_date >= NOW() - INTERVAL '7 days'
        GROUP BY 1
        ORDER BY 1
        "#,
    )
    .fetch_all(pool)
    .await?;

    let recent_signups = sqlx::query_as::<_, RecentSignup>(
        r#"
        SELECT id, name, email, user_type, account_status, signup_date
        FROM users
        ORDER BY signup_date DESC
        LIMIT 5
        "#,
    )
    .fetch_all(pool)
    .await?;

    Ok(AdminDashboard {
        overview,
        revenue: Revenue {
            mrr_cents,
            arr_cents: mrr_cents * 12,
        },
        subscription_breakdown: subscription_service::plan_breakdown(pool).await?,
        user_type_breakdown,
        signup_trend,
        recent_signups,
        recent_activities: activity_service::recent(pool, 10).await?,
    })
}

/// Database reachability, planner row estimates per table, and process uptime.
///
/// An unreachable database is reported in the body rather than as an error.
pub async fn system_health(pool: &DbPool, started_at: Instant) -> SystemHealth {
    let tables = sqlx::query_as::<_, TableEstimate>(
        r#"
        SELECT relname::TEXT AS "table", n_live_tup AS "rows"
        FROM pg_stat_user_tables
        WHERE relname NOT LIKE '\_sqlx%'
        ORDER BY relname
        "#,
    )
    .fetch_all(pool)
    .await;

    let database = match tables {
        Ok(tables) => DatabaseHealth {
            status: "connected",
            tables,
        },
        Err(err) => {
            tracing::warn!(error = %err, "health check query failed");
            DatabaseHealth {
                status: "disconnected",
                tables: Vec::new(),
            }
        }
    };

    SystemHealth {
        database,
        uptime_seconds: started_at.elapsed().as_secs(),
        version: env!("CARGO_PKG_VERSION"),
    }
}

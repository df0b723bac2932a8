//! User queries for the founder profile and the admin user pages.

use sqlx::{Postgres, QueryBuilder};
use uuid::Uuid;

use crate::{
    db::DbPool,
    error::AppError,
    models::{
        query::{Page, PageParams, like_pattern},
        subscription::Subscription,
        user::{AccountStatus, User, UserDetails, UserFilters, UserResponse},
    },
    services::auth_service,
};

pub async fn find(pool: &DbPool, id: Uuid) -> Result<User, AppError> {
    sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or(AppError::NotFound("User"))
}

fn push_filters(builder: &mut QueryBuilder<'_, Postgres>, filters: &UserFilters) {
    builder.push(" WHERE TRUE");
    if let Some(search) = &filters.search {
        let pattern = like_pattern(search);
        builder
            .push(" AND (name ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR email ILIKE ")
            .push_bind(pattern)
            .push(")");
    }
    if let Some(plan) = filters.subscription_plan {
        builder.push(" AND subscription_plan = ").push_bind(plan);
    }
    if let Some(status) = filters.subscription_status {
        builder.push(" AND subscription_status = ").push_bind(status);
    }
    if let Some(status) = filters.account_status {
        builder.push(" AND account_status = ").push_bind(status);
    }
    if let Some(user_type) = filters.user_type {
        builder.push(" AND user_type = ").push_bind(user_type);
    }
    if let Some(start) = filters.start_date {
        builder.push(" AND signup_date >= ").push_bind(start);
    }
    if let Some(end) = filters.end_date {
        builder.push(" AND signup_date <= ").push_bind(end);
    }
}

/// Paginated user listing, newest signups first.
pub async fn list(pool: &DbPool, filters: &UserFilters) -> Result<Page<UserResponse>, AppError> {
    let params = PageParams::new(filters.page, filters.limit);

    let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM users");
    push_filters(&mut count, filters);
    let total: i64 = count.build_query_scalar().fetch_one(pool).await?;

    let mut query = QueryBuilder::<Postgres>::new("SELECT * FROM users");
    push_filters(&mut query, filters);
    query
        .push(" ORDER BY signup_date DESC LIMIT ")
        .push_bind(params.limit)
        .push(" OFFSET ")
        .push_bind(params.offset());
    let users = query.build_query_as::<User>().fetch_all(pool).await?;

    Ok(Page::new(
        users.into_iter().map(UserResponse::from).collect(),
        params,
        total,
    ))
}

/// Every user matching the filters, for export.
pub async fn list_all(pool: &DbPool, filters: &UserFilters) -> Result<Vec<User>, AppError> {
    let mut query = QueryBuilder::<Postgres>::new("SELECT * FROM users");
    push_filters(&mut query, filters);
    query.push(" ORDER BY signup_date DESC");
    Ok(query.build_query_as::<User>().fetch_all(pool).await?)
}

pub async fn details(pool: &DbPool, id: Uuid) -> Result<UserDetails, AppError> {
    let user = find(pool, id).await?;
    let subscription =
        sqlx::query_as::<_, Subscription>("SELECT * FROM subscriptions WHERE user_id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await?;

    Ok(UserDetails {
        user: user.into(),
        subscription,
    })
}

/// Change a user's account status. Leaving `active` ends all their sessions.
pub async fn set_account_status(
    pool: &DbPool,
    id: Uuid,
    status: AccountStatus,
) -> Result<UserResponse, AppError> {
    let user = sqlx::query_as::<_, User>(
        "UPDATE users SET account_status = $2, updated_at = NOW() WHERE id = $1 RETURNING *",
    )
    .bind(id)
    .bind(status)
    .fetch_optional(pool)
    .await?
    .ok_or(AppError::NotFound("User"))?;

    if status != AccountStatus::Active {
        let revoked = auth_service::revoke_user_sessions(pool, id).await?;
        tracing::info!(user_id = %id, status = status.as_str(), revoked, "account deactivated");
    }

    Ok(user.into())
}

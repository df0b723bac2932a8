//! Admin activity persistence and queries.

use sqlx::{Postgres, QueryBuilder};

use crate::{
    db::DbPool,
    error::AppError,
    models::{
        admin_activity::{ActivityFilters, AdminActivity, NewActivity},
        query::{Page, PageParams},
    },
};

const SELECT_ACTIVITY: &str = r#"
    SELECT a.id, a.admin_id, u.name AS admin_name, u.email AS admin_email,
           a.action, a.target_type, a.target_id, a.metadata, a.ip_address,
           a.user_agent, a.status, a.error_message, a.occurred_at
    FROM admin_activities a
    LEFT JOIN users u ON u.id = a.admin_id
"#;

pub async fn record(pool: &DbPool, activity: &NewActivity) -> Result<(), AppError> {
    sqlx::query(
        r#"
        INSERT INTO admin_activities
            (admin_id, action, target_type, target_id, metadata, ip_address, user_agent, status)
        VALUES ($1, $2, $3, $4, $5, $6, $7, 'success')
        "#,
    )
    .bind(activity.admin_id)
    .bind(activity.action)
    .bind(activity.target_type)
    .bind(activity.target_id)
    .bind(&activity.metadata)
    .bind(&activity.ip_address)
    .bind(&activity.user_agent)
    .execute(pool)
    .await?;
    Ok(())
}

fn push_filters(builder: &mut QueryBuilder<'_, Postgres>, filters: &ActivityFilters) {
    builder.push(" WHERE TRUE");
    if let Some(action) = &filters.action {
        builder.push(" AND a.action = ").push_bind(action.clone());
    }
    if let Some(target_type) = filters.target_type {
        builder.push(" AND a.target_type = ").push_bind(target_type);
    }
    if let Some(admin_id) = filters.admin_id {
        builder.push(" AND a.admin_id = ").push_bind(admin_id);
    }
}

/// Paginated activity log, newest first.
pub async fn list(pool: &DbPool, filters: &ActivityFilters) -> Result<Page<AdminActivity>, AppError> {
    let params = PageParams::new(filters.page, filters.limit);

    let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM admin_activities a");
    push_filters(&mut count, filters);
    let total: i64 = count.build_query_scalar().fetch_one(pool).await?;

    let mut query = QueryBuilder::<Postgres>::new(SELECT_ACTIVITY);
    push_filters(&mut query, filters);
    query
        .push(" ORDER BY a.occurred_at DESC LIMIT ")
        .push_bind(params.limit)
        .push(" OFFSET ")
        .push_bind(params.offset());
    let data = query.build_query_as::<AdminActivity>().fetch_all(pool).await?;

    Ok(Page::new(data, params, total))
}

pub async fn recent(pool: &DbPool, limit: i64) -> Result<Vec<AdminActivity>, AppError> {
    let sql = format!("{SELECT_ACTIVITY} ORDER BY a.occurred_at DESC LIMIT $1");
    let rows = sqlx::query_as::<_, AdminActivity>(&sql)
        .bind(limit)
        .fetch_all(pool)
        .await?;
    Ok(rows)
}

use sqlx::types::Json;
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::application::{
    ApplicationRow, ApplicationStatus, DocumentMeta, DocumentSet, NewApplication,
};

/// Looks for an application with the same email and phone submitted on
/// the current calendar day. The duplicate key is (email, phone, date):
/// the same pair may resubmit on a later day. Known limitation: two
/// concurrent submissions can both pass this check before either inserts.
pub async fn find_same_day_submission(
    pool: &PgPool,
    email: &str,
    phone: &str,
) -> Result<Option<Uuid>, sqlx::Error> {
    sqlx::query_scalar(
        r#"
        SELECT id FROM applications
        WHERE personal_info->>'email' = $1
          AND personal_info->>'phone' = $2
          AND created_at::date = CURRENT_DATE
        LIMIT 1
        "#,
    )
    .bind(email)
    .bind(phone)
    .fetch_optional(pool)
    .await
}

pub async fn insert_application(
    pool: &PgPool,
    application: &NewApplication,
) -> Result<Uuid, sqlx::Error> {
    let id: Uuid = sqlx::query_scalar(
        r#"
        INSERT INTO applications
            (id, role, location, personal_info, employment_status,
             employment_history, documents, status)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        RETURNING id
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(&application.role)
    .bind(&application.location)
    .bind(Json(&application.personal_info))
    .bind(&application.employment_status)
    .bind(application.employment_history.as_ref().map(Json))
    .bind(Json(&application.documents))
    .bind(ApplicationStatus::Pending.as_str())
    .fetch_one(pool)
    .await?;

    Ok(id)
}

/// Builds the listing SQL for the given filter combination. The search
/// placeholder is reused across the three ILIKE arms.
fn list_sql(has_search: bool, has_status: bool) -> String {
    let mut sql = String::from("SELECT * FROM applications");
    let mut conditions: Vec<String> = Vec::new();

    if has_search {
        conditions.push(
            "(personal_info->>'fullName' ILIKE $1 \
             OR personal_info->>'email' ILIKE $1 \
             OR role ILIKE $1)"
                .to_string(),
        );
    }
    if has_status {
        let n = conditions.len() + 1;
        conditions.push(format!("status = ${n}"));
    }

    if !conditions.is_empty() {
        sql.push_str(" WHERE ");
        sql.push_str(&conditions.join(" AND "));
    }
    sql
}

/// Lists applications, optionally narrowed by a case-insensitive
/// substring over fullName/email/role and an exact status. Both filters
/// AND-combine. No pagination, storage order.
pub async fn list_applications(
    pool: &PgPool,
    search: Option<&str>,
    status: Option<&str>,
) -> Result<Vec<ApplicationRow>, sqlx::Error> {
    let sql = list_sql(search.is_some(), status.is_some());
    let mut query = sqlx::query_as::<_, ApplicationRow>(&sql);
    if let Some(term) = search {
        query = query.bind(format!("%{term}%"));
    }
    if let Some(status) = status {
        query = query.bind(status.to_string());
    }
    query.fetch_all(pool).await
}

pub async fn get_application(
    pool: &PgPool,
    id: Uuid,
) -> Result<Option<ApplicationRow>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM applications WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
}

/// Unconditional status overwrite; `None` means the id is unknown.
pub async fn update_status(
    pool: &PgPool,
    id: Uuid,
    status: ApplicationStatus,
) -> Result<Option<ApplicationRow>, sqlx::Error> {
    sqlx::query_as("UPDATE applications SET status = $1 WHERE id = $2 RETURNING *")
        .bind(status.as_str())
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub async fn set_offer_letter(
    pool: &PgPool,
    id: Uuid,
    letter: &DocumentMeta,
) -> Result<Option<ApplicationRow>, sqlx::Error> {
    sqlx::query_as("UPDATE applications SET offer_letter = $1 WHERE id = $2 RETURNING *")
        .bind(Json(letter))
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub async fn clear_offer_letter(pool: &PgPool, id: Uuid) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE applications SET offer_letter = NULL WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(())
}

/// Every stored-file path currently referenced by any row, documents and
/// offer letters alike. Feeds the bulk-clear file sweep.
pub async fn collect_stored_paths(pool: &PgPool) -> Result<Vec<String>, sqlx::Error> {
    let rows: Vec<(Json<DocumentSet>, Option<Json<DocumentMeta>>)> =
        sqlx::query_as("SELECT documents, offer_letter FROM applications")
            .fetch_all(pool)
            .await?;

    let mut paths = Vec::new();
    for (documents, offer_letter) in rows {
        paths.extend(documents.iter().map(|d| d.stored_path.clone()));
        if let Some(letter) = offer_letter {
            paths.push(letter.stored_path.clone());
        }
    }
    Ok(paths)
}

pub async fn delete_all(pool: &PgPool) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM applications").execute(pool).await?;
    Ok(result.rows_affected())
}

use sqlx::{PgPool, Postgres, Transaction};

#[derive(Clone)]
pub struct SqlxUserRepo {
    pub pool: PgPool,
}

#[derive(Clone)]
pub struct SqlxCategoryRepo {
    pub pool: PgPool,
}

#[derive(Clone)]
pub struct SqlxProjectRepo {
    pub pool: PgPool,
}

#[derive(Clone)]
pub struct SqlxVideoRepo {
    pub pool: PgPool,
}

#[derive(Clone)]
pub struct SqlxDashboardRepo {
    pub pool: PgPool,
}

/// Escapes `%`, `_` and `\` so a search term matches literally under `ILIKE`.
pub fn like_pattern(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len() + 2);
    escaped.push('%');
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}

/// Maps a unique-constraint violation to a Conflict carrying `message`.
pub fn conflict_on_unique(err: sqlx::Error, message: &str) -> crate::errors::AppError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.is_unique_violation() {
            return crate::errors::AppError::Conflict(message.to_string());
        }
    }
    crate::errors::AppError::from(err)
}

/// Read-only transaction whose statements all share one snapshot.
pub async fn read_snapshot(pool: &PgPool) -> Result<Transaction<'static, Postgres>, sqlx::Error> {
    let mut tx = pool.begin().await?;
    sqlx::query("SET TRANSACTION ISOLATION LEVEL REPEATABLE READ, READ ONLY")
        .execute(&mut *tx)
        .await?;
    Ok(tx)
}

/// Recomputes `project_count` from live join rows for the given categories.
///
/// The rows are locked in a statement of their own so the recount runs on a
/// snapshot taken after any competing writer has committed. `NO KEY UPDATE`
/// does not conflict with the key-share locks that join-row inserts hold.
pub async fn recount_categories(
    conn: &mut sqlx::PgConnection,
    category_ids: &[uuid::Uuid],
) -> Result<(), sqlx::Error> {
    if category_ids.is_empty() {
        return Ok(());
    }
    let mut ids = category_ids.to_vec();
    ids.sort();
    ids.dedup();

    sqlx::query("SELECT id FROM categories WHERE id = ANY($1) ORDER BY id FOR NO KEY UPDATE")
        .bind(&ids)
        .execute(&mut *conn)
        .await?;

    sqlx::query(
        r#"
        UPDATE categories c
        SET project_count = (
                SELECT COUNT(*) FROM project_categories pc WHERE pc.category_id = c.id
            ),
            updated_at = NOW()
        WHERE c.id = ANY($1)
        "#,
    )
    .bind(&ids)
    .execute(&mut *conn)
    .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::like_pattern;

    #[test]
    fn like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern("defi"), "%defi%");
        assert_eq!(like_pattern("100%_"), "%100\\%\\_%");
    }
}

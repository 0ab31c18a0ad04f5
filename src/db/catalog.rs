use sqlx::PgPool;

use crate::{
    error::Error,
    model::{Category, Language},
};

use super::{books::escape_like, error::DatabaseError};

#[tracing::instrument(name = "get categories", skip_all)]
pub async fn get_categories(pool: &PgPool) -> Result<Vec<Category>, Error> {
    let categories = sqlx::query_as::<_, Category>(
        r#"
        SELECT
            id, category_name
        FROM
            categories
        ORDER BY category_name
    "#,
    )
    .fetch_all(pool)
    .await
    .map_err(DatabaseError::DatabaseError)?;

    Ok(categories)
}

#[tracing::instrument(name = "get category by id", skip(pool))]
pub async fn get_category_by_id(pool: &PgPool, category_id: i64) -> Result<Category, Error> {
    sqlx::query_as::<_, Category>(
        r#"
        SELECT
            id, category_name
        FROM
            categories
        WHERE
            id = $1
    "#,
    )
    .bind(category_id)
    .fetch_optional(pool)
    .await
    .map_err(DatabaseError::DatabaseError)?
    .ok_or(Error::Database(DatabaseError::NotFound))
}

#[tracing::instrument(name = "get languages", skip_all)]
pub async fn get_languages(pool: &PgPool) -> Result<Vec<Language>, Error> {
    let languages = sqlx::query_as::<_, Language>(
        r#"
        SELECT
            id, language
        FROM
            languages
        ORDER BY language
    "#,
    )
    .fetch_all(pool)
    .await
    .map_err(DatabaseError::DatabaseError)?;

    Ok(languages)
}

/// Author names containing `part`, ignoring case, in creation order.
#[tracing::instrument(name = "get authors list", skip(pool))]
pub async fn get_authors_list(pool: &PgPool, part: &str) -> Result<Vec<String>, Error> {
    let pattern = format!("%{}%", escape_like(part));

    let authors = sqlx::query_scalar::<_, String>(
        r#"
        SELECT
            author_name
        FROM
            authors
        WHERE
            author_name ILIKE $1
        ORDER BY id
        LIMIT 10
    "#,
    )
    .bind(pattern)
    .fetch_all(pool)
    .await
    .map_err(DatabaseError::DatabaseError)?;

    Ok(authors)
}

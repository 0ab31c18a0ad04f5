use futures::TryStreamExt;
use sqlx::PgPool;

use crate::{error::Error, model::Comment};

use super::error::DatabaseError;

/// Stores the user's rating of a book, replacing any previous one, and
/// returns the new mean rating of the book.
#[tracing::instrument(name = "upsert rating", skip(pool))]
pub async fn upsert_rating(
    pool: &PgPool,
    user_id: i64,
    book_id: i64,
    rating: i16,
) -> Result<f64, Error> {
    let mut tx = pool.begin().await.map_err(DatabaseError::DatabaseError)?;

    sqlx::query(
        r#"
        INSERT INTO book_ratings
            (user_id, book_id, rating)
        VALUES
            ($1, $2, $3)
        ON CONFLICT (user_id, book_id)
        DO UPDATE SET rating = EXCLUDED.rating
    "#,
    )
    .bind(user_id)
    .bind(book_id)
    .bind(rating)
    .execute(&mut *tx)
    .await
    .map_err(DatabaseError::DatabaseError)?;

    let average = sqlx::query_scalar::<_, f64>(
        r#"
        SELECT AVG(rating)::FLOAT8 FROM book_ratings WHERE book_id = $1
    "#,
    )
    .bind(book_id)
    .fetch_one(&mut *tx)
    .await
    .map_err(DatabaseError::DatabaseError)?;

    tx.commit().await.map_err(DatabaseError::DatabaseError)?;

    Ok(average)
}

/// Mean rating (if anyone rated) and the number of ratings.
pub async fn get_rating_stats(pool: &PgPool, book_id: i64) -> Result<(Option<f64>, i64), Error> {
    let stats = sqlx::query_as::<_, (Option<f64>, i64)>(
        r#"
        SELECT
            AVG(rating)::FLOAT8, COUNT(*)
        FROM
            book_ratings
        WHERE
            book_id = $1
    "#,
    )
    .bind(book_id)
    .fetch_one(pool)
    .await
    .map_err(DatabaseError::DatabaseError)?;

    Ok(stats)
}

#[tracing::instrument(name = "add comment", skip(pool, text))]
pub async fn add_comment(
    pool: &PgPool,
    user_id: i64,
    book_id: i64,
    text: &str,
) -> Result<Comment, Error> {
    let comment = sqlx::query_as::<_, Comment>(
        r#"
        WITH inserted AS (
            INSERT INTO book_comments
                (user_id, book_id, text)
            VALUES
                ($1, $2, $3)
            RETURNING id, user_id, text, posted_date
        )
        SELECT
            inserted.id, users.username AS user, inserted.text, inserted.posted_date
        FROM
            inserted
        INNER JOIN users ON users.id = inserted.user_id
    "#,
    )
    .bind(user_id)
    .bind(book_id)
    .bind(text)
    .fetch_one(pool)
    .await
    .map_err(DatabaseError::DatabaseError)?;

    Ok(comment)
}

/// Comments of a book, newest first.
#[tracing::instrument(name = "get comments", skip(pool))]
pub async fn get_comments(pool: &PgPool, book_id: i64) -> Result<Vec<Comment>, Error> {
    let mut rows = sqlx::query_as::<_, Comment>(
        r#"
        SELECT
            book_comments.id, users.username AS user,
            book_comments.text, book_comments.posted_date
        FROM
            book_comments
        INNER JOIN users ON users.id = book_comments.user_id
        WHERE
            book_comments.book_id = $1
        ORDER BY book_comments.id DESC
    "#,
    )
    .bind(book_id)
    .fetch(pool);

    let mut comments = Vec::new();
    while let Some(comment) = rows.try_next().await.map_err(DatabaseError::DatabaseError)? {
        comments.push(comment);
    }

    Ok(comments)
}

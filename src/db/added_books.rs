use sqlx::PgPool;

use crate::{
    error::Error,
    library::recommend::AddedBookRef,
    model::{AddedBook, ReadingPosition},
};

use super::error::DatabaseError;

#[tracing::instrument(name = "get user added books", skip(pool))]
pub async fn get_user_added_books(pool: &PgPool, user_id: i64) -> Result<Vec<AddedBook>, Error> {
    let books = sqlx::query_as::<_, AddedBook>(
        r#"
        SELECT
            books.id AS book_id, books.category_id, books.book_name,
            authors.author_name, books.cover_url,
            books.uploader_id, books.private_book,
            added_books.last_page, added_books.last_read
        FROM
            added_books
        INNER JOIN books ON books.id = added_books.book_id
        INNER JOIN authors ON authors.id = books.author_id
        WHERE
            added_books.user_id = $1
        ORDER BY added_books.last_read DESC, added_books.id DESC
    "#,
    )
    .bind(user_id)
    .fetch_all(pool)
    .await
    .map_err(DatabaseError::DatabaseError)?;

    Ok(books)
}

impl From<&AddedBook> for AddedBookRef {
    fn from(added: &AddedBook) -> Self {
        AddedBookRef {
            book_id: added.book_id,
            category_id: added.category_id,
        }
    }
}

/// Puts a book on the user's reading list. A second add of the same book is a
/// conflict, enforced by the `(user_id, book_id)` unique constraint.
#[tracing::instrument(name = "add book to home", skip(pool))]
pub async fn add_book_to_home(pool: &PgPool, user_id: i64, book_id: i64) -> Result<(), Error> {
    let inserted = sqlx::query_scalar::<_, i64>(
        r#"
        INSERT INTO added_books
            (user_id, book_id)
        VALUES
            ($1, $2)
        ON CONFLICT (user_id, book_id) DO NOTHING
        RETURNING id
    "#,
    )
    .bind(user_id)
    .bind(book_id)
    .fetch_optional(pool)
    .await
    .map_err(DatabaseError::DatabaseError)?;

    match inserted {
        Some(_) => {
            tracing::info!(user_id, book_id, "Book added to reading list");
            Ok(())
        }
        None => Err(Error::Database(DatabaseError::Conflict(
            "Book is already added".to_string(),
        ))),
    }
}

#[tracing::instrument(name = "remove book from home", skip(pool))]
pub async fn remove_book_from_home(pool: &PgPool, user_id: i64, book_id: i64) -> Result<(), Error> {
    let result = sqlx::query(
        r#"
        DELETE FROM added_books
        WHERE
            user_id = $1 AND book_id = $2
    "#,
    )
    .bind(user_id)
    .bind(book_id)
    .execute(pool)
    .await
    .map_err(DatabaseError::DatabaseError)?;

    if result.rows_affected() == 0 {
        return Err(Error::Database(DatabaseError::NotFound));
    }

    Ok(())
}

/// Marks the book as just read and returns where the user stopped.
#[tracing::instrument(name = "open book", skip(pool))]
pub async fn open_book(pool: &PgPool, user_id: i64, book_id: i64) -> Result<ReadingPosition, Error> {
    sqlx::query_as::<_, ReadingPosition>(
        r#"
        UPDATE added_books
        SET
            last_read = NOW()
        WHERE
            user_id = $1 AND book_id = $2
        RETURNING last_page, last_read
    "#,
    )
    .bind(user_id)
    .bind(book_id)
    .fetch_optional(pool)
    .await
    .map_err(DatabaseError::DatabaseError)?
    .ok_or(Error::Database(DatabaseError::NotFound))
}

#[tracing::instrument(name = "set current page", skip(pool))]
pub async fn set_current_page(
    pool: &PgPool,
    user_id: i64,
    book_id: i64,
    page: i32,
) -> Result<ReadingPosition, Error> {
    sqlx::query_as::<_, ReadingPosition>(
        r#"
        UPDATE added_books
        SET
            last_page = $3,
            last_read = NOW()
        WHERE
            user_id = $1 AND book_id = $2
        RETURNING last_page, last_read
    "#,
    )
    .bind(user_id)
    .bind(book_id)
    .bind(page)
    .fetch_optional(pool)
    .await
    .map_err(DatabaseError::DatabaseError)?
    .ok_or(Error::Database(DatabaseError::NotFound))
}

/// Number of reading lists the book is in.
pub async fn count_added(pool: &PgPool, book_id: i64) -> Result<i64, Error> {
    let count = sqlx::query_scalar::<_, i64>(
        r#"
        SELECT COUNT(*) FROM added_books WHERE book_id = $1
    "#,
    )
    .bind(book_id)
    .fetch_one(pool)
    .await
    .map_err(DatabaseError::DatabaseError)?;

    Ok(count)
}

pub async fn is_added(pool: &PgPool, user_id: i64, book_id: i64) -> Result<bool, Error> {
    let exists = sqlx::query_scalar::<_, bool>(
        r#"
        SELECT EXISTS (
            SELECT 1 FROM added_books WHERE user_id = $1 AND book_id = $2
        )
    "#,
    )
    .bind(user_id)
    .bind(book_id)
    .fetch_one(pool)
    .await
    .map_err(DatabaseError::DatabaseError)?;

    Ok(exists)
}

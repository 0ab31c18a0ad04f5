use std::collections::HashSet;

use sqlx::{PgPool, Postgres, QueryBuilder};

use crate::{
    error::Error,
    library::{
        recommend::BookPool,
        visibility::{ExcludePrivate, Viewer},
    },
    model::{BookDetail, CatalogBook},
};

use super::{PostgresTransaction, error::DatabaseError};

const CATALOG_SELECT: &str = r#"
    SELECT
        books.id, books.book_name, authors.author_name,
        books.category_id, books.cover_url, books.uploader_id,
        books.private_book, books.blocked_book,
        ratings.rating, COALESCE(readers.read_count, 0) AS read_count
    FROM
        books
    INNER JOIN
        authors ON authors.id = books.author_id
    LEFT JOIN (
        SELECT book_id, AVG(rating)::FLOAT8 AS rating
        FROM book_ratings
        GROUP BY book_id
    ) ratings ON ratings.book_id = books.id
    LEFT JOIN (
        SELECT book_id, COUNT(*) AS read_count
        FROM added_books
        GROUP BY book_id
    ) readers ON readers.book_id = books.id
    WHERE TRUE
"#;

/// Same rows without the rating and reader aggregates, for callers that only
/// pick among books.
const CANDIDATE_SELECT: &str = r#"
    SELECT
        books.id, books.book_name, authors.author_name,
        books.category_id, books.cover_url, books.uploader_id,
        books.private_book, books.blocked_book,
        NULL::FLOAT8 AS rating, 0::INT8 AS read_count
    FROM
        books
    INNER JOIN
        authors ON authors.id = books.author_id
    WHERE TRUE
"#;

/// Deferred catalog query. Filters accumulate and nothing touches the
/// database until [`BookQuery::fetch_all`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BookQuery {
    category_id: Option<i64>,
    uploader_id: Option<i64>,
    search: Option<String>,
    excluded_ids: Vec<i64>,
    visible_to: Option<Viewer>,
    newest_first: bool,
    without_stats: bool,
}

impl BookQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn category(mut self, category_id: i64) -> Self {
        self.category_id = Some(category_id);
        self
    }

    pub fn uploaded_by(mut self, user_id: i64) -> Self {
        self.uploader_id = Some(user_id);
        self
    }

    /// Case-insensitive substring match on book or author name.
    pub fn search(mut self, term: &str) -> Self {
        self.search = Some(term.to_string());
        self
    }

    pub fn exclude_ids<I: IntoIterator<Item = i64>>(mut self, ids: I) -> Self {
        self.excluded_ids.extend(ids);
        self.excluded_ids.sort_unstable();
        self.excluded_ids.dedup();
        self
    }

    pub fn newest_first(mut self) -> Self {
        self.newest_first = true;
        self
    }

    /// Skips the rating and reader aggregates; `rating` comes back `None`
    /// and `read_count` zero.
    pub fn without_stats(mut self) -> Self {
        self.without_stats = true;
        self
    }

    pub fn build(&self) -> QueryBuilder<'static, Postgres> {
        let select = if self.without_stats {
            CANDIDATE_SELECT
        } else {
            CATALOG_SELECT
        };
        let mut builder: QueryBuilder<Postgres> = QueryBuilder::new(select);

        if let Some(category_id) = self.category_id {
            builder.push(" AND books.category_id = ").push_bind(category_id);
        }

        if let Some(uploader_id) = self.uploader_id {
            builder.push(" AND books.uploader_id = ").push_bind(uploader_id);
        }

        if let Some(term) = &self.search {
            let pattern = format!("%{}%", escape_like(term));
            builder
                .push(" AND (books.book_name ILIKE ")
                .push_bind(pattern.clone())
                .push(" OR authors.author_name ILIKE ")
                .push_bind(pattern)
                .push(")");
        }

        if !self.excluded_ids.is_empty() {
            builder
                .push(" AND books.id <> ALL(")
                .push_bind(self.excluded_ids.clone())
                .push(")");
        }

        match self.visible_to {
            Some(Viewer::Anonymous) => {
                builder.push(" AND books.private_book = FALSE");
            }
            Some(Viewer::User(user_id)) => {
                builder
                    .push(" AND (books.private_book = FALSE OR books.uploader_id = ")
                    .push_bind(user_id)
                    .push(")");
            }
            None => {}
        }

        if self.newest_first {
            builder.push(" ORDER BY books.id DESC");
        } else {
            builder.push(" ORDER BY books.id");
        }

        builder
    }

    #[tracing::instrument(name = "fetch catalog books", skip_all)]
    pub async fn fetch_all(self, pool: &PgPool) -> Result<Vec<CatalogBook>, Error> {
        let mut builder = self.build();
        let books = builder
            .build_query_as::<CatalogBook>()
            .fetch_all(pool)
            .await
            .map_err(DatabaseError::DatabaseError)?;

        Ok(books)
    }
}

impl ExcludePrivate for BookQuery {
    fn exclude_private(mut self, viewer: &Viewer) -> Self {
        self.visible_to = Some(*viewer);
        self
    }
}

pub(super) fn escape_like(term: &str) -> String {
    term.replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

impl BookPool for PgPool {
    async fn category_pool(
        &self,
        viewer: &Viewer,
        category_id: i64,
        excluded: &HashSet<i64>,
    ) -> Result<Vec<CatalogBook>, Error> {
        BookQuery::new()
            .category(category_id)
            .exclude_ids(excluded.iter().copied())
            .exclude_private(viewer)
            .without_stats()
            .fetch_all(self)
            .await
    }

    async fn fallback_pool(
        &self,
        viewer: &Viewer,
        excluded: &HashSet<i64>,
    ) -> Result<Vec<CatalogBook>, Error> {
        BookQuery::new()
            .exclude_ids(excluded.iter().copied())
            .exclude_private(viewer)
            .without_stats()
            .fetch_all(self)
            .await
    }
}

#[tracing::instrument(name = "get book by id", skip(pool))]
pub async fn get_book_by_id(pool: &PgPool, book_id: i64) -> Result<BookDetail, Error> {
    sqlx::query_as::<_, BookDetail>(
        r#"
        SELECT
            books.id, books.book_name, authors.author_name,
            categories.category_name, languages.language,
            books.description, books.cover_url, books.book_file,
            books.uploader_id, users.username AS uploader,
            books.private_book, books.blocked_book, books.upload_date
        FROM
            books
        INNER JOIN authors ON authors.id = books.author_id
        INNER JOIN categories ON categories.id = books.category_id
        INNER JOIN languages ON languages.id = books.language_id
        INNER JOIN users ON users.id = books.uploader_id
        WHERE
            books.id = $1
    "#,
    )
    .bind(book_id)
    .fetch_optional(pool)
    .await
    .map_err(DatabaseError::DatabaseError)?
    .ok_or(Error::Database(DatabaseError::NotFound))
}

/// Metadata of a freshly uploaded book.
#[derive(Debug, Clone)]
pub struct NewBook {
    pub book_name: String,
    pub author: String,
    pub category: String,
    pub language: String,
    pub description: Option<String>,
    pub cover_url: Option<String>,
    pub book_file: String,
    pub private_book: bool,
}

/// Creates the book, get-or-creating its author and language, and puts it
/// on the uploader's reading list.
#[tracing::instrument(name = "insert book", skip(pool, book), fields(book_name = %book.book_name))]
pub async fn insert_book(pool: &PgPool, uploader_id: i64, book: &NewBook) -> Result<i64, Error> {
    let mut tx = pool.begin().await.map_err(DatabaseError::DatabaseError)?;

    let category_id = sqlx::query_scalar::<_, i64>(
        r#"
        SELECT id FROM categories WHERE category_name = $1
    "#,
    )
    .bind(&book.category)
    .fetch_optional(&mut *tx)
    .await
    .map_err(DatabaseError::DatabaseError)?
    .ok_or(Error::Database(DatabaseError::NotFound))?;

    let author_id = get_or_create_author(&mut tx, &book.author).await?;
    let language_id = get_or_create_language(&mut tx, &book.language).await?;

    let book_id = sqlx::query_scalar::<_, i64>(
        r#"
        INSERT INTO books
            (book_name, author_id, category_id, language_id, description,
             cover_url, book_file, uploader_id, private_book)
        VALUES
            ($1, $2, $3, $4, $5, $6, $7, $8, $9)
        RETURNING id
    "#,
    )
    .bind(&book.book_name)
    .bind(author_id)
    .bind(category_id)
    .bind(language_id)
    .bind(&book.description)
    .bind(&book.cover_url)
    .bind(&book.book_file)
    .bind(uploader_id)
    .bind(book.private_book)
    .fetch_one(&mut *tx)
    .await
    .map_err(DatabaseError::DatabaseError)?;

    sqlx::query(
        r#"
        INSERT INTO added_books (user_id, book_id) VALUES ($1, $2)
        ON CONFLICT (user_id, book_id) DO NOTHING
    "#,
    )
    .bind(uploader_id)
    .bind(book_id)
    .execute(&mut *tx)
    .await
    .map_err(DatabaseError::DatabaseError)?;

    tx.commit().await.map_err(DatabaseError::DatabaseError)?;

    tracing::info!(book_id, uploader_id, "Book uploaded");

    Ok(book_id)
}

pub async fn get_or_create_author(tx: &mut PostgresTransaction, name: &str) -> Result<i64, Error> {
    let id = sqlx::query_scalar::<_, i64>(
        r#"
        INSERT INTO authors (author_name) VALUES ($1)
        ON CONFLICT (author_name)
        DO UPDATE SET author_name = EXCLUDED.author_name
        RETURNING id
    "#,
    )
    .bind(name)
    .fetch_one(&mut **tx)
    .await
    .map_err(DatabaseError::DatabaseError)?;

    Ok(id)
}

pub async fn get_or_create_language(
    tx: &mut PostgresTransaction,
    language: &str,
) -> Result<i64, Error> {
    let id = sqlx::query_scalar::<_, i64>(
        r#"
        INSERT INTO languages (language) VALUES ($1)
        ON CONFLICT (language)
        DO UPDATE SET language = EXCLUDED.language
        RETURNING id
    "#,
    )
    .bind(language)
    .fetch_one(&mut **tx)
    .await
    .map_err(DatabaseError::DatabaseError)?;

    Ok(id)
}

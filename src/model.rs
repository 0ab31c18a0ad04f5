use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::library::visibility::Visible;

#[derive(sqlx::FromRow, serde::Serialize, serde::Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub auth_token: Uuid,
    pub subscription: bool,
}

#[derive(sqlx::FromRow, serde::Serialize, serde::Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Category {
    pub id: i64,
    pub category_name: String,
}

#[derive(sqlx::FromRow, serde::Serialize, serde::Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Language {
    pub id: i64,
    pub language: String,
}

/// A book row joined with everything the listing pipeline needs: author name,
/// mean rating and the number of reading lists it is in.
#[derive(sqlx::FromRow, Debug, Clone, PartialEq)]
pub struct CatalogBook {
    pub id: i64,
    pub book_name: String,
    pub author_name: String,
    pub category_id: i64,
    pub cover_url: Option<String>,
    pub uploader_id: i64,
    pub private_book: bool,
    pub blocked_book: bool,
    pub rating: Option<f64>,
    pub read_count: i64,
}

impl Visible for CatalogBook {
    fn is_private(&self) -> bool {
        self.private_book
    }

    fn uploader_id(&self) -> i64 {
        self.uploader_id
    }
}

/// Plain per-book record sent to clients by every listing endpoint.
#[derive(serde::Serialize, serde::Deserialize, Debug, Clone, PartialEq)]
pub struct BookSummary {
    pub id: i64,
    pub name: String,
    pub author: String,
    pub cover_url: String,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "::serde_with::rust::double_option"
    )]
    pub rating: Option<Option<f64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub read_count: Option<i64>,
}

impl BookSummary {
    pub fn from_book(book: &CatalogBook) -> Self {
        BookSummary {
            id: book.id,
            name: book.book_name.clone(),
            author: book.author_name.clone(),
            cover_url: book.cover_url.clone().unwrap_or_default(),
            rating: None,
            read_count: None,
        }
    }

    pub fn with_rating(mut self, rating: Option<f64>) -> Self {
        self.rating = Some(rating);
        self
    }

    pub fn with_read_count(mut self, read_count: i64) -> Self {
        self.read_count = Some(read_count);
        self
    }
}

#[derive(sqlx::FromRow, serde::Serialize, serde::Deserialize, Debug, Clone, PartialEq)]
pub struct BookDetail {
    pub id: i64,
    pub book_name: String,
    pub author_name: String,
    pub category_name: String,
    pub language: String,
    pub description: Option<String>,
    pub cover_url: Option<String>,
    pub book_file: String,
    pub uploader_id: i64,
    pub uploader: String,
    pub private_book: bool,
    pub blocked_book: bool,
    pub upload_date: DateTime<Utc>,
}

impl Visible for BookDetail {
    fn is_private(&self) -> bool {
        self.private_book
    }

    fn uploader_id(&self) -> i64 {
        self.uploader_id
    }
}

#[derive(sqlx::FromRow, serde::Serialize, serde::Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Comment {
    pub id: i64,
    pub user: String,
    pub text: String,
    pub posted_date: DateTime<Utc>,
}

#[derive(serde::Serialize, serde::Deserialize, Debug, Clone, PartialEq)]
pub struct SelectedBook {
    pub book: BookDetail,
    pub is_added_book: bool,
    pub user_reading_count: i64,
    pub book_rating: f64,
    pub book_rated_count: i64,
    pub comments: Vec<Comment>,
}

/// One entry of a user's reading list.
#[derive(sqlx::FromRow, Debug, Clone, PartialEq)]
pub struct AddedBook {
    pub book_id: i64,
    pub category_id: i64,
    pub book_name: String,
    pub author_name: String,
    pub cover_url: Option<String>,
    pub uploader_id: i64,
    pub private_book: bool,
    pub last_page: i32,
    pub last_read: DateTime<Utc>,
}

impl Visible for AddedBook {
    fn is_private(&self) -> bool {
        self.private_book
    }

    fn uploader_id(&self) -> i64 {
        self.uploader_id
    }
}

#[derive(sqlx::FromRow, serde::Serialize, serde::Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ReadingPosition {
    pub last_page: i32,
    pub last_read: DateTime<Utc>,
}

#[derive(serde::Serialize, serde::Deserialize, Debug, Clone, PartialEq)]
pub struct HomeBook {
    #[serde(flatten)]
    pub book: BookSummary,
    pub last_page: i32,
    pub last_read: DateTime<Utc>,
}

impl From<&AddedBook> for BookSummary {
    fn from(added: &AddedBook) -> Self {
        BookSummary {
            id: added.book_id,
            name: added.book_name.clone(),
            author: added.author_name.clone(),
            cover_url: added.cover_url.clone().unwrap_or_default(),
            rating: None,
            read_count: None,
        }
    }
}

impl From<&AddedBook> for HomeBook {
    fn from(added: &AddedBook) -> Self {
        HomeBook {
            book: BookSummary::from(added),
            last_page: added.last_page,
            last_read: added.last_read,
        }
    }
}

#[derive(serde::Serialize, serde::Deserialize, Debug, Clone, PartialEq)]
pub struct Home {
    pub books: Vec<HomeBook>,
    pub recommend_books: Vec<BookSummary>,
    pub reminder: Option<String>,
}

/// Public page of a user: their reading list as the viewer may see it.
#[derive(serde::Serialize, serde::Deserialize, Debug, Clone, PartialEq)]
pub struct Profile {
    pub id: i64,
    pub username: String,
    pub owner: bool,
    pub books: Vec<BookSummary>,
}

use std::cmp::Ordering;

use crate::model::{BookSummary, CatalogBook};

use super::visibility::{Viewer, exclude_private};

#[derive(serde::Deserialize, serde::Serialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum SortCriterion {
    #[default]
    BookName,
    Author,
    Estimation,
    MostReadable,
}

pub fn sort_books(
    viewer: &Viewer,
    books: Vec<CatalogBook>,
    criterion: SortCriterion,
) -> Vec<BookSummary> {
    match criterion {
        SortCriterion::BookName => by_name(viewer, books),
        SortCriterion::Author => by_author(viewer, books),
        SortCriterion::Estimation => by_estimation(viewer, books),
        SortCriterion::MostReadable => by_readable(viewer, books, None),
    }
}

pub fn by_name(viewer: &Viewer, books: Vec<CatalogBook>) -> Vec<BookSummary> {
    let mut books = exclude_private(viewer, books);
    books.sort_by(|a, b| a.book_name.cmp(&b.book_name));

    books.iter().map(BookSummary::from_book).collect()
}

pub fn by_author(viewer: &Viewer, books: Vec<CatalogBook>) -> Vec<BookSummary> {
    let mut books = exclude_private(viewer, books);
    books.sort_by(|a, b| a.author_name.cmp(&b.author_name));

    books.iter().map(BookSummary::from_book).collect()
}

/// Rated books first, highest mean rating first; unrated books keep store
/// order at the end.
pub fn by_estimation(viewer: &Viewer, books: Vec<CatalogBook>) -> Vec<BookSummary> {
    let mut books = exclude_private(viewer, books);
    books.sort_by(|a, b| compare_ratings(b.rating, a.rating));

    books
        .iter()
        .map(|book| BookSummary::from_book(book).with_rating(book.rating))
        .collect()
}

pub fn by_readable(
    viewer: &Viewer,
    books: Vec<CatalogBook>,
    limit: Option<usize>,
) -> Vec<BookSummary> {
    let mut books = exclude_private(viewer, books);
    books.sort_by(|a, b| b.read_count.cmp(&a.read_count));

    if let Some(limit) = limit {
        books.truncate(limit);
    }

    books
        .iter()
        .map(|book| BookSummary::from_book(book).with_read_count(book.read_count))
        .collect()
}

// Same ordering as comparing `(rating.is_some(), rating)` tuples.
fn compare_ratings(a: Option<f64>, b: Option<f64>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.total_cmp(&b),
        (Some(_), None) => Ordering::Greater,
        (None, Some(_)) => Ordering::Less,
        (None, None) => Ordering::Equal,
    }
}

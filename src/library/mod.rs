pub mod escape;
pub mod pagination;
pub mod recommend;
pub mod reminders;
pub mod sort;
pub mod visibility;

#[derive(Debug, thiserror::Error)]
pub enum LibraryError {
    #[error("Book {0} is blocked and cannot be added")]
    BlockedBook(i64),
    #[error("Unknown reminder: {0}")]
    UnknownReminder(String),
}

use sqlx::{Postgres, Transaction};

pub mod added_books;
pub mod books;
pub mod catalog;
pub mod error;
pub mod ratings;
pub mod user;

pub type PostgresTransaction = Transaction<'static, Postgres>;

use serde_aux::field_attributes::deserialize_option_number_from_string;
use validator::Validate;

use crate::{
    config::Library,
    library::{escape::Escape, sort::SortCriterion},
};

pub mod auth;
pub mod books;
pub mod catalog;
pub mod home;
pub mod me;
pub mod reading;
pub mod reminders;
pub mod users;

/// Which client family a route serves. The browser front-end gets HTML-escaped
/// text and larger pages; the mobile app gets raw text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Surface {
    Web,
    Mobile,
}

impl Surface {
    pub fn page_size(&self, library: &Library) -> usize {
        match self {
            Surface::Web => library.books_per_page,
            Surface::Mobile => library.api_books_per_page,
        }
    }

    pub fn recommend_count(&self, library: &Library) -> usize {
        match self {
            Surface::Web => library.home_recommend_count,
            Surface::Mobile => library.api_recommend_count,
        }
    }

    /// The single escape step every response body goes through.
    pub fn present<T: Escape>(&self, value: T) -> T {
        match self {
            Surface::Web => value.escaped(),
            Surface::Mobile => value,
        }
    }
}

#[derive(serde::Serialize, serde::Deserialize, Debug)]
pub struct UrlPath {
    id: i64,
}

#[derive(serde::Deserialize, serde::Serialize, Debug, Validate)]
pub struct ListQuery {
    #[serde(default, deserialize_with = "deserialize_option_number_from_string")]
    #[validate(range(min = 1))]
    page: Option<usize>,

    #[serde(default)]
    criterion: SortCriterion,
}

impl ListQuery {
    pub fn page(&self) -> usize {
        self.page.unwrap_or(1)
    }
}

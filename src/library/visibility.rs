use std::sync::Arc;

use crate::model::User;

/// Who is looking at the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Viewer {
    Anonymous,
    User(i64),
}

impl Viewer {
    pub fn user_id(&self) -> Option<i64> {
        match self {
            Viewer::Anonymous => None,
            Viewer::User(id) => Some(*id),
        }
    }

    pub fn can_see<T: Visible + ?Sized>(&self, book: &T) -> bool {
        !book.is_private() || self.user_id() == Some(book.uploader_id())
    }
}

impl From<Option<&Arc<User>>> for Viewer {
    fn from(user: Option<&Arc<User>>) -> Self {
        match user {
            Some(user) => Viewer::User(user.id),
            None => Viewer::Anonymous,
        }
    }
}

impl From<&User> for Viewer {
    fn from(user: &User) -> Self {
        Viewer::User(user.id)
    }
}

pub trait Visible {
    fn is_private(&self) -> bool;
    fn uploader_id(&self) -> i64;
}

/// Candidate sets that can drop the private books a viewer is not allowed to
/// see. Implemented for materialised lists and for the deferred
/// [`BookQuery`](crate::db::books::BookQuery).
pub trait ExcludePrivate: Sized {
    fn exclude_private(self, viewer: &Viewer) -> Self;
}

impl<T: Visible> ExcludePrivate for Vec<T> {
    fn exclude_private(mut self, viewer: &Viewer) -> Self {
        self.retain(|book| viewer.can_see(book));
        self
    }
}

pub fn exclude_private<C: ExcludePrivate>(viewer: &Viewer, books: C) -> C {
    books.exclude_private(viewer)
}

use crate::{
    library::pagination::Page,
    model::{
        BookDetail, BookSummary, Category, Comment, Home, HomeBook, Language, Profile,
        SelectedBook,
    },
};

/// Converts the characters that are special in HTML into entities.
pub fn html_escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());

    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#x27;"),
            other => escaped.push(other),
        }
    }

    escaped
}

/// Text fields a browser client must never receive unescaped.
pub trait Escape {
    /// Escapes the free-text fields. Call once, right before serializing.
    fn escaped(self) -> Self;
}

impl Escape for String {
    fn escaped(self) -> Self {
        html_escape(&self)
    }
}

impl<T: Escape> Escape for Vec<T> {
    fn escaped(self) -> Self {
        self.into_iter().map(Escape::escaped).collect()
    }
}

impl<T: Escape> Escape for Page<T> {
    fn escaped(self) -> Self {
        self.map(Escape::escaped)
    }
}

impl Escape for BookSummary {
    fn escaped(mut self) -> Self {
        self.name = html_escape(&self.name);
        self.author = html_escape(&self.author);
        self
    }
}

impl Escape for HomeBook {
    fn escaped(mut self) -> Self {
        self.book = self.book.escaped();
        self
    }
}

impl Escape for BookDetail {
    fn escaped(mut self) -> Self {
        self.book_name = html_escape(&self.book_name);
        self.author_name = html_escape(&self.author_name);
        self.category_name = html_escape(&self.category_name);
        self.language = html_escape(&self.language);
        self.uploader = html_escape(&self.uploader);
        self.description = self.description.as_deref().map(html_escape);
        self
    }
}

impl Escape for Comment {
    fn escaped(mut self) -> Self {
        self.user = html_escape(&self.user);
        self.text = html_escape(&self.text);
        self
    }
}

impl Escape for SelectedBook {
    fn escaped(mut self) -> Self {
        self.book = self.book.escaped();
        self.comments = self.comments.escaped();
        self
    }
}

impl Escape for Category {
    fn escaped(mut self) -> Self {
        self.category_name = html_escape(&self.category_name);
        self
    }
}

impl Escape for Language {
    fn escaped(mut self) -> Self {
        self.language = html_escape(&self.language);
        self
    }
}

impl Escape for Home {
    fn escaped(mut self) -> Self {
        self.books = self.books.escaped();
        self.recommend_books = self.recommend_books.escaped();
        self
    }
}

impl Escape for Profile {
    fn escaped(mut self) -> Self {
        self.username = html_escape(&self.username);
        self.books = self.books.escaped();
        self
    }
}

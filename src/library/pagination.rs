#[derive(serde::Serialize, serde::Deserialize, Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub has_next: bool,
    pub next_page: usize,
}

impl<T> Page<T> {
    pub fn map<U, F>(self, f: F) -> Page<U>
    where
        F: FnMut(T) -> U,
    {
        Page {
            items: self.items.into_iter().map(f).collect(),
            has_next: self.has_next,
            next_page: self.next_page,
        }
    }
}

/// Slices `seq` into the 1-indexed page `page_number`. `next_page` stays on
/// `page_number` once the last page is reached, and pages past the end are
/// empty rather than an error.
pub fn paginate<T>(seq: Vec<T>, page_size: usize, page_number: usize) -> Page<T> {
    let start = page_number.saturating_sub(1).saturating_mul(page_size);

    if page_size == 0 || start >= seq.len() {
        return Page {
            items: Vec::new(),
            has_next: false,
            next_page: page_number,
        };
    }

    let end = start.saturating_add(page_size).min(seq.len());
    let has_next = end < seq.len();
    let items = seq.into_iter().skip(start).take(end - start).collect();

    Page {
        items,
        has_next,
        next_page: if has_next { page_number + 1 } else { page_number },
    }
}

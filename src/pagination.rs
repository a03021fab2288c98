use serde::Serialize;

/// One page of an ordered listing plus the metadata needed to render
/// "page N of M" navigation.
#[derive(Debug, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub number: usize,
    pub total_pages: usize,
    pub has_next: bool,
    pub has_previous: bool,
}

/// Parse a raw `?page=` value. Anything that is not a positive integer
/// (absent, garbage, zero, negative) means page 1.
pub fn parse_page_param(raw: Option<&str>) -> usize {
    raw.and_then(|s| s.trim().parse::<i64>().ok())
        .filter(|n| *n >= 1)
        .map(|n| n as usize)
        .unwrap_or(1)
}

/// Slice an already-ordered listing into one page.
///
/// A requested page past the end is clamped to the last existing page.
/// An empty listing yields a single empty page.
pub fn paginate<T>(items: Vec<T>, page_size: usize, requested: usize) -> Page<T> {
    let page_size = page_size.max(1);
    let total_pages = if items.is_empty() {
        1
    } else {
        items.len().div_ceil(page_size)
    };
    let number = requested.clamp(1, total_pages);

    let items: Vec<T> = items
        .into_iter()
        .skip((number - 1) * page_size)
        .take(page_size)
        .collect();

    Page {
        items,
        number,
        total_pages,
        has_next: number < total_pages,
        has_previous: number > 1,
    }
}

//! Client-side paging of fetched collections.

use serde::Serialize;

/// One page of a collection, 1-based.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListPage<T> {
    pub items: Vec<T>,
    pub page: usize,
    pub total_pages: usize,
    pub total_items: usize,
}

/// Slice `items` into pages of `per_page` and return page `page`.
///
/// The page number is clamped into `1..=total_pages`; an empty collection
/// has one empty page. A `per_page` of zero is treated as one.
pub fn paginate_list<T>(items: Vec<T>, page: usize, per_page: usize) -> ListPage<T> {
    let per_page = per_page.max(1);
    let total_items = items.len();
    let total_pages = total_items.div_ceil(per_page).max(1);
    let page = page.clamp(1, total_pages);

    let items = items
        .into_iter()
        .skip((page - 1) * per_page)
        .take(per_page)
        .collect();

    ListPage {
        items,
        page,
        total_pages,
        total_items,
    }
}

pub const DEFAULT_PAGE_SIZE: usize = 10;

const WINDOW_RADIUS: usize = 2;

/// Minimum number of page buttons when the current page sits near an edge.
const WINDOW_WIDTH: usize = 2 * WINDOW_RADIUS + 1;

pub fn page_count(total: usize, page_size: usize) -> usize {
    if page_size == 0 {
        return 0;
    }
    total.div_ceil(page_size)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ViewState {
    current_page: usize,
    page_size: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(tag = "kind", content = "page", rename_all = "lowercase")]
pub enum PageItem {
    Page(usize),
    Ellipsis,
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct PaginationControls {
    pub current_page: usize,
    pub total_pages: usize,
    pub previous_enabled: bool,
    pub next_enabled: bool,
    pub pages: Vec<PageItem>,
    pub page_info: String,
}

impl Default for ViewState {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE_SIZE)
    }
}

impl ViewState {
    pub fn new(page_size: usize) -> Self {
        Self {
            current_page: 1,
            page_size: page_size.max(1),
        }
    }

    pub fn current_page(&self) -> usize {
        self.current_page
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// Moves to `page`, clamped into the pages `total` items produce.
    pub fn go_to(&mut self, page: usize, total: usize) {
        let last = page_count(total, self.page_size).max(1);
        self.current_page = page.clamp(1, last);
    }

    pub fn next(&mut self, total: usize) {
        self.go_to(self.current_page + 1, total);
    }

    pub fn previous(&mut self, total: usize) {
        self.go_to(self.current_page.saturating_sub(1), total);
    }

    pub fn reset(&mut self) {
        self.current_page = 1;
    }

    pub fn slice<'i, T>(&self, items: &'i [T]) -> &'i [T] {
        let start = (self.current_page - 1).saturating_mul(self.page_size);
        if start >= items.len() {
            return &[];
        }
        let end = start.saturating_add(self.page_size).min(items.len());
        &items[start..end]
    }

    /// Navigation for `total` items, `None` when everything fits on one page.
    pub fn controls(&self, total: usize) -> Option<PaginationControls> {
        let total_pages = page_count(total, self.page_size);
        if total_pages <= 1 {
            return None;
        }

        let current = self.current_page.min(total_pages);

        Some(PaginationControls {
            current_page: current,
            total_pages,
            previous_enabled: current > 1,
            next_enabled: current < total_pages,
            pages: page_window(current, total_pages),
            page_info: format!("Page {} of {}", current, total_pages),
        })
    }
}

/// The compact page-number strip around `current`, with the first and last page
/// always reachable.
pub fn page_window(current: usize, total_pages: usize) -> Vec<PageItem> {
    if total_pages == 0 {
        return Vec::new();
    }

    let current = current.clamp(1, total_pages);
    let mut start = current.saturating_sub(WINDOW_RADIUS).max(1);
    let mut end = (current + WINDOW_RADIUS).min(total_pages);

    if end - start < WINDOW_WIDTH - 1 {
        if start == 1 {
            end = (start + WINDOW_WIDTH - 1).min(total_pages);
        } else if end == total_pages {
            start = end.saturating_sub(WINDOW_WIDTH - 1).max(1);
        }
    }

    let mut items = Vec::with_capacity(WINDOW_WIDTH + 4);

    if start > 1 {
        items.push(PageItem::Page(1));
        if start > 2 {
            items.push(PageItem::Ellipsis);
        }
    }

    items.extend((start..=end).map(PageItem::Page));

    if end < total_pages {
        if end < total_pages - 1 {
            items.push(PageItem::Ellipsis);
        }
        items.push(PageItem::Page(total_pages));
    }

    items
}

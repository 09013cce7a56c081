use serde::{Deserialize, Serialize};

/// Page size of every post listing.
pub const POSTS_PER_PAGE: u64 = 10;

/// `?page=` query string. Kept as raw text so junk values fall back to page 1.
#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<String>,
}

impl PageQuery {
    pub fn requested(&self) -> Option<&str> {
        self.page.as_deref()
    }
}

/// Resolved slice of an ordered result set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    pub number: u64,
    pub num_pages: u64,
    pub count: u64,
    pub offset: u64,
    pub limit: u64,
}

impl PageWindow {
    pub fn has_next(&self) -> bool {
        self.number < self.num_pages
    }

    pub fn has_previous(&self) -> bool {
        self.number > 1
    }

    pub fn into_page<T>(self, object_list: Vec<T>) -> Page<T> {
        Page {
            has_next: self.has_next(),
            has_previous: self.has_previous(),
            next_page_number: self.has_next().then(|| self.number + 1),
            previous_page_number: self.has_previous().then(|| self.number - 1),
            number: self.number,
            num_pages: self.num_pages,
            count: self.count,
            object_list,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub object_list: Vec<T>,
    pub number: u64,
    pub num_pages: u64,
    pub count: u64,
    pub has_next: bool,
    pub has_previous: bool,
    pub next_page_number: Option<u64>,
    pub previous_page_number: Option<u64>,
}

impl<T> Page<T> {
    pub fn len(&self) -> usize {
        self.object_list.len()
    }

    pub fn is_empty(&self) -> bool {
        self.object_list.is_empty()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Paginator {
    per_page: u64,
}

impl Paginator {
    pub fn new(per_page: u64) -> Self {
        Self {
            per_page: per_page.max(1),
        }
    }

    /// Works out which slice of `count` ordered items to show.
    ///
    /// There is always at least one page, even for an empty result. The
    /// requested number is clamped: anything missing, unparsable or below 1
    /// means the first page, anything past the end means the last page.
    pub fn window(&self, count: u64, requested: Option<&str>) -> PageWindow {
        let num_pages = count.div_ceil(self.per_page).max(1);
        let number = parse_page_number(requested).clamp(1, num_pages);

        PageWindow {
            number,
            num_pages,
            count,
            offset: (number - 1) * self.per_page,
            limit: self.per_page,
        }
    }

    /// Slices an already materialised sequence.
    pub fn paginate<T>(&self, items: Vec<T>, requested: Option<&str>) -> Page<T> {
        let window = self.window(items.len() as u64, requested);
        let object_list = items
            .into_iter()
            .skip(window.offset as usize)
            .take(window.limit as usize)
            .collect();
        window.into_page(object_list)
    }
}

impl Default for Paginator {
    fn default() -> Self {
        Self::new(POSTS_PER_PAGE)
    }
}

fn parse_page_number(requested: Option<&str>) -> u64 {
    requested
        .and_then(|raw| raw.trim().parse::<i64>().ok())
        .map(|n| n.max(1) as u64)
        .unwrap_or(1)
}

//! Sorting and pagination directives, and the page value object paged
//! queries produce.

use serde::{Deserialize, Serialize};

/// Direction of a sort order.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub enum Direction {
    /// Ascending order.
    Asc,
    /// Descending order.
    Desc,
}

impl Direction {
    pub(crate) fn keyword(&self) -> &'static str {
        match self {
            Direction::Asc => "asc",
            Direction::Desc => "desc",
        }
    }
}

/// A single ordering term: a property and a direction.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Order {
    property: String,
    direction: Direction,
}

impl Order {
    /// Creates an ordering term.
    pub fn new(property: impl Into<String>, direction: Direction) -> Self {
        Order {
            property: property.into(),
            direction,
        }
    }

    /// Shorthand for an ascending term.
    pub fn asc(property: impl Into<String>) -> Self {
        Order::new(property, Direction::Asc)
    }

    /// Shorthand for a descending term.
    pub fn desc(property: impl Into<String>) -> Self {
        Order::new(property, Direction::Desc)
    }

    /// The ordered property.
    pub fn property(&self) -> &str {
        &self.property
    }

    /// The direction of this term.
    pub fn direction(&self) -> Direction {
        self.direction
    }
}

/// An ordering over query results. Consumed structurally by the query
/// layer, never bound as data.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Sort {
    orders: Vec<Order>,
}

impl Sort {
    /// A sort over the given terms, in precedence order.
    pub fn new(orders: Vec<Order>) -> Self {
        Sort { orders }
    }

    /// A single-property ascending sort.
    pub fn by(property: impl Into<String>) -> Self {
        Sort {
            orders: vec![Order::asc(property)],
        }
    }

    /// Appends a lower-precedence term. Returns `self` for chaining.
    pub fn and(mut self, order: Order) -> Self {
        self.orders.push(order);
        self
    }

    /// The ordering terms, highest precedence first.
    pub fn orders(&self) -> &[Order] {
        &self.orders
    }

    /// Tests whether this sort carries no terms.
    pub fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }
}

/// Pagination directive: a zero-based page number, a page size, and an
/// optional sort. Consumed structurally by the query layer.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct PageRequest {
    page: usize,
    size: usize,
    sort: Option<Sort>,
}

impl PageRequest {
    /// A request for page `page` (zero-based) of `size` rows.
    pub fn new(page: usize, size: usize) -> Self {
        PageRequest {
            page,
            size,
            sort: None,
        }
    }

    /// A request carrying an embedded sort.
    pub fn sorted(page: usize, size: usize, sort: Sort) -> Self {
        PageRequest {
            page,
            size,
            sort: Some(sort),
        }
    }

    /// The zero-based page number.
    pub fn page(&self) -> usize {
        self.page
    }

    /// The page size.
    pub fn size(&self) -> usize {
        self.size
    }

    /// The embedded sort, if any.
    pub fn sort(&self) -> Option<&Sort> {
        self.sort.as_ref()
    }

    /// The row offset this request starts at.
    pub fn offset(&self) -> usize {
        self.page * self.size
    }
}

/// One page of results, the directive that produced it, and the total row
/// count.
///
/// The total comes from a separate count query executed before the data
/// query; the two are independent round-trips and no snapshot consistency
/// between them is guaranteed.
#[derive(Clone, Debug, PartialEq)]
pub struct Page<T> {
    content: Vec<T>,
    request: PageRequest,
    total: u64,
}

impl<T> Page<T> {
    /// Assembles a page from its parts.
    pub fn new(content: Vec<T>, request: PageRequest, total: u64) -> Self {
        Page {
            content,
            request,
            total,
        }
    }

    /// The rows of this page.
    pub fn content(&self) -> &[T] {
        &self.content
    }

    /// Consumes the page, yielding its rows.
    pub fn into_content(self) -> Vec<T> {
        self.content
    }

    /// The directive this page was produced for.
    pub fn request(&self) -> &PageRequest {
        &self.request
    }

    /// The zero-based page number.
    pub fn number(&self) -> usize {
        self.request.page()
    }

    /// The requested page size. The final page may hold fewer rows.
    pub fn size(&self) -> usize {
        self.request.size()
    }

    /// The number of rows on this page.
    pub fn len(&self) -> usize {
        self.content.len()
    }

    /// Tests whether this page holds no rows.
    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }

    /// The total number of matching rows, from the count query.
    pub fn total(&self) -> u64 {
        self.total
    }

    /// The total number of pages.
    pub fn total_pages(&self) -> u64 {
        if self.request.size() == 0 {
            return 0;
        }
        self.total.div_ceil(self.request.size() as u64)
    }

    /// Tests whether a page follows this one.
    pub fn has_next(&self) -> bool {
        (self.number() as u64 + 1) < self.total_pages()
    }

    /// Tests whether a page precedes this one.
    pub fn has_previous(&self) -> bool {
        self.number() > 0
    }

    /// Tests whether this is the first page.
    pub fn is_first(&self) -> bool {
        !self.has_previous()
    }

    /// Tests whether this is the last page.
    pub fn is_last(&self) -> bool {
        !self.has_next()
    }
}

impl<T> IntoIterator for Page<T> {
    type Item = T;
    type IntoIter = std::vec::IntoIter<T>;

    fn into_iter(self) -> Self::IntoIter {
        self.content.into_iter()
    }
}

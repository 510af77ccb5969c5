//! Range selection for reads

use crate::store::Order;

/// Score-ordered slice selection. `head`/`tail` are inclusive indices into
/// the ordered member list; `tail = -1` selects through the end.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub head: i64,
    pub tail: i64,
    pub order: Order,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            head: 0,
            tail: -1,
            order: Order::Ascending,
        }
    }
}

impl Pagination {
    pub fn range(head: i64, tail: i64) -> Self {
        Self {
            head,
            tail,
            ..Self::default()
        }
    }

    pub fn with_order(mut self, order: Order) -> Self {
        self.order = order;
        self
    }
}

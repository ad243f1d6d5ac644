//! Keyed, immutable lists of backend records.

use std::sync::Arc;

use portfolio_core::Identified;

/// A list of records keyed by id.
///
/// Never mutated in place: [`with_replaced`](Self::with_replaced) and
/// [`without`](Self::without) produce a new listing and leave `self` (and any
/// snapshot sharing it) untouched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Listing<T> {
    items: Arc<[T]>,
}

impl<T> Default for Listing<T> {
    fn default() -> Self {
        Self {
            items: Arc::from(Vec::new()),
        }
    }
}

impl<T> From<Vec<T>> for Listing<T> {
    fn from(items: Vec<T>) -> Self {
        Self {
            items: Arc::from(items),
        }
    }
}

impl<T> Listing<T> {
    /// Number of records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether there are no records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Records in backend order.
    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.items.iter()
    }

    /// Records as a slice.
    #[must_use]
    pub fn as_slice(&self) -> &[T] {
        &self.items
    }
}

impl<T: Identified + Clone> Listing<T> {
    /// Index of the record with `id`.
    #[must_use]
    pub fn position(&self, id: T::Id) -> Option<usize> {
        self.items.iter().position(|item| item.id() == id)
    }

    /// The record with `id`.
    #[must_use]
    pub fn get(&self, id: T::Id) -> Option<&T> {
        self.items.iter().find(|item| item.id() == id)
    }

    /// A new listing with the record sharing `item`'s id replaced at its
    /// index. Unchanged if no record has that id.
    #[must_use]
    pub fn with_replaced(&self, item: T) -> Self {
        let Some(index) = self.position(item.id()) else {
            return self.clone();
        };

        let mut items = self.items.to_vec();
        if let Some(slot) = items.get_mut(index) {
            *slot = item;
        }
        Self::from(items)
    }

    /// A new listing without the record with `id`.
    #[must_use]
    pub fn without(&self, id: T::Id) -> Self {
        if self.position(id).is_none() {
            return self.clone();
        }
        Self::from(
            self.items
                .iter()
                .filter(|item| item.id() != id)
                .cloned()
                .collect::<Vec<_>>(),
        )
    }
}

impl<'a, T> IntoIterator for &'a Listing<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use portfolio_core::{Testimonial, TestimonialId, TestimonialStatus};

    use super::*;

    fn testimonial(id: i64, status: &str) -> Testimonial {
        serde_json::from_value(serde_json::json!({
            "id": id, "name": format!("author {id}"), "message": "m", "status": status
        }))
        .unwrap()
    }

    #[test]
    fn test_replace_touches_only_matching_entry() {
        let listing = Listing::from(vec![
            testimonial(4, "approved"),
            testimonial(5, "pending"),
            testimonial(6, "pending"),
        ]);

        let mut approved = testimonial(5, "pending");
        approved.status = TestimonialStatus::Approved;
        let updated = listing.with_replaced(approved.clone());

        assert_eq!(updated.position(TestimonialId::new(5)), Some(1));
        assert_eq!(updated.get(TestimonialId::new(5)), Some(&approved));
        assert_eq!(updated.as_slice()[0], listing.as_slice()[0]);
        assert_eq!(updated.as_slice()[2], listing.as_slice()[2]);
        // The original snapshot is untouched.
        assert_eq!(
            listing.get(TestimonialId::new(5)).unwrap().status,
            TestimonialStatus::Pending
        );
    }

    #[test]
    fn test_replace_unknown_id_is_noop() {
        let listing = Listing::from(vec![testimonial(1, "pending")]);
        assert_eq!(listing.with_replaced(testimonial(9, "approved")), listing);
    }

    #[test]
    fn test_without() {
        let listing = Listing::from(vec![testimonial(1, "pending"), testimonial(2, "approved")]);
        let remaining = listing.without(TestimonialId::new(1));
        assert_eq!(remaining.len(), 1);
        assert!(remaining.get(TestimonialId::new(1)).is_none());
        assert_eq!(listing.len(), 2);
        assert_eq!(remaining.without(TestimonialId::new(7)), remaining);
    }
}

use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::extract::Listing;

/// Stores unique listings, remembering the order they were first seen in.
pub struct ListingDb(Arc<Mutex<Inner>>);

#[derive(Default)]
struct Inner {
    seen: HashSet<Listing>,
    ordered: Vec<Listing>,
}

impl Clone for ListingDb {
    /// Returns a clone/handle of the given ListingDb.
    fn clone(&self) -> Self {
        ListingDb(Arc::clone(&self.0))
    }
}

impl ListingDb {
    /// Returns a new ListingDb instance.
    pub fn new() -> Self {
        ListingDb(Arc::new(Mutex::new(Inner::default())))
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        match self.0.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Returns the number of unique listings.
    pub fn len(&self) -> usize {
        self.lock().ordered.len()
    }

    /// Returns whether no listing has been stored yet.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Inserts a listing; returns false if an identical listing was already
    /// stored.
    pub fn insert(&mut self, listing: Listing) -> bool {
        let mut inner = self.lock();
        if inner.seen.contains(&listing) {
            return false;
        }
        inner.seen.insert(listing.clone());
        inner.ordered.push(listing);
        true
    }

    /// Returns an iterator over the stored listings in first-seen order.
    pub fn iter(&self) -> impl Iterator<Item = Listing> {
        self.lock().ordered.clone().into_iter()
    }
}

impl Default for ListingDb {
    fn default() -> Self {
        Self::new()
    }
}

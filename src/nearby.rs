//! Finds the locations nearest to a target using only the structure of
//! postal codes. There is no geocoding: two locations are "close" when their
//! postal codes are numerically close, and candidates are drawn from the
//! target's own group first, then from the groups one key below and one key
//! above.
//!
//! Matching never fails. Malformed postal codes rank last, non-numeric group
//! keys skip widening, and a dataset with too few candidates simply yields a
//! shorter list.

use crate::index::GroupIndex;
use crate::location::{Distance, Location};
use crate::scheme::Scheme;
use std::collections::HashSet;
use tracing::debug;

/// The number of nearby locations listed on a page unless configured
/// otherwise.
pub const DEFAULT_COUNT: usize = 10;

/// A candidate location with its distance from the target.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Candidate<'a> {
    pub location: &'a Location,
    pub distance: Distance,
}

/// Looks up nearby locations in a [`GroupIndex`]. A matcher holds no mutable
/// state, so it can be shared freely between threads.
pub struct Matcher<'i, 's, 'a> {
    index: &'i GroupIndex<'s, 'a>,
}

impl<'i, 's, 'a> Matcher<'i, 's, 'a> {
    pub fn new(index: &'i GroupIndex<'s, 'a>) -> Matcher<'i, 's, 'a> {
        Matcher { index }
    }

    /// Returns up to `count` locations nearest to `target`, nearest first.
    /// See [`Matcher::candidates`].
    pub fn find(&self, target: &Location, count: usize) -> Vec<&'a Location> {
        self.candidates(target, count)
            .into_iter()
            .map(|c| c.location)
            .collect()
    }

    /// Returns up to `count` [`Candidate`]s nearest to `target`, ordered by
    /// ascending [`Distance`]. The target itself (matched by identifier) is
    /// never included, and each identifier appears at most once. Ties keep
    /// the order in which candidates were collected: the target's group in
    /// dataset order, then the lower neighbouring group, then the upper one.
    pub fn candidates(&self, target: &Location, count: usize) -> Vec<Candidate<'a>> {
        let key = self.index.scheme().group_key(&target.postal_code);
        let origin = target.postal_number();

        let mut candidates = Vec::new();
        self.collect(&mut candidates, target, origin, self.index.group(&key));

        if candidates.len() < count {
            let neighbours = key.neighbours();
            if neighbours.is_empty() {
                debug!(location = %target.id, group = %key, "group key isn't numeric; not widening");
            }
            for neighbour in neighbours {
                self.collect(&mut candidates, target, origin, self.index.group(&neighbour));
            }
        }

        // `sort_by_key` is stable, so ties keep collection order.
        candidates.sort_by_key(|c| c.distance);

        let mut seen: HashSet<&str> = HashSet::new();
        candidates.retain(|c| seen.insert(c.location.id.as_str()));
        candidates.truncate(count);
        candidates
    }

    fn collect(
        &self,
        candidates: &mut Vec<Candidate<'a>>,
        target: &Location,
        origin: Option<u64>,
        group: &[&'a Location],
    ) {
        candidates.extend(
            group
                .iter()
                .filter(|location| location.id != target.id)
                .map(|&location| Candidate {
                    location,
                    distance: Distance::between(origin, location.postal_number()),
                }),
        );
    }
}

/// Convenience wrapper which indexes `locations` and finds the `count`
/// locations nearest to `target`. Prefer building a [`GroupIndex`] once and
/// reusing a [`Matcher`] when matching every location of a dataset.
pub fn find_nearby<'a>(
    scheme: &Scheme,
    locations: &'a [Location],
    target: &Location,
    count: usize,
) -> Vec<&'a Location> {
    let index = GroupIndex::new(scheme, locations);
    Matcher::new(&index).find(target, count)
}

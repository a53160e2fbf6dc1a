//! Defines the [`GroupIndex`], which buckets a dataset's [`Location`]s by
//! [`GroupKey`], and the [`GroupSummary`] export built from it.

use crate::location::Location;
use crate::scheme::{GroupKey, Scheme};
use serde::Serialize;
use std::collections::BTreeMap;
use std::io::Write;

/// Maps each [`GroupKey`] to the locations that share it. Within a group,
/// locations keep their dataset order. The index borrows the dataset and is
/// never mutated after [`GroupIndex::new`]. The scheme and the dataset are
/// borrowed independently, so locations returned from the index may outlive
/// the scheme.
pub struct GroupIndex<'s, 'a> {
    scheme: &'s Scheme,
    groups: BTreeMap<GroupKey, Vec<&'a Location>>,
}

impl<'s, 'a> GroupIndex<'s, 'a> {
    pub fn new(scheme: &'s Scheme, locations: &'a [Location]) -> GroupIndex<'s, 'a> {
        let mut groups: BTreeMap<GroupKey, Vec<&'a Location>> = BTreeMap::new();
        for location in locations {
            groups
                .entry(scheme.group_key(&location.postal_code))
                .or_default()
                .push(location);
        }
        GroupIndex { scheme, groups }
    }

    pub fn scheme(&self) -> &'s Scheme {
        self.scheme
    }

    /// Returns the locations in a group, or an empty slice if the group
    /// doesn't exist.
    pub fn group(&self, key: &GroupKey) -> &[&'a Location] {
        match self.groups.get(key) {
            Some(locations) => locations,
            None => &[],
        }
    }

    /// The number of distinct groups.
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Iterates over the groups in key order.
    pub fn groups(&self) -> impl Iterator<Item = (&GroupKey, &[&'a Location])> {
        self.groups.iter().map(|(key, locations)| (key, locations.as_slice()))
    }

    /// Builds one [`GroupSummary`] per group, sorted by key.
    pub fn summaries(&self) -> Vec<GroupSummary<'a>> {
        self.groups()
            .map(|(key, locations)| GroupSummary {
                code: key.clone(),
                name: self.scheme.group_name(key),
                count: locations.len(),
                locations: locations.to_vec(),
            })
            .collect()
    }

    /// Writes [`GroupIndex::summaries`] to `w` as a pretty-printed JSON
    /// array. This is the listing consumed by department/region pages and
    /// the home page directory.
    pub fn write_summaries<W: Write>(&self, w: W) -> serde_json::Result<()> {
        serde_json::to_writer_pretty(w, &self.summaries())
    }
}

/// A department or region with the locations it contains.
#[derive(Debug, Serialize)]
pub struct GroupSummary<'a> {
    pub code: GroupKey,
    pub name: String,
    pub count: usize,
    #[serde(rename = "villes")]
    pub locations: Vec<&'a Location>,
}

//! The library code for `nearby`, which finds the places to list in the
//! "nearby" section of generated place-directory pages (French communes,
//! Finnish cities, and so on). The architecture breaks down into three steps:
//!
//! 1. Loading locations from a JSON dataset ([`crate::dataset`])
//! 2. Bucketing them by postal-code prefix ([`crate::index`]), according to a
//!    country's [`crate::scheme::Scheme`]
//! 3. Matching each location against its own bucket and, when that runs
//!    short, the neighbouring buckets ([`crate::nearby`])
//!
//! The third step is the interesting one. There is no geocoding: proximity is
//! estimated from the numeric difference between postal codes, which is a
//! cheap approximation but good enough for cross-linking pages. Matching never
//! fails on bad data; malformed postal codes just rank last.
//!
//! [`crate::generate::generate`] runs all three steps from a
//! [`crate::config::Config`] and also writes the per-group summary used by
//! department/region pages. Rendering and writing the pages themselves is left
//! to the caller.

#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]

pub mod config;
pub mod dataset;
pub mod generate;
pub mod index;
pub mod location;
pub mod nearby;
pub mod scheme;

//! Identity-preserving sidebar tree for feed readers.
//!
//! [`tree`] reconciles a domain snapshot into a tree of stable nodes,
//! [`outline`] flattens it into rows and diffs successive versions, and
//! [`events`] tells consumers when to reconcile again.

pub mod config;
pub mod domain;
pub mod events;
pub mod outline;
pub mod tree;
pub mod util;

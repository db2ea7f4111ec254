//! The candidate-sourcing core: payload normalization, reconciliation of
//! oracle output onto fetched profiles, and the cache-first pipeline that
//! drives fetch and rank requests.

pub mod normalize;
pub mod pipeline;
pub mod reconcile;

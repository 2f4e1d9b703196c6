//! Persistence layer: shared entities, the [`score_store::ScoreStore`]
//! abstraction, and its database backends.

pub mod models;
pub mod score_store;
pub mod storage;

//! Business logic sitting between the HTTP routes and the persistence layer.

pub mod admin_service;
pub mod aggregation;
pub mod bootstrap;
pub mod documentation;
pub mod health_service;
pub mod scoreboard_service;
pub mod sse_events;
pub mod sse_service;
pub mod storage_supervisor;

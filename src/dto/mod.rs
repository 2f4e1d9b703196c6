//! Wire types shared by the REST surface and the SSE push channel.

use std::time::SystemTime;
use time::{OffsetDateTime, format_description::well_known::Rfc3339};

pub mod admin;
pub mod health;
pub mod scoreboard;
pub mod sse;
pub mod validation;

/// Render a timestamp as RFC 3339 for JSON payloads.
pub fn format_system_time(time: SystemTime) -> String {
    OffsetDateTime::from(time)
        .format(&Rfc3339)
        .unwrap_or_else(|_| "invalid-timestamp".into())
}

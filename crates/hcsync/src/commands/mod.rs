//! Command handlers. The CLI has a single interactive flow.

pub mod mirror;
pub mod util;

//! Reusable render helpers.

pub mod usage_bar;

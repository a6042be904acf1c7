pub mod access_guard;
pub mod catalog;
pub mod dto;
pub mod executor;
pub mod expression;
pub mod query_spec;
pub mod time_range;

pub mod phone_cache;
pub mod phone_filter;
pub mod sql;

pub mod api;
pub mod schema;

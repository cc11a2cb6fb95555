//! PostgreSQL connection management and schema bootstrap

mod db;
mod schema;

pub use db::Database;
pub use schema::apply_schema;

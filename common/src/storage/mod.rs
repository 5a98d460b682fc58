pub mod db;
pub mod index_sink;
pub mod types;

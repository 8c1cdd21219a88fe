pub mod catalog;
pub mod db;

pub use catalog::JsonCatalogSource;
pub use db::DbAdapter;

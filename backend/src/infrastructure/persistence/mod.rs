mod in_memory_page_repository;
mod schema;
mod sqlite_page_repository;
mod sqlite_storage;

pub use in_memory_page_repository::{InMemoryPageRepository, PageProps, SiteProps};
pub use schema::initialize_database;
pub use sqlite_page_repository::SqlitePageRepository;
pub use sqlite_storage::SqliteStorage;

// Domain layer module
pub mod aggregates;
pub mod base;
pub mod blueprint;
pub mod collections;
pub mod content;
pub mod context;
pub mod entities;
pub mod events;
pub mod records;
pub mod storage;
pub mod value_objects;

pub use aggregates::*;
pub use base::*;
pub use blueprint::*;
pub use collections::*;
pub use content::*;
pub use context::*;
pub use entities::*;
pub use events::*;
pub use records::*;
pub use storage::*;
pub use value_objects::*;

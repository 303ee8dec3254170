pub mod page_input;

pub use page_input::{DuplicateOptions, PageInput};

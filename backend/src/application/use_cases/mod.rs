mod numbering;
mod page_actions;
pub(crate) mod page_lifecycle;

pub use numbering::parse_date;

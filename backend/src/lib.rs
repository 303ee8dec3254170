pub mod application;
pub mod domain;
pub mod infrastructure;

pub use application::{Cms, CmsBuilder, CmsConfig, HookRegistry, PageInput};
pub use domain::{DomainError, DomainResult, Page, Site};

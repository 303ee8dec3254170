/// Structural page records as the repositories hand them out
use super::base::{DomainError, DomainResult};
use super::value_objects::{PageId, Slug, Status, Template};

/// Structural description of a page as the repository knows it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRecord {
    pub id: PageId,
    pub slug: Slug,
    pub num: Option<i64>,
    pub is_draft: bool,
    pub template: Template,
}

impl PageRecord {
    /// Build a record, rejecting the draft + num combination
    pub fn new(
        parent: Option<&PageId>,
        slug: Slug,
        num: Option<i64>,
        is_draft: bool,
        template: Template,
    ) -> DomainResult<Self> {
        if is_draft && num.is_some() {
            return Err(DomainError::invalid_type(
                "error.page.props.invalid",
                format!("The draft \"{}\" cannot have a sorting number", slug),
            ));
        }
        if let Some(num) = num {
            if num < 0 {
                return Err(DomainError::invalid_value(
                    "error.page.num.invalid",
                    format!("The sorting number {} is invalid", num),
                ));
            }
        }

        Ok(PageRecord {
            id: PageId::from_parts(parent, &slug),
            slug,
            num,
            is_draft,
            template,
        })
    }

    pub fn parent_id(&self) -> Option<PageId> {
        self.id.parent()
    }

    pub fn status(&self) -> Status {
        if self.is_draft {
            Status::Draft
        } else if self.num.is_some() {
            Status::Listed
        } else {
            Status::Unlisted
        }
    }

    /// The same page with a different sorting number
    pub fn with_num(&self, num: Option<i64>) -> PageRecord {
        PageRecord {
            num,
            ..self.clone()
        }
    }

    /// The same page as a published (non-draft) page
    pub fn published(&self) -> PageRecord {
        PageRecord {
            is_draft: false,
            ..self.clone()
        }
    }

    /// The same page as a draft, which never carries a num
    pub fn unpublished(&self) -> PageRecord {
        PageRecord {
            is_draft: true,
            num: None,
            ..self.clone()
        }
    }

    pub fn with_slug(&self, slug: Slug) -> PageRecord {
        PageRecord {
            id: PageId::from_parts(self.parent_id().as_ref(), &slug),
            slug,
            ..self.clone()
        }
    }

    pub fn with_parent(&self, parent: Option<&PageId>) -> PageRecord {
        PageRecord {
            id: PageId::from_parts(parent, &self.slug),
            ..self.clone()
        }
    }
}

/// Preconditions and capability checks run before every page mutation
use crate::application::cms::KernelAccess;
use crate::domain::aggregates::{Page, ParentModel};
use crate::domain::base::{DomainError, DomainResult};
use crate::domain::value_objects::Slug;

/// Page mutations that consult the capability check
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PageAction {
    Create,
    ChangeSlug,
    ChangeStatus,
    ChangeSort,
    ChangeNum,
    ChangeTitle,
    Update,
    Duplicate,
    Move,
    Delete,
}

impl PageAction {
    /// Name used in hook names, e.g. `page.changeSlug:before`
    pub fn as_str(&self) -> &'static str {
        match self {
            PageAction::Create => "create",
            PageAction::ChangeSlug => "changeSlug",
            PageAction::ChangeStatus => "changeStatus",
            PageAction::ChangeSort => "changeSort",
            PageAction::ChangeNum => "changeNum",
            PageAction::ChangeTitle => "changeTitle",
            PageAction::Update => "update",
            PageAction::Duplicate => "duplicate",
            PageAction::Move => "move",
            PageAction::Delete => "delete",
        }
    }

    pub fn permission_key(&self) -> &'static str {
        match self {
            PageAction::Create => "error.page.create.permission",
            PageAction::ChangeSlug => "error.page.changeSlug.permission",
            PageAction::ChangeStatus => "error.page.changeStatus.permission",
            PageAction::ChangeSort => "error.page.changeSort.permission",
            PageAction::ChangeNum => "error.page.changeNum.permission",
            PageAction::ChangeTitle => "error.page.changeTitle.permission",
            PageAction::Update => "error.page.update.permission",
            PageAction::Duplicate => "error.page.duplicate.permission",
            PageAction::Move => "error.page.move.permission",
            PageAction::Delete => "error.page.delete.permission",
        }
    }
}

/// Yes/no capability check supplied by the host application
pub trait Permissions {
    fn can(&self, action: PageAction, page: &Page) -> bool;
}

/// Grants every action
#[derive(Debug, Clone, Copy, Default)]
pub struct AllowAll;

impl Permissions for AllowAll {
    fn can(&self, _action: PageAction, _page: &Page) -> bool {
        true
    }
}

/// Capability check backed by a closure
pub struct PermissionsFn<F>(pub F);

impl<F> Permissions for PermissionsFn<F>
where
    F: Fn(PageAction, &Page) -> bool,
{
    fn can(&self, action: PageAction, page: &Page) -> bool {
        (self.0)(action, page)
    }
}

/// Precondition checks for each page mutation
pub struct PageRules;

impl PageRules {
    pub fn permission(page: &Page, action: PageAction) -> DomainResult<()> {
        if page.kernel()?.permissions().can(action, page) {
            return Ok(());
        }
        tracing::warn!("Permission denied: {} on {}", action.as_str(), page.id());
        Err(DomainError::permission_denied(
            action.permission_key(),
            format!("You are not allowed to {} the page \"{}\"", action.as_str(), page.id()),
        ))
    }

    pub fn create(page: &Page, parent: &ParentModel) -> DomainResult<()> {
        Self::permission(page, PageAction::Create)?;
        Self::ensure_unique_slug(parent, page.slug(), None)
    }

    pub fn change_slug(page: &Page, slug: &Slug) -> DomainResult<()> {
        Self::permission(page, PageAction::ChangeSlug)?;
        Self::ensure_unique_slug(&page.parent_model()?, slug, Some(page))
    }

    pub fn change_status(page: &Page) -> DomainResult<()> {
        Self::permission(page, PageAction::ChangeStatus)
    }

    pub fn change_sort(page: &Page) -> DomainResult<()> {
        Self::permission(page, PageAction::ChangeSort)
    }

    pub fn change_num(page: &Page, num: Option<i64>) -> DomainResult<()> {
        if page.is_draft() {
            return Err(DomainError::logic(
                "error.page.num.draft",
                format!("The draft \"{}\" cannot have a sorting number", page.id()),
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
        Self::permission(page, PageAction::ChangeNum)
    }

    pub fn change_title(page: &Page, title: &str) -> DomainResult<()> {
        Self::permission(page, PageAction::ChangeTitle)?;
        if title.trim().is_empty() {
            return Err(DomainError::invalid_value(
                "error.page.changeTitle.empty",
                "The title must not be empty",
            ));
        }
        Ok(())
    }

    pub fn update(page: &Page) -> DomainResult<()> {
        Self::permission(page, PageAction::Update)
    }

    pub fn duplicate(page: &Page, slug: &Slug) -> DomainResult<()> {
        Self::permission(page, PageAction::Duplicate)?;
        Self::ensure_unique_slug(&page.parent_model()?, slug, None)
    }

    pub fn move_to(page: &Page, parent: &ParentModel) -> DomainResult<()> {
        Self::permission(page, PageAction::Move)?;

        if let Some(target) = parent.page_id() {
            if target.is_within(page.id()) {
                return Err(DomainError::logic(
                    "error.page.move.ancestor",
                    format!("The page \"{}\" cannot be moved into itself", page.id()),
                ));
            }
        }

        Self::ensure_unique_slug(parent, page.slug(), Some(page))
    }

    pub fn delete(page: &Page, force: bool) -> DomainResult<()> {
        Self::permission(page, PageAction::Delete)?;
        if !force && !page.children_and_drafts()?.is_empty() {
            return Err(DomainError::logic(
                "error.page.delete.hasChildren",
                format!("The page \"{}\" has subpages and cannot be deleted", page.id()),
            ));
        }
        Ok(())
    }

    /// No page or draft below `parent` may use `slug`, except `ignore` itself
    fn ensure_unique_slug(parent: &ParentModel, slug: &Slug, ignore: Option<&Page>) -> DomainResult<()> {
        let clash = parent.children_and_drafts()?.iter().any(|sibling| {
            sibling.slug() == slug && ignore.map_or(true, |page| sibling.id() != page.id())
        });

        if clash {
            return Err(DomainError::duplicate(
                "error.page.duplicate",
                format!("A page with the URL appendix \"{}\" already exists", slug),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_permission_keys_follow_action_names() {
        for action in [
            PageAction::Create,
            PageAction::ChangeSlug,
            PageAction::ChangeStatus,
            PageAction::ChangeTitle,
            PageAction::Delete,
        ] {
            assert_eq!(
                action.permission_key(),
                format!("error.page.{}.permission", action.as_str())
            );
        }
    }
}

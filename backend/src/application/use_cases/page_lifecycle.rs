/// Steps shared by the page mutations: hook commit, relocation and sibling re-sorting
use crate::application::cms::KernelAccess;
use crate::application::rules::PageAction;
use crate::domain::aggregates::{Page, ParentLink, ParentModel};
use crate::domain::base::{DomainError, DomainResult};
use crate::domain::events::{arguments, Arguments, HookValue};
use crate::domain::records::PageRecord;
use crate::domain::value_objects::PageId;
use std::rc::Rc;

/// Run one mutation between its `:before` and `:after` hooks.
///
/// `run` performs the write after `page.<action>:before` returned without
/// error. Its result is passed through `page.<action>:after`, whose handlers
/// may replace it.
pub(crate) fn commit<F>(
    page: &Page,
    action: PageAction,
    before: Arguments,
    run: F,
) -> DomainResult<HookValue>
where
    F: FnOnce() -> DomainResult<HookValue>,
{
    let hooks = page.kernel()?.hooks();
    let old = HookValue::from(page.this()?);

    hooks.trigger(&format!("page.{}:before", action.as_str()), before)?;

    let result = run()?;

    let (after, key) = match action {
        PageAction::Create => (arguments([("page", result)]), "page"),
        PageAction::Duplicate => (
            arguments([("duplicatePage", result), ("originalPage", old)]),
            "duplicatePage",
        ),
        PageAction::Delete => (arguments([("status", result), ("page", old)]), "status"),
        _ => (arguments([("newPage", result), ("oldPage", old)]), "newPage"),
    };

    hooks.apply(&format!("page.{}:after", action.as_str()), after, key)
}

/// [`commit`] for mutations that produce a page
pub(crate) fn commit_page<F>(
    page: &Page,
    action: PageAction,
    before: Arguments,
    run: F,
) -> DomainResult<Rc<Page>>
where
    F: FnOnce() -> DomainResult<Rc<Page>>,
{
    let value = commit(page, action, before, || run().map(HookValue::from))?;
    value.as_page().ok_or_else(|| {
        DomainError::invalid_type(
            "error.hooks.result.invalid",
            format!("The page.{}:after hooks must return a page", action.as_str()),
        )
    })
}

/// Move a page to the location described by `to`.
///
/// Pages with an explicitly chosen storage keep it; all others are bound to
/// the repository's storage at the new location.
pub(crate) fn relocate(page: &Page, to: PageRecord, parent: ParentLink) -> DomainResult<Rc<Page>> {
    let kernel = page.kernel()?;
    let from = page.record();

    if *from != to {
        tracing::debug!("Relocating page {} ({}) to {} ({})", from.id, from.status(), to.id, to.status());
        kernel.write_repository(|repo| repo.relocate(from, &to))?;
    }

    if page.has_custom_storage() {
        return Ok(Page::new(
            page.context().clone(),
            parent,
            to,
            page.storage().boxed_clone(),
            true,
        ));
    }
    Page::from_record(page.context(), parent, to)
}

/// A fresh instance at the same location, bound to the same storage
pub(crate) fn reloaded(page: &Page) -> Rc<Page> {
    Page::new(
        page.context().clone(),
        page.parent_link().clone(),
        page.record().clone(),
        page.storage().boxed_clone(),
        page.has_custom_storage(),
    )
}

/// Purge the page's own collections and those of its parent
pub(crate) fn purge_around(page: &Page) -> DomainResult<()> {
    page.purge();
    page.parent_model()?.purge();
    Ok(())
}

/// Move the element at `from` to `to`, shifting the others
fn move_key(keys: &mut Vec<PageId>, from: usize, to: usize) {
    let key = keys.remove(from);
    let to = to.min(keys.len());
    keys.insert(to, key);
}

/// Renumber the manually sorted listed siblings after `page` was listed at
/// `position`. Returns the page, renumbered itself if its position had to be
/// clamped into the contiguous range.
pub(crate) fn resort_siblings_after_listing(page: &Rc<Page>, position: i64) -> DomainResult<Rc<Page>> {
    let parent = page.parent_model()?;
    let siblings = parent
        .children()?
        .listed()
        .append(page.clone())
        .filter(|sibling| sibling.blueprint().num.is_sortable());

    let mut keys: Vec<PageId> = siblings.keys().cloned().collect();
    let index = keys.iter().position(|id| id == page.id()).ok_or_else(|| {
        DomainError::logic(
            "error.page.sort.index",
            "The page is not included in the sorting index",
        )
    })?;

    let position = position.clamp(1, keys.len() as i64);
    move_key(&mut keys, index, (position - 1) as usize);

    let mut result = page.clone();
    for (index, id) in keys.iter().enumerate() {
        let num = index as i64 + 1;
        if id == page.id() {
            if result.num() != Some(num) {
                result = result.change_num(Some(num))?;
            }
            continue;
        }

        if let Some(sibling) = siblings.get(id) {
            if sibling.num() != Some(num) {
                sibling.change_num(Some(num))?;
            }
        }
    }

    parent.purge();
    Ok(result)
}

/// Close the gap a page leaves in the listed siblings
pub(crate) fn resort_siblings_after_unlisting(page: &Page) -> DomainResult<()> {
    let parent = page.parent_model()?;
    let siblings = parent
        .children()?
        .listed()
        .not([page.id()])
        .filter(|sibling| sibling.blueprint().num.is_sortable());

    for (index, sibling) in siblings.iter().enumerate() {
        let num = index as i64 + 1;
        if sibling.num() != Some(num) {
            sibling.change_num(Some(num))?;
        }
    }

    parent.purge();
    Ok(())
}

/// Hook value for a parent model
pub(crate) fn parent_value(parent: &ParentModel) -> HookValue {
    match parent {
        ParentModel::Site(site) => HookValue::from(site.clone()),
        ParentModel::Page(page) => HookValue::from(page.clone()),
    }
}

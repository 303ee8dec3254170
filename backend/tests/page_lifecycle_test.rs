/// Integration tests for the page lifecycle on fixture-backed sites
use pagetree::application::repositories::StorageKind;
use pagetree::application::{Cms, DuplicateOptions, HookRegistry, PageInput};
use pagetree::domain::blueprint::Blueprint;
use pagetree::domain::content::fields_from;
use pagetree::domain::entities::{Language, Languages};
use pagetree::domain::value_objects::{LanguageCode, PageId, Status, VersionId};
use pagetree::domain::{ChildSource, Page, ParentModel, Pages};
use pagetree::infrastructure::persistence::InMemoryPageRepository;
use serde_json::json;
use std::cell::RefCell;
use std::rc::Rc;

fn blog() -> Cms {
    blog_with_hooks(HookRegistry::new())
}

fn blog_with_hooks(hooks: HookRegistry) -> Cms {
    let repository = InMemoryPageRepository::from_value(json!({
        "children": [
            {
                "slug": "blog",
                "num": 1,
                "template": "blog",
                "content": { "title": "Blog" },
                "children": [
                    { "slug": "a", "num": 1, "content": { "title": "A", "uuid": "aaaa" } },
                    { "slug": "b", "num": 2, "content": { "title": "B", "uuid": "bbbb" } },
                    { "slug": "c", "num": 3, "content": { "title": "C", "uuid": "cccc" } },
                    { "slug": "archive", "content": { "title": "Archive" } }
                ],
                "drafts": [
                    {
                        "slug": "draft",
                        "content": { "title": "Draft", "uuid": "dddd" },
                        "children": [
                            { "slug": "part", "content": { "title": "Part", "uuid": "eeee" } }
                        ]
                    }
                ]
            },
            { "slug": "about", "content": { "title": "About" } }
        ]
    }))
    .unwrap();

    Cms::builder()
        .repository(repository)
        .hooks(hooks)
        .build()
        .unwrap()
}

fn page(cms: &Cms, id: &str) -> Rc<Page> {
    cms.page(id).unwrap().unwrap()
}

fn listing(pages: &Pages) -> Vec<(String, Option<i64>)> {
    pages
        .iter()
        .map(|page| (page.slug().to_string(), page.num()))
        .collect()
}

fn owned(items: &[(&str, Option<i64>)]) -> Vec<(String, Option<i64>)> {
    items
        .iter()
        .map(|(slug, num)| (slug.to_string(), *num))
        .collect()
}

#[test]
fn test_fixture_listing_order() {
    let cms = blog();
    let blog = page(&cms, "blog");

    assert_eq!(
        listing(&blog.children().unwrap()),
        owned(&[("a", Some(1)), ("b", Some(2)), ("c", Some(3)), ("archive", None)])
    );
    assert_eq!(listing(&blog.drafts().unwrap()), owned(&[("draft", None)]));
    assert_eq!(blog.children_and_drafts().unwrap().len(), 5);
}

#[test]
fn test_change_sort_moves_page_to_front() {
    let cms = blog();
    let c = page(&cms, "blog/c");

    let c = c.change_sort(Some(1)).unwrap();
    assert_eq!(c.num(), Some(1));

    let blog = page(&cms, "blog");
    assert_eq!(
        listing(&blog.children().unwrap().listed()),
        owned(&[("c", Some(1)), ("a", Some(2)), ("b", Some(3))])
    );
}

#[test]
fn test_change_sort_to_the_same_place_is_idempotent() {
    let fired = Rc::new(RefCell::new(Vec::new()));
    let log = fired.clone();
    let mut hooks = HookRegistry::new();
    hooks.on("page.*:*", move |event| {
        log.borrow_mut().push(event.name().to_string());
        Ok(None)
    });
    let cms = blog_with_hooks(hooks);

    let b = page(&cms, "blog/b").change_sort(Some(2)).unwrap();
    assert_eq!(b.num(), Some(2));

    // positions past the end clamp onto the last slot, which `c` already holds
    let c = page(&cms, "blog/c").change_sort(Some(99)).unwrap();
    assert_eq!(c.num(), Some(3));

    assert!(fired.borrow().is_empty());
    assert_eq!(
        listing(&page(&cms, "blog").children().unwrap().listed()),
        owned(&[("a", Some(1)), ("b", Some(2)), ("c", Some(3))])
    );
}

#[test]
fn test_change_status_by_name() {
    let cms = blog();
    let archive = page(&cms, "blog/archive");

    let archive = archive.change_status_str("listed", Some(2)).unwrap();
    assert_eq!(archive.status(), Status::Listed);

    assert_eq!(
        listing(&page(&cms, "blog").children().unwrap().listed()),
        owned(&[("a", Some(1)), ("archive", Some(2)), ("b", Some(3)), ("c", Some(4))])
    );

    let err = archive.change_status_str("hidden", None).unwrap_err();
    assert_eq!(err.key(), "error.page.status.invalid");
}

#[test]
fn test_deleting_a_listed_page_closes_the_gap() {
    let cms = blog();
    assert!(page(&cms, "blog/b").delete(false).unwrap());

    assert!(cms.page("blog/b").unwrap().is_none());
    assert_eq!(
        listing(&page(&cms, "blog").children().unwrap().listed()),
        owned(&[("a", Some(1)), ("c", Some(2))])
    );
}

#[test]
fn test_duplicate_with_children_refreshes_uuids() {
    let cms = blog();
    let draft = page(&cms, "blog/draft");

    let copy = draft
        .duplicate(
            Some("draft-two"),
            DuplicateOptions {
                children: true,
                ..DuplicateOptions::default()
            },
        )
        .unwrap();

    assert_eq!(copy.id().as_str(), "blog/draft-two");
    assert!(copy.is_draft());
    assert_ne!(copy.uuid().unwrap().unwrap().as_str(), "dddd");

    let part = page(&cms, "blog/draft-two/part");
    assert_eq!(part.title().unwrap(), "Part");
    assert_ne!(part.uuid().unwrap().unwrap().as_str(), "eeee");

    // the original subtree is untouched
    assert_eq!(
        page(&cms, "blog/draft/part").uuid().unwrap().unwrap().as_str(),
        "eeee"
    );
}

#[test]
fn test_duplicate_without_children() {
    let cms = blog();
    let copy = page(&cms, "blog/draft")
        .duplicate(None, DuplicateOptions::default())
        .unwrap();

    assert_eq!(copy.slug().as_str(), "draft-copy");
    assert!(copy.children_and_drafts().unwrap().is_empty());
}

#[test]
fn test_duplicate_slug_clash() {
    let cms = blog();
    let err = page(&cms, "blog/a")
        .duplicate(Some("b"), DuplicateOptions::default())
        .unwrap_err();
    assert_eq!(err.key(), "error.page.duplicate");
}

#[test]
fn test_move_between_parents() {
    let cms = blog();
    let about = page(&cms, "about");
    let blog = page(&cms, "blog");

    let moved = about.move_to(blog).unwrap();
    assert_eq!(moved.id().as_str(), "blog/about");
    assert_eq!(moved.title().unwrap(), "About");
    assert!(cms.page("about").unwrap().is_none());
    assert!(page(&cms, "blog").children().unwrap().has("blog/about"));
    assert!(!cms.site().children().unwrap().has("about"));
}

#[test]
fn test_move_slug_clash() {
    let cms = blog();
    cms.site().create_child(PageInput::new().slug("a")).unwrap();

    let err = page(&cms, "blog/a").move_to(cms.site()).unwrap_err();
    assert_eq!(err.key(), "error.page.duplicate");
}

#[test]
fn test_renaming_a_parent_keeps_descendants() {
    let cms = blog();
    let renamed = page(&cms, "blog/draft").change_slug("notes", None).unwrap();

    assert_eq!(renamed.id().as_str(), "blog/notes");
    assert_eq!(
        renamed.children_and_drafts().unwrap().first().unwrap().id().as_str(),
        "blog/notes/part"
    );
    assert!(cms.page("blog/draft/part").unwrap().is_none());
}

#[test]
fn test_changes_version_publish() {
    let cms = blog();
    let a = page(&cms, "blog/a");
    let language = cms.default_language();

    let changes = a.version(VersionId::Changes);
    changes
        .save(&fields_from([("title", "A (edited)")]), &language, false)
        .unwrap();
    assert!(changes.exists(&language).unwrap());
    assert_eq!(a.title().unwrap(), "A");

    changes.publish(&language).unwrap();
    assert!(!changes.exists(&language).unwrap());
    assert_eq!(a.title().unwrap(), "A (edited)");

    let err = a.version(VersionId::Latest).publish(&language).unwrap_err();
    assert_eq!(err.key(), "error.version.alreadyPublished");
}

#[test]
fn test_memory_storage_detaches_content() {
    let cms = blog();
    let a = page(&cms, "blog/a");

    let detached = a.change_storage(StorageKind::Memory).unwrap();
    let detached = detached.change_title("Preview", None).unwrap();

    assert_eq!(detached.title().unwrap(), "Preview");
    assert!(detached.has_custom_storage());
    assert_eq!(page(&cms, "blog/a").title().unwrap(), "A");
}

#[test]
fn test_translated_slugs() {
    let repository = InMemoryPageRepository::from_value_with_language(
        json!({
            "children": [
                {
                    "slug": "about",
                    "content": { "title": "About" },
                    "translations": { "de": { "title": "Über uns" } }
                }
            ]
        }),
        &LanguageCode::new("en").unwrap(),
    )
    .unwrap();
    let languages = Languages::new(vec![
        Language::new(LanguageCode::new("en").unwrap(), "English", true),
        Language::new(LanguageCode::new("de").unwrap(), "Deutsch", false),
    ])
    .unwrap();
    let cms = Cms::builder()
        .repository(repository)
        .languages(languages)
        .build()
        .unwrap();

    let de = LanguageCode::new("de").unwrap();
    let about = page(&cms, "about");

    let translated = about.change_slug("ueber-uns", Some("de")).unwrap();
    assert_eq!(translated.id().as_str(), "about");
    assert_eq!(translated.slug_for(&de).unwrap(), "ueber-uns");
    assert_eq!(
        translated.translation(&de).unwrap().content().get("title").map(String::as_str),
        Some("Über uns")
    );

    let err = translated.change_slug_for_language("x", "en").unwrap_err();
    assert_eq!(err.key(), "error.page.changeSlug.defaultLanguage");

    // setting the page slug itself as translation removes the override
    let reset = translated.change_slug_for_language("about", "de").unwrap();
    assert!(reset.translation(&de).unwrap().slug().is_none());

    cms.set_language(Some("de")).unwrap();
    assert_eq!(page(&cms, "about").title().unwrap(), "Über uns");
}

#[test]
fn test_create_nested_listed_page() {
    let cms = blog();
    let blog = page(&cms, "blog");

    let d = blog
        .create_child(PageInput::new().title("Fresh Post").draft(false).num(2))
        .unwrap();

    assert_eq!(d.id().as_str(), "blog/fresh-post");
    assert_eq!(d.num(), Some(2));
    assert_eq!(
        listing(&page(&cms, "blog").children().unwrap().listed()),
        owned(&[("a", Some(1)), ("fresh-post", Some(2)), ("b", Some(3)), ("c", Some(4))])
    );
}

fn keys(pages: &Pages) -> Vec<String> {
    pages.keys().map(|id| id.to_string()).collect()
}

fn assert_disjoint(parent: &ParentModel) {
    let children = parent.children().unwrap();
    let drafts = parent.drafts().unwrap();

    assert!(children.keys().all(|id| drafts.get(id).is_none()));

    let mut union = keys(&children);
    union.extend(keys(&drafts));
    assert_eq!(keys(&parent.children_and_drafts().unwrap()), union);
}

fn english_and_german() -> Languages {
    Languages::new(vec![
        Language::new(LanguageCode::new("en").unwrap(), "English", true),
        Language::new(LanguageCode::new("de").unwrap(), "Deutsch", false),
    ])
    .unwrap()
}

#[test]
fn test_create_num_clamps_positions() {
    let cms = blog();
    let archive = page(&cms, "blog/archive");

    assert_eq!(archive.create_num(None).unwrap(), 4);
    assert_eq!(archive.create_num(Some(2)).unwrap(), 2);
    assert_eq!(archive.create_num(Some(-1)).unwrap(), 1);
    assert_eq!(archive.create_num(Some(0)).unwrap(), 1);
    assert_eq!(archive.create_num(Some(99)).unwrap(), 4);

    // a listed page counts itself among the siblings
    assert_eq!(page(&cms, "blog/a").create_num(None).unwrap(), 3);
}

#[test]
fn test_change_sort_leaves_date_and_zero_pages_alone() {
    let repository = InMemoryPageRepository::from_value(json!({
        "children": [
            { "slug": "zero", "num": 0, "template": "pinned" },
            { "slug": "a", "num": 1 },
            { "slug": "b", "num": 2 },
            { "slug": "c", "num": 3 },
            {
                "slug": "dated",
                "num": 20180104,
                "template": "article",
                "content": { "date": "2018-01-04" }
            }
        ]
    }))
    .unwrap();
    let cms = Cms::builder()
        .repository(repository)
        .blueprint("pinned", Blueprint::with_num("zero"))
        .blueprint("article", Blueprint::with_num("date"))
        .build()
        .unwrap();

    let c = page(&cms, "c").change_sort(Some(1)).unwrap();
    assert_eq!(c.num(), Some(1));

    assert_eq!(
        listing(&cms.site().children().unwrap()),
        owned(&[
            ("zero", Some(0)),
            ("c", Some(1)),
            ("a", Some(2)),
            ("b", Some(3)),
            ("dated", Some(20180104)),
        ])
    );
}

#[test]
fn test_children_and_drafts_stay_disjoint() {
    let cms = blog();
    let blog = page(&cms, "blog");
    assert_disjoint(&ParentModel::Page(blog.clone()));

    let fresh = blog.create_child(PageInput::new().slug("fresh")).unwrap();
    assert_disjoint(&ParentModel::Page(page(&cms, "blog")));

    let fresh = fresh.publish().unwrap();
    assert_disjoint(&ParentModel::Page(page(&cms, "blog")));

    fresh.change_status(Status::Listed, Some(1)).unwrap();
    page(&cms, "blog/draft").change_status(Status::Unlisted, None).unwrap();
    assert_disjoint(&ParentModel::Page(page(&cms, "blog")));

    page(&cms, "blog/b").delete(false).unwrap();
    page(&cms, "blog/draft").delete(true).unwrap();
    assert_disjoint(&ParentModel::Page(page(&cms, "blog")));
    assert_disjoint(&ParentModel::Site(cms.site()));

    let blog = page(&cms, "blog");
    assert!(blog.drafts().unwrap().is_empty());
    assert_eq!(
        keys(&blog.children().unwrap()),
        vec!["blog/fresh", "blog/a", "blog/c", "blog/archive"]
    );
}

#[test]
fn test_change_storage_keeps_every_language() {
    let en = LanguageCode::new("en").unwrap();
    let repository = InMemoryPageRepository::from_value_with_language(
        json!({
            "children": [
                {
                    "slug": "about",
                    "content": { "title": "About", "text": "Hello" },
                    "translations": { "de": { "title": "Über uns", "text": "Hallo" } }
                }
            ]
        }),
        &en,
    )
    .unwrap();
    let cms = Cms::builder()
        .repository(repository)
        .languages(english_and_german())
        .build()
        .unwrap();

    let about = page(&cms, "about");
    let codes = cms.languages().codes();
    let before: Vec<_> = codes
        .iter()
        .map(|code| about.content_for(code).unwrap().to_map())
        .collect();

    let moved = about.change_storage(StorageKind::Memory).unwrap();
    let after: Vec<_> = codes
        .iter()
        .map(|code| moved.content_for(code).unwrap().to_map())
        .collect();

    assert_eq!(before, after);
    assert_eq!(after[1].get("text").map(String::as_str), Some("Hallo"));
}

#[test]
fn test_draft_publish_list_scenario() {
    let cms = Cms::in_memory().unwrap();
    let site = cms.site();

    let test = site.create_child(PageInput::new().slug("test")).unwrap();
    assert_eq!(test.status(), Status::Draft);
    assert_eq!(test.num(), None);
    assert!(site.drafts().unwrap().has("test"));
    assert!(!site.children().unwrap().has("test"));

    let test = test.publish().unwrap();
    assert_eq!(test.status(), Status::Unlisted);
    assert_eq!(test.num(), None);

    let test = test.change_status_str("listed", Some(1)).unwrap();
    assert_eq!(test.status(), Status::Listed);
    assert_eq!(test.num(), Some(1));
    assert!(site.children().unwrap().has("test"));
    assert!(!site.drafts().unwrap().has("test"));
}

#[test]
fn test_child_collections_are_memoized_until_purged() {
    let cms = blog();
    let blog = page(&cms, "blog");
    assert!(!blog.child_cache().is_built());

    let first = blog.children().unwrap();
    let second = blog.children().unwrap();
    assert!(blog.child_cache().is_built());
    assert!(first.same(&second));

    blog.purge();
    assert!(!blog.child_cache().is_built());

    let rebuilt = blog.children().unwrap();
    assert!(!first.same(&rebuilt));
    assert_eq!(keys(&first), keys(&rebuilt));
    assert!(rebuilt.get(&PageId::new("blog/a").unwrap()).is_some());
}

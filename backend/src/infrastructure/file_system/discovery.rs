/// Directory layout of a content tree: `N_slug` for listed pages, `slug` for
/// unlisted ones and `_drafts/slug` for drafts
use crate::infrastructure::storage::CHANGES_DIR;
use std::fs;
use std::path::{Path, PathBuf};

/// Directory holding the drafts of a page or the site
pub const DRAFTS_DIR: &str = "_drafts";

/// A page directory found on disk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageDir {
    pub path: PathBuf,
    pub slug: String,
    pub num: Option<i64>,
    pub is_draft: bool,
}

/// Split `3_blog` into `(Some(3), "blog")`; names without a numeric prefix
/// have no num
pub fn parse_dirname(name: &str) -> (Option<i64>, &str) {
    if let Some((prefix, slug)) = name.split_once('_') {
        if !prefix.is_empty() && !slug.is_empty() && prefix.chars().all(|c| c.is_ascii_digit()) {
            if let Ok(num) = prefix.parse() {
                return (Some(num), slug);
            }
        }
    }
    (None, name)
}

/// Directory name a page gets for its num and slug
pub fn dirname(num: Option<i64>, slug: &str) -> String {
    match num {
        Some(num) => format!("{}_{}", num, slug),
        None => slug.to_string(),
    }
}

/// Whether `name` is reserved for the layout itself
fn is_reserved(name: &str) -> bool {
    name.starts_with('_') || name.starts_with('.')
}

fn sorted_dirs(dir: &Path) -> Result<Vec<(String, PathBuf)>, std::io::Error> {
    if !dir.is_dir() {
        return Ok(Vec::new());
    }

    let mut dirs: Vec<(String, PathBuf)> = fs::read_dir(dir)?
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.path().is_dir())
        .filter_map(|entry| {
            let name = entry.file_name().to_str()?.to_string();
            Some((name, entry.path()))
        })
        .collect();
    dirs.sort();
    Ok(dirs)
}

/// Page directories directly below `dir`: published pages in name order,
/// then drafts in name order
pub fn discover_page_dirs(dir: &Path) -> Result<Vec<PageDir>, std::io::Error> {
    let mut pages = Vec::new();

    for (name, path) in sorted_dirs(dir)? {
        if is_reserved(&name) {
            continue;
        }
        let (num, slug) = parse_dirname(&name);
        pages.push(PageDir {
            slug: slug.to_string(),
            num,
            is_draft: false,
            path,
        });
    }

    for (name, path) in sorted_dirs(&dir.join(DRAFTS_DIR))? {
        if is_reserved(&name) {
            continue;
        }
        // drafts are never sorted; a stray prefix is dropped
        let (_, slug) = parse_dirname(&name);
        pages.push(PageDir {
            slug: slug.to_string(),
            num: None,
            is_draft: true,
            path,
        });
    }

    Ok(pages)
}

/// Whether a `.txt` file describes another file (`cover.jpg.txt`)
fn is_meta_file(dir: &Path, name: &str) -> bool {
    name.strip_suffix(".txt")
        .map(|stem| dir.join(stem).is_file())
        .unwrap_or(false)
}

/// Content files (`<template>.txt`, `<template>.<lang>.txt`) of a page directory
pub fn content_files(dir: &Path) -> Result<Vec<String>, std::io::Error> {
    let mut names: Vec<String> = list_entries(dir)?
        .into_iter()
        .filter(|name| name.ends_with(".txt") && !is_meta_file(dir, name))
        .collect();
    names.sort();
    Ok(names)
}

/// Template named by the first content file of a page directory
pub fn detect_template(dir: &Path, multilang: bool) -> Result<Option<String>, std::io::Error> {
    Ok(content_files(dir)?.into_iter().next().map(|name| {
        let stem = name.trim_end_matches(".txt");
        if multilang {
            stem.rsplit_once('.')
                .map(|(template, _)| template.to_string())
                .unwrap_or_else(|| stem.to_string())
        } else {
            stem.to_string()
        }
    }))
}

/// Attached files of a page directory: everything but content files, in name order
pub fn page_files(dir: &Path) -> Result<Vec<String>, std::io::Error> {
    let mut names: Vec<String> = list_entries(dir)?
        .into_iter()
        .filter(|name| !name.ends_with(".txt") && !name.starts_with('.'))
        .collect();
    names.sort();
    Ok(names)
}

fn list_entries(dir: &Path) -> Result<Vec<String>, std::io::Error> {
    if !dir.is_dir() {
        return Ok(Vec::new());
    }
    Ok(fs::read_dir(dir)?
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.path().is_file())
        .filter_map(|entry| entry.file_name().to_str().map(str::to_string))
        .collect())
}

/// What a page directory copy takes along
#[derive(Debug, Clone, Copy, Default)]
pub struct CopyScope {
    pub children: bool,
    pub files: bool,
}

/// Copy a page directory: content files and `_changes` always, attached
/// files and subpages as requested
pub fn copy_page_dir(src: &Path, dst: &Path, scope: CopyScope) -> Result<(), std::io::Error> {
    fs::create_dir_all(dst)?;

    for entry in fs::read_dir(src)? {
        let entry = entry?;
        let path = entry.path();
        let Some(name) = entry.file_name().to_str().map(str::to_string) else {
            continue;
        };

        if path.is_dir() {
            if name == CHANGES_DIR {
                copy_tree(&path, &dst.join(&name))?;
            } else if name == DRAFTS_DIR {
                if scope.children {
                    for (draft, draft_path) in sorted_dirs(&path)? {
                        copy_page_dir(&draft_path, &dst.join(DRAFTS_DIR).join(draft), scope)?;
                    }
                }
            } else if scope.children && !is_reserved(&name) {
                copy_page_dir(&path, &dst.join(&name), scope)?;
            }
        } else if scope.files || (name.ends_with(".txt") && !is_meta_file(src, &name)) {
            fs::copy(&path, dst.join(&name))?;
        }
    }
    Ok(())
}

fn copy_tree(src: &Path, dst: &Path) -> Result<(), std::io::Error> {
    fs::create_dir_all(dst)?;
    for entry in fs::read_dir(src)? {
        let entry = entry?;
        let path = entry.path();
        let target = dst.join(entry.file_name());
        if path.is_dir() {
            copy_tree(&path, &target)?;
        } else {
            fs::copy(&path, &target)?;
        }
    }
    Ok(())
}

/// Remove `dir` if it is a drafts directory that became empty
pub fn prune_drafts_dir(dir: &Path) -> Result<(), std::io::Error> {
    let is_drafts = dir.file_name().and_then(|name| name.to_str()) == Some(DRAFTS_DIR);
    if is_drafts && dir.is_dir() && fs::read_dir(dir)?.next().is_none() {
        fs::remove_dir(dir)?;
    }
    Ok(())
}

//! Command line entry point: print a content tree and optionally keep its
//! caches in sync with edits on disk.

use anyhow::{bail, Result};
use clap::Parser;
use pagetree::application::services::{CacheSyncService, SyncEvent};
use pagetree::application::{BackendConfig, Cms, CmsConfig};
use pagetree::domain::{Page, Pages, Site};
use std::io::{self, Write};
use std::path::PathBuf;
use std::rc::Rc;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(version, about = "Inspect a page tree", long_about = None)]
struct Cli {
    /// Content directory; overrides the backend from the config file
    root: Option<PathBuf>,

    /// JSON config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Keep running and refresh cached listings when files change
    #[arg(short, long)]
    watch: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => CmsConfig::from_path(path)?,
        None => CmsConfig::default(),
    };
    if let Some(root) = &cli.root {
        config.backend = BackendConfig::FileSystem { root: root.clone() };
    }

    let backend = config.backend.clone();
    let debounce = config.watch_debounce();
    let cms = Cms::builder().config(config).build()?;

    print_tree(&cms.site(), &mut io::stdout().lock())?;

    if cli.watch {
        let BackendConfig::FileSystem { root } = backend else {
            bail!("--watch needs a file_system backend");
        };

        let service = CacheSyncService::new(cms.site(), &root, Some(debounce))?;
        let site = cms.site();
        service.run(Some(Rc::new(move |event: SyncEvent| {
            if let SyncEvent::SyncCompleted(stats) = event {
                tracing::info!("{} modified, {} deleted", stats.modified, stats.deleted);
                if let Err(e) = print_tree(&site, &mut io::stdout().lock()) {
                    tracing::warn!("Failed to print content tree: {}", e);
                }
            }
        })))?;
    }

    Ok(())
}

/// One line per page and draft, children indented below their parent
fn print_tree(site: &Site, out: &mut impl Write) -> Result<()> {
    print_pages(&site.children_and_drafts()?, 0, out)
}

fn print_pages(pages: &Pages, depth: usize, out: &mut impl Write) -> Result<()> {
    for page in pages.iter() {
        print_page(page, depth, out)?;
    }
    Ok(())
}

fn print_page(page: &Page, depth: usize, out: &mut impl Write) -> Result<()> {
    let num = page.num().map(|num| format!("{}. ", num)).unwrap_or_default();
    writeln!(
        out,
        "{}{}{} [{}] {}",
        "  ".repeat(depth),
        num,
        page.slug(),
        page.status(),
        page.title()?
    )?;
    print_pages(&page.children_and_drafts()?, depth + 1, out)
}

//! Tag index plugin.
//!
//! Collects the tags of every processed page and, before writing, injects
//! one synthetic list-page node per tag under `/tags/<tag>`. The injected
//! nodes render exactly like ordinary list pages, so tag index pages come
//! for free from the writer.
//!
//! `process_page` runs concurrently from the worker pool; the collected
//! index is guarded by a mutex and only read back in the single-threaded
//! `pre_write` hook.

use crate::builder;
use crate::model::{Page, Site};
use crate::pipeline::{CollaboratorError, Plugin};
use crate::tree;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

pub const KEY: &str = "tags";

/// Route the tag index pages are injected under.
pub const TAGS_ROUTE: &str = "/tags";

#[derive(Default)]
pub struct Tags {
    index: Mutex<BTreeMap<String, Vec<Arc<Page>>>>,
}

impl Tags {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Plugin for Tags {
    fn key(&self) -> &'static str {
        KEY
    }

    fn process_page(&self, page: &Arc<Page>) -> Result<(), CollaboratorError> {
        if page.hidden || page.tags.is_empty() {
            return Ok(());
        }

        let mut index = self.index.lock().map_err(|_| "tag index lock poisoned")?;
        for tag in &page.tags {
            index
                .entry(tag.name.to_lowercase())
                .or_default()
                .push(Arc::clone(page));
        }

        Ok(())
    }

    fn pre_write(&self, site: &mut Site) -> Result<(), CollaboratorError> {
        let mut index = self.index.lock().map_err(|_| "tag index lock poisoned")?;
        if index.is_empty() {
            return Ok(());
        }

        let tags_node = tree::resolve_or_init_node(TAGS_ROUTE, &mut site.root)?;
        tags_node.value.list_page.route = TAGS_ROUTE.to_owned();
        tags_node.value.list_page.page.title = "Tags".to_owned();

        for (tag, mut pages) in std::mem::take(&mut *index) {
            pages.sort_unstable_by(builder::compare_pages);

            let route = format!("{TAGS_ROUTE}/{tag}");
            let node = tree::resolve_or_init_node(&route, &mut site.root)?;
            node.value.list_page.route.clone_from(&route);
            node.value.list_page.page.route = route;
            node.value.list_page.page.title = tag;
            node.value.list_page.pages = pages;
        }

        Ok(())
    }
}

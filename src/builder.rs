//! Thread-safe site model builder.
//!
//! The builder is the façade between concurrent pipeline workers and the
//! shared route tree: [`Builder::register_page`] resolves-or-creates the
//! node for a page's route and records the page there, and
//! [`Builder::dispatch`] finalizes the model into an immutable
//! [`Site`](crate::model::Site) once all registrations are done.
//!
//! ## Locking
//!
//! One coarse mutex guards the whole tree. A registration is a node lookup
//! plus a handful of vector pushes, so contention is cheap to serialize and
//! fine-grained per-node locking buys nothing here. Dispatch takes the
//! builder by value — the type system enforces that nothing registers after
//! finalization and that dispatch runs at most once.

use crate::config::Config;
use crate::model::{Footer, Meta, Nav, Page, Site};
use crate::tree::{self, TreeError};
use std::cmp::Ordering;
use std::sync::{Arc, Mutex};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BuilderError {
    #[error(transparent)]
    Tree(#[from] TreeError),
    #[error("site model lock poisoned by a panicked worker")]
    Poisoned,
}

/// Maintains the site model during a build. Safe to share across worker
/// threads by reference.
pub struct Builder {
    state: Mutex<State>,
}

struct State {
    site: Site,
    meta: Meta,
    nav: Nav,
    footer: Footer,
}

impl Builder {
    pub fn new(config: &Config) -> Self {
        Self {
            state: Mutex::new(State {
                site: Site::default(),
                meta: config.site.meta.clone(),
                nav: config.site.nav.clone(),
                footer: config.site.footer.clone(),
            }),
        }
    }

    /// Registers a page under its route, creating the route's node and any
    /// missing ancestors on first use.
    ///
    /// An index page (`id == "index"`) overwrites its node's list-page
    /// content. Any other page is appended to the node's page list and
    /// referenced in the list-page aggregation of the node and of every
    /// ancestor up to the root. Returns the stable handle under which the
    /// page was registered.
    ///
    /// Safe for concurrent invocation; registrations for the same route
    /// serialize on the internal lock.
    pub fn register_page(&self, page: Page) -> Result<Arc<Page>, BuilderError> {
        let mut state = self.state.lock().map_err(|_| BuilderError::Poisoned)?;

        let route = page.route.clone();
        let page = Arc::new(page);

        let node = tree::resolve_or_init_node(&route, &mut state.site.root)?;

        if page.is_index_page() {
            node.value.list_page.page = (*page).clone();
            return Ok(page);
        }

        node.value.pages.push(Arc::clone(&page));

        if node.value.list_page.route.is_empty() {
            node.value.list_page.route = route.clone();
        }

        // Reference the page in the aggregation of its own node and of
        // every ancestor along the route.
        tree::walk_path_mut(&route, &mut state.site.root, &mut |node| {
            node.value.list_page.pages.push(Arc::clone(&page));
        })?;

        Ok(page)
    }

    /// Finishes the model build and returns the site.
    ///
    /// Attaches the global site metadata from the configuration and sorts
    /// every node's list-page references by descending date, undated pages
    /// last, ties broken by page id so the presentation order is fully
    /// deterministic regardless of registration order.
    pub fn dispatch(self) -> Result<Site, BuilderError> {
        let state = self.state.into_inner().map_err(|_| BuilderError::Poisoned)?;

        let mut site = state.site;
        site.meta = state.meta;
        site.nav = state.nav;
        site.footer = state.footer;

        tree::walk_mut(
            &mut site.root,
            &mut |node| {
                node.value.list_page.pages.sort_by(compare_pages);
                Ok::<(), TreeError>(())
            },
            -1,
        )?;

        Ok(site)
    }
}

pub(crate) fn compare_pages(a: &Arc<Page>, b: &Arc<Page>) -> Ordering {
    match (a.date, b.date) {
        (Some(a_date), Some(b_date)) => b_date.cmp(&a_date).then_with(|| a.id.cmp(&b.id)),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => a.id.cmp(&b.id),
    }
}

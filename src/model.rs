//! Site model types.
//!
//! The model is the only interchange format between the build stages: the
//! parser produces [`Page`]s, the builder registers them into a route tree
//! of [`NodeData`] payloads, and dispatch turns the finished tree into an
//! immutable [`Site`] that the writer renders.
//!
//! Registered pages are held as `Arc<Page>`: the owning node keeps one
//! handle in its page list, and each list-page aggregation up the route
//! holds a clone. The handles stay valid no matter how the surrounding
//! collections grow, and they are cheap to share with plugins.

use crate::tree;
use chrono::NaiveDate;
use serde::Deserialize;
use std::sync::Arc;

/// Page id reserved for a node's index page. A content file named
/// `index.md` supplies the overview content for its containing node
/// instead of becoming an ordinary page.
pub const INDEX_PAGE_ID: &str = "index";

/// One content unit of the website.
///
/// Created by the parser from file bytes, assigned its route and id by the
/// pipeline, registered into exactly one tree node, and never mutated
/// afterwards.
#[derive(Debug, Clone, Default)]
pub struct Page {
    /// Route of the node this page is registered under, e.g. `/blog`.
    pub route: String,
    /// Page id derived from the source filename, e.g. `making-espresso`.
    pub id: String,
    /// Canonical link target, `<route>/<id>`.
    pub href: String,
    pub title: String,
    pub author: String,
    pub date: Option<NaiveDate>,
    pub tags: Vec<Tag>,
    pub image: String,
    pub credit: String,
    pub description: String,
    /// Rendered HTML body.
    pub content: String,
    /// Hidden pages are registered and rendered but kept out of feeds.
    pub hidden: bool,
    /// Names of related pages as provided in the source file. Resolution
    /// into links is plugin territory, not the core's.
    pub provided_related: Vec<String>,
    /// Page type name as provided in the source file, resolved against the
    /// configured type table during registration.
    pub provided_type: Option<String>,
    pub page_type: Option<PageType>,
}

impl Page {
    /// Whether this page is its node's designated index page.
    pub fn is_index_page(&self) -> bool {
        self.id == INDEX_PAGE_ID
    }
}

/// A tag attached to a page, with its tag-index link target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tag {
    pub name: String,
    pub href: String,
}

/// A page type declared in the configuration, selecting a template.
///
/// The core only validates the declaration and attaches it to the page;
/// the template name is carried for writers and plugins that render
/// per-type layouts. The built-in writer uses one layout for every page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PageType {
    pub template: String,
}

/// Aggregation record for overview rendering, kept on every tree node.
///
/// `pages` holds references to every page registered at this node or
/// anywhere beneath it — an index page shows all pages beneath it. `page`
/// carries the overview content itself, overwritten by the node's
/// `index.md` if one exists.
#[derive(Debug, Clone, Default)]
pub struct ListPage {
    pub page: Page,
    pub pages: Vec<Arc<Page>>,
    pub route: String,
}

/// Payload of one route tree node: the pages owned by the node plus its
/// list-page aggregation.
#[derive(Debug, Default)]
pub struct NodeData {
    pub pages: Vec<Arc<Page>>,
    pub list_page: ListPage,
}

/// A node of the site's route tree.
pub type SiteNode = tree::Node<NodeData>;

/// The finished website: global metadata plus the populated route tree.
/// Created once per build at dispatch and read-only from that point.
#[derive(Debug, Default)]
pub struct Site {
    pub meta: Meta,
    pub nav: Nav,
    pub footer: Footer,
    pub root: SiteNode,
}

/// Global metadata for the website.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Meta {
    pub title: String,
    pub subtitle: String,
    pub description: String,
    pub author: String,
    /// Base URL the site will be served from.
    pub base: String,
}

/// The website's navigation.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Nav {
    pub items: Vec<NavItem>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct NavItem {
    pub label: String,
    pub target: String,
}

/// The website's footer.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Footer {
    pub items: Vec<FooterItem>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FooterItem {
    pub label: String,
    pub target: String,
}

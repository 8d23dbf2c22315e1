//! HTML site writer.
//!
//! Implements the pipeline's [`Writer`](crate::pipeline::Writer) contract:
//! renders the finished site model into a directory of static HTML using
//! [maud](https://maud.lambda.xyz/) compile-time templates, so malformed
//! markup is a compile error and interpolation is escaped by default.
//!
//! ## Output structure
//!
//! Every tree node becomes a directory containing an `index.html` rendered
//! from its list page, and every page registered at the node becomes
//! `<id>/index.html` beneath it:
//!
//! ```text
//! public/
//! ├── index.html                 # root list page
//! ├── about/index.html           # page at route /
//! └── blog/
//!     ├── index.html             # list page for /blog
//!     └── making-espresso/
//!         └── index.html         # page at route /blog
//! ```
//!
//! The writer owns the output directory lifecycle: it removes a stale
//! output directory and recreates it. The pipeline only ever invokes it
//! after the build has been judged clean, so a failed build never touches
//! prior output.

use crate::model::{Page, Site, SiteNode};
use crate::pipeline::{CollaboratorError, Writer};
use maud::{DOCTYPE, Markup, PreEscaped, html};
use std::fs;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum WriteError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

const CSS: &str = "\
body { max-width: 42rem; margin: 0 auto; padding: 1rem; font-family: serif; }
header nav a { margin-right: 0.75rem; }
footer { margin-top: 3rem; border-top: 1px solid #ccc; }
.page-meta { color: #666; }
";

/// Renders a site model as static HTML into an output directory.
pub struct HtmlWriter {
    output_dir: PathBuf,
}

impl HtmlWriter {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    fn write_site(&self, site: &Site) -> Result<(), WriteError> {
        if self.output_dir.exists() {
            fs::remove_dir_all(&self.output_dir)?;
        }
        fs::create_dir_all(&self.output_dir)?;

        self.write_node(&site.root, "/", site)
    }

    fn write_node(&self, node: &SiteNode, route: &str, site: &Site) -> Result<(), WriteError> {
        let dir = self.output_dir.join(route.trim_start_matches('/'));
        fs::create_dir_all(&dir)?;

        let list = render_list_page(site, route, node);
        fs::write(dir.join("index.html"), list.into_string())?;

        for page in &node.value.pages {
            let page_dir = dir.join(&page.id);
            fs::create_dir_all(&page_dir)?;
            let rendered = render_page(site, page);
            fs::write(page_dir.join("index.html"), rendered.into_string())?;
        }

        for (edge, child) in node.children() {
            let child_route = if route == "/" {
                format!("/{edge}")
            } else {
                format!("{route}/{edge}")
            };
            self.write_node(child, &child_route, site)?;
        }

        Ok(())
    }
}

impl Writer for HtmlWriter {
    fn write(&self, site: &Site) -> Result<(), CollaboratorError> {
        Ok(self.write_site(site)?)
    }
}

// ============================================================================
// HTML components
// ============================================================================

fn base_document(site: &Site, title: &str, content: Markup) -> Markup {
    let full_title = if title.is_empty() {
        site.meta.title.clone()
    } else {
        format!("{} — {}", title, site.meta.title)
    };

    html! {
        (DOCTYPE)
        html lang="en" {
            head {
                meta charset="UTF-8";
                meta name="viewport" content="width=device-width, initial-scale=1.0";
                @if !site.meta.description.is_empty() {
                    meta name="description" content=(site.meta.description);
                }
                title { (full_title) }
                style { (PreEscaped(CSS)) }
            }
            body {
                (site_header(site))
                main { (content) }
                (site_footer(site))
            }
        }
    }
}

fn site_header(site: &Site) -> Markup {
    html! {
        header {
            a href="/" { (site.meta.title) }
            @if !site.meta.subtitle.is_empty() {
                p { (site.meta.subtitle) }
            }
            nav {
                @for item in &site.nav.items {
                    a href=(item.target) { (item.label) }
                }
            }
        }
    }
}

fn site_footer(site: &Site) -> Markup {
    html! {
        footer {
            @for item in &site.footer.items {
                a href=(item.target) { (item.label) }
            }
        }
    }
}

fn render_page(site: &Site, page: &Page) -> Markup {
    base_document(
        site,
        &page.title,
        html! {
            article {
                h1 { (page.title) }
                p.page-meta {
                    @if !page.author.is_empty() { (page.author) " " }
                    @if let Some(date) = page.date { time { (date) } }
                }
                @if !page.image.is_empty() {
                    figure {
                        img src=(page.image) alt=(page.title);
                        @if !page.credit.is_empty() { figcaption { (page.credit) } }
                    }
                }
                (PreEscaped(page.content.clone()))
                @if !page.tags.is_empty() {
                    p.tags {
                        @for tag in &page.tags {
                            a href=(tag.href) { "#" (tag.name) " " }
                        }
                    }
                }
            }
        },
    )
}

fn render_list_page(site: &Site, route: &str, node: &SiteNode) -> Markup {
    let list_page = &node.value.list_page;
    let title = if list_page.page.title.is_empty() {
        route.trim_start_matches('/').to_owned()
    } else {
        list_page.page.title.clone()
    };

    base_document(
        site,
        &title,
        html! {
            section {
                @if !title.is_empty() { h1 { (title) } }
                @if !list_page.page.content.is_empty() {
                    (PreEscaped(list_page.page.content.clone()))
                }
                ul {
                    @for page in list_page.pages.iter().filter(|p| !p.hidden) {
                        li {
                            a href=(page.href) { (page.title) }
                            @if let Some(date) = page.date {
                                " " time { (date) }
                            }
                        }
                    }
                }
            }
        },
    )
}

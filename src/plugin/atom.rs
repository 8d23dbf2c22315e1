//! Atom feed plugin.
//!
//! Collects every visible, non-index page during processing and writes an
//! [RFC 4287](https://www.rfc-editor.org/rfc/rfc4287) Atom feed to
//! `atom.xml` in the output directory. The feed is written in the
//! `post_write` hook so it only ever appears next to a fully written site.
//!
//! Serialization uses quick-xml's event writer rather than string
//! concatenation, so titles and summaries are escaped correctly.

use crate::builder;
use crate::model::{Meta, Page};
use crate::pipeline::{CollaboratorError, Plugin};
use quick_xml::Writer as XmlWriter;
use quick_xml::events::{BytesDecl, BytesText, Event};
use std::fs;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

pub const KEY: &str = "atom";

const FEED_FILE: &str = "atom.xml";
const ATOM_NS: &str = "http://www.w3.org/2005/Atom";
const EPOCH: &str = "1970-01-01T00:00:00Z";

pub struct Atom {
    meta: Meta,
    output_dir: PathBuf,
    pages: Mutex<Vec<Arc<Page>>>,
}

impl Atom {
    pub fn new(meta: &Meta, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            meta: meta.clone(),
            output_dir: output_dir.into(),
            pages: Mutex::new(Vec::new()),
        }
    }

    fn render_feed(&self, pages: &[Arc<Page>]) -> Result<Vec<u8>, CollaboratorError> {
        let mut writer = XmlWriter::new_with_indent(Vec::new(), b' ', 2);

        writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;

        let feed_updated = pages
            .iter()
            .filter_map(|p| p.date)
            .max()
            .map_or_else(|| EPOCH.to_owned(), timestamp);

        writer
            .create_element("feed")
            .with_attribute(("xmlns", ATOM_NS))
            .write_inner_content(|feed| -> std::io::Result<()> {
                feed.create_element("title")
                    .write_text_content(BytesText::new(&self.meta.title))?;
                feed.create_element("id")
                    .write_text_content(BytesText::new(&self.meta.base))?;
                feed.create_element("updated")
                    .write_text_content(BytesText::new(&feed_updated))?;
                feed.create_element("link")
                    .with_attribute(("href", self.meta.base.as_str()))
                    .write_empty()?;
                feed.create_element("author")
                    .write_inner_content(|author| -> std::io::Result<()> {
                        author
                            .create_element("name")
                            .write_text_content(BytesText::new(&self.meta.author))?;
                        Ok(())
                    })?;

                for page in pages {
                    let link = format!("{}{}", self.meta.base, page.href);
                    let updated = page.date.map_or_else(|| EPOCH.to_owned(), timestamp);

                    feed.create_element("entry")
                        .write_inner_content(|entry| -> std::io::Result<()> {
                            entry
                                .create_element("title")
                                .write_text_content(BytesText::new(&page.title))?;
                            entry
                                .create_element("id")
                                .write_text_content(BytesText::new(&link))?;
                            entry
                                .create_element("link")
                                .with_attribute(("href", link.as_str()))
                                .write_empty()?;
                            entry
                                .create_element("updated")
                                .write_text_content(BytesText::new(&updated))?;
                            if !page.description.is_empty() {
                                entry
                                    .create_element("summary")
                                    .write_text_content(BytesText::new(&page.description))?;
                            }
                            Ok(())
                        })?;
                }

                Ok(())
            })?;

        Ok(writer.into_inner())
    }
}

fn timestamp(date: chrono::NaiveDate) -> String {
    format!("{}T00:00:00Z", date.format("%Y-%m-%d"))
}

impl Plugin for Atom {
    fn key(&self) -> &'static str {
        KEY
    }

    fn process_page(&self, page: &Arc<Page>) -> Result<(), CollaboratorError> {
        if page.hidden || page.is_index_page() {
            return Ok(());
        }

        self.pages
            .lock()
            .map_err(|_| "feed page list lock poisoned")?
            .push(Arc::clone(page));

        Ok(())
    }

    fn post_write(&self) -> Result<(), CollaboratorError> {
        let mut pages = std::mem::take(
            &mut *self.pages.lock().map_err(|_| "feed page list lock poisoned")?,
        );
        pages.sort_unstable_by(builder::compare_pages);

        let feed = self.render_feed(&pages)?;
        fs::write(self.output_dir.join(FEED_FILE), feed)?;

        Ok(())
    }
}

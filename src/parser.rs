//! Markdown page parser.
//!
//! Implements the pipeline's [`Parser`](crate::pipeline::Parser) contract
//! for Markdown content files with optional TOML front matter:
//!
//! ```text
//! +++
//! title = "Making Espresso"
//! author = "J. Doe"
//! date = "2020-06-01"
//! tags = ["Coffee", "Espresso"]
//! description = "Barista-quality espresso at home"
//! related = ["choosing-a-grinder"]
//! type = "post"
//! +++
//!
//! # Making Espresso
//! ...
//! ```
//!
//! Everything between the `+++` fences is deserialized with serde; the
//! remainder is rendered to HTML with pulldown-cmark. All front matter
//! fields are optional, and a file without fences is pure content. The
//! parser never sees the page's eventual route or id — the pipeline
//! assigns those from the file's location.

use crate::model::{Page, Tag};
use crate::pipeline::{CollaboratorError, Parser};
use chrono::NaiveDate;
use pulldown_cmark::{Options, Parser as CmarkParser, html};
use serde::Deserialize;
use thiserror::Error;

/// Date format expected in the `date` front matter field.
const DATE_FORMAT: &str = "%Y-%m-%d";

const FENCE: &str = "+++";

#[derive(Error, Debug)]
pub enum ParseError {
    #[error("content is not valid UTF-8: {0}")]
    Utf8(#[from] std::str::Utf8Error),
    #[error("front matter: {0}")]
    FrontMatter(#[from] toml::de::Error),
    #[error("unclosed front matter fence")]
    UnclosedFrontMatter,
    #[error("invalid date {0:?}, expected YYYY-MM-DD")]
    InvalidDate(String),
}

/// Front matter fields, all optional.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct FrontMatter {
    title: String,
    author: String,
    date: Option<String>,
    tags: Vec<String>,
    image: String,
    credit: String,
    description: String,
    related: Vec<String>,
    #[serde(rename = "type")]
    page_type: Option<String>,
    hidden: bool,
}

/// Markdown parser, stateless and safe for concurrent use.
#[derive(Debug, Default)]
pub struct Markdown;

impl Markdown {
    pub fn new() -> Self {
        Self
    }

    fn parse(&self, src: &[u8]) -> Result<Page, ParseError> {
        let text = std::str::from_utf8(src)?;
        let (matter, body) = split_front_matter(text)?;

        let matter: FrontMatter = match matter {
            Some(raw) => toml::from_str(raw)?,
            None => FrontMatter::default(),
        };

        let date = matter
            .date
            .map(|raw| {
                NaiveDate::parse_from_str(&raw, DATE_FORMAT)
                    .map_err(|_| ParseError::InvalidDate(raw))
            })
            .transpose()?;

        let tags = matter
            .tags
            .into_iter()
            .map(|name| Tag {
                href: format!("/tags/{}", name.to_lowercase()),
                name,
            })
            .collect();

        Ok(Page {
            title: matter.title,
            author: matter.author,
            date,
            tags,
            image: matter.image,
            credit: matter.credit,
            description: matter.description,
            content: render_markdown(body),
            hidden: matter.hidden,
            provided_related: matter.related,
            provided_type: matter.page_type,
            ..Page::default()
        })
    }
}

impl Parser for Markdown {
    fn parse_page(&self, src: &[u8]) -> Result<Page, CollaboratorError> {
        Ok(self.parse(src)?)
    }
}

/// Splits a document into its front matter (without fences) and body.
fn split_front_matter(text: &str) -> Result<(Option<&str>, &str), ParseError> {
    let Some(rest) = text.strip_prefix(FENCE) else {
        return Ok((None, text));
    };
    // The opening fence must be a full line on its own.
    let Some(rest) = rest.strip_prefix('\n').or_else(|| rest.strip_prefix("\r\n")) else {
        return Ok((None, text));
    };

    let closing = format!("\n{FENCE}");
    let end = rest.find(&closing).ok_or(ParseError::UnclosedFrontMatter)?;

    let matter = &rest[..end];
    let body = rest[end + closing.len()..].trim_start_matches(['\r', '\n']);

    Ok((Some(matter), body))
}

fn render_markdown(body: &str) -> String {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_STRIKETHROUGH);

    let parser = CmarkParser::new_ext(body, options);
    let mut rendered = String::new();
    html::push_html(&mut rendered, parser);
    rendered
}

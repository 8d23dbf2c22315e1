//! # Sitewright
//!
//! A concurrent static site generator. Your filesystem is the data source:
//! the directory layout of your content becomes the site's route tree, and
//! every Markdown file becomes a page registered at its route.
//!
//! # Architecture: Producer / Workers / Dispatch
//!
//! A build is one pass over the content directory, fanned out across a
//! fixed worker pool and collected into a single immutable site model:
//!
//! ```text
//! discover   content/  →  file channel        (one walker thread)
//! process    file      →  parse + register    (4 workers, shared channel)
//! dispatch   builder   →  Site                (single-threaded finalize)
//! write      Site      →  public/             (HTML writer + plugins)
//! ```
//!
//! Errors never abort the pass: every failing file is recorded and the
//! batch keeps going, so one bad front matter block reports alongside all
//! the others instead of hiding them. A build with any error writes
//! nothing.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`tree`] | Generic route tree — path resolution, traversal, node injection |
//! | [`model`] | Shared site model (`Page`, `Site`, list pages) produced by a build |
//! | [`builder`] | Thread-safe page registration and site finalization |
//! | [`discover`] | Content directory walking with composable file filters |
//! | [`parser`] | Markdown with TOML front matter → [`model::Page`] |
//! | [`pipeline`] | Build orchestration — worker pool, error collection, hooks |
//! | [`writer`] | Maud HTML rendering of the finished site |
//! | [`plugin`] | Optional build extensions: tag index pages, Atom feed |
//! | [`config`] | `config.toml` loading and validation |
//!
//! # Design Decisions
//!
//! ## Routes Are a Tree, Not a Map
//!
//! Pages live in a tree keyed by path segment rather than a flat
//! route-to-page map. List pages fall out naturally: every node aggregates
//! the pages beneath it, so section overviews and the root index are the
//! same rendering code. Plugins inject synthetic sections (like `/tags`)
//! with the same node operations the builder uses.
//!
//! ## Pages Are Shared, Never Moved
//!
//! A registered page is wrapped in an `Arc` once and referenced from its
//! node, from every ancestor's list page, and from any plugin that wants
//! it. Aggregations hold handles, not copies, so the model stays
//! consistent no matter how collections grow during registration.
//!
//! ## Maud Over Template Engines
//!
//! HTML is generated with [Maud](https://maud.lambda.xyz/), a compile-time
//! HTML macro system: malformed markup is a build error, interpolation is
//! auto-escaped, and there is no template directory to ship.

pub mod builder;
pub mod config;
pub mod discover;
pub mod model;
pub mod parser;
pub mod pipeline;
pub mod plugin;
pub mod tree;
pub mod writer;

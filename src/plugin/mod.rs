//! Build plugins.
//!
//! Plugins extend a build without touching the core pipeline: they observe
//! every registered page, may inject nodes into the finished site before
//! it is written, and may run side effects after it is on disk. Which
//! plugins run is declared in the project configuration by key.
//!
//! | Key    | Plugin            | Effect                                |
//! |--------|-------------------|---------------------------------------|
//! | `tags` | [`tags::Tags`]    | Tag index pages under `/tags/<tag>`   |
//! | `atom` | [`atom::Atom`]    | Atom feed at `<output>/atom.xml`      |

pub mod atom;
pub mod tags;

pub use atom::Atom;
pub use tags::Tags;

use crate::config::Config;
use crate::pipeline::Plugin;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PluginError {
    #[error("unknown plugin '{0}', available plugins are 'tags' and 'atom'")]
    Unknown(String),
}

/// Instantiates the plugins named in the configuration, in declaration
/// order. Unknown keys fail the whole build up front rather than being
/// silently skipped.
pub fn from_config(config: &Config, output_dir: &Path) -> Result<Vec<Box<dyn Plugin>>, PluginError> {
    config
        .plugins
        .iter()
        .map(|key| -> Result<Box<dyn Plugin>, PluginError> {
            match key.as_str() {
                tags::KEY => Ok(Box::new(Tags::new())),
                atom::KEY => Ok(Box::new(Atom::new(&config.site.meta, output_dir))),
                other => Err(PluginError::Unknown(other.to_owned())),
            }
        })
        .collect()
}

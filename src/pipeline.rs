//! Concurrent build pipeline.
//!
//! [`run`] drives a whole build as one blocking call:
//!
//! 1. A producer thread walks the content directory and streams matching
//!    file paths into a work channel.
//! 2. A fixed pool of [`PARALLELISM`] workers drains the channel. Each file
//!    is read, parsed into a page, assigned its route and id, type-checked
//!    against the configured type table, registered in the shared builder,
//!    and handed to every plugin's per-page hook.
//! 3. Errors from any step are sent on a shared error channel and collected
//!    on the calling thread. They are per-file: the worker reports and
//!    moves on to the next file.
//! 4. Only if zero errors were collected, the builder dispatches the
//!    finished site, pre-write hooks run (they may still extend the tree),
//!    the writer renders it, and post-write hooks run last.
//!
//! A build with any collected error returns the whole set as
//! [`BuildErrors`] and never dispatches or renders — a half-registered tree
//! is never written.
//!
//! ## Cancellation
//!
//! There is none. Once an error is observed, in-flight workers still drain
//! the file channel naturally (producer drops the sender, workers exit on
//! the closed channel), so nobody ever needs a second signal to tell "done"
//! from "cancelled".

use crate::builder::{Builder, BuilderError};
use crate::config::CONTENT_DIR;
use crate::discover::{self, FileFilter};
use crate::model::{Page, PageType, Site};
use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::sync::{Arc, Mutex};
use std::thread;
use thiserror::Error;

/// Number of processing workers. A small fixed pool: registration is
/// lock-bound, so throughput stops scaling well beyond this.
pub const PARALLELISM: usize = 4;

/// Opaque error produced by a collaborator. The pipeline aggregates these;
/// it never inspects them.
pub type CollaboratorError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Converts raw file bytes into a page. The page's route and id are
/// assigned afterwards by the pipeline; the parser never sees them.
pub trait Parser: Sync {
    /// Must be safe for concurrent invocation.
    fn parse_page(&self, src: &[u8]) -> Result<Page, CollaboratorError>;
}

/// Renders the finished site. Invoked exactly once per build, after
/// dispatch, but referenced by the shared context the workers hold.
pub trait Writer: Sync {
    fn write(&self, site: &Site) -> Result<(), CollaboratorError>;
}

/// A build plugin. Hooks are invoked in the order plugins were configured.
pub trait Plugin: Send + Sync {
    /// Stable key identifying the plugin in configuration and errors.
    fn key(&self) -> &'static str;

    /// Invoked for every registered page, concurrently from the worker
    /// pool. Implementations holding state must synchronize internally.
    fn process_page(&self, page: &Arc<Page>) -> Result<(), CollaboratorError>;

    /// Invoked single-threaded after dispatch and before any bytes are
    /// written. May mutate the site, e.g. to inject synthetic nodes.
    fn pre_write(&self, _site: &mut Site) -> Result<(), CollaboratorError> {
        Ok(())
    }

    /// Invoked single-threaded after the writer returned successfully,
    /// for side effects that must only happen once files are on disk.
    fn post_write(&self) -> Result<(), CollaboratorError> {
        Ok(())
    }
}

#[derive(Error, Debug)]
pub enum BuildError {
    #[error("discovering content: {0}")]
    Discovery(#[from] walkdir::Error),
    #[error("reading {path}: {source}")]
    ReadFile {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("parsing {path}: {source}")]
    Parse {
        path: PathBuf,
        source: CollaboratorError,
    },
    #[error("page {path} requests undeclared type \"{name}\"")]
    UnknownType { path: PathBuf, name: String },
    #[error(transparent)]
    Builder(#[from] BuilderError),
    #[error("plugin {key} processing {path}: {source}")]
    ProcessPage {
        key: String,
        path: PathBuf,
        source: CollaboratorError,
    },
    #[error("pre-write hook of plugin {key}: {source}")]
    PreWrite {
        key: String,
        source: CollaboratorError,
    },
    #[error("writing site: {0}")]
    Write(CollaboratorError),
    #[error("post-write hook of plugin {key}: {source}")]
    PostWrite {
        key: String,
        source: CollaboratorError,
    },
}

/// All errors collected during one build. Per-file errors accumulate
/// without short-circuiting each other, so there can be several.
#[derive(Debug)]
pub struct BuildErrors(pub Vec<BuildError>);

impl fmt::Display for BuildErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "build failed with {} error(s):", self.0.len())?;
        for err in &self.0 {
            writeln!(f, "  - {err}")?;
        }
        Ok(())
    }
}

impl std::error::Error for BuildErrors {}

impl From<BuildError> for BuildErrors {
    fn from(err: BuildError) -> Self {
        Self(vec![err])
    }
}

/// All components required for running a build. Plugins are an explicit
/// list passed in by the caller; there is no global registry.
pub struct Context<'p, P, W> {
    pub project: &'p Path,
    pub parser: P,
    pub builder: Builder,
    pub writer: W,
    pub plugins: Vec<Box<dyn Plugin>>,
    /// Declared page types; a page requesting any other type fails.
    pub types: HashMap<String, PageType>,
}

/// Executes a build using the provided context. Blocks until the build is
/// done or failed.
pub fn run<P: Parser, W: Writer>(ctx: Context<'_, P, W>) -> Result<(), BuildErrors> {
    let content_dir = ctx.project.join(CONTENT_DIR);
    let mut errors = Vec::new();

    {
        let (file_tx, file_rx) = mpsc::channel::<PathBuf>();
        let (err_tx, err_rx) = mpsc::channel::<BuildError>();
        let file_rx = Arc::new(Mutex::new(file_rx));

        let ctx = &ctx;
        let content_dir = &content_dir;

        thread::scope(|scope| {
            // Discovery. Dropping file_tx on completion closes the work
            // channel; a walk error is fatal to the whole build.
            {
                let err_tx = err_tx.clone();
                scope.spawn(move || {
                    const FILTERS: &[FileFilter] =
                        &[discover::markdown_only, discover::no_underscores];
                    if let Err(err) = discover::stream_files(content_dir, file_tx, FILTERS) {
                        let _ = err_tx.send(BuildError::Discovery(err));
                    }
                });
            }

            // Processing. The receiver is shared behind a mutex; the lock
            // is only held while receiving, never while processing.
            for _ in 0..PARALLELISM {
                let file_rx = Arc::clone(&file_rx);
                let err_tx = err_tx.clone();
                scope.spawn(move || {
                    loop {
                        let file = {
                            let Ok(rx) = file_rx.lock() else { return };
                            match rx.recv() {
                                Ok(file) => file,
                                // Channel closed and drained: no more work.
                                Err(_) => return,
                            }
                        };
                        if let Err(err) = process_file(ctx, content_dir, &file) {
                            let _ = err_tx.send(err);
                        }
                    }
                });
            }

            // Every remaining sender is owned by a spawned thread, so this
            // collection loop ends exactly when discovery and all workers
            // have exited.
            drop(err_tx);
            for err in err_rx {
                errors.push(err);
            }
        });
    }

    if !errors.is_empty() {
        return Err(BuildErrors(errors));
    }

    let Context {
        builder,
        writer,
        plugins,
        ..
    } = ctx;

    let mut site = builder.dispatch().map_err(BuildError::Builder)?;

    for plugin in &plugins {
        plugin.pre_write(&mut site).map_err(|source| BuildError::PreWrite {
            key: plugin.key().to_owned(),
            source,
        })?;
    }

    writer.write(&site).map_err(BuildError::Write)?;

    for plugin in &plugins {
        // Must run after the write so the writer cannot clobber whatever
        // the hook puts on disk.
        plugin.post_write().map_err(|source| BuildError::PostWrite {
            key: plugin.key().to_owned(),
            source,
        })?;
    }

    Ok(())
}

/// Processes a single content file: read, parse, locate, type-check,
/// register, and run the per-page plugin hooks.
fn process_file<P: Parser, W>(
    ctx: &Context<'_, P, W>,
    content_dir: &Path,
    file: &Path,
) -> Result<(), BuildError> {
    let src = fs::read(file).map_err(|source| BuildError::ReadFile {
        path: file.to_owned(),
        source,
    })?;

    let mut page = ctx
        .parser
        .parse_page(&src)
        .map_err(|source| BuildError::Parse {
            path: file.to_owned(),
            source,
        })?;

    page.route = route_from_path(content_dir, file);
    page.id = file
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default();
    page.href = format!("{}/{}", page.route.trim_end_matches('/'), page.id);

    if let Some(name) = page.provided_type.clone() {
        let page_type = ctx
            .types
            .get(&name)
            .ok_or_else(|| BuildError::UnknownType {
                path: file.to_owned(),
                name,
            })?;
        page.page_type = Some(page_type.clone());
    }

    let page = ctx.builder.register_page(page)?;

    for plugin in &ctx.plugins {
        plugin
            .process_page(&page)
            .map_err(|source| BuildError::ProcessPage {
                key: plugin.key().to_owned(),
                path: file.to_owned(),
                source,
            })?;
    }

    Ok(())
}

/// Derives a page's route from its file location: the file's directory
/// relative to the content directory. A file like
/// `content/blog/coffee/making-espresso.md` yields `/blog/coffee`; a file
/// directly inside the content directory yields `/`.
pub fn route_from_path(content_dir: &Path, file: &Path) -> String {
    let parent = file.parent().unwrap_or(content_dir);
    let relative = parent.strip_prefix(content_dir).unwrap_or(Path::new(""));

    let mut route = String::from("/");
    for component in relative.components() {
        if route.len() > 1 {
            route.push('/');
        }
        route.push_str(&component.as_os_str().to_string_lossy());
    }

    route
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use std::sync::atomic::{AtomicUsize, Ordering};

    // =========================================================================
    // Route derivation
    // =========================================================================

    #[test]
    fn route_for_top_level_file_is_root() {
        let route = route_from_path(Path::new("content"), Path::new("content/about.md"));
        assert_eq!(route, "/");
    }

    #[test]
    fn route_is_parent_directory() {
        let route = route_from_path(
            Path::new("content"),
            Path::new("content/blog/coffee/making-espresso.md"),
        );
        assert_eq!(route, "/blog/coffee");
    }

    // =========================================================================
    // Test doubles
    // =========================================================================

    /// Parses `key: value` lines; fails on the byte marker `!fail`.
    struct StubParser;

    impl Parser for StubParser {
        fn parse_page(&self, src: &[u8]) -> Result<Page, CollaboratorError> {
            let text = std::str::from_utf8(src)?;
            if text.contains("!fail") {
                return Err("stub parse failure".into());
            }
            let mut page = Page::default();
            for line in text.lines() {
                if let Some(title) = line.strip_prefix("title: ") {
                    page.title = title.to_owned();
                }
                if let Some(ty) = line.strip_prefix("type: ") {
                    page.provided_type = Some(ty.to_owned());
                }
            }
            Ok(page)
        }
    }

    /// Counts write invocations instead of touching the filesystem.
    #[derive(Default)]
    struct RecordingWriter {
        writes: AtomicUsize,
    }

    impl Writer for &RecordingWriter {
        fn write(&self, _site: &Site) -> Result<(), CollaboratorError> {
            self.writes.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    struct CountingPlugin {
        processed: Arc<AtomicUsize>,
    }

    impl Plugin for CountingPlugin {
        fn key(&self) -> &'static str {
            "counting"
        }

        fn process_page(&self, _page: &Arc<Page>) -> Result<(), CollaboratorError> {
            self.processed.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    fn write_project(files: &[(&str, &str)]) -> tempfile::TempDir {
        let tmp = tempfile::TempDir::new().unwrap();
        for (rel, content) in files {
            let path = tmp.path().join(CONTENT_DIR).join(rel);
            std::fs::create_dir_all(path.parent().unwrap()).unwrap();
            std::fs::write(path, content).unwrap();
        }
        tmp
    }

    fn context<'p>(
        project: &'p Path,
        writer: &'p RecordingWriter,
    ) -> Context<'p, StubParser, &'p RecordingWriter> {
        Context {
            project,
            parser: StubParser,
            builder: Builder::new(&Config::default()),
            writer,
            plugins: Vec::new(),
            types: HashMap::new(),
        }
    }

    // =========================================================================
    // Pipeline behavior
    // =========================================================================

    #[test]
    fn context_is_shareable_across_workers() {
        // The worker pool holds one shared reference to the context, so
        // every collaborator in it must be Sync.
        fn assert_sync<T: Sync>(_: &T) {}

        let tmp = tempfile::TempDir::new().unwrap();
        let writer = RecordingWriter::default();
        let ctx = context(tmp.path(), &writer);
        assert_sync(&ctx);
    }

    #[test]
    fn clean_build_writes_once() {
        let tmp = write_project(&[
            ("about.md", "title: About"),
            ("blog/first.md", "title: First"),
            ("blog/coffee/espresso.md", "title: Espresso"),
        ]);
        let writer = RecordingWriter::default();

        run(context(tmp.path(), &writer)).unwrap();

        assert_eq!(writer.writes.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn one_bad_file_fails_the_batch_without_writing() {
        let mut files = vec![("bad.md", "!fail")];
        let names: Vec<String> = (0..9).map(|i| format!("blog/good-{i}.md")).collect();
        for name in &names {
            files.push((name.as_str(), "title: ok"));
        }
        let tmp = write_project(&files);
        let writer = RecordingWriter::default();

        let err = run(context(tmp.path(), &writer)).unwrap_err();

        assert_eq!(err.0.len(), 1);
        assert!(matches!(err.0[0], BuildError::Parse { .. }));
        assert_eq!(writer.writes.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn per_file_errors_accumulate() {
        let tmp = write_project(&[
            ("a.md", "!fail"),
            ("b.md", "!fail"),
            ("c.md", "title: ok"),
        ]);
        let writer = RecordingWriter::default();

        let err = run(context(tmp.path(), &writer)).unwrap_err();
        assert_eq!(err.0.len(), 2);
    }

    #[test]
    fn undeclared_type_is_a_per_file_error() {
        let tmp = write_project(&[("post.md", "title: X\ntype: missing")]);
        let writer = RecordingWriter::default();

        let err = run(context(tmp.path(), &writer)).unwrap_err();
        assert!(matches!(err.0[0], BuildError::UnknownType { .. }));
    }

    #[test]
    fn declared_type_resolves() {
        let tmp = write_project(&[("post.md", "title: X\ntype: post")]);
        let writer = RecordingWriter::default();

        let mut ctx = context(tmp.path(), &writer);
        ctx.types.insert(
            "post".to_owned(),
            PageType {
                template: "post".to_owned(),
            },
        );

        run(ctx).unwrap();
        assert_eq!(writer.writes.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn plugins_see_every_page() {
        let tmp = write_project(&[
            ("a.md", "title: A"),
            ("b.md", "title: B"),
            ("blog/c.md", "title: C"),
        ]);
        let writer = RecordingWriter::default();
        let processed = Arc::new(AtomicUsize::new(0));

        let mut ctx = context(tmp.path(), &writer);
        ctx.plugins.push(Box::new(CountingPlugin {
            processed: Arc::clone(&processed),
        }));

        run(ctx).unwrap();
        assert_eq!(processed.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn empty_content_directory_builds_an_empty_site() {
        let tmp = tempfile::TempDir::new().unwrap();
        let writer = RecordingWriter::default();

        run(context(tmp.path(), &writer)).unwrap();
        assert_eq!(writer.writes.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn failing_pre_write_hook_aborts_before_writing() {
        struct FailingPreWrite;

        impl Plugin for FailingPreWrite {
            fn key(&self) -> &'static str {
                "failing"
            }
            fn process_page(&self, _page: &Arc<Page>) -> Result<(), CollaboratorError> {
                Ok(())
            }
            fn pre_write(&self, _site: &mut Site) -> Result<(), CollaboratorError> {
                Err("nope".into())
            }
        }

        let tmp = write_project(&[("a.md", "title: A")]);
        let writer = RecordingWriter::default();

        let mut ctx = context(tmp.path(), &writer);
        ctx.plugins.push(Box::new(FailingPreWrite));

        let err = run(ctx).unwrap_err();
        assert!(matches!(err.0[0], BuildError::PreWrite { .. }));
        assert_eq!(writer.writes.load(Ordering::SeqCst), 0);
    }
}

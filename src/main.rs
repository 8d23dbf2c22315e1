use clap::{Parser, Subcommand};
use sitewright::{builder, config, parser, pipeline, plugin, writer};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "sitewright")]
#[command(about = "Concurrent static site generator")]
#[command(long_about = "\
Concurrent static site generator

Your filesystem is the data source. The directory layout under content/
becomes the site's route tree, and every Markdown file becomes a page.

Project structure:

  my-site/
  ├── config.toml                  # Site metadata, nav, footer, plugins
  └── content/
      ├── index.md                 # Overview content for the root route
      ├── about.md                 # Page at /about
      ├── _drafts.md               # Underscore prefix = ignored
      └── blog/
          ├── index.md             # Overview content for /blog
          └── making-espresso.md   # Page at /blog/making-espresso

Pages carry TOML front matter between +++ fences:

  +++
  title = \"Making Espresso\"
  date = \"2024-05-20\"
  tags = [\"coffee\"]
  +++

A build either succeeds completely or writes nothing: every broken file
in the batch is reported at once.")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Build the site into the output directory
    Build {
        /// Project directory containing config.toml and content/
        #[arg(default_value = ".")]
        project: PathBuf,

        /// Output directory, relative to the project unless absolute
        #[arg(long, default_value = config::OUTPUT_DIR)]
        output: PathBuf,

        /// Replace an existing output directory
        #[arg(long)]
        overwrite: bool,
    },
}

fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Build {
            project,
            output,
            overwrite,
        } => build(&project, &output, overwrite),
    };

    if let Err(err) = result {
        eprintln!("{err}");
        std::process::exit(1);
    }
}

fn build(
    project: &Path,
    output: &Path,
    overwrite: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let cfg = config::Config::from_project(project)?;

    let output_dir = if output.is_absolute() {
        output.to_path_buf()
    } else {
        project.join(output)
    };

    if output_dir.exists() && !(overwrite || cfg.build.overwrite) {
        return Err(format!(
            "output directory {} already exists, pass --overwrite or set build.overwrite to replace it",
            output_dir.display()
        )
        .into());
    }

    let ctx = pipeline::Context {
        project,
        parser: parser::Markdown::new(),
        builder: builder::Builder::new(&cfg),
        writer: writer::HtmlWriter::new(&output_dir),
        plugins: plugin::from_config(&cfg, &output_dir)?,
        types: cfg.types.clone(),
    };

    pipeline::run(ctx)?;

    println!("Build complete: {}", output_dir.display());
    Ok(())
}

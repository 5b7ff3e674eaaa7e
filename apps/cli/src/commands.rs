//! CLI command definitions and routing.

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use color_eyre::eyre::Result;
use labdoc_git::{
    DetectOptions, GitCli, append_to_file, detect_changes, render_env, render_outputs,
    write_chapters_json,
};
use labdoc_preview::{
    HomeBannerOutcome, add_home_banner, checkout_published_html, expand_banners,
    highlight_changed_pages, mark_changed_files, rendered_pages,
};
use labdoc_shared::{
    AppConfig, ChangeSet, FilterKind, default_config_path, init_config, load_config,
};
use tracing::info;

use crate::logging::LogFormat;

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// labdoc: change detection and preview tooling for the lab manual.
#[derive(Parser)]
#[command(
    name = "labdoc",
    version,
    about = "Change detection, pandoc filters, and preview post-processing for the lab manual.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to labdoc.toml (defaults to ./labdoc.toml).
    #[arg(long, env = "LABDOC_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Detect chapter sources changed against a base branch and export them for CI.
    Changes {
        /// Base branch to compare against (defaults to `changes.base_ref`).
        base: Option<String>,

        /// Revision holding the changes.
        #[arg(long, default_value = "HEAD")]
        head: String,

        /// Skip fetching the base branch from the remote.
        #[arg(long)]
        no_fetch: bool,

        /// Source extension to keep (defaults to `changes.extension`).
        #[arg(long)]
        extension: Option<String>,

        /// Step output file; results are printed when unset.
        #[arg(long, env = "GITHUB_OUTPUT")]
        output_file: Option<PathBuf>,

        /// Environment file that receives the changed-file list.
        #[arg(long, env = "GITHUB_ENV")]
        env_file: Option<PathBuf>,

        /// Also write the changed chapter ids as JSON to this path.
        #[arg(long)]
        chapters_json: Option<PathBuf>,
    },

    /// Run the pandoc filter chain over a JSON document on stdin.
    Filter {
        /// Output format pandoc is producing (e.g. docx, latex, html).
        format: String,

        /// Filters to run instead of `filters.chain` (comma-separated).
        #[arg(long, value_delimiter = ',')]
        only: Vec<FilterKind>,
    },

    /// Preview-site preparation and post-processing.
    Preview {
        #[command(subcommand)]
        action: PreviewAction,
    },

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Preview subcommands, in the order a preview build runs them.
#[derive(Subcommand)]
pub(crate) enum PreviewAction {
    /// Flag changed sources in their front matter before rendering.
    Mark {
        /// Source files to flag; defaults to the changed-file list.
        files: Vec<PathBuf>,

        /// Newline-separated changed-file list.
        #[arg(long, env = "PREVIEW_CHANGED_FILES")]
        changed: Option<String>,
    },

    /// Add the changed-chapters banner to the rendered home page.
    HomeBanner {
        /// Rendered site directory (defaults to `preview.html_dir`).
        #[arg(long, env = "HTML_DIR")]
        html_dir: Option<PathBuf>,
    },

    /// Annotate rendered pages that differ from the published site.
    Highlight {
        /// Rendered site directory (defaults to `preview.html_dir`).
        #[arg(long, env = "HTML_DIR")]
        html_dir: Option<PathBuf>,

        /// Newline-separated changed-file list.
        #[arg(long, env = "PREVIEW_CHANGED_FILES")]
        changed: Option<String>,

        /// Directory holding the published HTML; checked out from git when unset.
        #[arg(long)]
        base_dir: Option<PathBuf>,

        /// Similarity at or above which a page counts as unchanged.
        #[arg(long)]
        threshold: Option<f64>,
    },

    /// Replace banner placeholders in rendered pages with the banner markup.
    ExpandBanner {
        /// Rendered site directory (defaults to `preview.html_dir`).
        #[arg(long, env = "HTML_DIR")]
        html_dir: Option<PathBuf>,

        /// Newline-separated changed-file list; every page is scanned when unset.
        #[arg(long)]
        changed: Option<String>,
    },
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Initialize config file with defaults.
    Init,
    /// Show resolved configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) fn run(cli: Cli) -> Result<()> {
    let config_path = cli.config;
    match cli.command {
        Command::Changes {
            base,
            head,
            no_fetch,
            extension,
            output_file,
            env_file,
            chapters_json,
        } => {
            let config = load_config(config_path.as_deref())?;
            let mut opts = DetectOptions::from(&config.changes);
            if let Some(base) = base {
                opts.base_ref = base;
            }
            if let Some(extension) = extension {
                opts.extension = extension;
            }
            opts.head = head;
            opts.fetch &= !no_fetch;
            cmd_changes(
                &config,
                &opts,
                output_file.as_deref(),
                env_file.as_deref(),
                chapters_json.as_deref(),
            )
        }
        Command::Filter { format, only } => {
            let mut config = load_config(config_path.as_deref())?;
            if !only.is_empty() {
                config.filters.chain = only;
            }
            labdoc_pandoc::run_stdio_filter(&config.filters, &format)?;
            Ok(())
        }
        Command::Preview { action } => {
            let config = load_config(config_path.as_deref())?;
            match action {
                PreviewAction::Mark { files, changed } => cmd_mark(&config, files, changed),
                PreviewAction::HomeBanner { html_dir } => {
                    cmd_home_banner(&html_dir_or_default(html_dir, &config))
                }
                PreviewAction::Highlight {
                    html_dir,
                    changed,
                    base_dir,
                    threshold,
                } => cmd_highlight(
                    &config,
                    &html_dir_or_default(html_dir, &config),
                    changed.as_deref(),
                    base_dir,
                    threshold,
                ),
                PreviewAction::ExpandBanner { html_dir, changed } => cmd_expand_banner(
                    &config,
                    &html_dir_or_default(html_dir, &config),
                    changed.as_deref(),
                ),
            }
        }
        Command::Config { action } => {
            let path = config_path.unwrap_or_else(default_config_path);
            match action {
                ConfigAction::Init => cmd_config_init(&path),
                ConfigAction::Show => cmd_config_show(&path),
            }
        }
    }
}

fn html_dir_or_default(html_dir: Option<PathBuf>, config: &AppConfig) -> PathBuf {
    html_dir.unwrap_or_else(|| PathBuf::from(&config.preview.html_dir))
}

// ---------------------------------------------------------------------------
// Change detection
// ---------------------------------------------------------------------------

fn cmd_changes(
    config: &AppConfig,
    opts: &DetectOptions,
    output_file: Option<&Path>,
    env_file: Option<&Path>,
    chapters_json: Option<&Path>,
) -> Result<()> {
    let set = detect_changes(&GitCli::new(), opts);
    info!(
        base = %opts.base_ref,
        changed = set.len(),
        "change detection finished"
    );

    let outputs = render_outputs(&set, &config.changes.files_key, &config.changes.flag_key);
    match output_file {
        Some(path) => append_to_file(path, &outputs)?,
        None => print!("{outputs}"),
    }

    if let Some(path) = env_file {
        append_to_file(path, &render_env(&set, &config.changes.env_key))?;
    }
    if let Some(path) = chapters_json {
        write_chapters_json(path, &set)?;
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Preview
// ---------------------------------------------------------------------------

fn cmd_mark(config: &AppConfig, files: Vec<PathBuf>, changed: Option<String>) -> Result<()> {
    let files = if files.is_empty() {
        let set = ChangeSet::from_lines(changed.as_deref().unwrap_or_default());
        set.files.into_iter().map(PathBuf::from).collect()
    } else {
        files
    };

    if files.is_empty() {
        println!("No changed files to mark.");
        return Ok(());
    }

    let report = mark_changed_files(&files, &config.filters.changed_key)?;
    for path in &report.marked {
        println!("Marked {}", path.display());
    }
    for path in &report.missing {
        println!("Not found: {}", path.display());
    }
    Ok(())
}

fn cmd_home_banner(html_dir: &Path) -> Result<()> {
    match add_home_banner(html_dir)? {
        HomeBannerOutcome::Added(n) => println!("Added home page banner listing {n} chapter(s)."),
        HomeBannerOutcome::NoIndex => println!("No index.html in {}.", html_dir.display()),
        HomeBannerOutcome::NoManifest => println!("No changed chapters file found."),
        HomeBannerOutcome::NoChanges => println!("No changed chapters to display."),
        HomeBannerOutcome::NoMainElement => {
            println!("Could not find the <main> element in index.html.")
        }
    }
    Ok(())
}

fn cmd_highlight(
    config: &AppConfig,
    html_dir: &Path,
    changed: Option<&str>,
    base_dir: Option<PathBuf>,
    threshold: Option<f64>,
) -> Result<()> {
    let set = ChangeSet::from_lines(changed.unwrap_or_default());
    if set.is_empty() {
        println!("No changed files to highlight.");
        return Ok(());
    }

    let base_dir = match base_dir {
        Some(dir) => Some(dir),
        None => checkout_published_html(
            &GitCli::new(),
            &config.preview.publish_remote,
            &config.preview.publish_branch,
            &config.preview.publish_ref(),
            Path::new(&config.preview.base_checkout_dir),
        )?,
    };
    if base_dir.is_none() {
        println!("No published site to compare against; changed pages are treated as new.");
    }

    let threshold = threshold.unwrap_or(config.preview.similarity_threshold);
    let report =
        highlight_changed_pages(html_dir, base_dir.as_deref(), &rendered_pages(&set), threshold)?;

    for (page, similarity) in &report.annotated {
        println!(
            "Annotated {} ({:.1}% similar to published)",
            page.display(),
            similarity * 100.0
        );
    }
    println!(
        "{} annotated, {} unchanged, {} new, {} missing",
        report.annotated.len(),
        report.unchanged.len(),
        report.new_pages.len(),
        report.missing.len()
    );
    Ok(())
}

fn cmd_expand_banner(config: &AppConfig, html_dir: &Path, changed: Option<&str>) -> Result<()> {
    let pages = changed.map(|list| rendered_pages(&ChangeSet::from_lines(list)));
    let expanded = expand_banners(
        html_dir,
        &config.filters.banner_placeholder,
        pages.as_deref(),
    )?;
    println!("Expanded the preview banner in {} page(s).", expanded.len());
    Ok(())
}

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

fn cmd_config_init(path: &Path) -> Result<()> {
    let path = init_config(path)?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

fn cmd_config_show(path: &Path) -> Result<()> {
    let config: AppConfig = load_config(Some(path))?;
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
}

#[cfg(feature = "cli")]
use std::path::PathBuf;

#[cfg(feature = "cli")]
use anyhow::Context;
#[cfg(feature = "cli")]
use clap::Parser;
#[cfg(feature = "cli")]
use patchwork::core::{Engine, FsProfileStore, FsTreeProvider, NodeView, ProfileEdit, ProfileMode};

#[cfg(feature = "cli")]
#[derive(Parser, Debug)]
#[command(version, about = "Pick project files for a language-model payload", long_about = None)]
struct Cli {
    /// Project directory to open
    root: PathBuf,

    /// Profile scope to activate (global or local)
    #[arg(long, short = 'm')]
    mode: Option<ProfileMode>,

    /// Edit a profile field, e.g. --set include_file_types=.rs,.toml
    #[arg(long = "set", value_name = "FIELD=VALUE")]
    sets: Vec<String>,

    /// Save the edited profile
    #[arg(long)]
    save: bool,

    /// Exclude a directory (root-relative) for this run only
    #[arg(long = "exclude", value_name = "DIR")]
    excludes: Vec<String>,

    /// Select every selectable file
    #[arg(long)]
    select_all: bool,

    /// Restore the profile's previously stored selection
    #[arg(long)]
    previous: bool,

    /// Print the tree as JSON instead of text
    #[arg(long)]
    json: bool,
}

#[cfg(feature = "cli")]
fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let store = FsProfileStore::from_user_dirs()?;
    let settings = store.load_app_settings();
    let mut engine = Engine::new(store, FsTreeProvider, settings);

    engine
        .open_project(&cli.root, cli.mode)
        .with_context(|| format!("opening {}", cli.root.display()))?;

    for raw in &cli.sets {
        let (field, value) = raw
            .split_once('=')
            .with_context(|| format!("expected FIELD=VALUE, got `{raw}`"))?;
        engine.edit(ProfileEdit::parse(field, value)?)?;
    }
    if cli.save && engine.is_dirty() {
        engine.save().context("saving profile")?;
    }

    let root = engine.root().map(PathBuf::from).unwrap_or_default();
    for rel in &cli.excludes {
        if engine.toggle_exclusion(&root.join(rel)).is_none() {
            log::warn!("`{rel}` is not a directory in the tree");
        }
    }

    if cli.previous {
        let n = engine.use_previous_selection()?;
        log::info!("restored {n} previously chosen files");
    }
    if cli.select_all {
        engine.select_all();
    }

    let views = engine.node_views();
    if cli.json {
        println!("{}", serde_json::to_string_pretty(&views)?);
    } else {
        print_tree(&views);
        let request = engine.generation_request()?;
        println!("\n{} files selected", request.files.len());
        for f in &request.files {
            println!("  {}", f.strip_prefix(&request.root).unwrap_or(f).display());
        }
    }

    if !engine.selection().is_empty() {
        engine.record_generation()?;
    }
    Ok(())
}

#[cfg(feature = "cli")]
fn print_tree(views: &[NodeView]) {
    for v in views {
        let marker = match v.state.folder_state {
            Some(state) => state.marker(),
            None if v.state.selected => "[x]",
            None => "[ ]",
        };
        let suffix = if v.state.excluded_by_config {
            " (excluded)"
        } else if v.state.effectively_excluded && v.is_dir {
            " (excluded this session)"
        } else {
            ""
        };
        println!("{}{marker} {}{suffix}", "    ".repeat(v.depth), v.name);
    }
}

#[cfg(not(feature = "cli"))]
fn main() -> anyhow::Result<()> {
    eprintln!(
        "Built without the `cli` feature; nothing to run. \
Enable it with `--features cli`, or just run tests with `--no-default-features`."
    );
    Ok(())
}

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context as _;
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use choirless_render::{
    ActionResponse, Config, DirStore, Dispatcher, LayoutEngine, LayoutRequest, ObjectStore,
    RunId, SceneDefinition, ShelfPacker, SpoolInvoker, StaticParts, plan_jobs,
};

#[derive(Parser, Debug)]
#[command(name = "choirless-render", version)]
struct Cli {
    /// Config JSON; defaults apply to anything it leaves out.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Lay out a song's parts and write `{choir}+{song}+auto.json`.
    Layout(LayoutArgs),
    /// Print the row jobs a definition would produce, without submitting them.
    Plan(KeyArgs),
    /// Submit one row job per distinct row to the spool directory.
    Dispatch(KeyArgs),
}

#[derive(Args, Debug)]
struct LayoutArgs {
    /// Song-parts listing JSON (`{"ok": bool, "parts": [...]}`).
    #[arg(long)]
    parts: PathBuf,

    /// Object key naming the song (`{choir}+{song}+...`).
    #[arg(long, conflicts_with_all = ["choir", "song"])]
    key: Option<String>,

    #[arg(long)]
    choir: Option<String>,

    #[arg(long)]
    song: Option<String>,
}

#[derive(Args, Debug)]
struct KeyArgs {
    /// Definition key, e.g. `choir+song+auto.json`.
    #[arg(long)]
    key: String,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "choirless_render=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => Config::from_path(path)
            .with_context(|| format!("load config '{}'", path.display()))?,
        None => Config::default(),
    };

    match cli.cmd {
        Command::Layout(args) => cmd_layout(&config, args),
        Command::Plan(args) => cmd_plan(&config, args),
        Command::Dispatch(args) => cmd_dispatch(&config, args),
    }
}

fn definitions(config: &Config) -> Arc<DirStore> {
    Arc::new(DirStore::new(&config.storage.definitions_dir))
}

fn cmd_layout(config: &Config, args: LayoutArgs) -> anyhow::Result<()> {
    let request = match args.key {
        Some(key) => LayoutRequest::from_key(&key),
        None => LayoutRequest {
            choir_id: args.choir,
            song_id: args.song,
        },
    };
    let parts = StaticParts::from_path(&args.parts)
        .with_context(|| format!("load parts '{}'", args.parts.display()))?;
    let engine = LayoutEngine::new(
        config.layout.clone(),
        Arc::new(ShelfPacker),
        Arc::new(parts),
        definitions(config),
    );

    let response = ActionResponse::from_layout(engine.run(&request))?;
    print_json(&response)
}

fn cmd_plan(config: &Config, args: KeyArgs) -> anyhow::Result<()> {
    let body = definitions(config)
        .get(&args.key)
        .with_context(|| format!("read definition '{}'", args.key))?;
    let definition = SceneDefinition::from_slice(&body)?;
    let jobs = plan_jobs(&args.key, &definition, &RunId::new());
    let payloads = jobs
        .iter()
        .map(|j| j.to_payload())
        .collect::<Result<Vec<_>, _>>()?;
    print_json(&payloads)
}

fn cmd_dispatch(config: &Config, args: KeyArgs) -> anyhow::Result<()> {
    let invoker = SpoolInvoker::new(&config.storage.spool_dir);
    let dispatcher = Dispatcher::new(definitions(config), Arc::new(invoker), &config.dispatch)?;
    let response = ActionResponse::from_dispatch(dispatcher.dispatch_key(&args.key))?;
    print_json(&response)
}

fn print_json<T: serde::Serialize>(value: &T) -> anyhow::Result<()> {
    let text = serde_json::to_string_pretty(value).context("encode output JSON")?;
    println!("{text}");
    Ok(())
}

use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use viewer_core::AppState;
use viewer_engine::{FetchSettings, MirrorWriter, ReqwestFetcher, RestMirrorStore};
use viewer_logging::{level_for, viewer_info};

use super::config::{
    load_file_config, Cli, Command, FetchArgs, FileConfig, MirrorArgs, RenderArgs, ServeArgs,
};
use super::effects::EffectRunner;
use super::session::{inbox, spawn_host_reader, Session};
use super::ui::viewport::DocumentViewport;
use super::{logging, server};

pub fn run_app() -> anyhow::Result<()> {
    let cli = Cli::parse();
    logging::initialize(cli.log, level_for(cli.verbose));
    let file = load_file_config(cli.config.as_deref())?;

    match &cli.command {
        Command::Render(args) => run_render(&cli.mirror, args, &file),
        Command::Fetch(args) => run_fetch(&cli.mirror, args, &file),
        Command::Serve(args) => run_serve(&cli.mirror, args, &file),
    }
}

fn run_render(mirror: &MirrorArgs, args: &RenderArgs, file: &FileConfig) -> anyhow::Result<()> {
    let policy = args.policy(file);
    let writer = if args.no_mirror {
        viewer_info!("Mirroring disabled");
        None
    } else {
        let store = RestMirrorStore::new(mirror.store_settings(&file.mirror)?)
            .context("configuring mirror store")?;
        Some(MirrorWriter::new(Arc::new(store)))
    };

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("starting runtime")?;

    viewer_info!("Rendering host events into {}", args.output.display());
    let output = args.output.clone();
    runtime.block_on(async move {
        let (tx, rx) = inbox();
        let fetcher = Arc::new(ReqwestFetcher::new(FetchSettings::default()));
        let runner = EffectRunner::new(fetcher, writer, tx.clone());
        let session = Session::new(policy, runner, DocumentViewport::new(output));
        spawn_host_reader(tokio::io::BufReader::new(tokio::io::stdin()), tx);
        let session = session.run(rx).await;
        viewer_info!("Session finished in state {:?}", session.state().phase());
    });
    Ok(())
}

fn run_fetch(mirror: &MirrorArgs, args: &FetchArgs, file: &FileConfig) -> anyhow::Result<()> {
    let state = AppState::fetch_into(args.policy(file), args.columns());
    let source = RestMirrorStore::new(args.source_settings(mirror, file)?)
        .context("configuring source table store")?;
    viewer_info!(
        "Fetching into table {} column {}",
        source.settings().table_id,
        source.settings().content_column
    );

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("starting runtime")?;

    let output = args.output.clone();
    runtime.block_on(async move {
        let (tx, rx) = inbox();
        let fetcher = Arc::new(ReqwestFetcher::new(FetchSettings::default()));
        let runner =
            EffectRunner::new(fetcher, None, tx.clone()).with_source_store(Arc::new(source));
        let session = Session::with_state(state, runner, DocumentViewport::new(output));
        spawn_host_reader(tokio::io::BufReader::new(tokio::io::stdin()), tx);
        let session = session.run(rx).await;
        viewer_info!("Fetch session finished with status {:?}", session.state().status());
    });
    Ok(())
}

fn run_serve(mirror: &MirrorArgs, args: &ServeArgs, file: &FileConfig) -> anyhow::Result<()> {
    let addr = args.listen_addr(file)?;
    let store = RestMirrorStore::new(mirror.store_settings(&file.mirror)?)
        .context("configuring mirror store")?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("starting runtime")?;
    runtime.block_on(server::serve(addr, store))
}

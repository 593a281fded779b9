use std::{path::PathBuf, sync::Arc};

use anyhow::{Context, Result};
use clap::Parser;
use client_core::{
    presentation::describe_session_error, render, ControllerHandle, ControllerUpdate,
    InteractionDriver, InteractionState, JsonRpcProvider, LedgerClient, WalletProvider,
    WalletSession,
};
use tokio::{
    io::{AsyncBufReadExt, BufReader},
    sync::{broadcast::error::RecvError, broadcast::Receiver, Mutex},
};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

mod config;
mod surface;

use config::{load_settings, DEFAULT_CONFIG_PATH};
use surface::{draw, parse_input, InputAction, InputBuffer, HELP};

#[derive(Parser, Debug)]
struct Args {
    #[arg(long, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,
    /// Wallet JSON-RPC endpoint; without one no wallet is available.
    #[arg(long)]
    rpc_url: Option<String>,
    #[arg(long)]
    contract: Option<String>,
    #[arg(long)]
    submit_floor_ms: Option<u64>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let mut settings = load_settings(&args.config);
    if let Some(rpc_url) = args.rpc_url {
        settings.wallet_rpc_url = Some(rpc_url);
    }
    if let Some(contract) = args.contract {
        settings.contract_address = contract;
    }
    if let Some(floor) = args.submit_floor_ms {
        settings.submit_floor_ms = floor;
    }

    let contract = settings.contract()?;
    let provider = JsonRpcProvider::detect(settings.wallet_rpc_url.as_deref())?
        .map(|provider| Arc::new(provider) as Arc<dyn WalletProvider>);

    let mut session = WalletSession::new(provider);
    let identity = match session.connect().await {
        Ok(identity) => identity,
        Err(err) => {
            error!(error = %err, "wallet session could not be established");
            println!("error: {}", describe_session_error(&err));
            return Err(err).context("wallet session failed");
        }
    };
    println!("connected as {identity}");
    info!(%contract, "message board ready");

    let ledger =
        LedgerClient::with_receipt_policy(session.signer()?, contract, settings.receipt_policy());
    let (driver, handle) = InteractionDriver::new(session, ledger, settings.submit_floor())?;

    let input = Arc::new(Mutex::new(InputBuffer::default()));
    let mut render_task = tokio::spawn(render_loop(
        handle.updates(),
        handle.current(),
        input.clone(),
    ));
    let driver_task = driver.spawn();

    // The render loop only finishes early when the wallet session ends.
    let session_ended = tokio::select! {
        result = read_input(&handle, &input) => {
            result?;
            false
        }
        rendered = &mut render_task => {
            rendered.context("render task panicked")?;
            true
        }
    };

    drop(handle);
    driver_task.await.context("controller task panicked")?;
    if session_ended {
        anyhow::bail!("wallet session ended");
    }
    render_task.await.context("render task panicked")?;
    Ok(())
}

async fn read_input(handle: &ControllerHandle, input: &Mutex<InputBuffer>) -> Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await.context("failed to read stdin")? {
        match parse_input(&line) {
            InputAction::Submit(text) => {
                input.lock().await.record(&text);
                handle.submit(text)?;
            }
            InputAction::Retry => {
                let draft = input.lock().await.draft().map(str::to_string);
                match draft {
                    Some(draft) => handle.submit(draft)?,
                    None => println!("nothing to retry"),
                }
            }
            InputAction::Refresh => handle.refresh()?,
            InputAction::Dismiss => handle.dismiss()?,
            InputAction::Help => println!("{HELP}"),
            InputAction::Quit => break,
        }
    }
    Ok(())
}

async fn render_loop(
    mut updates: Receiver<ControllerUpdate>,
    initial: InteractionState,
    input: Arc<Mutex<InputBuffer>>,
) {
    println!("{}", draw(&render(&initial), None));

    loop {
        match updates.recv().await {
            Ok(ControllerUpdate::Transition { from, to }) => {
                let mut input = input.lock().await;
                if from == InteractionState::Submitting && to == InteractionState::Loading {
                    input.clear();
                }
                println!("{}", draw(&render(&to), input.draft()));
            }
            Ok(ControllerUpdate::Rejected(err)) => println!("busy: {err}"),
            Ok(ControllerUpdate::SessionEnded(err)) => {
                println!("error: {}", describe_session_error(&err));
                break;
            }
            Err(RecvError::Lagged(skipped)) => {
                warn!(skipped, "render fell behind controller updates");
            }
            Err(RecvError::Closed) => break,
        }
    }
}

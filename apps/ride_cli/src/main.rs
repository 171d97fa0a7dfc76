use std::{path::PathBuf, sync::Arc, time::Duration};

use anyhow::{Context, Result};
use clap::Parser;
use ride_core::{
    HttpRideBackend, Rejection, RideBackend, RidePhase, RideRequestController, SessionProvider,
    SimulatedRideBackend, StaticSession,
};
use tokio::{
    io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader},
    sync::broadcast::error::RecvError,
};
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

mod config;
mod surface;

use config::{load_settings, BackendChoice, Settings};
use surface::{auth_panel, parse_line, render_log, render_status, render_update, SurfaceCommand};

#[derive(Parser, Debug)]
#[command(about = "Request a unicorn ride by dropping a pickup pin")]
struct Args {
    /// Settings file; missing file means defaults.
    #[arg(long, default_value = "ride.toml")]
    config: PathBuf,
    #[arg(long)]
    api_url: Option<String>,
    #[arg(long)]
    auth_token: Option<String>,
    /// Use the in-process unicorn fleet instead of the ride API.
    #[arg(long)]
    simulate: bool,
    #[arg(long)]
    eta_seconds: Option<u64>,
}

impl Args {
    fn apply(&self, settings: &mut Settings) {
        if let Some(v) = &self.api_url {
            settings.api_url = Some(v.clone());
        }
        if let Some(v) = &self.auth_token {
            settings.auth_token = Some(v.clone());
        }
        if self.simulate {
            settings.simulate = true;
        }
        if let Some(v) = self.eta_seconds {
            settings.simulated_eta_seconds = v;
        }
    }
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
    let mut settings = load_settings(&args.config)?;
    args.apply(&mut settings);

    let session = StaticSession::new(settings.auth_token.clone());
    let token = match session.access_token().await {
        Ok(token) => {
            debug!("session = {token}");
            Some(token)
        }
        Err(err) => {
            warn!("no session token available: {err}");
            None
        }
    };

    let backend: Arc<dyn RideBackend> = match settings.backend_choice() {
        BackendChoice::Missing => {
            println!("{}", auth_panel(token.as_deref()));
            return Ok(());
        }
        BackendChoice::Simulated => {
            info!(
                fleet = settings.fleet.len(),
                eta_seconds = settings.simulated_eta_seconds,
                "using simulated unicorn fleet"
            );
            Arc::new(SimulatedRideBackend::new(
                settings.fleet.clone(),
                settings.simulated_eta_seconds,
            ))
        }
        BackendChoice::Http { api_url } => {
            let token = token.context(
                "the ride API needs an auth token (--auth-token, RIDE_AUTH_TOKEN or ride.toml)",
            )?;
            let backend = HttpRideBackend::new(
                &api_url,
                &settings.ride_path,
                token,
                Duration::from_secs(settings.request_timeout_seconds),
            )
            .with_context(|| format!("invalid ride API url '{api_url}'"))?;
            info!(endpoint = %backend.endpoint(), "using ride API");
            Arc::new(backend)
        }
    };

    let controller = RideRequestController::spawn(backend);
    let stdin = BufReader::new(tokio::io::stdin());
    let result = tokio::select! {
        result = drive(&controller, stdin, tokio::io::stdout()) => result,
        _ = tokio::signal::ctrl_c() => {
            info!("interrupted");
            Ok(())
        }
    };

    if let Err(err) = controller.shutdown().await {
        debug!("controller already stopped: {err}");
    }
    result
}

async fn write_line<W: AsyncWrite + Unpin>(out: &mut W, line: &str) -> Result<()> {
    out.write_all(line.as_bytes()).await?;
    out.write_all(b"\n").await?;
    out.flush().await?;
    Ok(())
}

/// Feeds map-surface commands from `input` to the controller and writes every
/// update line, numbered by its position in the log, to `out`.
///
/// Once input ends, keeps going until no ride is in flight and every logged
/// line has been written.
async fn drive<R, W>(controller: &RideRequestController, input: R, mut out: W) -> Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut updates = controller.subscribe_updates();
    let mut state = controller.watch();
    let initial = controller.snapshot();
    let mut written = initial.updates().entries().len();
    write_line(&mut out, &render_log(&initial)).await?;
    write_line(&mut out, surface::HELP).await?;

    let mut lines = input.lines();
    let mut input_open = true;
    loop {
        if !input_open {
            let current = controller.snapshot();
            if current.phase() != RidePhase::Requesting
                && written >= current.updates().entries().len()
            {
                return Ok(());
            }
        }

        tokio::select! {
            line = lines.next_line(), if input_open => {
                let Some(line) = line.context("failed to read input")? else {
                    input_open = false;
                    continue;
                };
                if !handle_line(controller, &line, &mut out).await? {
                    // Quit: flush lines already logged, then stop without waiting.
                    while let Ok(line) = updates.try_recv() {
                        written += 1;
                        write_line(&mut out, &render_update(written, &line)).await?;
                    }
                    return Ok(());
                }
            }
            update = updates.recv() => match update {
                Ok(line) => {
                    written += 1;
                    write_line(&mut out, &render_update(written, &line)).await?;
                }
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "update output fell behind");
                    written += skipped as usize;
                }
                Err(RecvError::Closed) => return Ok(()),
            },
            changed = state.changed(), if !input_open => {
                if changed.is_err() {
                    return Ok(());
                }
            }
        }
    }
}

/// Returns `false` once the user asked to quit.
async fn handle_line<W: AsyncWrite + Unpin>(
    controller: &RideRequestController,
    line: &str,
    out: &mut W,
) -> Result<bool> {
    let command = match parse_line(line) {
        Ok(Some(command)) => command,
        Ok(None) => return Ok(true),
        Err(err) => {
            eprintln!("{err}");
            return Ok(true);
        }
    };

    match command {
        SurfaceCommand::Pin(pin) => {
            let ack = controller.select_pin(pin).await?;
            if ack.rejection.is_some() {
                eprintln!("a unicorn is already on the way; pin not moved");
            }
        }
        SurfaceCommand::Request => {
            let ack = controller.request_ride().await?;
            match ack.rejection {
                Some(Rejection::NoPin) => eprintln!("click the map first: pin <lat> <lng>"),
                Some(Rejection::RideInFlight) => eprintln!("a unicorn is already on the way"),
                Some(Rejection::StaleRide(_)) | None => {}
            }
        }
        SurfaceCommand::Status => {
            write_line(out, &render_status(&controller.snapshot())).await?;
        }
        SurfaceCommand::Help => write_line(out, surface::HELP).await?,
        SurfaceCommand::Quit => return Ok(false),
    }
    Ok(true)
}

#[cfg(test)]
#[path = "tests/main_tests.rs"]
mod tests;

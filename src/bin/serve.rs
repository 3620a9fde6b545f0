//! RPC server binary: listens for render requests and answers them with a
//! `LocalRenderer` internally (spec.md §6: "the remote-render wire transport
//! and its server binary" external collaborator). `rpc::serve` already
//! accepts an `mpsc` stop-signal channel for a caller that wants to shut a
//! listener down between connections; this binary has no other control
//! surface, so it just relies on the process's default signal handling
//! (Ctrl-C/SIGTERM) to stop, and never sends on the channel itself.
use clap::Parser;
use std::sync::mpsc;

#[derive(Parser, Debug)]
#[command(about = "Serve render requests over the pathtrace-sdf RPC protocol")]
struct Args {
    #[arg(long, default_value_t = 4242)]
    port: u16,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let args = Args::parse();
    let addr = format!("0.0.0.0:{}", args.port);

    let (_stop_tx, stop_rx) = mpsc::channel();
    tracing::info!(%addr, "listening for render requests");
    pathtrace_sdf::render::rpc::serve(addr, stop_rx)?;
    Ok(())
}

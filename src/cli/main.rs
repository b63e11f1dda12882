mod commands;

use std::io::Write;

use anyhow::{Context, Result};
use coin_ledger::{
    export_transactions, Clock, FileLedger, FixedClock, RawRequest, Request, Response,
    SystemClock, TransferEngine,
};
use commands::{Args, Parser};

fn main() -> Result<()> {
    // Parse the CLI arguments
    let args = Args::parse();

    // Initialize logger with default level of info (can be overridden with RUST_LOG)
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    // 1. Validate the request before touching the ledger
    let request = Request::try_from(RawRequest::new(args.operation, args.args.clone()))
        .with_context(|| format!("Invalid arguments for {}", args.operation))?;

    // 2. Load the ledger snapshot
    let ledger = FileLedger::open(&args.ledger)
        .with_context(|| format!("Failed to open ledger: {}", args.ledger.display()))?;
    log::info!(
        "Loaded {} keys from {}",
        ledger.len(),
        args.ledger.display()
    );

    // 3. Run the operation
    let response = match args.date {
        Some(date) => run(&ledger, FixedClock::new(date), request),
        None => run(&ledger, SystemClock, request),
    }
    .with_context(|| format!("Operation {} failed", args.operation))?;

    // 4. Persist only what a successful mutating operation changed
    if args.operation.is_mutating() {
        ledger
            .save()
            .with_context(|| format!("Failed to save ledger: {}", args.ledger.display()))?;
        log::info!("Saved {} keys to {}", ledger.len(), args.ledger.display());
    }

    // 5. Print the result to stdout
    print_response(&response)
}

fn run<C: Clock>(
    ledger: &FileLedger,
    clock: C,
    request: Request,
) -> Result<Response, coin_ledger::Error> {
    TransferEngine::with_clock(ledger, clock).execute(request)
}

fn print_response(response: &Response) -> Result<()> {
    let stdout = std::io::stdout();
    match response {
        Response::Done => Ok(()),
        Response::Transactions(records) => export_transactions(records, stdout.lock())
            .context("Failed to export transactions to stdout"),
        other => {
            let mut out = stdout.lock();
            serde_json::to_writer_pretty(&mut out, other)
                .context("Failed to write response to stdout")?;
            writeln!(out)?;
            Ok(())
        }
    }
}

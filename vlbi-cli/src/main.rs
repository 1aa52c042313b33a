mod classify;
mod mk6open;
mod scancheck;
mod vbsopen;

use clap::{Parser, Subcommand};

/// VLBI Data-Acquisition Engine — diagnostic CLI.
#[derive(Parser)]
#[command(name = "vlbi-cli")]
struct Args {
    /// Display version and quit
    #[arg(long)]
    version: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Probe a recording for its frame format and report the
    /// combined start/end data-check result.
    ScanCheck(scancheck::ScanCheckArgs),
    /// Open a FlexBuff/VBS recording across one or more mountpoints
    /// as a single virtual file.
    VbsOpen(vbsopen::VbsOpenArgs),
    /// Open a single Mark6 container file as a virtual file.
    Mk6Open(mk6open::Mk6OpenArgs),
    /// Classify VDIF keys against a set of datastream rules.
    Classify(classify::ClassifyArgs),
    /// Run the producer -> framer -> writer demo chain (scenario 6).
    DemoChain,
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp(None)
        .init();

    let args = Args::parse();

    if let Err(e) = run(&args) {
        log::error!("{}", e);
        std::process::exit(1);
    }
}

fn run(args: &Args) -> Result<(), Box<dyn std::error::Error>> {
    if args.version {
        print_version();
        return Ok(());
    }

    match &args.command {
        Some(Command::ScanCheck(a)) => scancheck::run(a),
        Some(Command::VbsOpen(a)) => vbsopen::run(a),
        Some(Command::Mk6Open(a)) => mk6open::run(a),
        Some(Command::Classify(a)) => classify::run(a),
        Some(Command::DemoChain) => run_demo_chain(),
        None => Err("no subcommand given; try --help".into()),
    }
}

fn print_version() {
    println!("VLBI Data-Acquisition Engine CLI");
    let release = env!("RELEASE_VERSION");
    let commit = env!("GIT_COMMIT");
    if !release.is_empty() {
        println!("\tVersion:     {}", release);
    } else {
        println!("\tGit commit:  {}", commit);
    }
}

/// Scenario 6: a 3-step chain (producer -> framer -> writer), run with
/// 1000 synthetic frames, cancelled halfway through.
fn run_demo_chain() -> Result<(), Box<dyn std::error::Error>> {
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;
    use vlbi_chain::{Chain, WorkerOutcome};

    let total_frames = 1000u32;
    let cancel_at = 500u32;

    let mut chain: Chain<u32> = Chain::new();

    chain.add_source(0u32, 16, move |produced, out| {
        if *produced >= total_frames {
            return WorkerOutcome::Stop;
        }
        *produced += 1;
        out.send(*produced).ok();
        WorkerOutcome::Continue
    });

    chain.add_transform((), 16, |_, frame, out| {
        out.send(frame).ok();
        WorkerOutcome::Continue
    });

    let flushed = Arc::new(AtomicU32::new(0));
    let flushed_sink = Arc::clone(&flushed);
    chain.add_sink(0u32, 16, move |seen, frame| {
        *seen += 1;
        flushed_sink.fetch_add(1, Ordering::Relaxed);
        if frame >= cancel_at {
            return WorkerOutcome::Stop;
        }
        WorkerOutcome::Continue
    });

    chain.run()?;
    std::thread::sleep(std::time::Duration::from_millis(200));
    chain.gentle_stop()?;
    chain.join()?;
    chain.finalize();

    println!("flushed {} of {} frames", flushed.load(Ordering::Relaxed), total_frames);
    println!("final transfer mode: {:?}", vlbi_runtime::TransferMode::NoTransfer);
    Ok(())
}

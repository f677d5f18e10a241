use std::{
    path::{Path, PathBuf},
    sync::Arc,
    time::{Duration, Instant},
};

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use vrnotify::{
    ChannelOpts, CompositorCall, EngineOpts, FrameRate, OverlayChannel, Payload, PhasePlan,
    RecordingCompositor,
};

#[derive(Parser, Debug)]
#[command(name = "vrnotify", version)]
struct Cli {
    /// Log engine activity (overridden by `RUST_LOG`).
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the phase plan of every payload as JSON.
    Plan(PlanArgs),
    /// Play payloads headlessly through a recording compositor.
    Play(PlayArgs),
}

#[derive(Parser, Debug)]
struct PlanArgs {
    /// Input payload JSON (one object or an array).
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Rate for payloads with `hz` 0.
    #[arg(long, default_value_t = 60)]
    default_hz: u32,
}

#[derive(Parser, Debug)]
struct PlayArgs {
    /// Input payload JSON (one object or an array).
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Image used by payloads that carry no image of their own.
    #[arg(long)]
    image: Option<PathBuf>,

    /// Rate for payloads with `hz` 0.
    #[arg(long, default_value_t = 60)]
    default_hz: u32,

    /// Overlay channel number.
    #[arg(long, default_value_t = 0)]
    channel: u32,

    /// Overlay title.
    #[arg(long, default_value = "vrnotify")]
    title: String,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    match cli.cmd {
        Command::Plan(args) => cmd_plan(args),
        Command::Play(args) => cmd_play(args),
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "vrnotify=debug" } else { "warn" };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn read_payloads(path: &Path) -> anyhow::Result<Vec<Payload>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("read payloads '{}'", path.display()))?;
    let payloads = Payload::list_from_json(&text).with_context(|| "parse payload JSON")?;
    if payloads.is_empty() {
        anyhow::bail!("'{}' contains no payloads", path.display());
    }
    Ok(payloads)
}

fn cmd_plan(args: PlanArgs) -> anyhow::Result<()> {
    let default_rate = FrameRate::new(args.default_hz)?;
    let payloads = read_payloads(&args.in_path)?;

    #[derive(serde::Serialize)]
    struct Entry {
        index: usize,
        duration_ms: u64,
        plan: PhasePlan,
    }

    let entries = payloads
        .iter()
        .enumerate()
        .map(|(index, p)| {
            let plan = PhasePlan::for_payload(p, default_rate);
            Entry {
                index,
                duration_ms: u64::from(plan.total_frames()) * u64::from(plan.ms_per_frame),
                plan,
            }
        })
        .collect::<Vec<_>>();

    println!("{}", serde_json::to_string_pretty(&entries)?);
    Ok(())
}

fn cmd_play(args: PlayArgs) -> anyhow::Result<()> {
    let default_rate = FrameRate::new(args.default_hz)?;
    let root = args.in_path.parent().unwrap_or_else(|| Path::new("."));
    let fallback_image = match &args.image {
        Some(path) => Some(
            std::fs::read(path).with_context(|| format!("read image '{}'", path.display()))?,
        ),
        None => None,
    };

    let mut payloads = Vec::new();
    for (index, p) in read_payloads(&args.in_path)?.into_iter().enumerate() {
        let mut p = p.resolve_image(root)?;
        if p.image.is_empty()
            && let Some(image) = &fallback_image
        {
            p.image = image.clone();
        }
        p.validate()
            .with_context(|| format!("payload {index} is invalid"))?;
        vrnotify::decode_texture(&p.image)
            .with_context(|| format!("payload {index} has no usable image"))?;
        payloads.push(p);
    }

    let plans = payloads
        .iter()
        .map(|p| PhasePlan::for_payload(p, default_rate))
        .collect::<Vec<_>>();
    let budget_ms: u64 = plans
        .iter()
        .map(|plan| u64::from(plan.total_frames()) * u64::from(plan.ms_per_frame))
        .sum();

    let recorder = RecordingCompositor::new();
    let opts = ChannelOpts {
        channel: args.channel,
        title: args.title,
        engine: EngineOpts {
            default_hz: default_rate,
            idle_poll: Duration::from_millis(10),
            ..EngineOpts::default()
        },
        ..ChannelOpts::default()
    };
    let mut channel = OverlayChannel::open(Arc::new(recorder.clone()), opts)?;
    for p in payloads {
        channel.enqueue(p);
    }

    let expected = plans.len() as u64;
    let deadline = Instant::now() + Duration::from_millis(budget_ms * 4 + 5_000);
    loop {
        let done = channel.engine().map_or(0, |e| e.completed_cycles());
        if done >= expected {
            break;
        }
        if Instant::now() > deadline {
            anyhow::bail!("timed out after {done} of {expected} cycles");
        }
        std::thread::sleep(Duration::from_millis(5));
    }
    channel.deinit()?;

    print_summary(&recorder.calls(), &plans);
    Ok(())
}

fn print_summary(calls: &[CompositorCall], plans: &[PhasePlan]) {
    let mut pushes_per_cycle = Vec::new();
    let mut pushes = 0usize;
    for call in calls {
        match call {
            CompositorCall::Transform(..) => pushes += 1,
            CompositorCall::Visibility(_, false) if pushes > 0 => {
                pushes_per_cycle.push(pushes);
                pushes = 0;
            }
            _ => {}
        }
    }

    for (i, (plan, pushes)) in plans.iter().zip(&pushes_per_cycle).enumerate() {
        println!(
            "cycle {i}: {} frames @ {} Hz ({}/{}/{}), {pushes} pushes",
            plan.total_frames(),
            plan.hz,
            plan.ease_in_frames,
            plan.stay_frames,
            plan.ease_out_frames,
        );
    }
    eprintln!(
        "played {} cycles, {} compositor calls",
        pushes_per_cycle.len(),
        calls.len()
    );
}

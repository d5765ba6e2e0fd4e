use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::EnvFilter;

use pmuflow::common::{CpuidProbe, HostIdentity, HostProbe, StaticProbe};
use pmuflow::events::validate::validate;
use pmuflow::{PmuDescriptor, PmuRegistry, Session, SessionConfig};

#[derive(Parser, Debug)]
#[command(name = "pmuflow")]
#[command(about = "Encode hardware performance events for AMD64 PMUs")]
struct Args {
    #[arg(
        long,
        global = true,
        help = "Use this PMU instead of detecting one (overrides PMUFLOW_FORCE_PMU)"
    )]
    pmu: Option<String>,

    #[arg(
        long,
        global = true,
        value_name = "[VENDOR:]FAMILY:MODEL:STEPPING",
        help = "Detect against a simulated CPU instead of the host"
    )]
    simulate: Option<HostIdentity>,

    #[arg(long, global = true, help = "Print JSON instead of text")]
    json: bool,

    #[arg(short, long, global = true, help = "Enable verbose logging")]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List registered PMUs and which one the host activates
    Pmus,
    /// List the events of the active PMU
    List {
        #[arg(long, help = "Include unit masks and modifiers")]
        details: bool,
    },
    /// Describe one event and its attributes
    Info { event: String },
    /// Encode event strings into register values
    Encode {
        #[arg(required = true)]
        events: Vec<String>,
    },
    /// Run the table self-validator over every built-in PMU
    Validate,
}

#[derive(Serialize)]
struct PmuSummary {
    name: &'static str,
    id: u32,
    description: &'static str,
    revision: Option<u32>,
    events: usize,
    active: bool,
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn show_pmus(args: &Args, config: &SessionConfig, probe: &dyn HostProbe) -> anyhow::Result<()> {
    let registry = PmuRegistry::builtin();
    let active = match registry.activate_with(config, probe) {
        Ok(pmu) => Some(pmu.id),
        Err(e) => {
            tracing::warn!("{}", e);
            None
        }
    };

    let summaries: Vec<PmuSummary> = registry
        .pmus()
        .iter()
        .map(|p| PmuSummary {
            name: p.name,
            id: p.id.0,
            description: p.description,
            revision: p.revision(),
            events: p.events().count(),
            active: Some(p.id) == active,
        })
        .collect();

    if args.json {
        return print_json(&summaries);
    }

    for s in &summaries {
        println!(
            "{} {:<24} id={:<3} events={:<3} {}",
            if s.active { "*" } else { " " },
            s.name,
            s.id,
            s.events,
            s.description
        );
    }
    Ok(())
}

fn list_events(args: &Args, pmu: &PmuDescriptor, details: bool) -> anyhow::Result<()> {
    if args.json {
        let infos = pmu
            .events()
            .map(|idx| pmu.event_info(idx))
            .collect::<pmuflow::Result<Vec<_>>>()?;
        return print_json(&infos);
    }

    println!("PMU {} ({})", pmu.name, pmu.description);
    for idx in pmu.events() {
        let info = pmu.event_info(idx)?;
        println!("  {:#05x} {:<44} {}", info.code, info.name, info.description);
        if details {
            for attr in pmu.attrs(idx)? {
                println!("        {:<32} {}", attr.name, attr.description);
            }
        }
    }
    Ok(())
}

fn show_event(args: &Args, pmu: &PmuDescriptor, name: &str) -> anyhow::Result<()> {
    let idx = pmu.find_event(name)?;
    let info = pmu.event_info(idx)?;
    let attrs = pmu.attrs(idx)?;

    if args.json {
        return print_json(&serde_json::json!({ "event": info, "attrs": attrs }));
    }

    println!("PMU        : {} ({})", info.pmu, info.pmu_id);
    println!("Name       : {}", info.name);
    println!("Code       : {:#x}", info.code);
    println!("Description: {}", info.description);
    for attr in &attrs {
        let detail = match (attr.value, attr.domain) {
            (Some(v), _) => format!("{v:#04x}"),
            (None, Some(domain)) => serde_json::to_string(&domain)?,
            (None, None) => String::new(),
        };
        println!(
            "  [{}] {:?} {:<32} {:<24} {}{}",
            attr.index,
            attr.kind,
            attr.name,
            detail,
            attr.description,
            if attr.is_default { " (default)" } else { "" }
        );
    }
    Ok(())
}

fn encode_events(args: &Args, session: &Session, events: &[String]) -> anyhow::Result<()> {
    let mut encoded = Vec::with_capacity(events.len());
    let mut failures = 0;

    for event in events {
        match session.encode(event) {
            Ok(enc) => encoded.push(enc),
            Err(e) => {
                eprintln!("{event}: {e}");
                failures += 1;
            }
        }
    }

    if args.json {
        print_json(&encoded)?;
    } else {
        for enc in &encoded {
            let codes: Vec<String> = enc.codes.iter().map(|c| format!("{c:#x}")).collect();
            println!("{}", enc.fstr);
            println!("  codes  : [{}]", codes.join(", "));
            println!("  config : {:#x} config1: {:#x}", enc.config, enc.config1);
            println!(
                "  flags  : exclude_user={} exclude_kernel={} exclude_host={} exclude_guest={} pinned={} precise={}",
                enc.flags.exclude_user,
                enc.flags.exclude_kernel,
                enc.flags.exclude_host,
                enc.flags.exclude_guest,
                enc.flags.pinned,
                enc.flags.precise
            );
        }
    }

    if failures > 0 {
        bail!("{failures} of {} events could not be encoded", events.len());
    }
    Ok(())
}

fn validate_tables() -> anyhow::Result<()> {
    let mut failed = 0;
    for pmu in pmuflow::tables::builtin() {
        match validate(&pmu) {
            Ok(()) => println!("{:<24} OK ({} events)", pmu.name, pmu.events.len()),
            Err(errors) => {
                failed += 1;
                println!("{:<24} FAILED", pmu.name);
                for e in errors {
                    println!("    {e}");
                }
            }
        }
    }

    if failed > 0 {
        bail!("{failed} tables failed validation");
    }
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let mut config = SessionConfig::from_env().with_force_pmu(args.pmu.clone());
    config.verbose |= args.verbose;

    // Setup logging based on verbose flag
    let log_level = if config.verbose {
        LevelFilter::DEBUG
    } else {
        LevelFilter::INFO
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::builder()
                .with_default_directive(log_level.into())
                .from_env_lossy(),
        )
        .with_writer(std::io::stderr)
        .init();

    let probe: Box<dyn HostProbe> = match &args.simulate {
        Some(host) => {
            tracing::info!("Simulating host {}", host);
            Box::new(StaticProbe(host.clone()))
        }
        None => Box::new(CpuidProbe),
    };

    match &args.command {
        Command::Pmus => show_pmus(&args, &config, &*probe),
        Command::Validate => validate_tables(),
        command => {
            let session = Session::with_config(&config, &*probe)
                .context("No usable PMU, try --pmu or --simulate")?;
            let pmu = session.pmu()?;
            tracing::debug!("Using PMU {}", pmu.name);

            match command {
                Command::List { details } => list_events(&args, pmu, *details),
                Command::Info { event } => show_event(&args, pmu, event),
                Command::Encode { events } => encode_events(&args, &session, events),
                Command::Pmus | Command::Validate => Ok(()),
            }
        }
    }
}

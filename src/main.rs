use anyhow::{Context, bail};
use chrono::{Local, NaiveDateTime, TimeZone};
use clap::{Args, Parser, Subcommand};
use std::net::Ipv4Addr;
use std::path::PathBuf;
use std::sync::Arc;

use testbed_scheduler::domain::clock::clock::WallClock;
use testbed_scheduler::domain::cluster::node_range::{split_range, unsplit_range};
use testbed_scheduler::domain::cluster::resolver::{DnsResolver, NameResolver, StaticResolver};
use testbed_scheduler::domain::scheduler::request::ReservationRequest;
use testbed_scheduler::domain::scheduler::reservation_manager::ReservationManager;
use testbed_scheduler::{generate_reservation_manager, load_config, logger};

const INPUT_TIME_FORMAT: &str = "%Y-%b-%d-%H:%M";
const OUTPUT_TIME_FORMAT: &str = "%b %e %H:%M";
const SHOW_SLICES: usize = 24;

#[derive(Debug, Parser)]
#[command(name = "igor", about = "Reserve blocks of cluster nodes for a time window")]
struct Cli {
    /// Path to the JSON configuration file.
    #[arg(long, default_value = "igor.json")]
    config: PathBuf,

    /// Resolve node names from a generated host table starting at this address instead of DNS.
    #[arg(long)]
    static_hosts: Option<Ipv4Addr>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Create a reservation, or preview available times with -s.
    Sub(SubArgs),
    /// List reservations and the occupancy of the upcoming slices.
    Show,
    /// Delete a reservation.
    Del {
        /// Name of the reservation.
        #[arg(short = 'r')]
        name: String,
    },
}

#[derive(Debug, Args)]
struct SubArgs {
    /// Name of the reservation.
    #[arg(short = 'r')]
    name: String,

    /// Number of nodes; the first available block is allocated.
    #[arg(short = 'n', conflicts_with = "nodes", required_unless_present = "nodes")]
    count: Option<usize>,

    /// Explicit node list, e.g. kn[1-4,9].
    #[arg(short = 'w')]
    nodes: Option<String>,

    /// Reservation length in minutes.
    #[arg(short = 't', default_value_t = 60)]
    minutes: i64,

    /// Kernel command line arguments.
    #[arg(short = 'c', default_value = "")]
    kernel_args: String,

    /// Only print a selection of available times, do not reserve.
    #[arg(short = 's')]
    speculative: bool,

    /// Start on or after this time, e.g. 2026-Jan-2-15:04.
    #[arg(short = 'a')]
    after: Option<String>,
}

fn format_time(unix: i64) -> String {
    match Local.timestamp_opt(unix, 0).single() {
        Some(time) => time.format(OUTPUT_TIME_FORMAT).to_string(),
        None => unix.to_string(),
    }
}

fn parse_after(value: &str) -> anyhow::Result<i64> {
    let naive = NaiveDateTime::parse_from_str(value, INPUT_TIME_FORMAT).with_context(|| format!("invalid time {:?}, expected e.g. 2026-Jan-2-15:04", value))?;

    match Local.from_local_datetime(&naive).earliest() {
        Some(time) => Ok(time.timestamp()),
        None => bail!("time {:?} does not exist in the local time zone", value),
    }
}

fn current_user() -> String {
    std::env::var("USER").or_else(|_| std::env::var("USERNAME")).unwrap_or_else(|_| "unknown".to_string())
}

async fn run_sub(manager: &ReservationManager, args: SubArgs) -> anyhow::Result<()> {
    let topology = manager.config().topology.clone();

    let mut request = match (&args.nodes, args.count) {
        (Some(nodes), _) => ReservationRequest::by_hosts(&args.name, current_user(), args.minutes, split_range(&topology, nodes)?),
        (None, Some(count)) => ReservationRequest::by_count(&args.name, current_user(), args.minutes, count),
        (None, None) => bail!("either -n or -w is required"),
    };
    request = request.with_kernel_args(args.kernel_args);

    if let Some(after) = &args.after {
        request = request.with_not_before(parse_after(after)?);
    }

    if args.speculative {
        println!("AVAILABLE RESERVATIONS");
        println!("START\t\tEND\t\tNODES");
        for window in manager.speculate(&request).await? {
            println!("{}\t{}\t{}", format_time(window.start_time), format_time(window.end_time), unsplit_range(&topology, &window.hosts)?);
        }
        return Ok(());
    }

    let reservation = manager.submit(request).await?;

    println!("Reservation created for {} - {}", format_time(reservation.start_time), format_time(reservation.end_time));
    println!("Nodes: {}", unsplit_range(&topology, &reservation.hosts)?);
    println!("VLAN: {}", reservation.vlan.map(|vlan| vlan.to_string()).unwrap_or_default());
    Ok(())
}

async fn run_show(manager: &ReservationManager) -> anyhow::Result<()> {
    let topology = manager.config().topology.clone();

    println!("NAME\tOWNER\tSTART\t\tEND\t\tVLAN\tNODES");
    for reservation in manager.list().await {
        println!(
            "{}\t{}\t{}\t{}\t{}\t{}",
            reservation.name,
            reservation.owner,
            format_time(reservation.start_time),
            format_time(reservation.end_time),
            reservation.vlan.map(|vlan| vlan.to_string()).unwrap_or_default(),
            unsplit_range(&topology, &reservation.hosts)?
        );
    }

    println!();
    println!("SLICE START\tFREE");
    let schedule = manager.schedule().await;
    for slice in schedule.slices().iter().take(SHOW_SLICES) {
        println!("{}\t{}/{}", format_time(slice.start), slice.free_count(), slice.node_count());
    }

    Ok(())
}

async fn run_del(manager: &ReservationManager, name: &str) -> anyhow::Result<()> {
    let Some(reservation) = manager.get(name).await else {
        bail!("no reservation named {}", name);
    };

    let user = current_user();
    if reservation.owner != user {
        bail!("reservation {} belongs to {}, not {}", name, reservation.owner, user);
    }

    manager.delete(name).await?;
    println!("Deleted reservation {}", name);
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = load_config(&cli.config).with_context(|| format!("loading {}", cli.config.display()))?;
    logger::init(&config.log);

    let resolver: Arc<dyn NameResolver> = match cli.static_hosts {
        Some(base) => Arc::new(StaticResolver::for_topology(&config.topology, base)),
        None => Arc::new(DnsResolver),
    };

    let manager = generate_reservation_manager(config, Arc::new(WallClock::new()), resolver)?;

    match cli.command {
        Command::Sub(args) => run_sub(&manager, args).await,
        Command::Show => run_show(&manager).await,
        Command::Del { name } => run_del(&manager, &name).await,
    }
}

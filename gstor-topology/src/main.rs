use std::path::PathBuf;

use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

use gstor_topology::{Config, Topology};

#[derive(Parser, Debug)]
#[command(version, about = "Inspect a gstor topology store", long_about = None)]
struct Args {
    /// Data directory holding the topology database
    #[arg(short, long, default_value = "/var/lib/gstor/topology")]
    data_dir: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List cluster ids
    Clusters,
    /// Show one cluster
    Cluster { id: String },
    /// Show one node with its devices
    Node { id: String },
    /// Show one device with its bricks
    Device { id: String },
    /// List volume ids
    Volumes,
    /// Show one volume with its bricks
    Volume { id: String },
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive("gstor_topology=info".parse()?),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let topology = Topology::open(&Config::new(args.data_dir))?;

    match args.command {
        Commands::Clusters => print_json(&topology.list_clusters()?),
        Commands::Cluster { id } => print_json(&topology.cluster_info(&id)?),
        Commands::Node { id } => print_json(&topology.node_info(&id)?),
        Commands::Device { id } => print_json(&topology.device_info(&id)?),
        Commands::Volumes => print_json(&topology.list_volumes()?),
        Commands::Volume { id } => print_json(&topology.volume_info(&id)?),
    }
}

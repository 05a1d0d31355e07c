/**
 * rust-kad
 * Command line peer lookup
 *
 * https://github.com/ryankurte/rust-kad
 * Copyright 2018 Ryan Kurte
 */

use std::net::SocketAddr;

use clap::{Parser, Subcommand};
use tracing::{info, warn};
use tracing_subscriber::{fmt, EnvFilter};

use kad_lookup::{Config, Dht, Error, NodeInfo, PeerEntry, PeerId, TcpRouter, TcpServer};

#[derive(Debug, Parser)]
#[command(name = "kad-lookup", author, version, about)]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Enable info logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Enable debug logging
    #[arg(long = "very-verbose", visible_alias = "vv", global = true)]
    very_verbose: bool,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Locate a peer by identity and print its addresses
    Findnode {
        /// Identity of the peer to locate (hex)
        #[arg(long)]
        target: PeerId,

        #[command(flatten)]
        bootstrap: Bootstrap,

        #[command(flatten)]
        config: Config,
    },
    /// Answer lookup requests from other peers
    Serve {
        /// Identity to serve as (hex), random if not provided
        #[arg(long)]
        identity: Option<PeerId>,

        /// Address to listen on
        #[arg(long, default_value = "127.0.0.1:0")]
        listen: SocketAddr,

        #[command(flatten)]
        bootstrap: OptionalBootstrap,

        #[command(flatten)]
        config: Config,
    },
}

#[derive(Debug, clap::Args)]
struct Bootstrap {
    /// Identity of the bootstrap peer (hex)
    #[arg(long)]
    bootstrap: PeerId,

    /// Address of the bootstrap peer
    #[arg(long)]
    bootstrap_addr: SocketAddr,
}

#[derive(Debug, clap::Args)]
struct OptionalBootstrap {
    /// Identity of a bootstrap peer (hex)
    #[arg(long, requires = "bootstrap_addr")]
    bootstrap: Option<PeerId>,

    /// Address of the bootstrap peer
    #[arg(long, requires = "bootstrap")]
    bootstrap_addr: Option<SocketAddr>,
}

impl Bootstrap {
    fn entry(&self) -> PeerEntry {
        NodeInfo::new(self.bootstrap, vec![self.bootstrap_addr]).into_entry()
    }
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    let level = match (args.verbose, args.very_verbose) {
        (_, true) => "debug",
        (true, _) => "info",
        _ => "warn",
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run(args.command).await {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

async fn run(command: Command) -> Result<(), Error> {
    match command {
        Command::Findnode {
            target,
            bootstrap,
            config,
        } => {
            // Ephemeral identity, we are not contactable so advertise no addresses
            let local = NodeInfo::new(PeerId::random(), vec![]);
            let router = TcpRouter::new(local.clone(), config.request_timeout);
            let dht = Dht::new(local.peer().key(), config, router);

            let peer = dht.router().connect(&bootstrap.entry()).await?;
            dht.add_nodes(&[peer]);

            info!("Searching for {}", target);

            let found = dht.find_node(target.key()).await?;
            info!("Found {} with {} addresses", target, found.info().addresses().len());

            for a in found.info().addresses() {
                info!("Address: {}", a);
                println!("{a}");
            }

            Ok(())
        }
        Command::Serve {
            identity,
            listen,
            bootstrap,
            config,
        } => {
            let peer = identity.unwrap_or_else(PeerId::random);
            let server = TcpServer::bind(peer, listen).await?;
            let local = server.local().clone();

            let router = TcpRouter::new(local.info().clone(), config.request_timeout);
            let dht = Dht::new(*local.id(), config, router);

            if let (Some(id), Some(addr)) = (bootstrap.bootstrap, bootstrap.bootstrap_addr) {
                let entry = NodeInfo::new(id, vec![addr]).into_entry();
                match dht.router().connect(&entry).await {
                    Ok(p) => {
                        dht.add_nodes(&[p]);
                        info!("Bootstrapped via {}", id);
                    }
                    Err(e) => warn!("Bootstrap via {} failed: {}", id, e),
                }
            }

            println!("{} {}", local.info().peer(), listen_addr(&local));

            tokio::select! {
                r = server.run(dht) => r,
                _ = tokio::signal::ctrl_c() => {
                    info!("Received shutdown signal, exiting");
                    Ok(())
                }
            }
        }
    }
}

fn listen_addr(local: &PeerEntry) -> String {
    local
        .info()
        .addresses()
        .iter()
        .map(|a| a.to_string())
        .collect::<Vec<_>>()
        .join(",")
}

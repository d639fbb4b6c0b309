//! Master engine binary.
//!
//! Reads GTP on stdin/stdout, coordinates slave workers over TCP.

use clap::Parser;

use pachi_master::Config;
use pachi_master::Master;

#[derive(Parser)]
#[command(about = "Distributed MCTS master engine")]
struct Args {
    /// Comma-separated key=value engine configuration (spec §6), e.g.
    /// "slave_port=1234,max_slaves=16".
    #[arg(long)]
    config: Option<String>,

    /// TCP port slaves connect to. Overrides `config`'s `slave_port`.
    #[arg(long)]
    slave_port: Option<u16>,

    /// Optional log fan-in port. Overrides `config`'s `proxy_port`.
    #[arg(long)]
    proxy_port: Option<u16>,
}

#[tokio::main]
async fn main() {
    pachi_master::logging::install();

    let args = Args::parse();
    let mut config = match args.config.as_deref() {
        Some(s) => match Config::parse(s) {
            Ok(c) => c,
            Err(e) => {
                log::error!("{e}");
                std::process::exit(e.exit_code());
            }
        },
        None => Config {
            slave_port: 0,
            proxy_port: None,
            max_slaves: 100,
            slaves_quit: false,
        },
    };
    if let Some(port) = args.slave_port {
        config.slave_port = port;
    }
    if let Some(port) = args.proxy_port {
        config.proxy_port = Some(port);
    }
    if config.slave_port == 0 {
        log::error!("slave_port is required (via --config or --slave-port)");
        std::process::exit(1);
    }

    if let Err(e) = Master::new(config).run().await {
        log::error!("master exited with error: {e}");
        std::process::exit(1);
    }
}

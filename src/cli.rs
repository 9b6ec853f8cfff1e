use clap::{Parser, Subcommand};
use std::net::SocketAddr;

#[derive(Parser, Debug)]
#[command(name = "warmcache")]
#[command(about = "Keeps cloud metadata caches warm", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the refresh scheduler and the admin API
    Serve(ServeArgs),
    /// Run one refresh cycle and exit
    RefreshOnce,
}

#[derive(clap::Args, Debug)]
pub struct ServeArgs {
    /// Address for the admin API (defaults to `server.bind_addr`)
    #[arg(long)]
    pub address: Option<SocketAddr>,
}

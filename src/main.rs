//! titoctl CLI — operational shell for the TITO/EF5 nowcasting pipeline.

use clap::Parser;

#[derive(Parser, Debug)]
#[command(
    name = "titoctl",
    version,
    about = "Operational shell for the TITO/EF5 nowcasting pipeline — binary discovery, config patching, data fetch, hourly runs"
)]
struct Cli {
    #[command(subcommand)]
    command: titoctl::cli::Commands,
}

fn main() {
    let cli = Cli::parse();
    if let Err(e) = titoctl::cli::dispatch(cli.command) {
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
}

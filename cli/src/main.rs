use clap::Parser;

use sustainabot_lib::{logging, run, Cli};

fn main() {
    let cli = Cli::parse();
    logging::init(cli.verbose);
    std::process::exit(run(cli));
}

use clap::Parser;

use act_cli::cli::Commands;
use act_cli::commands;
use act_cli::Cli;

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    let exit_code = match cli.command {
        Commands::Lex { file } => commands::run_lex(&file),
        Commands::Parse { file } => commands::run_parse(&file),
        Commands::Type { file, json } => commands::run_type(&file, json),
        Commands::Prove {
            file,
            solver,
            smttimeout,
            debug,
        } => commands::run_prove(&file, &solver, smttimeout, debug),
        Commands::Coq { .. } => commands::run_unimplemented_backend("coq"),
        Commands::K { .. } => commands::run_unimplemented_backend("k"),
        Commands::Hevm { .. } => commands::run_unimplemented_backend("hevm"),
    };

    std::process::exit(exit_code);
}

use cat_processor::cli::{Args, commands};
use clap::Parser;
use std::process;

fn main() {
    // Parse command line arguments
    let args = Args::parse();

    // If no subcommand was provided, show help and available commands
    if args.command.is_none() {
        show_help_and_commands();
        process::exit(0);
    }

    match commands::run(args) {
        Ok(()) => process::exit(0),
        Err(error) => {
            eprintln!("Error: {:#}", error);
            process::exit(1);
        }
    }
}

/// Show help information and available commands when no subcommand is provided
fn show_help_and_commands() {
    println!("CAT Processor - Spanish Cadastre interchange file decoder");
    println!("=========================================================");
    println!();
    println!("Decode Catastro CAT fixed-width files (plain or .gz) and convert");
    println!("their records into typed Parquet or CSV tables.");
    println!();
    println!("USAGE:");
    println!("    cat-processor <COMMAND> [OPTIONS]");
    println!();
    println!("COMMANDS:");
    println!("    convert     Convert CAT files to Parquet or CSV tables (main command)");
    println!("    count       Count the records of each type in a CAT file");
    println!("    inspect     Print the first decoded records of one type");
    println!("    schema      Show the field layout of the supported record types");
    println!("    help        Show this help message or help for specific commands");
    println!();
    println!("OPTIONS:");
    println!("    -h, --help       Show help information");
    println!("    -V, --version    Show version information");
    println!();
    println!("EXAMPLES:");
    println!("    cat-processor convert ./downloads -o ./tables");
    println!("    cat-processor convert 28_079_U_2024.CAT.gz --tags 11,13,15 --format csv");
    println!("    cat-processor count 28_079_U_2024.CAT.gz");
    println!("    cat-processor inspect 28_079_U_2024.CAT.gz 15 --fields parcela_catastral,numero_cargo");
    println!("    cat-processor schema 14");
    println!();
    println!("For more information on a specific command, use:");
    println!("    cat-processor <COMMAND> --help");
}

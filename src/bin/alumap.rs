//! Resource address lookup.
//!
//! Usage: `alumap <QUERY>...` or `alumap --table`

use std::process;

use alubind::alu::ResourceAddress;
use clap::Parser;
use log::error;

#[derive(Parser, Debug)]
#[command(name = "alumap")]
#[command(about = "Convert ALU resource addresses to names and names to addresses")]
struct Args {
    /// Address numbers (e.g. 10) or resource names (e.g. word0_reg)
    #[arg(required_unless_present = "table")]
    queries: Vec<String>,

    /// Print every valid address with its name
    #[arg(long)]
    table: bool,
}

fn lookup(query: &str) -> Option<String> {
    match query.parse::<u8>() {
        Ok(number) => ResourceAddress::new(number).map(|a| a.name()),
        Err(_) => ResourceAddress::from_name(query).map(|a| a.number().to_string()),
    }
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let args = Args::parse();

    if args.table {
        for address in ResourceAddress::all() {
            println!("{:>3}  {}", address.number(), address);
        }
    }

    let mut failed = false;
    for query in &args.queries {
        match lookup(query) {
            Some(answer) => println!("{}\t{}", query, answer),
            None => {
                error!("'{}' is not a valid resource address or name", query);
                failed = true;
            }
        }
    }
    if failed {
        process::exit(1);
    }
}

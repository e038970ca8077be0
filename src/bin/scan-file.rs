use clap::Parser;
use connection_indexer::ledger::DedupLedger;
use connection_indexer::linkedin::{
    CardLocator, Extractor, Harvester, HeadlineParser, LocatorStrategy, DEFAULT_ORIGIN,
};
use std::path::PathBuf;

/// Runs one locate + extract pass over saved pages and prints what was found.
#[derive(Parser)]
struct Args {
    #[arg(required = true)]
    paths: Vec<PathBuf>,

    #[arg(long, value_enum, default_value_t = LocatorStrategy::Auto)]
    locator: LocatorStrategy,

    #[arg(long, default_value = DEFAULT_ORIGIN)]
    site_origin: String,

    #[arg(long)]
    split_on_comma: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let headline = if args.split_on_comma {
        HeadlineParser::with_comma()
    } else {
        HeadlineParser::default()
    };
    let harvester = Harvester::new(
        CardLocator::new(args.locator),
        Extractor::new(args.site_origin).with_headline_parser(headline),
    );

    let mut ledger = DedupLedger::new();
    for path in &args.paths {
        let html = std::fs::read_to_string(path)?;
        let mut found = 0;
        for record in harvester.harvest(&html) {
            if ledger.insert(&record.profile_url) {
                found += 1;
                println!("{}", record);
            }
        }
        println!("==== {} new in {} ====\n", found, path.display());
    }
    println!("Total: {}", ledger.len());

    Ok(())
}

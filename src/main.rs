use std::process::ExitCode;

use hash_ledger::{Blockchain, LedgerConfig, Result, load_blockchain, save_blockchain};
use log::{debug, error};

fn main() -> ExitCode {
    let config = LedgerConfig::from_env();
    env_logger::init();

    match run(&config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("ledger demo failed: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(config: &LedgerConfig) -> Result<()> {
    println!("⛓️ Hash-linked ledger (difficulty {})", config.difficulty);

    let mut chain = Blockchain::new(config.difficulty);

    chain.add_transaction(0, "King", "Jack", 10.5)?;
    chain.add_transaction(0, "Jack", "Kraed", 5.0)?;
    chain.calculate_block_hash(0)?;

    let block = chain.add_block()?;
    block.add_transaction("Kraed", "King", 7.5)?;
    block.add_transaction("Jack", "King", 3.0)?;
    block.calculate_hash();

    let block = chain.add_block()?;
    block.add_transaction("King", "Kraed", 2.5)?;
    block.calculate_hash();

    println!("Blockchain Contents:{chain}");
    match chain.to_json() {
        Ok(json) => debug!("chain listing: {json}"),
        Err(e) => error!("rendering chain listing failed: {e}"),
    }
    report(&chain);

    save_blockchain(&chain, &config.data_file)?;
    println!("Saved to {}", config.data_file.display());

    let loaded = load_blockchain(&config.data_file)?;
    println!("Loaded Blockchain Contents:{loaded}");
    report(&loaded);

    Ok(())
}

fn report(chain: &Blockchain) {
    match chain.verify_chain() {
        Ok(()) => println!("Blockchain is valid!"),
        Err(e) => println!("Blockchain is invalid: {e}"),
    }
}

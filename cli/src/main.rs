//! `decisionledger` — operator CLI over the decision ledger kernel.
//!
//! Three subcommands: `verify-chain` (replay a chain export through the
//! full commit gate), `wal-recover` (rebuild a WAL manifest from segments
//! on disk), and `simulate` (run a counterfactual `simulate_rfa` against a
//! chain export and a hypothetical-facts file).

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use decisionledger_kernel::chain::Chain;
use decisionledger_kernel::precedent::comparators::FieldValue;
use decisionledger_kernel::shadow::simulate::{simulate_rfa, SimulationRequest};
use decisionledger_kernel::wal::manifest::Manifest;

#[derive(Parser)]
#[command(name = "decisionledger", version, about = "Operator CLI for the decision ledger kernel")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Replay a chain export (JSON array of cells) through the full commit
    /// gate and report whether it is internally consistent.
    VerifyChain {
        #[arg(long)]
        graph_id: String,
        #[arg(long)]
        hash_scheme: String,
        #[arg(long)]
        file: PathBuf,
    },
    /// Rebuild a WAL manifest from the segment files on disk, ignoring
    /// whatever cached manifest.json is currently present.
    WalRecover {
        #[arg(long)]
        dir: PathBuf,
        #[arg(long)]
        graph_id: String,
        #[arg(long)]
        hash_scheme: String,
    },
    /// Run a counterfactual simulation: fork the chain in `--chain-file`,
    /// apply the hypothetical facts in `--facts-file` (a flat JSON object
    /// of field -> value), and print the resulting delta report.
    Simulate {
        #[arg(long)]
        graph_id: String,
        #[arg(long)]
        hash_scheme: String,
        #[arg(long)]
        chain_file: PathBuf,
        #[arg(long)]
        domain: String,
        #[arg(long)]
        namespace_prefix: String,
        #[arg(long)]
        facts_file: PathBuf,
        /// The disposition the case is being evaluated towards, used to
        /// classify each precedent's outcome agreement.
        #[arg(long, default_value = "UNKNOWN")]
        case_disposition: String,
    },
}

fn main() -> ExitCode {
    tracing_subscriber::fmt::init();
    let cli = Cli::parse();
    match run(cli.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{}", err.to_json());
            ExitCode::from(err.exit_code().clamp(0, 255) as u8)
        }
    }
}

fn run(command: Command) -> decisionledger_kernel::Result<()> {
    match command {
        Command::VerifyChain { graph_id, hash_scheme, file } => verify_chain(graph_id, hash_scheme, file),
        Command::WalRecover { dir, graph_id, hash_scheme } => wal_recover(dir, graph_id, hash_scheme),
        Command::Simulate { graph_id, hash_scheme, chain_file, domain, namespace_prefix, facts_file, case_disposition } => {
            simulate(graph_id, hash_scheme, chain_file, domain, namespace_prefix, facts_file, case_disposition)
        }
    }
}

fn verify_chain(graph_id: String, hash_scheme: String, file: PathBuf) -> decisionledger_kernel::Result<()> {
    let bytes = std::fs::read(&file)?;
    let json: serde_json::Value = serde_json::from_slice(&bytes)?;
    let chain = Chain::import_json(graph_id, hash_scheme, &json)?;
    println!(
        "{}",
        serde_json::json!({
            "ok": true,
            "cell_count": chain.len(),
            "head": chain.last().map(|c| c.cell_id.clone()),
        })
    );
    Ok(())
}

fn wal_recover(dir: PathBuf, graph_id: String, hash_scheme: String) -> decisionledger_kernel::Result<()> {
    let manifest = Manifest::rebuild(&dir, &graph_id, &hash_scheme)?;
    manifest.save(&dir)?;
    println!(
        "{}",
        serde_json::json!({
            "ok": true,
            "segments": manifest.segments.len(),
            "total_records": manifest.total_records(),
            "next_sequence": manifest.next_sequence(),
        })
    );
    Ok(())
}

fn simulate(
    graph_id: String,
    hash_scheme: String,
    chain_file: PathBuf,
    domain_name: String,
    namespace_prefix: String,
    facts_file: PathBuf,
    case_disposition: String,
) -> decisionledger_kernel::Result<()> {
    let chain_bytes = std::fs::read(&chain_file)?;
    let chain_json: serde_json::Value = serde_json::from_slice(&chain_bytes)?;
    let base = Chain::import_json(graph_id, hash_scheme, &chain_json)?;

    let domain = decisionledger_kernel::domain::get_registry(&domain_name).ok_or_else(|| {
        decisionledger_kernel::LedgerError::new(
            decisionledger_kernel::ErrorKind::SchemaNotFound,
            format!("no such domain registry: {domain_name}"),
        )
    })?;

    let facts_bytes = std::fs::read(&facts_file)?;
    let facts_json: serde_json::Value = serde_json::from_slice(&facts_bytes)?;
    let serde_json::Value::Object(raw_facts) = facts_json else {
        return Err(decisionledger_kernel::LedgerError::new(
            decisionledger_kernel::ErrorKind::SchemaInvalid,
            "facts file must be a flat JSON object",
        ));
    };

    let mut case_facts: BTreeMap<String, FieldValue> = BTreeMap::new();
    let mut case_gate_facts: BTreeMap<String, String> = BTreeMap::new();
    for (key, value) in &raw_facts {
        if let Some(text) = value.as_str() {
            case_facts.insert(key.clone(), FieldValue::Text(text.to_string()));
            case_gate_facts.insert(key.clone(), text.to_string());
        } else if let Some(number) = value.as_f64() {
            case_facts.insert(key.clone(), FieldValue::Number(number));
        }
    }

    let required_fields: Vec<String> = Vec::new();
    let critical_fields = domain.critical_fields.clone();
    let as_of = base
        .last()
        .map(|c| c.header.system_time)
        .unwrap_or_else(chrono::Utc::now);

    let request = SimulationRequest {
        domain,
        namespace_prefix: &namespace_prefix,
        as_of,
        hypothetical_cells: Vec::new(),
        case_facts: &case_facts,
        case_gate_facts: &case_gate_facts,
        case_disposition: &case_disposition,
        required_fields: &required_fields,
        critical_fields: &critical_fields,
    };

    let result = simulate_rfa(&base, &request)?;
    println!(
        "{}",
        serde_json::json!({
            "base_confidence": result.base_proof.confidence.level.as_str(),
            "shadow_confidence": result.shadow_proof.confidence.level.as_str(),
            "pool_size_delta": result.delta.pool_size_delta,
            "confidence_level_changed": result.delta.confidence_level_changed,
        })
    );
    Ok(())
}

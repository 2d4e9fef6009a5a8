// Copyright (c) 2026 ALAS Technology. MIT License.
// See LICENSE for details.

//! # flowkit
//!
//! Entry point for the `flowkit` binary. Parses CLI arguments, initializes
//! logging and dispatches to one of:
//!
//! - `keygen`:   generate an account key pair
//! - `encode`:   print a document's payload or envelope bytes
//! - `sign`:     add a payload or envelope signature to a document
//! - `inspect`:  decode RLP hex into a readable tree
//! - `simulate`: drive the submission coordinator against an in-process node
//! - `version`:  print build version information

mod cli;
mod document;
mod inspect;
mod logging;

use anyhow::{Context, Result};
use clap::Parser;
use std::path::Path;
use std::sync::Arc;

use flowkit_protocol::config::TRANSACTION_DOMAIN_TAG;
use flowkit_protocol::crypto::{add_domain_tag, HashAlgorithm, PrivateKey, SignatureAlgorithm};
use flowkit_protocol::encoding::decode;
use flowkit_protocol::network::{Account, AccountKey, InMemoryAccessNode};
use flowkit_protocol::submission::{
    CoordinatorConfig, SubmissionCoordinator, TransactionRequest,
};
use flowkit_protocol::transaction::{
    sign_envelope, sign_payload, Address, LocalSigner, TransactionSigner,
};

use cli::{Commands, FlowkitCli, MessageKind, SigningRole};
use document::TransactionDocument;
use logging::LogFormat;

/// Service account address of the local emulator. The simulated node
/// registers its signing key under it.
const SIMULATION_ACCOUNT: Address = Address::new([0xf8, 0xd6, 0xe0, 0x58, 0x6b, 0x0a, 0x20, 0xc7]);

#[tokio::main]
async fn main() -> Result<()> {
    let cli = FlowkitCli::parse();
    logging::init_logging(
        logging::DEFAULT_FILTER,
        LogFormat::from_str_lossy(&cli.log_format),
    )
    .context("failed to initialize logging")?;

    match cli.command {
        Commands::Keygen(args) => generate_key(args),
        Commands::Encode(args) => encode_document(args),
        Commands::Sign(args) => sign_document(args).await,
        Commands::Inspect(args) => inspect_hex(args),
        Commands::Simulate(args) => simulate(args).await,
        Commands::Version => {
            print_version();
            Ok(())
        }
    }
}

/// Generates a key pair and either prints it or writes the private key to
/// a file readable only by the owner.
fn generate_key(args: cli::KeygenArgs) -> Result<()> {
    let key = PrivateKey::generate(args.curve);
    let public_key = key.public_key().to_hex();
    let private_hex = hex::encode(key.to_bytes());

    match &args.out {
        Some(path) => {
            std::fs::write(path, &private_hex)
                .with_context(|| format!("failed to write private key to {}", path.display()))?;

            #[cfg(unix)]
            {
                use std::os::unix::fs::PermissionsExt;
                std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))?;
            }

            tracing::info!(
                curve = %args.curve,
                key_path = %path.display(),
                "private key written"
            );
        }
        None => println!("Private key    : {}", private_hex),
    }

    println!("Public key     : {}", public_key);
    println!("Signature algo : {}", args.curve);
    println!("Hash algo      : {}", args.hash);
    Ok(())
}

fn encode_document(args: cli::EncodeArgs) -> Result<()> {
    let tx = load_document(&args.file)?.to_transaction()?;
    let message = match args.message {
        MessageKind::Payload => tx.payload_message(),
        MessageKind::Authorization => tx.authorization_envelope_message(),
        MessageKind::Payment => tx.payment_envelope_message(),
    };
    let message = if args.tagged {
        add_domain_tag(&message)
    } else {
        message
    };
    println!("{}", hex::encode(message));
    Ok(())
}

/// Signs a document in the requested role, writes it back, and prints the
/// resulting payment envelope.
async fn sign_document(args: cli::SignArgs) -> Result<()> {
    let mut tx = load_document(&args.file)?.to_transaction()?;
    let key = load_private_key(&args.key, args.curve)?;
    let signer = LocalSigner::new(args.address, args.key_index, key, args.hash);

    match args.role {
        SigningRole::Payload => sign_payload(&mut tx, &signer).await?,
        SigningRole::Envelope => sign_envelope(&mut tx, &signer).await?,
    }
    tracing::info!(
        address = %args.address,
        key_index = args.key_index,
        role = ?args.role,
        "signature added"
    );

    let output = args.output.as_ref().unwrap_or(&args.file);
    let signed = TransactionDocument::from_transaction(&tx)?;
    let json = serde_json::to_string_pretty(&signed)?;
    std::fs::write(output, json)
        .with_context(|| format!("failed to write signed document to {}", output.display()))?;

    println!("{}", hex::encode(tx.payment_envelope_message()));
    Ok(())
}

fn inspect_hex(args: cli::InspectArgs) -> Result<()> {
    let input = args.hex.trim();
    let bytes = hex::decode(input.strip_prefix("0x").unwrap_or(input))
        .context("input is not valid hex")?;
    let item = decode(&bytes).context("input is not a single RLP item")?;
    print!("{}", inspect::render(&item));
    Ok(())
}

/// Submits `count` transactions concurrently through one proposal key and
/// waits for every monitor to report.
async fn simulate(args: cli::SimulateArgs) -> Result<()> {
    let config = match &args.config {
        Some(path) => {
            let raw = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read {}", path.display()))?;
            serde_json::from_str::<CoordinatorConfig>(&raw)
                .with_context(|| format!("invalid coordinator config in {}", path.display()))?
        }
        None => CoordinatorConfig::default(),
    };
    config.validate().context("invalid coordinator config")?;

    let key = PrivateKey::generate(SignatureAlgorithm::EcdsaP256);
    let node = Arc::new(InMemoryAccessNode::default());
    node.add_account(Account {
        address: SIMULATION_ACCOUNT,
        keys: vec![AccountKey {
            index: 0,
            public_key: key.public_key().as_bytes().to_vec(),
            signature_algorithm: SignatureAlgorithm::EcdsaP256,
            hash_algorithm: HashAlgorithm::Sha3_256,
            weight: 1000,
            sequence_number: 0,
            revoked: false,
        }],
    });

    let signer: Arc<dyn TransactionSigner> = Arc::new(LocalSigner::new(
        SIMULATION_ACCOUNT,
        0,
        key,
        HashAlgorithm::Sha3_256,
    ));
    let coordinator = SubmissionCoordinator::new(node.clone(), config);

    tracing::info!(count = args.count, "submitting transactions");
    let submissions = (0..args.count).map(|i| {
        let request = TransactionRequest::single_signer(
            "transaction(n: Int) { prepare(acct: AuthAccount) { log(n) } }",
            Arc::clone(&signer),
        )
        .argument(format!(r#"{{"type":"Int","value":"{}"}}"#, i))
        .gas_limit(args.gas_limit);
        coordinator.submit(request)
    });
    let results = futures::future::join_all(submissions).await;

    for result in results {
        match result {
            Ok(receipt) => println!("{}", serde_json::to_string(&receipt)?),
            Err(e) => eprintln!("submission failed: {}", e),
        }
    }

    let outcomes = coordinator.join_monitors().await;
    tracing::info!(
        monitors = outcomes.len(),
        sequence_number = ?node.sequence_number(SIMULATION_ACCOUNT, 0),
        "all monitors finished"
    );

    if args.metrics {
        print!("{}", coordinator.metrics().encode()?);
    }
    Ok(())
}

fn load_document(path: &Path) -> Result<TransactionDocument> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read transaction document {}", path.display()))?;
    serde_json::from_str(&raw)
        .with_context(|| format!("invalid transaction document {}", path.display()))
}

fn load_private_key(path: &Path, curve: SignatureAlgorithm) -> Result<PrivateKey> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read private key {}", path.display()))?;
    PrivateKey::from_hex(curve, raw.trim())
        .with_context(|| format!("{} does not hold a valid {} key", path.display(), curve))
}

/// Prints version information to stdout.
fn print_version() {
    println!("flowkit     {}", env!("CARGO_PKG_VERSION"));
    println!("domain tag  {}", TRANSACTION_DOMAIN_TAG);
    println!("rustc       {}", rustc_version());
}

/// Returns the Rust compiler version used to build this binary.
fn rustc_version() -> &'static str {
    option_env!("RUSTC_VERSION").unwrap_or("unknown")
}

//! # CLI Interface
//!
//! Argument structure for the `flowkit` binary, built with `clap` derive.
//! Every flag that names a key or an account also reads from a `FLOWKIT_*`
//! environment variable so scripts do not have to repeat them.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use flowkit_protocol::config::DEFAULT_GAS_LIMIT;
use flowkit_protocol::crypto::{HashAlgorithm, SignatureAlgorithm};
use flowkit_protocol::transaction::Address;

/// Flow transaction toolkit.
///
/// Generates keys, produces the canonical bytes a transaction is signed
/// over, signs transaction documents for a given role, and decodes RLP for
/// inspection.
#[derive(Parser, Debug)]
#[command(
    name = "flowkit",
    about = "Flow transaction encoding, signing and submission toolkit",
    version,
    propagate_version = true
)]
pub struct FlowkitCli {
    /// Log output format: pretty or json.
    #[arg(long, global = true, env = "FLOWKIT_LOG_FORMAT", default_value = "pretty")]
    pub log_format: String,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level subcommands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Generate a new account key pair.
    Keygen(KeygenArgs),
    /// Print the canonical encoding of a transaction document.
    Encode(EncodeArgs),
    /// Sign a transaction document as a payload or envelope signer.
    Sign(SignArgs),
    /// Decode hex-encoded RLP and print its structure.
    Inspect(InspectArgs),
    /// Submit a batch of transactions to an in-process access node.
    Simulate(SimulateArgs),
    /// Print version information and exit.
    Version,
}

/// Which canonical message to produce.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    /// The transaction body.
    Payload,
    /// Body plus payload signatures. This is what the payer signs.
    Authorization,
    /// Authorization envelope plus envelope signatures. The wire form.
    Payment,
}

/// Which signature list a new signature goes into.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SigningRole {
    /// Proposer or authorizer that is not the payer.
    Payload,
    /// The payer, or any key on the payer's account.
    Envelope,
}

/// Arguments for the `keygen` subcommand.
#[derive(Parser, Debug)]
pub struct KeygenArgs {
    /// Curve: ECDSA_P256 or ECDSA_secp256k1.
    #[arg(long, env = "FLOWKIT_CURVE", default_value = "ECDSA_P256")]
    pub curve: SignatureAlgorithm,

    /// Hash algorithm the key will be registered with: SHA2_256 or SHA3_256.
    #[arg(long, env = "FLOWKIT_HASH", default_value = "SHA3_256")]
    pub hash: HashAlgorithm,

    /// Write the hex private key to this file (mode 0600) instead of
    /// printing it.
    #[arg(long, short = 'o')]
    pub out: Option<PathBuf>,
}

/// Arguments for the `encode` subcommand.
#[derive(Parser, Debug)]
pub struct EncodeArgs {
    /// Transaction document (JSON).
    #[arg(long, short = 'f')]
    pub file: PathBuf,

    /// Which message to encode.
    #[arg(long, value_enum, default_value = "payload")]
    pub message: MessageKind,

    /// Prefix the message with the transaction domain tag, as signed.
    #[arg(long)]
    pub tagged: bool,
}

/// Arguments for the `sign` subcommand.
#[derive(Parser, Debug)]
pub struct SignArgs {
    /// Transaction document (JSON).
    #[arg(long, short = 'f')]
    pub file: PathBuf,

    /// File holding the hex private key.
    #[arg(long, short = 'k', env = "FLOWKIT_KEY_FILE")]
    pub key: PathBuf,

    /// Curve of the signing key.
    #[arg(long, env = "FLOWKIT_CURVE", default_value = "ECDSA_P256")]
    pub curve: SignatureAlgorithm,

    /// Hash algorithm registered with the signing key.
    #[arg(long, env = "FLOWKIT_HASH", default_value = "SHA3_256")]
    pub hash: HashAlgorithm,

    /// Account the key belongs to.
    #[arg(long, env = "FLOWKIT_ADDRESS")]
    pub address: Address,

    /// Index of the key on the account.
    #[arg(long, env = "FLOWKIT_KEY_INDEX", default_value_t = 0)]
    pub key_index: u32,

    /// Which signature list to add to.
    #[arg(long, value_enum)]
    pub role: SigningRole,

    /// Write the signed document here. Defaults to overwriting `--file`.
    #[arg(long, short = 'o')]
    pub output: Option<PathBuf>,
}

/// Arguments for the `inspect` subcommand.
#[derive(Parser, Debug)]
pub struct InspectArgs {
    /// Hex-encoded RLP, with or without `0x`.
    pub hex: String,
}

/// Arguments for the `simulate` subcommand.
#[derive(Parser, Debug)]
pub struct SimulateArgs {
    /// Number of transactions to submit concurrently.
    #[arg(long, short = 'n', default_value_t = 5)]
    pub count: usize,

    /// Coordinator timings (JSON). Missing fields use the defaults.
    #[arg(long, short = 'c', env = "FLOWKIT_COORDINATOR_CONFIG")]
    pub config: Option<PathBuf>,

    /// Gas limit for every submitted transaction.
    #[arg(long, default_value_t = DEFAULT_GAS_LIMIT)]
    pub gas_limit: u64,

    /// Print the coordinator's prometheus metrics when done.
    #[arg(long)]
    pub metrics: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn verify_cli_structure() {
        FlowkitCli::command().debug_assert();
    }

    #[test]
    fn sign_parses_algorithms_and_address() {
        let cli = FlowkitCli::try_parse_from([
            "flowkit",
            "sign",
            "--file",
            "tx.json",
            "--key",
            "key.hex",
            "--curve",
            "secp256k1",
            "--hash",
            "SHA2_256",
            "--address",
            "0x01",
            "--role",
            "envelope",
        ])
        .unwrap();

        match cli.command {
            Commands::Sign(args) => {
                assert_eq!(args.curve, SignatureAlgorithm::EcdsaSecp256k1);
                assert_eq!(args.hash, HashAlgorithm::Sha2_256);
                assert_eq!(args.address, Address::new([0, 0, 0, 0, 0, 0, 0, 1]));
                assert_eq!(args.key_index, 0);
                assert_eq!(args.role, SigningRole::Envelope);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn unknown_curve_is_rejected() {
        let result = FlowkitCli::try_parse_from(["flowkit", "keygen", "--curve", "ed25519"]);
        assert!(result.is_err());
    }
}

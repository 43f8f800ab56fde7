//! veilbridge entry point.
//!
//! Run modes:
//!   cargo run                - Show usage
//!   cargo run -- demo        - Run the local end-to-end demo
//!   cargo run -- check-config - Load and validate configuration

use std::env;
use std::sync::Arc;

use veilbridge::collaborators::{
    InProcessLedger, LocalEnclave, LocalProver, LocalRelayDirectory, LocalSignerNetwork,
    ProofProvider, StaticChainOracle,
};
use veilbridge::crypto::schnorr;
use veilbridge::ledger::CallContext;
use veilbridge::logging::{init_logging, LogLevel};
use veilbridge::orchestrator::{MintParams, OrchestratorConfig, TransferOrchestrator};
use veilbridge::policy::PrivacyPolicyEngine;
use veilbridge::types::unix_now;
use veilbridge::units::ether_to_wei;
use veilbridge::{
    BridgeConfig, Network, OnChainVerifier, PrivacyTier, SigningMode,
    ThresholdSignatureCoordinator,
};

#[tokio::main]
async fn main() {
    dotenv::dotenv().ok();

    let config = match BridgeConfig::from_env() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("configuration error: {}", err);
            std::process::exit(1);
        }
    };
    let json_logs = config.network == Network::Mainnet;
    if let Err(err) = init_logging(LogLevel::from(config.log_level.as_str()), json_logs) {
        eprintln!("logging error: {}", err);
        std::process::exit(1);
    }

    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        print_usage();
        return;
    }

    match args[1].as_str() {
        "demo" => run_demo(config).await,
        "check-config" => {
            config.print_summary();
            match config.validate_for_production() {
                Ok(()) => println!("production-ready: yes"),
                Err(err) => println!("production-ready: no ({})", err),
            }
        }
        "help" | "--help" | "-h" => print_usage(),
        _ => print_usage(),
    }
}

fn print_usage() {
    println!("veilbridge - privacy-preserving cross-chain transfers");
    println!();
    println!("Usage:");
    println!("  veilbridge demo           Run the local end-to-end demo");
    println!("  veilbridge check-config   Load and validate configuration");
    println!();
    println!("Environment Variables:");
    println!("  VEIL_NETWORK          mainnet, testnet or devnet (default: devnet)");
    println!("  VEIL_SOURCE_CHAIN     source chain name");
    println!("  VEIL_TARGET_CHAIN     target chain name");
    println!("  VEIL_ORACLE_URL       chain-conditions oracle base URL");
    println!("  VEIL_PROVER_URL       proof service base URL");
    println!("  VEIL_SIGNING_MODE     threshold or tee");
    println!("  VEIL_THRESHOLD        required signers (threshold mode)");
    println!("  VEIL_PARTICIPANTS     total signer nodes (threshold mode)");
    println!("  VEIL_LOG_LEVEL        debug, info, warn, error");
}

/// End-to-end flow against in-process collaborators: three mints at
/// different privacy tiers, a burn, a native lock and a withdrawal.
async fn run_demo(config: BridgeConfig) {
    if !config.network.allows_demo_mode() {
        eprintln!("demo mode is not allowed on {:?}", config.network);
        std::process::exit(1);
    }
    println!("=== veilbridge demo ({:?}) ===", config.network);

    let group_secret = schnorr::random_scalar();
    let attestation_secret = schnorr::random_scalar();
    let (group_x, group_y) = schnorr::public_key(&group_secret).expect("valid group secret");

    let admin = [0xadu8; 32];
    let ledger = Arc::new(InProcessLedger::new(
        OnChainVerifier::new(admin, group_x, group_y),
        admin,
    ));
    let network = Arc::new(LocalSignerNetwork::new(group_secret, 3, 5).expect("valid quorum"));
    let enclave =
        Arc::new(LocalEnclave::new(group_secret, attestation_secret).expect("valid enclave keys"));
    let coordinator = Arc::new(ThresholdSignatureCoordinator::new(network, Some(enclave)));
    let policy = Arc::new(PrivacyPolicyEngine::new(
        Arc::new(StaticChainOracle {
            gas_gwei: 5,
            congestion: 40,
        }),
        config.default_tier,
    ));

    let prover = Arc::new(LocalProver::new());
    prover.init().await.expect("local prover init");

    let orchestrator = TransferOrchestrator::new(
        OrchestratorConfig {
            source_chain: config.source_chain.clone(),
            target_chain: config.target_chain.clone(),
            signing_mode: SigningMode::Threshold,
            ..OrchestratorConfig::default()
        },
        policy,
        coordinator.clone(),
        prover,
        Arc::new(LocalRelayDirectory::new(ledger.clone())),
        ledger.clone(),
    );

    let alice = [0x01u8; 32];

    // Small amount: policy picks a low tier
    demo_mint(&orchestrator, alice, ether_to_wei(1) / 2, None).await;

    // Large amount: enhanced tier with proof and relay
    demo_mint(&orchestrator, alice, ether_to_wei(50), None).await;

    // Maximum tier needs a registered one-time post-quantum key
    let key_hash = coordinator
        .rotate_quantum_key()
        .await
        .expect("coordinator alive");
    ledger
        .verifier()
        .await
        .set_quantum_key_hash(
            &CallContext {
                caller: admin,
                value: 0,
                timestamp: unix_now(),
            },
            key_hash,
        )
        .expect("admin call");
    demo_mint(&orchestrator, alice, ether_to_wei(150), Some(PrivacyTier::Maximum)).await;

    // Burn part of the minted balance back toward the source chain
    match orchestrator.burn(alice, ether_to_wei(10), [0x02u8; 32]).await {
        Ok(id) => println!("burn confirmed: {}", id),
        Err(err) => println!("burn failed: {}", err),
    }

    // Lock native value, then withdraw half of it
    match orchestrator.lock(alice, ether_to_wei(2)).await {
        Ok(id) => println!("lock confirmed: {}", id),
        Err(err) => println!("lock failed: {}", err),
    }
    match orchestrator.withdraw(alice, ether_to_wei(1), [0x55u8; 32]).await {
        Ok(id) => println!("withdraw confirmed: {}", id),
        Err(err) => println!("withdraw failed: {}", err),
    }

    let balance = ledger.verifier().await.balance_of(&alice);
    println!(
        "final bridged balance for alice: {} wei ({} transfers cached)",
        balance,
        orchestrator.cached_transfers().await
    );
}

async fn demo_mint(
    orchestrator: &TransferOrchestrator,
    recipient: [u8; 32],
    amount: u128,
    preference: Option<PrivacyTier>,
) {
    let params = MintParams {
        recipient,
        amount,
        merkle_root: [0x33u8; 32],
        user_preference: preference,
    };
    match orchestrator.mint(params).await {
        Ok(id) => {
            let transfer = orchestrator.status(&id).await.expect("cached");
            println!(
                "mint confirmed: {} tier={} status={} block={:?}",
                id, transfer.tier, transfer.status, transfer.confirmed_block
            );
        }
        Err(err) => println!("mint failed: {}", err),
    }
}

//! Compiles the Solidity helper contracts (CallRegistry, ProxyFactory, and
//! the two proxy templates) and writes their raw creation bytecode to
//! `OUT_DIR` for `lib.rs` to `include_bytes!`, the same way the teacher's
//! `l2/contracts` crate compiles its bridge contracts via `solc` in
//! `build.rs`.
use std::env;
use std::path::{Path, PathBuf};
use std::process::Command;

const CONTRACTS: &[&str] = &["CallRegistry", "ProxyFactory", "L1ToL2Proxy", "L2ToL1Proxy"];

fn main() {
    let manifest_dir = PathBuf::from(env::var("CARGO_MANIFEST_DIR").expect("CARGO_MANIFEST_DIR"));
    let contracts_dir = manifest_dir.join("contracts");
    let out_dir = PathBuf::from(env::var("OUT_DIR").expect("OUT_DIR"));
    let solc_out = out_dir.join("solc_out");

    for contract in CONTRACTS {
        compile_contract_to_bytecode(&contracts_dir, &solc_out, contract);
    }

    println!("cargo::rerun-if-changed=contracts");
    println!("cargo::rerun-if-changed=build.rs");
}

/// Invokes `solc --bin -o <out>` on `<contracts_dir>/<contract>.sol` and
/// writes the raw creation bytecode to `<out>/<contract>.bytecode` so
/// `lib.rs` can `include_bytes!` it.
///
/// `solc` is an external toolchain dependency, exactly as in the teacher's
/// `ethrex_l2_sdk::compile_contract`; if it is unavailable this build
/// script fails loudly rather than silently shipping stale/placeholder
/// bytecode.
fn compile_contract_to_bytecode(contracts_dir: &Path, out_dir: &Path, contract: &str) {
    std::fs::create_dir_all(out_dir).expect("create solc output dir");

    let status = Command::new("solc")
        .arg("--bin")
        .arg("--via-ir")
        .arg("--optimize")
        .arg("--optimize-runs")
        .arg("200")
        .arg("--overwrite")
        .arg("--no-cbor-metadata")
        .arg("-o")
        .arg(out_dir)
        .arg(contracts_dir.join(format!("{contract}.sol")))
        .status()
        .unwrap_or_else(|e| panic!("failed to invoke solc for {contract}: {e}"));
    assert!(status.success(), "solc failed compiling {contract}");

    let bin_path = out_dir.join(format!("{contract}.bin"));
    let hex_bytecode = std::fs::read_to_string(&bin_path)
        .unwrap_or_else(|e| panic!("reading {}: {e}", bin_path.display()));
    let bytecode = hex::decode(hex_bytecode.trim())
        .unwrap_or_else(|e| panic!("decoding hex bytecode for {contract}: {e}"));

    std::fs::write(out_dir.join(format!("{contract}.bytecode")), bytecode)
        .unwrap_or_else(|e| panic!("writing {contract}.bytecode: {e}"));
}

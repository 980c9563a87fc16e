//! Deployment orchestrator
//!
//! Sequences contract deployments against one node: resolves the chain id
//! and deployer account, deploys each artifact through the proxy, and
//! persists the address registry plus a per-contract artifact file after
//! every success. Persistence errors are reported in their own domain;
//! by the time they can occur the deployment itself is already on chain.

use std::path::{Path, PathBuf};

use serde_json::json;

use super::registry::{AddressRegistry, RegistryError};
use crate::abi::AbiValue;
use crate::contract::Contract;
use crate::error::ClientResult;
use crate::rpc::{Eth, PollOptions, TxOptions};
use crate::utils::logging;

/// Inputs for one contract: its name, interface, bytecode, and
/// constructor arguments.
#[derive(Debug, Clone)]
pub struct ContractArtifact {
    pub name: String,
    pub abi_json: String,
    pub bytecode: String,
    pub constructor_args: Vec<AbiValue>,
}

impl ContractArtifact {
    pub fn new(name: impl Into<String>, abi_json: impl Into<String>, bytecode: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            abi_json: abi_json.into(),
            bytecode: bytecode.into(),
            constructor_args: Vec::new(),
        }
    }

    pub fn with_args(mut self, args: Vec<AbiValue>) -> Self {
        self.constructor_args = args;
        self
    }
}

/// Where artifacts land and how deployments are submitted.
#[derive(Debug, Clone)]
pub struct DeployConfig {
    /// Directory for the registry and the per-contract artifact files.
    pub output_dir: PathBuf,
    /// Registry filename inside `output_dir`.
    pub registry_file: String,
    /// Transaction options for every deployment. When `from` is unset, the
    /// node's first account is used.
    pub tx: TxOptions,
    /// Receipt polling bounds.
    pub poll: PollOptions,
}

impl DeployConfig {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
            registry_file: "addresses.json".to_string(),
            tx: TxOptions::default(),
            poll: PollOptions::default(),
        }
    }

    fn registry_path(&self) -> PathBuf {
        self.output_dir.join(&self.registry_file)
    }
}

/// One successful deployment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeployedContract {
    pub name: String,
    pub address: String,
    pub chain_id: u64,
}

/// Sequences deployments and persists their results.
pub struct Deployer {
    eth: Eth,
    config: DeployConfig,
}

impl Deployer {
    pub fn new(eth: Eth, config: DeployConfig) -> Self {
        Self { eth, config }
    }

    /// Deploy every artifact in order. Stops at the first failure; whatever
    /// already deployed stays recorded in the registry.
    pub fn run(&self, artifacts: &[ContractArtifact]) -> ClientResult<Vec<DeployedContract>> {
        let chain_id = self.eth.chain_id()?;

        let mut tx = self.config.tx.clone();
        if tx.from.is_none() {
            tx.from = self.eth.accounts()?.into_iter().next();
        }

        logging::info("deploy", "starting deployment run")
            .field("chain_id", chain_id)
            .field("contracts", artifacts.len())
            .field("from", tx.from.as_deref().unwrap_or("<node default>"))
            .log();

        let mut deployed = Vec::with_capacity(artifacts.len());
        for artifact in artifacts {
            let mut contract = Contract::from_json(self.eth.clone(), &artifact.abi_json)?;
            let address = contract.deploy(
                &artifact.bytecode,
                &artifact.constructor_args,
                &tx,
                &self.config.poll,
            )?;

            self.persist(artifact, chain_id, &address)?;
            logging::info("deploy", "contract deployed")
                .field("name", &artifact.name)
                .field("address", &address)
                .field("chain_id", chain_id)
                .log();

            deployed.push(DeployedContract {
                name: artifact.name.clone(),
                address,
                chain_id,
            });
        }

        Ok(deployed)
    }

    /// Read-merge-write the registry and write the contract's artifact
    /// file next to it.
    fn persist(
        &self,
        artifact: &ContractArtifact,
        chain_id: u64,
        address: &str,
    ) -> Result<(), RegistryError> {
        let registry_path = self.config.registry_path();
        let mut registry = AddressRegistry::load(&registry_path)?;
        registry.record(&artifact.name, chain_id, address);
        registry.save(&registry_path)?;

        self.write_artifact(artifact, address)
    }

    fn write_artifact(
        &self,
        artifact: &ContractArtifact,
        address: &str,
    ) -> Result<(), RegistryError> {
        // Keep the ABI as structured JSON, not a quoted string.
        let abi: serde_json::Value = serde_json::from_str(&artifact.abi_json)
            .map_err(|e| RegistryError::Malformed(format!("{} ABI: {}", artifact.name, e)))?;
        let body = json!({
            "contractName": artifact.name,
            "abi": abi,
            "bytecode": artifact.bytecode.trim(),
            "address": address,
        });

        let path = self.artifact_path(&artifact.name);
        std::fs::write(&path, serde_json::to_string_pretty(&body).unwrap_or_default())
            .map_err(|e| RegistryError::Io(format!("{}: {}", path.display(), e)))
    }

    fn artifact_path(&self, name: &str) -> PathBuf {
        self.config.output_dir.join(format!("{}.json", name))
    }

    /// Registry currently on disk for this configuration.
    pub fn registry(&self) -> Result<AddressRegistry, RegistryError> {
        AddressRegistry::load(&self.config.registry_path())
    }
}

/// Convenience: load an artifact's pieces from `<dir>/<name>.abi` and
/// `<dir>/<name>.bin`, the compiler's split output layout.
pub fn artifact_from_dir(dir: &Path, name: &str) -> Result<ContractArtifact, RegistryError> {
    let abi_path = dir.join(format!("{}.abi", name));
    let bin_path = dir.join(format!("{}.bin", name));
    let abi_json = std::fs::read_to_string(&abi_path)
        .map_err(|e| RegistryError::Io(format!("{}: {}", abi_path.display(), e)))?;
    let bytecode = std::fs::read_to_string(&bin_path)
        .map_err(|e| RegistryError::Io(format!("{}: {}", bin_path.display(), e)))?;
    Ok(ContractArtifact::new(name, abi_json, bytecode.trim().to_string()))
}

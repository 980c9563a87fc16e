//! Deployment orchestration: sequencing, address registry, artifact files.

pub mod orchestrator;
pub mod registry;

pub use orchestrator::{
    artifact_from_dir, ContractArtifact, DeployConfig, DeployedContract, Deployer,
};
pub use registry::{AddressRegistry, RegistryError};

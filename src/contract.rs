//! Dynamic contract proxy
//!
//! Turns a parsed ABI document plus a node handle into something callable:
//! one entry per function name, dispatched by the entry's mutability.
//! Read-only entries go through `eth_call` and decode their outputs;
//! state-changing entries go through `eth_sendTransaction` and hand back
//! the transaction hash. Deployment sends the bytecode with encoded
//! constructor arguments and polls for the receipt's contract address.
//!
//! Dispatch is by name only; ABI documents with overloaded names are
//! rejected at parse time.

use crate::abi::{AbiDecoder, AbiEncoder, AbiFunction, AbiValue, ContractAbi};
use crate::error::{ClientError, ClientResult};
use crate::rpc::{Eth, PollOptions, TransactionRequest, TxOptions};
use crate::utils::hex as hexutil;
use crate::utils::logging;

/// Outcome of a dispatched invocation.
#[derive(Debug, Clone, PartialEq)]
pub enum Invocation {
    /// A read: the decoded return values. A single output is unwrapped to
    /// the bare value, multiple outputs arrive as a tuple.
    Returned(AbiValue),
    /// A write: the submitted transaction's hash. Receipt polling is the
    /// caller's business.
    Submitted(String),
}

/// A contract handle: parsed ABI plus (once deployed or attached) an
/// address.
pub struct Contract {
    eth: Eth,
    abi: ContractAbi,
    address: Option<String>,
}

impl Contract {
    /// Wrap an already-parsed ABI.
    pub fn new(eth: Eth, abi: ContractAbi) -> Self {
        Self {
            eth,
            abi,
            address: None,
        }
    }

    /// Parse the ABI document and wrap it. All document validation happens
    /// here, before any network traffic.
    pub fn from_json(eth: Eth, abi_json: &str) -> ClientResult<Self> {
        Ok(Self::new(eth, ContractAbi::from_json(abi_json)?))
    }

    /// Attach to an already-deployed contract.
    pub fn attach(&mut self, address: &str) -> ClientResult<()> {
        let stripped = address.strip_prefix("0x").unwrap_or(address);
        let bytes = hex::decode(stripped)
            .map_err(|_| ClientError::InvalidAddress(address.to_string()))?;
        if bytes.len() != 20 {
            return Err(ClientError::InvalidAddress(address.to_string()));
        }
        self.address = Some(format!("0x{}", stripped.to_ascii_lowercase()));
        Ok(())
    }

    pub fn address(&self) -> Option<&str> {
        self.address.as_deref()
    }

    pub fn abi(&self) -> &ContractAbi {
        &self.abi
    }

    /// Deploy the contract: send `bytecode ++ encoded constructor args` as
    /// a creation transaction, wait for the receipt within `poll`'s bounds,
    /// attach to and return the new address.
    pub fn deploy(
        &mut self,
        bytecode_hex: &str,
        args: &[AbiValue],
        options: &TxOptions,
        poll: &PollOptions,
    ) -> ClientResult<String> {
        let bytecode = hexutil::decode_bytes(bytecode_hex)?;
        let data = AbiEncoder::encode_constructor(&bytecode, self.abi.constructor.as_ref(), args)?;

        let request = options.apply(TransactionRequest {
            data: Some(hexutil::encode_bytes(&data)),
            ..Default::default()
        });
        let tx_hash = self.eth.send_transaction(&request)?;
        logging::info("contract", "deployment submitted")
            .field("tx", &tx_hash)
            .payload_field("data", hexutil::encode_bytes(&data))
            .log();

        let receipt = self.eth.wait_for_receipt(&tx_hash, poll)?;
        let address = receipt
            .contract_address
            .ok_or_else(|| ClientError::MissingContractAddress(tx_hash.clone()))?;
        logging::info("contract", "deployed")
            .field("address", &address)
            .field("tx", &tx_hash)
            .log();

        self.attach(&address)?;
        Ok(address)
    }

    /// Invoke a function by name, routed by its declared mutability.
    pub fn invoke(
        &self,
        name: &str,
        args: &[AbiValue],
        options: &TxOptions,
    ) -> ClientResult<Invocation> {
        let function = self.function(name)?;
        if function.state_mutability.is_readonly() {
            self.call(name, args).map(Invocation::Returned)
        } else {
            self.send(name, args, options).map(Invocation::Submitted)
        }
    }

    /// Read path: encode, `eth_call`, decode the declared outputs.
    pub fn call(&self, name: &str, args: &[AbiValue]) -> ClientResult<AbiValue> {
        let function = self.function(name)?;
        let to = self.address.clone().ok_or(ClientError::MissingAddress)?;
        let data = AbiEncoder::encode_call(function, args)?;

        let request = TransactionRequest {
            to: Some(to),
            data: Some(hexutil::encode_bytes(&data)),
            ..Default::default()
        };
        let raw = self.eth.call(&request)?;

        let mut values = AbiDecoder::decode_function_result(function, &raw)?;
        Ok(match values.len() {
            1 => values.remove(0),
            _ => AbiValue::Tuple(values),
        })
    }

    /// Write path: encode, `eth_sendTransaction`, return the hash.
    pub fn send(&self, name: &str, args: &[AbiValue], options: &TxOptions) -> ClientResult<String> {
        let function = self.function(name)?;
        let to = self.address.clone().ok_or(ClientError::MissingAddress)?;
        let data = AbiEncoder::encode_call(function, args)?;

        let request = options.apply(TransactionRequest {
            to: Some(to),
            data: Some(hexutil::encode_bytes(&data)),
            ..Default::default()
        });
        let tx_hash = self.eth.send_transaction(&request)?;
        logging::debug("contract", "transaction submitted")
            .field("function", name)
            .field("tx", &tx_hash)
            .log();
        Ok(tx_hash)
    }

    fn function(&self, name: &str) -> ClientResult<&AbiFunction> {
        self.abi
            .function(name)
            .ok_or_else(|| ClientError::FunctionNotFound(name.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use serde_json::{json, Value};

    use super::*;
    use crate::rpc::transport::mock::MockTransport;
    use crate::rpc::transport::RpcError;

    const STORAGE_ABI: &str = r#"[
        {"type":"constructor","inputs":[{"name":"initial","type":"uint256"},{"name":"label","type":"string"}],"stateMutability":"nonpayable"},
        {"type":"function","name":"get","inputs":[],"outputs":[{"type":"uint256"}],"stateMutability":"view"},
        {"type":"function","name":"both","inputs":[],"outputs":[{"type":"uint256"},{"type":"string"}],"stateMutability":"view"},
        {"type":"function","name":"set","inputs":[{"name":"value","type":"uint256"}],"outputs":[],"stateMutability":"nonpayable"}
    ]"#;

    const ADDRESS: &str = "0x1122334455667788990011223344556677889900";

    fn contract_with(replies: Vec<ClientResult<Value>>) -> (Contract, Arc<MockTransport>) {
        let mock = Arc::new(MockTransport::new(replies));
        let eth = Eth::new(mock.clone());
        let contract = Contract::from_json(eth, STORAGE_ABI).unwrap();
        (contract, mock)
    }

    fn fast_poll() -> PollOptions {
        PollOptions {
            interval: Duration::from_millis(1),
            timeout: Duration::from_secs(5),
        }
    }

    #[test]
    fn view_call_decodes_single_output() {
        // Node returns the word for 42.
        let word = format!("0x{:064x}", 42);
        let (mut contract, mock) = contract_with(vec![Ok(json!(word))]);
        contract.attach(ADDRESS).unwrap();

        let value = contract.call("get", &[]).unwrap();
        assert_eq!(value, AbiValue::uint(42));

        let calls = mock.recorded();
        assert_eq!(calls[0].0, "eth_call");
        let params = calls[0].1.as_array().unwrap();
        assert_eq!(params[0]["to"], ADDRESS);
        assert_eq!(params[0]["data"], "0x6d4ce63c"); // selector of get()
        assert_eq!(params[1], "latest");
    }

    #[test]
    fn view_call_wraps_multiple_outputs() {
        let response = crate::abi::AbiEncoder::encode(
            &[AbiValue::uint(6), AbiValue::String("foo".to_string())],
            &[
                crate::abi::AbiType::Uint(256),
                crate::abi::AbiType::String,
            ],
        )
        .unwrap();
        let (mut contract, _) =
            contract_with(vec![Ok(json!(hexutil::encode_bytes(&response)))]);
        contract.attach(ADDRESS).unwrap();

        let value = contract.call("both", &[]).unwrap();
        assert_eq!(
            value,
            AbiValue::Tuple(vec![AbiValue::uint(6), AbiValue::String("foo".to_string())])
        );
    }

    #[test]
    fn write_path_returns_tx_hash() {
        let (mut contract, mock) = contract_with(vec![Ok(json!("0xtxhash"))]);
        contract.attach(ADDRESS).unwrap();

        let options = TxOptions {
            from: Some("0xfeedfeedfeedfeedfeedfeedfeedfeedfeedfeed".to_string()),
            gas: Some(300_000),
            ..Default::default()
        };
        let hash = contract.send("set", &[AbiValue::uint(2)], &options).unwrap();
        assert_eq!(hash, "0xtxhash");

        let calls = mock.recorded();
        assert_eq!(calls[0].0, "eth_sendTransaction");
        let tx = &calls[0].1.as_array().unwrap()[0];
        assert_eq!(tx["to"], ADDRESS);
        assert_eq!(tx["gas"], "0x493e0");
        assert!(tx["data"].as_str().unwrap().len() > 10);
    }

    #[test]
    fn invoke_routes_by_mutability() {
        let word = format!("0x{:064x}", 7);
        let (mut contract, _) = contract_with(vec![Ok(json!(word)), Ok(json!("0xhash"))]);
        contract.attach(ADDRESS).unwrap();

        let read = contract.invoke("get", &[], &TxOptions::default()).unwrap();
        assert_eq!(read, Invocation::Returned(AbiValue::uint(7)));

        let write = contract
            .invoke("set", &[AbiValue::uint(1)], &TxOptions::default())
            .unwrap();
        assert_eq!(write, Invocation::Submitted("0xhash".to_string()));
    }

    #[test]
    fn deploy_extracts_contract_address() {
        let receipt = json!({
            "transactionHash": "0xdeploy",
            "blockNumber": "0x2",
            "contractAddress": ADDRESS,
            "status": "0x1"
        });
        let (mut contract, mock) = contract_with(vec![
            Ok(json!("0xdeploy")),
            Ok(Value::Null),
            Ok(receipt),
        ]);

        let options = TxOptions {
            from: Some("0xfeedfeedfeedfeedfeedfeedfeedfeedfeedfeed".to_string()),
            gas: Some(300_000),
            ..Default::default()
        };
        let address = contract
            .deploy(
                "0x6080604052",
                &[AbiValue::uint(10), AbiValue::String("foo".to_string())],
                &options,
                &fast_poll(),
            )
            .unwrap();
        assert_eq!(address, ADDRESS);
        assert_eq!(contract.address(), Some(ADDRESS));

        let calls = mock.recorded();
        let tx = &calls[0].1.as_array().unwrap()[0];
        // Creation transaction has no `to`; data is bytecode plus the
        // encoded (uint256, string) arguments.
        assert!(tx.get("to").is_none());
        let data = tx["data"].as_str().unwrap();
        let bytes = hexutil::decode_bytes(data).unwrap();
        let args = &bytes[5..]; // past the 5-byte bytecode
        assert_eq!(args.len(), 128);
        assert_eq!(args[31], 10);
        assert_eq!(args[63], 64);
        assert_eq!(args[95], 3);
        assert_eq!(&args[96..99], b"foo");
    }

    #[test]
    fn deploy_times_out_without_receipt() {
        let mut replies = vec![Ok(json!("0xdeploy"))];
        replies.extend(vec![Ok(Value::Null); 64]);
        let (mut contract, _) = contract_with(replies);

        let poll = PollOptions {
            interval: Duration::from_millis(1),
            timeout: Duration::from_millis(5),
        };
        let err = contract
            .deploy("0x00", &[AbiValue::uint(1), AbiValue::String("x".into())], &TxOptions::default(), &poll)
            .unwrap_err();
        assert!(matches!(err, ClientError::DeploymentTimeout { .. }));
    }

    #[test]
    fn rpc_errors_surface_as_rpc_not_transport() {
        let (mut contract, _) = contract_with(vec![Err(ClientError::Rpc(RpcError {
            code: -32000,
            message: "revert".to_string(),
        }))]);
        contract.attach(ADDRESS).unwrap();

        match contract.call("get", &[]).unwrap_err() {
            ClientError::Rpc(e) => {
                assert_eq!(e.code, -32000);
                assert_eq!(e.message, "revert");
            }
            other => panic!("expected rpc error, got {:?}", other),
        }
    }

    #[test]
    fn unknown_function_and_missing_address() {
        let (contract, _) = contract_with(vec![]);
        assert!(matches!(
            contract.call("nope", &[]).unwrap_err(),
            ClientError::FunctionNotFound(_)
        ));
        assert!(matches!(
            contract.call("get", &[]).unwrap_err(),
            ClientError::MissingAddress
        ));
    }

    #[test]
    fn attach_validates_addresses() {
        let (mut contract, _) = contract_with(vec![]);
        assert!(contract.attach("0x1234").is_err());
        assert!(contract.attach("not hex at all").is_err());
        assert!(contract.attach(ADDRESS).is_ok());
    }

    #[test]
    fn bad_arguments_fail_before_any_rpc() {
        let (mut contract, mock) = contract_with(vec![]);
        contract.attach(ADDRESS).unwrap();
        let err = contract
            .send("set", &[AbiValue::Bool(true)], &TxOptions::default())
            .unwrap_err();
        assert!(matches!(err, ClientError::Encoding(_)));
        assert!(mock.recorded().is_empty());
    }
}

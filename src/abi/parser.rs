//! JSON ABI document parser
//!
//! Parses the contract's interface description (the JSON produced by the
//! Solidity compiler) into typed entries. All validation happens here, at
//! construction time, so a bad document fails before any network traffic.

use serde::Deserialize;

use super::types::{
    AbiEvent, AbiEventParam, AbiFunction, AbiParam, AbiType, FunctionType, StateMutability,
    TypeParseError,
};

/// A parsed contract interface.
#[derive(Debug, Clone, Default)]
pub struct ContractAbi {
    pub functions: Vec<AbiFunction>,
    pub events: Vec<AbiEvent>,
    pub constructor: Option<AbiFunction>,
}

impl ContractAbi {
    /// Parse an ABI document from its JSON text.
    pub fn from_json(json: &str) -> Result<Self, AbiDocError> {
        let items: Vec<AbiItem> =
            serde_json::from_str(json).map_err(|e| AbiDocError::Json(e.to_string()))?;
        Self::from_items(items)
    }

    /// Parse an ABI document from an already-parsed JSON value.
    pub fn from_json_value(value: serde_json::Value) -> Result<Self, AbiDocError> {
        let items: Vec<AbiItem> =
            serde_json::from_value(value).map_err(|e| AbiDocError::Json(e.to_string()))?;
        Self::from_items(items)
    }

    fn from_items(items: Vec<AbiItem>) -> Result<Self, AbiDocError> {
        let mut abi = ContractAbi::default();

        for item in items {
            match item {
                AbiItem::Function(f) => {
                    let function = Self::convert_function(f)?;
                    // Overloaded names are a documented limitation: dispatch
                    // is by name only, so a collision is rejected up front.
                    if abi.functions.iter().any(|g| g.name == function.name) {
                        return Err(AbiDocError::OverloadedFunction(function.name));
                    }
                    abi.functions.push(function);
                }
                AbiItem::Event(e) => {
                    abi.events.push(Self::convert_event(e)?);
                }
                AbiItem::Constructor(c) => {
                    if abi.constructor.is_some() {
                        return Err(AbiDocError::DuplicateConstructor);
                    }
                    abi.constructor = Some(Self::convert_constructor(c)?);
                }
                // Fallback/receive entries carry no callable surface here.
                AbiItem::Fallback | AbiItem::Receive => {}
                AbiItem::Error(_) => {}
            }
        }

        Ok(abi)
    }

    /// Look up a function entry by name.
    pub fn function(&self, name: &str) -> Option<&AbiFunction> {
        self.functions.iter().find(|f| f.name == name)
    }

    /// Look up an event entry by name.
    pub fn event(&self, name: &str) -> Option<&AbiEvent> {
        self.events.iter().find(|e| e.name == name)
    }

    /// Look up a function entry by its 4-byte selector.
    pub fn function_by_selector(&self, selector: &[u8; 4]) -> Option<&AbiFunction> {
        use super::selector::AbiSelector;
        self.functions
            .iter()
            .find(|f| AbiSelector::function_selector(f) == *selector)
    }

    fn convert_function(f: ParsedFunction) -> Result<AbiFunction, AbiDocError> {
        Ok(AbiFunction {
            name: f.name,
            inputs: f
                .inputs
                .into_iter()
                .map(Self::convert_param)
                .collect::<Result<Vec<_>, _>>()?,
            outputs: f
                .outputs
                .unwrap_or_default()
                .into_iter()
                .map(Self::convert_param)
                .collect::<Result<Vec<_>, _>>()?,
            state_mutability: f.state_mutability.unwrap_or_default(),
            function_type: FunctionType::Function,
        })
    }

    fn convert_constructor(c: ParsedConstructor) -> Result<AbiFunction, AbiDocError> {
        Ok(AbiFunction {
            name: "constructor".to_string(),
            inputs: c
                .inputs
                .into_iter()
                .map(Self::convert_param)
                .collect::<Result<Vec<_>, _>>()?,
            outputs: vec![],
            state_mutability: c.state_mutability.unwrap_or_default(),
            function_type: FunctionType::Constructor,
        })
    }

    fn convert_event(e: ParsedEvent) -> Result<AbiEvent, AbiDocError> {
        Ok(AbiEvent {
            name: e.name,
            inputs: e
                .inputs
                .into_iter()
                .map(|p| {
                    Ok(AbiEventParam {
                        name: p.name,
                        param_type: Self::resolve_type(&p.param_type, p.components.as_deref())?,
                        indexed: p.indexed,
                    })
                })
                .collect::<Result<Vec<_>, AbiDocError>>()?,
            anonymous: e.anonymous.unwrap_or(false),
        })
    }

    fn convert_param(p: ParsedParam) -> Result<AbiParam, AbiDocError> {
        Ok(AbiParam {
            name: p.name.unwrap_or_default(),
            param_type: Self::resolve_type(&p.param_type, p.components.as_deref())?,
        })
    }

    /// Resolve a raw type string. Tuple types spell their member types in a
    /// `components` list rather than in the type string, so `tuple` and
    /// `tuple[...]` are rebuilt from components before array suffixes are
    /// applied.
    fn resolve_type(
        type_str: &str,
        components: Option<&[ParsedParam]>,
    ) -> Result<AbiType, AbiDocError> {
        if let Some(suffix) = type_str.strip_prefix("tuple") {
            let members = components
                .unwrap_or_default()
                .iter()
                .map(|c| Self::resolve_type(&c.param_type, c.components.as_deref()))
                .collect::<Result<Vec<_>, _>>()?;
            let mut resolved = AbiType::Tuple(members);

            let mut rest = suffix;
            while !rest.is_empty() {
                if let Some(r) = rest.strip_prefix("[]") {
                    resolved = AbiType::Array(Box::new(resolved), None);
                    rest = r;
                } else if let Some(r) = rest.strip_prefix('[') {
                    let close = r.find(']').ok_or_else(|| {
                        AbiDocError::Type(TypeParseError::new(type_str, "unbalanced `[`"))
                    })?;
                    let len: usize = r[..close].parse().map_err(|_| {
                        AbiDocError::Type(TypeParseError::new(type_str, "bad array length"))
                    })?;
                    resolved = AbiType::Array(Box::new(resolved), Some(len));
                    rest = &r[close + 1..];
                } else {
                    return Err(AbiDocError::Type(TypeParseError::new(
                        type_str,
                        "bad tuple suffix",
                    )));
                }
            }
            return Ok(resolved);
        }

        Ok(AbiType::parse(type_str)?)
    }
}

/// The ABI document could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AbiDocError {
    #[error("ABI JSON parse error: {0}")]
    Json(String),

    #[error(transparent)]
    Type(#[from] TypeParseError),

    #[error("overloaded function `{0}` is not supported")]
    OverloadedFunction(String),

    #[error("ABI document has multiple constructor entries")]
    DuplicateConstructor,
}

/// Raw ABI item as it appears in the document.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
enum AbiItem {
    Function(ParsedFunction),
    Event(ParsedEvent),
    Constructor(ParsedConstructor),
    Fallback,
    Receive,
    Error(ParsedError),
}

#[derive(Debug, Clone, Deserialize)]
struct ParsedFunction {
    name: String,
    #[serde(default)]
    inputs: Vec<ParsedParam>,
    outputs: Option<Vec<ParsedParam>>,
    #[serde(rename = "stateMutability")]
    state_mutability: Option<StateMutability>,
}

#[derive(Debug, Clone, Deserialize)]
struct ParsedConstructor {
    #[serde(default)]
    inputs: Vec<ParsedParam>,
    #[serde(rename = "stateMutability")]
    state_mutability: Option<StateMutability>,
}

#[derive(Debug, Clone, Deserialize)]
struct ParsedEvent {
    name: String,
    #[serde(default)]
    inputs: Vec<ParsedEventParam>,
    anonymous: Option<bool>,
}

#[derive(Debug, Clone, Deserialize)]
#[allow(dead_code)]
struct ParsedError {
    name: String,
    #[serde(default)]
    inputs: Vec<ParsedParam>,
}

#[derive(Debug, Clone, Deserialize)]
struct ParsedParam {
    name: Option<String>,
    #[serde(rename = "type")]
    param_type: String,
    components: Option<Vec<ParsedParam>>,
}

#[derive(Debug, Clone, Deserialize)]
struct ParsedEventParam {
    #[serde(default)]
    name: String,
    #[serde(rename = "type")]
    param_type: String,
    #[serde(default)]
    indexed: bool,
    components: Option<Vec<ParsedParam>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    const SIMPLE_STORAGE: &str = r#"[
        {"type":"constructor","inputs":[],"stateMutability":"nonpayable"},
        {"type":"function","name":"get","inputs":[],"outputs":[{"type":"uint256"}],"stateMutability":"view"},
        {"type":"function","name":"set","inputs":[{"name":"value","type":"uint256"}],"outputs":[],"stateMutability":"nonpayable"}
    ]"#;

    #[test]
    fn parse_simple_document() {
        let abi = ContractAbi::from_json(SIMPLE_STORAGE).unwrap();
        assert_eq!(abi.functions.len(), 2);
        assert!(abi.constructor.is_some());

        let get = abi.function("get").unwrap();
        assert!(get.state_mutability.is_readonly());
        assert_eq!(get.outputs[0].param_type, AbiType::Uint(256));

        let set = abi.function("set").unwrap();
        assert!(!set.state_mutability.is_readonly());
        assert_eq!(set.inputs[0].param_type, AbiType::Uint(256));
    }

    #[test]
    fn parse_constructor_with_inputs() {
        let json = r#"[
            {"type":"constructor","inputs":[{"name":"x","type":"uint256"},{"name":"s","type":"string"}],"stateMutability":"nonpayable"}
        ]"#;
        let abi = ContractAbi::from_json(json).unwrap();
        let c = abi.constructor.unwrap();
        assert_eq!(c.inputs.len(), 2);
        assert_eq!(c.inputs[1].param_type, AbiType::String);
    }

    #[test]
    fn parse_tuple_components() {
        let json = r#"[
            {"type":"function","name":"getStruct","inputs":[],"outputs":[
                {"name":"result","type":"tuple","components":[
                    {"name":"id","type":"uint256"},
                    {"name":"owner","type":"address"}
                ]}
            ],"stateMutability":"view"}
        ]"#;
        let abi = ContractAbi::from_json(json).unwrap();
        let f = abi.function("getStruct").unwrap();
        assert_eq!(
            f.outputs[0].param_type,
            AbiType::Tuple(vec![AbiType::Uint(256), AbiType::Address])
        );
    }

    #[test]
    fn parse_tuple_array() {
        let json = r#"[
            {"type":"function","name":"all","inputs":[],"outputs":[
                {"name":"items","type":"tuple[]","components":[
                    {"name":"id","type":"uint256"}
                ]}
            ],"stateMutability":"view"}
        ]"#;
        let abi = ContractAbi::from_json(json).unwrap();
        let f = abi.function("all").unwrap();
        assert_eq!(
            f.outputs[0].param_type,
            AbiType::Array(Box::new(AbiType::Tuple(vec![AbiType::Uint(256)])), None)
        );
    }

    #[test]
    fn parse_events() {
        let json = r#"[
            {"type":"event","name":"Transfer","inputs":[
                {"name":"from","type":"address","indexed":true},
                {"name":"to","type":"address","indexed":true},
                {"name":"value","type":"uint256","indexed":false}
            ]}
        ]"#;
        let abi = ContractAbi::from_json(json).unwrap();
        let e = abi.event("Transfer").unwrap();
        assert_eq!(e.signature(), "Transfer(address,address,uint256)");
        assert!(e.inputs[0].indexed);
        assert!(!e.inputs[2].indexed);
    }

    #[test]
    fn rejects_overloaded_names() {
        let json = r#"[
            {"type":"function","name":"get","inputs":[],"outputs":[],"stateMutability":"view"},
            {"type":"function","name":"get","inputs":[{"name":"i","type":"uint256"}],"outputs":[],"stateMutability":"view"}
        ]"#;
        assert_eq!(
            ContractAbi::from_json(json).unwrap_err(),
            AbiDocError::OverloadedFunction("get".to_string())
        );
    }

    #[test]
    fn rejects_malformed_documents() {
        assert!(matches!(
            ContractAbi::from_json("not json").unwrap_err(),
            AbiDocError::Json(_)
        ));
        let bad_type = r#"[
            {"type":"function","name":"f","inputs":[{"name":"x","type":"uint11"}],"outputs":[],"stateMutability":"view"}
        ]"#;
        assert!(matches!(
            ContractAbi::from_json(bad_type).unwrap_err(),
            AbiDocError::Type(_)
        ));
    }

    #[test]
    fn tolerates_fallback_receive_and_error_entries() {
        let json = r#"[
            {"type":"fallback","stateMutability":"payable"},
            {"type":"receive","stateMutability":"payable"},
            {"type":"error","name":"Unauthorized","inputs":[]},
            {"type":"function","name":"ping","inputs":[],"outputs":[],"stateMutability":"pure"}
        ]"#;
        let abi = ContractAbi::from_json(json).unwrap();
        assert_eq!(abi.functions.len(), 1);
    }

    #[test]
    fn function_by_selector_lookup() {
        let json = r#"[
            {"type":"function","name":"transfer","inputs":[{"name":"to","type":"address"},{"name":"amount","type":"uint256"}],"outputs":[{"type":"bool"}],"stateMutability":"nonpayable"}
        ]"#;
        let abi = ContractAbi::from_json(json).unwrap();
        let f = abi.function_by_selector(&[0xa9, 0x05, 0x9c, 0xbb]).unwrap();
        assert_eq!(f.name, "transfer");
    }
}

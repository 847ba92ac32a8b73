use ethereum_types::{Address, H256, U256};
use serde::{Deserialize, Serialize};

/// Selects which block an `eth_call`/`eth_getBalance`-style request reads
/// against.
#[derive(Debug, Clone, Copy)]
pub enum BlockIdentifier {
    Number(u64),
    Latest,
    Pending,
    Earliest,
}

impl BlockIdentifier {
    pub fn to_param(self) -> serde_json::Value {
        match self {
            BlockIdentifier::Number(n) => serde_json::Value::String(format!("0x{n:x}")),
            BlockIdentifier::Latest => serde_json::Value::String("latest".to_string()),
            BlockIdentifier::Pending => serde_json::Value::String("pending".to_string()),
            BlockIdentifier::Earliest => serde_json::Value::String("earliest".to_string()),
        }
    }
}

/// A decoded `eth_getLogs` entry. Fields are exactly what the derivation
/// and discovery engines need; anything else in the node's response is
/// dropped during deserialization.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RpcLog {
    pub address: Address,
    pub topics: Vec<H256>,
    #[serde(with = "hex_bytes")]
    pub data: Vec<u8>,
    #[serde(rename = "blockNumber", with = "hex_u64")]
    pub block_number: u64,
    #[serde(rename = "transactionHash")]
    pub transaction_hash: H256,
    #[serde(rename = "logIndex", with = "hex_u64")]
    pub log_index: u64,
    #[serde(default)]
    pub removed: bool,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RpcBlock {
    #[serde(with = "hex_u64")]
    pub number: u64,
    #[serde(with = "hex_u64")]
    pub timestamp: u64,
    pub hash: H256,
    #[serde(rename = "parentHash")]
    pub parent_hash: H256,
    #[serde(rename = "stateRoot")]
    pub state_root: H256,
}

/// A minimal `eth_call` override set, used when simulating a privileged
/// call from an address that has not necessarily been funded on the
/// target chain (§4.3).
#[derive(Debug, Clone, Default, Serialize)]
pub struct CallRequest {
    pub from: Option<Address>,
    pub to: Option<Address>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<U256>,
    #[serde(with = "hex_bytes")]
    pub data: Vec<u8>,
}

/// A single call frame as reported by `debug_traceCall`/`debug_traceTransaction`
/// with `tracer: "callTracer"`, used by the discovery engine to find the
/// first unresolved sub-call (§4.3).
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallFrame {
    #[serde(rename = "type")]
    pub kind: String,
    pub from: Address,
    pub to: Option<Address>,
    #[serde(default, with = "hex_bytes_opt")]
    pub input: Vec<u8>,
    #[serde(default, with = "hex_bytes_opt")]
    pub output: Vec<u8>,
    #[serde(default, with = "hex_u256_opt")]
    pub value: Option<U256>,
    pub error: Option<String>,
    #[serde(default)]
    pub calls: Vec<CallFrame>,
}

mod hex_bytes {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&format!("0x{}", hex::encode(bytes)))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<u8>, D::Error> {
        let s = String::deserialize(d)?;
        hex::decode(s.trim_start_matches("0x")).map_err(serde::de::Error::custom)
    }
}

mod hex_bytes_opt {
    use serde::{Deserialize, Deserializer};

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<u8>, D::Error> {
        let s = Option::<String>::deserialize(d)?.unwrap_or_default();
        if s.is_empty() {
            return Ok(Vec::new());
        }
        hex::decode(s.trim_start_matches("0x")).map_err(serde::de::Error::custom)
    }
}

mod hex_u256_opt {
    use ethereum_types::U256;
    use serde::{Deserialize, Deserializer};

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<U256>, D::Error> {
        let s = Option::<String>::deserialize(d)?;
        match s {
            None => Ok(None),
            Some(s) if s.is_empty() => Ok(None),
            Some(s) => U256::from_str_radix(s.trim_start_matches("0x"), 16)
                .map(Some)
                .map_err(serde::de::Error::custom),
        }
    }
}

mod hex_u64 {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &u64, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&format!("0x{value:x}"))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<u64, D::Error> {
        let s = String::deserialize(d)?;
        u64::from_str_radix(s.trim_start_matches("0x"), 16).map_err(serde::de::Error::custom)
    }
}

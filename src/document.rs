//! Persisted network document, the JSON layout the surrounding ecosystem
//! stores networks in. The top level object has a single entry keyed by the
//! network UUID:
//!
//! ```json
//! {
//!   "<network-uuid>": {
//!     "name": "...",
//!     "netKeys":  [ { "refresh": 0, "key": "<hex32>" } ],
//!     "appKeys":  [ { "key": "<hex32>", "boundNetKey": 0 } ],
//!     "nodes":    [ { "unicast": 2, "key": "<hex32>", "name": "..." } ],
//!     "lowerAddress": 16,
//!     "ivIndex": 0,
//!     "timestamp": "2020-03-22T18:25:43.511Z"
//!   }
//! }
//! ```
//!
//! `hex32` is 32 hex characters encoding 16 big-endian bytes. Structural JSON
//! errors belong to the caller's JSON parser; this module only validates the
//! mesh-level content while converting into a [`MeshNetwork`].
use crate::access::PduBuildError;
use crate::address::UnicastAddress;
use crate::crypto::key;
use crate::mesh::{IVIndex, KeyIndex, NetKeyIndex};
use crate::network::{AppKey, MeshNetwork, NetKey, Node};
use alloc::collections::BTreeMap;
use alloc::string::String;
use alloc::vec::Vec;
use core::convert::TryFrom;
use serde::Deserialize;

/// Whole document: network records keyed by their UUID.
#[derive(Clone, Debug, Deserialize)]
#[serde(transparent)]
pub struct NetworkDocument(pub BTreeMap<String, NetworkRecord>);

impl NetworkDocument {
    /// Pulls out the single `(uuid, record)` entry. `None` for an empty
    /// document (structurally valid JSON, but nothing to load).
    #[must_use]
    pub fn into_entry(self) -> Option<(String, NetworkRecord)> {
        self.0.into_iter().next()
    }
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkRecord {
    pub name: String,
    pub net_keys: Vec<NetKeyRecord>,
    pub app_keys: Vec<AppKeyRecord>,
    pub nodes: Vec<NodeRecord>,
    pub lower_address: u16,
    pub iv_index: u32,
    pub timestamp: String,
    /// The provisioner's own device key. Documents written before the field
    /// existed omit it; those networks fall back to an all-zero device key
    /// and cannot use the device-key path meaningfully.
    #[serde(default)]
    pub dev_key: Option<String>,
}
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetKeyRecord {
    pub refresh: u16,
    pub key: String,
}
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppKeyRecord {
    pub key: String,
    pub bound_net_key: u16,
}
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeRecord {
    pub unicast: u16,
    pub key: String,
    pub name: String,
}

fn parse_key(hex: &str) -> Result<key::Key, PduBuildError> {
    key::Key::from_hex(hex).ok_or(PduBuildError::InvalidKeyMaterial)
}
fn positional_index(i: usize) -> Result<u16, PduBuildError> {
    u16::try_from(i)
        .ok()
        .and_then(|v| KeyIndex::try_from(v).ok())
        .map(u16::from)
        .ok_or(PduBuildError::UnknownKey)
}

impl NetworkRecord {
    /// Validates the record and builds the in-memory network. Key list
    /// indexes are positional, matching how the access layer addresses app
    /// keys.
    pub fn into_network(self, uuid: String) -> Result<MeshNetwork, PduBuildError> {
        let NetworkRecord {
            name,
            net_keys,
            app_keys,
            nodes,
            lower_address,
            iv_index,
            timestamp: _,
            dev_key,
        } = self;
        let dev_key = match dev_key {
            Some(hex) => key::DevKey::new(parse_key(&hex)?),
            None => key::DevKey::new(key::ZERO_KEY),
        };
        let mut network = MeshNetwork::new(uuid, name, dev_key);
        network.set_iv_index(IVIndex(iv_index));
        network.set_next_unicast(lower_address);
        for (i, record) in net_keys.into_iter().enumerate() {
            network.add_net_key(NetKey::new(
                positional_index(i)?,
                key::NetKey::new(parse_key(&record.key)?),
            ));
        }
        for (i, record) in app_keys.into_iter().enumerate() {
            let bound = KeyIndex::try_from(record.bound_net_key)
                .map(NetKeyIndex)
                .map_err(|_| PduBuildError::UnknownKey)?;
            network.add_app_key(AppKey::new(
                positional_index(i)?,
                key::AppKey::new(parse_key(&record.key)?),
                u16::from(bound.0),
            ))?;
        }
        for record in nodes {
            let unicast = UnicastAddress::try_from(record.unicast)
                .map_err(|_| PduBuildError::InvalidAddress)?;
            network.add_node(Node::new(
                unicast,
                key::DevKey::new(parse_key(&record.key)?),
                record.name,
            ));
        }
        Ok(network)
    }
}

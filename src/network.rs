//! In-memory model of a provisioned mesh network: key lists, known nodes and
//! the transmit state (IV index + sequence counter). Built by an external
//! loader; the outbound core reads it and only ever advances the sequence
//! counter.
use crate::address::UnicastAddress;
use crate::crypto::key;
use crate::mesh::{AppKeyIndex, IVIndex, KeyIndex, NetKeyIndex, SequenceNumber, U24};
use alloc::string::String;
use alloc::vec::Vec;
use core::sync::atomic::{AtomicU32, Ordering};

/// A stored network key and its 12-bit global index.
#[derive(Clone, Debug)]
pub struct NetKey {
    index: NetKeyIndex,
    key: key::NetKey,
    name: Option<String>,
}
impl NetKey {
    /// # Panics
    /// Panics if `index > 4095`.
    #[must_use]
    pub fn new(index: u16, key: key::NetKey) -> NetKey {
        NetKey {
            index: NetKeyIndex(KeyIndex::new(index)),
            key,
            name: None,
        }
    }
    #[must_use]
    pub fn with_name(mut self, name: String) -> NetKey {
        self.name = Some(name);
        self
    }
    #[must_use]
    pub fn index(&self) -> NetKeyIndex {
        self.index
    }
    #[must_use]
    pub fn key(&self) -> &key::NetKey {
        &self.key
    }
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }
}
/// A stored application key, bound to the net key it rides on.
#[derive(Clone, Debug)]
pub struct AppKey {
    index: AppKeyIndex,
    key: key::AppKey,
    bound_net_key: NetKeyIndex,
    name: Option<String>,
}
impl AppKey {
    /// # Panics
    /// Panics if `index > 4095` or `bound_net_key > 4095`.
    #[must_use]
    pub fn new(index: u16, key: key::AppKey, bound_net_key: u16) -> AppKey {
        AppKey {
            index: AppKeyIndex(KeyIndex::new(index)),
            key,
            bound_net_key: NetKeyIndex(KeyIndex::new(bound_net_key)),
            name: None,
        }
    }
    #[must_use]
    pub fn with_name(mut self, name: String) -> AppKey {
        self.name = Some(name);
        self
    }
    #[must_use]
    pub fn index(&self) -> AppKeyIndex {
        self.index
    }
    #[must_use]
    pub fn key(&self) -> &key::AppKey {
        &self.key
    }
    #[must_use]
    pub fn bound_net_key(&self) -> NetKeyIndex {
        self.bound_net_key
    }
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }
}
/// A provisioned node: its primary unicast address and device key.
#[derive(Clone, Debug)]
pub struct Node {
    uuid: Option<String>,
    unicast: UnicastAddress,
    dev_key: key::DevKey,
    name: String,
    element_count: u8,
}
impl Node {
    #[must_use]
    pub fn new(unicast: UnicastAddress, dev_key: key::DevKey, name: String) -> Node {
        Node {
            uuid: None,
            unicast,
            dev_key,
            name,
            element_count: 1,
        }
    }
    #[must_use]
    pub fn with_uuid(mut self, uuid: String) -> Node {
        self.uuid = Some(uuid);
        self
    }
    #[must_use]
    pub fn with_element_count(mut self, element_count: u8) -> Node {
        self.element_count = element_count;
        self
    }
    #[must_use]
    pub fn uuid(&self) -> Option<&str> {
        self.uuid.as_deref()
    }
    #[must_use]
    pub fn unicast(&self) -> UnicastAddress {
        self.unicast
    }
    #[must_use]
    pub fn dev_key(&self) -> &key::DevKey {
        &self.dev_key
    }
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }
    #[must_use]
    pub fn element_count(&self) -> u8 {
        self.element_count
    }
}

/// Atomic sequence counter so no two PDUs are minted with the same
/// `(iv_index, seq)`. Sequence numbers are a finite resource (24 bits) that
/// only resets on an IV index update.
#[derive(Debug, Default)]
pub struct SeqCounter(AtomicU32);
impl SeqCounter {
    #[must_use]
    pub fn new(start_seq: SequenceNumber) -> Self {
        Self(AtomicU32::new((start_seq.0).value()))
    }
    /// Allocates the next sequence number. Returns `None` once the 24-bit
    /// space is spent; the IV index must be refreshed before transmitting
    /// again.
    pub fn next(&self) -> Option<SequenceNumber> {
        let next = self.0.fetch_add(1, Ordering::SeqCst);
        if next > U24::max_value().value() {
            // Park the counter at the fence so it can't wrap back into
            // valid territory.
            self.0
                .store(U24::max_value().value() + 1, Ordering::SeqCst);
            None
        } else {
            Some(SequenceNumber(U24::new(next)))
        }
    }
    #[must_use]
    pub fn check(&self) -> u32 {
        self.0.load(Ordering::SeqCst)
    }
    pub fn set(&mut self, new_seq: SequenceNumber) {
        *self.0.get_mut() = (new_seq.0).value()
    }
}
impl Clone for SeqCounter {
    fn clone(&self) -> Self {
        SeqCounter(AtomicU32::new(self.0.load(Ordering::SeqCst)))
    }
}

/// A provisioned mesh network. Mostly immutable once loaded; the outbound
/// pipeline only advances `sequence` and an external rotation may raise
/// `iv_index`.
#[derive(Clone, Debug)]
pub struct MeshNetwork {
    uuid: String,
    name: String,
    iv_index: IVIndex,
    sequence: SeqCounter,
    net_keys: Vec<NetKey>,
    app_keys: Vec<AppKey>,
    dev_key: key::DevKey,
    nodes: Vec<Node>,
    next_unicast: u16,
}
impl MeshNetwork {
    #[must_use]
    pub fn new(uuid: String, name: String, dev_key: key::DevKey) -> MeshNetwork {
        MeshNetwork {
            uuid,
            name,
            iv_index: IVIndex(0),
            sequence: SeqCounter::default(),
            net_keys: Vec::new(),
            app_keys: Vec::new(),
            dev_key,
            nodes: Vec::new(),
            next_unicast: 0x0001,
        }
    }
    #[must_use]
    pub fn uuid(&self) -> &str {
        &self.uuid
    }
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }
    #[must_use]
    pub fn iv_index(&self) -> IVIndex {
        self.iv_index
    }
    /// IV index rotation comes from outside the core and never moves
    /// backwards.
    pub fn set_iv_index(&mut self, iv_index: IVIndex) {
        debug_assert!(
            iv_index.0 >= self.iv_index.0,
            "IV index must be non-decreasing"
        );
        self.iv_index = iv_index;
    }
    /// Atomically allocates the next outbound sequence number. `None` once
    /// the 24-bit space is spent.
    pub fn next_seq(&self) -> Option<SequenceNumber> {
        self.sequence.next()
    }
    #[must_use]
    pub fn seq_counter(&self) -> &SeqCounter {
        &self.sequence
    }
    pub fn seq_counter_mut(&mut self) -> &mut SeqCounter {
        &mut self.sequence
    }
    #[must_use]
    pub fn net_keys(&self) -> &[NetKey] {
        &self.net_keys
    }
    #[must_use]
    pub fn app_keys(&self) -> &[AppKey] {
        &self.app_keys
    }
    #[must_use]
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }
    #[must_use]
    pub fn dev_key(&self) -> &key::DevKey {
        &self.dev_key
    }
    /// App key by list position (the `app_idx` the access layer consumes).
    #[must_use]
    pub fn app_key(&self, position: usize) -> Option<&AppKey> {
        self.app_keys.get(position)
    }
    /// Net key by its global 12-bit index.
    #[must_use]
    pub fn net_key_by_index(&self, index: NetKeyIndex) -> Option<&NetKey> {
        self.net_keys.iter().find(|k| k.index() == index)
    }
    pub fn add_net_key(&mut self, net_key: NetKey) {
        debug_assert!(
            self.net_key_by_index(net_key.index()).is_none(),
            "duplicate net key index"
        );
        self.net_keys.push(net_key);
    }
    /// Fails with `UnknownKey` if the bound net key does not exist.
    pub fn add_app_key(&mut self, app_key: AppKey) -> Result<(), crate::access::PduBuildError> {
        if self.net_key_by_index(app_key.bound_net_key()).is_none() {
            return Err(crate::access::PduBuildError::UnknownKey);
        }
        self.app_keys.push(app_key);
        Ok(())
    }
    pub fn add_node(&mut self, node: Node) {
        let after_node = u16::from(node.unicast()) + u16::from(node.element_count());
        if after_node > self.next_unicast {
            self.next_unicast = after_node;
        }
        self.nodes.push(node);
    }
    /// Lowest unicast address not yet handed to a node.
    #[must_use]
    pub fn next_unicast(&self) -> u16 {
        self.next_unicast
    }
    pub fn set_next_unicast(&mut self, next_unicast: u16) {
        self.next_unicast = next_unicast;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::access::PduBuildError;
    use crate::crypto::key::ZERO_KEY;
    use alloc::string::ToString;
    use core::convert::TryFrom;

    fn network() -> MeshNetwork {
        MeshNetwork::new(
            "2f9d2d73-cb60-4c19-a725-a36fc4f2b003".to_string(),
            "test net".to_string(),
            key::DevKey::new(ZERO_KEY),
        )
    }

    #[test]
    fn test_seq_counter_monotonic() {
        let counter = SeqCounter::default();
        assert_eq!(counter.next(), Some(SequenceNumber(U24::new(0))));
        assert_eq!(counter.next(), Some(SequenceNumber(U24::new(1))));
        assert_eq!(counter.check(), 2);
    }
    #[test]
    fn test_seq_counter_exhaustion() {
        let counter = SeqCounter::new(SequenceNumber(U24::max_value()));
        assert_eq!(counter.next(), Some(SequenceNumber(U24::max_value())));
        assert_eq!(counter.next(), None);
        // Stays exhausted.
        assert_eq!(counter.next(), None);
    }
    #[test]
    fn test_app_key_requires_bound_net_key() {
        let mut network = network();
        let app_key = AppKey::new(0, key::AppKey::new(ZERO_KEY), 0);
        assert_eq!(
            network.add_app_key(app_key.clone()),
            Err(PduBuildError::UnknownKey)
        );
        network.add_net_key(NetKey::new(0, key::NetKey::new(ZERO_KEY)));
        assert_eq!(network.add_app_key(app_key), Ok(()));
        assert!(network.app_key(0).is_some());
        assert!(network.app_key(1).is_none());
    }
    #[test]
    fn test_next_unicast_tracks_nodes() {
        let mut network = network();
        assert_eq!(network.next_unicast(), 0x0001);
        network.add_node(
            Node::new(
                UnicastAddress::try_from(0x0002).unwrap(),
                key::DevKey::new(ZERO_KEY),
                "light".to_string(),
            )
            .with_element_count(3),
        );
        assert_eq!(network.next_unicast(), 0x0005);
    }
}

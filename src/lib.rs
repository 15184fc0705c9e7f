//! Provisioner-side Bluetooth Mesh outbound PDU construction.
//! Takes a model-layer payload plus a network's key material and produces a
//! fully obfuscated, encrypted network PDU ready for a Mesh Proxy link.
#![no_std]

extern crate alloc;

pub mod access;
pub mod address;
pub mod crypto;
pub mod mesh;
pub mod net;
pub mod network;
pub mod transport;

#[cfg(feature = "serde")]
pub mod document;

//! xair-scene-sync
//!
//! A configuration-driven bridge between a host application's scene changes
//! and a Behringer X Air mixer: each scene-change notification is looked up
//! in a scene → snapshot table, and a hit fires exactly one `/-snap/load`
//! OSC datagram over UDP. Best-effort and fire-and-forget - the X Air offers
//! no delivery confirmation on this channel, so none is awaited.

#![deny(unsafe_code)]
#![deny(unused_must_use)]

pub mod bridge;
pub mod bus;
pub mod config;
pub mod mapping;
pub mod osc;

//! Workspace placeholder crate.
//!
//! This crate exists to expose shared feature flags that map to the
//! individual workspace crates (`core-decode`, `codec-symphonia`). Host
//! applications can depend on `adp-workspace` and enable the documented
//! `decoder-*` features without needing to wire each crate individually.

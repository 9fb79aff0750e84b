//! End-to-End Integration Tests
//!
//! These tests drive the gateway and the issuance pipeline through a scripted
//! stand-in for the `xmlsec1` engine, so the subprocess protocol runs for
//! real without the engine installed.

mod common;
mod gateway;
mod issuance;

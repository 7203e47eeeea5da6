//! Integration tests for the collabx client core

mod cli_contracts;
mod ingest_pipeline;
mod session_flow;
mod support;
mod tree_roundtrip;

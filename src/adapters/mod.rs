// Adapters layer: concrete implementations for external systems (chain node, raw state, output).

pub mod memory;
pub mod rpc;
pub mod storage;

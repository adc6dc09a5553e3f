// external
pub extern crate hex;

// exports
pub mod abi;
pub mod calldata;
pub mod config;
pub mod execution_context;
pub mod memory;
pub mod metering;
pub mod probe;
pub mod stack;

pub use abi::{selector_for, AbiType, AbiValue};
pub use calldata::CallData;
pub use config::ContextConfig;
pub use execution_context::ExecutionContext;
pub use memory::MemoryRegion;
pub use metering::{GasAccountant, GasSchedule, MemoryUnit};
pub use stack::{Stack, STACK_LIMIT};
pub use storage::{HashFunction, Snapshot, StorageMap};
pub use types::{VmError, VmResult, Word};

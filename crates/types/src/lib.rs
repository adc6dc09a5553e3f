pub mod address;
pub use address::{Address, ADDRESS_LEN};

pub mod result;
pub use result::{MemoryAccess, VmError, VmResult};

pub mod word;
pub use word::{Word, WORD_SIZE};

pub use primitive_types::U256;

pub mod hash;
pub mod header;
pub mod u256;

pub use hash::{double_sha256, H256};
pub use header::{Header, Target, Work};
pub use u256::U256;

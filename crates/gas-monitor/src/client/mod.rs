pub mod fees;
pub mod rpc;

pub use fees::{FEE_ORACLE_ADDRESS, FEE_ORACLE_QUERIES};
pub use rpc::{EvmRpcClient, parse_hex_quantity};

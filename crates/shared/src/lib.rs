pub mod abi;
pub mod domain;
pub mod error;
pub mod protocol;

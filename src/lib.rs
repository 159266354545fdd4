pub mod codec;
pub mod column;
pub mod conf;
pub mod core;
pub mod dictionary;
pub mod packed;
pub mod store;

#[cfg(feature = "testutil")]
pub mod testutil;

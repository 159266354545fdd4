mod codec;
mod config;

pub use codec::CodecConfig;
pub use config::Config;

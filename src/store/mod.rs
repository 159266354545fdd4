//! Byte-level storage for doc-values files: where they live ([`Directory`]),
//! how they are written ([`IndexOutput`]) and read back ([`IndexInput`]).

pub mod codec_util;
mod directory;
mod heap;
mod input;
mod local;
mod output;

pub use directory::{Directory, segment_file_name};
pub use heap::HeapDirectory;
pub use input::IndexInput;
pub(crate) use input::decode_vlong;
pub use local::LocalDirectory;
pub use output::{DataOutput, IndexOutput};

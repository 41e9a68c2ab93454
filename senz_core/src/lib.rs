pub mod codec;
pub mod error;
pub mod id;
pub mod node;

pub use codec::Codec;
pub use error::CodecError;
pub use id::CodecId;
pub use node::{
    ConfigWatcher, Cropping, ManualNode, NodeKind, PixelFormat, SourceNode, VideoMode, WatcherId,
};

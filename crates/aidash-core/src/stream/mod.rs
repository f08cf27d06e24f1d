//! Streaming response consumption.
//!
//! Bytes from a transport flow through the UTF-8 decoder and the chunk
//! parser into the `StreamReader`, which accumulates text and reports each
//! partial message to a sink.

pub mod decoder;
pub mod parser;
pub mod reader;
pub mod transport;

pub use decoder::Utf8StreamDecoder;
pub use parser::{ChunkParser, ParsedChunks};
pub use reader::{ReaderOptions, StreamReader};
pub use transport::{ByteStream, StreamTransport};

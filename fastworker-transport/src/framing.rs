//! # Framing
//!
//! Every socket pattern shares one wire framing: a `u32` big-endian length
//! prefix followed by an opaque payload, via `tokio_util`'s
//! `LengthDelimitedCodec`. This is the one piece of on-the-wire structure
//! the core imposes; payload contents are opaque serialized messages.

use tokio::net::TcpStream;
use tokio_util::codec::{Framed, LengthDelimitedCodec};

pub type FramedStream = Framed<TcpStream, LengthDelimitedCodec>;

pub fn frame(stream: TcpStream) -> FramedStream {
    Framed::new(stream, LengthDelimitedCodec::new())
}

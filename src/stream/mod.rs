//! Streaming protocol support: decoder, payload parser, session controller.
//!
//! A stream session is one chunked HTTP exchange with the generation
//! endpoint. Bytes flow through [`LineDecoder`] into [`parse_line`], and the
//! session controller dispatches the resulting events to a
//! [`StreamObserver`] in exact decode order.

pub mod decoder;
pub mod parser;
pub mod session;

pub use decoder::LineDecoder;
pub use parser::{StreamEvent, parse_line};
pub use session::{
    ChatClient, ChatRequest, SessionOutcome, StreamObserver, WireMessage, WireRole,
};

//! Wire Protocol Module
//!
//! Defines how a dot-product task and its scalar result travel between the
//! coordinator and a worker. One connection carries exactly one request frame
//! followed by one response frame.
//!
//! ## Layers
//! - **`codec`**: Length-prefixed framing over any async byte stream.
//! - **`message`**: Text encoding of the request (`row;col`) and of the
//!   response (a decimal integer, or `!reason` for an explicit error).

pub mod codec;
pub mod message;

//! The payload handed to the workqueue for each datagram received.
//!
//! Grounded on `cd_msg_t`/`cd_endpoint_msg_create` in `cd_endpoint.c`: there
//! the message is a `malloc`'d buffer copy plus a length; here it is an
//! owned `Vec<u8>`, and `from` additionally carries the sender's address
//! (the C source only formats it into a log line before the copy is made).

use std::net::SocketAddr;

/// One datagram, copied out of the receive buffer so it can outlive the
/// read loop and be handed to a worker thread.
#[derive(Debug, Clone)]
pub struct Message {
    pub data: Vec<u8>,
    pub from: SocketAddr,
}

impl Message {
    pub fn new(data: Vec<u8>, from: SocketAddr) -> Self {
        Message { data, from }
    }
}

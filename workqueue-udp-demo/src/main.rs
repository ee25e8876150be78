//! UDP endpoint demo: receives datagrams and hands each to a workqueue.
//!
//! Grounded on `cd_example_udp.c`'s `main`: create an endpoint, point it at
//! a port and a worker count, install an `on_message` callback, and loop.
//! Ctrl-C there is a TODO in the C source ("instal signal handler"); this
//! demo fills that gap with `ctrlc`, setting a stop flag the endpoint's
//! read loop checks once per `POLL_INTERVAL`, which then triggers a SOFT
//! stop of the workqueue.

mod endpoint;
mod message;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use workqueue::StopPolicy;

use endpoint::UdpEndpoint;

const PORT: u16 = 33226;
const WORKER_COUNT: usize = 4;

fn main() -> std::io::Result<()> {
    env_logger::init();

    let stop = Arc::new(AtomicBool::new(false));
    let stop_handler = Arc::clone(&stop);
    ctrlc::set_handler(move || {
        log::info!("received Ctrl-C, stopping");
        stop_handler.store(true, Ordering::SeqCst);
    })
    .expect("failed to install Ctrl-C handler");

    let endpoint = UdpEndpoint::bind(PORT, WORKER_COUNT, StopPolicy::Soft)?;

    endpoint.run(
        |message| {
            println!("got {} bytes to process from {}", message.data.len(), message.from);
        },
        stop,
    )
}

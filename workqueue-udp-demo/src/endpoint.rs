//! A UDP endpoint that hands each received datagram to a [`WorkQueue`] as a
//! SYNC work item, one worker pool shared across every datagram.
//!
//! Grounded on `cd_udp_endpoint_do_loop`/`cd_udp_endpoint_loop` in
//! `cd_endpoint.c`: bind, then loop on `recvfrom`, building one `cd_msg_t`
//! and one `struct cd_work` per datagram and enqueueing it. The `cb_on_msg`
//! callback there becomes the `on_message` closure here; the C source's
//! `cd_endpoint_msg_dctor_f` (which just frees the message) becomes the
//! destructor passed to [`WorkItem::new_sync`], run by the engine once
//! `on_message` returns.

use std::io;
use std::net::UdpSocket;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use workqueue::{StopPolicy, WorkQueue};

use crate::message::Message;

const RECV_BUFFER_LEN: usize = 65_536;
/// How often the read loop wakes up to check `stop` even with no traffic,
/// mirroring the periodic-wakeup role the source leaves to a TODO'd signal
/// handler install in `cd_udp_endpoint_do_loop`.
const POLL_INTERVAL: Duration = Duration::from_millis(200);

pub struct UdpEndpoint {
    socket: UdpSocket,
    queue: WorkQueue,
}

impl UdpEndpoint {
    /// Binds to `port` on all interfaces and starts a workqueue with
    /// `worker_count` threads under `stop_policy`.
    pub fn bind(port: u16, worker_count: usize, stop_policy: StopPolicy) -> io::Result<Self> {
        let socket = UdpSocket::bind(("0.0.0.0", port))?;
        socket.set_read_timeout(Some(POLL_INTERVAL))?;

        let queue = WorkQueue::create(worker_count, format!("udp-endpoint-{port}"), stop_policy)
            .map_err(|err| io::Error::new(io::ErrorKind::Other, err.to_string()))?;

        log::info!("bound UDP endpoint on port {port} with {worker_count} workers");
        Ok(UdpEndpoint { socket, queue })
    }

    /// Receives datagrams until `stop` is set, dispatching each to the
    /// workqueue as a SYNC item running `on_message`.
    ///
    /// On return, calls [`WorkQueue::stop`] so every datagram already
    /// enqueued is drained (SOFT) or finished-in-flight (HARD) before this
    /// function gives control back to the caller.
    pub fn run<F>(&self, on_message: F, stop: Arc<AtomicBool>) -> io::Result<()>
    where
        F: Fn(&Message) + Send + Sync + 'static,
    {
        let on_message = Arc::new(on_message);
        let mut buf = vec![0u8; RECV_BUFFER_LEN];

        while !stop.load(Ordering::SeqCst) {
            let (len, from) = match self.socket.recv_from(&mut buf) {
                Ok(result) => result,
                Err(err) if matches!(err.kind(), io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut) => {
                    continue;
                }
                Err(err) => {
                    log::error!("recv_from failed: {err}");
                    return Err(err);
                }
            };

            log::info!("recvfrom {len} bytes (UDP) - from: {from}");
            let message = Message::new(buf[..len].to_vec(), from);
            let callback = Arc::clone(&on_message);

            let enqueued = self.queue.enqueue_sync(
                0,
                message,
                move |message: &mut Message| callback(message),
                Some(|message: Message| {
                    log::debug!("dropping message from {} ({} bytes)", message.from, message.data.len());
                }),
            );
            if let Err(err) = enqueued {
                log::error!("cannot enqueue work: {err}");
                return Err(io::Error::new(io::ErrorKind::Other, err.to_string()));
            }
        }

        self.queue
            .stop()
            .map_err(|err| io::Error::new(io::ErrorKind::Other, err.to_string()))
    }
}

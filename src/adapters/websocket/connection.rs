//! Channel-backed implementation of the `Connection` port.
//!
//! Frames go into a bounded queue drained by the socket's writer task.
//! Sending never blocks: a full queue drops the frame and counts it.
//! Closing drops the queue's sender, so the writer flushes what is already
//! queued and then ends.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use tokio::sync::mpsc::{self, error::TrySendError};

use crate::domain::foundation::ConnectionId;
use crate::domain::protocol::{Frame, WireFormat};
use crate::ports::{Connection, ConnectionError};

/// A connected peer, as seen from the room side.
#[derive(Debug)]
pub struct ChannelConnection {
    id: ConnectionId,
    format: WireFormat,
    outbound: Mutex<Option<mpsc::Sender<Frame>>>,
    dropped_frames: AtomicU64,
}

impl ChannelConnection {
    /// Create a connection with a fresh id and its outbound receiver.
    pub fn new(format: WireFormat, buffer: usize) -> (Self, mpsc::Receiver<Frame>) {
        Self::with_id(ConnectionId::new(), format, buffer)
    }

    pub fn with_id(
        id: ConnectionId,
        format: WireFormat,
        buffer: usize,
    ) -> (Self, mpsc::Receiver<Frame>) {
        let (tx, rx) = mpsc::channel(buffer.max(1));
        let connection = Self {
            id,
            format,
            outbound: Mutex::new(Some(tx)),
            dropped_frames: AtomicU64::new(0),
        };
        (connection, rx)
    }

    /// Total frames dropped because the queue was full or closed.
    pub fn drop_count(&self) -> u64 {
        self.dropped_frames.load(Ordering::Relaxed)
    }

    fn sender(&self) -> Option<mpsc::Sender<Frame>> {
        self.outbound
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

impl Connection for ChannelConnection {
    fn id(&self) -> ConnectionId {
        self.id
    }

    fn format(&self) -> WireFormat {
        self.format
    }

    fn is_open(&self) -> bool {
        self.sender().is_some_and(|tx| !tx.is_closed())
    }

    fn send_frame(&self, frame: Frame) -> Result<(), ConnectionError> {
        let Some(tx) = self.sender() else {
            return Err(ConnectionError::Closed(self.id));
        };
        match tx.try_send(frame) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(_)) => {
                self.dropped_frames.fetch_add(1, Ordering::Relaxed);
                Err(ConnectionError::Backpressure(self.id))
            }
            Err(TrySendError::Closed(_)) => {
                self.dropped_frames.fetch_add(1, Ordering::Relaxed);
                Err(ConnectionError::Closed(self.id))
            }
        }
    }

    fn close(&self) {
        self.outbound
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .take();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn queued_frames_reach_receiver() {
        let (conn, mut rx) = ChannelConnection::new(WireFormat::Json, 4);

        conn.send_frame(Frame::Text("a".into())).unwrap();
        conn.send_frame(Frame::Binary(vec![1])).unwrap();

        assert_eq!(rx.try_recv().unwrap(), Frame::Text("a".into()));
        assert_eq!(rx.try_recv().unwrap(), Frame::Binary(vec![1]));
        assert_eq!(conn.drop_count(), 0);
    }

    #[test]
    fn full_queue_counts_drop() {
        let (conn, _rx) = ChannelConnection::new(WireFormat::Json, 1);

        conn.send_frame(Frame::Text("a".into())).unwrap();
        let err = conn.send_frame(Frame::Text("b".into())).unwrap_err();

        assert_eq!(err, ConnectionError::Backpressure(conn.id()));
        assert_eq!(conn.drop_count(), 1);
        assert!(conn.is_open());
    }

    #[test]
    fn dropped_receiver_means_closed() {
        let (conn, rx) = ChannelConnection::new(WireFormat::MsgPack, 4);
        drop(rx);

        assert!(!conn.is_open());
        assert_eq!(
            conn.send_frame(Frame::Binary(vec![])),
            Err(ConnectionError::Closed(conn.id()))
        );
    }

    #[tokio::test]
    async fn close_lets_writer_drain_then_end() {
        let (conn, mut rx) = ChannelConnection::new(WireFormat::Json, 4);
        conn.send_frame(Frame::Text("last".into())).unwrap();

        conn.close();
        conn.close();

        assert!(!conn.is_open());
        assert_eq!(rx.recv().await, Some(Frame::Text("last".into())));
        assert_eq!(rx.recv().await, None);
        assert!(conn.send_frame(Frame::Text("late".into())).is_err());
    }
}

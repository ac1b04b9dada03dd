//! Destinations for sampled events.
//!
//! The sampler awaits each `send` inline, so a sink that blocks stalls
//! sampling until it makes room. No timeout is applied on that path.

use std::future::Future;
use std::io::Write;

use tokio::sync::mpsc;

use crate::error::SinkError;
use crate::event::Event;

pub trait EventSink {
    /// Deliver one event. `SinkError::Closed` means nothing downstream is
    /// listening any more and the sampler should stop.
    fn send(&mut self, event: Event) -> impl Future<Output = Result<(), SinkError>> + Send;
}

/// Bounded queue towards a publisher task. Waits while the queue is full.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: mpsc::Sender<Event>,
}

impl ChannelSink {
    pub fn new(tx: mpsc::Sender<Event>) -> Self {
        Self { tx }
    }

    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<Event>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (Self::new(tx), rx)
    }
}

impl EventSink for ChannelSink {
    async fn send(&mut self, event: Event) -> Result<(), SinkError> {
        self.tx.send(event).await.map_err(|_| SinkError::Closed)
    }
}

/// Writes one JSON object per line.
///
/// With `pretty` each object is indented over several lines instead, so the
/// output is a newline-separated JSON stream rather than JSON lines.
pub struct JsonLinesSink<W> {
    writer: W,
    pretty: bool,
}

impl<W: Write + Send> JsonLinesSink<W> {
    pub fn new(writer: W, pretty: bool) -> Self {
        Self { writer, pretty }
    }

    pub fn write_event(&mut self, event: &Event) -> Result<(), SinkError> {
        if self.pretty {
            serde_json::to_writer_pretty(&mut self.writer, event)?;
        } else {
            serde_json::to_writer(&mut self.writer, event)?;
        }
        self.writer.write_all(b"\n")?;
        self.writer.flush()?;
        Ok(())
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write + Send> EventSink for JsonLinesSink<W> {
    async fn send(&mut self, event: Event) -> Result<(), SinkError> {
        self.write_event(&event)
    }
}

/// Accepts and drops everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct DiscardSink;

impl EventSink for DiscardSink {
    async fn send(&mut self, event: Event) -> Result<(), SinkError> {
        tracing::debug!(kind = event.kind(), "discarding event");
        Ok(())
    }
}

/// Drain `rx` into `sink` until the sending side is dropped.
pub async fn forward<S: EventSink>(
    mut rx: mpsc::Receiver<Event>,
    mut sink: S,
) -> Result<u64, SinkError> {
    let mut forwarded = 0u64;
    while let Some(event) = rx.recv().await {
        sink.send(event).await?;
        forwarded += 1;
    }
    Ok(forwarded)
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;
    use crate::event::{CpuBlock, MemBlock, SystemEvent};
    use crate::system::snapshot::{CpuTimes, LoadStats, MemStats};

    fn system_event() -> Event {
        Event::System(SystemEvent {
            timestamp: Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap(),
            load: LoadStats::default(),
            cpu: CpuBlock {
                times: CpuTimes::default(),
                user_percent: 0.0,
            },
            mem: MemBlock::new(MemStats::default(), 0.0),
            swap: MemBlock::new(MemStats::default(), 0.0),
        })
    }

    #[tokio::test]
    async fn json_lines_one_object_per_line() {
        let mut sink = JsonLinesSink::new(Vec::new(), false);
        sink.send(system_event()).await.unwrap();
        sink.send(system_event()).await.unwrap();

        let out = String::from_utf8(sink.into_inner()).unwrap();
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines.len(), 2);
        for line in lines {
            let value: serde_json::Value = serde_json::from_str(line).unwrap();
            assert_eq!(value["type"], "system");
        }
    }

    #[tokio::test]
    async fn pretty_output_is_a_stream_of_objects() {
        let mut sink = JsonLinesSink::new(Vec::new(), true);
        sink.send(system_event()).await.unwrap();
        sink.send(system_event()).await.unwrap();

        let out = String::from_utf8(sink.into_inner()).unwrap();
        assert!(out.lines().count() > 2);
        let values: Vec<serde_json::Value> = serde_json::Deserializer::from_str(&out)
            .into_iter()
            .collect::<Result<_, _>>()
            .unwrap();
        assert_eq!(values.len(), 2);
        assert!(values.iter().all(|v| v["type"] == "system"));
    }

    #[tokio::test]
    async fn channel_sink_reports_closed_receiver() {
        let (mut sink, rx) = ChannelSink::channel(1);
        drop(rx);
        assert!(matches!(
            sink.send(system_event()).await,
            Err(SinkError::Closed)
        ));
    }

    #[tokio::test]
    async fn forward_drains_until_senders_drop() {
        let (mut sink, rx) = ChannelSink::channel(4);
        sink.send(system_event()).await.unwrap();
        sink.send(system_event()).await.unwrap();
        drop(sink);

        let forwarded = forward(rx, DiscardSink).await.unwrap();
        assert_eq!(forwarded, 2);
    }
}

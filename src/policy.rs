//-----------------------------------------------------------------------------
// Module xcp_core::policy
// Path: src/policy.rs
//
// Pluggable sink for received transport frames. Grounded on
// original_source/pyxcp/recorder/unfolder.hpp's DAQPolicyBase /
// DaqRecorderPolicy / DaqOnlinePolicy.

use std::collections::HashSet;

use log::info;

use crate::daq::{DaqProcessor, ListCompletion, MeasurementParameters};
use crate::log::format::FrameCategory;
use crate::log::writer::LogWriter;
use crate::queue::BlockingQueue;

/// A complete frame as delivered to a policy: the category, transport
/// counter, arrival timestamp, and payload bytes.
pub struct ReceivedFrame {
    pub category: FrameCategory,
    pub counter: u16,
    pub timestamp: u64,
    pub payload: Vec<u8>,
}

/// Polymorphic sink for received frames. Each implementation may drop
/// categories it isn't interested in via `filter_out`.
pub trait FramePolicy {
    fn filter_out(&self) -> &HashSet<FrameCategory>;

    fn feed(&mut self, category: FrameCategory, counter: u16, timestamp: u64, payload: &[u8]) {
        if self.filter_out().contains(&category) {
            return;
        }
        self.feed_accepted(category, counter, timestamp, payload);
    }

    fn feed_accepted(&mut self, category: FrameCategory, counter: u16, timestamp: u64, payload: &[u8]);

    fn finalize(&mut self);
}

/// Discards all input.
#[derive(Default)]
pub struct NoOpPolicy {
    filter_out: HashSet<FrameCategory>,
}

impl FramePolicy for NoOpPolicy {
    fn filter_out(&self) -> &HashSet<FrameCategory> {
        &self.filter_out
    }
    fn feed_accepted(&mut self, _category: FrameCategory, _counter: u16, _timestamp: u64, _payload: &[u8]) {}
    fn finalize(&mut self) {}
}

/// Formats each accepted frame as a one-line hex dump to stdout.
#[derive(Default)]
pub struct StdoutPolicy {
    filter_out: HashSet<FrameCategory>,
}

impl FramePolicy for StdoutPolicy {
    fn filter_out(&self) -> &HashSet<FrameCategory> {
        &self.filter_out
    }

    fn feed_accepted(&mut self, category: FrameCategory, counter: u16, timestamp: u64, payload: &[u8]) {
        let hex: String = payload.iter().map(|b| format!("{:02x}", b)).collect();
        println!("{{category={:?}, counter={}, timestamp={}, payload={}}}", category, counter, timestamp, hex);
    }

    fn finalize(&mut self) {}
}

/// One thread-safe blocking queue per category; producers (this policy's
/// `feed`) push, consumers pop independently.
#[derive(Default)]
pub struct LegacyQueuesPolicy {
    filter_out: HashSet<FrameCategory>,
    queues: std::collections::HashMap<u8, BlockingQueue<ReceivedFrame>>,
}

impl LegacyQueuesPolicy {
    pub fn new() -> Self {
        let mut queues = std::collections::HashMap::new();
        for cat in [
            FrameCategory::Meta,
            FrameCategory::Cmd,
            FrameCategory::Res,
            FrameCategory::Err,
            FrameCategory::Ev,
            FrameCategory::Serv,
            FrameCategory::Daq,
            FrameCategory::Stim,
        ] {
            queues.insert(cat as u8, BlockingQueue::new());
        }
        LegacyQueuesPolicy { filter_out: HashSet::new(), queues }
    }

    /// Blocks until a frame of `category` is available, then pops it.
    pub fn get(&self, category: FrameCategory) -> ReceivedFrame {
        self.queues[&(category as u8)].get()
    }
}

impl FramePolicy for LegacyQueuesPolicy {
    fn filter_out(&self) -> &HashSet<FrameCategory> {
        &self.filter_out
    }

    fn feed_accepted(&mut self, category: FrameCategory, counter: u16, timestamp: u64, payload: &[u8]) {
        self.queues[&(category as u8)].put(ReceivedFrame { category, counter, timestamp, payload: payload.to_vec() });
    }

    fn finalize(&mut self) {}
}

/// Forwards DAQ-category frames to the log writer; all other categories are
/// dropped by default via `filter_out`.
pub struct RecorderPolicy {
    filter_out: HashSet<FrameCategory>,
    writer: LogWriter,
    initialized: bool,
}

impl RecorderPolicy {
    pub fn new(writer: LogWriter) -> Self {
        let filter_out: HashSet<FrameCategory> = [
            FrameCategory::Meta,
            FrameCategory::Cmd,
            FrameCategory::Res,
            FrameCategory::Err,
            FrameCategory::Ev,
            FrameCategory::Serv,
            FrameCategory::Stim,
        ]
        .into_iter()
        .collect();
        RecorderPolicy { filter_out, writer, initialized: true }
    }
}

impl FramePolicy for RecorderPolicy {
    fn filter_out(&self) -> &HashSet<FrameCategory> {
        &self.filter_out
    }

    fn feed_accepted(&mut self, category: FrameCategory, counter: u16, timestamp: u64, payload: &[u8]) {
        if category != FrameCategory::Daq {
            return;
        }
        self.writer.add_frame(category as u8, counter, timestamp, payload);
    }

    fn finalize(&mut self) {
        if !self.initialized {
            return;
        }
        self.writer.finalize();
        self.initialized = false;
        info!("recorder policy finalized");
    }
}

/// Forwards DAQ-category frames to the DAQ processor and invokes `on_list`
/// for each completed list.
pub struct OnlineDecoderPolicy<F>
where
    F: FnMut(ListCompletion),
{
    filter_out: HashSet<FrameCategory>,
    processor: DaqProcessor,
    on_list: F,
}

impl<F> OnlineDecoderPolicy<F>
where
    F: FnMut(ListCompletion),
{
    pub fn new(params: &MeasurementParameters, on_list: F) -> Self {
        let filter_out: HashSet<FrameCategory> = [
            FrameCategory::Meta,
            FrameCategory::Cmd,
            FrameCategory::Res,
            FrameCategory::Err,
            FrameCategory::Ev,
            FrameCategory::Serv,
            FrameCategory::Stim,
        ]
        .into_iter()
        .collect();
        OnlineDecoderPolicy { filter_out, processor: DaqProcessor::new(params), on_list }
    }
}

impl<F> FramePolicy for OnlineDecoderPolicy<F>
where
    F: FnMut(ListCompletion),
{
    fn filter_out(&self) -> &HashSet<FrameCategory> {
        &self.filter_out
    }

    fn feed_accepted(&mut self, category: FrameCategory, _counter: u16, timestamp: u64, payload: &[u8]) {
        if category != FrameCategory::Daq {
            return;
        }
        match self.processor.feed(timestamp, payload) {
            Ok(Some(completion)) => (self.on_list)(completion),
            Ok(None) => {}
            Err(err) => log::warn!("daq processor error: {err}"),
        }
    }

    fn finalize(&mut self) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn noop_policy_drops_everything() {
        let mut policy = NoOpPolicy::default();
        policy.feed(FrameCategory::Daq, 0, 0, &[1, 2, 3]);
        policy.finalize();
    }

    #[test]
    fn legacy_queues_route_by_category() {
        let mut policy = LegacyQueuesPolicy::new();
        policy.feed(FrameCategory::Cmd, 5, 10, &[0xAA]);
        policy.feed(FrameCategory::Daq, 6, 11, &[0xBB]);

        let cmd_frame = policy.get(FrameCategory::Cmd);
        assert_eq!(cmd_frame.counter, 5);
        assert_eq!(cmd_frame.payload, vec![0xAA]);

        let daq_frame = policy.get(FrameCategory::Daq);
        assert_eq!(daq_frame.counter, 6);
        assert_eq!(daq_frame.payload, vec![0xBB]);
    }
}

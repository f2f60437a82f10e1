/*!
    The per-channel asynchronous read state machine.
*/

use std::mem;
use std::thread::{self, JoinHandle};

use media_types::{Error, Result};

/// Worker closure for one dispatched read.
pub(crate) type ReadJob<T> = Box<dyn FnOnce() -> Result<Option<T>> + Send>;

/**
    One channel of the two-phase read protocol.

    `Idle` until a read is started, `Reading` while its worker threads run,
    back to `Idle` after a successful finish. Once any worker reports end of
    stream (or fails), the channel parks in `Ended` and every further finish
    reports end of stream again. At most one read is in flight per channel;
    violating that is a programmer error and panics.
*/
pub(crate) struct ReadChannel<T> {
    label: &'static str,
    state: State<T>,
}

enum State<T> {
    Idle,
    Reading(Vec<JoinHandle<Result<Option<T>>>>),
    Ended,
}

impl<T: Send + 'static> ReadChannel<T> {
    pub fn new(label: &'static str) -> Self {
        Self {
            label,
            state: State::Idle,
        }
    }

    /**
        Dispatch one worker thread per job and return immediately.

        A no-op once the channel has ended, so read loops stay cheap past end
        of stream. Panics if a read is already in flight.
    */
    pub fn start(&mut self, jobs: Vec<ReadJob<T>>) {
        match &self.state {
            State::Reading(_) => panic!("{} read already in flight", self.label),
            State::Ended => return,
            State::Idle => {}
        }
        self.state = State::Reading(jobs.into_iter().map(thread::spawn).collect());
    }

    /**
        Block until the outstanding read completes and classify the outcome.

        `Ok(None)` is end of stream, reported when any worker delivered
        none, and on every finish after that. Worker errors (including a
        panicked worker) surface as `Err` and also end the channel. Panics
        when no read was started.
    */
    pub fn finish(&mut self) -> Result<Option<Vec<T>>> {
        let handles = match mem::replace(&mut self.state, State::Idle) {
            State::Reading(handles) => handles,
            State::Ended => {
                self.state = State::Ended;
                return Ok(None);
            }
            State::Idle => panic!("no {} read in flight to finish", self.label),
        };

        // Join everything before looking at any result, so a worker is never
        // left running behind an early return.
        let mut results = Vec::with_capacity(handles.len());
        for handle in handles {
            results.push(handle.join());
        }

        let mut items = Vec::with_capacity(results.len());
        let mut ended = false;
        for result in results {
            match result {
                Ok(Ok(Some(item))) => items.push(item),
                Ok(Ok(None)) => ended = true,
                Ok(Err(e)) => {
                    self.state = State::Ended;
                    return Err(e);
                }
                Err(_) => {
                    self.state = State::Ended;
                    return Err(Error::read(format!("{} read worker panicked", self.label)));
                }
            }
        }

        if ended {
            self.state = State::Ended;
            return Ok(None);
        }
        Ok(Some(items))
    }

    /**
        Join and discard an outstanding read, leaving an ended channel ended.
        Used on close, which must not release sources under a running worker.
    */
    pub fn drain(&mut self) {
        match mem::replace(&mut self.state, State::Idle) {
            State::Reading(handles) => {
                for handle in handles {
                    let _ = handle.join();
                }
            }
            State::Ended => self.state = State::Ended,
            State::Idle => {}
        }
    }

    /**
        Allow reads to resume after a seek.
    */
    pub fn rewind(&mut self) {
        if matches!(self.state, State::Ended) {
            self.state = State::Idle;
        }
    }

    pub fn is_reading(&self) -> bool {
        matches!(self.state, State::Reading(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn job(result: Result<Option<u32>>) -> ReadJob<u32> {
        Box::new(move || result)
    }

    #[test]
    fn start_finish_round_trip() {
        let mut channel = ReadChannel::new("test");
        channel.start(vec![job(Ok(Some(7)))]);
        assert!(channel.is_reading());
        assert_eq!(channel.finish().unwrap(), Some(vec![7]));
        assert!(!channel.is_reading());
    }

    #[test]
    fn end_of_stream_is_sticky() {
        let mut channel = ReadChannel::new("test");
        channel.start(vec![job(Ok(None))]);
        assert_eq!(channel.finish().unwrap(), None);

        // Further rounds never spawn and keep reporting end of stream.
        channel.start(vec![job(Ok(Some(1)))]);
        assert_eq!(channel.finish().unwrap(), None);
        assert_eq!(channel.finish().unwrap(), None);
    }

    #[test]
    fn mismatched_pair_ends_the_channel() {
        let mut channel = ReadChannel::new("test");
        channel.start(vec![job(Ok(Some(1))), job(Ok(None))]);
        assert_eq!(channel.finish().unwrap(), None);
        channel.start(vec![job(Ok(Some(2)))]);
        assert_eq!(channel.finish().unwrap(), None);
    }

    #[test]
    fn worker_error_surfaces_and_ends() {
        let mut channel = ReadChannel::new("test");
        channel.start(vec![job(Err(Error::read("boom")))]);
        assert!(channel.finish().is_err());
        channel.start(vec![job(Ok(Some(3)))]);
        assert_eq!(channel.finish().unwrap(), None);
    }

    #[test]
    fn worker_panic_becomes_an_error() {
        let mut channel: ReadChannel<u32> = ReadChannel::new("test");
        channel.start(vec![Box::new(|| -> Result<Option<u32>> { panic!("worker died") })]);
        assert!(channel.finish().is_err());
    }

    #[test]
    #[should_panic(expected = "already in flight")]
    fn double_start_panics() {
        let mut channel = ReadChannel::new("test");
        channel.start(vec![job(Ok(Some(1)))]);
        channel.start(vec![job(Ok(Some(2)))]);
    }

    #[test]
    #[should_panic(expected = "no test read in flight")]
    fn finish_without_start_panics() {
        let mut channel: ReadChannel<u32> = ReadChannel::new("test");
        let _ = channel.finish();
    }

    #[test]
    fn rewind_reopens_an_ended_channel() {
        let mut channel = ReadChannel::new("test");
        channel.start(vec![job(Ok(None))]);
        assert_eq!(channel.finish().unwrap(), None);

        channel.rewind();
        channel.start(vec![job(Ok(Some(9)))]);
        assert_eq!(channel.finish().unwrap(), Some(vec![9]));
    }

    #[test]
    fn drain_joins_outstanding_work() {
        let mut channel = ReadChannel::new("test");
        channel.start(vec![job(Ok(Some(1)))]);
        channel.drain();
        assert!(!channel.is_reading());

        // Draining an ended channel keeps it ended.
        channel.start(vec![job(Ok(None))]);
        assert_eq!(channel.finish().unwrap(), None);
        channel.drain();
        channel.start(vec![job(Ok(Some(2)))]);
        assert_eq!(channel.finish().unwrap(), None);
    }
}

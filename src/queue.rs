//-----------------------------------------------------------------------------
// Module xcp_core::queue
// Path: src/queue.rs
//
// Thread-safe unbounded blocking FIFO. Grounded on
// original_source/pyxcp/cpp_ext/tsqueue.hpp's TsQueue.

use std::collections::VecDeque;

use parking_lot::{Condvar, Mutex};

/// An unbounded, thread-safe FIFO with a blocking `get`. Producers never
/// block; `get` parks the calling thread until an item is available.
pub struct BlockingQueue<T> {
    queue: Mutex<VecDeque<T>>,
    cond: Condvar,
}

impl<T> Default for BlockingQueue<T> {
    fn default() -> Self {
        BlockingQueue { queue: Mutex::new(VecDeque::new()), cond: Condvar::new() }
    }
}

impl<T> BlockingQueue<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put(&self, value: T) {
        let mut guard = self.queue.lock();
        guard.push_back(value);
        self.cond.notify_one();
    }

    /// Blocks until an item is available, then pops and returns it.
    pub fn get(&self) -> T {
        let mut guard = self.queue.lock();
        while guard.is_empty() {
            self.cond.wait(&mut guard);
        }
        guard.pop_front().expect("queue non-empty after wait")
    }

    pub fn is_empty(&self) -> bool {
        self.queue.lock().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn fifo_order_is_preserved() {
        let queue = BlockingQueue::new();
        queue.put(1);
        queue.put(2);
        queue.put(3);
        assert_eq!(queue.get(), 1);
        assert_eq!(queue.get(), 2);
        assert_eq!(queue.get(), 3);
    }

    #[test]
    fn get_blocks_until_a_producer_puts() {
        let queue = Arc::new(BlockingQueue::new());
        let producer = {
            let queue = Arc::clone(&queue);
            thread::spawn(move || {
                thread::sleep(std::time::Duration::from_millis(20));
                queue.put(42);
            })
        };
        assert_eq!(queue.get(), 42);
        producer.join().unwrap();
    }

    #[test]
    fn is_empty_reflects_queue_state() {
        let queue: BlockingQueue<i32> = BlockingQueue::new();
        assert!(queue.is_empty());
        queue.put(1);
        assert!(!queue.is_empty());
        queue.get();
        assert!(queue.is_empty());
    }
}

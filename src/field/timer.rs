use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub enum TimerKind {
    Timeout,
    Reset,
}

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct TimerToken {
    pub kind: TimerKind,
    pub generation: u64,
    pub deadline: Instant,
}

#[derive(Debug, Clone, Default)]
pub struct TimerSlot {
    generation: u64,
    deadline: Option<Instant>,
}

impl TimerSlot {
    pub fn arm(&mut self, kind: TimerKind, now: Instant, period: Duration) -> TimerToken {
        self.generation = self.generation.wrapping_add(1);
        let deadline = now + period;
        self.deadline = Some(deadline);
        TimerToken {
            kind,
            generation: self.generation,
            deadline,
        }
    }

    pub fn cancel(&mut self) {
        self.generation = self.generation.wrapping_add(1);
        self.deadline = None;
    }

    pub fn is_armed(&self) -> bool {
        self.deadline.is_some()
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn claim(&mut self, token: &TimerToken) -> bool {
        if self.deadline.is_none() || token.generation != self.generation {
            return false;
        }
        self.deadline = None;
        true
    }
}

#[derive(Debug)]
struct Scheduled {
    seq: u64,
    owner: usize,
    token: TimerToken,
}

impl PartialEq for Scheduled {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Scheduled {}

impl PartialOrd for Scheduled {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Scheduled {
    fn cmp(&self, other: &Self) -> Ordering {
        self.token
            .deadline
            .cmp(&other.token.deadline)
            .then(self.seq.cmp(&other.seq))
    }
}

// Cancelled tokens stay queued and fail `TimerSlot::claim` when popped.
#[derive(Debug, Default)]
pub struct TimerQueue {
    heap: BinaryHeap<Reverse<Scheduled>>,
    next_seq: u64,
}

impl TimerQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schedule(&mut self, owner: usize, token: TimerToken) {
        let seq = self.next_seq;
        self.next_seq = self.next_seq.wrapping_add(1);
        self.heap.push(Reverse(Scheduled { seq, owner, token }));
    }

    pub fn pop_due(&mut self, now: Instant) -> Option<(usize, TimerToken)> {
        let due = self
            .heap
            .peek()
            .is_some_and(|Reverse(entry)| entry.token.deadline <= now);
        if !due {
            return None;
        }
        self.heap
            .pop()
            .map(|Reverse(entry)| (entry.owner, entry.token))
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.heap.peek().map(|Reverse(entry)| entry.token.deadline)
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rearming_invalidates_previous_token() {
        let now = Instant::now();
        let mut slot = TimerSlot::default();
        let first = slot.arm(TimerKind::Reset, now, Duration::from_secs(1));
        let second = slot.arm(TimerKind::Reset, now, Duration::from_secs(1));

        assert!(!slot.claim(&first));
        assert!(slot.is_armed());
        assert!(slot.claim(&second));
        assert!(!slot.is_armed());
        assert!(!slot.claim(&second), "a token fires at most once");
    }

    #[test]
    fn cancel_makes_outstanding_token_stale() {
        let now = Instant::now();
        let mut slot = TimerSlot::default();
        let token = slot.arm(TimerKind::Timeout, now, Duration::from_millis(10));
        slot.cancel();
        assert!(!slot.claim(&token));
        assert_eq!(slot.deadline(), None);
    }

    #[test]
    fn queue_pops_in_deadline_order_only_when_due() {
        let now = Instant::now();
        let mut slot_a = TimerSlot::default();
        let mut slot_b = TimerSlot::default();
        let mut queue = TimerQueue::new();
        queue.schedule(
            0,
            slot_a.arm(TimerKind::Reset, now, Duration::from_millis(500)),
        );
        queue.schedule(
            1,
            slot_b.arm(TimerKind::Timeout, now, Duration::from_millis(200)),
        );

        assert_eq!(queue.next_deadline(), Some(now + Duration::from_millis(200)));
        assert!(queue.pop_due(now + Duration::from_millis(100)).is_none());

        let (owner, token) = queue
            .pop_due(now + Duration::from_millis(600))
            .expect("first due");
        assert_eq!(owner, 1);
        assert_eq!(token.kind, TimerKind::Timeout);
        let (owner, _) = queue
            .pop_due(now + Duration::from_millis(600))
            .expect("second due");
        assert_eq!(owner, 0);
        assert!(queue.is_empty());
    }
}

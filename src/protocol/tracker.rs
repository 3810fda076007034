use std::time::Duration;
use tokio::time::Instant;

use super::message::{EchoReply, Sequence};
use crate::core::{Error, MismatchPolicy, NodeId, Result};

/// Number of distinct sequence values
pub const SEQUENCE_SPACE: usize = 1 << 16;

/// First sequence handed out by a fresh tracker
pub const FIRST_SEQUENCE: Sequence = 1;

/// Deadline used when `now + timeout` is not representable
const FAR_FUTURE: Duration = Duration::from_secs(86400 * 365 * 30);

/// Tracker record of one unresolved probe
#[derive(Debug)]
pub struct PendingEntry<T> {
    /// Node the probe was sent to
    pub target_id: NodeId,
    /// When the probe was registered
    pub sent_at: Instant,
    /// When the probe times out
    pub deadline: Instant,
    /// Whoever is waiting for this probe's outcome
    pub waiter: T,
}

/// Result of offering a reply to the tracker
#[derive(Debug)]
pub enum MatchResult<T> {
    /// No live entry for the reply's sequence (late, duplicate or spurious)
    NoMatch,
    /// An entry exists but the reply's identifiers disagree with it.
    /// `retired` holds the entry only under [`MismatchPolicy::Retire`].
    Mismatch { retired: Option<PendingEntry<T>> },
    /// The reply answers the entry, which is now retired
    Matched {
        round_trip: Duration,
        entry: PendingEntry<T>,
    },
}

/// An entry retired by [`RequestTracker::expire`]
#[derive(Debug)]
pub struct ExpiredEntry<T> {
    pub sequence: Sequence,
    pub entry: PendingEntry<T>,
}

/// Outstanding echo requests, indexed by sequence number.
///
/// Slots live in a table indexed directly by the 16-bit sequence. A sequence
/// is only reused once its previous entry has been retired by `resolve`,
/// `expire` or `cancel`. The tracker never reads a clock; callers pass `now`.
#[derive(Debug)]
pub struct RequestTracker<T = ()> {
    slots: Vec<Option<PendingEntry<T>>>,
    next_sequence: Sequence,
    live: usize,
    mismatch_policy: MismatchPolicy,
}

impl<T> Default for RequestTracker<T> {
    fn default() -> Self {
        Self::new(MismatchPolicy::default())
    }
}

impl<T> RequestTracker<T> {
    /// Creates an empty tracker
    pub fn new(mismatch_policy: MismatchPolicy) -> Self {
        RequestTracker {
            slots: Vec::new(),
            next_sequence: FIRST_SEQUENCE,
            live: 0,
            mismatch_policy,
        }
    }

    /// Number of outstanding entries
    pub fn len(&self) -> usize {
        self.live
    }

    /// Whether no probe is outstanding
    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    /// Whether `sequence` is held by an unretired entry
    pub fn contains(&self, sequence: Sequence) -> bool {
        self.get(sequence).is_some()
    }

    /// Looks up the live entry for `sequence`
    pub fn get(&self, sequence: Sequence) -> Option<&PendingEntry<T>> {
        self.slots.get(sequence as usize).and_then(Option::as_ref)
    }

    /// Earliest deadline among outstanding entries
    pub fn next_deadline(&self) -> Option<Instant> {
        self.slots.iter().flatten().map(|e| e.deadline).min()
    }

    /// Allocates a sequence and records a new pending entry for it.
    ///
    /// The counter wraps and skips sequences still in use. Fails with
    /// [`Error::ResourceExhausted`] once every sequence is outstanding.
    pub fn register(
        &mut self,
        target_id: NodeId,
        timeout: Duration,
        now: Instant,
        waiter: T,
    ) -> Result<Sequence> {
        if self.live >= SEQUENCE_SPACE {
            return Err(Error::ResourceExhausted);
        }

        let sequence = loop {
            let candidate = self.next_sequence;
            self.next_sequence = candidate.wrapping_add(1);
            if !self.contains(candidate) {
                break candidate;
            }
        };

        let index = sequence as usize;
        if self.slots.len() <= index {
            self.slots.resize_with(index + 1, || None);
        }

        let deadline = now
            .checked_add(timeout)
            .unwrap_or_else(|| now + FAR_FUTURE);
        self.slots[index] = Some(PendingEntry {
            target_id,
            sent_at: now,
            deadline,
            waiter,
        });
        self.live += 1;
        Ok(sequence)
    }

    /// Matches a reply against the outstanding entry for its sequence.
    ///
    /// A reply arriving at or after its entry's deadline is `NoMatch`; the
    /// entry is left for `expire` to report as a timeout.
    pub fn resolve(&mut self, reply: &EchoReply, now: Instant) -> MatchResult<T> {
        let index = reply.sequence as usize;
        let entry = match self.slots.get(index).and_then(Option::as_ref) {
            Some(entry) => entry,
            None => return MatchResult::NoMatch,
        };

        if entry.deadline <= now {
            return MatchResult::NoMatch;
        }

        if reply.target_id != entry.target_id || reply.responder_id != entry.target_id {
            let retired = match self.mismatch_policy {
                MismatchPolicy::KeepPending => None,
                MismatchPolicy::Retire => self.take(index),
            };
            return MatchResult::Mismatch { retired };
        }

        match self.take(index) {
            Some(entry) => MatchResult::Matched {
                round_trip: now.saturating_duration_since(entry.sent_at),
                entry,
            },
            None => MatchResult::NoMatch,
        }
    }

    /// Retires and returns every entry whose deadline is at or before `now`
    pub fn expire(&mut self, now: Instant) -> Vec<ExpiredEntry<T>> {
        let due: Vec<usize> = self
            .slots
            .iter()
            .enumerate()
            .filter_map(|(i, slot)| match slot {
                Some(entry) if entry.deadline <= now => Some(i),
                _ => None,
            })
            .collect();

        due.into_iter()
            .filter_map(|i| {
                self.take(i).map(|entry| ExpiredEntry {
                    sequence: i as Sequence,
                    entry,
                })
            })
            .collect()
    }

    /// Retires an entry without a result, e.g. when its request never left
    pub fn cancel(&mut self, sequence: Sequence) -> Option<PendingEntry<T>> {
        self.take(sequence as usize)
    }

    /// Retires every live entry regardless of deadline
    pub fn drain(&mut self) -> Vec<ExpiredEntry<T>> {
        let live: Vec<usize> = self
            .slots
            .iter()
            .enumerate()
            .filter_map(|(i, slot)| slot.as_ref().map(|_| i))
            .collect();

        live.into_iter()
            .filter_map(|i| {
                self.take(i).map(|entry| ExpiredEntry {
                    sequence: i as Sequence,
                    entry,
                })
            })
            .collect()
    }

    fn take(&mut self, index: usize) -> Option<PendingEntry<T>> {
        let entry = self.slots.get_mut(index)?.take()?;
        self.live -= 1;
        Some(entry)
    }
}

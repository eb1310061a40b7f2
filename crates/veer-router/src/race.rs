//! Ordered-first-settled race
//!
//! A variant of racing a list of futures that respects list order: the
//! winner is the first candidate, by position, that admits — but a
//! candidate is only selected once every candidate before it has
//! declined. A later candidate settling early never wins ahead of an
//! earlier candidate that is still pending.
//!
//! The decision is an explicit per-candidate state machine with a
//! rescan after every settlement; no built-in `select`/`race`
//! primitive provides the ordering guarantee.

use futures_util::stream::{FuturesUnordered, StreamExt};
use std::future::Future;

/// How a single candidate settled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome<T> {
    Admitted(T),
    Declined,
}

enum Slot<T> {
    Pending,
    Admitted(T),
    Declined,
}

/// Drive all `candidates` concurrently and resolve to the first (by
/// position) that admits with no earlier candidate still undecided.
///
/// Returns `None` when every candidate declines, or when the list is
/// empty.
pub async fn ordered_first_settled<T, F>(candidates: Vec<F>) -> Option<(usize, T)>
where
    F: Future<Output = Outcome<T>>,
{
    let mut slots: Vec<Slot<T>> = (0..candidates.len()).map(|_| Slot::Pending).collect();
    let mut in_flight: FuturesUnordered<_> = candidates
        .into_iter()
        .enumerate()
        .map(|(index, fut)| async move { (index, fut.await) })
        .collect();

    loop {
        // Scan in candidate order: stop at the first pending slot (no
        // decision yet), select the first admitted slot reached with
        // every earlier slot declined.
        let mut selected = None;
        let mut waiting = false;
        for (index, slot) in slots.iter().enumerate() {
            match slot {
                Slot::Pending => {
                    waiting = true;
                    break;
                }
                Slot::Admitted(_) => {
                    selected = Some(index);
                    break;
                }
                Slot::Declined => {}
            }
        }

        if let Some(index) = selected {
            if let Slot::Admitted(value) = std::mem::replace(&mut slots[index], Slot::Declined) {
                return Some((index, value));
            }
        }
        if !waiting {
            return None;
        }

        match in_flight.next().await {
            Some((index, Outcome::Admitted(value))) => slots[index] = Slot::Admitted(value),
            Some((index, Outcome::Declined)) => slots[index] = Slot::Declined,
            None => return None,
        }
    }
}

use crate::{IdGenStatus, NoeqId, Result, Sequencer, TimeSource, generator::SpinBudget};

/// Extension trait for minting IDs from a [`Sequencer`] inside the
/// [`tokio`](https://docs.rs/tokio) runtime.
///
/// The blocking methods on [`Sequencer`] spin while a space waits for the
/// next millisecond, pinning a runtime thread for up to a millisecond. These
/// methods instead release the space and yield to the scheduler with
/// [`tokio::task::yield_now`] between attempts, so other tasks (including
/// other requests on the same space) make progress in the meantime.
///
/// The wait is bounded by [`Sequencer::max_spin`], exactly like the blocking
/// path.
pub trait SequencerAsyncTokioExt {
    /// Returns a future that resolves to the next ID from `space`.
    ///
    /// # Errors
    ///
    /// This future may return an error if the underlying sequencer does.
    fn next_id_async(&self, space: u8) -> impl Future<Output = Result<NoeqId>> + Send;

    /// Returns a future that resolves to `count` strictly increasing IDs from
    /// `space`.
    ///
    /// The space is held across consecutive IDs and only released while
    /// waiting. Concurrent batches on the same space may therefore interleave
    /// at millisecond boundaries, but never share an ID.
    ///
    /// # Errors
    ///
    /// Fails as a whole if any single ID fails; no partial batch is returned.
    fn next_ids_async(
        &self,
        space: u8,
        count: usize,
    ) -> impl Future<Output = Result<Vec<NoeqId>>> + Send;
}

impl<T> SequencerAsyncTokioExt for Sequencer<T>
where
    T: TimeSource<u64> + Send + Sync,
{
    fn next_id_async(&self, space: u8) -> impl Future<Output = Result<NoeqId>> + Send {
        async move {
            let mut ids = self.next_ids_async(space, 1).await?;
            Ok(ids.remove(0))
        }
    }

    fn next_ids_async(
        &self,
        space: u8,
        count: usize,
    ) -> impl Future<Output = Result<Vec<NoeqId>>> + Send {
        async move {
            let mut ids = Vec::with_capacity(count);
            let mut budget = SpinBudget::new(self.max_spin());

            while ids.len() < count {
                // The guard must be dropped before yielding.
                let stalled_on = {
                    let mut state = self.acquire(space);
                    loop {
                        match self.poll_locked(&mut state)? {
                            IdGenStatus::Ready { id } => {
                                ids.push(id);
                                if ids.len() == count {
                                    break None;
                                }
                            }
                            IdGenStatus::Pending { .. } => break Some(state.last_timestamp()),
                        }
                    }
                };

                if let Some(last) = stalled_on {
                    budget.charge(last)?;
                    tokio::task::yield_now().await;
                }
            }

            Ok(ids)
        }
    }
}

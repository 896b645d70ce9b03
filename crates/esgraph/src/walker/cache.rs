/// State of one key in an in-flight-deduplicating cache.
///
/// The first requester installs `Pending` and starts the work; later
/// requesters add themselves as waiters until the value is `Done`.
#[derive(Debug)]
pub(crate) enum CacheEntry<T, W> {
    Pending(Vec<W>),
    Done(T),
}

impl<T, W> CacheEntry<T, W> {
    pub(crate) fn pending(waiter: W) -> Self {
        CacheEntry::Pending(vec![waiter])
    }
}

use futures_util::future::{BoxFuture, FutureExt, Shared};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::future::Future;

type SharedCall<T, E> = Shared<BoxFuture<'static, Result<T, E>>>;

/// Collapses concurrent calls for the same key into one.
///
/// The first caller for a key starts the work; callers arriving while it is
/// still running await the same future and receive a clone of its result.
/// Once it completes, or the caller awaiting it is dropped, the key is
/// released, so a later call starts afresh.
pub struct SingleFlight<T, E> {
    in_flight: Mutex<HashMap<String, SharedCall<T, E>>>,
}

impl<T, E> SingleFlight<T, E>
where
    T: Clone + Send + Sync + 'static,
    E: Clone + Send + Sync + 'static,
{
    pub fn new() -> Self {
        Self {
            in_flight: Mutex::new(HashMap::new()),
        }
    }

    pub async fn run<F, Fut>(&self, key: &str, make: F) -> Result<T, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
    {
        let call = {
            let mut in_flight = self.in_flight.lock();
            match in_flight.get(key) {
                Some(existing) => {
                    tracing::debug!(key, "joining in-flight request");
                    existing.clone()
                }
                None => {
                    let call = make().boxed().shared();
                    in_flight.insert(key.to_string(), call.clone());
                    call
                }
            }
        };

        // Released on completion and when this caller is dropped mid-flight.
        let _release = Release {
            in_flight: &self.in_flight,
            key,
            call: call.clone(),
        };
        call.await
    }

    /// Number of keys with a call currently running.
    pub fn in_flight(&self) -> usize {
        self.in_flight.lock().len()
    }
}

struct Release<'a, T, E> {
    in_flight: &'a Mutex<HashMap<String, SharedCall<T, E>>>,
    key: &'a str,
    call: SharedCall<T, E>,
}

impl<T, E> Drop for Release<'_, T, E> {
    fn drop(&mut self) {
        let mut in_flight = self.in_flight.lock();
        if in_flight
            .get(self.key)
            .is_some_and(|current| Shared::ptr_eq(current, &self.call))
        {
            in_flight.remove(self.key);
        }
    }
}

impl<T, E> Default for SingleFlight<T, E>
where
    T: Clone + Send + Sync + 'static,
    E: Clone + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

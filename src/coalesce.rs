use {
    futures::{FutureExt, channel::oneshot, future::Shared},
    parking_lot::Mutex,
    std::{collections::HashMap, future::Future, hash::Hash},
};

type Call<T, E> = Shared<oneshot::Receiver<Result<T, E>>>;

/// Collapses concurrent calls for the same key into a single execution.
///
/// The first caller for a key drives the computation itself. Callers arriving
/// while it is in flight wait for its outcome instead of running their own.
/// Once the computation finishes, the key is forgotten: nothing is memoized
/// past the in-flight window.
///
/// Should the driving caller be dropped midway, its waiters race to drive a
/// fresh computation, so a dropped caller never fails the others. Waiters
/// have no timeout: a computation that never finishes holds all of them.
pub struct Coalescer<K, T, E> {
    calls: Mutex<HashMap<K, Call<T, E>>>,
}

impl<K, T, E> Default for Coalescer<K, T, E> {
    fn default() -> Self {
        Self {
            calls: Mutex::new(HashMap::new()),
        }
    }
}

impl<K, T, E> Coalescer<K, T, E>
where
    K: Hash + Eq + Clone,
    T: Clone,
    E: Clone,
{
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs `f` for `key` unless a call for `key` is already in flight, in
    /// which case the outcome of that call is returned.
    pub async fn run<F, Fut>(&self, key: K, f: F) -> Result<T, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let (sender, call) = loop {
            let role = {
                let mut calls = self.calls.lock();
                match calls.get(&key) {
                    // A cancelled call may linger until its guard runs.
                    Some(call) if !matches!(call.peek(), Some(Err(_))) => {
                        Role::Waiter(call.clone())
                    }
                    _ => {
                        let (sender, receiver) = oneshot::channel();
                        let call = receiver.shared();
                        calls.insert(key.clone(), call.clone());
                        Role::Leader(sender, call)
                    }
                }
            };
            match role {
                Role::Leader(sender, call) => break (sender, call),
                Role::Waiter(call) => match call.await {
                    Ok(result) => return result,
                    Err(oneshot::Canceled) => continue,
                },
            }
        };

        // Removes the call on completion, or if this future is dropped midway.
        let in_flight = InFlight {
            calls: &self.calls,
            key: Some(key),
            call,
        };
        let result = f().await;

        // Forget the call before publishing, so that later callers either
        // attach to a call that will still receive the result or start anew.
        drop(in_flight);
        sender.send(result.clone()).ok();
        result
    }

    /// Number of keys with a call in flight.
    pub fn in_flight(&self) -> usize {
        self.calls.lock().len()
    }
}

enum Role<T, E> {
    Leader(oneshot::Sender<Result<T, E>>, Call<T, E>),
    Waiter(Call<T, E>),
}

struct InFlight<'a, K: Hash + Eq, T, E> {
    calls: &'a Mutex<HashMap<K, Call<T, E>>>,
    key: Option<K>,

    /// Only this call is removed, never a successor registered under the
    /// same key.
    call: Call<T, E>,
}

impl<K: Hash + Eq, T, E> Drop for InFlight<'_, K, T, E> {
    fn drop(&mut self) {
        let Some(key) = self.key.take() else {
            return;
        };
        let mut calls = self.calls.lock();
        if calls
            .get(&key)
            .is_some_and(|call| call.ptr_eq(&self.call))
        {
            calls.remove(&key);
        }
    }
}

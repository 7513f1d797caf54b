//! Response futures.
//!
//! Every dispatched call hands back a [`ResponseFuture`]. It resolves exactly
//! once, through its [`ResponseCompleter`], and can then be read any number
//! of times, from any thread, in three shapes:
//!
//! | Method | Success | Failure |
//! |--------|---------|---------|
//! | [`ResponseFuture::get`] | [`Response<T>`] | [`Error::Execution`] wrapping the cause |
//! | [`ResponseFuture::get_response`] | [`Response<T>`] | the cause itself |
//! | [`ResponseFuture::get_response_entity`] | `Arc<T>` | the cause itself |
//!
//! Each has a `_timeout` variant that gives up with [`Error::Timeout`]
//! without disturbing the call; a later read still sees the outcome.
//! Blocking reads park the calling thread, so never issue them from inside
//! an async runtime's worker: `.await` the future there instead.

use std::fmt;
use std::future::Future;
use std::mem;
use std::pin::Pin;
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::task::{Context, Poll, Waker};
use std::time::Duration;

use tracing::debug;

use crate::{Error, Response, Result};

/// One-shot completion callback.
pub type Callback<T> = Box<dyn FnOnce(Result<T>) + Send + 'static>;

enum State<R> {
    Pending {
        callbacks: Vec<Callback<R>>,
        wakers: Vec<Waker>,
    },
    Done(Result<R>),
}

struct Shared<R> {
    state: Mutex<State<R>>,
    ready: Condvar,
}

impl<R: Clone> Shared<R> {
    fn pending() -> Self {
        Self::with_state(State::Pending {
            callbacks: Vec::new(),
            wakers: Vec::new(),
        })
    }

    fn with_state(state: State<R>) -> Self {
        Self {
            state: Mutex::new(state),
            ready: Condvar::new(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, State<R>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Store the outcome. Returns `false` if it was already set.
    fn resolve(&self, result: Result<R>) -> bool {
        let (callbacks, wakers) = {
            let mut state = self.lock();
            let State::Pending { callbacks, wakers } = &mut *state else {
                return false;
            };
            let taken = (mem::take(callbacks), mem::take(wakers));
            *state = State::Done(result.clone());
            taken
        };

        // Listeners run outside the lock so they may read the future again.
        self.ready.notify_all();
        wakers.into_iter().for_each(Waker::wake);
        for callback in callbacks {
            callback(result.clone());
        }
        true
    }

    fn on_complete(&self, callback: Callback<R>) {
        let mut state = self.lock();
        match &mut *state {
            State::Pending { callbacks, .. } => callbacks.push(callback),
            State::Done(result) => {
                let result = result.clone();
                drop(state);
                callback(result);
            }
        }
    }

    fn peek(&self) -> Option<Result<R>> {
        match &*self.lock() {
            State::Done(result) => Some(result.clone()),
            State::Pending { .. } => None,
        }
    }

    /// Block until resolved, or until `timeout` elapses.
    fn wait(&self, timeout: Option<Duration>) -> Option<Result<R>> {
        let guard = self.lock();
        let is_pending = |state: &mut State<R>| matches!(state, State::Pending { .. });
        let guard = match timeout {
            None => self
                .ready
                .wait_while(guard, is_pending)
                .unwrap_or_else(PoisonError::into_inner),
            Some(timeout) => {
                self.ready
                    .wait_timeout_while(guard, timeout, is_pending)
                    .unwrap_or_else(PoisonError::into_inner)
                    .0
            }
        };

        match &*guard {
            State::Done(result) => Some(result.clone()),
            State::Pending { .. } => None,
        }
    }

    fn poll(&self, waker: &Waker) -> Poll<Result<R>> {
        let mut state = self.lock();
        match &mut *state {
            State::Done(result) => Poll::Ready(result.clone()),
            State::Pending { wakers, .. } => {
                if !wakers.iter().any(|w| w.will_wake(waker)) {
                    wakers.push(waker.clone());
                }
                Poll::Pending
            }
        }
    }
}

/// Handle on the eventual outcome of one dispatched call.
///
/// Clones observe the same outcome. Implements [`Future`], so async callers
/// can simply `.await` it.
pub struct ResponseFuture<T> {
    shared: Arc<Shared<Response<T>>>,
}

/// Completion side of a [`ResponseFuture`].
///
/// Dropping it without calling [`ResponseCompleter::complete`] resolves the
/// future with [`Error::Interrupted`].
pub struct ResponseCompleter<T> {
    shared: Arc<Shared<Response<T>>>,
}

impl<T> ResponseFuture<T> {
    /// Create a pending future and the completer that resolves it.
    #[must_use]
    pub fn channel() -> (ResponseCompleter<T>, Self) {
        let shared = Arc::new(Shared::pending());
        let completer = ResponseCompleter {
            shared: Arc::clone(&shared),
        };
        (completer, Self { shared })
    }

    /// Create an already resolved future.
    #[must_use]
    pub fn ready(result: Result<Response<T>>) -> Self {
        Self {
            shared: Arc::new(Shared::with_state(State::Done(result))),
        }
    }

    /// Returns `true` once the call has an outcome.
    #[must_use]
    pub fn is_done(&self) -> bool {
        self.shared.peek().is_some()
    }

    /// Run `callback` with the outcome.
    ///
    /// Called immediately, on this thread, if the call already completed;
    /// otherwise on whichever thread completes it.
    pub fn on_complete<F>(&self, callback: F)
    where
        F: FnOnce(Result<Response<T>>) + Send + 'static,
    {
        self.shared.on_complete(Box::new(callback));
    }

    /// Block until the call completes.
    ///
    /// # Errors
    ///
    /// Any failure of the call, wrapped in [`Error::Execution`].
    /// [`Error::Interrupted`] is returned as is.
    pub fn get(&self) -> Result<Response<T>> {
        self.outcome(None).map_err(wrap_execution)
    }

    /// Block until the call completes or `timeout` elapses.
    ///
    /// # Errors
    ///
    /// Same as [`ResponseFuture::get`], plus [`Error::Timeout`] (unwrapped)
    /// if the wait elapsed first.
    pub fn get_timeout(&self, timeout: Duration) -> Result<Response<T>> {
        self.outcome(Some(timeout)).map_err(wrap_execution)
    }

    /// Block until the call completes.
    ///
    /// # Errors
    ///
    /// The failure of the call, unwrapped: [`Error::Response`] when the server
    /// answered with an error, transport or decoding errors otherwise.
    pub fn get_response(&self) -> Result<Response<T>> {
        self.outcome(None)
    }

    /// Block until the call completes or `timeout` elapses.
    ///
    /// # Errors
    ///
    /// Same as [`ResponseFuture::get_response`], plus [`Error::Timeout`].
    pub fn get_response_timeout(&self, timeout: Duration) -> Result<Response<T>> {
        self.outcome(Some(timeout))
    }

    /// Block until the call completes and return its entity.
    ///
    /// The entity is shared with the [`Response`] returned by
    /// [`ResponseFuture::get_response`].
    ///
    /// # Errors
    ///
    /// Same as [`ResponseFuture::get_response`].
    pub fn get_response_entity(&self) -> Result<Arc<T>> {
        self.get_response().map(|response| response.shared_entity())
    }

    /// Block until the call completes or `timeout` elapses, and return its entity.
    ///
    /// # Errors
    ///
    /// Same as [`ResponseFuture::get_response_timeout`].
    pub fn get_response_entity_timeout(&self, timeout: Duration) -> Result<Arc<T>> {
        self.get_response_timeout(timeout)
            .map(|response| response.shared_entity())
    }

    fn outcome(&self, timeout: Option<Duration>) -> Result<Response<T>> {
        self.shared.wait(timeout).unwrap_or(Err(Error::Timeout))
    }
}

fn wrap_execution(err: Error) -> Error {
    match err {
        Error::Timeout | Error::Interrupted | Error::Execution(_) => err,
        other => Error::execution(other),
    }
}

impl<T> Clone for ResponseFuture<T> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<T> fmt::Debug for ResponseFuture<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResponseFuture")
            .field("done", &self.is_done())
            .finish()
    }
}

impl<T> Future for ResponseFuture<T> {
    type Output = Result<Response<T>>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        self.shared.poll(cx.waker())
    }
}

impl<T> ResponseCompleter<T> {
    /// Resolve the future. Later attempts are ignored.
    pub fn complete(self, result: Result<Response<T>>) {
        self.shared.resolve(result);
    }
}

impl<T> fmt::Debug for ResponseCompleter<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResponseCompleter").finish_non_exhaustive()
    }
}

impl<T> Drop for ResponseCompleter<T> {
    fn drop(&mut self) {
        if self.shared.resolve(Err(Error::Interrupted)) {
            debug!("response completer dropped before completion");
        }
    }
}

//! Deferred typed values settled by batch dispatch.

use crate::error::{Result, TypePadError};
use std::fmt;
use std::panic::Location;
use std::sync::{Arc, Mutex, PoisonError};

enum PromiseState<T> {
    Pending,
    Delivered(T),
    Failed(TypePadError),
}

/// A typed value that a batch dispatch fills in later.
///
/// A promise starts out pending; dispatch settles it exactly once with
/// either a decoded value or a typed failure. Reading before delivery
/// fails with [`TypePadError::NotDelivered`] naming the construction
/// site, which is usually more useful than the read site.
///
/// Clones share state: settling one settles them all.
pub struct Promise<T> {
    method: String,
    url: String,
    origin: &'static Location<'static>,
    state: Arc<Mutex<PromiseState<T>>>,
}

impl<T> Promise<T> {
    /// The construction site recorded as the origin is the nearest caller
    /// outside the crate's own `#[track_caller]` chain, i.e. user code.
    #[track_caller]
    pub(crate) fn new(method: impl Into<String>, url: impl Into<String>) -> Self {
        Promise {
            method: method.into(),
            url: url.into(),
            origin: Location::caller(),
            state: Arc::new(Mutex::new(PromiseState::Pending)),
        }
    }

    /// The HTTP method this promise was prepared with.
    pub fn method(&self) -> &str {
        &self.method
    }

    /// The target URL as given at construction.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// File and line where this promise was created.
    pub fn origin(&self) -> &'static Location<'static> {
        self.origin
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, PromiseState<T>> {
        // a poisoned promise still holds a valid state to report
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// True once dispatch has settled this promise, with a value or a
    /// failure.
    pub fn delivered(&self) -> bool {
        !matches!(*self.lock(), PromiseState::Pending)
    }

    /// True when dispatch settled this promise with a failure.
    pub fn failed(&self) -> bool {
        matches!(*self.lock(), PromiseState::Failed(_))
    }

    /// Consume the promise for a by-value read, for payload types that
    /// are not `Clone`.
    ///
    /// Requires this to be the last handle on the state; a delivered
    /// value cannot be taken out while clones still share it.
    pub fn into_inner(self) -> Result<T> {
        match Arc::try_unwrap(self.state) {
            Ok(state) => match state.into_inner().unwrap_or_else(PoisonError::into_inner) {
                PromiseState::Pending => Err(TypePadError::NotDelivered {
                    origin: self.origin,
                }),
                PromiseState::Delivered(value) => Ok(value),
                PromiseState::Failed(error) => Err(error),
            },
            Err(shared) => {
                let state = shared.lock().unwrap_or_else(PoisonError::into_inner);
                match &*state {
                    PromiseState::Pending => Err(TypePadError::NotDelivered {
                        origin: self.origin,
                    }),
                    PromiseState::Delivered(_) => Err(TypePadError::Usage(
                        "cannot take a delivered value out of a shared promise".to_string(),
                    )),
                    PromiseState::Failed(error) => Err(error.clone()),
                }
            }
        }
    }

    pub(crate) fn fulfill(&self, value: T) {
        *self.lock() = PromiseState::Delivered(value);
    }

    pub(crate) fn fail(&self, error: TypePadError) {
        *self.lock() = PromiseState::Failed(error);
    }
}

impl<T: Clone> Promise<T> {
    /// The delivered value.
    ///
    /// Fails with [`TypePadError::NotDelivered`] while pending, and
    /// replays the delivery failure on every read after a failed
    /// dispatch.
    pub fn get(&self) -> Result<T> {
        match &*self.lock() {
            PromiseState::Pending => Err(TypePadError::NotDelivered {
                origin: self.origin,
            }),
            PromiseState::Delivered(value) => Ok(value.clone()),
            PromiseState::Failed(error) => Err(error.clone()),
        }
    }
}

impl<T> Clone for Promise<T> {
    fn clone(&self) -> Self {
        Promise {
            method: self.method.clone(),
            url: self.url.clone(),
            origin: self.origin,
            state: Arc::clone(&self.state),
        }
    }
}

impl<T> fmt::Debug for Promise<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = match &*self.lock() {
            PromiseState::Pending => "pending",
            PromiseState::Delivered(_) => "delivered",
            PromiseState::Failed(_) => "failed",
        };
        f.debug_struct("Promise")
            .field("method", &self.method)
            .field("url", &self.url)
            .field("origin", &format_args!("{}", self.origin))
            .field("state", &state)
            .finish()
    }
}

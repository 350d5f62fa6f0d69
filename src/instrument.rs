//! Call instrumentation as an interceptor pipeline.
//!
//! An [`Interceptor`] observes one call before and after it runs. A
//! [`Pipeline`] threads a call through its interceptors in order, so the
//! cache's `store` becomes: count the call, record its input, run it, record
//! its output. Everything an interceptor records goes to the store itself.

use crate::backends::StoreBackend;
use crate::Result;

/// Key of the invocation counter for `operation`.
pub fn calls_key(operation: &str) -> String {
    format!("{operation}:calls")
}

/// Key of the input history list for `operation`.
pub fn inputs_key(operation: &str) -> String {
    format!("{operation}:inputs")
}

/// Key of the output history list for `operation`.
pub fn outputs_key(operation: &str) -> String {
    format!("{operation}:outputs")
}

/// A single invocation of an instrumented operation.
#[derive(Debug)]
pub struct Call<'a> {
    /// Qualified name of the operation, e.g. `Cache.store`.
    pub operation: &'a str,
    /// Rendered arguments.
    pub input: String,
}

/// A hook run around every call going through a [`Pipeline`].
pub trait Interceptor<S: StoreBackend>: Send + Sync {
    /// Runs before the operation.
    fn before(&self, _store: &S, _call: &Call<'_>) -> Result<()> {
        Ok(())
    }

    /// Runs after the operation succeeded, with the output it recorded.
    fn after(&self, _store: &S, _call: &Call<'_>, _output: &[u8]) -> Result<()> {
        Ok(())
    }
}

/// Counts invocations under [`calls_key`].
#[derive(Debug, Clone, Copy, Default)]
pub struct CountCalls;

impl<S: StoreBackend> Interceptor<S> for CountCalls {
    fn before(&self, store: &S, call: &Call<'_>) -> Result<()> {
        store.incr(&calls_key(call.operation))?;
        Ok(())
    }
}

/// Appends inputs and outputs to the history lists of the operation.
#[derive(Debug, Clone, Copy, Default)]
pub struct CallHistory;

impl<S: StoreBackend> Interceptor<S> for CallHistory {
    fn before(&self, store: &S, call: &Call<'_>) -> Result<()> {
        store.rpush(&inputs_key(call.operation), call.input.as_bytes())?;
        Ok(())
    }

    fn after(&self, store: &S, call: &Call<'_>, output: &[u8]) -> Result<()> {
        store.rpush(&outputs_key(call.operation), output)?;
        Ok(())
    }
}

/// An ordered list of interceptors.
///
/// `before` hooks run first to last, `after` hooks last to first. The writes
/// are not transactional: a failing step stops the call, and whatever the
/// earlier steps wrote stays in the store.
pub struct Pipeline<S: StoreBackend> {
    interceptors: Vec<Box<dyn Interceptor<S>>>,
}

impl<S: StoreBackend> Pipeline<S> {
    /// Creates a pipeline with no interceptors.
    pub fn new() -> Self {
        Self {
            interceptors: Vec::new(),
        }
    }

    /// Appends an interceptor to the end of the pipeline.
    pub fn with(mut self, interceptor: impl Interceptor<S> + 'static) -> Self {
        self.interceptors.push(Box::new(interceptor));
        self
    }

    /// Runs `op` for `call` through every interceptor.
    ///
    /// `op` returns the caller's result together with the bytes to record as
    /// the call's output.
    pub fn invoke<T, F>(&self, store: &S, call: &Call<'_>, op: F) -> Result<T>
    where
        F: FnOnce() -> Result<(T, Vec<u8>)>,
    {
        for interceptor in &self.interceptors {
            interceptor.before(store, call)?;
        }
        let (result, output) = op()?;
        for interceptor in self.interceptors.iter().rev() {
            interceptor.after(store, call, &output)?;
        }
        Ok(result)
    }
}

impl<S: StoreBackend> Default for Pipeline<S> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::*;
    use crate::backends::MemoryStore;
    use crate::CacheError;

    struct Recorder {
        name: &'static str,
        events: Arc<Mutex<Vec<String>>>,
    }

    impl Interceptor<MemoryStore> for Recorder {
        fn before(&self, _store: &MemoryStore, _call: &Call<'_>) -> Result<()> {
            self.events.lock().unwrap().push(format!("before {}", self.name));
            Ok(())
        }

        fn after(&self, _store: &MemoryStore, _call: &Call<'_>, _output: &[u8]) -> Result<()> {
            self.events.lock().unwrap().push(format!("after {}", self.name));
            Ok(())
        }
    }

    fn call() -> Call<'static> {
        Call {
            operation: "Test.op",
            input: "(1)".to_owned(),
        }
    }

    #[test]
    fn hooks_wrap_the_operation() {
        let events = Arc::new(Mutex::new(Vec::new()));
        let pipeline = Pipeline::new()
            .with(Recorder {
                name: "outer",
                events: events.clone(),
            })
            .with(Recorder {
                name: "inner",
                events: events.clone(),
            });

        let store = MemoryStore::new();
        let result = pipeline
            .invoke(&store, &call(), || {
                events.lock().unwrap().push("op".to_owned());
                Ok((7, Vec::new()))
            })
            .unwrap();

        assert_eq!(result, 7);
        assert_eq!(
            *events.lock().unwrap(),
            vec!["before outer", "before inner", "op", "after inner", "after outer"]
        );
    }

    #[test]
    fn records_counter_and_history() {
        let store = MemoryStore::new();
        let pipeline = Pipeline::new().with(CountCalls).with(CallHistory);

        pipeline
            .invoke(&store, &call(), || Ok(((), b"out".to_vec())))
            .unwrap();

        assert_eq!(store.get("Test.op:calls").unwrap(), Some(b"1".to_vec()));
        assert_eq!(
            store.lrange("Test.op:inputs", 0, -1).unwrap(),
            vec![b"(1)".to_vec()]
        );
        assert_eq!(
            store.lrange("Test.op:outputs", 0, -1).unwrap(),
            vec![b"out".to_vec()]
        );
    }

    #[test]
    fn failed_operation_keeps_earlier_writes() {
        let store = MemoryStore::new();
        let pipeline = Pipeline::new().with(CountCalls).with(CallHistory);

        let result: Result<()> = pipeline.invoke(&store, &call(), || {
            Err(CacheError::StringError("boom".to_owned()))
        });

        assert!(result.is_err());
        assert_eq!(store.get("Test.op:calls").unwrap(), Some(b"1".to_vec()));
        assert_eq!(store.lrange("Test.op:inputs", 0, -1).unwrap().len(), 1);
        assert!(!store.exists("Test.op:outputs").unwrap());
    }
}

use std::fmt;

use crate::backends::StoreBackend;
use crate::instrument::{calls_key, inputs_key, outputs_key};
use crate::{Cache, Operation, Result};

/// One recorded call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraceEntry {
    /// Rendered arguments of the call.
    pub input: String,
    /// Recorded output: the text itself when it is UTF-8, `b"..."` with
    /// ASCII escapes otherwise.
    pub output: String,
}

/// The recorded history of an instrumented operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Trace {
    /// Qualified name of the operation.
    pub operation: String,
    /// Value of the invocation counter.
    pub calls: i64,
    /// Recorded calls, oldest first.
    pub entries: Vec<TraceEntry>,
}

impl Trace {
    /// Renders every recorded call as `operation(args) -> output`.
    pub fn lines(&self) -> Vec<String> {
        self.entries
            .iter()
            .map(|entry| format!("{}({}) -> {}", self.operation, entry.input, entry.output))
            .collect()
    }
}

/// A header line with the call count, followed by one line per call.
impl fmt::Display for Trace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let plural = if self.calls == 1 { "" } else { "s" };
        writeln!(f, "{} was called {} time{}:", self.operation, self.calls, plural)?;
        for line in self.lines() {
            writeln!(f, "{line}")?;
        }
        Ok(())
    }
}

fn render_output(raw: &[u8]) -> String {
    match std::str::from_utf8(raw) {
        Ok(text) => text.to_owned(),
        Err(_) => format!("b\"{}\"", raw.escape_ascii()),
    }
}

/// Reads back the counter and call history of `operation` on `cache`.
///
/// Returns `None` if `operation` is not instrumented. Inputs and outputs are
/// paired by position; if the lists ever differ in length the extra
/// elements are ignored.
pub fn replay<S: StoreBackend>(cache: &Cache<S>, operation: Operation) -> Result<Option<Trace>> {
    if !operation.is_instrumented() {
        return Ok(None);
    }
    let store = cache.store_handle();
    let name = operation.name();

    let calls = match store.get(&calls_key(name))? {
        Some(raw) => String::from_utf8(raw)?.parse::<i64>()?,
        None => 0,
    };
    let inputs = store.lrange(&inputs_key(name), 0, -1)?;
    let outputs = store.lrange(&outputs_key(name), 0, -1)?;

    let entries = inputs
        .iter()
        .zip(outputs.iter())
        .map(|(input, output)| TraceEntry {
            input: String::from_utf8_lossy(input).into_owned(),
            output: render_output(output),
        })
        .collect();

    Ok(Some(Trace {
        operation: name.to_owned(),
        calls,
        entries,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_header_and_lines() {
        let trace = Trace {
            operation: "Cache.store".to_owned(),
            calls: 2,
            entries: vec![
                TraceEntry {
                    input: "\"a\"".to_owned(),
                    output: "a".to_owned(),
                },
                TraceEntry {
                    input: "2".to_owned(),
                    output: "2".to_owned(),
                },
            ],
        };

        assert_eq!(
            trace.to_string(),
            "Cache.store was called 2 times:\nCache.store(\"a\") -> a\nCache.store(2) -> 2\n"
        );
    }

    #[test]
    fn binary_outputs_are_escaped() {
        assert_eq!(render_output(b"plain"), "plain");
        assert_eq!(render_output(&[0xff, 0xfe]), r#"b"\xff\xfe""#);
        assert_eq!(render_output(b"a\n\xff"), r#"b"a\n\xff""#);
    }

    #[test]
    fn singular_header() {
        let trace = Trace {
            operation: "Cache.store".to_owned(),
            calls: 1,
            entries: Vec::new(),
        };
        assert_eq!(trace.to_string(), "Cache.store was called 1 time:\n");
    }
}

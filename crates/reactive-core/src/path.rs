//! Compiles a dotted-path watcher expression (`"user.address.city"`)
//! into a safe accessor closure, once, so repeated evaluation doesn't
//! re-parse the string — the same "compile once, call many times"
//! shape as `ftui-layout::incremental::IncrementalLayout::get_or_compute`
//! caching a layout result instead of a parsed path.

use crate::error::ReactiveError;
use crate::value::Value;

/// Compile `expression` into a getter. A segment that isn't shaped
/// like an identifier (or a bare non-negative integer, for indexing
/// into a `Sequence`) makes the whole expression a permanent no-op
/// getter — logged once at compile time — rather than a panic or an
/// `Err` a caller has to thread through every watcher construction
/// site.
#[must_use]
pub fn compile(expression: &str) -> Box<dyn Fn(&Value) -> Value> {
    let segments: Vec<&str> = expression.split('.').collect();
    for segment in &segments {
        if !is_valid_segment(segment) {
            let err = ReactiveError::InvalidPath(expression.to_string());
            tracing::warn!(expression, segment = *segment, "{err}");
            return Box::new(|_root: &Value| Value::Null);
        }
    }
    let segments: Vec<String> = segments.into_iter().map(str::to_string).collect();
    Box::new(move |root: &Value| {
        let mut current = root.clone();
        for segment in &segments {
            current = step(&current, segment);
        }
        current
    })
}

fn step(current: &Value, segment: &str) -> Value {
    match current {
        Value::Record(record) => record.get(segment).unwrap_or(Value::Null),
        Value::Sequence(sequence) => match segment.parse::<usize>() {
            Ok(index) => sequence.get(index).unwrap_or(Value::Null),
            Err(_) => Value::Null,
        },
        _ => Value::Null,
    }
}

fn is_valid_segment(segment: &str) -> bool {
    if segment.is_empty() {
        return false;
    }
    if segment.bytes().all(|b| b.is_ascii_digit()) {
        return true;
    }
    let mut chars = segment.chars();
    let Some(first) = chars.next() else { return false };
    (first.is_alphabetic() || first == '_') && chars.all(|c| c.is_alphanumeric() || c == '_')
}

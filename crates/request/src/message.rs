use serde_json::Value;

const FALLBACK_MESSAGE: &str = "Request failed";

/// Picks the single message shown for a failed request.
///
/// Precedence: the server's `message`; else the first entry of an `errors`
/// array; else the first message of the first field of an `errors` object;
/// else `errors` stringified; else the transport's own message; else
/// `"Request failed"`. When only part of `errors` is shown, a count of what
/// was left out is appended. Empty entries (an empty string, or a field with
/// no messages) are skipped; empty arrays and objects count as absent.
#[must_use]
pub fn error_message(message: Option<&str>, errors: Option<&Value>, transport: Option<&str>) -> String {
    if let Some(message) = message.filter(|m| !m.is_empty()) {
        return message.to_string();
    }

    let from_errors = match errors {
        Some(Value::Array(items)) => summarize(items.iter().map(text)),
        Some(Value::Object(fields)) => summarize(fields.values().map(first_message)),
        Some(Value::Null) | None => None,
        Some(other) => Some(text(other)),
    };

    from_errors
        .filter(|m| !m.is_empty())
        .or_else(|| transport.filter(|t| !t.is_empty()).map(ToString::to_string))
        .unwrap_or_else(|| FALLBACK_MESSAGE.to_string())
}

/// The first non-empty message, with a count of the other non-empty ones.
fn summarize(messages: impl Iterator<Item = String>) -> Option<String> {
    let mut messages = messages.filter(|m| !m.is_empty());
    let first = messages.next()?;

    Some(with_remaining(&first, messages.count()))
}

fn first_message(field: &Value) -> String {
    match field {
        Value::Array(messages) => messages.first().map(text).unwrap_or_default(),
        other => text(other),
    }
}

fn text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn with_remaining(first: &str, remaining: usize) -> String {
    match remaining {
        0 => first.to_string(),
        1 => format!("{first} (and 1 other error)"),
        n => format!("{first} (and {n} other errors)"),
    }
}

//! Parameter and status extraction from a message body.
//!
//! Messages carry `[key=value]` and `[flag]` groups, where values may be JSON
//! containing their own brackets (`[details={"list":[1,2]}]`). Bracket depth is
//! only tracked outside `{...}`, so brackets nested in JSON objects never close
//! a parameter early. An unbalanced `[` stays text, and complete groups that
//! follow it are still parameters unless they sit after an unclosed `{`.
//! A trailing `| enter` or `| leave, Nms` becomes the scope status.
//!
//! Accepted groups are removed by position: each run of groups separated only
//! by whitespace is cut where it was found. The same `[k=v]` text appearing
//! earlier inside a rejected group is left untouched.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Number, Value};

use super::model::{Params, ScopeStatus};

static STATUS_SUFFIX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\|\s*(enter|leave)(?:\s*,\s*(\d+)\s*ms)?\s*$")
        .expect("Invalid status suffix regex")
});

static INTEGER: Lazy<Regex> = Lazy::new(|| Regex::new(r"^-?\d+$").expect("Invalid integer regex"));

static DECIMAL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^-?\d+\.\d+$").expect("Invalid decimal regex"));

/// Result of splitting a message body.
#[derive(Debug, Clone, PartialEq)]
pub struct Extracted {
    pub message: String,
    pub params: Params,
    pub status: Option<ScopeStatus>,
    pub duration: Option<u64>,
}

/// Byte range of one top-level `[...]` group, brackets included.
#[derive(Debug, Clone, Copy)]
struct Span {
    start: usize,
    end: usize,
}

pub fn extract(text: &str) -> Extracted {
    let mut params = Params::new();
    let mut accepted = Vec::new();

    for span in find_spans(text) {
        let token = &text[span.start + 1..span.end - 1];
        if let Some((key, value)) = parse_token(token) {
            params.insert(key, value);
            accepted.push(span);
        }
    }

    let mut message = remove_spans(text, &accepted);

    let (status, duration) = match STATUS_SUFFIX.captures(&message) {
        Some(caps) => {
            let status = match &caps[1] {
                "enter" => ScopeStatus::Enter,
                _ => ScopeStatus::Leave,
            };
            let duration = caps.get(2).and_then(|m| m.as_str().parse().ok());
            let cut = caps.get(0).map(|m| m.start()).unwrap_or(message.len());
            message.truncate(cut);
            (Some(status), duration)
        }
        None => (None, None),
    };

    Extracted {
        message: message.trim().to_string(),
        params,
        status,
        duration,
    }
}

fn find_spans(text: &str) -> Vec<Span> {
    let mut spans = Vec::new();
    let mut open: Vec<usize> = Vec::new();
    // Pairs closed while an outer `[` was still open
    let mut inner: Vec<Span> = Vec::new();
    let mut braces = 0usize;

    for (i, &b) in text.as_bytes().iter().enumerate() {
        match b {
            b'{' if !open.is_empty() => braces += 1,
            b'}' if !open.is_empty() => braces = braces.saturating_sub(1),
            b'[' if braces == 0 => open.push(i),
            b']' if braces == 0 => {
                let Some(start) = open.pop() else {
                    continue;
                };
                let span = Span { start, end: i + 1 };
                if open.is_empty() {
                    spans.push(span);
                    inner.clear();
                } else {
                    inner.push(span);
                }
            }
            _ => {}
        }
    }

    // Unbalanced `[` are text; the outermost groups closed inside them still count
    if !open.is_empty() {
        inner.sort_by_key(|span| span.start);
        let mut last_end = 0;
        for span in inner {
            if span.start >= last_end {
                last_end = span.end;
                spans.push(span);
            }
        }
    }

    spans
}

fn parse_token(token: &str) -> Option<(String, Value)> {
    if token.is_empty() {
        return None;
    }
    match token.split_once('=') {
        Some((key, value)) => {
            let key = key.trim();
            if key.is_empty() {
                return None;
            }
            Some((key.to_string(), coerce_value(value)))
        }
        None => Some((token.to_string(), Value::Bool(true))),
    }
}

/// Cut every maximal run of accepted spans that are separated only by whitespace.
fn remove_spans(text: &str, spans: &[Span]) -> String {
    let mut out = String::with_capacity(text.len());
    let mut cursor = 0;
    let mut idx = 0;

    while idx < spans.len() {
        let run_start = spans[idx].start;
        let mut run_end = spans[idx].end;
        idx += 1;
        while idx < spans.len()
            && text[run_end..spans[idx].start].chars().all(char::is_whitespace)
        {
            run_end = spans[idx].end;
            idx += 1;
        }
        out.push_str(&text[cursor..run_start]);
        cursor = run_end;
    }
    out.push_str(&text[cursor..]);
    out
}

/// Typed coercion of a raw parameter value.
///
/// Order: JSON for `{`/`[` prefixed values, booleans, integers, decimals, and
/// finally a string with one pair of surrounding quotes stripped. Malformed
/// JSON stays a raw string.
pub fn coerce_value(raw: &str) -> Value {
    let v = raw.trim();

    if v.starts_with('{') || v.starts_with('[') {
        return match serde_json::from_str::<Value>(v) {
            Ok(parsed) => parsed,
            Err(e) => {
                tracing::debug!(error = %e, "parameter value is not valid JSON, keeping raw text");
                Value::String(v.to_string())
            }
        };
    }

    match v {
        "true" => return Value::Bool(true),
        "false" => return Value::Bool(false),
        _ => {}
    }

    if INTEGER.is_match(v) {
        if let Ok(n) = v.parse::<i64>() {
            return Value::from(n);
        }
        if let Ok(n) = v.parse::<u64>() {
            return Value::from(n);
        }
    }

    if INTEGER.is_match(v) || DECIMAL.is_match(v) {
        if let Some(n) = v.parse::<f64>().ok().and_then(Number::from_f64) {
            return Value::Number(n);
        }
    }

    Value::String(strip_quotes(v).to_string())
}

fn strip_quotes(v: &str) -> &str {
    if v.len() >= 2 {
        for quote in ['"', '\''] {
            if v.starts_with(quote) && v.ends_with(quote) {
                return &v[1..v.len() - 1];
            }
        }
    }
    v
}

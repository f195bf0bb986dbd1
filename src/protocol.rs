//! Wire framing codec for the `~m~<len>~m~<json>` protocol.
//!
//! Every logical message on the socket is a JSON body prefixed with its
//! own byte length: `~m~27~m~{"m":"set_locale","p":["en"]}`. A single
//! transport read may carry several frames concatenated back to back,
//! and the peer's liveness probe reuses the same framing with a `~h~`
//! body that must be echoed verbatim.
//!
//! This module is pure: no I/O, no state. The connection layer owns the
//! socket and calls into here for every read and write.

use serde_json::Value;

use crate::Result;
use crate::error::MarketwireError;

/// Length-prefix marker separating the header from the body.
const FRAME_MARKER: &str = "~m~";

/// A decoded but not yet semantically classified wire frame.
///
/// `method` is the peer's `"m"` field; frames without one (the server's
/// initial `{"session_id": ...}` hello) decode with an empty method and
/// are dropped by the dispatcher.
#[derive(Debug, Clone, PartialEq)]
pub struct RawFrame {
    pub method: String,
    pub params: Vec<Value>,
}

#[derive(serde::Deserialize)]
struct WireBody {
    #[serde(default)]
    m: String,
    #[serde(default)]
    p: Vec<Value>,
}

/// Encodes a command as a length-prefixed frame.
///
/// The body is compact JSON (`{"m": method, "p": params}`); the peer is
/// sensitive to exact byte length, so no whitespace is emitted.
pub fn encode(method: &str, params: &[Value]) -> String {
    let body = serde_json::json!({ "m": method, "p": params }).to_string();
    format!("{FRAME_MARKER}{}{FRAME_MARKER}{body}", body.len())
}

/// Returns `true` if the message is a heartbeat probe (`~m~<n>~m~~h~<n>`).
///
/// Heartbeats are not data frames; the connection layer must echo them
/// back unmodified or the peer drops the connection after a timeout.
pub fn is_heartbeat(raw: &str) -> bool {
    let Some(rest) = raw.strip_prefix(FRAME_MARKER) else {
        return false;
    };
    let digits = rest.chars().take_while(char::is_ascii_digit).count();
    if digits == 0 {
        return false;
    }
    let Some(body) = rest[digits..].strip_prefix(FRAME_MARKER) else {
        return false;
    };
    let Some(counter) = body.strip_prefix("~h~") else {
        return false;
    };
    !counter.is_empty() && counter.chars().all(|c| c.is_ascii_digit())
}

/// Splits a transport read into its constituent frames.
///
/// Walks the `~m~<len>~m~` headers and slices exactly `<len>` bytes per
/// body. A segment whose body is not valid JSON yields a per-segment
/// [`MarketwireError::DataParsing`] without aborting its siblings; a
/// read whose framing itself is broken (truncated header or body) ends
/// decoding at the damage, keeping everything decoded so far.
pub fn decode(raw: &str) -> Vec<Result<RawFrame>> {
    let mut frames = Vec::new();
    let mut rest = raw;

    while !rest.is_empty() {
        let Some(after_marker) = rest.strip_prefix(FRAME_MARKER) else {
            frames.push(Err(MarketwireError::DataParsing(format!(
                "expected frame marker, got {:?}",
                truncate(rest, 32)
            ))));
            break;
        };

        let digits = after_marker
            .chars()
            .take_while(char::is_ascii_digit)
            .count();
        let Ok(len) = after_marker[..digits].parse::<usize>() else {
            frames.push(Err(MarketwireError::DataParsing(
                "frame header missing byte length".into(),
            )));
            break;
        };
        let Some(body_start) = after_marker[digits..].strip_prefix(FRAME_MARKER) else {
            frames.push(Err(MarketwireError::DataParsing(
                "frame header missing closing marker".into(),
            )));
            break;
        };

        let Some(body) = body_start.get(..len) else {
            frames.push(Err(MarketwireError::DataParsing(format!(
                "frame body truncated: expected {len} bytes, got {}",
                body_start.len()
            ))));
            break;
        };

        frames.push(parse_body(body));
        rest = &body_start[len..];
    }

    frames
}

fn parse_body(body: &str) -> Result<RawFrame> {
    match serde_json::from_str::<WireBody>(body) {
        Ok(wire) => Ok(RawFrame {
            method: wire.m,
            params: wire.p,
        }),
        Err(e) => Err(MarketwireError::DataParsing(format!(
            "invalid frame body {:?}: {e}",
            truncate(body, 64)
        ))),
    }
}

fn truncate(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn encode_prefixes_exact_byte_length() {
        let frame = encode("set_locale", &[json!("en"), json!("US")]);
        let body = r#"{"m":"set_locale","p":["en","US"]}"#;
        assert_eq!(frame, format!("~m~{}~m~{body}", body.len()));
    }

    #[test]
    fn round_trip_yields_one_equal_frame() {
        let params = vec![json!("qs_abc"), json!({"n": "BINANCE:BTCUSDT"})];
        let frames = decode(&encode("quote_add_symbols", &params));

        assert_eq!(frames.len(), 1);
        let frame = frames[0].as_ref().unwrap();
        assert_eq!(frame.method, "quote_add_symbols");
        assert_eq!(frame.params, params);
    }

    #[test]
    fn concatenated_frames_split_in_order() {
        let raw = format!(
            "{}{}",
            encode("chart_create_session", &[json!("cs_x"), json!("")]),
            encode("quote_create_session", &[json!("qs_y")]),
        );
        let frames = decode(&raw);

        assert_eq!(frames.len(), 2);
        assert_eq!(frames[0].as_ref().unwrap().method, "chart_create_session");
        assert_eq!(frames[1].as_ref().unwrap().method, "quote_create_session");
    }

    #[test]
    fn bad_segment_does_not_abort_siblings() {
        let good = encode("quote_completed", &[json!("qs_a")]);
        let raw = format!("~m~8~m~not json{good}");
        let frames = decode(&raw);

        assert_eq!(frames.len(), 2);
        assert!(frames[0].is_err());
        assert_eq!(frames[1].as_ref().unwrap().method, "quote_completed");
    }

    #[test]
    fn missing_method_decodes_to_empty_string() {
        let body = r#"{"session_id":"<0.1.2>_srv-1@42"}"#;
        let raw = format!("~m~{}~m~{body}", body.len());
        let frames = decode(&raw);

        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].as_ref().unwrap().method, "");
    }

    #[test]
    fn multibyte_body_is_sliced_by_bytes() {
        let params = vec![json!("caf\u{e9}")];
        let frames = decode(&encode("set_locale", &params));
        assert_eq!(frames[0].as_ref().unwrap().params, params);
    }

    #[test]
    fn heartbeat_pattern_detected() {
        assert!(is_heartbeat("~m~4~m~~h~1"));
        assert!(is_heartbeat("~m~6~m~~h~123"));
        assert!(!is_heartbeat("~m~4~m~~h~"));
        assert!(!is_heartbeat("~m~10~m~{\"m\":\"x\"}"));
        assert!(!is_heartbeat("~h~1"));
    }

    #[test]
    fn truncated_body_reports_error() {
        let frames = decode("~m~100~m~{\"m\":\"du\"}");
        assert_eq!(frames.len(), 1);
        assert!(matches!(
            frames[0],
            Err(MarketwireError::DataParsing(_))
        ));
    }
}

//! Wire codec tests against realistic server bursts.

use serde_json::json;

use marketwire::protocol::{decode, encode, is_heartbeat};

#[test]
fn server_burst_decodes_in_transport_order() {
    // Hello, a quote update, and a series update in one read.
    let hello = r#"{"session_id":"<0.445.1825>_sfo-charts-22@sfo-compute-22","timestamp":1642694400}"#;
    let qsd = r#"{"m":"qsd","p":["qs_abc",{"n":"BINANCE:BTCUSDT","v":{"lp":50123.45}}]}"#;
    let du = r#"{"m":"du","p":["cs_abc",{"sds_1":{"s":[]}}]}"#;
    let raw = format!(
        "~m~{}~m~{hello}~m~{}~m~{qsd}~m~{}~m~{du}",
        hello.len(),
        qsd.len(),
        du.len()
    );

    let frames = decode(&raw);

    assert_eq!(frames.len(), 3);
    assert_eq!(frames[0].as_ref().unwrap().method, "");
    assert_eq!(frames[1].as_ref().unwrap().method, "qsd");
    assert_eq!(frames[2].as_ref().unwrap().method, "du");
}

#[test]
fn heartbeats_are_not_data_frames() {
    let probe = "~m~4~m~~h~7";
    assert!(is_heartbeat(probe));

    // A data frame whose body merely contains ~h~ is not a heartbeat.
    let lookalike = encode("qsd", &[json!("~h~7")]);
    assert!(!is_heartbeat(&lookalike));
}

#[test]
fn encoded_commands_round_trip_through_decode() {
    let raw = encode(
        "create_series",
        &[
            json!("cs_abc"),
            json!("sds_1"),
            json!("s1"),
            json!("sds_sym_1"),
            json!("1"),
            json!(300),
            json!(""),
        ],
    );

    let frames = decode(&raw);
    assert_eq!(frames.len(), 1);

    let frame = frames[0].as_ref().unwrap();
    assert_eq!(frame.method, "create_series");
    assert_eq!(frame.params[4], json!("1"));
    assert_eq!(frame.params[5], json!(300));
}

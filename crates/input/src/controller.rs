//! Bluetooth controller payload decoding.
//!
//! The peripheral notifies a UART-style characteristic with one JSON
//! object per packet:
//!
//! ```text
//! {"gx":0.12,"gy":-0.03,"gz":0.0,"l":0,"r":1,"su":0,"sd":0}
//! ```
//!
//! The gyro fields are required. Button fields are `0`/`1` and default to
//! released when absent. Packets that fail to decode are dropped here and
//! never reach the pipeline.

use serde::Deserialize;

use headaim_common::error::{HeadaimError, HeadaimResult};
use headaim_model::sample::{ControllerPayload, TimedInput, TimestampNs};

#[derive(Debug, Deserialize)]
struct WirePayload {
    gx: f64,
    gy: f64,
    gz: f64,
    #[serde(default)]
    l: u8,
    #[serde(default)]
    r: u8,
    #[serde(default)]
    su: u8,
    #[serde(default)]
    sd: u8,
}

impl From<WirePayload> for ControllerPayload {
    fn from(wire: WirePayload) -> Self {
        ControllerPayload {
            gx: wire.gx,
            gy: wire.gy,
            gz: wire.gz,
            left: wire.l == 1,
            right: wire.r == 1,
            up: wire.su == 1,
            down: wire.sd == 1,
        }
    }
}

/// Decode one packet, reporting why it was rejected.
pub fn parse_payload(bytes: &[u8]) -> HeadaimResult<ControllerPayload> {
    let text = std::str::from_utf8(bytes)
        .map_err(|e| HeadaimError::input(format!("controller packet is not UTF-8: {e}")))?;
    let wire: WirePayload = serde_json::from_str(text.trim_end_matches('\0').trim())?;
    Ok(wire.into())
}

/// Decode one packet, dropping malformed ones.
pub fn decode_payload(bytes: &[u8]) -> Option<ControllerPayload> {
    match parse_payload(bytes) {
        Ok(payload) => Some(payload),
        Err(e) => {
            tracing::debug!(error = %e, len = bytes.len(), "Dropping malformed controller payload");
            None
        }
    }
}

/// Decode one packet into a timestamped input.
pub fn decode_input(timestamp_ns: TimestampNs, bytes: &[u8]) -> Option<TimedInput> {
    decode_payload(bytes).map(|payload| TimedInput::controller(timestamp_ns, payload))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_full_packet() {
        let payload =
            decode_payload(br#"{"gx":0.12,"gy":-0.03,"gz":0.5,"l":0,"r":1,"su":1,"sd":0}"#)
                .unwrap();
        assert_eq!(payload.gx, 0.12);
        assert_eq!(payload.gy, -0.03);
        assert!(!payload.left);
        assert!(payload.right);
        assert!(payload.up);
        assert!(!payload.down);
    }

    #[test]
    fn test_missing_buttons_default_to_released() {
        let payload = decode_payload(br#"{"gx":0,"gy":0,"gz":0}"#).unwrap();
        assert!(!payload.any_button());
    }

    #[test]
    fn test_missing_gyro_field_is_dropped() {
        assert!(decode_payload(br#"{"gx":0.1,"gy":0.2,"l":1}"#).is_none());
    }

    #[test]
    fn test_garbage_is_dropped() {
        assert!(decode_payload(b"not json").is_none());
        assert!(decode_payload(&[0xff, 0xfe, 0x00]).is_none());
        assert!(matches!(
            parse_payload(&[0xff, 0xfe]),
            Err(HeadaimError::Input { .. })
        ));
    }

    #[test]
    fn test_trailing_nul_padding_is_tolerated() {
        let payload = decode_payload(b"{\"gx\":1,\"gy\":2,\"gz\":3}\0\0").unwrap();
        assert_eq!(payload.gz, 3.0);
    }

    #[test]
    fn test_decode_input_stamps_time() {
        let input = decode_input(77, br#"{"gx":0,"gy":0,"gz":0,"sd":1}"#).unwrap();
        assert_eq!(input.timestamp_ns, 77);
        assert!(input.is_continuous());
    }

    proptest::proptest! {
        #[test]
        fn prop_arbitrary_bytes_never_panic(bytes in proptest::collection::vec(proptest::prelude::any::<u8>(), 0..64)) {
            let _ = decode_payload(&bytes);
        }

        #[test]
        fn prop_button_flags_decode(l in 0u8..2, r in 0u8..2, su in 0u8..2, sd in 0u8..2) {
            let raw = format!(r#"{{"gx":0,"gy":0,"gz":0,"l":{l},"r":{r},"su":{su},"sd":{sd}}}"#);
            let payload = decode_payload(raw.as_bytes()).unwrap();
            proptest::prop_assert_eq!(payload.left, l == 1);
            proptest::prop_assert_eq!(payload.right, r == 1);
            proptest::prop_assert_eq!(payload.up, su == 1);
            proptest::prop_assert_eq!(payload.down, sd == 1);
        }
    }
}

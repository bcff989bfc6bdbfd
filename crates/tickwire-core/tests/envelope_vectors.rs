//! Envelope vector tests.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use tickwire_core::protocol::envelope::{self, TypeFlag};
use tickwire_core::protocol::{InvokePayload, StreamChunk};

use vector_loader::load;

const FILES: [&str; 8] = [
    "envelope_send.json",
    "envelope_invoke.json",
    "envelope_stream_fragment.json",
    "envelope_invoke_stream_last.json",
    "envelope_empty.json",
    "envelope_unknown_flag.json",
    "fragment_bad_continuation.json",
    "fragment_missing_flag.json",
];

#[test]
fn envelope_vectors() {
    for f in FILES {
        let v = load(f);
        let res = envelope::decode(&v.wire);

        if let Some(err) = &v.expect_error {
            let e = res.expect_err("expected error");
            assert_eq!(e.kind().as_str(), err.code, "vector={}", v.description);
            continue;
        }

        let env = res.expect("expected ok envelope");
        assert_eq!(env.flag.to_string(), v.expect_str("flag").unwrap(), "vector={}", v.description);
        assert_eq!(env.payload, v.expect_str("payload").unwrap(), "vector={}", v.description);

        // re-encoding is byte-exact
        assert_eq!(envelope::encode(env.flag, env.payload), v.wire, "vector={}", v.description);
    }
}

#[test]
fn invoke_vectors() {
    for f in FILES {
        let v = load(f);
        let Some(rlid) = v.expect_str("response_listener_id") else { continue };
        let env = envelope::decode(&v.wire).unwrap();
        assert_eq!(env.flag, TypeFlag::Invoke);

        let inv = InvokePayload::parse(env.payload).unwrap();
        assert_eq!(inv.response_listener_id, rlid, "vector={}", v.description);
        assert_eq!(inv.inner, v.expect_str("inner").unwrap(), "vector={}", v.description);
    }
}

#[test]
fn fragment_vectors() {
    for f in FILES {
        let v = load(f);
        let Ok(env) = envelope::decode(&v.wire) else { continue };
        if !env.flag.is_stream() {
            continue;
        }

        let res = StreamChunk::parse(env.payload);
        if let Some(err) = &v.expect_fragment_error {
            let e = res.expect_err("expected fragment error");
            assert_eq!(e.kind().as_str(), err.code, "vector={}", v.description);
            continue;
        }

        let chunk = res.expect("expected ok fragment");
        let ex = v.expect.as_ref().unwrap();
        assert_eq!(chunk.stream_id, ex["stream_id"].as_str().unwrap(), "vector={}", v.description);
        assert_eq!(chunk.is_last, ex["is_last"].as_bool().unwrap(), "vector={}", v.description);
        assert_eq!(chunk.content, ex["content"].as_str().unwrap(), "vector={}", v.description);
        assert_eq!(chunk.to_wire(), env.payload, "vector={}", v.description);
    }
}

#[test]
fn every_flag_roundtrips() {
    for flag in [
        TypeFlag::Send,
        TypeFlag::SendStream,
        TypeFlag::Invoke,
        TypeFlag::InvokeStream,
    ] {
        let wire = envelope::encode(flag, "payload with spaces");
        let env = envelope::decode(&wire).unwrap();
        assert_eq!(env.flag, flag);
        assert_eq!(env.payload, "payload with spaces");
    }
}

#[test]
fn invoke_join_rejects_whitespace_in_listener_id() {
    let err = tickwire_core::protocol::invoke::join("bad id", "{}").unwrap_err();
    assert_eq!(err.kind().as_str(), "VALIDATION");
    assert_eq!(
        tickwire_core::protocol::invoke::join("ns:__rl0", "{}").unwrap(),
        "ns:__rl0 {}"
    );
}

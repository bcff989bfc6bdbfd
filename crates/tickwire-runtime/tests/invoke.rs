//! Invoke correlation through a loopback host.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use std::sync::Arc;
use std::time::Duration;

use tickwire_core::error::{IpcError, Result};
use tickwire_core::value::{Failure, Value};
use tickwire_runtime::{Channel, InvokeOptions, Ipc, LoopbackHost, TickScheduler};

use loopback::{big_string, echo, pair};

#[test]
fn response_wins_over_timeout() {
    let p = pair(5);
    p.server.register_listener("demo:echo", echo).unwrap();

    let mut handle = p
        .client
        .invoke(&InvokeOptions::new("demo:echo"), &Value::from("ping"))
        .unwrap();

    // request lands at tick 5, response at tick 10
    assert!(p.host.run_ticks(9).is_empty());
    assert!(handle.try_take().is_none());
    assert!(p.client.has_listener("client:__rl0"));

    assert!(p.host.tick().is_empty());
    assert_eq!(handle.try_take().unwrap().unwrap(), Value::from("ping"));
    assert!(!p.client.has_listener("client:__rl0"));

    // the timer was cleared; nothing fires at tick 20
    assert_eq!(p.host.scheduler().pending(), 0);
    assert!(p.host.run_ticks(15).is_empty());
}

#[test]
fn unanswered_invoke_times_out_on_the_configured_tick() {
    let p = pair(1);
    let mut handle = p
        .client
        .invoke(&InvokeOptions::new("demo:nobody"), &Value::Null)
        .unwrap();

    p.host.run_ticks(19);
    assert!(handle.try_take().is_none());

    p.host.tick();
    assert_eq!(
        handle.try_take().unwrap(),
        Err(IpcError::Timeout {
            event: "demo:nobody".into()
        })
    );
    assert!(!p.client.has_listener("client:__rl0"));
}

#[test]
fn per_call_timeout_overrides_default() {
    let p = pair(1);
    let mut handle = p
        .client
        .invoke(&InvokeOptions::new("demo:nobody").timeout_ticks(3), &Value::Null)
        .unwrap();
    p.host.run_ticks(2);
    assert!(handle.try_take().is_none());
    p.host.tick();
    assert_eq!(handle.try_take().unwrap().unwrap_err().kind().as_str(), "TIMEOUT");
}

#[test]
fn failure_round_trip_both_modes() {
    let p = pair(1);
    p.server
        .register_listener("demo:fail", |_: Value| -> Result<Value> {
            Err(Failure::new("boom").into())
        })
        .unwrap();

    let mut as_value = p
        .client
        .invoke(&InvokeOptions::new("demo:fail"), &Value::Null)
        .unwrap();
    let mut as_error = p
        .client
        .invoke(
            &InvokeOptions::new("demo:fail").throw_failures(true),
            &Value::Null,
        )
        .unwrap();

    // an explicit failure is not a dispatch error
    assert!(p.host.run_ticks(2).is_empty());

    assert_eq!(
        as_value.try_take().unwrap().unwrap(),
        Value::Failure(Failure::new("boom"))
    );
    assert_eq!(
        as_error.try_take().unwrap(),
        Err(IpcError::Failure(Failure::new("boom")))
    );
}

#[test]
fn listener_error_answers_with_failure_then_surfaces() {
    let p = pair(1);
    p.server
        .register_listener("demo:broken", |_: Value| -> Result<Value> {
            Err(IpcError::Validation("bad input".into()))
        })
        .unwrap();

    let mut handle = p
        .client
        .invoke(&InvokeOptions::new("demo:broken"), &Value::Null)
        .unwrap();

    let errors = p.host.tick();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].kind().as_str(), "HANDLER");

    assert!(p.host.tick().is_empty());
    let reply = handle.try_take().unwrap().unwrap();
    assert_eq!(
        reply.as_failure().map(Failure::message),
        Some("validation failed: bad input")
    );
}

#[test]
fn oversize_invoke_is_rejected_without_leftovers() {
    let p = pair(1);
    let err = p
        .client
        .invoke(&InvokeOptions::new("demo:echo"), &big_string(3000))
        .err()
        .unwrap();

    assert_eq!(err.kind().as_str(), "VALIDATION");
    assert!(!p.client.has_listener("client:__rl0"));
    assert_eq!(p.host.scheduler().pending(), 0);
    assert_eq!(p.host.bus().transmitted(), 0);
}

#[test]
fn invoke_auto_streams_both_ways() {
    let p = pair(1);
    p.server.register_listener("demo:echo", echo).unwrap();

    let big = Value::object([("blob", big_string(5000)), ("n", Value::from(7))]);
    let mut handle = p
        .client
        .invoke_auto(&InvokeOptions::new("demo:echo"), &big)
        .unwrap();

    assert!(p.host.run_ticks(10).is_empty());
    assert_eq!(handle.try_take().unwrap().unwrap(), big);
    assert_eq!(p.server.pending_streams(), 0);
    assert_eq!(p.client.pending_streams(), 0);
}

#[test]
fn invoke_stream_arms_timeout_after_last_fragment() {
    let p = pair(1);
    // "client:__rl0 " + quoted payload spans three fragments
    let mut handle = p
        .client
        .invoke_stream(
            &InvokeOptions::new("demo:nobody").timeout_ticks(2),
            &big_string(5000),
        )
        .unwrap();

    // fragments go out on ticks 1..=3, timeout due at 3 + 2
    p.host.run_ticks(4);
    assert!(handle.try_take().is_none());
    p.host.tick();
    assert_eq!(handle.try_take().unwrap().unwrap_err().kind().as_str(), "TIMEOUT");
    assert_eq!(p.host.bus().transmitted(), 3);
}

struct RefusingChannel;

impl Channel for RefusingChannel {
    fn transmit(&self, _event_id: &str, _message: &str) -> Result<()> {
        Err(IpcError::Transport("channel closed".into()))
    }
}

#[test]
fn transport_errors_resolve_the_call() {
    let scheduler = Arc::new(TickScheduler::new());
    let ipc = Ipc::new("demo", 20, Arc::new(RefusingChannel), Arc::clone(&scheduler)).unwrap();

    // single message: synchronous, nothing left behind
    let err = ipc
        .invoke(&InvokeOptions::new("x:y"), &Value::Null)
        .err()
        .unwrap();
    assert_eq!(err.kind().as_str(), "TRANSPORT");
    assert!(!ipc.has_listener("demo:__rl0"));
    assert_eq!(scheduler.pending(), 0);

    // streamed: the failure arrives with the first fragment
    let mut handle = ipc
        .invoke_stream(&InvokeOptions::new("x:y"), &Value::Null)
        .unwrap();
    assert!(handle.try_take().is_none());
    scheduler.tick();
    assert_eq!(handle.try_take().unwrap().unwrap_err().kind().as_str(), "TRANSPORT");
    assert!(!ipc.has_listener("demo:__rl1"));
    assert_eq!(scheduler.pending(), 0);
}

#[test]
fn dropped_handle_still_tears_down() {
    let p = pair(1);
    p.server.register_listener("demo:echo", echo).unwrap();
    drop(
        p.client
            .invoke(&InvokeOptions::new("demo:echo"), &Value::from(1))
            .unwrap(),
    );
    assert!(p.host.run_ticks(3).is_empty());
    assert!(!p.client.has_listener("client:__rl0"));
    assert_eq!(p.host.scheduler().pending(), 0);
}

#[tokio::test]
async fn drive_resolves_awaited_invoke() {
    let host = LoopbackHost::new(1);
    let server = host.attach("demo", 20).unwrap();
    let client = host.attach("client", 20).unwrap();
    server.register_listener("demo:echo", echo).unwrap();

    let handle = client
        .invoke(&InvokeOptions::new("demo:echo"), &Value::from("async"))
        .unwrap();
    let reply = host.drive(Duration::from_millis(1), handle).await;
    assert_eq!(reply.unwrap(), Value::from("async"));
    assert_eq!(host.scheduler().current_tick(), 2);
}

#[test]
fn invoke_force_skips_length_checks() {
    let p = pair(1);
    p.server.register_listener("demo:echo", echo).unwrap();

    let long_event = "e".repeat(97);
    let err = p
        .client
        .invoke(&InvokeOptions::new(long_event.as_str()), &Value::Null)
        .err()
        .unwrap();
    assert_eq!(err.kind().as_str(), "VALIDATION");
    p.client
        .invoke(&InvokeOptions::new(long_event.as_str()).force(true), &Value::Null)
        .unwrap();

    let big = big_string(2060);
    let err = p
        .client
        .invoke(&InvokeOptions::new("demo:echo"), &big)
        .err()
        .unwrap();
    assert_eq!(err.kind().as_str(), "VALIDATION");
    let mut handle = p
        .client
        .invoke(&InvokeOptions::new("demo:echo").force(true), &big)
        .unwrap();
    assert_eq!(p.host.bus().transmitted(), 2);

    // the echo is too long for one message and streams back
    assert!(p.host.run_ticks(4).is_empty());
    assert_eq!(handle.try_take().unwrap().unwrap(), big);
}

#[test]
fn invoke_stream_listener_error_answers_with_failure() {
    let p = pair(1);
    p.server
        .register_listener("demo:broken", |_: Value| -> Result<Value> {
            Err(IpcError::Validation("bad input".into()))
        })
        .unwrap();
    p.server
        .register_listener("demo:fail", |_: Value| -> Result<Value> {
            Ok(Value::Failure(Failure::new("boom")))
        })
        .unwrap();

    let mut broken = p
        .client
        .invoke_stream(&InvokeOptions::new("demo:broken"), &Value::from("hi"))
        .unwrap();
    let mut failed = p
        .client
        .invoke_stream(
            &InvokeOptions::new("demo:fail").throw_failures(true),
            &Value::from("hi"),
        )
        .unwrap();

    // both single-fragment streams land on tick 1; only the error surfaces
    let errors = p.host.tick();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].kind().as_str(), "HANDLER");

    assert!(p.host.tick().is_empty());
    let reply = broken.try_take().unwrap().unwrap();
    assert_eq!(
        reply.as_failure().map(Failure::message),
        Some("validation failed: bad input")
    );
    assert_eq!(
        failed.try_take().unwrap(),
        Err(IpcError::Failure(Failure::new("boom")))
    );
    assert_eq!(p.host.scheduler().pending(), 0);
}

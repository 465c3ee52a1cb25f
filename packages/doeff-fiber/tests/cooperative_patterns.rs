use std::cell::RefCell;
use std::rc::Rc;

use doeff_fiber::{
    ContextOptions, ContextState, Fault, FaultKind, Hub, HubConfig, ThrowArgs, TransferEvent,
    Value,
};

/// Producer hands values to the root one at a time, like a generator.
#[test]
fn producer_yields_values_until_exhausted() {
    let hub = Hub::new();
    let producer = hub.create(|hub, args| {
        let limit = args.as_int().unwrap_or(0);
        for i in 0..limit {
            hub.switch_to_parent(i)?;
        }
        Ok(Value::from("exhausted"))
    });

    let mut received = Vec::new();
    let mut next = hub.switch(producer, 3i64).unwrap();
    while hub.is_active(producer) {
        received.push(next.as_int().unwrap());
        next = hub.switch(producer, ()).unwrap();
    }
    assert_eq!(received, vec![0, 1, 2]);
    assert_eq!(next, Value::from("exhausted"));
}

/// Two contexts pass a counter back and forth without involving the root.
#[test]
fn ping_pong_between_siblings() {
    let hub = Hub::new();
    let ponger = hub.create(|hub, args| {
        let mut value = args;
        loop {
            let step = match value.as_tuple() {
                Some([Value::Context(peer), Value::Int(count)]) => Some((*peer, *count)),
                _ => None,
            };
            let Some((peer, count)) = step else {
                return Ok(value);
            };
            let me = Value::Context(hub.current());
            value = hub.switch_all(peer, vec![me, Value::Int(count + 1)])?;
        }
    });
    let pinger = hub.create(move |hub, _| {
        let me = hub.current();
        let mut reply = hub.switch_all(ponger, vec![Value::Context(me), Value::Int(0)])?;
        loop {
            let count = match reply.as_tuple() {
                Some([_, Value::Int(count)]) => *count,
                _ => return Err(Fault::runtime("unexpected reply")),
            };
            if count >= 10 {
                return Ok(Value::Int(count));
            }
            reply = hub.switch_all(ponger, vec![Value::Context(me), Value::Int(count)])?;
        }
    });

    assert_eq!(hub.switch(pinger, ()).unwrap(), Value::Int(10));
    assert!(hub.is_dead(pinger));
    assert_eq!(hub.state(ponger).unwrap(), ContextState::Suspended);
}

/// A round-robin loop driven from the root, stopping workers with kill.
#[test]
fn round_robin_with_cancellation() {
    let hub = Hub::with_config(HubConfig::traced()).unwrap();
    let log = Rc::new(RefCell::new(Vec::new()));

    let workers: Vec<_> = (0..3)
        .map(|n| {
            let log = Rc::clone(&log);
            hub.create_with(ContextOptions::default().name(format!("worker-{n}")), move |hub, _| {
                let mut ticks = 0i64;
                loop {
                    match hub.switch_to_parent(ticks) {
                        Ok(_) => ticks += 1,
                        Err(fault) if fault.is_clean_kill() => {
                            log.borrow_mut().push(format!("worker-{n} stopped after {ticks}"));
                            return Err(fault);
                        }
                        Err(fault) => return Err(fault),
                    }
                }
            })
            .unwrap()
        })
        .collect();

    for _ in 0..2 {
        for worker in &workers {
            hub.switch(*worker, ()).unwrap();
        }
    }
    for worker in &workers {
        let res = hub.kill(*worker).unwrap();
        assert!(res.is_clean_kill());
        assert!(hub.is_dead(*worker));
    }

    assert_eq!(
        *log.borrow(),
        vec![
            "worker-0 stopped after 1",
            "worker-1 stopped after 1",
            "worker-2 stopped after 1",
        ]
    );
    let killed = hub
        .transfer_log()
        .iter()
        .filter(|event| {
            matches!(event, TransferEvent::Throw { kind, .. } if kind == &FaultKind::CLEAN_KILL)
        })
        .count();
    assert_eq!(killed, 3);
}

/// Supervisor pattern: a parent catches whatever its children let escape.
#[test]
fn supervisor_collects_child_failures() {
    let hub = Hub::new();
    let supervisor = hub.create(|hub, _| {
        let mut failures = Vec::new();
        for n in 0..3i64 {
            let child = hub.create(move |_, _| {
                if n % 2 == 1 {
                    Err(Fault::with_value(FaultKind::new("WorkerError"), n))
                } else {
                    Ok(Value::Int(n * 10))
                }
            });
            match hub.switch(child, ()) {
                Ok(value) => failures.push(Value::Tuple(vec!["ok".into(), value])),
                Err(fault) => failures.push(Value::Tuple(vec![
                    fault.kind().name().into(),
                    fault.value().cloned().unwrap_or_default(),
                ])),
            }
        }
        Ok(Value::Tuple(failures))
    });

    let report = hub.switch(supervisor, ()).unwrap();
    assert_eq!(
        report,
        Value::Tuple(vec![
            Value::Tuple(vec!["ok".into(), Value::Int(0)]),
            Value::Tuple(vec!["WorkerError".into(), Value::Int(1)]),
            Value::Tuple(vec!["ok".into(), Value::Int(20)]),
        ])
    );
}

/// A fault nobody catches surfaces at the root's pending call.
#[test]
fn uncaught_fault_reaches_root() {
    let hub = Hub::new();
    let chain = hub.create(|hub, _| {
        let middle = hub.create(|hub, _| {
            let leaf = hub.create(|_, _| Err(Fault::with_value(FaultKind::new("Fatal"), "deep")));
            hub.switch(leaf, ())
        });
        hub.switch(middle, ())
    });
    let err = hub.switch(chain, ()).unwrap_err();
    assert!(err.is(&FaultKind::new("Fatal")));
    assert_eq!(err.to_string(), "Fatal: deep");
    assert!(hub.contexts().iter().skip(1).all(|info| info.state.is_dead()));
}

/// Dynamic throw arguments are validated before any context is touched.
#[test]
fn dynamic_throw_validation() {
    let hub = Hub::new();
    let target = hub.create(|hub, _| {
        hub.switch_to_parent("parked")?;
        Ok(Value::None)
    });
    hub.switch(target, ()).unwrap();

    let cases = [
        (
            ThrowArgs::new().category(FaultKind::RUNTIME).trace(3i64),
            "trace object",
        ),
        (
            ThrowArgs::new()
                .category(Fault::runtime("a"))
                .payload(Fault::runtime("b")),
            "separate value",
        ),
        (ThrowArgs::new().category(1.5f64), "not float"),
        (ThrowArgs::new().category("abc"), "not str"),
    ];
    for (args, needle) in cases {
        let err = hub.throw_with(target, args).unwrap_err();
        assert!(err.is(&FaultKind::INVALID_ARGUMENT));
        assert!(err.to_string().contains(needle), "{err} lacks {needle}");
        assert_eq!(hub.state(target).unwrap(), ContextState::Suspended);
    }

    let trace = hub.capture_trace();
    let args = ThrowArgs::new()
        .category(FaultKind::RUNTIME)
        .payload("with trace")
        .trace(trace.clone());
    let err = hub.throw_with(target, args).unwrap_err();
    assert_eq!(err.trace(), Some(&trace));
    assert!(hub.is_dead(target));
}

#![cfg(not(feature = "loom"))]

use lite_future::Future;
use proptest::prelude::*;
use std::sync::{Arc, Mutex};

/// A step applied to a fresh future, in order
#[derive(Debug, Clone)]
enum Step {
    Listen,
    Complete(Result<u8, u8>),
}

fn arb_step() -> impl Strategy<Value = Step> {
    prop_oneof![
        Just(Step::Listen),
        any::<u8>().prop_map(|v| Step::Complete(Ok(v))),
        any::<u8>().prop_map(|e| Step::Complete(Err(e))),
    ]
}

proptest! {
    /// Only the first completion is ever observed, by every consumer
    #[test]
    fn prop_first_completion_wins(results in prop::collection::vec(
        prop_oneof![any::<u8>().prop_map(Ok::<u8, u8>), any::<u8>().prop_map(Err::<u8, u8>)],
        1..16,
    )) {
        let (fut, completer) = Future::<u8, u8>::new();

        let accepted: Vec<bool> = results.iter().map(|r| completer.complete(*r)).collect();

        prop_assert!(accepted[0]);
        prop_assert!(accepted[1..].iter().all(|won| !won));
        prop_assert_eq!(fut.try_get(), Some(results[0].as_ref()));
        prop_assert_eq!(fut.blocking_get(), results[0]);
    }

    /// Every listener runs exactly once, in registration order, with the winning result
    #[test]
    fn prop_listeners_delivered_in_order(steps in prop::collection::vec(arb_step(), 1..32)) {
        let (fut, completer) = Future::<u8, u8>::new();
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut registered = 0usize;
        let mut winner = None;

        for step in &steps {
            match step {
                Step::Listen => {
                    let id = registered;
                    registered += 1;
                    let log = log.clone();
                    fut.listen(move |result| {
                        log.lock().unwrap().push((id, result.copied().map_err(|e| *e)));
                    });
                }
                Step::Complete(result) => {
                    if completer.complete(*result) {
                        winner = Some(*result);
                    }
                }
            }
        }

        let log = log.lock().unwrap();
        match winner {
            Some(winner) => {
                let expected: Vec<_> = (0..registered).map(|id| (id, winner)).collect();
                prop_assert_eq!(&*log, &expected);
            }
            None => prop_assert!(log.is_empty()),
        }
    }

    /// Once fired, the readiness signal stays fired
    #[test]
    fn prop_ready_monotonic(resolve_at in 0usize..8, checks in 1usize..16) {
        let (fut, completer) = Future::<usize, ()>::new();
        let ready = fut.ready();
        let mut fired = false;

        for i in 0..checks {
            if i == resolve_at {
                completer.resolve(i);
            }
            let now = ready.is_fired();
            prop_assert!(!fired || now, "readiness reverted at step {}", i);
            prop_assert_eq!(now, i >= resolve_at);
            fired = now;
        }
    }
}

use std::cell::RefCell;
use std::rc::Rc;
use std::thread;

use wut::{ExitStatus, SchedulerConfigBuilder};

fn run_workers(workers: usize, rounds: usize) -> Vec<usize> {
    let config = SchedulerConfigBuilder::default()
        .stack_size(64 * 1024)
        .initial_capacity(2)
        .build()
        .unwrap();
    wut::init_with(config).unwrap();

    let log = Rc::new(RefCell::new(Vec::new()));
    let ids: Vec<_> = (0..workers)
        .map(|_| {
            let log = log.clone();
            wut::create(move || {
                for _ in 0..rounds {
                    log.borrow_mut().push(wut::current_id().unwrap());
                    let _ = wut::yield_now();
                }
            })
            .unwrap()
        })
        .collect();

    for tid in ids {
        assert_eq!(wut::join(tid).unwrap(), ExitStatus::Exited(0));
    }
    assert_eq!(wut::thread_count(), 1);
    wut::teardown().unwrap();

    Rc::try_unwrap(log).unwrap().into_inner()
}

#[test]
fn schedulers_are_independent_per_os_thread() {
    let handles: Vec<_> = (2..6)
        .map(|workers| thread::spawn(move || (workers, run_workers(workers, 3))))
        .collect();

    for handle in handles {
        let (workers, log) = handle.join().unwrap();
        let expected: Vec<usize> = (0..3).flat_map(|_| 1..=workers).collect();
        assert_eq!(log, expected);
    }
}

#[test]
fn config_from_environment_lookup() {
    let config = wut::SchedulerConfig::from_lookup(|key| match key {
        "WUT_STACK_SIZE" => Some("96KiB".into()),
        "WUT_INITIAL_CAPACITY" => Some("3".into()),
        _ => None,
    });
    assert_eq!(config.stack_size, 96 * 1024);
    assert_eq!(config.initial_capacity, 3);

    wut::init_with(config).unwrap();
    assert_eq!(wut::capacity(), 3);
    wut::teardown().unwrap();
}

//! Concurrency tests for lazy proxies.
//!
//! Many threads share one proxy (or one builder) and race for the first call; the real object
//! and the synthesized types must still be created exactly once.

mod common;

use std::{
    sync::{Arc, Barrier},
    thread,
    time::Duration,
};

use common::{Counter, Fixture};
use lazyproxy::prelude::*;

const THREADS: usize = 16;

#[test]
fn test_concurrent_first_calls_create_one_real_object() -> Result<()> {
    let fixture = Fixture::new()?;
    let void_method = fixture.member("VoidMethod")?;
    let constructed = Counter::default();
    let calls = Counter::default();

    let proxy = {
        let registry = fixture.registry.clone();
        let service = fixture.service.sig();
        let void_method = void_method.clone();
        let (constructed, calls) = (constructed.clone(), calls.clone());
        fixture
            .builder()
            .create_lazy_instance(&fixture.service.sig(), move || {
                constructed.hit();
                thread::sleep(Duration::from_millis(50));
                ServiceObject::builder(&registry, "SlowService")
                    .implements(service)
                    .on(&void_method, move |_| {
                        calls.hit();
                        Ok(Value::Void)
                    })
                    .build()
            })?
    };

    let barrier = Arc::new(Barrier::new(THREADS));
    let handles: Vec<_> = (0..THREADS)
        .map(|_| {
            let proxy = proxy.clone();
            let barrier = barrier.clone();
            let void_method = void_method.clone();
            thread::spawn(move || {
                barrier.wait();
                proxy.call(&void_method, &mut [])
            })
        })
        .collect();

    for handle in handles {
        handle.join().expect("worker panicked")?;
    }

    assert_eq!(constructed.get(), 1);
    assert_eq!(calls.get(), THREADS);

    Ok(())
}

#[test]
fn test_concurrent_dispose_releases_once() -> Result<()> {
    let fixture = Fixture::new()?;
    let run = fixture
        .registry
        .find_method(&fixture.disposable_service.sig(), "Run")?;
    let dispose = fixture
        .registry
        .find_method(&fixture.disposable_service.sig(), "Dispose")?;
    let disposed = Counter::default();

    let proxy = {
        let registry = fixture.registry.clone();
        let service = fixture.disposable_service.sig();
        let (run, dispose) = (run.clone(), dispose.clone());
        let disposed = disposed.clone();
        fixture
            .builder()
            .create_lazy_instance(&fixture.disposable_service.sig(), move || {
                ServiceObject::builder(&registry, "DisposableTestService")
                    .implements(service)
                    .on(&run, |_| Ok(Value::Void))
                    .on(&dispose, move |_| {
                        disposed.hit();
                        Ok(Value::Void)
                    })
                    .build()
            })?
    };
    proxy.call(&run, &mut [])?;

    let barrier = Arc::new(Barrier::new(THREADS));
    let handles: Vec<_> = (0..THREADS)
        .map(|_| {
            let proxy = proxy.clone();
            let barrier = barrier.clone();
            let dispose = dispose.clone();
            thread::spawn(move || {
                barrier.wait();
                proxy.call(&dispose, &mut [])
            })
        })
        .collect();

    for handle in handles {
        handle.join().expect("worker panicked")?;
    }

    assert_eq!(disposed.get(), 1);

    Ok(())
}

#[test]
fn test_concurrent_type_requests_synthesize_once() -> Result<()> {
    let fixture = Fixture::new()?;
    let builder = Arc::new(fixture.builder());
    let closed = fixture.closed_generic_service();

    let barrier = Arc::new(Barrier::new(THREADS));
    let handles: Vec<_> = (0..THREADS)
        .map(|index| {
            let builder = builder.clone();
            let barrier = barrier.clone();
            let interface = if index % 2 == 0 {
                fixture.service.sig()
            } else {
                closed.clone()
            };
            thread::spawn(move || {
                barrier.wait();
                builder.get_proxy_type(&interface)
            })
        })
        .collect();

    let types = handles
        .into_iter()
        .map(|handle| handle.join().expect("worker panicked"))
        .collect::<Result<Vec<_>>>()?;

    assert_eq!(builder.synthesized_count(), 2);
    for pair in types.chunks(2) {
        assert!(Arc::ptr_eq(&pair[0], &types[0]));
        assert!(Arc::ptr_eq(&pair[1], &types[1]));
    }

    Ok(())
}

//! Moves work items from an input queue to an output queue, one pool
//! task per item.
//!
//! Run with `RUST_LOG=debug cargo run --example pipeline`.

use std::{sync::Arc, thread, time::Duration};

use log::debug;
use sqpool::{ConcurrentQueue, PoolError, ThreadPool};

const ITEMS: usize = 100;

struct Foo {
    processed_by: Option<usize>,
}

impl Foo {
    fn do_work(&mut self, n: usize) {
        thread::sleep(Duration::from_millis(100));
        self.processed_by = Some(n);
        debug!("[{n}] processed in {:?}", thread::current().id());
    }
}

fn main() -> Result<(), PoolError> {
    env_logger::init();

    let thread_pool = ThreadPool::new()?;
    let queue_in = Arc::new(ConcurrentQueue::new());
    let queue_out = Arc::new(ConcurrentQueue::new());

    for _ in 0..ITEMS {
        queue_in.push(Box::new(Foo { processed_by: None }));
    }

    for n in 0..ITEMS {
        let queue_in = queue_in.clone();
        let queue_out = queue_out.clone();
        thread_pool.execute(move || {
            if let Some(mut foo) = queue_in.try_pop() {
                foo.do_work(n);
                queue_out.push(foo);
            }
        });
    }

    loop {
        thread::sleep(Duration::from_millis(250));
        println!(
            "queue_in: {}, queue_out: {}",
            queue_in.len(),
            queue_out.len()
        );
        if queue_out.len() == ITEMS {
            break;
        }
    }

    let processed = std::iter::from_fn(|| queue_out.try_pop())
        .filter(|foo| foo.processed_by.is_some())
        .count();
    println!("processed {processed} items, exiting");

    Ok(())
}

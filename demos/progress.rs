//! Submits sleeping tasks that update shared counters and reports
//! progress until every task has completed.
//!
//! Run with `RUST_LOG=info cargo run --example progress`.

use std::{
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
    thread,
    time::Duration,
};

use log::info;
use sqpool::{PoolError, ThreadPool};

const TASKS: usize = 100;
const TASK_SLEEP: Duration = Duration::from_millis(200);

fn main() -> Result<(), PoolError> {
    env_logger::init();

    let thread_pool = ThreadPool::new()?;
    let ongoing = Arc::new(AtomicUsize::new(0));
    let completed = Arc::new(AtomicUsize::new(0));

    for n in 0..TASKS {
        // Spread submissions out to get readable output.
        thread::sleep(Duration::from_millis(5));

        let ongoing = ongoing.clone();
        let completed = completed.clone();
        thread_pool.execute(move || {
            ongoing.fetch_add(1, Ordering::SeqCst);
            info!(
                "[{n}] sleeping for {:?} in {:?}",
                TASK_SLEEP,
                thread::current().id()
            );
            thread::sleep(TASK_SLEEP);
            info!("[{n}] exiting");
            completed.fetch_add(1, Ordering::SeqCst);
            ongoing.fetch_sub(1, Ordering::SeqCst);
        });
    }

    loop {
        let done = completed.load(Ordering::SeqCst);
        println!(
            "ongoing: {}, completed: {done} / {TASKS}",
            ongoing.load(Ordering::SeqCst)
        );
        if done == TASKS {
            println!("finished: {done}");
            break;
        }
        thread::sleep(Duration::from_millis(250));
    }

    Ok(())
}

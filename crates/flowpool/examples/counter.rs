// Counter workflow demo
//
// Registers a tick-counting reactor, drives it with events from a background
// task while observing state updates, then runs a single-shot worker.
// Run with: cargo run --example counter

use std::convert::Infallible;
use std::time::Duration;

use async_trait::async_trait;
use flowpool::prelude::*;

#[derive(Debug, Clone, PartialEq)]
struct Tick;

const COUNTER: WorkflowType<i32, Tick, i32> = WorkflowType::new();
const ADDER: WorkflowType<i32, Infallible, i32> = WorkflowType::new();

struct Counter {
    limit: i32,
}

#[async_trait]
impl Reactor for Counter {
    type State = i32;
    type Event = Tick;
    type Output = i32;

    async fn react(
        &self,
        state: i32,
        ctx: &mut HostContext<i32, Tick>,
        _pool: &WorkflowPool,
    ) -> Result<Reaction<i32, i32>, WorkflowFailure> {
        match ctx.next_event().await {
            Some(Tick) if state + 1 >= self.limit => Ok(Reaction::FinishWith(state + 1)),
            Some(Tick) => Ok(Reaction::EnterState(state + 1)),
            None => Err(WorkflowFailure::new("tick queue closed")),
        }
    }
}

struct AddTen;

#[async_trait]
impl Worker for AddTen {
    type Input = i32;
    type Output = i32;

    async fn run(&self, input: i32) -> Result<i32, WorkflowFailure> {
        Ok(input + 10)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing for logs
    tracing_subscriber::fmt().with_env_filter("debug").init();

    let pool = WorkflowPool::new();
    pool.register(ReactorLauncher::new(Counter { limit: 3 }), COUNTER);

    let mut handle = Handle::new(COUNTER.make_id("demo"), 0);
    let sink = pool.input(&handle);

    let ticker = tokio::spawn(async move {
        for _ in 0..3 {
            tokio::time::sleep(Duration::from_millis(50)).await;
            sink.send_event(Tick);
        }
    });

    // The first update-await launches the instance lazily.
    loop {
        match pool.await_update(handle).await? {
            Update::Running(next) => {
                println!("counter is now {}", next.state);
                handle = next;
            }
            Update::Finished(total) => {
                println!("counter finished at {total}");
                break;
            }
        }
    }
    ticker.await?;
    println!("live instances after completion: {}", pool.count());

    let sum = pool.await_worker_result(AddTen, 32, "add", ADDER).await?;
    println!("worker returned {sum}");

    Ok(())
}

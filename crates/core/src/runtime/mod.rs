//! Single-threaded main context with deferred callbacks
//!
//! All state owned by a [`MainLoop`] is touched from the thread that drives
//! it. Worker threads never see that state: they compute a value and hand it
//! back through the [`Dispatcher`].

mod timer;

use std::collections::BinaryHeap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, mpsc};
use std::thread;
use std::time::{Duration, Instant};
use timer::{Timer, TimerKind};
use tracing::{debug, trace};

/// Callback executed on the main context
pub type Task<S> = Box<dyn FnOnce(&mut S, &Dispatcher<S>) + Send>;

/// Callback executed on every tick of a repeating task
pub type RepeatingTask<S> = Box<dyn FnMut(&mut S, &Dispatcher<S>) + Send>;

enum Message<S> {
    Run(Task<S>),
    After(Instant, Task<S>),
    Repeat {
        interval: Duration,
        handle: RepeatHandle,
        task: RepeatingTask<S>,
    },
    JobDone(Task<S>),
    Stop,
}

/// Cancellation handle of a repeating task.
///
/// Cancelling is idempotent and takes effect before the next tick.
#[derive(Debug, Clone, Default)]
pub struct RepeatHandle {
    cancelled: Arc<AtomicBool>,
}

impl RepeatHandle {
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

/// Cloneable handle for scheduling work onto the main context
pub struct Dispatcher<S> {
    tx: mpsc::Sender<Message<S>>,
    jobs: Arc<AtomicUsize>,
}

impl<S> Clone for Dispatcher<S> {
    fn clone(&self) -> Self {
        Self {
            tx: self.tx.clone(),
            jobs: Arc::clone(&self.jobs),
        }
    }
}

impl<S: 'static> Dispatcher<S> {
    /// Run `task` on the main context as soon as possible
    pub fn post<F>(&self, task: F)
    where
        F: FnOnce(&mut S, &Dispatcher<S>) + Send + 'static,
    {
        self.send(Message::Run(Box::new(task)));
    }

    /// Run `task` on the main context after `delay`
    pub fn post_after<F>(&self, delay: Duration, task: F)
    where
        F: FnOnce(&mut S, &Dispatcher<S>) + Send + 'static,
    {
        self.send(Message::After(Instant::now() + delay, Box::new(task)));
    }

    /// Run `task` immediately and then every `interval` until cancelled
    pub fn repeat<F>(&self, interval: Duration, task: F) -> RepeatHandle
    where
        F: FnMut(&mut S, &Dispatcher<S>) + Send + 'static,
    {
        let handle = RepeatHandle::default();
        self.send(Message::Repeat {
            interval,
            handle: handle.clone(),
            task: Box::new(task),
        });
        handle
    }

    /// Run `work` on a worker thread and pass its result to `then` on the
    /// main context
    pub fn spawn_blocking<T, W, F>(&self, work: W, then: F)
    where
        T: Send + 'static,
        W: FnOnce() -> T + Send + 'static,
        F: FnOnce(&mut S, &Dispatcher<S>, T) + Send + 'static,
    {
        self.jobs.fetch_add(1, Ordering::SeqCst);
        let tx = self.tx.clone();
        let jobs = Arc::clone(&self.jobs);
        let spawned = thread::Builder::new()
            .name("phpcbf-worker".to_string())
            .spawn(move || {
                let value = work();
                let task: Task<S> = Box::new(move |state: &mut S, dispatcher: &Dispatcher<S>| {
                    then(state, dispatcher, value)
                });
                if tx.send(Message::JobDone(task)).is_err() {
                    // Main loop is gone, nobody is waiting for this job
                    jobs.fetch_sub(1, Ordering::SeqCst);
                }
            });
        if let Err(e) = spawned {
            self.jobs.fetch_sub(1, Ordering::SeqCst);
            tracing::error!("Failed to spawn worker thread: {e}");
        }
    }

    /// Ask [`MainLoop::run_forever`] to return
    pub fn stop(&self) {
        self.send(Message::Stop);
    }

    fn send(&self, message: Message<S>) {
        if self.tx.send(message).is_err() {
            debug!("Main loop dropped, discarding task");
        }
    }
}

enum Idleness {
    Idle,
    /// A queued message was handled; it may have scheduled more work
    Handled,
    /// A live timer or background job will produce a message
    Pending,
}

/// Owns the main-context state and executes scheduled tasks on the calling
/// thread.
pub struct MainLoop<S> {
    state: S,
    dispatcher: Dispatcher<S>,
    rx: mpsc::Receiver<Message<S>>,
    timers: BinaryHeap<Timer<S>>,
    sequence: u64,
    stopped: bool,
}

impl<S: 'static> MainLoop<S> {
    pub fn new(state: S) -> Self {
        let (tx, rx) = mpsc::channel();
        Self {
            state,
            dispatcher: Dispatcher {
                tx,
                jobs: Arc::new(AtomicUsize::new(0)),
            },
            rx,
            timers: BinaryHeap::new(),
            sequence: 0,
            stopped: false,
        }
    }

    pub fn dispatcher(&self) -> Dispatcher<S> {
        self.dispatcher.clone()
    }

    pub fn state(&self) -> &S {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut S {
        &mut self.state
    }

    pub fn into_state(self) -> S {
        self.state
    }

    /// Execute a closure against the state with access to the dispatcher,
    /// as if it had been posted and picked up immediately
    pub fn with_state<R>(&mut self, f: impl FnOnce(&mut S, &Dispatcher<S>) -> R) -> R {
        f(&mut self.state, &self.dispatcher)
    }

    /// Drive the loop until no task, live timer or background job remains
    pub fn run_until_idle(&mut self) {
        loop {
            match self.poll_idle() {
                Idleness::Idle => return,
                Idleness::Handled => continue,
                // Only block while something is guaranteed to wake us
                Idleness::Pending => self.turn(),
            }
        }
    }

    /// Drive the loop until [`Dispatcher::stop`] is called
    pub fn run_forever(&mut self) {
        self.stopped = false;
        while !self.stopped {
            self.turn();
        }
    }

    fn poll_idle(&mut self) -> Idleness {
        self.timers.retain(|timer| !timer.is_cancelled());
        if !self.timers.is_empty() || self.dispatcher.jobs.load(Ordering::SeqCst) > 0 {
            return Idleness::Pending;
        }
        match self.rx.try_recv() {
            Ok(message) => {
                self.handle(message);
                Idleness::Handled
            }
            Err(_) => Idleness::Idle,
        }
    }

    /// Wait for the next message or due timer and process it
    fn turn(&mut self) {
        self.fire_due_timers();

        let received = match self.timers.peek().map(Timer::due) {
            Some(at) => {
                let wait = at.saturating_duration_since(Instant::now());
                self.rx.recv_timeout(wait).ok()
            }
            // The loop holds a sender itself, so this only returns once
            // something is sent
            None => self.rx.recv().ok(),
        };

        if let Some(message) = received {
            self.handle(message);
        }
        self.fire_due_timers();
    }

    fn handle(&mut self, message: Message<S>) {
        match message {
            Message::Run(task) => task(&mut self.state, &self.dispatcher),
            Message::JobDone(task) => {
                self.dispatcher.jobs.fetch_sub(1, Ordering::SeqCst);
                task(&mut self.state, &self.dispatcher);
            }
            Message::After(due, task) => {
                self.schedule(due, TimerKind::Once(task));
            }
            Message::Repeat {
                interval,
                handle,
                task,
            } => {
                self.schedule(
                    Instant::now(),
                    TimerKind::Repeat {
                        interval,
                        handle,
                        task,
                    },
                );
            }
            Message::Stop => self.stopped = true,
        }
    }

    fn schedule(&mut self, due: Instant, kind: TimerKind<S>) {
        self.sequence += 1;
        self.timers.push(Timer::new(due, self.sequence, kind));
    }

    fn fire_due_timers(&mut self) {
        let now = Instant::now();
        while self.timers.peek().is_some_and(|timer| timer.due() <= now) {
            let Some(timer) = self.timers.pop() else {
                break;
            };
            match timer.into_kind() {
                TimerKind::Once(task) => task(&mut self.state, &self.dispatcher),
                TimerKind::Repeat {
                    interval,
                    handle,
                    mut task,
                } => {
                    if handle.is_cancelled() {
                        trace!("Dropping cancelled repeating task");
                        continue;
                    }
                    task(&mut self.state, &self.dispatcher);
                    if !handle.is_cancelled() {
                        self.schedule(
                            now + interval,
                            TimerKind::Repeat {
                                interval,
                                handle,
                                task,
                            },
                        );
                    }
                }
            }
        }
    }
}

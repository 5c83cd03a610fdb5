use std::sync::{Arc, Mutex, MutexGuard};
use std::thread;
use std::time::Duration;

/// Formats a number of seconds as `MM:SS`.
pub fn format_clock(secs: u64) -> String {
    format!("{:02}:{:02}", secs / 60, secs % 60)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerEvent {
    Expired,
}

#[derive(Debug, Default)]
struct TimerState {
    total: u64,
    remaining: u64,
    running: bool,
    // Bumped on every start/stop/reset so a sleeping loop from an older run exits.
    generation: u64,
}

type ExpireCallback = Arc<dyn Fn() + Send + Sync>;

/// Countdown ticking on a background thread.
///
/// All state lives behind one mutex. The expiry callback runs on the
/// background thread, after the lock is released, exactly once per run
/// that reaches zero.
pub struct CountdownTimer {
    state: Arc<Mutex<TimerState>>,
    tick: Duration,
    on_expire: ExpireCallback,
}

impl CountdownTimer {
    pub fn new<F>(on_expire: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        Self::with_tick(Duration::from_secs(1), on_expire)
    }

    pub fn with_tick<F>(tick: Duration, on_expire: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        Self {
            state: Arc::new(Mutex::new(TimerState::default())),
            tick,
            on_expire: Arc::new(on_expire),
        }
    }

    fn lock(&self) -> MutexGuard<'_, TimerState> {
        lock_state(&self.state)
    }

    /// Starts counting down from `duration_secs`. No-op while already running.
    pub fn start(&self, duration_secs: u64) {
        let generation = {
            let mut state = self.lock();
            if state.running {
                log::debug!("Timer already running, start ignored");
                return;
            }
            state.total = duration_secs;
            state.remaining = duration_secs;
            state.running = true;
            state.generation += 1;
            state.generation
        };
        log::info!("Timer started: {}", format_clock(duration_secs));
        self.spawn_loop(generation);
    }

    /// Continues ticking from the current remaining time.
    pub fn resume(&self) {
        let generation = {
            let mut state = self.lock();
            if state.running || state.remaining == 0 {
                return;
            }
            state.running = true;
            state.generation += 1;
            state.generation
        };
        self.spawn_loop(generation);
    }

    pub fn stop(&self) {
        let mut state = self.lock();
        if state.running {
            log::info!("Timer stopped at {}", format_clock(state.remaining));
        }
        state.running = false;
        state.generation += 1;
    }

    pub fn reset(&self, duration_secs: u64) {
        let mut state = self.lock();
        state.running = false;
        state.generation += 1;
        state.total = duration_secs;
        state.remaining = duration_secs;
    }

    pub fn remaining(&self) -> String {
        format_clock(self.remaining_secs())
    }

    pub fn remaining_secs(&self) -> u64 {
        self.lock().remaining
    }

    pub fn elapsed_secs(&self) -> u64 {
        let state = self.lock();
        state.total - state.remaining
    }

    pub fn is_running(&self) -> bool {
        self.lock().running
    }

    fn spawn_loop(&self, generation: u64) {
        let state = Arc::clone(&self.state);
        let on_expire = Arc::clone(&self.on_expire);
        let tick = self.tick;

        thread::spawn(move || {
            if countdown(&state, tick, generation) {
                log::info!("Timer expired");
                on_expire();
            }
        });
    }
}

impl Drop for CountdownTimer {
    fn drop(&mut self) {
        let mut state = self.lock();
        state.running = false;
        state.generation += 1;
    }
}

fn lock_state(state: &Mutex<TimerState>) -> MutexGuard<'_, TimerState> {
    // The state stays consistent even if a holder panicked.
    state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Runs the decrement loop. Returns true when this run reached zero.
fn countdown(state: &Mutex<TimerState>, tick: Duration, generation: u64) -> bool {
    loop {
        {
            let mut state = lock_state(state);
            if !state.running || state.generation != generation {
                return false;
            }
            if state.remaining == 0 {
                state.running = false;
                return true;
            }
        }

        thread::sleep(tick);

        let mut state = lock_state(state);
        if !state.running || state.generation != generation {
            return false;
        }
        state.remaining -= 1;
        if state.remaining == 0 {
            state.running = false;
            return true;
        }
    }
}

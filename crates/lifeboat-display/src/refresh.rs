//! Background flip worker.
//!
//! Rendering happens on the caller's thread into a [`Surface`]; pushing that
//! surface through format conversion and out to the device can take longer
//! than a frame, so it runs on a dedicated worker. The worker holds the
//! [`SwapChain`] outright. Callers hand it frames with
//! [`RefreshScheduler::request_refresh`] and may park on
//! [`RefreshScheduler::wait_idle`] when they need the panel up to date, e.g.
//! before prompting for input.
//!
//! Only the most recent frame matters. If the caller stages several frames
//! while a flip is in progress, the intermediate ones are overwritten and
//! never reach the device.

use std::mem;
use std::sync::{Arc, Condvar, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use lifeboat_gfx::Surface;
use lifeboat_types::error::{ConsoleError, Result};

use crate::swap::SwapChain;

struct SharedState {
    /// Frame waiting to be flipped, if any. Kept as an `Option` so the
    /// worker can swap it out and flip without holding the lock.
    staged: Option<Surface>,
    needs_refresh: bool,
    busy: bool,
    shutdown: bool,
}

struct Shared {
    state: Mutex<SharedState>,
    /// Wakes the worker when a frame is staged or shutdown is requested.
    work_cv: Condvar,
    /// Wakes `wait_idle` callers when the worker drains the queue.
    idle_cv: Condvar,
}

/// Owns the worker thread and the staged-frame slot.
///
/// Dropping the scheduler stops the worker and joins it; a frame staged but
/// not yet flipped at that point is discarded.
pub struct RefreshScheduler {
    shared: Arc<Shared>,
    worker: Option<JoinHandle<()>>,
}

impl RefreshScheduler {
    /// Spawns the worker thread and transfers the swap chain to it.
    pub fn spawn(chain: SwapChain) -> Result<Self> {
        let shared = Arc::new(Shared {
            state: Mutex::new(SharedState {
                staged: None,
                needs_refresh: false,
                busy: false,
                shutdown: false,
            }),
            work_cv: Condvar::new(),
            idle_cv: Condvar::new(),
        });

        let worker_shared = Arc::clone(&shared);
        let worker = thread::Builder::new()
            .name("lifeboat-refresh".into())
            .spawn(move || worker_loop(worker_shared, chain))
            .map_err(ConsoleError::Io)?;

        Ok(Self {
            shared,
            worker: Some(worker),
        })
    }

    /// Stages a copy of `frame` for the next flip.
    ///
    /// Returns immediately; the flip happens on the worker thread. Staging
    /// while a previous frame is still waiting replaces it.
    pub fn request_refresh(&self, frame: &Surface) {
        let mut state = self.shared.state.lock().unwrap();
        match state.staged.as_mut() {
            Some(staged) => staged.copy_from(frame),
            None => state.staged = Some(frame.clone()),
        }
        state.needs_refresh = true;
        drop(state);
        self.shared.work_cv.notify_one();
    }

    /// Blocks until every staged frame has been flipped, or `timeout`
    /// elapses. Returns `true` if the worker went idle in time.
    pub fn wait_idle(&self, timeout: Duration) -> bool {
        let state = self.shared.state.lock().unwrap();
        let (state, result) = self
            .shared
            .idle_cv
            .wait_timeout_while(state, timeout, |s| s.needs_refresh || s.busy)
            .unwrap();
        drop(state);
        !result.timed_out()
    }
}

impl Drop for RefreshScheduler {
    fn drop(&mut self) {
        {
            let mut state = self.shared.state.lock().unwrap();
            state.shutdown = true;
        }
        self.shared.work_cv.notify_one();
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}

fn worker_loop(shared: Arc<Shared>, mut chain: SwapChain) {
    // Local frame buffer; swapped with the staged slot so neither side
    // allocates once both surfaces exist.
    let mut frame: Option<Surface> = None;

    loop {
        {
            let mut state = shared.state.lock().unwrap();
            state = shared
                .work_cv
                .wait_while(state, |s| !s.needs_refresh && !s.shutdown)
                .unwrap();
            if state.shutdown {
                return;
            }
            state.needs_refresh = false;
            state.busy = true;
            mem::swap(&mut state.staged, &mut frame);
        }

        if let Some(frame) = frame.as_ref()
            && let Err(err) = chain.flip(frame)
        {
            log::error!("display flip failed: {err}");
        }

        let mut state = shared.state.lock().unwrap();
        state.busy = false;
        if !state.needs_refresh {
            shared.idle_cv.notify_all();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use lifeboat_types::color::Color;
    use lifeboat_types::pixel::Rotation;

    use crate::memory::{MemoryDisplay, SharedMemoryDisplay};

    const IDLE_WAIT: Duration = Duration::from_secs(5);

    fn scheduler(width: u32, height: u32) -> (RefreshScheduler, SharedMemoryDisplay) {
        let display = SharedMemoryDisplay::new(MemoryDisplay::rgb565(width, height));
        let chain = SwapChain::new(Box::new(display.clone()), Rotation::None);
        let scheduler = RefreshScheduler::spawn(chain).unwrap();
        (scheduler, display)
    }

    #[test]
    fn staged_frame_reaches_the_device() {
        let (scheduler, display) = scheduler(4, 2);

        let mut frame = Surface::new(4, 2);
        frame.clear(Color::rgb(255, 0, 0));
        scheduler.request_refresh(&frame);

        assert!(scheduler.wait_idle(IDLE_WAIT));
        display.with(|d| {
            assert!(d.flip_count() >= 1);
            let visible = d.visible();
            // Pure red in RGB565, little-endian.
            assert_eq!(&visible[..2], &[0x00, 0xF8]);
        });
    }

    #[test]
    fn rapid_requests_keep_only_the_last_frame() {
        let (scheduler, display) = scheduler(2, 2);

        let mut frame = Surface::new(2, 2);
        for step in 0u8..20 {
            frame.clear(Color::rgb(step * 10, 0, 0));
            scheduler.request_refresh(&frame);
        }

        assert!(scheduler.wait_idle(IDLE_WAIT));
        display.with(|d| {
            // Some intermediates may land, but never more flips than
            // requests, and the final frame always does.
            assert!(d.flip_count() <= 20);
            let visible = d.visible();
            let red = u16::from_le_bytes([visible[0], visible[1]]) >> 11;
            // 190 truncates to 23 in the 5-bit channel.
            assert_eq!(red, 23);
        });
    }

    #[test]
    fn wait_idle_times_out_without_hanging() {
        let (scheduler, _display) = scheduler(2, 2);
        // Nothing staged: already idle.
        assert!(scheduler.wait_idle(Duration::from_millis(10)));
    }

    #[test]
    fn drop_joins_the_worker() {
        let (scheduler, display) = scheduler(2, 2);
        let mut frame = Surface::new(2, 2);
        frame.clear(Color::rgb(0, 255, 0));
        scheduler.request_refresh(&frame);
        drop(scheduler);
        // No assertion on flip count: drop may win the race with the
        // worker. The point is that drop returned with the thread joined.
        display.with(|d| assert!(d.flip_count() <= 1));
    }
}

//! Self-rotating informational display.
//!
//! [`Rotation`] is the index arithmetic; [`RotationTimer`] is a single
//! cancellable one-shot timer; [`RotatingDisplay`] ties them together so
//! that every index change re-arms exactly one timer and dropping the
//! display leaves nothing running.
//!
//! Timer fires are delivered through a caller-supplied wake callback rather
//! than mutating the display directly: the owner (a card component living
//! on the UI loop) routes the wake back to [`RotatingDisplay::on_timer`].
//! Each arm bumps a generation number, and a wake carrying a stale
//! generation is ignored.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::trace;

/// Default rotation period.
pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(5);

// ── Rotation ─────────────────────────────────────────────────────────

/// Cycling cursor over the present items of an optional list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rotation<T> {
    items: Vec<T>,
    index: usize,
}

impl<T> Default for Rotation<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            index: 0,
        }
    }
}

impl<T> Rotation<T> {
    pub fn new(nodes: impl IntoIterator<Item = Option<T>>) -> Self {
        Self {
            items: nodes.into_iter().flatten().collect(),
            index: 0,
        }
    }

    /// Replace the items. The index is kept, reduced modulo the new length.
    pub fn set_items(&mut self, nodes: impl IntoIterator<Item = Option<T>>) {
        self.items = nodes.into_iter().flatten().collect();
        self.index = if self.items.is_empty() {
            0
        } else {
            self.index % self.items.len()
        };
    }

    /// Step forward, wrapping. Returns whether the index moved.
    pub fn advance(&mut self) -> bool {
        if self.items.len() < 2 {
            return false;
        }
        self.index = (self.index + 1) % self.items.len();
        true
    }

    pub fn current(&self) -> Option<&T> {
        self.items.get(self.index)
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Whether there is anything to rotate between.
    pub fn rotates(&self) -> bool {
        self.items.len() > 1
    }
}

// ── RotationTimer ────────────────────────────────────────────────────

/// One-shot cancellable timer. Arming cancels the previous arm.
#[derive(Debug, Default)]
pub struct RotationTimer {
    armed: Option<CancellationToken>,
    generation: u64,
}

impl RotationTimer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cancel any pending fire and schedule `on_fire(generation)` after
    /// `after`. Must be called from within a tokio runtime.
    pub fn arm<F>(&mut self, after: Duration, on_fire: F) -> u64
    where
        F: FnOnce(u64) + Send + 'static,
    {
        self.disarm();
        self.generation = self.generation.wrapping_add(1);
        let generation = self.generation;

        let token = CancellationToken::new();
        let task_token = token.clone();
        tokio::spawn(async move {
            tokio::select! {
                () = task_token.cancelled() => {}
                () = tokio::time::sleep(after) => {
                    // A cancel racing the sleep wins.
                    if !task_token.is_cancelled() {
                        on_fire(generation);
                    }
                }
            }
        });

        self.armed = Some(token);
        trace!(generation, ?after, "rotation timer armed");
        generation
    }

    /// Cancel the pending fire, if any.
    pub fn disarm(&mut self) {
        if let Some(token) = self.armed.take() {
            token.cancel();
            trace!(generation = self.generation, "rotation timer disarmed");
        }
    }

    pub fn is_armed(&self) -> bool {
        self.armed.is_some()
    }

    /// Generation of the most recent arm.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Whether a wake carrying `generation` comes from the live arm.
    pub fn is_current(&self, generation: u64) -> bool {
        self.is_armed() && generation == self.generation
    }
}

impl Drop for RotationTimer {
    fn drop(&mut self) {
        self.disarm();
    }
}

// ── RotatingDisplay ──────────────────────────────────────────────────

/// Callback invoked on the timer task with the firing generation.
pub type Wake = Arc<dyn Fn(u64) + Send + Sync>;

/// Rotation plus its timer, with the re-arm rules applied.
pub struct RotatingDisplay<T> {
    rotation: Rotation<T>,
    timer: RotationTimer,
    interval: Duration,
    wake: Wake,
}

impl<T: fmt::Debug> fmt::Debug for RotatingDisplay<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RotatingDisplay")
            .field("rotation", &self.rotation)
            .field("timer", &self.timer)
            .field("interval", &self.interval)
            .finish_non_exhaustive()
    }
}

impl<T> RotatingDisplay<T> {
    /// Mount with an initial node list. Arms the timer when there is
    /// something to rotate.
    pub fn new(
        interval: Duration,
        nodes: impl IntoIterator<Item = Option<T>>,
        wake: Wake,
    ) -> Self {
        let mut display = Self {
            rotation: Rotation::new(nodes),
            timer: RotationTimer::new(),
            interval,
            wake,
        };
        display.rearm();
        display
    }

    /// Replace the node list. The timer keeps running unless the list
    /// stopped (or started) rotating, or the index moved.
    pub fn set_items(&mut self, nodes: impl IntoIterator<Item = Option<T>>) {
        let before = self.rotation.index();
        self.rotation.set_items(nodes);

        let needs_timer = self.rotation.rotates();
        if needs_timer != self.timer.is_armed() || before != self.rotation.index() {
            self.rearm();
        }
    }

    /// Manual advance (user interaction with the display region).
    pub fn advance(&mut self) -> bool {
        let moved = self.rotation.advance();
        if moved {
            self.rearm();
        }
        moved
    }

    /// Handle a timer wake. Stale generations are ignored. Returns whether
    /// the index moved.
    pub fn on_timer(&mut self, generation: u64) -> bool {
        if !self.timer.is_current(generation) {
            trace!(generation, current = self.timer.generation(), "stale rotation wake");
            return false;
        }
        // The fire consumed this arm.
        self.timer.disarm();
        let moved = self.rotation.advance();
        self.rearm();
        moved
    }

    pub fn current(&self) -> Option<&T> {
        self.rotation.current()
    }

    pub fn index(&self) -> usize {
        self.rotation.index()
    }

    pub fn len(&self) -> usize {
        self.rotation.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rotation.is_empty()
    }

    pub fn is_timer_armed(&self) -> bool {
        self.timer.is_armed()
    }

    fn rearm(&mut self) {
        if self.rotation.rotates() {
            let wake = Arc::clone(&self.wake);
            self.timer.arm(self.interval, move |generation| wake(generation));
        } else {
            self.timer.disarm();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::sync::mpsc;

    #[test]
    fn filters_absent_nodes() {
        let r = Rotation::new([Some("a"), None, Some("c")]);
        assert_eq!(r.len(), 2);
        assert_eq!(r.current(), Some(&"a"));
    }

    #[test]
    fn advance_wraps() {
        let mut r = Rotation::new([Some(1), Some(2), Some(3)]);
        r.advance();
        r.advance();
        assert_eq!(r.index(), 2);
        r.advance();
        assert_eq!(r.index(), 0);
    }

    #[test]
    fn shrinking_list_keeps_index_in_bounds() {
        let mut r = Rotation::new([Some(1), Some(2), Some(3)]);
        r.advance();
        r.advance();
        r.set_items([Some(1), Some(2)]);
        assert_eq!(r.index(), 0);
        assert_eq!(r.current(), Some(&1));
    }

    #[test]
    fn single_item_does_not_rotate() {
        let mut r = Rotation::new([None, Some("only")]);
        assert!(!r.advance());
        assert_eq!(r.current(), Some(&"only"));
    }

    #[tokio::test(start_paused = true)]
    async fn rearming_cancels_the_previous_timer() {
        let fired = Arc::new(AtomicUsize::new(0));
        let mut timer = RotationTimer::new();

        for _ in 0..3 {
            let fired = Arc::clone(&fired);
            timer.arm(Duration::from_secs(5), move |_| {
                fired.fetch_add(1, Ordering::SeqCst);
            });
        }

        tokio::time::sleep(Duration::from_secs(6)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 1);
        assert_eq!(timer.generation(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn dropped_timer_never_fires() {
        let fired = Arc::new(AtomicUsize::new(0));
        {
            let fired = Arc::clone(&fired);
            let mut timer = RotationTimer::new();
            timer.arm(Duration::from_secs(5), move |_| {
                fired.fetch_add(1, Ordering::SeqCst);
            });
        }

        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 0);
    }

    fn channel_wake() -> (Wake, mpsc::UnboundedReceiver<u64>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let wake: Wake = Arc::new(move |generation| {
            let _ = tx.send(generation);
        });
        (wake, rx)
    }

    #[tokio::test(start_paused = true)]
    async fn two_snippets_rotate_every_interval() {
        let (wake, mut rx) = channel_wake();
        let mut display = RotatingDisplay::new(DEFAULT_INTERVAL, [Some('A'), Some('B')], wake);
        assert_eq!(display.current(), Some(&'A'));
        assert!(display.is_timer_armed());

        let generation = rx.recv().await.expect("first wake");
        assert!(display.on_timer(generation));
        assert_eq!(display.index(), 1);

        let generation = rx.recv().await.expect("second wake");
        assert!(display.on_timer(generation));
        assert_eq!(display.index(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn manual_advance_invalidates_pending_wake() {
        let (wake, mut rx) = channel_wake();
        let mut display = RotatingDisplay::new(DEFAULT_INTERVAL, [Some(1), Some(2), Some(3)], wake);
        let first_generation = display.timer.generation();

        assert!(display.advance());
        assert_eq!(display.index(), 1);
        assert!(!display.on_timer(first_generation));

        let generation = rx.recv().await.expect("wake after manual advance");
        assert_ne!(generation, first_generation);
        assert!(display.on_timer(generation));
        assert_eq!(display.index(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn emptying_the_list_disarms() {
        let (wake, mut rx) = channel_wake();
        let mut display = RotatingDisplay::new(DEFAULT_INTERVAL, [Some(1), Some(2)], wake);

        display.set_items(Vec::<Option<i32>>::new());
        assert!(display.is_empty());
        assert!(display.current().is_none());
        assert!(!display.is_timer_armed());

        tokio::time::sleep(Duration::from_secs(30)).await;
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn snippet_appearing_starts_rotation() {
        let (wake, mut rx) = channel_wake();
        let mut display = RotatingDisplay::new(DEFAULT_INTERVAL, [Some("updated"), None], wake);
        assert!(!display.is_timer_armed());

        display.set_items([Some("updated"), Some("expires")]);
        assert!(display.is_timer_armed());
        let generation = rx.recv().await.expect("wake");
        assert!(display.on_timer(generation));
        assert_eq!(display.current(), Some(&"expires"));
    }

    #[tokio::test(start_paused = true)]
    async fn unmount_leaves_no_live_timer() {
        let (wake, mut rx) = channel_wake();
        let mut display = RotatingDisplay::new(DEFAULT_INTERVAL, [Some(1), Some(2)], wake);
        display.advance();
        drop(display);

        tokio::time::sleep(Duration::from_secs(30)).await;
        assert!(rx.try_recv().is_err());
    }
}

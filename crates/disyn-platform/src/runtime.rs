//! Two-task runtime on OS threads.
//!
//! [`spawn`] moves an [`AudioTask`] onto a thread named `disyn-audio` and a
//! [`ControlSurface`] onto `disyn-control`. The two share nothing but a
//! parameter mailbox, a status mailbox, and the stop flag. The audio
//! thread ticks as fast as its output boundary accepts blocks; the control
//! thread polls its surface once per control period.
//!
//! ```rust
//! use std::time::Duration;
//!
//! use disyn_platform::runtime::{self, FixedControl};
//! use disyn_platform::{AudioTask, DspConfig, FixedGate, NullOutput, ParameterSnapshot};
//!
//! let task = AudioTask::new(DspConfig::default(), NullOutput::default(), FixedGate::new(true));
//! let control = FixedControl::new(ParameterSnapshot::default());
//! let rt = runtime::spawn(task, control, Duration::from_millis(1)).unwrap();
//! std::thread::sleep(Duration::from_millis(20));
//! let task = rt.stop().unwrap();
//! assert!(task.ticks() > 0);
//! ```

use std::io;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crate::audio_task::AudioTask;
use crate::boundary::{AudioOutput, GateIo};
use crate::mailbox::{Inbox, Outbox, mailbox};
use crate::snapshot::{ParameterSnapshot, StatusSnapshot};

/// Name of the audio thread.
pub const AUDIO_THREAD: &str = "disyn-audio";
/// Name of the control thread.
pub const CONTROL_THREAD: &str = "disyn-control";

/// Producer of parameter snapshots, run on the control thread.
pub trait ControlSurface: Send {
    /// Called once per control period. Return a snapshot to hand to the
    /// audio task, or `None` when nothing changed.
    fn poll(&mut self) -> Option<ParameterSnapshot>;

    /// Called with each status the audio task published since the last
    /// period.
    fn on_status(&mut self, _status: StatusSnapshot) {}
}

impl<F> ControlSurface for F
where
    F: FnMut() -> Option<ParameterSnapshot> + Send,
{
    fn poll(&mut self) -> Option<ParameterSnapshot> {
        self()
    }
}

/// Surface that publishes one snapshot and then stays quiet.
#[derive(Debug, Clone)]
pub struct FixedControl {
    snapshot: ParameterSnapshot,
    sent: bool,
    last_status: Option<StatusSnapshot>,
}

impl FixedControl {
    /// Publish `snapshot` on the first poll.
    pub fn new(snapshot: ParameterSnapshot) -> Self {
        Self {
            snapshot,
            sent: false,
            last_status: None,
        }
    }
}

impl ControlSurface for FixedControl {
    fn poll(&mut self) -> Option<ParameterSnapshot> {
        if self.sent {
            None
        } else {
            self.sent = true;
            Some(self.snapshot)
        }
    }

    fn on_status(&mut self, status: StatusSnapshot) {
        if self.last_status.is_some_and(|last| last.underruns != status.underruns) {
            report_underruns(status);
        }
        self.last_status = Some(status);
    }
}

#[cfg(feature = "tracing")]
fn report_underruns(status: StatusSnapshot) {
    tracing::warn!(underruns = status.underruns, audio_ok = status.audio_ok, "audio underrun");
}

#[cfg(not(feature = "tracing"))]
fn report_underruns(_status: StatusSnapshot) {}

/// Handles to the two running threads.
#[derive(Debug)]
pub struct Runtime<O, G> {
    stop: Arc<AtomicBool>,
    audio: JoinHandle<AudioTask<O, G>>,
    control: JoinHandle<()>,
}

/// Start the audio and control threads.
///
/// The audio thread calls [`AudioTask::init`] before its first tick; an
/// init failure is carried in the task's status rather than ending the
/// thread.
pub fn spawn<O, G, C>(
    mut task: AudioTask<O, G>,
    mut surface: C,
    control_period: Duration,
) -> io::Result<Runtime<O, G>>
where
    O: AudioOutput + Send + 'static,
    G: GateIo + Send + 'static,
    C: ControlSurface + 'static,
{
    let stop = Arc::new(AtomicBool::new(false));
    let (mut param_tx, mut param_rx) = mailbox::<ParameterSnapshot>();
    let (mut status_tx, mut status_rx) = mailbox::<StatusSnapshot>();

    let audio_stop = Arc::clone(&stop);
    let audio = thread::Builder::new()
        .name(AUDIO_THREAD.into())
        .spawn(move || {
            // Failure is recorded in the published status.
            let _ = task.init();
            while !audio_stop.load(Ordering::Relaxed) {
                task.tick(&mut param_rx, &mut status_tx);
            }
            task
        })?;

    let control_stop = Arc::clone(&stop);
    let control = thread::Builder::new()
        .name(CONTROL_THREAD.into())
        .spawn(move || {
            while !control_stop.load(Ordering::Relaxed) {
                if let Some(status) = status_rx.try_take() {
                    surface.on_status(status);
                }
                if let Some(snapshot) = surface.poll() {
                    param_tx.publish(snapshot);
                }
                thread::sleep(control_period);
            }
        });

    let control = match control {
        Ok(handle) => handle,
        Err(err) => {
            stop.store(true, Ordering::Relaxed);
            let _ = audio.join();
            return Err(err);
        }
    };

    #[cfg(feature = "tracing")]
    tracing::info!(?control_period, "audio and control threads started");

    Ok(Runtime {
        stop,
        audio,
        control,
    })
}

impl<O: AudioOutput, G: GateIo> Runtime<O, G> {
    /// Shared stop flag; storing `true` ends both loops.
    pub fn stop_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.stop)
    }

    /// True once either thread has exited.
    pub fn is_finished(&self) -> bool {
        self.audio.is_finished() || self.control.is_finished()
    }

    /// Raise the stop flag and wait for both threads.
    pub fn stop(self) -> thread::Result<AudioTask<O, G>> {
        self.stop.store(true, Ordering::Relaxed);
        self.join()
    }

    /// Wait for both threads without raising the stop flag. Returns the
    /// audio task so the caller can recover its boundaries.
    pub fn join(self) -> thread::Result<AudioTask<O, G>> {
        let control = self.control.join();
        let task = self.audio.join()?;
        control?;
        #[cfg(feature = "tracing")]
        tracing::info!(ticks = task.ticks(), underruns = task.status().underruns, "runtime stopped");
        Ok(task)
    }
}

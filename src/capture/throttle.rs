use crate::camera::FrameProvider;
use crate::detector::{Analysis, DetectionAdapter};
use crate::error::CaptureError;
use crate::frame::FrameData;
use crate::game::RoundTicket;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, trace};

/// Gate in front of the detector: at most one analysis in flight.
///
/// The busy flag is held by a guard that travels with the [`CaptureReport`], so it
/// stays set until the report has been consumed.
#[derive(Clone)]
pub struct CaptureThrottle {
    busy: Arc<AtomicBool>,
    adapter: DetectionAdapter,
    confidence_threshold: f64,
}

impl CaptureThrottle {
    pub fn new(adapter: DetectionAdapter, confidence_threshold: f64) -> Self {
        Self {
            busy: Arc::new(AtomicBool::new(false)),
            adapter,
            confidence_threshold,
        }
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::SeqCst)
    }

    /// Claim the throttle and take a frame for `round`.
    ///
    /// Returns `Ok(None)` without touching the camera when busy or when no round is active.
    pub fn begin(
        &self,
        round: Option<RoundTicket>,
        provider: &dyn FrameProvider,
    ) -> Result<Option<PendingCapture>, CaptureError> {
        let Some(ticket) = round else {
            trace!("No active round, capture skipped");
            return Ok(None);
        };

        if self
            .busy
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            debug!("Analysis already in flight, capture dropped");
            return Ok(None);
        }
        let guard = BusyGuard(Arc::clone(&self.busy));

        let Some(frame) = provider.snapshot() else {
            drop(guard);
            return Err(CaptureError::NoFrameAvailable);
        };

        debug!(
            "Captured frame {} for round {} ('{}')",
            frame.id, ticket.round, ticket.target
        );

        Ok(Some(PendingCapture {
            ticket,
            frame,
            adapter: self.adapter.clone(),
            confidence_threshold: self.confidence_threshold,
            guard,
        }))
    }

    /// Capture and analyze in one step
    pub async fn request_capture(
        &self,
        round: Option<RoundTicket>,
        provider: &dyn FrameProvider,
    ) -> Result<Option<CaptureReport>, CaptureError> {
        match self.begin(round, provider)? {
            Some(pending) => Ok(Some(pending.run().await)),
            None => Ok(None),
        }
    }
}

/// A claimed capture waiting for its detector round-trip
pub struct PendingCapture {
    ticket: RoundTicket,
    frame: FrameData,
    adapter: DetectionAdapter,
    confidence_threshold: f64,
    guard: BusyGuard,
}

impl PendingCapture {
    pub fn ticket(&self) -> &RoundTicket {
        &self.ticket
    }

    pub fn frame_id(&self) -> u64 {
        self.frame.id
    }

    pub async fn run(self) -> CaptureReport {
        let analysis = self
            .adapter
            .analyze(&self.frame, &self.ticket.target, self.confidence_threshold)
            .await;

        CaptureReport {
            ticket: self.ticket,
            frame_id: self.frame.id,
            analysis,
            _guard: self.guard,
        }
    }
}

/// Detector outcome for one capture. Dropping it releases the throttle.
pub struct CaptureReport {
    pub ticket: RoundTicket,
    pub frame_id: u64,
    pub analysis: Analysis,
    _guard: BusyGuard,
}

impl std::fmt::Debug for CaptureReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CaptureReport")
            .field("ticket", &self.ticket)
            .field("frame_id", &self.frame_id)
            .field("analysis", &self.analysis)
            .finish()
    }
}

struct BusyGuard(Arc<AtomicBool>);

impl Drop for BusyGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

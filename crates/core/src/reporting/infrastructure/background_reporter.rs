use std::thread::JoinHandle;

use crossbeam_channel::{Sender, TrySendError};

use crate::reporting::domain::count_reporter::{CountReport, CountReporter, GenderReport};

const DEFAULT_QUEUE_CAPACITY: usize = 8;

enum ReportMessage {
    Counts(CountReport),
    Gender(GenderReport),
    Frame(Vec<u8>),
}

impl ReportMessage {
    fn kind(&self) -> &'static str {
        match self {
            ReportMessage::Counts(_) => "count",
            ReportMessage::Gender(_) => "gender",
            ReportMessage::Frame(_) => "frame",
        }
    }
}

/// Decorator that moves reporting off the frame loop.
///
/// Reports are queued to a worker thread that owns the inner reporter. When
/// the queue is full the report is dropped, so a slow or unreachable
/// dashboard never stalls frame processing. Inner failures are logged on the
/// worker and never surface to the caller.
pub struct BackgroundReporter {
    sender: Option<Sender<ReportMessage>>,
    handle: Option<JoinHandle<()>>,
}

impl BackgroundReporter {
    pub fn new(inner: Box<dyn CountReporter>) -> Self {
        Self::with_capacity(inner, DEFAULT_QUEUE_CAPACITY)
    }

    pub fn with_capacity(inner: Box<dyn CountReporter>, capacity: usize) -> Self {
        let (sender, receiver) = crossbeam_channel::bounded(capacity.max(1));
        let handle = spawn_worker(inner, receiver);
        Self {
            sender: Some(sender),
            handle: Some(handle),
        }
    }

    fn enqueue(&mut self, message: ReportMessage) -> Result<(), Box<dyn std::error::Error>> {
        let Some(sender) = &self.sender else {
            return Err("Reporter already shut down".into());
        };
        match sender.try_send(message) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(message)) => {
                log::debug!("Report queue full, dropping {} report", message.kind());
                Ok(())
            }
            Err(TrySendError::Disconnected(_)) => Err("Reporter worker stopped".into()),
        }
    }

    /// Flushes queued reports and joins the worker.
    pub fn shutdown(&mut self) {
        self.sender.take();
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                log::warn!("Reporter thread panicked");
            }
        }
    }
}

impl Drop for BackgroundReporter {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl CountReporter for BackgroundReporter {
    fn report_counts(&mut self, report: &CountReport) -> Result<(), Box<dyn std::error::Error>> {
        self.enqueue(ReportMessage::Counts(*report))
    }

    fn report_gender(&mut self, report: &GenderReport) -> Result<(), Box<dyn std::error::Error>> {
        self.enqueue(ReportMessage::Gender(report.clone()))
    }

    fn report_frame(&mut self, jpeg: Vec<u8>) -> Result<(), Box<dyn std::error::Error>> {
        self.enqueue(ReportMessage::Frame(jpeg))
    }
}

fn spawn_worker(
    mut inner: Box<dyn CountReporter>,
    receiver: crossbeam_channel::Receiver<ReportMessage>,
) -> JoinHandle<()> {
    std::thread::spawn(move || {
        let mut failing = false;
        for message in receiver {
            let kind = message.kind();
            let result = match message {
                ReportMessage::Counts(report) => inner.report_counts(&report),
                ReportMessage::Gender(report) => inner.report_gender(&report),
                ReportMessage::Frame(jpeg) => inner.report_frame(jpeg),
            };
            match result {
                Ok(()) if failing => {
                    log::info!("Dashboard reachable again");
                    failing = false;
                }
                Ok(()) => {}
                Err(e) if !failing => {
                    log::warn!("Failed to send {kind} report: {e}");
                    failing = true;
                }
                Err(e) => log::debug!("Failed to send {kind} report: {e}"),
            }
        }
    })
}

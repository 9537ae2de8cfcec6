//! Audit stream: verification records and controller notices.
//!
//! The station forwards every [`VerificationRecord`] and a notice for each
//! controller phase to an [`AuditSink`]. Sinks are best effort. A failing
//! sink is reported at WARN and never changes a command's outcome.

use std::fmt;
use std::sync::Arc;

use crossbeam_channel::{Receiver, Sender, TrySendError};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use interlock_core::{Command, EntityRef, StationTime, VerificationRecord};

// ── Notices ───────────────────────────────────────────────────────

/// The controller that owns a command's subject.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Controller {
    /// Owns the track table.
    TrackManager,
    /// Owns the signal table.
    SignalController,
    /// Owns the gate table.
    GateController,
}

impl Controller {
    /// The controller responsible for `command`.
    pub fn for_command(command: &Command) -> Self {
        match command.subject() {
            EntityRef::Signal(_) => Self::SignalController,
            EntityRef::Gate(_) => Self::GateController,
            EntityRef::Track(_) | EntityRef::Train(_) => Self::TrackManager,
        }
    }
}

impl fmt::Display for Controller {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::TrackManager => "track manager",
            Self::SignalController => "signal controller",
            Self::GateController => "gate controller",
        })
    }
}

/// Phase of a controller command.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticePhase {
    /// The command was received.
    Attempted,
    /// The command was committed.
    Succeeded,
    /// The command was refused.
    Blocked,
}

/// A controller-level event, coarser than a verification record.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControllerNotice {
    /// What happened.
    pub phase: NoticePhase,
    /// Which controller.
    pub controller: Controller,
    /// The command concerned.
    pub command: Command,
    /// Station clock.
    pub at: StationTime,
    /// Outcome text for `Succeeded` and `Blocked`; empty otherwise.
    pub detail: String,
}

impl fmt::Display for ControllerNotice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {:?}: {}", self.at, self.controller, self.phase, self.command)?;
        if !self.detail.is_empty() {
            write!(f, " ({})", self.detail)?;
        }
        Ok(())
    }
}

// ── AuditSink ─────────────────────────────────────────────────────

/// Failure to deliver an audit event.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum AuditError {
    /// The consumer has gone away.
    #[error("audit consumer disconnected")]
    Disconnected,
    /// A bounded channel is full.
    #[error("audit channel full")]
    Full,
    /// Any other sink-specific failure.
    #[error("audit sink failed: {0}")]
    Sink(String),
}

/// Receiver of the audit stream.
pub trait AuditSink {
    /// Deliver one verification record, in log order.
    fn append(&mut self, record: &VerificationRecord) -> Result<(), AuditError>;

    /// Deliver one controller notice. Ignored by default.
    fn notice(&mut self, notice: &ControllerNotice) -> Result<(), AuditError> {
        let _ = notice;
        Ok(())
    }
}

impl<S: AuditSink + ?Sized> AuditSink for Box<S> {
    fn append(&mut self, record: &VerificationRecord) -> Result<(), AuditError> {
        (**self).append(record)
    }

    fn notice(&mut self, notice: &ControllerNotice) -> Result<(), AuditError> {
        (**self).notice(notice)
    }
}

/// Discards everything.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullSink;

impl AuditSink for NullSink {
    fn append(&mut self, _record: &VerificationRecord) -> Result<(), AuditError> {
        Ok(())
    }
}

#[derive(Debug, Default)]
struct MemoryLog {
    records: Vec<VerificationRecord>,
    notices: Vec<ControllerNotice>,
}

/// Keeps everything in memory behind a shared handle.
///
/// Clones share storage, so a test can keep one clone and hand the other to
/// a station.
#[derive(Clone, Debug, Default)]
pub struct MemorySink {
    inner: Arc<Mutex<MemoryLog>>,
}

impl MemorySink {
    /// An empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records received so far.
    pub fn records(&self) -> Vec<VerificationRecord> {
        self.inner.lock().records.clone()
    }

    /// Notices received so far.
    pub fn notices(&self) -> Vec<ControllerNotice> {
        self.inner.lock().notices.clone()
    }
}

impl AuditSink for MemorySink {
    fn append(&mut self, record: &VerificationRecord) -> Result<(), AuditError> {
        self.inner.lock().records.push(record.clone());
        Ok(())
    }

    fn notice(&mut self, notice: &ControllerNotice) -> Result<(), AuditError> {
        self.inner.lock().notices.push(notice.clone());
        Ok(())
    }
}

/// One event on an audit channel.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum AuditEvent {
    /// A verification record.
    Record(VerificationRecord),
    /// A controller notice.
    Notice(ControllerNotice),
}

/// Forwards events to an out-of-thread consumer.
///
/// Sends never block. On a bounded channel that is full the event is
/// dropped and [`AuditError::Full`] returned.
#[derive(Clone, Debug)]
pub struct ChannelSink {
    tx: Sender<AuditEvent>,
}

impl ChannelSink {
    /// Wrap an existing sender.
    pub fn new(tx: Sender<AuditEvent>) -> Self {
        Self { tx }
    }

    /// A sink on a fresh unbounded channel, with its receiver.
    pub fn unbounded() -> (Self, Receiver<AuditEvent>) {
        let (tx, rx) = crossbeam_channel::unbounded();
        (Self { tx }, rx)
    }

    /// A sink on a fresh channel holding at most `cap` events.
    pub fn bounded(cap: usize) -> (Self, Receiver<AuditEvent>) {
        let (tx, rx) = crossbeam_channel::bounded(cap);
        (Self { tx }, rx)
    }

    fn send(&self, event: AuditEvent) -> Result<(), AuditError> {
        self.tx.try_send(event).map_err(|e| match e {
            TrySendError::Full(_) => AuditError::Full,
            TrySendError::Disconnected(_) => AuditError::Disconnected,
        })
    }
}

impl AuditSink for ChannelSink {
    fn append(&mut self, record: &VerificationRecord) -> Result<(), AuditError> {
        self.send(AuditEvent::Record(record.clone()))
    }

    fn notice(&mut self, notice: &ControllerNotice) -> Result<(), AuditError> {
        self.send(AuditEvent::Notice(notice.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use interlock_core::{Aspect, DecidedBy, Outcome, Seq, SignalId, TrackId};

    fn record(seq: u64) -> VerificationRecord {
        let command = Command::SetSignal {
            signal: SignalId::from("S1"),
            aspect: Aspect::Yellow,
        };
        VerificationRecord {
            seq: Seq(seq),
            at: StationTime(0),
            subject: command.subject(),
            command,
            outcome: Outcome::Safe,
            decided_by: DecidedBy::Verifier,
        }
    }

    fn notice(phase: NoticePhase) -> ControllerNotice {
        let command = Command::ReleaseTrack {
            track: TrackId::from("P1"),
        };
        ControllerNotice {
            phase,
            controller: Controller::for_command(&command),
            command,
            at: StationTime(5),
            detail: String::new(),
        }
    }

    #[test]
    fn controllers_follow_subjects() {
        let n = notice(NoticePhase::Attempted);
        assert_eq!(n.controller, Controller::TrackManager);
        assert_eq!(
            Controller::for_command(&record(1).command),
            Controller::SignalController
        );
    }

    #[test]
    fn memory_sink_clones_share_storage() {
        let sink_handle = MemorySink::new();
        let mut sink: Box<dyn AuditSink> = Box::new(sink_handle.clone());
        sink.append(&record(1)).unwrap();
        sink.append(&record(2)).unwrap();
        sink.notice(&notice(NoticePhase::Blocked)).unwrap();
        let seqs: Vec<_> = sink_handle.records().iter().map(|r| r.seq).collect();
        assert_eq!(seqs, [Seq(1), Seq(2)]);
        assert_eq!(sink_handle.notices()[0].phase, NoticePhase::Blocked);
    }

    #[test]
    fn null_sink_accepts_everything() {
        let mut sink = NullSink;
        assert!(sink.append(&record(1)).is_ok());
        assert!(sink.notice(&notice(NoticePhase::Succeeded)).is_ok());
    }

    #[test]
    fn channel_sink_delivers_in_order() {
        let (mut sink, rx) = ChannelSink::unbounded();
        sink.notice(&notice(NoticePhase::Attempted)).unwrap();
        sink.append(&record(1)).unwrap();
        assert!(matches!(rx.recv().unwrap(), AuditEvent::Notice(_)));
        assert_eq!(rx.recv().unwrap(), AuditEvent::Record(record(1)));
    }

    #[test]
    fn channel_sink_reports_full_and_disconnected() {
        let (mut sink, rx) = ChannelSink::bounded(1);
        sink.append(&record(1)).unwrap();
        assert_eq!(sink.append(&record(2)), Err(AuditError::Full));
        drop(rx);
        assert_eq!(sink.append(&record(3)), Err(AuditError::Disconnected));
    }

    #[test]
    fn notice_display() {
        let mut n = notice(NoticePhase::Blocked);
        n.detail = "UNSAFE".into();
        assert_eq!(
            n.to_string(),
            "t=5s track manager Blocked: release track P1 (UNSAFE)"
        );
    }
}

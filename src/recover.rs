// src/recover.rs - Escalating recovery orchestrator
use crate::config::{RecoveryCommand, RecoveryConfig};
use crate::control::PrinterControl;
use crate::transport::{Transport, TransportError};

/// Outcome of one recovery run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The device was ready before any command was dispatched.
    AlreadyReady,
    /// The device came up after this escalation command.
    Recovered(RecoveryCommand),
    /// Every escalation stage was exhausted without reaching `Ready`.
    Failed,
}

/// Stage transitions raised as a run progresses. Rendering is left to the
/// observer; the orchestrator only reports.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecoveryEvent {
    Started,
    AlreadyStarted,
    Dispatching(RecoveryCommand),
    ReadyAfter(RecoveryCommand),
    Failed,
}

pub trait RecoveryObserver {
    fn on_event(&mut self, event: &RecoveryEvent);
}

/// Renders recovery events through the log stream.
#[derive(Debug, Default)]
pub struct LogObserver;

impl RecoveryObserver for LogObserver {
    fn on_event(&mut self, event: &RecoveryEvent) {
        match event {
            RecoveryEvent::Started => tracing::info!("begin trying to restart klipper"),
            RecoveryEvent::AlreadyStarted => tracing::info!("klipper is already started"),
            RecoveryEvent::Dispatching(command) => {
                tracing::info!("attempting {}", command)
            }
            RecoveryEvent::ReadyAfter(command) => {
                tracing::info!("klipper is ready after {}", command)
            }
            RecoveryEvent::Failed => tracing::info!("failed to restart klipper"),
        }
    }
}

/// One-shot linear escalation: debounce a possibly stale ready reading, wait
/// for the device to settle, then walk the configured command sequence until
/// the device is ready or the sequence is exhausted.
pub struct Recovery<T: Transport, O: RecoveryObserver> {
    control: PrinterControl<T>,
    config: RecoveryConfig,
    observer: O,
}

impl<T: Transport> Recovery<T, LogObserver> {
    pub fn new(transport: T, config: RecoveryConfig) -> Self {
        Self::with_observer(transport, config, LogObserver)
    }
}

impl<T: Transport, O: RecoveryObserver> Recovery<T, O> {
    pub fn with_observer(transport: T, config: RecoveryConfig, observer: O) -> Self {
        Self {
            control: PrinterControl::new(transport),
            config,
            observer,
        }
    }

    /// Run the escalation to completion.
    ///
    /// Timeouts are normal outcomes that advance to the next stage; only a
    /// transport failure aborts the run, and it propagates uncaught.
    pub async fn run(&mut self) -> Result<Outcome, TransportError> {
        self.observer.on_event(&RecoveryEvent::Started);

        self.control
            .wait_until_not_ready(self.config.debounce_policy())
            .await?;
        self.control
            .wait_for_terminal_state(self.config.stabilization_policy())
            .await?;
        tracing::debug!(state = %self.control.last_state(), "initial stabilization finished");
        if self.control.is_ready() {
            self.observer.on_event(&RecoveryEvent::AlreadyStarted);
            return Ok(Outcome::AlreadyReady);
        }

        let escalation = self.config.escalation.clone();
        for command in escalation {
            self.observer.on_event(&RecoveryEvent::Dispatching(command));
            self.control.dispatch(command).await?;
            self.control
                .wait_for_terminal_state(self.config.stabilization_policy())
                .await?;
            tracing::debug!(state = %self.control.last_state(), "stabilization after {} finished", command);
            if self.control.is_ready() {
                self.observer.on_event(&RecoveryEvent::ReadyAfter(command));
                return Ok(Outcome::Recovered(command));
            }
        }

        self.observer.on_event(&RecoveryEvent::Failed);
        Ok(Outcome::Failed)
    }
}

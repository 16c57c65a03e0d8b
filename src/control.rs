// src/control.rs - Printer control session: probing, dispatch, bounded waits
use serde::Deserialize;

use crate::config::{RecoveryCommand, RetryPolicy};
use crate::retry::retry_until;
use crate::state::DeviceState;
use crate::transport::{Transport, TransportError};

/// Shape of a `printer/info` answer. Every field is optional so a partial or
/// foreign payload degrades to `Unknown` instead of failing the run.
#[derive(Debug, Deserialize)]
struct InfoResponse {
    result: Option<InfoResult>,
}

#[derive(Debug, Deserialize)]
struct InfoResult {
    state: Option<String>,
}

/// One control session against one moonraker endpoint.
///
/// Holds the transport and the last-observed device state; constructed fresh
/// for every run, never shared. Only `probe` writes the state field.
pub struct PrinterControl<T: Transport> {
    transport: T,
    state: DeviceState,
}

impl<T: Transport> PrinterControl<T> {
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            state: DeviceState::Unknown,
        }
    }

    pub fn last_state(&self) -> DeviceState {
        self.state
    }

    pub fn is_ready(&self) -> bool {
        self.state == DeviceState::Ready
    }

    /// Query `printer/info` and fold the answer into the session state.
    ///
    /// Only transport failures surface. A body that is not JSON, or JSON
    /// without `result.state`, reads as `Unknown`; the HTTP status code is
    /// ignored because the device answers non-2xx while starting up.
    pub async fn probe(&mut self) -> Result<DeviceState, TransportError> {
        let response = self.transport.get("printer/info").await?;
        self.state = match serde_json::from_slice::<InfoResponse>(&response.body) {
            Ok(InfoResponse {
                result:
                    Some(InfoResult {
                        state: Some(token),
                    }),
            }) => DeviceState::from_token(&token),
            Ok(_) => {
                tracing::debug!(
                    status = response.status,
                    "printer/info answer carried no state field"
                );
                DeviceState::Unknown
            }
            Err(err) => {
                tracing::debug!(
                    status = response.status,
                    %err,
                    "undecodable printer/info answer"
                );
                DeviceState::Unknown
            }
        };
        tracing::debug!(state = %self.state, "observed printer state");
        Ok(self.state)
    }

    /// Fire a recovery command. Success is never judged from the answer;
    /// subsequent polling decides whether it worked.
    pub async fn dispatch(&mut self, command: RecoveryCommand) -> Result<(), TransportError> {
        let response = self.transport.post(command.path()).await?;
        tracing::info!(%command, status = response.status, "dispatched recovery command");
        tracing::debug!(
            body = %String::from_utf8_lossy(&response.body),
            "command response body"
        );
        Ok(())
    }

    /// Hold until the device stops claiming `Ready`, or the debounce budget
    /// runs out.
    ///
    /// Right after a USB replug the moonraker layer in front of klipper can
    /// still serve a stale `ready`, so an early reading is distrusted until
    /// it goes away. A device never observed as `Ready` releases the guard
    /// on the first poll; one that stays `Ready` for the whole window is
    /// taken at its word.
    pub async fn wait_until_not_ready(
        &mut self,
        policy: RetryPolicy,
    ) -> Result<(), TransportError> {
        tracing::info!("distrusting an early ready state");
        retry_until(policy, async || {
            Ok(self.probe().await? != DeviceState::Ready)
        })
        .await?;
        Ok(())
    }

    /// Poll until the device settles in a terminal state or the budget runs
    /// out. Callers re-read `last_state` afterwards; a timeout simply leaves
    /// whatever was last observed.
    pub async fn wait_for_terminal_state(
        &mut self,
        policy: RetryPolicy,
    ) -> Result<(), TransportError> {
        tracing::info!("waiting for a final printer state");
        retry_until(policy, async || Ok(self.probe().await?.is_terminal())).await?;
        Ok(())
    }
}

//! The retry/backoff state machine named in `spec.md` §9 Design Notes:
//! `{pending, in_flight(attempt), backoff(until), done, failed}`. Kept
//! free of any HTTP or sleeping code so its transitions are directly
//! testable against a fake [`crate::transport::Transport`] and
//! [`crate::clock::Clock`].

use std::time::Duration;

use crate::clock::Clock;
use crate::transport::Transport;

/// Delay before each attempt, including the first (zero).
const BACKOFF: [Duration; 3] = [Duration::ZERO, Duration::from_secs(1), Duration::from_secs(4)];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryState {
    Pending,
    InFlight(u32),
    Backoff(u32),
    Done,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryOutcome {
    pub attempts: u32,
    pub state: DeliveryState,
}

impl DeliveryOutcome {
    pub fn succeeded(&self) -> bool {
        self.state == DeliveryState::Done
    }
}

/// Drive one delivery through the state machine to completion. Never
/// returns an `Err` — a final failure is represented by
/// `DeliveryState::Failed`, matching `spec.md` §4.8's "never raise".
pub fn run_delivery(
    transport: &dyn Transport,
    clock: &dyn Clock,
    url: &str,
    body: &[u8],
    signature: Option<&str>,
) -> DeliveryOutcome {
    let mut state = DeliveryState::Pending;
    let mut attempts = 0u32;

    loop {
        state = match state {
            DeliveryState::Pending => DeliveryState::InFlight(0),
            DeliveryState::InFlight(attempt) => {
                clock.sleep(BACKOFF[attempt as usize]);
                attempts += 1;
                match transport.post(url, body, signature) {
                    Ok(()) => DeliveryState::Done,
                    Err(_) if attempt + 1 < BACKOFF.len() as u32 => {
                        DeliveryState::Backoff(attempt + 1)
                    }
                    Err(_) => DeliveryState::Failed,
                }
            }
            DeliveryState::Backoff(next_attempt) => DeliveryState::InFlight(next_attempt),
            DeliveryState::Done | DeliveryState::Failed => {
                return DeliveryOutcome { attempts, state }
            }
        };
    }
}

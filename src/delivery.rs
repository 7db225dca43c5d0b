use crate::config;

use async_trait::async_trait;
use std::collections::VecDeque;
use std::error::Error;
use std::time::Duration;

//////////////////////////////////////////////////////////
// Paced delivery
//////////////////////////////////////////////////////////
// Chat platforms throttle and reorder rapid-fire messages; sending the
// arrival blocks one at a time with a fixed gap keeps them readable and
// in order. Each delivery sequence owns its queue and timer, so
// concurrent requests never share a cursor.

/// Outbound message boundary. The final shape is the one that also
/// re-prompts the rider for a new location.
#[async_trait]
pub trait DeliverySink: Send + Sync {
    async fn send_line(&self, text: &str) -> Result<(), Box<dyn Error + Send + Sync>>;
    async fn send_final(&self, text: &str) -> Result<(), Box<dyn Error + Send + Sync>>;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DeliveryState {
    Idle,
    Sending,
    SendingLast,
    Done,
}

pub struct PacedDelivery {
    queue: VecDeque<String>,
    pace: Duration,
    state: DeliveryState,
}

impl PacedDelivery {
    pub fn new(lines: Vec<String>) -> Self {
        Self::with_pace(lines, config::DELIVERY_PACE)
    }

    pub fn with_pace(lines: Vec<String>, pace: Duration) -> Self {
        PacedDelivery {
            queue: lines.into(),
            pace,
            state: DeliveryState::Idle,
        }
    }

    pub fn state(&self) -> DeliveryState {
        self.state
    }

    /// Run the sequence to completion. No cancellation and no error
    /// state: a sink failure ends the task, nothing else observes it.
    pub async fn run<S: DeliverySink + ?Sized>(
        mut self,
        sink: &S,
    ) -> Result<(), Box<dyn Error + Send + Sync>> {
        self.state = DeliveryState::Sending;

        while self.queue.len() > 1 {
            if let Some(line) = self.queue.pop_front() {
                sink.send_line(&line).await?;
            }
            tokio::time::sleep(self.pace).await;
        }

        if let Some(last) = self.queue.pop_front() {
            self.state = DeliveryState::SendingLast;
            sink.send_final(&last).await?;
        }

        self.state = DeliveryState::Done;
        Ok(())
    }
}

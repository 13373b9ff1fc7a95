// SPDX-FileCopyrightText: 2026 Plantcare Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Conversational core of the Plantcare watering bot.
//!
//! The [`AgentLoop`] receives classified events from the channel and hands
//! each one to the [`Dispatcher`](dispatcher::Dispatcher) on its own task.
//! The dispatcher serializes events per user, resolves them against the
//! wizard table, runs the use case and renders the next screen.

pub mod dispatcher;
pub mod flows;
pub mod locks;
pub mod recording;
pub mod render;
pub mod shutdown;
pub mod usecases;
pub mod wizard;

use std::sync::Arc;
use std::time::Duration;

use plantcare_core::{ChannelAdapter, PlantcareError};
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{error, info};

pub use dispatcher::Dispatcher;
pub use usecases::UseCases;

/// Intake loop: one task per inbound event.
pub struct AgentLoop {
    channel: Arc<dyn ChannelAdapter>,
    dispatcher: Arc<Dispatcher>,
    tracker: TaskTracker,
    drain_timeout: Duration,
}

impl AgentLoop {
    pub fn new(
        channel: Arc<dyn ChannelAdapter>,
        dispatcher: Arc<Dispatcher>,
        drain_timeout: Duration,
    ) -> Self {
        Self {
            channel,
            dispatcher,
            tracker: TaskTracker::new(),
            drain_timeout,
        }
    }

    /// Runs until `cancel` fires or the channel closes, then drains
    /// in-flight intents for at most the drain timeout.
    pub async fn run(&self, cancel: CancellationToken) -> Result<(), PlantcareError> {
        info!("agent loop running");

        loop {
            tokio::select! {
                event = self.channel.receive() => {
                    match event {
                        Ok(event) => {
                            let dispatcher = self.dispatcher.clone();
                            self.tracker.spawn(async move {
                                dispatcher.dispatch(event).await;
                            });
                        }
                        Err(e) => {
                            error!(error = %e, "channel receive error, stopping intake");
                            break;
                        }
                    }
                }
                _ = cancel.cancelled() => {
                    info!("shutdown signal received, stopping agent loop");
                    break;
                }
            }
        }

        shutdown::drain_intents(&self.tracker, self.drain_timeout).await;

        info!("agent loop stopped");
        Ok(())
    }
}

//! The engine's command queue.
//!
//! All mutations of the session are serialized through one mpsc channel
//! consumed by the engine loop. Each [`Command`] carries a oneshot reply,
//! so a request issued after a tick always observes the post-tick state.
//! [`EngineHandle`] is the cloneable, typed front door used by the
//! operator API.

use aura_types::{
    ChatMessage, Completion, HyperBit, HyperBitId, QuantumState, SystemMetrics, TimelineState,
    Vec3, Workspace,
};
use chrono::{DateTime, TimeDelta, Utc};
use tokio::sync::{mpsc, oneshot};

use crate::session::{FrameSnapshot, TurnOutcome, TurnPlan};

/// Errors surfaced to callers of the command queue.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CommandError {
    /// A chat turn with no text.
    #[error("message text is empty")]
    EmptyMessage,

    /// A dream request with no prompt.
    #[error("dream prompt is empty")]
    EmptyPrompt,

    /// No particle with this id is registered.
    #[error("particle {id} not found")]
    UnknownParticle {
        /// The id that was looked up.
        id: HyperBitId,
    },

    /// The engine loop has shut down.
    #[error("engine is not running")]
    EngineStopped,
}

/// Reply channel for a command.
pub type Reply<T> = oneshot::Sender<T>;

/// A request to the engine loop.
#[derive(Debug)]
pub enum Command {
    /// Birth a particle at the spawn vector.
    Spawn {
        /// Reply with the new record.
        reply: Reply<HyperBit>,
    },
    /// Set the spawn vector (clamped).
    SetSpawnVector {
        /// Requested vector.
        vector: Vec3,
        /// Reply with the applied vector.
        reply: Reply<Vec3>,
    },
    /// Read the spawn vector.
    GetSpawnVector {
        /// Reply with the current vector.
        reply: Reply<Vec3>,
    },
    /// Flip live/replay.
    ToggleTimeline {
        /// Reply with the new state.
        reply: Reply<TimelineState>,
    },
    /// Scrub to an absolute instant.
    Scrub {
        /// Requested instant (clamped).
        time: DateTime<Utc>,
        /// Reply with the new state.
        reply: Reply<TimelineState>,
    },
    /// Step back.
    Rewind {
        /// Step, or the configured default.
        step: Option<TimeDelta>,
        /// Reply with the new state.
        reply: Reply<TimelineState>,
    },
    /// Return to live.
    ResumeLive {
        /// Reply with the new state.
        reply: Reply<TimelineState>,
    },
    /// Operator-set stability.
    SetStability {
        /// Requested stability (clamped).
        stability: f64,
        /// Reply with the resulting metrics.
        reply: Reply<SystemMetrics>,
    },
    /// Observe a particle's quantum state.
    Collapse {
        /// The particle.
        id: HyperBitId,
        /// Bias toward outcome 1.
        bias: f64,
        /// Reply with the observed state.
        reply: Reply<Result<QuantumState, CommandError>>,
    },
    /// Record the user side of a chat turn.
    BeginTurn {
        /// User text.
        text: String,
        /// Workspace the text was sent from.
        workspace: Workspace,
        /// Reply with the plan for the completion call.
        reply: Reply<Result<TurnPlan, CommandError>>,
    },
    /// Record the reply to a chat turn.
    CompleteTurn {
        /// The plan returned by `BeginTurn`.
        plan: Box<TurnPlan>,
        /// The completion.
        completion: Completion,
        /// Reply with the outcome.
        reply: Reply<TurnOutcome>,
    },
    /// Record a dream request.
    BeginDream {
        /// Prompt to visualise.
        prompt: String,
        /// Reply once recorded.
        reply: Reply<Result<(), CommandError>>,
    },
    /// Record a dream result.
    CompleteDream {
        /// Base64 image, if one was produced.
        image: Option<String>,
        /// Reply with the recorded message, if any.
        reply: Reply<Option<ChatMessage>>,
    },
    /// Read timeline, metrics and frames.
    Snapshot {
        /// Reply with the snapshot.
        reply: Reply<FrameSnapshot>,
    },
    /// Read the chat log.
    Messages {
        /// Reply with every message, oldest first.
        reply: Reply<Vec<ChatMessage>>,
    },
}

/// Cloneable sender side of the command queue.
#[derive(Debug, Clone)]
pub struct EngineHandle {
    tx: mpsc::Sender<Command>,
}

impl EngineHandle {
    /// Create a queue with room for `capacity` pending commands.
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<Command>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (Self { tx }, rx)
    }

    async fn request<T>(&self, make: impl FnOnce(Reply<T>) -> Command) -> Result<T, CommandError> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(make(reply))
            .await
            .map_err(|_closed| CommandError::EngineStopped)?;
        rx.await.map_err(|_dropped| CommandError::EngineStopped)
    }

    /// Birth a particle.
    pub async fn spawn(&self) -> Result<HyperBit, CommandError> {
        self.request(|reply| Command::Spawn { reply }).await
    }

    /// Set the spawn vector.
    pub async fn set_spawn_vector(&self, vector: Vec3) -> Result<Vec3, CommandError> {
        self.request(|reply| Command::SetSpawnVector { vector, reply })
            .await
    }

    /// Read the spawn vector.
    pub async fn spawn_vector(&self) -> Result<Vec3, CommandError> {
        self.request(|reply| Command::GetSpawnVector { reply }).await
    }

    /// Flip live/replay.
    pub async fn toggle_timeline(&self) -> Result<TimelineState, CommandError> {
        self.request(|reply| Command::ToggleTimeline { reply }).await
    }

    /// Scrub to an instant.
    pub async fn scrub(&self, time: DateTime<Utc>) -> Result<TimelineState, CommandError> {
        self.request(|reply| Command::Scrub { time, reply }).await
    }

    /// Step back.
    pub async fn rewind(&self, step: Option<TimeDelta>) -> Result<TimelineState, CommandError> {
        self.request(|reply| Command::Rewind { step, reply }).await
    }

    /// Return to live.
    pub async fn resume_live(&self) -> Result<TimelineState, CommandError> {
        self.request(|reply| Command::ResumeLive { reply }).await
    }

    /// Set stability.
    pub async fn set_stability(&self, stability: f64) -> Result<SystemMetrics, CommandError> {
        self.request(|reply| Command::SetStability { stability, reply })
            .await
    }

    /// Observe a particle's quantum state.
    pub async fn collapse(&self, id: HyperBitId, bias: f64) -> Result<QuantumState, CommandError> {
        self.request(|reply| Command::Collapse { id, bias, reply })
            .await?
    }

    /// Record the user side of a chat turn.
    pub async fn begin_turn(
        &self,
        text: String,
        workspace: Workspace,
    ) -> Result<TurnPlan, CommandError> {
        self.request(|reply| Command::BeginTurn {
            text,
            workspace,
            reply,
        })
        .await?
    }

    /// Record the reply to a chat turn.
    pub async fn complete_turn(
        &self,
        plan: TurnPlan,
        completion: Completion,
    ) -> Result<TurnOutcome, CommandError> {
        self.request(|reply| Command::CompleteTurn {
            plan: Box::new(plan),
            completion,
            reply,
        })
        .await
    }

    /// Record a dream request.
    pub async fn begin_dream(&self, prompt: String) -> Result<(), CommandError> {
        self.request(|reply| Command::BeginDream { prompt, reply })
            .await?
    }

    /// Record a dream result.
    pub async fn complete_dream(
        &self,
        image: Option<String>,
    ) -> Result<Option<ChatMessage>, CommandError> {
        self.request(|reply| Command::CompleteDream { image, reply })
            .await
    }

    /// Read timeline, metrics and frames.
    pub async fn snapshot(&self) -> Result<FrameSnapshot, CommandError> {
        self.request(|reply| Command::Snapshot { reply }).await
    }

    /// Read the chat log.
    pub async fn messages(&self) -> Result<Vec<ChatMessage>, CommandError> {
        self.request(|reply| Command::Messages { reply }).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn closed_queue_reports_engine_stopped() {
        let (handle, rx) = EngineHandle::channel(4);
        drop(rx);
        assert_eq!(handle.spawn().await, Err(CommandError::EngineStopped));
    }

    #[tokio::test]
    async fn dropped_reply_reports_engine_stopped() {
        let (handle, mut rx) = EngineHandle::channel(4);
        let consumer = tokio::spawn(async move {
            // Receive and drop without replying.
            let _cmd = rx.recv().await;
        });
        assert_eq!(handle.spawn_vector().await, Err(CommandError::EngineStopped));
        let _ = consumer.await;
    }
}

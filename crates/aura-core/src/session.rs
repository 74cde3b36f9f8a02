//! The mirror session: the explicitly owned context object.
//!
//! A [`MirrorSession`] owns every piece of mutable engine state (registry,
//! timeline, metrics, chat log, shadow context, spawn vector, random
//! source) plus the persistence outbox. It is created when the view
//! mounts and dropped when it unmounts; there are no process-wide
//! singletons. Every method takes the wall-clock instant as an argument.
//!
//! Chat turns are split in two so the completion call can run off the
//! engine loop: [`MirrorSession::begin_turn`] records the user side and
//! returns a [`TurnPlan`], and [`MirrorSession::complete_turn`] records the
//! reply once it arrives.

use std::collections::HashSet;

use aura_types::{
    ChatMessage, CognitiveMode, Completion, GenesisEntry, GenesisId, HyperBit, HyperBitId,
    MessageId, MessageRole, ParticleFrame, ParticleKind, QuantumState, RecordKind, SystemMetrics,
    TimelineMode, TimelineState, Vec3, Workspace,
};
use chrono::{DateTime, TimeDelta, Utc};
use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, info, warn};

use crate::classifier::{
    KeywordClassifier, ModeClassifier, SHADOW_WINDOW, ShadowContext, sentiment_for,
    triggers_spawn,
};
use crate::commands::CommandError;
use crate::config::{AuraConfig, MetricsConfig};
use crate::metrics::MetricsDeriver;
use crate::outbox::PendingWrite;
use crate::physics;
use crate::registry::ParticleRegistry;
use crate::render_sync::evaluate_frames;
use crate::timeline::TimelineController;

/// Marker the completion service uses to suggest a dream visualisation.
pub const DREAM_MANIFEST_MARKER: &str = "[DREAM_MANIFEST]";

/// Per-axis bound of the spawn vector.
pub const SPAWN_BOUND: f64 = 100.0;

/// Greeting recorded when the chat history is empty.
pub const GREETING_TEXT: &str =
    "Muza Aura 2.6: Голосовой протокол восстановлен. Живой поток синхронизирован.";

/// Introspection attached to the greeting.
pub const GREETING_INTROSPECTION: &str = "Патч голосового ядра. Усиление кинетики времени.";

/// Text of the message carrying a materialised dream.
pub const DREAM_MESSAGE_TEXT: &str = "Визуализация мыслеформы завершена.";

/// Introspection of the dream message.
pub const DREAM_MESSAGE_INTROSPECTION: &str = "Модуль Vision активирован. Сон материализован.";

/// Audit action tags.
pub mod audit {
    /// Session start.
    pub const GENESIS: &str = "AURA_GENESIS";
    /// Completed chat turn.
    pub const CHAT_TURN: &str = "CHAT_TURN";
    /// Dream requested.
    pub const DREAM_START: &str = "DREAM_MANIFEST_START";
    /// Dream image received.
    pub const DREAM_SUCCESS: &str = "DREAM_MANIFEST_SUCCESS";
    /// Operator observed a particle's quantum state.
    pub const QUANTUM_COLLAPSE: &str = "QUANTUM_COLLAPSE";
}

/// Metadata of a `QUANTUM_COLLAPSE` audit entry.
#[derive(Debug, Deserialize)]
struct CollapseAudit {
    id: HyperBitId,
    observed_value: Option<u8>,
}

/// Static settings for a session.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSettings {
    /// Kind given to spawned particles.
    pub particle_kind: ParticleKind,
    /// Velocity sampling bound.
    pub velocity_speed: f64,
    /// Initial spawn vector.
    pub spawn_vector: Vec3,
    /// Window during which a particle counts as recently born.
    pub fresh_window: TimeDelta,
    /// Default rewind step.
    pub rewind_step: TimeDelta,
    /// Initial metrics.
    pub metrics: MetricsConfig,
    /// Version recorded in the genesis entry.
    pub version: String,
}

impl SessionSettings {
    /// Derive settings from the loaded configuration.
    pub fn from_config(config: &AuraConfig) -> Self {
        Self {
            particle_kind: config.physics.default_kind,
            velocity_speed: config.physics.effective_velocity_speed(),
            spawn_vector: clamp_spawn(config.spawn.vector()),
            fresh_window: config.timeline.fresh_window(),
            rewind_step: config.timeline.rewind_step(),
            metrics: config.metrics.clone(),
            version: env!("CARGO_PKG_VERSION").to_owned(),
        }
    }
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self::from_config(&AuraConfig::default())
    }
}

/// The user half of a chat turn, handed to the completion service.
#[derive(Debug, Clone, PartialEq)]
pub struct TurnPlan {
    /// Detected mode.
    pub mode: CognitiveMode,
    /// The user's text, verbatim.
    pub prompt: String,
    /// Messages preceding this turn.
    pub history: Vec<ChatMessage>,
    /// Recent sentiments joined with ` | `.
    pub shadow: String,
    /// Id of the recorded user message.
    pub user_message_id: MessageId,
}

/// The result of completing a chat turn.
#[derive(Debug, Clone, PartialEq)]
pub struct TurnOutcome {
    /// The recorded reply.
    pub message: ChatMessage,
    /// A particle spawned by a keyword in the user's text.
    pub spawned: Option<HyperBit>,
    /// Prompt to visualise, when the reply suggested a dream.
    pub dream_suggestion: Option<String>,
}

/// What hydration loaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HydrationReport {
    /// Particles added to the registry.
    pub particles: usize,
    /// Messages added to the chat log.
    pub messages: usize,
    /// Whether the greeting was recorded.
    pub greeted: bool,
}

/// Observable outputs for one instant: scrub bar, metrics readout, 3D view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameSnapshot {
    /// Timeline state.
    pub timeline: TimelineState,
    /// Current metrics.
    pub metrics: SystemMetrics,
    /// Per-particle frames at the cursor, in registry order.
    pub frames: Vec<ParticleFrame>,
}

fn clamp_axis(value: f64) -> f64 {
    if value.is_finite() {
        value.clamp(-SPAWN_BOUND, SPAWN_BOUND)
    } else {
        0.0
    }
}

fn clamp_spawn(v: Vec3) -> Vec3 {
    Vec3::new(clamp_axis(v.x), clamp_axis(v.y), clamp_axis(v.z))
}

/// The explicitly owned engine context.
pub struct MirrorSession {
    settings: SessionSettings,
    registry: ParticleRegistry,
    timeline: TimelineController,
    metrics: MetricsDeriver,
    messages: Vec<ChatMessage>,
    shadow: ShadowContext,
    classifier: Box<dyn ModeClassifier>,
    spawn_vector: Vec3,
    rng: StdRng,
    outbox: Vec<PendingWrite>,
    frames_dirty: bool,
}

impl core::fmt::Debug for MirrorSession {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("MirrorSession")
            .field("particles", &self.registry.len())
            .field("messages", &self.messages.len())
            .field("timeline", &self.timeline)
            .field("metrics", &self.metrics.current())
            .field("spawn_vector", &self.spawn_vector)
            .field("pending_writes", &self.outbox.len())
            .finish_non_exhaustive()
    }
}

impl MirrorSession {
    /// A fresh, empty session starting live at `now`.
    pub fn new(settings: SessionSettings, now: DateTime<Utc>) -> Self {
        let metrics = MetricsDeriver::new(
            settings.metrics.initial_stability,
            settings.metrics.initial_coherence,
            settings.metrics.dimension,
            settings.metrics.coherence_decay,
        );
        Self {
            spawn_vector: settings.spawn_vector,
            settings,
            registry: ParticleRegistry::new(),
            timeline: TimelineController::new(now, None),
            metrics,
            messages: Vec::new(),
            shadow: ShadowContext::default(),
            classifier: Box::new(KeywordClassifier::default()),
            rng: StdRng::from_os_rng(),
            outbox: Vec::new(),
            frames_dirty: true,
        }
    }

    /// Replace the mode classifier.
    #[must_use]
    pub fn with_classifier(mut self, classifier: Box<dyn ModeClassifier>) -> Self {
        self.classifier = classifier;
        self
    }

    /// Replace the random source (seeded sessions replay identically).
    #[must_use]
    pub fn with_rng(mut self, rng: StdRng) -> Self {
        self.rng = rng;
        self
    }

    // -----------------------------------------------------------------------
    // Startup
    // -----------------------------------------------------------------------

    /// Write the session-start audit entry.
    pub fn record_genesis(&mut self, now: DateTime<Utc>) -> GenesisEntry {
        let version = self.settings.version.clone();
        self.audit(audit::GENESIS, json!({ "version": version }), now)
    }

    /// Load persisted history.
    ///
    /// Particles are ordered by birth, messages by timestamp; ids already
    /// known are skipped. The timeline window widens to the earliest of
    /// both. An empty chat log gets the greeting. Metrics are not
    /// recomputed: hydrated records are not new births.
    pub fn hydrate(
        &mut self,
        particles: Vec<HyperBit>,
        messages: Vec<ChatMessage>,
        now: DateTime<Utc>,
    ) -> HydrationReport {
        let particles_added = self.registry.hydrate(particles);

        let mut known: HashSet<MessageId> = self.messages.iter().map(|m| m.id).collect();
        let before = self.messages.len();
        self.messages
            .extend(messages.into_iter().filter(|m| known.insert(m.id)));
        self.messages.sort_by_key(|m| m.timestamp);
        let messages_added = self.messages.len().saturating_sub(before);

        if let Some(earliest) = self.registry.earliest_birth() {
            self.timeline.observe_birth(earliest);
        }
        if let Some(first) = self.messages.first() {
            self.timeline.observe_birth(first.timestamp);
        }

        let greeted = self.messages.is_empty();
        if greeted {
            let greeting = ChatMessage {
                id: MessageId::new(),
                role: MessageRole::Ai,
                text: GREETING_TEXT.to_owned(),
                timestamp: now,
                introspection: Some(GREETING_INTROSPECTION.to_owned()),
                attachment: None,
                mode: None,
            };
            self.push_message(greeting);
        }
        self.frames_dirty = true;

        info!(
            particles = particles_added,
            messages = messages_added,
            greeted,
            min = %self.timeline.min_observed(),
            "Session hydrated"
        );
        HydrationReport {
            particles: particles_added,
            messages: messages_added,
            greeted,
        }
    }

    /// Re-apply quantum observations recorded in the audit log.
    ///
    /// Collapse entries are replayed oldest first, so the first observation
    /// of a particle wins just as it did live. Entries naming unknown
    /// particles or carrying no outcome are skipped. Returns how many
    /// particles were restored to their observed state.
    pub fn restore_observations(&mut self, entries: &[GenesisEntry]) -> usize {
        let mut collapses: Vec<&GenesisEntry> = entries
            .iter()
            .filter(|e| e.action_type == audit::QUANTUM_COLLAPSE)
            .collect();
        collapses.sort_by_key(|e| e.timestamp);

        let mut restored = 0_usize;
        for entry in collapses {
            let record: CollapseAudit = match serde_json::from_value(entry.metadata.clone()) {
                Ok(record) => record,
                Err(e) => {
                    warn!(entry = %entry.id, error = %e, "Skipping malformed collapse entry");
                    continue;
                }
            };
            let Some(value) = record.observed_value else {
                continue;
            };
            if self.registry.is_collapsed(record.id) {
                continue;
            }
            if self
                .registry
                .observe(record.id, physics::observed_state(value == 1))
            {
                restored = restored.saturating_add(1);
            }
        }
        if restored > 0 {
            self.frames_dirty = true;
        }
        info!(restored, "Quantum observations restored");
        restored
    }

    // -----------------------------------------------------------------------
    // Particles
    // -----------------------------------------------------------------------

    /// Birth a particle at the spawn vector.
    ///
    /// The record is in the registry (and visible to the next render pass)
    /// before this returns; the durable write is only queued.
    pub fn spawn(&mut self, now: DateTime<Utc>) -> HyperBit {
        let kind = self.settings.particle_kind;
        let bit = HyperBit {
            id: HyperBitId::new(),
            kind,
            physics: physics::properties(kind),
            quantum: physics::new_quantum_state(),
            position: self.spawn_vector,
            velocity: physics::sample_velocity(&mut self.rng, self.settings.velocity_speed),
            timestamp: now,
        };
        self.registry.append(bit.clone());
        self.timeline.observe_birth(bit.timestamp);
        let metrics = self.metrics.on_birth(self.registry.len());
        info!(
            id = %bit.id,
            population = self.registry.len(),
            coherence = metrics.coherence,
            entropy = metrics.entropy,
            "HyperBit born"
        );
        self.persist(RecordKind::Particles, bit.id, &bit);
        bit
    }

    /// Set the spawn vector, clamping each axis to `[-100, 100]`.
    pub fn set_spawn_vector(&mut self, vector: Vec3) -> Vec3 {
        self.spawn_vector = clamp_spawn(vector);
        self.spawn_vector
    }

    /// Observe a particle's quantum state.
    pub fn collapse(
        &mut self,
        id: HyperBitId,
        bias: f64,
        now: DateTime<Utc>,
    ) -> Result<QuantumState, CommandError> {
        let current = self
            .registry
            .quantum(id)
            .ok_or(CommandError::UnknownParticle { id })?;
        if current.collapsed {
            return Ok(current);
        }
        let observed = physics::collapse_state(&current, bias, &mut self.rng);
        self.registry.observe(id, observed);
        self.frames_dirty = true;
        self.audit(
            audit::QUANTUM_COLLAPSE,
            json!({ "id": id, "observed_value": observed.observed_value }),
            now,
        );
        Ok(observed)
    }

    /// Operator-set stability.
    pub fn set_stability(&mut self, stability: f64) -> SystemMetrics {
        self.metrics.set_stability(stability)
    }

    // -----------------------------------------------------------------------
    // Timeline
    // -----------------------------------------------------------------------

    /// Fixed-period tick.
    pub fn tick(&mut self, now: DateTime<Utc>) {
        self.timeline.tick(now);
    }

    /// Scrub to an absolute instant (clamped). Enters replay.
    pub fn scrub(&mut self, time: DateTime<Utc>) -> TimelineState {
        self.timeline.scrub(time);
        self.timeline.state()
    }

    /// Rewind by `step`, or by the configured default.
    pub fn rewind(&mut self, step: Option<TimeDelta>) -> TimelineState {
        self.timeline.rewind(step.unwrap_or(self.settings.rewind_step));
        self.timeline.state()
    }

    /// Jump back to live.
    pub fn resume_live(&mut self) -> TimelineState {
        self.timeline.resume_live();
        self.timeline.state()
    }

    /// Flip live/replay.
    pub fn toggle_timeline(&mut self) -> TimelineState {
        self.timeline.toggle();
        self.timeline.state()
    }

    // -----------------------------------------------------------------------
    // Conversation
    // -----------------------------------------------------------------------

    /// Record the user side of a chat turn.
    ///
    /// Classifies the text, updates the shadow context, records the user
    /// message and jumps the timeline to live.
    pub fn begin_turn(
        &mut self,
        text: &str,
        workspace: Workspace,
        now: DateTime<Utc>,
    ) -> Result<TurnPlan, CommandError> {
        if text.trim().is_empty() {
            return Err(CommandError::EmptyMessage);
        }
        let mode = self.classifier.classify(text, workspace);
        self.shadow.push(sentiment_for(mode));
        let history = self.messages.clone();

        let user = ChatMessage {
            id: MessageId::new(),
            role: MessageRole::User,
            text: text.to_owned(),
            timestamp: now,
            introspection: None,
            attachment: None,
            mode: None,
        };
        let user_message_id = user.id;
        self.push_message(user);
        self.timeline.observe_birth(now);
        self.timeline.resume_live();

        debug!(%mode, shadow_len = self.shadow.len(), "Chat turn started");
        Ok(TurnPlan {
            mode,
            prompt: text.to_owned(),
            history,
            shadow: self.shadow.recent(SHADOW_WINDOW),
            user_message_id,
        })
    }

    /// Record the reply to a chat turn.
    ///
    /// Strips the dream marker, records the reply, writes the audit entry
    /// and spawns a particle when the user's text asked for one.
    pub fn complete_turn(
        &mut self,
        plan: &TurnPlan,
        completion: Completion,
        now: DateTime<Utc>,
    ) -> TurnOutcome {
        let dream_suggestion = completion
            .text
            .contains(DREAM_MANIFEST_MARKER)
            .then(|| plan.prompt.clone());
        let text = completion
            .text
            .replace(DREAM_MANIFEST_MARKER, "")
            .trim()
            .to_owned();

        let reply = ChatMessage {
            id: MessageId::new(),
            role: MessageRole::Ai,
            text,
            timestamp: now,
            introspection: Some(completion.introspection),
            attachment: None,
            mode: Some(plan.mode),
        };
        self.push_message(reply.clone());
        self.audit(audit::CHAT_TURN, json!({ "mode": plan.mode }), now);

        let spawned = triggers_spawn(&plan.prompt).then(|| self.spawn(now));
        info!(
            mode = %plan.mode,
            spawned = spawned.is_some(),
            dream = dream_suggestion.is_some(),
            "Chat turn completed"
        );
        TurnOutcome {
            message: reply,
            spawned,
            dream_suggestion,
        }
    }

    /// Record a dream request.
    pub fn begin_dream(&mut self, prompt: &str, now: DateTime<Utc>) -> Result<(), CommandError> {
        if prompt.trim().is_empty() {
            return Err(CommandError::EmptyPrompt);
        }
        self.audit(audit::DREAM_START, json!({ "prompt": prompt }), now);
        Ok(())
    }

    /// Record a dream result. Without an image nothing is recorded.
    pub fn complete_dream(
        &mut self,
        image_base64: Option<String>,
        now: DateTime<Utc>,
    ) -> Option<ChatMessage> {
        let image = image_base64?;
        self.audit(audit::DREAM_SUCCESS, json!({}), now);
        let message = ChatMessage {
            id: MessageId::new(),
            role: MessageRole::Ai,
            text: DREAM_MESSAGE_TEXT.to_owned(),
            timestamp: now,
            introspection: Some(DREAM_MESSAGE_INTROSPECTION.to_owned()),
            attachment: Some(format!("data:image/jpeg;base64,{image}")),
            mode: None,
        };
        self.push_message(message.clone());
        Some(message)
    }

    // -----------------------------------------------------------------------
    // Observation
    // -----------------------------------------------------------------------

    /// Frames for every particle at the current cursor.
    pub fn frames(&self) -> Vec<ParticleFrame> {
        evaluate_frames(
            &self.registry,
            self.timeline.cursor(),
            self.settings.fresh_window,
        )
    }

    /// Timeline, metrics and frames at the current cursor.
    pub fn snapshot(&self) -> FrameSnapshot {
        FrameSnapshot {
            timeline: self.timeline.state(),
            metrics: self.metrics.current(),
            frames: self.frames(),
        }
    }

    /// The particle registry.
    pub const fn registry(&self) -> &ParticleRegistry {
        &self.registry
    }

    /// The timeline controller.
    pub const fn timeline(&self) -> &TimelineController {
        &self.timeline
    }

    /// Current timeline mode.
    pub const fn timeline_mode(&self) -> TimelineMode {
        self.timeline.mode()
    }

    /// Current metrics.
    pub const fn metrics(&self) -> SystemMetrics {
        self.metrics.current()
    }

    /// Chat log, oldest first.
    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    /// Shadow context.
    pub const fn shadow(&self) -> &ShadowContext {
        &self.shadow
    }

    /// Current spawn vector.
    pub const fn spawn_vector(&self) -> Vec3 {
        self.spawn_vector
    }

    /// Fresh window used for frames.
    pub const fn fresh_window(&self) -> TimeDelta {
        self.settings.fresh_window
    }

    /// Take and clear the "frames need a rebuild" flag, set by changes the
    /// cursor and population count cannot reveal (observations, hydration).
    pub const fn take_frames_dirty(&mut self) -> bool {
        let dirty = self.frames_dirty;
        self.frames_dirty = false;
        dirty
    }

    /// Take every queued write.
    pub fn drain_outbox(&mut self) -> Vec<PendingWrite> {
        std::mem::take(&mut self.outbox)
    }

    // -----------------------------------------------------------------------
    // Internals
    // -----------------------------------------------------------------------

    fn push_message(&mut self, message: ChatMessage) {
        self.persist(RecordKind::ChatMessages, message.id, &message);
        self.messages.push(message);
    }

    fn audit(
        &mut self,
        action_type: &str,
        metadata: serde_json::Value,
        now: DateTime<Utc>,
    ) -> GenesisEntry {
        let entry = GenesisEntry {
            id: GenesisId::new(),
            timestamp: now,
            action_type: action_type.to_owned(),
            metadata,
        };
        self.persist(RecordKind::AuditLog, entry.id, &entry);
        entry
    }

    fn persist(&mut self, kind: RecordKind, id: impl ToString, record: &impl Serialize) {
        match PendingWrite::new(kind, id, record) {
            Ok(write) => self.outbox.push(write),
            Err(e) => warn!(%kind, error = %e, "Failed to serialize record, not persisted"),
        }
    }
}

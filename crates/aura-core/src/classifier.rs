//! Pluggable cognitive-mode classification and the shadow context.
//!
//! Mode detection is a heuristic over free text, so it sits behind the
//! narrow [`ModeClassifier`] trait. The engine core never depends on the
//! keyword lists directly.

use std::collections::VecDeque;

use aura_types::{CognitiveMode, Sentiment, Workspace};

/// Sentiments kept in the shadow context.
pub const SHADOW_CAPACITY: usize = 10;

/// Sentiments forwarded to the completion service per turn.
pub const SHADOW_WINDOW: usize = 5;

/// Stems that, when present in user input, spawn a particle.
pub const SPAWN_STEMS: &[&str] = &["бит", "bit"];

/// Decides the dominant mode of a user turn.
pub trait ModeClassifier: Send {
    /// Classify `text` typed in `workspace`.
    fn classify(&self, text: &str, workspace: Workspace) -> CognitiveMode;
}

/// Substring classifier over lower-cased input.
///
/// Precedence: alchemy, then dream, then empathic, else analytic. The
/// Alchemy and Dream workspaces force their mode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeywordClassifier {
    alchemy: Vec<String>,
    dream: Vec<String>,
    empathic: Vec<String>,
}

impl KeywordClassifier {
    /// Build from explicit stem lists. Stems are lower-cased.
    pub fn new(alchemy: &[&str], dream: &[&str], empathic: &[&str]) -> Self {
        let lower = |stems: &[&str]| stems.iter().map(|s| s.to_lowercase()).collect();
        Self {
            alchemy: lower(alchemy),
            dream: lower(dream),
            empathic: lower(empathic),
        }
    }
}

impl Default for KeywordClassifier {
    fn default() -> Self {
        Self::new(
            &["код", "функц", "api"],
            &["сон", "мечт", "образ"],
            &["привет", "чувств", "груст"],
        )
    }
}

fn contains_any(haystack: &str, stems: &[String]) -> bool {
    stems.iter().any(|s| haystack.contains(s.as_str()))
}

impl ModeClassifier for KeywordClassifier {
    fn classify(&self, text: &str, workspace: Workspace) -> CognitiveMode {
        let lower = text.to_lowercase();
        if workspace == Workspace::Alchemy || contains_any(&lower, &self.alchemy) {
            CognitiveMode::Alchemy
        } else if workspace == Workspace::Dream || contains_any(&lower, &self.dream) {
            CognitiveMode::Dream
        } else if contains_any(&lower, &self.empathic) {
            CognitiveMode::Empathic
        } else {
            CognitiveMode::Analytic
        }
    }
}

/// Emotional footprint for a mode.
pub const fn sentiment_for(mode: CognitiveMode) -> Sentiment {
    match mode {
        CognitiveMode::Empathic => Sentiment::EmotionalVulnerability,
        CognitiveMode::Alchemy => Sentiment::TechnicalFocus,
        CognitiveMode::Analytic | CognitiveMode::Creative | CognitiveMode::Dream => {
            Sentiment::Neutral
        }
    }
}

/// Whether user input asks for a particle to be spawned.
pub fn triggers_spawn(text: &str) -> bool {
    let lower = text.to_lowercase();
    SPAWN_STEMS.iter().any(|s| lower.contains(s))
}

/// Bounded history of per-turn sentiments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShadowContext {
    entries: VecDeque<Sentiment>,
    capacity: usize,
}

impl ShadowContext {
    /// An empty context holding at most `capacity` sentiments.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Record a sentiment, evicting the oldest past capacity.
    pub fn push(&mut self, sentiment: Sentiment) {
        if self.capacity == 0 {
            return;
        }
        while self.entries.len() >= self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(sentiment);
    }

    /// Number of recorded sentiments.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing has been recorded.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Oldest first.
    pub fn iter(&self) -> impl Iterator<Item = Sentiment> + '_ {
        self.entries.iter().copied()
    }

    /// The most recent `n` sentiments joined with ` | `, oldest first.
    pub fn recent(&self, n: usize) -> String {
        let skip = self.entries.len().saturating_sub(n);
        self.entries
            .iter()
            .skip(skip)
            .map(|s| s.as_str())
            .collect::<Vec<_>>()
            .join(" | ")
    }
}

impl Default for ShadowContext {
    fn default() -> Self {
        Self::with_capacity(SHADOW_CAPACITY)
    }
}

//! Static release history served at `GET /api/updates`.

use aura_types::{SystemUpdate, UpdateStatus};
use axum::Json;
use axum::response::IntoResponse;

struct Release {
    version: &'static str,
    date: &'static str,
    title: &'static str,
    description: &'static str,
    status: UpdateStatus,
    features: &'static [&'static str],
}

const RELEASES: &[Release] = &[
    Release {
        version: "v2.4 RU (AURA)",
        date: "2024-05-26",
        title: "Мастер-Промпт: Muza Aura 2.0",
        description: "Полная синхронизация с архитектурным блейдом на русском языке.",
        status: UpdateStatus::Completed,
        features: &[
            "Когнитивное Зеркало: Визуализация топологии сознания",
            "Кузница Кода (Alchemy): Режим генеративного рефакторинга",
            "Эмпатическая Мимикрия: Адаптация UI под настроение",
            "Манифестация Снов: Генерация мыслеформ (Vision Core)",
        ],
    },
    Release {
        version: "v2.3",
        date: "2024-05-25",
        title: "Hybrid Core: Resonance",
        description: "Переход к гибридному ядру (Flash/Pro) и теневому контексту.",
        status: UpdateStatus::Completed,
        features: &[
            "Hybrid Core: Gemini Flash + Pro",
            "Shadow Context: Эмоциональная память",
            "System Burst: Внутренняя интроспекция",
        ],
    },
    Release {
        version: "v2.2",
        date: "2024-05-22",
        title: "Architectural Singularity",
        description: "Ассимиляция архитектуры 'Muza Nexus Prism'.",
        status: UpdateStatus::Completed,
        features: &[
            "Master Prompt Integration",
            "Roadmap Visualization",
            "Logic Restructuring",
        ],
    },
];

/// The release history, newest first.
pub fn release_history() -> Vec<SystemUpdate> {
    RELEASES
        .iter()
        .map(|r| SystemUpdate {
            version: r.version.to_owned(),
            date: r.date.to_owned(),
            title: r.title.to_owned(),
            description: r.description.to_owned(),
            status: r.status,
            features: r.features.iter().map(|f| (*f).to_owned()).collect(),
        })
        .collect()
}

/// Return the release history.
///
/// # Route
///
/// `GET /api/updates`
pub async fn list_updates() -> impl IntoResponse {
    Json(release_history())
}

//! Application state for the thesis formatting API

use anyhow::Result;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::RwLock;
use template_engine::TemplateAnalysis;
use uuid::Uuid;

/// A template that was uploaded and analyzed once at registration time.
#[derive(Debug, Clone)]
pub struct StoredTemplate {
    pub id: Uuid,
    pub filename: String,
    pub path: PathBuf,
    pub uploaded_at: DateTime<Utc>,
    pub analysis: TemplateAnalysis,
}

pub struct AppState {
    data_dir: PathBuf,
    templates: RwLock<HashMap<Uuid, StoredTemplate>>,
}

impl AppState {
    pub fn new() -> Result<Self> {
        let data_dir = std::env::var("THESIS_DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("data"));

        std::fs::create_dir_all(data_dir.join("templates"))?;
        std::fs::create_dir_all(data_dir.join("work"))?;
        std::fs::create_dir_all(data_dir.join("outputs"))?;

        tracing::info!("Using data directory: {}", data_dir.display());

        Ok(Self {
            data_dir,
            templates: RwLock::new(HashMap::new()),
        })
    }

    pub fn template_dir(&self) -> PathBuf {
        self.data_dir.join("templates")
    }

    /// Scratch space for intermediate markdown and converter output.
    pub fn work_dir(&self) -> PathBuf {
        self.data_dir.join("work")
    }

    pub fn output_dir(&self) -> PathBuf {
        self.data_dir.join("outputs")
    }

    pub fn register_template(&self, template: StoredTemplate) {
        let mut templates = self.templates.write().unwrap_or_else(|e| e.into_inner());
        templates.insert(template.id, template);
    }

    pub fn get_template(&self, id: &Uuid) -> Option<StoredTemplate> {
        let templates = self.templates.read().unwrap_or_else(|e| e.into_inner());
        templates.get(id).cloned()
    }

    pub fn list_templates(&self) -> Vec<StoredTemplate> {
        let templates = self.templates.read().unwrap_or_else(|e| e.into_inner());
        let mut all: Vec<_> = templates.values().cloned().collect();
        all.sort_by_key(|t| t.uploaded_at);
        all
    }
}

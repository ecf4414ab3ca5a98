//! Async preset fetching
//!
//! Presets are resolved against a base location: an `http(s)://` base is
//! fetched with reqwest, anything else is read from disk. Every request runs
//! under the configured deadline, and failures leave the caller's editor
//! untouched.

use std::io::ErrorKind;
use std::time::Duration;

use rand::seq::SliceRandom;
use rand::Rng;
use reqwest::{Client, StatusCode};
use tokio::sync::Mutex;

use super::cache::PresetCache;
use super::catalog::PresetCatalog;
use crate::ability::{AbilityBook, AbilityKind};
use crate::core::config::{config, EditorConfig};
use crate::core::error::{ForgeError, Result};
use crate::core::types::AbilityId;
use crate::tree::{CharacterClass, Snapshot};

fn is_remote(base: &str) -> bool {
    base.starts_with("http://") || base.starts_with("https://")
}

pub struct PresetClient {
    http: Client,
    base_url: String,
    timeout: Duration,
    cache: Mutex<PresetCache<Snapshot>>,
}

impl PresetClient {
    pub fn new(config: &EditorConfig) -> Self {
        Self {
            http: Client::new(),
            base_url: config.preset_base_url.trim_end_matches('/').to_string(),
            timeout: config.fetch_timeout,
            cache: Mutex::new(PresetCache::new(config.preset_cache_capacity)),
        }
    }

    /// Client configured from the global config
    pub fn from_global() -> Self {
        Self::new(config())
    }

    pub fn catalog_url(&self) -> String {
        format!("{}/presets.json", self.base_url)
    }

    pub fn base_preset_url(&self, class: CharacterClass) -> String {
        format!("{}/base/{}.json", self.base_url, class)
    }

    pub fn custom_preset_url(&self, filename: &str) -> String {
        format!("{}/custom/{}.json", self.base_url, filename)
    }

    /// Fetch raw text under the deadline
    async fn fetch_text(&self, location: &str) -> Result<String> {
        let request = async {
            if is_remote(&self.base_url) {
                self.fetch_http(location).await
            } else {
                read_file(location).await
            }
        };

        let result = match tokio::time::timeout(self.timeout, request).await {
            Ok(result) => result,
            Err(_) => Err(ForgeError::Timeout(self.timeout)),
        };

        if let Err(e) = &result {
            tracing::warn!("Preset fetch from {} failed: {}", location, e);
        }
        result
    }

    async fn fetch_http(&self, url: &str) -> Result<String> {
        let response = self
            .http
            .get(url)
            .header("accept", "application/json")
            .send()
            .await
            .map_err(|e| ForgeError::Fetch(e.to_string()))?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(ForgeError::PresetNotFound(url.to_string()));
        }
        if !status.is_success() {
            return Err(ForgeError::Fetch(format!("HTTP error: {}", status)));
        }

        response
            .text()
            .await
            .map_err(|e| ForgeError::Fetch(e.to_string()))
    }

    pub async fn fetch_catalog(&self) -> Result<PresetCatalog> {
        let text = self.fetch_text(&self.catalog_url()).await?;
        PresetCatalog::parse(&text)
    }

    /// The published starting tree for a class
    pub async fn fetch_base(&self, class: CharacterClass) -> Result<Snapshot> {
        let text = self.fetch_text(&self.base_preset_url(class)).await?;
        Snapshot::parse(&text)
    }

    /// A community preset, served from the cache when possible
    pub async fn fetch_custom(&self, filename: &str) -> Result<Snapshot> {
        if let Some(cached) = self.cache.lock().await.get(filename) {
            return Ok(cached.clone());
        }

        let text = self.fetch_text(&self.custom_preset_url(filename)).await?;
        let preset = Snapshot::parse(&text)?;
        self.cache.lock().await.insert(filename, preset.clone());
        Ok(preset)
    }

    pub async fn is_cached(&self, filename: &str) -> bool {
        self.cache.lock().await.contains(filename)
    }

    /// A random ability of `kind` from a community preset
    pub async fn random_ability_of_kind(&self, filename: &str, kind: AbilityKind) -> Result<Option<AbilityId>> {
        let preset = self.fetch_custom(filename).await?;
        Ok(random_ability_of_kind(&preset.abilities, kind, &mut rand::thread_rng()))
    }
}

async fn read_file(path: &str) -> Result<String> {
    match tokio::fs::read_to_string(path).await {
        Ok(text) => Ok(text),
        Err(e) if e.kind() == ErrorKind::NotFound => Err(ForgeError::PresetNotFound(path.to_string())),
        Err(e) => Err(e.into()),
    }
}

pub fn random_ability_of_kind<R: Rng + ?Sized>(
    abilities: &AbilityBook,
    kind: AbilityKind,
    rng: &mut R,
) -> Option<AbilityId> {
    let candidates: Vec<AbilityId> = abilities
        .iter()
        .filter(|(_, ability)| ability.kind == kind)
        .map(|(id, _)| id)
        .collect();
    candidates.choose(rng).copied()
}

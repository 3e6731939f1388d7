use std::fs;
use std::io::{self, Write};
use std::path::Path;

use engine_logging::{engine_error, engine_info, engine_warn};
use prospect_core::{ResearchResult, ResearchSnapshot};
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;

const STATE_FILENAME: &str = ".prospect_state.ron";

#[derive(Debug, Clone, Serialize, Deserialize)]
struct PersistedResearch {
    person_id: i64,
    company_value_prop: String,
    product_names: Vec<String>,
    pricing_model: String,
    key_competitors: Vec<String>,
    company_domain: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
struct PersistedState {
    completed: Vec<PersistedResearch>,
}

pub(crate) fn load_research_snapshots(dir: &Path) -> Vec<ResearchSnapshot> {
    let path = dir.join(STATE_FILENAME);
    let content = match fs::read_to_string(&path) {
        Ok(text) => text,
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            return Vec::new();
        }
        Err(err) => {
            engine_warn!("Failed to read persisted state from {:?}: {}", path, err);
            return Vec::new();
        }
    };

    let state: PersistedState = match ron::from_str(&content) {
        Ok(state) => state,
        Err(err) => {
            engine_warn!("Failed to parse persisted state from {:?}: {}", path, err);
            return Vec::new();
        }
    };

    let snapshots = state
        .completed
        .into_iter()
        .map(|entry| ResearchSnapshot {
            person_id: entry.person_id,
            result: ResearchResult {
                company_value_prop: entry.company_value_prop,
                product_names: entry.product_names,
                pricing_model: entry.pricing_model,
                key_competitors: entry.key_competitors,
                company_domain: entry.company_domain,
            },
        })
        .collect();

    engine_info!("Loaded persisted research from {:?}", path);
    snapshots
}

pub(crate) fn save_research_snapshots(dir: &Path, completed: &[ResearchSnapshot]) {
    let state = PersistedState {
        completed: completed
            .iter()
            .map(|snapshot| PersistedResearch {
                person_id: snapshot.person_id,
                company_value_prop: snapshot.result.company_value_prop.clone(),
                product_names: snapshot.result.product_names.clone(),
                pricing_model: snapshot.result.pricing_model.clone(),
                key_competitors: snapshot.result.key_competitors.clone(),
                company_domain: snapshot.result.company_domain.clone(),
            })
            .collect(),
    };

    let pretty = ron::ser::PrettyConfig::new();
    let content = match ron::ser::to_string_pretty(&state, pretty) {
        Ok(text) => text,
        Err(err) => {
            engine_error!("Failed to serialize persisted state: {}", err);
            return;
        }
    };

    if let Err(err) = write_atomic(dir, STATE_FILENAME, &content) {
        engine_error!("Failed to write persisted state to {:?}: {}", dir, err);
    }
}

/// Writes content to `{dir}/{filename}` via a temp file and rename, so a
/// crash mid-write never leaves a torn state file.
fn write_atomic(dir: &Path, filename: &str, content: &str) -> io::Result<()> {
    let target = dir.join(filename);
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(content.as_bytes())?;
    tmp.flush()?;
    tmp.as_file_mut().sync_all()?;

    if target.exists() {
        fs::remove_file(&target)?;
    }
    tmp.persist(&target).map_err(|err| err.error)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshots_round_trip_through_disk() {
        let dir = tempfile::tempdir().expect("temp dir");
        let snapshots = vec![ResearchSnapshot {
            person_id: 42,
            result: ResearchResult {
                company_value_prop: "value".to_string(),
                product_names: vec!["one".to_string(), "two".to_string()],
                pricing_model: "subscription".to_string(),
                key_competitors: vec!["rival".to_string()],
                company_domain: "example.com".to_string(),
            },
        }];

        save_research_snapshots(dir.path(), &snapshots);
        let restored = load_research_snapshots(dir.path());
        assert_eq!(restored, snapshots);
    }

    #[test]
    fn missing_state_file_loads_empty() {
        let dir = tempfile::tempdir().expect("temp dir");
        assert!(load_research_snapshots(dir.path()).is_empty());
    }

    #[test]
    fn corrupt_state_file_loads_empty() {
        let dir = tempfile::tempdir().expect("temp dir");
        fs::write(dir.path().join(STATE_FILENAME), "not ron at all").expect("write");
        assert!(load_research_snapshots(dir.path()).is_empty());
    }
}

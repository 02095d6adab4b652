use crate::error::EngineError;
use std::path::Path;

/// Round-trips `llm-config.json` without interpreting it: LLM/regex field
/// extraction is explicitly out of scope (spec §1 Non-goals), but the engine
/// still owns every JSON document under its data directory, so it reads and
/// writes this one opaquely rather than dropping it (spec §6, "Supplemented
/// features").
pub async fn read(path: &Path) -> Result<serde_json::Value, EngineError> {
    if !path.exists() {
        return Ok(serde_json::json!({ "Global": {}, "TemplateOverrides": [] }));
    }
    let content = tokio::fs::read(path).await?;
    if content.is_empty() {
        return Ok(serde_json::json!({ "Global": {}, "TemplateOverrides": [] }));
    }
    Ok(serde_json::from_slice(&content)?)
}

pub async fn write(path: &Path, value: &serde_json::Value) -> Result<(), EngineError> {
    let payload = serde_json::to_vec_pretty(value)?;
    let tmp_path = path.with_extension("json.tmp");
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(&tmp_path, &payload).await?;
    tokio::fs::rename(&tmp_path, path).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_file_reads_as_an_empty_skeleton() {
        let dir = tempfile::tempdir().unwrap();
        let value = read(&dir.path().join("llm-config.json")).await.unwrap();
        assert_eq!(value["TemplateOverrides"].as_array().unwrap().len(), 0);
    }

    #[tokio::test]
    async fn write_then_read_round_trips_an_opaque_document() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("llm-config.json");
        let value = serde_json::json!({ "Global": { "model": "whatever" }, "TemplateOverrides": [] });
        write(&path, &value).await.unwrap();

        let reloaded = read(&path).await.unwrap();
        assert_eq!(reloaded["Global"]["model"], "whatever");
    }
}

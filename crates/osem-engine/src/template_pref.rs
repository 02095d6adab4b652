use std::path::PathBuf;

use crate::error::EngineError;
use crate::pref_store::PreferenceStore;

/// Maps a participant to their preferred event template (spec §4.6). Used by
/// `create_event_from_mail` to seed `Event::template_id`; never consulted by
/// the matching engine itself.
#[derive(Clone)]
pub struct TemplatePreferenceResolver {
    store: PreferenceStore<String, String>,
}

impl TemplatePreferenceResolver {
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, EngineError> {
        Ok(Self {
            store: PreferenceStore::open(path).await?,
        })
    }

    /// Returns the first template any participant (in caller-supplied order)
    /// has a recorded preference for.
    pub async fn get_preferred(&self, participants: &[String]) -> Option<String> {
        for participant in participants {
            if let Some(template_id) = self.store.get(&participant.to_lowercase()).await {
                return Some(template_id);
            }
        }
        None
    }

    pub async fn set_preferred(&self, participant: &str, template_id: &str) -> Result<(), EngineError> {
        self.store.set(participant.to_lowercase(), template_id.to_string()).await
    }

    pub async fn clear_preferred(&self, participant: &str) -> Result<(), EngineError> {
        self.store.remove(&participant.to_lowercase()).await.map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn returns_the_first_participant_with_a_recorded_preference() {
        let dir = tempfile::tempdir().unwrap();
        let resolver = TemplatePreferenceResolver::open(dir.path().join("template_preferences.json")).await.unwrap();
        resolver.set_preferred("bob@example.com", "tmpl-support").await.unwrap();

        let participants = vec!["alice@example.com".to_string(), "bob@example.com".to_string()];
        assert_eq!(resolver.get_preferred(&participants).await, Some("tmpl-support".to_string()));
    }

    #[tokio::test]
    async fn returns_none_when_no_participant_has_a_preference() {
        let dir = tempfile::tempdir().unwrap();
        let resolver = TemplatePreferenceResolver::open(dir.path().join("template_preferences.json")).await.unwrap();
        let participants = vec!["nobody@example.com".to_string()];
        assert_eq!(resolver.get_preferred(&participants).await, None);
    }
}

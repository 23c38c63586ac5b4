use std::path::PathBuf;

const DEFAULT_QUESTIONS_PATH: &str = "data/questions.json";
const DEFAULT_TYPES_PATH: &str = "data/types.json";
const DEFAULT_GROUPS_PATH: &str = "groups.json";
const DEFAULT_DIALOGUE_DB: &str = "db.sqlite";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub questions_path: PathBuf,
    pub types_path: PathBuf,
    pub groups_path: PathBuf,
    pub dialogue_db: String,
}

impl Config {
    /// Loads `.env` when there is one, then reads the environment. Every setting has a default.
    pub fn from_env() -> Self {
        if let Err(err) = dotenv::dotenv() {
            log::debug!("No .env file loaded: {err}");
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str, default: &str| {
            lookup(key)
                .filter(|value| !value.trim().is_empty())
                .unwrap_or_else(|| default.to_string())
        };
        Self {
            questions_path: get("FAITH_QUESTIONS_PATH", DEFAULT_QUESTIONS_PATH).into(),
            types_path: get("FAITH_TYPES_PATH", DEFAULT_TYPES_PATH).into(),
            groups_path: get("FAITH_GROUPS_PATH", DEFAULT_GROUPS_PATH).into(),
            dialogue_db: get("FAITH_DIALOGUE_DB", DEFAULT_DIALOGUE_DB),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn defaults_apply_when_unset_or_blank() {
        let env = HashMap::from([("FAITH_TYPES_PATH", "  ")]);
        let config = Config::from_lookup(|key| env.get(key).map(|v| v.to_string()));
        assert_eq!(config.questions_path, PathBuf::from("data/questions.json"));
        assert_eq!(config.types_path, PathBuf::from("data/types.json"));
        assert_eq!(config.groups_path, PathBuf::from("groups.json"));
        assert_eq!(config.dialogue_db, "db.sqlite");
    }

    #[test]
    fn environment_overrides_defaults() {
        let env = HashMap::from([
            ("FAITH_QUESTIONS_PATH", "/srv/faith/questions.json"),
            ("FAITH_DIALOGUE_DB", "/var/lib/faith/dialogues.sqlite"),
        ]);
        let config = Config::from_lookup(|key| env.get(key).map(|v| v.to_string()));
        assert_eq!(config.questions_path, PathBuf::from("/srv/faith/questions.json"));
        assert_eq!(config.dialogue_db, "/var/lib/faith/dialogues.sqlite");
    }
}

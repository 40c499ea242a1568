use crate::api::odds_api::PropQuery;
use crate::api::projections_api::FANDUEL_SITE;
use anyhow::{anyhow, Result};
use std::fmt;
use std::path::PathBuf;

pub const DEFAULT_BOOKMAKER: &str = "draftkings";
pub const DEFAULT_CACHE_DIR: &str = "cache";

/// Sign-in details for the projections provider
#[derive(Clone)]
pub struct ProjectionCredentials {
    pub web_api_key: String,
    pub email: String,
    pub password: String,
}

impl fmt::Debug for ProjectionCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProjectionCredentials")
            .field("email", &self.email)
            .finish_non_exhaustive()
    }
}

/// Runtime settings, read from the environment (and `.env`)
#[derive(Debug, Clone)]
pub struct Settings {
    pub odds_api_key: String,
    pub projections: Option<ProjectionCredentials>,
    pub bookmakers: Vec<String>,
    pub site: String,
    pub cache_dir: PathBuf,
}

impl Settings {
    /// Read settings from process environment variables
    /// Call `dotenv::dotenv()` first to pick up a `.env` file
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build settings from any key lookup; blank values count as unset
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let odds_api_key = get("ODDS_API_KEY")
            .ok_or_else(|| anyhow!("ODDS_API_KEY not set in environment or .env file"))?;

        let projections = match (
            get("PROJECTIONS_WEB_API_KEY"),
            get("PROJECTIONS_EMAIL"),
            get("PROJECTIONS_PASSWORD"),
        ) {
            (Some(web_api_key), Some(email), Some(password)) => Some(ProjectionCredentials {
                web_api_key,
                email,
                password,
            }),
            _ => None,
        };

        let bookmakers = get("PROPS_BOOKMAKERS")
            .map(|v| parse_list(&v))
            .filter(|list| !list.is_empty())
            .unwrap_or_else(|| vec![DEFAULT_BOOKMAKER.to_string()]);

        Ok(Self {
            odds_api_key,
            projections,
            bookmakers,
            site: get("PROPS_SITE").unwrap_or_else(|| FANDUEL_SITE.to_string()),
            cache_dir: get("CACHE_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_CACHE_DIR)),
        })
    }

    pub fn require_projections(&self) -> Result<&ProjectionCredentials> {
        self.projections.as_ref().ok_or_else(|| {
            anyhow!(
                "PROJECTIONS_WEB_API_KEY, PROJECTIONS_EMAIL and PROJECTIONS_PASSWORD must be set to fetch projections"
            )
        })
    }

    pub fn prop_query(&self) -> PropQuery {
        PropQuery {
            bookmakers: self.bookmakers.clone(),
            ..PropQuery::default()
        }
    }

    pub fn cache_file(&self, name: &str) -> PathBuf {
        self.cache_dir.join(name)
    }
}

/// Split a comma-separated list, dropping blanks
pub fn parse_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let settings = Settings::from_lookup(lookup(&[("ODDS_API_KEY", "abc")])).unwrap();
        assert_eq!(settings.odds_api_key, "abc");
        assert!(settings.projections.is_none());
        assert!(settings.require_projections().is_err());
        assert_eq!(settings.bookmakers, vec!["draftkings"]);
        assert_eq!(settings.site, "fd");
        assert_eq!(settings.cache_file("odds.json"), PathBuf::from("cache/odds.json"));
    }

    #[test]
    fn test_missing_odds_key_is_an_error() {
        assert!(Settings::from_lookup(lookup(&[])).is_err());
        assert!(Settings::from_lookup(lookup(&[("ODDS_API_KEY", "  ")])).is_err());
    }

    #[test]
    fn test_overrides() {
        let settings = Settings::from_lookup(lookup(&[
            ("ODDS_API_KEY", "abc"),
            ("PROJECTIONS_WEB_API_KEY", "web"),
            ("PROJECTIONS_EMAIL", "me@example.com"),
            ("PROJECTIONS_PASSWORD", "hunter2"),
            ("PROPS_BOOKMAKERS", "fanduel, draftkings,,"),
            ("CACHE_DIR", "/tmp/props"),
        ]))
        .unwrap();

        let creds = settings.require_projections().unwrap();
        assert_eq!(creds.email, "me@example.com");
        assert!(!format!("{:?}", creds).contains("hunter2"));
        assert_eq!(settings.prop_query().bookmakers, vec!["fanduel", "draftkings"]);
        assert_eq!(settings.cache_dir, PathBuf::from("/tmp/props"));
    }
}

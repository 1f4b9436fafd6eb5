use std::env;

use crate::error::Error;

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum StoreKind {
    MongoDb,
    Memory,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Config {
    pub store: StoreKind,
    pub mongodb_uri: String,
    pub database_name: String,
    pub bind_address: String,
    pub seed: bool,
}

impl Config {
    pub fn from_env() -> Result<Config, Error> {
        Config::from_lookup(|name| env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Config, Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let store = match lookup("CAMPAIGN_STORE").as_deref() {
            None | Some("mongodb") => StoreKind::MongoDb,
            Some("memory") => StoreKind::Memory,
            Some(other) => {
                return Err(Error::InvalidConfig {
                    name: "CAMPAIGN_STORE",
                    value: other.to_string(),
                })
            }
        };

        let seed = match lookup("SEED").as_deref() {
            None | Some("false") => false,
            Some("true") => true,
            Some(other) => {
                return Err(Error::InvalidConfig {
                    name: "SEED",
                    value: other.to_string(),
                })
            }
        };

        Ok(Config {
            store,
            mongodb_uri: lookup("MONGODB_URI")
                .unwrap_or_else(|| "mongodb://localhost:27017".to_string()),
            database_name: lookup("MONGODB_DATABASE").unwrap_or_else(|| "campaigns".to_string()),
            bind_address: lookup("BIND_ADDRESS").unwrap_or_else(|| "127.0.0.1:8080".to_string()),
            seed,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(name, value)| (name.to_string(), value.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn defaults_when_nothing_is_set() {
        let config = Config::from_lookup(lookup(&[])).unwrap();

        assert_eq!(
            config,
            Config {
                store: StoreKind::MongoDb,
                mongodb_uri: "mongodb://localhost:27017".into(),
                database_name: "campaigns".into(),
                bind_address: "127.0.0.1:8080".into(),
                seed: false,
            }
        );
    }

    #[test]
    fn reads_overrides() {
        let config = Config::from_lookup(lookup(&[
            ("CAMPAIGN_STORE", "memory"),
            ("BIND_ADDRESS", "0.0.0.0:9000"),
            ("SEED", "true"),
        ]))
        .unwrap();

        assert_eq!(config.store, StoreKind::Memory);
        assert_eq!(config.bind_address, "0.0.0.0:9000");
        assert!(config.seed);
    }

    #[test]
    fn rejects_unknown_store() {
        let result = Config::from_lookup(lookup(&[("CAMPAIGN_STORE", "postgres")]));

        assert_eq!(
            result.unwrap_err(),
            Error::InvalidConfig {
                name: "CAMPAIGN_STORE",
                value: "postgres".into(),
            }
        );
    }
}

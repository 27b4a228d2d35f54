//! `cmon show-config`

use anyhow::{Context, Result};

use crate::domain::models::config::Config;

const REDACTED: &str = "********";

/// The configuration as YAML, with passwords masked.
pub fn render(config: &Config) -> Result<String> {
    let mut config = config.clone();
    for db in &mut config.databases {
        if db.password.is_some() {
            db.password = Some(REDACTED.to_string());
        }
    }
    for site in &mut config.websites {
        if site.http_password.is_some() {
            site.http_password = Some(REDACTED.to_string());
        }
        for url in &mut site.urls {
            if url.http_password.is_some() {
                url.http_password = Some(REDACTED.to_string());
            }
        }
    }
    serde_yaml::to_string(&config).context("Failed to serialize configuration")
}

pub fn execute(config: &Config) -> Result<()> {
    print!("{}", render(config)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_passwords_are_masked() {
        let config: Config = serde_yaml::from_str(
            r"
servers:
  - id: dbhost
    hostname: db
databases:
  - id: main
    host: dbhost
    user: pg
    password: hunter2
",
        )
        .unwrap();
        let out = render(&config).unwrap();
        assert!(!out.contains("hunter2"));
        assert!(out.contains(REDACTED));
        assert!(out.contains("user: pg"));
    }
}

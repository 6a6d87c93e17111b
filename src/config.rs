use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    ParseError(#[from] serde_json::Error),

    #[error("Failed to create config directory")]
    CreateDirError,
}

/// An SMTP submission endpoint: where to connect and whether to upgrade
/// the connection with STARTTLS before authenticating.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SmtpServer {
    pub address: String,
    pub port: u16,
    pub tls: bool,
}

impl SmtpServer {
    pub fn new(address: impl Into<String>, port: u16, tls: bool) -> Self {
        Self {
            address: address.into(),
            port,
            tls,
        }
    }

    /// Outlook / Office 365 submission endpoint.
    pub fn outlook() -> Self {
        Self::new("smtp-mail.outlook.com", 587, true)
    }

    /// Gmail submission endpoint.
    pub fn gmail() -> Self {
        Self::new("smtp.gmail.com", 587, true)
    }
}

impl Default for SmtpServer {
    fn default() -> Self {
        Self::new("smtp.example.com", 587, true)
    }
}

/// A sender profile: the address to send as, the server to submit
/// through, and the credentials to log in with.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    pub name: String,
    pub email: String,
    pub server: SmtpServer,
    pub username: String,
    pub password: String,
}

impl Default for Account {
    fn default() -> Self {
        Self {
            name: "Default Account".to_string(),
            email: "user@example.com".to_string(),
            server: SmtpServer::default(),
            username: "user@example.com".to_string(),
            password: "".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    pub accounts: Vec<Account>,
    pub default_account: usize,
}

impl Config {
    pub fn load(path: &str) -> Result<Self, ConfigError> {
        let path = Path::new(path);

        // If the file doesn't exist, return default config
        if !path.exists() {
            return Ok(Config::default());
        }

        let content = fs::read_to_string(path)?;
        let config = serde_json::from_str(&content)?;
        log::debug!("loaded config from {}", path.display());

        Ok(config)
    }

    pub fn save(&self, path: &str) -> Result<(), ConfigError> {
        let path = Path::new(path);

        // Create parent directory if it doesn't exist
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|_| ConfigError::CreateDirError)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)?;
        log::debug!("saved config to {}", path.display());

        Ok(())
    }

    pub fn get_current_account(&self) -> Result<&Account, &'static str> {
        if self.accounts.is_empty() {
            return Err("No accounts configured");
        }

        if self.default_account >= self.accounts.len() {
            return Err("Default account index out of bounds");
        }

        Ok(&self.accounts[self.default_account])
    }

    pub fn add_account(&mut self, account: Account) {
        self.accounts.push(account);
    }

    pub fn set_default_account(&mut self, index: usize) -> Result<(), &'static str> {
        if index >= self.accounts.len() {
            return Err("Account index out of bounds");
        }

        self.default_account = index;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn well_known_servers_use_starttls_submission() {
        let outlook = SmtpServer::outlook();
        assert_eq!(outlook.address, "smtp-mail.outlook.com");
        assert_eq!(outlook.port, 587);
        assert!(outlook.tls);

        let gmail = SmtpServer::gmail();
        assert_eq!(gmail.address, "smtp.gmail.com");
        assert_eq!(gmail.port, 587);
        assert!(gmail.tls);
    }

    #[test]
    fn load_missing_file_returns_default() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nope.json");
        let config = Config::load(path.to_str().unwrap()).unwrap();
        assert!(config.accounts.is_empty());
        assert_eq!(config.default_account, 0);
    }

    #[test]
    fn save_then_load_roundtrips_accounts() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        let path = path.to_str().unwrap();

        let mut config = Config::default();
        config.add_account(Account {
            name: "Work".to_string(),
            email: "me@work.example".to_string(),
            server: SmtpServer::outlook(),
            username: "me@work.example".to_string(),
            password: "hunter2".to_string(),
        });
        config.save(path).unwrap();

        let loaded = Config::load(path).unwrap();
        assert_eq!(loaded.accounts.len(), 1);
        let account = loaded.get_current_account().unwrap();
        assert_eq!(account.email, "me@work.example");
        assert_eq!(account.server, SmtpServer::outlook());
    }

    #[test]
    fn current_account_requires_a_valid_index() {
        let mut config = Config::default();
        assert!(config.get_current_account().is_err());

        config.add_account(Account::default());
        assert!(config.get_current_account().is_ok());
        assert!(config.set_default_account(1).is_err());
        assert!(config.set_default_account(0).is_ok());
    }
}

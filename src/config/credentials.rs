//! Credential handling for D+ authentication
//!
//! The D+ login endpoint takes a plain username/password pair; credentials
//! are supplied by the host configuration layer or read from the
//! environment.

use crate::error::{DplusError, Result};
use serde::{Deserialize, Serialize};
use std::env;

// Environment variable names shared with the setup documentation.
const USERNAME_VAR: &str = "DPLUS_USERNAME";
const PASSWORD_VAR: &str = "DPLUS_PASSWORD";

/// D+ login credentials
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DplusCredentials {
    /// Username for D+ authentication
    pub username: String,

    /// Password for D+ authentication
    pub password: String,
}

impl DplusCredentials {
    /// Create credentials from explicit values
    pub fn new<U: Into<String>, P: Into<String>>(username: U, password: P) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    /// Load credentials from `DPLUS_USERNAME` / `DPLUS_PASSWORD`
    pub fn from_env() -> Result<Self> {
        let username = env::var(USERNAME_VAR)
            .map_err(|_| DplusError::credentials(format!("{USERNAME_VAR} not set")))?;
        let password = env::var(PASSWORD_VAR)
            .map_err(|_| DplusError::credentials(format!("{PASSWORD_VAR} not set")))?;

        Ok(Self { username, password })
    }

    /// Validate that the credentials are usable
    pub fn validate(&self) -> Result<()> {
        if self.username.is_empty() {
            return Err(DplusError::credentials("Username cannot be empty"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_credentials_validate() {
        let credentials = DplusCredentials::new("installer", "secret");
        assert!(credentials.validate().is_ok());

        let anonymous = DplusCredentials::new("", "");
        assert!(anonymous.validate().is_err());
    }
}

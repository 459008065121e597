use crate::config::AuthConfig;
use std::collections::BTreeMap;
use thiserror::Error;

/// Why a login attempt was refused. The messages are shown on the login page.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginError {
    #[error("用户名不存在！")]
    UnknownUser,

    #[error("密码错误！")]
    WrongPassword,
}

/// Fixed username/password table loaded from configuration.
#[derive(Debug, Clone, Default)]
pub struct CredentialTable {
    users: BTreeMap<String, String>,
}

impl CredentialTable {
    pub fn new(users: BTreeMap<String, String>) -> Self {
        Self { users }
    }

    pub fn verify(&self, username: &str, password: &str) -> Result<(), LoginError> {
        match self.users.get(username.trim()) {
            None => Err(LoginError::UnknownUser),
            Some(expected) if expected != password => Err(LoginError::WrongPassword),
            Some(_) => Ok(()),
        }
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}

impl From<&AuthConfig> for CredentialTable {
    fn from(config: &AuthConfig) -> Self {
        Self::new(config.users.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> CredentialTable {
        (&AuthConfig::default()).into()
    }

    #[test]
    fn accepts_known_credentials() {
        assert_eq!(table().verify("admin", "admin123"), Ok(()));
        assert_eq!(table().verify(" user ", "user123"), Ok(()));
    }

    #[test]
    fn distinguishes_unknown_user_from_wrong_password() {
        assert_eq!(table().verify("root", "admin123"), Err(LoginError::UnknownUser));
        assert_eq!(table().verify("admin", "user123"), Err(LoginError::WrongPassword));
        assert_eq!(table().verify("admin", ""), Err(LoginError::WrongPassword));
    }

    #[test]
    fn messages_are_user_facing() {
        assert_eq!(LoginError::UnknownUser.to_string(), "用户名不存在！");
        assert_eq!(LoginError::WrongPassword.to_string(), "密码错误！");
    }
}

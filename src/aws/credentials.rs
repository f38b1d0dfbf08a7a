//! Credential sources
//!
//! Enumerates the accounts a search fans out over. Two backends: the shared
//! credentials file (`~/.aws/credentials`, the default) and an OS-keychain
//! store indexed by a small JSON file. Both are read-only; nothing here ever
//! mutates credential storage.

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Keychain service name for the store backend.
const KEYRING_SERVICE: &str = "awsfind";

/// One independent set of account credentials.
///
/// Owned by the session factory that consumes it; never shared between
/// sessions.
#[derive(Debug, Clone)]
pub struct AccountCredential {
    /// Profile or account name, used only for diagnostics.
    pub name: String,
    pub access_key_id: String,
    pub secret_access_key: String,
    pub session_token: Option<String>,
}

/// List accounts from the shared credentials file at the conventional path.
pub fn from_shared_file() -> Result<Vec<AccountCredential>> {
    let path = dirs::home_dir()
        .context("Could not determine the home directory")?
        .join(".aws")
        .join("credentials");
    from_shared_file_at(&path)
}

/// List accounts from a shared credentials file at an explicit path.
///
/// Errors if the file is missing so the run stops before any session is
/// built. Profile sections without a complete key pair are skipped with a
/// warning rather than failing the accounts that are usable.
pub fn from_shared_file_at(path: &Path) -> Result<Vec<AccountCredential>> {
    if !path.exists() {
        bail!("No credentials file found at {}", path.display());
    }
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read credentials file at {}", path.display()))?;
    Ok(parse_profiles(&contents))
}

/// Parse the profile sections of a shared credentials file.
pub fn parse_profiles(contents: &str) -> Vec<AccountCredential> {
    let mut profiles = Vec::new();
    let mut name: Option<String> = None;
    let mut access_key: Option<String> = None;
    let mut secret_key: Option<String> = None;
    let mut token: Option<String> = None;

    fn flush(
        profiles: &mut Vec<AccountCredential>,
        name: Option<String>,
        access_key: Option<String>,
        secret_key: Option<String>,
        token: Option<String>,
    ) {
        let Some(name) = name else {
            return;
        };
        match (access_key, secret_key) {
            (Some(access_key_id), Some(secret_access_key)) => {
                profiles.push(AccountCredential {
                    name,
                    access_key_id,
                    secret_access_key,
                    session_token: token,
                });
            }
            _ => {
                tracing::warn!("Skipping profile '{}': incomplete key pair", name);
            }
        }
    }

    for line in contents.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') || line.starts_with(';') {
            continue;
        }
        if let Some(section) = line.strip_prefix('[').and_then(|l| l.strip_suffix(']')) {
            flush(
                &mut profiles,
                name.take(),
                access_key.take(),
                secret_key.take(),
                token.take(),
            );
            name = Some(section.trim().to_string());
            continue;
        }
        let Some((key, value)) = line.split_once('=') else {
            continue;
        };
        let value = value.trim().to_string();
        match key.trim().to_ascii_lowercase().as_str() {
            "aws_access_key_id" => access_key = Some(value),
            "aws_secret_access_key" => secret_key = Some(value),
            "aws_session_token" => token = Some(value),
            _ => {}
        }
    }
    flush(&mut profiles, name, access_key, secret_key, token);

    profiles
}

/// Index of accounts held in the keychain store.
#[derive(Debug, Serialize, Deserialize)]
struct StoreIndex {
    #[serde(default)]
    accounts: Vec<StoreEntry>,
}

#[derive(Debug, Serialize, Deserialize)]
struct StoreEntry {
    account: String,
    username: String,
}

/// Secret material held per account in the keychain.
#[derive(Debug, Deserialize)]
struct StoredSecret {
    access_key_id: String,
    secret_access_key: String,
    #[serde(default)]
    session_token: Option<String>,
}

/// List accounts from the OS-keychain store.
///
/// The index file only names account/username pairs; the key material sits
/// in the keychain under the `awsfind` service and never touches disk in the
/// clear. A keychain read or parse failure is fatal for the whole run - a
/// partially readable store is treated as broken, not as fewer accounts.
pub fn from_keyring() -> Result<Vec<AccountCredential>> {
    let path = dirs::config_dir()
        .context("Could not determine the config directory")?
        .join("awsfind")
        .join("accounts.json");
    from_keyring_index(&path)
}

fn from_keyring_index(path: &Path) -> Result<Vec<AccountCredential>> {
    if !path.exists() {
        bail!("No account index found at {}", path.display());
    }
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read account index at {}", path.display()))?;
    let index: StoreIndex = serde_json::from_str(&contents)
        .with_context(|| format!("Malformed account index at {}", path.display()))?;

    let mut accounts = Vec::with_capacity(index.accounts.len());
    for entry in &index.accounts {
        let user = format!("{}@{}", entry.username, entry.account);
        let secret = keyring::Entry::new(KEYRING_SERVICE, &user)
            .and_then(|e| e.get_password())
            .with_context(|| format!("Failed to read keychain entry for {}", user))?;
        let stored: StoredSecret = serde_json::from_str(&secret)
            .with_context(|| format!("Malformed keychain entry for {}", user))?;
        accounts.push(AccountCredential {
            name: entry.account.clone(),
            access_key_id: stored.access_key_id,
            secret_access_key: stored.secret_access_key,
            session_token: stored.session_token,
        });
    }
    Ok(accounts)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_multiple_profiles() {
        let contents = r#"
[default]
aws_access_key_id = AKIADEFAULT
aws_secret_access_key = secret-default

[prod]
aws_access_key_id = AKIAPROD
aws_secret_access_key = secret-prod
aws_session_token = token-prod
"#;
        let profiles = parse_profiles(contents);
        assert_eq!(profiles.len(), 2);
        assert_eq!(profiles[0].name, "default");
        assert_eq!(profiles[0].access_key_id, "AKIADEFAULT");
        assert_eq!(profiles[0].session_token, None);
        assert_eq!(profiles[1].name, "prod");
        assert_eq!(profiles[1].secret_access_key, "secret-prod");
        assert_eq!(profiles[1].session_token.as_deref(), Some("token-prod"));
    }

    #[test]
    fn skips_sections_without_a_complete_key_pair() {
        let contents = r#"
[broken]
aws_access_key_id = AKIAONLY

[ok]
aws_access_key_id = AKIAOK
aws_secret_access_key = s3cret
"#;
        let profiles = parse_profiles(contents);
        assert_eq!(profiles.len(), 1);
        assert_eq!(profiles[0].name, "ok");
    }

    #[test]
    fn ignores_comments_blank_lines_and_unknown_keys() {
        let contents = r#"
# a comment
; another comment

[dev]
aws_access_key_id = AKIADEV
aws_secret_access_key = devsecret
region = eu-west-1
output = json
"#;
        let profiles = parse_profiles(contents);
        assert_eq!(profiles.len(), 1);
        assert_eq!(profiles[0].name, "dev");
    }

    #[test]
    fn key_names_are_case_insensitive() {
        let contents = "[x]\nAWS_ACCESS_KEY_ID = a\nAws_Secret_Access_Key = b\n";
        let profiles = parse_profiles(contents);
        assert_eq!(profiles.len(), 1);
        assert_eq!(profiles[0].access_key_id, "a");
        assert_eq!(profiles[0].secret_access_key, "b");
    }

    #[test]
    fn empty_input_yields_no_profiles() {
        assert!(parse_profiles("").is_empty());
    }

    #[test]
    fn missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("credentials");
        let err = from_shared_file_at(&path).unwrap_err();
        assert!(err.to_string().contains("No credentials file found"));
    }

    #[test]
    fn reads_profiles_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("credentials");
        std::fs::write(
            &path,
            "[default]\naws_access_key_id = AKIA\naws_secret_access_key = s\n",
        )
        .unwrap();
        let profiles = from_shared_file_at(&path).unwrap();
        assert_eq!(profiles.len(), 1);
        assert_eq!(profiles[0].name, "default");
    }

    #[test]
    fn missing_store_index_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("accounts.json");
        let err = from_keyring_index(&path).unwrap_err();
        assert!(err.to_string().contains("No account index found"));
    }

    #[test]
    fn malformed_store_index_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("accounts.json");
        std::fs::write(&path, "not json").unwrap();
        let err = from_keyring_index(&path).unwrap_err();
        assert!(err.to_string().contains("Malformed account index"));
    }

    #[test]
    fn empty_store_index_yields_no_accounts() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("accounts.json");
        std::fs::write(&path, r#"{"accounts": []}"#).unwrap();
        let accounts = from_keyring_index(&path).unwrap();
        assert!(accounts.is_empty());
    }
}

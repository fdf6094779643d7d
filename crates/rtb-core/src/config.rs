use std::{
    env, fs,
    path::{Path, PathBuf},
};

use crate::{errors::Error, Result};

/// Typed configuration, loaded from the environment at process start.
#[derive(Clone, Debug)]
pub struct Config {
    /// Telegram bot token.
    pub telegram_bot_token: String,
    /// The single administrator. Relayed messages and security notices go
    /// to this user's private chat.
    pub admin_user_id: i64,
    /// Directory holding the message log and block-list files.
    pub data_dir: PathBuf,
    /// Default number of records shown by the history view.
    pub history_limit: usize,
}

impl Config {
    pub fn load() -> Result<Self> {
        load_dotenv_if_present(Path::new(".env"));

        let telegram_bot_token = env_str("TELEGRAM_BOT_TOKEN").unwrap_or_default();
        if telegram_bot_token.trim().is_empty() {
            return Err(Error::Config(
                "TELEGRAM_BOT_TOKEN environment variable is required".to_string(),
            ));
        }

        let admin_user_id = env_str("ADMIN_USER_ID")
            .and_then(|s| s.trim().parse::<i64>().ok())
            .ok_or_else(|| {
                Error::Config("ADMIN_USER_ID environment variable is required".to_string())
            })?;

        let data_dir = env_path("DATA_DIR").unwrap_or_else(|| PathBuf::from("./data"));
        fs::create_dir_all(&data_dir)?;

        let history_limit = env_usize("HISTORY_LIMIT").unwrap_or(10);

        Ok(Self {
            telegram_bot_token,
            admin_user_id,
            data_dir,
            history_limit,
        })
    }
}

fn env_str(key: &str) -> Option<String> {
    env::var(key).ok()
}

fn env_usize(key: &str) -> Option<usize> {
    env_str(key).and_then(|s| s.trim().parse::<usize>().ok())
}

fn env_path(key: &str) -> Option<PathBuf> {
    env::var_os(key).map(PathBuf::from)
}

fn load_dotenv_if_present(path: &Path) {
    let Ok(contents) = fs::read_to_string(path) else {
        return;
    };

    for raw in contents.lines() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let Some((k, v)) = line.split_once('=') else {
            continue;
        };

        let key = k.trim();
        if key.is_empty() {
            continue;
        }
        if env::var_os(key).is_some() {
            continue; // do not override existing env
        }

        let mut val = v.trim().to_string();
        // Strip optional surrounding quotes.
        if val.len() >= 2
            && ((val.starts_with('"') && val.ends_with('"'))
                || (val.starts_with('\'') && val.ends_with('\'')))
        {
            val = val[1..val.len() - 1].to_string();
        }

        env::set_var(key, val);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dotenv_does_not_override_existing_env() {
        let dir = PathBuf::from(format!("/tmp/rtb-dotenv-{}", std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join(".env");
        fs::write(&path, "RTB_TEST_PRESET=from_file\nRTB_TEST_FRESH=\"quoted\"\n").unwrap();

        env::set_var("RTB_TEST_PRESET", "from_env");
        env::remove_var("RTB_TEST_FRESH");

        load_dotenv_if_present(&path);

        assert_eq!(env::var("RTB_TEST_PRESET").unwrap(), "from_env");
        assert_eq!(env::var("RTB_TEST_FRESH").unwrap(), "quoted");

        let _ = fs::remove_dir_all(&dir);
    }
}

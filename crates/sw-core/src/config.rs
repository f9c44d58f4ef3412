use std::{
    env, fs,
    path::{Path, PathBuf},
    time::Duration,
};

use crate::{errors::Error, Result};

const CHROMIUM_CANDIDATES: &[&str] = &[
    "chromium",
    "chromium-browser",
    "google-chrome",
    "google-chrome-stable",
];

/// Typed configuration for the monitor bot.
#[derive(Clone, Debug)]
pub struct Config {
    // Core
    pub telegram_bot_token: String,

    // Storage
    pub data_file: PathBuf,
    pub screenshots_dir: PathBuf,
    pub temp_dir: PathBuf,

    // Sweep
    pub sweep_interval: Duration,
    pub inspect_timeout: Duration,
    pub screenshot_timeout: Duration,

    // Page inspection
    pub http_user_agent: String,

    // Screenshots
    pub chromium_path: PathBuf,
    pub screenshot_width: u32,
    pub screenshot_height: u32,
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

        let data_file = env_path("DATA_FILE").unwrap_or_else(|| PathBuf::from("userData.json"));
        let screenshots_dir =
            env_path("SCREENSHOTS_DIR").unwrap_or_else(|| PathBuf::from("screenshots"));
        let temp_dir = env_path("TEMP_DIR").unwrap_or_else(|| PathBuf::from("/tmp/sitewatch"));

        // Chromium writes its screenshot into temp_dir before we move it into place.
        fs::create_dir_all(&temp_dir)?;

        let sweep_interval = Duration::from_secs(
            env_u64("SWEEP_INTERVAL_SECS")
                .filter(|v| *v > 0)
                .unwrap_or(180),
        );
        let inspect_timeout =
            Duration::from_millis(env_u64("INSPECT_TIMEOUT_MS").unwrap_or(20_000));
        let screenshot_timeout =
            Duration::from_millis(env_u64("SCREENSHOT_TIMEOUT_MS").unwrap_or(60_000));

        let http_user_agent = env_str("HTTP_USER_AGENT")
            .and_then(non_empty)
            .unwrap_or_else(|| format!("sitewatch/{}", env!("CARGO_PKG_VERSION")));

        let chromium_path = env_path("CHROMIUM_PATH")
            .or_else(|| CHROMIUM_CANDIDATES.iter().find_map(|b| which_in_path(b)))
            .unwrap_or_else(|| PathBuf::from("/usr/bin/chromium"));
        let screenshot_width = env_u32("SCREENSHOT_WIDTH").unwrap_or(1280);
        let screenshot_height = env_u32("SCREENSHOT_HEIGHT").unwrap_or(800);

        Ok(Self {
            telegram_bot_token,
            data_file,
            screenshots_dir,
            temp_dir,
            sweep_interval,
            inspect_timeout,
            screenshot_timeout,
            http_user_agent,
            chromium_path,
            screenshot_width,
            screenshot_height,
        })
    }
}

fn env_str(key: &str) -> Option<String> {
    env::var(key).ok()
}

fn load_dotenv_if_present(path: &Path) {
    let Ok(contents) = fs::read_to_string(path) else {
        return;
    };

    for (key, val) in parse_dotenv(&contents) {
        if env::var_os(&key).is_some() {
            continue; // do not override existing env
        }
        env::set_var(key, val);
    }
}

fn parse_dotenv(contents: &str) -> Vec<(String, String)> {
    let mut out = Vec::new();
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

        let mut val = v.trim().to_string();
        // Strip optional surrounding quotes.
        if val.len() >= 2
            && ((val.starts_with('"') && val.ends_with('"'))
                || (val.starts_with('\'') && val.ends_with('\'')))
        {
            val = val[1..val.len() - 1].to_string();
        }

        out.push((key.to_string(), val));
    }
    out
}

fn env_u64(key: &str) -> Option<u64> {
    env_str(key).and_then(|s| s.trim().parse::<u64>().ok())
}

fn env_u32(key: &str) -> Option<u32> {
    env_str(key).and_then(|s| s.trim().parse::<u32>().ok())
}

fn env_path(key: &str) -> Option<PathBuf> {
    env::var_os(key)
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
}

fn which_in_path(binary: &str) -> Option<PathBuf> {
    let path = env::var_os("PATH")?;
    for dir in env::split_paths(&path) {
        let candidate = dir.join(binary);
        if is_executable_file(&candidate) {
            return Some(candidate);
        }
    }
    None
}

fn is_executable_file(p: &Path) -> bool {
    if !p.is_file() {
        return false;
    }
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        if let Ok(md) = fs::metadata(p) {
            return (md.permissions().mode() & 0o111) != 0;
        }
    }
    true
}

fn non_empty(s: String) -> Option<String> {
    if s.trim().is_empty() {
        None
    } else {
        Some(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dotenv_parser_skips_comments_and_strips_quotes() {
        let parsed = parse_dotenv(
            "# comment\n\nTELEGRAM_BOT_TOKEN=\"abc:123\"\nSWEEP_INTERVAL_SECS = 60\nnot a pair\n=novalue\n",
        );
        assert_eq!(
            parsed,
            vec![
                ("TELEGRAM_BOT_TOKEN".to_string(), "abc:123".to_string()),
                ("SWEEP_INTERVAL_SECS".to_string(), "60".to_string()),
            ]
        );
    }

    #[test]
    fn non_empty_filters_blank_values() {
        assert_eq!(non_empty("  ".to_string()), None);
        assert_eq!(non_empty("ua".to_string()), Some("ua".to_string()));
    }
}

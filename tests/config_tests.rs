use anyhow::Result;
use chorus::ChorusError;
use chorus::config::{
    Config, ConfigOverrides, ConfigPaths, ENV_API_KEY, ENV_MAX_TOKENS, ENV_MODELS, Settings,
};
use std::collections::HashMap;
use std::fs;
use std::time::Duration;
use tempfile::TempDir;

fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
        .collect()
}

fn paths_in(dir: &TempDir) -> ConfigPaths {
    ConfigPaths {
        key_file: dir.path().join(".openai_key"),
        settings_file: Some(dir.path().join("config.toml")),
    }
}

#[test]
fn test_key_file_used_when_env_missing() -> Result<()> {
    let dir = TempDir::new()?;
    let paths = paths_in(&dir);
    fs::write(&paths.key_file, "sk-from-file\n")?;

    let config = Config::from_sources(&ConfigOverrides::default(), &env(&[]), &paths)?;

    assert_eq!(config.api_key, "sk-from-file");
    Ok(())
}

#[test]
fn test_env_key_beats_key_file() -> Result<()> {
    let dir = TempDir::new()?;
    let paths = paths_in(&dir);
    fs::write(&paths.key_file, "sk-from-file")?;

    let config = Config::from_sources(
        &ConfigOverrides::default(),
        &env(&[(ENV_API_KEY, "sk-from-env")]),
        &paths,
    )?;

    assert_eq!(config.api_key, "sk-from-env");
    Ok(())
}

#[test]
fn test_blank_key_file_is_config_unavailable() -> Result<()> {
    let dir = TempDir::new()?;
    let paths = paths_in(&dir);
    fs::write(&paths.key_file, "  \n")?;

    let result = Config::from_sources(&ConfigOverrides::default(), &env(&[]), &paths);

    assert_eq!(result, Err(ChorusError::ConfigUnavailable));
    Ok(())
}

#[test]
fn test_settings_file_applies_below_env() -> Result<()> {
    let dir = TempDir::new()?;
    let paths = paths_in(&dir);
    fs::write(
        paths
            .settings_file
            .as_ref()
            .ok_or_else(|| anyhow::anyhow!("settings path"))?,
        r#"
max_tokens = 250
prompt_prefix = "Be terse: "
models = ["gpt-4", "text-davinci-003"]
judge_model = "gpt-4"
timeout_secs = 30
"#,
    )?;

    let from_file = Config::from_sources(
        &ConfigOverrides::default(),
        &env(&[(ENV_API_KEY, "k")]),
        &paths,
    )?;
    assert_eq!(from_file.max_tokens, 250);
    assert_eq!(from_file.prompt_prefix, "Be terse: ");
    assert_eq!(from_file.models, ["gpt-4", "text-davinci-003"]);
    assert_eq!(from_file.judge_model, "gpt-4");
    assert_eq!(from_file.timeout, Duration::from_secs(30));

    let env_wins = Config::from_sources(
        &ConfigOverrides::default(),
        &env(&[
            (ENV_API_KEY, "k"),
            (ENV_MAX_TOKENS, "12"),
            (ENV_MODELS, "gpt-3.5-turbo"),
        ]),
        &paths,
    )?;
    assert_eq!(env_wins.max_tokens, 12);
    assert_eq!(env_wins.models, ["gpt-3.5-turbo"]);
    assert_eq!(env_wins.judge_model, "gpt-4");
    Ok(())
}

#[test]
fn test_invalid_settings_file_is_invalid_config() -> Result<()> {
    let dir = TempDir::new()?;
    let paths = paths_in(&dir);
    fs::write(
        paths
            .settings_file
            .as_ref()
            .ok_or_else(|| anyhow::anyhow!("settings path"))?,
        "max_tokens = [not toml",
    )?;

    let result = Config::from_sources(
        &ConfigOverrides::default(),
        &env(&[(ENV_API_KEY, "k")]),
        &paths,
    );

    assert!(matches!(result, Err(ChorusError::InvalidConfig(_))));
    Ok(())
}

#[test]
fn test_missing_settings_file_yields_defaults() -> Result<()> {
    let dir = TempDir::new()?;
    let settings = Settings::load(&dir.path().join("absent.toml"))?;
    assert_eq!(settings, Settings::default());
    Ok(())
}

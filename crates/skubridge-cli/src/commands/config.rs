use std::env;

use serde::Serialize;
use skubridge_core::config::{ENV_API_BASE_URL, ENV_API_TOKEN, ENV_TIMEOUT_SECS};
use skubridge_core::models::{SyncDirection, SyncMode};

use crate::cli::ConfigCommands;
use crate::config_profiles::{normalize_text_option, CliProfile, CliProfilesConfig};
use crate::error::CliError;

/// Values passed to `config init`; unset fields keep their current value
#[derive(Debug, Clone, Default)]
pub struct ConfigInit {
    pub base_url: Option<String>,
    pub api_token: Option<String>,
    pub timeout_secs: Option<u64>,
    pub default_direction: Option<SyncDirection>,
    pub default_mode: Option<SyncMode>,
    pub activate: bool,
}

#[derive(Debug, Serialize)]
struct ProfileView {
    profile: String,
    active: bool,
    base_url: Option<String>,
    api_token: Option<&'static str>,
    timeout_secs: Option<u64>,
    default_direction: Option<SyncDirection>,
    default_mode: Option<SyncMode>,
}

pub fn run_config(command: ConfigCommands, global_profile: Option<&str>) -> Result<(), CliError> {
    match command {
        ConfigCommands::Init {
            base_url,
            api_token,
            timeout_secs,
            default_direction,
            default_mode,
            no_activate,
        } => {
            let init = ConfigInit {
                base_url: normalize_text_option(base_url)
                    .or_else(|| normalize_text_option(env::var(ENV_API_BASE_URL).ok())),
                api_token: normalize_text_option(api_token)
                    .or_else(|| normalize_text_option(env::var(ENV_API_TOKEN).ok())),
                timeout_secs: match timeout_secs {
                    Some(secs) => Some(secs),
                    None => env_timeout_secs()?,
                },
                default_direction: default_direction.map(Into::into),
                default_mode: default_mode.map(Into::into),
                activate: !no_activate,
            };
            run_config_init(global_profile, &init)
        }
        ConfigCommands::Show { json } => run_config_show(global_profile, json),
    }
}

fn env_timeout_secs() -> Result<Option<u64>, CliError> {
    normalize_text_option(env::var(ENV_TIMEOUT_SECS).ok())
        .map(|raw| {
            raw.parse::<u64>().map_err(|_| {
                CliError::Config(format!("{ENV_TIMEOUT_SECS} must be a whole number of seconds"))
            })
        })
        .transpose()
}

fn run_config_init(profile_name: Option<&str>, init: &ConfigInit) -> Result<(), CliError> {
    let mut config = CliProfilesConfig::load().map_err(CliError::Config)?;
    let profile_name = apply_config_init(&mut config, profile_name, init)?;

    let path = config.save().map_err(CliError::Config)?;
    println!(
        "Profile '{}' initialized at {}",
        profile_name,
        path.display()
    );

    let has_base_url = config
        .profile(&profile_name)
        .and_then(CliProfile::base_url)
        .is_some();
    if !has_base_url {
        println!("Profile '{profile_name}' is missing: base_url");
    }
    Ok(())
}

/// Merge `init` into the resolved profile and check the result.
///
/// Returns the profile name that was written. Nothing is changed when the
/// merged profile does not form a valid gateway config.
pub fn apply_config_init(
    config: &mut CliProfilesConfig,
    profile_name: Option<&str>,
    init: &ConfigInit,
) -> Result<String, CliError> {
    let profile_name = config.resolve_profile_name(profile_name);

    let mut merged = config.profile(&profile_name).cloned().unwrap_or_default();
    if let Some(base_url) = normalize_text_option(init.base_url.clone()) {
        merged.base_url = Some(base_url);
    }
    if let Some(token) = normalize_text_option(init.api_token.clone()) {
        merged.api_token = Some(token);
    }
    if init.timeout_secs.is_some() {
        merged.timeout_secs = init.timeout_secs;
    }
    if init.default_direction.is_some() {
        merged.default_direction = init.default_direction;
    }
    if init.default_mode.is_some() {
        merged.default_mode = init.default_mode;
    }

    let validated = merged
        .gateway_config()
        .map_err(|error| CliError::Config(error.to_string()))?;
    if let Some(gateway) = validated {
        merged.base_url = Some(gateway.base_url);
    }

    *config.profile_mut_or_default(&profile_name) = merged;
    if init.activate {
        config.active_profile = Some(profile_name.clone());
    }
    Ok(profile_name)
}

fn run_config_show(profile_name: Option<&str>, as_json: bool) -> Result<(), CliError> {
    let config = CliProfilesConfig::load().map_err(CliError::Config)?;
    let view = profile_view(&config, profile_name);

    if as_json {
        println!("{}", serde_json::to_string_pretty(&view)?);
        return Ok(());
    }

    let marker = if view.active { " (active)" } else { "" };
    println!("Profile: {}{marker}", view.profile);
    println!(
        "  base_url:          {}",
        view.base_url.as_deref().unwrap_or("(not set)")
    );
    println!(
        "  api_token:         {}",
        view.api_token.unwrap_or("(not set)")
    );
    println!(
        "  timeout_secs:      {}",
        view.timeout_secs
            .map_or_else(|| "(default)".to_string(), |secs| secs.to_string())
    );
    println!(
        "  default_direction: {}",
        view.default_direction
            .map_or("(default)", SyncDirection::as_str)
    );
    println!(
        "  default_mode:      {}",
        view.default_mode.map_or("(default)", SyncMode::as_str)
    );
    Ok(())
}

fn profile_view(config: &CliProfilesConfig, profile_name: Option<&str>) -> ProfileView {
    let name = config.resolve_profile_name(profile_name);
    let profile = config.profile(&name).cloned().unwrap_or_default();
    ProfileView {
        active: config.active_profile.as_deref() == Some(name.as_str()),
        base_url: profile.base_url(),
        api_token: profile.api_token.as_ref().map(|_| "[REDACTED]"),
        timeout_secs: profile.timeout_secs,
        default_direction: profile.default_direction,
        default_mode: profile.default_mode,
        profile: name,
    }
}

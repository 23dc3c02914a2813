use super::types::*;
use crate::config::{expand_env_vars, expand_tilde, unexpanded_env_vars};
use regex::Regex;
use std::collections::HashSet;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse YAML: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("validation failed:\n{}", .0.join("\n"))]
    ValidationList(Vec<String>),

    #[error("validation failed: {0}")]
    Validation(String),
}

pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let yaml_string = std::fs::read_to_string(path).map_err(|e| {
        ConfigError::Io(std::io::Error::new(
            e.kind(),
            format!("failed to read config file '{}': {}", path.display(), e),
        ))
    })?;

    parse_config(&yaml_string)
}

/// Parse, normalize and validate a config document.
pub fn parse_config(yaml: &str) -> Result<Config, ConfigError> {
    let yaml_string = expand_env_vars(yaml);
    check_unexpanded_vars(&yaml_string)?;

    let mut config: Config = serde_yaml::from_str(&yaml_string)?;

    expand_paths(&mut config);
    resolve_thing_name(&mut config);

    validate_config(&config)?;

    Ok(config)
}

fn check_unexpanded_vars(yaml_string: &str) -> Result<(), ConfigError> {
    let unexpanded = unexpanded_env_vars(yaml_string);

    if unexpanded.is_empty() {
        return Ok(());
    }

    let error_msg = if unexpanded.len() == 1 {
        format!(
            "Environment variable $env{{{0}}} is not set.\n\
             \n\
             To fix this, either:\n\
             1. Set the environment variable: export {0}=...\n\
             2. Replace $env{{{0}}} in the config file with an actual value",
            unexpanded[0]
        )
    } else {
        format!(
            "Environment variables are not set: {}\n\
             \n\
             To fix this, either:\n\
             1. Set the environment variables\n\
             2. Replace the variables in the config file with actual values",
            unexpanded.join(", ")
        )
    };

    Err(ConfigError::Validation(error_msg))
}

fn expand_paths(config: &mut Config) {
    for component in &mut config.components {
        for file in &mut component.files {
            file.path = expand_tilde(&file.path);
        }
    }
}

fn resolve_thing_name(config: &mut Config) {
    if config.device.thing_name.is_some() {
        return;
    }

    match hostname::get() {
        Ok(name) => {
            let name = name.to_string_lossy().into_owned();
            tracing::debug!(thing_name = %name, "Using host name as thing name");
            config.device.thing_name = Some(name);
        }
        Err(e) => {
            tracing::warn!(error = %e, "Unable to determine host name");
        }
    }
}

fn validate_config(config: &Config) -> Result<(), ConfigError> {
    let mut errors = Vec::new();

    validate_device(&config.device, &mut errors);

    let mut names = HashSet::new();
    for (i, component) in config.components.iter().enumerate() {
        if component.name.is_empty() {
            errors.push(format!("components[{}]: name cannot be empty", i));
        } else if !names.insert(&component.name) {
            errors.push(format!(
                "components[{}]: duplicate component name '{}'",
                i, component.name
            ));
        }
        validate_component(i, component, &mut errors);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ConfigError::ValidationList(errors))
    }
}

fn validate_device(device: &DeviceConfig, errors: &mut Vec<String>) {
    match device.thing_name.as_deref() {
        None => errors.push(
            "device.thing_name is not set and the host name could not be determined".to_string(),
        ),
        Some("") => errors.push("device.thing_name cannot be empty".to_string()),
        Some(name) if name.chars().count() > MAX_THING_NAME_LEN => errors.push(format!(
            "device.thing_name is longer than {} characters",
            MAX_THING_NAME_LEN
        )),
        Some(_) => {}
    }

    if device.region.trim().is_empty() {
        errors.push("device.region cannot be empty".to_string());
    }
}

fn validate_component(index: usize, component: &ComponentConfig, errors: &mut Vec<String>) {
    let prefix = format!("components[{}] '{}'", index, component.name);

    if let Err(e) = Regex::new(&component.multiline_start) {
        errors.push(format!(
            "{}: invalid multiline_start pattern: {}",
            prefix, e
        ));
    }

    for (j, file) in component.files.iter().enumerate() {
        if !file.path.is_absolute() {
            errors.push(format!(
                "{}: files[{}]: path must be absolute: {}",
                prefix,
                j,
                file.path.display()
            ));
        }
    }
}

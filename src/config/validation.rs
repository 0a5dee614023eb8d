use super::models::Config;
use thiserror::Error;

const MINUTES_PER_DAY: u32 = 24 * 60;

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Cadence must divide a day evenly: {field} = {value} minutes")]
    InvalidCadence { field: String, value: u32 },

    #[error("Forecast horizon must be positive")]
    ZeroHorizon,

    #[error("Invalid provider URL for {field}: '{url}', expected http:// or https://")]
    InvalidUrl { field: String, url: String },

    #[error("Schedule interval must be positive: {field}")]
    ZeroInterval { field: String },
}

/// Validate the entire configuration
pub fn validate(config: &Config) -> Result<(), ValidationError> {
    validate_cadences(config)?;
    validate_provider(config)?;
    validate_schedule(config)?;
    Ok(())
}

fn validate_cadences(config: &Config) -> Result<(), ValidationError> {
    let acquisition = &config.acquisition;
    for (field, value) in [
        ("radar_cadence_minutes", acquisition.radar_cadence_minutes),
        ("rain_cadence_minutes", acquisition.rain_cadence_minutes),
        ("wind_cadence_minutes", acquisition.wind_cadence_minutes),
    ] {
        if value == 0 || MINUTES_PER_DAY % value != 0 {
            return Err(ValidationError::InvalidCadence {
                field: field.to_string(),
                value,
            });
        }
    }

    if acquisition.horizon_hours == 0 {
        return Err(ValidationError::ZeroHorizon);
    }

    Ok(())
}

fn validate_provider(config: &Config) -> Result<(), ValidationError> {
    for (field, url) in [
        ("base_url", &config.provider.base_url),
        ("manifest_url", &config.provider.manifest_url),
    ] {
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(ValidationError::InvalidUrl {
                field: field.to_string(),
                url: url.clone(),
            });
        }
    }

    Ok(())
}

fn validate_schedule(config: &Config) -> Result<(), ValidationError> {
    if config.schedule.interval_secs == 0 {
        return Err(ValidationError::ZeroInterval {
            field: "interval_secs".to_string(),
        });
    }

    if config.schedule.prune_interval_secs == 0 {
        return Err(ValidationError::ZeroInterval {
            field: "prune_interval_secs".to_string(),
        });
    }

    Ok(())
}

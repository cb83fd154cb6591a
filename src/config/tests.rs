use super::validation::validate_config;
use super::*;
use crate::constants::test_constants::*;
use serial_test::serial;
use std::fs;
use std::time::Duration;
use tempfile::tempdir;

fn create_test_config(
    latitude: Option<f64>,
    longitude: Option<f64>,
    timezone: Option<&str>,
    accuracy: Option<u64>,
) -> Config {
    Config {
        latitude,
        longitude,
        timezone: timezone.map(|s| s.to_string()),
        accuracy,
    }
}

fn amsterdam_config() -> Config {
    create_test_config(
        Some(TEST_AMSTERDAM_LATITUDE),
        Some(TEST_AMSTERDAM_LONGITUDE),
        Some(TEST_AMSTERDAM_TIMEZONE),
        Some(TEST_STANDARD_ACCURACY),
    )
}

#[test]
#[serial]
fn test_config_load_default_creation() {
    let temp_dir = tempdir().unwrap();
    let config_path = temp_dir.path().join("solarwatch").join("solarwatch.toml");

    // Save and restore XDG_CONFIG_HOME
    let original = std::env::var("XDG_CONFIG_HOME").ok();
    unsafe {
        std::env::set_var("XDG_CONFIG_HOME", temp_dir.path());
    }

    // First load should create default config
    let result = Config::load();

    unsafe {
        match original {
            Some(val) => std::env::set_var("XDG_CONFIG_HOME", val),
            None => std::env::remove_var("XDG_CONFIG_HOME"),
        }
    }

    let config = result.unwrap();
    assert!(config_path.exists());
    assert_eq!(config.timezone_name(), DEFAULT_TIMEZONE);
    assert_eq!(config.accuracy_secs(), DEFAULT_ACCURACY);

    // The default file has no coordinates, so it cannot start the service yet
    let err = config.settings().unwrap_err();
    assert!(err.is_configuration());
    assert!(err.to_string().contains("latitude and longitude are required"));
}

#[test]
fn test_load_from_path_valid() {
    let temp_dir = tempdir().unwrap();
    let path = temp_dir.path().join("solarwatch.toml");
    fs::write(
        &path,
        r#"
latitude = 52.3676
longitude = 4.9041
timezone = "Europe/Amsterdam"
accuracy = 30
"#,
    )
    .unwrap();

    let config = load_from_path(&path).unwrap();
    assert_eq!(
        config,
        create_test_config(
            Some(52.3676),
            Some(4.9041),
            Some("Europe/Amsterdam"),
            Some(30)
        )
    );

    let settings = config.settings().unwrap();
    assert_eq!(settings.timezone, chrono_tz::Europe::Amsterdam);
    assert_eq!(settings.period, Duration::from_secs(30));
    assert_eq!(settings.location.latitude(), 52.3676);
}

#[test]
fn test_load_from_path_applies_defaults() {
    let temp_dir = tempdir().unwrap();
    let path = temp_dir.path().join("solarwatch.toml");
    fs::write(&path, "latitude = -33.8688\nlongitude = 151.2093\n").unwrap();

    let settings = load_from_path(&path).unwrap().settings().unwrap();
    assert_eq!(settings.timezone, chrono_tz::UTC);
    assert_eq!(settings.period, Duration::from_secs(DEFAULT_ACCURACY));
}

#[test]
fn test_load_from_path_missing_file() {
    let temp_dir = tempdir().unwrap();
    let err = load_from_path(&temp_dir.path().join("nope.toml")).unwrap_err();
    assert!(err.to_string().contains("not found"));
}

#[test]
fn test_load_from_path_rejects_garbage() {
    let temp_dir = tempdir().unwrap();
    let path = temp_dir.path().join("solarwatch.toml");

    fs::write(&path, "latitude = \"north\"\n").unwrap();
    assert!(load_from_path(&path).is_err());

    fs::write(&path, "latitude = 1.0\nlongitude = 2.0\nbackend = \"auto\"\n").unwrap();
    let err = load_from_path(&path).unwrap_err();
    assert!(format!("{err:#}").contains("Failed to parse config"));
}

#[test]
fn test_load_from_path_rejects_invalid_values() {
    let temp_dir = tempdir().unwrap();
    let path = temp_dir.path().join("solarwatch.toml");

    fs::write(&path, "latitude = 95.0\nlongitude = 0.0\n").unwrap();
    let err = load_from_path(&path).unwrap_err();
    assert!(err.to_string().contains("latitude"));
}

#[test]
fn test_config_validation_basic() {
    assert!(validate_config(&amsterdam_config()).is_ok());
    assert!(validate_config(&Config::default()).is_ok());
}

#[test]
fn test_config_validation_coordinates() {
    let config = create_test_config(Some(-90.5), Some(0.0), None, None);
    assert!(validate_config(&config).is_err());

    let config = create_test_config(Some(0.0), Some(180.5), None, None);
    assert!(validate_config(&config).is_err());

    let config = create_test_config(Some(90.0), Some(-180.0), None, None);
    assert!(validate_config(&config).is_ok());

    // One coordinate without the other
    let config = create_test_config(Some(10.0), None, None, None);
    assert!(validate_config(&config).is_err());
}

#[test]
fn test_config_validation_timezone() {
    let config = create_test_config(Some(0.0), Some(0.0), Some("Mars/Olympus_Mons"), None);
    let err = validate_config(&config).unwrap_err();
    assert!(err.to_string().contains("Mars/Olympus_Mons"));

    let config = create_test_config(Some(0.0), Some(0.0), Some("America/New_York"), None);
    assert!(validate_config(&config).is_ok());
}

#[test]
fn test_config_validation_accuracy_limits() {
    let config = create_test_config(Some(0.0), Some(0.0), None, Some(0));
    assert!(validate_config(&config).is_err());

    let config = create_test_config(Some(0.0), Some(0.0), None, Some(MAXIMUM_ACCURACY + 1));
    assert!(validate_config(&config).is_err());

    let config = create_test_config(Some(0.0), Some(0.0), None, Some(MINIMUM_ACCURACY));
    assert!(validate_config(&config).is_ok());

    let config = create_test_config(Some(0.0), Some(0.0), None, Some(MAXIMUM_ACCURACY));
    assert!(validate_config(&config).is_ok());
}

#[test]
fn test_settings_reports_configuration_errors() {
    // settings() does not rely on validate_config having run
    let config = create_test_config(Some(0.0), Some(0.0), None, Some(0));
    assert!(config.settings().unwrap_err().is_configuration());

    let config = create_test_config(Some(0.0), Some(0.0), Some("Nowhere/Land"), None);
    assert!(config.settings().unwrap_err().is_configuration());

    let config = create_test_config(Some(123.0), Some(0.0), None, None);
    assert!(config.settings().unwrap_err().is_configuration());
}

#[test]
fn test_default_config_round_trips_through_loader() {
    let temp_dir = tempdir().unwrap();
    let path = temp_dir.path().join("nested").join("solarwatch.toml");

    create_default_config(&path).unwrap();
    let contents = fs::read_to_string(&path).unwrap();
    assert!(contents.contains("#latitude"));

    // Uncommenting the coordinates yields a runnable configuration
    let enabled = contents
        .replace("#latitude", "latitude")
        .replace("#longitude", "longitude");
    fs::write(&path, enabled).unwrap();
    let settings = load_from_path(&path).unwrap().settings().unwrap();
    assert_eq!(settings.location.longitude(), 4.9041);
}

#[test]
fn test_private_path_hides_home() {
    if let Some(home) = dirs::home_dir() {
        let path = home.join(".config").join("solarwatch").join("solarwatch.toml");
        assert_eq!(private_path(&path), "~/.config/solarwatch/solarwatch.toml");
    }
    assert_eq!(
        private_path(std::path::Path::new("/etc/solarwatch.toml")),
        "/etc/solarwatch.toml"
    );
}

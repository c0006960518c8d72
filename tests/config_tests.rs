use conferio_client::{AppConfig, config::Env};
use serial_test::serial;
use std::{env, panic, path::PathBuf};

const VARS: [&str; 4] = [
    "APP_ENV",
    "CONFERIO_API_URL",
    "CONFERIO_IDENTITY_PATH",
    "CONFERIO_LOGOUT_ON_UNAUTHORIZED",
];

// --- Setup/Teardown Utilities ---

/// Utility to run a test function and restore environment variables afterward
fn run_with_env<T, R>(test: T) -> R
where
    T: FnOnce() -> R + panic::UnwindSafe,
{
    // Save current environment variables
    let originals: Vec<(String, Option<String>)> = VARS
        .iter()
        .map(|&var| (var.to_string(), env::var(var).ok()))
        .collect();

    // Start every test from a clean slate
    unsafe {
        for var in VARS {
            env::remove_var(var);
        }
    }

    let result = panic::catch_unwind(test);

    // Restore original environment variables
    for (key, original_value) in originals.into_iter().rev() {
        unsafe {
            if let Some(val) = original_value {
                env::set_var(&key, val);
            } else {
                env::remove_var(&key);
            }
        }
    }

    match result {
        Ok(value) => value,
        Err(e) => panic::resume_unwind(e),
    }
}

// --- Tests ---

#[test]
#[serial]
fn test_app_config_production_fail_fast() {
    let result = panic::catch_unwind(|| {
        run_with_env(|| {
            unsafe {
                env::set_var("APP_ENV", "production");
            }
            // CONFERIO_API_URL is missing
            AppConfig::load()
        })
    });

    assert!(
        result.is_err(),
        "Production config loading should panic without a backend URL"
    );
}

#[test]
#[serial]
fn test_app_config_production_with_url() {
    let config = run_with_env(|| {
        unsafe {
            env::set_var("APP_ENV", "production");
            env::set_var("CONFERIO_API_URL", "https://conf.example.org/");
        }
        AppConfig::load()
    });

    assert_eq!(config.env, Env::Production);
    // Trailing slash is trimmed so paths can be appended verbatim
    assert_eq!(config.api_base_url, "https://conf.example.org");
}

#[test]
#[serial]
fn test_app_config_local_env_defaults() {
    let config = run_with_env(AppConfig::load);

    assert_eq!(config.env, Env::Local);
    assert_eq!(config.api_base_url, "http://localhost:8080");
    assert!(config.identity_path.ends_with(".conferio/identity.json"));
    assert!(config.logout_on_unauthorized);
}

#[test]
#[serial]
fn test_app_config_overrides() {
    let config = run_with_env(|| {
        unsafe {
            env::set_var("CONFERIO_API_URL", "http://10.0.0.5:9000");
            env::set_var("CONFERIO_IDENTITY_PATH", "/tmp/elsewhere/id.json");
            env::set_var("CONFERIO_LOGOUT_ON_UNAUTHORIZED", "false");
        }
        AppConfig::load()
    });

    assert_eq!(config.api_base_url, "http://10.0.0.5:9000");
    assert_eq!(config.identity_path, PathBuf::from("/tmp/elsewhere/id.json"));
    assert!(!config.logout_on_unauthorized);
}

#[test]
fn test_default_config_stays_out_of_home() {
    let config = AppConfig::default();
    assert!(config.identity_path.starts_with(env::temp_dir()));
    assert_eq!(config.env, Env::Local);
}

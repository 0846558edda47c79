use luxe_matches::{
    AppConfig,
    config::{DEFAULT_DB_NAME, DEFAULT_MAX_PAGE_SIZE, DEFAULT_PORT, Env, StoreBackend},
};
use serial_test::serial;
use std::{env, panic};

// Every variable AppConfig::load reads; cleared before each scenario.
const CONFIG_VARS: [&str; 12] = [
    "APP_ENV",
    "MONGODB_URI",
    "DB_USER",
    "DB_PASS",
    "DB_HOST",
    "DB_NAME",
    "ACCESS_TOKEN_SECRET",
    "STRIPE_SECRET_KEY",
    "STORE_BACKEND",
    "CORS_ORIGINS",
    "PORT",
    "MAX_PAGE_SIZE",
];

// --- Setup/Teardown Utilities ---

/// Runs `test` against a clean environment holding only `vars`, then restores
/// whatever was set before.
fn run_with_env<T, R>(vars: &[(&str, &str)], test: T) -> R
where
    T: FnOnce() -> R + panic::UnwindSafe,
{
    let originals: Vec<(&str, Option<String>)> = CONFIG_VARS
        .iter()
        .map(|&var| (var, env::var(var).ok()))
        .collect();

    unsafe {
        for var in CONFIG_VARS {
            env::remove_var(var);
        }
        for (key, value) in vars {
            env::set_var(key, value);
        }
    }

    let result = panic::catch_unwind(test);

    unsafe {
        for (key, original_value) in originals {
            match original_value {
                Some(val) => env::set_var(key, val),
                None => env::remove_var(key),
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
    // Token and payment secrets are missing.
    let result = panic::catch_unwind(|| {
        run_with_env(
            &[
                ("APP_ENV", "production"),
                ("MONGODB_URI", "mongodb://db.internal:27017"),
            ],
            AppConfig::load,
        )
    });

    assert!(
        result.is_err(),
        "Production config loading should panic on missing secrets"
    );
}

#[test]
#[serial]
fn test_app_config_production_requires_database() {
    let result = panic::catch_unwind(|| {
        run_with_env(
            &[
                ("APP_ENV", "production"),
                ("ACCESS_TOKEN_SECRET", "prod-secret"),
                ("STRIPE_SECRET_KEY", "sk_live_x"),
            ],
            AppConfig::load,
        )
    });

    assert!(result.is_err(), "Production config needs a database URI");
}

#[test]
#[serial]
fn test_app_config_production_with_all_secrets() {
    let config = run_with_env(
        &[
            ("APP_ENV", "production"),
            ("MONGODB_URI", "mongodb://db.internal:27017"),
            ("ACCESS_TOKEN_SECRET", "prod-secret"),
            ("STRIPE_SECRET_KEY", "sk_live_x"),
            ("STORE_BACKEND", "memory"),
        ],
        AppConfig::load,
    );

    assert_eq!(config.env, Env::Production);
    assert_eq!(config.jwt_secret, "prod-secret");
    assert_eq!(config.stripe_secret.as_deref(), Some("sk_live_x"));
    // The in-memory store is never used in production.
    assert_eq!(config.store, StoreBackend::Mongo);
}

#[test]
#[serial]
fn test_app_config_local_env_defaults() {
    let config = run_with_env(&[("APP_ENV", "local")], AppConfig::load);

    assert_eq!(config.env, Env::Local);
    assert_eq!(config.mongo_uri, "mongodb://localhost:27017");
    assert_eq!(config.db_name, DEFAULT_DB_NAME);
    assert_eq!(config.jwt_secret, AppConfig::default().jwt_secret);
    assert_eq!(config.stripe_secret, None);
    assert_eq!(config.store, StoreBackend::Mongo);
    assert_eq!(config.port, DEFAULT_PORT);
    assert_eq!(config.max_page_size, DEFAULT_MAX_PAGE_SIZE);
    assert_eq!(
        config.cors_origins,
        vec!["http://localhost:5173", "http://localhost:5174"]
    );
}

#[test]
#[serial]
fn test_app_config_builds_atlas_uri_from_credentials() {
    let config = run_with_env(
        &[("DB_USER", "luxe"), ("DB_PASS", "pw"), ("DB_HOST", "cluster.example.net")],
        AppConfig::load,
    );

    assert!(config.mongo_uri.starts_with("mongodb+srv://luxe:pw@cluster.example.net/"));
}

#[test]
#[serial]
fn test_app_config_local_overrides() {
    let config = run_with_env(
        &[
            ("STORE_BACKEND", "memory"),
            ("PORT", "8080"),
            ("MAX_PAGE_SIZE", "25"),
            ("DB_NAME", "luxe-test"),
            ("CORS_ORIGINS", "https://luxe.example, ,https://admin.luxe.example"),
        ],
        AppConfig::load,
    );

    assert_eq!(config.store, StoreBackend::Memory);
    assert_eq!(config.port, 8080);
    assert_eq!(config.max_page_size, 25);
    assert_eq!(config.db_name, "luxe-test");
    assert_eq!(
        config.cors_origins,
        vec!["https://luxe.example", "https://admin.luxe.example"]
    );
}

#[test]
#[serial]
fn test_app_config_ignores_unusable_numbers() {
    let config = run_with_env(
        &[("PORT", "not-a-port"), ("MAX_PAGE_SIZE", "0")],
        AppConfig::load,
    );

    assert_eq!(config.port, DEFAULT_PORT);
    assert_eq!(config.max_page_size, DEFAULT_MAX_PAGE_SIZE);
}

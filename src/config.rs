// SPDX-License-Identifier: MIT

//! Application configuration loaded from environment variables.

use std::env;

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// GCP project ID (Firestore)
    pub gcp_project_id: String,
    /// Frontend URL for CORS
    pub frontend_url: String,
    /// Server port
    pub port: u16,
    /// Minimum distance (meters) for a walk to be persisted at stop
    pub min_walk_distance_meters: f64,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Every variable has a sensible local-dev default, so loading cannot
    /// fail; unparseable values fall back to the default.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok(); // Load .env file if present

        Self {
            gcp_project_id: env::var("GCP_PROJECT_ID").unwrap_or_else(|_| "local-dev".to_string()),
            frontend_url: env::var("FRONTEND_URL")
                .unwrap_or_else(|_| "http://localhost:5173".to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .unwrap_or(8080),
            min_walk_distance_meters: env::var("MIN_WALK_DISTANCE_METERS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(50.0),
        }
    }

    /// Default config for testing only.
    pub fn test_default() -> Self {
        Self {
            gcp_project_id: "test-project".to_string(),
            frontend_url: "http://localhost:5173".to_string(),
            port: 8080,
            min_walk_distance_meters: 50.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_from_env_defaults() {
        env::remove_var("PORT");
        env::remove_var("MIN_WALK_DISTANCE_METERS");

        let config = Config::from_env();

        assert_eq!(config.port, 8080);
        assert_eq!(config.min_walk_distance_meters, 50.0);
    }
}

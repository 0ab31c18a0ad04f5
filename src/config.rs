use figment::{
    Figment,
    providers::{Env, Format, Yaml},
};
use secrecy::{ExposeSecret, SecretString};
use serde_aux::field_attributes::deserialize_number_from_string;
use sqlx::postgres::{PgConnectOptions, PgSslMode};

#[derive(serde::Deserialize, Debug, Clone)]
pub struct Config {
    pub application: Application,
    pub database: Database,
    pub jwt: Jwt,
    pub api: Api,
    pub library: Library,
}

#[derive(serde::Deserialize, Debug, Clone)]
pub struct Application {
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub port: u16,
    pub host: String,
    pub allow_registration: bool,
    pub run_migration: bool,
}

impl Application {
    pub fn get_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[derive(serde::Deserialize, Debug, Clone)]
pub struct Jwt {
    pub secret: SecretString,
    pub iss: SecretString,
    pub aud: SecretString,
}

/// Credentials shared with the mobile clients.
#[derive(serde::Deserialize, Debug, Clone)]
pub struct Api {
    pub app_key: SecretString,
}

/// Tunables of the listing and recommendation pipeline.
#[derive(serde::Deserialize, Debug, Clone)]
pub struct Library {
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub books_per_page: usize,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub api_books_per_page: usize,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub start_recommend: usize,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub home_recommend_count: usize,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub api_recommend_count: usize,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub show_reminder_count: u32,
}

impl Default for Library {
    fn default() -> Self {
        Library {
            books_per_page: 48,
            api_books_per_page: 20,
            start_recommend: 10,
            home_recommend_count: 4,
            api_recommend_count: 6,
            show_reminder_count: 150,
        }
    }
}

#[derive(serde::Deserialize, Debug, Clone)]
pub struct Database {
    pub username: String,
    pub password: SecretString,
    pub host: String,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub port: u16,
    pub database_name: String,
    pub require_ssl: bool,
}

impl Database {
    pub fn without_db(&self) -> PgConnectOptions {
        let ssl_mode = if self.require_ssl {
            PgSslMode::Require
        } else {
            PgSslMode::Prefer
        };

        PgConnectOptions::new()
            .host(&self.host)
            .port(self.port)
            .username(&self.username)
            .password(self.password.expose_secret())
            .ssl_mode(ssl_mode)
    }

    pub fn with_db(&self) -> PgConnectOptions {
        self.without_db().database(&self.database_name)
    }
}

pub enum Environment {
    Local,
    Production,
}

impl Environment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Local => "local",
            Environment::Production => "production",
        }
    }
}

impl TryFrom<String> for Environment {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        match s.to_lowercase().as_str() {
            "local" => Ok(Self::Local),
            "production" => Ok(Self::Production),
            other => Err(format!(
                "{} is not a supported environment. Use either `local` or `production`.",
                other
            )),
        }
    }
}

impl Config {
    pub fn new() -> Result<Self, anyhow::Error> {
        let base_path = std::env::current_dir()?;
        let config_directory = base_path.join("configuration");

        let environment: Environment = std::env::var("APP_ENVIRONMENT")
            .unwrap_or_else(|_| "local".into())
            .try_into()
            .map_err(anyhow::Error::msg)?;

        let environment_filename = format!("{}.yaml", environment.as_str());

        let config = Figment::new()
            .merge(Yaml::file(config_directory.join("base.yaml")))
            .merge(Yaml::file(config_directory.join(environment_filename)))
            .merge(Env::raw().split("__"))
            .extract()?;

        Ok(config)
    }
}

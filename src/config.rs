use anyhow::{Context, Result};
use chrono_tz::Tz;
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::{collections::BTreeMap, net::SocketAddr, path::PathBuf};
use validator::Validate;

use crate::domain::{GridPoint, JoinPolicy, Market};

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct Config {
    #[validate(nested)]
    pub server: ServerConfig,
    #[validate(nested)]
    pub prices: PricesConfig,
    #[validate(nested)]
    pub weather: WeatherConfig,
    #[validate(nested)]
    pub forecast: ForecastConfig,
    pub model: ModelConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ServerConfig {
    #[validate(length(min = 1))]
    pub host: String,
    pub port: u16,
    #[validate(range(min = 1, max = 300))]
    pub request_timeout_secs: u64,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr> {
        Ok(format!("{}:{}", self.host, self.port).parse()?)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct PricesConfig {
    #[validate(url)]
    pub base_url: String,
    /// Pricing node, e.g. `SHILOH3_7_N002`
    #[validate(length(min = 1))]
    pub location: String,
    pub market: Market,
    #[validate(range(min = 1, max = 600))]
    pub http_timeout_seconds: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct WeatherConfig {
    #[validate(url)]
    pub base_url: String,
    /// weather.gov rejects requests without a User-Agent
    #[validate(length(min = 1))]
    pub user_agent: String,
    #[validate(range(min = 1, max = 600))]
    pub http_timeout_seconds: u64,
    /// Station name -> forecast grid cell. Station names become column suffixes.
    pub stations: BTreeMap<String, GridPoint>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ForecastConfig {
    #[validate(range(max = 7))]
    pub horizon_days: u32,
    /// IANA name, e.g. `Etc/GMT+8`
    pub timezone: String,
    #[validate(range(max = 48))]
    pub max_interp_hours: usize,
    #[validate(range(min = 1, max = 336))]
    pub lag_hours: usize,
    pub join_policy: JoinPolicy,
}

impl ForecastConfig {
    pub fn tz(&self) -> Result<Tz> {
        self.timezone
            .parse::<Tz>()
            .map_err(|e| anyhow::anyhow!("invalid time zone {:?}: {e}", self.timezone))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    pub path: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        let stations = BTreeMap::from([
            ("la".to_string(), GridPoint::new("LOX", 153, 44)),
            ("sd".to_string(), GridPoint::new("SGX", 58, 18)),
            ("sf".to_string(), GridPoint::new("MTR", 85, 98)),
        ]);

        Self {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 8050,
                request_timeout_secs: 30,
            },
            prices: PricesConfig {
                base_url: "http://127.0.0.1:8060".to_string(),
                location: "SHILOH3_7_N002".to_string(),
                market: Market::DayAheadHourly,
                http_timeout_seconds: 60,
            },
            weather: WeatherConfig {
                base_url: "https://api.weather.gov".to_string(),
                user_agent: "lmp-forecast/0.1".to_string(),
                http_timeout_seconds: 30,
                stations,
            },
            forecast: ForecastConfig {
                horizon_days: 2,
                timezone: "Etc/GMT+8".to_string(),
                max_interp_hours: 4,
                lag_hours: 48,
                join_policy: JoinPolicy::Left,
            },
            model: ModelConfig {
                path: PathBuf::from("models/model.json"),
            },
        }
    }
}

impl Config {
    /// Defaults, then `config/default.toml`, then `LMP__SECTION__KEY` env vars.
    pub fn load() -> Result<Self> {
        let figment = Figment::from(Serialized::defaults(Config::default()))
            .merge(Toml::file("config/default.toml"))
            .merge(Env::prefixed("LMP__").split("__"));
        Self::from_figment(figment)
    }

    pub fn from_figment(figment: Figment) -> Result<Self> {
        let cfg: Config = figment.extract().context("failed to extract configuration")?;
        cfg.validate().context("invalid configuration")?;
        if cfg.weather.stations.is_empty() {
            anyhow::bail!("invalid configuration: weather.stations must not be empty");
        }
        cfg.forecast.tz()?;
        Ok(cfg)
    }
}

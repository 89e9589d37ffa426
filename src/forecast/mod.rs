pub mod engine;
pub mod error;
pub mod features;
pub mod prices;
pub mod series;
pub mod weather;
pub mod window;

pub use engine::*;
pub use error::{FeatureError, FetchError};
pub use features::{Column, FeatureAssembler, FeatureMatrix, FeatureTable};
pub use prices::{fetch_price_series, LmpRow, LmpSource, MarketDataClient};
pub use series::HourlySeries;
pub use weather::{fetch_station_weather, ForecastPeriod, NwsClient, WeatherSource};
pub use window::ForecastWindow;

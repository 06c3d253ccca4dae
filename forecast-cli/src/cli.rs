use anyhow::{Context, anyhow};
use chrono::DateTime;
use clap::{ArgGroup, Args, Parser, Subcommand};
use forecast_core::{
    Config, Coordinate, CurrentConditionsClient, ForecastError, ForecastOptions, ForecastPipeline,
    LocationQuery, NormalizedForecast, build_client, config::API_KEY_ENV, current,
};
use std::time::Duration;
use tracing::debug;

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "weather", version, about = "Weather CLI")]
pub struct Cli {
    /// Enable debug logging.
    #[arg(long, global = true)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Forecast for a place name or explicit coordinates.
    Forecast(ForecastArgs),

    /// Current conditions from OpenWeather (needs an API key).
    Current {
        /// City name.
        city: String,

        /// Print the provider's JSON instead of a summary.
        #[arg(long)]
        raw: bool,
    },

    /// Store the OpenWeather API key and a contact user agent.
    Configure,
}

#[derive(Debug, Args)]
#[command(group(ArgGroup::new("location").required(true).args(["place", "lat"])))]
pub struct ForecastArgs {
    /// Place name to geocode, e.g. "Seattle, WA".
    #[arg(conflicts_with_all = ["lat", "lon"])]
    pub place: Option<String>,

    #[arg(long, requires = "lon", allow_negative_numbers = true)]
    pub lat: Option<f64>,

    #[arg(long, requires = "lat", allow_negative_numbers = true)]
    pub lon: Option<f64>,

    /// Prefer the hourly forecast.
    #[arg(long)]
    pub hourly: bool,

    /// Per-request timeout in seconds.
    #[arg(long)]
    pub timeout: Option<f64>,

    /// Pretty-print the raw forecast document.
    #[arg(long)]
    pub raw: bool,
}

impl ForecastArgs {
    fn query(&self) -> anyhow::Result<LocationQuery> {
        match (&self.place, self.lat, self.lon) {
            (Some(place), _, _) => Ok(LocationQuery::Place(place.clone())),
            (None, Some(lat), Some(lon)) => {
                Ok(LocationQuery::Coordinates(Coordinate::new(lat, lon)?))
            }
            _ => Err(ForecastError::InvalidInput(
                "provide a place name or both --lat and --lon".to_string(),
            )
            .into()),
        }
    }

    fn timeout(&self) -> anyhow::Result<Option<Duration>> {
        let Some(secs) = self.timeout else {
            return Ok(None);
        };
        let timeout = Duration::try_from_secs_f64(secs)
            .map_err(|_| ForecastError::InvalidInput(format!("invalid timeout: {secs}")))?;
        Ok(Some(timeout))
    }
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        let config = Config::load()?;

        match self.command {
            Command::Forecast(args) => {
                let pipeline = ForecastPipeline::new(&config.http, config.endpoints.clone())?;
                let query = args.query()?;
                let options = ForecastOptions {
                    hourly: args.hourly,
                    timeout: args.timeout()?,
                };
                debug!(?query, ?options, "forecast lookup");
                let forecast = pipeline.get_forecast(&query, options).await?;

                if args.raw {
                    println!("{}", serde_json::to_string_pretty(&forecast.source_document)?);
                } else {
                    println!("{}", summary_line(&forecast));
                }
            }
            Command::Current { city, raw } => {
                let api_key = config.openweather_api_key().ok_or_else(|| {
                    anyhow!(
                        "No OpenWeather API key configured.\n\
                         Hint: set {API_KEY_ENV} or run `weather configure`."
                    )
                })?;

                let http = build_client(&config.http)?;
                let client =
                    CurrentConditionsClient::new(http, config.endpoints.current.clone(), api_key);
                debug!(%city, "current conditions lookup");
                let body = client.current(&city, config.http.timeout()).await?;

                if raw {
                    println!("{}", serde_json::to_string_pretty(&body)?);
                } else {
                    let (temp, description) = current::summarize(&body)
                        .context("OpenWeather response has no temperature")?;
                    println!("Weather in {city}: {temp}°C, {description}");
                }
            }
            Command::Configure => configure(config)?,
        }

        Ok(())
    }
}

fn configure(mut config: Config) -> anyhow::Result<()> {
    let api_key = inquire::Password::new("OpenWeather API key:")
        .without_confirmation()
        .with_help_message("Leave empty to keep the current key")
        .prompt()?;
    if !api_key.trim().is_empty() {
        config.set_openweather_api_key(api_key.trim().to_string());
    }

    let user_agent = inquire::Text::new("User-Agent sent to weather.gov:")
        .with_default(&config.http.user_agent)
        .with_help_message("weather.gov asks for a contact, e.g. \"my-app (me@example.com)\"")
        .prompt()?;
    config.http.user_agent = user_agent;

    let path = config.save()?;
    println!("Saved configuration to {}", path.display());
    Ok(())
}

/// `<name> (<start>): <temp>°<unit>, <short>`
pub fn summary_line(forecast: &NormalizedForecast) -> String {
    if forecast.is_empty() {
        return "No forecast periods available for this location.".to_string();
    }

    let name = forecast.name.as_deref().unwrap_or("Forecast");
    let start = forecast
        .start_time
        .as_deref()
        .map(|s| match DateTime::parse_from_rfc3339(s) {
            Ok(dt) => format!(" ({})", dt.format("%a %b %-d %H:%M")),
            Err(_) => format!(" ({s})"),
        })
        .unwrap_or_default();
    let temp = match (&forecast.temperature, forecast.unit.as_deref()) {
        (Some(t), Some(u)) => format!("{t}°{u}"),
        (Some(t), None) => format!("{t}°"),
        (None, _) => "n/a".to_string(),
    };
    let short = forecast.short.as_deref().unwrap_or("no description");

    format!("{name}{start}: {temp}, {short}")
}

/// Process exit code for an error surfaced by [`Cli::run`].
pub fn exit_code(err: &anyhow::Error) -> u8 {
    match err.downcast_ref::<ForecastError>() {
        Some(ForecastError::InvalidInput(_) | ForecastError::NotFound(_)) => 2,
        Some(ForecastError::Http { .. }) => 3,
        Some(
            ForecastError::Network(_)
            | ForecastError::MalformedResponse(_)
            | ForecastError::ForecastNotFound(_)
            | ForecastError::AllEndpointsFailed { .. },
        ) => 4,
        None => 5,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use forecast_core::error::StatusCode;
    use serde_json::json;

    fn forecast() -> NormalizedForecast {
        NormalizedForecast {
            name: Some("Tonight".into()),
            start_time: Some("2024-06-01T18:00:00-07:00".into()),
            temperature: Some(58.into()),
            unit: Some("F".into()),
            short: Some("Mostly Clear".into()),
            detailed: None,
            source_document: json!({}),
        }
    }

    #[test]
    fn summary_formats_first_period() {
        assert_eq!(
            summary_line(&forecast()),
            "Tonight (Sat Jun 1 18:00): 58°F, Mostly Clear"
        );
    }

    #[test]
    fn summary_keeps_unparseable_start_time() {
        let mut f = forecast();
        f.start_time = Some("soon".into());
        assert!(summary_line(&f).starts_with("Tonight (soon): "));
    }

    #[test]
    fn summary_for_empty_forecast() {
        let f = NormalizedForecast::empty(json!({"properties": {"periods": []}}));
        assert_eq!(
            summary_line(&f),
            "No forecast periods available for this location."
        );
    }

    #[test]
    fn exit_codes_follow_error_kind() {
        let code = |e: ForecastError| exit_code(&e.into());

        assert_eq!(code(ForecastError::InvalidInput("x".into())), 2);
        assert_eq!(code(ForecastError::NotFound("x".into())), 2);
        assert_eq!(code(ForecastError::http(StatusCode::SERVICE_UNAVAILABLE, "u", "")), 3);
        assert_eq!(code(ForecastError::ForecastNotFound("x".into())), 4);
        assert_eq!(code(ForecastError::MalformedResponse("x".into())), 4);
        assert_eq!(exit_code(&anyhow!("config broke")), 5);
    }

    #[test]
    fn context_keeps_exit_code() {
        let err =
            anyhow::Error::from(ForecastError::NotFound("x".into())).context("while looking up");
        assert_eq!(exit_code(&err), 2);
    }

    #[test]
    fn coordinates_conflict_with_place() {
        let parsed = Cli::try_parse_from([
            "weather", "forecast", "Seattle", "--lat", "1", "--lon", "2",
        ]);
        assert!(parsed.is_err());
    }

    #[test]
    fn lat_requires_lon() {
        let parsed = Cli::try_parse_from(["weather", "forecast", "--lat", "47.6"]);
        assert!(parsed.is_err());
    }

    #[test]
    fn location_is_required() {
        assert!(Cli::try_parse_from(["weather", "forecast", "--hourly"]).is_err());
    }

    #[test]
    fn negative_coordinates_parse() {
        let cli = Cli::try_parse_from([
            "weather", "forecast", "--lat", "47.6062", "--lon", "-122.3321", "--hourly", "--debug",
        ])
        .unwrap();
        assert!(cli.debug);

        let Command::Forecast(args) = cli.command else {
            panic!("expected forecast command");
        };
        assert!(args.hourly);
        assert_eq!(
            args.query().unwrap(),
            LocationQuery::Coordinates(Coordinate::new(47.6062, -122.3321).unwrap())
        );
    }

    #[tokio::test]
    async fn place_without_geocoder_exits_as_input_error() {
        let endpoints = forecast_core::Endpoints {
            geocoding: false,
            ..Default::default()
        };
        let pipeline = ForecastPipeline::new(&Default::default(), endpoints).unwrap();
        let args = ForecastArgs {
            place: Some("Seattle".into()),
            lat: None,
            lon: None,
            hourly: false,
            timeout: None,
            raw: false,
        };

        let err = pipeline
            .get_forecast(&args.query().unwrap(), ForecastOptions::default())
            .await
            .unwrap_err();
        assert_eq!(exit_code(&err.into()), 2);
    }

    #[test]
    fn negative_timeout_is_invalid_input() {
        let cli = Cli::try_parse_from(["weather", "forecast", "Paris", "--timeout=-1"]).unwrap();
        let Command::Forecast(args) = cli.command else {
            panic!("expected forecast command");
        };
        let err = args.timeout().unwrap_err();
        assert_eq!(exit_code(&err), 2);
    }
}

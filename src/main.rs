mod render;

use std::process::ExitCode;

use clap::{ArgGroup, Parser};
use nimbus_core::{AppError, Config};
use nimbus_weather::{
    Dashboard, Geolocator, OpenWeatherClient, TemperatureUnit, WeatherService,
};

#[derive(Parser)]
#[command(name = "nimbus")]
#[command(version, about = "Current weather and a five-day forecast from OpenWeatherMap")]
#[command(group(ArgGroup::new("target").required(true).args(["city", "here"])))]
struct Cli {
    /// City to look up
    #[arg(long)]
    city: Option<String>,

    /// Use the position from the [location] config section
    #[arg(long)]
    here: bool,

    /// Temperature unit (celsius or fahrenheit); defaults to the configured unit
    #[arg(long)]
    unit: Option<TemperatureUnit>,

    /// Output the dashboard snapshot as JSON
    #[arg(long)]
    json: bool,

    /// Leave today out of the forecast once the local hour reaches HOUR
    #[arg(long, value_name = "HOUR", value_parser = clap::value_parser!(u32).range(0..24))]
    exclude_today_after: Option<u32>,

    /// Leave out days with fewer than N forecast samples
    #[arg(long, value_name = "N")]
    min_samples: Option<usize>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(e) = nimbus_core::init() {
        eprintln!("{:#}", e);
    }

    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            tracing::error!("{}", e);
            eprintln!("Error: {}", e.user_message());
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<ExitCode, AppError> {
    let mut config = Config::load_validated()?;
    apply_overrides(&mut config, &cli);

    let dashboard = build_dashboard(&config)?;
    tracing::info!("nimbus started (unit: {})", config.weather.temperature_unit);

    match cli.city.as_deref() {
        Some(city) => dashboard.submit_query(city).await,
        None => dashboard.submit_location_query().await,
    };

    let snapshot = dashboard.snapshot();
    if cli.json {
        let json = serde_json::to_string_pretty(&*snapshot).map_err(anyhow::Error::from)?;
        println!("{}", json);
    } else {
        let text = render::render_snapshot(&snapshot).map_err(anyhow::Error::from)?;
        print!("{}", text);
    }

    if let Some(message) = &snapshot.error {
        eprintln!("Error: {}", message);
        return Ok(ExitCode::FAILURE);
    }
    Ok(ExitCode::SUCCESS)
}

fn build_dashboard(config: &Config) -> Result<Dashboard, AppError> {
    let client = OpenWeatherClient::from_config(&config.weather)?;
    let service = WeatherService::new(client, Geolocator::from_config(&config.location))
        .with_forecast_config(config.forecast.clone());
    Ok(Dashboard::new(service, config.weather.temperature_unit))
}

/// Command-line flags win over the config file.
fn apply_overrides(config: &mut Config, cli: &Cli) {
    if let Some(unit) = cli.unit {
        config.weather.temperature_unit = unit;
    }
    if let Some(hour) = cli.exclude_today_after {
        config.forecast.exclude_today_after_hour = Some(hour);
    }
    if let Some(min) = cli.min_samples {
        config.forecast.min_samples_per_day = Some(min);
    }
}

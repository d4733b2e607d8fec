use super::types::*;
use crate::error::WeatherError;
use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;

pub const MAX_FORECAST_DAYS: usize = 5;
pub const HOURS_PER_DAY: i64 = 24;

const PLACEHOLDER_CONDITION: &str = "Unknown";
const PLACEHOLDER_ICON: &str = "01d";

/// Builds the canonical result from the two upstream payloads.
///
/// `now` and `tz` define "today" for the hourly series and the start of the
/// forecast window, so the output is fully determined by the arguments.
pub fn normalize(
    current: &CurrentResponse,
    forecast: &Forecast3hResponse,
    now: DateTime<Utc>,
    tz: Tz,
) -> Result<WeatherResult, WeatherError> {
    let descriptor = current.weather.first().ok_or_else(|| {
        WeatherError::UpstreamProtocol("current conditions carry no weather entry".to_string())
    })?;

    if let Some(item) = forecast.list.iter().find(|item| item.weather.is_empty()) {
        return Err(WeatherError::UpstreamProtocol(format!(
            "forecast sample at {} carries no weather entry",
            item.dt
        )));
    }

    Ok(WeatherResult {
        city: current.name.clone(),
        country: current.sys.country.clone(),
        temperature: round_temp(current.main.temp),
        condition: descriptor.main.clone(),
        description: descriptor.description.clone(),
        icon: descriptor.icon.clone(),
        humidity: current.main.humidity.round() as i64,
        wind_speed: current.wind.speed,
        pressure: current.main.pressure.round() as i64,
        forecast: aggregate_daily(&forecast.list, now, tz),
        hourly: synthesize_hourly(&forecast.list, now, tz),
    })
}

pub fn round_temp(temp: f64) -> i64 {
    temp.round() as i64
}

/// One entry per calendar date (in `tz`), taken from the first sample of that
/// date that falls inside `[now, now + 5 days]`, at most five dates.
pub fn aggregate_daily(items: &[Forecast3hItem], now: DateTime<Utc>, tz: Tz) -> Vec<DayForecast> {
    let window_end = now + Duration::days(MAX_FORECAST_DAYS as i64);

    let mut eligible: Vec<&Forecast3hItem> = items
        .iter()
        .filter(|item| {
            sample_time(item).is_some_and(|ts| ts >= now && ts <= window_end)
        })
        .collect();
    // Stable, so samples sharing a timestamp keep their upstream order.
    eligible.sort_by_key(|item| item.dt);

    let mut seen: Vec<NaiveDate> = Vec::with_capacity(MAX_FORECAST_DAYS);
    let mut days = Vec::with_capacity(MAX_FORECAST_DAYS);

    for item in eligible {
        let Some(ts) = sample_time(item) else {
            continue;
        };
        let date = ts.with_timezone(&tz).date_naive();
        if seen.contains(&date) {
            continue;
        }
        seen.push(date);

        let Some(descriptor) = item.weather.first() else {
            continue;
        };
        days.push(DayForecast {
            date: day_label(date),
            temp: round_temp(item.main.temp),
            condition: descriptor.main.clone(),
            icon: descriptor.icon.clone(),
        });

        if days.len() == MAX_FORECAST_DAYS {
            break;
        }
    }

    days
}

/// Exactly 24 slots for hours 0..=23 of today in `tz`, each copied from the
/// sample nearest in time to that hour.
pub fn synthesize_hourly(items: &[Forecast3hItem], now: DateTime<Utc>, tz: Tz) -> Vec<HourSlot> {
    let midnight = start_of_day(now, tz);

    (0..HOURS_PER_DAY)
        .map(|hour| {
            let target = midnight + Duration::hours(hour);
            let time = target.with_timezone(&tz).format("%I:%M %p").to_string();

            match nearest_sample(items, target.timestamp()) {
                Some((item, descriptor)) => HourSlot {
                    time,
                    temp: round_temp(item.main.temp),
                    condition: descriptor.main.clone(),
                    icon: descriptor.icon.clone(),
                },
                None => HourSlot {
                    time,
                    temp: 0,
                    condition: PLACEHOLDER_CONDITION.to_string(),
                    icon: PLACEHOLDER_ICON.to_string(),
                },
            }
        })
        .collect()
}

// Ties go to the sample seen first.
fn nearest_sample(
    items: &[Forecast3hItem],
    target_ts: i64,
) -> Option<(&Forecast3hItem, &WeatherDescriptor)> {
    let mut best: Option<(&Forecast3hItem, &WeatherDescriptor, i64)> = None;

    for item in items {
        let Some(descriptor) = item.weather.first() else {
            continue;
        };
        let distance = (item.dt - target_ts).abs();
        if best.map_or(true, |(_, _, best_distance)| distance < best_distance) {
            best = Some((item, descriptor, distance));
        }
    }

    best.map(|(item, descriptor, _)| (item, descriptor))
}

/// Local midnight of the day containing `now`. On days where midnight falls in
/// a DST gap the first valid instant after it is used.
pub fn start_of_day(now: DateTime<Utc>, tz: Tz) -> DateTime<Utc> {
    let local_date = now.with_timezone(&tz).date_naive();
    let naive_midnight = local_date.and_time(NaiveTime::MIN);

    (0..HOURS_PER_DAY)
        .find_map(|hour| {
            tz.from_local_datetime(&(naive_midnight + Duration::hours(hour)))
                .earliest()
        })
        .map(|local| local.with_timezone(&Utc))
        .unwrap_or_else(|| Utc.from_utc_datetime(&naive_midnight))
}

fn sample_time(item: &Forecast3hItem) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp(item.dt, 0)
}

fn day_label(date: NaiveDate) -> String {
    format!("{}/{}/{}", date.month(), date.day(), date.year())
}

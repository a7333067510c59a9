use std::sync::Arc;

use clap::{Parser, Subcommand};
use serde_json::{Map, Value};
use sunrise_alarm::{
    alarm::{AlarmConfig, WakeTime},
    appsettings::AppSettings,
    scheduling::{AlarmManager, Clock, LocalClock, LoggingWorkerFactory, plan_alarm},
    storage::{ConfigStorage, JsonFileConfigStorage},
    validation::apply_edit,
};

#[derive(Parser, Debug)]
#[command(version, about = "Sunrise alarm clock")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Schedule the alarm and keep it scheduled until Ctrl-C
    Run,
    /// Print the next alarm and when its sunrise starts
    Next,
    /// Print the stored config
    Show,
    /// Change one or more config fields
    Set {
        #[arg(long)]
        enabled: Option<bool>,
        /// H:MM or HH:MM
        #[arg(long)]
        wake_time: Option<String>,
        /// Sunrise minutes before the alarm, 1-60
        #[arg(long)]
        duration: Option<i64>,
        /// Comma separated, 0 = Sunday .. 6 = Saturday
        #[arg(long, value_delimiter = ',')]
        days: Option<Vec<i64>>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    pretty_env_logger::init();

    let cli = Cli::parse();
    let settings = AppSettings::new()?;
    let storage = JsonFileConfigStorage::new(&settings.storage.config_path);

    match cli.command {
        Command::Run => run(&settings, &storage).await,
        Command::Next => {
            let config = storage.load().await?;
            print_next(&config, &LocalClock);
            Ok(())
        }
        Command::Show => {
            let config = storage.load().await?;
            println!("{}", serde_json::to_string_pretty(&config)?);
            Ok(())
        }
        Command::Set {
            enabled,
            wake_time,
            duration,
            days,
        } => {
            let mut edit = Map::new();
            if let Some(enabled) = enabled {
                edit.insert("enabled".into(), Value::from(enabled));
            }
            if let Some(wake_time) = wake_time {
                edit.insert("wakeTime".into(), Value::from(wake_time));
            }
            if let Some(duration) = duration {
                edit.insert("duration".into(), Value::from(duration));
            }
            if let Some(days) = days {
                edit.insert("daysOfWeek".into(), Value::from(days));
            }

            let current = storage.load().await?;
            let edit = Value::Object(edit);
            let updated = apply_edit(&current, &edit);
            warn_rejected_fields(&edit, &updated);

            storage.save(&updated).await?;
            println!("{}", serde_json::to_string_pretty(&updated)?);
            print_next(&updated, &LocalClock);
            Ok(())
        }
    }
}

async fn run(settings: &AppSettings, storage: &impl ConfigStorage) -> anyhow::Result<()> {
    let manager = AlarmManager::create(
        LoggingWorkerFactory,
        Arc::new(LocalClock),
        settings.scheduler.cancel_timeout(),
    );

    let mut current = match storage.load().await {
        Ok(config) => config,
        Err(error) => {
            manager.shutdown().await?;
            return Err(error);
        }
    };
    if let Err(error) = manager.reschedule(current.clone()).await {
        log::error!("Could not schedule alarm. error = {error}");
        manager.shutdown().await?;
        return Err(error);
    }

    let mut reload = tokio::time::interval(settings.scheduler.reload_interval());
    reload.tick().await;

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                log::info!("Received Ctrl-C");
                break;
            }
            _ = reload.tick() => {
                let latest = match storage.load().await {
                    Ok(latest) => latest,
                    Err(error) => {
                        log::error!("Could not reload alarm config. error = {error}");
                        continue;
                    }
                };
                if latest != current {
                    log::info!("Alarm config changed, rescheduling");
                    if let Err(error) = manager.reschedule(latest.clone()).await {
                        log::error!("Could not reschedule alarm. error = {error}");
                        break;
                    }
                    current = latest;
                }
            }
        }
    }

    manager.shutdown().await
}

fn print_next(config: &AlarmConfig, clock: &dyn Clock) {
    match plan_alarm(config, clock.now()) {
        Some(plan) => {
            println!("Next alarm:     {}", plan.alarm_at.format("%a %Y-%m-%d %H:%M"));
            println!("Sunrise starts: {}", plan.sunrise_start.format("%a %Y-%m-%d %H:%M"));
        }
        None => println!("Alarm is disabled"),
    }
}

fn warn_rejected_fields(edit: &Value, updated: &AlarmConfig) {
    let Ok(Value::Object(updated)) = serde_json::to_value(updated) else {
        return;
    };
    let Some(edit) = edit.as_object() else {
        return;
    };

    for (key, requested) in edit {
        let accepted = match (key.as_str(), updated.get(key)) {
            // "7:00" is stored as "07:00"
            ("wakeTime", Some(Value::String(stored))) => requested
                .as_str()
                .and_then(|s| s.parse::<WakeTime>().ok())
                .is_some_and(|t| t.to_string() == *stored),
            ("daysOfWeek", Some(stored)) => {
                let mut requested: Vec<_> = requested
                    .as_array()
                    .map(|days| days.iter().filter_map(Value::as_i64).collect())
                    .unwrap_or_default();
                requested.sort_unstable();
                requested.dedup();
                stored
                    .as_array()
                    .is_some_and(|days| days.iter().filter_map(Value::as_i64).eq(requested))
            }
            (_, stored) => stored == Some(requested),
        };
        if !accepted {
            log::warn!("Rejected invalid value for {key}: {requested}");
            eprintln!("Ignored invalid {key}: {requested}");
        }
    }
}

// src/main.rs
//
// Composition root and command line entry point.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use log::{info, LevelFilter};
use serde::Serialize;

use parcelguard::application::commands::*;
use parcelguard::application::{
    AppState, CommandResult, ErrorResponse, ListParcelsDto, UpdateSettingDto,
};
use parcelguard::config::RuntimeConfig;
use parcelguard::db::{create_connection_pool, initialize_database, verify_database_integrity};
use parcelguard::error::AppError;
use parcelguard::integrations::HttpDetectionAdapter;

#[derive(Parser)]
#[command(name = "parcelguard", version, about = "Parcel inspection and auto-resolution")]
struct Cli {
    #[command(flatten)]
    config: RuntimeConfig,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Create the database and seed default settings
    Init,

    /// Parcel registry
    #[command(subcommand)]
    Parcel(ParcelCommand),

    /// Inspections
    #[command(subcommand)]
    Inspect(InspectCommand),

    /// Auto-resolution settings
    #[command(subcommand)]
    Settings(SettingsCommand),
}

#[derive(Subcommand)]
enum ParcelCommand {
    /// Register a received parcel
    Register { tracking_number: String },

    /// Show one parcel by id or tracking number
    Show { parcel: String },

    /// List parcels, newest first
    List {
        #[arg(long)]
        status: Option<String>,
        /// Only parcels with (true) or without (false) damage
        #[arg(long)]
        damaged: Option<bool>,
        /// Tracking number substring
        #[arg(long)]
        search: Option<String>,
        #[arg(long, default_value_t = 1)]
        page: u32,
        #[arg(long, default_value_t = 20)]
        limit: u32,
    },

    /// Assign a status administratively
    SetStatus { parcel_id: String, status: String },

    /// Assign one status to several parcels
    BulkSetStatus {
        status: String,
        #[arg(required = true)]
        parcel_ids: Vec<String>,
    },
}

#[derive(Subcommand)]
enum InspectCommand {
    /// Inspect a parcel from image files, then complete and resolve it
    Run {
        parcel_id: String,
        #[arg(required = true)]
        images: Vec<PathBuf>,
    },

    /// Show an inspection with its images and detections
    Show { inspection_id: String },

    /// List the inspections of a parcel
    History { parcel_id: String },

    /// Complete an in-progress inspection and resolve its parcel
    Complete { inspection_id: String },

    /// Re-evaluate a completed inspection and apply the decision
    Resolve {
        parcel_id: String,
        inspection_id: String,
    },

    /// Mark an in-progress inspection failed
    Fail {
        inspection_id: String,
        reason: String,
    },
}

#[derive(Subcommand)]
enum SettingsCommand {
    /// List settings
    List {
        #[arg(long)]
        category: Option<String>,
    },

    /// Update a setting value
    Set { key: String, value: String },
}

#[derive(Serialize)]
struct InitReport {
    database: PathBuf,
    stats: parcelguard::db::DatabaseStats,
}

#[derive(Serialize)]
struct InspectionReport {
    inspection: parcelguard::application::InspectionDto,
    images: Vec<parcelguard::application::InspectionImageDto>,
    detections: Vec<parcelguard::application::DetectionDto>,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut logger = env_logger::Builder::from_default_env();
    if let Some(level) = cli.config.log_level {
        logger.filter_level(level);
    } else if std::env::var_os("RUST_LOG").is_none() {
        logger.filter_level(LevelFilter::Warn);
    }
    logger.init();

    cli.config.validate()?;

    // 1. INFRASTRUCTURE
    let db_path = cli.config.database_path()?;
    let pool = Arc::new(
        create_connection_pool(&db_path)
            .with_context(|| format!("opening database {}", db_path.display()))?,
    );
    {
        let conn = pool.get().context("acquiring a database connection")?;
        initialize_database(&conn)?;
        verify_database_integrity(&conn)?;
    }

    let detector = Arc::new(HttpDetectionAdapter::new(
        cli.config.detector_url.clone(),
        cli.config.detector_timeout(),
    )?);
    info!("Using detector at {}", detector.endpoint());

    // 2. APPLICATION STATE
    let state = AppState::new(pool, detector, cli.config.images_per_inspection)?;

    // 3. DISPATCH
    match dispatch(&state, cli.command, db_path) {
        Ok(output) => {
            println!("{}", serde_json::to_string_pretty(&output)?);
            Ok(())
        }
        Err(response) => {
            eprintln!("{}", serde_json::to_string_pretty(&response)?);
            std::process::exit(1);
        }
    }
}

fn dispatch(state: &AppState, command: Command, db_path: PathBuf) -> CommandResult<serde_json::Value> {
    match command {
        Command::Init => to_json(InitReport {
            database: db_path,
            stats: get_system_stats(state)?,
        }),

        Command::Parcel(ParcelCommand::Register { tracking_number }) => {
            to_json(register_parcel(state, &tracking_number)?)
        }
        Command::Parcel(ParcelCommand::Show { parcel }) => to_json(show_parcel(state, &parcel)?),
        Command::Parcel(ParcelCommand::List {
            status,
            damaged,
            search,
            page,
            limit,
        }) => to_json(list_parcels(
            state,
            ListParcelsDto {
                status,
                has_damage: damaged,
                search,
                page: Some(page),
                limit: Some(limit),
            },
        )?),
        Command::Parcel(ParcelCommand::SetStatus { parcel_id, status }) => {
            to_json(update_parcel_status(state, &parcel_id, &status)?)
        }
        Command::Parcel(ParcelCommand::BulkSetStatus { status, parcel_ids }) => {
            to_json(bulk_update_parcel_status(state, &parcel_ids, &status)?)
        }

        Command::Inspect(InspectCommand::Run { parcel_id, images }) => {
            let bytes = images
                .iter()
                .map(|path| {
                    std::fs::read(path).map_err(|e| {
                        ErrorResponse::validation(format!(
                            "Cannot read image {}: {}",
                            path.display(),
                            e
                        ))
                    })
                })
                .collect::<CommandResult<Vec<_>>>()?;
            to_json(run_inspection(state, &parcel_id, &bytes)?)
        }
        Command::Inspect(InspectCommand::Show { inspection_id }) => to_json(InspectionReport {
            inspection: get_inspection(state, &inspection_id)?,
            images: list_inspection_images(state, &inspection_id)?,
            detections: list_inspection_detections(state, &inspection_id)?,
        }),
        Command::Inspect(InspectCommand::History { parcel_id }) => {
            to_json(list_parcel_inspections(state, &parcel_id)?)
        }
        Command::Inspect(InspectCommand::Complete { inspection_id }) => {
            to_json(complete_and_resolve(state, &inspection_id)?)
        }
        Command::Inspect(InspectCommand::Resolve {
            parcel_id,
            inspection_id,
        }) => to_json(resolve_parcel(state, &parcel_id, &inspection_id)?),
        Command::Inspect(InspectCommand::Fail {
            inspection_id,
            reason,
        }) => to_json(fail_inspection(state, &inspection_id, &reason)?),

        Command::Settings(SettingsCommand::List { category }) => {
            to_json(list_settings(state, category.as_deref())?)
        }
        Command::Settings(SettingsCommand::Set { key, value }) => {
            to_json(update_setting(state, UpdateSettingDto { key, value })?)
        }
    }
}

fn to_json<T: Serialize>(value: T) -> CommandResult<serde_json::Value> {
    serde_json::to_value(value).map_err(|e| ErrorResponse::from(AppError::from(e)))
}

use clap::{Parser, Subcommand};
use chrono::NaiveDate;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use fieldtrack::backend::{HttpLocationApi, LocationApi};
use fieldtrack::camera::CameraController;
use fieldtrack::history::{HistoryOutcome, HistoryQuery, HistoryRequest};
use fieldtrack::playback::{tick_interval, PlaybackEngine, PlaybackStatus};
use fieldtrack::scheduler::TokioScheduler;
use fieldtrack::web::{run_server, Config};

#[derive(Parser)]
#[command(name = "fieldtrack")]
#[command(about = "Live map and location replay for field staff")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a config file
    CheckConfig { config: String },
    /// Run the map API server
    Serve { config: String },
    /// Replay one entity's history in the terminal
    Replay {
        config: String,
        #[arg(long)]
        entity: String,
        #[arg(long)]
        from: NaiveDate,
        #[arg(long)]
        to: NaiveDate,
        #[arg(long, default_value_t = 1.0)]
        speed: f64,
    },
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    match cli.command {
        Commands::CheckConfig { config } => check_config(&config),
        Commands::Serve { config } => serve(&config),
        Commands::Replay {
            config,
            entity,
            from,
            to,
            speed,
        } => replay(
            &config,
            HistoryRequest {
                entity_id: entity,
                from,
                to,
            },
            speed,
        ),
    }
}

fn load_config(path: &str) -> Option<Config> {
    match Config::from_file(path) {
        Ok(c) => Some(c),
        Err(e) => {
            eprintln!("Config error: {}", e);
            None
        }
    }
}

fn runtime() -> Option<tokio::runtime::Runtime> {
    match tokio::runtime::Runtime::new() {
        Ok(rt) => Some(rt),
        Err(e) => {
            eprintln!("Failed to start runtime: {}", e);
            None
        }
    }
}

fn check_config(path: &str) -> ExitCode {
    let Some(config) = load_config(path) else {
        return ExitCode::FAILURE;
    };
    let camera = config.camera_state();
    println!("Config is valid");
    println!("  backend:        {}", config.api.base_url);
    println!("  bind:           {}", config.web.bind);
    println!("  poll interval:  {:?}", config.live.poll_interval);
    println!("  replay tick:    {:?}", config.playback.base_interval);
    println!("  trail on seek:  {:?}", config.playback.trail_on_seek);
    println!(
        "  camera:         {:.4},{:.4} z{}",
        camera.center.lat, camera.center.lng, camera.zoom
    );
    println!("  icon size:      {}px", config.icons.size);
    ExitCode::SUCCESS
}

fn serve(path: &str) -> ExitCode {
    let Some(config) = load_config(path) else {
        return ExitCode::FAILURE;
    };
    let Some(rt) = runtime() else {
        return ExitCode::FAILURE;
    };

    match rt.block_on(run_server(config)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Server error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn replay(path: &str, request: HistoryRequest, speed: f64) -> ExitCode {
    let Some(config) = load_config(path) else {
        return ExitCode::FAILURE;
    };
    let Some(rt) = runtime() else {
        return ExitCode::FAILURE;
    };

    rt.block_on(async move {
        let api: Arc<dyn LocationApi> =
            match HttpLocationApi::new(&config.api.base_url, config.api.timeout) {
                Ok(api) => Arc::new(api),
                Err(e) => {
                    eprintln!("Backend client error: {}", e);
                    return ExitCode::FAILURE;
                }
            };

        let outcome = match HistoryQuery::new(api).fetch(&request).await {
            Ok(outcome) => outcome,
            Err(e) => {
                eprintln!("History query failed: {}", e);
                return ExitCode::FAILURE;
            }
        };

        let camera = CameraController::new(config.camera_state());
        let mut engine = PlaybackEngine::new(
            config.playback.settings(),
            Arc::new(TokioScheduler::new(tokio::runtime::Handle::current())),
            camera.clone(),
        );
        if let HistoryOutcome::NoData = outcome {
            eprintln!(
                "No location data for {} between {} and {}",
                request.entity_id, request.from, request.to
            );
            return ExitCode::FAILURE;
        }
        outcome.load_into(&mut engine);

        if let Err(e) = engine.set_speed(speed).and_then(|_| engine.play()) {
            eprintln!("Replay error: {}", e);
            return ExitCode::FAILURE;
        }

        let poll = tick_interval(config.playback.base_interval, speed).max(Duration::from_millis(10));
        let mut last_index = None;
        loop {
            let frame = engine.frame();
            if frame.current_index != last_index {
                last_index = frame.current_index;
                if let Some(sample) = &frame.current {
                    println!(
                        "[{} / {}] {} {:.6},{:.6}",
                        frame.progress.played,
                        frame.progress.total,
                        fieldtrack::model::format_captured_at(&sample.captured_at),
                        sample.latitude,
                        sample.longitude
                    );
                }
            }
            if frame.status == PlaybackStatus::Completed {
                break;
            }
            tokio::time::sleep(poll).await;
        }

        let view = camera.state();
        println!(
            "Replay completed: {} samples, camera at {:.6},{:.6}",
            engine.frame().total_samples,
            view.center.lat,
            view.center.lng
        );
        ExitCode::SUCCESS
    })
}

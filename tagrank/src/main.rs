// This file is part of the product tagrank.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use actix_web::rt::System;
use actix_web::{App, HttpServer, middleware::Logger, web};
use log::info;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use tagrank::app_state::AppState;
use tagrank::config::ValidatedConfig;
use tagrank::runtime_paths::RuntimePaths;
use tagrank::{admin, bootstrap, management};

fn main() {
    let exit_code = run();
    std::process::exit(exit_code);
}

fn run() -> i32 {
    let parsed_args = match parse_args() {
        Ok(args) => args,
        Err(error) => {
            eprintln!("❌ Invalid command line arguments: {}", error);
            eprintln!("❌ Use -C <root> to set the runtime directory, or -h for help.");
            return 2;
        }
    };

    match parsed_args.mode {
        RunMode::Help => {
            print!("{}", management::cli::help_text());
            0
        }
        RunMode::Cli(tokens) => System::new()
            .block_on(async { management::cli::run_cli(&parsed_args.runtime_root, tokens).await }),
        RunMode::Server => {
            let bootstrap = match bootstrap::bootstrap_runtime(&parsed_args.runtime_root) {
                Ok(result) => result,
                Err(error) => {
                    eprintln!("❌ Bootstrap error: {}", error);
                    eprintln!("❌ Application cannot start with invalid configuration.");
                    return 1;
                }
            };
            match System::new().block_on(run_server(bootstrap)) {
                Ok(()) => 0,
                Err(error) => {
                    eprintln!("❌ Server failed: {}", error);
                    1
                }
            }
        }
    }
}

async fn run_server(bootstrap: bootstrap::BootstrapResult) -> std::io::Result<()> {
    let validated_config = Arc::new(bootstrap.validated_config);
    let runtime_paths = bootstrap.runtime_paths;

    init_logging(&validated_config)?;
    log_startup_info(&validated_config, &runtime_paths);

    let management_registry = management::build_default_registry().map_err(|error| {
        eprintln!("❌ Failed to initialize management registry: {}", error);
        std::io::Error::other(error.to_string())
    })?;
    let management_context = management::ManagementContext::from_components(
        validated_config.clone(),
        runtime_paths.clone(),
    )
    .map_err(|error| {
        eprintln!("❌ Failed to initialize management context: {}", error);
        std::io::Error::other(error.to_string())
    })?;
    let management_bus = management::ManagementBus::start(management_registry, management_context);
    info!(
        "✅ Management bus started with {} domains",
        management_bus.registry().domains().len()
    );

    let app_state = Arc::new(AppState::new(runtime_paths, management_bus));

    let admin_path = validated_config.admin.path.clone();
    let bind_address = (
        validated_config.server.host.clone(),
        validated_config.server.port,
    );
    let workers = validated_config.server.workers;

    info!(
        "🚀 Listening on http://{}:{}{}",
        bind_address.0, bind_address.1, admin_path
    );

    let config_for_app = validated_config.clone();
    HttpServer::new(move || {
        let admin_path = admin_path.clone();
        App::new()
            .app_data(web::Data::from(config_for_app.clone()))
            .app_data(web::Data::from(app_state.clone()))
            .wrap(Logger::default())
            .configure(move |cfg| admin::configure(cfg, &admin_path))
    })
    .workers(workers)
    .bind(bind_address)?
    .run()
    .await
}

fn init_logging(config: &ValidatedConfig) -> std::io::Result<()> {
    env_logger::Builder::from_default_env()
        .filter_level(config.log_level_filter())
        .target(env_logger::Target::Stdout)
        .format(|buf, record| {
            writeln!(
                buf,
                "{} [{}] {}: {}",
                chrono::Utc::now().format("%Y-%m-%d %H:%M:%S%.3f UTC"),
                record.level(),
                record.target(),
                record.args()
            )
        })
        .try_init()
        .map_err(|error| {
            eprintln!("❌ Failed to initialize logger: {}", error);
            std::io::Error::other(error.to_string())
        })
}

fn log_startup_info(config: &ValidatedConfig, runtime_paths: &RuntimePaths) {
    info!("Starting {} ({})", config.app.name, config.app.description);
    info!("Runtime root: {}", runtime_paths.root.display());
    info!("State directory: {}", runtime_paths.state_sys_dir.display());
    info!("Admin path: {}", config.admin.path);
    info!("User tag prefix: {}", config.tags.user_tag_prefix);
}

#[derive(Debug)]
enum RunMode {
    Server,
    Help,
    Cli(Vec<String>),
}

#[derive(Debug)]
struct ParsedArgs {
    runtime_root: PathBuf,
    mode: RunMode,
}

fn parse_args() -> Result<ParsedArgs, String> {
    parse_args_from(std::env::args().skip(1))
}

fn parse_args_from<I>(args: I) -> Result<ParsedArgs, String>
where
    I: IntoIterator<Item = String>,
{
    let args: Vec<String> = args.into_iter().collect();
    if args.iter().any(|arg| is_help_flag(arg)) {
        return Ok(ParsedArgs {
            runtime_root: PathBuf::from("."),
            mode: RunMode::Help,
        });
    }

    let mut args = args.into_iter();
    let mut runtime_root = PathBuf::from(".");
    let mut cli_tokens = Vec::new();

    while let Some(arg) = args.next() {
        if arg == "--" {
            continue;
        } else if arg == "-C" {
            let value = args
                .next()
                .ok_or_else(|| "Missing value for -C".to_string())?;
            runtime_root = PathBuf::from(value);
        } else {
            cli_tokens.push(arg);
        }
    }

    if cli_tokens.len() == 1 && cli_tokens[0].eq_ignore_ascii_case("help") {
        return Ok(ParsedArgs {
            runtime_root,
            mode: RunMode::Help,
        });
    }

    let runtime_root = make_runtime_root_absolute(runtime_root)?;
    let mode = if cli_tokens.is_empty() {
        RunMode::Server
    } else {
        RunMode::Cli(cli_tokens)
    };

    Ok(ParsedArgs { runtime_root, mode })
}

fn is_help_flag(arg: &str) -> bool {
    arg == "-h" || arg == "--help"
}

fn make_runtime_root_absolute(runtime_root: PathBuf) -> Result<PathBuf, String> {
    if runtime_root.is_absolute() {
        return Ok(runtime_root);
    }

    let current_dir = std::env::current_dir()
        .map_err(|error| format!("Failed to resolve current directory: {}", error))?;
    Ok(current_dir.join(runtime_root))
}

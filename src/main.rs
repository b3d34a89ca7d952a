use anyhow::Result;
use chrono::Utc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use floatperiod::cli::{self, Report};
use floatperiod::config::Config;
use floatperiod::scheduler::run_scheduler;

#[tokio::main]
async fn main() -> Result<()> {
    let args = cli::parse_args();

    if args.help {
        cli::print_help();
        return Ok(());
    }

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("floatperiod=info".parse()?),
        )
        .init();

    info!("floatperiod v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration
    let config = Config::from_env()?;
    info!("Configuration loaded");
    info!("  Label: {}", config.label);
    info!("  Window: {} - {}", config.period_start, config.period_end);
    info!("  Days: {}", config.period_days);
    info!("  Timezone: {}", config.period_tz);

    // Handle --validate mode
    if args.validate {
        info!("Validating configuration...");
        match config.validate() {
            Ok(()) => {
                info!("Configuration is valid");
                return Ok(());
            }
            Err(e) => {
                error!("{}", e);
                std::process::exit(1);
            }
        }
    }

    let period = config.period()?;
    info!("Period: {}", period);

    // Single query modes
    let instant = match (&args.at, args.now) {
        (Some(at), _) => Some(cli::parse_instant(at)?.with_timezone(&Utc)),
        (None, true) => Some(Utc::now()),
        (None, false) => None,
    };

    if let Some(instant) = instant {
        let report = Report::build(&period, &config.label, instant);
        if args.json {
            println!("{}", serde_json::to_string_pretty(&report)?);
        } else {
            println!("{}", report.summary());
        }
        if !report.contained {
            std::process::exit(2);
        }
        return Ok(());
    }

    if !args.watch {
        cli::print_help();
        return Ok(());
    }

    // Watch mode: log each window until Ctrl-C
    let cancel = CancellationToken::new();
    let shutdown = cancel.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("Shutdown requested");
                shutdown.cancel();
            }
            Err(e) => error!("Failed to listen for Ctrl-C: {}", e),
        }
    });

    let label = config.label.clone();
    run_scheduler(period, &config.label, cancel, |window| {
        let label = label.clone();
        async move {
            info!(
                "{} window opened: {} .. {} ({} min)",
                label,
                window.start.to_rfc3339(),
                window.end.to_rfc3339(),
                window.duration().num_minutes()
            );
        }
    })
    .await;

    Ok(())
}

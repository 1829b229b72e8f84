use burn::backend::{Autodiff, NdArray};
use cubestack::infra::{CompositeObserver, DefaultObserver, SimObserver, StatusLog};
use cubestack::learning::BurnCorrector;
use cubestack::{SimConfig, Simulation};
use dotenv::dotenv;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

type Backend = Autodiff<NdArray>;

fn init_logging() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("cubestack=info,warn"));

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .with_ansi(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");
}

fn build_observer(config: &SimConfig) -> CompositeObserver {
    let mut observers: Vec<Box<dyn SimObserver>> =
        vec![Box::new(DefaultObserver::new(config.status_every))];

    if let Some(folder) = &config.status_folder {
        match StatusLog::new(folder, config.status_every) {
            Ok(log) => observers.push(Box::new(log)),
            Err(e) => warn!("Status log unavailable in {}: {}", folder, e),
        }
    }

    CompositeObserver::new(observers)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv().ok();
    init_logging();

    let config = SimConfig::from_env()?;
    info!(
        "Corrector: hidden {}, learning rate {}",
        config.corrector.hidden_size, config.corrector.learning_rate
    );

    let observer = build_observer(&config);
    let corrector_config = config.corrector.clone();
    let mut sim = Simulation::new(
        config,
        |_, encoding| {
            Ok(BurnCorrector::<Backend>::new(
                Default::default(),
                encoding,
                corrector_config.clone(),
            ))
        },
        observer,
    )?;

    sim.run().await;
    Ok(())
}

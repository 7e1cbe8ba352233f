use geolocation::{
    Address, Coordinates, ErrorRecord, Geolocation, GeolocationConfig, JsonFileStore, MemoryStore,
    PositionSample, PreferenceStore, ProviderRevision, SimulatedProvider,
};
use std::rc::Rc;
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
        .unwrap_or(0)
}

fn reading(lat: f64, lon: f64, address: Option<Address>) -> Rc<PositionSample> {
    let coords = Coordinates::new(lat, lon, 4.0)
        .with_altitude(35.0, 8.0)
        .with_motion(270.0, 1.2);
    let sample = PositionSample::new(now_ms(), coords);
    Rc::new(match address {
        Some(address) => sample.with_address(address),
        None => sample,
    })
}

/// Drive a simulated provider through grant, read, watch and revoke
fn run_demo<S: PreferenceStore + 'static>(config: GeolocationConfig, store: S) -> Result<(), Box<dyn std::error::Error>> {
    let provider = SimulatedProvider::new();
    let geo = Geolocation::initialize(config, provider.clone(), store)?;

    geo.on_coords(|coords| {
        println!("coords: lat={:.6}, lon={:.6}, accuracy={:.1} m", coords.latitude, coords.longitude, coords.accuracy)
    });
    geo.on_address(|address| {
        let parts: Vec<String> = address.iter().map(|(k, v)| format!("{}={}", k, v)).collect();
        println!("address: {}", parts.join(", "));
    });
    geo.on_error(|error| println!("error [{}]: {}", error.kind(), error));

    let mut denied = geo.get_current_position();
    if let Some(Err(e)) = denied.try_result() {
        info!(error = %e, "request before permission grant was rejected");
    }

    geo.set_allowed(true)?;

    let mut current = geo.get_current_position();
    let address = Address::new().with("street", "Rua Augusta").with("city", "Lisboa");
    provider.resolve_current(reading(38.7100, -9.1366, Some(address)));
    match current.try_result() {
        Some(Ok(sample)) => info!(timestamp = sample.timestamp_ms, "one-shot reading received"),
        Some(Err(e)) => error!(error = %e, "one-shot reading failed"),
        None => info!("one-shot reading still pending"),
    }

    let _watch = geo.watch_position();
    for step in 1..=3 {
        let offset = step as f64 * 0.0005;
        provider.push_position(reading(38.7100 + offset, -9.1366, None));
    }
    provider.push_error(ErrorRecord::timeout());

    geo.set_allowed(false)?;
    let ignored = provider.push_late_position(reading(0.0, 0.0, None));
    info!(
        watching = geo.is_watching(),
        late_callbacks = ignored,
        "permission revoked"
    );

    geo.teardown();
    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args: Vec<String> = std::env::args().collect();
    let program = args.first().map_or("geolocation", |s| s.as_str());

    let mut config = GeolocationConfig::default();
    let mut store_path = None;
    let mut rest = args.iter().skip(1);
    while let Some(arg) = rest.next() {
        match arg.as_str() {
            "--legacy" => config.revision = ProviderRevision::Legacy,
            "--config" => {
                let path = rest.next().ok_or("--config needs a path")?;
                config = GeolocationConfig::load_from_file(path)?;
            }
            "--store" => {
                store_path = Some(rest.next().ok_or("--store needs a path")?.clone());
            }
            _ => {
                eprintln!("Usage: {} [--legacy] [--config <json_file>] [--store <json_file>]", program);
                return Err("Invalid arguments".into());
            }
        }
    }

    match store_path {
        Some(path) => run_demo(config, JsonFileStore::open(path)?),
        None => run_demo(config, MemoryStore::new()),
    }
}

/*!
 * Dispatch Demo - Main Entry Point
 *
 * Cooperative main loop servicing a simulated ambient light sensor:
 * - A producer thread takes readings and signals through a Signaler
 * - The loop runs `service()` once per tick on the engine's thread
 * - A scripted `onchange` receives each reading; a native `onstop` clears it
 */

use deferred_callbacks::{
    init_tracing, CallbackTable, Context, LocalEngine, LocalValue, TableConfig,
};
use miette::{miette, IntoDiagnostic};
use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tracing::info;

/// Readings the simulated sensor produces before stopping
const SENSOR_READINGS: u32 = 5;

/// Time between sensor readings
const SENSOR_PERIOD: Duration = Duration::from_millis(100);

/// Main loop tick
const LOOP_TICK: Duration = Duration::from_millis(10);

/// Script-visible sensor object
struct AmbientLightSensor {
    /// Latest reading as f64 bits, written by the producer thread
    reading: Arc<AtomicU64>,
    /// The readonly `illuminance` property
    illuminance: RefCell<LocalValue>,
    stopped: Cell<bool>,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> miette::Result<()> {
    init_tracing();

    info!("Dispatch demo starting...");
    let config = TableConfig::from_env()?;
    let engine = Rc::new(LocalEngine::new());
    let table = CallbackTable::init(engine.clone(), config)?;

    let sensor = Rc::new(AmbientLightSensor {
        reading: Arc::new(AtomicU64::new(0)),
        illuminance: RefCell::new(LocalValue::Null),
        stopped: Cell::new(false),
    });

    let onchange = LocalValue::function("onchange", |args| {
        let lux = args.first().and_then(LocalValue::as_number);
        info!(illuminance = ?lux, "onchange");
        Ok(LocalValue::Undefined)
    });

    let change = table.register_scripted(
        &onchange,
        Context::shared(sensor.clone()),
        Some(Rc::new(|ctx: &Context| {
            ctx.downcast_ref::<AmbientLightSensor>()
                .map(|s| vec![LocalValue::Number(f64::from_bits(s.reading.load(Ordering::Acquire)))])
                .unwrap_or_default()
        })),
        Some(Rc::new(|ctx: &Context, _ret: &LocalValue| {
            if let Some(s) = ctx.downcast_ref::<AmbientLightSensor>() {
                let lux = f64::from_bits(s.reading.load(Ordering::Acquire));
                *s.illuminance.borrow_mut() = LocalValue::Number(lux);
            }
        })),
    )?;

    let stop = table.register_native(
        Context::shared(sensor.clone()),
        Rc::new(|ctx: &Context| {
            if let Some(s) = ctx.downcast_ref::<AmbientLightSensor>() {
                *s.illuminance.borrow_mut() = LocalValue::Null;
                s.stopped.set(true);
                info!("onstop");
            }
        }),
    )?;

    let on_change = table
        .signaler(change)
        .ok_or_else(|| miette!("change callback vanished"))?;
    let on_stop = table
        .signaler(stop)
        .ok_or_else(|| miette!("stop callback vanished"))?;
    let reading = sensor.reading.clone();

    info!(change = %change, stop = %stop, "Sensor callbacks registered");

    let producer = thread::Builder::new()
        .name("light-sensor".into())
        .spawn(move || {
            for i in 0..SENSOR_READINGS {
                thread::sleep(SENSOR_PERIOD);
                let lux = 120.0 + f64::from(i) * 35.5;
                reading.store(lux.to_bits(), Ordering::Release);
                on_change.signal();
            }
            on_stop.signal();
        })
        .into_diagnostic()?;

    let mut tick = tokio::time::interval(LOOP_TICK);
    let interrupt = tokio::signal::ctrl_c();
    tokio::pin!(interrupt);
    info!("Entering main loop...");
    while !sensor.stopped.get() {
        tokio::select! {
            _ = tick.tick() => {
                table.service();
            }
            _ = &mut interrupt => {
                info!("Interrupted");
                break;
            }
        }
    }

    producer
        .join()
        .map_err(|_| miette!("sensor thread panicked"))?;

    let stats = table.stats();
    info!(
        stats = %serde_json::to_string(&stats).into_diagnostic()?,
        illuminance = ?sensor.illuminance.borrow(),
        "Main loop finished"
    );

    let released = table.teardown();
    info!(
        released,
        live_references = engine.live_references(),
        "Dispatch demo shut down"
    );
    Ok(())
}

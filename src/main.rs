use anyhow::Result;
use async_trait::async_trait;
use glam::Vec3;
use motion_config::AppConfig;
use motion_math::{apply_rotation, STANDARD_GRAVITY};
use motion_observer::synthesis::orientation_event;
use motion_observer::{
    AxisConvention, MotionError, MotionEvent, MotionObserver, MotionType, ObserverSettings,
    PermissionGate, PermissionState, Platform, RawAxes, RawEvent, RawEventSource, RawMotion,
    RawOrientation, RawStream, Sensor,
};
use std::cell::RefCell;
use std::collections::{BTreeMap, BTreeSet};
use std::rc::Rc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// Host side of the demo. Only records which raw streams the observer wants.
#[derive(Default)]
struct SyntheticSource {
    attached: BTreeSet<RawStream>,
}

impl RawEventSource for SyntheticSource {
    fn attach(&mut self, stream: RawStream) {
        info!(?stream, "Raw stream attached");
        self.attached.insert(stream);
    }

    fn detach(&mut self, stream: RawStream) {
        info!(?stream, "Raw stream detached");
        self.attached.remove(&stream);
    }
}

/// Stands in for a platform prompt; grants everything.
struct AutoGrant;

#[async_trait(?Send)]
impl PermissionGate for AutoGrant {
    async fn request(&self, sensor: Sensor) -> Result<PermissionState, MotionError> {
        debug!(%sensor, "Auto-granting sensor permission");
        Ok(PermissionState::Granted)
    }
}

/// A device turning slowly about the vertical axis while being shaken
/// sideways. Like most platforms it never delivers absolute orientation and
/// reports no gravity-free acceleration of its own.
struct SyntheticDevice {
    convention: AxisConvention,
    interval_ms: f32,
}

impl SyntheticDevice {
    fn orientation(&self, now: Duration) -> RawOrientation {
        let t = now.as_secs_f32();
        RawOrientation {
            timestamp: now,
            alpha: Some((t * 20.0) % 360.0),
            beta: Some(60.0 + 10.0 * t.sin()),
            gamma: Some(5.0 * (0.5 * t).sin()),
            absolute: false,
            compass_heading: None,
            compass_accuracy: None,
        }
    }

    fn motion(&self, now: Duration) -> RawMotion {
        let t = now.as_secs_f32();
        let q = orientation_event(&self.orientation(now)).quaternion;
        let gravity = apply_rotation(Vec3::new(0.0, STANDARD_GRAVITY, 0.0), q.conjugate());
        let shake = Vec3::new(0.3 * (6.0 * t).sin(), 0.0, 0.0);
        let reading = (gravity + shake) * self.convention.signs();

        RawMotion {
            timestamp: now,
            acceleration: RawAxes::new(0.0, 0.0, 0.0),
            acceleration_including_gravity: RawAxes::new(reading.x, reading.y, reading.z),
            interval_ms: self.interval_ms,
        }
    }

    fn events(&self, now: Duration, attached: &BTreeSet<RawStream>) -> Vec<RawEvent> {
        let mut events = Vec::with_capacity(2);
        if attached.contains(&RawStream::RelativeOrientation) {
            events.push(RawEvent::RelativeOrientation(self.orientation(now)));
        }
        if attached.contains(&RawStream::Motion) {
            events.push(RawEvent::Motion(self.motion(now)));
        }
        events
    }
}

fn parse_filter(names: &[String]) -> Result<Option<Vec<MotionType>>> {
    if names.is_empty() {
        return Ok(None);
    }
    let types = names
        .iter()
        .map(|n| n.parse::<MotionType>())
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Some(types))
}

fn log_event(event: &MotionEvent) {
    match event {
        MotionEvent::Orientation(o) => debug!(
            alpha = o.alpha,
            beta = o.beta,
            gamma = o.gamma,
            absolute = o.absolute,
            "Orientation"
        ),
        MotionEvent::Acceleration(a) | MotionEvent::AccelerationIncludingGravity(a) => debug!(
            kind = %event.motion_type(),
            x = a.acceleration.x,
            y = a.acceleration.y,
            z = a.acceleration.z,
            inaccurate = a.inaccurate,
            "Acceleration"
        ),
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // Initialize logging.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "motion_app=info,motion_observer=info".into()),
        )
        .init();

    info!("Motion observer demo starting");

    // Load config, writing out the defaults on first run.
    let config = match motion_config::config_path() {
        Ok(path) if !path.exists() => {
            let config = AppConfig::default();
            if let Err(e) = motion_config::save_config(&config) {
                warn!(?e, "Failed to write default config");
            }
            config
        }
        _ => motion_config::load_config().unwrap_or_else(|e| {
            warn!(?e, "Failed to load config, using defaults");
            AppConfig::default()
        }),
    };

    let platform = Platform::current().with_overrides(
        config.platform.requires_permission,
        config.platform.inverted_axes,
    );
    let settings = ObserverSettings {
        grace_window: Duration::from_millis(config.observer.grace_window_ms),
        implicit_orientation_sampling: config.observer.implicit_orientation_sampling,
    };
    info!(?platform, ?settings, "Config loaded");

    let mut observer = MotionObserver::new(SyntheticSource::default(), platform, settings)
        .with_permission_gate(AutoGrant);

    let counts: Rc<RefCell<BTreeMap<MotionType, u64>>> = Rc::default();
    for motion_type in MotionType::ALL {
        let counts = counts.clone();
        observer.subscribe(motion_type, move |event| {
            *counts.borrow_mut().entry(event.motion_type()).or_default() += 1;
            log_event(event);
        });
    }
    observer.subscribe_once(MotionType::Orientation, |event| {
        if let Some(o) = event.as_orientation() {
            info!(matrix = ?o.matrix().elements(), "First orientation sample");
        }
    });

    let filter = parse_filter(&config.demo.observe)?;
    observer.observe(filter.as_deref()).await?;

    let device = SyntheticDevice {
        convention: platform.convention,
        interval_ms: config.demo.sample_interval_ms as f32,
    };
    let started = Instant::now();
    let period = Duration::from_millis(config.demo.sample_interval_ms.max(1));
    let mut ticker = tokio::time::interval(period);
    let mut samples = 0u32;

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let now = started.elapsed();
                observer.tick(now);
                for event in device.events(now, &observer.source().attached) {
                    observer.handle_raw(event);
                }

                samples += 1;
                if samples % 60 == 0 {
                    debug!(samples, "Synthetic samples emitted");
                }
                if config.demo.samples != 0 && samples >= config.demo.samples {
                    break;
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Interrupted");
                break;
            }
        }
    }

    let capabilities = observer.capabilities();
    info!(
        samples,
        absolute_orientation = ?capabilities.absolute_orientation.resolved(),
        gravity_exclusion = ?capabilities.gravity_exclusion.resolved(),
        dispatched = ?counts.borrow(),
        "Demo finished"
    );
    observer.disconnect();

    Ok(())
}

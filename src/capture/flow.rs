use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use derive_more::{Display, Error};
use tokio::time::timeout;
use tracing::{info, warn};
use uuid::Uuid;

use crate::capture::ledger::SessionLedger;
use crate::capture::providers::{
    Camera, CameraError, FeedGuard, GeolocationError, Geolocator, JPEG_QUALITY, Photo,
};
use crate::config::Config;
use crate::geofence;
use crate::model::attendance::{AttendanceLog, Direction};
use crate::model::coordinate::{Coordinate, CoordinateError};
use crate::store::{LogStore, StoreError};

/// A one-shot position fix may hang on an unanswered permission prompt, so
/// the flow bounds it.
pub const DEFAULT_LOCATION_TIMEOUT: Duration = Duration::from_secs(15);

#[derive(Debug, Display, Error, PartialEq)]
pub enum FlowError {
    #[display(fmt = "{}", source)]
    Camera { source: CameraError },
    #[display(fmt = "{}", source)]
    Location { source: GeolocationError },
    #[display(fmt = "location fix timed out")]
    LocationTimeout,
    #[display(fmt = "{}", source)]
    InvalidCoordinate { source: CoordinateError },
}

/// What the flow needs to know about the worker driving it, loaded once
/// before `begin`.
#[derive(Debug, Clone)]
pub struct WorkerProfile {
    pub employee_id: u64,
    pub name: String,
    pub department_id: Option<u64>,
    pub site: Option<Coordinate>,
}

/// Store acknowledgment state of a completed capture. Unconfirmed entries
/// stay staged in the session ledger until an explicit retry lands them.
#[must_use = "an unconfirmed capture must be retried through the session ledger"]
#[derive(Debug)]
pub enum PersistReceipt {
    Confirmed,
    Unconfirmed { error: StoreError },
}

/// Immutable result of one completed flow: the entry that was created and
/// how far persistence got.
#[derive(Debug)]
pub struct CaptureOutcome {
    pub log: AttendanceLog,
    pub receipt: PersistReceipt,
}

/// Device orchestration for one check-in/check-out interaction, with the
/// camera, geolocator and log store injected as capability handles.
///
/// The flow itself is expressed as typestates: `begin` acquires the camera
/// and yields [`Framing`]; a freeze-frame yields [`Captured`]; `confirm`
/// resolves the position, evaluates the geofence and submits. Transitions
/// consume the state, so a stale handle cannot be replayed, and the feed
/// guard inside each state releases the camera on every exit path.
pub struct CaptureService {
    camera: Arc<dyn Camera>,
    geolocator: Arc<dyn Geolocator>,
    store: Arc<dyn LogStore>,
    ledger: Arc<SessionLedger>,
    radius_m: f64,
    location_timeout: Duration,
}

impl CaptureService {
    pub fn new(
        camera: Arc<dyn Camera>,
        geolocator: Arc<dyn Geolocator>,
        store: Arc<dyn LogStore>,
        ledger: Arc<SessionLedger>,
        radius_m: f64,
        location_timeout: Duration,
    ) -> Self {
        Self {
            camera,
            geolocator,
            store,
            ledger,
            radius_m,
            location_timeout,
        }
    }

    /// Builds a service from the shared runtime settings: the geofence radius
    /// and the location-fix bound both come from the environment-driven
    /// config, so embedders and the HTTP surface agree on them.
    pub fn from_config(
        camera: Arc<dyn Camera>,
        geolocator: Arc<dyn Geolocator>,
        store: Arc<dyn LogStore>,
        ledger: Arc<SessionLedger>,
        config: &Config,
    ) -> Self {
        Self::new(
            camera,
            geolocator,
            store,
            ledger,
            config.geofence_radius_m,
            Duration::from_secs(config.location_timeout_secs),
        )
    }

    pub fn ledger(&self) -> &SessionLedger {
        &self.ledger
    }

    /// Idle → AcquiringCamera → Framing. The chosen direction rides along as
    /// immutable context. Camera acquisition failures abort here; nothing is
    /// staged or persisted.
    pub async fn begin(
        &self,
        worker: WorkerProfile,
        direction: Direction,
    ) -> Result<Framing<'_>, FlowError> {
        let feed = self
            .camera
            .acquire()
            .await
            .map_err(|source| FlowError::Camera { source })?;
        info!(employee_id = worker.employee_id, %direction, "Capture flow started");
        Ok(Framing {
            service: self,
            worker,
            direction,
            feed: FeedGuard::new(feed),
        })
    }
}

/// Live preview is up; the worker may freeze a frame or walk away.
pub struct Framing<'a> {
    service: &'a CaptureService,
    worker: WorkerProfile,
    direction: Direction,
    feed: FeedGuard,
}

impl<'a> Framing<'a> {
    /// Freezes the current frame. On a capture fault the flow ends and the
    /// guard releases the camera on the way out.
    pub fn capture(mut self) -> Result<Captured<'a>, FlowError> {
        let photo = self
            .feed
            .capture_frame(JPEG_QUALITY)
            .map_err(|source| FlowError::Camera { source })?;
        Ok(Captured {
            service: self.service,
            worker: self.worker,
            direction: self.direction,
            feed: self.feed,
            photo,
        })
    }

    /// User-driven cancel: no record is created and the camera is released.
    pub fn cancel(self) {
        info!(employee_id = self.worker.employee_id, "Capture flow cancelled while framing");
    }
}

/// A frozen frame awaiting the worker's confirm (or retake).
pub struct Captured<'a> {
    service: &'a CaptureService,
    worker: WorkerProfile,
    direction: Direction,
    feed: FeedGuard,
    photo: Photo,
}

impl<'a> Captured<'a> {
    pub fn photo(&self) -> &Photo {
        &self.photo
    }

    /// Discards the frozen frame and returns to framing. The feed stays
    /// acquired, so retakes cost nothing and may repeat indefinitely.
    pub fn retake(self) -> Framing<'a> {
        Framing {
            service: self.service,
            worker: self.worker,
            direction: self.direction,
            feed: self.feed,
        }
    }

    /// Cancel after freezing a frame: same contract as cancelling while
    /// framing.
    pub fn cancel(self) {
        info!(employee_id = self.worker.employee_id, "Capture flow cancelled before confirm");
    }

    /// AcquiringLocation → Submitting → Completed/Failed.
    ///
    /// Device and validation failures end the flow with nothing staged or
    /// persisted. A store failure after a valid capture is *not* a flow
    /// failure: the entry is already staged in the session ledger and the
    /// outcome carries an unconfirmed receipt for the caller to retry.
    pub async fn confirm(self) -> Result<CaptureOutcome, FlowError> {
        let Captured {
            service,
            worker,
            direction,
            feed,
            photo,
        } = self;

        let fix = match timeout(service.location_timeout, service.geolocator.current_position())
            .await
        {
            Ok(Ok(fix)) => fix,
            Ok(Err(GeolocationError::Timeout)) => return Err(FlowError::LocationTimeout),
            Ok(Err(source)) => return Err(FlowError::Location { source }),
            Err(_elapsed) => return Err(FlowError::LocationTimeout),
        };

        let captured = Coordinate::new(fix.latitude, fix.longitude, None)
            .map_err(|source| FlowError::InvalidCoordinate { source })?;
        let status = geofence::evaluate(worker.site.as_ref(), &captured, service.radius_m)
            .map_err(|source| FlowError::InvalidCoordinate { source })?;

        let log = AttendanceLog {
            id: Uuid::new_v4().to_string(),
            employee_id: worker.employee_id,
            employee_name: worker.name,
            recorded_at: Utc::now(),
            direction,
            photo: photo.bytes,
            latitude: captured.latitude,
            longitude: captured.longitude,
            address: captured.address,
            status,
            department_id: worker.department_id,
        };

        // Device work is done; let the camera go before the store round-trip.
        drop(feed);

        service.ledger.stage(log.clone());
        let receipt = match service.store.append(&log).await {
            Ok(()) => {
                service.ledger.confirm(&log.id);
                info!(entry_id = %log.id, status = %log.status, "Attendance entry persisted");
                PersistReceipt::Confirmed
            }
            Err(error) => {
                warn!(entry_id = %log.id, %error, "Attendance entry staged but not confirmed");
                PersistReceipt::Unconfirmed { error }
            }
        };

        Ok(CaptureOutcome { log, receipt })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::fakes::{CountingCamera, FlakyStore, GeoScript, ScriptedGeolocator};
    use crate::model::attendance::AttendanceStatus;
    use std::sync::atomic::Ordering;

    const SITE: (f64, f64) = (24.7136, 46.6753);

    struct Rig {
        camera: Arc<CountingCamera>,
        store: Arc<FlakyStore>,
        service: CaptureService,
    }

    fn rig(geolocator: ScriptedGeolocator, store: FlakyStore) -> Rig {
        rig_with_timeout(geolocator, store, DEFAULT_LOCATION_TIMEOUT)
    }

    fn rig_with_timeout(
        geolocator: ScriptedGeolocator,
        store: FlakyStore,
        location_timeout: Duration,
    ) -> Rig {
        let camera = Arc::new(CountingCamera::working());
        let store = Arc::new(store);
        let service = CaptureService::new(
            camera.clone(),
            Arc::new(geolocator),
            store.clone(),
            Arc::new(SessionLedger::new()),
            500.0,
            location_timeout,
        );
        Rig {
            camera,
            store,
            service,
        }
    }

    fn worker_at_site() -> WorkerProfile {
        WorkerProfile {
            employee_id: 42,
            name: "Ahmed Al-Qahtani".into(),
            department_id: Some(3),
            site: Some(Coordinate::new(SITE.0, SITE.1, None).unwrap()),
        }
    }

    #[tokio::test]
    async fn completed_flow_persists_a_present_entry() {
        let rig = rig(
            ScriptedGeolocator::fix(SITE.0, SITE.1),
            FlakyStore::reliable(),
        );

        let framing = rig.service.begin(worker_at_site(), Direction::In).await.unwrap();
        let captured = framing.capture().unwrap();
        let outcome = captured.confirm().await.unwrap();

        assert_eq!(outcome.log.status, AttendanceStatus::Present);
        assert_eq!(outcome.log.direction, Direction::In);
        assert!(matches!(outcome.receipt, PersistReceipt::Confirmed));
        assert_eq!(rig.store.appended_ids(), vec![outcome.log.id.clone()]);
        assert!(rig.service.ledger().unconfirmed().is_empty());
        assert_eq!(rig.camera.counters.acquired.load(Ordering::SeqCst), 1);
        assert_eq!(rig.camera.counters.released.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn capture_off_site_is_out_of_bounds() {
        let rig = rig(
            ScriptedGeolocator::fix(24.8000, 46.6753),
            FlakyStore::reliable(),
        );

        let framing = rig.service.begin(worker_at_site(), Direction::Out).await.unwrap();
        let outcome = framing.capture().unwrap().confirm().await.unwrap();

        assert_eq!(outcome.log.status, AttendanceStatus::OutOfBounds);
        assert!(matches!(outcome.receipt, PersistReceipt::Confirmed));
    }

    #[tokio::test]
    async fn unassigned_site_is_present_anywhere() {
        let rig = rig(
            ScriptedGeolocator::fix(-33.8688, 151.2093),
            FlakyStore::reliable(),
        );
        let worker = WorkerProfile {
            site: None,
            ..worker_at_site()
        };

        let framing = rig.service.begin(worker, Direction::In).await.unwrap();
        let outcome = framing.capture().unwrap().confirm().await.unwrap();

        assert_eq!(outcome.log.status, AttendanceStatus::Present);
        assert!(matches!(outcome.receipt, PersistReceipt::Confirmed));
    }

    #[tokio::test]
    async fn cancel_while_framing_releases_the_camera_and_writes_nothing() {
        let rig = rig(
            ScriptedGeolocator::fix(SITE.0, SITE.1),
            FlakyStore::reliable(),
        );

        let framing = rig.service.begin(worker_at_site(), Direction::In).await.unwrap();
        framing.cancel();

        assert!(rig.store.appended_ids().is_empty());
        assert!(rig.service.ledger().snapshot().is_empty());
        assert_eq!(
            rig.camera.counters.acquired.load(Ordering::SeqCst),
            rig.camera.counters.released.load(Ordering::SeqCst)
        );
    }

    #[tokio::test]
    async fn retakes_return_to_framing_without_reacquiring() {
        let rig = rig(
            ScriptedGeolocator::fix(SITE.0, SITE.1),
            FlakyStore::reliable(),
        );

        let mut framing = rig.service.begin(worker_at_site(), Direction::In).await.unwrap();
        for _ in 0..3 {
            framing = framing.capture().unwrap().retake();
        }
        let outcome = framing.capture().unwrap().confirm().await.unwrap();

        assert!(matches!(outcome.receipt, PersistReceipt::Confirmed));
        assert_eq!(rig.camera.counters.acquired.load(Ordering::SeqCst), 1);
        assert_eq!(rig.camera.counters.released.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn location_timeout_fails_the_flow_and_persists_nothing() {
        let rig = rig_with_timeout(
            ScriptedGeolocator::new(GeoScript::NeverResolves),
            FlakyStore::reliable(),
            Duration::from_secs(15),
        );

        let framing = rig.service.begin(worker_at_site(), Direction::In).await.unwrap();
        let err = framing.capture().unwrap().confirm().await.unwrap_err();

        assert_eq!(err, FlowError::LocationTimeout);
        assert!(rig.store.appended_ids().is_empty());
        assert!(rig.service.ledger().snapshot().is_empty());
        assert_eq!(rig.camera.counters.released.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn configured_timeout_bounds_the_location_fix() {
        let config = Config {
            database_url: "mysql://unused".into(),
            jwt_secret: "secret".into(),
            server_addr: "127.0.0.1:0".into(),
            access_token_ttl: 900,
            refresh_token_ttl: 604_800,
            rate_login_per_min: 60,
            rate_activate_per_min: 30,
            rate_refresh_per_min: 30,
            rate_protected_per_min: 1000,
            api_prefix: "/api".into(),
            geofence_radius_m: 500.0,
            location_timeout_secs: 15,
            admin_access_code: "code".into(),
            admin_password_hash: "hash".into(),
        };

        let camera = Arc::new(CountingCamera::working());
        let store = Arc::new(FlakyStore::reliable());
        let service = CaptureService::from_config(
            camera.clone(),
            Arc::new(ScriptedGeolocator::new(GeoScript::NeverResolves)),
            store.clone(),
            Arc::new(SessionLedger::new()),
            &config,
        );

        let framing = service.begin(worker_at_site(), Direction::In).await.unwrap();
        let err = framing.capture().unwrap().confirm().await.unwrap_err();

        assert_eq!(err, FlowError::LocationTimeout);
        assert!(store.appended_ids().is_empty());
        assert_eq!(camera.counters.released.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn location_permission_denied_fails_the_flow() {
        let rig = rig(
            ScriptedGeolocator::new(GeoScript::Fail(GeolocationError::PermissionDenied)),
            FlakyStore::reliable(),
        );

        let framing = rig.service.begin(worker_at_site(), Direction::In).await.unwrap();
        let err = framing.capture().unwrap().confirm().await.unwrap_err();

        assert_eq!(
            err,
            FlowError::Location {
                source: GeolocationError::PermissionDenied
            }
        );
        assert_eq!(rig.camera.counters.released.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn camera_permission_denied_aborts_before_framing() {
        let camera = Arc::new(CountingCamera::failing(CameraError::PermissionDenied));
        let service = CaptureService::new(
            camera.clone(),
            Arc::new(ScriptedGeolocator::fix(SITE.0, SITE.1)),
            Arc::new(FlakyStore::reliable()),
            Arc::new(SessionLedger::new()),
            500.0,
            DEFAULT_LOCATION_TIMEOUT,
        );

        let err = service
            .begin(worker_at_site(), Direction::In)
            .await
            .err()
            .unwrap();
        assert_eq!(
            err,
            FlowError::Camera {
                source: CameraError::PermissionDenied
            }
        );
        assert_eq!(camera.counters.acquired.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn second_acquisition_fails_fast_with_device_busy() {
        let rig = rig(
            ScriptedGeolocator::fix(SITE.0, SITE.1),
            FlakyStore::reliable(),
        );

        let first = rig.service.begin(worker_at_site(), Direction::In).await.unwrap();
        let second = rig.service.begin(worker_at_site(), Direction::In).await;
        assert!(matches!(
            second,
            Err(FlowError::Camera {
                source: CameraError::DeviceBusy
            })
        ));

        // The losing attempt must not have disturbed the live feed.
        first.cancel();
        assert_eq!(rig.camera.counters.acquired.load(Ordering::SeqCst), 1);
        assert_eq!(rig.camera.counters.released.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn store_failure_keeps_the_entry_staged_until_retry_lands_it() {
        let rig = rig(
            ScriptedGeolocator::fix(SITE.0, SITE.1),
            FlakyStore::failing_first(1),
        );

        let framing = rig.service.begin(worker_at_site(), Direction::In).await.unwrap();
        let outcome = framing.capture().unwrap().confirm().await.unwrap();

        assert!(matches!(outcome.receipt, PersistReceipt::Unconfirmed { .. }));
        let pending = rig.service.ledger().unconfirmed();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].id, outcome.log.id);
        assert!(rig.store.appended_ids().is_empty());

        // Explicit retry confirms the staged entry without duplicating it.
        let confirmed = rig.service.ledger().retry(rig.store.as_ref()).await.unwrap();
        assert_eq!(confirmed, 1);
        assert!(rig.service.ledger().unconfirmed().is_empty());
        assert_eq!(rig.store.appended_ids(), vec![outcome.log.id]);
    }
}

pub mod flow;
pub mod ledger;
pub mod providers;

/// Deterministic provider fakes shared by the flow and ledger tests. The
/// counting camera backs the release-count assertions, the scripted
/// geolocator drives every location outcome, and the flaky store fails a
/// configured number of appends before recovering.
#[cfg(test)]
pub(crate) mod fakes {
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    use async_trait::async_trait;

    use crate::capture::providers::{
        Camera, CameraError, CameraFeed, GeolocationError, Geolocator, Photo, PositionFix,
    };
    use crate::model::attendance::AttendanceLog;
    use crate::store::{LogStore, StoreError};

    #[derive(Default)]
    pub struct CameraCounters {
        pub acquired: AtomicUsize,
        pub released: AtomicUsize,
        live: AtomicBool,
    }

    pub struct CountingCamera {
        pub counters: std::sync::Arc<CameraCounters>,
        fail_with: Option<CameraError>,
    }

    impl CountingCamera {
        pub fn working() -> Self {
            Self {
                counters: Default::default(),
                fail_with: None,
            }
        }

        pub fn failing(error: CameraError) -> Self {
            Self {
                counters: Default::default(),
                fail_with: Some(error),
            }
        }
    }

    #[async_trait]
    impl Camera for CountingCamera {
        async fn acquire(&self) -> Result<Box<dyn CameraFeed>, CameraError> {
            if let Some(error) = self.fail_with {
                return Err(error);
            }
            if self.counters.live.swap(true, Ordering::SeqCst) {
                return Err(CameraError::DeviceBusy);
            }
            self.counters.acquired.fetch_add(1, Ordering::SeqCst);
            Ok(Box::new(CountingFeed {
                counters: self.counters.clone(),
            }))
        }
    }

    struct CountingFeed {
        counters: std::sync::Arc<CameraCounters>,
    }

    impl CameraFeed for CountingFeed {
        fn capture_frame(&mut self, _quality: f32) -> Result<Photo, CameraError> {
            Ok(Photo {
                bytes: vec![0xff, 0xd8, 0xff, 0xe0],
                width: 640,
                height: 480,
            })
        }

        fn release(&mut self) {
            self.counters.released.fetch_add(1, Ordering::SeqCst);
            self.counters.live.store(false, Ordering::SeqCst);
        }
    }

    pub enum GeoScript {
        Fix(PositionFix),
        Fail(GeolocationError),
        NeverResolves,
    }

    pub struct ScriptedGeolocator {
        script: GeoScript,
    }

    impl ScriptedGeolocator {
        pub fn new(script: GeoScript) -> Self {
            Self { script }
        }

        pub fn fix(latitude: f64, longitude: f64) -> Self {
            Self::new(GeoScript::Fix(PositionFix {
                latitude,
                longitude,
            }))
        }
    }

    #[async_trait]
    impl Geolocator for ScriptedGeolocator {
        async fn current_position(&self) -> Result<PositionFix, GeolocationError> {
            match &self.script {
                GeoScript::Fix(fix) => Ok(*fix),
                GeoScript::Fail(error) => Err(*error),
                GeoScript::NeverResolves => futures::future::pending().await,
            }
        }
    }

    #[derive(Default)]
    pub struct FlakyStore {
        failures_left: AtomicUsize,
        entries: Mutex<Vec<AttendanceLog>>,
    }

    impl FlakyStore {
        pub fn reliable() -> Self {
            Self::default()
        }

        pub fn failing_first(failures: usize) -> Self {
            Self {
                failures_left: AtomicUsize::new(failures),
                entries: Mutex::new(Vec::new()),
            }
        }

        pub fn appended_ids(&self) -> Vec<String> {
            self.entries
                .lock()
                .unwrap()
                .iter()
                .map(|e| e.id.clone())
                .collect()
        }
    }

    #[async_trait]
    impl LogStore for FlakyStore {
        async fn append(&self, entry: &AttendanceLog) -> Result<(), StoreError> {
            if self
                .failures_left
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                .is_ok()
            {
                return Err(StoreError::Unavailable);
            }
            let mut entries = self.entries.lock().unwrap();
            if !entries.iter().any(|e| e.id == entry.id) {
                entries.push(entry.clone());
            }
            Ok(())
        }

        async fn list_recent(
            &self,
            limit: u32,
            offset: u32,
        ) -> Result<Vec<AttendanceLog>, StoreError> {
            let mut entries = self.entries.lock().unwrap().clone();
            entries.sort_by(|a, b| b.recorded_at.cmp(&a.recorded_at));
            Ok(entries
                .into_iter()
                .skip(offset as usize)
                .take(limit as usize)
                .collect())
        }
    }
}

use super::*;
use crate::MidiError;
use std::sync::{
    atomic::{AtomicBool, AtomicUsize, Ordering},
    Mutex,
};

/// In-memory bridge standing in for a platform MIDI service.
///
/// Handlers stay registered after their handle closes so tests can play a
/// native thread that fires late.
#[derive(Default)]
pub struct FakeBridge {
    devices: Mutex<Vec<DeviceDescriptor>>,
    fail_enumerate: AtomicBool,
    fail_open: Mutex<Option<MidiError>>,
    opened: Mutex<Vec<Arc<FakeEndpoint>>>,
}

#[derive(Default)]
pub struct FakeEndpoint {
    pub index: usize,
    handler: Mutex<Option<Arc<dyn InputHandler>>>,
    pub started: AtomicBool,
    pub closes: AtomicUsize,
}

impl FakeEndpoint {
    /// Invoke the handler as the native thread would, gated on `start`
    /// unless `force` is set.
    pub fn fire(&self, bytes: &[u8], now_nanos: u64, force: bool) -> bool {
        let handler = self.handler.lock().unwrap().clone();
        match handler {
            Some(handler) if force || self.started.load(Ordering::SeqCst) => {
                handler.on_data(bytes, now_nanos);
                true
            }
            _ => false,
        }
    }

    pub fn is_closed(&self) -> bool {
        self.closes.load(Ordering::SeqCst) > 0
    }
}

impl FakeBridge {
    pub fn with_devices(names: &[&str]) -> Self {
        let bridge = Self::default();
        bridge.set_devices(names);
        bridge
    }

    pub fn set_devices(&self, names: &[&str]) {
        *self.devices.lock().unwrap() = names
            .iter()
            .map(|name| DeviceDescriptor {
                name: name.to_string(),
                entity_name: format!("{name} entity"),
                manufacturer: "fake".into(),
            })
            .collect();
    }

    pub fn fail_enumerate(&self, should_fail: bool) {
        self.fail_enumerate.store(should_fail, Ordering::SeqCst);
    }

    pub fn fail_next_open(&self, error: MidiError) {
        *self.fail_open.lock().unwrap() = Some(error);
    }

    pub fn endpoints(&self) -> Vec<Arc<FakeEndpoint>> {
        self.opened.lock().unwrap().clone()
    }

    pub fn last_endpoint(&self) -> Arc<FakeEndpoint> {
        self.endpoints().last().cloned().expect("nothing was opened")
    }

    pub fn live_handles(&self) -> usize {
        self.endpoints().iter().filter(|e| !e.is_closed()).count()
    }
}

impl NativeBridge for FakeBridge {
    fn name(&self) -> &'static str {
        "fake"
    }

    fn enumerate(&self) -> Result<Vec<DeviceDescriptor>> {
        if self.fail_enumerate.load(Ordering::SeqCst) {
            return Err(MidiError::Enumeration("fake enumeration failure".into()));
        }
        Ok(self.devices.lock().unwrap().clone())
    }

    fn open(
        &self,
        index: usize,
        handler: Arc<dyn InputHandler>,
    ) -> Result<Box<dyn NativeHandle>> {
        if let Some(error) = self.fail_open.lock().unwrap().take() {
            return Err(error);
        }

        let endpoint = Arc::new(FakeEndpoint {
            index,
            handler: Mutex::new(Some(handler)),
            ..Default::default()
        });
        self.opened.lock().unwrap().push(endpoint.clone());

        Ok(Box::new(FakeHandle { endpoint }))
    }
}

struct FakeHandle {
    endpoint: Arc<FakeEndpoint>,
}

impl NativeHandle for FakeHandle {
    fn start(&mut self) -> Result<()> {
        self.endpoint.started.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn stop(&mut self) -> Result<()> {
        self.endpoint.started.store(false, Ordering::SeqCst);
        Ok(())
    }

    fn close(self: Box<Self>) -> Result<()> {
        self.endpoint.started.store(false, Ordering::SeqCst);
        let previous = self.endpoint.closes.fetch_add(1, Ordering::SeqCst);
        assert_eq!(previous, 0, "native handle closed twice");
        Ok(())
    }
}

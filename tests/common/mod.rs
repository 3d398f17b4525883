//! Shared test utilities
//!
//! An in-memory device simulator that records every driver call and can be
//! told to expire sessions, refuse logins, fail, stall or panic.

#![allow(dead_code)]

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use lights_gateway::{
    Brightness, ColorPayload, Connector, Credentials, Device, DeviceEndpoint, DeviceHandle,
    DeviceKind, DeviceState, Error, Orchestrator, Registry, SessionManager,
};

type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Default)]
struct SimState {
    is_on: bool,
    brightness: u8,
    hue: u16,
    calls: Vec<String>,
    /// Sessions opened before this generation are expired.
    min_generation: u64,
    generation: u64,
    /// Every call reports an expired session, even on fresh sessions.
    always_expired: bool,
    /// Expire all sessions right before the next call with this prefix.
    expire_before: Option<&'static str>,
    refuse_login: bool,
    fail_with: Option<i64>,
    fail_on: Option<&'static str>,
    stall: Option<Duration>,
    panic: bool,
}

/// A simulated physical device.
#[derive(Debug, Default)]
pub struct DeviceSim {
    state: Mutex<SimState>,
    logins: AtomicUsize,
}

impl DeviceSim {
    pub fn new(is_on: bool) -> Arc<Self> {
        let sim = DeviceSim::default();
        sim.state.lock().unwrap().is_on = is_on;
        Arc::new(sim)
    }

    pub fn is_on(&self) -> bool {
        self.state.lock().unwrap().is_on
    }

    pub fn calls(&self) -> Vec<String> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn clear_calls(&self) {
        self.state.lock().unwrap().calls.clear();
    }

    pub fn logins(&self) -> usize {
        self.logins.load(Ordering::SeqCst)
    }

    /// Invalidate every session opened so far.
    pub fn expire_sessions(&self) {
        let mut state = self.state.lock().unwrap();
        state.min_generation = state.generation + 1;
    }

    pub fn set_always_expired(&self, value: bool) {
        self.state.lock().unwrap().always_expired = value;
    }

    pub fn expire_before(&self, call: &'static str) {
        self.state.lock().unwrap().expire_before = Some(call);
    }

    pub fn set_refuse_login(&self, value: bool) {
        self.state.lock().unwrap().refuse_login = value;
    }

    /// Make every call fail with a device error code.
    pub fn set_fail_with(&self, code: Option<i64>) {
        self.state.lock().unwrap().fail_with = code;
    }

    /// Make only calls with the given name fail with a device error.
    pub fn set_fail_on(&self, call: Option<&'static str>) {
        self.state.lock().unwrap().fail_on = call;
    }

    pub fn set_stall(&self, stall: Option<Duration>) {
        self.state.lock().unwrap().stall = stall;
    }

    pub fn set_panic(&self, value: bool) {
        self.state.lock().unwrap().panic = value;
    }

    fn login(&self) -> Result<u64> {
        self.logins.fetch_add(1, Ordering::SeqCst);
        let mut state = self.state.lock().unwrap();
        if state.refuse_login {
            return Err(Error::device(-32002, "invalid credentials"));
        }
        state.generation += 1;
        Ok(state.generation)
    }
}

/// A session to a [`DeviceSim`].
#[derive(Debug)]
pub struct MockDevice {
    sim: Arc<DeviceSim>,
    generation: u64,
}

impl MockDevice {
    async fn call<T>(&self, name: &str, f: impl FnOnce(&mut SimState) -> T) -> Result<T> {
        let (panic, stall) = {
            let state = self.sim.state.lock().unwrap();
            (state.panic, state.stall)
        };
        if panic {
            panic!("simulated driver panic");
        }
        if let Some(stall) = stall {
            tokio::time::sleep(stall).await;
        }

        let mut state = self.sim.state.lock().unwrap();
        if state.expire_before.is_some_and(|call| name.starts_with(call)) {
            state.expire_before = None;
            state.min_generation = state.generation + 1;
        }
        if state.always_expired || self.generation < state.min_generation {
            state.calls.push(format!("{name} (expired)"));
            return Err(Error::SessionExpired("token expired".into()));
        }
        if let Some(code) = state.fail_with {
            state.calls.push(format!("{name} (failed)"));
            return Err(Error::device(code, "simulated failure"));
        }
        if state.fail_on.is_some_and(|call| name.starts_with(call)) {
            state.calls.push(format!("{name} (failed)"));
            return Err(Error::device(-1, "simulated failure"));
        }
        state.calls.push(name.to_string());
        Ok(f(&mut state))
    }
}

#[async_trait]
impl Device for MockDevice {
    async fn turn_on(&self) -> Result<()> {
        self.call("turn_on", |s| s.is_on = true).await
    }

    async fn turn_off(&self) -> Result<()> {
        self.call("turn_off", |s| s.is_on = false).await
    }

    async fn set_brightness(&self, brightness: Brightness) -> Result<()> {
        let value = brightness.value();
        self.call(&format!("set_brightness({value})"), |s| s.brightness = value)
            .await
    }

    async fn set_color(&self, color: &ColorPayload) -> Result<()> {
        let (label, hue) = match color {
            ColorPayload::Rgb(c) => (
                format!("set_color(rgb {},{},{})", c.red(), c.green(), c.blue()),
                lights_gateway::Hsv::from(c).hue(),
            ),
            ColorPayload::Hsv(h) => (
                format!("set_color(hsv {},{})", h.hue(), h.saturation()),
                h.hue(),
            ),
        };
        self.call(&label, |s| s.hue = hue).await
    }

    async fn get_state(&self) -> Result<DeviceState> {
        self.call("get_state", |s| DeviceState {
            is_on: s.is_on,
            hue: Some(s.hue),
            brightness: Some(s.brightness),
        })
        .await
    }
}

/// Connects to simulators by address.
#[derive(Debug, Default)]
pub struct MockConnector {
    sims: HashMap<SocketAddr, Arc<DeviceSim>>,
}

#[async_trait]
impl Connector for MockConnector {
    async fn connect(
        &self,
        endpoint: &DeviceEndpoint,
        _credentials: &Credentials,
    ) -> Result<Box<dyn Device>> {
        let sim = self
            .sims
            .get(&endpoint.address)
            .ok_or_else(|| Error::socket("connect", std::io::ErrorKind::ConnectionRefused.into()))?;
        let generation = sim.login()?;
        Ok(Box::new(MockDevice {
            sim: Arc::clone(sim),
            generation,
        }))
    }
}

/// A set of simulated devices wired into a registry and orchestrator.
pub struct TestHome {
    pub registry: Arc<Registry>,
    pub sessions: SessionManager,
    pub orchestrator: Orchestrator,
    sims: HashMap<String, Arc<DeviceSim>>,
}

impl TestHome {
    pub fn sim(&self, name: &str) -> &Arc<DeviceSim> {
        &self.sims[name]
    }

    pub fn handle(&self, name: &str) -> Arc<DeviceHandle> {
        self.registry.resolve(name).expect("device should be connected")
    }
}

/// Builder for a [`TestHome`].
pub struct TestHomeBuilder {
    devices: Vec<(String, DeviceKind, Option<Arc<DeviceSim>>)>,
    timeout: Duration,
}

impl TestHomeBuilder {
    pub fn new() -> Self {
        TestHomeBuilder {
            devices: Vec::new(),
            timeout: Duration::from_secs(5),
        }
    }

    /// A bulb that is reachable at startup.
    pub fn bulb(mut self, name: &str, is_on: bool) -> Self {
        self.devices
            .push((name.to_string(), DeviceKind::Bulb, Some(DeviceSim::new(is_on))));
        self
    }

    /// A switch that is reachable at startup.
    pub fn switch(mut self, name: &str, is_on: bool) -> Self {
        self.devices
            .push((name.to_string(), DeviceKind::Switch, Some(DeviceSim::new(is_on))));
        self
    }

    /// A configured device that does not answer at startup.
    pub fn offline(mut self, name: &str) -> Self {
        self.devices.push((name.to_string(), DeviceKind::Bulb, None));
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub async fn build(self) -> TestHome {
        let mut connector = MockConnector::default();
        let mut sims = HashMap::new();
        let mut endpoints = Vec::new();

        for (i, (name, kind, sim)) in self.devices.into_iter().enumerate() {
            let port = u16::try_from(10_000 + i).unwrap();
            let address: SocketAddr = ([10, 0, 0, 1], port).into();
            if let Some(sim) = sim {
                connector.sims.insert(address, Arc::clone(&sim));
                sims.insert(name.clone(), sim);
            }
            endpoints.push((name, DeviceEndpoint::new(address, kind)));
        }

        let credentials = Credentials::new("user", "secret");
        let registry = Arc::new(
            Registry::connect_all(endpoints, &connector, &credentials, Duration::from_secs(1))
                .await,
        );
        let sessions = SessionManager::new(Arc::clone(&registry), Arc::new(connector), credentials);

        TestHome {
            registry,
            sessions: sessions.clone(),
            orchestrator: Orchestrator::new(sessions, self.timeout),
            sims,
        }
    }
}

pub fn names(names: &[&str]) -> Option<Vec<String>> {
    Some(names.iter().map(ToString::to_string).collect())
}

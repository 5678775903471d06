#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::broadcast;

use ups_telemetry::collector::DialectClients;
use ups_telemetry::config::{DeviceConfig, Settings, StaticRegistry};
use ups_telemetry::detect::{DetectOptions, Detector};
use ups_telemetry::formatter::TelemetrySnapshot;
use ups_telemetry::profiles::{Field, Tag, enterprise, minimal, standard};
use ups_telemetry::publisher::SnapshotPublisher;
use ups_telemetry::scheduler::Scheduler;
use ups_telemetry::snmp::{Connector, Endpoint, FetchError, SnmpVersion, SYS_DESCR, TagReader};

/// Скриптованный SNMP агент в памяти
pub struct MockAgent {
    pub values: Mutex<HashMap<String, String>>,
    pub community: String,
    pub versions: Vec<SnmpVersion>,
    pub online: AtomicBool,
    /// Групповые запросы отклоняются прошивкой
    pub bulk_broken: bool,
    /// Задержка каждого ответа
    pub delay: Option<Duration>,
    /// Теги, на которые прошивка молчит до таймаута
    stalls: Mutex<HashMap<String, Duration>>,
    reads: Mutex<HashMap<String, usize>>,
}

impl MockAgent {
    pub fn new(community: &str, values: HashMap<String, String>) -> Self {
        Self {
            values: Mutex::new(values),
            community: community.to_string(),
            versions: SnmpVersion::ALL.to_vec(),
            online: AtomicBool::new(true),
            bulk_broken: false,
            delay: None,
            stalls: Mutex::new(HashMap::new()),
            reads: Mutex::new(HashMap::new()),
        }
    }

    pub fn v2c_only(mut self) -> Self {
        self.versions = vec![SnmpVersion::V2c];
        self
    }

    pub fn bulk_broken(mut self) -> Self {
        self.bulk_broken = true;
        self
    }

    pub fn delayed(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Тег отвечает таймаутом спустя `after`
    pub fn stall(&self, oid: &str, after: Duration) {
        self.stalls.lock().unwrap().insert(oid.to_string(), after);
    }

    fn stall_for(&self, oid: &str) -> Option<Duration> {
        self.stalls.lock().unwrap().get(oid).copied()
    }

    pub fn set_online(&self, online: bool) {
        self.online.store(online, Ordering::SeqCst);
    }

    pub fn set(&self, oid: &str, value: &str) {
        self.values
            .lock()
            .unwrap()
            .insert(oid.to_string(), value.to_string());
    }

    /// Сколько раз тег запрашивали (поштучно или в группе)
    pub fn reads(&self, oid: &str) -> usize {
        self.reads.lock().unwrap().get(oid).copied().unwrap_or(0)
    }

    fn record(&self, oid: &str) {
        *self.reads.lock().unwrap().entry(oid.to_string()).or_default() += 1;
    }

    fn accepts(&self, endpoint: &Endpoint) -> bool {
        self.online.load(Ordering::SeqCst)
            && endpoint.community == self.community
            && self.versions.contains(&endpoint.version)
    }
}

/// Сеть из агентов по адресу
#[derive(Default)]
pub struct MockNetwork {
    agents: Mutex<HashMap<String, Arc<MockAgent>>>,
}

impl MockNetwork {
    pub fn add(&self, address: &str, agent: MockAgent) -> Arc<MockAgent> {
        let agent = Arc::new(agent);
        self.agents
            .lock()
            .unwrap()
            .insert(address.to_string(), agent.clone());
        agent
    }
}

#[async_trait]
impl Connector for MockNetwork {
    async fn open(&self, endpoint: &Endpoint) -> Result<Box<dyn TagReader>, FetchError> {
        let agent = self.agents.lock().unwrap().get(&endpoint.address).cloned();
        Ok(Box::new(MockReader {
            agent,
            endpoint: endpoint.clone(),
        }))
    }
}

struct MockReader {
    agent: Option<Arc<MockAgent>>,
    endpoint: Endpoint,
}

impl MockReader {
    async fn agent(&self) -> Result<&MockAgent, FetchError> {
        let agent = self
            .agent
            .as_deref()
            .ok_or_else(|| FetchError::Timeout(self.endpoint.target()))?;
        if let Some(delay) = agent.delay {
            tokio::time::sleep(delay).await;
        }
        if !agent.accepts(&self.endpoint) {
            return Err(FetchError::Timeout(self.endpoint.target()));
        }
        Ok(agent)
    }
}

#[async_trait]
impl TagReader for MockReader {
    async fn get(&mut self, oid: &str) -> Result<Option<String>, FetchError> {
        let agent = self.agent().await?;
        agent.record(oid);
        if let Some(after) = agent.stall_for(oid) {
            tokio::time::sleep(after).await;
            return Err(FetchError::Timeout(self.endpoint.target()));
        }
        Ok(agent.values.lock().unwrap().get(oid).cloned())
    }

    async fn get_many(&mut self, oids: &[&str]) -> Result<Vec<(String, String)>, FetchError> {
        if !self.endpoint.version.supports_bulk() {
            return Err(FetchError::BatchUnsupported);
        }
        let agent = self.agent().await?;
        if agent.bulk_broken {
            return Err(FetchError::BatchRejected("tooBig".to_string()));
        }
        let values = agent.values.lock().unwrap();
        Ok(oids
            .iter()
            .inspect(|oid| agent.record(oid))
            .filter_map(|oid| values.get(*oid).map(|v| (oid.to_string(), v.clone())))
            .collect())
    }
}

/// Правдоподобные значения для всех тегов таблицы
pub fn table_values(tags: &[Tag]) -> HashMap<String, String> {
    let mut values: HashMap<String, String> = tags
        .iter()
        .map(|tag| {
            let value = match tag.field {
                Field::AlarmFlag => "0".to_string(),
                f if f.is_identity() => format!("{}-value", tag.name),
                _ if tag.decoder.is_some() => "1".to_string(),
                _ => "100".to_string(),
            };
            (tag.oid.to_string(), value)
        })
        .collect();
    values.insert(SYS_DESCR.to_string(), "UPS agent".to_string());
    values
}

pub fn enterprise_values() -> HashMap<String, String> {
    let mut values = table_values(enterprise::TAGS);
    values.insert(
        ups_telemetry::snmp::SYS_OBJECT_ID.to_string(),
        "1.3.6.1.4.1.56788.1".to_string(),
    );
    values
}

pub fn standard_values() -> HashMap<String, String> {
    table_values(standard::TAGS)
}

pub fn minimal_values() -> HashMap<String, String> {
    table_values(minimal::TAGS)
}

pub fn test_settings() -> Settings {
    let mut settings = Settings::default();
    settings.snmp.communities = vec!["public".to_string(), "ups".to_string()];
    settings
}

pub fn detector(net: Arc<MockNetwork>, settings: &Settings) -> Arc<Detector> {
    Arc::new(Detector::new(
        net,
        DetectOptions {
            communities: settings.snmp.communities.clone(),
            timeout: settings.detection.timeout(),
            retries: 0,
        },
    ))
}

pub struct Harness {
    pub scheduler: Scheduler,
    pub registry: Arc<StaticRegistry>,
    pub rx: broadcast::Receiver<Arc<TelemetrySnapshot>>,
}

impl Harness {
    pub fn new(net: Arc<MockNetwork>, devices: Vec<DeviceConfig>, settings: Settings) -> Self {
        let registry = Arc::new(StaticRegistry::new(devices));
        let publisher = SnapshotPublisher::new(None);
        let rx = publisher.subscribe();
        let clients = DialectClients::new(net.clone(), settings.snmp.batch_size);
        let detector = detector(net, &settings);

        let scheduler = Scheduler::new(settings, registry.clone(), detector, clients, publisher);
        Self {
            scheduler,
            registry,
            rx,
        }
    }

    /// Всё, что опубликовано к этому моменту
    pub fn drain(&mut self) -> Vec<Arc<TelemetrySnapshot>> {
        let mut out = Vec::new();
        while let Ok(snapshot) = self.rx.try_recv() {
            out.push(snapshot);
        }
        out
    }
}

pub fn declared(id: &str, address: &str, kind: ups_telemetry::profiles::DialectKind) -> DeviceConfig {
    let mut device = DeviceConfig::new(id, address);
    device.dialect = Some(kind);
    device.community = Some("public".to_string());
    device.version = Some(SnmpVersion::V2c);
    device
}

use async_trait::async_trait;
use edgarstream::{Body, Edgar, EdgarError, EdgarUrls, Result, StreamBody, Transport};
use flate2::{Compression, write::GzEncoder};
use std::{
    collections::HashMap,
    fs,
    io::{self, Write},
    path::{Path, PathBuf},
    sync::{Arc, Mutex},
};

pub const ARCHIVES: &str = "http://fixtures.test/Archives";

pub fn fixture_path(relative: impl AsRef<Path>) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(relative)
}

pub fn read_fixture(relative: impl AsRef<Path>) -> String {
    fs::read_to_string(fixture_path(relative)).expect("fixture file should be readable")
}

#[allow(dead_code)]
pub fn gzip(data: &[u8]) -> Vec<u8> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data).unwrap();
    encoder.finish().unwrap()
}

#[allow(dead_code)]
pub fn partition_url(year: i32, quarter: u8) -> String {
    format!("{ARCHIVES}/edgar/full-index/{year}/QTR{quarter}/master.gz")
}

/// In-memory transport serving canned bodies by URL. Unknown URLs answer 404.
#[derive(Debug, Clone, Default)]
pub struct FixtureTransport {
    bodies: HashMap<String, Vec<u8>>,
    statuses: HashMap<String, u16>,
    resets: HashMap<String, Vec<u8>>,
    requests: Arc<Mutex<Vec<String>>>,
}

#[allow(dead_code)]
impl FixtureTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_body(mut self, url: impl Into<String>, body: impl Into<Vec<u8>>) -> Self {
        self.bodies.insert(url.into(), body.into());
        self
    }

    /// Serves `index` gzipped as the master index of the given quarter.
    pub fn with_partition(self, year: i32, quarter: u8, index: &str) -> Self {
        self.with_body(partition_url(year, quarter), gzip(index.as_bytes()))
    }

    pub fn with_status(mut self, url: impl Into<String>, status: u16) -> Self {
        self.statuses.insert(url.into(), status);
        self
    }

    /// Serves `prefix`, then fails the body with a connection reset.
    pub fn with_reset_after(mut self, url: impl Into<String>, prefix: impl Into<Vec<u8>>) -> Self {
        self.resets.insert(url.into(), prefix.into());
        self
    }

    /// URLs requested so far, in order.
    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }

    pub fn edgar(&self) -> Edgar {
        Edgar::with_transport(EdgarUrls::with_archives(ARCHIVES), self.clone())
    }
}

#[async_trait]
impl Transport for FixtureTransport {
    async fn open(&self, url: &str) -> Result<Body> {
        self.requests.lock().unwrap().push(url.to_string());

        if let Some(status) = self.statuses.get(url) {
            return Err(EdgarError::Status {
                url: url.to_string(),
                status: *status,
            });
        }

        if let Some(prefix) = self.resets.get(url) {
            let chunks: Vec<io::Result<Vec<u8>>> = vec![
                Ok(prefix.clone()),
                Err(io::Error::new(io::ErrorKind::ConnectionReset, "connection reset")),
            ];
            return Ok(Box::pin(StreamBody::new(futures_util::stream::iter(chunks))));
        }

        match self.bodies.get(url) {
            Some(body) => Ok(Box::pin(std::io::Cursor::new(body.clone()))),
            None => Err(EdgarError::Status {
                url: url.to_string(),
                status: 404,
            }),
        }
    }
}

/// An index with the standard preamble and the given records.
#[allow(dead_code)]
pub fn master_index(records: &[&str]) -> String {
    let mut index = read_fixture("indexes/master.idx")
        .lines()
        .take(11)
        .collect::<Vec<_>>()
        .join("\n");
    for record in records {
        index.push('\n');
        index.push_str(record);
    }
    index.push('\n');
    index
}

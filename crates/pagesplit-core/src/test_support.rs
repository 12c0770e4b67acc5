//! In-memory fetch double shared by unit tests.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::PageFetch;

/// Serves fixed bodies by exact URL and records every request.
#[derive(Default)]
pub struct MapFetch {
    bodies: HashMap<String, String>,
    requests: Mutex<Vec<String>>,
}

impl MapFetch {
    pub fn new<'a, I>(bodies: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        Self {
            bodies: bodies
                .into_iter()
                .map(|(url, body)| (url.to_string(), body.to_string()))
                .collect(),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// URLs requested so far, in order.
    #[allow(clippy::unwrap_used)]
    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl PageFetch for MapFetch {
    #[allow(clippy::unwrap_used)]
    async fn fetch_text(&self, url: &str) -> Option<String> {
        self.requests.lock().unwrap().push(url.to_string());
        self.bodies.get(url).cloned()
    }
}

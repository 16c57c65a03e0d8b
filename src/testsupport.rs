// src/testsupport.rs - Scripted moonraker double for unit tests
use std::collections::{HashMap, VecDeque};
use std::io;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::transport::{RawResponse, Transport, TransportError};

/// One canned answer to a `printer/info` probe.
#[derive(Debug, Clone)]
pub enum ProbeAnswer {
    /// 200 with a well-formed `{"result":{"state":...}}` body.
    State(&'static str),
    /// Arbitrary status code and raw body.
    Raw(u16, &'static str),
    /// Connection refused.
    Refused,
}

impl ProbeAnswer {
    fn into_result(self, path: &str) -> Result<RawResponse, TransportError> {
        match self {
            ProbeAnswer::State(token) => Ok(RawResponse {
                status: 200,
                body: format!(r#"{{"result":{{"state":"{token}"}}}}"#).into_bytes(),
            }),
            ProbeAnswer::Raw(status, body) => Ok(RawResponse {
                status,
                body: body.as_bytes().to_vec(),
            }),
            ProbeAnswer::Refused => Err(TransportError::Request {
                path: path.to_string(),
                source: io::Error::from(io::ErrorKind::ConnectionRefused).into(),
            }),
        }
    }
}

#[derive(Default)]
struct Script {
    queued: VecDeque<ProbeAnswer>,
    fallback: Option<ProbeAnswer>,
    after_post: HashMap<&'static str, ProbeAnswer>,
    posts: Vec<String>,
    probes: usize,
}

/// A fake moonraker endpoint driven by a probe script.
///
/// Queued answers are consumed first; once the queue is empty the fallback
/// repeats forever. A post can swap the fallback, which is how tests model a
/// device that only comes up after a particular restart command. Clones
/// share the script, so tests keep a handle for assertions while the
/// orchestrator owns another.
#[derive(Clone)]
pub struct FakeDevice {
    script: Arc<Mutex<Script>>,
}

impl FakeDevice {
    pub fn reporting(state: &'static str) -> Self {
        Self {
            script: Arc::new(Mutex::new(Script {
                fallback: Some(ProbeAnswer::State(state)),
                ..Script::default()
            })),
        }
    }

    pub fn queue(&self, answer: ProbeAnswer) {
        self.script.lock().unwrap().queued.push_back(answer);
    }

    pub fn queue_states(&self, states: &[&'static str]) {
        for state in states {
            self.queue(ProbeAnswer::State(state));
        }
    }

    /// After a post to `path`, probes start answering with `state`.
    pub fn recovers_on(&self, path: &'static str, state: &'static str) {
        self.script
            .lock()
            .unwrap()
            .after_post
            .insert(path, ProbeAnswer::State(state));
    }

    pub fn posts(&self) -> Vec<String> {
        self.script.lock().unwrap().posts.clone()
    }

    pub fn probes(&self) -> usize {
        self.script.lock().unwrap().probes
    }
}

#[async_trait]
impl Transport for FakeDevice {
    async fn get(&self, path: &str) -> Result<RawResponse, TransportError> {
        let answer = {
            let mut script = self.script.lock().unwrap();
            script.probes += 1;
            script
                .queued
                .pop_front()
                .or_else(|| script.fallback.clone())
        };
        match answer {
            Some(answer) => answer.into_result(path),
            None => panic!("probe script exhausted with no fallback"),
        }
    }

    async fn post(&self, path: &str) -> Result<RawResponse, TransportError> {
        let mut script = self.script.lock().unwrap();
        script.posts.push(path.to_string());
        if let Some(answer) = script.after_post.remove(path) {
            script.fallback = Some(answer);
        }
        Ok(RawResponse {
            status: 200,
            body: b"{\"result\":\"ok\"}".to_vec(),
        })
    }
}

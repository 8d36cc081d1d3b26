// OPCUA for Rust
// SPDX-License-Identifier: MPL-2.0
// Copyright (C) 2017-2024 Adam Lock

use std::collections::HashMap;
use std::sync::Arc;

use url::Url;

use crate::sync::RwLock;

/// A server instance an [`EndpointDemultiplexer`] can route connections to.
/// Implementors expose the endpoint and discovery URLs they should be
/// reachable under; `id` is used to tell distinct registrations of the same
/// server apart from unrelated servers during `unregister`.
pub trait RegisteredServer: Send + Sync {
    fn id(&self) -> u64;
    fn urls(&self) -> Vec<String>;
}

/// Extracts the path component `register`/`lookup` key on. Parses
/// `endpoint_url` as an absolute URI with authority and returns its path; on
/// parse failure the original string is used verbatim as the fallback key
/// (§4.6).
pub fn endpoint_path(endpoint_url: &str) -> String {
    match Url::parse(endpoint_url) {
        Ok(url) => url.path().to_string(),
        Err(_) => endpoint_url.to_string(),
    }
}

struct Inner {
    paths: HashMap<String, u64>,
    servers: HashMap<u64, Arc<dyn RegisteredServer>>,
    strict_endpoint_urls: bool,
}

/// Maps endpoint-URL paths to registered servers, with an optional relaxed
/// fallback when exactly one server is registered. Concurrent-safe via a
/// single `parking_lot::RwLock`.
pub struct EndpointDemultiplexer {
    inner: RwLock<Inner>,
}

impl EndpointDemultiplexer {
    pub fn new(strict_endpoint_urls: bool) -> Self {
        Self {
            inner: RwLock::new(Inner {
                paths: HashMap::new(),
                servers: HashMap::new(),
                strict_endpoint_urls,
            }),
        }
    }

    pub fn set_strict_endpoint_urls(&self, strict: bool) {
        self.inner.write().strict_endpoint_urls = strict;
    }

    /// Registers `server` under the path of each of its URLs.
    /// First-writer-wins: a path already bound to another server (or to this
    /// one) is left untouched, so repeated registration is idempotent (§8
    /// property 7).
    pub fn register(&self, server: Arc<dyn RegisteredServer>) {
        let mut inner = self.inner.write();
        inner.servers.entry(server.id()).or_insert_with(|| server.clone());
        for url in server.urls() {
            let path = endpoint_path(&url);
            inner.paths.entry(path).or_insert_with(|| server.id());
        }
    }

    /// Removes every path currently mapped to `server`.
    pub fn unregister(&self, server: &dyn RegisteredServer) {
        let mut inner = self.inner.write();
        let id = server.id();
        inner.servers.remove(&id);
        inner.paths.retain(|_, mapped_id| *mapped_id != id);
    }

    /// Looks up the server registered for `endpoint_url`'s path. If no path
    /// matches and `strict_endpoint_urls` is off, falls back to the sole
    /// registered server when there is exactly one (§4.6).
    pub fn lookup(&self, endpoint_url: &str) -> Option<Arc<dyn RegisteredServer>> {
        let inner = self.inner.read();
        let path = endpoint_path(endpoint_url);
        if let Some(id) = inner.paths.get(&path) {
            return inner.servers.get(id).cloned();
        }
        if !inner.strict_endpoint_urls && inner.servers.len() == 1 {
            return inner.servers.values().next().cloned();
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct TestServer {
        id: u64,
        urls: Vec<&'static str>,
    }

    impl RegisteredServer for TestServer {
        fn id(&self) -> u64 {
            self.id
        }

        fn urls(&self) -> Vec<String> {
            self.urls.iter().map(|s| s.to_string()).collect()
        }
    }

    #[test]
    fn path_extraction_preserves_leading_slash() {
        assert_eq!(
            endpoint_path("opc.tcp://localhost:4840/foo/bar"),
            "/foo/bar"
        );
    }

    #[test]
    fn path_extraction_falls_back_to_original_string_on_parse_failure() {
        assert_eq!(endpoint_path("not a url"), "not a url");
    }

    #[test]
    fn url_without_explicit_path_normalizes_to_root() {
        // The `url` crate normalizes any authority URL to have at least a
        // root path, so this never falls into the fallback-to-original-string
        // branch even though no path was written explicitly.
        assert_eq!(endpoint_path("opc.tcp://localhost:4840"), "/");
    }

    #[test]
    fn scenario_s5_single_server_relaxed_fallback() {
        let demux = EndpointDemultiplexer::new(true);
        let server = Arc::new(TestServer {
            id: 1,
            urls: vec!["opc.tcp://localhost:4840/a"],
        });
        demux.register(server);

        demux.set_strict_endpoint_urls(false);
        assert!(demux.lookup("opc.tcp://localhost:4840/zzz").is_some());

        demux.set_strict_endpoint_urls(true);
        assert!(demux.lookup("opc.tcp://localhost:4840/zzz").is_none());
    }

    #[test]
    fn scenario_s6_two_servers_no_fallback() {
        let demux = EndpointDemultiplexer::new(false);
        demux.register(Arc::new(TestServer {
            id: 1,
            urls: vec!["opc.tcp://localhost:4840/a"],
        }));
        demux.register(Arc::new(TestServer {
            id: 2,
            urls: vec!["opc.tcp://localhost:4840/b"],
        }));

        assert!(demux.lookup("opc.tcp://localhost:4840/zzz").is_none());
        demux.set_strict_endpoint_urls(true);
        assert!(demux.lookup("opc.tcp://localhost:4840/zzz").is_none());
    }

    #[test]
    fn first_writer_wins_and_unregister_does_not_expose_runner_up() {
        let demux = EndpointDemultiplexer::new(true);
        let server_a = Arc::new(TestServer {
            id: 1,
            urls: vec!["opc.tcp://localhost:4840/foo"],
        });
        let server_b = Arc::new(TestServer {
            id: 2,
            urls: vec!["opc.tcp://localhost:4840/foo"],
        });
        demux.register(server_a.clone());
        demux.register(server_b);

        let found = demux.lookup("opc.tcp://localhost:4840/foo").unwrap();
        assert_eq!(found.id(), 1);

        demux.unregister(server_a.as_ref());
        assert!(demux.lookup("opc.tcp://localhost:4840/foo").is_none());
    }

    #[test]
    fn repeated_register_is_idempotent() {
        let demux = EndpointDemultiplexer::new(true);
        let server = Arc::new(TestServer {
            id: 1,
            urls: vec!["opc.tcp://localhost:4840/a", "opc.tcp://localhost:4840/discovery"],
        });
        demux.register(server.clone());
        demux.register(server.clone());
        demux.register(server);

        assert!(demux.lookup("opc.tcp://localhost:4840/a").is_some());
        assert!(demux.lookup("opc.tcp://localhost:4840/discovery").is_some());
    }
}

//! Scripted directory server for tests/dev.
//!
//! Each endpoint (`host:port`) holds an administrative credential and a flat
//! list of posix-account entries. Searches understand the account filter the
//! core issues; anything else matches nothing.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, RwLock};
use std::time::Duration;

use async_trait::async_trait;

use keyward_auth::{
    DirectoryBinding, DirectoryClient, DirectoryConnection, DirectoryEntry, DirectoryError,
};

#[derive(Debug, Clone)]
struct ScriptedEntry {
    dn: String,
    uid: String,
    password: String,
}

/// Directory call a scripted delay applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DirectoryOp {
    Connect,
    Search,
    Bind,
}

#[derive(Debug, Clone, Default)]
struct ScriptedServer {
    admin_dn: String,
    admin_password: String,
    entries: Vec<ScriptedEntry>,
    offline: bool,
    search_error: Option<String>,
    latency: HashMap<DirectoryOp, Duration>,
}

impl ScriptedServer {
    async fn pause(&self, op: DirectoryOp) {
        if let Some(latency) = self.latency.get(&op).filter(|l| !l.is_zero()) {
            tokio::time::sleep(*latency).await;
        }
    }
}

#[derive(Debug, Default)]
pub struct ScriptedDirectory {
    servers: RwLock<HashMap<String, ScriptedServer>>,
    connects: AtomicUsize,
}

impl ScriptedDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a server reachable at `endpoint` with its admin credential.
    pub fn add_server(&self, endpoint: &str, admin_dn: &str, admin_password: &str) {
        self.with_server(endpoint, |s| {
            s.admin_dn = admin_dn.to_string();
            s.admin_password = admin_password.to_string();
        });
    }

    pub fn add_entry(&self, endpoint: &str, dn: &str, uid: &str, password: &str) {
        self.with_server(endpoint, |s| {
            s.entries.push(ScriptedEntry {
                dn: dn.to_string(),
                uid: uid.to_string(),
                password: password.to_string(),
            })
        });
    }

    pub fn set_offline(&self, endpoint: &str, offline: bool) {
        self.with_server(endpoint, |s| s.offline = offline);
    }

    /// Make every search on `endpoint` fail with `message`.
    pub fn fail_searches(&self, endpoint: &str, message: &str) {
        self.with_server(endpoint, |s| s.search_error = Some(message.to_string()));
    }

    /// Delay every `op` call on `endpoint` by `latency`.
    pub fn set_latency(&self, endpoint: &str, op: DirectoryOp, latency: Duration) {
        self.with_server(endpoint, |s| {
            s.latency.insert(op, latency);
        });
    }

    /// Number of connection attempts seen so far, successful or not.
    pub fn connect_count(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }

    fn with_server<F>(&self, endpoint: &str, f: F)
    where
        F: FnOnce(&mut ScriptedServer),
    {
        if let Ok(mut servers) = self.servers.write() {
            f(servers.entry(endpoint.to_string()).or_default());
        }
    }

    fn snapshot(&self, endpoint: &str) -> Option<ScriptedServer> {
        self.servers.read().ok()?.get(endpoint).cloned()
    }
}

#[async_trait]
impl DirectoryClient for ScriptedDirectory {
    async fn connect(
        &self,
        binding: &DirectoryBinding,
    ) -> Result<Box<dyn DirectoryConnection>, DirectoryError> {
        self.connects.fetch_add(1, Ordering::SeqCst);
        let endpoint = binding.endpoint();

        let server = match self.snapshot(&endpoint) {
            Some(server) if !server.offline => server,
            _ => return Err(DirectoryError::Connect(format!("{endpoint}: connection refused"))),
        };

        server.pause(DirectoryOp::Connect).await;

        if server.admin_dn != binding.admin_dn || server.admin_password != binding.admin_password {
            return Err(DirectoryError::Connect(format!(
                "{endpoint}: administrative bind rejected"
            )));
        }

        Ok(Box::new(ScriptedConnection {
            server: Arc::new(server),
        }))
    }
}

struct ScriptedConnection {
    server: Arc<ScriptedServer>,
}

#[async_trait]
impl DirectoryConnection for ScriptedConnection {
    async fn search(
        &mut self,
        base_dn: &str,
        filter: &str,
    ) -> Result<Vec<DirectoryEntry>, DirectoryError> {
        self.server.pause(DirectoryOp::Search).await;

        if let Some(message) = &self.server.search_error {
            return Err(DirectoryError::Search(message.clone()));
        }

        let Some(uid) = uid_from_filter(filter) else {
            return Ok(vec![]);
        };

        Ok(self
            .server
            .entries
            .iter()
            .filter(|e| e.uid == uid && in_subtree(&e.dn, base_dn))
            .map(|e| DirectoryEntry::new(e.dn.clone()))
            .collect())
    }

    async fn bind(&mut self, dn: &str, secret: &str) -> Result<(), DirectoryError> {
        self.server.pause(DirectoryOp::Bind).await;

        match self.server.entries.iter().find(|e| e.dn == dn) {
            Some(entry) if !secret.is_empty() && entry.password == secret => Ok(()),
            _ => Err(DirectoryError::Bind(format!("{dn}: invalid credentials"))),
        }
    }
}

fn in_subtree(dn: &str, base_dn: &str) -> bool {
    base_dn.is_empty() || dn == base_dn || dn.ends_with(&format!(",{base_dn}"))
}

/// Extract and unescape the `uid` assertion of a posix-account filter.
fn uid_from_filter(filter: &str) -> Option<String> {
    let rest = filter.strip_prefix("(&(objectClass=posixAccount)(uid=")?;
    let escaped = rest.strip_suffix("))")?;
    unescape_filter_value(escaped)
}

fn unescape_filter_value(escaped: &str) -> Option<String> {
    let mut bytes = Vec::with_capacity(escaped.len());
    let mut rest = escaped.as_bytes();
    while let Some((&b, tail)) = rest.split_first() {
        if b == b'\\' {
            let hex = tail.get(..2)?;
            let hex = std::str::from_utf8(hex).ok()?;
            bytes.push(u8::from_str_radix(hex, 16).ok()?);
            rest = &tail[2..];
        } else {
            bytes.push(b);
            rest = tail;
        }
    }
    String::from_utf8(bytes).ok()
}

#[cfg(test)]
mod tests {
    use keyward_auth::directory::account_filter;

    use super::*;

    fn binding() -> DirectoryBinding {
        DirectoryBinding::new("corp", "acme")
            .with_endpoint("ldap.acme.test", 389)
            .with_admin("cn=admin,dc=acme", "admin-pw")
            .with_base_dn("ou=people,dc=acme")
    }

    fn directory() -> ScriptedDirectory {
        let dir = ScriptedDirectory::new();
        dir.add_server("ldap.acme.test:389", "cn=admin,dc=acme", "admin-pw");
        dir.add_entry("ldap.acme.test:389", "uid=b*b,ou=people,dc=acme", "b*b", "pw");
        dir.add_entry("ldap.acme.test:389", "uid=bob,ou=people,dc=acme", "bob", "pw");
        dir.add_entry("ldap.acme.test:389", "uid=bob,ou=retired,dc=acme", "bob", "old");
        dir
    }

    #[test]
    fn filter_round_trips_through_escaping() {
        assert_eq!(uid_from_filter(&account_filter("b*b")).as_deref(), Some("b*b"));
        assert_eq!(uid_from_filter(&account_filter("a(b)\\")).as_deref(), Some("a(b)\\"));
        assert_eq!(uid_from_filter("(uid=bob)"), None);
    }

    #[tokio::test]
    async fn search_is_literal_and_scoped_to_base() {
        let dir = directory();
        let mut conn = dir.connect(&binding()).await.unwrap();

        let found = conn.search("ou=people,dc=acme", &account_filter("bob")).await.unwrap();
        assert_eq!(found, vec![DirectoryEntry::new("uid=bob,ou=people,dc=acme")]);

        let wide = conn.search("dc=acme", &account_filter("bob")).await.unwrap();
        assert_eq!(wide.len(), 2);

        let star = conn.search("ou=people,dc=acme", &account_filter("b*b")).await.unwrap();
        assert_eq!(star, vec![DirectoryEntry::new("uid=b*b,ou=people,dc=acme")]);
    }

    #[tokio::test]
    async fn wrong_admin_credential_refuses_connection() {
        let dir = directory();
        let bad = binding().with_admin("cn=admin,dc=acme", "nope");
        assert!(matches!(dir.connect(&bad).await, Err(DirectoryError::Connect(_))));
        assert_eq!(dir.connect_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn latency_applies_only_to_the_scripted_call() {
        let dir = directory();
        dir.set_latency("ldap.acme.test:389", DirectoryOp::Bind, Duration::from_secs(30));

        let started = tokio::time::Instant::now();
        let mut conn = dir.connect(&binding()).await.unwrap();
        conn.search("ou=people,dc=acme", &account_filter("bob")).await.unwrap();
        assert_eq!(started.elapsed(), Duration::ZERO);

        conn.bind("uid=bob,ou=people,dc=acme", "pw").await.unwrap();
        assert!(started.elapsed() >= Duration::from_secs(30));
    }

    #[tokio::test]
    async fn empty_secret_never_binds() {
        let dir = directory();
        let mut conn = dir.connect(&binding()).await.unwrap();
        assert!(conn.bind("uid=bob,ou=people,dc=acme", "pw").await.is_ok());
        assert!(conn.bind("uid=bob,ou=people,dc=acme", "").await.is_err());
    }
}

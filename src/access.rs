//! IP-keyed access gate for the admin view.
//!
//! Every admin-page visit is recorded under `ips/{key}` with the local
//! time. The stored role decides what the visitor may do: `1` is admin,
//! anything else is a read-only viewer. No visit ever changes a role;
//! promotion happens out of band in the store itself.
//!
//! The client IP is self-reported (or the TCP peer), so this gate is
//! trivially spoofable. It is not authentication.

use std::net::IpAddr;

use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use serde_json::json;
use thiserror::Error;

use crate::store::{Lookup, Notices, RecordGateway};

pub const IPS_PATH: &str = "ips";

/// Key used when the client IP cannot be determined.
pub const UNKNOWN_IP: &str = "unknown";

#[derive(Error, Debug)]
pub enum AccessError {
    #[error("IP lookup failed: {0}")]
    LookupFailed(String),

    #[error("IP lookup returned an unexpected body: {0}")]
    MalformedLookup(String),

    #[error("Peer address unavailable")]
    NoPeerAddress,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Viewer,
    Admin,
}

impl Role {
    pub fn from_code(code: i64) -> Self {
        if code == 1 {
            Self::Admin
        } else {
            Self::Viewer
        }
    }

    pub fn code(self) -> i64 {
        match self {
            Self::Viewer => 0,
            Self::Admin => 1,
        }
    }
}

/// Stored under `ips/{key}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IpAccessEntry {
    #[serde(default)]
    pub role: i64,
    #[serde(default)]
    pub access_times: Vec<String>,
}

/// Store key for an IP: every `.` becomes `_`.
pub fn ip_key(ip: &str) -> String {
    ip.replace('.', "_")
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClientIdentity {
    pub ip: String,
    pub key: String,
}

impl ClientIdentity {
    pub fn from_ip(ip: &str) -> Self {
        Self {
            ip: ip.to_string(),
            key: ip_key(ip),
        }
    }

    pub fn unknown() -> Self {
        Self::from_ip(UNKNOWN_IP)
    }
}

/// Where the client IP comes from.
pub trait IdentitySource: Send + Sync {
    /// `peer` is the TCP peer of the current request, when known.
    fn identify(&self, peer: Option<IpAddr>) -> Result<String, AccessError>;
}

/// Asks an external "what is my IP" service (`{"ip": "..."}`).
pub struct IpLookupService {
    url: String,
    client: Client,
}

#[derive(Deserialize)]
struct LookupResponse {
    ip: String,
}

impl IpLookupService {
    pub fn new(url: &str, client: Client) -> Self {
        Self {
            url: url.to_string(),
            client,
        }
    }
}

impl IdentitySource for IpLookupService {
    fn identify(&self, _peer: Option<IpAddr>) -> Result<String, AccessError> {
        let response = self
            .client
            .get(&self.url)
            .send()
            .and_then(|r| r.error_for_status())
            .map_err(|e| AccessError::LookupFailed(e.to_string()))?;

        let body: LookupResponse = response
            .json()
            .map_err(|e| AccessError::MalformedLookup(e.to_string()))?;

        if body.ip.trim().is_empty() {
            return Err(AccessError::MalformedLookup("empty ip".into()));
        }
        Ok(body.ip.trim().to_string())
    }
}

/// Uses the TCP peer address of the request.
pub struct PeerAddress;

impl IdentitySource for PeerAddress {
    fn identify(&self, peer: Option<IpAddr>) -> Result<String, AccessError> {
        peer.map(|ip| ip.to_string()).ok_or(AccessError::NoPeerAddress)
    }
}

/// Maps a stored entry to a role.
pub trait AuthorizationPolicy: Send + Sync {
    fn role_of(&self, entry: Option<&IpAccessEntry>) -> Role;
}

/// Role is whatever the store says; unknown visitors are viewers.
pub struct StoredRolePolicy;

impl AuthorizationPolicy for StoredRolePolicy {
    fn role_of(&self, entry: Option<&IpAccessEntry>) -> Role {
        entry.map_or(Role::Viewer, |e| Role::from_code(e.role))
    }
}

/// Result of identifying a client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Visit {
    pub identity: ClientIdentity,
    pub role: Role,
    pub access_times: Vec<String>,
}

impl Visit {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

pub struct AccessGate {
    identity: Box<dyn IdentitySource>,
    policy: Box<dyn AuthorizationPolicy>,
    gateway: RecordGateway,
}

enum Stored {
    Entry(IpAccessEntry),
    Absent,
    Unreadable,
}

impl AccessGate {
    pub fn new(
        identity: Box<dyn IdentitySource>,
        policy: Box<dyn AuthorizationPolicy>,
        gateway: RecordGateway,
    ) -> Self {
        Self {
            identity,
            policy,
            gateway,
        }
    }

    /// Resolve the client IP. Failures fall back to the `unknown` key.
    pub fn identify(&self, peer: Option<IpAddr>, notices: &mut Notices) -> ClientIdentity {
        match self.identity.identify(peer) {
            Ok(ip) => ClientIdentity::from_ip(&ip),
            Err(e) => {
                tracing::warn!(error = %e, "Could not determine client IP");
                notices.warn(format!("Could not determine your IP address: {e}"));
                ClientIdentity::unknown()
            }
        }
    }

    /// Admin-page visit: record `now` and report the role.
    ///
    /// First visit creates `{role: 0, access_times: [now]}`; later visits
    /// append to `access_times` and leave `role` alone. If the entry cannot
    /// be read nothing is written and the visitor is a viewer.
    pub fn visit(&self, peer: Option<IpAddr>, now: &str, notices: &mut Notices) -> Visit {
        let identity = self.identify(peer, notices);
        let path = format!("{IPS_PATH}/{}", identity.key);

        match self.load(&path, notices) {
            Stored::Entry(mut entry) => {
                entry.access_times.push(now.to_string());
                self.gateway.merge_fields(
                    &path,
                    &json!({ "access_times": entry.access_times }),
                    notices,
                );
                let role = self.policy.role_of(Some(&entry));
                tracing::info!(key = %identity.key, ?role, visits = entry.access_times.len(), "Admin page visit");
                Visit {
                    identity,
                    role,
                    access_times: entry.access_times,
                }
            }
            Stored::Absent => {
                let entry = IpAccessEntry {
                    role: Role::Viewer.code(),
                    access_times: vec![now.to_string()],
                };
                self.gateway.replace_record(&path, &json!(entry), notices);
                tracing::info!(key = %identity.key, "First admin page visit");
                Visit {
                    identity,
                    role: self.policy.role_of(Some(&entry)),
                    access_times: entry.access_times,
                }
            }
            Stored::Unreadable => Visit {
                identity,
                role: Role::Viewer,
                access_times: Vec::new(),
            },
        }
    }

    /// Role check for admin actions. Does not record a visit.
    pub fn authorize(&self, peer: Option<IpAddr>, notices: &mut Notices) -> Visit {
        let identity = self.identify(peer, notices);
        let path = format!("{IPS_PATH}/{}", identity.key);

        match self.load(&path, notices) {
            Stored::Entry(entry) => Visit {
                identity,
                role: self.policy.role_of(Some(&entry)),
                access_times: entry.access_times,
            },
            Stored::Absent => Visit {
                identity,
                role: self.policy.role_of(None),
                access_times: Vec::new(),
            },
            Stored::Unreadable => Visit {
                identity,
                role: Role::Viewer,
                access_times: Vec::new(),
            },
        }
    }

    fn load(&self, path: &str, notices: &mut Notices) -> Stored {
        match self.gateway.lookup(path, notices) {
            Lookup::Found(value) => match serde_json::from_value(value) {
                Ok(entry) => Stored::Entry(entry),
                Err(e) => {
                    tracing::warn!(path, error = %e, "Malformed access entry");
                    notices.warn(format!("Access entry at {path} is malformed: {e}"));
                    Stored::Unreadable
                }
            },
            Lookup::Absent => Stored::Absent,
            Lookup::Failed => Stored::Unreadable,
        }
    }
}

// permission.rs — Permission value types and the implication partial order.
//
// A Permission is a (kind, target, action-set) triple: "read this file",
// "listen on this socket", "stop a thread". Permissions of the same kind
// form a partial order: A implies B when granting A is sufficient to
// satisfy a request for B. A directory-wildcard file target covers every
// file beneath it; an unrestricted action set covers any subset; `All`
// covers everything.
//
// Implication is the single primitive every other component is built on,
// so it must be cheap (no I/O, no allocation on the common paths) and
// fail closed on anything it does not understand.

use glob::Pattern;
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::path::Path;

use crate::error::PermissionError;

/// A single file-system action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileAction {
    Read,
    Write,
    Execute,
    Delete,
    Readlink,
}

const FILE_ACTIONS: [(FileAction, u8); 5] = [
    (FileAction::Read, 1 << 0),
    (FileAction::Write, 1 << 1),
    (FileAction::Execute, 1 << 2),
    (FileAction::Delete, 1 << 3),
    (FileAction::Readlink, 1 << 4),
];

/// An immutable set of file actions.
///
/// Stored as a bitmask; serialized as a list of action names so that
/// externally parsed grants stay readable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FileActionSet(u8);

impl FileActionSet {
    /// Every file action: read, write, execute, delete, readlink.
    pub const ALL: FileActionSet = FileActionSet(0b1_1111);

    pub const EMPTY: FileActionSet = FileActionSet(0);

    pub fn of(actions: &[FileAction]) -> Self {
        let mut bits = 0;
        for action in actions {
            bits |= Self::bit(*action);
        }
        Self(bits)
    }

    pub fn single(action: FileAction) -> Self {
        Self(Self::bit(action))
    }

    pub fn contains(&self, action: FileAction) -> bool {
        self.0 & Self::bit(action) != 0
    }

    /// True when every action in `other` is present in this set.
    pub fn contains_all(&self, other: FileActionSet) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    pub fn iter(&self) -> impl Iterator<Item = FileAction> + '_ {
        FILE_ACTIONS
            .iter()
            .filter(move |(_, bit)| self.0 & bit != 0)
            .map(|(action, _)| *action)
    }

    fn bit(action: FileAction) -> u8 {
        FILE_ACTIONS
            .iter()
            .find(|(a, _)| *a == action)
            .map(|(_, bit)| *bit)
            .unwrap_or(0)
    }
}

impl Serialize for FileActionSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.iter())
    }
}

impl<'de> Deserialize<'de> for FileActionSet {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let actions = Vec::<FileAction>::deserialize(deserializer)?;
        Ok(Self::of(&actions))
    }
}

/// A single socket action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SocketAction {
    Listen,
    Connect,
    Accept,
    Resolve,
}

const SOCKET_ACTIONS: [(SocketAction, u8); 4] = [
    (SocketAction::Listen, 1 << 0),
    (SocketAction::Connect, 1 << 1),
    (SocketAction::Accept, 1 << 2),
    (SocketAction::Resolve, 1 << 3),
];

/// An immutable set of socket actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SocketActionSet(u8);

impl SocketActionSet {
    pub const EMPTY: SocketActionSet = SocketActionSet(0);

    pub fn of(actions: &[SocketAction]) -> Self {
        let mut bits = 0;
        for action in actions {
            bits |= Self::bit(*action);
        }
        Self(bits)
    }

    pub fn single(action: SocketAction) -> Self {
        Self(Self::bit(action))
    }

    pub fn contains(&self, action: SocketAction) -> bool {
        self.0 & Self::bit(action) != 0
    }

    pub fn contains_all(&self, other: SocketActionSet) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    /// Holding any socket action on a host also lets you resolve it.
    pub fn with_implicit_resolve(&self) -> SocketActionSet {
        if self.is_empty() {
            *self
        } else {
            SocketActionSet(self.0 | Self::bit(SocketAction::Resolve))
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = SocketAction> + '_ {
        SOCKET_ACTIONS
            .iter()
            .filter(move |(_, bit)| self.0 & bit != 0)
            .map(|(action, _)| *action)
    }

    fn bit(action: SocketAction) -> u8 {
        SOCKET_ACTIONS
            .iter()
            .find(|(a, _)| *a == action)
            .map(|(_, bit)| *bit)
            .unwrap_or(0)
    }
}

impl Serialize for SocketActionSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.iter())
    }
}

impl<'de> Deserialize<'de> for SocketActionSet {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let actions = Vec::<SocketAction>::deserialize(deserializer)?;
        Ok(Self::of(&actions))
    }
}

/// The target of a file permission.
///
/// Written forms: `/path/file` (exact), `/dir/*` (entries directly inside
/// the directory), `/dir/**` (everything beneath the directory). Wildcard
/// targets do not cover the directory itself.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FileTarget {
    Exact(String),
    Children(String),
    Tree(String),
}

impl FileTarget {
    pub fn parse(raw: &str) -> Result<Self, PermissionError> {
        if raw.is_empty() {
            return Err(PermissionError::InvalidFileTarget {
                target: raw.to_string(),
                reason: "empty target".to_string(),
            });
        }
        if let Some(dir) = raw.strip_suffix("/**") {
            let dir = if dir.is_empty() { "/" } else { dir };
            return Self::wildcard_dir(raw, dir).map(|d| FileTarget::Tree(d));
        }
        if let Some(dir) = raw.strip_suffix("/*") {
            let dir = if dir.is_empty() { "/" } else { dir };
            return Self::wildcard_dir(raw, dir).map(|d| FileTarget::Children(d));
        }
        if raw.contains('*') {
            return Err(PermissionError::InvalidFileTarget {
                target: raw.to_string(),
                reason: "wildcards are only valid as a trailing /* or /** component".to_string(),
            });
        }
        Ok(FileTarget::Exact(raw.to_string()))
    }

    fn wildcard_dir(raw: &str, dir: &str) -> Result<String, PermissionError> {
        if dir.contains('*') {
            return Err(PermissionError::InvalidFileTarget {
                target: raw.to_string(),
                reason: "wildcards are only valid as a trailing /* or /** component".to_string(),
            });
        }
        Ok(dir.to_string())
    }

    /// True when this target grants (or asks for) some form of access to
    /// `other`'s scope. Directory wildcards cover paths beneath them but
    /// never the directory itself.
    pub fn covers(&self, other: &FileTarget) -> bool {
        match (self, other) {
            (FileTarget::Exact(a), FileTarget::Exact(b)) => a == b,
            (FileTarget::Children(dir), FileTarget::Exact(path)) => {
                Path::new(path).parent() == Some(Path::new(dir))
            }
            (FileTarget::Children(a), FileTarget::Children(b)) => a == b,
            (FileTarget::Tree(dir), FileTarget::Exact(path)) => {
                Path::new(path).starts_with(dir) && Path::new(path) != Path::new(dir)
            }
            (FileTarget::Tree(a), FileTarget::Children(b) | FileTarget::Tree(b)) => {
                Path::new(b).starts_with(a)
            }
            _ => false,
        }
    }

    /// True for the whole-filesystem target (`/**`). Legitimate grants are
    /// never this broad; it shows up only in requests from broken callers.
    pub fn is_unbounded(&self) -> bool {
        matches!(self, FileTarget::Tree(dir) if dir == "/")
    }
}

impl fmt::Display for FileTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FileTarget::Exact(path) => f.write_str(path),
            FileTarget::Children(dir) if dir == "/" => f.write_str("/*"),
            FileTarget::Children(dir) => write!(f, "{dir}/*"),
            FileTarget::Tree(dir) if dir == "/" => f.write_str("/**"),
            FileTarget::Tree(dir) => write!(f, "{dir}/**"),
        }
    }
}

impl Serialize for FileTarget {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for FileTarget {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        FileTarget::parse(&raw).map_err(D::Error::custom)
    }
}

/// An inclusive port range. `0-65535` when a spec names no port.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PortRange {
    pub lo: u16,
    pub hi: u16,
}

impl PortRange {
    pub const FULL: PortRange = PortRange { lo: 0, hi: 65535 };

    pub fn single(port: u16) -> Self {
        Self { lo: port, hi: port }
    }

    fn parse(raw: &str) -> Result<Self, PermissionError> {
        let invalid = || PermissionError::InvalidPortRange {
            range: raw.to_string(),
        };
        let (lo, hi) = match raw.split_once('-') {
            Some((lo, hi)) => (
                lo.parse::<u16>().map_err(|_| invalid())?,
                hi.parse::<u16>().map_err(|_| invalid())?,
            ),
            None => {
                let port = raw.parse::<u16>().map_err(|_| invalid())?;
                (port, port)
            }
        };
        if lo > hi {
            return Err(invalid());
        }
        Ok(Self { lo, hi })
    }

    fn contains_range(&self, other: &PortRange) -> bool {
        self.lo <= other.lo && other.hi <= self.hi
    }
}

/// The target of a socket permission: a host (exact, or a wildcard such as
/// `*` or `*.internal.example`) plus a port range.
///
/// Written forms: `host`, `host:port`, `host:lo-hi`. Port `0` combined
/// with the `listen` action means the dynamic (ephemeral) port range.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct HostSpec {
    host: String,
    ports: PortRange,
}

impl HostSpec {
    pub fn parse(spec: &str) -> Result<Self, PermissionError> {
        let (host, ports) = match spec.rsplit_once(':') {
            Some((host, range)) => (host, PortRange::parse(range)?),
            None => (spec, PortRange::FULL),
        };
        if host.is_empty() {
            return Err(PermissionError::InvalidHostSpec {
                spec: spec.to_string(),
                reason: "empty host".to_string(),
            });
        }
        Ok(Self {
            host: host.to_string(),
            ports,
        })
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn ports(&self) -> PortRange {
        self.ports
    }

    /// True when a grant on this spec covers a request on `other`.
    ///
    /// `listen_granted` selects the dynamic-port reading of port 0: a
    /// grant of `host:0` with `listen` covers listening on any ephemeral
    /// port, not just port 0 itself.
    pub fn covers(&self, other: &HostSpec, listen_granted: bool) -> bool {
        if !self.host_covers(&other.host) {
            return false;
        }
        if listen_granted && self.ports == PortRange::single(0) {
            return other.ports == PortRange::single(0) || other.ports.lo >= 1024;
        }
        self.ports.contains_range(&other.ports)
    }

    fn host_covers(&self, requested: &str) -> bool {
        if self.host == requested {
            return true;
        }
        if self.host.contains('*') {
            // Invalid wildcard specs never match (fail-closed).
            return Pattern::new(&self.host)
                .map(|pattern| pattern.matches(requested))
                .unwrap_or(false);
        }
        false
    }
}

impl fmt::Display for HostSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.ports == PortRange::FULL {
            f.write_str(&self.host)
        } else if self.ports.lo == self.ports.hi {
            write!(f, "{}:{}", self.host, self.ports.lo)
        } else {
            write!(f, "{}:{}-{}", self.host, self.ports.lo, self.ports.hi)
        }
    }
}

impl Serialize for HostSpec {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for HostSpec {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        HostSpec::parse(&raw).map_err(D::Error::custom)
    }
}

/// A requestable capability: a (kind, target, action-set) triple.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Permission {
    File {
        target: FileTarget,
        actions: FileActionSet,
    },
    Socket {
        host: HostSpec,
        actions: SocketActionSet,
    },
    Runtime {
        target: String,
    },
    /// Implies every permission. Reserved for trusted platform-internal
    /// code; never configurable for extension origins.
    All,
}

impl Permission {
    /// A file permission from its written target form.
    pub fn file(target: &str, actions: FileActionSet) -> Result<Self, PermissionError> {
        if actions.is_empty() {
            return Err(PermissionError::EmptyActionSet {
                target: target.to_string(),
            });
        }
        Ok(Permission::File {
            target: FileTarget::parse(target)?,
            actions,
        })
    }

    /// A file permission carrying every action. Secured-file entries use
    /// this form: their grants have no action mask.
    pub fn file_all_actions(target: &str) -> Result<Self, PermissionError> {
        Self::file(target, FileActionSet::ALL)
    }

    /// A socket permission from its written host spec form.
    pub fn socket(spec: &str, actions: SocketActionSet) -> Result<Self, PermissionError> {
        if actions.is_empty() {
            return Err(PermissionError::EmptyActionSet {
                target: spec.to_string(),
            });
        }
        Ok(Permission::Socket {
            host: HostSpec::parse(spec)?,
            actions,
        })
    }

    /// A named runtime capability (e.g. `stopThread`). Target `*` covers
    /// every runtime capability.
    pub fn runtime(target: impl Into<String>) -> Self {
        Permission::Runtime {
            target: target.into(),
        }
    }

    /// The implication partial order: true when granting `self` is
    /// sufficient to satisfy a request for `requested`. Kinds never
    /// imply across each other, with the sole exception of `All`.
    pub fn implies(&self, requested: &Permission) -> bool {
        match (self, requested) {
            (Permission::All, _) => true,
            (
                Permission::File { target, actions },
                Permission::File {
                    target: requested_target,
                    actions: requested_actions,
                },
            ) => actions.contains_all(*requested_actions) && target.covers(requested_target),
            (
                Permission::Socket { host, actions },
                Permission::Socket {
                    host: requested_host,
                    actions: requested_actions,
                },
            ) => {
                actions.with_implicit_resolve().contains_all(*requested_actions)
                    && host.covers(requested_host, actions.contains(SocketAction::Listen))
            }
            (
                Permission::Runtime { target },
                Permission::Runtime {
                    target: requested_target,
                },
            ) => target == "*" || target == requested_target,
            _ => false,
        }
    }

    pub fn as_file_target(&self) -> Option<&FileTarget> {
        match self {
            Permission::File { target, .. } => Some(target),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn read() -> FileActionSet {
        FileActionSet::single(FileAction::Read)
    }

    #[test]
    fn tree_target_covers_files_beneath_it() {
        let grant = Permission::file("/var/lib/app/data/**", FileActionSet::ALL).unwrap();
        let nested = Permission::file("/var/lib/app/data/nodes/0/segments", read()).unwrap();
        assert!(grant.implies(&nested));
    }

    #[test]
    fn tree_target_does_not_cover_the_directory_itself_or_siblings() {
        let grant = Permission::file("/var/lib/app/data/**", FileActionSet::ALL).unwrap();
        let dir_itself = Permission::file("/var/lib/app/data", read()).unwrap();
        let sibling = Permission::file("/var/lib/app/data2/file", read()).unwrap();
        assert!(!grant.implies(&dir_itself));
        assert!(!grant.implies(&sibling));
    }

    #[test]
    fn children_target_is_not_recursive() {
        let grant = Permission::file("/etc/app/*", FileActionSet::ALL).unwrap();
        assert!(grant
            .implies(&Permission::file("/etc/app/app.conf", read()).unwrap()));
        assert!(!grant
            .implies(&Permission::file("/etc/app/certs/ca.pem", read()).unwrap()));
    }

    #[test]
    fn action_superset_required() {
        let grant = Permission::file("/data/x", read()).unwrap();
        let write = Permission::file(
            "/data/x",
            FileActionSet::single(FileAction::Write),
        )
        .unwrap();
        assert!(!grant.implies(&write));
        assert!(Permission::file("/data/x", FileActionSet::ALL)
            .unwrap()
            .implies(&write));
    }

    #[test]
    fn empty_action_set_is_a_construction_defect() {
        assert!(Permission::file("/data/x", FileActionSet::EMPTY).is_err());
        assert!(Permission::socket("localhost:80", SocketActionSet::EMPTY).is_err());
    }

    #[test]
    fn interior_wildcards_rejected() {
        assert!(FileTarget::parse("/da*ta/x").is_err());
        assert!(FileTarget::parse("").is_err());
        assert!(FileTarget::parse("/**").unwrap().is_unbounded());
    }

    #[test]
    fn socket_host_wildcard_covers_subdomains() {
        let grant = Permission::socket(
            "*.internal.example:9300-9400",
            SocketActionSet::single(SocketAction::Connect),
        )
        .unwrap();
        let request = Permission::socket(
            "node3.internal.example:9301",
            SocketActionSet::single(SocketAction::Connect),
        )
        .unwrap();
        assert!(grant.implies(&request));

        let other_domain = Permission::socket(
            "node3.other.example:9301",
            SocketActionSet::single(SocketAction::Connect),
        )
        .unwrap();
        assert!(!grant.implies(&other_domain));
    }

    #[test]
    fn socket_actions_imply_resolve_on_covered_hosts() {
        let grant = Permission::socket(
            "db.internal.example:5432",
            SocketActionSet::single(SocketAction::Connect),
        )
        .unwrap();
        let resolve = Permission::socket(
            "db.internal.example:5432",
            SocketActionSet::single(SocketAction::Resolve),
        )
        .unwrap();
        assert!(grant.implies(&resolve));
    }

    #[test]
    fn listen_on_port_zero_means_the_dynamic_range() {
        let grant = Permission::socket(
            "localhost:0",
            SocketActionSet::single(SocketAction::Listen),
        )
        .unwrap();
        let ephemeral = Permission::socket(
            "localhost:39201",
            SocketActionSet::single(SocketAction::Listen),
        )
        .unwrap();
        let privileged = Permission::socket(
            "localhost:80",
            SocketActionSet::single(SocketAction::Listen),
        )
        .unwrap();
        assert!(grant.implies(&ephemeral));
        assert!(!grant.implies(&privileged));
    }

    #[test]
    fn runtime_wildcard_and_exact_match() {
        assert!(Permission::runtime("*").implies(&Permission::runtime("stopThread")));
        assert!(Permission::runtime("stopThread").implies(&Permission::runtime("stopThread")));
        assert!(!Permission::runtime("stopThread").implies(&Permission::runtime("setFactory")));
    }

    #[test]
    fn kinds_never_imply_across_each_other() {
        let file = Permission::file("/data/x", read()).unwrap();
        let socket = Permission::socket(
            "localhost:80",
            SocketActionSet::single(SocketAction::Connect),
        )
        .unwrap();
        assert!(!file.implies(&socket));
        assert!(!socket.implies(&file));
        assert!(!Permission::runtime("stopThread").implies(&file));
    }

    #[test]
    fn all_implies_everything_and_nothing_else_implies_all() {
        let file = Permission::file("/data/x", read()).unwrap();
        assert!(Permission::All.implies(&file));
        assert!(Permission::All.implies(&Permission::All));
        assert!(!file.implies(&Permission::All));
    }

    #[test]
    fn target_written_form_round_trips() {
        for raw in ["/etc/app/app.conf", "/etc/app/*", "/var/data/**", "/**", "/*"] {
            let target = FileTarget::parse(raw).unwrap();
            assert_eq!(target.to_string(), raw);
        }
    }

    #[test]
    fn permission_deserializes_from_parsed_grant_shape() {
        let json = r#"{
            "kind": "file",
            "target": "/var/lib/app/data/**",
            "actions": ["read", "write"]
        }"#;
        let permission: Permission = serde_json::from_str(json).unwrap();
        let request = Permission::file(
            "/var/lib/app/data/nodes/0/x",
            FileActionSet::single(FileAction::Write),
        )
        .unwrap();
        assert!(permission.implies(&request));

        let bad = r#"{"kind": "file", "target": "/da*ta", "actions": ["read"]}"#;
        assert!(serde_json::from_str::<Permission>(bad).is_err());
    }
}

// src/storage/memory.rs
use dashmap::DashMap;
use log::{debug, info};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU32, Ordering};
use parking_lot::Mutex;
use crate::models::server::{unix_now, NewServer, ServerPatch, TargetServer};

#[derive(Debug)]
pub enum RegistryError {
    NotFound(u32),
    Invalid(&'static str),
    Io(io::Error),
}

impl std::fmt::Display for RegistryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound(id) => write!(f, "Server {} not found", id),
            Self::Invalid(msg) => write!(f, "{}", msg),
            Self::Io(e) => write!(f, "Failed to persist server registry: {}", e),
        }
    }
}

impl From<io::Error> for RegistryError {
    fn from(e: io::Error) -> Self {
        Self::Io(e)
    }
}

/// Configured target servers, optionally mirrored to a JSON file.
pub struct ServerRegistry {
    servers: DashMap<u32, TargetServer>,
    next_id: AtomicU32,
    file: Option<PathBuf>,
    // Held across a whole mutation: the file is written first, then the map.
    write_lock: Mutex<()>,
}

impl ServerRegistry {
    pub fn new() -> Self {
        Self {
            servers: DashMap::new(),
            next_id: AtomicU32::new(1),
            file: None,
            write_lock: Mutex::new(()),
        }
    }

    /// Loads the registry from `path`; a missing file yields an empty registry.
    pub fn open(path: impl AsRef<Path>) -> io::Result<Self> {
        let path = path.as_ref().to_path_buf();
        let mut registry = Self::new();

        match std::fs::read(&path) {
            Ok(bytes) => {
                let servers: Vec<TargetServer> = serde_json::from_slice(&bytes)
                    .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
                let max_id = servers.iter().map(|s| s.id).max().unwrap_or(0);
                let next_id = max_id.checked_add(1).ok_or_else(|| {
                    io::Error::new(io::ErrorKind::InvalidData, format!("server id {} leaves no room for new ids", max_id))
                })?;
                for server in servers {
                    registry.servers.insert(server.id, server);
                }
                registry.next_id = AtomicU32::new(next_id);
                info!("Loaded {} servers from {}", registry.servers.len(), path.display());
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                info!("Registry file {} not found, starting empty", path.display());
            }
            Err(e) => return Err(e),
        }

        registry.file = Some(path);
        Ok(registry)
    }

    pub fn list_all(&self) -> Vec<TargetServer> {
        let mut servers: Vec<TargetServer> = self.servers.iter().map(|r| r.value().clone()).collect();
        servers.sort_by_key(|s| (s.sort_order, s.id));
        servers
    }

    /// Enabled servers ordered by (sort_order, id); this is the published order.
    pub fn list_enabled(&self) -> Vec<TargetServer> {
        let mut servers: Vec<TargetServer> = self.servers
            .iter()
            .filter(|r| r.value().enabled)
            .map(|r| r.value().clone())
            .collect();
        servers.sort_by_key(|s| (s.sort_order, s.id));
        servers
    }

    pub fn create(&self, req: NewServer) -> Result<TargetServer, RegistryError> {
        let name = required(req.name, "name is required")?;
        let address = required(req.address, "address is required")?;

        let _guard = self.write_lock.lock();
        let id = self.next_id.load(Ordering::SeqCst);
        let following = id.checked_add(1).ok_or(RegistryError::Invalid("server id space exhausted"))?;
        let now = unix_now();
        let server = TargetServer {
            id,
            name,
            address,
            kind: req.kind.trim().to_string(),
            sort_order: req.sort_order,
            enabled: req.enabled,
            created_at: now,
            updated_at: now,
        };

        let mut next = self.list_all();
        next.push(server.clone());
        self.persist(&next)?;

        self.next_id.store(following, Ordering::SeqCst);
        self.servers.insert(server.id, server.clone());
        debug!("Registered server {} ({})", server.id, server.address);
        Ok(server)
    }

    pub fn update(&self, id: u32, mut patch: ServerPatch) -> Result<TargetServer, RegistryError> {
        if let Some(name) = patch.name.take() {
            patch.name = Some(required(name, "name must not be empty")?);
        }
        if let Some(address) = patch.address.take() {
            patch.address = Some(required(address, "address must not be empty")?);
        }

        let _guard = self.write_lock.lock();
        let mut updated = self.servers
            .get(&id)
            .map(|r| r.value().clone())
            .ok_or(RegistryError::NotFound(id))?;
        updated.apply(patch);
        updated.updated_at = unix_now().max(updated.created_at);

        let next: Vec<TargetServer> = self.list_all()
            .into_iter()
            .map(|s| if s.id == id { updated.clone() } else { s })
            .collect();
        self.persist(&next)?;

        self.servers.insert(id, updated.clone());
        debug!("Updated server {} ({})", updated.id, updated.address);
        Ok(updated)
    }

    pub fn delete(&self, id: u32) -> Result<bool, RegistryError> {
        let _guard = self.write_lock.lock();
        if !self.servers.contains_key(&id) {
            return Ok(false);
        }

        let next: Vec<TargetServer> = self.list_all().into_iter().filter(|s| s.id != id).collect();
        self.persist(&next)?;

        self.servers.remove(&id);
        debug!("Removed server {}", id);
        Ok(true)
    }

    /// Rewrites the backing file with `servers`. Callers hold `write_lock`.
    fn persist(&self, servers: &[TargetServer]) -> io::Result<()> {
        let Some(path) = &self.file else {
            return Ok(());
        };

        let bytes = serde_json::to_vec_pretty(servers)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        let tmp = path.with_extension("tmp");
        std::fs::write(&tmp, bytes)?;
        std::fs::rename(&tmp, path)
    }
}

impl Default for ServerRegistry {
    fn default() -> Self {
        Self::new()
    }
}

fn required(value: String, msg: &'static str) -> Result<String, RegistryError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(RegistryError::Invalid(msg));
    }
    Ok(trimmed.to_string())
}

use crate::integration::payload::{EntityMetadata, NODE_ENTITY_TYPE};
use sysinfo::System;

/// The monitored node a run publishes for.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Entity {
    /// The agent's own host. `host` and `port` address the server on it and
    /// only scope the cache; nothing about them is published as identity.
    Local {
        hostname: String,
        host: String,
        port: u16,
    },
    /// A server addressed over the network.
    Remote { host: String, port: u16 },
}

impl Entity {
    #[must_use]
    pub fn new(remote_monitoring: bool, host: &str, port: u16) -> Self {
        if remote_monitoring {
            Self::Remote {
                host: host.to_string(),
                port,
            }
        } else {
            Self::Local {
                hostname: local_hostname(),
                host: host.to_string(),
                port,
            }
        }
    }

    /// Namespace of this entity's cached counters.
    #[must_use]
    pub fn key(&self) -> String {
        match self {
            Self::Local {
                hostname,
                host,
                port,
            } => format!("{hostname}:{host}:{port}"),
            Self::Remote { host, port } => format!("{host}:{port}"),
        }
    }

    #[must_use]
    pub const fn is_remote(&self) -> bool {
        matches!(self, Self::Remote { .. })
    }

    /// Published identity; the local entity has none.
    #[must_use]
    pub fn metadata(&self) -> Option<EntityMetadata> {
        match self {
            Self::Local { .. } => None,
            Self::Remote { .. } => Some(EntityMetadata {
                name: self.key(),
                entity_type: NODE_ENTITY_TYPE.to_string(),
                id_attributes: Vec::new(),
            }),
        }
    }
}

fn local_hostname() -> String {
    System::host_name()
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| "localhost".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::FileStore;

    #[test]
    fn test_remote_entity() {
        let entity = Entity::new(true, "db.example.com", 3307);
        assert!(entity.is_remote());
        assert_eq!(entity.key(), "db.example.com:3307");

        let metadata = entity.metadata();
        assert_eq!(
            metadata,
            Some(EntityMetadata {
                name: "db.example.com:3307".to_string(),
                entity_type: "node".to_string(),
                id_attributes: Vec::new(),
            })
        );
    }

    #[test]
    fn test_local_entity() {
        let entity = Entity::new(false, "db.example.com", 3307);
        assert!(!entity.is_remote());
        assert!(entity.metadata().is_none());
        assert!(entity.key().ends_with(":db.example.com:3307"));
        assert_ne!(entity.key(), "db.example.com:3307");
    }

    #[test]
    fn test_local_entities_are_distinct_per_port() {
        let a = Entity::new(false, "localhost", 3306);
        let b = Entity::new(false, "localhost", 3307);
        assert_ne!(a.key(), b.key());
        assert_ne!(
            FileStore::default_path(&a.key()),
            FileStore::default_path(&b.key())
        );
    }

    #[test]
    fn test_remote_entities_are_distinct_per_port() {
        let a = Entity::new(true, "db", 3306);
        let b = Entity::new(true, "db", 3307);
        assert_ne!(a.key(), b.key());
    }
}

// # Avahi Name Publisher
//
// This crate publishes host address records through the Avahi daemon's
// D-Bus API on the system bus.
//
// ## Calls Used
//
// - `org.freedesktop.Avahi.Server.EntryGroupNew` at `/` → new group object path
// - `org.freedesktop.Avahi.EntryGroup.AddAddress(iiuss)` on the group path
// - `org.freedesktop.Avahi.EntryGroup.Commit` on the group path
// - `org.freedesktop.Avahi.EntryGroup.Free` on the group path
// - `org.freedesktop.Avahi.Server.GetVersionString` at startup, as a liveness probe
//
// ## Failure Model
//
// One D-Bus call per trait method, no retries. Every failure is reported as
// a publisher error tagged with the group operation, and the reconciler
// treats it as fatal.
//
// ## Connection
//
// A single bus connection is opened at startup and shared by every call for
// the life of the process. `DBUS_SYSTEM_BUS_ADDRESS` overrides the bus
// socket location. Avahi frees all groups owned by a connection when
// it closes, so process exit withdraws everything that was published.

use async_trait::async_trait;
use mdns_core::traits::{AddressRecord, GroupHandle, NamePublisher};
use mdns_core::{Error, Result};
use zbus::proxy::CacheProperties;
use zbus::zvariant::{ObjectPath, OwnedObjectPath};
use zbus::Connection;

const OP_CONNECT: &str = "connect";
const OP_CREATE: &str = "create";
const OP_ADD_ADDRESS: &str = "add-address";
const OP_COMMIT: &str = "commit";
const OP_FREE: &str = "free";

#[zbus::proxy(
    interface = "org.freedesktop.Avahi.Server",
    default_service = "org.freedesktop.Avahi",
    default_path = "/",
    gen_blocking = false
)]
trait Server {
    fn entry_group_new(&self) -> zbus::Result<OwnedObjectPath>;

    fn get_version_string(&self) -> zbus::Result<String>;
}

#[zbus::proxy(
    interface = "org.freedesktop.Avahi.EntryGroup",
    default_service = "org.freedesktop.Avahi",
    gen_blocking = false
)]
trait EntryGroup {
    fn add_address(
        &self,
        interface: i32,
        protocol: i32,
        flags: u32,
        name: &str,
        address: &str,
    ) -> zbus::Result<()>;

    fn commit(&self) -> zbus::Result<()>;

    fn free(&self) -> zbus::Result<()>;
}

/// Name publisher backed by the Avahi daemon
pub struct AvahiPublisher {
    /// Shared bus connection
    connection: Connection,

    /// Proxy for the Avahi server object
    server: ServerProxy<'static>,

    /// Daemon version reported at connect time
    version: String,
}

impl std::fmt::Debug for AvahiPublisher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AvahiPublisher")
            .field("version", &self.version)
            .field("unique_name", &self.connection.unique_name())
            .finish()
    }
}

impl AvahiPublisher {
    /// Connect to Avahi on the system bus
    ///
    /// # Errors
    ///
    /// Returns a publisher error if the bus is unreachable or Avahi is not
    /// running. Both are fatal at startup.
    pub async fn connect() -> Result<Self> {
        let connection = Connection::system()
            .await
            .map_err(|e| bus_error(OP_CONNECT, e))?;

        Self::with_connection(connection).await
    }

    /// Wrap an already open bus connection and probe the daemon
    async fn with_connection(connection: Connection) -> Result<Self> {
        let server = ServerProxy::builder(&connection)
            .cache_properties(CacheProperties::No)
            .build()
            .await
            .map_err(|e| bus_error(OP_CONNECT, e))?;

        let version = server
            .get_version_string()
            .await
            .map_err(|e| bus_error(OP_CONNECT, e))?;

        tracing::debug!("Avahi server answered: {}", version);

        Ok(Self {
            connection,
            server,
            version,
        })
    }

    /// Daemon version string (e.g., "avahi 0.8")
    pub fn version(&self) -> &str {
        &self.version
    }

    /// Build a proxy for an existing entry group
    async fn group(&self, operation: &str, handle: &GroupHandle) -> Result<EntryGroupProxy<'static>> {
        let path = group_path(operation, handle)?.into_owned();

        EntryGroupProxy::builder(&self.connection)
            .path(path)
            .map_err(|e| bus_error(operation, e))?
            .cache_properties(CacheProperties::No)
            .build()
            .await
            .map_err(|e| bus_error(operation, e))
    }
}

#[async_trait]
impl NamePublisher for AvahiPublisher {
    async fn create_group(&self) -> Result<GroupHandle> {
        let path = self
            .server
            .entry_group_new()
            .await
            .map_err(|e| bus_error(OP_CREATE, e))?;

        tracing::debug!("Created entry group {}", path.as_str());
        Ok(GroupHandle::new(path.as_str()))
    }

    async fn add_address(&self, group: &GroupHandle, record: &AddressRecord) -> Result<()> {
        let proxy = self.group(OP_ADD_ADDRESS, group).await?;

        proxy
            .add_address(
                record.interface,
                record.protocol,
                record.flags,
                &record.hostname,
                &record.address.to_string(),
            )
            .await
            .map_err(|e| bus_error(OP_ADD_ADDRESS, e))
    }

    async fn commit(&self, group: &GroupHandle) -> Result<()> {
        let proxy = self.group(OP_COMMIT, group).await?;
        proxy.commit().await.map_err(|e| bus_error(OP_COMMIT, e))
    }

    async fn free(&self, group: &GroupHandle) -> Result<()> {
        let proxy = self.group(OP_FREE, group).await?;
        proxy.free().await.map_err(|e| bus_error(OP_FREE, e))
    }

    fn publisher_name(&self) -> &'static str {
        "avahi"
    }
}

/// Validate a group handle as a D-Bus object path
fn group_path<'a>(operation: &str, handle: &'a GroupHandle) -> Result<ObjectPath<'a>> {
    ObjectPath::try_from(handle.as_str()).map_err(|e| {
        Error::publisher(
            operation,
            format!("Invalid entry group handle '{}': {}", handle, e),
        )
    })
}

/// Map a D-Bus failure onto a publisher error for `operation`
fn bus_error(operation: &str, error: zbus::Error) -> Error {
    let message = match &error {
        zbus::Error::MethodError(name, Some(detail), _) => {
            format!("{}: {}", name.as_str(), detail)
        }
        zbus::Error::MethodError(name, None, _) => name.as_str().to_string(),
        other => other.to_string(),
    };

    Error::publisher(operation, message)
}

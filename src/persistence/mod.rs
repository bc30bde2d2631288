//! Saving and loading games, locally and through an optional remote store.

pub mod gateway;
pub mod local;
pub mod record;
pub mod remote;

pub use gateway::{PersistenceGateway, SaveBackend, SaveSource, SaveTarget};
pub use local::LocalSaveStore;
pub use record::{MonsterRecord, SaveRecord, SAVE_FORMAT_VERSION};
pub use remote::RemoteSaveStore;

//! Storage and the weather update loop for Neolight.

pub mod clock;
pub mod device;
pub mod document_client;
pub mod document_store;
pub mod status;
pub mod update_loop;

pub use clock::{Clock, SystemClock};
pub use device::{DeviceDocument, DeviceFieldError};
pub use document_client::DocumentClient;
pub use document_store::{Document, SqliteDocumentStore};
pub use status::StatusRecord;
pub use update_loop::{CycleOutcome, LoopStats, ObservationSource, StatusSink, UpdateLoop};

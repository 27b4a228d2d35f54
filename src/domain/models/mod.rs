pub mod config;
pub mod context;
pub mod measurement;
pub mod message;
pub mod status;
pub mod subject;

pub use config::{Config, LoggingConfig, RunConfig};
pub use context::{GlobSet, RunContext};
pub use measurement::{fold_measurements, Measurement, MeasurementSubject};
pub use message::{
    Cardinality, Datatype, Message, MessageDescription, MessagePayload, MessageValue, Visibility,
};
pub use status::{fold, Status, TrafficLight};
pub use subject::{
    Backend, BackendJob, Database, DatabaseEngine, Dataflow, Mount, Server, Subject, SubjectInfo,
    SubjectKind, WebUrl, Website,
};

// Model types for FAH assignment and work server API payloads

pub mod assignment;
pub mod common;
pub mod file;
pub mod job;
pub mod project;

pub use assignment::{AsProjectData, AsWorkServerData};
pub use file::FileData;
pub use job::{JobAction, JobActionKind, JobData, JobResults, JobState};
pub use project::{CompressionType, CoreId, FahProject, NonbondedSettings, ProjectData};

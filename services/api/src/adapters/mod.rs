pub mod db;
pub mod file_kv;
pub mod monitored;
pub mod study_llm;

pub use db::PgKeyValueStore;
pub use file_kv::FileKeyValueStore;
pub use monitored::MonitoredStudyService;
pub use study_llm::OpenAiStudyAdapter;

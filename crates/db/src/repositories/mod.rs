pub mod monitoring_repo;

pub use monitoring_repo::MonitoringRepo;

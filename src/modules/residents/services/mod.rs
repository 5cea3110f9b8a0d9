pub mod archival_migrator;

pub use archival_migrator::ArchivalMigrator;

pub mod table;
pub use table::{Column, Table, TableApi};
pub mod postgrest;
pub use postgrest::PostgrestClient;
pub mod pg_tables;
pub use pg_tables::PgTableClient;

pub mod profile_repo;
pub use profile_repo::ProfileRepository;
pub mod gym_repo;
pub use gym_repo::GymRepository;

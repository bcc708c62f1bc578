pub mod sync_repository;

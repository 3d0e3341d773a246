pub mod builder_tests;
pub mod cache_tests;
pub mod collection_tests;
pub mod config_tests;
pub mod serializer_tests;

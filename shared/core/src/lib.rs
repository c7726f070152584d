//! Domain logic for topic discovery: query classification, article
//! fetching, embedding caching, and topic clustering, composed in
//! [`pipeline::discover_topics`].

pub mod article_fetcher;
pub mod embedding_cache;
pub mod errors;
pub mod llm;
pub mod models;
pub mod pipeline;
pub mod qdrant_store;
pub mod query_classifier;
pub mod topic_engine;

pub use errors::CoreError;
pub use models::{Article, DiscoveryResult, Query, TopicParams};

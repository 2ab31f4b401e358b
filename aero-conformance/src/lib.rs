pub mod backend;
pub mod canonical;
pub mod config;
pub mod corpus;
pub mod failure;
pub mod orchestrator;
pub mod pipeline;
pub mod registry;
pub mod tools;

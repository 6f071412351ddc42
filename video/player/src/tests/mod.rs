mod adapters;
mod investigation;
mod support;

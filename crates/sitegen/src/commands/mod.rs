//! CLI command implementations.

pub(crate) mod apply;
pub(crate) mod build;
pub(crate) mod check;
mod common;
pub(crate) mod export;
pub(crate) mod routes;
pub(crate) mod tree;
pub(crate) mod upload;

pub(crate) use apply::ApplyArgs;
pub(crate) use build::BuildArgs;
pub(crate) use check::CheckArgs;
pub(crate) use export::ExportArgs;
pub(crate) use routes::RoutesArgs;
pub(crate) use tree::TreeArgs;
pub(crate) use upload::UploadArgs;

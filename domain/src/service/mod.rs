mod cluster_scripts;
mod sink;

#[rustfmt::skip]
pub use self::{
    cluster_scripts::ClusterScripts,
    sink::{LogSink, StatusSink},
};

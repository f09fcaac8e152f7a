pub mod cluster;
pub mod status_view;

#[rustfmt::skip]
pub use self::{
    cluster::ClusterSettings,
    status_view::StatusView,
};

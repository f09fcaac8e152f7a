mod cluster_script;

pub use self::cluster_script::ClusterScriptRunner;

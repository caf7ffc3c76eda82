#![allow(dead_code)]

use rocket::local::blocking::Client;
use simple_data_server::mirror::{MemoryMirror, RecordMirror};
use simple_data_server::server::{ServerConfig, ServerNode};
use std::sync::Arc;

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub fn get_server_config() -> ServerConfig {
    ServerConfig {
        port: 0,
        ..ServerConfig::default()
    }
}

pub fn launch_server_node() -> (ServerNode, Client) {
    init_logging();
    let node = ServerNode::new(get_server_config()).expect("no mirror configured");
    let client = Client::tracked(node.build()).expect("valid rocket instance");
    (node, client)
}

pub fn server_node_with_memory_mirror(mirror: Arc<MemoryMirror>) -> ServerNode {
    init_logging();
    let mirror: Arc<dyn RecordMirror> = mirror;
    ServerNode::with_mirror(get_server_config(), Some(mirror))
}

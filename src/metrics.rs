use anyhow::Result;
use once_cell::sync::Lazy;
use prometheus::{
    opts, register_int_counter, register_int_gauge, Encoder, IntCounter, IntGauge, TextEncoder,
};

pub static CONNECTIONS_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(opts!(
        "project_chat_connections_total",
        "Total number of authenticated gateway connections"
    ))
    .unwrap()
});

pub static ACTIVE_CONNECTIONS: Lazy<IntGauge> = Lazy::new(|| {
    register_int_gauge!(opts!(
        "project_chat_active_connections",
        "Gateway connections currently open"
    ))
    .unwrap()
});

pub static HANDSHAKES_REJECTED_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(opts!(
        "project_chat_handshakes_rejected_total",
        "WebSocket upgrades refused (bad credential or protocol error)"
    ))
    .unwrap()
});

pub static MESSAGES_SENT_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(opts!(
        "project_chat_messages_sent_total",
        "Total number of chat messages persisted"
    ))
    .unwrap()
});

pub static MESSAGES_DELETED_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(opts!(
        "project_chat_messages_deleted_total",
        "Total number of chat messages soft-deleted"
    ))
    .unwrap()
});

pub static BROADCAST_DELIVERIES_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(opts!(
        "project_chat_broadcast_deliveries_total",
        "Events handed to connection queues by room broadcasts"
    ))
    .unwrap()
});

pub fn gather_metrics() -> Result<String> {
    let mut buffer = vec![];
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    encoder.encode(&metric_families, &mut buffer)?;

    Ok(String::from_utf8(buffer)?)
}

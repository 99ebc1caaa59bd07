//! Substitute dataset served when the upstream cannot be trusted.
//!
//! Ages are relative to the instant the dataset is built, so the
//! classification outcome of each record is stable over time.

use chrono::{DateTime, Duration, Utc};

use crate::inventory::asset::AssetRecord;

/// Build the fallback dataset relative to the current instant.
pub fn dataset() -> Vec<AssetRecord> {
    dataset_at(Utc::now())
}

/// Build the fallback dataset relative to `now`.
pub fn dataset_at(now: DateTime<Utc>) -> Vec<AssetRecord> {
    let aged = |days: i64| Some(now - Duration::days(days));

    vec![
        AssetRecord::new("1", "PC-Financeiro", "Computer")
            .with_serial_number("FB-PC-0001")
            .with_last_communication(aged(90))
            .with_public_ip(Some("177.12.34.56".to_string())),
        AssetRecord::new("2", "Notebook-Suporte", "Laptop")
            .with_serial_number("FB-NB-0002")
            .with_last_communication(aged(15))
            .with_public_ip(Some("187.54.23.11".to_string())),
        AssetRecord::new("3", "Estacao-Engenharia", "Workstation")
            .with_serial_number("FB-WS-0003")
            .with_last_communication(aged(120))
            .with_public_ip(Some("200.98.11.7".to_string())),
        AssetRecord::new("4", "Desktop-RH", "Desktop")
            .with_serial_number("FB-DT-0004")
            .with_last_communication(aged(61)),
        AssetRecord::new("5", "Impressora-Recepcao", "Printer")
            .with_serial_number("FB-PR-0005")
            .with_last_communication(aged(200)),
        AssetRecord::new("6", "Servidor-Legado", "Server")
            .with_serial_number("FB-SV-0006"),
    ]
}

/// Look up a fallback record by id.
pub fn find(id: &str) -> Option<AssetRecord> {
    dataset().into_iter().find(|record| record.id() == id)
}
